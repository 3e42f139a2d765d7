//! Per-instance GPU data for landmark spheres and connectivity lines.

use cgmath::Point3;

pub const LANDMARK_COLOR: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
pub const SELECTED_LANDMARK_COLOR: [f32; 4] = [1.0, 1.0, 0.0, 1.0];
pub const LINE_COLOR: [f32; 4] = [1.0, 1.0, 0.0, 1.0];

/// One landmark sphere, in world space.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LandmarkInstance {
    pub position: [f32; 3],
    pub radius: f32,
    pub color: [f32; 4],
}

impl LandmarkInstance {
    pub fn new(position: Point3<f64>, radius: f64, selected: bool) -> Self {
        Self {
            position: to_array(position),
            radius: radius as f32,
            color: if selected {
                SELECTED_LANDMARK_COLOR
            } else {
                LANDMARK_COLOR
            },
        }
    }
}

/// One connectivity segment, in world space. Endpoints are homogeneous to
/// keep 16 byte alignment.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineInstance {
    pub start: [f32; 4],
    pub end: [f32; 4],
    pub color: [f32; 4],
}

impl LineInstance {
    pub fn new(start: Point3<f64>, end: Point3<f64>) -> Self {
        let [sx, sy, sz] = to_array(start);
        let [ex, ey, ez] = to_array(end);
        Self {
            start: [sx, sy, sz, 1.0],
            end: [ex, ey, ez, 1.0],
            color: LINE_COLOR,
        }
    }
}

fn to_array(p: Point3<f64>) -> [f32; 3] {
    [p.x as f32, p.y as f32, p.z as f32]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_layouts() {
        assert_eq!(std::mem::size_of::<LandmarkInstance>(), 32);
        assert_eq!(std::mem::size_of::<LineInstance>(), 48);

        let instances = [LandmarkInstance::new(Point3::new(1.0, 2.0, 3.0), 0.5, true)];
        let bytes: &[u8] = bytemuck::cast_slice(&instances);
        assert_eq!(bytes.len(), 32);
        assert_eq!(instances[0].color, SELECTED_LANDMARK_COLOR);
    }
}
