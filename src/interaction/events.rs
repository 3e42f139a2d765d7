use cgmath::Point2;

pub use winit::event::{MouseButton, MouseScrollDelta, TouchPhase};
pub use winit::keyboard::ModifiersState;

/// A mouse press, move or release in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub position: Point2<f64>,
    pub button: MouseButton,
    pub modifiers: ModifiersState,
}

impl PointerEvent {
    pub fn new(x: f64, y: f64, button: MouseButton) -> Self {
        Self {
            position: Point2::new(x, y),
            button,
            modifiers: ModifiersState::empty(),
        }
    }

    pub fn with_modifiers(mut self, modifiers: ModifiersState) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn shift(&self) -> bool {
        self.modifiers.shift_key()
    }

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn ctrl_or_cmd(&self) -> bool {
        self.modifiers.control_key() || self.modifiers.super_key()
    }
}

/// One finger or stylus contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub id: u64,
    pub phase: TouchPhase,
    pub position: Point2<f64>,
    /// Pressure-sensitive pen input rather than a finger.
    pub stylus: bool,
}

impl TouchPoint {
    pub fn finger(id: u64, phase: TouchPhase, x: f64, y: f64) -> Self {
        Self {
            id,
            phase,
            position: Point2::new(x, y),
            stylus: false,
        }
    }

    pub fn stylus(id: u64, phase: TouchPhase, x: f64, y: f64) -> Self {
        Self {
            stylus: true,
            ..Self::finger(id, phase, x, y)
        }
    }

    pub fn is_release(&self) -> bool {
        matches!(self.phase, TouchPhase::Ended | TouchPhase::Cancelled)
    }
}

impl From<&winit::event::Touch> for TouchPoint {
    fn from(touch: &winit::event::Touch) -> Self {
        // only pens report an altitude angle
        let stylus = matches!(
            touch.force,
            Some(winit::event::Force::Calibrated {
                altitude_angle: Some(_),
                ..
            })
        );
        Self {
            id: touch.id,
            phase: touch.phase,
            position: Point2::new(touch.location.x, touch.location.y),
            stylus,
        }
    }
}

/// Whether the pointer travelled little enough between press and release to
/// count as a click.
pub fn is_click(down: Point2<f64>, up: Point2<f64>, tolerance: f64) -> bool {
    (up.x - down.x).abs() <= tolerance && (up.y - down.y).abs() <= tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifiers() {
        let event = PointerEvent::new(1.0, 2.0, MouseButton::Left)
            .with_modifiers(ModifiersState::SUPER | ModifiersState::SHIFT);
        assert!(event.ctrl_or_cmd());
        assert!(event.shift());
        assert!(!PointerEvent::new(0.0, 0.0, MouseButton::Left).ctrl_or_cmd());
    }

    #[test]
    fn test_click_tolerance() {
        let down = Point2::new(10.0, 10.0);
        assert!(is_click(down, Point2::new(12.0, 8.0), 2.0));
        assert!(!is_click(down, Point2::new(12.5, 10.0), 2.0));
    }
}
