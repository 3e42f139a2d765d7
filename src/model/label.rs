use crate::error::{Error, Result};

/// A named, ordered subset of a group's landmarks, e.g. `"left_eye"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    name: String,
    mask: Vec<usize>,
}

impl Label {
    /// Fails if any index in `mask` is outside a group of `len` landmarks.
    pub fn new(name: impl Into<String>, mask: Vec<usize>, len: usize) -> Result<Self> {
        let name = name.into();
        if let Some(&index) = mask.iter().find(|&&index| index >= len) {
            return Err(Error::LabelOutOfRange {
                label: name,
                index,
                len,
            });
        }
        Ok(Self { name, mask })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mask(&self) -> &[usize] {
        &self.mask
    }

    pub fn contains(&self, index: usize) -> bool {
        self.mask.contains(&index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_must_be_in_range() {
        assert!(Label::new("nose", vec![0, 2], 3).is_ok());
        match Label::new("nose", vec![0, 3], 3) {
            Err(Error::LabelOutOfRange { label, index, len }) => {
                assert_eq!((label.as_str(), index, len), ("nose", 3, 3));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
