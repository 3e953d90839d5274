use std::fmt;

/// Identifies one model (frame, conformer, or structure) inside a [`ModelSet`].
///
/// [`ModelSet`]: super::model_set::ModelSet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ModelId(pub usize);

impl ModelId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "model {}", self.0)
    }
}

impl From<usize> for ModelId {
    fn from(value: usize) -> Self {
        Self(value)
    }
}
