//! Memory point schema.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single labeled measurement of total session memory.
///
/// Points are immutable once created. Label uniqueness is enforced by
/// [`MemoryPointLog`](crate::MemoryPointLog) at insertion time, not here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemoryPoint {
    label: String,
    bytes: u64,
}

impl MemoryPoint {
    /// Create a new memory point.
    pub fn new(label: impl Into<String>, bytes: u64) -> Self {
        Self {
            label: label.into(),
            bytes,
        }
    }

    /// Label of the point.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Memory in bytes at the time of creation.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Split into `(label, bytes)`.
    pub fn into_parts(self) -> (String, u64) {
        (self.label, self.bytes)
    }
}

impl From<MemoryPoint> for (String, u64) {
    fn from(point: MemoryPoint) -> Self {
        point.into_parts()
    }
}

impl fmt::Display for MemoryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemoryPoint(label={:?}, bytes={})", self.label, self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_and_positional_access() {
        let point = MemoryPoint::new("load config", 26_046_118);
        assert_eq!(point.label(), "load config");
        assert_eq!(point.bytes(), 26_046_118);

        let (label, bytes) = point.into();
        assert_eq!(label, "load config");
        assert_eq!(bytes, 26_046_118);
    }

    #[test]
    fn test_display() {
        let point = MemoryPoint::new("a", 10);
        assert_eq!(point.to_string(), "MemoryPoint(label=\"a\", bytes=10)");
    }

    #[test]
    fn test_serialization() {
        let point = MemoryPoint::new("Before f()", 1024);
        let json = serde_json::to_string(&point).unwrap();
        assert_eq!(json, r#"{"label":"Before f()","bytes":1024}"#);
    }
}
