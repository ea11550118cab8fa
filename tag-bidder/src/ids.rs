//! Random id source.
//!
//! Bid ids, creative ids and cache busters are random. The source is injected
//! wherever ids are generated so tests can pin the values.

use std::fmt::Debug;

use uuid::Uuid;

/// Produces unique identifiers.
pub trait IdGenerator: Debug + Send + Sync {
    /// Returns a new identifier.
    fn generate(&self) -> String;
}

/// Random UUID v4 identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Always returns the same identifier.
#[derive(Debug, Clone)]
pub struct FixedId(pub String);

impl FixedId {
    /// Creates a generator returning `id` on every call.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl IdGenerator for FixedId {
    fn generate(&self) -> String {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_generator_is_unique() {
        let generator = UuidGenerator;
        assert_ne!(generator.generate(), generator.generate());
    }

    #[test]
    fn test_uuid_generator_format() {
        let id = UuidGenerator.generate();
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_fixed_id() {
        let generator = FixedId::new("1234");
        assert_eq!(generator.generate(), "1234");
        assert_eq!(generator.generate(), "1234");
    }
}
