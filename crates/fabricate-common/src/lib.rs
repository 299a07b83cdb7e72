//! # Fabricate Common
//!
//! Common types shared by every Fabricate crate.
//!
//! This crate provides:
//! - Identifier newtypes (components, essences, recipes, options, systems, actors)
//! - The configuration error taxonomy raised while assembling a crafting system
//! - Schema versions for crafting system definition files
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;
pub mod version;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::version::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_order_by_raw_value() {
        let a = ComponentId::new("a23xyz");
        let b = ComponentId::new("a34xyz");
        assert!(a < b);
        assert_eq!(a.as_str(), "a23xyz");
    }

    #[test]
    fn test_version_compatibility() {
        let v1 = SchemaVersion::new(1, 0, 0);
        let v2 = SchemaVersion::new(1, 1, 0);
        let v3 = SchemaVersion::new(2, 0, 0);

        // v2 can read v1 data (newer version reading older data)
        assert!(v2.is_compatible_with(&v1));
        // Different major versions are incompatible
        assert!(!v1.is_compatible_with(&v3));
    }
}
