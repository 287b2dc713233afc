//! Mentor Catalog
//!
//! Static registry of mentor personas and the intimacy classification that
//! modulates their tone.
//!
//! # Example
//!
//! ```rust
//! use mentor_catalog::{IntimacyLevel, MentorCatalog, MentorId};
//!
//! let profile = MentorCatalog::profile_for("coach").unwrap();
//! assert_eq!(profile.id, MentorId::Coach);
//!
//! let level = IntimacyLevel::from_activity(12, 1);
//! assert_eq!(level, IntimacyLevel::Medium);
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod intimacy;
pub mod mentor;

// Re-exports
pub use error::{UnknownIntimacyError, UnknownMentorError};
pub use intimacy::IntimacyLevel;
pub use mentor::{FallbackFeedback, MentorCatalog, MentorId, MentorProfile};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
