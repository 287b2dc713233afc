//! Mentor Prompt
//!
//! Prompt construction from mentor templates and validation of what the model
//! sends back.
//!
//! # Overview
//!
//! - **ContextBuilder**: fills `{todos}`, `{retrospects}`, `{overall_goal}` and
//!   friends, substituting a "no data available" sentinel for empty input
//! - **sanitize**: whitespace normalization applied to every response
//! - **ResponseContract**: advice, goal and KEEP/PROBLEM/TRY checks
//!
//! # Example
//!
//! ```rust
//! use mentor_catalog::{IntimacyLevel, MentorCatalog, MentorId};
//! use mentor_prompt::{ContextBuilder, ResponseContract, NO_DATA};
//!
//! let profile = MentorCatalog::profile(MentorId::Sage);
//! let prompt = ContextBuilder::new(profile, IntimacyLevel::Low)
//!     .build_advice_prompt(&[], &[])
//!     .unwrap();
//! assert!(prompt.contains(NO_DATA));
//!
//! let text = ResponseContract::Advice.check("  Rest well tonight.  ").unwrap();
//! assert_eq!(text, "Rest well tonight.");
//! ```

#![warn(missing_docs)]

pub mod context;
pub mod error;
pub mod sanitize;
pub mod validator;

// Re-exports
pub use context::{join_or_no_data, ContextBuilder, Placeholder, NO_DATA};
pub use error::{ContextError, ResponseFormatError};
pub use sanitize::sanitize;
pub use validator::{
    extract_json_object, parse_feedback, validate_advice, validate_goal, KptFeedback,
    ResponseContract,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
