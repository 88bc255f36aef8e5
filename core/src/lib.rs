//! Mastery gate core: host-side verification of provider mastery reports.
//!
//! An embedded exercise provider reports how well a student has mastered a
//! topic. The report is relayed through the client, so the host trusts it
//! only after recomputing the provider's signature:
//! - canonical signing input: user id, then each topic and its value to two
//!   decimals, in sorted topic order
//! - HMAC-MD5 keyed with the shared secret, lowercase hex
//! - constant-time comparison against the supplied signature
//!
//! Accepted reports become a [`GradeEvent`] published to the host through a
//! [`GradePublisher`]. Rejections are silent outside of operator logs.

pub mod config;
pub mod errors;
pub mod traits;
pub mod types;
pub mod verifier;

pub use config::BlockConfig;
pub use errors::{ConfigError, RejectReason};
pub use traits::GradePublisher;
pub use types::{GradeEvent, MasteryReport, SharedSecret, TopicId, GRADE_EVENT_KIND, MAX_VALUE, compute_signature};
pub use verifier::{GradeHandler, InMemoryGradeBook, PublishedGrade, TracingGradePublisher, verify};

/// Library version string.
pub fn version() -> &'static str { concat!("masterygate-core ", env!("CARGO_PKG_VERSION")) }
