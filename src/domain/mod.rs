pub mod submission;
pub mod types;
pub mod validate;

pub use submission::{RequestType, Submission};
pub use types::{SpamDecision, SpamReason};
