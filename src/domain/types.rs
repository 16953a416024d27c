use std::fmt;

/// Why a submission was flagged. The variant order here is the order reasons
/// appear in decisions and report mails: volume first, then the secondary
/// signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpamReason {
    TooManyRequests,
    RepeatedRequests(u32),
    MissingClientTimestamp,
    OutsideAllowedRegion,
    BlockedDateCollision,
}

impl fmt::Display for SpamReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyRequests => f.write_str("Too many requests within a day"),
            Self::RepeatedRequests(limit) => {
                write!(f, "More than {limit} requests within a day")
            }
            Self::MissingClientTimestamp => f.write_str("Missing client timestamp"),
            Self::OutsideAllowedRegion => f.write_str("Request origin outside the allowed region"),
            Self::BlockedDateCollision => f.write_str("Requested date collides with a blocked date"),
        }
    }
}

/// Outcome of classifying one submission. Produced fresh per request, never
/// persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct SpamDecision {
    pub reject: bool,
    pub reject_reason: Option<String>,
    pub is_spam: bool,
    pub reasons: Vec<SpamReason>,
}
