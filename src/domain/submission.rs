use std::fmt;

use chrono::{NaiveDate, NaiveTime};

/// Kind of booking the submitter is asking about. Anything outside the
/// enumerated set becomes [`RequestType::Other`], which carries the raw text
/// and waives the booking fields (location, date, times).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestType {
    MusicDj,
    Wedding,
    CorporateEvent,
    Other(String),
}

impl RequestType {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Music/DJ" => Self::MusicDj,
            "Wedding" => Self::Wedding,
            "Corporate event" => Self::CorporateEvent,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn requires_booking_details(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MusicDj => f.write_str("Music/DJ"),
            Self::Wedding => f.write_str("Wedding"),
            Self::CorporateEvent => f.write_str("Corporate event"),
            Self::Other(text) => f.write_str(text),
        }
    }
}

/// A fully validated contact-form submission. For [`RequestType::Other`] the
/// booking fields are always `None`, whatever the client sent; for every
/// enumerated request type they are always `Some`.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub request_type: RequestType,
    pub location: Option<String>,
    pub date: Option<NaiveDate>,
    pub time_start: Option<NaiveTime>,
    pub time_end: Option<NaiveTime>,
    pub message: String,
    pub client_timestamp: Option<String>,
}

impl Submission {
    pub fn sender_display(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
