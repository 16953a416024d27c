use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::submission::{RequestType, Submission};

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));
static TIME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}:\d{2}$").expect("valid time regex"));
/// Strict ISO 8601 with milliseconds in UTC, exactly as browser
/// `Date.toISOString()` emits it. Anything looser does not count as the
/// script-executed signal.
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{3}Z$").expect("valid timestamp regex")
});

/// Validates a raw JSON body into a [`Submission`], collecting every field
/// error instead of stopping at the first one.
pub fn parse_submission(body: &Value) -> Result<Submission, Vec<String>> {
    let mut errors = Vec::new();

    let first_name = require_string(body, "first_name", 2, 30, &mut errors);
    let last_name = require_string(body, "last_name", 2, 30, &mut errors);
    let email = require_email(body, "email", &mut errors);
    let request_type =
        require_string(body, "type_of_request", 2, 40, &mut errors).map(|raw| RequestType::parse(&raw));
    let message = require_string(body, "message", 2, 1000, &mut errors);
    let client_timestamp = optional_timestamp(body, "timestamp", &mut errors);

    let mut location = None;
    let mut date = None;
    let mut time_start = None;
    let mut time_end = None;
    if let Some(request_type) = &request_type {
        if request_type.requires_booking_details() {
            location = require_string(body, "location", 2, 40, &mut errors);
            date = require_date(body, "date", &mut errors);
            time_start = require_time(body, "time_start", &mut errors);
            time_end = require_time(body, "time_end", &mut errors);
        }
    }

    match (first_name, last_name, email, request_type, message) {
        (Some(first_name), Some(last_name), Some(email), Some(request_type), Some(message))
            if errors.is_empty() =>
        {
            Ok(Submission {
                first_name,
                last_name,
                email,
                request_type,
                location,
                date,
                time_start,
                time_end,
                message,
                client_timestamp,
            })
        }
        _ => Err(errors),
    }
}

fn require_string(
    body: &Value,
    field: &str,
    min: usize,
    max: usize,
    errors: &mut Vec<String>,
) -> Option<String> {
    let value = match body.get(field) {
        None | Some(Value::Null) => {
            errors.push(format!("{field} is required"));
            return None;
        }
        Some(Value::String(raw)) => raw.trim().to_string(),
        Some(_) => {
            errors.push(format!("{field} must be a string"));
            return None;
        }
    };

    let length = value.chars().count();
    if length < min {
        errors.push(format!("{field} must be {min} or more characters long"));
        return None;
    }
    if length > max {
        errors.push(format!("{field} must be {max} or less characters long"));
        return None;
    }
    Some(value)
}

fn require_email(body: &Value, field: &str, errors: &mut Vec<String>) -> Option<String> {
    let value = require_string(body, field, 3, 254, errors)?;
    if !EMAIL_REGEX.is_match(&value) {
        errors.push(format!("{field} must be a valid email address"));
        return None;
    }
    Some(value)
}

fn require_date(body: &Value, field: &str, errors: &mut Vec<String>) -> Option<NaiveDate> {
    let value = require_string(body, field, 10, 10, errors)?;
    match NaiveDate::parse_from_str(&value, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.push(format!("{field} must be a valid date"));
            None
        }
    }
}

fn require_time(body: &Value, field: &str, errors: &mut Vec<String>) -> Option<NaiveTime> {
    let value = require_string(body, field, 5, 5, errors)?;
    if !TIME_REGEX.is_match(&value) {
        errors.push(format!("{field} must be a valid time"));
        return None;
    }
    match NaiveTime::parse_from_str(&value, "%H:%M") {
        Ok(time) => Some(time),
        Err(_) => {
            errors.push(format!("{field} must be a valid time"));
            None
        }
    }
}

fn optional_timestamp(body: &Value, field: &str, errors: &mut Vec<String>) -> Option<String> {
    match body.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(raw)) => {
            let value = raw.trim();
            if TIMESTAMP_REGEX.is_match(value) {
                Some(value.to_string())
            } else {
                errors.push(format!(
                    "{field} must be a valid ISO 8601 date and time with millis in UTC"
                ));
                None
            }
        }
        Some(_) => {
            errors.push(format!("{field} must be a string"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn base_body() -> Value {
        json!({
            "first_name": "Jana",
            "last_name": "Schmidt",
            "email": "jana.schmidt@example.com",
            "type_of_request": "Music/DJ",
            "location": "Hamburg",
            "date": "2026-10-03",
            "time_start": "18:00",
            "time_end": "23:30",
            "message": "Looking for a DJ for our company party.",
            "timestamp": "2026-08-07T11:22:33.444Z"
        })
    }

    #[test]
    fn accepts_complete_booking_request() {
        let submission = parse_submission(&base_body()).expect("valid body");
        assert_eq!(submission.request_type, RequestType::MusicDj);
        assert_eq!(submission.date, NaiveDate::from_ymd_opt(2026, 10, 3));
        assert_eq!(
            submission.time_end,
            NaiveTime::from_hms_opt(23, 30, 0)
        );
        assert_eq!(
            submission.client_timestamp.as_deref(),
            Some("2026-08-07T11:22:33.444Z")
        );
    }

    #[test]
    fn other_request_passes_without_booking_details() {
        let mut body = base_body();
        body["type_of_request"] = json!("Other");
        for field in ["location", "date", "time_start", "time_end"] {
            body.as_object_mut().expect("object body").remove(field);
        }
        let submission = parse_submission(&body).expect("relaxed body");
        assert_eq!(
            submission.request_type,
            RequestType::Other("Other".to_string())
        );
        assert_eq!(submission.location, None);
        assert_eq!(submission.date, None);
        assert_eq!(submission.time_start, None);
        assert_eq!(submission.time_end, None);
    }

    #[test]
    fn other_request_discards_supplied_booking_details() {
        let mut body = base_body();
        body["type_of_request"] = json!("Press inquiry");
        let submission = parse_submission(&body).expect("valid body");
        assert_eq!(submission.location, None);
        assert_eq!(submission.date, None);
    }

    #[test]
    fn music_dj_without_date_fails_with_date_error() {
        let mut body = base_body();
        body.as_object_mut().expect("object body").remove("date");
        let errors = parse_submission(&body).expect_err("date is required");
        assert_eq!(errors, vec!["date is required".to_string()]);
    }

    #[test]
    fn collects_every_field_error() {
        let body = json!({
            "first_name": "J",
            "email": "not-an-address",
            "type_of_request": 7,
            "message": "x"
        });
        let errors = parse_submission(&body).expect_err("invalid body");
        assert_eq!(
            errors,
            vec![
                "first_name must be 2 or more characters long".to_string(),
                "last_name is required".to_string(),
                "email must be a valid email address".to_string(),
                "type_of_request must be a string".to_string(),
                "message must be 2 or more characters long".to_string(),
            ]
        );
    }

    #[test]
    fn rejects_malformed_timestamp() {
        let mut body = base_body();
        body["timestamp"] = json!("2026-08-07T11:22:33Z");
        let errors = parse_submission(&body).expect_err("timestamp without millis");
        assert_eq!(
            errors,
            vec!["timestamp must be a valid ISO 8601 date and time with millis in UTC".to_string()]
        );
    }

    #[test]
    fn rejects_invalid_time_and_date_formats() {
        let mut body = base_body();
        body["date"] = json!("03.10.2026");
        body["time_start"] = json!("25:00");
        let errors = parse_submission(&body).expect_err("invalid formats");
        assert!(errors.contains(&"date must be a valid date".to_string()));
        assert!(errors.contains(&"time_start must be a valid time".to_string()));
    }
}
