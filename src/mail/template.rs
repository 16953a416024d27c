use std::fmt::Write;

use url::Url;

use crate::{
    domain::{RequestType, SpamReason, Submission},
    store::HeldRecord,
};

pub fn submission_subject(request_type: &RequestType) -> String {
    format!("Kontaktanfrage zu {request_type}")
}

/// Plain-text notification body. Booking requests lead with the
/// location/date/time line; "other" requests only carry the request type.
pub fn submission_body(submission: &Submission) -> String {
    let header = match (
        &submission.location,
        &submission.date,
        &submission.time_start,
        &submission.time_end,
    ) {
        (Some(location), Some(date), Some(start), Some(end)) => format!(
            "{location}, {}, {} bis {}",
            date.format("%d.%m.%Y"),
            start.format("%H:%M"),
            end.format("%H:%M"),
        ),
        _ => submission.request_type.to_string(),
    };
    format!("-----\n{header}\n-----\n\n{}", submission.message)
}

pub fn spam_report_subject(subject: &str) -> String {
    format!("***SPAM*** {subject}")
}

/// Report mailed to the spam recipient when a submission is held: the fired
/// reasons, the held submission itself, and the accept/reject action links.
pub fn spam_report_body(
    record: &HeldRecord,
    reasons: &[SpamReason],
    public_base_url: &Url,
    token: &str,
) -> String {
    let mut out = String::from("This contact request was held for manual review.\n\nReasons:\n");
    for reason in reasons {
        let _ = writeln!(out, "- {reason}");
    }
    let _ = write!(
        out,
        "\nFrom: {} <{}>\nSubject: {}\n\n{}\n\nAccept: {}\nReject: {}\n",
        record.from_display,
        record.reply_to,
        record.subject,
        record.body,
        action_url(public_base_url, token, "accept"),
        action_url(public_base_url, token, "reject"),
    );
    out
}

fn action_url(public_base_url: &Url, token: &str, action: &str) -> String {
    format!(
        "{}/v1/spam/{token}/{action}",
        public_base_url.as_str().trim_end_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};
    use pretty_assertions::assert_eq;

    use super::*;

    fn booking_submission() -> Submission {
        Submission {
            first_name: "Jana".to_string(),
            last_name: "Schmidt".to_string(),
            email: "jana.schmidt@example.com".to_string(),
            request_type: RequestType::MusicDj,
            location: Some("Hamburg".to_string()),
            date: NaiveDate::from_ymd_opt(2026, 10, 3),
            time_start: NaiveTime::from_hms_opt(18, 0, 0),
            time_end: NaiveTime::from_hms_opt(23, 30, 0),
            message: "Looking for a DJ.".to_string(),
            client_timestamp: None,
        }
    }

    #[test]
    fn booking_body_renders_german_date_line() {
        let submission = booking_submission();
        assert_eq!(
            submission_body(&submission),
            "-----\nHamburg, 03.10.2026, 18:00 bis 23:30\n-----\n\nLooking for a DJ."
        );
        assert_eq!(
            submission_subject(&submission.request_type),
            "Kontaktanfrage zu Music/DJ"
        );
    }

    #[test]
    fn other_body_falls_back_to_request_type_line() {
        let mut submission = booking_submission();
        submission.request_type = RequestType::Other("Press inquiry".to_string());
        submission.location = None;
        submission.date = None;
        submission.time_start = None;
        submission.time_end = None;
        assert_eq!(
            submission_body(&submission),
            "-----\nPress inquiry\n-----\n\nLooking for a DJ."
        );
    }

    #[test]
    fn spam_report_lists_reasons_and_action_links() {
        let record = HeldRecord {
            from_display: "Jana Schmidt".to_string(),
            reply_to: "jana.schmidt@example.com".to_string(),
            subject: "Kontaktanfrage zu Music/DJ".to_string(),
            body: "-----\nHamburg, 03.10.2026, 18:00 bis 23:30\n-----\n\nHi".to_string(),
        };
        let base = Url::parse("https://forms.example.com/").expect("valid url");
        let report = spam_report_body(
            &record,
            &[
                SpamReason::RepeatedRequests(2),
                SpamReason::BlockedDateCollision,
            ],
            &base,
            "ABCD2345",
        );

        assert!(report.contains("- More than 2 requests within a day"));
        assert!(report.contains("- Requested date collides with a blocked date"));
        assert!(report.contains("From: Jana Schmidt <jana.schmidt@example.com>"));
        assert!(report.contains("Accept: https://forms.example.com/v1/spam/ABCD2345/accept"));
        assert!(report.contains("Reject: https://forms.example.com/v1/spam/ABCD2345/reject"));
    }
}
