use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use sha2::{Digest, Sha256};

/// One calendar event reduced to the days it touches in the reference
/// timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedEvent {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Parses VEVENT entries out of an ICS feed. Unknown properties and
/// malformed events are skipped, never fatal; a missing DTEND means a
/// single-day event. The one-day padding applied later absorbs the
/// exclusive-DTEND convention of all-day events.
pub fn parse_feed(ics: &str, tz: Tz) -> Vec<FeedEvent> {
    let mut events = Vec::new();
    let mut in_event = false;
    let mut start = None;
    let mut end = None;

    for line in unfold_lines(ics) {
        match line.as_str() {
            "BEGIN:VEVENT" => {
                in_event = true;
                start = None;
                end = None;
            }
            "END:VEVENT" => {
                if in_event {
                    if let Some(start) = start {
                        let end = end.unwrap_or(start);
                        if end < start {
                            tracing::warn!(
                                target: "calendar",
                                %start,
                                %end,
                                "event ends before it starts, skipping"
                            );
                        } else {
                            events.push(FeedEvent { start, end });
                        }
                    }
                }
                in_event = false;
            }
            _ if in_event => {
                if let Some((name, params, value)) = split_property(&line) {
                    match name {
                        "DTSTART" => start = parse_stamp(&params, value, tz),
                        "DTEND" => end = parse_stamp(&params, value, tz),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    events
}

/// Expands events into the blocked-day sequence: every day an event spans,
/// padded by one day on each side, sorted ascending and deduplicated.
pub fn expand_blocked_days(events: &[FeedEvent]) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    for event in events {
        let mut day = event.start.pred_opt().unwrap_or(event.start);
        let last = event.end.succ_opt().unwrap_or(event.end);
        while day <= last {
            days.push(day);
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
    }
    days.sort_unstable();
    days.dedup();
    days
}

/// Stable content digest over the canonical serialization (one ISO date per
/// line); equal feeds always hash equal regardless of event order.
pub fn digest(days: &[NaiveDate]) -> String {
    let mut hasher = Sha256::new();
    for day in days {
        hasher.update(day.format("%Y-%m-%d").to_string().as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

/// ICS folds long lines by continuing them with a leading space or tab.
fn unfold_lines(ics: &str) -> Vec<String> {
    let mut unfolded: Vec<String> = Vec::new();
    for raw in ics.lines() {
        let line = raw.trim_end_matches('\r');
        if let Some(continuation) = line.strip_prefix([' ', '\t']) {
            if let Some(previous) = unfolded.last_mut() {
                previous.push_str(continuation);
                continue;
            }
        }
        unfolded.push(line.to_string());
    }
    unfolded
}

fn split_property(line: &str) -> Option<(&str, Vec<&str>, &str)> {
    let (head, value) = line.split_once(':')?;
    let mut parts = head.split(';');
    let name = parts.next()?;
    Some((name, parts.collect(), value))
}

fn parse_stamp(params: &[&str], value: &str, tz: Tz) -> Option<NaiveDate> {
    if params.iter().any(|p| *p == "VALUE=DATE") || !value.contains('T') {
        return NaiveDate::parse_from_str(value, "%Y%m%d").ok();
    }

    if let Some(stripped) = value.strip_suffix('Z') {
        let naive = NaiveDateTime::parse_from_str(stripped, "%Y%m%dT%H%M%S").ok()?;
        let utc: DateTime<Utc> = DateTime::from_naive_utc_and_offset(naive, Utc);
        return Some(utc.with_timezone(&tz).date_naive());
    }

    let naive = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S").ok()?;
    let zone: Tz = params
        .iter()
        .find_map(|p| p.strip_prefix("TZID="))
        .and_then(|tzid| tzid.parse().ok())
        .unwrap_or(tz);
    Some(
        zone.from_local_datetime(&naive)
            .earliest()?
            .with_timezone(&tz)
            .date_naive(),
    )
}
