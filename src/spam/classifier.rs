use crate::{
    config::SpamConfig,
    domain::{SpamDecision, SpamReason},
};

/// Everything the classifier looks at for one submission. The tracker count
/// is the post-increment value for the requester's origin.
#[derive(Debug, Clone, Copy)]
pub struct SpamSignals {
    pub request_count: u32,
    pub has_client_timestamp: bool,
    pub region_allowed: bool,
    pub date_blocked: bool,
}

/// Layered decision: sustained per-origin volume is the only signal strong
/// enough to reject outright; each weak signal alone just routes the
/// submission into the manual-review queue.
pub fn classify(limits: &SpamConfig, signals: &SpamSignals) -> SpamDecision {
    let reject = signals.request_count > limits.reject_threshold;

    let mut reasons = Vec::new();
    if reject {
        reasons.push(SpamReason::TooManyRequests);
    } else if signals.request_count > limits.flag_threshold {
        reasons.push(SpamReason::RepeatedRequests(limits.flag_threshold));
    }
    if !signals.has_client_timestamp {
        reasons.push(SpamReason::MissingClientTimestamp);
    }
    if !signals.region_allowed {
        reasons.push(SpamReason::OutsideAllowedRegion);
    }
    if signals.date_blocked {
        reasons.push(SpamReason::BlockedDateCollision);
    }

    SpamDecision {
        reject,
        reject_reason: reject.then(|| SpamReason::TooManyRequests.to_string()),
        is_spam: !reasons.is_empty(),
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn limits() -> SpamConfig {
        SpamConfig {
            reject_threshold: 5,
            flag_threshold: 2,
            reset_cron: "0 0 0 * * *".to_string(),
        }
    }

    fn clean_signals(count: u32) -> SpamSignals {
        SpamSignals {
            request_count: count,
            has_client_timestamp: true,
            region_allowed: true,
            date_blocked: false,
        }
    }

    #[test]
    fn low_volume_clean_submission_is_ham() {
        let decision = classify(&limits(), &clean_signals(1));
        assert_eq!(
            decision,
            SpamDecision {
                reject: false,
                reject_reason: None,
                is_spam: false,
                reasons: vec![],
            }
        );
    }

    #[test]
    fn sixth_request_is_hard_rejected() {
        for count in [6, 7, 50] {
            let decision = classify(&limits(), &clean_signals(count));
            assert!(decision.reject);
            assert!(decision.is_spam);
            assert_eq!(
                decision.reject_reason.as_deref(),
                Some("Too many requests within a day")
            );
            assert_eq!(decision.reasons, vec![SpamReason::TooManyRequests]);
        }
    }

    #[test]
    fn third_through_fifth_requests_are_flagged_not_rejected() {
        for count in [3, 4, 5] {
            let decision = classify(&limits(), &clean_signals(count));
            assert!(!decision.reject);
            assert_eq!(decision.reject_reason, None);
            assert!(decision.is_spam);
            assert_eq!(decision.reasons, vec![SpamReason::RepeatedRequests(2)]);
        }
    }

    #[test]
    fn single_weak_signal_flags_for_review() {
        let mut signals = clean_signals(1);
        signals.has_client_timestamp = false;
        let decision = classify(&limits(), &signals);
        assert!(!decision.reject);
        assert!(decision.is_spam);
        assert_eq!(decision.reasons, vec![SpamReason::MissingClientTimestamp]);

        let mut signals = clean_signals(2);
        signals.date_blocked = true;
        let decision = classify(&limits(), &signals);
        assert!(!decision.reject);
        assert_eq!(decision.reasons, vec![SpamReason::BlockedDateCollision]);
    }

    #[test]
    fn all_signals_fire_in_stable_order() {
        let decision = classify(
            &limits(),
            &SpamSignals {
                request_count: 3,
                has_client_timestamp: false,
                region_allowed: false,
                date_blocked: true,
            },
        );
        assert!(!decision.reject);
        assert!(decision.is_spam);
        assert_eq!(
            decision.reasons,
            vec![
                SpamReason::RepeatedRequests(2),
                SpamReason::MissingClientTimestamp,
                SpamReason::OutsideAllowedRegion,
                SpamReason::BlockedDateCollision,
            ]
        );
    }

    #[test]
    fn rejection_still_lists_secondary_reasons() {
        let decision = classify(
            &limits(),
            &SpamSignals {
                request_count: 6,
                has_client_timestamp: false,
                region_allowed: true,
                date_blocked: false,
            },
        );
        assert!(decision.reject);
        assert_eq!(
            decision.reasons,
            vec![
                SpamReason::TooManyRequests,
                SpamReason::MissingClientTimestamp,
            ]
        );
    }
}
