use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::{
    app::ServiceContext,
    domain::validate,
    mail::template,
    spam::{classify, SpamSignals},
    store::HeldRecord,
};

pub async fn submit(
    State(ctx): State<Arc<ServiceContext>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let ip = client_ip(&headers, peer);

    let submission = match validate::parse_submission(&body) {
        Ok(submission) => submission,
        Err(errors) => {
            tracing::debug!(target: "http", ip = %ip, ?errors, "submission failed validation");
            return (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response();
        }
    };

    let count = ctx.tracker.record_and_count(&ip);
    let region_allowed = ctx.region.is_allowed_region(&ip).await;
    let date_blocked = submission
        .date
        .map(|date| ctx.blocked_dates.is_blocked(&date))
        .unwrap_or(false);

    let decision = classify(
        &ctx.config.spam,
        &SpamSignals {
            request_count: count,
            has_client_timestamp: submission.client_timestamp.is_some(),
            region_allowed,
            date_blocked,
        },
    );
    tracing::info!(
        target: "http",
        ip = %ip,
        count,
        reject = decision.reject,
        spam = decision.is_spam,
        reasons = ?decision.reasons,
        "contact form decision"
    );

    if decision.reject {
        let reason = decision
            .reject_reason
            .unwrap_or_else(|| "Too many requests".to_string());
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "errors": [reason] })),
        )
            .into_response();
    }

    let subject = template::submission_subject(&submission.request_type);
    let body_text = template::submission_body(&submission);

    if decision.is_spam {
        let record = HeldRecord {
            from_display: submission.sender_display(),
            reply_to: submission.email.clone(),
            subject,
            body: body_text,
        };
        let token = match ctx.held.put(record.clone()).await {
            Ok(token) => token,
            Err(err) => {
                tracing::error!(target: "store", error = %err, "failed to hold submission");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "errors": ["failed to store submission for review"] })),
                )
                    .into_response();
            }
        };

        let report = template::spam_report_body(
            &record,
            &decision.reasons,
            &ctx.config.server.public_base_url,
            &token,
        );
        if let Err(err) = ctx
            .mailer
            .send_spam_report(&template::spam_report_subject(&record.subject), &report)
            .await
        {
            // The record is safely held; surface the token in the log so the
            // review can still happen without the report mail.
            tracing::error!(target: "mail", error = %err, token = %token, "failed to send spam report");
        }
        return (StatusCode::OK, Json(json!({ "message": "Success" }))).into_response();
    }

    match ctx
        .mailer
        .send_submission(
            &submission.sender_display(),
            &submission.email,
            &subject,
            &body_text,
        )
        .await
    {
        Ok(()) => (StatusCode::OK, Json(json!({ "message": "Success" }))).into_response(),
        Err(err) => {
            tracing::error!(target: "mail", error = %err, "failed to relay submission");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "errors": ["failed to relay submission"] })),
            )
                .into_response()
        }
    }
}

pub async fn spam_action(
    State(ctx): State<Arc<ServiceContext>>,
    Path((token, action)): Path<(String, String)>,
) -> Response {
    match action.as_str() {
        "accept" | "reject" => {}
        other => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "errors": [format!("unknown action {other}, expected accept or reject")] })),
            )
                .into_response();
        }
    }

    let Some(record) = ctx.held.get(&token).await else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "errors": ["unknown token"] })),
        )
            .into_response();
    };

    if action == "accept" {
        if let Err(err) = ctx
            .mailer
            .send_submission(
                &record.from_display,
                &record.reply_to,
                &record.subject,
                &record.body,
            )
            .await
        {
            tracing::error!(target: "mail", error = %err, token = %token, "failed to relay held submission");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "errors": ["failed to relay held submission"] })),
            )
                .into_response();
        }
    }

    match ctx.held.remove(&token).await {
        Ok(_) => {
            tracing::info!(target: "http", token = %token, action = %action, "held submission resolved");
            (StatusCode::OK, Json(json!({ "message": "Success" }))).into_response()
        }
        Err(err) => {
            tracing::error!(target: "store", error = %err, token = %token, "failed to remove held submission");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "errors": ["failed to update the review store"] })),
            )
                .into_response()
        }
    }
}

pub async fn blocked_dates(State(ctx): State<Arc<ServiceContext>>) -> Json<Vec<String>> {
    let dates = ctx
        .blocked_dates
        .current()
        .days
        .iter()
        .map(|day| day.format("%Y-%m-%d").to_string())
        .collect();
    Json(dates)
}

/// The service runs behind a trusting reverse proxy, so the first
/// X-Forwarded-For entry wins; direct connections fall back to the peer
/// address.
fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| peer.ip().to_string())
}
