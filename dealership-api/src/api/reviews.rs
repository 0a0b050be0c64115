//! Review submission

use axum::{body::Bytes, extract::State};
use serde::Serialize;
use serde_json::{Map, Value};

use super::envelope::Envelope;
use super::{parse_json, MISSING_FIELDS};
use crate::clients::dealer::{ReviewSubmission, SubmitOutcome};
use crate::error::{ApiError, ApiResult};
use crate::session::RequestContext;
use crate::AppState;

/// Keys a submission must carry
pub const REQUIRED_REVIEW_FIELDS: [&str; 3] = ["dealership", "review", "purchase"];

#[derive(Debug, Serialize)]
pub struct ReviewAdded {
    pub message: &'static str,
    #[serde(rename = "reviewId")]
    pub review_id: Value,
}

/// POST /api/reviews
///
/// Requires a signed-in caller. The review is attributed to the caller's
/// display name regardless of what the body says.
pub async fn add_review(
    State(state): State<AppState>,
    ctx: RequestContext,
    body: Bytes,
) -> ApiResult<Envelope<ReviewAdded>> {
    let Some(author) = ctx.display_name() else {
        return Err(ApiError::Unauthorized("Unauthorized".to_string()));
    };

    let body: Value = parse_json(&body)?;
    let submission = build_submission(author, &body)?;

    match state.dealers.submit_review(&submission).await? {
        SubmitOutcome::Accepted { review_id } => {
            tracing::info!(dealership = %submission.dealership, review_id = %review_id, "Review added");
            Ok(Envelope::ok(ReviewAdded {
                message: "Review added successfully",
                review_id,
            }))
        }
        SubmitOutcome::Rejected { message } => {
            tracing::warn!(dealership = %submission.dealership, "Dealer service rejected review: {}", message);
            Err(ApiError::Validation(message))
        }
    }
}

fn build_submission(author: String, body: &Value) -> ApiResult<ReviewSubmission> {
    let Some(fields) = body.as_object() else {
        return Err(ApiError::Validation(MISSING_FIELDS.to_string()));
    };
    if !REQUIRED_REVIEW_FIELDS.iter().all(|key| fields.contains_key(*key)) {
        return Err(ApiError::Validation(MISSING_FIELDS.to_string()));
    }

    Ok(ReviewSubmission {
        id: field_or_empty(fields, "id"),
        name: author,
        dealership: field_or_empty(fields, "dealership"),
        review: field_or_empty(fields, "review"),
        purchase: field_or_empty(fields, "purchase"),
        purchase_date: field_or_empty(fields, "purchase_date"),
        car_make: field_or_empty(fields, "car_make"),
        car_model: field_or_empty(fields, "car_model"),
        car_year: field_or_empty(fields, "car_year"),
    })
}

fn field_or_empty(fields: &Map<String, Value>, key: &str) -> Value {
    fields
        .get(key)
        .cloned()
        .unwrap_or_else(|| Value::String(String::new()))
}

/// Any verb other than POST on the submission route
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed("Method not allowed".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_submission_fills_optionals_with_empty_strings() {
        let body = json!({"dealership": 15, "review": "Great", "purchase": true, "car_year": 2021});
        let submission = build_submission("Ada Lovelace".to_string(), &body).unwrap();

        assert_eq!(submission.name, "Ada Lovelace");
        assert_eq!(submission.dealership, json!(15));
        assert_eq!(submission.car_year, json!(2021));
        assert_eq!(submission.id, json!(""));
        assert_eq!(submission.purchase_date, json!(""));
        assert_eq!(submission.car_make, json!(""));
    }

    #[test]
    fn test_submission_ignores_client_supplied_name() {
        let body = json!({"dealership": 1, "review": "ok", "purchase": false, "name": "Mallory"});
        let submission = build_submission("Ada Lovelace".to_string(), &body).unwrap();
        assert_eq!(submission.name, "Ada Lovelace");
    }

    #[test]
    fn test_missing_required_field() {
        for body in [
            json!({"review": "ok", "purchase": false}),
            json!({"dealership": 1, "purchase": false}),
            json!({"dealership": 1, "review": "ok"}),
            json!(["dealership", "review", "purchase"]),
        ] {
            let err = build_submission("x".into(), &body).unwrap_err();
            assert!(matches!(err, ApiError::Validation(ref m) if m == MISSING_FIELDS), "{}", body);
        }
    }
}
