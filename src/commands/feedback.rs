use crate::analysis::priority::{score_feedback, PriorityAssessment};
use crate::analysis::sentiment::resolve_sentiment;
use crate::commands::db;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::models::feedback::{
    or_placeholder, FeedbackItem, NewFeedback, Owner, RationaleEntry, Sentiment, DEFAULT_SOURCE,
    DEFAULT_STATUS, DEFAULT_TITLE,
};
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Default, Deserialize)]
pub struct CreateFeedbackRequest {
    pub title: Option<String>,
    pub text: Option<String>,
    pub source: Option<String>,
    pub sentiment: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateFeedbackResponse {
    pub id: i64,
    pub priority: i64,
    pub owner: Owner,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub text: Option<String>,
    pub source: Option<String>,
    pub sentiment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScorePreview {
    pub sentiment: Sentiment,
    pub source: String,
    pub priority: i64,
    pub owner: Owner,
    pub rationale: Vec<RationaleEntry>,
    pub matched_keywords: Vec<&'static str>,
}

/// Resolved scorer inputs together with the scorer's verdict.
#[derive(Debug)]
pub struct ScoredInput {
    pub text: String,
    pub source: String,
    pub sentiment: Sentiment,
    pub assessment: PriorityAssessment,
}

/// Validation, placeholder, sentiment and scoring steps shared by create and preview.
pub fn score_input(
    text: Option<String>,
    source: Option<String>,
    sentiment: Option<&str>,
) -> Result<ScoredInput, ApiError> {
    let text = require_text(text)?;
    let source = or_placeholder(source, DEFAULT_SOURCE);
    let sentiment =
        resolve_sentiment(&text, sentiment).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let assessment = score_feedback(&text, sentiment, &source);

    Ok(ScoredInput {
        text,
        source,
        sentiment,
        assessment,
    })
}

/// Validates a creation request and runs sentiment inference plus scoring.
pub fn prepare_feedback(request: CreateFeedbackRequest) -> Result<NewFeedback, ApiError> {
    let scored = score_input(request.text, request.source, request.sentiment.as_deref())?;

    Ok(NewFeedback {
        title: or_placeholder(request.title, DEFAULT_TITLE),
        text: scored.text,
        source: scored.source,
        sentiment: scored.sentiment,
        priority: scored.assessment.priority,
        owner: scored.assessment.owner,
        rationale: scored.assessment.rationale,
        status: or_placeholder(request.status, DEFAULT_STATUS),
    })
}

fn require_text(text: Option<String>) -> Result<String, ApiError> {
    text.filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("text is required".to_string()))
}

pub async fn create_feedback(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateFeedbackRequest>,
) -> Result<(StatusCode, Json<CreateFeedbackResponse>), ApiError> {
    let item = prepare_feedback(request)?;
    let (priority, owner) = (item.priority, item.owner);
    let created_at = chrono::Utc::now().timestamp_millis();

    let id = state
        .with_connection(move |conn| db::insert_feedback(conn, &item, created_at))
        .await?;

    log::info!("created feedback {id}: priority={priority} owner={owner}");

    Ok((
        StatusCode::CREATED,
        Json(CreateFeedbackResponse { id, priority, owner }),
    ))
}

pub async fn list_feedback(State(state): State<AppState>) -> Result<Json<Vec<FeedbackItem>>, ApiError> {
    let items = state.with_connection(db::list_feedback).await?;
    Ok(Json(items))
}

pub async fn get_feedback(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<FeedbackItem>, ApiError> {
    state
        .with_connection(move |conn| db::get_feedback(conn, id))
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

pub async fn update_status(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<UpdateStatusRequest>,
) -> Result<Json<Value>, ApiError> {
    let status = request
        .status
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("status is required".to_string()))?;

    let new_status = status.clone();
    let updated = state
        .with_connection(move |conn| db::update_feedback_status(conn, id, &new_status))
        .await?;

    if !updated {
        return Err(not_found(id));
    }

    log::info!("feedback {id} status -> {status}");
    Ok(Json(json!({ "id": id, "status": status })))
}

pub async fn delete_feedback(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Value>, ApiError> {
    let deleted = state
        .with_connection(move |conn| db::delete_feedback(conn, id))
        .await?;

    if !deleted {
        return Err(not_found(id));
    }

    log::info!("deleted feedback {id}");
    Ok(Json(json!({ "status": "deleted", "id": id })))
}

/// Scores without persisting anything.
pub async fn preview_score(
    ApiJson(request): ApiJson<ScoreRequest>,
) -> Result<Json<ScorePreview>, ApiError> {
    let scored = score_input(request.text, request.source, request.sentiment.as_deref())?;

    Ok(Json(ScorePreview {
        sentiment: scored.sentiment,
        source: scored.source,
        priority: scored.assessment.priority,
        owner: scored.assessment.owner,
        rationale: scored.assessment.rationale,
        matched_keywords: scored.assessment.matched_keywords,
    }))
}

fn not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("feedback {id} not found"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_text_is_rejected() {
        let err = prepare_feedback(CreateFeedbackRequest::default()).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let blank = prepare_feedback(CreateFeedbackRequest {
            text: Some("   ".to_string()),
            ..Default::default()
        });
        assert!(matches!(blank, Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn defaults_fill_optional_fields() {
        let item = prepare_feedback(CreateFeedbackRequest {
            text: Some("Love the new dashboard".to_string()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(item.title, DEFAULT_TITLE);
        assert_eq!(item.source, DEFAULT_SOURCE);
        assert_eq!(item.status, DEFAULT_STATUS);
        assert_eq!(item.sentiment, Sentiment::Positive);
        assert_eq!(item.priority, 1);
        assert_eq!(item.owner, Owner::ProductUx);
    }

    #[test]
    fn explicit_sentiment_overrides_inference() {
        let item = prepare_feedback(CreateFeedbackRequest {
            text: Some("Great, another crash".to_string()),
            sentiment: Some("Neutral".to_string()),
            source: Some("Slack".to_string()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(item.sentiment, Sentiment::Neutral);
        // (3 + crash 4) * 1.2 = 8.4
        assert_eq!(item.priority, 8);
        assert_eq!(item.owner, Owner::Engineering);
    }

    #[test]
    fn unknown_sentiment_label_is_rejected() {
        let result = prepare_feedback(CreateFeedbackRequest {
            text: Some("hello".to_string()),
            sentiment: Some("angry".to_string()),
            ..Default::default()
        });
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn created_record_matches_shared_scoring() {
        let text = "Billing failed again, please refund";
        let item = prepare_feedback(CreateFeedbackRequest {
            text: Some(text.to_string()),
            source: Some("Zendesk".to_string()),
            ..Default::default()
        })
        .unwrap();
        let scored = score_input(Some(text.to_string()), Some("Zendesk".to_string()), None).unwrap();

        assert_eq!(item.sentiment, scored.sentiment);
        assert_eq!(item.priority, scored.assessment.priority);
        assert_eq!(item.owner, scored.assessment.owner);
        assert_eq!(item.rationale, scored.assessment.rationale);
    }

    #[test]
    fn shared_scoring_applies_source_placeholder() {
        let scored = score_input(Some("slow search".to_string()), Some(" ".to_string()), Some("auto")).unwrap();

        assert_eq!(scored.source, DEFAULT_SOURCE);
        assert_eq!(scored.sentiment, Sentiment::Neutral);
        assert_eq!(scored.assessment.priority, 5);
        assert!(matches!(
            score_input(None, None, None),
            Err(ApiError::BadRequest(_))
        ));
    }
}
