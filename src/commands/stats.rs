use crate::commands::db::{self, GroupColumn};
use crate::models::stats::FeedbackStats;
use crate::state::AppState;
use axum::{extract::State, Json};

pub const HIGH_PRIORITY_THRESHOLD: i64 = 16;

pub async fn get_stats(State(state): State<AppState>) -> Json<FeedbackStats> {
    Json(collect_stats(&state).await)
}

/// Runs every count independently and waits for all of them. A failed
/// sub-query leaves its key unset instead of failing the whole response.
pub async fn collect_stats(state: &AppState) -> FeedbackStats {
    let (total, high_priority, by_status, by_owner, by_sentiment) = tokio::join!(
        state.with_connection(db::count_feedback),
        state.with_connection(|conn| db::count_priority_at_least(conn, HIGH_PRIORITY_THRESHOLD)),
        state.with_connection(|conn| db::count_grouped_by(conn, GroupColumn::Status)),
        state.with_connection(|conn| db::count_grouped_by(conn, GroupColumn::Owner)),
        state.with_connection(|conn| db::count_grouped_by(conn, GroupColumn::Sentiment)),
    );

    FeedbackStats {
        total: keep_ok("total", total),
        high_priority: keep_ok("highPriority", high_priority),
        by_status: keep_ok("byStatus", by_status),
        by_owner: keep_ok("byOwner", by_owner),
        by_sentiment: keep_ok("bySentiment", by_sentiment),
    }
}

fn keep_ok<T>(key: &str, result: Result<T, crate::error::ApiError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("stats sub-query {key} failed, omitting: {e}");
            None
        }
    }
}
