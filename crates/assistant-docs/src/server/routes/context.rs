//! Prompt context endpoint

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::ContextResponse;

#[derive(Debug, Deserialize)]
pub struct ContextParams {
    pub user_id: Option<String>,
}

/// GET /api/context - Context block for a user plus company documents
pub async fn get_context(
    State(state): State<AppState>,
    Query(params): Query<ContextParams>,
) -> Result<Json<ContextResponse>> {
    let user_id = params.user_id.as_deref().map(str::trim).filter(|id| !id.is_empty());
    let response = state.context().build_for_user(user_id).await?;

    tracing::debug!(
        "Built context ({} user, {} company documents, {} chars)",
        response.user_documents,
        response.company_documents,
        response.context.chars().count()
    );

    Ok(Json(response))
}
