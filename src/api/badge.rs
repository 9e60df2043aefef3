use axum::{ extract::State, http::header, response::IntoResponse, Json };
use serde::Deserialize;

use crate::badge::{ BadgeImage, BadgeRequest };
use crate::error::Result;
use crate::services::badge_service::IssuedBadge;

use super::AppState;

#[derive(Deserialize)]
pub struct RenderBadgeRequest {
    pub label: String,
    pub link_target: String,
}

#[derive(Deserialize)]
pub struct IssueBadgeRequest {
    pub form_id: String,
    pub participant_id: String,
}

pub async fn render_badge(
    State(state): State<AppState>,
    Json(request): Json<RenderBadgeRequest>
) -> Result<impl IntoResponse> {
    let request = BadgeRequest::new(request.label, request.link_target)?;
    let image = state.badge_service.render(request).await?;

    Ok(([(header::CONTENT_TYPE, BadgeImage::CONTENT_TYPE)], image.into_bytes()))
}

pub async fn issue_badge(
    State(state): State<AppState>,
    Json(request): Json<IssueBadgeRequest>
) -> Result<Json<IssuedBadge>> {
    let issued = state.badge_service.issue(request.form_id, request.participant_id).await?;

    Ok(Json(issued))
}
