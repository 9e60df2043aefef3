use std::sync::Arc;

use serde::Serialize;

use crate::badge::{ self, BadgeImage, BadgeRequest, LabelFont };
use crate::config::{ participant_url, BadgeConfig };
use crate::error::{ AppError, Result };
use crate::storage::BlobStore;

pub struct BadgeService {
    config: Arc<BadgeConfig>,
    base_url: String,
    font: Arc<LabelFont>,
    store: Arc<dyn BlobStore>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedBadge {
    pub url: String,
    pub link_target: String,
    pub label: String,
}

impl BadgeService {
    pub fn new(
        config: BadgeConfig,
        base_url: String,
        font: Arc<LabelFont>,
        store: Arc<dyn BlobStore>
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config: Arc::new(config),
            base_url,
            font,
            store,
        })
    }

    /// Renders a badge on the blocking pool.
    pub async fn render(&self, request: BadgeRequest) -> Result<BadgeImage> {
        request.validate()?;

        let config = self.config.clone();
        let font = self.font.clone();

        tokio::task
            ::spawn_blocking(move || badge::render(&request, &config, &font)).await
            .map_err(|e| AppError::Internal(format!("Badge render task failed: {}", e)))?
    }

    /// Renders the badge for a registration and stores it as `qr-<participant_id>.png`.
    pub async fn issue(&self, form_id: String, participant_id: String) -> Result<IssuedBadge> {
        check_participant_id(&participant_id)?;

        let link_target = participant_url(&self.base_url, &participant_id);
        let request = BadgeRequest::new(form_id, link_target)?;

        let image = self.render(request.clone()).await.map_err(|e| {
            tracing::error!("Badge generation failed for participant {}: {}", participant_id, e);
            e
        })?;

        let name = format!("qr-{}.png", participant_id);
        let url = self.store.put(&name, image.into_bytes(), BadgeImage::CONTENT_TYPE).await?;

        tracing::info!("Issued badge '{}' for participant {} at {}", request.label, participant_id, url);

        Ok(IssuedBadge {
            url,
            link_target: request.link_target,
            label: request.label,
        })
    }
}

/// Participant IDs become part of the stored file name, so they must be a single plain path
/// segment.
fn check_participant_id(participant_id: &str) -> Result<()> {
    if participant_id.trim().is_empty() {
        return Err(AppError::InvalidInput("Participant ID must not be empty".to_string()));
    }

    let unsafe_char = participant_id
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_control());
    if unsafe_char || participant_id.contains("..") {
        return Err(
            AppError::InvalidInput(
                format!("Participant ID '{}' is not a valid file name part", participant_id.escape_debug())
            )
        );
    }

    Ok(())
}
