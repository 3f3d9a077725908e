use async_trait::async_trait;

use crate::track_info::TrackInfo;
use crate::ParticipantId;

/// TelemetryService receives lifecycle events about published tracks.
#[async_trait]
pub trait TelemetryService: Send + Sync {
    /// track_published_update reports a change in the shape of a published
    /// track, e.g. its forwarded layer ceiling moved.
    async fn track_published_update(&self, publisher_id: &ParticipantId, info: TrackInfo);
}
