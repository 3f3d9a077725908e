use serde::{Deserialize, Serialize};

/// Audio forwarding configuration of the publisher side.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Keep the publisher's redundant (RED) audio encoding on down-tracks.
    /// When off, subscribers are handed tracks with RED stripped.
    #[serde(default)]
    pub active_red_encoding: bool,
}
