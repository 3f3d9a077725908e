
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TrackId;

/// TrackType determines the kind of media a track carries.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackType {
    #[default]
    Audio,
    Video,
    Data,
}

impl fmt::Display for TrackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            TrackType::Audio => "audio",
            TrackType::Video => "video",
            TrackType::Data => "data",
        };
        write!(f, "{s}")
    }
}

/// TrackSource describes where the publisher captured a track from.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackSource {
    #[default]
    Unknown,
    Camera,
    Microphone,
    ScreenShare,
    ScreenShareAudio,
}

/// EncryptionType describes end-to-end encryption applied by the publisher.
/// Encrypted payloads are forwarded opaquely.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncryptionType {
    #[default]
    None,
    Gcm,
    Custom,
}

/// VideoQuality names a simulcast quality tier. `Off` is the sentinel for a
/// disabled layer and never maps to an ordinal.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoQuality {
    #[default]
    Low,
    Medium,
    High,
    Off,
}

impl VideoQuality {
    /// from_ordinal maps a layer index to its quality tier, clamping above
    /// the highest tier.
    pub fn from_ordinal(i: usize) -> Self {
        match i {
            0 => VideoQuality::Low,
            1 => VideoQuality::Medium,
            _ => VideoQuality::High,
        }
    }

    /// ordinal is the layer index of this tier; `Off` sorts after all tiers.
    pub fn ordinal(&self) -> usize {
        match self {
            VideoQuality::Low => 0,
            VideoQuality::Medium => 1,
            VideoQuality::High => 2,
            VideoQuality::Off => 3,
        }
    }
}

impl fmt::Display for VideoQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            VideoQuality::Low => "low",
            VideoQuality::Medium => "medium",
            VideoQuality::High => "high",
            VideoQuality::Off => "off",
        };
        write!(f, "{s}")
    }
}

/// VideoLayer describes one spatial layer of a published video track.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoLayer {
    pub quality: VideoQuality,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    /// Zero until the layer's first packet reveals it.
    #[serde(default)]
    pub ssrc: u32,
}

/// SimulcastCodecInfo describes one codec of a multi-codec publication.
/// The codec at index 0 of [`TrackInfo::codecs`] is the primary codec.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulcastCodecInfo {
    pub mime_type: String,
    #[serde(default)]
    pub mid: String,
    /// Client-side id of the codec's local track.
    #[serde(default)]
    pub cid: String,
    #[serde(default)]
    pub layers: Vec<VideoLayer>,
}

/// SimulcastCodec is the client's short-form codec announcement used to patch
/// cids after a publish.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulcastCodec {
    pub codec: String,
    #[serde(default)]
    pub cid: String,
}

/// TrackInfo is the authoritative metadata of a published track.
///
/// The top-level `mime_type`, `mid` and `layers` mirror the primary codec for
/// clients that do not understand multi-codec publications; the mirror is
/// re-established after every mutation of the codec list.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub sid: TrackId,
    #[serde(rename = "type")]
    pub kind: TrackType,
    #[serde(default)]
    pub source: TrackSource,
    #[serde(default)]
    pub stream: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub simulcast: bool,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub encryption: EncryptionType,
    #[serde(default)]
    pub disable_red: bool,
    #[serde(default)]
    pub mid: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub codecs: Vec<SimulcastCodecInfo>,
    #[serde(default)]
    pub layers: Vec<VideoLayer>,
}

impl TrackInfo {
    /// primary_codec returns the codec old-style clients are served.
    pub fn primary_codec(&self) -> Option<&SimulcastCodecInfo> {
        self.codecs.first()
    }

    /// sync_layers_from_primary re-establishes the top-level layer mirror.
    /// A track without a codec list keeps its layers as provided.
    pub fn sync_layers_from_primary(&mut self) {
        if let Some(primary) = self.codecs.first() {
            self.layers = primary.layers.clone();
        }
    }
}

/// RtpStats is the forwarding tally a receive pipeline reports for one codec.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RtpStats {
    pub packets: u64,
    pub bytes: u64,
    pub packets_lost: u64,
    pub nacks: u32,
    pub plis: u32,
    pub firs: u32,
    /// Interarrival jitter in RTP timestamp units, worst stream wins.
    #[serde(default)]
    pub jitter: f64,
}

/// aggregate_rtp_stats folds per-codec stats into one track-level tally.
/// Counters add up; jitter keeps the worst value.
pub fn aggregate_rtp_stats(stats: &[RtpStats]) -> Option<RtpStats> {
    if stats.is_empty() {
        return None;
    }

    let mut agg = RtpStats::default();
    for s in stats {
        agg.packets += s.packets;
        agg.bytes += s.bytes;
        agg.packets_lost += s.packets_lost;
        agg.nacks += s.nacks;
        agg.plis += s.plis;
        agg.firs += s.firs;
        if s.jitter > agg.jitter {
            agg.jitter = s.jitter;
        }
    }
    Some(agg)
}
