
pub mod dummy;
pub mod wrapped;

use std::sync::Arc;

use webrtc::api::media_engine::{MIME_TYPE_AV1, MIME_TYPE_VP9};
use webrtc::rtp_transceiver::rtp_codec::{
    RTCRtpCodecParameters, RTCRtpHeaderExtensionParameters,
};

use crate::track_info::{RtpStats, TrackInfo};
use crate::TrackId;

use self::dummy::DummyReceiver;

/// RTP header extension carrying the AV1 dependency descriptor. Negotiated
/// only for SVC codecs; placeholders for non-SVC codecs must not offer it.
pub const DEPENDENCY_DESCRIPTOR_URI: &str =
    "https://aomediacodec.github.io/av1-rtp-spec/#dependency-descriptor-rtp-header-extension";

/// is_svc_codec reports whether a mime identifies a scalable video codec,
/// i.e. one that layers a single bitstream instead of simulcasting.
pub fn is_svc_codec(mime: &str) -> bool {
    mime.eq_ignore_ascii_case(MIME_TYPE_AV1) || mime.eq_ignore_ascii_case(MIME_TYPE_VP9)
}

/// TrackReceiver is one codec's receive pipeline: the lower-level primitive
/// that owns jitter buffering and packet forwarding for a published track.
/// This crate only drives its lifecycle and metadata.
pub trait TrackReceiver: Send + Sync {
    /// track_id returns the id of the track this receiver serves.
    fn track_id(&self) -> TrackId;

    /// stream_id returns the publisher stream the track belongs to.
    fn stream_id(&self) -> String;

    /// codec returns the negotiated codec parameters of this pipeline.
    fn codec(&self) -> RTCRtpCodecParameters;

    /// header_extensions returns the negotiated RTP header extensions.
    fn header_extensions(&self) -> Vec<RTCRtpHeaderExtensionParameters>;

    /// is_closed reports whether the pipeline has shut down on its own,
    /// e.g. because the upstream transport went away.
    fn is_closed(&self) -> bool;

    /// set_max_expected_spatial_layer caps the spatial layer the publisher is
    /// asked to keep sending.
    fn set_max_expected_spatial_layer(&self, layer: i32);

    /// set_up_track_paused pauses or resumes consumption of the publisher's
    /// upstream track.
    fn set_up_track_paused(&self, paused: bool);

    /// update_track_info hands the pipeline a fresh copy of the track
    /// metadata it forwards under.
    fn update_track_info(&self, info: &TrackInfo);

    /// get_audio_level returns the smoothed audio level in the range 0..=1
    /// and whether the value is valid.
    fn get_audio_level(&self) -> (f64, bool);

    /// get_temporal_layer_fps_for_spatial returns the frame rate of each
    /// temporal layer within the given spatial layer, lowest first.
    fn get_temporal_layer_fps_for_spatial(&self, spatial: i32) -> Vec<f32>;

    fn get_track_stats(&self) -> Option<RtpStats>;

    fn debug_info(&self) -> serde_json::Value;
}

/// SlotReceiver is the inner of a simulcast slot: either a placeholder for a
/// codec the publisher has only announced, or a live receive pipeline.
#[derive(Clone)]
pub enum SlotReceiver {
    Pending(Arc<DummyReceiver>),
    Live(Arc<dyn TrackReceiver>),
}

impl SlotReceiver {
    /// as_receiver returns the slot's receiver view. A pending slot answers
    /// through its placeholder, which proxies once upgraded.
    pub fn as_receiver(&self) -> Arc<dyn TrackReceiver> {
        match self {
            SlotReceiver::Pending(d) => d.clone(),
            SlotReceiver::Live(r) => r.clone(),
        }
    }

    /// live_receiver sees through a pending slot to its upgraded delegate.
    /// Returns None while the codec is announced but unpublished.
    pub fn live_receiver(&self) -> Option<Arc<dyn TrackReceiver>> {
        match self {
            SlotReceiver::Pending(d) => d.receiver(),
            SlotReceiver::Live(r) => Some(r.clone()),
        }
    }
}

/// SimulcastReceiverSlot binds one codec's receiver to its position in the
/// publisher's codec preference order. Slots are immutable; an upgrade swaps
/// the placeholder's delegate, never the slot.
pub struct SimulcastReceiverSlot {
    receiver: SlotReceiver,
    priority: usize,
}

impl SimulcastReceiverSlot {
    pub fn new(receiver: SlotReceiver, priority: usize) -> Self {
        Self { receiver, priority }
    }

    pub fn receiver(&self) -> &SlotReceiver {
        &self.receiver
    }

    pub fn priority(&self) -> usize {
        self.priority
    }

    /// mime_type returns the codec mime this slot is keyed by.
    pub fn mime_type(&self) -> String {
        self.receiver.as_receiver().codec().capability.mime_type
    }
}
