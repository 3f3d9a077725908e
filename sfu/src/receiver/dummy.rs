use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;

use serde_json::json;
use webrtc::rtp_transceiver::rtp_codec::{
    RTCRtpCodecParameters, RTCRtpHeaderExtensionParameters,
};
use webrtc::util::sync::RwLock;

use crate::layer::INVALID_LAYER_SPATIAL;
use crate::track_info::{RtpStats, TrackInfo};
use crate::TrackId;

use super::TrackReceiver;

/// DummyReceiver stands in for a codec the publisher has announced but not
/// yet published. It answers with the provisional codec parameters until it
/// is upgraded in place to the real receive pipeline; holders observe the
/// upgrade transparently.
///
/// Pause and expected-layer signals that arrive before the upgrade are
/// remembered and replayed onto the real receiver.
pub struct DummyReceiver {
    track_id: TrackId,
    stream_id: String,
    codec: RTCRtpCodecParameters,
    header_extensions: Vec<RTCRtpHeaderExtensionParameters>,

    receiver: RwLock<Option<Arc<dyn TrackReceiver>>>,

    up_track_paused: AtomicBool,
    max_expected_spatial_layer: AtomicI32,
}

impl DummyReceiver {
    pub fn new(
        track_id: TrackId,
        stream_id: String,
        codec: RTCRtpCodecParameters,
        header_extensions: Vec<RTCRtpHeaderExtensionParameters>,
    ) -> Self {
        Self {
            track_id,
            stream_id,
            codec,
            header_extensions,
            receiver: RwLock::new(None),
            up_track_paused: AtomicBool::new(false),
            max_expected_spatial_layer: AtomicI32::new(INVALID_LAYER_SPATIAL),
        }
    }

    /// upgrade installs the real receiver. Only the first call wins; later
    /// calls leave the installed receiver untouched. Returns whether this
    /// call's receiver was installed.
    ///
    /// Callers follow a winning upgrade with [`DummyReceiver::apply_saved_state`]
    /// once they are outside any coordination lock.
    pub fn upgrade(&self, receiver: Arc<dyn TrackReceiver>) -> bool {
        let mut cur = self.receiver.write();
        if cur.is_some() {
            log::warn!(
                "ignoring duplicate upgrade, mime: {}",
                self.codec.capability.mime_type
            );
            return false;
        }
        *cur = Some(receiver);
        true
    }

    /// apply_saved_state replays signals that arrived while the codec was
    /// still a placeholder onto the upgraded receiver.
    pub fn apply_saved_state(&self) {
        let receiver = match self.receiver.read().clone() {
            Some(r) => r,
            None => return,
        };

        receiver.set_up_track_paused(self.up_track_paused.load(Ordering::SeqCst));
        let layer = self.max_expected_spatial_layer.load(Ordering::SeqCst);
        if layer != INVALID_LAYER_SPATIAL {
            receiver.set_max_expected_spatial_layer(layer);
        }
    }

    /// receiver returns the upgraded delegate, if any.
    pub fn receiver(&self) -> Option<Arc<dyn TrackReceiver>> {
        self.receiver.read().clone()
    }
}

impl TrackReceiver for DummyReceiver {
    fn track_id(&self) -> TrackId {
        self.track_id.clone()
    }

    fn stream_id(&self) -> String {
        self.stream_id.clone()
    }

    fn codec(&self) -> RTCRtpCodecParameters {
        match self.receiver.read().as_ref() {
            Some(r) => r.codec(),
            None => self.codec.clone(),
        }
    }

    fn header_extensions(&self) -> Vec<RTCRtpHeaderExtensionParameters> {
        match self.receiver.read().as_ref() {
            Some(r) => r.header_extensions(),
            None => self.header_extensions.clone(),
        }
    }

    fn is_closed(&self) -> bool {
        match self.receiver.read().as_ref() {
            Some(r) => r.is_closed(),
            None => false,
        }
    }

    fn set_max_expected_spatial_layer(&self, layer: i32) {
        self.max_expected_spatial_layer.store(layer, Ordering::SeqCst);
        if let Some(r) = self.receiver.read().clone() {
            r.set_max_expected_spatial_layer(layer);
        }
    }

    fn set_up_track_paused(&self, paused: bool) {
        self.up_track_paused.store(paused, Ordering::SeqCst);
        if let Some(r) = self.receiver.read().clone() {
            r.set_up_track_paused(paused);
        }
    }

    fn update_track_info(&self, info: &TrackInfo) {
        if let Some(r) = self.receiver.read().clone() {
            r.update_track_info(info);
        }
    }

    fn get_audio_level(&self) -> (f64, bool) {
        match self.receiver.read().as_ref() {
            Some(r) => r.get_audio_level(),
            None => (0.0, false),
        }
    }

    fn get_temporal_layer_fps_for_spatial(&self, spatial: i32) -> Vec<f32> {
        match self.receiver.read().as_ref() {
            Some(r) => r.get_temporal_layer_fps_for_spatial(spatial),
            None => Vec::new(),
        }
    }

    fn get_track_stats(&self) -> Option<RtpStats> {
        self.receiver.read().as_ref().and_then(|r| r.get_track_stats())
    }

    fn debug_info(&self) -> serde_json::Value {
        match self.receiver.read().as_ref() {
            Some(r) => r.debug_info(),
            None => json!({
                "Type": "DummyReceiver",
                "Codec": self.codec.capability.mime_type,
            }),
        }
    }
}
