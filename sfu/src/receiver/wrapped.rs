use std::sync::Arc;

use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecParameters;

use crate::TrackId;

use super::{SimulcastReceiverSlot, TrackReceiver};

/// WrappedReceiver is the frozen bundle handed to the subscriptions
/// collaborator when a subscriber attaches: the slot references, ids and
/// codec set needed to build a down-track.
///
/// It is a value snapshot. Slot churn after the subscriber attached does not
/// reach it; a pending slot inside it still upgrades transparently, since the
/// slot is shared, not copied.
#[derive(Clone)]
pub struct WrappedReceiver {
    receivers: Vec<Arc<SimulcastReceiverSlot>>,
    track_id: TrackId,
    stream_id: String,
    upstream_codecs: Vec<RTCRtpCodecParameters>,
    disable_red: bool,
}

impl WrappedReceiver {
    pub fn new(
        receivers: Vec<Arc<SimulcastReceiverSlot>>,
        track_id: TrackId,
        stream_id: String,
        upstream_codecs: Vec<RTCRtpCodecParameters>,
        disable_red: bool,
    ) -> Self {
        Self {
            receivers,
            track_id,
            stream_id,
            upstream_codecs,
            disable_red,
        }
    }

    pub fn receivers(&self) -> &[Arc<SimulcastReceiverSlot>] {
        &self.receivers
    }

    /// receiver finds the snapshot's receiver for a mime, seeing through a
    /// pending slot to its delegate.
    pub fn receiver(&self, mime: &str) -> Option<Arc<dyn TrackReceiver>> {
        self.receivers
            .iter()
            .find(|s| s.mime_type().eq_ignore_ascii_case(mime))
            .and_then(|s| s.receiver().live_receiver())
    }

    pub fn track_id(&self) -> &TrackId {
        &self.track_id
    }

    /// stream_id is the id down-tracks announce to the subscriber; depending
    /// on the subscriber's protocol it may pack the publisher and track ids.
    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    /// upstream_codecs lists every codec the publisher may send on this
    /// track: announced ones plus those already live.
    pub fn upstream_codecs(&self) -> &[RTCRtpCodecParameters] {
        &self.upstream_codecs
    }

    /// disable_red reports whether down-tracks should strip the redundant
    /// audio encoding for this subscriber.
    pub fn disable_red(&self) -> bool {
        self.disable_red
    }
}
