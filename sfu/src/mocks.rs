//! Test doubles for the collaborator seams.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use webrtc::rtcp::receiver_report::ReceiverReport;
use webrtc::rtp_transceiver::rtp_codec::{
    RTCRtpCodecCapability, RTCRtpCodecParameters, RTCRtpHeaderExtensionParameters,
};
use webrtc::util::sync::Mutex;

use crate::error::{Error, Result};
use crate::receiver::wrapped::WrappedReceiver;
use crate::receiver::TrackReceiver;
use crate::subscriptions::{
    DownTrack, MediaTrackSubscriptions, OnDownTrackCreatedHdlrFn, OnReceiverReportHdlrFn,
    ProtocolVersion, SubscribedTrack, Subscriber,
};
use crate::telemetry::TelemetryService;
use crate::track_info::{RtpStats, TrackInfo};
use crate::{ParticipantId, ParticipantIdentity, TrackId};

pub(crate) fn codec_params(mime: &str) -> RTCRtpCodecParameters {
    RTCRtpCodecParameters {
        capability: RTCRtpCodecCapability {
            mime_type: mime.to_owned(),
            clock_rate: 90000,
            ..Default::default()
        },
        payload_type: 96,
        ..Default::default()
    }
}

pub(crate) fn header_extension(uri: &str) -> RTCRtpHeaderExtensionParameters {
    RTCRtpHeaderExtensionParameters {
        uri: uri.to_owned(),
        ..Default::default()
    }
}

/// A recording TrackReceiver.
pub(crate) struct MockReceiver {
    pub codec: RTCRtpCodecParameters,
    pub closed: AtomicBool,
    pub paused: Mutex<Vec<bool>>,
    pub max_spatial_layers: Mutex<Vec<i32>>,
    pub track_infos: Mutex<Vec<TrackInfo>>,
    pub fps: Vec<f32>,
    pub stats: Option<RtpStats>,
    pub audio_level: (f64, bool),
    /// Invoked inside set_up_track_paused; lets tests observe re-entrancy.
    pub on_set_paused: Mutex<Option<Box<dyn Fn(bool) + Send + Sync>>>,
}

impl MockReceiver {
    pub(crate) fn new(mime: &str) -> Self {
        Self {
            codec: codec_params(mime),
            closed: AtomicBool::new(false),
            paused: Mutex::new(Vec::new()),
            max_spatial_layers: Mutex::new(Vec::new()),
            track_infos: Mutex::new(Vec::new()),
            fps: Vec::new(),
            stats: None,
            audio_level: (0.0, false),
            on_set_paused: Mutex::new(None),
        }
    }
}

impl TrackReceiver for MockReceiver {
    fn track_id(&self) -> TrackId {
        "TR_mock".to_owned()
    }

    fn stream_id(&self) -> String {
        "PA_mock".to_owned()
    }

    fn codec(&self) -> RTCRtpCodecParameters {
        self.codec.clone()
    }

    fn header_extensions(&self) -> Vec<RTCRtpHeaderExtensionParameters> {
        Vec::new()
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn set_max_expected_spatial_layer(&self, layer: i32) {
        self.max_spatial_layers.lock().push(layer);
    }

    fn set_up_track_paused(&self, paused: bool) {
        self.paused.lock().push(paused);
        let hook = self.on_set_paused.lock();
        if let Some(f) = hook.as_ref() {
            f(paused);
        }
    }

    fn update_track_info(&self, info: &TrackInfo) {
        self.track_infos.lock().push(info.clone());
    }

    fn get_audio_level(&self) -> (f64, bool) {
        self.audio_level
    }

    fn get_temporal_layer_fps_for_spatial(&self, _spatial: i32) -> Vec<f32> {
        self.fps.clone()
    }

    fn get_track_stats(&self) -> Option<RtpStats> {
        self.stats.clone()
    }

    fn debug_info(&self) -> serde_json::Value {
        json!({ "Type": "MockReceiver", "Codec": self.codec.capability.mime_type })
    }
}

pub(crate) struct MockSubscribedTrack {
    pub id: ParticipantId,
    pub identity: ParticipantIdentity,
}

impl SubscribedTrack for MockSubscribedTrack {
    fn subscriber_id(&self) -> ParticipantId {
        self.id.clone()
    }

    fn subscriber_identity(&self) -> ParticipantIdentity {
        self.identity.clone()
    }
}

pub(crate) struct MockSubscriber {
    pub id: ParticipantId,
    pub identity: ParticipantIdentity,
    pub version: ProtocolVersion,
}

impl Subscriber for MockSubscriber {
    fn id(&self) -> ParticipantId {
        self.id.clone()
    }

    fn identity(&self) -> ParticipantIdentity {
        self.identity.clone()
    }

    fn protocol_version(&self) -> ProtocolVersion {
        self.version
    }
}

pub(crate) struct MockDownTrack {
    pub subscriber: ParticipantId,
    pub listener: Mutex<Option<OnReceiverReportHdlrFn>>,
}

impl MockDownTrack {
    pub(crate) fn new(subscriber: &str) -> Arc<Self> {
        Arc::new(Self {
            subscriber: subscriber.to_owned(),
            listener: Mutex::new(None),
        })
    }

    pub(crate) async fn fire_receiver_report(self: Arc<Self>, report: ReceiverReport) {
        let fut = {
            let down_track: Arc<dyn DownTrack> = self.clone();
            let mut listener = self.listener.lock();
            listener.as_mut().map(|f| f(down_track, report))
        };
        if let Some(fut) = fut {
            fut.await;
        }
    }

    pub(crate) fn has_listener(&self) -> bool {
        self.listener.lock().is_some()
    }
}

impl DownTrack for MockDownTrack {
    fn subscriber_id(&self) -> ParticipantId {
        self.subscriber.clone()
    }

    fn add_receiver_report_listener(&self, hdlr: OnReceiverReportHdlrFn) {
        *self.listener.lock() = Some(hdlr);
    }
}

/// A recording subscriptions collaborator.
#[derive(Default)]
pub(crate) struct MockSubscriptions {
    pub muted_calls: Mutex<Vec<bool>>,
    pub removed: Mutex<Vec<(ParticipantId, bool)>>,
    pub added: Mutex<Vec<(ParticipantId, WrappedReceiver)>>,
    pub subscribers_for_mime: Mutex<HashMap<String, Vec<ParticipantId>>>,
    pub subscribed_tracks: Mutex<Vec<Arc<dyn SubscribedTrack>>>,
    pub video_layers_updates: AtomicUsize,
    pub down_track_hdlr: Mutex<Option<OnDownTrackCreatedHdlrFn>>,
    pub fail_add: AtomicBool,
}

impl MockSubscriptions {
    pub(crate) async fn fire_down_track_created(&self, down_track: Arc<dyn DownTrack>) {
        let fut = {
            let mut hdlr = self.down_track_hdlr.lock();
            hdlr.as_mut().map(|f| f(down_track))
        };
        if let Some(fut) = fut {
            fut.await;
        }
    }
}

#[async_trait]
impl MediaTrackSubscriptions for MockSubscriptions {
    async fn add_subscriber(
        &self,
        sub: Arc<dyn Subscriber>,
        receiver: WrappedReceiver,
    ) -> Result<Arc<dyn SubscribedTrack>> {
        if self.fail_add.load(Ordering::SeqCst) {
            return Err(Error::ErrSubscriberGone);
        }

        self.added.lock().push((sub.id(), receiver));
        Ok(Arc::new(MockSubscribedTrack {
            id: sub.id(),
            identity: sub.identity(),
        }))
    }

    async fn remove_subscriber(&self, subscriber_id: &ParticipantId, will_be_resumed: bool) {
        self.removed
            .lock()
            .push((subscriber_id.clone(), will_be_resumed));
    }

    async fn get_all_subscribers_for_mime(&self, mime: &str) -> Vec<ParticipantId> {
        self.subscribers_for_mime
            .lock()
            .get(&mime.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    async fn get_all_subscribed_tracks(&self) -> Vec<Arc<dyn SubscribedTrack>> {
        self.subscribed_tracks.lock().clone()
    }

    async fn set_muted(&self, muted: bool) {
        self.muted_calls.lock().push(muted);
    }

    async fn update_video_layers(&self) {
        self.video_layers_updates.fetch_add(1, Ordering::SeqCst);
    }

    fn on_down_track_created(&self, hdlr: OnDownTrackCreatedHdlrFn) {
        *self.down_track_hdlr.lock() = Some(hdlr);
    }

    async fn debug_info(&self) -> serde_json::Value {
        json!({ "Subscribers": self.subscribed_tracks.lock().len() })
    }
}

#[derive(Default)]
pub(crate) struct MockTelemetry {
    pub published: Mutex<Vec<(ParticipantId, TrackInfo)>>,
}

#[async_trait]
impl TelemetryService for MockTelemetry {
    async fn track_published_update(&self, publisher_id: &ParticipantId, info: TrackInfo) {
        self.published.lock().push((publisher_id.clone(), info));
    }
}
