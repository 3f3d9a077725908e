
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use serde_json::json;
use tokio::sync::Mutex;
use webrtc::rtcp::receiver_report::ReceiverReport;
use webrtc::rtp_transceiver::rtp_codec::{
    RTCRtpCodecParameters, RTCRtpHeaderExtensionParameters,
};
use webrtc::util::sync::RwLock;

use crate::config::AudioConfig;
use crate::error::{Error, Result};
use crate::layer::{
    rid_to_spatial_layer, spatial_layer_to_video_quality, video_quality_to_spatial_layer,
    DEFAULT_MAX_LAYER_TEMPORAL, INVALID_LAYER_SPATIAL,
};
use crate::receiver::dummy::DummyReceiver;
use crate::receiver::wrapped::WrappedReceiver;
use crate::receiver::{
    is_svc_codec, SimulcastReceiverSlot, SlotReceiver, TrackReceiver, DEPENDENCY_DESCRIPTOR_URI,
};
use crate::subscriptions::{
    pack_stream_id, DownTrack, MediaTrackSubscriptions, SubscribedTrack, Subscriber,
};
use crate::telemetry::TelemetryService;
use crate::track_info::{
    aggregate_rtp_stats, EncryptionType, RtpStats, SimulcastCodec, TrackInfo, TrackSource,
    TrackType, VideoLayer, VideoQuality,
};
use crate::{ParticipantId, ParticipantIdentity, TrackId};

/// Tolerance applied to a requested dimension or frame rate before matching
/// it against the published layers.
pub const LAYER_SELECTION_TOLERANCE: f32 = 0.9;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum State {
    Open,
    Closing,
    Closed,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Open => write!(f, "Open"),
            State::Closing => write!(f, "Closing"),
            State::Closed => write!(f, "Closed"),
        }
    }
}

pub type OnSetupReceiverHdlrFn = Box<
    dyn (FnMut(String) -> Pin<Box<dyn Future<Output = ()> + Send + 'static>>)
        + Send
        + Sync
        + 'static,
>;

pub type OnMediaLossFeedbackHdlrFn = Box<
    dyn (FnMut(
            Arc<dyn DownTrack>,
            ReceiverReport,
        ) -> Pin<Box<dyn Future<Output = ()> + Send + 'static>>)
        + Send
        + Sync
        + 'static,
>;

pub type OnCloseHdlrFn = Box<
    dyn (FnMut() -> Pin<Box<dyn Future<Output = ()> + Send + 'static>>) + Send + Sync + 'static,
>;

#[derive(Default)]
struct Handlers {
    on_setup_receiver: ArcSwapOption<Mutex<OnSetupReceiverHdlrFn>>,
    on_media_loss_feedback: ArcSwapOption<Mutex<OnMediaLossFeedbackHdlrFn>>,
}

/// MediaTrackReceiverParams bundles the publisher identity and collaborators
/// one track coordinates for.
pub struct MediaTrackReceiverParams {
    pub participant_id: ParticipantId,
    pub participant_identity: ParticipantIdentity,
    pub participant_version: u32,
    pub is_relayed: bool,
    pub audio_config: AudioConfig,
    pub subscriptions: Arc<dyn MediaTrackSubscriptions>,
    pub telemetry: Arc<dyn TelemetryService>,
}

struct Internal {
    receivers: Vec<Arc<SimulcastReceiverSlot>>,
    track_info: TrackInfo,
    potential_codecs: Vec<RTCRtpCodecParameters>,
    state: State,
    on_close: Vec<OnCloseHdlrFn>,
}

/// MediaTrackReceiver coordinates one published track: the per-codec receive
/// pipelines behind it, its authoritative [`TrackInfo`], and the fan-out to
/// subscribers.
///
/// The publisher's offer/answer progress, the arrival of receive pipelines
/// and subscriber churn all race against each other. The slot list keeps them
/// consistent: announced codecs occupy placeholder slots that are upgraded in
/// place when their pipeline arrives, so a subscriber attached in between
/// never lands on a half-initialized receiver.
///
/// Every handler and collaborator call happens after the internal lock is
/// released; handlers re-enter this object's public API.
pub struct MediaTrackReceiver {
    params: MediaTrackReceiverParams,
    internal: RwLock<Internal>,
    handlers: Handlers,
}

impl MediaTrackReceiver {
    pub async fn new(params: MediaTrackReceiverParams, track_info: TrackInfo) -> Arc<Self> {
        let muted = track_info.muted;
        let track = Arc::new(MediaTrackReceiver {
            internal: RwLock::new(Internal {
                receivers: Vec::new(),
                track_info,
                potential_codecs: Vec::new(),
                state: State::Open,
                on_close: Vec::new(),
            }),
            handlers: Handlers::default(),
            params,
        });

        let weak = Arc::downgrade(&track);
        track
            .params
            .subscriptions
            .on_down_track_created(Box::new(move |down_track| {
                let weak = weak.clone();
                Box::pin(async move {
                    if let Some(track) = weak.upgrade() {
                        track.handle_down_track_created(down_track).await;
                    }
                })
            }));

        if muted {
            track.set_muted(true).await;
        }

        track
    }

    /// on_setup_receiver registers the handler fired after a receive
    /// pipeline is bound to a codec slot.
    pub fn on_setup_receiver(&self, hdlr: OnSetupReceiverHdlrFn) {
        self.handlers
            .on_setup_receiver
            .store(Some(Arc::new(Mutex::new(hdlr))));
    }

    /// on_media_loss_feedback registers the handler fired when a subscriber
    /// reports loss on an audio down-track.
    pub fn on_media_loss_feedback(&self, hdlr: OnMediaLossFeedbackHdlrFn) {
        self.handlers
            .on_media_loss_feedback
            .store(Some(Arc::new(Mutex::new(hdlr))));
    }

    /// add_on_close appends a close hook. Hooks run exactly once, in
    /// registration order, after the track has reached its terminal state.
    pub fn add_on_close(&self, hdlr: OnCloseHdlrFn) {
        self.internal.write().on_close.push(hdlr);
    }

    /// setup_receiver binds a codec's receive pipeline to the track. If the
    /// codec was announced earlier the placeholder slot is upgraded in place
    /// and keeps its position; otherwise a new slot is appended at the given
    /// priority. A non-empty mid is recorded into the track metadata.
    pub async fn setup_receiver(
        &self,
        receiver: Arc<dyn TrackReceiver>,
        priority: usize,
        mid: &str,
    ) {
        let mime = receiver.codec().capability.mime_type;

        let mut upgraded_dummy: Option<Arc<DummyReceiver>> = None;
        let mut duplicate = false;
        let receivers_snapshot;
        {
            let mut internal = self.internal.write();
            if internal.state != State::Open {
                log::warn!("cannot set up receiver on a track not open, mime: {mime}");
                return;
            }

            let mut receivers = internal.receivers.clone();

            let mut matched = false;
            for slot in &receivers {
                if !slot.mime_type().eq_ignore_ascii_case(&mime) {
                    continue;
                }
                matched = true;
                match slot.receiver() {
                    SlotReceiver::Pending(d) => {
                        if d.upgrade(receiver.clone()) {
                            upgraded_dummy = Some(d.clone());
                        } else {
                            duplicate = true;
                        }
                    }
                    SlotReceiver::Live(_) => {
                        duplicate = true;
                    }
                }
                break;
            }

            if duplicate {
                drop(internal);
                log::warn!("ignoring receiver for a mime already being serviced, mime: {mime}");
                return;
            }

            if !matched {
                receivers.push(Arc::new(SimulcastReceiverSlot::new(
                    SlotReceiver::Live(receiver.clone()),
                    priority,
                )));
            }

            receivers.sort_by_key(|s| s.priority());

            if !mid.is_empty() {
                if priority == 0 {
                    internal.track_info.mime_type = mime.clone();
                    internal.track_info.mid = mid.to_owned();
                }
                if let Some(ci) = internal.track_info.codecs.get_mut(priority) {
                    ci.mime_type = mime.clone();
                    ci.mid = mid.to_owned();
                }
            }

            internal.receivers = receivers.clone();
            receivers_snapshot = receivers;
        }

        if let Some(dummy) = &upgraded_dummy {
            dummy.apply_saved_state();
        }

        let receiver_mimes: Vec<String> =
            receivers_snapshot.iter().map(|s| s.mime_type()).collect();
        log::debug!(
            "setup receiver, mime: {mime}, priority: {priority}, mid: {mid}, receivers: {receiver_mimes:?}"
        );

        self.fire_on_setup_receiver(&mime).await;
    }

    /// set_potential_codecs seeds placeholder slots for every codec the
    /// publisher may activate later, in preference order.
    pub fn set_potential_codecs(
        &self,
        codecs: Vec<RTCRtpCodecParameters>,
        header_extensions: Vec<RTCRtpHeaderExtensionParameters>,
    ) {
        // Announced codecs have not negotiated extensions of their own yet.
        // Clients use the primary codec's set for all of them, except the
        // dependency descriptor which only SVC codecs carry.
        let headers_without_dd: Vec<RTCRtpHeaderExtensionParameters> = header_extensions
            .iter()
            .filter(|h| h.uri != DEPENDENCY_DESCRIPTOR_URI)
            .cloned()
            .collect();

        let mut internal = self.internal.write();
        let mut receivers = internal.receivers.clone();
        internal.potential_codecs = codecs.clone();
        for (i, c) in codecs.iter().enumerate() {
            let exists = receivers
                .iter()
                .any(|r| r.mime_type().eq_ignore_ascii_case(&c.capability.mime_type));
            if exists {
                continue;
            }

            let ext_headers = if is_svc_codec(&c.capability.mime_type) {
                header_extensions.clone()
            } else {
                headers_without_dd.clone()
            };
            receivers.push(Arc::new(SimulcastReceiverSlot::new(
                SlotReceiver::Pending(Arc::new(DummyReceiver::new(
                    internal.track_info.sid.clone(),
                    self.params.participant_id.clone(),
                    c.clone(),
                    ext_headers,
                ))),
                i,
            )));
        }
        receivers.sort_by_key(|s| s.priority());
        internal.receivers = receivers;
    }

    /// clear_receiver drops the slot serving a mime and detaches every
    /// subscriber that was forwarding it.
    pub async fn clear_receiver(&self, mime: &str, will_be_resumed: bool) {
        {
            let mut internal = self.internal.write();
            let mut receivers = internal.receivers.clone();
            if let Some(idx) = receivers
                .iter()
                .position(|r| r.mime_type().eq_ignore_ascii_case(mime))
            {
                receivers.remove(idx);
            }
            internal.receivers = receivers;
        }

        self.remove_all_subscribers_for_mime(mime, will_be_resumed).await;
    }

    pub async fn clear_all_receivers(&self, will_be_resumed: bool) {
        log::debug!("clearing all receivers");
        let receivers = {
            let mut internal = self.internal.write();
            std::mem::take(&mut internal.receivers)
        };

        for r in &receivers {
            self.remove_all_subscribers_for_mime(&r.mime_type(), will_be_resumed)
                .await;
        }
    }

    /// add_subscriber hands a frozen snapshot of the current slots to the
    /// subscriptions collaborator to build the subscriber's down-track.
    pub async fn add_subscriber(
        &self,
        sub: Arc<dyn Subscriber>,
    ) -> Result<Arc<dyn SubscribedTrack>> {
        let (receivers, mut upstream_codecs, track_id, disable_red) = {
            let internal = self.internal.read();
            if internal.state != State::Open {
                return Err(Error::ErrNotOpen);
            }
            (
                internal.receivers.clone(),
                internal.potential_codecs.clone(),
                internal.track_info.sid.clone(),
                internal.track_info.disable_red,
            )
        };

        if receivers.is_empty() {
            return Err(Error::ErrNoReceiver);
        }

        for slot in &receivers {
            let codec = slot.receiver().as_receiver().codec();
            let known = upstream_codecs
                .iter()
                .any(|pc| pc.capability.mime_type == codec.capability.mime_type);
            if !known {
                upstream_codecs.push(codec);
            }
        }

        let stream_id = if sub.protocol_version().supports_packed_stream_id() {
            // stream-based client APIs need a distinct stream per track
            pack_stream_id(&self.params.participant_id, &track_id)
        } else {
            self.params.participant_id.clone()
        };

        let disable_red = disable_red || !self.params.audio_config.active_red_encoding;
        let wrapped = WrappedReceiver::new(
            receivers,
            track_id,
            stream_id,
            upstream_codecs,
            disable_red,
        );
        self.params.subscriptions.add_subscriber(sub, wrapped).await
    }

    /// remove_subscriber stops all forwarders delivering this track to the
    /// subscriber.
    pub async fn remove_subscriber(&self, subscriber_id: &ParticipantId, will_be_resumed: bool) {
        self.params
            .subscriptions
            .remove_subscriber(subscriber_id, will_be_resumed)
            .await;
    }

    async fn remove_all_subscribers_for_mime(&self, mime: &str, will_be_resumed: bool) {
        log::debug!("removing all subscribers for mime: {mime}");
        for subscriber_id in self
            .params
            .subscriptions
            .get_all_subscribers_for_mime(mime)
            .await
        {
            self.remove_subscriber(&subscriber_id, will_be_resumed).await;
        }
    }

    /// revoke_disallowed_subscribers removes every subscriber whose identity
    /// is not on the allow-list and returns the revoked identities.
    pub async fn revoke_disallowed_subscribers(
        &self,
        allowed_subscriber_identities: &[ParticipantIdentity],
    ) -> Vec<ParticipantIdentity> {
        let mut revoked = Vec::new();

        for sub_track in self.params.subscriptions.get_all_subscribed_tracks().await {
            let identity = sub_track.subscriber_identity();
            if allowed_subscriber_identities.contains(&identity) {
                continue;
            }

            log::info!(
                "revoking subscription, subscriber: {identity}, subscriber_id: {}",
                sub_track.subscriber_id()
            );
            self.remove_subscriber(&sub_track.subscriber_id(), false).await;
            revoked.push(identity);
        }

        revoked
    }

    pub async fn set_muted(&self, muted: bool) {
        let receivers = {
            let mut internal = self.internal.write();
            internal.track_info.muted = muted;
            internal.receivers.clone()
        };

        // muting is best effort across pipelines
        for slot in &receivers {
            slot.receiver().as_receiver().set_up_track_paused(muted);
        }

        self.params.subscriptions.set_muted(muted).await;
    }

    /// update_track_info replaces the authoritative metadata with a patched
    /// copy of the incoming one: negotiated mids and revealed layer ssrcs
    /// survive the swap.
    pub async fn update_track_info(&self, info: TrackInfo) {
        let mut info = info;
        let muted = info.muted;
        let update_mute;
        {
            let mut internal = self.internal.write();
            for ci in info.codecs.iter_mut() {
                for origin_ci in &internal.track_info.codecs {
                    if !ci.mime_type.eq_ignore_ascii_case(&origin_ci.mime_type) {
                        continue;
                    }

                    if !origin_ci.mid.is_empty() {
                        ci.mid = origin_ci.mid.clone();
                    }

                    for layer in ci.layers.iter_mut() {
                        for origin_layer in &origin_ci.layers {
                            if layer.quality == origin_layer.quality {
                                if origin_layer.ssrc != 0 {
                                    layer.ssrc = origin_layer.ssrc;
                                }
                                break;
                            }
                        }
                    }
                    break;
                }
            }
            info.sync_layers_from_primary();

            update_mute = internal.track_info.muted != muted;
            internal.track_info = info;
        }

        if update_mute {
            self.set_muted(muted).await;
        }

        self.update_track_info_of_receivers();
    }

    /// set_layer_ssrc records the ssrc a layer revealed itself with. A layer
    /// that already has an ssrc keeps it.
    pub fn set_layer_ssrc(&self, mime: &str, rid: &str, ssrc: u32) {
        {
            let mut internal = self.internal.write();
            let mut layer = rid_to_spatial_layer(rid, &internal.track_info);
            if layer == INVALID_LAYER_SPATIAL {
                // non-simulcast publishes carry no rid
                layer = 0;
            }
            let quality = spatial_layer_to_video_quality(layer, &internal.track_info);

            let info = &mut internal.track_info;
            if info.codecs.is_empty() {
                if let Some(l) = info.layers.iter_mut().find(|l| l.quality == quality) {
                    if l.ssrc == 0 {
                        l.ssrc = ssrc;
                    }
                }
            } else {
                for i in 0..info.codecs.len() {
                    if !info.codecs[i].mime_type.eq_ignore_ascii_case(mime) {
                        continue;
                    }

                    if let Some(l) = info.codecs[i]
                        .layers
                        .iter_mut()
                        .find(|l| l.quality == quality)
                    {
                        if l.ssrc == 0 {
                            l.ssrc = ssrc;
                        }
                    }

                    if i == 0 {
                        info.layers = info.codecs[0].layers.clone();
                    }
                    break;
                }
            }
        }

        self.update_track_info_of_receivers();
    }

    /// update_codec_cid patches client-side codec ids after a publish.
    pub fn update_codec_cid(&self, codecs: &[SimulcastCodec]) {
        {
            let mut internal = self.internal.write();
            for c in codecs {
                let codec = c.codec.to_lowercase();
                if let Some(origin) = internal
                    .track_info
                    .codecs
                    .iter_mut()
                    .find(|ci| ci.mime_type.to_lowercase().contains(&codec))
                {
                    origin.cid = c.cid.clone();
                }
            }
        }

        self.update_track_info_of_receivers();
    }

    /// update_video_layers replaces the declared layers of every codec with
    /// the publisher's new shape, keeping already-revealed ssrcs, and lets
    /// subscribers re-pick their forwarded layer.
    pub async fn update_video_layers(&self, layers: &[VideoLayer]) {
        {
            let mut internal = self.internal.write();
            let info = &mut internal.track_info;
            if info.codecs.is_empty() {
                info.layers = merge_layers(layers, &info.layers);
            } else {
                for i in 0..info.codecs.len() {
                    let merged = merge_layers(layers, &info.codecs[i].layers);
                    info.codecs[i].layers = merged;
                }
                info.sync_layers_from_primary();
            }
        }

        self.update_track_info_of_receivers();
        self.params.subscriptions.update_video_layers().await;
    }

    /// get_quality_for_dimension finds the lowest quality whose layer still
    /// satisfies the requested dimensions, with a tolerance.
    pub fn get_quality_for_dimension(&self, width: u32, height: u32) -> VideoQuality {
        let mut quality = VideoQuality::High;
        if self.kind() == TrackType::Audio {
            return quality;
        }

        let internal = self.internal.read();
        let info = &internal.track_info;
        if info.height == 0 {
            return quality;
        }

        let (orig_size, mut requested_size) = if info.width < info.height {
            // portrait: the width is the constraining axis
            (info.width, width)
        } else {
            (info.height, height)
        };

        let mut layer_sizes = vec![180, 360, orig_size];
        let provided_sizes: Vec<u32> = info.layers.iter().map(|l| l.height).collect();
        if !provided_sizes.is_empty() {
            layer_sizes = provided_sizes;
            layer_sizes.sort_unstable();
            // explicit layers always compare by height
            requested_size = height;
        }

        let target = (requested_size as f32 * LAYER_SELECTION_TOLERANCE) as u32;
        for (i, s) in layer_sizes.iter().enumerate() {
            quality = VideoQuality::from_ordinal(i);
            if i == layer_sizes.len() - 1 {
                break;
            } else if *s >= target && *s != layer_sizes[i + 1] {
                // identical tiers collapse onto the later one
                break;
            }
        }

        quality
    }

    /// get_temporal_layer_for_spatial_fps picks the lowest temporal layer of
    /// a spatial layer that still delivers the requested frame rate.
    pub fn get_temporal_layer_for_spatial_fps(&self, spatial: i32, fps: u32, mime: &str) -> i32 {
        let receiver = match self.receiver(mime) {
            Some(r) => r,
            None => return DEFAULT_MAX_LAYER_TEMPORAL,
        };

        let layer_fps = receiver.get_temporal_layer_fps_for_spatial(spatial);
        let request_fps = fps as f32 * LAYER_SELECTION_TOLERANCE;
        for (i, f) in layer_fps.iter().enumerate() {
            if request_fps <= *f {
                return i as i32;
            }
        }
        DEFAULT_MAX_LAYER_TEMPORAL
    }

    /// notify_max_layer_change reports the new forwarded-layer ceiling to
    /// telemetry with a minimal metadata record.
    pub async fn notify_max_layer_change(&self, max_layer: i32) {
        let info = {
            let internal = self.internal.read();
            let quality = spatial_layer_to_video_quality(max_layer, &internal.track_info);
            let mut layer = VideoLayer {
                quality,
                ..Default::default()
            };
            if quality != VideoQuality::Off {
                if let Some(l) = internal
                    .track_info
                    .layers
                    .iter()
                    .find(|l| l.quality == quality)
                {
                    layer.width = l.width;
                    layer.height = l.height;
                }
            }
            TrackInfo {
                sid: internal.track_info.sid.clone(),
                kind: internal.track_info.kind,
                layers: vec![layer],
                ..Default::default()
            }
        };

        self.params
            .telemetry
            .track_published_update(&self.params.participant_id, info)
            .await;
    }

    /// restart re-requests the highest expected spatial layer from every
    /// pipeline, e.g. after an ICE restart.
    pub fn restart(&self) {
        let (hq, receivers) = {
            let internal = self.internal.read();
            (
                video_quality_to_spatial_layer(VideoQuality::High, &internal.track_info),
                internal.receivers.clone(),
            )
        };

        for slot in &receivers {
            slot.receiver().as_receiver().set_max_expected_spatial_layer(hq);
        }
    }

    /// is_open reports whether the track is accepting subscribers. A receive
    /// pipeline that died on its own takes the track out of service.
    pub fn is_open(&self) -> bool {
        let (state, receivers) = {
            let internal = self.internal.read();
            (internal.state, internal.receivers.clone())
        };

        if state != State::Open {
            return false;
        }
        receivers
            .iter()
            .all(|s| !s.receiver().as_receiver().is_closed())
    }

    /// set_closing marks the beginning of teardown; the state never returns
    /// to open.
    pub fn set_closing(&self) {
        let mut internal = self.internal.write();
        if internal.state == State::Open {
            internal.state = State::Closing;
        }
    }

    /// try_close closes the track unless a placeholder slot has been
    /// upgraded and its pipeline is still servicing packets. Returns whether
    /// the track is closed afterwards.
    pub async fn try_close(&self) -> bool {
        {
            let internal = self.internal.read();
            if internal.state == State::Closed {
                return true;
            }

            for slot in &internal.receivers {
                if let SlotReceiver::Pending(d) = slot.receiver() {
                    if d.receiver().is_some() {
                        return false;
                    }
                }
            }
        }

        self.close().await;
        true
    }

    /// close transitions to the terminal state and runs the close hooks.
    /// Idempotent; later calls are no-ops.
    pub async fn close(&self) {
        let hooks = {
            let mut internal = self.internal.write();
            if internal.state == State::Closed {
                Vec::new()
            } else {
                internal.state = State::Closed;
                std::mem::take(&mut internal.on_close)
            }
        };

        for mut hook in hooks {
            hook().await;
        }
    }

    pub fn id(&self) -> TrackId {
        self.internal.read().track_info.sid.clone()
    }

    pub fn kind(&self) -> TrackType {
        self.internal.read().track_info.kind
    }

    pub fn source(&self) -> TrackSource {
        self.internal.read().track_info.source
    }

    pub fn stream(&self) -> String {
        self.internal.read().track_info.stream.clone()
    }

    pub fn name(&self) -> String {
        self.internal.read().track_info.name.clone()
    }

    pub fn publisher_id(&self) -> &ParticipantId {
        &self.params.participant_id
    }

    pub fn publisher_identity(&self) -> &ParticipantIdentity {
        &self.params.participant_identity
    }

    pub fn publisher_version(&self) -> u32 {
        self.params.participant_version
    }

    pub fn is_simulcast(&self) -> bool {
        self.internal.read().track_info.simulcast
    }

    pub fn set_simulcast(&self, simulcast: bool) {
        self.internal.write().track_info.simulcast = simulcast;
    }

    pub fn is_muted(&self) -> bool {
        self.internal.read().track_info.muted
    }

    pub fn is_encrypted(&self) -> bool {
        self.internal.read().track_info.encryption != EncryptionType::None
    }

    /// track_info returns a copy of the authoritative metadata.
    pub fn track_info(&self) -> TrackInfo {
        self.internal.read().track_info.clone()
    }

    /// primary_receiver returns the live pipeline of the primary codec, if
    /// it has been published.
    pub fn primary_receiver(&self) -> Option<Arc<dyn TrackReceiver>> {
        self.internal
            .read()
            .receivers
            .first()
            .and_then(|s| s.receiver().live_receiver())
    }

    /// receiver returns the live pipeline serving a mime, if published.
    pub fn receiver(&self, mime: &str) -> Option<Arc<dyn TrackReceiver>> {
        self.internal
            .read()
            .receivers
            .iter()
            .find(|s| s.mime_type().eq_ignore_ascii_case(mime))
            .and_then(|s| s.receiver().live_receiver())
    }

    /// receivers returns every slot's receiver view, placeholders included.
    pub fn receivers(&self) -> Vec<Arc<dyn TrackReceiver>> {
        self.internal
            .read()
            .receivers
            .iter()
            .map(|s| s.receiver().as_receiver())
            .collect()
    }

    pub(crate) fn load_receivers(&self) -> Vec<Arc<SimulcastReceiverSlot>> {
        self.internal.read().receivers.clone()
    }

    pub fn get_audio_level(&self) -> (f64, bool) {
        match self.primary_receiver() {
            Some(r) => r.get_audio_level(),
            None => (0.0, false),
        }
    }

    /// get_track_stats folds every pipeline's stats into one tally.
    pub fn get_track_stats(&self) -> Option<RtpStats> {
        let receivers = self.load_receivers();
        let stats: Vec<RtpStats> = receivers
            .iter()
            .filter_map(|s| s.receiver().as_receiver().get_track_stats())
            .collect();
        aggregate_rtp_stats(&stats)
    }

    pub async fn debug_info(&self) -> serde_json::Value {
        let mut info = serde_json::Map::new();
        info.insert("ID".to_owned(), json!(self.id()));
        info.insert("Kind".to_owned(), json!(self.kind().to_string()));
        info.insert("PubMuted".to_owned(), json!(self.is_muted()));
        info.insert(
            "DownTracks".to_owned(),
            self.params.subscriptions.debug_info().await,
        );

        for slot in self.load_receivers() {
            let receiver = slot.receiver().as_receiver();
            info.insert(receiver.codec().capability.mime_type, receiver.debug_info());
        }

        serde_json::Value::Object(info)
    }

    fn update_track_info_of_receivers(&self) {
        let (info, receivers) = {
            let internal = self.internal.read();
            (internal.track_info.clone(), internal.receivers.clone())
        };

        for slot in &receivers {
            slot.receiver().as_receiver().update_track_info(&info);
        }
    }

    async fn handle_down_track_created(self: Arc<Self>, down_track: Arc<dyn DownTrack>) {
        if self.kind() != TrackType::Audio {
            return;
        }

        let weak = Arc::downgrade(&self);
        down_track.add_receiver_report_listener(Box::new(move |dt, report| {
            let weak = weak.clone();
            Box::pin(async move {
                if let Some(track) = weak.upgrade() {
                    track.fire_media_loss_feedback(dt, report).await;
                }
            })
        }));
    }

    async fn fire_on_setup_receiver(&self, mime: &str) {
        let on_setup_receiver = self.handlers.on_setup_receiver.load();
        if let Some(f) = on_setup_receiver.as_ref() {
            (f.lock().await)(mime.to_owned()).await;
        }
    }

    async fn fire_media_loss_feedback(
        &self,
        down_track: Arc<dyn DownTrack>,
        report: ReceiverReport,
    ) {
        let on_media_loss_feedback = self.handlers.on_media_loss_feedback.load();
        if let Some(f) = on_media_loss_feedback.as_ref() {
            (f.lock().await)(down_track, report).await;
        }
    }
}

/// merge_layers applies the publisher's new layer shape while keeping any
/// ssrc a previous shape had already revealed.
fn merge_layers(new_layers: &[VideoLayer], origin_layers: &[VideoLayer]) -> Vec<VideoLayer> {
    let mut merged = Vec::with_capacity(new_layers.len());
    for layer in new_layers {
        let mut layer = layer.clone();
        if let Some(origin) = origin_layers.iter().find(|l| l.quality == layer.quality) {
            if origin.ssrc != 0 {
                layer.ssrc = origin.ssrc;
            }
        }
        merged.push(layer);
    }
    merged
}
