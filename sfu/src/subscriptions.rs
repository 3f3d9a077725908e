use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use webrtc::rtcp::receiver_report::ReceiverReport;

use crate::error::Result;
use crate::receiver::wrapped::WrappedReceiver;
use crate::{ParticipantId, ParticipantIdentity};

/// Separator between publisher and track id inside a packed stream id.
const STREAM_ID_SEPARATOR: char = '|';

/// pack_stream_id packs the publisher and track ids into one stream id, so
/// clients driving stream-based APIs get a distinct stream per track.
pub fn pack_stream_id(participant_id: &str, track_id: &str) -> String {
    format!("{participant_id}{STREAM_ID_SEPARATOR}{track_id}")
}

/// unpack_stream_id splits a packed stream id back into publisher and track
/// ids. The track id is empty when the stream id was not packed.
pub fn unpack_stream_id(pack: &str) -> (String, String) {
    match pack.split_once(STREAM_ID_SEPARATOR) {
        Some((participant_id, track_id)) => (participant_id.to_owned(), track_id.to_owned()),
        None => (pack.to_owned(), String::new()),
    }
}

/// ProtocolVersion is the signalling protocol revision a subscriber's client
/// negotiated.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProtocolVersion(pub u32);

impl ProtocolVersion {
    /// supports_packed_stream_id reports whether the client understands
    /// publisher and track ids packed into one stream id.
    pub fn supports_packed_stream_id(&self) -> bool {
        self.0 >= 1
    }
}

/// Subscriber is a participant that wants its own forwarded copy of the
/// track.
pub trait Subscriber: Send + Sync {
    fn id(&self) -> ParticipantId;

    fn identity(&self) -> ParticipantIdentity;

    fn protocol_version(&self) -> ProtocolVersion;
}

/// SubscribedTrack is the per-subscriber forwarding state owned by the
/// subscriptions collaborator.
pub trait SubscribedTrack: Send + Sync {
    fn subscriber_id(&self) -> ParticipantId;

    fn subscriber_identity(&self) -> ParticipantIdentity;
}

pub type OnReceiverReportHdlrFn = Box<
    dyn (FnMut(
            Arc<dyn DownTrack>,
            ReceiverReport,
        ) -> Pin<Box<dyn Future<Output = ()> + Send + 'static>>)
        + Send
        + Sync,
>;

/// DownTrack is a subscriber-facing forwarder created by the subscriptions
/// collaborator from a [`WrappedReceiver`] snapshot.
pub trait DownTrack: Send + Sync {
    fn subscriber_id(&self) -> ParticipantId;

    /// add_receiver_report_listener registers for the RTCP receiver reports
    /// the subscriber sends back on this down-track.
    fn add_receiver_report_listener(&self, hdlr: OnReceiverReportHdlrFn);
}

pub type OnDownTrackCreatedHdlrFn = Box<
    dyn (FnMut(Arc<dyn DownTrack>) -> Pin<Box<dyn Future<Output = ()> + Send + 'static>>)
        + Send
        + Sync,
>;

/// MediaTrackSubscriptions is the fan-out bookkeeping for one published
/// track: the set of down-tracks delivering it to subscribers. The media
/// track receiver drives it but does not own its internals.
#[async_trait]
pub trait MediaTrackSubscriptions: Send + Sync {
    /// add_subscriber builds a down-track for the subscriber over the given
    /// snapshot.
    async fn add_subscriber(
        &self,
        sub: Arc<dyn Subscriber>,
        receiver: WrappedReceiver,
    ) -> Result<Arc<dyn SubscribedTrack>>;

    /// remove_subscriber stops forwarding to a subscriber. `will_be_resumed`
    /// distinguishes a graceful pause, e.g. a codec migration, from a
    /// permanent removal.
    async fn remove_subscriber(&self, subscriber_id: &ParticipantId, will_be_resumed: bool);

    /// get_all_subscribers_for_mime lists subscribers whose down-track
    /// currently forwards the given codec.
    async fn get_all_subscribers_for_mime(&self, mime: &str) -> Vec<ParticipantId>;

    async fn get_all_subscribed_tracks(&self) -> Vec<Arc<dyn SubscribedTrack>>;

    /// set_muted pauses or resumes every down-track of the publication.
    async fn set_muted(&self, muted: bool);

    /// update_video_layers tells down-tracks the publisher's layer shape
    /// changed so they can re-pick their forwarded layer.
    async fn update_video_layers(&self);

    /// on_down_track_created registers a handler invoked for every
    /// down-track this collaborator creates.
    fn on_down_track_created(&self, hdlr: OnDownTrackCreatedHdlrFn);

    async fn debug_info(&self) -> serde_json::Value;
}
