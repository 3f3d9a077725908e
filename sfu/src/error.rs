use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// ErrNotOpen indicates an operation that requires the track to still be
    /// open, invoked after the track started closing.
    #[error("track is not open")]
    ErrNotOpen,

    /// ErrNoReceiver indicates a subscription was attempted before any
    /// receive pipeline was bound to the track.
    #[error("cannot subscribe without a receiver in place")]
    ErrNoReceiver,

    /// ErrSubscriberGone indicates the subscriber disconnected while its
    /// down-track was being set up.
    #[error("subscriber is gone")]
    ErrSubscriberGone,
}
