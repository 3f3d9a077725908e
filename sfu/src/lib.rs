#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod layer;
pub mod media_track_receiver;
pub mod receiver;
pub mod subscriptions;
pub mod telemetry;
pub mod track_info;

#[cfg(test)]
pub(crate) mod mocks;

pub use error::Error;

/// Server-assigned identifier of a published track.
pub type TrackId = String;

/// Server-assigned identifier of a participant.
pub type ParticipantId = String;

/// User-provided identity of a participant, stable across reconnects.
pub type ParticipantIdentity = String;
