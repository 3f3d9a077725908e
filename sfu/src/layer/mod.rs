
use crate::track_info::{TrackInfo, VideoQuality};

/// Highest spatial layer a simulcast publish can carry.
pub const DEFAULT_MAX_LAYER_SPATIAL: i32 = 2;

/// Highest temporal layer assumed when a receiver cannot report its own.
pub const DEFAULT_MAX_LAYER_TEMPORAL: i32 = 3;

pub const INVALID_LAYER_SPATIAL: i32 = -1;

pub const QUARTER_RESOLUTION: &str = "q";
pub const HALF_RESOLUTION: &str = "h";
pub const FULL_RESOLUTION: &str = "f";

/// rid_to_spatial_layer maps a simulcast rid onto the spatial layer index it
/// names, given the layers the track declares. Non-simulcast publishes carry
/// no rid and resolve to [`INVALID_LAYER_SPATIAL`]; callers coerce that to
/// layer 0.
pub fn rid_to_spatial_layer(rid: &str, info: &TrackInfo) -> i32 {
    let num_layers = info.layers.len();
    match rid {
        QUARTER_RESOLUTION => 0,
        HALF_RESOLUTION => {
            if num_layers >= 2 {
                1
            } else {
                INVALID_LAYER_SPATIAL
            }
        }
        FULL_RESOLUTION => {
            if num_layers == 0 {
                DEFAULT_MAX_LAYER_SPATIAL
            } else {
                num_layers as i32 - 1
            }
        }
        _ => INVALID_LAYER_SPATIAL,
    }
}

/// spatial_layer_to_video_quality maps a spatial layer index onto the quality
/// tier of the track's declared layers, lowest first. Tracks that declare no
/// layers fall back to the canonical low/medium/high ordering. A negative
/// layer means the video is off.
pub fn spatial_layer_to_video_quality(layer: i32, info: &TrackInfo) -> VideoQuality {
    if layer < 0 {
        return VideoQuality::Off;
    }

    let mut qualities: Vec<VideoQuality> = info
        .layers
        .iter()
        .map(|l| l.quality)
        .filter(|q| *q != VideoQuality::Off)
        .collect();
    if qualities.is_empty() {
        return VideoQuality::from_ordinal(layer as usize);
    }

    qualities.sort_by_key(|q| q.ordinal());
    qualities.dedup();

    let idx = (layer as usize).min(qualities.len() - 1);
    qualities[idx]
}

/// video_quality_to_spatial_layer is the inverse mapping: the layer index a
/// quality tier occupies among the track's declared layers. A tier the track
/// does not declare clamps to the highest declared layer.
pub fn video_quality_to_spatial_layer(quality: VideoQuality, info: &TrackInfo) -> i32 {
    if quality == VideoQuality::Off {
        return INVALID_LAYER_SPATIAL;
    }

    let mut qualities: Vec<VideoQuality> = info
        .layers
        .iter()
        .map(|l| l.quality)
        .filter(|q| *q != VideoQuality::Off)
        .collect();
    if qualities.is_empty() {
        return quality.ordinal() as i32;
    }

    qualities.sort_by_key(|q| q.ordinal());
    qualities.dedup();

    match qualities.iter().position(|q| *q == quality) {
        Some(idx) => idx as i32,
        None => qualities.len() as i32 - 1,
    }
}
