use log::debug;
use prost::Message;

/// Version tag Mixxx writes alongside fixed-tempo protobuf beat grids.
pub const BEATGRID_VERSION: &str = "BeatGrid-2.0";

/// Mixxx `beats` blob layout (proto2, package `beats`). Only the fields
/// the offset computation needs are modelled; everything is optional.
#[derive(Clone, PartialEq, Message)]
pub struct BeatGrid {
    #[prost(message, optional, tag = "1")]
    pub bpm: Option<Bpm>,
    #[prost(message, optional, tag = "2")]
    pub first_beat: Option<Beat>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Bpm {
    #[prost(double, optional, tag = "1")]
    pub bpm: Option<f64>,
    #[prost(enumeration = "Source", optional, tag = "2", default = "Analyzer")]
    pub source: Option<i32>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Beat {
    #[prost(int32, optional, tag = "1")]
    pub frame_position: Option<i32>,
    #[prost(bool, optional, tag = "2", default = "true")]
    pub enabled: Option<bool>,
    #[prost(enumeration = "Source", optional, tag = "3", default = "Analyzer")]
    pub source: Option<i32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum Source {
    Analyzer = 0,
    FileMetadata = 1,
    User = 2,
}

/// Offset of the first beat in seconds, normalized into one beat period.
///
/// Returns None when the blob is absent or empty, the sample rate is zero,
/// the version tag is not the supported grid layout, the blob fails to
/// decode, or either sub-message lacks its numeric field. Callers degrade
/// to a zero offset in that case.
// TODO: derive an offset from BeatMap-1.0 blobs (needs per-beat decoding
// of the older repeated-Beat layout).
pub fn first_beat_seconds(blob: Option<&[u8]>, version: &str, sample_rate: f64) -> Option<f64> {
    let blob = blob?;
    if blob.is_empty() || sample_rate == 0.0 || version != BEATGRID_VERSION {
        return None;
    }

    let grid = match BeatGrid::decode(blob) {
        Ok(grid) => grid,
        Err(err) => {
            debug!("beat grid blob failed to decode: {err}");
            return None;
        }
    };
    let frame_position = grid.first_beat.as_ref()?.frame_position?;
    let bpm = grid.bpm.as_ref()?.bpm?;

    let beat_length = 60.0 / bpm;
    let mut position = f64::from(frame_position) / sample_rate;
    if position < 0.0 {
        position += beat_length;
    }
    if position > beat_length {
        position -= beat_length;
    }
    Some(position)
}
