/// One library row joined with its file location.
///
/// Metadata and audio-property fields keep the exact text rendering of the
/// source value (empty when absent): the target schema is attribute text,
/// and present values must pass through without reformatting.
#[derive(Debug, Clone, Default)]
pub struct Track {
    pub id: i64,
    pub artist: String,
    pub title: String,
    pub album: String,
    pub year: String,
    pub genre: String,
    pub track_number: String,
    pub comments: String,
    pub total_time: String,
    pub sample_rate: String,
    pub bit_rate: String,
    pub average_bpm: String,
    pub play_count: String,
    pub file_type: String,
    pub tonality: String,
    pub composer: String,
    pub location: String,
    pub size: String,
    /// 0-5 stars as stored in the library; scaled once at XML time.
    pub rating: i64,
    /// Raw color id as stored in the library; 0 when unset.
    pub color: i64,
    /// Serialized beat grid, decoded transiently during generation.
    pub beats: Option<Vec<u8>>,
    pub beats_version: String,
}

/// Shape of a position mark. Hotcue rows carry the cue type from the
/// source (1 = point, 4 = loop); the cuepoint row is synthesized from the
/// track's stored main cue position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkKind {
    Point,
    Loop,
    Cuepoint,
}

impl MarkKind {
    pub fn from_row(internal_type: &str, cue_type: i64) -> Self {
        if internal_type == "cuepoint" {
            Self::Cuepoint
        } else if cue_type == 4 {
            Self::Loop
        } else {
            Self::Point
        }
    }
}

/// A cue, loop, or synthesized main-cue marker belonging to one track.
/// `stop` holds the loop duration in seconds (0 for the other kinds);
/// the loop end position is `start + stop`.
#[derive(Debug, Clone)]
pub struct PositionMark {
    pub track_id: i64,
    pub name: String,
    pub kind: MarkKind,
    pub start: f64,
    pub stop: f64,
    pub num: i64,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

/// A playlist- or crate-origin track grouping. The id carries a source
/// prefix digit ('1' for playlists, '2' for crates) so the two id spaces
/// cannot collide; the name carries a matching [P]/[C] tag.
#[derive(Debug, Clone)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub track_ids: Vec<i64>,
}
