use std::path::Path;

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};

use crate::types::{MarkKind, Playlist, PositionMark, Track};

/// Open a Mixxx database read-only. Nothing in the export writes to it.
pub fn open(path: &Path) -> Result<Connection, rusqlite::Error> {
    Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
}

/// Library rows joined with their file location. Nullable fields default
/// to the empty string here so that no null ever reaches the document;
/// rating, filetype and color are extracted raw and mapped once at
/// generation time.
const TRACK_SELECT: &str = "
SELECT
    T0.id AS TrackID,
    IFNULL(T0.artist, '') AS Artist,
    IFNULL(T0.title, '') AS Name,
    IFNULL(T0.album, '') AS Album,
    IFNULL(T0.year, '') AS Year,
    IFNULL(T0.genre, '') AS Genre,
    IFNULL(T0.tracknumber, '') AS TrackNumber,
    IFNULL(T0.comment, '') AS Comments,
    IFNULL(T0.duration, '') AS TotalTime,
    IFNULL(T0.samplerate, '') AS SampleRate,
    IFNULL(T0.bitrate, '') AS BitRate,
    IFNULL(T0.bpm, '') AS AverageBpm,
    IFNULL(T0.timesplayed, '') AS PlayCount,
    IFNULL(T0.filetype, '') AS FileType,
    IFNULL(T0.key, '') AS Tonality,
    IFNULL(T0.composer, '') AS Composer,
    'file://localhost/' || T1.location AS Location,
    IFNULL(T1.filesize, '') AS Size,
    IFNULL(T0.rating, 0) AS Rating,
    T0.color,
    T0.beats,
    T0.beats_version
FROM library T0
INNER JOIN track_locations T1 ON T0.id = T1.id
WHERE T0.mixxx_deleted = 0
";

/// Explicit cue and loop rows, followed by one synthesized main-cue row
/// per track whose stored cue position is set and positive. Sample
/// offsets divide by twice the sample rate because the source counts
/// stereo-interleaved samples. No ORDER BY: per-track marker order is
/// this query's row order, hotcues first.
const MARK_SELECT: &str = "
SELECT
    T0.track_id AS TrackID,
    T0.label AS Name,
    T0.type AS Type,
    'hotcue' AS InternalType,
    ROUND(T0.position / (2.0 * T1.samplerate), 3) AS Start,
    ROUND(T0.length / (2.0 * T1.samplerate), 3) AS Stop,
    T0.hotcue AS Num,
    ((T0.color >> 16) & 255) AS Red,
    ((T0.color >> 8) & 255) AS Green,
    (T0.color & 255) AS Blue
FROM cues T0
INNER JOIN library T1 ON T0.track_id = T1.id
WHERE T0.type IN (1, 4) AND T1.mixxx_deleted = 0
UNION ALL
SELECT
    T1.id,
    'Cuepoint',
    0,
    'cuepoint',
    ROUND(T1.cuepoint / (2.0 * T1.samplerate), 3),
    0,
    -1,
    0,
    0,
    0
FROM library T1
WHERE T1.mixxx_deleted = 0 AND T1.cuepoint IS NOT NULL AND T1.cuepoint > 0
";

/// Membership rows for non-hidden playlists. The id prefix digit keeps
/// playlist ids clear of crate ids, the name tag marks the origin.
const PLAYLIST_BRANCH: &str = "
SELECT
    '1' || T0.id AS id,
    '[P]' || T0.name AS name,
    T1.track_id AS track_id,
    T1.position AS position
FROM Playlists T0
INNER JOIN PlaylistTracks T1 ON T0.id = T1.playlist_id
INNER JOIN library T2 ON T1.track_id = T2.id
WHERE T0.hidden = 0";

/// Membership rows for crates. Crates carry no intrinsic order, so the
/// track id doubles as the position.
const CRATE_BRANCH: &str = "
SELECT
    '2' || T0.id AS id,
    '[C]' || T0.name AS name,
    T1.track_id AS track_id,
    T1.track_id AS position
FROM crates T0
INNER JOIN crate_tracks T1 ON T0.id = T1.crate_id
INNER JOIN library T2 ON T1.track_id = T2.id";

pub fn tracks(conn: &Connection) -> Result<Vec<Track>, rusqlite::Error> {
    let mut stmt = conn.prepare(TRACK_SELECT)?;
    let rows = stmt.query_map([], row_to_track)?;
    rows.collect()
}

pub fn position_marks(conn: &Connection) -> Result<Vec<PositionMark>, rusqlite::Error> {
    let mut stmt = conn.prepare(MARK_SELECT)?;
    let rows = stmt.query_map([], row_to_mark)?;
    rows.collect()
}

/// Playlist and crate memberships folded into one group per source id.
/// The ORDER BY keeps each group's rows contiguous, so folding is a
/// single scan. With both sources excluded this returns no groups.
pub fn playlists(
    conn: &Connection,
    include_playlists: bool,
    include_crates: bool,
) -> Result<Vec<Playlist>, rusqlite::Error> {
    let mut branches = Vec::new();
    if include_playlists {
        branches.push(PLAYLIST_BRANCH);
    }
    if include_crates {
        branches.push(CRATE_BRANCH);
    }
    if branches.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "{} ORDER BY id, position ASC",
        branches.join("\nUNION ALL\n")
    );

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    let mut groups: Vec<Playlist> = Vec::new();
    while let Some(row) = rows.next()? {
        let id: String = row.get("id")?;
        let track_id: i64 = row.get("track_id")?;
        match groups.last_mut() {
            Some(last) if last.id == id => last.track_ids.push(track_id),
            _ => groups.push(Playlist {
                id,
                name: row.get("name")?,
                track_ids: vec![track_id],
            }),
        }
    }
    Ok(groups)
}

fn row_to_track(row: &rusqlite::Row) -> Result<Track, rusqlite::Error> {
    Ok(Track {
        id: row.get("TrackID")?,
        artist: text_value(row, "Artist")?,
        title: text_value(row, "Name")?,
        album: text_value(row, "Album")?,
        year: text_value(row, "Year")?,
        genre: text_value(row, "Genre")?,
        track_number: text_value(row, "TrackNumber")?,
        comments: text_value(row, "Comments")?,
        total_time: text_value(row, "TotalTime")?,
        sample_rate: text_value(row, "SampleRate")?,
        bit_rate: text_value(row, "BitRate")?,
        average_bpm: text_value(row, "AverageBpm")?,
        play_count: text_value(row, "PlayCount")?,
        file_type: text_value(row, "FileType")?,
        tonality: text_value(row, "Tonality")?,
        composer: text_value(row, "Composer")?,
        location: text_value(row, "Location")?,
        size: text_value(row, "Size")?,
        rating: row.get("Rating")?,
        color: row.get::<_, Option<i64>>("color")?.unwrap_or(0),
        beats: row.get("beats")?,
        beats_version: row
            .get::<_, Option<String>>("beats_version")?
            .unwrap_or_default(),
    })
}

fn row_to_mark(row: &rusqlite::Row) -> Result<PositionMark, rusqlite::Error> {
    let internal_type: String = row.get("InternalType")?;
    let cue_type: i64 = row.get("Type")?;
    Ok(PositionMark {
        track_id: row.get("TrackID")?,
        name: text_value(row, "Name")?,
        kind: MarkKind::from_row(&internal_type, cue_type),
        start: row.get::<_, Option<f64>>("Start")?.unwrap_or(0.0),
        stop: row.get::<_, Option<f64>>("Stop")?.unwrap_or(0.0),
        num: row.get("Num")?,
        red: channel(row, "Red")?,
        green: channel(row, "Green")?,
        blue: channel(row, "Blue")?,
    })
}

/// One 0-255 color channel; cue rows without a color read as 0.
fn channel(row: &rusqlite::Row, col: &str) -> Result<u8, rusqlite::Error> {
    Ok(row.get::<_, Option<i64>>(col)?.unwrap_or(0) as u8)
}

/// Text rendering of a column whose storage class varies: the IFNULL
/// defaults leave TEXT '' behind for absent values while present values
/// keep their original class. Integer and real values render the way
/// they would round-trip, so a bpm stored as 128.0 comes out as "128".
fn text_value(row: &rusqlite::Row, col: &str) -> Result<String, rusqlite::Error> {
    Ok(match row.get_ref(col)? {
        ValueRef::Null => String::new(),
        ValueRef::Integer(n) => n.to_string(),
        ValueRef::Real(r) => r.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(_) => String::new(),
    })
}

/// The slice of the Mixxx schema the extraction queries touch.
#[cfg(test)]
pub(crate) const TEST_SCHEMA: &str = "
    CREATE TABLE library (
        id INTEGER PRIMARY KEY,
        artist TEXT,
        title TEXT,
        album TEXT,
        year TEXT,
        genre TEXT,
        tracknumber TEXT,
        comment TEXT,
        duration REAL,
        samplerate INTEGER,
        bitrate INTEGER,
        bpm REAL,
        timesplayed INTEGER,
        filetype TEXT,
        key TEXT,
        composer TEXT,
        rating INTEGER DEFAULT 0,
        color INTEGER,
        cuepoint INTEGER,
        beats BLOB,
        beats_version TEXT,
        mixxx_deleted INTEGER DEFAULT 0
    );
    CREATE TABLE track_locations (
        id INTEGER PRIMARY KEY,
        location TEXT,
        filesize INTEGER
    );
    CREATE TABLE cues (
        id INTEGER PRIMARY KEY,
        track_id INTEGER NOT NULL,
        type INTEGER DEFAULT 0,
        position INTEGER DEFAULT -1,
        length INTEGER DEFAULT 0,
        hotcue INTEGER DEFAULT -1,
        label TEXT DEFAULT '',
        color INTEGER DEFAULT 4294901760
    );
    CREATE TABLE Playlists (
        id INTEGER PRIMARY KEY,
        name TEXT,
        hidden INTEGER DEFAULT 0
    );
    CREATE TABLE PlaylistTracks (
        id INTEGER PRIMARY KEY,
        playlist_id INTEGER,
        track_id INTEGER,
        position INTEGER
    );
    CREATE TABLE crates (
        id INTEGER PRIMARY KEY,
        name TEXT
    );
    CREATE TABLE crate_tracks (
        crate_id INTEGER,
        track_id INTEGER
    );
";

#[cfg(test)]
pub(crate) fn create_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("open in-memory db");
    conn.execute_batch(TEST_SCHEMA).expect("create schema");
    conn
}
