use std::collections::HashMap;
use std::fmt::Write;
use std::fs;
use std::path::Path;

use crate::beatgrid;
use crate::error::Result;
use crate::fields;
use crate::paths;
use crate::types::{MarkKind, Playlist, PositionMark, Track};

/// Render the whole rekordbox document as one string. Attribute order,
/// indentation and self-closing forms are fixed; rekordbox and several
/// third-party importers are picky about all three.
pub fn generate(
    tracks: &[Track],
    marks: &HashMap<i64, Vec<PositionMark>>,
    playlists: &[Playlist],
    old_base: &str,
    new_base: &str,
) -> String {
    let mut xml = String::with_capacity(tracks.len() * 512 + 1024);
    xml.push_str("<?xml version='1.0' encoding='UTF-8'?>\n");
    xml.push_str("<DJ_PLAYLISTS Version=\"1.0.0\">\n");
    xml.push_str("  <PRODUCT Name=\"rekordbox\" Version=\"6.7.7\" Company=\"AlphaTheta\"/>\n");
    writeln!(xml, "  <COLLECTION Entries=\"{}\">", tracks.len()).unwrap();
    for track in tracks {
        write_track(&mut xml, track, marks, old_base, new_base);
    }
    xml.push_str("  </COLLECTION>\n");
    write_playlists(&mut xml, playlists);
    xml.push_str("</DJ_PLAYLISTS>");
    xml
}

/// Write the document to disk, creating parent directories as needed.
pub fn write_xml(path: &Path, xml: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, xml)?;
    Ok(())
}

fn write_track(
    xml: &mut String,
    track: &Track,
    marks: &HashMap<i64, Vec<PositionMark>>,
    old_base: &str,
    new_base: &str,
) {
    let location = paths::remap_location(&track.location, old_base, new_base);
    writeln!(
        xml,
        "    <TRACK TrackID=\"{id}\" Name=\"{name}\" Artist=\"{artist}\" \
         Composer=\"{composer}\" Album=\"{album}\" Grouping=\"{grouping}\" \
         Genre=\"{genre}\" Kind=\"{kind}\" Size=\"{size}\" TotalTime=\"{total_time}\" \
         DiscNumber=\"\" TrackNumber=\"{track_number}\" Year=\"{year}\" \
         AverageBpm=\"{average_bpm}\" DateAdded=\"\" BitRate=\"{bit_rate}\" \
         SampleRate=\"{sample_rate}\" Comments=\"{comments}\" PlayCount=\"{play_count}\" \
         Rating=\"{rating}\" Location=\"{location}\" Remixer=\"\" \
         Tonality=\"{tonality}\" Label=\"\" Mix=\"\" Colour=\"{colour}\">",
        id = track.id,
        name = xml_escape(&track.title),
        artist = xml_escape(&track.artist),
        composer = xml_escape(&track.composer),
        album = xml_escape(&track.album),
        grouping = fields::color_name(track.color),
        genre = xml_escape(&track.genre),
        kind = xml_escape(fields::file_kind(&track.file_type)),
        size = xml_escape(&track.size),
        total_time = xml_escape(&track.total_time),
        track_number = xml_escape(&track.track_number),
        year = xml_escape(&track.year),
        average_bpm = xml_escape(&track.average_bpm),
        bit_rate = xml_escape(&track.bit_rate),
        sample_rate = xml_escape(&track.sample_rate),
        comments = xml_escape(&track.comments),
        play_count = xml_escape(&track.play_count),
        rating = fields::rating_value(track.rating),
        location = xml_escape(&location),
        tonality = xml_escape(&track.tonality),
        colour = fields::color_hex(track.color),
    )
    .unwrap();

    if non_zero(&track.average_bpm) && non_zero(&track.sample_rate) {
        let sample_rate: f64 = track.sample_rate.parse().unwrap_or(0.0);
        let inizio = beatgrid::first_beat_seconds(
            track.beats.as_deref(),
            &track.beats_version,
            sample_rate,
        )
        .unwrap_or(0.0);
        writeln!(
            xml,
            "      <TEMPO Inizio=\"{inizio:.3}\" Bpm=\"{bpm}\" Metro=\"4/4\" Battito=\"1\"/>",
            bpm = xml_escape(&track.average_bpm),
        )
        .unwrap();
    }

    if let Some(track_marks) = marks.get(&track.id) {
        for mark in track_marks {
            write_mark(xml, mark);
        }
    }
    xml.push_str("    </TRACK>\n");
}

fn write_mark(xml: &mut String, mark: &PositionMark) {
    let name = xml_escape(&mark.name);
    match mark.kind {
        MarkKind::Cuepoint => writeln!(
            xml,
            "      <POSITION_MARK Name=\"{name}\" Type=\"0\" Start=\"{start:.3}\" Num=\"-1\"/>",
            start = mark.start,
        )
        .unwrap(),
        MarkKind::Loop => writeln!(
            xml,
            "      <POSITION_MARK Name=\"{name}\" Type=\"4\" Start=\"{start:.3}\" \
             End=\"{end:.3}\" Num=\"-1\"/>",
            start = mark.start,
            end = mark.start + mark.stop,
        )
        .unwrap(),
        MarkKind::Point => writeln!(
            xml,
            "      <POSITION_MARK Name=\"{name}\" Type=\"0\" Start=\"{start:.3}\" \
             Num=\"{num}\" Red=\"{red}\" Green=\"{green}\" Blue=\"{blue}\"/>",
            start = mark.start,
            num = mark.num,
            red = mark.red,
            green = mark.green,
            blue = mark.blue,
        )
        .unwrap(),
    }
}

fn write_playlists(xml: &mut String, playlists: &[Playlist]) {
    if playlists.is_empty() {
        return;
    }
    let mut sorted: Vec<&Playlist> = playlists.iter().collect();
    sorted.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

    xml.push_str("  <PLAYLISTS>\n");
    writeln!(
        xml,
        "    <NODE Name=\"ROOT\" Type=\"0\" Count=\"{}\">",
        sorted.len()
    )
    .unwrap();
    for playlist in sorted {
        writeln!(
            xml,
            "      <NODE Name=\"{name}\" Type=\"1\" KeyType=\"0\" Entries=\"{entries}\">",
            name = xml_escape(&playlist.name),
            entries = playlist.track_ids.len(),
        )
        .unwrap();
        for track_id in &playlist.track_ids {
            writeln!(xml, "        <TRACK Key=\"{track_id}\"/>").unwrap();
        }
        xml.push_str("      </NODE>\n");
    }
    xml.push_str("    </NODE>\n");
    xml.push_str("  </PLAYLISTS>\n");
}

/// Numeric source columns arrive as text, so absent and zero read as ""
/// and "0". Either way the tempo grid has nothing to anchor on.
fn non_zero(value: &str) -> bool {
    !value.is_empty() && value != "0"
}

/// Escape special characters for XML attribute values.
fn xml_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use prost::Message;

    use super::*;
    use crate::beatgrid::{Beat, BeatGrid, Bpm};

    fn make_test_track() -> Track {
        Track {
            id: 1,
            artist: "Pangaea".into(),
            title: "Router".into(),
            album: "In Drum Play".into(),
            year: "2016".into(),
            genre: "Techno".into(),
            track_number: "3".into(),
            comments: String::new(),
            total_time: "337".into(),
            sample_rate: "44100".into(),
            bit_rate: "320".into(),
            average_bpm: "128".into(),
            play_count: "4".into(),
            file_type: "mp3".into(),
            tonality: "Am".into(),
            composer: String::new(),
            location: "file://localhost//home/dj/music/router.mp3".into(),
            size: "13478912".into(),
            rating: 0,
            color: 0,
            beats: None,
            beats_version: String::new(),
        }
    }

    fn generate_one(track: Track) -> String {
        generate(
            &[track],
            &HashMap::new(),
            &[],
            "/home/dj/music",
            "/home/dj/music",
        )
    }

    fn marks_for(track_id: i64, marks: Vec<PositionMark>) -> HashMap<i64, Vec<PositionMark>> {
        let mut map = HashMap::new();
        map.insert(track_id, marks);
        map
    }

    #[test]
    fn document_shape_is_fixed() {
        let xml = generate_one(make_test_track());
        assert!(xml.starts_with(
            "<?xml version='1.0' encoding='UTF-8'?>\n<DJ_PLAYLISTS Version=\"1.0.0\">\n"
        ));
        assert!(xml
            .contains("  <PRODUCT Name=\"rekordbox\" Version=\"6.7.7\" Company=\"AlphaTheta\"/>\n"));
        assert!(xml.contains("  <COLLECTION Entries=\"1\">\n"));
        assert!(xml.ends_with("</DJ_PLAYLISTS>"));
        assert!(!xml.contains("<PLAYLISTS>"));
    }

    #[test]
    fn empty_library_still_yields_skeleton() {
        let xml = generate(&[], &HashMap::new(), &[], "/a", "/b");
        assert!(xml.contains("  <COLLECTION Entries=\"0\">\n  </COLLECTION>\n"));
        assert!(xml.ends_with("</DJ_PLAYLISTS>"));
    }

    #[test]
    fn track_attributes_keep_fixed_order() {
        let xml = generate_one(make_test_track());
        assert!(xml.contains(
            "    <TRACK TrackID=\"1\" Name=\"Router\" Artist=\"Pangaea\" Composer=\"\" \
             Album=\"In Drum Play\" Grouping=\"\" Genre=\"Techno\" Kind=\"MP3 File\" \
             Size=\"13478912\" TotalTime=\"337\" DiscNumber=\"\" TrackNumber=\"3\" \
             Year=\"2016\" AverageBpm=\"128\" DateAdded=\"\" BitRate=\"320\" \
             SampleRate=\"44100\" Comments=\"\" PlayCount=\"4\" Rating=\"0\" \
             Location=\"file://localhost/home/dj/music/router.mp3\" Remixer=\"\" \
             Tonality=\"Am\" Label=\"\" Mix=\"\" Colour=\"\">\n"
        ));
        assert!(xml.contains("    </TRACK>\n"));
    }

    #[test]
    fn location_rewritten_onto_new_base() {
        let mut track = make_test_track();
        track.location = "file://localhost//home/user/music/song.mp3".into();
        let xml = generate(
            &[track],
            &HashMap::new(),
            &[],
            "/home/user/music",
            "D:/music",
        );
        assert!(xml.contains("Location=\"file://localhost/D:/music/song.mp3\""));
    }

    #[test]
    fn tempo_written_with_zero_anchor_when_no_grid() {
        let xml = generate_one(make_test_track());
        assert!(
            xml.contains("      <TEMPO Inizio=\"0.000\" Bpm=\"128\" Metro=\"4/4\" Battito=\"1\"/>\n")
        );
    }

    #[test]
    fn tempo_skipped_when_bpm_or_rate_unusable() {
        let mut no_bpm = make_test_track();
        no_bpm.average_bpm = String::new();
        assert!(!generate_one(no_bpm).contains("<TEMPO"));

        let mut zero_rate = make_test_track();
        zero_rate.sample_rate = "0".into();
        assert!(!generate_one(zero_rate).contains("<TEMPO"));
    }

    #[test]
    fn tempo_anchor_comes_from_decoded_grid() {
        let grid = BeatGrid {
            bpm: Some(Bpm {
                bpm: Some(128.0),
                source: None,
            }),
            first_beat: Some(Beat {
                frame_position: Some(11025),
                enabled: None,
                source: None,
            }),
        };
        let mut track = make_test_track();
        track.beats = Some(grid.encode_to_vec());
        track.beats_version = "BeatGrid-2.0".into();
        let xml = generate_one(track);
        assert!(xml.contains("<TEMPO Inizio=\"0.250\" Bpm=\"128\""));
    }

    #[test]
    fn loop_marks_span_start_plus_length() {
        let mark = PositionMark {
            track_id: 1,
            name: String::new(),
            kind: MarkKind::Loop,
            start: 10.0,
            stop: 5.0,
            num: -1,
            red: 0,
            green: 0,
            blue: 0,
        };
        let xml = generate(
            &[make_test_track()],
            &marks_for(1, vec![mark]),
            &[],
            "/home/dj/music",
            "/home/dj/music",
        );
        assert!(xml.contains(
            "      <POSITION_MARK Name=\"\" Type=\"4\" Start=\"10.000\" End=\"15.000\" Num=\"-1\"/>\n"
        ));
    }

    #[test]
    fn point_marks_carry_color_channels() {
        let mark = PositionMark {
            track_id: 1,
            name: "Drop".into(),
            kind: MarkKind::Point,
            start: 1.0,
            stop: 0.0,
            num: 0,
            red: 255,
            green: 0,
            blue: 127,
        };
        let xml = generate(
            &[make_test_track()],
            &marks_for(1, vec![mark]),
            &[],
            "/home/dj/music",
            "/home/dj/music",
        );
        assert!(xml.contains(
            "      <POSITION_MARK Name=\"Drop\" Type=\"0\" Start=\"1.000\" Num=\"0\" \
             Red=\"255\" Green=\"0\" Blue=\"127\"/>\n"
        ));
    }

    #[test]
    fn cuepoint_marks_drop_color_and_slot() {
        let mark = PositionMark {
            track_id: 1,
            name: "Cuepoint".into(),
            kind: MarkKind::Cuepoint,
            start: 0.5,
            stop: 0.0,
            num: -1,
            red: 0,
            green: 0,
            blue: 0,
        };
        let xml = generate(
            &[make_test_track()],
            &marks_for(1, vec![mark]),
            &[],
            "/home/dj/music",
            "/home/dj/music",
        );
        assert!(xml.contains(
            "      <POSITION_MARK Name=\"Cuepoint\" Type=\"0\" Start=\"0.500\" Num=\"-1\"/>\n"
        ));
        assert!(!xml.contains("Red=\"0\""));
    }

    #[test]
    fn marks_for_unknown_tracks_are_ignored() {
        let mark = PositionMark {
            track_id: 99,
            name: "Orphan".into(),
            kind: MarkKind::Point,
            start: 1.0,
            stop: 0.0,
            num: 0,
            red: 0,
            green: 0,
            blue: 0,
        };
        let xml = generate(
            &[make_test_track()],
            &marks_for(99, vec![mark]),
            &[],
            "/home/dj/music",
            "/home/dj/music",
        );
        assert!(!xml.contains("POSITION_MARK"));
    }

    #[test]
    fn special_characters_are_escaped() {
        let mut track = make_test_track();
        track.title = "Drums & \"Bass\" <3".into();
        track.artist = "Mica Levi's".into();
        let xml = generate_one(track);
        assert!(xml.contains("Name=\"Drums &amp; &quot;Bass&quot; &lt;3\""));
        assert!(xml.contains("Artist=\"Mica Levi&apos;s\""));
    }

    #[test]
    fn colour_and_grouping_follow_color_table() {
        let mut colored = make_test_track();
        colored.color = 8849664;
        let xml = generate_one(colored);
        assert!(xml.contains("Grouping=\"Red\""));
        assert!(xml.contains(" Colour=\"0xFF0000\">"));

        // Unset and unknown ids fall back to empty strings.
        let plain = generate_one(make_test_track());
        assert!(plain.contains("Grouping=\"\""));
        assert!(plain.contains(" Colour=\"\">"));
    }

    #[test]
    fn rating_mapped_onto_target_scale() {
        let mut track = make_test_track();
        track.rating = 3;
        let xml = generate_one(track);
        assert!(xml.contains("Rating=\"153\""));
    }

    #[test]
    fn playlists_sorted_case_insensitively() {
        let playlists = vec![
            Playlist {
                id: "11".into(),
                name: "Warm Up".into(),
                track_ids: vec![1],
            },
            Playlist {
                id: "12".into(),
                name: "after hours".into(),
                track_ids: vec![1, 2],
            },
        ];
        let xml = generate(
            &[make_test_track()],
            &HashMap::new(),
            &playlists,
            "/home/dj/music",
            "/home/dj/music",
        );
        assert!(xml.contains("  <PLAYLISTS>\n    <NODE Name=\"ROOT\" Type=\"0\" Count=\"2\">\n"));
        assert!(xml.contains(
            "      <NODE Name=\"after hours\" Type=\"1\" KeyType=\"0\" Entries=\"2\">\n"
        ));
        assert!(xml.contains("        <TRACK Key=\"2\"/>\n"));
        let after = xml.find("Name=\"after hours\"").unwrap();
        let warm = xml.find("Name=\"Warm Up\"").unwrap();
        assert!(after < warm);
        assert!(xml.contains("  </PLAYLISTS>\n</DJ_PLAYLISTS>"));
    }

    #[test]
    fn write_xml_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.xml");
        write_xml(&path, "<DJ_PLAYLISTS/>").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "<DJ_PLAYLISTS/>");
    }
}
