/// Track colors recognized by the exporter, keyed by the integer color id
/// Mixxx stores in `library.color`. Each entry carries the `0x`-prefixed
/// hex string rekordbox expects in the `Colour` attribute and the color
/// family name used for `Grouping`.
pub const COLORS: &[(i64, &str, &str)] = &[
    (86264, "0x0000FF", "Blue"),
    (2023424, "0x00FF00", "Green"),
    (8849664, "0xFF0000", "Red"),
    (9963768, "0x660099", "Purple"),
    (16281848, "0xFF007F", "Pink"),
    (16293936, "0xFFA500", "Orange"),
    (16311089, "0xFFFF00", "Yellow"),
];

/// Hex code for a color id. Unknown ids map to the empty string.
pub fn color_hex(id: i64) -> &'static str {
    COLORS
        .iter()
        .find(|(code, _, _)| *code == id)
        .map(|(_, hex, _)| *hex)
        .unwrap_or("")
}

/// Color family name for a color id. Unknown ids map to the empty string.
pub fn color_name(id: i64) -> &'static str {
    COLORS
        .iter()
        .find(|(code, _, _)| *code == id)
        .map(|(_, _, name)| *name)
        .unwrap_or("")
}

/// Convert a 0-5 star rating to the rekordbox XML scale. Values past the
/// top of the scale clamp to 255; anything unrecognized maps to 0.
pub fn rating_value(stars: i64) -> i64 {
    match stars {
        0 => 0,
        1 => 51,
        2 => 102,
        3 => 153,
        4 => 204,
        s if s >= 5 => 255,
        _ => 0,
    }
}

/// Descriptive `Kind` label for a Mixxx filetype token. Tokens without a
/// known label pass through unchanged.
pub fn file_kind(token: &str) -> &str {
    match token {
        "m4a" => "M4A File",
        "mp3" => "MP3 File",
        other => other,
    }
}
