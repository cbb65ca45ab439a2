/// Location form Mixxx writes for absolute source paths: the host token
/// followed by the path's own leading slash.
const SOURCE_PREFIX: &str = "file://localhost//";

const TARGET_PREFIX: &str = "file://localhost";

/// Rewrite a track location onto the destination base path.
///
/// Only locations in the `file://localhost//<path>` form are touched;
/// anything else passes through unchanged. The old base must match the
/// start of the path exactly (case-sensitive, no `.`/`..` resolution);
/// when it does not, the original location is returned unmodified rather
/// than partially rewritten.
pub fn remap_location(location: &str, old_base: &str, new_base: &str) -> String {
    if !location.starts_with(SOURCE_PREFIX) {
        return location.to_string();
    }

    // Strip the host token but keep the path's own leading slash.
    let path = normalize_separators(&location[SOURCE_PREFIX.len() - 1..]);
    let old = normalize_separators(old_base);
    let new = normalize_separators(new_base);

    let Some(tail) = path.strip_prefix(old.as_str()) else {
        return location.to_string();
    };

    let mut mapped = format!("{new}{tail}");
    if !mapped.starts_with('/') {
        mapped.insert(0, '/');
    }
    format!("{TARGET_PREFIX}{mapped}")
}

/// Convert backslash separators to the forward-slash form used in URIs.
fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}
