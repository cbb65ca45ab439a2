use std::collections::HashMap;
use std::path::PathBuf;

use log::info;

use crate::db;
use crate::error::Result;
use crate::types::PositionMark;
use crate::xml;

/// Everything one export run needs; the CLI fills this in after
/// validating it.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub database: PathBuf,
    pub old_base: String,
    pub new_base: String,
    pub include_playlists: bool,
    pub include_crates: bool,
}

/// Run the whole pipeline: read the library, group the cue rows per
/// track, render the document. The connection is scoped to this call
/// and drops on every exit path, error returns included.
pub fn export(opts: &ExportOptions) -> Result<String> {
    let conn = db::open(&opts.database)?;

    let tracks = db::tracks(&conn)?;
    info!("extracted {} tracks", tracks.len());

    let marks = group_marks(db::position_marks(&conn)?);
    info!("extracted cue marks for {} tracks", marks.len());

    let playlists = db::playlists(&conn, opts.include_playlists, opts.include_crates)?;
    info!("extracted {} playlist groups", playlists.len());

    Ok(xml::generate(
        &tracks,
        &marks,
        &playlists,
        &opts.old_base,
        &opts.new_base,
    ))
}

/// The marker query returns one flat row set; the generator wants them
/// keyed by track, each group keeping the query's row order.
fn group_marks(marks: Vec<PositionMark>) -> HashMap<i64, Vec<PositionMark>> {
    let mut grouped: HashMap<i64, Vec<PositionMark>> = HashMap::new();
    for mark in marks {
        grouped.entry(mark.track_id).or_default().push(mark);
    }
    grouped
}
