mod beatgrid;
mod db;
mod error;
mod export;
mod fields;
mod paths;
mod types;
mod xml;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::Parser;

use export::ExportOptions;

/// Export a Mixxx library database to rekordbox XML.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Path to mixxxdb.sqlite (in the Mixxx settings directory).
    database: PathBuf,

    /// Library base path to strip from every track location.
    #[arg(long)]
    old_base: String,

    /// Base path replacing OLD_BASE, as the target machine sees it.
    #[arg(long)]
    new_base: String,

    /// Leave playlists out of the export.
    #[arg(long)]
    skip_playlists: bool,

    /// Leave crates out of the export.
    #[arg(long)]
    skip_crates: bool,

    /// Where to write the document.
    #[arg(short, long, default_value = "rekordbox_export.xml")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if !cli.database.is_file() {
        bail!("database not found: {}", cli.database.display());
    }
    if cli.old_base.is_empty() || cli.new_base.is_empty() {
        bail!("--old-base and --new-base must not be empty");
    }
    if cli.skip_playlists && cli.skip_crates {
        bail!("--skip-playlists and --skip-crates together leave nothing to export as playlists");
    }

    let opts = ExportOptions {
        database: cli.database,
        old_base: cli.old_base,
        new_base: cli.new_base,
        include_playlists: !cli.skip_playlists,
        include_crates: !cli.skip_crates,
    };

    let started = Instant::now();
    let xml =
        export::export(&opts).with_context(|| format!("exporting {}", opts.database.display()))?;
    xml::write_xml(&cli.output, &xml)
        .with_context(|| format!("writing {}", cli.output.display()))?;

    eprintln!(
        "Done: wrote {} ({:.1}s)",
        cli.output.display(),
        started.elapsed().as_secs_f64()
    );
    Ok(())
}
