//! Result files.

use anyhow::{Context, bail};
use gridsweep::PlaceRecord;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// `results/places_<MM_DD_YYYY_HH_MM_SS>.json`, relative to the working
/// directory.
pub fn default_output_path() -> PathBuf {
    let stamp = chrono::Local::now().format("%m_%d_%Y_%H_%M_%S");
    PathBuf::from("results").join(format!("places_{}.json", stamp))
}

/// Write `records` as a pretty-printed JSON array, creating parent
/// directories as needed.
pub fn write_records(path: &Path, records: &[PlaceRecord]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.flush()?;
    Ok(())
}

/// Number of records in a result file written by [`write_records`].
pub fn count_records(path: &Path) -> anyhow::Result<usize> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("decoding JSON from {}", path.display()))?;

    match value {
        serde_json::Value::Array(items) => Ok(items.len()),
        _ => bail!("{} does not contain a list of places", path.display()),
    }
}
