//! Reading and writing JSON documents on disk.

use crate::Result;
use ohno::IntoAppError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

const LOG_TARGET: &str = "     doc";

/// Load a document from a file
pub fn load<T>(path: impl AsRef<Path>, context: impl AsRef<str>) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let path = path.as_ref();
    let ctx = context.as_ref();

    let file = File::open(path).into_app_err_with(|| format!("unable to open {ctx} '{}'", path.display()))?;
    let data = serde_json::from_reader(BufReader::new(file)).into_app_err_with(|| format!("unable to parse {ctx} '{}'", path.display()))?;

    log::debug!(target: LOG_TARGET, "Loaded {ctx} from '{}'", path.display());
    Ok(data)
}

/// Save a document to a file, creating parent directories as needed
pub fn save<T>(data: &T, path: impl AsRef<Path>) -> Result<()>
where
    T: Serialize,
{
    let path = path.as_ref();

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).into_app_err_with(|| format!("unable to create directory '{}'", parent.display()))?;
    }

    let file = File::create(path).into_app_err_with(|| format!("unable to create file '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);

    write(data, &mut writer).into_app_err_with(|| format!("unable to write file '{}'", path.display()))?;
    writer.flush().into_app_err_with(|| format!("unable to flush file '{}'", path.display()))?;

    log::debug!(target: LOG_TARGET, "Saved '{}'", path.display());
    Ok(())
}

/// Write a document as pretty-printed JSON followed by a newline
pub fn write<T, W>(data: &T, mut writer: W) -> std::io::Result<()>
where
    T: Serialize,
    W: Write,
{
    serde_json::to_writer_pretty(&mut writer, data)?;
    writeln!(writer)
}
