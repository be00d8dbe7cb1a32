use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{errors::Result, ledger::Dataset};

const TMP_SUFFIX: &str = "tmp";

/// Disk copy of the last dataset successfully loaded from the service.
#[derive(Debug, Clone)]
pub struct DatasetCache {
    path: PathBuf,
}

impl DatasetCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the dataset atomically by staging to a temporary file.
    /// Any active suggestion is stripped first.
    pub fn save(&self, dataset: &Dataset) -> Result<()> {
        let json = serde_json::to_string_pretty(&dataset.without_suggestion())?;
        write_file_atomic(&self.path, &json)?;
        debug!(path = %self.path.display(), "dataset cache written");
        Ok(())
    }

    /// Returns `Ok(None)` when nothing has been cached yet.
    pub fn load(&self) -> Result<Option<Dataset>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&data)?))
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

/// Stages `data` next to `path` and renames it into place.
pub(crate) fn write_file_atomic(path: &Path, data: &str) -> Result<()> {
    let tmp = tmp_path(path);
    write_staged(&tmp, data)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn write_staged(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
