use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::IgnoredAny;

use crate::error::CliError;

/// A directory of recorded signals.
///
/// Directory layout:
/// ```text
/// dir/
///   sine.json    -- { "title": "Sine 440 Hz", "data": [0.0, 0.06, ...] }
///   noise.json   -- [0.12, -0.4, ...]   (title taken from the file stem)
/// ```
pub struct SignalCatalog {
    dir: PathBuf,
}

/// One catalog entry. Samples are read only when [`SignalCatalog::load`] is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalEntry {
    pub name: String,
    pub title: String,
    pub path: PathBuf,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SignalFile {
    Titled { title: String, data: Vec<f32> },
    Bare(Vec<f32>),
}

/// Just enough of a `{title, data}` file to list it.
#[derive(Deserialize)]
struct TitledHeader {
    title: String,
    #[serde(rename = "data")]
    _data: Vec<IgnoredAny>,
}

impl SignalFile {
    fn into_parts(self, stem: &str) -> (String, Vec<f32>) {
        match self {
            SignalFile::Titled { title, data } => (title, data),
            SignalFile::Bare(data) => (stem.to_string(), data),
        }
    }
}

impl SignalCatalog {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All `*.json` signals, sorted by file name. Files that are not
    /// signals are logged and left out.
    pub async fn list(&self) -> Result<Vec<SignalEntry>, CliError> {
        let mut entries = Vec::new();

        if !self.dir.exists() {
            return Ok(entries);
        }

        let mut dir = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                match read_title(&path).await {
                    Ok(title) => entries.push(SignalEntry {
                        name: stem(&path),
                        title,
                        path,
                    }),
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Skipping signal file"
                        );
                    }
                }
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Find an entry by file stem or by title.
    pub async fn find(&self, key: &str) -> Result<SignalEntry, CliError> {
        self.list()
            .await?
            .into_iter()
            .find(|entry| entry.name == key || entry.title == key)
            .ok_or_else(|| CliError::SignalNotFound(key.to_string()))
    }

    pub async fn load(&self, entry: &SignalEntry) -> Result<Vec<f32>, CliError> {
        let (_, data) = read_signal(&entry.path).await?;
        tracing::debug!(signal = %entry.name, samples = data.len(), "Signal loaded");
        Ok(data)
    }
}

/// Read one signal file from anywhere on disk.
pub async fn read_signal(path: &Path) -> Result<(String, Vec<f32>), CliError> {
    let content = tokio::fs::read_to_string(path).await?;
    let file: SignalFile =
        serde_json::from_str(&content).map_err(|e| CliError::InvalidSignal {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
    Ok(file.into_parts(&stem(path)))
}

/// Title of a signal file without decoding its samples.
async fn read_title(path: &Path) -> Result<String, CliError> {
    let content = tokio::fs::read_to_string(path).await?;
    if let Ok(header) = serde_json::from_str::<TitledHeader>(&content) {
        return Ok(header.title);
    }
    serde_json::from_str::<Vec<IgnoredAny>>(&content).map_err(|e| CliError::InvalidSignal {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(stem(path))
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
