use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// JSON file holding every city name the chat surface has been asked about,
/// lower-cased and without duplicates.
#[derive(Debug, Clone)]
pub struct KnownCitiesLedger {
    path: PathBuf,
}

impl KnownCitiesLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All recorded cities. A missing or unreadable-as-JSON file counts as empty.
    pub fn load(&self) -> Result<Vec<String>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read cities file: {}", self.path.display()))?;

        match serde_json::from_str(&contents) {
            Ok(cities) => Ok(cities),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "ignoring corrupt cities file");
                Ok(Vec::new())
            }
        }
    }

    /// Record `city` if it is not known yet. Returns whether the file changed.
    pub fn record(&self, city: &str) -> Result<bool> {
        let city = city.to_lowercase();
        let mut cities = self.load()?;

        if cities.contains(&city) {
            return Ok(false);
        }
        cities.push(city);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create cities directory: {}", parent.display())
            })?;
        }

        let json =
            serde_json::to_string_pretty(&cities).context("Failed to serialize cities list")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write cities file: {}", self.path.display()))?;

        Ok(true)
    }
}
