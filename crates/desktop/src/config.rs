//! Runtime configuration resolved from the environment.

use std::path::PathBuf;

use anyhow::Context;

const DEFAULT_DB_FILE: &str = "closet.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WardrobeConfig {
    /// Directory holding the SQLite file.
    pub data_dir: PathBuf,
    /// SQLite file name inside `data_dir`.
    pub db_file: String,
}

impl WardrobeConfig {
    /// Resolve from `WARDROBE_DATA_DIR` / `WARDROBE_DB_FILE`, with OS defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let data_dir = match lookup("WARDROBE_DATA_DIR").filter(|v| !v.trim().is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };
        let db_file = lookup("WARDROBE_DB_FILE")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_DB_FILE.to_string());

        Ok(Self { data_dir, db_file })
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.db_file)
    }
}

/// `{app_data_dir}/wardrobe`.
fn default_data_dir() -> anyhow::Result<PathBuf> {
    let base = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .context("failed to resolve OS app data directory - tried data_dir() and home_dir()/.local/share")?;

    Ok(base.join("wardrobe"))
}
