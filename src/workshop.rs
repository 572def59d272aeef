use crate::error::WorkshopError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the descriptor file Steam writes into every subscription folder.
pub const DESCRIPTOR_FILE: &str = "workshop.json";

/// Call of Duty: Black Ops III.
pub const DEFAULT_APP_ID: &str = "311210";

/// Static metadata of one subscription, as stored in `workshop.json`.
///
/// `size` is never read from the descriptor; the scanner fills it in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct SubscriptionDetails {
    pub description: String,
    pub folder_name: String,
    #[serde(rename = "PublisherID")]
    pub publisher_id: String,
    /// Kept as the raw text from the descriptor.
    pub tags: String,
    pub thumbnail: String,
    pub title: String,
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(skip)]
    pub size: u64,
}

/// Reads and decodes a `workshop.json` descriptor.
pub fn read_details(path: &Path) -> Result<SubscriptionDetails, WorkshopError> {
    let data = fs::read(path).map_err(|source| WorkshopError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_slice(&data).map_err(|source| WorkshopError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Where a Steam install keeps the workshop content of one app.
#[derive(Debug, Clone)]
pub struct WorkshopPaths {
    steam_root: PathBuf,
    marker: PathBuf,
}

impl WorkshopPaths {
    pub fn new(steam_root: impl Into<PathBuf>, app_id: &str) -> Self {
        let marker = ["steamapps", "workshop", "content", app_id]
            .iter()
            .collect();
        Self {
            steam_root: steam_root.into(),
            marker,
        }
    }

    pub fn steam_root(&self) -> &Path {
        &self.steam_root
    }

    /// Relative segment every deletable subscription must sit under.
    pub fn marker(&self) -> &Path {
        &self.marker
    }

    pub fn content_root(&self) -> PathBuf {
        self.steam_root.join(&self.marker)
    }
}
