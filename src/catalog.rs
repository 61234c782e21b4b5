use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::error::CatalogError;
use crate::voting::{Candidate, Catalog};

/// Where the running order comes from. Each fetch yields a fresh snapshot.
pub trait CatalogSource: Send + Sync {
    fn fetch(&self) -> Result<Catalog, CatalogError>;
}

/// Reads the song list from a JSON array on disk, re-read on every fetch.
pub struct JsonFileCatalog {
    path: PathBuf,
}

impl JsonFileCatalog {
    pub fn new(path: PathBuf) -> JsonFileCatalog {
        JsonFileCatalog { path }
    }
}

impl CatalogSource for JsonFileCatalog {
    fn fetch(&self) -> Result<Catalog, CatalogError> {
        let raw = fs::read_to_string(&self.path).map_err(|source| CatalogError::Io {
            path: self.path.clone(),
            source,
        })?;
        let songs: Vec<Candidate> = serde_json::from_str(&raw).map_err(|source| CatalogError::Parse {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), songs = songs.len(), "loaded catalog");

        Ok(Catalog::new(songs)?)
    }
}

pub struct StaticCatalog {
    songs: Vec<Candidate>,
}

impl StaticCatalog {
    pub fn new(songs: Vec<Candidate>) -> StaticCatalog {
        StaticCatalog { songs }
    }
}

impl CatalogSource for StaticCatalog {
    fn fetch(&self) -> Result<Catalog, CatalogError> {
        Ok(Catalog::new(self.songs.clone())?)
    }
}
