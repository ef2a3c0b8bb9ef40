//! Favorites persistence
//!
//! The favorites list lives in a single JSON slot. It is read once at
//! startup and rewritten in full after every change.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::MovieSummary;

#[derive(Debug, Error)]
pub enum FavoritesError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid favorites file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Ordered set of favorite movies keyed by id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FavoritesList {
    items: Vec<MovieSummary>,
}

impl FavoritesList {
    /// Build a list, dropping later entries that repeat an id
    pub fn from_items(items: Vec<MovieSummary>) -> Self {
        let mut list = Self::default();
        list.merge(items);
        list
    }

    pub fn items(&self) -> &[MovieSummary] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, movie_id: u64) -> bool {
        self.items.iter().any(|m| m.id == movie_id)
    }

    /// Append movies whose id is not present yet; returns how many were added
    pub fn merge(&mut self, items: Vec<MovieSummary>) -> usize {
        let before = self.items.len();
        for item in items {
            if !self.contains(item.id) {
                self.items.push(item);
            }
        }
        self.items.len() - before
    }
}

/// Remove `movie` if its id is favorited, otherwise append it
pub fn toggle(list: &FavoritesList, movie: &MovieSummary) -> FavoritesList {
    if list.contains(movie.id) {
        FavoritesList {
            items: list.items.iter().filter(|m| m.id != movie.id).cloned().collect(),
        }
    } else {
        let mut items = list.items.clone();
        items.push(movie.clone());
        FavoritesList { items }
    }
}

/// Durable slot the store reads from and writes to
pub trait FavoritesStorage {
    fn read(&self) -> Option<String>;
    fn write(&mut self, contents: &str) -> io::Result<()>;
}

pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> PathBuf {
        crate::config::app_dir().join("favorites.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FavoritesStorage for FileStorage {
    fn read(&self) -> Option<String> {
        fs::read_to_string(&self.path).ok()
    }

    fn write(&mut self, contents: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, contents)
    }
}

pub struct FavoritesStore<S: FavoritesStorage> {
    storage: S,
    loaded: bool,
}

impl<S: FavoritesStorage> FavoritesStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage, loaded: false }
    }

    /// Read the stored list. Absent or malformed data yields an empty list.
    pub fn load(&mut self) -> FavoritesList {
        self.loaded = true;

        let Some(content) = self.storage.read() else {
            return FavoritesList::default();
        };
        if content.trim().is_empty() {
            return FavoritesList::default();
        }

        match serde_json::from_str::<Option<Vec<MovieSummary>>>(&content) {
            Ok(items) => {
                let list = FavoritesList::from_items(items.unwrap_or_default());
                log::info!("Loaded {} favorites", list.len());
                list
            }
            Err(e) => {
                log::warn!("Stored favorites are malformed, starting empty: {}", e);
                FavoritesList::default()
            }
        }
    }

    /// Overwrite the stored list. Best effort: failures are only logged.
    pub fn persist(&mut self, list: &FavoritesList) {
        if !self.loaded {
            log::debug!("Skipping favorites write before initial load");
            return;
        }
        let content = match serde_json::to_string_pretty(&list.items) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Failed to serialize favorites: {}", e);
                return;
            }
        };
        if let Err(e) = self.storage.write(&content) {
            log::warn!("Failed to save favorites: {}", e);
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

/// Write the list to a user-chosen file
pub fn export_to(path: &Path, list: &FavoritesList) -> Result<(), FavoritesError> {
    let content = serde_json::to_string_pretty(&list.items)?;
    fs::write(path, content)?;
    Ok(())
}

/// Read a previously exported list
pub fn import_from(path: &Path) -> Result<Vec<MovieSummary>, FavoritesError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
