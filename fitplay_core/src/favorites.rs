//! Favorite-routine boundary.
//!
//! The player never owns favorite state. It asks the store whether the
//! opened routine is a favorite and forwards toggle requests; persistence
//! is the store's business.

use crate::{Result, Routine};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Collaborator that owns the user's favorite routines
pub trait FavoritesStore {
    fn is_favorite(&self, routine_id: &str) -> bool;

    /// Flip the favorite flag, returning the new value
    fn toggle(&mut self, routine_id: &str) -> Result<bool>;
}

/// In-process favorites, keyed by routine identity
#[derive(Clone, Debug, Default)]
pub struct MemoryFavorites {
    ids: HashSet<String>,
}

impl MemoryFavorites {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FavoritesStore for MemoryFavorites {
    fn is_favorite(&self, routine_id: &str) -> bool {
        self.ids.contains(routine_id)
    }

    fn toggle(&mut self, routine_id: &str) -> Result<bool> {
        if self.ids.remove(routine_id) {
            Ok(false)
        } else {
            self.ids.insert(routine_id.to_string());
            Ok(true)
        }
    }
}

/// Favorites kept as a JSON array of routine ids
#[derive(Clone, Debug)]
pub struct JsonFavorites {
    path: PathBuf,
    ids: BTreeSet<String>,
}

impl JsonFavorites {
    /// Load favorites from `path`; a missing file starts empty
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let ids = if path.exists() {
            serde_json::from_str(&fs::read_to_string(&path)?)?
        } else {
            BTreeSet::new()
        };
        Ok(Self { path, ids })
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.ids)?)?;
        Ok(())
    }
}

impl FavoritesStore for JsonFavorites {
    fn is_favorite(&self, routine_id: &str) -> bool {
        self.ids.contains(routine_id)
    }

    fn toggle(&mut self, routine_id: &str) -> Result<bool> {
        let now = if self.ids.remove(routine_id) {
            false
        } else {
            self.ids.insert(routine_id.to_string());
            true
        };
        self.save()?;
        Ok(now)
    }
}

/// Toggle `routine` in `store`, reporting the displayed flag afterwards
///
/// If the store fails, the error is logged and the flag is flipped anyway:
/// the display follows the user's intent, not the store's success.
pub fn toggle_favorite(store: &mut dyn FavoritesStore, routine: &Routine, shown: bool) -> bool {
    match store.toggle(routine.identity()) {
        Ok(now) => {
            tracing::debug!("Routine '{}' favorite = {}", routine.name, now);
            now
        }
        Err(e) => {
            tracing::warn!("Failed to toggle favorite for '{}': {}", routine.name, e);
            !shown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::build_default_workout;
    use crate::Error;

    #[test]
    fn test_memory_toggle() {
        let mut favorites = MemoryFavorites::new();
        assert!(!favorites.is_favorite("r1"));
        assert!(favorites.toggle("r1").unwrap());
        assert!(favorites.is_favorite("r1"));
        assert!(!favorites.toggle("r1").unwrap());
        assert!(favorites.is_empty());
    }

    #[test]
    fn test_toggle_favorite_uses_identity() {
        let routine = build_default_workout();
        let mut favorites = MemoryFavorites::new();

        let shown = favorites.is_favorite(routine.identity());
        let shown = toggle_favorite(&mut favorites, &routine, shown);
        assert!(shown);
        assert!(favorites.is_favorite("default_workout"));
        assert_eq!(favorites.len(), 1);
    }

    #[test]
    fn test_json_favorites_persist() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("data").join("favorites.json");

        let mut favorites = JsonFavorites::load(&path).unwrap();
        assert!(!favorites.is_favorite("r1"));
        assert!(favorites.toggle("r1").unwrap());
        assert!(favorites.toggle("r2").unwrap());

        let mut reloaded = JsonFavorites::load(&path).unwrap();
        assert_eq!(reloaded.ids().collect::<Vec<_>>(), vec!["r1", "r2"]);
        assert!(!reloaded.toggle("r1").unwrap());

        let reloaded = JsonFavorites::load(&path).unwrap();
        assert_eq!(reloaded.ids().collect::<Vec<_>>(), vec!["r2"]);
    }

    #[test]
    fn test_json_favorites_rejects_malformed_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("favorites.json");
        std::fs::write(&path, "{ nope").unwrap();
        assert!(matches!(JsonFavorites::load(&path), Err(Error::Json(_))));
    }

    struct BrokenStore;

    impl FavoritesStore for BrokenStore {
        fn is_favorite(&self, _routine_id: &str) -> bool {
            false
        }

        fn toggle(&mut self, _routine_id: &str) -> Result<bool> {
            Err(Error::Other("offline".into()))
        }
    }

    #[test]
    fn test_store_failure_still_flips_display() {
        let routine = build_default_workout();
        assert!(toggle_favorite(&mut BrokenStore, &routine, false));
        assert!(!toggle_favorite(&mut BrokenStore, &routine, true));
    }
}
