//! In-memory catalog: serials and the episodes they own.
//!
//! Every operation is synchronous and total. Writes happen only after the
//! remote store has confirmed them, so nothing here needs to roll back.

use crate::models::{Episode, Serial};

/// Ordered collection of serials, each owning its episodes.
///
/// Invariants kept by every mutation:
/// - serial ids are unique,
/// - every stored serial has `episodes: Some(_)`,
/// - every episode's `serial_id` equals its owner's id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogStore {
    serials: Vec<Serial>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serials(&self) -> &[Serial] {
        &self.serials
    }

    pub fn serial(&self, id: &str) -> Option<&Serial> {
        self.serials.iter().find(|s| s.id == id)
    }

    /// Find an episode anywhere in the catalog.
    pub fn episode(&self, id: &str) -> Option<&Episode> {
        self.serials
            .iter()
            .flat_map(|s| s.episodes())
            .find(|e| e.id == id)
    }

    /// The serial an add-episode form selects by default.
    pub fn first_serial_id(&self) -> Option<&str> {
        self.serials.first().map(|s| s.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.serials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.serials.is_empty()
    }

    pub fn episode_count(&self) -> usize {
        self.serials.iter().map(Serial::episode_count).sum()
    }

    /// Wholesale replace after the initial load.
    pub fn replace_all(&mut self, serials: Vec<Serial>) {
        self.serials.clear();
        for serial in serials {
            self.upsert_serial(serial);
        }
    }

    /// Insert an unseen serial or replace a known one in place.
    ///
    /// A payload without `episodes` keeps the stored serial's episodes.
    pub fn upsert_serial(&mut self, mut serial: Serial) {
        match self.serials.iter().position(|s| s.id == serial.id) {
            Some(idx) => {
                if serial.episodes.is_none() {
                    serial.episodes = self.serials[idx].episodes.take();
                }
                adopt_episodes(&mut serial);
                self.serials[idx] = serial;
            }
            None => {
                adopt_episodes(&mut serial);
                self.serials.push(serial);
            }
        }
    }

    /// Remove a serial together with all of its episodes.
    pub fn remove_serial(&mut self, id: &str) -> bool {
        let before = self.serials.len();
        self.serials.retain(|s| s.id != id);
        self.serials.len() != before
    }

    /// Insert or replace an episode inside its owning serial.
    ///
    /// Returns `false` (and changes nothing) when the owner is not in the catalog.
    pub fn upsert_episode(&mut self, episode: Episode) -> bool {
        let Some(serial) = self.serials.iter_mut().find(|s| s.id == episode.serial_id) else {
            tracing::warn!(
                episode_id = %episode.id,
                serial_id = %episode.serial_id,
                "Dropping episode for a serial that is not in the catalog"
            );
            return false;
        };

        let episodes = serial.episodes.get_or_insert_with(Vec::new);
        match episodes.iter_mut().find(|e| e.id == episode.id) {
            Some(existing) => *existing = episode,
            None => episodes.push(episode),
        }
        true
    }

    pub fn remove_episode(&mut self, serial_id: &str, episode_id: &str) -> bool {
        let Some(serial) = self.serials.iter_mut().find(|s| s.id == serial_id) else {
            return false;
        };
        let episodes = serial.episodes.get_or_insert_with(Vec::new);
        let before = episodes.len();
        episodes.retain(|e| e.id != episode_id);
        episodes.len() != before
    }
}

/// Default a missing episode list and point every episode at its owner.
fn adopt_episodes(serial: &mut Serial) {
    let owner = serial.id.clone();
    for episode in serial.episodes.get_or_insert_with(Vec::new) {
        if episode.serial_id != owner {
            if !episode.serial_id.is_empty() {
                tracing::warn!(
                    episode_id = %episode.id,
                    claimed = %episode.serial_id,
                    owner = %owner,
                    "Episode serialId disagrees with its owner; rewriting"
                );
            }
            episode.serial_id = owner.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SerialStatus;

    fn serial(id: &str, name: &str) -> Serial {
        Serial {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            genre: "Drama".into(),
            status: SerialStatus::Active,
            blog_url: String::new(),
            image: None,
            episodes: None,
        }
    }

    fn episode(id: &str, serial_id: &str, no: u32) -> Episode {
        Episode {
            id: id.into(),
            title: format!("Episode {no}"),
            episode_no: Some(no),
            description: String::new(),
            redirect_url: format!("https://watch.example/{id}"),
            serial_id: serial_id.into(),
            duration: None,
            date: None,
            created_at: None,
            image: None,
        }
    }

    fn assert_no_orphans(store: &CatalogStore) {
        for s in store.serials() {
            assert!(s.episodes.is_some(), "serial {} has no episode list", s.id);
            for e in s.episodes() {
                assert_eq!(e.serial_id, s.id);
            }
        }
    }

    #[test]
    fn test_replace_all_defaults_episodes() {
        let mut store = CatalogStore::new();
        let mut with_eps = serial("s2", "B");
        with_eps.episodes = Some(vec![episode("e1", "", 1)]);
        store.replace_all(vec![serial("s1", "A"), with_eps]);

        assert_eq!(store.len(), 2);
        assert_eq!(store.serial("s1").unwrap().episodes, Some(vec![]));
        assert_eq!(store.serial("s2").unwrap().episodes()[0].serial_id, "s2");
        assert_eq!(store.first_serial_id(), Some("s1"));
        assert_no_orphans(&store);
    }

    #[test]
    fn test_upsert_serial_inserts_then_replaces_in_place() {
        let mut store = CatalogStore::new();
        store.upsert_serial(serial("s1", "A"));
        store.upsert_serial(serial("s2", "B"));
        store.upsert_serial(serial("s1", "A2"));

        let names: Vec<&str> = store.serials().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["A2", "B"]);
    }

    #[test]
    fn test_upsert_serial_preserves_episodes_when_absent() {
        let mut store = CatalogStore::new();
        store.upsert_serial(serial("s1", "A"));
        assert!(store.upsert_episode(episode("e1", "s1", 1)));

        let edited = serial("s1", "Renamed");
        store.upsert_serial(edited.clone());

        let stored = store.serial("s1").unwrap();
        assert_eq!(stored.name, "Renamed");
        assert_eq!(stored.episode_count(), 1);
        assert_eq!(
            Serial {
                episodes: None,
                ..stored.clone()
            },
            edited
        );
    }

    #[test]
    fn test_upsert_serial_with_explicit_episodes_replaces_them() {
        let mut store = CatalogStore::new();
        store.upsert_serial(serial("s1", "A"));
        store.upsert_episode(episode("e1", "s1", 1));

        let mut edited = serial("s1", "A");
        edited.episodes = Some(vec![]);
        store.upsert_serial(edited.clone());
        assert_eq!(store.serial("s1"), Some(&edited));
    }

    #[test]
    fn test_upsert_serial_is_idempotent() {
        let mut full = serial("s1", "A");
        full.episodes = Some(vec![episode("e1", "s1", 1), episode("e2", "s1", 2)]);

        let mut once = CatalogStore::new();
        once.upsert_serial(full.clone());
        let mut twice = once.clone();
        twice.upsert_serial(full);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_upsert_episode_inserts_and_replaces() {
        let mut store = CatalogStore::new();
        store.upsert_serial(serial("s1", "A"));
        assert!(store.upsert_episode(episode("e1", "s1", 1)));
        assert!(store.upsert_episode(episode("e2", "s1", 2)));

        let mut renamed = episode("e1", "s1", 1);
        renamed.title = "Pilot".into();
        assert!(store.upsert_episode(renamed));

        let eps = store.serial("s1").unwrap().episodes();
        assert_eq!(eps.len(), 2);
        assert_eq!(eps[0].title, "Pilot");
        assert_eq!(store.episode("e2").unwrap().episode_no, Some(2));
        assert_eq!(store.episode_count(), 2);
    }

    #[test]
    fn test_upsert_episode_without_owner_is_noop() {
        let mut store = CatalogStore::new();
        store.upsert_serial(serial("s1", "A"));
        let before = store.clone();
        assert!(!store.upsert_episode(episode("e1", "missing", 1)));
        assert_eq!(store, before);
    }

    #[test]
    fn test_remove_serial_drops_episodes_and_later_upserts() {
        let mut store = CatalogStore::new();
        store.upsert_serial(serial("s1", "A"));
        store.upsert_episode(episode("e1", "s1", 1));

        assert!(store.remove_serial("s1"));
        assert!(store.episode("e1").is_none());

        let before = store.clone();
        assert!(!store.upsert_episode(episode("e2", "s1", 2)));
        assert_eq!(store, before);
        assert!(!store.remove_serial("s1"));
    }

    #[test]
    fn test_remove_episode() {
        let mut store = CatalogStore::new();
        store.upsert_serial(serial("s1", "A"));
        store.upsert_serial(serial("s2", "B"));
        store.upsert_episode(episode("e1", "s1", 1));
        store.upsert_episode(episode("e2", "s2", 1));

        assert!(!store.remove_episode("s2", "e1"));
        assert!(store.remove_episode("s1", "e1"));
        assert!(!store.remove_episode("s1", "e1"));
        assert!(!store.remove_episode("nope", "e2"));
        assert_eq!(store.episode_count(), 1);
    }

    #[test]
    fn test_mixed_sequence_leaves_no_orphans() {
        let mut store = CatalogStore::new();
        // Deterministic interleaving over a small id space.
        for step in 0u32..200 {
            let sid = format!("s{}", step % 4);
            let eid = format!("e{}", step % 7);
            match (step * 7 + 3) % 5 {
                0 => store.upsert_serial(serial(&sid, "x")),
                1 => {
                    store.remove_serial(&sid);
                }
                2 | 3 => {
                    store.upsert_episode(episode(&eid, &sid, step));
                }
                _ => {
                    store.remove_episode(&sid, &eid);
                }
            }
            assert_no_orphans(&store);
        }
    }
}
