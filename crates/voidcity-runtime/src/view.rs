//! Read-only projections of the catalog for listing screens.

use voidcity_core::models::{Episode, Serial};
use voidcity_core::store::CatalogStore;

/// Which serials an episode listing draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SerialFilter<'a> {
    #[default]
    All,
    Only(&'a str),
}

impl<'a> SerialFilter<'a> {
    /// `None` or `"all"` means every serial.
    pub fn from_arg(arg: Option<&'a str>) -> Self {
        match arg {
            None | Some("all") => Self::All,
            Some(id) => Self::Only(id),
        }
    }
}

/// One line of the flattened episode table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeRow<'a> {
    pub episode: &'a Episode,
    pub serial_name: &'a str,
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Serials whose name contains `query`, ignoring case. An empty query keeps all.
pub fn filter_serials<'a>(store: &'a CatalogStore, query: &str) -> Vec<&'a Serial> {
    let needle = query.trim().to_lowercase();
    store
        .serials()
        .iter()
        .filter(|s| needle.is_empty() || contains_ci(&s.name, &needle))
        .collect()
}

/// Every episode in catalog order, tagged with its serial's name, narrowed by
/// serial and by a case-insensitive match on the episode title or serial name.
pub fn episode_rows<'a>(
    store: &'a CatalogStore,
    query: &str,
    filter: SerialFilter<'_>,
) -> Vec<EpisodeRow<'a>> {
    let needle = query.trim().to_lowercase();
    store
        .serials()
        .iter()
        .filter(|s| match filter {
            SerialFilter::All => true,
            SerialFilter::Only(id) => s.id == id,
        })
        .flat_map(|s| {
            s.episodes().iter().map(move |episode| EpisodeRow {
                episode,
                serial_name: &s.name,
            })
        })
        .filter(|row| {
            needle.is_empty()
                || contains_ci(&row.episode.title, &needle)
                || contains_ci(row.serial_name, &needle)
        })
        .collect()
}

/// External link for an episode; `None` when it has none.
pub fn episode_link<'a>(store: &'a CatalogStore, episode_id: &str) -> Option<&'a str> {
    store
        .episode(episode_id)
        .map(|e| e.redirect_url.trim())
        .filter(|url| !url.is_empty())
}
