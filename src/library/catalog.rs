use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::models::{Episode, Show};
use crate::error::Result;

/// Lookup service that maps filename candidates onto known shows and episodes
pub trait Resolver {
    /// Match against a show's name, then its alternate names, then its folder name
    fn find_show(&self, candidate: &str) -> Option<Show>;

    fn find_episode(&self, show: &Show, season: u32, episode: u32) -> Option<Episode>;

    fn find_episode_by_date(&self, show: &Show, date: NaiveDate) -> Option<Episode>;
}

/// In-memory show catalog, optionally loaded from a TOML file
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub shows: Vec<Show>,
}

impl Catalog {
    pub fn new(shows: Vec<Show>) -> Self {
        let mut catalog = Self { shows };
        catalog.link_episodes();
        catalog
    }

    /// A missing file is an empty catalog, not an error
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "No catalog file, starting empty");
            return Ok(Catalog::default());
        }

        let content = std::fs::read_to_string(path)?;
        let mut catalog: Catalog = toml::from_str(&content)?;
        catalog.link_episodes();
        info!(shows = catalog.shows.len(), "Loaded catalog");
        Ok(catalog)
    }

    pub fn get_show(&self, id: &str) -> Option<&Show> {
        self.shows.iter().find(|s| s.id == id)
    }

    /// Episodes written without a show id inherit the owning show's
    fn link_episodes(&mut self) {
        for show in &mut self.shows {
            for ep in &mut show.episodes {
                if ep.show_id.is_empty() {
                    ep.show_id = show.id.clone();
                }
            }
        }
    }

    fn owned(&self, show: &Show) -> Option<&Show> {
        self.get_show(&show.id)
    }
}

impl Resolver for Catalog {
    fn find_show(&self, candidate: &str) -> Option<Show> {
        let wanted = normalize_name(candidate);
        if wanted.is_empty() {
            return None;
        }

        // Names first across all shows, so an alternate name never shadows a real one
        let by_name = self.shows.iter().find(|s| normalize_name(&s.name) == wanted);
        let by_alternate = || {
            self.shows.iter().find(|s| {
                s.alternate_names
                    .iter()
                    .any(|a| normalize_name(a) == wanted)
            })
        };
        let by_folder = || {
            self.shows
                .iter()
                .find(|s| normalize_name(&s.folder_name) == wanted)
        };

        let found = by_name.or_else(by_alternate).or_else(by_folder);
        match found {
            Some(show) => debug!(candidate, show = %show.name, "Resolved show"),
            None => debug!(candidate, "Show not in catalog"),
        }
        found.cloned()
    }

    fn find_episode(&self, show: &Show, season: u32, episode: u32) -> Option<Episode> {
        self.owned(show)?.get_episode(season, episode).cloned()
    }

    fn find_episode_by_date(&self, show: &Show, date: NaiveDate) -> Option<Episode> {
        self.owned(show)?.get_episode_by_date(date).cloned()
    }
}

/// Lowercase and keep only alphanumerics, so "The.Office (US)" == "the office us"
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}
