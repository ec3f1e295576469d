use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Show {
    pub id: String,
    pub name: String,
    /// Folder name under the output root, may contain path separators
    pub folder_name: String,
    #[serde(default)]
    pub alternate_names: Vec<String>,
    #[serde(default)]
    pub custom_format: Option<String>,
    #[serde(default)]
    pub use_custom_format: bool,
    #[serde(default)]
    pub use_dvd_order: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub episodes: Vec<Episode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    #[serde(default)]
    pub show_id: String,
    pub season_number: u32,
    pub episode_number: u32,
    #[serde(default)]
    pub dvd_season: Option<u32>,
    #[serde(default)]
    pub dvd_episode: Option<u32>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub first_air_date: Option<NaiveDate>,
}

/// What a pattern rule pulled out of a filename, before any catalog lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMatch {
    pub show_name_fragment: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub air_date: Option<NaiveDate>,
    pub source_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ClassificationResult {
    pub source_file: PathBuf,
    pub raw: Option<RawMatch>,
    pub show: Option<Show>,
    pub episode: Option<Episode>,
    pub checked: bool,
}

impl Show {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            folder_name: name.clone(),
            name,
            alternate_names: Vec::new(),
            custom_format: None,
            use_custom_format: false,
            use_dvd_order: false,
            locked: false,
            last_updated: None,
            episodes: Vec::new(),
        }
    }

    /// Look up by aired numbering, or by DVD numbering when the show asks for it
    pub fn get_episode(&self, season: u32, episode: u32) -> Option<&Episode> {
        if self.use_dvd_order {
            let dvd = self
                .episodes
                .iter()
                .find(|e| e.dvd_season == Some(season) && e.dvd_episode == Some(episode));
            if dvd.is_some() {
                return dvd;
            }
        }
        self.episodes
            .iter()
            .find(|e| e.season_number == season && e.episode_number == episode)
    }

    pub fn get_episode_by_date(&self, date: NaiveDate) -> Option<&Episode> {
        self.episodes
            .iter()
            .find(|e| e.first_air_date == Some(date))
    }
}

impl Episode {
    pub fn new(show_id: impl Into<String>, season: u32, episode: u32, name: impl Into<String>) -> Self {
        Self {
            show_id: show_id.into(),
            season_number: season,
            episode_number: episode,
            dvd_season: None,
            dvd_episode: None,
            name: name.into(),
            first_air_date: None,
        }
    }

    pub fn with_air_date(mut self, date: NaiveDate) -> Self {
        self.first_air_date = Some(date);
        self
    }
}

impl ClassificationResult {
    pub fn new(source_file: impl Into<PathBuf>) -> Self {
        Self {
            source_file: source_file.into(),
            raw: None,
            show: None,
            episode: None,
            checked: false,
        }
    }

    pub fn from_match(raw: RawMatch) -> Self {
        let mut result = Self::new(raw.source_file.clone());
        result.raw = Some(raw);
        result
    }

    /// True until both show and episode are known
    pub fn is_incomplete(&self) -> bool {
        self.show.is_none() || self.episode.is_none()
    }

    /// Manually attach a show, dropping any episode that belonged to another show
    pub fn assign_show(&mut self, show: Show) {
        if self
            .episode
            .as_ref()
            .is_some_and(|e| e.show_id != show.id)
        {
            self.episode = None;
        }
        self.show = Some(show);
        self.checked = !self.is_incomplete();
    }

    pub fn assign_episode(&mut self, episode: Episode) {
        self.episode = Some(episode);
        self.checked = !self.is_incomplete();
    }

    pub fn file_name(&self) -> String {
        self.source_file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn show_with_episodes() -> Show {
        let mut show = Show::new("lost", "Lost");
        show.episodes = vec![
            Episode::new("lost", 1, 2, "Pilot Part 2"),
            Episode {
                dvd_season: Some(1),
                dvd_episode: Some(3),
                ..Episode::new("lost", 1, 4, "Walkabout")
            },
        ];
        show
    }

    #[test]
    fn test_incomplete_until_both_resolved() {
        let mut result = ClassificationResult::new("/in/Lost.s01e02.avi");
        assert!(result.is_incomplete());

        let show = show_with_episodes();
        result.assign_show(show.clone());
        assert!(result.is_incomplete());
        assert!(!result.checked);

        result.assign_episode(show.episodes[0].clone());
        assert!(!result.is_incomplete());
        assert!(result.checked);
    }

    #[test]
    fn test_assign_other_show_clears_episode() {
        let mut result = ClassificationResult::new("/in/x.avi");
        let show = show_with_episodes();
        result.assign_show(show.clone());
        result.assign_episode(show.episodes[0].clone());

        result.assign_show(Show::new("heroes", "Heroes"));
        assert!(result.episode.is_none());
        assert!(result.is_incomplete());
    }

    #[test]
    fn test_dvd_order_lookup() {
        let mut show = show_with_episodes();
        assert_eq!(show.get_episode(1, 3).map(|e| e.name.as_str()), None);

        show.use_dvd_order = true;
        assert_eq!(show.get_episode(1, 3).map(|e| e.name.as_str()), Some("Walkabout"));
        // Falls back to aired numbering when no DVD number matches
        assert_eq!(show.get_episode(1, 2).map(|e| e.name.as_str()), Some("Pilot Part 2"));
    }
}
