pub mod sanitize;
pub mod template;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

pub use template::{FormatTemplate, RenderContext, TemplateError, render};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::library::models::{ClassificationResult, Show};

/// Renders destinations for classified files, caching parsed templates by source string
#[derive(Debug)]
pub struct Formatter {
    default: Arc<FormatTemplate>,
    cache: RwLock<HashMap<String, Arc<FormatTemplate>>>,
}

impl Formatter {
    pub fn new(default_format: &str) -> Self {
        Self {
            default: Arc::new(FormatTemplate::parse(default_format)),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.format.template)
    }

    /// The show's own format when it opts in, otherwise the global one
    pub fn format_for<'a>(&'a self, show: &'a Show) -> &'a str {
        match show.custom_format.as_deref() {
            Some(custom) if show.use_custom_format && !custom.is_empty() => custom,
            _ => self.default.source(),
        }
    }

    fn template_for(&self, show: &Show) -> Arc<FormatTemplate> {
        let source = self.format_for(show);
        if source == self.default.source() {
            return Arc::clone(&self.default);
        }

        if let Ok(cache) = self.cache.read() {
            if let Some(template) = cache.get(source) {
                return Arc::clone(template);
            }
        }

        let template = Arc::new(FormatTemplate::parse(source));
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(source.to_string(), Arc::clone(&template));
        }
        template
    }

    /// Rendered template text. Incomplete results are refused.
    pub fn render(&self, result: &ClassificationResult) -> Result<String> {
        let (Some(show), Some(episode)) = (&result.show, &result.episode) else {
            return Err(Error::IncompleteResult(result.source_file.clone()));
        };

        let ctx = RenderContext {
            show,
            episode,
            source_file: &result.source_file,
        };
        Ok(self.template_for(show).render(&ctx))
    }

    /// Full destination under `output_root` for move and copy
    pub fn destination(&self, result: &ClassificationResult, output_root: &Path) -> Result<PathBuf> {
        let relative = sanitize::to_relative_path(&self.render(result)?);
        if relative.as_os_str().is_empty() {
            return Err(Error::EmptyDestination(result.source_file.clone()));
        }
        Ok(output_root.join(relative))
    }

    /// Destination for an in-place rename: only the leaf of the template is kept
    pub fn renamed(&self, result: &ClassificationResult) -> Result<PathBuf> {
        let leaf = sanitize::leaf_name(&self.render(result)?)
            .ok_or_else(|| Error::EmptyDestination(result.source_file.clone()))?;
        let dir = result.source_file.parent().unwrap_or_else(|| Path::new(""));
        Ok(dir.join(leaf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_FORMAT;
    use crate::library::models::Episode;

    fn resolved(show: Show) -> ClassificationResult {
        let mut result = ClassificationResult::new("/in/ShowName.s01e02.Episode.Title.avi");
        let episode = Episode::new(show.id.clone(), 1, 2, "Episode Title");
        result.assign_show(show);
        result.assign_episode(episode);
        result
    }

    #[test]
    fn test_destination_scenario() {
        let formatter = Formatter::new(DEFAULT_FORMAT);
        let result = resolved(Show::new("show", "ShowName"));

        assert_eq!(
            formatter.render(&result).unwrap(),
            r"ShowName\Season 1\ShowName.S01E02.Episode.Title.avi"
        );
        assert_eq!(
            formatter.destination(&result, Path::new("/tv")).unwrap(),
            Path::new("/tv/ShowName/Season 1/ShowName.S01E02.Episode.Title.avi")
        );
    }

    #[test]
    fn test_rename_keeps_directory() {
        let formatter = Formatter::new(DEFAULT_FORMAT);
        let result = resolved(Show::new("show", "ShowName"));
        assert_eq!(
            formatter.renamed(&result).unwrap(),
            Path::new("/in/ShowName.S01E02.Episode.Title.avi")
        );
    }

    #[test]
    fn test_incomplete_is_refused() {
        let formatter = Formatter::new(DEFAULT_FORMAT);
        let mut result = ClassificationResult::new("/in/x.s01e01.avi");
        result.assign_show(Show::new("x", "X"));

        assert!(matches!(formatter.render(&result), Err(Error::IncompleteResult(_))));
        assert!(formatter.destination(&result, Path::new("/tv")).is_err());
        assert!(formatter.renamed(&result).is_err());
    }

    #[test]
    fn test_custom_format_override() {
        let formatter = Formatter::new(DEFAULT_FORMAT);
        let mut show = Show::new("show", "ShowName");
        show.custom_format = Some("{SName(_)}-{SNum(0)}x{ENum(2)}{Ext}".into());

        // Ignored until the show opts in
        assert_eq!(formatter.format_for(&show), DEFAULT_FORMAT);

        show.use_custom_format = true;
        let result = resolved(show);
        assert_eq!(formatter.render(&result).unwrap(), "ShowName-1x02.avi");
        // Second render is served from the cache
        assert_eq!(formatter.render(&result).unwrap(), "ShowName-1x02.avi");
    }

    #[test]
    fn test_slash_in_episode_name() {
        let formatter = Formatter::new(DEFAULT_FORMAT);
        let mut result = ClassificationResult::new("/in/Show.s01e02.avi");
        result.assign_show(Show::new("show", "Show"));
        result.assign_episode(Episode::new("show", 1, 2, "Part 1/2"));

        assert_eq!(
            formatter.renamed(&result).unwrap(),
            Path::new("/in/Show.S01E02.Part.12.avi")
        );
        assert_eq!(
            formatter.destination(&result, Path::new("/tv")).unwrap(),
            Path::new("/tv/Show/Season 1/Show.S01E02.Part.12.avi")
        );
    }

    #[test]
    fn test_empty_destination() {
        let formatter = Formatter::new(r"{Ext(}\");
        let mut show = Show::new("show", "ShowName");
        show.name = String::new();
        let result = resolved(show);
        // The literal fallback survives; an all-separator template does not
        assert!(formatter.destination(&result, Path::new("/tv")).is_ok());

        let formatter = Formatter::new(r"\{SName( )}\");
        assert!(matches!(
            formatter.destination(&result, Path::new("/tv")),
            Err(Error::EmptyDestination(_))
        ));
    }
}
