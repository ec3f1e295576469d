//! Output-path template language.
//!
//! A template is literal text with function calls spliced in:
//! `{SName(.)}.S{SNum(2)}E{ENum(2)}{Ext}`. Anything that fails to parse or to
//! evaluate is rendered back as its own source text, so a bad template never
//! aborts a batch.

use std::path::Path;

use chrono::NaiveDate;
use chrono::format::{Item, StrftimeItems};
use tracing::debug;

use super::sanitize::{clean_rendered, strip_separators};
use crate::library::models::{Episode, Show};

/// Characters that suppress the word separator next to them
const JOIN_PUNCTUATION: &[char] = &['-', ':', '_', '.', ','];

/// Widest zero padding `SNum`/`ENum` accept
const MAX_WIDTH: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("unknown function {0:?}")]
    UnknownFunction(String),

    #[error("invalid width {0:?}")]
    InvalidWidth(String),

    #[error("invalid date format {0:?}")]
    InvalidDateFormat(String),

    #[error("episode has no air date")]
    MissingAirDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Literal(String),
    Function {
        name: String,
        argument: Option<String>,
        source: String,
    },
}

/// Everything a template can draw on for one file
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub show: &'a Show,
    pub episode: &'a Episode,
    pub source_file: &'a Path,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatTemplate {
    source: String,
    tokens: Vec<Token>,
}

impl FormatTemplate {
    pub fn parse(source: &str) -> Self {
        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        while let Some(open) = rest.find('{') {
            literal.push_str(&rest[..open]);
            let candidate = &rest[open..];

            match parse_function(candidate) {
                Some((token, len)) => {
                    if !literal.is_empty() {
                        tokens.push(Token::Literal(std::mem::take(&mut literal)));
                    }
                    tokens.push(token);
                    rest = &candidate[len..];
                }
                None => {
                    literal.push('{');
                    rest = &candidate[1..];
                }
            }
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            tokens.push(Token::Literal(literal));
        }

        Self {
            source: source.to_string(),
            tokens,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Evaluate every token and sanitize the result. Never fails.
    pub fn render(&self, ctx: &RenderContext<'_>) -> String {
        let mut out = String::new();
        for token in &self.tokens {
            match token {
                Token::Literal(text) => out.push_str(text),
                Token::Function {
                    name,
                    argument,
                    source,
                } => match evaluate(name, argument.as_deref(), ctx) {
                    Ok(value) => out.push_str(&value),
                    Err(e) => {
                        debug!(token = %source, error = %e, "Rendering token literally");
                        out.push_str(source);
                    }
                },
            }
        }
        clean_rendered(&out)
    }
}

/// Render a template string in one go
pub fn render(template: &str, ctx: &RenderContext<'_>) -> String {
    FormatTemplate::parse(template).render(ctx)
}

/// Parse `{Name}` or `{Name(arg)}` at the start of `text`. Returns the token and its byte length.
fn parse_function(text: &str) -> Option<(Token, usize)> {
    let body = text.strip_prefix('{')?;
    let name_len = body
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(body.len());
    if name_len == 0 {
        return None;
    }
    let name = &body[..name_len];
    let after = &body[name_len..];

    let (argument, len) = if after.starts_with('}') {
        (None, 1 + name_len + 1)
    } else {
        let arg_text = after.strip_prefix('(')?;
        let arg_len = arg_text.find([')', '}'])?;
        if !arg_text[arg_len..].starts_with(")}") {
            return None;
        }
        (Some(arg_text[..arg_len].to_string()), 1 + name_len + 1 + arg_len + 2)
    };

    let token = Token::Function {
        name: name.to_string(),
        argument,
        source: text[..len].to_string(),
    };
    Some((token, len))
}

fn evaluate(
    name: &str,
    argument: Option<&str>,
    ctx: &RenderContext<'_>,
) -> Result<String, TemplateError> {
    let (season, episode) = numbering(ctx.show, ctx.episode);

    match (name, argument) {
        ("SName", Some(sep)) => Ok(join_words(&strip_separators(&ctx.show.name), sep)),
        ("EName", Some(sep)) => Ok(join_words(&strip_separators(&ctx.episode.name), sep)),
        ("SNum", Some(width)) => format_num(width, season),
        ("ENum", Some(width)) => format_num(width, episode),
        ("Date", Some(fmt)) => format_date(ctx.episode.first_air_date, fmt),
        ("Ext", None) => Ok(extension(ctx.source_file)),
        ("FName", None) => Ok(ctx.show.folder_name.clone()),
        _ => Err(TemplateError::UnknownFunction(name.to_string())),
    }
}

/// DVD numbering when the show is set to use it and the episode has one
fn numbering(show: &Show, episode: &Episode) -> (u32, u32) {
    if show.use_dvd_order {
        if let (Some(s), Some(e)) = (episode.dvd_season, episode.dvd_episode) {
            return (s, e);
        }
    }
    (episode.season_number, episode.episode_number)
}

/// Join space-separated words with `sep`.
///
/// The separator is left out next to a word that starts or ends with
/// punctuation, so `"Day 1 - 12"` joined with `.` is `Day.1-12` rather than
/// `Day.1.-.12`.
pub fn join_words(name: &str, sep: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev: Option<&str> = None;

    for word in name.split(' ').filter(|w| !w.is_empty()) {
        if let Some(p) = prev {
            let glued = p.ends_with(JOIN_PUNCTUATION) || word.starts_with(JOIN_PUNCTUATION);
            if !glued {
                out.push_str(sep);
            }
        }
        out.push_str(word);
        prev = Some(word);
    }

    out.trim_end_matches(JOIN_PUNCTUATION).to_string()
}

/// Zero-pad to `width` digits; width 0 means no padding
pub fn format_num(width: &str, value: u32) -> Result<String, TemplateError> {
    let width = width
        .parse::<usize>()
        .ok()
        .filter(|w| *w <= MAX_WIDTH)
        .ok_or_else(|| TemplateError::InvalidWidth(width.to_string()))?;
    Ok(format!("{value:0width$}"))
}

fn format_date(date: Option<NaiveDate>, fmt: &str) -> Result<String, TemplateError> {
    let date = date.ok_or(TemplateError::MissingAirDate)?;
    let items: Vec<Item<'_>> = StrftimeItems::new(fmt).collect();
    if items.iter().any(|i| matches!(i, Item::Error)) {
        return Err(TemplateError::InvalidDateFormat(fmt.to_string()));
    }
    Ok(date.format_with_items(items.into_iter()).to_string())
}

fn extension(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_FORMAT;

    fn show(name: &str) -> Show {
        Show::new("id", name)
    }

    fn episode(season: u32, number: u32, name: &str) -> Episode {
        Episode::new("id", season, number, name)
            .with_air_date(NaiveDate::from_ymd_opt(2009, 5, 3).unwrap())
    }

    fn render_with(template: &str, show: &Show, episode: &Episode) -> String {
        let ctx = RenderContext {
            show,
            episode,
            source_file: Path::new("/in/ShowName.s01e02.Episode.Title.avi"),
        };
        render(template, &ctx)
    }

    #[test]
    fn test_default_template() {
        let rendered = render_with(DEFAULT_FORMAT, &show("ShowName"), &episode(1, 2, "Pilot"));
        assert_eq!(rendered, r"ShowName\Season 1\ShowName.S01E02.Pilot.avi");
    }

    #[test]
    fn test_format_num_widths() {
        assert_eq!(format_num("2", 7).unwrap(), "07");
        assert_eq!(format_num("0", 7).unwrap(), "7");
        assert_eq!(format_num("1", 12).unwrap(), "12");
        assert_eq!(format_num("3", 0).unwrap(), "000");
        assert!(format_num("x", 7).is_err());
        assert_eq!(format_num("16", 7).unwrap(), "0000000000000007");
        assert!(format_num("17", 7).is_err());
        assert!(format_num("99", 7).is_err());
    }

    #[test]
    fn test_join_words() {
        assert_eq!(join_words("CSI Miami", "."), "CSI.Miami");
        assert_eq!(join_words("Day 1 - 12", "."), "Day.1-12");
        assert_eq!(join_words("Mr. Robot", "_"), "Mr.Robot");
        assert_eq!(join_words("Previously On,", "."), "Previously.On");
        assert_eq!(join_words("Two  Spaces", " "), "Two Spaces");
        assert_eq!(join_words("Day 1 - 12", " "), "Day 1-12");
        assert_eq!(join_words("Law & Order: SVU", " "), "Law & Order:SVU");
    }

    #[test]
    fn test_separator_not_doubled_against_literal_dash() {
        let rendered = render_with(
            "{SName(.)}.-.{EName(.)}",
            &show("Day 1"),
            &episode(1, 1, "Part 2"),
        );
        assert_eq!(rendered, "Day.1.-.Part.2");
        assert!(!rendered.contains(".-.."));
    }

    #[test]
    fn test_date_function() {
        let ep = episode(1, 1, "x");
        assert_eq!(render_with("{Date(%Y-%m-%d)}", &show("S"), &ep), "2009-05-03");
        // Broken format and missing dates render literally
        assert_eq!(render_with("{Date(%Q)}", &show("S"), &ep), "{Date(%Q)}");
        let undated = Episode::new("id", 1, 1, "x");
        assert_eq!(render_with("{Date(%Y)}", &show("S"), &undated), "{Date(%Y)}");
    }

    #[test]
    fn test_ext_and_folder_name() {
        let mut s = show("The Office (US)");
        s.folder_name = r"Comedy\The Office".into();
        assert_eq!(
            render_with(r"{FName}\{SName( )}{Ext}", &s, &episode(1, 1, "x")),
            r"Comedy\The Office\The Office (US).avi"
        );
    }

    #[test]
    fn test_malformed_tokens_render_literally() {
        let s = show("Lost");
        let ep = episode(1, 1, "Pilot");
        assert_eq!(render_with("{Bogus(1)}", &s, &ep), "{Bogus(1)}");
        assert_eq!(render_with("{SName(.}", &s, &ep), "{SName(.}");
        assert_eq!(render_with("{SName}", &s, &ep), "{SName}");
        assert_eq!(render_with("{Ext(x)}", &s, &ep), "{Ext(x)}");
        assert_eq!(render_with("{{SName( )}", &s, &ep), "{Lost");
        assert_eq!(render_with("{ENum(a)} {", &s, &ep), "{ENum(a)} {");
    }

    #[test]
    fn test_invalid_characters_stripped() {
        let rendered = render_with(
            "{SName( )} - {EName( )}",
            &show("Who?"),
            &episode(1, 1, "Part 1: The Return"),
        );
        assert_eq!(rendered, "Who - Part 1.The Return");
        assert!(!rendered.contains('?') && !rendered.contains(':'));
    }

    #[test]
    fn test_slash_in_names_is_not_a_directory() {
        let rendered = render_with(
            r"{SName( )}\{SName(.)}.{EName(.)}{Ext}",
            &show("AC/DC Live"),
            &episode(1, 2, "Part 1/2"),
        );
        assert_eq!(rendered, r"ACDC Live\ACDC.Live.Part.12.avi");
    }

    #[test]
    fn test_dvd_numbering() {
        let mut s = show("Firefly");
        s.use_dvd_order = true;
        let ep = Episode {
            dvd_season: Some(1),
            dvd_episode: Some(1),
            ..episode(1, 11, "Serenity")
        };
        assert_eq!(render_with("S{SNum(2)}E{ENum(2)}", &s, &ep), "S01E01");
        s.use_dvd_order = false;
        assert_eq!(render_with("S{SNum(2)}E{ENum(2)}", &s, &ep), "S01E11");
    }

    #[test]
    fn test_parse_tokens() {
        let template = FormatTemplate::parse("a{Ext}b{SNum(2)}");
        assert_eq!(template.tokens().len(), 4);
        assert_eq!(
            template.tokens()[3],
            Token::Function {
                name: "SNum".into(),
                argument: Some("2".into()),
                source: "{SNum(2)}".into(),
            }
        );
    }
}
