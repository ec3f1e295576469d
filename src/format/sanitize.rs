use std::path::PathBuf;

use sanitize_filename::Options;

/// Reserved filename characters, minus the path separators
const RESERVED: &[char] = &['<', '>', '"', '|', '?', '*'];

const SEPARATORS: &[char] = &['\\', '/'];

/// Post-process a rendered template: `:` becomes `.`, reserved and control characters go.
/// Both `\` and `/` survive so templates can create subdirectories.
pub fn clean_rendered(rendered: &str) -> String {
    rendered
        .chars()
        .map(|c| if c == ':' { '.' } else { c })
        .filter(|c| !RESERVED.contains(c) && !c.is_control())
        .collect()
}

/// Remove path separators from a name before it is spliced into a template,
/// so only literals and `{FName}` add directory levels.
pub fn strip_separators(name: &str) -> String {
    name.chars().filter(|c| !SEPARATORS.contains(c)).collect()
}

/// Split a rendered template into a relative path.
///
/// Either separator style is accepted. Empty, `.` and `..` components are dropped
/// so a template can never climb out of the output root.
pub fn to_relative_path(rendered: &str) -> PathBuf {
    rendered
        .split(SEPARATORS)
        .map(|part| {
            sanitize_filename::sanitize_with_options(
                part,
                Options {
                    truncate: true,
                    windows: false,
                    replacement: "",
                },
            )
        })
        .filter(|part| !part.is_empty() && part != "." && part != "..")
        .collect()
}

/// Last component of a rendered template, used when renaming in place
pub fn leaf_name(rendered: &str) -> Option<String> {
    to_relative_path(rendered)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_rendered() {
        assert_eq!(clean_rendered("24: Day 1?"), "24. Day 1");
        assert_eq!(clean_rendered(r#"A<b>"c"|d*"#), "Abcd");
        assert_eq!(clean_rendered("Show\\Season 1/x\t.avi"), "Show\\Season 1/x.avi");
    }

    #[test]
    fn test_to_relative_path() {
        assert_eq!(
            to_relative_path(r"ShowName\Season 1\ShowName.S01E02.Pilot.avi"),
            PathBuf::from("ShowName").join("Season 1").join("ShowName.S01E02.Pilot.avi")
        );
        assert_eq!(
            to_relative_path(r"\..\Show//.\a.avi"),
            PathBuf::from("Show").join("a.avi")
        );
        assert_eq!(to_relative_path(r"\\"), PathBuf::new());
    }

    #[test]
    fn test_strip_separators() {
        assert_eq!(strip_separators(r"Part 1/2"), "Part 12");
        assert_eq!(strip_separators(r"A\B/C"), "ABC");
    }

    #[test]
    fn test_leaf_name() {
        assert_eq!(
            leaf_name(r"Show\Season 1\Show.S01E02.avi").as_deref(),
            Some("Show.S01E02.avi")
        );
        assert_eq!(leaf_name("/"), None);
    }
}
