const SEPARATORS: &[char] = &['.', '-', '_', ' '];

/// Turn the raw text in front of an episode marker into a readable show name.
///
/// `"The.Office."` becomes `"The Office"`. A fragment with no separators at all
/// is split on camelCase boundaries, so `"wakingTheDead"` becomes `"Waking The Dead"`.
pub fn parse_show_name(fragment: &str) -> String {
    let parts: Vec<&str> = fragment.split(SEPARATORS).collect();
    let unseparated = parts.len() == 1 || (parts.len() == 2 && parts[1].is_empty());

    let segmented;
    let source = if unseparated {
        segmented = split_camel_case(fragment);
        segmented.as_str()
    } else {
        fragment
    };

    source
        .split(SEPARATORS)
        .filter(|t| !t.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Insert a space before each capital that starts a new word. The first character never does.
fn split_camel_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut prev: Option<char> = None;

    for (i, c) in text.chars().enumerate() {
        if i > 0 && c.is_uppercase() && !prev.is_some_and(char::is_uppercase) {
            out.push(' ');
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

fn title_case(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separated_fragment() {
        assert_eq!(parse_show_name("The.Office.US."), "The Office Us");
        assert_eq!(parse_show_name("doctor_who-2005 "), "Doctor Who 2005");
    }

    #[test]
    fn test_camel_case_segmentation() {
        assert_eq!(parse_show_name("wakingTheDead"), "Waking The Dead");
        assert_eq!(parse_show_name("wakingTheDead."), "Waking The Dead");
        assert_eq!(parse_show_name("TheOfficeUS"), "The Office Us");
    }

    #[test]
    fn test_consecutive_separators_dropped() {
        assert_eq!(parse_show_name("Lost..-_ "), "Lost");
        assert_eq!(parse_show_name("Prison..Break"), "Prison Break");
    }

    #[test]
    fn test_title_case_is_fixed_point() {
        for name in ["Waking The Dead", "Lost", "Prison Break", "Csi Miami"] {
            assert_eq!(parse_show_name(name), name);
        }
    }

    #[test]
    fn test_empty_fragment() {
        assert_eq!(parse_show_name(""), "");
        assert_eq!(parse_show_name("..."), "");
    }
}
