//! `.env` file parsing
//!
//! Pure parsing of `KEY=VALUE` content; applying the pairs to an environment
//! happens in the application layer.

/// Parse env file content into ordered key/value pairs.
///
/// Rules:
/// - surrounding whitespace is trimmed from every line
/// - empty lines and lines starting with `#` are skipped
/// - lines without `=` are skipped
/// - an optional `export ` prefix is accepted
/// - surrounding `"` and then `'` characters are stripped from the value
/// - pairs with an empty key or empty value are dropped
/// - the first definition of a key wins; later duplicates are ignored
pub fn parse_env_content(content: &str) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };

        let key = key.trim();
        let key = key.strip_prefix("export ").map(str::trim).unwrap_or(key);
        let value = value.trim().trim_matches('"').trim_matches('\'');

        if key.is_empty() || value.is_empty() {
            continue;
        }
        if pairs.iter().any(|(k, _)| k == key) {
            continue;
        }
        pairs.push((key.to_string(), value.to_string()));
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn value_of<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn given_quoted_and_plain_values_when_parsing_then_both_are_unwrapped() {
        let pairs = parse_env_content("KEY=\"value\"\nOTHER=value2\n");

        assert_eq!(value_of(&pairs, "KEY"), Some("value"));
        assert_eq!(value_of(&pairs, "OTHER"), Some("value2"));
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn given_comments_and_blank_lines_when_parsing_then_no_keys_are_produced() {
        let pairs = parse_env_content("\n# PROJECT_ENDPOINT=https://nope\n   \n#X=1\n");
        assert!(pairs.is_empty());
    }

    #[test]
    fn given_duplicate_key_when_parsing_then_first_definition_wins() {
        let pairs = parse_env_content("AGENT_NAME=first\nAGENT_NAME=second\n");

        assert_eq!(value_of(&pairs, "AGENT_NAME"), Some("first"));
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn given_export_prefix_when_parsing_then_key_is_bare() {
        let pairs = parse_env_content("export PROJECT_ENDPOINT=https://x\n");
        assert_eq!(value_of(&pairs, "PROJECT_ENDPOINT"), Some("https://x"));
    }

    #[test]
    fn given_url_with_equals_when_parsing_then_only_first_equals_splits() {
        let pairs = parse_env_content("URL=https://host/path?a=b&c=d\n");
        assert_eq!(value_of(&pairs, "URL"), Some("https://host/path?a=b&c=d"));
    }

    #[rstest]
    #[case("NO_EQUALS_HERE")]
    #[case("=value_only")]
    #[case("EMPTY=")]
    #[case("EMPTY_QUOTED=\"\"")]
    fn given_incomplete_line_when_parsing_then_it_is_skipped(#[case] line: &str) {
        assert!(parse_env_content(line).is_empty());
    }

    #[rstest]
    #[case("K='single'", "single")]
    #[case("K=\"double\"", "double")]
    #[case("K=\"'mixed'\"", "mixed")]
    #[case("K =  spaced  ", "spaced")]
    fn given_value_variants_when_parsing_then_value_is_normalized(
        #[case] line: &str,
        #[case] expected: &str,
    ) {
        let pairs = parse_env_content(line);
        assert_eq!(value_of(&pairs, "K"), Some(expected));
    }
}
