//! `.env` serialization.
//!
//! Format contract:
//!
//! - One `KEY=VALUE` line per variable, joined with `\n`, no trailing newline.
//! - Keys match `[A-Za-z_][A-Za-z0-9_]*`.
//! - Values made only of ASCII alphanumerics and `_-./:@,+%` are written bare.
//! - Any other value is double-quoted, with `\`, `"`, `$` and newline escaped
//!   as `\\`, `\"`, `\$` and `\n`.
//!
//! Output parses back to the original values with a standard dotenv parser.

use crate::envs::EnvVars;
use std::path::Path;

const BARE_PUNCTUATION: &[char] = &['_', '-', '.', '/', ':', '@', ',', '+', '%'];

/// Render the mapping as `.env` text.
pub fn render(vars: &EnvVars) -> crate::Result<String> {
    let mut lines = Vec::with_capacity(vars.len());
    for var in vars {
        validate_key(&var.key)?;
        lines.push(format!("{}={}", var.key, quote_value(&var.value)));
    }
    Ok(lines.join("\n"))
}

/// Render and overwrite `path`. A render failure leaves any existing file
/// untouched.
pub fn write(path: &Path, vars: &EnvVars) -> crate::Result<()> {
    let content = render(vars)?;
    std::fs::write(path, content).map_err(|e| crate::Error::EnvFileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;
    tracing::debug!(path = %path.display(), count = vars.len(), "env file written");
    Ok(())
}

fn validate_key(key: &str) -> crate::Result<()> {
    let mut chars = key.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(crate::Error::InvalidEnvKey {
            key: key.to_owned(),
        })
    }
}

fn quote_value(value: &str) -> String {
    let bare = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || BARE_PUNCTUATION.contains(&c));
    if bare {
        return value.to_owned();
    }

    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '$' => out.push_str("\\$"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> EnvVars {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn render_joins_lines_without_trailing_newline() {
        let out = render(&vars(&[("A", "1"), ("B", "2")])).unwrap();
        assert_eq!(out, "A=1\nB=2");
    }

    #[test]
    fn render_keeps_input_order() {
        let out = render(&vars(&[("B", "2"), ("A", "1")])).unwrap();
        assert_eq!(out, "B=2\nA=1");
    }

    #[test]
    fn render_empty_mapping_is_empty() {
        assert_eq!(render(&EnvVars::default()).unwrap(), "");
    }

    #[test]
    fn url_values_stay_bare() {
        let out = render(&vars(&[("API_URL", "https://api.example.dev/v1")])).unwrap();
        assert_eq!(out, "API_URL=https://api.example.dev/v1");
    }

    #[test]
    fn empty_value_stays_bare() {
        assert_eq!(render(&vars(&[("EMPTY", "")])).unwrap(), "EMPTY=");
    }

    #[test]
    fn whitespace_and_comment_chars_are_quoted() {
        assert_eq!(
            render(&vars(&[("MSG", "hello # world")])).unwrap(),
            r#"MSG="hello # world""#
        );
    }

    #[test]
    fn special_chars_are_escaped() {
        let out = render(&vars(&[("V", "a\"b\\c$d\ne")])).unwrap();
        assert_eq!(out, r#"V="a\"b\\c\$d\ne""#);
    }

    #[test]
    fn newline_in_value_does_not_add_lines() {
        let out = render(&vars(&[("A", "line1\nline2"), ("B", "x")])).unwrap();
        assert_eq!(out.lines().count(), 2);
    }

    #[test]
    fn invalid_key_rejected() {
        for key in ["", "1A", "A-B", "A B", "A=B"] {
            let err = render(&vars(&[(key, "v")])).unwrap_err();
            assert!(
                matches!(err, crate::Error::InvalidEnvKey { .. }),
                "key {key:?}: {err}"
            );
        }
    }

    #[test]
    fn write_overwrites_existing_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join(".env");
        std::fs::write(&path, "OLD=value\nSTALE=1\n").unwrap();

        write(&path, &vars(&[("NEW", "1")])).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "NEW=1");
    }

    #[test]
    fn write_failure_on_invalid_key_keeps_old_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join(".env");
        std::fs::write(&path, "OLD=value").unwrap();

        assert!(write(&path, &vars(&[("BAD-KEY", "1")])).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "OLD=value");
    }

    // ── dotenv compatibility ──

    fn parse_back(content: &str) -> Vec<(String, String)> {
        dotenvy::from_read_iter(content.as_bytes())
            .map(|item| item.unwrap())
            .collect()
    }

    #[test]
    fn output_parses_back_with_dotenv() {
        let input = vars(&[
            ("PLAIN", "abc123"),
            ("URL", "https://example.dev/a?b=c&d=e"),
            ("SPACES", "hello world"),
            ("QUOTES", r#"say "hi""#),
            ("SINGLE", "it's"),
            ("DOLLAR", "$HOME and ${PATH}"),
            ("BACKSLASH", r"C:\path\to"),
            ("HASH", "#not-a-comment"),
            ("MULTI", "line1\nline2"),
            ("EQUALS", "a=b=c"),
        ]);
        let parsed = parse_back(&render(&input).unwrap());
        let expected: Vec<(String, String)> = input
            .iter()
            .map(|v| (v.key.clone(), v.value.clone()))
            .collect();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn control_and_unicode_values_round_trip() {
        let input = vars(&[
            ("TAB", "a\tb"),
            ("CR", "a\rb"),
            ("CRLF", "line1\r\nline2"),
            ("UNICODE", "héllo wörld ✓"),
        ]);
        let parsed = parse_back(&render(&input).unwrap());
        let expected: Vec<(String, String)> = input
            .iter()
            .map(|v| (v.key.clone(), v.value.clone()))
            .collect();
        assert_eq!(parsed, expected);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn line_count_matches_entry_count(
                values in proptest::collection::vec(r"[\PC\r\t\n]{0,24}", 1..8),
            ) {
                let input: EnvVars = values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (format!("KEY_{i}"), v.clone()))
                    .collect();
                let out = render(&input).unwrap();
                prop_assert_eq!(out.split('\n').count(), input.len());
            }

            #[test]
            fn arbitrary_values_round_trip_through_dotenv(
                value in r"[\PC\r\t\n]{0,32}",
            ) {
                let input: EnvVars = [("VALUE".to_owned(), value.clone())].into_iter().collect();
                let parsed = parse_back(&render(&input).unwrap());
                prop_assert_eq!(parsed, vec![("VALUE".to_owned(), value)]);
            }
        }
    }
}
