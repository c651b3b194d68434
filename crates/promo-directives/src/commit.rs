//! Commit message for values updates

use promo_values::Changes;
use std::fmt::Write as _;

/// Summarize applied changes, one line per key in key order
///
/// Values are double-quoted with Go `%q` escapes (`\x7f`, `\a`, `\u00a0`),
/// matching the messages of the other promotion steps. Empty changes give
/// an empty message.
#[must_use]
pub fn commit_message(path: &str, changes: &Changes) -> String {
    if changes.is_empty() {
        return String::new();
    }

    let mut entries: Vec<(&String, &String)> = changes.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let mut message = format!("Updated {path}\n");
    for (key, value) in entries {
        let _ = write!(message, "\n- {key}: {}", quote(value));
    }
    message
}

fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0b}' => out.push_str("\\v"),
            '\u{0c}' => out.push_str("\\f"),
            c if c.is_control() || (c.is_whitespace() && c != ' ') => {
                let code = u32::from(c);
                let _ = match code {
                    0..=0x7f => write!(out, "\\x{code:02x}"),
                    0x80..=0xffff => write!(out, "\\u{code:04x}"),
                    _ => write!(out, "\\U{code:08x}"),
                };
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn changes(pairs: &[(&str, &str)]) -> Changes {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn empty_changes() {
        assert_eq!(commit_message("values.yaml", &Changes::new()), "");
    }

    #[test]
    fn single_change() {
        assert_eq!(
            commit_message("values.yaml", &changes(&[("image.tag", "1.19.0")])),
            "Updated values.yaml\n\n- image.tag: \"1.19.0\""
        );
    }

    #[test]
    fn multiple_changes_sorted_by_key() {
        assert_eq!(
            commit_message(
                "charts/app/values.yaml",
                &changes(&[
                    ("image.tag", "1.19.0"),
                    ("another.image", "nginx:latest"),
                    ("image.digest", "sha256:abc"),
                ])
            ),
            "Updated charts/app/values.yaml\n\n\
             - another.image: \"nginx:latest\"\n\
             - image.digest: \"sha256:abc\"\n\
             - image.tag: \"1.19.0\""
        );
    }

    #[test]
    fn control_characters_use_go_escapes() {
        assert_eq!(
            commit_message("values.yaml", &changes(&[("a", "x\u{7f}y"), ("b", "tab\there")])),
            "Updated values.yaml\n\n- a: \"x\\x7fy\"\n- b: \"tab\\there\""
        );
        assert_eq!(quote("bell\u{07}\u{0}"), "\"bell\\a\\x00\"");
        assert_eq!(quote("nb\u{a0}sp"), "\"nb\\u00a0sp\"");
        assert_eq!(quote("say \"hi\" \\ caf\u{e9}"), "\"say \\\"hi\\\" \\\\ caf\u{e9}\"");
    }

    proptest! {
        #[test]
        fn lines_sorted(keys in proptest::collection::btree_set("[a-z]{1,6}(\\.[a-z]{1,6})?", 1..8)) {
            let mut shuffled: Vec<&String> = keys.iter().collect();
            shuffled.reverse();
            let changes: Changes = shuffled.iter().map(|k| ((*k).clone(), "v".to_string())).collect();

            let message = commit_message("values.yaml", &changes);
            let listed: Vec<&str> = message
                .lines()
                .skip(2)
                .filter_map(|l| l.strip_prefix("- ").and_then(|l| l.split(':').next()))
                .collect();
            let expected: Vec<&str> = keys.iter().map(String::as_str).collect();
            prop_assert_eq!(listed, expected);
        }
    }
}
