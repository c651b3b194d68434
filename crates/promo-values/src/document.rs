//! Format-preserving values document
//!
//! Edits are spliced into the original text: only the bytes of the edited
//! scalar change. Key order, comments, blank lines and the quoting of
//! untouched scalars survive byte for byte.
//!
//! Paths are resolved against block-style YAML (block mappings and block
//! sequences). Flow collections, block scalars, anchors, aliases and tags on
//! the path are reported as unsupported instead of being rewritten.

use crate::error::PatchError;
use crate::path::ValuePath;
use serde_yaml::Value;
use std::fmt::Write as _;

/// A YAML values document that can be edited in place
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuesDocument {
    source: String,
}

impl ValuesDocument {
    /// Parse document, keeping its original text
    ///
    /// # Errors
    /// Returns `PatchError::Parse` if the text is not a single valid YAML document
    pub fn parse(source: impl Into<String>) -> Result<Self, PatchError> {
        let source = source.into();
        serde_yaml::from_str::<Value>(&source)?;
        Ok(Self { source })
    }

    /// Consume into document text
    #[inline]
    #[must_use]
    pub fn into_string(self) -> String {
        self.source
    }

    /// Get value at path
    ///
    /// # Errors
    /// Returns `PatchError::Parse` if the document no longer parses
    pub fn get(&self, path: &ValuePath) -> Result<Option<Value>, PatchError> {
        let root: Value = serde_yaml::from_str(&self.source)?;
        Ok(lookup(&root, path).cloned())
    }

    /// Set the scalar at path to a string value
    ///
    /// The scalar keeps its quoting style where the value allows it. No
    /// intermediate mappings or sequences are created: every segment but
    /// the last must already exist.
    ///
    /// # Errors
    /// - `PatchError::KeyNotFound` if a segment does not exist
    /// - `PatchError::IndexOutOfRange` if a sequence index is past the end
    /// - `PatchError::NotAScalar` if the path ends on a mapping or sequence
    /// - `PatchError::Unsupported` if the path crosses a construct that cannot be edited in place
    pub fn set_scalar(&mut self, path: &ValuePath, value: &str) -> Result<(), PatchError> {
        let slot = Locator::new(&self.source).locate(path)?;

        let rendered = render(value, slot.style);
        let mut edited = String::with_capacity(self.source.len() + rendered.len() + 1);
        edited.push_str(&self.source[..slot.start]);
        if slot.needs_space {
            edited.push(' ');
        }
        edited.push_str(&rendered);
        edited.push_str(&self.source[slot.end..]);

        let verified = serde_yaml::from_str::<Value>(&edited)
            .ok()
            .is_some_and(|root| matches!(lookup(&root, path), Some(Value::String(s)) if s == value));
        if !verified {
            return Err(PatchError::Unverified {
                path: path.to_string(),
            });
        }

        self.source = edited;
        Ok(())
    }
}

/// Walk a parsed document along a path
fn lookup<'v>(root: &'v Value, path: &ValuePath) -> Option<&'v Value> {
    path.iter().try_fold(root, |node, segment| match node {
        Value::Mapping(map) => map.get(segment).or_else(|| {
            map.iter()
                .find(|(k, _)| scalar_key_matches(k, segment))
                .map(|(_, v)| v)
        }),
        Value::Sequence(seq) => segment.parse::<usize>().ok().and_then(|i| seq.get(i)),
        _ => None,
    })
}

fn scalar_key_matches(key: &Value, segment: &str) -> bool {
    match key {
        Value::Number(n) => n.to_string() == segment,
        Value::Bool(b) => b.to_string() == segment,
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Plain,
    Single,
    Double,
}

fn render(value: &str, style: Style) -> String {
    match style {
        Style::Plain if reads_back_as_plain(value) => value.to_string(),
        Style::Single if !value.contains('\n') => format!("'{}'", value.replace('\'', "''")),
        Style::Plain | Style::Single | Style::Double => double_quoted(value),
    }
}

/// Plain scalars that YAML would read as something other than this exact
/// string (`true`, `1.0`, `~`, empty, leading `[`...) must be quoted.
fn reads_back_as_plain(value: &str) -> bool {
    if value.is_empty() || value.contains('\n') || value.trim() != value {
        return false;
    }
    matches!(
        serde_yaml::from_str::<Value>(&format!("k: {value}")),
        Ok(Value::Mapping(m)) if m.len() == 1 && m.get("k") == Some(&Value::String(value.to_string()))
    )
}

fn double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

// ---------------------------------------------------------------------------
// Locating scalars in block YAML
// ---------------------------------------------------------------------------

/// Byte range of the scalar to replace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScalarSlot {
    start: usize,
    end: usize,
    style: Style,
    /// Empty value right after `key:` or `-`; a separating space is needed
    needs_space: bool,
}

#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    /// Byte offset of the line in the source
    start: usize,
    /// Leading spaces
    indent: usize,
    /// Line without terminator
    text: &'a str,
}

impl<'a> Line<'a> {
    fn body(&self) -> &'a str {
        &self.text[self.indent..]
    }

    fn is_content(&self) -> bool {
        let body = self.body().trim_end();
        !body.is_empty() && !body.starts_with('#')
    }

    fn is_seq_item(&self) -> bool {
        is_seq_entry(self.body())
    }
}

/// A node starting at `(line, col)`; lines before `end` may continue it
#[derive(Debug, Clone, Copy)]
struct Node {
    line: usize,
    col: usize,
    end: usize,
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Node(Node),
    /// Present but empty (`key:` with nothing below); `at` is where a value goes
    Empty { at: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Mapping,
    Sequence,
    Scalar,
    Other(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct KeySplit {
    key: String,
    /// Offset just past the `:`
    colon_end: usize,
    /// Offset of an inline value, if any
    value_start: Option<usize>,
}

struct Locator<'a> {
    lines: Vec<Line<'a>>,
}

impl<'a> Locator<'a> {
    fn new(source: &'a str) -> Self {
        let body = source.strip_prefix('\u{feff}').unwrap_or(source);
        let mut lines = Vec::new();
        let mut start = source.len() - body.len();
        for raw in body.split_inclusive('\n') {
            let text = raw.strip_suffix('\n').unwrap_or(raw);
            let text = text.strip_suffix('\r').unwrap_or(text);
            let indent = text.len() - text.trim_start_matches(' ').len();
            lines.push(Line {
                start,
                indent,
                text,
            });
            start += raw.len();
        }
        Self { lines }
    }

    fn text(&self, node: Node) -> &'a str {
        &self.lines[node.line].text[node.col..]
    }

    fn next_content(&self, from: usize, end: usize) -> Option<usize> {
        (from..end).find(|&i| self.lines[i].is_content())
    }

    /// Skip directives and a leading `---`; stop at the next document marker
    fn document_bounds(&self) -> (usize, usize) {
        let mut begin = 0;
        for (i, line) in self.lines.iter().enumerate() {
            if !line.is_content() {
                continue;
            }
            if line.indent == 0 && line.text.starts_with('%') {
                begin = i + 1;
                continue;
            }
            if line.indent == 0 && is_marker(line.text, "---") {
                begin = i + 1;
            }
            break;
        }
        let end = (begin..self.lines.len())
            .find(|&i| is_marker(self.lines[i].text, "---") || is_marker(self.lines[i].text, "..."))
            .unwrap_or(self.lines.len());
        (begin, end)
    }

    fn locate(&self, path: &ValuePath) -> Result<ScalarSlot, PatchError> {
        let (begin, end) = self.document_bounds();
        let root = self
            .next_content(begin, end)
            .ok_or_else(|| PatchError::KeyNotFound {
                path: path.prefix(1),
            })?;

        let mut slot = Slot::Node(Node {
            line: root,
            col: self.lines[root].indent,
            end,
        });

        for (depth, segment) in path.iter().enumerate() {
            let here = path.prefix(depth + 1);
            let Slot::Node(node) = slot else {
                return Err(PatchError::KeyNotFound { path: here });
            };
            slot = match classify(self.text(node)) {
                Shape::Mapping => self
                    .mapping_entry(node, segment)
                    .ok_or(PatchError::KeyNotFound { path: here })?,
                Shape::Sequence => {
                    let Ok(index) = segment.parse::<usize>() else {
                        return Err(PatchError::KeyNotFound { path: here });
                    };
                    self.sequence_item(node, index)
                        .map_err(|len| PatchError::IndexOutOfRange {
                            path: here,
                            index,
                            len,
                        })?
                }
                Shape::Scalar => return Err(PatchError::KeyNotFound { path: here }),
                Shape::Other(construct) => {
                    return Err(PatchError::Unsupported {
                        path: path.to_string(),
                        construct,
                    })
                }
            };
        }

        match slot {
            Slot::Empty { at } => Ok(ScalarSlot {
                start: at,
                end: at,
                style: Style::Plain,
                needs_space: true,
            }),
            Slot::Node(node) => match classify(self.text(node)) {
                Shape::Scalar => self.scalar_slot(node, path),
                Shape::Mapping | Shape::Sequence => Err(PatchError::NotAScalar {
                    path: path.to_string(),
                }),
                Shape::Other(construct) => Err(PatchError::Unsupported {
                    path: path.to_string(),
                    construct,
                }),
            },
        }
    }

    fn mapping_entry(&self, node: Node, key: &str) -> Option<Slot> {
        let entries: Vec<usize> = std::iter::once(node.line)
            .chain((node.line + 1..node.end).filter(|&i| {
                let line = &self.lines[i];
                line.is_content() && line.indent == node.col && !line.is_seq_item()
            }))
            .collect();

        for (n, &line) in entries.iter().enumerate() {
            let Some(split) = split_key(&self.lines[line].text[node.col..]) else {
                continue;
            };
            if split.key != key {
                continue;
            }
            let region_end = entries.get(n + 1).copied().unwrap_or(node.end);
            if let Some(offset) = split.value_start {
                return Some(Slot::Node(Node {
                    line,
                    col: node.col + offset,
                    end: region_end,
                }));
            }
            return Some(match self.next_content(line + 1, region_end) {
                Some(child) => Slot::Node(Node {
                    line: child,
                    col: self.lines[child].indent,
                    end: region_end,
                }),
                None => Slot::Empty {
                    at: self.lines[line].start + node.col + split.colon_end,
                },
            });
        }
        None
    }

    /// Item at index, or the number of items when out of range
    fn sequence_item(&self, node: Node, index: usize) -> Result<Slot, usize> {
        let items: Vec<usize> = std::iter::once(node.line)
            .chain((node.line + 1..node.end).filter(|&i| {
                let line = &self.lines[i];
                line.is_content() && line.indent == node.col && line.is_seq_item()
            }))
            .collect();

        let Some(&line) = items.get(index) else {
            return Err(items.len());
        };
        let item_end = items.get(index + 1).copied().unwrap_or(node.end);

        let after_dash = &self.lines[line].text[node.col + 1..];
        let value_col = node.col + 1 + (after_dash.len() - after_dash.trim_start_matches(' ').len());
        let rest = self.lines[line].text[value_col..].trim_end();

        if !rest.is_empty() && !rest.starts_with('#') {
            return Ok(Slot::Node(Node {
                line,
                col: value_col,
                end: item_end,
            }));
        }
        Ok(match self.next_content(line + 1, item_end) {
            Some(child) => Slot::Node(Node {
                line: child,
                col: self.lines[child].indent,
                end: item_end,
            }),
            None => Slot::Empty {
                at: self.lines[line].start + node.col + 1,
            },
        })
    }

    fn scalar_slot(&self, node: Node, path: &ValuePath) -> Result<ScalarSlot, PatchError> {
        if self.next_content(node.line + 1, node.end).is_some() {
            return Err(PatchError::Unsupported {
                path: path.to_string(),
                construct: "multi-line scalar",
            });
        }

        let text = self.text(node);
        let (len, style) = if let Some(inner) = text.strip_prefix('"') {
            (closing_double_quote(inner).map(|i| i + 2), Style::Double)
        } else if let Some(inner) = text.strip_prefix('\'') {
            (closing_single_quote(inner).map(|i| i + 2), Style::Single)
        } else {
            let cut = comment_start(text).unwrap_or(text.len());
            (Some(text[..cut].trim_end_matches([' ', '\t']).len()), Style::Plain)
        };
        let len = len.ok_or_else(|| PatchError::Unsupported {
            path: path.to_string(),
            construct: "multi-line quoted scalar",
        })?;

        let start = self.lines[node.line].start + node.col;
        Ok(ScalarSlot {
            start,
            end: start + len,
            style,
            needs_space: false,
        })
    }
}

fn is_marker(text: &str, marker: &str) -> bool {
    text.strip_prefix(marker)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(' '))
}

fn is_seq_entry(text: &str) -> bool {
    let text = text.trim_end();
    text == "-" || text.starts_with("- ")
}

fn classify(text: &str) -> Shape {
    let text = text.trim_end();
    if is_seq_entry(text) {
        Shape::Sequence
    } else if text.starts_with('[') || text.starts_with('{') {
        Shape::Other("flow collection")
    } else if text.starts_with('|') || text.starts_with('>') {
        Shape::Other("block scalar")
    } else if text.starts_with('&') || text.starts_with('*') {
        Shape::Other("anchor or alias")
    } else if text.starts_with('!') {
        Shape::Other("tag")
    } else if text.starts_with("? ") {
        Shape::Other("complex key")
    } else if split_key(text).is_some() {
        Shape::Mapping
    } else {
        Shape::Scalar
    }
}

/// Split `key: value` into its key and the offset of the value
fn split_key(text: &str) -> Option<KeySplit> {
    let (key, key_end) = if let Some(inner) = text.strip_prefix('"') {
        let close = closing_double_quote(inner)?;
        (unescape_double(&inner[..close]), close + 2)
    } else if let Some(inner) = text.strip_prefix('\'') {
        let close = closing_single_quote(inner)?;
        (inner[..close].replace("''", "'"), close + 2)
    } else {
        let colon = plain_key_colon(text)?;
        (text[..colon].trim_end().to_string(), colon)
    };

    let after_key = &text[key_end..];
    let colon = key_end + (after_key.len() - after_key.trim_start_matches(' ').len());
    if !text[colon..].starts_with(':') {
        return None;
    }
    let colon_end = colon + 1;
    let rest = &text[colon_end..];
    if !rest.is_empty() && !rest.starts_with(' ') && !rest.starts_with('\t') {
        return None;
    }

    let value = rest.trim_start();
    let value_start = (!value.is_empty() && !value.starts_with('#'))
        .then(|| colon_end + (rest.len() - value.len()));

    Some(KeySplit {
        key,
        colon_end,
        value_start,
    })
}

/// Offset of a `#` that starts a comment (preceded by a space or tab)
fn comment_start(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    (1..bytes.len()).find(|&i| bytes[i] == b'#' && matches!(bytes[i - 1], b' ' | b'\t'))
}

/// Index of the `:` ending a plain key; `None` if the line has no key
fn plain_key_colon(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    for i in 1..bytes.len() {
        match bytes[i] {
            b'#' if matches!(bytes[i - 1], b' ' | b'\t') => return None,
            b':' if i + 1 == bytes.len() || bytes[i + 1] == b' ' || bytes[i + 1] == b'\t' => {
                return Some(i)
            }
            _ => {}
        }
    }
    None
}

fn closing_double_quote(inner: &str) -> Option<usize> {
    let bytes = inner.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

fn closing_single_quote(inner: &str) -> Option<usize> {
    let bytes = inner.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            if bytes.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            return Some(i);
        }
        i += 1;
    }
    None
}

fn unescape_double(escaped: &str) -> String {
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn set(source: &str, path: &str, value: &str) -> Result<String, PatchError> {
        let mut doc = ValuesDocument::parse(source)?;
        doc.set_scalar(&path.parse()?, value)?;
        Ok(doc.into_string())
    }

    #[test]
    fn sets_nested_plain_scalar() {
        let out = set("image:\n  tag: oldtag\n", "image.tag", "1.19.0").unwrap();
        assert_eq!(out, "image:\n  tag: 1.19.0\n");
    }

    #[test]
    fn preserves_comments_order_and_untouched_quoting() {
        let source = "\
# Default values for app.
replicaCount: 1

image:
  # pinned by promotion
  repository: 'docker.io/library/nginx'
  tag: oldtag # managed
  pullPolicy: \"IfNotPresent\"

service:
  port: 80
";
        let out = set(source, "image.tag", "1.19.0").unwrap();
        assert_eq!(out, source.replace("tag: oldtag # managed", "tag: 1.19.0 # managed"));
    }

    #[test]
    fn keeps_comment_after_tab() {
        let out = set("image:\n  tag: old\t# keep me\n", "image.tag", "new").unwrap();
        assert_eq!(out, "image:\n  tag: new\t# keep me\n");

        let out = set("image:\n  tag: old \t # keep\n", "image.tag", "new").unwrap();
        assert_eq!(out, "image:\n  tag: new \t # keep\n");
    }

    #[test]
    fn skips_byte_order_mark() {
        let out = set("\u{feff}image:\n  tag: old\n", "image.tag", "new").unwrap();
        assert_eq!(out, "\u{feff}image:\n  tag: new\n");
    }

    #[test]
    fn keeps_double_quoted_style() {
        let out = set("image:\n  tag: \"old\"\n", "image.tag", "1.19.0").unwrap();
        assert_eq!(out, "image:\n  tag: \"1.19.0\"\n");
    }

    #[test]
    fn keeps_single_quoted_style_and_escapes() {
        let out = set("name: 'old'\n", "name", "it's").unwrap();
        assert_eq!(out, "name: 'it''s'\n");
    }

    #[test]
    fn quotes_plain_values_that_would_change_type() {
        assert_eq!(set("flag: x\n", "flag", "true").unwrap(), "flag: \"true\"\n");
        assert_eq!(set("ver: x\n", "ver", "1.0").unwrap(), "ver: \"1.0\"\n");
        assert_eq!(set("v: x\n", "v", "").unwrap(), "v: \"\"\n");
        assert_eq!(set("v: x\n", "v", "a # b").unwrap(), "v: \"a # b\"\n");
    }

    #[test]
    fn sets_sequence_items() {
        let source = "\
sidecars:
  - name: proxy
    image: envoy:1
  - name: logger
    image: fluentbit:1
";
        let out = set(source, "sidecars.1.image", "fluentbit:2").unwrap();
        assert_eq!(out, source.replace("fluentbit:1", "fluentbit:2"));
    }

    #[test]
    fn sets_sequence_at_same_indent_as_parent_key() {
        let source = "args:\n- --a\n- --b\nnext: 1\n";
        let out = set(source, "args.1", "--c").unwrap();
        assert_eq!(out, "args:\n- --a\n- --c\nnext: 1\n");
    }

    #[test]
    fn sets_scalar_sequence_item_with_nested_block() {
        let source = "list:\n  -\n    value: a\n  - b\n";
        let out = set(source, "list.0.value", "z").unwrap();
        assert_eq!(out, "list:\n  -\n    value: z\n  - b\n");
    }

    #[test]
    fn fills_empty_value() {
        let out = set("image:\n  tag:\nother: 1\n", "image.tag", "v1").unwrap();
        assert_eq!(out, "image:\n  tag: v1\nother: 1\n");
    }

    #[test]
    fn matches_quoted_keys() {
        let out = set("\"image\":\n  'tag': old\n", "image.tag", "new").unwrap();
        assert_eq!(out, "\"image\":\n  'tag': new\n");
    }

    #[test]
    fn skips_leading_document_marker() {
        let out = set("---\nimage:\n  tag: old\n", "image.tag", "new").unwrap();
        assert_eq!(out, "---\nimage:\n  tag: new\n");
    }

    #[test]
    fn handles_crlf_line_endings() {
        let out = set("image:\r\n  tag: old\r\n", "image.tag", "new").unwrap();
        assert_eq!(out, "image:\r\n  tag: new\r\n");
    }

    #[test]
    fn missing_intermediate_key_fails() {
        let err = set("image:\n  tag: old\n", "sidecar.tag", "x").unwrap_err();
        assert!(matches!(err, PatchError::KeyNotFound { ref path } if path == "sidecar"));
    }

    #[test]
    fn missing_leaf_key_fails() {
        let err = set("image:\n  tag: old\n", "image.digest", "x").unwrap_err();
        assert!(matches!(err, PatchError::KeyNotFound { ref path } if path == "image.digest"));
    }

    #[test]
    fn path_through_scalar_fails() {
        let err = set("image: nginx\n", "image.tag", "x").unwrap_err();
        assert!(matches!(err, PatchError::KeyNotFound { .. }));
    }

    #[test]
    fn index_out_of_range_fails() {
        let err = set("list:\n  - a\n", "list.3", "x").unwrap_err();
        assert!(matches!(err, PatchError::IndexOutOfRange { index: 3, len: 1, .. }));
    }

    #[test]
    fn non_numeric_segment_on_sequence_fails() {
        let err = set("list:\n  - a\n", "list.first", "x").unwrap_err();
        assert!(matches!(err, PatchError::KeyNotFound { .. }));
    }

    #[test]
    fn mapping_target_is_not_a_scalar() {
        let err = set("image:\n  tag: old\n", "image", "x").unwrap_err();
        assert!(matches!(err, PatchError::NotAScalar { .. }));
    }

    #[test]
    fn flow_collection_is_unsupported() {
        let err = set("image: {tag: old}\n", "image.tag", "x").unwrap_err();
        assert!(matches!(err, PatchError::Unsupported { construct: "flow collection", .. }));
    }

    #[test]
    fn block_scalar_is_unsupported() {
        let err = set("notes: |\n  text\n", "notes", "x").unwrap_err();
        assert!(matches!(err, PatchError::Unsupported { construct: "block scalar", .. }));
    }

    #[test]
    fn invalid_yaml_is_rejected() {
        let err = ValuesDocument::parse("image: [unclosed\n").unwrap_err();
        assert!(matches!(err, PatchError::Parse(_)));
    }

    #[test]
    fn get_reads_nested_and_indexed_values() {
        let doc = ValuesDocument::parse("a:\n  list:\n    - x\n    - y\n").unwrap();
        assert_eq!(
            doc.get(&"a.list.1".parse().unwrap()).unwrap(),
            Some(Value::String("y".to_string()))
        );
        assert_eq!(doc.get(&"a.missing".parse().unwrap()).unwrap(), None);
    }

    #[test]
    fn split_key_variants() {
        let split = split_key("tag: v # c").unwrap();
        assert_eq!(split.key, "tag");
        assert_eq!(split.value_start, Some(5));

        let split = split_key("tag:   # only comment").unwrap();
        assert_eq!(split.value_start, None);
        assert_eq!(split.colon_end, 4);

        assert!(split_key("http://example.com").is_none());
        assert!(split_key("plain # a: b").is_none());
    }
}
