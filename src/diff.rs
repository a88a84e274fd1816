//! Line-level diff between source and translated SQL.
//!
//! Produces the two-column shape the report renders: the source column
//! carries unchanged and removed lines, the target column carries
//! unchanged and added lines.

use similar::{ChangeTag, TextDiff};

/// How a line differs between the two sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Unchanged,
    Removed,
    Added,
}

/// One rendered line in a diff column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub kind: LineKind,
    pub text: String,
}

/// Side-by-side line diff of two texts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SideBySide {
    pub source: Vec<DiffLine>,
    pub target: Vec<DiffLine>,
}

/// Compute the side-by-side line diff of `source` against `target`.
pub fn side_by_side(source: &str, target: &str) -> SideBySide {
    let diff = TextDiff::from_lines(source, target);
    let mut out = SideBySide::default();

    for change in diff.iter_all_changes() {
        let text = trim_newline(change.value()).to_string();
        match change.tag() {
            ChangeTag::Equal => {
                out.source.push(DiffLine {
                    kind: LineKind::Unchanged,
                    text: text.clone(),
                });
                out.target.push(DiffLine {
                    kind: LineKind::Unchanged,
                    text,
                });
            }
            ChangeTag::Delete => out.source.push(DiffLine {
                kind: LineKind::Removed,
                text,
            }),
            ChangeTag::Insert => out.target.push(DiffLine {
                kind: LineKind::Added,
                text,
            }),
        }
    }

    out
}

fn trim_newline(line: &str) -> &str {
    line.strip_suffix('\n')
        .map(|rest| rest.strip_suffix('\r').unwrap_or(rest))
        .unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn line(kind: LineKind, text: &str) -> DiffLine {
        DiffLine {
            kind,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_single_line_replacement() {
        let diff = side_by_side("a\nb\nc", "a\nx\nc");

        assert_eq!(
            diff.source,
            vec![
                line(LineKind::Unchanged, "a"),
                line(LineKind::Removed, "b"),
                line(LineKind::Unchanged, "c"),
            ]
        );
        assert_eq!(
            diff.target,
            vec![
                line(LineKind::Unchanged, "a"),
                line(LineKind::Added, "x"),
                line(LineKind::Unchanged, "c"),
            ]
        );
    }

    #[test]
    fn test_identical_texts() {
        let diff = side_by_side("SELECT 1\nFROM t", "SELECT 1\nFROM t");
        assert_eq!(diff.source, diff.target);
        assert!(diff.source.iter().all(|l| l.kind == LineKind::Unchanged));
        assert_eq!(diff.source.len(), 2);
    }

    #[test]
    fn test_pure_insertion() {
        let diff = side_by_side("", "SELECT 1\n");
        assert!(diff.source.is_empty());
        assert_eq!(diff.target, vec![line(LineKind::Added, "SELECT 1")]);
    }

    #[test]
    fn test_crlf_input() {
        let diff = side_by_side("a\r\nb\r\n", "a\r\nb\r\n");
        assert_eq!(
            diff.source,
            vec![line(LineKind::Unchanged, "a"), line(LineKind::Unchanged, "b")]
        );
    }
}
