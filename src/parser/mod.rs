//! Parser module for Mermaid diagrams
//!
//! Splits the source into statements, reads the header line and hands the
//! rest to the flowchart parser. Other diagram types are recognised by their
//! header keyword so they fail with a clear message; a parser for them would
//! be dispatched from [`parse`] and produce the same [`Graph`].

pub mod flowchart;

use crate::error::{RenderError, Result};
use crate::types::{Direction, Graph};

/// One statement of diagram source with its 1-based line number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Statement<'a> {
    pub line: usize,
    pub text: &'a str,
}

/// Header keywords of Mermaid diagram types that are not flowcharts.
const UNSUPPORTED_DIAGRAMS: &[&str] = &[
    "sequencediagram",
    "classdiagram",
    "statediagram",
    "statediagram-v2",
    "erdiagram",
    "gitgraph",
    "mindmap",
    "pie",
    "gantt",
    "journey",
    "timeline",
    "quadrantchart",
    "requirementdiagram",
    "c4context",
    "xychart-beta",
    "sankey-beta",
    "block-beta",
    "architecture-beta",
];

/// Parse Mermaid flowchart source into a [`Graph`].
///
/// Fails with [`RenderError::Syntax`] when the header is not a flowchart
/// header or a statement is malformed. No partial graph is returned.
pub fn parse(text: &str) -> Result<Graph> {
    let body = strip_frontmatter(text);
    let statements = split_statements(body.text, body.line_offset);

    let header = statements
        .first()
        .ok_or_else(|| RenderError::syntax(1, "empty diagram: expected a \"graph\" or \"flowchart\" header"))?;
    let direction = parse_header(header)?;

    let graph = flowchart::parse_flowchart(direction, &statements[1..])?;
    log::debug!(
        "parsed flowchart {}: {} nodes, {} edges",
        graph.direction.as_str(),
        graph.nodes.len(),
        graph.edges.len()
    );
    Ok(graph)
}

/// Read the diagram type keyword and optional direction.
fn parse_header(header: &Statement<'_>) -> Result<Direction> {
    let mut words = header.text.split_whitespace();
    let keyword = words.next().unwrap_or_default();
    let lowered = keyword.to_lowercase();

    if lowered != "graph" && lowered != "flowchart" {
        if UNSUPPORTED_DIAGRAMS.contains(&lowered.as_str()) {
            return Err(RenderError::syntax(
                header.line,
                format!(
                    "unsupported diagram type \"{}\": only flowcharts (graph/flowchart) can be rendered",
                    keyword
                ),
            ));
        }
        return Err(RenderError::syntax(
            header.line,
            format!(
                "unknown diagram type \"{}\". Expected \"graph TD\", \"flowchart LR\", etc.",
                keyword
            ),
        ));
    }

    let direction = match words.next() {
        Some(dir) => dir
            .parse::<Direction>()
            .map_err(|e| RenderError::syntax(header.line, e))?,
        None => Direction::TD,
    };

    if let Some(extra) = words.next() {
        return Err(RenderError::syntax(
            header.line,
            format!("unexpected \"{}\" after the diagram header", extra),
        ));
    }

    Ok(direction)
}

/// Source text with front-matter removed and the number of lines dropped.
struct Body<'a> {
    text: &'a str,
    line_offset: usize,
}

/// Strip YAML frontmatter (--- ... ---) from the beginning of text
fn strip_frontmatter(text: &str) -> Body<'_> {
    let whole = Body {
        text,
        line_offset: 0,
    };

    let mut lines = text.split_inclusive('\n').enumerate();
    let mut consumed = 0;

    // Find opening ---
    let opened = loop {
        match lines.next() {
            Some((_, line)) if line.trim().is_empty() => consumed += line.len(),
            Some((_, line)) if line.trim() == "---" => {
                consumed += line.len();
                break true;
            }
            _ => break false,
        }
    };
    if !opened {
        return whole;
    }

    // Find closing ---
    for (idx, line) in lines {
        consumed += line.len();
        if line.trim() == "---" {
            return Body {
                text: &text[consumed..],
                line_offset: idx + 1,
            };
        }
    }

    // No closing --- found, return text as-is
    whole
}

/// Split source into statements on newlines and on `;` outside brackets,
/// quotes and `|edge labels|`. Comment lines (`%%`) and blanks are dropped.
pub fn split_statements(text: &str, line_offset: usize) -> Vec<Statement<'_>> {
    let mut statements = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = line_offset + idx + 1;
        if raw.trim_start().starts_with("%%") {
            continue;
        }

        let mut depth = 0i32;
        let mut in_quote = false;
        let mut in_pipe = false;
        let mut start = 0;

        for (pos, c) in raw.char_indices() {
            match c {
                '"' => in_quote = !in_quote,
                '|' if !in_quote && depth <= 0 => in_pipe = !in_pipe,
                '[' | '(' | '{' if !in_quote && !in_pipe => depth += 1,
                ']' | ')' | '}' if !in_quote && !in_pipe => depth -= 1,
                ';' if !in_quote && !in_pipe && depth <= 0 => {
                    push_statement(&mut statements, line, &raw[start..pos]);
                    start = pos + 1;
                }
                _ => {}
            }
        }
        push_statement(&mut statements, line, &raw[start..]);
    }

    statements
}

fn push_statement<'a>(statements: &mut Vec<Statement<'a>>, line: usize, text: &'a str) {
    let text = text.trim();
    if !text.is_empty() && !text.starts_with("%%") {
        statements.push(Statement { line, text });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_semicolons_and_newlines() {
        let stmts = split_statements("graph LR; A --> B\n  C --> D;", 0);
        let texts: Vec<_> = stmts.iter().map(|s| s.text).collect();
        assert_eq!(texts, vec!["graph LR", "A --> B", "C --> D"]);
        assert_eq!(stmts[2].line, 2);
    }

    #[test]
    fn keeps_semicolons_inside_labels() {
        let stmts = split_statements("A[\"x; y\"] -->|a;b| B", 0);
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn pipes_inside_brackets_are_label_text() {
        let stmts = split_statements("A[a|b] --> B; C --> D", 0);
        let texts: Vec<_> = stmts.iter().map(|s| s.text).collect();
        assert_eq!(texts, vec!["A[a|b] --> B", "C --> D"]);
    }

    #[test]
    fn skips_comments() {
        let stmts = split_statements("%% hello\ngraph TD\n  %% more\nA", 0);
        let texts: Vec<_> = stmts.iter().map(|s| s.text).collect();
        assert_eq!(texts, vec!["graph TD", "A"]);
    }

    #[test]
    fn header_defaults_to_top_down() {
        let g = parse("flowchart\nA --> B").unwrap();
        assert_eq!(g.direction, Direction::TD);
    }

    #[test]
    fn rejects_unknown_diagram_type() {
        let err = parse("blorp LR\nA --> B").unwrap_err();
        assert!(matches!(err, RenderError::Syntax { line: 1, .. }));
        assert!(err.to_string().contains("unknown diagram type"));
    }

    #[test]
    fn rejects_unsupported_diagram_type() {
        let err = parse("sequenceDiagram\nAlice->>Bob: Hi").unwrap_err();
        assert!(err.to_string().contains("unsupported diagram type"));
    }

    #[test]
    fn rejects_bad_direction() {
        let err = parse("graph XY\nA").unwrap_err();
        assert!(err.to_string().contains("Invalid direction"));
    }

    #[test]
    fn empty_source_is_a_syntax_error() {
        assert!(matches!(parse("  \n%% only a comment\n"), Err(RenderError::Syntax { .. })));
    }

    #[test]
    fn frontmatter_is_skipped_and_lines_stay_accurate() {
        let src = "---\ntitle: demo\n---\ngraph LR\nA --> ";
        let err = parse(src).unwrap_err();
        assert!(matches!(err, RenderError::Syntax { line: 5, .. }), "{err}");
    }
}
