//! Flowchart parser

use super::Statement;
use crate::error::{RenderError, Result};
use crate::types::{Direction, Edge, EdgeStyle, Graph, Node, NodeShape, StyleProps};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Node ids: word characters, optionally joined by single dashes (`api-v2`).
/// A dash followed by another dash or a dot starts an arrow instead.
const ID: &str = r"\w+(?:-\w+)*";

lazy_static! {
    static ref RE_CLASSDEF: Regex = Regex::new(r"^classDef\s+([\w-]+)\s+(.+)$").unwrap();
    static ref RE_CLASS: Regex = Regex::new(r"^class\s+([\w,\s-]+?)\s+([\w-]+)$").unwrap();
    static ref RE_STYLE: Regex = Regex::new(r"^style\s+([\w,-]+)\s+(.+)$").unwrap();
    static ref RE_DIRECTION: Regex = Regex::new(r"(?i)^direction\s+(\w+)$").unwrap();
    static ref RE_SUBGRAPH: Regex = Regex::new(r"^subgraph(?:\s+(.+))?$").unwrap();
    static ref RE_SKIPPED: Regex = Regex::new(r"^(click|linkStyle|accTitle|accDescr)\b").unwrap();
    static ref RE_ARROW: Regex = Regex::new(
        r#"^(<)?(--+>|---+|-\.+->|-\.+-|==+>|===+)(?:\s*\|("[^"]*"|[^|]*)\|)?"#
    )
    .unwrap();
    static ref RE_TEXT_ARROW: Regex = Regex::new(
        r"^(<)?(--|-\.|==)\s+(.+?)\s*(-{2,}>|-{3,}|\.-+>|\.-+|={2,}>|={3,})"
    )
    .unwrap();
    static ref RE_CLASS_SUFFIX: Regex = Regex::new(r"^:::([\w][\w-]*)").unwrap();
    static ref RE_BARE_ID: Regex = Regex::new(&format!("^({})", ID)).unwrap();
    static ref NODE_PATTERNS: Vec<NodePattern> =
        SHAPE_PRIORITY.iter().map(|&shape| NodePattern::new(shape)).collect();
}

/// Shapes in matching order: longer and mixed delimiters before the single
/// characters they start with.
const SHAPE_PRIORITY: [NodeShape; 12] = [
    NodeShape::DoubleCircle,
    NodeShape::Stadium,
    NodeShape::Circle,
    NodeShape::Subroutine,
    NodeShape::Cylinder,
    NodeShape::Trapezoid,
    NodeShape::TrapezoidAlt,
    NodeShape::Asymmetric,
    NodeShape::Hexagon,
    NodeShape::Rectangle,
    NodeShape::Rounded,
    NodeShape::Diamond,
];

/// Node shape patterns
struct NodePattern {
    quoted: Regex,
    plain: Regex,
    shape: NodeShape,
}

impl NodePattern {
    fn new(shape: NodeShape) -> Self {
        let (open, close) = shape.delimiters();
        let (open, close) = (regex::escape(open), regex::escape(close));
        Self {
            quoted: Regex::new(&format!(r#"^({}){}"([^"]*)"{}"#, ID, open, close)).unwrap(),
            plain: Regex::new(&format!(r"^({}){}(.+?){}", ID, open, close)).unwrap(),
            shape,
        }
    }
}

/// Characters that open a node shape right after its id.
const SHAPE_OPENERS: [char; 4] = ['[', '(', '{', '>'];

/// Parse the statements following a `graph`/`flowchart` header.
pub fn parse_flowchart(direction: Direction, statements: &[Statement<'_>]) -> Result<Graph> {
    let mut parser = FlowchartParser::new(direction);
    for stmt in statements {
        parser.statement(stmt)?;
    }
    parser.finish(statements.last().map_or(1, |s| s.line))
}

/// A node reference as written in a statement.
struct NodeRef {
    id: String,
    declared: Option<(String, NodeShape)>,
}

struct FlowchartParser {
    graph: Graph,
    /// Ids whose shape was given explicitly at least once
    explicit: HashSet<String>,
    class_defs: HashMap<String, StyleProps>,
    class_assignments: Vec<(String, String)>,
    node_styles: BTreeMap<String, StyleProps>,
    subgraph_depth: usize,
}

impl FlowchartParser {
    fn new(direction: Direction) -> Self {
        Self {
            graph: Graph::new(direction),
            explicit: HashSet::new(),
            class_defs: HashMap::new(),
            class_assignments: Vec::new(),
            node_styles: BTreeMap::new(),
            subgraph_depth: 0,
        }
    }

    fn statement(&mut self, stmt: &Statement<'_>) -> Result<()> {
        let text = stmt.text;

        // classDef
        if let Some(caps) = RE_CLASSDEF.captures(text) {
            let props = parse_style_props(&caps[2]);
            self.class_defs.insert(caps[1].to_string(), props);
            return Ok(());
        }

        // class assignment
        if let Some(caps) = RE_CLASS.captures(text) {
            for id in caps[1].split(',').map(str::trim).filter(|s| !s.is_empty()) {
                self.class_assignments.push((id.to_string(), caps[2].to_string()));
            }
            return Ok(());
        }

        // style statement
        if let Some(caps) = RE_STYLE.captures(text) {
            let props = parse_style_props(&caps[2]);
            for id in caps[1].split(',').map(str::trim) {
                let entry = self.node_styles.entry(id.to_string()).or_default();
                entry.extend(props.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            return Ok(());
        }

        // direction inside a subgraph; subgraphs share the main layout
        if let Some(caps) = RE_DIRECTION.captures(text) {
            caps[1]
                .parse::<Direction>()
                .map_err(|e| RenderError::syntax(stmt.line, e))?;
            log::debug!("line {}: ignoring subgraph direction {}", stmt.line, &caps[1]);
            return Ok(());
        }

        if RE_SUBGRAPH.is_match(text) {
            self.subgraph_depth += 1;
            return Ok(());
        }

        if text == "end" {
            if self.subgraph_depth == 0 {
                return Err(RenderError::syntax(
                    stmt.line,
                    "\"end\" without a matching \"subgraph\"",
                ));
            }
            self.subgraph_depth -= 1;
            return Ok(());
        }

        if let Some(caps) = RE_SKIPPED.captures(text) {
            log::debug!("line {}: skipping {} statement", stmt.line, &caps[1]);
            return Ok(());
        }

        self.edge_chain(stmt)
    }

    /// Parse `A`, `A[x] --> B & C -.->|y| D`, ... registering every node.
    fn edge_chain(&mut self, stmt: &Statement<'_>) -> Result<()> {
        let (mut prev_ids, mut remaining) = match self.node_group(stmt, stmt.text)? {
            Some(group) => group,
            None => {
                return Err(RenderError::syntax(
                    stmt.line,
                    format!("expected a node id, found \"{}\"", stmt.text),
                ))
            }
        };

        while !remaining.is_empty() {
            let (template, rest) = match consume_arrow(remaining) {
                Some(arrow) => arrow,
                None => return Err(unexpected_text(stmt.line, remaining)),
            };

            let (target_ids, rest) = match self.node_group(stmt, rest)? {
                Some(group) => group,
                None => {
                    return Err(RenderError::syntax(
                        stmt.line,
                        format!("dangling edge: \"{}\" has no target node", template.arrow_op()),
                    ))
                }
            };

            // Create edges for all combinations
            for source in &prev_ids {
                for target in &target_ids {
                    self.graph.add_edge(Edge {
                        source: source.clone(),
                        target: target.clone(),
                        ..template.clone()
                    });
                }
            }

            prev_ids = target_ids;
            remaining = rest;
        }

        Ok(())
    }

    /// Consume a node group (possibly with & separators)
    fn node_group<'a>(
        &mut self,
        stmt: &Statement<'_>,
        input: &'a str,
    ) -> Result<Option<(Vec<String>, &'a str)>> {
        let mut remaining = input.trim_start();
        let mut ids = Vec::new();

        while let Some((node, rest)) = consume_single_node(stmt.line, remaining)? {
            let id = node.id.clone();
            self.declare(node);
            remaining = rest.trim_start();

            // Check for class shorthand :::className
            if let Some(caps) = RE_CLASS_SUFFIX.captures(remaining) {
                self.class_assignments.push((id.clone(), caps[1].to_string()));
                remaining = remaining[caps[0].len()..].trim_start();
            }
            ids.push(id);

            // Check for & separator
            match remaining.strip_prefix('&') {
                Some(rest) => remaining = rest.trim_start(),
                None => break,
            }
        }

        if ids.is_empty() {
            Ok(None)
        } else {
            Ok(Some((ids, remaining)))
        }
    }

    /// Register a node reference. Explicit labels replace earlier ones; a
    /// differing explicit shape replaces the earlier one with a warning.
    fn declare(&mut self, node: NodeRef) {
        let Some((label, shape)) = node.declared else {
            self.graph.add_node(Node::bare(&node.id));
            return;
        };

        if let Some(existing) = self.graph.node_mut(&node.id) {
            if self.explicit.contains(&node.id) && existing.shape != shape {
                log::warn!(
                    "node \"{}\" re-declared as {:?} (was {:?}); using the later shape",
                    node.id,
                    shape,
                    existing.shape
                );
            }
            existing.label = label;
            existing.shape = shape;
        } else {
            self.graph.add_node(Node {
                id: node.id.clone(),
                label,
                shape,
            });
        }
        self.explicit.insert(node.id);
    }

    /// Resolve class and inline styles, then check the graph.
    fn finish(mut self, last_line: usize) -> Result<Graph> {
        if self.subgraph_depth > 0 {
            return Err(RenderError::syntax(
                last_line,
                "unclosed \"subgraph\": missing \"end\"",
            ));
        }

        let mut styles: BTreeMap<String, StyleProps> = BTreeMap::new();
        for (id, class) in &self.class_assignments {
            match self.class_defs.get(class) {
                Some(props) => styles
                    .entry(id.clone())
                    .or_default()
                    .extend(props.iter().map(|(k, v)| (k.clone(), v.clone()))),
                None => log::debug!("class \"{}\" on node \"{}\" has no classDef", class, id),
            }
        }
        for (id, props) in self.node_styles {
            styles.entry(id).or_default().extend(props);
        }
        styles.retain(|id, props| {
            let keep = self.graph.node(id).is_some() && !props.is_empty();
            if !keep {
                log::debug!("dropping style for unknown node \"{}\"", id);
            }
            keep
        });
        self.graph.styles = styles;

        self.graph
            .validate()
            .map_err(|e| RenderError::syntax(last_line, e))?;
        Ok(self.graph)
    }
}

/// Match an arrow at the start of `input`. Returns an edge template holding
/// style, arrowheads and label, plus the text after the arrow.
fn consume_arrow(input: &str) -> Option<(Edge, &str)> {
    if let Some(caps) = RE_ARROW.captures(input) {
        let op = &caps[2];
        let mut edge = Edge::new("", "");
        edge.has_arrow_start = caps.get(1).is_some();
        edge.has_arrow_end = op.ends_with('>');
        edge.style = arrow_style(op);
        edge.label = caps.get(3).map(|m| unquote(m.as_str().trim()));
        return Some((edge, input[caps[0].len()..].trim_start()));
    }

    // `A -- text --> B` form: label between the opening and closing halves
    if let Some(caps) = RE_TEXT_ARROW.captures(input) {
        let mut edge = Edge::new("", "");
        edge.has_arrow_start = caps.get(1).is_some();
        edge.has_arrow_end = caps[4].ends_with('>');
        edge.style = arrow_style(&caps[2]);
        edge.label = Some(unquote(caps[3].trim()));
        return Some((edge, input[caps[0].len()..].trim_start()));
    }

    None
}

fn arrow_style(op: &str) -> EdgeStyle {
    if op.contains('.') {
        EdgeStyle::Dotted
    } else if op.starts_with('=') {
        EdgeStyle::Thick
    } else {
        EdgeStyle::Solid
    }
}

/// Consume a single node definition
fn consume_single_node(line: usize, input: &str) -> Result<Option<(NodeRef, &str)>> {
    if input.is_empty() {
        return Ok(None);
    }

    // Try each pattern
    for pattern in NODE_PATTERNS.iter() {
        let caps = match pattern.quoted.captures(input) {
            Some(caps) => Some((caps, true)),
            None => pattern.plain.captures(input).map(|caps| (caps, false)),
        };
        if let Some((caps, quoted)) = caps {
            let label = if quoted {
                unquote_entities(&caps[2])
            } else {
                unquote_entities(caps[2].trim())
            };
            let node = NodeRef {
                id: caps[1].to_string(),
                declared: Some((label, pattern.shape)),
            };
            return Ok(Some((node, &input[caps[0].len()..])));
        }
    }

    // Try bare node (just an ID)
    let Some(caps) = RE_BARE_ID.captures(input) else {
        return Ok(None);
    };
    let id = caps[1].to_string();
    let rest = &input[caps[0].len()..];

    if rest.starts_with(SHAPE_OPENERS) {
        return Err(RenderError::syntax(
            line,
            format!("unbalanced delimiters in node \"{}\": \"{}\"", id, rest),
        ));
    }

    Ok(Some((NodeRef { id, declared: None }, rest)))
}

fn unexpected_text(line: usize, remaining: &str) -> RenderError {
    if remaining.starts_with(SHAPE_OPENERS) {
        RenderError::syntax(line, format!("unbalanced delimiters near \"{}\"", remaining))
    } else {
        RenderError::syntax(line, format!("unexpected \"{}\"", remaining))
    }
}

/// Strip surrounding double quotes from a label.
fn unquote(text: &str) -> String {
    match text.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
        Some(inner) => unquote_entities(inner),
        None => unquote_entities(text),
    }
}

fn unquote_entities(text: &str) -> String {
    text.replace("#quot;", "\"")
}

fn parse_style_props(props_str: &str) -> StyleProps {
    let mut props = StyleProps::new();
    for pair in props_str.split(',') {
        if let Some((key, val)) = pair.split_once(':') {
            let (key, val) = (key.trim(), val.trim().trim_end_matches(';'));
            if !key.is_empty() && !val.is_empty() {
                props.insert(key.to_string(), val.to_string());
            }
        }
    }
    props
}

#[cfg(test)]
mod tests {
    use crate::error::RenderError;
    use crate::parser::parse;
    use crate::types::{EdgeStyle, NodeShape};

    #[test]
    fn parses_simple_chain() {
        let g = parse("graph LR\nA --> B --> C").unwrap();
        let ids: Vec<_> = g.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        assert_eq!(g.edges.len(), 2);
        assert_eq!(g.edges[1].source, "B");
    }

    #[test]
    fn parses_every_shape() {
        let src = "graph TD\n\
            a[rect] --> b(round)\n\
            c([stadium]) --> d[[sub]]\n\
            e[(db)] --> f((circle))\n\
            g(((double))) --> h{diamond}\n\
            i{{hex}} --> j>flag]\n\
            k[/trap\\] --> l[\\inv/]";
        let g = parse(src).unwrap();
        let shapes: Vec<_> = g.nodes.iter().map(|n| n.shape).collect();
        assert_eq!(
            shapes,
            vec![
                NodeShape::Rectangle,
                NodeShape::Rounded,
                NodeShape::Stadium,
                NodeShape::Subroutine,
                NodeShape::Cylinder,
                NodeShape::Circle,
                NodeShape::DoubleCircle,
                NodeShape::Diamond,
                NodeShape::Hexagon,
                NodeShape::Asymmetric,
                NodeShape::Trapezoid,
                NodeShape::TrapezoidAlt,
            ]
        );
        assert_eq!(g.node("g").unwrap().label, "double");
    }

    #[test]
    fn parses_arrow_styles_and_labels() {
        let g = parse("graph LR\nA -.->|maybe| B\nB ==> C\nC --- D\nA <--> D\nD -- yes --> E").unwrap();
        assert_eq!(g.edges[0].style, EdgeStyle::Dotted);
        assert_eq!(g.edges[0].label.as_deref(), Some("maybe"));
        assert_eq!(g.edges[1].style, EdgeStyle::Thick);
        assert!(!g.edges[2].has_arrow_end);
        assert!(g.edges[3].has_arrow_start && g.edges[3].has_arrow_end);
        assert_eq!(g.edges[4].label.as_deref(), Some("yes"));
        assert_eq!(g.edges[4].target, "E");
    }

    #[test]
    fn text_arrow_needs_no_space_before_the_closing_half() {
        let g = parse("graph LR\nA-- text-->B\nB-. maybe.->C").unwrap();
        assert_eq!(g.edges[0].label.as_deref(), Some("text"));
        assert_eq!(g.edges[0].target, "B");
        assert!(g.edges[0].has_arrow_end);
        assert_eq!(g.edges[1].label.as_deref(), Some("maybe"));
        assert_eq!(g.edges[1].style, EdgeStyle::Dotted);
    }

    #[test]
    fn ampersand_groups_expand_to_all_pairs() {
        let g = parse("graph TD\nA & B --> C & D").unwrap();
        let pairs: Vec<_> = g
            .edges
            .iter()
            .map(|e| format!("{}{}", e.source, e.target))
            .collect();
        assert_eq!(pairs, vec!["AC", "AD", "BC", "BD"]);
    }

    #[test]
    fn quoted_labels_are_unquoted() {
        let g = parse("graph TD\nA[\"Hello (world)\"] -->|\"a|b\"| B").unwrap();
        assert_eq!(g.node("A").unwrap().label, "Hello (world)");
        assert_eq!(g.edges[0].label.as_deref(), Some("a|b"));
    }

    #[test]
    fn entities_decode_in_plain_labels() {
        let g = parse("graph TD\nA[plain #quot; text] -->|say #quot;hi#quot;| B").unwrap();
        assert_eq!(g.node("A").unwrap().label, "plain \" text");
        assert_eq!(g.edges[0].label.as_deref(), Some("say \"hi\""));
        assert_eq!(parse(&g.to_string()).unwrap(), g);
    }

    #[test]
    fn dangling_edge_is_an_error() {
        let err = parse("graph LR\nA --> ").unwrap_err();
        match err {
            RenderError::Syntax { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("dangling"), "{message}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn unbalanced_delimiters_are_an_error() {
        let err = parse("graph LR\nA[oops --> B").unwrap_err();
        assert!(err.to_string().contains("unbalanced"), "{err}");
    }

    #[test]
    fn trailing_garbage_is_an_error() {
        let err = parse("graph LR\nA --> B ???").unwrap_err();
        assert!(err.to_string().contains("unexpected"), "{err}");
    }

    #[test]
    fn later_explicit_declaration_wins() {
        let g = parse("graph TD\nA[first] --> B\nA(second)\nA --> C").unwrap();
        let a = g.node("A").unwrap();
        assert_eq!(a.label, "second");
        assert_eq!(a.shape, NodeShape::Rounded);
    }

    #[test]
    fn bare_reference_keeps_declaration() {
        let g = parse("graph TD\nB --> A\nA{Decide}\nC --> A").unwrap();
        assert_eq!(g.node("A").unwrap().shape, NodeShape::Diamond);
        assert_eq!(g.nodes[0].id, "B");
    }

    #[test]
    fn subgraphs_are_flattened() {
        let g = parse("graph LR\nsubgraph one [First]\ndirection TB\nA --> B\nend\nB --> C").unwrap();
        assert_eq!(g.nodes.len(), 3);
        assert!(g.node("one").is_none());
    }

    #[test]
    fn stray_end_is_an_error() {
        assert!(parse("graph LR\nA --> B\nend").is_err());
        assert!(parse("graph LR\nsubgraph s\nA --> B").is_err());
    }

    #[test]
    fn styles_merge_class_then_inline() {
        let src = "graph TD\n\
            classDef hot fill:#f00,color:#fff\n\
            A:::hot --> B\n\
            class B hot\n\
            style A fill:#0f0\n\
            style Z fill:#000";
        let g = parse(src).unwrap();
        let a = &g.styles["A"];
        assert_eq!(a["fill"], "#0f0");
        assert_eq!(a["color"], "#fff");
        assert_eq!(g.styles["B"]["fill"], "#f00");
        assert!(!g.styles.contains_key("Z"));
    }

    #[test]
    fn skips_interaction_statements() {
        let g = parse("graph TD\nA --> B\nclick A callback\nlinkStyle 0 stroke:#f00").unwrap();
        assert_eq!(g.edges.len(), 1);
    }

    #[test]
    fn dashed_ids_do_not_swallow_arrows() {
        let g = parse("graph LR\napi-v2-->db").unwrap();
        assert_eq!(g.nodes[0].id, "api-v2");
        assert_eq!(g.edges[0].target, "db");
    }

    #[test]
    fn longer_arrows_are_accepted() {
        let g = parse("graph LR\nA ---> B\nB -...-> C\nC ====> D").unwrap();
        assert_eq!(g.edges.len(), 3);
        assert_eq!(g.edges[1].style, EdgeStyle::Dotted);
        assert_eq!(g.edges[2].style, EdgeStyle::Thick);
    }
}
