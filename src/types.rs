//! Type definitions for Mermaid flowchart graphs

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// The direction of a flowchart/graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    TD, // Top-Down (TB is parsed as TD)
    LR, // Left-Right
    BT, // Bottom-Top
    RL, // Right-Left
}

impl Direction {
    /// True when layers stack vertically (TD, BT).
    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::TD | Direction::BT)
    }

    /// True when layer 0 sits at the far end of the axis (BT, RL).
    pub fn is_reversed(self) -> bool {
        matches!(self, Direction::BT | Direction::RL)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::TD => "TD",
            Direction::LR => "LR",
            Direction::BT => "BT",
            Direction::RL => "RL",
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "TD" | "TB" => Ok(Direction::TD),
            "LR" => Ok(Direction::LR),
            "BT" => Ok(Direction::BT),
            "RL" => Ok(Direction::RL),
            other => Err(format!("Invalid direction: {}", other)),
        }
    }
}

/// Shape of a node in the diagram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeShape {
    Rectangle,    // [text]
    Rounded,      // (text)
    Diamond,      // {text}
    Stadium,      // ([text])
    Circle,       // ((text))
    Subroutine,   // [[text]]
    DoubleCircle, // (((text)))
    Hexagon,      // {{text}}
    Cylinder,     // [(text)]
    Asymmetric,   // >text]
    Trapezoid,    // [/text\]
    TrapezoidAlt, // [\text/]
}

impl NodeShape {
    /// Opening and closing delimiters of the shape in flowchart syntax.
    pub fn delimiters(self) -> (&'static str, &'static str) {
        match self {
            NodeShape::Rectangle => ("[", "]"),
            NodeShape::Rounded => ("(", ")"),
            NodeShape::Diamond => ("{", "}"),
            NodeShape::Stadium => ("([", "])"),
            NodeShape::Circle => ("((", "))"),
            NodeShape::Subroutine => ("[[", "]]"),
            NodeShape::DoubleCircle => ("(((", ")))"),
            NodeShape::Hexagon => ("{{", "}}"),
            NodeShape::Cylinder => ("[(", ")]"),
            NodeShape::Asymmetric => (">", "]"),
            NodeShape::Trapezoid => ("[/", "\\]"),
            NodeShape::TrapezoidAlt => ("[\\", "/]"),
        }
    }
}

/// Style of an edge/connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeStyle {
    Solid,
    Dotted,
    Thick,
}

/// A node in the Mermaid graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub shape: NodeShape,
}

impl Node {
    /// A bare node: label equals the id, rectangle shape.
    pub fn bare(id: &str) -> Self {
        Self {
            id: id.to_string(),
            label: id.to_string(),
            shape: NodeShape::Rectangle,
        }
    }
}

/// An edge between two nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub label: Option<String>,
    pub style: EdgeStyle,
    pub has_arrow_start: bool,
    pub has_arrow_end: bool,
}

impl Edge {
    /// A solid edge with an arrowhead at the target.
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            label: None,
            style: EdgeStyle::Solid,
            has_arrow_start: false,
            has_arrow_end: true,
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    /// The arrow operator that declares this edge, e.g. `-->` or `<-.->`.
    pub fn arrow_op(&self) -> String {
        let body = match (self.style, self.has_arrow_end) {
            (EdgeStyle::Solid, true) => "-->",
            (EdgeStyle::Solid, false) => "---",
            (EdgeStyle::Dotted, true) => "-.->",
            (EdgeStyle::Dotted, false) => "-.-",
            (EdgeStyle::Thick, true) => "==>",
            (EdgeStyle::Thick, false) => "===",
        };
        if self.has_arrow_start {
            format!("<{}", body)
        } else {
            body.to_string()
        }
    }
}

/// Inline style properties of a node (`fill`, `stroke`, `color`, ...)
pub type StyleProps = BTreeMap<String, String>;

/// The complete parsed flowchart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Graph {
    pub direction: Direction,
    /// Nodes in order of first reference
    pub nodes: Vec<Node>,
    /// Edges in declaration order
    pub edges: Vec<Edge>,
    /// Resolved inline styles per node id
    pub styles: BTreeMap<String, StyleProps>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl Graph {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            nodes: Vec::new(),
            edges: Vec::new(),
            styles: BTreeMap::new(),
            index: HashMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        match self.index.get(id) {
            Some(&i) => Some(&mut self.nodes[i]),
            None => None,
        }
    }

    /// Position of a node in declaration order.
    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Insert a node unless its id is already present. Returns its index.
    pub fn add_node(&mut self, node: Node) -> usize {
        if let Some(&i) = self.index.get(&node.id) {
            return i;
        }
        let i = self.nodes.len();
        self.index.insert(node.id.clone(), i);
        self.nodes.push(node);
        i
    }

    pub fn add_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    /// Check that every edge endpoint names an existing node.
    pub fn validate(&self) -> Result<(), String> {
        for edge in &self.edges {
            for end in [&edge.source, &edge.target] {
                if !self.index.contains_key(end) {
                    return Err(format!(
                        "edge {} {} {} references unknown node \"{}\"",
                        edge.source,
                        edge.arrow_op(),
                        edge.target,
                        end
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Escape a label so it survives re-parsing inside double quotes.
fn quote_label(label: &str) -> String {
    format!("\"{}\"", label.replace('"', "#quot;"))
}

/// Canonical flowchart source: header, node declarations, edges, styles.
impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "graph {}", self.direction.as_str())?;
        for node in &self.nodes {
            let (open, close) = node.shape.delimiters();
            writeln!(f, "    {}{}{}{}", node.id, open, quote_label(&node.label), close)?;
        }
        for edge in &self.edges {
            match &edge.label {
                Some(label) => writeln!(
                    f,
                    "    {} {}|{}| {}",
                    edge.source,
                    edge.arrow_op(),
                    quote_label(label),
                    edge.target
                )?,
                None => writeln!(f, "    {} {} {}", edge.source, edge.arrow_op(), edge.target)?,
            }
        }
        for (id, props) in &self.styles {
            let props = props
                .iter()
                .map(|(k, v)| format!("{}:{}", k, v))
                .collect::<Vec<_>>()
                .join(",");
            writeln!(f, "    style {} {}", id, props)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_accepts_tb_alias() {
        assert_eq!("tb".parse::<Direction>(), Ok(Direction::TD));
        assert_eq!("RL".parse::<Direction>(), Ok(Direction::RL));
        assert!("XY".parse::<Direction>().is_err());
    }

    #[test]
    fn add_node_keeps_first_insertion() {
        let mut g = Graph::new(Direction::LR);
        assert_eq!(g.add_node(Node::bare("A")), 0);
        assert_eq!(g.add_node(Node::bare("B")), 1);
        assert_eq!(g.add_node(Node::bare("A")), 0);
        assert_eq!(g.nodes.len(), 2);
        assert_eq!(g.node_index("B"), Some(1));
    }

    #[test]
    fn validate_rejects_unknown_endpoint() {
        let mut g = Graph::new(Direction::TD);
        g.add_node(Node::bare("A"));
        g.add_edge(Edge::new("A", "Z"));
        let err = g.validate().unwrap_err();
        assert!(err.contains("\"Z\""));
    }

    #[test]
    fn arrow_ops_cover_styles() {
        let mut e = Edge::new("A", "B");
        assert_eq!(e.arrow_op(), "-->");
        e.style = EdgeStyle::Dotted;
        e.has_arrow_start = true;
        assert_eq!(e.arrow_op(), "<-.->");
        e.style = EdgeStyle::Thick;
        e.has_arrow_start = false;
        e.has_arrow_end = false;
        assert_eq!(e.arrow_op(), "===");
    }

    #[test]
    fn display_writes_header_nodes_and_edges() {
        let mut g = Graph::new(Direction::LR);
        g.add_node(Node {
            id: "A".into(),
            label: "Start".into(),
            shape: NodeShape::Rounded,
        });
        g.add_node(Node::bare("B"));
        let mut e = Edge::new("A", "B");
        e.label = Some("go".into());
        g.add_edge(e);
        let text = g.to_string();
        assert!(text.starts_with("graph LR\n"));
        assert!(text.contains("A(\"Start\")"));
        assert!(text.contains("A -->|\"go\"| B"));
    }
}
