//! Integration tests: text fixtures, end-to-end scenarios and layout
//! properties.
//!
//! Each file in testdata/ascii/ and testdata/unicode/ gets its own test
//! function. Run all tests with: cargo test

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use mermaid_render::layout::RouteKind;
use mermaid_render::svg::theme;
use mermaid_render::{
    layout, parse, render_mermaid, render_mermaid_ascii, render_svg, AsciiRenderOptions,
    PositionedGraph, RenderError,
};

/// Get the path to the ASCII test data directory
fn get_ascii_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata/ascii")
}

/// Get the path to the Unicode test data directory
fn get_unicode_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata/unicode")
}

/// Parse a test file into (input, expected_output)
fn parse_test_file(content: &str) -> Option<(String, String)> {
    let (input, expected) = content.split_once("\n---\n")?;
    Some((input.to_string(), expected.trim_end().to_string()))
}

/// Normalize output for comparison (trim trailing whitespace from each line)
fn normalize_output(s: &str) -> String {
    s.lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}

fn run_test_file(test_file: &Path, test_name: &str, use_ascii: bool) {
    let content = fs::read_to_string(test_file)
        .unwrap_or_else(|e| panic!("Failed to read {:?}: {}", test_file, e));

    let (input, expected) = parse_test_file(&content)
        .unwrap_or_else(|| panic!("Failed to parse test file: {:?}", test_file));

    let options = AsciiRenderOptions {
        use_ascii,
        ..Default::default()
    };
    let actual = render_mermaid_ascii(&input, &options)
        .unwrap_or_else(|e| panic!("Failed to render {}: {}", test_name, e));

    let expected_normalized = normalize_output(&expected);
    let actual_normalized = normalize_output(&actual);

    if expected_normalized != actual_normalized {
        eprintln!("=== Test: {} ===", test_name);
        eprintln!("Input:\n{}", input);
        eprintln!("\n--- Expected ---\n{}", expected_normalized);
        eprintln!("\n--- Actual ---\n{}", actual_normalized);
        panic!("Output mismatch for test: {}", test_name);
    }
}

macro_rules! ascii_test {
    ($name:ident) => {
        paste::paste! {
            #[test]
            fn [<ascii_ $name>]() {
                let file = get_ascii_dir().join(concat!(stringify!($name), ".txt"));
                run_test_file(&file, stringify!($name), true);
            }
        }
    };
}

macro_rules! unicode_test {
    ($name:ident) => {
        paste::paste! {
            #[test]
            fn [<unicode_ $name>]() {
                let file = get_unicode_dir().join(concat!(stringify!($name), ".txt"));
                run_test_file(&file, stringify!($name), false);
            }
        }
    };
}

ascii_test!(ampersand_crossing);
ascii_test!(back_edge);
ascii_test!(edge_label_lr);
ascii_test!(fan_out);
ascii_test!(graph_td_direction);
ascii_test!(single_node);
ascii_test!(three_nodes_single_line);
ascii_test!(two_nodes_linked);

unicode_test!(ampersand_crossing);
unicode_test!(back_edge);
unicode_test!(bt_direction);
unicode_test!(comments);
unicode_test!(edge_label_lr);
unicode_test!(edge_label_td);
unicode_test!(fan_out);
unicode_test!(fan_out_lr);
unicode_test!(graph_td_direction);
unicode_test!(long_label_beside_fan);
unicode_test!(longer_label);
unicode_test!(rl_direction);
unicode_test!(self_loop);
unicode_test!(single_node);
unicode_test!(three_nodes_single_line);
unicode_test!(two_nodes_linked);

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn unicode_chain_has_three_boxes_and_two_arrows() {
    let out = render_mermaid_ascii("graph LR; A --> B --> C", &AsciiRenderOptions::default()).unwrap();
    assert_eq!(out.matches('►').count(), 2);
    assert_eq!(out.lines().next().unwrap().matches('┌').count(), 3);
}

#[test]
fn ascii_chain_uses_plain_structure_glyphs() {
    let options = AsciiRenderOptions {
        use_ascii: true,
        ..Default::default()
    };
    let out = render_mermaid_ascii("graph LR; A --> B --> C", &options).unwrap();
    let allowed: HashSet<char> = "+-|> ABC\n".chars().collect();
    assert!(out.chars().all(|c| allowed.contains(&c)), "{}", out);
}

fn svg_elements<'a>(doc: &'a roxmltree::Document<'a>, name: &str) -> Vec<roxmltree::Node<'a, 'a>> {
    doc.descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == name)
        .collect()
}

fn numbers(text: &str) -> Vec<f64> {
    text.split(|c: char| c == ' ' || c == ',')
        .filter_map(|tok| tok.parse::<f64>().ok())
        .collect()
}

#[test]
fn fan_out_svg_is_well_formed() {
    let svg = render_mermaid("graph TD; A --> B; A --> C", None).unwrap();
    let doc = roxmltree::Document::parse(&svg).expect("well-formed SVG");

    let root = doc.root_element();
    assert_eq!(root.tag_name().name(), "svg");
    let style = root.attribute("style").unwrap();
    assert!(style.contains("--bg:#FFFFFF"));
    assert!(style.contains("--surface:#ECECFF"));
    assert!(style.contains("--border:#9370DB"));

    let rects = svg_elements(&doc, "rect");
    assert_eq!(rects.len(), 3);
    let edges: Vec<_> = svg_elements(&doc, "path")
        .into_iter()
        .filter(|p| p.attribute("marker-end").is_some())
        .collect();
    assert_eq!(edges.len(), 2);
    assert_eq!(svg_elements(&doc, "path").len(), 2);

    let view_box = numbers(root.attribute("viewBox").unwrap());
    let (width, height) = (view_box[2], view_box[3]);
    for rect in &rects {
        let x: f64 = rect.attribute("x").unwrap().parse().unwrap();
        let y: f64 = rect.attribute("y").unwrap().parse().unwrap();
        let w: f64 = rect.attribute("width").unwrap().parse().unwrap();
        let h: f64 = rect.attribute("height").unwrap().parse().unwrap();
        assert!(x >= 0.0 && y >= 0.0 && x + w <= width && y + h <= height);
    }
    for path in &edges {
        let coords = numbers(path.attribute("d").unwrap());
        for pair in coords.chunks(2) {
            assert!(pair[0] >= 0.0 && pair[0] <= width);
            assert!(pair[1] >= 0.0 && pair[1] <= height);
        }
    }
}

#[test]
fn dangling_edge_is_a_syntax_error() {
    let err = parse("graph LR; A --> ").unwrap_err();
    assert!(matches!(err, RenderError::Syntax { .. }), "{err}");
}

#[test]
fn unknown_theme_is_rejected() {
    assert!(matches!(theme::resolve(Some("no-such-theme")), Err(RenderError::Theme(_))));
}

#[test]
fn empty_source_is_a_cli_usage_error() {
    use clap::Parser;
    let args = mermaid_render::cli::Args::try_parse_from(["mermaid-render", "ascii", ""]).unwrap();
    let mut out = Vec::new();
    let err = mermaid_render::cli::run(&args, None, &mut out).unwrap_err();
    assert!(matches!(err, RenderError::Usage(_)));
    assert!(out.is_empty());
}

// =============================================================================
// Properties
// =============================================================================

const SAMPLES: &[&str] = &[
    "graph TD\nA --> B\nA --> C\nB --> D\nC --> D",
    "graph LR\nA[Start] --> B{Check}\nB -->|yes| C([Done])\nB -.->|no| A",
    "graph BT\nA --> B --> C --> A\nC --> C",
    "graph RL\nA & B --> C & D\nD ==> A",
    "flowchart TD\nA((one)) --> B[[two]] --> C[(three)]\nA --> C\nstyle B fill:#f9f,stroke:#333",
    "graph TD\nA --> B --> C --> D --> E\nA --> E\nE --> B",
];

fn positioned(source: &str) -> PositionedGraph {
    layout(&parse(source).unwrap()).unwrap()
}

#[test]
fn display_reparses_to_the_same_graph() {
    for source in SAMPLES {
        let graph = parse(source).unwrap();
        let reparsed = parse(&graph.to_string()).unwrap();
        assert_eq!(graph, reparsed, "{}", graph);
    }
}

#[test]
fn layout_is_deterministic() {
    for source in SAMPLES {
        let first = serde_json::to_string(&positioned(source)).unwrap();
        let second = serde_json::to_string(&positioned(source)).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn layers_follow_the_acyclic_reduction() {
    for source in SAMPLES {
        let pg = positioned(source);
        for route in &pg.edges {
            let (u, v) = (pg.nodes[route.source].layer, pg.nodes[route.target].layer);
            match route.kind {
                RouteKind::Forward => assert!(v > u, "{source}"),
                RouteKind::Reversed => assert!(u > v, "{source}"),
                RouteKind::SelfLoop => assert_eq!(route.source, route.target),
            }
        }
    }
}

#[test]
fn nodes_and_waypoints_never_share_a_cell() {
    for source in SAMPLES {
        let pg = positioned(source);
        let mut seen = HashSet::new();
        for cell in pg.nodes.iter().map(|n| n.pos).chain(pg.waypoints()) {
            assert!(seen.insert(cell), "{source}: {:?} used twice", cell);
        }
    }
}

#[test]
fn output_is_deterministic() {
    for source in SAMPLES {
        let pg = positioned(source);
        assert_eq!(render_svg(&pg, None), render_svg(&pg, None));
        let options = AsciiRenderOptions::default();
        assert_eq!(
            mermaid_render::render_ascii(&pg, &options),
            mermaid_render::render_ascii(&positioned(source), &options)
        );
    }
}

// =============================================================================
// Themes
// =============================================================================

macro_rules! theme_test {
    ($name:ident => $theme:literal) => {
        paste::paste! {
            #[test]
            fn [<theme_ $name>]() {
                let theme = theme::lookup($theme).unwrap();
                let svg = render_mermaid("graph LR\nA -->|go| B", Some(theme)).unwrap();
                let doc = roxmltree::Document::parse(&svg).unwrap();
                let style = doc.root_element().attribute("style").unwrap();
                assert!(style.contains(&format!("--bg:{}", theme.bg)));
                assert!(style.contains(&format!("--fg:{}", theme.fg)));
            }
        }
    };
}

theme_test!(default => "default");
theme_test!(dark => "dark");
theme_test!(zinc_light => "zinc-light");
theme_test!(zinc_dark => "zinc-dark");
theme_test!(tokyo_night => "tokyo-night");
theme_test!(tokyo_night_storm => "tokyo-night-storm");
theme_test!(tokyo_night_light => "tokyo-night-light");
theme_test!(catppuccin_mocha => "catppuccin-mocha");
theme_test!(catppuccin_latte => "catppuccin-latte");
theme_test!(nord => "nord");
theme_test!(nord_light => "nord-light");
theme_test!(dracula => "dracula");
theme_test!(github_light => "github-light");
theme_test!(github_dark => "github-dark");
theme_test!(solarized_light => "solarized-light");
theme_test!(solarized_dark => "solarized-dark");
theme_test!(one_dark => "one-dark");

// =============================================================================
// CLI
// =============================================================================

#[test]
fn cli_writes_svg_file() {
    use clap::Parser;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("diagram.svg");
    let args = mermaid_render::cli::Args::try_parse_from([
        "mermaid-render",
        "svg",
        "graph LR\\nA --> B",
        "--transparent",
        "--output",
        path.to_str().unwrap(),
    ])
    .unwrap();
    let mut out = Vec::new();
    mermaid_render::cli::run(&args, None, &mut out).unwrap();
    assert!(String::from_utf8(out).unwrap().starts_with("SVG written to "));
    let svg = fs::read_to_string(&path).unwrap();
    assert!(roxmltree::Document::parse(&svg).is_ok());
    assert!(!svg.contains("background:var(--bg)"));
}
