//! Pixel-space types for SVG rendering.

use crate::types::{EdgeStyle, NodeShape};

/// A point in SVG user units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A node shape placed on the canvas, top-left corner plus size
#[derive(Debug, Clone, PartialEq)]
pub struct NodeBox<'a> {
    pub label: &'a str,
    pub shape: NodeShape,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NodeBox<'_> {
    pub fn centre(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// How an edge path is drawn
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeGeometry {
    /// Straight orthogonal segments through the points
    Orthogonal(Vec<Point>),
    /// A smooth curve through the points
    Curve(Vec<Point>),
    /// A cubic loop: start, two control points, end
    Loop([Point; 4]),
}

/// An edge ready to be written out
#[derive(Debug, Clone, PartialEq)]
pub struct EdgePath<'a> {
    pub geometry: EdgeGeometry,
    pub style: EdgeStyle,
    pub has_arrow_start: bool,
    pub has_arrow_end: bool,
    pub label: Option<(&'a str, Point)>,
}
