//! Font metrics, styling and spacing constants.
//!
//! Calibrated for Inter font with fallback to system UI fonts.

/// Average character width in px at the given font size and weight
pub fn estimate_text_width(text: &str, font_size: f64, font_weight: u32) -> f64 {
    // Inter average character widths as fraction of fontSize, per weight.
    // Heavier weights are slightly wider.
    let width_ratio = if font_weight >= 600 {
        0.58
    } else if font_weight >= 500 {
        0.55
    } else {
        0.52
    };
    text.chars().count() as f64 * font_size * width_ratio
}

/// Font sizes relative to the theme's base size (in px)
pub struct FontSizes;

impl FontSizes {
    /// Edge labels are drawn this much smaller than node labels
    pub const EDGE_LABEL_DELTA: f64 = 2.0;
}

/// Font weights used per element type
pub struct FontWeights;

impl FontWeights {
    pub const NODE_LABEL: u32 = 500;
    pub const EDGE_LABEL: u32 = 400;
}

/// Stroke widths per element type (in px)
pub struct StrokeWidths;

impl StrokeWidths {
    pub const INNER_BOX: f64 = 0.75;
    pub const CONNECTOR: f64 = 0.75;
}

/// Arrow head dimensions
pub struct ArrowHead;

impl ArrowHead {
    pub const WIDTH: f64 = 8.0;
    pub const HEIGHT: f64 = 4.8;
}

/// Distances used when mapping grid cells to pixels
pub struct Spacing;

impl Spacing {
    /// Space around the whole drawing
    pub const MARGIN: f64 = 40.0;
    /// Horizontal padding between label and node border
    pub const NODE_PAD_X: f64 = 16.0;
    pub const NODE_HEIGHT: f64 = 36.0;
    pub const MIN_NODE_WIDTH: f64 = 60.0;
    /// Minimum distance between neighbouring ports on one side
    pub const PORT_GAP: f64 = 16.0;
    /// Gap between cells across the flow
    pub const CROSS_GAP: f64 = 40.0;
    /// Gap between cells along the flow, before tracks are added
    pub const FLOW_GAP: f64 = 50.0;
    /// Distance between neighbouring channel tracks
    pub const TRACK: f64 = 10.0;
    /// Reach of the innermost self-loop, and the step between nested ones
    pub const LOOP_REACH: f64 = 24.0;
    pub const LOOP_STEP: f64 = 12.0;
    /// Padding inside the edge label background
    pub const LABEL_PAD: f64 = 8.0;
}

/// Vertical shift applied to all text elements for font-agnostic centering.
/// Using 0.35em ensures it scales with font size.
pub const TEXT_BASELINE_SHIFT: &str = "0.35em";
