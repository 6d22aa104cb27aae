//! ASCII renderer type definitions

/// Character-level coordinate on the 2D text canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawingCoord {
    pub x: i32,
    pub y: i32,
}

impl DrawingCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Direction of travel along a straight segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heading {
    Up,
    Down,
    Left,
    Right,
}

impl Heading {
    /// Heading from `from` to `to`. Segments are axis-aligned; a vertical
    /// component wins when both differ.
    pub fn between(from: DrawingCoord, to: DrawingCoord) -> Self {
        if to.y < from.y {
            Heading::Up
        } else if to.y > from.y {
            Heading::Down
        } else if to.x < from.x {
            Heading::Left
        } else {
            Heading::Right
        }
    }

    pub fn reverse(self) -> Self {
        match self {
            Heading::Up => Heading::Down,
            Heading::Down => Heading::Up,
            Heading::Left => Heading::Right,
            Heading::Right => Heading::Left,
        }
    }
}

/// A node box on the canvas: top-left corner plus size, borders included
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// 2D text canvas, column-major (canvas[x][y])
pub type Canvas = Vec<Vec<char>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_follows_the_segment() {
        let origin = DrawingCoord::new(2, 2);
        assert_eq!(Heading::between(origin, DrawingCoord::new(2, 0)), Heading::Up);
        assert_eq!(Heading::between(origin, DrawingCoord::new(5, 2)), Heading::Right);
        assert_eq!(Heading::between(origin, DrawingCoord::new(0, 2)).reverse(), Heading::Right);
        assert_eq!(Heading::Down.reverse(), Heading::Up);
    }
}
