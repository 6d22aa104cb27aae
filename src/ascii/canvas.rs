//! Character canvas that grows on write.
//!
//! Cells are addressed `canvas[x][y]`. Writes outside the current size
//! extend it; writes at negative coordinates are dropped.

use super::types::Canvas;

/// Create a blank canvas covering `0..=max_x` by `0..=max_y`
pub fn mk_canvas(max_x: usize, max_y: usize) -> Canvas {
    vec![vec![' '; max_y + 1]; max_x + 1]
}

/// Largest valid (x, y) on the canvas
pub fn get_canvas_size(canvas: &Canvas) -> (usize, usize) {
    let width = canvas.len();
    let height = canvas.first().map_or(0, Vec::len);
    (width.saturating_sub(1), height.saturating_sub(1))
}

/// A blank canvas of the same size, used as a drawing overlay
pub fn copy_canvas(source: &Canvas) -> Canvas {
    let (max_x, max_y) = get_canvas_size(source);
    mk_canvas(max_x, max_y)
}

fn grow(canvas: &mut Canvas, x: usize, y: usize) {
    let (_, max_y) = get_canvas_size(canvas);
    let height = max_y.max(y) + 1;
    if canvas.len() <= x {
        canvas.resize(x + 1, Vec::new());
    }
    for column in canvas.iter_mut() {
        column.resize(height, ' ');
    }
}

pub fn set_char(canvas: &mut Canvas, x: i32, y: i32, c: char) {
    let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) else {
        return;
    };
    if x >= canvas.len() || canvas.first().map_or(true, |col| y >= col.len()) {
        grow(canvas, x, y);
    }
    canvas[x][y] = c;
}

/// The glyph at (x, y); blank outside the canvas
pub fn get_char(canvas: &Canvas, x: i32, y: i32) -> char {
    let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) else {
        return ' ';
    };
    canvas
        .get(x)
        .and_then(|column| column.get(y))
        .copied()
        .unwrap_or(' ')
}

pub fn draw_text(canvas: &mut Canvas, x: i32, y: i32, text: &str) {
    for (i, c) in (0..).zip(text.chars()) {
        set_char(canvas, x + i, y, c);
    }
}

const UP: u8 = 1;
const DOWN: u8 = 2;
const LEFT: u8 = 4;
const RIGHT: u8 = 8;

/// Light box-drawing glyphs and the arms they reach out with.
const ARMS: [(char, u8); 11] = [
    ('─', LEFT | RIGHT),
    ('│', UP | DOWN),
    ('┌', DOWN | RIGHT),
    ('┐', DOWN | LEFT),
    ('└', UP | RIGHT),
    ('┘', UP | LEFT),
    ('├', UP | DOWN | RIGHT),
    ('┤', UP | DOWN | LEFT),
    ('┬', DOWN | LEFT | RIGHT),
    ('┴', UP | LEFT | RIGHT),
    ('┼', UP | DOWN | LEFT | RIGHT),
];

fn arms(c: char) -> Option<u8> {
    ARMS.iter().find(|&&(glyph, _)| glyph == c).map(|&(_, arms)| arms)
}

/// Combine two light box-drawing glyphs into the one carrying both sets of
/// arms. Anything else keeps the newer glyph.
pub fn merge_junctions(old: char, new: char) -> char {
    let (Some(a), Some(b)) = (arms(old), arms(new)) else {
        return new;
    };
    ARMS.iter()
        .find(|&&(_, arms)| arms == a | b)
        .map_or(new, |&(glyph, _)| glyph)
}

/// ASCII counterpart of [`merge_junctions`]: crossing lines become `+`,
/// arrowheads always stay on top.
pub fn merge_ascii_junctions(old: char, new: char) -> char {
    const ARROWS: [char; 4] = ['>', '<', '^', 'v'];
    const LINES: [char; 3] = ['-', '|', '+'];
    if ARROWS.contains(&old) && LINES.contains(&new) {
        old
    } else if ARROWS.contains(&new) {
        new
    } else if LINES.contains(&old) && LINES.contains(&new) && old != new {
        '+'
    } else {
        new
    }
}

/// Lay `overlay` over `base`. Blank overlay cells leave the base untouched;
/// lines meeting lines become junctions.
pub fn merge_canvases(base: &mut Canvas, overlay: &Canvas, use_ascii: bool) {
    for (x, column) in (0..).zip(overlay) {
        for (y, &c) in (0..).zip(column) {
            if c == ' ' {
                continue;
            }
            let current = get_char(base, x, y);
            let merged = if current == ' ' {
                c
            } else if use_ascii {
                merge_ascii_junctions(current, c)
            } else {
                merge_junctions(current, c)
            };
            set_char(base, x, y, merged);
        }
    }
}

/// Rows joined with `\n`, trailing spaces and trailing blank rows removed
pub fn canvas_to_string(canvas: &Canvas) -> String {
    let (max_x, max_y) = get_canvas_size(canvas);
    if canvas.is_empty() {
        return String::new();
    }
    let mut rows: Vec<String> = (0..=max_y)
        .map(|y| {
            let row: String = (0..=max_x).map(|x| canvas[x][y]).collect();
            row.trim_end().to_string()
        })
        .collect();
    while rows.last().is_some_and(String::is_empty) {
        rows.pop();
    }
    rows.join("\n")
}
