//! On-screen keyboard geometry and hit testing.
//!
//! A layout is rebuilt from scratch every time the caps mode changes; the
//! returned `Vec<Button>` is a snapshot and is never patched in place.
//!
//! ```text
//!        ┌──┬──┬──┬──┬──┬──┬──┬──┬──┬──┐
//!        │1 │2 │3 │4 │5 │6 │7 │8 │9 │0 │         (caps mode only)
//!        └──┴──┴──┴──┴──┴──┴──┴──┴──┴──┘
//!           ┌──┬──┬──┬──┬──┬──┬──┬──┬──┬──┐
//!           │Q │W │E │R │T │Y │U │I │O │P │      rows stagger by
//!           └──┴──┴──┴──┴──┴──┴──┴──┴──┴──┘      half a key each
//!              ┌──┬──┬──┬──┬──┬──┬──┬──┬──┐
//!              │A │S │D │F │G │H │J │K │L │
//!              └──┴──┴──┴──┴──┴──┴──┴──┴──┘
//!                 ┌──┬──┬──┬──┬──┬──┬──┐
//!                 │Z │X │C │V │B │N │M │
//!                 └──┴──┴──┴──┴──┴──┴──┘
//!        ┌─────┬──────────────┬─────┐
//!        │Caps │    Space     │ <-  │
//!        └─────┴──────────────┴─────┘
//! ```

use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════
// Logical layouts
// ════════════════════════════════════════════════════════════════════════════

const LOWER_ROWS: [&str; 3] = ["qwertyuiop", "asdfghjkl", "zxcvbnm"];

const CAPS_ROWS: [&str; 4] = ["1234567890", "QWERTYUIOP", "ASDFGHJKL", "ZXCVBNM"];

/// Trailing row: key and its width in key units.
const SPECIAL_ROW: [(Key, i32); 3] = [
    (Key::Caps,      2),
    (Key::Space,     5),
    (Key::Backspace, 2),
];

// ════════════════════════════════════════════════════════════════════════════
// Key
// ════════════════════════════════════════════════════════════════════════════

/// What a button does when clicked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// Appends the character exactly as displayed.
    Char(char),
    /// Appends a single `' '`.
    Space,
    /// Toggles caps lock (and with it, the whole layout).
    Caps,
    /// Removes the last typed character.
    Backspace,
}

impl Key {
    /// Text drawn on the button face.
    pub fn label(&self) -> String {
        match self {
            Key::Char(c)   => c.to_string(),
            Key::Space     => "Space".to_string(),
            Key::Caps      => "Caps".to_string(),
            Key::Backspace => "<-".to_string(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Point / Button
// ════════════════════════════════════════════════════════════════════════════

/// A position in frame pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Point { x, y }
    }

    /// Euclidean distance in pixels.
    pub fn distance(&self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// An axis-aligned key rectangle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Button {
    pub key:    Key,
    pub x:      i32,
    pub y:      i32,
    pub width:  i32,
    pub height: i32,
}

impl Button {
    /// Half-open containment: `x <= px < x + width`, same for y.
    pub fn contains(&self, p: Point) -> bool {
        let (x0, y0) = (self.x as f32, self.y as f32);
        let (x1, y1) = (x0 + self.width as f32, y0 + self.height as f32);
        p.x >= x0 && p.x < x1 && p.y >= y0 && p.y < y1
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.x as f32 + self.width as f32 / 2.0,
            self.y as f32 + self.height as f32 / 2.0,
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LayoutGeometry
// ════════════════════════════════════════════════════════════════════════════

/// Fixed geometry constants for [`generate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutGeometry {
    /// Side of a standard square key, in pixels.
    pub key_size:     i32,
    pub gap:          i32,
    /// Width the widest row is centered in.
    pub screen_width: i32,
    /// Top edge of the first row.
    pub origin_y:     i32,
    /// Shift each character row right by half a key per row index.
    pub stagger:      bool,
}

impl Default for LayoutGeometry {
    fn default() -> Self {
        LayoutGeometry {
            key_size:     85,
            gap:          10,
            screen_width: 1280,
            origin_y:     100,
            stagger:      true,
        }
    }
}

impl LayoutGeometry {
    /// Pixel width of a key `units` standard keys wide (gaps included).
    pub fn span(&self, units: i32) -> i32 {
        units * self.key_size + (units - 1).max(0) * self.gap
    }

    fn pitch(&self) -> i32 {
        self.key_size + self.gap
    }

    fn row_offset(&self, row_idx: usize) -> i32 {
        if self.stagger { row_idx as i32 * self.key_size / 2 } else { 0 }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// generate / hit
// ════════════════════════════════════════════════════════════════════════════

/// Build the full button set for a caps mode.
///
/// Character rows come first in reading order, followed by the
/// `Caps` / `Space` / `<-` row.  Pure: identical inputs always give
/// identical geometry.
pub fn generate(caps_lock_on: bool, geometry: &LayoutGeometry) -> Vec<Button> {
    let rows: &[&str] = if caps_lock_on { &CAPS_ROWS } else { &LOWER_ROWS };
    let g = geometry;

    // Widest extent over all rows (stagger included) decides the left edge.
    let special_span: i32 = SPECIAL_ROW.iter().map(|&(_, u)| g.span(u)).sum::<i32>()
        + g.gap * (SPECIAL_ROW.len() as i32 - 1);
    let widest = rows.iter().enumerate()
        .map(|(r, row)| g.row_offset(r) + g.span(row.chars().count() as i32))
        .chain(std::iter::once(special_span))
        .max()
        .unwrap_or(0);
    let left = ((g.screen_width - widest) / 2).max(0);

    let mut buttons = Vec::with_capacity(rows.iter().map(|r| r.len()).sum::<usize>() + SPECIAL_ROW.len());

    for (row_idx, row) in rows.iter().enumerate() {
        let y = g.origin_y + row_idx as i32 * g.pitch();
        for (col_idx, ch) in row.chars().enumerate() {
            buttons.push(Button {
                key:    Key::Char(ch),
                x:      left + g.row_offset(row_idx) + col_idx as i32 * g.pitch(),
                y,
                width:  g.key_size,
                height: g.key_size,
            });
        }
    }

    let y = g.origin_y + rows.len() as i32 * g.pitch();
    let mut x = left;
    for &(key, units) in SPECIAL_ROW.iter() {
        let width = g.span(units);
        buttons.push(Button { key, x, y, width, height: g.key_size });
        x += width + g.gap;
    }

    buttons
}

/// The first button (in iteration order) containing `point`.
///
/// Buttons from [`generate`] never overlap; for hand-built collections that
/// do, the earliest match wins.
pub fn hit(point: Point, buttons: &[Button]) -> Option<&Button> {
    buttons.iter().find(|b| b.contains(point))
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
