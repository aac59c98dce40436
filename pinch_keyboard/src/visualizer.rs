//! Software-rendered visualizer using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │   ┌──────────────────────────────────────────────┐    CAPS   │
//! │   │ typed text_                                  │           │
//! │   └──────────────────────────────────────────────┘           │
//! │        [ keyboard rows over the live video ]                 │
//! │                                                              │
//! │        [ Caps ][        Space        ][ <- ]                 │
//! │                                                              │
//! │  status bar                                                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use std::sync::mpsc::Sender;

use anyhow::{anyhow, Result};
use minifb::{Key as WinKey, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use pinch_core::Point;

use crate::camera::Frame;
use crate::config::DisplayConfig;
use crate::hand::{landmarks, SimInput};
use crate::surface::{ButtonStyle, Scene, Surface, SurfaceEvent};

// ════════════════════════════════════════════════════════════════════════════
// Palette
// ════════════════════════════════════════════════════════════════════════════

const BG_COLOR:       u32 = 0x001A1A2E;
const KEY_IDLE:       u32 = 0x00323232;
const KEY_HOVER:      u32 = 0x00646464;
const KEY_PRESSED:    u32 = 0x0000AA55;
const KEY_BORDER:     u32 = 0x00A0A0A0;
const LABEL_COLOR:    u32 = 0x00FFFFFF;
const TEXT_BG:        u32 = 0x000F3460;
const CAPS_COLOR:     u32 = 0x00FFD700;  // gold
const LANDMARK_COLOR: u32 = 0x00FF3030;
const BONE_COLOR:     u32 = 0x00E0E0E0;
const TIP_COLOR:      u32 = 0x00FF00FF;
const PINCH_OPEN:     u32 = 0x00FFFFFF;
const PINCH_CLOSED:   u32 = 0x0000FF00;

const TEXT_BAR_Y:     i32 = 16;
const TEXT_BAR_H:     i32 = 64;
const STATUS_H:       i32 = 28;

/// Bone list of the 21-point hand model.
const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (0, 1), (1, 2), (2, 3), (3, 4),
    (0, 5), (5, 6), (6, 7), (7, 8),
    (5, 9), (9, 10), (10, 11), (11, 12),
    (9, 13), (13, 14), (14, 15), (15, 16),
    (13, 17), (0, 17), (17, 18), (18, 19), (19, 20),
];

// ════════════════════════════════════════════════════════════════════════════
// Canvas: pure framebuffer drawing
// ════════════════════════════════════════════════════════════════════════════

/// A `0x00RRGGBB` framebuffer plus the drawing primitives the keyboard uses.
pub struct Canvas {
    pub width:  usize,
    pub height: usize,
    pub buf:    Vec<u32>,
    /// Help line drawn under the status bar text.
    pub legend: String,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Canvas { width, height, buf: vec![BG_COLOR; width * height], legend: String::new() }
    }

    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.buf[y * self.width + x]
    }

    /// Draw one complete frame.
    pub fn render(&mut self, scene: &Scene) {
        // ── Video ─────────────────────────────────────────────────────────
        self.blit(scene.frame);

        // ── Keys ──────────────────────────────────────────────────────────
        for button in scene.buttons {
            let (color, alpha) = match scene.style(button) {
                ButtonStyle::Idle    => (KEY_IDLE,    0.65),
                ButtonStyle::Hovered => (KEY_HOVER,   0.80),
                ButtonStyle::Pressed => (KEY_PRESSED, 0.90),
            };
            self.blend_rect(button.x, button.y, button.width, button.height, color, alpha);
            self.draw_border(button.x, button.y, button.width, button.height, KEY_BORDER);

            let label = button.key.label();
            let scale = fit_scale(&label, button.width - 12, 6);
            let tw = text_width(&label, scale);
            let tx = button.x + (button.width - tw) / 2;
            let ty = button.y + (button.height - 5 * scale) / 2;
            self.draw_text(&label, tx, ty, scale, LABEL_COLOR);
        }

        // ── Typed text bar ────────────────────────────────────────────────
        let bar_x = 40;
        let bar_w = self.width as i32 - 2 * bar_x;
        self.blend_rect(bar_x, TEXT_BAR_Y, bar_w, TEXT_BAR_H, TEXT_BG, 0.85);
        let scale = 5;
        let shown = tail_that_fits(scene.typed_text, bar_w - 24 - 4 * scale, scale);
        let line = format!("{}_", shown);
        self.draw_text(&line, bar_x + 12, TEXT_BAR_Y + (TEXT_BAR_H - 5 * scale) / 2, scale, LABEL_COLOR);

        if scene.caps_lock_on {
            let w = text_width("CAPS", 3);
            self.draw_text("CAPS", bar_x + bar_w - w - 12, TEXT_BAR_Y + 4, 3, CAPS_COLOR);
        }

        // ── Hand ──────────────────────────────────────────────────────────
        if scene.landmarks.len() == landmarks::COUNT {
            for &(a, b) in HAND_CONNECTIONS.iter() {
                self.draw_line(scene.landmarks[a], scene.landmarks[b], BONE_COLOR);
            }
        }
        for &p in scene.landmarks {
            self.fill_circle(p, 4, LANDMARK_COLOR);
        }
        if let Some(pose) = scene.pose {
            let line_color = if scene.pinched { PINCH_CLOSED } else { PINCH_OPEN };
            self.draw_line(pose.index_tip, pose.thumb_tip, line_color);
            self.fill_circle(pose.index_tip, 8, TIP_COLOR);
            self.fill_circle(pose.thumb_tip, 8, TIP_COLOR);
        }

        // ── Status bar ────────────────────────────────────────────────────
        let sy = self.height as i32 - STATUS_H;
        self.blend_rect(0, sy, self.width as i32, STATUS_H, TEXT_BG, 0.85);
        self.draw_text(scene.status, 10, sy + 4, 2, 0x00EEEEEE);
        let legend = std::mem::take(&mut self.legend);
        self.draw_text(&legend, 10, sy + 18, 1, 0x00888888);
        self.legend = legend;
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn blit(&mut self, frame: &Frame) {
        self.buf.fill(BG_COLOR);
        let w = frame.width.min(self.width);
        for y in 0..frame.height.min(self.height) {
            let src = &frame.pixels[y * frame.width..y * frame.width + w];
            self.buf[y * self.width..y * self.width + w].copy_from_slice(src);
        }
    }

    /// Clip a rectangle to the buffer; `None` if nothing is visible.
    fn clip(&self, x: i32, y: i32, w: i32, h: i32) -> Option<(usize, usize, usize, usize)> {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + w).min(self.width as i32);
        let y1 = (y + h).min(self.height as i32);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as usize, y0 as usize, x1 as usize, y1 as usize))
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32) {
        if let Some((x0, y0, x1, y1)) = self.clip(x, y, w, h) {
            for row in y0..y1 {
                self.buf[row * self.width + x0..row * self.width + x1].fill(color);
            }
        }
    }

    fn blend_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32, alpha: f32) {
        if let Some((x0, y0, x1, y1)) = self.clip(x, y, w, h) {
            for row in y0..y1 {
                for px in &mut self.buf[row * self.width + x0..row * self.width + x1] {
                    *px = blend(*px, color, alpha);
                }
            }
        }
    }

    fn draw_border(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32) {
        self.fill_rect(x, y, w, 1, color);
        self.fill_rect(x, y + h - 1, w, 1, color);
        self.fill_rect(x, y, 1, h, color);
        self.fill_rect(x + w - 1, y, 1, h, color);
    }

    fn set_pixel(&mut self, x: i32, y: i32, color: u32) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.buf[y as usize * self.width + x as usize] = color;
        }
    }

    /// Bresenham, two pixels thick.
    fn draw_line(&mut self, a: Point, b: Point, color: u32) {
        let (mut x0, mut y0) = (a.x as i32, a.y as i32);
        let (x1, y1) = (b.x as i32, b.y as i32);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.set_pixel(x0, y0, color);
            self.set_pixel(x0 + 1, y0, color);
            if x0 == x1 && y0 == y1 { break; }
            let e2 = 2 * err;
            if e2 >= dy { err += dy; x0 += sx; }
            if e2 <= dx { err += dx; y0 += sy; }
        }
    }

    fn fill_circle(&mut self, c: Point, r: i32, color: u32) {
        let (cx, cy) = (c.x as i32, c.y as i32);
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy <= r * r {
                    self.set_pixel(cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// 3×5 bitmap font, each font pixel drawn as a `scale`×`scale` block.
    fn draw_text(&mut self, text: &str, x: i32, y: i32, scale: i32, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3 {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row as i32 * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale; // 3 wide + 1 gap
            if cx >= self.width as i32 { break; }
        }
    }
}

/// Pixel width of `text` at `scale`.
pub fn text_width(text: &str, scale: i32) -> i32 {
    let n = text.chars().count() as i32;
    if n == 0 { 0 } else { n * 4 * scale - scale }
}

/// Largest scale ≤ `max` at which `text` fits in `width` (at least 1).
fn fit_scale(text: &str, width: i32, max: i32) -> i32 {
    (1..=max).rev().find(|&s| text_width(text, s) <= width).unwrap_or(1)
}

/// The longest suffix of `text` that fits in `width` at `scale`.
fn tail_that_fits(text: &str, width: i32, scale: i32) -> &str {
    let max_chars = ((width + scale) / (4 * scale)).max(0) as usize;
    let count = text.chars().count();
    if count <= max_chars {
        return text;
    }
    let skip = count - max_chars;
    let start = text.char_indices().nth(skip).map(|(i, _)| i).unwrap_or(text.len());
    &text[start..]
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer: the window
// ════════════════════════════════════════════════════════════════════════════

/// `minifb` window implementing [`Surface`].
///
/// In simulation mode it also forwards the mouse as [`SimInput`] to the
/// simulated hand detector.
pub struct Visualizer {
    window: Window,
    canvas: Canvas,
    sim_tx: Option<Sender<SimInput>>,
}

impl Visualizer {
    /// Open the window.  Failure is fatal for the application.
    pub fn new(cfg: &DisplayConfig, sim_tx: Option<Sender<SimInput>>) -> Result<Self> {
        let mut window = Window::new(
            &cfg.title,
            cfg.width, cfg.height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| anyhow!("failed to open {}x{} window: {}", cfg.width, cfg.height, e))?;

        window.set_target_fps(cfg.target_fps.max(1));

        let mut canvas = Canvas::new(cfg.width, cfg.height);
        canvas.legend = if sim_tx.is_some() {
            "mouse = index finger   hold left button = pinch   Q/Esc = quit".to_string()
        } else {
            "pinch index finger and thumb over a key   Q/Esc = quit".to_string()
        };

        Ok(Visualizer { window, canvas, sim_tx })
    }
}

impl Surface for Visualizer {
    fn poll_events(&mut self) -> Vec<SurfaceEvent> {
        let mut events = Vec::new();

        if !self.window.is_open()
            || self.window.is_key_pressed(WinKey::Q, KeyRepeat::No)
            || self.window.is_key_pressed(WinKey::Escape, KeyRepeat::No)
        {
            events.push(SurfaceEvent::Quit);
        }

        if let Some(tx) = &self.sim_tx {
            let input = match self.window.get_mouse_pos(MouseMode::Discard) {
                Some((x, y)) => SimInput::Pointer {
                    x, y,
                    pinched: self.window.get_mouse_down(MouseButton::Left),
                },
                None => SimInput::PointerLost,
            };
            let _ = tx.send(input);
        }

        events
    }

    fn present(&mut self, scene: &Scene) -> Result<()> {
        self.canvas.render(scene);
        self.window
            .update_with_buffer(&self.canvas.buf, self.canvas.width, self.canvas.height)
            .map_err(|e| anyhow!("window update failed: {}", e))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Font and colour helpers
// ────────────────────────────────────────────────────────────────────────────

/// 3×5 glyphs, one `u8` per row with the leftmost column in bit 2.
const DIGITS: [[u8; 5]; 10] = [
    [7, 5, 5, 5, 7], [2, 6, 2, 2, 7], [7, 1, 7, 4, 7], [7, 1, 7, 1, 7], [5, 5, 7, 1, 1],
    [7, 4, 7, 1, 7], [7, 4, 7, 5, 7], [7, 1, 1, 1, 1], [7, 5, 7, 5, 7], [7, 5, 7, 1, 7],
];

/// Letters are drawn in one case; `a` and `A` share a glyph.
const LETTERS: [[u8; 5]; 26] = [
    [7, 5, 7, 5, 5], [6, 5, 6, 5, 6], [7, 4, 4, 4, 7], [6, 5, 5, 5, 6], // A B C D
    [7, 4, 7, 4, 7], [7, 4, 7, 4, 4], [7, 4, 5, 5, 7], [5, 5, 7, 5, 5], // E F G H
    [7, 2, 2, 2, 7], [1, 1, 1, 5, 7], [5, 5, 6, 5, 5], [4, 4, 4, 4, 7], // I J K L
    [5, 7, 5, 5, 5], [6, 5, 5, 5, 5], [7, 5, 5, 5, 7], [7, 5, 7, 4, 4], // M N O P
    [7, 5, 5, 7, 1], [6, 5, 6, 5, 5], [7, 4, 7, 1, 7], [7, 2, 2, 2, 2], // Q R S T
    [5, 5, 5, 5, 7], [5, 5, 5, 2, 2], [5, 5, 5, 7, 5], [5, 5, 2, 5, 5], // U V W X
    [5, 5, 7, 2, 2], [7, 1, 2, 4, 7],                                   // Y Z
];

const UNKNOWN_GLYPH: [u8; 5] = [0, 0, 2, 0, 0];

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0'..='9' => DIGITS[(c as u8 - b'0') as usize],
        'a'..='z' | 'A'..='Z' => LETTERS[(c.to_ascii_uppercase() as u8 - b'A') as usize],
        '<' => [1, 2, 4, 2, 1],
        '>' => [4, 2, 1, 2, 4],
        '_' => [0, 0, 0, 0, 7],
        '"' => [5, 5, 0, 0, 0],
        '/' => [1, 1, 2, 4, 4],
        '-' => [0, 0, 7, 0, 0],
        '.' => [0, 0, 0, 0, 2],
        ',' => [0, 0, 0, 2, 4],
        ':' => [0, 2, 0, 2, 0],
        '=' => [0, 7, 0, 7, 0],
        '+' => [0, 2, 7, 2, 0],
        ' ' => [0; 5],
        _   => UNKNOWN_GLYPH,
    }
}

/// Composite `over` onto `under` with opacity `alpha`, channel by channel.
fn blend(under: u32, over: u32, alpha: f32) -> u32 {
    let alpha = alpha.clamp(0.0, 1.0);
    [16u32, 8, 0].iter().fold(0, |out, &shift| {
        let u = ((under >> shift) & 0xFF) as f32;
        let o = ((over >> shift) & 0xFF) as f32;
        out | (((u + (o - u) * alpha).round() as u32) << shift)
    })
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use pinch_core::{generate, Key, LayoutGeometry};

    fn scene<'a>(frame: &'a Frame, buttons: &'a [pinch_core::Button]) -> Scene<'a> {
        Scene {
            frame,
            buttons,
            hovered:      None,
            pressed:      None,
            typed_text:   "",
            caps_lock_on: false,
            landmarks:    &[],
            pose:         None,
            pinched:      false,
            status:       "ready",
        }
    }

    fn pixel_at(canvas: &Canvas, p: Point) -> u32 {
        canvas.pixel(p.x as usize, p.y as usize)
    }

    #[test]
    fn blend_endpoints() {
        assert_eq!(blend(0x000000, 0xFFFFFF, 0.0), 0x000000);
        assert_eq!(blend(0x000000, 0xFFFFFF, 1.0), 0xFFFFFF);
        assert_eq!(blend(0x102030, 0x102030, 0.5), 0x102030);
        assert_eq!(blend(0x000000, 0x0000FF, 0.5), 0x000080);
    }

    #[test]
    fn glyphs_ignore_case_and_cover_labels() {
        assert_eq!(char_glyph('q'), char_glyph('Q'));
        assert_eq!(char_glyph('0'), [7, 5, 5, 5, 7]);
        for label in ["Caps", "Space", "<-", "CAPS ON", "TYPED z"] {
            for c in label.chars() {
                assert!(c == ' ' || char_glyph(c) != UNKNOWN_GLYPH, "no glyph for {:?}", c);
            }
        }
        assert_eq!(char_glyph('~'), UNKNOWN_GLYPH);
    }

    #[test]
    fn text_width_and_fit() {
        assert_eq!(text_width("", 3), 0);
        assert_eq!(text_width("a", 6), 18);
        assert_eq!(text_width("Space", 2), 38);
        assert_eq!(fit_scale("Space", 38, 6), 2);
        assert_eq!(fit_scale("Space", 5, 6), 1);
    }

    #[test]
    fn tail_keeps_newest_chars() {
        assert_eq!(tail_that_fits("hello", 1000, 1), "hello");
        // 3 chars at scale 1 need 11 px
        assert_eq!(tail_that_fits("hello", 11, 1), "llo");
        assert_eq!(tail_that_fits("héllo", 7, 1), "lo");
    }

    #[test]
    fn button_styles_are_distinct() {
        let frame = Frame::filled(1280, 720, 0);
        let buttons = generate(false, &LayoutGeometry::default());
        // a corner pixel away from the label and border
        let inner_corner = |b: &pinch_core::Button| Point::new(b.x as f32 + 4.0, b.y as f32 + 4.0);

        let mut canvas = Canvas::new(1280, 720);
        let mut s = scene(&frame, &buttons);
        s.hovered = Some(Key::Char('w'));
        s.pressed = Some(Key::Char('e'));
        canvas.render(&s);

        let idle    = pixel_at(&canvas, inner_corner(&buttons[0]));
        let hovered = pixel_at(&canvas, inner_corner(&buttons[1]));
        let pressed = pixel_at(&canvas, inner_corner(&buttons[2]));
        assert_ne!(idle, hovered);
        assert_ne!(idle, pressed);
        assert_ne!(hovered, pressed);
    }

    #[test]
    fn video_shows_outside_keys() {
        let frame = Frame::filled(1280, 720, 0x00123456);
        let buttons = generate(false, &LayoutGeometry::default());
        let mut canvas = Canvas::new(1280, 720);
        canvas.render(&scene(&frame, &buttons));
        assert_eq!(canvas.pixel(5, 300), 0x00123456);
    }

    #[test]
    fn small_frame_is_clipped_not_panicking() {
        let frame = Frame::filled(10, 10, 0x00FFFFFF);
        let mut canvas = Canvas::new(64, 48);
        let mut s = scene(&frame, &[]);
        s.typed_text = "a very long line of text that cannot possibly fit";
        s.landmarks = &[Point { x: -50.0, y: 9999.0 }];
        canvas.render(&s);
        assert_eq!(canvas.pixel(0, 40) >> 24, 0);
    }
}
