//! Hand landmark detection: from a MediaPipe helper process or mouse
//! simulation.
//!
//! The public interface is the [`HandDetector`] trait.  Consumers don't need
//! to know whether landmarks came from a real model or the simulator; both
//! report hands in the 21-point MediaPipe convention with coordinates
//! normalised to the frame.

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::mpsc::Receiver;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

use pinch_core::{HandPose, Point};

use crate::camera::Frame;

/// Landmark indices of the 21-point hand model.
#[allow(dead_code)]
pub mod landmarks {
    pub const WRIST:             usize = 0;
    pub const THUMB_CMC:         usize = 1;
    pub const THUMB_MCP:         usize = 2;
    pub const THUMB_IP:          usize = 3;
    pub const THUMB_TIP:         usize = 4;
    pub const INDEX_FINGER_MCP:  usize = 5;
    pub const INDEX_FINGER_PIP:  usize = 6;
    pub const INDEX_FINGER_DIP:  usize = 7;
    pub const INDEX_FINGER_TIP:  usize = 8;
    pub const MIDDLE_FINGER_MCP: usize = 9;
    pub const MIDDLE_FINGER_PIP: usize = 10;
    pub const MIDDLE_FINGER_DIP: usize = 11;
    pub const MIDDLE_FINGER_TIP: usize = 12;
    pub const RING_FINGER_MCP:   usize = 13;
    pub const RING_FINGER_PIP:   usize = 14;
    pub const RING_FINGER_DIP:   usize = 15;
    pub const RING_FINGER_TIP:   usize = 16;
    pub const PINKY_MCP:         usize = 17;
    pub const PINKY_PIP:         usize = 18;
    pub const PINKY_DIP:         usize = 19;
    pub const PINKY_TIP:         usize = 20;

    pub const COUNT:             usize = 21;
}

// ════════════════════════════════════════════════════════════════════════════
// Landmark / Hand
// ════════════════════════════════════════════════════════════════════════════

/// One landmark, `x`/`y` normalised to 0.0–1.0 of frame width/height.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    /// Depth relative to the wrist; unused by the keyboard.
    #[serde(default)]
    pub z: f32,
}

/// A detected hand.
#[derive(Clone, Debug, PartialEq)]
pub struct Hand {
    pub landmarks:  Vec<Landmark>,
    pub score:      f32,
    pub handedness: String,
}

impl Hand {
    /// Landmark `idx` in frame pixels.
    pub fn pixel(&self, idx: usize, width: usize, height: usize) -> Option<Point> {
        self.landmarks.get(idx)
            .map(|l| Point::new(l.x * width as f32, l.y * height as f32))
    }

    /// Every landmark in frame pixels, for drawing.
    pub fn pixels(&self, width: usize, height: usize) -> Vec<Point> {
        (0..self.landmarks.len())
            .filter_map(|i| self.pixel(i, width, height))
            .collect()
    }

    /// Reduce to the index fingertip and thumb tip.  `None` if the hand is
    /// missing either landmark.
    pub fn pose(&self, width: usize, height: usize) -> Option<HandPose> {
        Some(HandPose {
            index_tip: self.pixel(landmarks::INDEX_FINGER_TIP, width, height)?,
            thumb_tip: self.pixel(landmarks::THUMB_TIP, width, height)?,
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandDetector trait: unified interface for model and sim
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can find hands in a frame.
pub trait HandDetector {
    /// Zero or more hands, best first.  An empty vec is the normal
    /// "no hand in view" answer; `Err` means the detector itself failed.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Hand>>;

    fn name(&self) -> &str;
}

impl<T: HandDetector + ?Sized> HandDetector for Box<T> {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Hand>> { (**self).detect(frame) }
    fn name(&self) -> &str                                   { (**self).name() }
}

// ════════════════════════════════════════════════════════════════════════════
// SimulatedHand: mouse simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Raw pointer input from the visualizer window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SimInput {
    /// Cursor inside the window; `pinched` while the left button is held.
    Pointer { x: f32, y: f32, pinched: bool },
    /// Cursor left the window.
    PointerLost,
}

/// Pixel distance from index tip to thumb tip while the button is up.
pub const SIM_OPEN_SPREAD: f32 = 90.0;
/// Pixel distance while the button is held.
pub const SIM_PINCH_SPREAD: f32 = 8.0;

/// Hand shape relative to the index fingertip, in pixels, for an open right
/// hand.  Thumb tip is overwritten from the pinch state.
const SIM_SHAPE: [(f32, f32); landmarks::COUNT] = [
    ( 20.0, 200.0),                                               // wrist
    (-20.0, 180.0), (-50.0, 150.0), (-70.0, 115.0), ( 0.0,  0.0), // thumb
    (  0.0, 110.0), (  0.0,  70.0), (  0.0,  35.0), ( 0.0,  0.0), // index
    ( 30.0, 110.0), ( 30.0,  65.0), ( 30.0,  30.0), (30.0, -5.0), // middle
    ( 58.0, 115.0), ( 58.0,  75.0), ( 58.0,  45.0), (58.0, 15.0), // ring
    ( 82.0, 125.0), ( 82.0,  95.0), ( 82.0,  75.0), (82.0, 55.0), // pinky
];

/// Detector driven by [`SimInput`] events from the visualizer's window.
///
/// The cursor is the index fingertip; holding the left mouse button folds
/// the thumb onto it.  This decouples window input from gesture logic the
/// same way a real detector would.
pub struct SimulatedHand {
    rx:     Receiver<SimInput>,
    latest: Option<(f32, f32, bool)>,
}

impl SimulatedHand {
    pub fn new(rx: Receiver<SimInput>) -> Self {
        SimulatedHand { rx, latest: None }
    }
}

impl HandDetector for SimulatedHand {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Hand>> {
        for input in self.rx.try_iter() {
            self.latest = match input {
                SimInput::Pointer { x, y, pinched } => Some((x, y, pinched)),
                SimInput::PointerLost               => None,
            };
        }

        let (x, y, pinched) = match self.latest {
            Some(p) => p,
            None    => return Ok(Vec::new()),
        };

        let w = frame.width.max(1) as f32;
        let h = frame.height.max(1) as f32;
        let spread = if pinched { SIM_PINCH_SPREAD } else { SIM_OPEN_SPREAD };

        let landmarks = SIM_SHAPE.iter().enumerate()
            .map(|(i, &(dx, dy))| {
                let (px, py) = if i == landmarks::THUMB_TIP {
                    (x - spread, y)
                } else {
                    (x + dx, y + dy)
                };
                Landmark { x: px / w, y: py / h, z: 0.0 }
            })
            .collect();

        Ok(vec![Hand { landmarks, score: 1.0, handedness: "Right".to_string() }])
    }

    fn name(&self) -> &str {
        "simulated (mouse)"
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MediaPipeBridge: helper process running the MediaPipe hand landmarker
// ════════════════════════════════════════════════════════════════════════════

#[derive(Deserialize, Debug)]
struct HandJson {
    #[serde(default)]
    handedness: String,
    score:      f32,
    landmarks:  Vec<Landmark>,
}

#[derive(Deserialize, Debug)]
struct DetectionJson {
    #[serde(default)]
    hands: Vec<HandJson>,
    #[serde(default)]
    error: Option<String>,
}

/// Detector backed by a MediaPipe helper process.
///
/// # Protocol
///
/// Per frame the bridge writes `width`, `height`, `channels` (little-endian
/// `u32`, channels = 3) followed by the RGB bytes on the child's stdin, and
/// reads back one JSON line:
///
/// ```text
/// {"hands":[{"handedness":"Right","score":0.93,"landmarks":[{"x":..,"y":..,"z":..}, …]}]}
/// ```
///
/// The child is launched as `program script min_confidence`, where the last
/// argument is the model's detection confidence.  At startup it must print a
/// single `READY` line.
pub struct MediaPipeBridge {
    process:        Child,
    stdout:         BufReader<ChildStdout>,
    min_confidence: f32,
}

impl MediaPipeBridge {
    /// Spawn `program script min_confidence` and wait for it to report ready.
    ///
    /// `min_confidence` drives both the model's detection threshold and the
    /// per-hand score filter applied to its answers.
    pub fn spawn(program: &str, script: &Path, min_confidence: f32) -> Result<Self> {
        if !script.exists() {
            bail!("hand detection script not found at {}", script.display());
        }

        let min_confidence = min_confidence.clamp(0.0, 1.0);
        info!(program, script = %script.display(), min_confidence, "starting hand detector process");

        let mut process = Command::new(program)
            .arg(script)
            .arg(min_confidence.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("failed to start `{} {}`", program, script.display()))?;

        let stdout = process.stdout.take().context("detector process has no stdout")?;
        Self::handshake(process, stdout, min_confidence)
    }

    fn handshake(process: Child, stdout: ChildStdout, min_confidence: f32) -> Result<Self> {
        let mut stdout = BufReader::new(stdout);
        let mut ready = String::new();
        stdout.read_line(&mut ready).context("detector process closed before READY")?;
        if ready.trim() != "READY" {
            bail!("detector process did not signal ready, got {:?}", ready.trim());
        }
        info!("hand detector ready");

        Ok(MediaPipeBridge {
            process,
            stdout,
            min_confidence,
        })
    }
}

/// Parse one response line into hands at or above `min_confidence`.
fn parse_hands(line: &str, min_confidence: f32) -> Result<Vec<Hand>> {
    let result: DetectionJson = serde_json::from_str(line)
        .with_context(|| format!("bad detector response: {}", line.trim()))?;

    if let Some(error) = result.error {
        bail!("detector reported: {}", error);
    }

    Ok(result.hands.into_iter()
        .filter(|h| {
            if h.landmarks.len() != landmarks::COUNT {
                warn!(got = h.landmarks.len(), "expected 21 landmarks, skipping hand");
                return false;
            }
            h.score >= min_confidence
        })
        .map(|h| Hand { landmarks: h.landmarks, score: h.score, handedness: h.handedness })
        .collect())
}

impl HandDetector for MediaPipeBridge {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Hand>> {
        if frame.pixels.is_empty() {
            return Ok(Vec::new());
        }

        let stdin = self.process.stdin.as_mut().context("detector stdin closed")?;
        stdin.write_all(&(frame.width as u32).to_le_bytes())?;
        stdin.write_all(&(frame.height as u32).to_le_bytes())?;
        stdin.write_all(&3u32.to_le_bytes())?;
        stdin.write_all(&frame.to_rgb())?;
        stdin.flush()?;

        let mut line = String::new();
        if self.stdout.read_line(&mut line)? == 0 {
            bail!("detector process exited");
        }

        let hands = parse_hands(&line, self.min_confidence)?;
        if let Some(h) = hands.first() {
            debug!(handedness = %h.handedness, score = h.score, "hand detected");
        }
        Ok(hands)
    }

    fn name(&self) -> &str {
        "mediapipe"
    }
}

impl Drop for MediaPipeBridge {
    fn drop(&mut self) {
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
