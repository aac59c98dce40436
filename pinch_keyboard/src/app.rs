//! Top-level frame loop.
//!
//! `FrameLoop` owns the frame source, the hand detector, the surface, the
//! current button snapshot and the [`InteractionState`].  Each call to
//! [`FrameLoop::tick`] runs one frame end to end:
//!
//! ```text
//! poll events ─► read frame ─► detect hand ─► interpret pinch ─► apply key ─► present
//!      │              │
//!    quit?        dropped? → skip rest of tick
//! ```
//!
//! Everything is synchronous and single-threaded; a quit request is only
//! seen at the top of the next tick.

use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{debug, info, trace, warn};

use pinch_core::{
    generate, Applied, Button, GestureInterpreter, InteractionState, Key, LayoutGeometry,
};

use crate::camera::{FrameSource, TestPattern};
use crate::config::{AppConfig, DetectorBackend};
use crate::hand::{HandDetector, MediaPipeBridge, SimulatedHand};
use crate::surface::{Scene, Surface, SurfaceEvent};
use crate::visualizer::Visualizer;

/// How long a clicked key keeps the pressed style.
const PRESS_FLASH: Duration = Duration::from_millis(150);

// ════════════════════════════════════════════════════════════════════════════
// LoopState
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState { Running, Stopped }

// ════════════════════════════════════════════════════════════════════════════
// FrameLoop
// ════════════════════════════════════════════════════════════════════════════

pub struct FrameLoop<F: FrameSource, D: HandDetector, S: Surface> {
    // ── collaborators ────────────────────────────────────────────────────
    source:      F,
    detector:    D,
    surface:     S,

    // ── keyboard ─────────────────────────────────────────────────────────
    geometry:    LayoutGeometry,
    buttons:     Vec<Button>,
    interpreter: GestureInterpreter,
    state:       InteractionState,

    // ── display ──────────────────────────────────────────────────────────
    width:       usize,
    height:      usize,
    mirror:      bool,
    hovered:     Option<Key>,
    pressed:     Option<(Key, Instant)>,
    status:      String,

    // ── bookkeeping ──────────────────────────────────────────────────────
    loop_state:  LoopState,
    frames:      u64,
    dropped:     u64,
    /// Detector failures so far, and whether the latest call failed.
    detector_errors:  u64,
    detector_failing: bool,
}

impl<F: FrameSource, D: HandDetector, S: Surface> FrameLoop<F, D, S> {
    pub fn new(cfg: &AppConfig, source: F, detector: D, surface: S) -> Self {
        let geometry = cfg.geometry();
        let state = InteractionState::new();
        let buttons = generate(state.caps_lock_on, &geometry);

        FrameLoop {
            source,
            detector,
            surface,
            geometry,
            buttons,
            interpreter: GestureInterpreter::new(cfg.gesture_params()),
            state,
            width:       cfg.display.width,
            height:      cfg.display.height,
            mirror:      cfg.camera.mirror,
            hovered:     None,
            pressed:     None,
            status:      "READY: pinch over a key to type".to_string(),
            loop_state:  LoopState::Running,
            frames:      0,
            dropped:     0,
            detector_errors:  0,
            detector_failing: false,
        }
    }

    // ── Per-frame tick ────────────────────────────────────────────────────

    /// Run one frame at wall-clock time `now`.
    ///
    /// A dropped camera frame or a detector failure only skips work for this
    /// tick; an `Err` from here means rendering failed and the loop cannot
    /// continue.
    pub fn tick(&mut self, now: Instant) -> Result<LoopState> {
        if self.loop_state == LoopState::Stopped {
            return Ok(LoopState::Stopped);
        }

        // 1. Input
        if self.surface.poll_events().contains(&SurfaceEvent::Quit) {
            info!("quit requested");
            self.loop_state = LoopState::Stopped;
            return Ok(LoopState::Stopped);
        }

        // 2. Frame
        let frame = match self.source.read() {
            Ok(f) => f,
            Err(e) => {
                self.dropped += 1;
                debug!(error = %e, dropped = self.dropped, "frame dropped, skipping tick");
                return Ok(LoopState::Running);
            }
        };
        let mut frame = frame.resized(self.width, self.height);
        if self.mirror {
            frame = frame.mirrored();
        }
        self.frames += 1;

        // 3. Hand
        let hand = match self.detector.detect(&frame) {
            Ok(hands) => {
                if self.detector_failing {
                    info!(detector = self.detector.name(), "hand detection recovered");
                    self.detector_failing = false;
                }
                hands.into_iter().next()
            }
            Err(e) => {
                self.detector_errors += 1;
                if self.detector_failing {
                    debug!(error = %e, errors = self.detector_errors, "hand detection still failing");
                } else {
                    warn!(detector = self.detector.name(), error = %e, "hand detection failed");
                    self.detector_failing = true;
                }
                None
            }
        };
        let pose = hand.as_ref().and_then(|h| h.pose(frame.width, frame.height));
        let landmarks = hand.as_ref()
            .map(|h| h.pixels(frame.width, frame.height))
            .unwrap_or_default();

        // 4. Gesture → action
        let gs = self.interpreter.interpret(pose, &self.buttons, now, self.state.last_click);
        let hovered = gs.hovered.map(|b| b.key);
        let clicked = gs.clicked.map(|b| b.key);
        let pinched = gs.is_pinched(self.interpreter.params().pinch_threshold);
        self.state.last_click = gs.last_click;

        if hovered != self.hovered {
            trace!(hovered = ?hovered.map(|k| k.label()), "hover changed");
            self.hovered = hovered;
        }
        if let Some(key) = clicked {
            self.on_click(key, now);
        }

        // 5. Render
        let pressed = self.pressed
            .filter(|&(_, at)| now.saturating_duration_since(at) < PRESS_FLASH)
            .map(|(k, _)| k);

        let scene = Scene {
            frame:        &frame,
            buttons:      &self.buttons,
            hovered:      self.hovered,
            pressed,
            typed_text:   &self.state.typed_text,
            caps_lock_on: self.state.caps_lock_on,
            landmarks:    &landmarks,
            pose,
            pinched,
            status:       &self.status,
        };
        self.surface.present(&scene)?;

        Ok(LoopState::Running)
    }

    fn on_click(&mut self, key: Key, now: Instant) {
        let applied = self.state.apply(&key);
        self.pressed = Some((key, now));

        if applied.needs_relayout() {
            self.buttons = generate(self.state.caps_lock_on, &self.geometry);
            debug!(caps = self.state.caps_lock_on, buttons = self.buttons.len(), "layout regenerated");
        }

        self.status = match applied {
            Applied::Typed(' ')         => "SPACE".to_string(),
            Applied::Typed(c)           => format!("TYPED {}", c),
            Applied::Deleted(Some(c))   => format!("DELETED {}", c),
            Applied::Deleted(None)      => "NOTHING TO DELETE".to_string(),
            Applied::CapsToggled(true)  => "CAPS ON".to_string(),
            Applied::CapsToggled(false) => "CAPS OFF".to_string(),
        };
        info!(key = %key.label(), text = %self.state.typed_text, "click");
    }

    // ── Run / shutdown ────────────────────────────────────────────────────

    /// Tick until stopped, then shut down and return the typed text.
    pub fn run(mut self) -> Result<String> {
        info!(source = %self.source.name(), detector = self.detector.name(), "frame loop started");
        loop {
            match self.tick(Instant::now()) {
                Ok(LoopState::Running) => continue,
                Ok(LoopState::Stopped) => break,
                Err(e) => {
                    self.shutdown();
                    return Err(e);
                }
            }
        }
        Ok(self.shutdown())
    }

    /// Release the frame source and hand back the final text.
    pub fn shutdown(&mut self) -> String {
        self.loop_state = LoopState::Stopped;
        self.source.release();
        info!(
            frames = self.frames,
            dropped = self.dropped,
            detector_errors = self.detector_errors,
            "frame loop stopped"
        );
        self.state.typed_text.clone()
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn state(&self)      -> &InteractionState { &self.state }
    pub fn buttons(&self)    -> &[Button]         { &self.buttons }
    pub fn loop_state(&self) -> LoopState         { self.loop_state }
    pub fn status(&self)     -> &str              { &self.status }
    pub fn detector_errors(&self) -> u64          { self.detector_errors }
    pub fn source(&self)     -> &F                { &self.source }
    pub fn detector_mut(&mut self) -> &mut D      { &mut self.detector }
    pub fn surface(&self)    -> &S                { &self.surface }
    pub fn surface_mut(&mut self) -> &mut S       { &mut self.surface }
}

// ════════════════════════════════════════════════════════════════════════════
// run(): wire up backends and drive the loop
// ════════════════════════════════════════════════════════════════════════════

/// Build the backends described by `cfg` and run until the user quits.
///
/// `simulate` forces the test pattern and the mouse-driven hand regardless
/// of the configured backend.  Returns the final typed text.
pub fn run(cfg: &AppConfig, simulate: bool) -> Result<String> {
    if !simulate && !cfg!(feature = "camera") {
        warn!("built without the `camera` feature, falling back to simulation");
    }
    let simulate = simulate || !cfg!(feature = "camera");

    if simulate {
        info!("simulation mode: mouse drives the hand");
        let (sim_tx, sim_rx) = mpsc::channel();
        let source = TestPattern::new(cfg.display.width, cfg.display.height);
        let detector = SimulatedHand::new(sim_rx);
        let surface = Visualizer::new(&cfg.display, Some(sim_tx))?;
        return FrameLoop::new(cfg, source, detector, surface).run();
    }

    let source = open_camera(cfg)?;

    let (detector, sim_tx): (Box<dyn HandDetector>, _) = match cfg.detector.backend {
        DetectorBackend::Mediapipe => {
            let bridge = MediaPipeBridge::spawn(
                &cfg.detector.python,
                std::path::Path::new(&cfg.detector.script),
                cfg.detector.min_confidence,
            )?;
            (Box::new(bridge), None)
        }
        DetectorBackend::Simulated => {
            let (tx, rx) = mpsc::channel();
            (Box::new(SimulatedHand::new(rx)), Some(tx))
        }
    };

    let surface = Visualizer::new(&cfg.display, sim_tx)?;
    FrameLoop::new(cfg, source, detector, surface).run()
}

#[cfg(feature = "camera")]
fn open_camera(cfg: &AppConfig) -> Result<Box<dyn FrameSource>> {
    let camera = crate::camera::NokhwaCamera::open(
        cfg.camera.index,
        cfg.display.width as u32,
        cfg.display.height as u32,
        cfg.display.target_fps as u32,
    )?;
    Ok(Box::new(camera))
}

#[cfg(not(feature = "camera"))]
fn open_camera(_cfg: &AppConfig) -> Result<Box<dyn FrameSource>> {
    anyhow::bail!("built without camera support; rebuild with `--features camera`")
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
