//! Pinch gesture interpretation: hover, pinch distance and the debounced
//! click gate.
//!
//! A click fires only when **all** of these hold on the same frame:
//!
//! | Leg | Condition |
//! |---|---|
//! | Hover | the index fingertip is over a button |
//! | Pinch | `distance(index_tip, thumb_tip) < pinch_threshold` |
//! | Cooldown | `now - last_click > cooldown` (or no click yet) |
//! | Release | *(only with `require_release`)* the pinch opened since the last click |
//!
//! The cooldown is what turns a pinch held over several frames into exactly
//! one keystroke.

use std::time::{Duration, Instant};

use crate::layout::{hit, Button, Point};

// ════════════════════════════════════════════════════════════════════════════
// HandPose
// ════════════════════════════════════════════════════════════════════════════

/// The two points of interest of one tracked hand, in frame pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandPose {
    pub index_tip: Point,
    pub thumb_tip: Point,
}

impl HandPose {
    pub fn pinch_distance(&self) -> f32 {
        self.index_tip.distance(self.thumb_tip)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureParams
// ════════════════════════════════════════════════════════════════════════════

/// Tuning constants for the click gate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureParams {
    /// Pixel distance below which index and thumb count as pinched.
    pub pinch_threshold: f32,
    /// Minimum wall-clock gap between two accepted clicks.
    pub cooldown:        Duration,
    /// Also require the pinch to open between clicks.
    pub require_release: bool,
}

impl Default for GestureParams {
    fn default() -> Self {
        GestureParams {
            pinch_threshold: 40.0,
            cooldown:        Duration::from_millis(400),
            require_release: false,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureState
// ════════════════════════════════════════════════════════════════════════════

/// Result of interpreting one frame.  Borrows from the button snapshot it
/// was computed against.
#[derive(Clone, Debug, PartialEq)]
pub struct GestureState<'a> {
    pub hovered:        Option<&'a Button>,
    /// `None` when no hand was visible.
    pub pinch_distance: Option<f32>,
    pub clicked:        Option<&'a Button>,
    /// `now` if a click fired, otherwise the incoming value.
    pub last_click:     Option<Instant>,
}

impl GestureState<'_> {
    /// The neutral "no hand visible" result.
    pub fn idle(last_click: Option<Instant>) -> Self {
        GestureState { hovered: None, pinch_distance: None, clicked: None, last_click }
    }

    pub fn is_click(&self) -> bool {
        self.clicked.is_some()
    }

    pub fn is_pinched(&self, threshold: f32) -> bool {
        self.pinch_distance.map_or(false, |d| d < threshold)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureInterpreter
// ════════════════════════════════════════════════════════════════════════════

/// Per-frame pinch interpreter.
///
/// The only state kept between frames is the release latch used by
/// `require_release`; the cooldown timestamp lives with the caller.
#[derive(Clone, Debug)]
pub struct GestureInterpreter {
    params:  GestureParams,
    /// True once a click fired and the fingers have not opened since.
    latched: bool,
}

impl GestureInterpreter {
    pub fn new(params: GestureParams) -> Self {
        GestureInterpreter { params, latched: false }
    }

    pub fn params(&self) -> &GestureParams {
        &self.params
    }

    /// Interpret one frame.
    ///
    /// `pose` is `None` when the detector found no hand; that is the normal
    /// idle state and yields no hover and no click.
    pub fn interpret<'a>(
        &mut self,
        pose:       Option<HandPose>,
        buttons:    &'a [Button],
        now:        Instant,
        last_click: Option<Instant>,
    ) -> GestureState<'a> {
        let pose = match pose {
            Some(p) => p,
            None => {
                self.latched = false;
                return GestureState::idle(last_click);
            }
        };

        let hovered  = hit(pose.index_tip, buttons);
        let distance = pose.pinch_distance();
        let pinched  = distance < self.params.pinch_threshold;

        if !pinched {
            self.latched = false;
        }

        let cooled = match last_click {
            Some(t) => now.saturating_duration_since(t) > self.params.cooldown,
            None    => true,
        };
        let released = !(self.params.require_release && self.latched);

        let clicked = match hovered {
            Some(b) if pinched && cooled && released => Some(b),
            _ => None,
        };

        if clicked.is_some() {
            self.latched = true;
        }

        GestureState {
            hovered,
            pinch_distance: Some(distance),
            clicked,
            last_click: if clicked.is_some() { Some(now) } else { last_click },
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Key;

    fn buttons() -> Vec<Button> {
        vec![
            Button { key: Key::Char('h'), x: 0,   y: 0, width: 80, height: 80 },
            Button { key: Key::Char('i'), x: 100, y: 0, width: 80, height: 80 },
        ]
    }

    fn pinch_at(x: f32, y: f32) -> HandPose {
        HandPose { index_tip: Point::new(x, y), thumb_tip: Point::new(x + 10.0, y) }
    }

    fn open_at(x: f32, y: f32) -> HandPose {
        HandPose { index_tip: Point::new(x, y), thumb_tip: Point::new(x + 120.0, y) }
    }

    fn ms(n: u64) -> Duration { Duration::from_millis(n) }

    /// Feed `poses` one per `step_ms`, threading `last_click`; returns the
    /// clicked keys in order.
    fn run(interp: &mut GestureInterpreter, poses: &[Option<HandPose>], step_ms: u64) -> Vec<Key> {
        let b = buttons();
        let t0 = Instant::now();
        let mut last = None;
        let mut clicks = Vec::new();
        for (i, pose) in poses.iter().enumerate() {
            let gs = interp.interpret(*pose, &b, t0 + ms(i as u64 * step_ms), last);
            if let Some(btn) = gs.clicked { clicks.push(btn.key); }
            last = gs.last_click;
        }
        clicks
    }

    #[test]
    fn pinch_distance_is_euclidean() {
        let p = HandPose { index_tip: Point::new(0.0, 0.0), thumb_tip: Point::new(3.0, 4.0) };
        assert_eq!(p.pinch_distance(), 5.0);
    }

    #[test]
    fn hover_without_pinch_does_not_click() {
        let mut interp = GestureInterpreter::new(GestureParams::default());
        let b = buttons();
        let gs = interp.interpret(Some(open_at(40.0, 40.0)), &b, Instant::now(), None);
        assert_eq!(gs.hovered.map(|b| b.key), Some(Key::Char('h')));
        assert!(!gs.is_click());
        assert_eq!(gs.last_click, None);
    }

    #[test]
    fn pinch_outside_buttons_does_not_click() {
        let mut interp = GestureInterpreter::new(GestureParams::default());
        let b = buttons();
        let gs = interp.interpret(Some(pinch_at(90.0, 40.0)), &b, Instant::now(), None);
        assert!(gs.hovered.is_none());
        assert!(!gs.is_click());
    }

    #[test]
    fn threshold_is_strict() {
        let mut interp = GestureInterpreter::new(GestureParams::default());
        let b = buttons();
        let at_threshold = HandPose {
            index_tip: Point::new(40.0, 40.0),
            thumb_tip: Point::new(40.0, 80.0),
        };
        let gs = interp.interpret(Some(at_threshold), &b, Instant::now(), None);
        assert_eq!(gs.pinch_distance, Some(40.0));
        assert!(!gs.is_click());
    }

    #[test]
    fn no_hand_is_idle() {
        let mut interp = GestureInterpreter::new(GestureParams::default());
        let b = buttons();
        let t = Instant::now();
        let gs = interp.interpret(None, &b, t, Some(t));
        assert_eq!(gs, GestureState::idle(Some(t)));
    }

    #[test]
    fn sustained_pinch_within_cooldown_clicks_once() {
        let mut interp = GestureInterpreter::new(GestureParams::default());
        // 10 frames at 33 ms = 330 ms < 400 ms cooldown
        let poses = vec![Some(pinch_at(40.0, 40.0)); 10];
        assert_eq!(run(&mut interp, &poses, 33), vec![Key::Char('h')]);
    }

    #[test]
    fn pinches_past_cooldown_click_twice() {
        let mut interp = GestureInterpreter::new(GestureParams::default());
        let poses = vec![
            Some(pinch_at(40.0, 40.0)),
            Some(open_at(40.0, 40.0)),
            Some(pinch_at(40.0, 40.0)),
        ];
        // 250 ms steps: second pinch is 500 ms after the first
        assert_eq!(run(&mut interp, &poses, 250), vec![Key::Char('h'), Key::Char('h')]);
    }

    #[test]
    fn cooldown_boundary_is_exclusive() {
        let mut interp = GestureInterpreter::new(GestureParams::default());
        let b = buttons();
        let t0 = Instant::now();
        let gs = interp.interpret(Some(pinch_at(40.0, 40.0)), &b, t0 + ms(400), Some(t0));
        assert!(!gs.is_click());
        let gs = interp.interpret(Some(pinch_at(40.0, 40.0)), &b, t0 + ms(401), Some(t0));
        assert!(gs.is_click());
        assert_eq!(gs.last_click, Some(t0 + ms(401)));
    }

    #[test]
    fn sustained_pinch_refires_after_cooldown_by_default() {
        let mut interp = GestureInterpreter::new(GestureParams::default());
        let poses = vec![Some(pinch_at(40.0, 40.0)); 3];
        assert_eq!(run(&mut interp, &poses, 500).len(), 3);
    }

    #[test]
    fn require_release_blocks_held_pinch() {
        let params = GestureParams { require_release: true, ..GestureParams::default() };
        let mut interp = GestureInterpreter::new(params);
        let poses = vec![
            Some(pinch_at(40.0, 40.0)),
            Some(pinch_at(40.0, 40.0)),
            Some(pinch_at(140.0, 40.0)),
            Some(open_at(140.0, 40.0)),
            Some(pinch_at(140.0, 40.0)),
        ];
        assert_eq!(run(&mut interp, &poses, 500), vec![Key::Char('h'), Key::Char('i')]);
    }

    #[test]
    fn require_release_unlatches_when_hand_vanishes() {
        let params = GestureParams { require_release: true, ..GestureParams::default() };
        let mut interp = GestureInterpreter::new(params);
        let poses = vec![Some(pinch_at(40.0, 40.0)), None, Some(pinch_at(40.0, 40.0))];
        assert_eq!(run(&mut interp, &poses, 500).len(), 2);
    }
}
