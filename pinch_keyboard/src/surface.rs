//! The render/event seam between the frame loop and whatever draws it.

use anyhow::Result;

use pinch_core::{Button, HandPose, Key, Point};

use crate::camera::Frame;

/// Input the frame loop cares about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// Window closed or the quit key was pressed.
    Quit,
}

/// How a button is drawn this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonStyle {
    Idle,
    Hovered,
    /// Just clicked.
    Pressed,
}

/// Everything needed to draw one frame.
#[derive(Clone, Debug)]
pub struct Scene<'a> {
    pub frame:        &'a Frame,
    pub buttons:      &'a [Button],
    pub hovered:      Option<Key>,
    pub pressed:      Option<Key>,
    pub typed_text:   &'a str,
    pub caps_lock_on: bool,
    /// All landmarks of the tracked hand, in frame pixels.
    pub landmarks:    &'a [Point],
    pub pose:         Option<HandPose>,
    pub pinched:      bool,
    pub status:       &'a str,
}

impl Scene<'_> {
    pub fn style(&self, button: &Button) -> ButtonStyle {
        if self.pressed == Some(button.key) {
            ButtonStyle::Pressed
        } else if self.hovered == Some(button.key) {
            ButtonStyle::Hovered
        } else {
            ButtonStyle::Idle
        }
    }
}

/// A display that can be drawn to and polled for input.
pub trait Surface {
    /// Drain pending input.  Never blocks.
    fn poll_events(&mut self) -> Vec<SurfaceEvent>;

    /// Draw and show one frame.  Implementations also pace the loop to
    /// their target frame rate.
    fn present(&mut self, scene: &Scene) -> Result<()>;
}
