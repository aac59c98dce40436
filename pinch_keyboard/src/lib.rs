//! # pinch_keyboard
//!
//! Webcam virtual keyboard: point at a key with your index finger, pinch
//! thumb and index together to type it.  The typed text is printed when the
//! window closes.
//!
//! ## Frame pipeline
//!
//! | Stage | Module | Output |
//! |---|---|---|
//! | Capture | [`camera`] | [`camera::Frame`], resized and optionally mirrored |
//! | Detect | [`hand`] | first hand's 21 landmarks → [`pinch_core::HandPose`] |
//! | Interpret | `pinch_core::gesture` | hovered button, click (debounced) |
//! | Apply | `pinch_core::text` | text buffer / caps lock, relayout on caps |
//! | Present | [`visualizer`] | minifb window: video, keys, text bar, hand overlay |
//!
//! [`app::FrameLoop`] glues the stages together; [`config::AppConfig`] holds
//! every tunable and loads from TOML.
//!
//! ## Feature flags
//!
//! * (default): **Simulation mode**: a test pattern stands in for the
//!   camera and the mouse stands in for the hand.
//! * `camera`: **Hardware mode**: captures from a webcam via `nokhwa`.  The
//!   hand detector is chosen by `detector.backend` in the config file.
//!
//! ### Simulation controls
//!
//! | Input | Gesture |
//! |---|---|
//! | Mouse move | Index fingertip follows the pointer |
//! | Left button held | Pinch |
//! | Pointer leaves window | Hand lost |
//! | `Q` / `Escape` | Quit |

pub mod camera;
pub mod hand;
pub mod config;
pub mod logging;
pub mod surface;
pub mod visualizer;
pub mod app;
