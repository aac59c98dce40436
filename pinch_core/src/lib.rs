//! # pinch_core
//!
//! The deterministic heart of the pinch keyboard: everything between "here
//! are two fingertip positions" and "this character was typed".
//!
//! No I/O happens here and no clock is read; every operation takes the
//! current [`std::time::Instant`] as an argument, so the whole pipeline can
//! be driven from tests with synthetic timestamps.
//!
//! ## Pipeline (one frame)
//!
//! | Stage | Item | Output |
//! |---|---|---|
//! | Layout | [`layout::generate`] | `Vec<Button>` for the current caps mode |
//! | Hover | [`layout::hit`] | button under the index fingertip |
//! | Pinch | [`gesture::GestureInterpreter::interpret`] | debounced click |
//! | Dispatch | [`text::InteractionState::apply`] | typed text / caps toggle |
//!
//! ## Quick start
//!
//! ```rust
//! use std::time::Instant;
//! use pinch_core::gesture::{GestureInterpreter, GestureParams, HandPose};
//! use pinch_core::layout::{generate, LayoutGeometry, Point};
//! use pinch_core::text::InteractionState;
//!
//! let geometry = LayoutGeometry::default();
//! let mut state = InteractionState::default();
//! let buttons = generate(state.caps_lock_on, &geometry);
//!
//! // Pinch over the centre of the first key.
//! let target = buttons[0].center();
//! let pose = HandPose {
//!     index_tip: target,
//!     thumb_tip: Point::new(target.x + 10.0, target.y),
//! };
//!
//! let mut interpreter = GestureInterpreter::new(GestureParams::default());
//! let gs = interpreter.interpret(Some(pose), &buttons, Instant::now(), state.last_click);
//! if let Some(button) = gs.clicked {
//!     state.apply(&button.key);
//! }
//! state.last_click = gs.last_click;
//! assert_eq!(state.typed_text, "q");
//! ```

pub mod layout;
pub mod gesture;
pub mod text;

pub use gesture::{GestureInterpreter, GestureParams, GestureState, HandPose};
pub use layout::{generate, hit, Button, Key, LayoutGeometry, Point};
pub use text::{Applied, InteractionState};
