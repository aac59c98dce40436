//! Typed-text buffer and key action dispatch.

use std::time::Instant;

use crate::layout::Key;

/// What [`InteractionState::apply`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Applied {
    /// A character (including `' '`) was appended.
    Typed(char),
    /// The last character was removed; `None` if the buffer was already empty.
    Deleted(Option<char>),
    /// Caps lock changed to the contained value.
    CapsToggled(bool),
}

impl Applied {
    /// The layout must be regenerated before the next hit test.
    pub fn needs_relayout(&self) -> bool {
        matches!(self, Applied::CapsToggled(_))
    }
}

/// Everything that survives from one frame to the next.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InteractionState {
    /// Append/delete at the tail only; grows without bound.
    pub typed_text:   String,
    pub caps_lock_on: bool,
    /// Time of the last accepted click, `None` before the first one.
    pub last_click:   Option<Instant>,
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a clicked key to the buffer.
    ///
    /// Character keys append exactly what the button shows; caps lock only
    /// matters through which layout was on screen.
    pub fn apply(&mut self, key: &Key) -> Applied {
        match *key {
            Key::Char(c) => {
                self.typed_text.push(c);
                Applied::Typed(c)
            }
            Key::Space => {
                self.typed_text.push(' ');
                Applied::Typed(' ')
            }
            Key::Backspace => Applied::Deleted(self.typed_text.pop()),
            Key::Caps => {
                self.caps_lock_on = !self.caps_lock_on;
                Applied::CapsToggled(self.caps_lock_on)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{generate, LayoutGeometry};

    #[test]
    fn backspace_on_empty_is_noop() {
        let mut s = InteractionState::new();
        assert_eq!(s.apply(&Key::Backspace), Applied::Deleted(None));
        assert_eq!(s.typed_text, "");
    }

    #[test]
    fn backspace_undoes_append() {
        for c in ['a', 'Z', '7', 'é'] {
            let mut s = InteractionState { typed_text: "pre".into(), ..Default::default() };
            s.apply(&Key::Char(c));
            assert_eq!(s.apply(&Key::Backspace), Applied::Deleted(Some(c)));
            assert_eq!(s.typed_text, "pre");
        }
    }

    #[test]
    fn space_appends_blank() {
        let mut s = InteractionState::new();
        s.apply(&Key::Char('h'));
        s.apply(&Key::Space);
        assert_eq!(s.typed_text, "h ");
    }

    #[test]
    fn caps_toggles_and_requests_relayout() {
        let mut s = InteractionState::new();
        let a = s.apply(&Key::Caps);
        assert_eq!(a, Applied::CapsToggled(true));
        assert!(a.needs_relayout());
        assert!(s.caps_lock_on);
        assert_eq!(s.typed_text, "");
        assert!(!Applied::Typed('x').needs_relayout());
    }

    #[test]
    fn caps_twice_restores_layout() {
        let g = LayoutGeometry::default();
        let mut s = InteractionState::new();
        let before = generate(s.caps_lock_on, &g);
        s.apply(&Key::Caps);
        assert_ne!(generate(s.caps_lock_on, &g), before);
        s.apply(&Key::Caps);
        assert_eq!(generate(s.caps_lock_on, &g), before);
    }

    #[test]
    fn caps_does_not_change_emitted_case() {
        let mut s = InteractionState { caps_lock_on: true, ..Default::default() };
        s.apply(&Key::Char('q'));
        assert_eq!(s.typed_text, "q");
    }

    #[test]
    fn hi_space_backspace_scenario() {
        let mut s = InteractionState::new();
        for k in [Key::Char('h'), Key::Char('i')] { s.apply(&k); }
        assert_eq!(s.typed_text, "hi");
        s.apply(&Key::Space);
        assert_eq!(s.typed_text, "hi ");
        s.apply(&Key::Backspace);
        assert_eq!(s.typed_text, "hi");
    }
}
