#![forbid(unsafe_code)]

//! Canonical input event types.
//!
//! The host translates DOM (or native) pointer, touch, mouse, wheel, and
//! keyboard events into these types before handing them to the engine.
//!
//! # Design Notes
//!
//! - Coordinates are logical pixels in the viewport, origin at top-left,
//!   y growing downward.
//! - Touch and mouse input share [`PointerEvent`]; the host assigns a stable
//!   `pointer_id` per contact (mouse is conventionally `1`).
//! - `Modifiers` use bitflags for easy combination.

use bitflags::bitflags;

use crate::geometry::Point;

/// Input device that produced a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PointerKind {
    /// Mouse or trackpad click-drag.
    #[default]
    Mouse,
    /// Finger on a touch screen.
    Touch,
    /// Stylus.
    Pen,
}

/// One pointer sample (down, move, up, or cancel).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Host-assigned identity of the contact.
    pub pointer_id: u32,
    /// Device that produced the sample.
    pub kind: PointerKind,
    /// X coordinate in logical pixels.
    pub x: f64,
    /// Y coordinate in logical pixels.
    pub y: f64,
}

impl PointerEvent {
    /// Create a pointer sample.
    #[must_use]
    pub const fn new(pointer_id: u32, kind: PointerKind, x: f64, y: f64) -> Self {
        Self {
            pointer_id,
            kind,
            x,
            y,
        }
    }

    /// Mouse sample with the conventional pointer id `1`.
    #[must_use]
    pub const fn mouse(x: f64, y: f64) -> Self {
        Self::new(1, PointerKind::Mouse, x, y)
    }

    /// Touch sample for the given touch identifier.
    #[must_use]
    pub const fn touch(pointer_id: u32, x: f64, y: f64) -> Self {
        Self::new(pointer_id, PointerKind::Touch, x, y)
    }

    /// Position as a [`Point`].
    #[must_use]
    pub const fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A wheel (or trackpad scroll) event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelEvent {
    /// Vertical delta in pixels; positive scrolls content down.
    pub delta_y: f64,
    /// X coordinate of the cursor.
    pub x: f64,
    /// Y coordinate of the cursor.
    pub y: f64,
}

impl WheelEvent {
    /// Create a wheel event.
    #[must_use]
    pub const fn new(delta_y: f64, x: f64, y: f64) -> Self {
        Self { delta_y, x, y }
    }

    /// Cursor position as a [`Point`].
    #[must_use]
    pub const fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key code that was pressed.
    pub code: KeyCode,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// Create a new key event with no modifiers.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
        }
    }

    /// Create a key event with modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Check if Shift modifier is held.
    #[must_use]
    pub const fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    /// Check if any of Ctrl, Alt, or Super is held.
    #[must_use]
    pub const fn has_command_modifier(&self) -> bool {
        self.modifiers
            .intersects(Modifiers::CTRL.union(Modifiers::ALT).union(Modifiers::SUPER))
    }
}

/// Key codes the sheet cares about. Everything else arrives as `Char` or `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A printable character key.
    Char(char),
    /// Enter/Return key.
    Enter,
    /// Escape key.
    Escape,
    /// Tab key (Shift+Tab is `Tab` with [`Modifiers::SHIFT`]).
    Tab,
    /// Up arrow key.
    Up,
    /// Down arrow key.
    Down,
    /// Page Up key.
    PageUp,
    /// Page Down key.
    PageDown,
    /// Home key.
    Home,
    /// End key.
    End,
    /// Any key without a dedicated variant.
    Other,
}

impl KeyCode {
    /// Map a DOM `KeyboardEvent.key` value to a key code.
    #[must_use]
    pub fn from_dom_key(key: &str) -> Self {
        match key {
            "Enter" => Self::Enter,
            "Escape" | "Esc" => Self::Escape,
            "Tab" => Self::Tab,
            "ArrowUp" | "Up" => Self::Up,
            "ArrowDown" | "Down" => Self::Down,
            "PageUp" => Self::PageUp,
            "PageDown" => Self::PageDown,
            "Home" => Self::Home,
            "End" => Self::End,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::Char(c),
                    _ => Self::Other,
                }
            }
        }
    }
}

bitflags! {
    /// Modifier keys that can be held during a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Super/Meta/Command key.
        const SUPER = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dom_keys_map_to_codes() {
        assert_eq!(KeyCode::from_dom_key("Escape"), KeyCode::Escape);
        assert_eq!(KeyCode::from_dom_key("ArrowDown"), KeyCode::Down);
        assert_eq!(KeyCode::from_dom_key("PageUp"), KeyCode::PageUp);
        assert_eq!(KeyCode::from_dom_key("a"), KeyCode::Char('a'));
        assert_eq!(KeyCode::from_dom_key("F5"), KeyCode::Other);
        assert_eq!(KeyCode::from_dom_key(""), KeyCode::Other);
    }

    #[test]
    fn shift_tab_is_tab_with_shift() {
        let key = KeyEvent::new(KeyCode::Tab).with_modifiers(Modifiers::SHIFT);
        assert!(key.shift());
        assert!(!key.has_command_modifier());
    }

    #[test]
    fn command_modifiers_detected() {
        let key = KeyEvent::new(KeyCode::Char('k')).with_modifiers(Modifiers::CTRL);
        assert!(key.has_command_modifier());
    }

    #[test]
    fn pointer_constructors() {
        let m = PointerEvent::mouse(3.0, 4.0);
        assert_eq!(m.pointer_id, 1);
        assert_eq!(m.kind, PointerKind::Mouse);
        assert_eq!(m.position(), Point::new(3.0, 4.0));

        let t = PointerEvent::touch(7, 1.0, 2.0);
        assert_eq!(t.pointer_id, 7);
        assert_eq!(t.kind, PointerKind::Touch);
    }
}
