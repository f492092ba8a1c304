#![forbid(unsafe_code)]

//! Tab-cycling confined to the sheet's focusable elements.
//!
//! # Failure Modes
//!
//! - An empty focus list yields `None`; focus is left where it is.
//! - Focus outside the list (or none) enters at the first element, or the
//!   last when moving backwards.

use crate::host::FocusId;

/// Next focus target when tabbing from `current`, wrapping at both ends.
#[must_use]
pub fn next_focus(targets: &[FocusId], current: Option<FocusId>, backwards: bool) -> Option<FocusId> {
    let len = targets.len();
    if len == 0 {
        return None;
    }
    let pos = current.and_then(|id| targets.iter().position(|&t| t == id));
    let next = match (pos, backwards) {
        (None, false) => 0,
        (None, true) => len - 1,
        (Some(i), false) => (i + 1) % len,
        (Some(i), true) => (i + len - 1) % len,
    };
    targets.get(next).copied()
}

/// Where focus lands when the sheet opens.
#[must_use]
pub fn initial_focus(targets: &[FocusId]) -> Option<FocusId> {
    targets.first().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_forward_and_backward() {
        let ids = [10, 20, 30];
        assert_eq!(next_focus(&ids, Some(10), false), Some(20));
        assert_eq!(next_focus(&ids, Some(30), false), Some(10));
        assert_eq!(next_focus(&ids, Some(10), true), Some(30));
        assert_eq!(next_focus(&ids, Some(20), true), Some(10));
    }

    #[test]
    fn enters_from_outside() {
        let ids = [10, 20, 30];
        assert_eq!(next_focus(&ids, None, false), Some(10));
        assert_eq!(next_focus(&ids, Some(99), true), Some(30));
    }

    #[test]
    fn empty_group_leaves_focus_alone() {
        assert_eq!(next_focus(&[], Some(1), false), None);
        assert_eq!(initial_focus(&[]), None);
    }

    #[test]
    fn single_element_stays_put() {
        assert_eq!(next_focus(&[7], Some(7), false), Some(7));
        assert_eq!(next_focus(&[7], Some(7), true), Some(7));
    }
}
