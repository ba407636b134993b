//! Active row tracking and keyboard traversal.
//!
//! The active index and the externally bound value are two views of one
//! selection. Every write names its [`UpdateOrigin`], and only the opposite
//! side is derived from it, so an update never feeds back into itself.

use crate::window::ResultWindow;

/// Which side of the binding a selection write came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOrigin {
    /// The result window changed; the index is re-resolved from the value
    Window,
    /// The active index moved (keyboard, hover, click); the value follows
    Index,
    /// The host set the value; the index follows, nothing is announced
    External,
}

/// Outcome of a selection write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionChange {
    pub origin: UpdateOrigin,
    pub previous: Option<usize>,
    pub current: Option<usize>,

    /// Set when the resolved value changed and the host should be told
    pub announce: Option<String>,
}

impl SelectionChange {
    #[must_use]
    pub fn index_changed(&self) -> bool {
        self.previous != self.current
    }
}

#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    active_index: Option<usize>,
    active_value: Option<String>,
    looping: bool,
}

impl SelectionController {
    #[must_use]
    pub fn new(initial_value: Option<String>, looping: bool) -> Self {
        Self {
            active_index: None,
            active_value: initial_value,
            looping,
        }
    }

    #[must_use]
    pub fn active_index(&self) -> Option<usize> {
        self.active_index
    }

    #[must_use]
    pub fn active_value(&self) -> Option<&str> {
        self.active_value.as_deref()
    }

    #[must_use]
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Re-resolve the active index after the window changed: keep the row
    /// holding the active value, else the first row, else nothing.
    pub fn sync_to_window(&mut self, window: &ResultWindow) -> SelectionChange {
        let index = if window.is_empty() {
            None
        } else {
            Some(
                self.active_value
                    .as_deref()
                    .and_then(|v| window.index_of_value(v))
                    .unwrap_or(0),
            )
        };
        self.apply(index, window, UpdateOrigin::Window)
    }

    /// Move the active row. Disabled or out-of-range targets are rejected.
    pub fn set_active_index(
        &mut self,
        index: usize,
        window: &ResultWindow,
    ) -> Option<SelectionChange> {
        let candidate = window.get(index)?;
        if candidate.disabled {
            return None;
        }
        Some(self.apply(Some(index), window, UpdateOrigin::Index))
    }

    /// Host-side write of the bound value. The index follows when the value
    /// is in the window; the value is never announced back.
    pub fn set_active_value(
        &mut self,
        value: Option<String>,
        window: &ResultWindow,
    ) -> SelectionChange {
        let target = value.as_deref().and_then(|v| window.index_of_value(v));
        self.active_value = value;

        let index = match target {
            Some(i) => Some(i),
            None => self.active_index,
        };
        self.apply(index, window, UpdateOrigin::External)
    }

    pub fn next(&mut self, window: &ResultWindow) -> Option<SelectionChange> {
        let target = self.step(window, true)?;
        self.move_to(target, window)
    }

    pub fn previous(&mut self, window: &ResultWindow) -> Option<SelectionChange> {
        let target = self.step(window, false)?;
        self.move_to(target, window)
    }

    pub fn first(&mut self, window: &ResultWindow) -> Option<SelectionChange> {
        let target = (0..window.len()).find(|&i| is_enabled(window, i))?;
        self.move_to(target, window)
    }

    pub fn last(&mut self, window: &ResultWindow) -> Option<SelectionChange> {
        let target = (0..window.len()).rev().find(|&i| is_enabled(window, i))?;
        self.move_to(target, window)
    }

    fn move_to(&mut self, target: usize, window: &ResultWindow) -> Option<SelectionChange> {
        if self.active_index == Some(target) {
            return None;
        }
        Some(self.apply(Some(target), window, UpdateOrigin::Index))
    }

    /// Next enabled index in one direction, visiting each row at most once.
    fn step(&self, window: &ResultWindow, forward: bool) -> Option<usize> {
        let len = window.len();
        if len == 0 {
            return None;
        }

        let mut cursor = self.active_index.filter(|&i| i < len);
        for _ in 0..len {
            let next = match (cursor, forward) {
                (None, true) => 0,
                (None, false) => len - 1,
                (Some(i), true) if i + 1 < len => i + 1,
                (Some(_), true) if self.looping => 0,
                (Some(i), false) if i > 0 => i - 1,
                (Some(_), false) if self.looping => len - 1,
                (Some(_), _) => return None,
            };
            if is_enabled(window, next) {
                return Some(next);
            }
            cursor = Some(next);
        }
        None
    }

    fn apply(
        &mut self,
        index: Option<usize>,
        window: &ResultWindow,
        origin: UpdateOrigin,
    ) -> SelectionChange {
        let previous = self.active_index;
        self.active_index = index;

        let mut announce = None;
        if origin != UpdateOrigin::External
            && let Some(candidate) = index.and_then(|i| window.get(i))
            && self.active_value.as_deref() != Some(candidate.value.as_str())
        {
            self.active_value = Some(candidate.value.clone());
            announce = Some(candidate.value.clone());
        }

        SelectionChange {
            origin,
            previous,
            current: index,
            announce,
        }
    }
}

fn is_enabled(window: &ResultWindow, index: usize) -> bool {
    window.get(index).is_some_and(|c| !c.disabled)
}
