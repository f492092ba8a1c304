#![forbid(unsafe_code)]

//! Priority-ordered keydown handler registry.
//!
//! The sheet layers dynamically registered keyboard handlers above its
//! built-in focus-trap / Escape / snap-navigation behaviour. Handlers run
//! from highest to lowest priority; equal priorities run in registration
//! order. The first handler that reports [`Propagation::Handled`] (or calls
//! [`KeyDispatch::consume`]) stops the dispatch, including the built-ins.
//!
//! # Invariants
//!
//! 1. Entries are sorted by descending priority; ties keep insertion order.
//! 2. [`KeydownRegistry::run`] iterates a snapshot: registering or
//!    unregistering from inside a handler never corrupts or skips the
//!    remaining entries of the dispatch in progress.
//! 3. A `once` registration is deactivated before its first invocation runs,
//!    whatever the handler returns.
//! 4. A failing handler is reported and skipped; the loop continues.
//!
//! # Failure Modes
//!
//! - A handler that re-enters `run` for a key that would invoke itself again
//!   is skipped for the nested dispatch and counted as failed.
//!
//! # Example
//!
//! ```
//! use sheetkit_core::event::{KeyCode, KeyEvent};
//! use sheetkit_core::keydown::{KeydownOptions, KeydownRegistry, Propagation};
//!
//! let registry = KeydownRegistry::new();
//! let handle = registry.on(KeydownOptions::new().priority(10), |dispatch| {
//!     if dispatch.key().code == KeyCode::Enter {
//!         Ok(Propagation::Handled)
//!     } else {
//!         Ok(Propagation::Continue)
//!     }
//! });
//!
//! assert!(registry.run(&KeyEvent::new(KeyCode::Enter)).handled);
//! assert!(!registry.run(&KeyEvent::new(KeyCode::Tab)).handled);
//! assert!(handle.unregister());
//! assert!(registry.is_empty());
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use thiserror::Error;

use crate::event::KeyEvent;

/// Failure reported by a keydown handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeydownError {
    /// The handler reported a failure of its own.
    #[error("keydown handler failed: {0}")]
    Handler(String),
    /// The handler was already running higher up the call stack.
    #[error("keydown handler re-entered during its own dispatch")]
    Reentrant,
}

/// Whether the dispatch continues after a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Propagation {
    /// Let lower-priority handlers and the built-ins see the key.
    #[default]
    Continue,
    /// Stop here.
    Handled,
}

/// Result type returned by keydown handlers.
pub type KeydownResult = Result<Propagation, KeydownError>;

type Handler = Box<dyn FnMut(&mut KeyDispatch<'_>) -> KeydownResult>;

/// The key being dispatched plus a consumed flag handlers may set.
#[derive(Debug)]
pub struct KeyDispatch<'a> {
    key: &'a KeyEvent,
    consumed: bool,
}

impl<'a> KeyDispatch<'a> {
    fn new(key: &'a KeyEvent) -> Self {
        Self {
            key,
            consumed: false,
        }
    }

    /// The key event.
    #[must_use]
    pub fn key(&self) -> &KeyEvent {
        self.key
    }

    /// Mark the key as consumed; equivalent to returning `Handled`.
    pub fn consume(&mut self) {
        self.consumed = true;
    }

    /// Whether [`consume`](Self::consume) was called.
    #[must_use]
    pub fn is_consumed(&self) -> bool {
        self.consumed
    }
}

/// Registration options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeydownOptions {
    /// Higher runs first.
    pub priority: i32,
    /// Deactivate after the first invocation.
    pub once: bool,
}

impl KeydownOptions {
    /// Priority 0, persistent.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            priority: 0,
            once: false,
        }
    }

    /// Set the priority.
    #[must_use]
    pub const fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Run at most once.
    #[must_use]
    pub const fn once(mut self) -> Self {
        self.once = true;
        self
    }
}

/// Summary of one [`KeydownRegistry::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchReport {
    /// Some handler handled or consumed the key.
    pub handled: bool,
    /// Handlers invoked (including failed ones).
    pub invoked: usize,
    /// Handlers that returned an error.
    pub failed: usize,
}

struct Registration {
    id: u64,
    priority: Cell<i32>,
    once: bool,
    active: Cell<bool>,
    handler: RefCell<Handler>,
}

struct RegistryInner {
    entries: Vec<Rc<Registration>>,
    next_id: u64,
}

impl Default for RegistryInner {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }
}

impl RegistryInner {
    /// Insert after every entry with priority ≥ `reg.priority`.
    fn insert_sorted(&mut self, reg: Rc<Registration>) {
        let pos = self
            .entries
            .iter()
            .position(|e| e.priority.get() < reg.priority.get())
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, reg);
    }

    fn remove(&mut self, id: u64) -> Option<Rc<Registration>> {
        let pos = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(pos))
    }
}

/// Shared, dynamically mutable keydown registry.
///
/// Cloning produces another handle to the same registry, so handlers can
/// capture a clone and register or unregister others while running.
#[derive(Clone, Default)]
pub struct KeydownRegistry {
    inner: Rc<RefCell<RegistryInner>>,
}

impl fmt::Debug for KeydownRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("KeydownRegistry")
            .field("len", &inner.entries.len())
            .field(
                "priorities",
                &inner.entries.iter().map(|e| e.priority.get()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl KeydownRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Returns a handle that unregisters it.
    pub fn on<F>(&self, options: KeydownOptions, handler: F) -> KeydownHandle
    where
        F: FnMut(&mut KeyDispatch<'_>) -> KeydownResult + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.insert_sorted(Rc::new(Registration {
            id,
            priority: Cell::new(options.priority),
            once: options.once,
            active: Cell::new(true),
            handler: RefCell::new(Box::new(handler)),
        }));
        KeydownHandle {
            id,
            registry: Rc::downgrade(&self.inner),
        }
    }

    /// Dispatch `key` through the active handlers, highest priority first.
    pub fn run(&self, key: &KeyEvent) -> DispatchReport {
        let snapshot: Vec<Rc<Registration>> = self.inner.borrow().entries.clone();
        let mut report = DispatchReport::default();

        for reg in snapshot {
            if !reg.active.get() {
                continue;
            }
            if reg.once {
                reg.active.set(false);
                self.inner.borrow_mut().remove(reg.id);
            }

            let mut dispatch = KeyDispatch::new(key);
            let result = match reg.handler.try_borrow_mut() {
                Ok(mut handler) => {
                    let call: &mut Handler = &mut handler;
                    call(&mut dispatch)
                }
                Err(_) => Err(KeydownError::Reentrant),
            };
            report.invoked += 1;

            match result {
                Ok(Propagation::Handled) => {
                    report.handled = true;
                    return report;
                }
                Ok(Propagation::Continue) => {}
                Err(_err) => {
                    report.failed += 1;
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        target: crate::logging::LOG_TARGET,
                        handler = reg.id,
                        priority = reg.priority.get(),
                        error = %_err,
                        "keydown handler failed; continuing dispatch"
                    );
                }
            }
            if dispatch.is_consumed() {
                report.handled = true;
                return report;
            }
        }
        report
    }

    /// Remove every registration.
    pub fn clear(&self) {
        let drained: Vec<Rc<Registration>> = self.inner.borrow_mut().entries.drain(..).collect();
        for reg in drained {
            reg.active.set(false);
        }
    }

    /// Number of active registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    /// No registrations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().entries.is_empty()
    }

    /// Priorities in dispatch order.
    #[must_use]
    pub fn priorities(&self) -> Vec<i32> {
        self.inner
            .borrow()
            .entries
            .iter()
            .map(|e| e.priority.get())
            .collect()
    }
}

/// Handle returned by [`KeydownRegistry::on`].
///
/// Dropping the handle does not unregister; call [`unregister`](Self::unregister).
#[derive(Debug, Clone)]
pub struct KeydownHandle {
    id: u64,
    registry: Weak<RefCell<RegistryInner>>,
}

impl KeydownHandle {
    /// Registration id (unique per registry).
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Remove the registration. Returns `false` if it was already gone.
    pub fn unregister(&self) -> bool {
        let Some(inner) = self.registry.upgrade() else {
            return false;
        };
        let removed = inner.borrow_mut().remove(self.id);
        match removed {
            Some(reg) => {
                reg.active.set(false);
                true
            }
            None => false,
        }
    }

    /// Whether the registration is still present.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|inner| inner.borrow().entries.iter().any(|e| e.id == self.id))
    }

    /// Move the registration to a new priority, behind existing equals.
    ///
    /// A dispatch already in progress keeps its order; the change applies
    /// from the next [`KeydownRegistry::run`]. Setting the current priority
    /// leaves the position unchanged. Returns `false` if the registration is
    /// gone.
    pub fn set_priority(&self, priority: i32) -> bool {
        let Some(inner) = self.registry.upgrade() else {
            return false;
        };
        let mut inner = inner.borrow_mut();
        let Some(pos) = inner.entries.iter().position(|e| e.id == self.id) else {
            return false;
        };
        if inner.entries[pos].priority.get() == priority {
            return true;
        }
        let reg = inner.entries.remove(pos);
        reg.priority.set(priority);
        inner.insert_sorted(reg);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::KeyCode;

    fn esc() -> KeyEvent {
        KeyEvent::new(KeyCode::Escape)
    }

    fn recorder(log: &Rc<RefCell<Vec<&'static str>>>, name: &'static str) -> impl FnMut(&mut KeyDispatch<'_>) -> KeydownResult + 'static {
        let log = Rc::clone(log);
        move |_| {
            log.borrow_mut().push(name);
            Ok(Propagation::Continue)
        }
    }

    #[test]
    fn runs_by_descending_priority_with_stable_ties() {
        let reg = KeydownRegistry::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        reg.on(KeydownOptions::new().priority(0), recorder(&log, "a0"));
        reg.on(KeydownOptions::new().priority(10), recorder(&log, "b10"));
        reg.on(KeydownOptions::new().priority(0), recorder(&log, "c0"));
        reg.on(KeydownOptions::new().priority(10), recorder(&log, "d10"));
        reg.on(KeydownOptions::new().priority(-5), recorder(&log, "e-5"));

        let report = reg.run(&esc());
        assert!(!report.handled);
        assert_eq!(report.invoked, 5);
        assert_eq!(*log.borrow(), vec!["b10", "d10", "a0", "c0", "e-5"]);
        assert_eq!(reg.priorities(), vec![10, 10, 0, 0, -5]);
    }

    #[test]
    fn handled_short_circuits() {
        let reg = KeydownRegistry::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        reg.on(KeydownOptions::new().priority(5), |_| Ok(Propagation::Handled));
        reg.on(KeydownOptions::new(), recorder(&log, "low"));
        let report = reg.run(&esc());
        assert!(report.handled);
        assert_eq!(report.invoked, 1);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn consume_short_circuits() {
        let reg = KeydownRegistry::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        reg.on(KeydownOptions::new().priority(5), |d| {
            d.consume();
            Ok(Propagation::Continue)
        });
        reg.on(KeydownOptions::new(), recorder(&log, "low"));
        assert!(reg.run(&esc()).handled);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn once_deactivates_even_when_not_handled() {
        let reg = KeydownRegistry::new();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        reg.on(KeydownOptions::new().once(), move |_| {
            c.set(c.get() + 1);
            Ok(Propagation::Continue)
        });
        reg.run(&esc());
        reg.run(&esc());
        assert_eq!(count.get(), 1);
        assert!(reg.is_empty());
    }

    #[test]
    fn failing_handler_does_not_abort_dispatch() {
        let reg = KeydownRegistry::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        reg.on(KeydownOptions::new().priority(3), |_| {
            Err(KeydownError::Handler("boom".into()))
        });
        reg.on(KeydownOptions::new(), recorder(&log, "after"));
        let report = reg.run(&esc());
        assert_eq!(report.failed, 1);
        assert_eq!(report.invoked, 2);
        assert_eq!(*log.borrow(), vec!["after"]);
    }

    #[test]
    fn unregister_during_dispatch_is_safe() {
        let reg = KeydownRegistry::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let victim: Rc<RefCell<Option<KeydownHandle>>> = Rc::new(RefCell::new(None));

        let v = Rc::clone(&victim);
        let l = Rc::clone(&log);
        reg.on(KeydownOptions::new().priority(10), move |_| {
            l.borrow_mut().push("killer");
            if let Some(h) = v.borrow().as_ref() {
                h.unregister();
            }
            Ok(Propagation::Continue)
        });
        let h = reg.on(KeydownOptions::new().priority(5), recorder(&log, "victim"));
        *victim.borrow_mut() = Some(h);
        reg.on(KeydownOptions::new().priority(1), recorder(&log, "survivor"));

        reg.run(&esc());
        assert_eq!(*log.borrow(), vec!["killer", "survivor"]);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn register_during_dispatch_applies_next_run() {
        let reg = KeydownRegistry::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let inner_reg = reg.clone();
        let l = Rc::clone(&log);
        reg.on(KeydownOptions::new().once(), move |_| {
            inner_reg.on(KeydownOptions::new().priority(100), recorder(&l, "late"));
            Ok(Propagation::Continue)
        });
        reg.run(&esc());
        assert!(log.borrow().is_empty());
        reg.run(&esc());
        assert_eq!(*log.borrow(), vec!["late"]);
    }

    #[test]
    fn clear_and_set_priority() {
        let reg = KeydownRegistry::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let a = reg.on(KeydownOptions::new().priority(1), recorder(&log, "a"));
        reg.on(KeydownOptions::new().priority(2), recorder(&log, "b"));
        assert!(a.set_priority(3));
        reg.run(&esc());
        assert_eq!(*log.borrow(), vec!["a", "b"]);

        reg.clear();
        assert!(reg.is_empty());
        assert!(!a.is_registered());
        assert!(!a.unregister());
    }

    #[test]
    fn set_priority_from_inside_a_handler_reorders_next_run() {
        let reg = KeydownRegistry::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let slot: Rc<RefCell<Option<KeydownHandle>>> = Rc::new(RefCell::new(None));

        let s = Rc::clone(&slot);
        let l = Rc::clone(&log);
        let a = reg.on(KeydownOptions::new(), move |_| {
            l.borrow_mut().push("a");
            if let Some(h) = s.borrow().as_ref() {
                assert!(h.set_priority(5));
            }
            Ok(Propagation::Continue)
        });
        *slot.borrow_mut() = Some(a.clone());
        let b = reg.on(KeydownOptions::new(), recorder(&log, "b"));

        reg.run(&esc());
        assert_eq!(*log.borrow(), vec!["a", "b"]);
        assert_eq!(reg.priorities(), vec![5, 0]);

        log.borrow_mut().clear();
        reg.run(&esc());
        assert_eq!(*log.borrow(), vec!["a", "b"]);

        // Joining an equal priority queues behind it.
        assert!(b.set_priority(5));
        assert_eq!(reg.priorities(), vec![5, 5]);
        log.borrow_mut().clear();
        reg.run(&esc());
        assert_eq!(*log.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn set_priority_to_current_value_keeps_tie_order() {
        let reg = KeydownRegistry::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let a = reg.on(KeydownOptions::new(), recorder(&log, "a"));
        reg.on(KeydownOptions::new(), recorder(&log, "b"));
        assert!(a.set_priority(0));
        reg.run(&esc());
        assert_eq!(*log.borrow(), vec!["a", "b"]);
        assert!(a.unregister());
        assert!(!a.set_priority(1));
    }
}
