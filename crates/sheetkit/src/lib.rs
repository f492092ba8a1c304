#![forbid(unsafe_code)]

//! Bottom-sheet engine.
//!
//! # Role in SheetKit
//! `sheetkit` turns the classifiers and models of `sheetkit-core` into a
//! complete sheet: open/close lifecycle with focus, scroll lock, inert
//! marking and navigation-history dismissal; snap positioning; the
//! dismissal rules for drags and flings; keyboard behaviour layered under
//! the dynamic keydown registry; and pure render-parameter derivation.
//!
//! # How it fits in the system
//! The host (a WASM/JS shell, a native shell, a test harness) forwards raw
//! input to a [`Sheet`], calls [`Sheet::frame`] while the sheet is visible,
//! renders [`SheetStyle`], and reacts to drained [`SheetEvent`]s. Everything
//! the engine needs from the outside world goes through the traits in
//! [`host`].

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod focus_trap;
pub mod host;
pub mod lifecycle;
pub mod position;
pub mod stacking;

pub use config::{OpenAnimation, SheetConfig};
pub use engine::{PointerIgnore, PointerOutcome, Sheet};
pub use error::{ConfigError, HostError, SheetError};
pub use events::SheetEvent;
pub use host::{
    CloseGuard, Confirmation, FocusHost, FocusId, HistoryHost, InertHost, NoopHost,
    ScrollLockHost, SheetHosts, StaticView, ViewHost,
};
pub use lifecycle::{CloseOutcome, CloseReason, CloseTicket, LifecyclePhase};
pub use position::{PositionState, SheetStyle};
pub use stacking::{StackIndex, StackingContext};

pub use sheetkit_core as core;

/// Target used by every span and event emitted from this crate.
pub const LOG_TARGET: &str = "sheetkit";
