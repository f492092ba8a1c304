#![forbid(unsafe_code)]

//! Core: input events, gesture classification, snap model, and keydown dispatch.
//!
//! # Role in SheetKit
//! `sheetkit-core` is the input layer of the bottom-sheet engine. Everything
//! here is free of collaborators and lifecycle: pure geometry and physics,
//! the normalized snap model, the per-interaction [`gesture::GestureSession`],
//! the secondary classifiers (double-tap, wheel), and the priority-ordered
//! [`keydown::KeydownRegistry`].
//!
//! # How it fits in the system
//! The engine crate (`sheetkit`) owns one instance of each stateful type per
//! sheet, feeds them host events with explicit timestamps, and turns their
//! outcomes into lifecycle transitions and render parameters.

pub mod event;
pub mod geometry;
pub mod gesture;
pub mod keydown;
pub mod logging;
pub mod snap;
pub mod tap;
pub mod velocity;
pub mod wheel;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, debug_span, error, info, trace, warn};
