//! # Event-capable objects and their resolution.
//!
//! - [`Occurrence`] - payload of one low-level event
//! - [`EventTarget`] / [`Listener`] - the primitive subscription surface
//! - [`Element`] - in-process event target
//! - [`Resolve`] / [`Document`] - target identifier lookup (globals + selectors)

mod element;
mod occurrence;
mod resolve;

pub use element::{Element, EventTarget, Listener, TargetRef};
pub use occurrence::Occurrence;
pub use resolve::{Document, GLOBALS, Resolve};
