//! # Target resolution.
//!
//! [`Resolve`] maps a target identifier to an event-capable object. It is consulted
//! only when a record is created for a `(target, event type)` pair.
//!
//! [`Document`] is the in-process resolver: it recognizes the well-known globals
//! [`GLOBALS`] and any selector previously [`insert`](Document::insert)ed.
//!
//! ## Ownership
//! The resolver owns the targets it returns; records keep only a weak reference.
//! A target dropped by its resolver silently takes its listeners with it.
//!
//! ## Example
//! ```rust
//! use unifier::{Document, Element, Resolve, ResolutionError};
//!
//! let doc = Document::new();
//! doc.insert("#list", Element::arc("#list"));
//!
//! assert!(doc.resolve("window").is_ok());
//! assert!(doc.resolve("#list").is_ok());
//! assert!(matches!(doc.resolve(".not-found"), Err(ResolutionError::NotFound { .. })));
//! assert!(matches!(doc.resolve(""), Err(ResolutionError::InvalidTarget { .. })));
//! ```

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::ResolutionError;
use crate::targets::element::{Element, TargetRef};

/// Global identifiers that cannot be addressed by selector, in [`Document`] slot order.
pub const GLOBALS: [&str; 2] = ["window", "document"];

/// Maps target identifiers to event-capable objects.
///
/// Called without any service lock held; implementations may call back into the service.
pub trait Resolve: Send + Sync + 'static {
    /// Resolves `target`, failing with [`ResolutionError`] when it is unusable or unknown.
    fn resolve(&self, target: &str) -> Result<TargetRef, ResolutionError>;
}

/// In-process resolver with `window`/`document` globals and named elements.
pub struct Document {
    globals: [Arc<Element>; GLOBALS.len()],
    elements: RwLock<HashMap<String, Arc<Element>>>,
}

impl Document {
    /// Creates a document holding only the globals.
    pub fn new() -> Self {
        Self {
            globals: GLOBALS.map(|name| Element::arc(name)),
            elements: RwLock::new(HashMap::new()),
        }
    }

    /// The `window` global.
    pub fn window(&self) -> &Arc<Element> {
        &self.globals[0]
    }

    /// The `document` global.
    pub fn document(&self) -> &Arc<Element> {
        &self.globals[1]
    }

    /// Makes `element` addressable under `selector`, returning the previous element if any.
    pub fn insert(&self, selector: impl Into<String>, element: Arc<Element>) -> Option<Arc<Element>> {
        let mut map = self.elements.write().unwrap_or_else(PoisonError::into_inner);
        map.insert(selector.into(), element)
    }

    /// Removes the element addressable under `selector`.
    pub fn remove(&self, selector: &str) -> Option<Arc<Element>> {
        let mut map = self.elements.write().unwrap_or_else(PoisonError::into_inner);
        map.remove(selector)
    }

    /// Looks up an element by identifier; globals take precedence over selectors.
    pub fn element(&self, target: &str) -> Option<Arc<Element>> {
        if let Some(slot) = GLOBALS.iter().position(|g| *g == target) {
            return Some(self.globals[slot].clone());
        }
        let map = self.elements.read().unwrap_or_else(PoisonError::into_inner);
        map.get(target).cloned()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolve for Document {
    fn resolve(&self, target: &str) -> Result<TargetRef, ResolutionError> {
        if target.trim().is_empty() {
            return Err(ResolutionError::InvalidTarget {
                target: target.to_string(),
            });
        }

        match self.element(target) {
            Some(el) => Ok(el as TargetRef),
            None => Err(ResolutionError::NotFound {
                target: target.to_string(),
            }),
        }
    }
}
