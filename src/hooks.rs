//! Host extension hooks.
//!
//! Hosts can observe (and in one case influence) reducer decisions through a
//! small set of optional function slots. Hooks receive owned copies, so they
//! can never reach the state being reduced.
//!
//! # Examples
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use region_annotator::HostHooks;
//!
//! let deleted = Rc::new(Cell::new(0));
//! let counter = deleted.clone();
//! let hooks = HostHooks::new().on_delete_region(move |_region| counter.set(counter.get() + 1));
//! assert!(hooks.custom_delete_region.is_some());
//! ```

use std::fmt;

use crate::model::{Region, RegionId};

/// An optional function slot.
///
/// - `T`: The input type of the hook
/// - `R`: The value the hook returns to the reducer
pub struct Callback<T, R> {
    f: Option<Box<dyn Fn(T) -> R>>,
}

impl<T, R> Callback<T, R> {
    /// Create a new callback from a function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(T) -> R + 'static,
    {
        Self {
            f: Some(Box::new(f)),
        }
    }

    /// Create an empty callback (no handler).
    pub fn none() -> Self {
        Self { f: None }
    }

    /// Call the callback with a value, if it exists.
    pub fn call(&self, value: T) -> Option<R> {
        self.f.as_ref().map(|f| f(value))
    }

    /// Check if the callback is set.
    pub fn is_some(&self) -> bool {
        self.f.is_some()
    }

    /// Check if the callback is not set.
    pub fn is_none(&self) -> bool {
        self.f.is_none()
    }
}

impl<T, R> Default for Callback<T, R> {
    fn default() -> Self {
        Self::none()
    }
}

impl<T, R> fmt::Debug for Callback<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("set", &self.is_some())
            .finish()
    }
}

/// The hook slots a host may fill.
#[derive(Debug, Default)]
pub struct HostHooks {
    /// Returns the snap distance for closing a polygon at its first vertex
    pub custom_close_region: Callback<Region, Option<f64>>,
    /// A region was deleted
    pub custom_delete_region: Callback<Region, ()>,
    /// A region was selected
    pub custom_select_region: Callback<Region, ()>,
    /// The region editor was opened
    pub custom_open_region: Callback<RegionId, ()>,
    /// `LINK_RESOURCE` was dispatched
    pub on_link_resource: Callback<RegionId, ()>,
    /// Any mouse down on the canvas
    pub custom_mouse_down: Callback<(), ()>,
    /// A create tool created a new region
    pub custom_add_region_click: Callback<(), ()>,
}

impl HostHooks {
    /// Hooks with every slot empty.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_close_region<F>(mut self, f: F) -> Self
    where
        F: Fn(Region) -> Option<f64> + 'static,
    {
        self.custom_close_region = Callback::new(f);
        self
    }

    pub fn on_delete_region<F>(mut self, f: F) -> Self
    where
        F: Fn(Region) + 'static,
    {
        self.custom_delete_region = Callback::new(f);
        self
    }

    pub fn on_select_region<F>(mut self, f: F) -> Self
    where
        F: Fn(Region) + 'static,
    {
        self.custom_select_region = Callback::new(f);
        self
    }

    pub fn on_open_region<F>(mut self, f: F) -> Self
    where
        F: Fn(RegionId) + 'static,
    {
        self.custom_open_region = Callback::new(f);
        self
    }

    pub fn on_link_resource<F>(mut self, f: F) -> Self
    where
        F: Fn(RegionId) + 'static,
    {
        self.on_link_resource = Callback::new(f);
        self
    }

    pub fn on_mouse_down<F>(mut self, f: F) -> Self
    where
        F: Fn() + 'static,
    {
        self.custom_mouse_down = Callback::new(move |()| f());
        self
    }

    pub fn on_add_region_click<F>(mut self, f: F) -> Self
    where
        F: Fn() + 'static,
    {
        self.custom_add_region_click = Callback::new(move |()| f());
        self
    }
}
