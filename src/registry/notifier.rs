//! Change notification for registry consumers
//!
//! The registry announces two kinds of change: a device was added, or an
//! existing device was updated by a frame. Each kind has a single callback
//! slot; registering again replaces the previous callback.
//!
//! Callbacks run synchronously on the thread that made the registry call,
//! before that call returns. They receive a snapshot of the record taken
//! after the mutation, and the registry's map lock is not held while they
//! run, so a callback may call back into the registry.

use std::sync::{Arc, Mutex, PoisonError};

use super::entry::DeviceRecord;

type Callback<H> = Arc<dyn Fn(&DeviceRecord<H>) + Send + Sync>;

/// Kind of catalog change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    /// A record was created
    Added,
    /// An existing record was refreshed by a frame
    Updated,
}

/// Single-slot observer registry for catalog changes
pub struct ChangeNotifier<H = ()> {
    added: Mutex<Option<Callback<H>>>,
    updated: Mutex<Option<Callback<H>>>,
}

impl<H> ChangeNotifier<H> {
    /// Create a notifier with no callbacks
    pub fn new() -> Self {
        Self {
            added: Mutex::new(None),
            updated: Mutex::new(None),
        }
    }

    /// Set the callback for newly added devices, replacing any previous one
    pub fn on_added<F>(&self, callback: F)
    where
        F: Fn(&DeviceRecord<H>) + Send + Sync + 'static,
    {
        self.set(ChangeEvent::Added, Some(Arc::new(callback)));
    }

    /// Set the callback for updated devices, replacing any previous one
    pub fn on_updated<F>(&self, callback: F)
    where
        F: Fn(&DeviceRecord<H>) + Send + Sync + 'static,
    {
        self.set(ChangeEvent::Updated, Some(Arc::new(callback)));
    }

    /// Remove the callback for one event kind
    pub fn clear(&self, event: ChangeEvent) {
        self.set(event, None);
    }

    /// Check if a callback is registered for `event`
    pub fn is_registered(&self, event: ChangeEvent) -> bool {
        self.slot(event)
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Invoke the callback for `event`, if any
    pub(crate) fn notify(&self, event: ChangeEvent, record: &DeviceRecord<H>) {
        // Clone the Arc out so the slot is free while the callback runs
        let callback = self
            .slot(event)
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        if let Some(callback) = callback {
            callback(record);
        }
    }

    fn set(&self, event: ChangeEvent, callback: Option<Callback<H>>) {
        *self.slot(event).lock().unwrap_or_else(PoisonError::into_inner) = callback;
    }

    fn slot(&self, event: ChangeEvent) -> &Mutex<Option<Callback<H>>> {
        match event {
            ChangeEvent::Added => &self.added,
            ChangeEvent::Updated => &self.updated,
        }
    }
}

impl<H> Default for ChangeNotifier<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> std::fmt::Debug for ChangeNotifier<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("added", &self.is_registered(ChangeEvent::Added))
            .field("updated", &self.is_registered(ChangeEvent::Updated))
            .finish()
    }
}
