//! # Handler registry - owner of every live binding.
//!
//! Maps `target → event type → HandlerRecord` and indexes records by
//! [`ChannelId`] so the dispatch engine never re-derives string keys.
//!
//! The registry only does bookkeeping. Resolving targets and attaching or
//! detaching low-level listeners runs user code, so the service does that
//! after releasing the registry lock:
//!
//! ```text
//! register:    resolver()  ─► (unlocked) resolve(target)
//!              get_or_insert(target, type, element, interval, make_trigger)
//!                ├─► hit  → existing record (interval ignored)
//!                └─► miss → channel = next id (never reused), store record
//!              (unlocked) element.add_listener(type, trigger)
//!
//! unregister:  remove(target, type) → record
//!              (unlocked) record.detach()
//! ```
//!
//! ## Rules
//! - At most one record, hence one low-level listener, per `(target, event type)`.
//! - `remove` on an unknown pair is a no-op.
//! - `all()` lists records in creation order.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::time::Duration;

use crate::core::record::{ChannelId, HandlerRecord};
use crate::targets::{Listener, Resolve, TargetRef};

pub(crate) struct Registry {
    targets: HashMap<Arc<str>, HashMap<Arc<str>, HandlerRecord>>,
    channels: HashMap<ChannelId, (Arc<str>, Arc<str>)>,
    next_channel: u64,
    resolver: Arc<dyn Resolve>,
}

impl Registry {
    pub(crate) fn new(resolver: Arc<dyn Resolve>) -> Self {
        Self {
            targets: HashMap::new(),
            channels: HashMap::new(),
            next_channel: 0,
            resolver,
        }
    }

    /// Resolver handle, to be consulted without holding the registry lock.
    pub(crate) fn resolver(&self) -> Arc<dyn Resolve> {
        Arc::clone(&self.resolver)
    }

    /// Returns the record for the pair, storing a new one bound to `element` if absent.
    ///
    /// The boolean is `true` when the record was created by this call; the caller
    /// then owns attaching its trigger to `element`.
    pub(crate) fn get_or_insert<F>(
        &mut self,
        target: &str,
        event_type: &str,
        element: &TargetRef,
        interval: Duration,
        make_trigger: F,
    ) -> (&mut HandlerRecord, bool)
    where
        F: FnOnce(ChannelId) -> Listener,
    {
        let t: Arc<str> = target.into();
        let events = self.targets.entry(t.clone()).or_default();
        match events.entry(event_type.into()) {
            Entry::Occupied(slot) => (slot.into_mut(), false),
            Entry::Vacant(slot) => {
                self.next_channel += 1;
                let channel = ChannelId(self.next_channel);
                let e = slot.key().clone();
                self.channels.insert(channel, (t.clone(), e.clone()));
                let record = HandlerRecord::new(
                    t,
                    e,
                    Arc::downgrade(element),
                    make_trigger(channel),
                    channel,
                    interval,
                );
                (slot.insert(record), true)
            }
        }
    }

    pub(crate) fn get(&self, target: &str, event_type: &str) -> Option<&HandlerRecord> {
        self.targets.get(target)?.get(event_type)
    }

    pub(crate) fn get_mut(&mut self, target: &str, event_type: &str) -> Option<&mut HandlerRecord> {
        self.targets.get_mut(target)?.get_mut(event_type)
    }

    pub(crate) fn by_channel_mut(&mut self, channel: ChannelId) -> Option<&mut HandlerRecord> {
        let (target, event_type) = self.channels.get(&channel)?;
        self.targets.get_mut(target)?.get_mut(event_type)
    }

    /// Unlinks the record for the pair; no-op when absent.
    ///
    /// The returned record is still attached; call [`HandlerRecord::detach`] once
    /// the lock is released.
    pub(crate) fn remove(&mut self, target: &str, event_type: &str) -> Option<HandlerRecord> {
        let events = self.targets.get_mut(target)?;
        let record = events.remove(event_type)?;
        if events.is_empty() {
            self.targets.remove(target);
        }
        self.channels.remove(&record.channel);
        Some(record)
    }

    /// Every live record, in creation order.
    pub(crate) fn all(&mut self) -> Vec<&mut HandlerRecord> {
        let mut records: Vec<&mut HandlerRecord> =
            self.targets.values_mut().flat_map(|events| events.values_mut()).collect();
        records.sort_unstable_by_key(|r| r.channel);
        records
    }

    /// Sorted list of targets with at least one record.
    pub(crate) fn targets(&self) -> Vec<String> {
        let mut names: Vec<String> = self.targets.keys().map(|t| t.to_string()).collect();
        names.sort_unstable();
        names
    }

    pub(crate) fn len(&self) -> usize {
        self.channels.len()
    }

    pub(crate) fn channel_of(&self, target: &str, event_type: &str) -> Option<ChannelId> {
        self.get(target, event_type).map(|r| r.channel)
    }
}
