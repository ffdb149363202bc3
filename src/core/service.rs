//! # UnifiedEventService: one low-level listener per (target, event type), many callbacks.
//!
//! The [`UnifiedEventService`] is the public facade. It owns the handler registry
//! and the dispatch engine, and drives each `(target, event type)` pair through a
//! two-state machine:
//!
//! ```text
//!            register (creates record, attaches listener)
//!   Unbound ───────────────────────────────────────────────► Bound
//!      ▲                                                      │  register   → append callback
//!      │    unregister of last callback / teardown            │  unregister → remove one registration
//!      └──────────────────────────────────────────────────────┘
//!           (cancel timers, detach listener, drop record)
//! ```
//!
//! ## Key responsibilities
//! - attach exactly one low-level listener on the first `register` of a pair
//! - append/remove callbacks, identity-based, first match only
//! - detach synchronously when the last callback goes away
//! - tear everything down on [`teardown`](UnifiedEventService::teardown) or drop
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use unifier::{CallbackFn, Config, Document, Occurrence, UnifiedEventService};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let doc = Arc::new(Document::new());
//! let svc = UnifiedEventService::builder(Config::testing(), doc.clone()).build()?;
//!
//! let on_scroll = CallbackFn::arc("on-scroll", |occ: &Occurrence| {
//!     println!("scrolled: {:?}", occ.detail);
//!     Ok(())
//! });
//! svc.register("window", "scroll", on_scroll.clone())?;
//! assert_eq!(doc.window().listener_count("scroll"), 1);
//!
//! doc.window().dispatch(&Occurrence::new("scroll").with_detail("y=120"))?;
//!
//! svc.unregister("window", "scroll", &on_scroll);
//! assert_eq!(doc.window().listener_count("scroll"), 0);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::builder::ServiceBuilder;
use super::dispatch::Engine;
use super::record::ChannelId;
use crate::callbacks::CallbackRef;
use crate::config::Config;
use crate::error::{FanoutError, ResolutionError};
use crate::events::{Event, EventKind};
use crate::subscribers::SubscriberSet;
use crate::targets::{Occurrence, Resolve};

/// Multiplexes callbacks onto one low-level listener per `(target, event type)`.
pub struct UnifiedEventService {
    cfg: Config,
    engine: Arc<Engine>,
    subs: Option<Arc<SubscriberSet>>,
    token: CancellationToken,
}

impl UnifiedEventService {
    /// Returns a builder bound to `cfg` and the target `resolver`.
    pub fn builder(cfg: Config, resolver: Arc<dyn Resolve>) -> ServiceBuilder {
        ServiceBuilder::new(cfg, resolver)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        engine: Arc<Engine>,
        subs: Option<Arc<SubscriberSet>>,
        token: CancellationToken,
    ) -> Self {
        Self {
            cfg,
            engine,
            subs,
            token,
        }
    }

    /// Configuration the service was built with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Registers `callback` for `event_type` on `target` using the configured interval.
    ///
    /// See [`register_with_interval`](Self::register_with_interval).
    pub fn register(
        &self,
        target: &str,
        event_type: &str,
        callback: CallbackRef,
    ) -> Result<(), ResolutionError> {
        self.register_with_interval(target, event_type, callback, self.cfg.interval)
    }

    /// Registers `callback` for `event_type` on `target`.
    ///
    /// - **Unbound → Bound**: resolves the target, attaches one low-level listener,
    ///   and fixes the record's throttle window to `interval`.
    /// - **Bound → Bound**: appends the callback; `interval` is ignored.
    ///
    /// Registering the same callback twice occupies two slots.
    /// In a headless configuration this is a silent no-op.
    pub fn register_with_interval(
        &self,
        target: &str,
        event_type: &str,
        callback: CallbackRef,
        interval: Duration,
    ) -> Result<(), ResolutionError> {
        if self.cfg.headless {
            debug!(selector = target, event_type, "headless; register skipped");
            return Ok(());
        }

        let name = callback.name().to_string();
        let existing = {
            let mut reg = self.engine.registry();
            match reg.get_mut(target, event_type) {
                Some(record) => {
                    record.add_callback(callback.clone());
                    Some((record.channel, record.callback_count()))
                }
                None => None,
            }
        };
        if let Some((channel, count)) = existing {
            self.publish_registered(target, event_type, channel, name, count);
            return Ok(());
        }

        let resolver = self.engine.registry().resolver();
        let element = resolver.resolve(target)?;

        let (channel, count, attach) = {
            let mut reg = self.engine.registry();
            let (record, created) = reg.get_or_insert(target, event_type, &element, interval, |ch| {
                self.engine.make_trigger(ch)
            });
            record.add_callback(callback);
            let attach = created.then(|| (record.trigger.clone(), record.interval));
            (record.channel, record.callback_count(), attach)
        };

        if let Some((trigger, interval)) = attach {
            element.add_listener(event_type, trigger.clone());
            debug!(selector = target, event_type, %channel, ?interval, "low-level listener attached");

            // An unregister may have destroyed the record while it was being attached.
            if self.engine.registry().channel_of(target, event_type) == Some(channel) {
                self.engine.bus().publish(
                    Event::new(EventKind::ListenerAttached)
                        .with_binding(target, event_type)
                        .with_channel(channel.get())
                        .with_interval(interval),
                );
            } else {
                element.remove_listener(event_type, &trigger);
                debug!(selector = target, event_type, %channel, "record gone before attach completed");
            }
        }
        self.publish_registered(target, event_type, channel, name, count);
        Ok(())
    }

    fn publish_registered(&self, target: &str, event_type: &str, channel: ChannelId, name: String, count: usize) {
        self.engine.bus().publish(
            Event::new(EventKind::CallbackRegistered)
                .with_binding(target, event_type)
                .with_channel(channel.get())
                .with_callback(name)
                .with_count(count),
        );
    }

    /// Removes one registration of `callback` for `event_type` on `target`.
    ///
    /// When the record becomes empty its pending timers are cancelled and its
    /// low-level listener detached before this returns (**Bound → Unbound**).
    ///
    /// Unknown pairs and callbacks that are not registered are ignored. Identity
    /// is the `Arc` allocation: a different handle wrapping an equal closure
    /// removes nothing.
    pub fn unregister(&self, target: &str, event_type: &str, callback: &CallbackRef) {
        if self.cfg.headless {
            return;
        }

        let (channel, remaining, removed) = {
            let mut reg = self.engine.registry();
            let Some(record) = reg.get_mut(target, event_type) else {
                return;
            };
            let Some(remaining) = record.remove_callback(callback) else {
                debug!(selector = target, event_type, callback = callback.name(), "callback not registered; unregister ignored");
                return;
            };
            let channel = record.channel;

            let removed = if remaining == 0 {
                let cancelled = record.cancel_all_pending_timers();
                reg.remove(target, event_type).map(|record| (record, cancelled))
            } else {
                None
            };
            (channel, remaining, removed)
        };

        let cancelled = removed.map(|(record, cancelled)| {
            record.detach();
            cancelled
        });

        let bus = self.engine.bus();
        bus.publish(
            Event::new(EventKind::CallbackUnregistered)
                .with_binding(target, event_type)
                .with_channel(channel.get())
                .with_callback(callback.name())
                .with_count(remaining),
        );

        if let Some(cancelled) = cancelled {
            if cancelled > 0 {
                bus.publish(
                    Event::new(EventKind::FanoutCancelled)
                        .with_channel(channel.get())
                        .with_count(cancelled),
                );
            }
            bus.publish(
                Event::new(EventKind::ListenerDetached)
                    .with_binding(target, event_type)
                    .with_channel(channel.get()),
            );
        }
    }

    /// Drives every live record to Unbound.
    ///
    /// For each record (creation order): cancel its pending timers, then unregister
    /// each of its callbacks. Leaves no low-level listeners and no pending timers.
    /// Safe to call repeatedly.
    pub fn teardown(&self) {
        let live: Vec<(Arc<str>, Arc<str>, Vec<CallbackRef>)> = {
            let mut reg = self.engine.registry();
            reg.all()
                .into_iter()
                .map(|record| {
                    let cancelled = record.cancel_all_pending_timers();
                    if cancelled > 0 {
                        self.engine.bus().publish(
                            Event::new(EventKind::FanoutCancelled)
                                .with_channel(record.channel.get())
                                .with_count(cancelled),
                        );
                    }
                    (
                        record.target.clone(),
                        record.event_type.clone(),
                        record.snapshot(),
                    )
                })
                .collect()
        };

        let records = live.len();
        for (target, event_type, callbacks) in live {
            for cb in &callbacks {
                self.unregister(&target, &event_type, cb);
            }
        }

        debug!(records, "teardown completed");
        self.engine
            .bus()
            .publish(Event::new(EventKind::TeardownCompleted).with_count(records));
    }

    /// Routes `occurrence` into the pair's fan-out as if its low-level listener fired.
    ///
    /// No-op for an Unbound pair. Synchronous fan-out failures are returned.
    pub fn trigger(
        &self,
        target: &str,
        event_type: &str,
        occurrence: Occurrence,
    ) -> Result<(), FanoutError> {
        let channel = self.engine.registry().channel_of(target, event_type);
        match channel {
            Some(channel) => self.engine.on_occurrence(channel, occurrence),
            None => Ok(()),
        }
    }

    /// True if the pair currently has a record (and thus a low-level listener).
    pub fn is_bound(&self, target: &str, event_type: &str) -> bool {
        self.engine.registry().get(target, event_type).is_some()
    }

    /// Number of registrations for the pair (`0` when Unbound).
    pub fn callback_count(&self, target: &str, event_type: &str) -> usize {
        self.engine
            .registry()
            .get(target, event_type)
            .map_or(0, |r| r.callback_count())
    }

    /// Throttle interval fixed for the pair's record, if bound.
    pub fn interval_of(&self, target: &str, event_type: &str) -> Option<Duration> {
        self.engine.registry().get(target, event_type).map(|r| r.interval)
    }

    /// Total number of scheduled-but-not-fired throttle timers.
    pub fn pending_timers(&self) -> usize {
        self.engine
            .registry()
            .all()
            .iter()
            .map(|r| r.pending_timers())
            .sum()
    }

    /// Number of live records.
    pub fn record_count(&self) -> usize {
        self.engine.registry().len()
    }

    /// Sorted list of targets with at least one live record.
    pub fn targets(&self) -> Vec<String> {
        self.engine.registry().targets()
    }

    /// Number of lifecycle subscribers attached by the builder.
    pub fn subscriber_count(&self) -> usize {
        self.subs.as_ref().map_or(0, |set| set.len())
    }

    /// Creates a receiver for lifecycle events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.engine.bus().subscribe()
    }
}

impl Drop for UnifiedEventService {
    fn drop(&mut self) {
        self.teardown();
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::CallbackFn;
    use crate::error::CallbackError;
    use crate::targets::{Document, Element, EventTarget, Listener, TargetRef};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Mutex, Weak};

    type Log = Arc<Mutex<Vec<String>>>;

    fn recorder(name: &'static str, log: &Log) -> CallbackRef {
        let log = log.clone();
        CallbackFn::arc(name, move |occ: &Occurrence| {
            let detail = occ.detail.as_deref().unwrap_or("-").to_string();
            log.lock().unwrap().push(format!("{name}:{detail}"));
            Ok(())
        })
    }

    fn counter(name: &'static str, hits: &Arc<AtomicUsize>) -> CallbackRef {
        let hits = hits.clone();
        CallbackFn::arc(name, move |_occ: &Occurrence| {
            hits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn service(cfg: Config) -> (Arc<Document>, UnifiedEventService) {
        let doc = Arc::new(Document::new());
        let svc = UnifiedEventService::builder(cfg, doc.clone())
            .build()
            .expect("service");
        (doc, svc)
    }

    fn scroll(detail: &str) -> Occurrence {
        Occurrence::new("scroll").with_detail(detail.to_string())
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_scroll_scenario() {
        let (doc, svc) = service(Config::testing());
        let log: Log = Arc::default();
        let a = recorder("a", &log);
        let b = recorder("b", &log);

        svc.register("window", "scroll", a.clone()).unwrap();
        svc.register("window", "scroll", b.clone()).unwrap();
        doc.window().dispatch(&scroll("1")).unwrap();
        assert_eq!(entries(&log), vec!["a:1", "b:1"]);
        assert_eq!(doc.window().listener_count("scroll"), 1);

        svc.unregister("window", "scroll", &a);
        doc.window().dispatch(&scroll("2")).unwrap();
        assert_eq!(entries(&log), vec!["a:1", "b:1", "b:2"]);

        svc.unregister("window", "scroll", &b);
        doc.window().dispatch(&scroll("3")).unwrap();
        assert_eq!(entries(&log).len(), 3);
        assert_eq!(doc.window().listener_count("scroll"), 0);
        assert!(!svc.is_bound("window", "scroll"));
        assert!(svc.targets().is_empty());
    }

    #[tokio::test]
    async fn test_listener_count_tracks_callback_count() {
        let (doc, svc) = service(Config::testing());
        let hits = Arc::new(AtomicUsize::new(0));
        let cbs: Vec<CallbackRef> = (0..4).map(|_| counter("c", &hits)).collect();

        // register/unregister interleavings: (index, register?)
        let steps = [
            (0, true),
            (1, true),
            (0, false),
            (0, false),
            (2, true),
            (1, false),
            (3, true),
            (2, false),
            (3, false),
            (1, false),
            (0, true),
        ];
        for (i, register) in steps {
            if register {
                svc.register("window", "resize", cbs[i].clone()).unwrap();
            } else {
                svc.unregister("window", "resize", &cbs[i]);
            }
            let callbacks = svc.callback_count("window", "resize");
            let listeners = doc.window().listener_count("resize");
            assert!(listeners <= 1);
            assert_eq!(listeners == 1, callbacks > 0, "step {i}/{register}");
        }
    }

    #[tokio::test]
    async fn test_events_and_targets_are_independent() {
        let (doc, svc) = service(Config::testing());
        let resize_hits = Arc::new(AtomicUsize::new(0));
        let scroll_hits = Arc::new(AtomicUsize::new(0));
        svc.register("window", "resize", counter("r", &resize_hits)).unwrap();
        svc.register("document", "scroll", counter("s", &scroll_hits)).unwrap();

        doc.window().dispatch(&Occurrence::new("resize")).unwrap();
        assert_eq!(resize_hits.load(Ordering::SeqCst), 1);
        assert_eq!(scroll_hits.load(Ordering::SeqCst), 0);

        doc.window().dispatch(&Occurrence::new("scroll")).unwrap();
        assert_eq!(scroll_hits.load(Ordering::SeqCst), 0);

        doc.document().dispatch(&Occurrence::new("scroll")).unwrap();
        assert_eq!(scroll_hits.load(Ordering::SeqCst), 1);
        assert_eq!(svc.targets(), vec!["document".to_string(), "window".to_string()]);
    }

    #[tokio::test]
    async fn test_unregister_last_callback_keeps_other_events() {
        let (doc, svc) = service(Config::testing());
        let hits = Arc::new(AtomicUsize::new(0));
        let on_scroll = counter("s", &hits);
        let on_resize = counter("r", &hits);
        svc.register("window", "scroll", on_scroll.clone()).unwrap();
        svc.register("window", "resize", on_resize).unwrap();

        svc.unregister("window", "scroll", &on_scroll);
        assert_eq!(doc.window().listener_count("scroll"), 0);
        assert_eq!(doc.window().listener_count("resize"), 1);
        assert_eq!(svc.targets(), vec!["window".to_string()]);

        doc.window().dispatch(&Occurrence::new("resize")).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        let (doc, svc) = service(Config::testing());
        let hits = Arc::new(AtomicUsize::new(0));
        let a = counter("a", &hits);
        let b = counter("b", &hits);
        let stranger = counter("a", &hits);

        svc.unregister("window", "scroll", &a);
        svc.register("window", "scroll", a.clone()).unwrap();
        svc.register("window", "scroll", b.clone()).unwrap();

        svc.unregister("window", "scroll", &stranger);
        svc.unregister("window", "scroll", &a);
        svc.unregister("window", "scroll", &a);
        svc.unregister("nowhere", "scroll", &a);
        assert_eq!(svc.callback_count("window", "scroll"), 1);

        doc.window().dispatch(&Occurrence::new("scroll")).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_duplicate_registration_pairs_with_unregister() {
        let (doc, svc) = service(Config::testing());
        let hits = Arc::new(AtomicUsize::new(0));
        let a = counter("a", &hits);
        svc.register("window", "scroll", a.clone()).unwrap();
        svc.register("window", "scroll", a.clone()).unwrap();

        doc.window().dispatch(&Occurrence::new("scroll")).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        svc.unregister("window", "scroll", &a);
        assert!(svc.is_bound("window", "scroll"));
        doc.window().dispatch(&Occurrence::new("scroll")).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 3);

        svc.unregister("window", "scroll", &a);
        assert!(!svc.is_bound("window", "scroll"));
    }

    #[tokio::test]
    async fn test_zero_interval_never_coalesces() {
        let (doc, svc) = service(Config::testing());
        let hits = Arc::new(AtomicUsize::new(0));
        svc.register("window", "scroll", counter("a", &hits)).unwrap();

        for i in 0..10 {
            doc.window().dispatch(&scroll(&i.to_string())).unwrap();
        }
        assert_eq!(hits.load(Ordering::SeqCst), 10);
        assert_eq!(svc.pending_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_delivers_trailing_occurrence_once() {
        let (doc, svc) = service(Config::default());
        let log: Log = Arc::default();
        svc.register("window", "scroll", recorder("a", &log)).unwrap();
        svc.register("window", "scroll", recorder("b", &log)).unwrap();

        for i in 0..5 {
            doc.window().dispatch(&scroll(&i.to_string())).unwrap();
        }
        assert!(entries(&log).is_empty());
        assert_eq!(svc.pending_timers(), 1);
        assert_eq!(doc.window().listener_count("scroll"), 1);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(entries(&log), vec!["a:4", "b:4"]);
        assert_eq!(svc.pending_timers(), 0);

        doc.window().dispatch(&scroll("5")).unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(entries(&log), vec!["a:4", "b:4", "a:5", "b:5"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_callbacks_added_before_fire_are_included() {
        let (doc, svc) = service(Config::default());
        let log: Log = Arc::default();
        let a = recorder("a", &log);
        svc.register("window", "scroll", a.clone()).unwrap();
        doc.window().dispatch(&scroll("x")).unwrap();

        svc.register("window", "scroll", recorder("late", &log)).unwrap();
        svc.unregister("window", "scroll", &a);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(entries(&log), vec!["late:x"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unregister_last_cancels_pending_fanout() {
        let (doc, svc) = service(Config::default());
        let hits = Arc::new(AtomicUsize::new(0));
        let a = counter("a", &hits);
        svc.register("window", "scroll", a.clone()).unwrap();
        doc.window().dispatch(&Occurrence::new("scroll")).unwrap();
        assert_eq!(svc.pending_timers(), 1);

        svc.unregister("window", "scroll", &a);
        assert_eq!(svc.pending_timers(), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recreated_record_gets_no_stale_delivery() {
        let (doc, svc) = service(Config::default());
        let hits_old = Arc::new(AtomicUsize::new(0));
        let hits_new = Arc::new(AtomicUsize::new(0));
        let old = counter("old", &hits_old);
        svc.register("window", "scroll", old.clone()).unwrap();
        doc.window().dispatch(&Occurrence::new("scroll")).unwrap();

        svc.unregister("window", "scroll", &old);
        svc.register("window", "scroll", counter("new", &hits_new)).unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(hits_old.load(Ordering::SeqCst), 0);
        assert_eq!(hits_new.load(Ordering::SeqCst), 0);

        doc.window().dispatch(&Occurrence::new("scroll")).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(hits_new.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_leaves_nothing_behind() {
        let (doc, svc) = service(Config::default());
        let list = Element::arc("#list");
        doc.insert("#list", list.clone());
        let hits = Arc::new(AtomicUsize::new(0));
        svc.register("window", "scroll", counter("a", &hits)).unwrap();
        svc.register("window", "resize", counter("b", &hits)).unwrap();
        svc.register("#list", "click", counter("c", &hits)).unwrap();
        doc.window().dispatch(&Occurrence::new("scroll")).unwrap();
        assert_eq!(svc.pending_timers(), 1);

        svc.teardown();
        assert_eq!(svc.pending_timers(), 0);
        assert_eq!(svc.record_count(), 0);
        assert_eq!(doc.window().total_listeners(), 0);
        assert_eq!(list.total_listeners(), 0);

        doc.window().dispatch(&Occurrence::new("scroll")).unwrap();
        list.dispatch(&Occurrence::new("click")).unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        svc.teardown();
        assert_eq!(svc.record_count(), 0);
    }

    #[tokio::test]
    async fn test_drop_detaches_listeners() {
        let (doc, svc) = service(Config::testing());
        svc.register("window", "scroll", CallbackFn::arc("a", |_occ: &Occurrence| Ok(())))
            .unwrap();
        assert_eq!(doc.window().listener_count("scroll"), 1);
        drop(svc);
        assert_eq!(doc.window().listener_count("scroll"), 0);
    }

    #[tokio::test]
    async fn test_first_interval_wins() {
        let (_doc, svc) = service(Config::default());
        let hits = Arc::new(AtomicUsize::new(0));
        svc.register_with_interval("window", "scroll", counter("a", &hits), Duration::from_millis(10))
            .unwrap();
        svc.register_with_interval("window", "scroll", counter("b", &hits), Duration::from_millis(500))
            .unwrap();
        svc.register("window", "scroll", counter("c", &hits)).unwrap();
        assert_eq!(svc.interval_of("window", "scroll"), Some(Duration::from_millis(10)));
    }

    #[tokio::test]
    async fn test_unresolvable_target_fails_and_binds_nothing() {
        let (_doc, svc) = service(Config::testing());
        let cb = CallbackFn::arc("a", |_occ: &Occurrence| Ok(()));

        let err = svc.register(".not-found", "click", cb.clone()).unwrap_err();
        assert_eq!(
            err,
            ResolutionError::NotFound {
                target: ".not-found".into()
            }
        );
        let err = svc.register("", "click", cb).unwrap_err();
        assert_eq!(err.as_label(), "target_invalid");
        assert_eq!(svc.record_count(), 0);
    }

    #[tokio::test]
    async fn test_failing_callback_does_not_stop_siblings() {
        let (doc, svc) = service(Config::testing());
        let hits = Arc::new(AtomicUsize::new(0));
        svc.register(
            "window",
            "scroll",
            CallbackFn::arc("bad", |_occ: &Occurrence| {
                Err(CallbackError::failed("bad", "boom"))
            }),
        )
        .unwrap();
        svc.register(
            "window",
            "scroll",
            CallbackFn::arc("panicky", |_occ: &Occurrence| -> Result<(), CallbackError> {
                panic!("kaboom")
            }),
        )
        .unwrap();
        svc.register("window", "scroll", counter("good", &hits)).unwrap();

        let err = doc.window().dispatch(&Occurrence::new("scroll")).unwrap_err();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(err.failures.len(), 2);
        assert_eq!(err.failures[0].callback(), "bad");
        assert_eq!(
            err.failures[1],
            CallbackError::Panicked {
                callback: "panicky".into(),
                info: "kaboom".into()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_failures_are_published() {
        let (doc, svc) = service(Config::default());
        let mut rx = svc.subscribe();
        svc.register(
            "window",
            "scroll",
            CallbackFn::arc("bad", |_occ: &Occurrence| {
                Err(CallbackError::failed("bad", "boom"))
            }),
        )
        .unwrap();

        doc.window().dispatch(&Occurrence::new("scroll")).unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;

        let mut failed = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::CallbackFailed {
                failed.push(ev);
            }
        }
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].callback.as_deref(), Some("bad"));
        assert_eq!(failed[0].reason.as_deref(), Some("error: boom"));
    }

    #[tokio::test]
    async fn test_reentrant_changes_apply_to_next_pass() {
        let (doc, svc) = service(Config::testing());
        let svc = Arc::new(svc);
        let log: Log = Arc::default();
        let b = recorder("b", &log);
        let c = recorder("c", &log);

        let weak: Weak<UnifiedEventService> = Arc::downgrade(&svc);
        let (b2, c2, log2) = (b.clone(), c.clone(), log.clone());
        let a = CallbackFn::arc("a", move |occ: &Occurrence| {
            log2.lock().unwrap().push(format!("a:{}", occ.detail.as_deref().unwrap_or("-")));
            if let Some(svc) = weak.upgrade() {
                svc.unregister("window", "scroll", &b2);
                svc.register("window", "scroll", c2.clone())
                    .map_err(|e| CallbackError::failed("a", e))?;
            }
            Ok(())
        });

        svc.register("window", "scroll", a.clone()).unwrap();
        svc.register("window", "scroll", b).unwrap();

        doc.window().dispatch(&scroll("1")).unwrap();
        assert_eq!(entries(&log), vec!["a:1", "b:1"]);
        assert_eq!(svc.callback_count("window", "scroll"), 2);

        svc.unregister("window", "scroll", &a);
        doc.window().dispatch(&scroll("2")).unwrap();
        assert_eq!(entries(&log), vec!["a:1", "b:1", "c:2"]);
    }

    #[tokio::test]
    async fn test_headless_register_is_noop() {
        let cfg = Config {
            headless: true,
            ..Config::testing()
        };
        let (doc, svc) = service(cfg);
        let cb = CallbackFn::arc("a", |_occ: &Occurrence| Ok(()));

        svc.register("window", "scroll", cb.clone()).unwrap();
        svc.register(".not-found", "scroll", cb.clone()).unwrap();
        assert_eq!(doc.window().total_listeners(), 0);
        assert!(!svc.is_bound("window", "scroll"));
        svc.unregister("window", "scroll", &cb);
    }

    #[tokio::test]
    async fn test_trigger_routes_to_bound_pair() {
        let (_doc, svc) = service(Config::testing());
        let log: Log = Arc::default();
        svc.register("document", "keyup", recorder("k", &log)).unwrap();

        svc.trigger("document", "keyup", Occurrence::new("keyup").with_detail("Enter"))
            .unwrap();
        svc.trigger("document", "keydown", Occurrence::new("keydown")).unwrap();
        assert_eq!(entries(&log), vec!["k:Enter"]);
    }

    #[tokio::test]
    async fn test_lifecycle_events_follow_state_machine() {
        let (_doc, svc) = service(Config::testing());
        let mut rx = svc.subscribe();
        let cb = CallbackFn::arc("a", |_occ: &Occurrence| Ok(()));
        svc.register("window", "scroll", cb.clone()).unwrap();
        svc.unregister("window", "scroll", &cb);
        svc.teardown();

        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
        }
        assert_eq!(
            kinds,
            vec![
                EventKind::ListenerAttached,
                EventKind::CallbackRegistered,
                EventKind::CallbackUnregistered,
                EventKind::ListenerDetached,
                EventKind::TeardownCompleted,
            ]
        );
    }

    /// Target that replays a buffered occurrence to every listener as it attaches.
    struct Eager {
        inner: Element,
    }

    impl EventTarget for Eager {
        fn add_listener(&self, event_type: &str, listener: Listener) {
            self.inner.add_listener(event_type, listener.clone());
            let _ = listener(&Occurrence::new(event_type.to_string()).with_detail("replayed"));
        }

        fn remove_listener(&self, event_type: &str, listener: &Listener) {
            self.inner.remove_listener(event_type, listener);
        }
    }

    struct EagerResolver(Arc<Eager>);

    impl Resolve for EagerResolver {
        fn resolve(&self, target: &str) -> Result<TargetRef, ResolutionError> {
            match target {
                "feed" => Ok(self.0.clone() as TargetRef),
                other => Err(ResolutionError::NotFound {
                    target: other.to_string(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_target_dispatching_during_attach_reaches_callbacks() {
        let feed = Arc::new(Eager {
            inner: Element::new("feed"),
        });
        let svc = UnifiedEventService::builder(Config::testing(), Arc::new(EagerResolver(feed.clone())))
            .build()
            .expect("service");
        let log: Log = Arc::default();
        let a = recorder("a", &log);

        svc.register("feed", "message", a.clone()).unwrap();
        assert_eq!(entries(&log), vec!["a:replayed"]);
        assert_eq!(feed.inner.listener_count("message"), 1);

        svc.unregister("feed", "message", &a);
        assert_eq!(feed.inner.listener_count("message"), 0);
    }

    #[tokio::test]
    async fn test_subscriber_count_without_subscribers() {
        let (_doc, svc) = service(Config::testing());
        assert_eq!(svc.subscriber_count(), 0);
    }
}
