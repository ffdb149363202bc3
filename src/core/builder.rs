use std::sync::Arc;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use super::{dispatch::Engine, registry::Registry, service::UnifiedEventService};
use crate::{
    config::Config,
    error::ServiceError,
    events::Bus,
    scheduler::{Scheduler, TokioScheduler},
    subscribers::{Subscribe, SubscriberSet},
    targets::Resolve,
};

/// Builder for constructing a [`UnifiedEventService`] with optional collaborators.
pub struct ServiceBuilder {
    cfg: Config,
    resolver: Arc<dyn Resolve>,
    scheduler: Option<Arc<dyn Scheduler>>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl ServiceBuilder {
    /// Creates a new builder with the given configuration and target resolver.
    pub fn new(cfg: Config, resolver: Arc<dyn Resolve>) -> Self {
        Self {
            cfg,
            resolver,
            scheduler: None,
            subscribers: Vec::new(),
        }
    }

    /// Replaces the default [`TokioScheduler`] used for throttle timers.
    pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Sets lifecycle event subscribers for observability.
    ///
    /// Subscribers receive lifecycle events through dedicated workers with
    /// bounded queues; they require a tokio runtime.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the service.
    ///
    /// Initializes:
    /// - Event bus for lifecycle broadcasting
    /// - Registry bound to the resolver
    /// - Scheduler (tokio runtime of the caller unless one was supplied)
    /// - Subscriber workers and their bus listener (if any subscribers)
    ///
    /// Fails with [`ServiceError::NoRuntime`] when a runtime is needed but absent.
    pub fn build(self) -> Result<UnifiedEventService, ServiceError> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let scheduler: Arc<dyn Scheduler> = match self.scheduler {
            Some(s) => s,
            None => Arc::new(TokioScheduler::current()?),
        };

        let token = CancellationToken::new();
        let subs = if self.subscribers.is_empty() {
            None
        } else {
            let handle = Handle::try_current()?;
            let set = Arc::new(SubscriberSet::new(self.subscribers, bus.clone(), &handle));
            set.clone().spawn_listener(&handle, bus.subscribe(), token.clone());
            Some(set)
        };

        let engine = Engine::new(Registry::new(self.resolver), scheduler, bus);
        Ok(UnifiedEventService::new_internal(self.cfg, engine, subs, token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::CallbackFn;
    use crate::config::DEFAULT_INTERVAL;
    use crate::scheduler::{TimerHandle, TimerTask};
    use crate::targets::{Document, Occurrence};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Scheduler that only runs tasks when told to.
    #[derive(Default)]
    struct ManualScheduler {
        queued: Mutex<Vec<(Duration, TimerHandle, TimerTask)>>,
    }

    impl ManualScheduler {
        fn queued(&self) -> usize {
            self.queued.lock().unwrap().len()
        }

        /// Runs every queued task, cancelled or not; returns how many were cancelled.
        fn run_all(&self) -> usize {
            let tasks = std::mem::take(&mut *self.queued.lock().unwrap());
            let mut cancelled = 0;
            for (_, handle, task) in tasks {
                if handle.is_cancelled() {
                    cancelled += 1;
                }
                task();
            }
            cancelled
        }
    }

    impl Scheduler for ManualScheduler {
        fn schedule_after(&self, delay: Duration, task: TimerTask) -> TimerHandle {
            let handle = TimerHandle::new();
            self.queued.lock().unwrap().push((delay, handle.clone(), task));
            handle
        }
    }

    #[test]
    fn test_custom_scheduler_drives_throttled_fanout() {
        let doc = Arc::new(Document::new());
        let sched = Arc::new(ManualScheduler::default());
        let svc = ServiceBuilder::new(Config::default(), doc.clone())
            .with_scheduler(sched.clone())
            .build()
            .expect("no runtime needed with a custom scheduler");

        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        svc.register(
            "window",
            "scroll",
            CallbackFn::arc("count", move |_occ: &Occurrence| {
                h.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        )
        .unwrap();

        for _ in 0..3 {
            doc.window().dispatch(&Occurrence::new("scroll")).unwrap();
        }
        assert_eq!(sched.queued(), 1);
        assert_eq!(sched.queued.lock().unwrap()[0].0, DEFAULT_INTERVAL);
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        assert_eq!(sched.run_all(), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(svc.pending_timers(), 0);

        doc.window().dispatch(&Occurrence::new("scroll")).unwrap();
        assert_eq!(svc.pending_timers(), 1);
        svc.teardown();
        assert_eq!(svc.pending_timers(), 0);

        // The cancelled task still runs here and must deliver nothing.
        assert_eq!(sched.run_all(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_build_outside_runtime_needs_a_scheduler() {
        let doc = Arc::new(Document::new());
        let res = ServiceBuilder::new(Config::default(), doc).build();
        assert!(matches!(res, Err(ServiceError::NoRuntime(_))));
        assert_eq!(res.err().map(|e| e.as_label()), Some("service_no_runtime"));
    }
}
