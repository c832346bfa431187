//! # Mediator: registry, interceptor chain, transformers and dispatch.
//!
//! The [`Mediator`] owns every piece of per-instance state and runs the
//! publish pipeline. It is a cheap `Clone` handle; clones share state.
//!
//! ## Publish pipeline
//! ```text
//! publish(event, token)
//!   │  wrap in Envelope (seq, timestamp, TypeId)
//!   ├─► report PublishStarted
//!   ├─► chain = interceptors snapshot
//!   ├─► for i in chain: i.before_publish(original)   ── false ─► PublishShortCircuited, Ok(())
//!   ├─► target = transformer(original) or original
//!   ├─► subs = registry snapshot for target type
//!   │     ├─ none + fail_on_no_subscribers ─► Err(NoSubscribers)
//!   │     ├─ none                          ─► (nothing dispatched)
//!   │     └─ some ─► strategy.dispatch(target, subs, token) ── Err ─► Err(Handler)
//!   ├─► for i in chain: i.after_publish(original)
//!   └─► report PublishCompleted
//! ```
//!
//! ## Rules
//! - Interceptors see the originally published envelope in both phases.
//! - The chain and the subscriber list are snapshotted once per publish;
//!   concurrent registrations affect only later publishes.
//! - A publish that returns an error skips the after-hooks.
//! - Cancellation is not an error: a cancelled publish returns `Ok(())`
//!   after delivering to whatever prefix the strategy reached.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use eventvisor::{HandlerError, Mediator, MediatorConfig};
//!
//! struct Deposited(u32);
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), eventvisor::MediatorError> {
//!     let mediator = Mediator::new(MediatorConfig::default())?;
//!     let total = Arc::new(AtomicU32::new(0));
//!
//!     let t = Arc::clone(&total);
//!     let sub = mediator.subscribe_fn("ledger", move |ev: Arc<Deposited>| {
//!         let t = Arc::clone(&t);
//!         async move {
//!             t.fetch_add(ev.0, Ordering::SeqCst);
//!             Ok::<_, HandlerError>(())
//!         }
//!     });
//!
//!     mediator.publish(Deposited(5)).await?;
//!     mediator.publish(Deposited(7)).await?;
//!     assert_eq!(total.load(Ordering::SeqCst), 12);
//!
//!     assert!(sub.dispose());
//!     mediator.publish(Deposited(100)).await?;
//!     assert_eq!(total.load(Ordering::SeqCst), 12);
//!     Ok(())
//! }
//! ```

use std::any::TypeId;
use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::config::MediatorConfig;
use crate::core::builder::MediatorBuilder;
use crate::core::facade::{Publisher, Subscriber};
use crate::dispatch::{Dispatch, Strategy};
use crate::error::{HandlerError, MediatorError};
use crate::events::{Bus, Envelope, Event, Report, ReportKind};
use crate::handlers::{Handle, HandlerFn};
use crate::interceptors::{Chain, Intercept, InterceptFor, Scoped, run_after, run_before};
use crate::subscriptions::{Registry, Subscription};
use crate::transformers::Transformers;

/// Shared state behind every clone of a [`Mediator`].
pub(crate) struct Inner {
    pub(crate) cfg: MediatorConfig,
    pub(crate) bus: Bus,
    pub(crate) registry: Arc<Registry>,
    pub(crate) interceptors: Chain,
    pub(crate) transformers: Transformers,
    pub(crate) dispatcher: Arc<dyn Dispatch>,
}

/// In-process typed publish/subscribe mediator.
#[derive(Clone)]
pub struct Mediator {
    inner: Arc<Inner>,
}

impl Mediator {
    /// Starts building a mediator with the given configuration.
    pub fn builder(cfg: MediatorConfig) -> MediatorBuilder {
        MediatorBuilder::new(cfg)
    }

    /// Builds a mediator with the configured strategy and executor.
    ///
    /// # Errors
    /// [`MediatorError::InvalidArgument`] if the configuration is invalid.
    pub fn new(cfg: MediatorConfig) -> Result<Self, MediatorError> {
        Self::builder(cfg).build()
    }

    pub(crate) fn from_inner(inner: Inner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    // === Registration ===

    /// Registers `handler` for events of type `E`.
    ///
    /// Handlers for one type are delivered in registration order by the
    /// order-preserving strategies.
    pub fn subscribe<E, H>(&self, handler: Arc<H>) -> Subscription
    where
        E: Event,
        H: Handle<E>,
    {
        self.inner.registry.insert::<E, H>(handler)
    }

    /// Registers a closure for events of type `E`.
    pub fn subscribe_fn<E, F, Fut>(&self, name: impl Into<Cow<'static, str>>, f: F) -> Subscription
    where
        E: Event,
        F: Fn(Arc<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.subscribe::<E, _>(HandlerFn::arc(name, f))
    }

    /// Removes `subscription`. Returns `false` if it was already removed or
    /// belongs to another mediator.
    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        self.inner.registry.remove(subscription)
    }

    /// Adds a global interceptor after all existing ones.
    pub fn add_interceptor(&self, interceptor: Arc<dyn Intercept>) {
        self.inner.interceptors.push(interceptor);
    }

    /// Adds an interceptor that only observes events of type `E`.
    pub fn add_interceptor_for<E, I>(&self, interceptor: Arc<I>)
    where
        E: Event,
        I: InterceptFor<E>,
    {
        self.inner
            .interceptors
            .push(Arc::new(Scoped::<E, I>::new(interceptor)));
    }

    /// Installs (or replaces) the transformer for source type `S`.
    ///
    /// Published `S` values are turned into `T` and dispatched to `T`'s
    /// subscribers. Returns `true` if a previous transformer was replaced.
    pub fn add_transformer<S, T, F>(&self, f: F) -> bool
    where
        S: Event,
        T: Event,
        F: Fn(&S) -> T + Send + Sync + 'static,
    {
        self.inner.transformers.insert::<S, T, F>(f)
    }

    // === Publishing ===

    /// Publishes `event` with a token that is never cancelled.
    ///
    /// # Errors
    /// - [`MediatorError::NoSubscribers`] if nothing handles the dispatched
    ///   type and `fail_on_no_subscribers` is set.
    /// - [`MediatorError::Handler`] with the first handler failure, under
    ///   blocking strategies.
    pub async fn publish<E: Event>(&self, event: E) -> Result<(), MediatorError> {
        self.publish_with(event, &CancellationToken::new()).await
    }

    /// Publishes `event` under a caller-owned cancellation token.
    ///
    /// # Errors
    /// See [`Mediator::publish`].
    pub async fn publish_with<E: Event>(
        &self,
        event: E,
        token: &CancellationToken,
    ) -> Result<(), MediatorError> {
        self.publish_envelope(Envelope::new(event), token).await
    }

    /// Publishes an already wrapped event.
    ///
    /// # Errors
    /// See [`Mediator::publish`].
    pub async fn publish_envelope(
        &self,
        envelope: Envelope,
        token: &CancellationToken,
    ) -> Result<(), MediatorError> {
        let inner = &self.inner;
        let strategy = inner.dispatcher.strategy();
        trace!(seq = envelope.seq, event_type = envelope.type_name(), "publish");
        inner
            .bus
            .publish(Report::new(ReportKind::PublishStarted).with_event_type(envelope.type_name()));

        let chain = inner.interceptors.snapshot();
        if let Some(stopped_by) = run_before(&chain, &envelope, token).await {
            debug!(
                event_type = envelope.type_name(),
                interceptor = %stopped_by,
                "publish short-circuited"
            );
            inner.bus.publish(
                Report::new(ReportKind::PublishShortCircuited)
                    .with_event_type(envelope.type_name())
                    .with_reason(stopped_by),
            );
            return Ok(());
        }

        let target = inner
            .transformers
            .apply(&envelope)
            .unwrap_or_else(|| envelope.clone());

        match inner.registry.snapshot(target.type_id()) {
            Some(subs) => {
                trace!(
                    event_type = target.type_name(),
                    subscribers = subs.len(),
                    strategy = strategy.as_label(),
                    "dispatch"
                );
                inner.dispatcher.dispatch(&target, subs, token).await?;
            }
            None => {
                debug!(event_type = target.type_name(), "no subscribers");
                inner.bus.publish(
                    Report::new(ReportKind::NoSubscribers).with_event_type(target.type_name()),
                );
                if inner.cfg.fail_on_no_subscribers {
                    return Err(MediatorError::NoSubscribers {
                        event_type: target.type_name(),
                    });
                }
            }
        }

        run_after(&chain, &envelope, token).await;
        inner.bus.publish(
            Report::new(ReportKind::PublishCompleted)
                .with_event_type(envelope.type_name())
                .with_strategy(strategy.as_label()),
        );
        Ok(())
    }

    // === Introspection ===

    /// Receiver of diagnostic reports published after this call.
    pub fn reports(&self) -> broadcast::Receiver<Report> {
        self.inner.bus.subscribe()
    }

    /// Number of active subscriptions for `E`.
    pub fn subscriber_count<E: Event>(&self) -> usize {
        self.inner.registry.count(TypeId::of::<E>())
    }

    /// `true` if at least one subscription exists for `E`.
    pub fn has_subscribers<E: Event>(&self) -> bool {
        self.subscriber_count::<E>() > 0
    }

    /// Number of registered interceptors (global and scoped).
    pub fn interceptor_count(&self) -> usize {
        self.inner.interceptors.len()
    }

    /// The dispatch strategy chosen at build time.
    pub fn strategy(&self) -> Strategy {
        self.inner.dispatcher.strategy()
    }

    /// The configuration this mediator was built with.
    pub fn config(&self) -> &MediatorConfig {
        &self.inner.cfg
    }

    // === Facades and lifecycle ===

    /// Publish-only view for application code.
    pub fn publisher(&self) -> Publisher {
        Publisher::new(self.clone())
    }

    /// Subscribe-only view for application code.
    pub fn subscriber(&self) -> Subscriber {
        Subscriber::new(self.clone())
    }

    /// Stops background delivery resources.
    ///
    /// Under [`Strategy::Pooled`] this closes the queue and waits for
    /// workers to drain it; later publishes report their deliveries as
    /// dropped. Other strategies have nothing to stop.
    pub async fn shutdown(&self) {
        debug!(strategy = self.strategy().as_label(), "mediator shutdown");
        self.inner.dispatcher.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executors::RetryExecutor;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    #[derive(Debug)]
    struct Ping(u32);
    struct Celsius(i32);
    struct Fahrenheit(i32);

    type Log = Arc<Mutex<Vec<String>>>;

    fn new_log() -> Log {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    fn with_strategy(strategy: Strategy) -> Mediator {
        Mediator::new(MediatorConfig {
            strategy,
            ..MediatorConfig::default()
        })
        .unwrap()
    }

    fn tagged(m: &Mediator, tag: &'static str, log: &Log) -> Subscription {
        let log = Arc::clone(log);
        m.subscribe_fn(tag, move |ev: Arc<Ping>| {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push(format!("{tag}:{}", ev.0));
                Ok::<_, HandlerError>(())
            }
        })
    }

    fn counting(m: &Mediator, hits: &Arc<AtomicUsize>) -> Subscription {
        let hits = Arc::clone(hits);
        m.subscribe_fn("count", move |_ev: Arc<Ping>| {
            let hits = Arc::clone(&hits);
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Ok::<_, HandlerError>(())
            }
        })
    }

    fn failing(m: &Mediator, reason: &'static str, hits: &Arc<AtomicUsize>) -> Subscription {
        let hits = Arc::clone(hits);
        m.subscribe_fn(reason, move |_ev: Arc<Ping>| {
            let hits = Arc::clone(&hits);
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(HandlerError::fail(reason))
            }
        })
    }

    fn drain(rx: &mut broadcast::Receiver<Report>) -> Vec<Report> {
        let mut out = Vec::new();
        while let Ok(r) = rx.try_recv() {
            out.push(r);
        }
        out
    }

    async fn wait_for(rx: &mut broadcast::Receiver<Report>, kind: ReportKind) -> Report {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let r = rx.recv().await.unwrap();
                if r.kind == kind {
                    return r;
                }
            }
        })
        .await
        .unwrap()
    }

    struct Recorder {
        tag: &'static str,
        proceed: bool,
        log: Log,
    }

    #[async_trait]
    impl Intercept for Recorder {
        async fn before_publish(&self, _env: &Envelope, _token: &CancellationToken) -> bool {
            self.log.lock().unwrap().push(format!("before:{}", self.tag));
            self.proceed
        }

        async fn after_publish(&self, _env: &Envelope, _token: &CancellationToken) {
            self.log.lock().unwrap().push(format!("after:{}", self.tag));
        }

        fn name(&self) -> &str {
            self.tag
        }
    }

    fn recorder(tag: &'static str, proceed: bool, log: &Log) -> Arc<dyn Intercept> {
        Arc::new(Recorder {
            tag,
            proceed,
            log: Arc::clone(log),
        })
    }

    // === No subscribers ===

    #[tokio::test]
    async fn publish_without_subscribers_is_silent_by_default() {
        let m = with_strategy(Strategy::Sequential);
        let mut rx = m.reports();
        m.publish(Ping(1)).await.unwrap();

        let kinds: Vec<_> = drain(&mut rx).into_iter().map(|r| r.kind).collect();
        assert!(kinds.contains(&ReportKind::NoSubscribers));
        assert!(kinds.contains(&ReportKind::PublishCompleted));
    }

    #[tokio::test]
    async fn publish_without_subscribers_fails_when_configured() {
        let m = Mediator::new(MediatorConfig {
            fail_on_no_subscribers: true,
            ..MediatorConfig::default()
        })
        .unwrap();

        let err = m.publish(Ping(1)).await.unwrap_err();
        assert!(matches!(
            err,
            MediatorError::NoSubscribers { event_type } if event_type.ends_with("Ping")
        ));
    }

    // === Ordering ===

    #[tokio::test]
    async fn ordered_strategies_follow_registration_order() {
        for strategy in [Strategy::Sequential, Strategy::Chained] {
            let m = with_strategy(strategy);
            let log = new_log();
            tagged(&m, "s1", &log);
            tagged(&m, "s2", &log);
            tagged(&m, "s3", &log);

            m.publish(Ping(7)).await.unwrap();
            m.publish(Ping(8)).await.unwrap();
            assert_eq!(
                entries(&log),
                vec!["s1:7", "s2:7", "s3:7", "s1:8", "s2:8", "s3:8"],
                "strategy {}",
                strategy.as_label()
            );
        }
    }

    #[tokio::test]
    async fn sequential_payloads_complete_one_by_one() {
        let m = with_strategy(Strategy::Sequential);
        let log = new_log();
        let l = Arc::clone(&log);
        m.subscribe_fn("on_t", move |ev: Arc<Ping>| {
            let l = Arc::clone(&l);
            async move {
                l.lock().unwrap().push(format!("start:{}", ev.0));
                tokio::time::sleep(Duration::from_millis(5)).await;
                l.lock().unwrap().push(format!("end:{}", ev.0));
                Ok::<_, HandlerError>(())
            }
        });

        for n in [1, 2, 3] {
            m.publish(Ping(n)).await.unwrap();
        }
        assert_eq!(
            entries(&log),
            vec!["start:1", "end:1", "start:2", "end:2", "start:3", "end:3"]
        );
    }

    // === Interceptors ===

    #[tokio::test]
    async fn interceptors_run_in_registration_order_on_both_sides() {
        let m = with_strategy(Strategy::Sequential);
        let log = new_log();
        m.add_interceptor(recorder("a", true, &log));
        m.add_interceptor(recorder("b", true, &log));
        tagged(&m, "h", &log);

        m.publish(Ping(1)).await.unwrap();
        assert_eq!(
            entries(&log),
            vec!["before:a", "before:b", "h:1", "after:a", "after:b"]
        );
        assert_eq!(m.interceptor_count(), 2);
    }

    #[tokio::test]
    async fn rejecting_interceptor_stops_the_publish() {
        let m = with_strategy(Strategy::Sequential);
        let log = new_log();
        m.add_interceptor(recorder("gate", false, &log));
        m.add_interceptor(recorder("later", true, &log));
        tagged(&m, "h", &log);
        let mut rx = m.reports();

        m.publish(Ping(1)).await.unwrap();
        assert_eq!(entries(&log), vec!["before:gate"]);

        let r = wait_for(&mut rx, ReportKind::PublishShortCircuited).await;
        assert_eq!(r.reason.as_deref(), Some("gate"));
    }

    #[tokio::test]
    async fn builder_interceptors_are_registered() {
        let log = new_log();
        let m = Mediator::builder(MediatorConfig::default())
            .with_interceptor(recorder("boot", true, &log))
            .build()
            .unwrap();
        m.publish(Ping(1)).await.unwrap();
        assert_eq!(entries(&log), vec!["before:boot", "after:boot"]);
    }

    // === Transformers ===

    struct CelsiusWatch {
        log: Log,
    }

    #[async_trait]
    impl InterceptFor<Celsius> for CelsiusWatch {
        async fn before_publish(&self, event: &Celsius, _token: &CancellationToken) -> bool {
            self.log.lock().unwrap().push(format!("watch:before:{}", event.0));
            true
        }

        async fn after_publish(&self, event: &Celsius, _token: &CancellationToken) {
            self.log.lock().unwrap().push(format!("watch:after:{}", event.0));
        }
    }

    #[tokio::test]
    async fn transformer_reroutes_and_interceptors_see_original() {
        let m = with_strategy(Strategy::Sequential);
        let log = new_log();
        m.add_interceptor_for::<Celsius, _>(Arc::new(CelsiusWatch {
            log: Arc::clone(&log),
        }));
        assert!(!m.add_transformer::<Celsius, Fahrenheit, _>(|c| Fahrenheit(c.0 * 9 / 5 + 32)));

        let source_hits = Arc::new(AtomicUsize::new(0));
        let s = Arc::clone(&source_hits);
        m.subscribe_fn("celsius", move |_ev: Arc<Celsius>| {
            let s = Arc::clone(&s);
            async move {
                s.fetch_add(1, Ordering::SeqCst);
                Ok::<_, HandlerError>(())
            }
        });
        let l = Arc::clone(&log);
        m.subscribe_fn("fahrenheit", move |ev: Arc<Fahrenheit>| {
            let l = Arc::clone(&l);
            async move {
                l.lock().unwrap().push(format!("f:{}", ev.0));
                Ok::<_, HandlerError>(())
            }
        });

        m.publish(Celsius(100)).await.unwrap();
        assert_eq!(source_hits.load(Ordering::SeqCst), 0);
        assert_eq!(
            entries(&log),
            vec!["watch:before:100", "f:212", "watch:after:100"]
        );
    }

    #[tokio::test]
    async fn missing_target_subscribers_use_target_type_name() {
        let m = Mediator::new(MediatorConfig {
            fail_on_no_subscribers: true,
            ..MediatorConfig::default()
        })
        .unwrap();
        m.add_transformer::<Celsius, Fahrenheit, _>(|c| Fahrenheit(c.0));
        m.subscribe_fn("celsius", |_ev: Arc<Celsius>| async { Ok::<_, HandlerError>(()) });

        let err = m.publish(Celsius(1)).await.unwrap_err();
        assert!(matches!(
            err,
            MediatorError::NoSubscribers { event_type } if event_type.ends_with("Fahrenheit")
        ));
    }

    // === Failures and retries ===

    #[tokio::test]
    async fn sequential_stops_at_first_failure() {
        let m = with_strategy(Strategy::Sequential);
        let hits = Arc::new(AtomicUsize::new(0));
        counting(&m, &hits);
        failing(&m, "second", &hits);
        counting(&m, &hits);
        let log = new_log();
        m.add_interceptor(recorder("i", true, &log));

        let err = m.publish(Ping(1)).await.unwrap_err();
        assert_eq!(err.as_handler(), Some(&HandlerError::fail("second")));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(entries(&log), vec!["before:i"]);
    }

    #[tokio::test]
    async fn chained_stops_at_first_failure() {
        let m = with_strategy(Strategy::Chained);
        let hits = Arc::new(AtomicUsize::new(0));
        failing(&m, "first", &hits);
        counting(&m, &hits);

        let err = m.publish(Ping(1)).await.unwrap_err();
        assert_eq!(err.as_handler(), Some(&HandlerError::fail("first")));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    fn flaky(m: &Mediator, fail_first: usize, calls: &Arc<AtomicUsize>) -> Subscription {
        let calls = Arc::clone(calls);
        m.subscribe_fn("flaky", move |_ev: Arc<Ping>| {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n <= fail_first {
                    Err(HandlerError::fail(format!("attempt {n}")))
                } else {
                    Ok(())
                }
            }
        })
    }

    #[tokio::test]
    async fn configured_retries_recover_from_transient_failures() {
        let m = Mediator::new(MediatorConfig::with_retries(3, Duration::from_millis(1))).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        flaky(&m, 2, &calls);

        m.publish(Ping(1)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_the_last_failure() {
        let m = Mediator::new(MediatorConfig::with_retries(2, Duration::from_millis(1))).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        flaky(&m, usize::MAX, &calls);
        let mut rx = m.reports();

        let err = m.publish(Ping(1)).await.unwrap_err();
        assert_eq!(err.as_handler(), Some(&HandlerError::fail("attempt 2")));
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let retry = wait_for(&mut rx, ReportKind::RetryScheduled).await;
        assert_eq!(retry.attempt, Some(1));
        let failed = wait_for(&mut rx, ReportKind::DeliveryFailed).await;
        assert_eq!(failed.strategy, Some("sequential"));
    }

    #[tokio::test]
    async fn zero_retries_are_rejected_at_build_time() {
        let res = Mediator::new(MediatorConfig::with_retries(0, Duration::ZERO));
        assert!(matches!(res, Err(MediatorError::InvalidArgument { .. })));
    }

    #[tokio::test]
    async fn custom_executor_nests_inside_configured_retries() {
        let inner = RetryExecutor::new(2, Duration::from_millis(1)).unwrap();
        let m = Mediator::builder(MediatorConfig::with_retries(2, Duration::from_millis(1)))
            .with_executor(Arc::new(inner))
            .build()
            .unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        flaky(&m, usize::MAX, &calls);

        assert!(m.publish(Ping(1)).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    // === Cancellation ===

    #[tokio::test]
    async fn cancelled_publish_delivers_nothing_and_succeeds() {
        for strategy in [Strategy::Sequential, Strategy::Chained, Strategy::Parallel] {
            let m = with_strategy(strategy);
            let hits = Arc::new(AtomicUsize::new(0));
            counting(&m, &hits);
            counting(&m, &hits);
            let mut rx = m.reports();

            let token = CancellationToken::new();
            token.cancel();
            m.publish_with(Ping(1), &token).await.unwrap();

            assert_eq!(hits.load(Ordering::SeqCst), 0, "{}", strategy.as_label());
            let cancelled = drain(&mut rx)
                .into_iter()
                .filter(|r| r.kind == ReportKind::DeliveryCancelled)
                .count();
            assert_eq!(cancelled, 2, "{}", strategy.as_label());
        }
    }

    #[tokio::test]
    async fn cancellation_mid_dispatch_skips_the_rest() {
        for strategy in [Strategy::Sequential, Strategy::Chained] {
            let m = with_strategy(strategy);
            let token = CancellationToken::new();
            let t = token.clone();
            m.subscribe_fn("canceller", move |_ev: Arc<Ping>| {
                let t = t.clone();
                async move {
                    t.cancel();
                    Ok::<_, HandlerError>(())
                }
            });
            let hits = Arc::new(AtomicUsize::new(0));
            let late = counting(&m, &hits);
            counting(&m, &hits);
            let mut rx = m.reports();

            m.publish_with(Ping(1), &token).await.unwrap();
            assert_eq!(hits.load(Ordering::SeqCst), 0, "{}", strategy.as_label());

            let cancelled: Vec<Report> = drain(&mut rx)
                .into_iter()
                .filter(|r| r.kind == ReportKind::DeliveryCancelled)
                .collect();
            assert_eq!(cancelled.len(), 2, "{}", strategy.as_label());
            assert_eq!(cancelled[0].subscription, Some(late.id()));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancellation_while_waiting_for_a_permit_skips_the_rest() {
        let m = Mediator::new(MediatorConfig {
            strategy: Strategy::Parallel,
            max_concurrency: 1,
            ..MediatorConfig::default()
        })
        .unwrap();

        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let (st, rel) = (Arc::clone(&started), Arc::clone(&release));
        let holder_done = Arc::new(AtomicBool::new(false));
        let done = Arc::clone(&holder_done);
        m.subscribe_fn("holder", move |_ev: Arc<Ping>| {
            let (st, rel, done) = (Arc::clone(&st), Arc::clone(&rel), Arc::clone(&done));
            async move {
                st.notify_one();
                rel.notified().await;
                done.store(true, Ordering::SeqCst);
                Ok::<_, HandlerError>(())
            }
        });
        let hits = Arc::new(AtomicUsize::new(0));
        let waiting = counting(&m, &hits);
        let mut rx = m.reports();

        let token = CancellationToken::new();
        let publisher = m.clone();
        let t = token.clone();
        let in_flight = tokio::spawn(async move { publisher.publish_with(Ping(1), &t).await });

        started.notified().await;
        token.cancel();
        let r = wait_for(&mut rx, ReportKind::DeliveryCancelled).await;
        assert_eq!(r.subscription, Some(waiting.id()));

        release.notify_one();
        in_flight.await.unwrap().unwrap();
        assert!(holder_done.load(Ordering::SeqCst));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    // === Parallel ===

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn parallel_waits_for_all_and_returns_lowest_index_failure() {
        let m = with_strategy(Strategy::Parallel);
        let hits = Arc::new(AtomicUsize::new(0));
        let slow = Arc::clone(&hits);
        m.subscribe_fn("slow-fail", move |_ev: Arc<Ping>| {
            let slow = Arc::clone(&slow);
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                slow.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(HandlerError::fail("first"))
            }
        });
        failing(&m, "second", &hits);
        counting(&m, &hits);

        let err = m.publish(Ping(1)).await.unwrap_err();
        assert_eq!(err.as_handler(), Some(&HandlerError::fail("first")));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    fn panicking(m: &Mediator) -> Subscription {
        m.subscribe_fn("boom", |ev: Arc<Ping>| async move {
            if ev.0 > 0 {
                panic!("boom");
            }
            Ok::<_, HandlerError>(())
        })
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn handler_panics_become_errors_under_every_blocking_strategy() {
        for strategy in [Strategy::Sequential, Strategy::Chained, Strategy::Parallel] {
            let m = with_strategy(strategy);
            panicking(&m);
            let hits = Arc::new(AtomicUsize::new(0));
            counting(&m, &hits);

            let publisher = m.clone();
            let joined = tokio::spawn(async move { publisher.publish(Ping(1)).await }).await;
            let err = joined.unwrap().unwrap_err();
            assert_eq!(
                err.as_handler(),
                Some(&HandlerError::Panicked {
                    reason: "boom".into()
                }),
                "{}",
                strategy.as_label()
            );
            let expected = usize::from(strategy == Strategy::Parallel);
            assert_eq!(hits.load(Ordering::SeqCst), expected, "{}", strategy.as_label());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn panics_are_retried_like_failures() {
        let m = Mediator::new(MediatorConfig {
            strategy: Strategy::Parallel,
            ..MediatorConfig::with_retries(3, Duration::from_millis(1))
        })
        .unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        m.subscribe_fn("transient", move |_ev: Arc<Ping>| {
            let n = c.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n <= 2 {
                    panic!("transient");
                }
                Ok::<_, HandlerError>(())
            }
        });
        let mut rx = m.reports();

        m.publish(Ping(1)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let retry = wait_for(&mut rx, ReportKind::RetryScheduled).await;
        assert_eq!(retry.reason.as_deref(), Some("panic: transient"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn disposal_during_parallel_dispatch_affects_only_later_publishes() {
        let m = Mediator::new(MediatorConfig {
            strategy: Strategy::Parallel,
            max_concurrency: 1,
            ..MediatorConfig::default()
        })
        .unwrap();

        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let first_call = Arc::new(AtomicBool::new(true));
        let st = Arc::clone(&started);
        let rel = Arc::clone(&release);
        let first = Arc::clone(&first_call);
        m.subscribe_fn("s1", move |_ev: Arc<Ping>| {
            let (st, rel, first) = (Arc::clone(&st), Arc::clone(&rel), Arc::clone(&first));
            async move {
                if first.swap(false, Ordering::SeqCst) {
                    st.notify_one();
                    rel.notified().await;
                }
                Ok::<_, HandlerError>(())
            }
        });
        let s2_hits = Arc::new(AtomicUsize::new(0));
        let s2 = counting(&m, &s2_hits);

        let publisher = m.clone();
        let in_flight = tokio::spawn(async move { publisher.publish(Ping(1)).await });

        started.notified().await;
        assert!(s2.dispose());
        assert!(!s2.is_active());
        release.notify_one();
        in_flight.await.unwrap().unwrap();
        assert_eq!(s2_hits.load(Ordering::SeqCst), 1);

        m.publish(Ping(2)).await.unwrap();
        assert_eq!(s2_hits.load(Ordering::SeqCst), 1);
        assert_eq!(m.subscriber_count::<Ping>(), 1);
    }

    // === Fire-and-forget ===

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn thread_strategy_contains_failures() {
        let m = with_strategy(Strategy::ThreadPerSubscriber);
        let hits = Arc::new(AtomicUsize::new(0));
        let sub = failing(&m, "lost", &hits);
        let mut rx = m.reports();

        m.publish(Ping(1)).await.unwrap();
        let r = wait_for(&mut rx, ReportKind::DeliveryFailed).await;
        assert_eq!(r.subscription, Some(sub.id()));
        assert_eq!(r.strategy, Some("thread"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn thread_strategy_skips_cancelled_deliveries() {
        let m = with_strategy(Strategy::ThreadPerSubscriber);
        let hits = Arc::new(AtomicUsize::new(0));
        counting(&m, &hits);
        let mut rx = m.reports();

        let token = CancellationToken::new();
        token.cancel();
        m.publish_with(Ping(1), &token).await.unwrap();
        wait_for(&mut rx, ReportKind::DeliveryCancelled).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn pooled_delivers_and_shutdown_drains() {
        let m = Mediator::new(MediatorConfig {
            strategy: Strategy::Pooled,
            pool_workers: 2,
            ..MediatorConfig::default()
        })
        .unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            counting(&m, &hits);
        }

        for n in 0..10 {
            m.publish(Ping(n)).await.unwrap();
        }
        m.shutdown().await;
        assert_eq!(hits.load(Ordering::SeqCst), 30);

        let mut rx = m.reports();
        m.publish(Ping(99)).await.unwrap();
        let r = wait_for(&mut rx, ReportKind::QueueOverflow).await;
        assert_eq!(r.reason.as_deref(), Some("closed"));
        assert_eq!(hits.load(Ordering::SeqCst), 30);
    }

    #[tokio::test]
    async fn pooled_burst_delivers_everything() {
        let m = Mediator::new(MediatorConfig {
            strategy: Strategy::Pooled,
            pool_workers: 1,
            ..MediatorConfig::default()
        })
        .unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..2 {
            let h = Arc::clone(&hits);
            m.subscribe_fn("slow", move |_ev: Arc<Ping>| {
                let h = Arc::clone(&h);
                async move {
                    tokio::task::yield_now().await;
                    h.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, HandlerError>(())
                }
            });
        }
        let mut rx = m.reports();

        // Current-thread runtime: the worker cannot run until we yield, so the
        // whole burst is queued first.
        for n in 0..3000 {
            m.publish(Ping(n)).await.unwrap();
        }
        m.shutdown().await;

        assert_eq!(hits.load(Ordering::SeqCst), 6000);
        assert!(
            drain(&mut rx)
                .iter()
                .all(|r| r.kind != ReportKind::QueueOverflow)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn pooled_worker_survives_panics() {
        let m = Mediator::new(MediatorConfig {
            strategy: Strategy::Pooled,
            pool_workers: 1,
            ..MediatorConfig::default()
        })
        .unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        m.subscribe_fn("odd-panics", move |ev: Arc<Ping>| {
            let h = Arc::clone(&h);
            async move {
                if ev.0 % 2 == 1 {
                    panic!("odd payload");
                }
                h.fetch_add(1, Ordering::SeqCst);
                Ok::<_, HandlerError>(())
            }
        });
        let mut rx = m.reports();

        m.publish(Ping(1)).await.unwrap();
        m.publish(Ping(2)).await.unwrap();
        let r = wait_for(&mut rx, ReportKind::HandlerPanicked).await;
        assert_eq!(r.reason.as_deref(), Some("panic: odd payload"));

        m.shutdown().await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    // === Handles and facades ===

    #[tokio::test]
    async fn unsubscribe_is_idempotent_and_scoped_to_its_mediator() {
        let m = with_strategy(Strategy::Sequential);
        let other = with_strategy(Strategy::Sequential);
        let hits = Arc::new(AtomicUsize::new(0));
        let sub = counting(&m, &hits);

        assert!(m.has_subscribers::<Ping>());
        assert!(!other.unsubscribe(&sub));
        assert!(m.unsubscribe(&sub));
        assert!(!m.unsubscribe(&sub));
        assert!(!sub.dispose());
        assert!(!m.has_subscribers::<Ping>());

        m.publish(Ping(1)).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn handle_outlives_mediator() {
        let m = with_strategy(Strategy::Sequential);
        let sub = m.subscribe_fn("h", |_ev: Arc<Ping>| async { Ok::<_, HandlerError>(()) });
        assert!(sub.to_string().starts_with(&format!("{}@", sub.id())));
        drop(m);
        assert!(!sub.dispose());
    }

    #[tokio::test]
    async fn facades_expose_only_their_half() {
        let m = with_strategy(Strategy::Sequential);
        let publisher = m.publisher();
        let subscriber = m.subscriber();
        let log = new_log();

        let l = Arc::clone(&log);
        let sub = subscriber.subscribe_fn("facade", move |ev: Arc<Ping>| {
            let l = Arc::clone(&l);
            async move {
                l.lock().unwrap().push(format!("got:{}", ev.0));
                Ok::<_, HandlerError>(())
            }
        });
        publisher.publish(Ping(3)).await.unwrap();
        assert!(subscriber.unsubscribe(&sub));
        publisher.publish(Ping(4)).await.unwrap();

        assert_eq!(entries(&log), vec!["got:3"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_publishers_do_not_interfere() {
        let m = with_strategy(Strategy::Parallel);
        let hits = Arc::new(AtomicUsize::new(0));
        counting(&m, &hits);
        counting(&m, &hits);

        let tasks: Vec<_> = (0..16)
            .map(|n| {
                let publisher = m.publisher();
                tokio::spawn(async move { publisher.publish(Ping(n)).await })
            })
            .collect();
        for t in tasks {
            t.await.unwrap().unwrap();
        }
        assert_eq!(hits.load(Ordering::SeqCst), 32);
    }
}
