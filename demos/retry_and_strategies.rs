//! # Example: retry_and_strategies
//!
//! Runs the same flaky handler under every dispatch strategy with a retry
//! budget of three attempts, and prints the diagnostic reports.
//!
//! ## Flow
//! ```text
//! for strategy in [Sequential, Chained, Parallel, ThreadPerSubscriber, Pooled]:
//!   mediator(strategy, retries = 3, backoff 20ms ×2)
//!   publish(Job) ─► flaky fails twice ─► RetryScheduled ×2 ─► Ok
//!               └─► always-fails      ─► Err (blocking) / DeliveryFailed report (fire-and-forget)
//!   shutdown()
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=eventvisor=info cargo run --example retry_and_strategies
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use eventvisor::{
    BackoffPolicy, HandlerError, JitterPolicy, Mediator, MediatorConfig, ReportKind, Strategy,
};
use tracing_subscriber::EnvFilter;

struct Job(u32);

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    for strategy in [
        Strategy::Sequential,
        Strategy::Chained,
        Strategy::Parallel,
        Strategy::ThreadPerSubscriber,
        Strategy::Pooled,
    ] {
        let cfg = MediatorConfig {
            strategy,
            retries: Some(3),
            backoff: BackoffPolicy {
                first: Duration::from_millis(20),
                max: Duration::from_millis(200),
                factor: 2.0,
                jitter: JitterPolicy::Equal,
            },
            pool_workers: 2,
            ..MediatorConfig::default()
        };
        let mediator = Mediator::new(cfg)?;
        let mut reports = mediator.reports();

        let attempts = Arc::new(AtomicU32::new(0));
        let a = Arc::clone(&attempts);
        mediator.subscribe_fn("flaky", move |job: Arc<Job>| {
            let n = a.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    return Err(HandlerError::fail(format!("job {} attempt {n}", job.0)));
                }
                Ok(())
            }
        });
        mediator.subscribe_fn("broken", |_job: Arc<Job>| async {
            Err::<(), _>(HandlerError::fatal("disk full"))
        });

        match mediator.publish(Job(1)).await {
            Ok(()) => println!("[{}] publish returned Ok", strategy.as_label()),
            Err(e) => println!("[{}] publish returned {}", strategy.as_label(), e.as_label()),
        }

        // Give fire-and-forget deliveries time to finish their retries.
        tokio::time::sleep(Duration::from_millis(300)).await;
        mediator.shutdown().await;

        while let Ok(r) = reports.try_recv() {
            if matches!(
                r.kind,
                ReportKind::RetryScheduled
                    | ReportKind::DeliveryFailed
                    | ReportKind::HandlerPanicked
            ) {
                println!(
                    "[{}]   {:?} sub={:?} attempt={:?} delay_ms={:?} reason={:?}",
                    strategy.as_label(),
                    r.kind,
                    r.subscription,
                    r.attempt,
                    r.delay_ms,
                    r.reason
                );
            }
        }
        println!(
            "[{}] flaky handler attempts: {}",
            strategy.as_label(),
            attempts.load(Ordering::SeqCst)
        );
    }
    Ok(())
}
