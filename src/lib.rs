//! # eventvisor
//!
//! **Eventvisor** is an in-process, typed publish/subscribe mediator for
//! async Rust.
//!
//! Producers publish plain Rust values; handlers registered for the value's
//! type receive them. Every publish passes through an ordered interceptor
//! chain and an optional transformer, and is delivered under one of several
//! concurrency strategies with optional retry.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!        publish(E)                    subscribe::<E>(handler)
//!            │                                  │
//!            ▼                                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Mediator                                                         │
//! │  - Chain        (interceptors, ArcSwap snapshot per publish)      │
//! │  - Transformers (source TypeId → fn, DashMap)                     │
//! │  - Registry     (TypeId → Arc<[Subscription]>, copy-on-write)     │
//! │  - Dispatcher   (strategy chosen once at build time)              │
//! │  - Bus          (diagnostic reports, broadcast)                   │
//! └──────┬────────────────────────────────────────────────────────────┘
//!        ▼
//!  before-hooks ──► transform ──► snapshot ──► strategy.dispatch ──► after-hooks
//!                                                  │
//!              ┌───────────────┬───────────────┬───┴───────────┬───────────────┐
//!              ▼               ▼               ▼               ▼               ▼
//!         Sequential        Chained        Parallel         Thread          Pooled
//!         (in order)     (continuations)  (JoinSet +      (OS thread     (shared queue
//!                                          semaphore)     per delivery)   + workers)
//!              └───────────────┴───────────────┴───────────────┴───────────────┘
//!                                          ▼
//!                          Execute: DirectExecutor / RetryExecutor
//!                                          ▼
//!                                 Handle<E>::handle(Arc<E>)
//! ```
//!
//! ### Failure flow
//! ```text
//! handler Err ──► RetryExecutor (retryable? budget left? → RetryScheduled, sleep, again)
//!             └─► strategy
//!                   ├─ Sequential / Chained ─► stop, Err(MediatorError::Handler)
//!                   ├─ Parallel             ─► wait for all, lowest-index Err
//!                   └─ Thread / Pooled      ─► warn! + DeliveryFailed / HandlerPanicked report
//! ```
//!
//! ## Features
//! | Area               | Description                                                | Key types / traits                          |
//! |--------------------|------------------------------------------------------------|---------------------------------------------|
//! | **Mediator**       | Publish pipeline, registration, lifecycle.                 | [`Mediator`], [`MediatorBuilder`]           |
//! | **Handlers**       | Typed async callbacks, closure form.                       | [`Handle`], [`HandlerFn`], [`Subscription`] |
//! | **Interceptors**   | Before/after hooks, global or per type.                    | [`Intercept`], [`InterceptFor`]             |
//! | **Dispatch**       | Sequential, chained, parallel, thread, pooled delivery.    | [`Strategy`]                                |
//! | **Executors**      | Single delivery, bounded retry with backoff.               | [`Execute`], [`RetryExecutor`]              |
//! | **Policies**       | Retry delay growth and jitter.                             | [`BackoffPolicy`], [`JitterPolicy`]         |
//! | **Diagnostics**    | Out-of-band reports for fire-and-forget failures.          | [`Report`], [`ReportKind`]                  |
//! | **Errors**         | Typed errors for registration, publish and handlers.       | [`MediatorError`], [`HandlerError`]         |
//! | **Configuration**  | Strategy, retry budget, pool sizing.                       | [`MediatorConfig`]                          |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use eventvisor::{HandlerError, Mediator, MediatorConfig, Strategy};
//!
//! struct UserRegistered { name: String }
//! struct WelcomeMail { to: String }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), eventvisor::MediatorError> {
//!     let mut cfg = MediatorConfig::with_retries(3, Duration::from_millis(10));
//!     cfg.strategy = Strategy::Sequential;
//!     cfg.fail_on_no_subscribers = true;
//!
//!     let mediator = Mediator::new(cfg)?;
//!
//!     // Every registration becomes a welcome mail.
//!     mediator.add_transformer::<UserRegistered, WelcomeMail, _>(|u| WelcomeMail {
//!         to: u.name.clone(),
//!     });
//!
//!     mediator.subscribe_fn("mailer", |mail: Arc<WelcomeMail>| async move {
//!         println!("sending welcome mail to {}", mail.to);
//!         Ok::<_, HandlerError>(())
//!     });
//!
//!     mediator
//!         .publish(UserRegistered { name: "ada".into() })
//!         .await?;
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod dispatch;
mod error;
mod events;
mod executors;
mod handlers;
mod interceptors;
mod policies;
mod subscriptions;
mod transformers;

// ---- Public re-exports ----

pub use config::MediatorConfig;
pub use core::{Mediator, MediatorBuilder, Publisher, Subscriber};
pub use dispatch::Strategy;
pub use error::{HandlerError, MediatorError};
pub use events::{Envelope, Event, Report, ReportKind};
pub use executors::{DirectExecutor, Execute, RetryExecutor};
pub use handlers::{Handle, HandlerFn};
pub use interceptors::{Intercept, InterceptFor};
pub use policies::{BackoffPolicy, JitterPolicy};
pub use subscriptions::Subscription;
