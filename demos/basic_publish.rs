//! # Example: basic_publish
//!
//! Demonstrates the publish pipeline: a global interceptor, a typed
//! interceptor that vetoes some events, a transformer, and two handlers.
//!
//! ## Flow
//! ```text
//! publish(OrderPlaced)
//!   ├─► Audit.before_publish        (global)
//!   ├─► RejectEmpty.before_publish  (OrderPlaced only; false → stop)
//!   ├─► transform OrderPlaced → InvoiceRequested
//!   ├─► dispatch InvoiceRequested to [billing, mailer] (sequential)
//!   ├─► Audit.after_publish
//!   └─► RejectEmpty.after_publish
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=eventvisor=debug cargo run --example basic_publish
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use eventvisor::{Envelope, HandlerError, Intercept, InterceptFor, Mediator, MediatorConfig};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

struct OrderPlaced {
    id: u32,
    items: Vec<&'static str>,
}

struct InvoiceRequested {
    order: u32,
    lines: usize,
}

struct Audit;

#[async_trait]
impl Intercept for Audit {
    async fn before_publish(&self, envelope: &Envelope, _token: &CancellationToken) -> bool {
        println!("[audit] #{} {} in", envelope.seq, envelope.type_name());
        true
    }

    async fn after_publish(&self, envelope: &Envelope, _token: &CancellationToken) {
        println!("[audit] #{} {} out", envelope.seq, envelope.type_name());
    }

    fn name(&self) -> &str {
        "audit"
    }
}

struct RejectEmpty;

#[async_trait]
impl InterceptFor<OrderPlaced> for RejectEmpty {
    async fn before_publish(&self, event: &OrderPlaced, _token: &CancellationToken) -> bool {
        if event.items.is_empty() {
            println!("[reject-empty] order {} has no items", event.id);
            return false;
        }
        true
    }

    fn name(&self) -> &str {
        "reject-empty"
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mediator = Mediator::builder(MediatorConfig::default())
        .with_interceptor(Arc::new(Audit))
        .build()?;
    mediator.add_interceptor_for::<OrderPlaced, _>(Arc::new(RejectEmpty));
    mediator.add_transformer::<OrderPlaced, InvoiceRequested, _>(|o| InvoiceRequested {
        order: o.id,
        lines: o.items.len(),
    });

    let subscriber = mediator.subscriber();
    subscriber.subscribe_fn("billing", |inv: Arc<InvoiceRequested>| async move {
        println!("[billing] invoice for order {} ({} lines)", inv.order, inv.lines);
        Ok::<_, HandlerError>(())
    });
    let mailer = subscriber.subscribe_fn("mailer", |inv: Arc<InvoiceRequested>| async move {
        println!("[mailer] invoice mail for order {}", inv.order);
        Ok::<_, HandlerError>(())
    });

    let publisher = mediator.publisher();
    publisher
        .publish(OrderPlaced {
            id: 1,
            items: vec!["book", "pen"],
        })
        .await?;
    publisher
        .publish(OrderPlaced {
            id: 2,
            items: Vec::new(),
        })
        .await?;

    println!("disposing {mailer}");
    mailer.dispose();
    publisher
        .publish(OrderPlaced {
            id: 3,
            items: vec!["lamp"],
        })
        .await?;

    println!(
        "invoice subscribers left: {}",
        mediator.subscriber_count::<InvoiceRequested>()
    );
    Ok(())
}
