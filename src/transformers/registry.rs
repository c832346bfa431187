//! # Transformer registry.
//!
//! Maps a source event type to one function that rewrites a published value
//! into a different event before dispatch. The output's type becomes the
//! dispatch key; interceptors keep seeing the original envelope.
//!
//! ## Rules
//! - At most one transformer per source type; registering again replaces it.
//! - Transformation is not chained: the output is never transformed again.
//! - Transformation is synchronous and not cancellable.

use std::any::{TypeId, type_name};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::events::{Envelope, Event};

type TransformFn = Arc<dyn Fn(&Envelope) -> Option<Envelope> + Send + Sync>;

/// Source type → transform function.
#[derive(Default)]
pub(crate) struct Transformers {
    map: DashMap<TypeId, TransformFn>,
}

impl Transformers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Installs `f` for source type `S`. Returns `true` if one was replaced.
    pub(crate) fn insert<S, T, F>(&self, f: F) -> bool
    where
        S: Event,
        T: Event,
        F: Fn(&S) -> T + Send + Sync + 'static,
    {
        let apply: TransformFn = Arc::new(move |env: &Envelope| {
            env.downcast_ref::<S>().map(|src| Envelope::new(f(src)))
        });
        let replaced = self
            .map
            .insert(TypeId::of::<S>(), apply)
            .is_some();

        debug!(
            source = type_name::<S>(),
            target = type_name::<T>(),
            replaced,
            "transformer registered"
        );
        replaced
    }

    /// Rewrites `envelope` if a transformer exists for its type.
    pub(crate) fn apply(&self, envelope: &Envelope) -> Option<Envelope> {
        let apply = {
            let entry = self.map.get(&envelope.type_id())?;
            Arc::clone(entry.value())
        };
        let out = apply(envelope)?;
        debug!(
            source = envelope.type_name(),
            target = out.type_name(),
            "event transformed"
        );
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Celsius(f64);
    #[derive(Debug, PartialEq)]
    struct Fahrenheit(f64);

    #[test]
    fn apply_rewrites_value_and_type() {
        let t = Transformers::new();
        assert!(!t.insert::<Celsius, Fahrenheit, _>(|c| Fahrenheit(c.0 * 9.0 / 5.0 + 32.0)));

        let out = t.apply(&Envelope::new(Celsius(100.0))).unwrap();
        assert!(out.is::<Fahrenheit>());
        assert_eq!(out.downcast_ref::<Fahrenheit>(), Some(&Fahrenheit(212.0)));
    }

    #[test]
    fn unregistered_types_pass_through() {
        let t = Transformers::new();
        t.insert::<Celsius, Fahrenheit, _>(|c| Fahrenheit(c.0));
        assert!(t.apply(&Envelope::new(Fahrenheit(1.0))).is_none());
        assert!(t.apply(&Envelope::new(7u32)).is_none());
    }

    #[test]
    fn reregistration_overwrites() {
        let t = Transformers::new();
        t.insert::<Celsius, Fahrenheit, _>(|_| Fahrenheit(1.0));
        assert!(t.insert::<Celsius, Fahrenheit, _>(|_| Fahrenheit(2.0)));

        let out = t.apply(&Envelope::new(Celsius(0.0))).unwrap();
        assert_eq!(out.downcast_ref::<Fahrenheit>(), Some(&Fahrenheit(2.0)));
    }
}
