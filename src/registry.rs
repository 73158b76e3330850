use std::{
    collections::BTreeMap,
    sync::{Arc, PoisonError, RwLock},
};

use thiserror::Error;

use crate::{metric::Instrument, MetricKey};

/// Read side of a metric registry as seen by the exporter.
pub trait Registry: Send + Sync {
    /// Visit every registered instrument. Must be safe to call while the
    /// application keeps updating its instruments.
    fn each(&self, visit: &mut dyn FnMut(&str, &dyn Instrument));
}
impl<R: Registry + ?Sized> Registry for Arc<R> {
    fn each(&self, visit: &mut dyn FnMut(&str, &dyn Instrument)) {
        (**self).each(visit)
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("metric already registered; name={0}")]
    Duplicate(MetricKey),
}

/// Name-ordered map of instruments shared between the application and the
/// exporter.
#[derive(Default)]
pub struct MetricRegistry {
    instruments: RwLock<BTreeMap<MetricKey, Arc<dyn Instrument>>>,
}
impl MetricRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        name: impl Into<MetricKey>,
        instrument: Arc<dyn Instrument>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        let mut instruments = self
            .instruments
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if instruments.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        instruments.insert(name, instrument);
        Ok(())
    }
    pub fn unregister(&self, name: &str) -> Option<Arc<dyn Instrument>> {
        self.instruments
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }
    pub fn get(&self, name: &str) -> Option<Arc<dyn Instrument>> {
        self.instruments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }
    pub fn len(&self) -> usize {
        self.instruments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entries(&self) -> Vec<(MetricKey, Arc<dyn Instrument>)> {
        self.instruments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, instrument)| (name.clone(), instrument.clone()))
            .collect()
    }
}
impl Registry for MetricRegistry {
    fn each(&self, visit: &mut dyn FnMut(&str, &dyn Instrument)) {
        // Visit outside the lock so a slow snapshot never blocks registration.
        for (name, instrument) in self.entries() {
            visit(&name, instrument.as_ref());
        }
    }
}
impl core::fmt::Debug for MetricRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MetricRegistry")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::Snapshot;

    struct Fixed(i64);
    impl Instrument for Fixed {
        fn snapshot(&self) -> Option<Snapshot> {
            Some(Snapshot::Counter(self.0))
        }
    }

    #[test]
    fn rejects_duplicate_names() {
        let registry = MetricRegistry::new();
        registry.register("reqs", Arc::new(Fixed(1))).unwrap();
        let err = registry.register("reqs", Arc::new(Fixed(2))).unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate(name) if name == "reqs"));
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get("reqs").unwrap().snapshot(),
            Some(Snapshot::Counter(1))
        );
    }

    #[test]
    fn visits_in_name_order() {
        let registry = MetricRegistry::new();
        registry.register("b", Arc::new(Fixed(2))).unwrap();
        registry.register("a", Arc::new(Fixed(1))).unwrap();
        let mut seen = vec![];
        registry.each(&mut |name, _| seen.push(name.to_owned()));
        assert_eq!(seen, ["a", "b"]);
    }

    #[test]
    fn unregister_frees_the_name() {
        let registry = MetricRegistry::new();
        registry.register("a", Arc::new(Fixed(1))).unwrap();
        assert!(registry.unregister("a").is_some());
        assert!(registry.is_empty());
        registry.register("a", Arc::new(Fixed(3))).unwrap();
    }
}
