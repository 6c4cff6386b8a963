//! Lookup capabilities for definitions
//!
//! The resolver only sees the [`Lookup`] trait. Two adapters ship here:
//! - [`CatalogIndex`]: in-memory index (DashMap, lock-free reads), the local
//!   read-through cache a controller keeps warm
//! - [`FnLookup`]: closures, typically wrapping a direct remote read

use std::sync::Arc;

use dashmap::DashMap;

use crate::error::{LookupError, ResourceKind};
use crate::model::{DataSource, GenerationQuery, Report};

/// Synchronous fetch-by-namespace/name of definitions
pub trait Lookup {
    fn query(&self, namespace: &str, name: &str) -> Result<Arc<GenerationQuery>, LookupError>;

    fn data_source(&self, namespace: &str, name: &str) -> Result<Arc<DataSource>, LookupError>;

    fn report(&self, namespace: &str, name: &str) -> Result<Arc<Report>, LookupError>;
}

impl<L: Lookup + ?Sized> Lookup for &L {
    fn query(&self, namespace: &str, name: &str) -> Result<Arc<GenerationQuery>, LookupError> {
        (**self).query(namespace, name)
    }

    fn data_source(&self, namespace: &str, name: &str) -> Result<Arc<DataSource>, LookupError> {
        (**self).data_source(namespace, name)
    }

    fn report(&self, namespace: &str, name: &str) -> Result<Arc<Report>, LookupError> {
        (**self).report(namespace, name)
    }
}

impl<L: Lookup + ?Sized> Lookup for Arc<L> {
    fn query(&self, namespace: &str, name: &str) -> Result<Arc<GenerationQuery>, LookupError> {
        (**self).query(namespace, name)
    }

    fn data_source(&self, namespace: &str, name: &str) -> Result<Arc<DataSource>, LookupError> {
        (**self).data_source(namespace, name)
    }

    fn report(&self, namespace: &str, name: &str) -> Result<Arc<Report>, LookupError> {
        (**self).report(namespace, name)
    }
}

type Key = (String, String);

fn key(namespace: &str, name: &str) -> Key {
    (namespace.to_string(), name.to_string())
}

/// Thread-safe in-memory index of definitions
#[derive(Clone, Default)]
pub struct CatalogIndex {
    queries: Arc<DashMap<Key, Arc<GenerationQuery>>>,
    data_sources: Arc<DashMap<Key, Arc<DataSource>>>,
    reports: Arc<DashMap<Key, Arc<Report>>>,
}

impl CatalogIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a query, returning the previous snapshot
    pub fn insert_query(&self, query: GenerationQuery) -> Option<Arc<GenerationQuery>> {
        self.queries
            .insert(key(&query.namespace, &query.name), Arc::new(query))
    }

    /// Insert or replace a data source, returning the previous snapshot
    pub fn insert_data_source(&self, data_source: DataSource) -> Option<Arc<DataSource>> {
        self.data_sources.insert(
            key(&data_source.namespace, &data_source.name),
            Arc::new(data_source),
        )
    }

    /// Insert or replace a report, returning the previous snapshot
    pub fn insert_report(&self, report: Report) -> Option<Arc<Report>> {
        self.reports
            .insert(key(&report.namespace, &report.name), Arc::new(report))
    }

    pub fn remove(&self, kind: ResourceKind, namespace: &str, name: &str) -> bool {
        let k = key(namespace, name);
        match kind {
            ResourceKind::GenerationQuery => self.queries.remove(&k).is_some(),
            ResourceKind::DataSource => self.data_sources.remove(&k).is_some(),
            ResourceKind::Report => self.reports.remove(&k).is_some(),
        }
    }

    pub fn contains(&self, kind: ResourceKind, namespace: &str, name: &str) -> bool {
        let k = key(namespace, name);
        match kind {
            ResourceKind::GenerationQuery => self.queries.contains_key(&k),
            ResourceKind::DataSource => self.data_sources.contains_key(&k),
            ResourceKind::Report => self.reports.contains_key(&k),
        }
    }

    /// Total number of indexed definitions
    pub fn len(&self) -> usize {
        self.queries.len() + self.data_sources.len() + self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Lookup for CatalogIndex {
    fn query(&self, namespace: &str, name: &str) -> Result<Arc<GenerationQuery>, LookupError> {
        self.queries
            .get(&key(namespace, name))
            .map(|q| Arc::clone(q.value()))
            .ok_or_else(|| LookupError::not_found(ResourceKind::GenerationQuery, namespace, name))
    }

    fn data_source(&self, namespace: &str, name: &str) -> Result<Arc<DataSource>, LookupError> {
        self.data_sources
            .get(&key(namespace, name))
            .map(|ds| Arc::clone(ds.value()))
            .ok_or_else(|| LookupError::not_found(ResourceKind::DataSource, namespace, name))
    }

    fn report(&self, namespace: &str, name: &str) -> Result<Arc<Report>, LookupError> {
        self.reports
            .get(&key(namespace, name))
            .map(|r| Arc::clone(r.value()))
            .ok_or_else(|| LookupError::not_found(ResourceKind::Report, namespace, name))
    }
}

/// Lookup backed by three closures
pub struct FnLookup<Q, D, R> {
    query: Q,
    data_source: D,
    report: R,
}

impl<Q, D, R> FnLookup<Q, D, R>
where
    Q: Fn(&str, &str) -> Result<Arc<GenerationQuery>, LookupError>,
    D: Fn(&str, &str) -> Result<Arc<DataSource>, LookupError>,
    R: Fn(&str, &str) -> Result<Arc<Report>, LookupError>,
{
    pub fn new(query: Q, data_source: D, report: R) -> Self {
        Self {
            query,
            data_source,
            report,
        }
    }
}

impl<Q, D, R> Lookup for FnLookup<Q, D, R>
where
    Q: Fn(&str, &str) -> Result<Arc<GenerationQuery>, LookupError>,
    D: Fn(&str, &str) -> Result<Arc<DataSource>, LookupError>,
    R: Fn(&str, &str) -> Result<Arc<Report>, LookupError>,
{
    fn query(&self, namespace: &str, name: &str) -> Result<Arc<GenerationQuery>, LookupError> {
        (self.query)(namespace, name)
    }

    fn data_source(&self, namespace: &str, name: &str) -> Result<Arc<DataSource>, LookupError> {
        (self.data_source)(namespace, name)
    }

    fn report(&self, namespace: &str, name: &str) -> Result<Arc<Report>, LookupError> {
        (self.report)(namespace, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn index_returns_shared_snapshots() {
        let index = CatalogIndex::new();
        index.insert_query(GenerationQuery::new("ns", "q"));

        let a = index.query("ns", "q").unwrap();
        let b = index.query("ns", "q").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn index_is_namespaced() {
        let index = CatalogIndex::new();
        index.insert_data_source(DataSource::new("a", "ds"));

        assert!(index.data_source("a", "ds").is_ok());
        let err = index.data_source("b", "ds").unwrap_err();
        assert_eq!(
            err,
            LookupError::not_found(ResourceKind::DataSource, "b", "ds")
        );
    }

    #[test]
    fn insert_replaces_and_remove_drops() {
        let index = CatalogIndex::new();
        assert!(index.insert_report(Report::new("ns", "r")).is_none());
        assert!(index
            .insert_report(Report::new("ns", "r").with_table_name("t"))
            .is_some());
        assert_eq!(index.len(), 1);
        assert!(index.report("ns", "r").unwrap().is_ready());

        assert!(index.remove(ResourceKind::Report, "ns", "r"));
        assert!(!index.contains(ResourceKind::Report, "ns", "r"));
        assert!(index.is_empty());
    }

    #[test]
    fn fn_lookup_calls_closures() {
        let calls = Cell::new(0);
        let lookup = FnLookup::new(
            |ns: &str, name: &str| {
                calls.set(calls.get() + 1);
                Ok(Arc::new(GenerationQuery::new(ns, name)))
            },
            |ns: &str, name: &str| Err(LookupError::not_found(ResourceKind::DataSource, ns, name)),
            |ns: &str, name: &str| Ok(Arc::new(Report::new(ns, name))),
        );

        assert_eq!(lookup.query("ns", "q").unwrap().name, "q");
        assert!(lookup.data_source("ns", "d").unwrap_err().is_not_found());
        assert_eq!(lookup.report("ns", "r").unwrap().namespace, "ns");
        assert_eq!(calls.get(), 1);
    }
}
