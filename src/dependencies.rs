//! Resolved dependency set with deterministic ordering
//!
//! Every sequence is deduplicated by name (first occurrence wins) and
//! sorted ascending by name, so output never depends on discovery order.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::model::{DataSource, GenerationQuery, Named, Report};

/// Transitive dependencies of one generation query
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencySet {
    /// Static query dependencies (readiness-checked)
    pub static_queries: Vec<Arc<GenerationQuery>>,
    /// Dynamic query dependencies (never readiness-checked)
    pub dynamic_queries: Vec<Arc<GenerationQuery>>,
    pub data_sources: Vec<Arc<DataSource>>,
    pub reports: Vec<Arc<Report>>,
}

impl DependencySet {
    /// Build a set from unordered parts, enforcing dedup and ordering
    pub fn new<Q1, Q2, D, R>(
        static_queries: Q1,
        dynamic_queries: Q2,
        data_sources: D,
        reports: R,
    ) -> Self
    where
        Q1: IntoIterator<Item = Arc<GenerationQuery>>,
        Q2: IntoIterator<Item = Arc<GenerationQuery>>,
        D: IntoIterator<Item = Arc<DataSource>>,
        R: IntoIterator<Item = Arc<Report>>,
    {
        Self {
            static_queries: dedup_sorted(static_queries),
            dynamic_queries: dedup_sorted(dynamic_queries),
            data_sources: dedup_sorted(data_sources),
            reports: dedup_sorted(reports),
        }
    }

    pub fn static_query_names(&self) -> Vec<&str> {
        names(&self.static_queries)
    }

    pub fn dynamic_query_names(&self) -> Vec<&str> {
        names(&self.dynamic_queries)
    }

    pub fn data_source_names(&self) -> Vec<&str> {
        names(&self.data_sources)
    }

    pub fn report_names(&self) -> Vec<&str> {
        names(&self.reports)
    }

    pub fn len(&self) -> usize {
        self.static_queries.len()
            + self.dynamic_queries.len()
            + self.data_sources.len()
            + self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn names<T: Named>(items: &[Arc<T>]) -> Vec<&str> {
    items.iter().map(|i| i.name()).collect()
}

/// Drop repeated names (first occurrence wins), then sort by name
pub fn dedup_sorted<T, I>(items: I) -> Vec<Arc<T>>
where
    T: Named,
    I: IntoIterator<Item = Arc<T>>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut out: Vec<Arc<T>> = items
        .into_iter()
        .filter(|item| seen.insert(item.name().to_string()))
        .collect();
    out.sort_unstable_by(|a, b| a.name().cmp(b.name()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ds(name: &str, table: &str) -> Arc<DataSource> {
        Arc::new(DataSource::new("ns", name).with_table_name(table))
    }

    #[test]
    fn dedup_keeps_first_seen() {
        let out = dedup_sorted(vec![ds("b", "first"), ds("a", "x"), ds("b", "second")]);
        assert_eq!(names(&out), ["a", "b"]);
        assert_eq!(out[1].table_name(), Some("first"));
    }

    #[test]
    fn set_sorts_every_sequence() {
        let q = |n: &str| Arc::new(GenerationQuery::new("ns", n));
        let r = |n: &str| Arc::new(Report::new("ns", n));
        let set = DependencySet::new(
            vec![q("z"), q("m")],
            vec![q("y"), q("b"), q("y")],
            vec![ds("d2", ""), ds("d1", "")],
            vec![r("r2"), r("r1"), r("r2")],
        );

        assert_eq!(set.static_query_names(), ["m", "z"]);
        assert_eq!(set.dynamic_query_names(), ["b", "y"]);
        assert_eq!(set.data_source_names(), ["d1", "d2"]);
        assert_eq!(set.report_names(), ["r1", "r2"]);
        assert_eq!(set.len(), 8);
    }

    #[test]
    fn empty_set() {
        assert!(DependencySet::default().is_empty());
    }
}
