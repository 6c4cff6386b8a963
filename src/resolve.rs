//! Transitive dependency resolution for generation queries
//!
//! Traversal is a recursive, depth-first walk over two edge kinds (static
//! and dynamic query refs). A fetched query is recorded as resolved only
//! after its own subtree has been walked (post-order). Membership is never
//! checked before descending, so a reference cycle keeps recursing until
//! the depth bound trips and is reported as [`ReportDepsError::CycleDetected`].
//!
//! Lookups run sequentially in traversal order; the first failure aborts
//! the whole call with no partial result.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::dependencies::{dedup_sorted, DependencySet};
use crate::error::ReportDepsError;
use crate::limits::ResolveLimits;
use crate::lookup::Lookup;
use crate::model::{DataSource, GenerationQuery, Report};

/// The two kinds of query-to-query edges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeKind {
    Static,
    Dynamic,
}

impl EdgeKind {
    const ALL: [EdgeKind; 2] = [EdgeKind::Static, EdgeKind::Dynamic];

    fn refs(self, query: &GenerationQuery) -> &[String] {
        match self {
            EdgeKind::Static => &query.spec.report_queries,
            EdgeKind::Dynamic => &query.spec.dynamic_report_queries,
        }
    }
}

/// Name-keyed state for one resolution call
#[derive(Default)]
struct Accumulator {
    static_queries: HashMap<String, Arc<GenerationQuery>>,
    dynamic_queries: HashMap<String, Arc<GenerationQuery>>,
    data_sources: HashMap<String, Arc<DataSource>>,
}

impl Accumulator {
    fn queries(&mut self, edge: EdgeKind) -> &mut HashMap<String, Arc<GenerationQuery>> {
        match edge {
            EdgeKind::Static => &mut self.static_queries,
            EdgeKind::Dynamic => &mut self.dynamic_queries,
        }
    }

    fn into_set(self, reports: Vec<Arc<Report>>) -> DependencySet {
        DependencySet::new(
            self.static_queries.into_values(),
            self.dynamic_queries.into_values(),
            self.data_sources.into_values(),
            reports,
        )
    }
}

/// Resolves the full dependency closure of generation queries
pub struct DependencyResolver<L> {
    lookup: L,
    limits: ResolveLimits,
}

impl<L: Lookup> DependencyResolver<L> {
    pub fn new(lookup: L) -> Self {
        Self {
            lookup,
            limits: ResolveLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: ResolveLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> ResolveLimits {
        self.limits
    }

    /// Resolve every transitive dependency of `root`
    #[instrument(skip(self, root), fields(namespace = %root.namespace, query = %root.name))]
    pub fn resolve(&self, root: &GenerationQuery) -> Result<DependencySet, ReportDepsError> {
        let mut acc = Accumulator::default();

        // root's own data sources come first so they win on duplicate names
        self.merge_data_sources(root, &mut acc.data_sources)?;
        self.visit(root, 0, &mut acc)?;
        let reports = self.direct_reports(root)?;

        let deps = acc.into_set(reports);
        debug!(
            static_queries = deps.static_queries.len(),
            dynamic_queries = deps.dynamic_queries.len(),
            data_sources = deps.data_sources.len(),
            reports = deps.reports.len(),
            "resolved dependencies"
        );
        Ok(deps)
    }

    /// Direct data-source refs of `query` only, deduplicated and sorted
    pub fn direct_data_sources(
        &self,
        query: &GenerationQuery,
    ) -> Result<Vec<Arc<DataSource>>, ReportDepsError> {
        let mut found = HashMap::new();
        self.merge_data_sources(query, &mut found)?;
        Ok(dedup_sorted(found.into_values()))
    }

    /// Direct report refs of `query`, looked up in the order given
    pub fn direct_reports(
        &self,
        query: &GenerationQuery,
    ) -> Result<Vec<Arc<Report>>, ReportDepsError> {
        let mut reports = Vec::with_capacity(query.spec.reports.len());
        for name in &query.spec.reports {
            debug!(report = %name, "looking up report");
            reports.push(self.lookup.report(&query.namespace, name)?);
        }
        Ok(dedup_sorted(reports))
    }

    fn visit(
        &self,
        node: &GenerationQuery,
        depth: usize,
        acc: &mut Accumulator,
    ) -> Result<(), ReportDepsError> {
        if depth >= self.limits.max_depth {
            warn!(query = %node.name, depth, "dependency depth bound reached");
            return Err(ReportDepsError::CycleDetected {
                name: node.name.clone(),
                depth,
            });
        }

        for edge in EdgeKind::ALL {
            for name in edge.refs(node) {
                if acc.queries(edge).contains_key(name) {
                    continue;
                }
                debug!(query = %name, ?edge, depth, "looking up generation query");
                let query = self.lookup.query(&node.namespace, name)?;
                self.merge_data_sources(&query, &mut acc.data_sources)?;
                self.visit(&query, depth + 1, acc)?;
                // post-order: only now is the query considered resolved
                acc.queries(edge).insert(query.name.clone(), query);
            }
        }

        Ok(())
    }

    /// Add `query`'s direct data sources; names already present are kept
    fn merge_data_sources(
        &self,
        query: &GenerationQuery,
        data_sources: &mut HashMap<String, Arc<DataSource>>,
    ) -> Result<(), ReportDepsError> {
        for name in &query.spec.data_sources {
            if data_sources.contains_key(name) {
                continue;
            }
            debug!(data_source = %name, "looking up data source");
            let ds = self.lookup.data_source(&query.namespace, name)?;
            data_sources.entry(ds.name.clone()).or_insert(ds);
        }
        Ok(())
    }
}

/// Resolve every transitive dependency of `root` with default limits
pub fn resolve_dependencies<L: Lookup>(
    lookup: L,
    root: &GenerationQuery,
) -> Result<DependencySet, ReportDepsError> {
    DependencyResolver::new(lookup).resolve(root)
}

/// Direct data-source dependencies of `query`, without traversal
pub fn dependent_data_sources<L: Lookup>(
    lookup: L,
    query: &GenerationQuery,
) -> Result<Vec<Arc<DataSource>>, ReportDepsError> {
    DependencyResolver::new(lookup).direct_data_sources(query)
}

/// Direct report dependencies of `query`
pub fn dependent_reports<L: Lookup>(
    lookup: L,
    query: &GenerationQuery,
) -> Result<Vec<Arc<Report>>, ReportDepsError> {
    DependencyResolver::new(lookup).direct_reports(query)
}
