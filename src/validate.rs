//! Readiness validation of a resolved dependency set
//!
//! Classification happens in full before any handler hook fires and before
//! the error is built. Four categories only:
//! - static queries with their view disabled (invalid configuration)
//! - static queries without a view yet
//! - data sources without a table yet
//! - reports without a table yet
//!
//! Dynamic queries are never readiness-checked.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::dependencies::DependencySet;
use crate::error::{DependencyValidationError, ReportDepsError};
use crate::limits::ResolveLimits;
use crate::lookup::Lookup;
use crate::model::{DataSource, GenerationQuery};
use crate::resolve::DependencyResolver;

/// Notified about each dependency that is not materialized yet,
/// typically to requeue it for reconciliation
pub trait UninitializedDependencyHandler {
    fn on_uninitialized_query(&mut self, query: &Arc<GenerationQuery>);

    fn on_uninitialized_data_source(&mut self, data_source: &Arc<DataSource>);
}

/// Handler built from two closures
pub struct HandlerFns<Q, D> {
    pub on_query: Q,
    pub on_data_source: D,
}

impl<Q, D> UninitializedDependencyHandler for HandlerFns<Q, D>
where
    Q: FnMut(&Arc<GenerationQuery>),
    D: FnMut(&Arc<DataSource>),
{
    fn on_uninitialized_query(&mut self, query: &Arc<GenerationQuery>) {
        (self.on_query)(query)
    }

    fn on_uninitialized_data_source(&mut self, data_source: &Arc<DataSource>) {
        (self.on_data_source)(data_source)
    }
}

/// Classify `deps`, notifying `handler` of uninitialized queries and data sources
#[instrument(skip_all, fields(dependencies = deps.len()))]
pub fn validate_dependencies(
    deps: &DependencySet,
    handler: Option<&mut dyn UninitializedDependencyHandler>,
) -> Result<(), ReportDepsError> {
    let mut classification = DependencyValidationError::default();
    let mut uninitialized_queries = Vec::new();
    let mut uninitialized_data_sources = Vec::new();

    for query in &deps.static_queries {
        // a disabled view is a configuration fault, never "uninitialized"
        if query.view_disabled() {
            classification.disabled_view_queries.push(query.name.clone());
            continue;
        }
        if query.view_name().is_none() {
            classification.uninitialized_queries.push(query.name.clone());
            uninitialized_queries.push(query);
        }
    }

    for ds in &deps.data_sources {
        if !ds.is_ready() {
            classification.uninitialized_data_sources.push(ds.name.clone());
            uninitialized_data_sources.push(ds);
        }
    }

    for report in &deps.reports {
        if !report.is_ready() {
            classification.uninitialized_reports.push(report.name.clone());
        }
    }

    if let Some(handler) = handler {
        for query in uninitialized_queries {
            handler.on_uninitialized_query(query);
        }
        for ds in uninitialized_data_sources {
            handler.on_uninitialized_data_source(ds);
        }
    }

    if classification.is_empty() {
        return Ok(());
    }
    debug!(%classification, "dependencies not ready");
    Err(ReportDepsError::Dependencies(classification))
}

/// Resolve then validate; the set is only returned when every dependency is ready
pub fn get_and_validate_dependencies<L: Lookup>(
    lookup: L,
    root: &GenerationQuery,
    handler: Option<&mut dyn UninitializedDependencyHandler>,
) -> Result<DependencySet, ReportDepsError> {
    get_and_validate_dependencies_with_limits(lookup, root, handler, ResolveLimits::default())
}

/// [`get_and_validate_dependencies`] with explicit resolution limits
pub fn get_and_validate_dependencies_with_limits<L: Lookup>(
    lookup: L,
    root: &GenerationQuery,
    handler: Option<&mut dyn UninitializedDependencyHandler>,
    limits: ResolveLimits,
) -> Result<DependencySet, ReportDepsError> {
    let deps = DependencyResolver::new(lookup)
        .with_limits(limits)
        .resolve(root)?;
    validate_dependencies(&deps, handler)?;
    Ok(deps)
}
