//! reportdeps - dependency resolution and readiness validation for
//! report generation queries

pub mod catalog;
pub mod dependencies;
pub mod error;
pub mod inputs;
pub mod limits;
pub mod lookup;
pub mod model;
pub mod resolve;
pub mod validate;

pub use catalog::{load_catalog, CatalogLoader};
pub use dependencies::DependencySet;
pub use error::{
    is_invalid_dependency_error, is_uninitialized_dependency_error, DependencyValidationError,
    FixSuggestion, LookupError, ReportDepsError, ResourceKind,
};
pub use inputs::{validate_and_coerce_inputs, TypedInput};
pub use limits::ResolveLimits;
pub use lookup::{CatalogIndex, FnLookup, Lookup};
pub use model::{DataSource, GenerationQuery, InputDefinition, InputValue, Report};
pub use resolve::{dependent_data_sources, dependent_reports, resolve_dependencies, DependencyResolver};
pub use validate::{
    get_and_validate_dependencies, get_and_validate_dependencies_with_limits,
    validate_dependencies, HandlerFns, UninitializedDependencyHandler,
};
