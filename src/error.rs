//! Error types with fix suggestions
//!
//! Callers drive their retry policy from these variants:
//! - `Lookup` and uninitialized dependencies are worth retrying later
//! - `CycleDetected` and disabled-view dependencies need a definition fix
//! - input errors are fatal for one execution attempt

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// Kind of definition a lookup was asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    GenerationQuery,
    DataSource,
    Report,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::GenerationQuery => write!(f, "ReportGenerationQuery"),
            ResourceKind::DataSource => write!(f, "ReportDataSource"),
            ResourceKind::Report => write!(f, "Report"),
        }
    }
}

/// Failure returned by a [`Lookup`](crate::lookup::Lookup) backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("{kind} '{namespace}/{name}' not found")]
    NotFound {
        kind: ResourceKind,
        namespace: String,
        name: String,
    },

    #[error("failed to fetch {kind} '{namespace}/{name}': {message}")]
    Backend {
        kind: ResourceKind,
        namespace: String,
        name: String,
        message: String,
    },
}

impl LookupError {
    pub fn not_found(kind: ResourceKind, namespace: &str, name: &str) -> Self {
        LookupError::NotFound {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LookupError::NotFound { .. })
    }
}

/// Readiness classification of a resolved dependency set.
///
/// Built only once every list is complete. At least one list is non-empty
/// whenever this error is returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyValidationError {
    pub disabled_view_queries: Vec<String>,
    pub uninitialized_queries: Vec<String>,
    pub uninitialized_data_sources: Vec<String>,
    pub uninitialized_reports: Vec<String>,
}

impl DependencyValidationError {
    pub fn is_empty(&self) -> bool {
        self.disabled_view_queries.is_empty() && !self.has_uninitialized()
    }

    /// Some static dependency has its view disabled (configuration fault)
    pub fn is_invalid(&self) -> bool {
        !self.disabled_view_queries.is_empty()
    }

    /// Some dependency has not been materialized yet
    pub fn has_uninitialized(&self) -> bool {
        !self.uninitialized_queries.is_empty()
            || !self.uninitialized_data_sources.is_empty()
            || !self.uninitialized_reports.is_empty()
    }
}

impl fmt::Display for DependencyValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sections = [
            (
                "uninitialized ReportDataSource dependencies",
                &self.uninitialized_data_sources,
            ),
            (
                "invalid ReportGenerationQuery dependencies (disabled view)",
                &self.disabled_view_queries,
            ),
            (
                "uninitialized ReportGenerationQuery dependencies",
                &self.uninitialized_queries,
            ),
            ("uninitialized Report dependencies", &self.uninitialized_reports),
        ];
        let parts: Vec<String> = sections
            .iter()
            .filter(|(_, names)| !names.is_empty())
            .map(|(label, names)| format!("{}: {}", label, names.join(", ")))
            .collect();

        if parts.is_empty() {
            write!(f, "no uninitialized or invalid dependencies")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

impl std::error::Error for DependencyValidationError {}

/// All error variants are part of the public API.
#[derive(Error, Debug)]
pub enum ReportDepsError {
    // ─────────────────────────────────────────────────────────────
    // Resolution errors (RDEP-010 to RDEP-011)
    // ─────────────────────────────────────────────────────────────
    #[error("RDEP-010: {0}")]
    Lookup(#[from] LookupError),

    #[error("RDEP-011: detected a cycle at depth {depth} for generation query '{name}'")]
    CycleDetected { name: String, depth: usize },

    // ─────────────────────────────────────────────────────────────
    // Readiness classification (RDEP-020)
    // ─────────────────────────────────────────────────────────────
    #[error("RDEP-020: dependency validation failed: {0}")]
    Dependencies(DependencyValidationError),

    // ─────────────────────────────────────────────────────────────
    // Input errors (RDEP-030 to RDEP-032)
    // ─────────────────────────────────────────────────────────────
    #[error("RDEP-030: input '{name}' is not a valid {expected}: value: {value}, err: {source}")]
    TypeMismatch {
        name: String,
        expected: String,
        value: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("RDEP-031: unsupported input type '{input_type}' for input '{name}'")]
    UnsupportedType { name: String, input_type: String },

    #[error(
        "RDEP-032: unable to validate generation query '{query}' inputs: requires {} as inputs, got {}",
        .expected.join(","),
        .given.join(",")
    )]
    MissingRequiredInputs {
        query: String,
        expected: Vec<String>,
        given: Vec<String>,
    },

    // ─────────────────────────────────────────────────────────────
    // Catalog errors (RDEP-040 to RDEP-043)
    // ─────────────────────────────────────────────────────────────
    #[error("RDEP-040: failed to read catalog {}: {source}", .path.display())]
    CatalogIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("RDEP-041: failed to parse catalog {}: {source}", .path.display())]
    CatalogParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("RDEP-042: invalid {kind} name '{name}'")]
    InvalidName { kind: ResourceKind, name: String },

    #[error("RDEP-043: duplicate {kind} '{namespace}/{name}' in catalog")]
    DuplicateEntry {
        kind: ResourceKind,
        namespace: String,
        name: String,
    },
}

impl ReportDepsError {
    /// See [`is_uninitialized_dependency_error`]
    pub fn is_uninitialized_dependency(&self) -> bool {
        matches!(self, ReportDepsError::Dependencies(e) if e.has_uninitialized())
    }

    /// See [`is_invalid_dependency_error`]
    pub fn is_invalid_dependency(&self) -> bool {
        matches!(self, ReportDepsError::Dependencies(e) if e.is_invalid())
    }

    /// Classification details, when this is a readiness error
    pub fn classification(&self) -> Option<&DependencyValidationError> {
        match self {
            ReportDepsError::Dependencies(e) => Some(e),
            _ => None,
        }
    }
}

/// True when `err` is a classification error with at least one
/// uninitialized query, data source or report.
///
/// Independent of [`is_invalid_dependency_error`]; both can hold at once.
pub fn is_uninitialized_dependency_error(err: &ReportDepsError) -> bool {
    err.is_uninitialized_dependency()
}

/// True when `err` is a classification error naming at least one static
/// dependency with its view disabled. Check this before
/// [`is_uninitialized_dependency_error`]: it means retrying will not help.
pub fn is_invalid_dependency_error(err: &ReportDepsError) -> bool {
    err.is_invalid_dependency()
}

impl FixSuggestion for ReportDepsError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            ReportDepsError::Lookup(LookupError::NotFound { .. }) => {
                Some("Create the referenced definition or fix the reference name")
            }
            ReportDepsError::Lookup(LookupError::Backend { .. }) => {
                Some("Retry the resolution once the backing store is reachable")
            }
            ReportDepsError::CycleDetected { .. } => {
                Some("Remove the circular reference between generation queries")
            }
            ReportDepsError::Dependencies(e) if e.is_invalid() => Some(
                "Enable the view of the listed queries or reference them as dynamic dependencies",
            ),
            ReportDepsError::Dependencies(_) => {
                Some("Wait for the listed dependencies to create their views/tables, then retry")
            }
            ReportDepsError::TypeMismatch { .. } => {
                Some("Supply a value matching the declared input type")
            }
            ReportDepsError::UnsupportedType { .. } => {
                Some("Declare the input type as one of: string, time, int")
            }
            ReportDepsError::MissingRequiredInputs { .. } => {
                Some("Supply a value for every required input")
            }
            ReportDepsError::CatalogIo { .. } => Some("Check file path and permissions"),
            ReportDepsError::CatalogParse { .. } => {
                Some("Check YAML syntax: indentation and quoting")
            }
            ReportDepsError::InvalidName { .. } => {
                Some("Use lowercase alphanumerics, '-' and '.', starting and ending alphanumeric")
            }
            ReportDepsError::DuplicateEntry { .. } => {
                Some("Define each resource only once per namespace")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classification(
        disabled: &[&str],
        queries: &[&str],
        data_sources: &[&str],
        reports: &[&str],
    ) -> ReportDepsError {
        let own = |names: &[&str]| -> Vec<String> {
            names.iter().map(|s| s.to_string()).collect()
        };
        ReportDepsError::Dependencies(DependencyValidationError {
            disabled_view_queries: own(disabled),
            uninitialized_queries: own(queries),
            uninitialized_data_sources: own(data_sources),
            uninitialized_reports: own(reports),
        })
    }

    #[test]
    fn invalid_predicate_requires_disabled_views() {
        assert!(is_invalid_dependency_error(&classification(&["a"], &[], &[], &[])));
        assert!(!is_invalid_dependency_error(&classification(&[], &["a"], &[], &[])));
    }

    #[test]
    fn uninitialized_predicate_covers_each_list() {
        assert!(is_uninitialized_dependency_error(&classification(&[], &["q"], &[], &[])));
        assert!(is_uninitialized_dependency_error(&classification(&[], &[], &["d"], &[])));
        assert!(is_uninitialized_dependency_error(&classification(&[], &[], &[], &["r"])));
        assert!(!is_uninitialized_dependency_error(&classification(&["a"], &[], &[], &[])));
    }

    #[test]
    fn both_predicates_can_hold() {
        let err = classification(&["a"], &["b"], &[], &[]);
        assert!(is_invalid_dependency_error(&err));
        assert!(is_uninitialized_dependency_error(&err));
    }

    #[test]
    fn predicates_ignore_other_errors() {
        let err = ReportDepsError::CycleDetected {
            name: "q".into(),
            depth: 100,
        };
        assert!(!is_invalid_dependency_error(&err));
        assert!(!is_uninitialized_dependency_error(&err));
    }

    #[test]
    fn classification_message_lists_each_category_once() {
        let err = classification(&["v"], &["q"], &["d1", "d2"], &["r"]);
        let msg = err.to_string();
        assert!(msg.starts_with("RDEP-020"));
        assert!(msg.contains("uninitialized ReportDataSource dependencies: d1, d2"));
        assert!(msg.contains("(disabled view): v"));
        assert!(msg.contains("uninitialized ReportGenerationQuery dependencies: q"));
        assert_eq!(msg.matches("uninitialized Report dependencies").count(), 1);
    }

    #[test]
    fn missing_inputs_message_joins_names() {
        let err = ReportDepsError::MissingRequiredInputs {
            query: "q".into(),
            expected: vec!["a".into(), "b".into()],
            given: vec![],
        };
        assert_eq!(
            err.to_string(),
            "RDEP-032: unable to validate generation query 'q' inputs: requires a,b as inputs, got "
        );
    }

    #[test]
    fn every_error_has_a_suggestion() {
        let err = ReportDepsError::Lookup(LookupError::not_found(
            ResourceKind::Report,
            "ns",
            "r",
        ));
        assert!(err.fix_suggestion().is_some());
        assert!(classification(&["a"], &[], &[], &[])
            .fix_suggestion()
            .unwrap()
            .contains("dynamic"));
    }
}
