//! Definition snapshots: generation queries, data sources, reports
//!
//! Field names follow the camelCase layout of the catalog YAML.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name of a definition, used for dedup and ordering
pub trait Named {
    fn name(&self) -> &str;
}

/// Named definition describing how to compute a derived report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationQuery {
    #[serde(default)]
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub spec: GenerationQuerySpec,
    #[serde(default)]
    pub status: GenerationQueryStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationQuerySpec {
    #[serde(default)]
    pub view: ViewSpec,
    /// Static query references: must be materialized before use
    #[serde(default)]
    pub report_queries: Vec<String>,
    /// Dynamic query references: never readiness-checked
    #[serde(default)]
    pub dynamic_report_queries: Vec<String>,
    #[serde(default)]
    pub data_sources: Vec<String>,
    #[serde(default)]
    pub reports: Vec<String>,
    #[serde(default)]
    pub inputs: Vec<InputDefinition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewSpec {
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationQueryStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_name: Option<String>,
}

impl GenerationQuery {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn view_disabled(&self) -> bool {
        self.spec.view.disabled
    }

    /// Materialized view name, `None` when unset or empty
    pub fn view_name(&self) -> Option<&str> {
        self.status.view_name.as_deref().filter(|v| !v.is_empty())
    }

    /// Usable as a static dependency: view disabled or already created
    pub fn is_ready(&self) -> bool {
        self.view_disabled() || self.view_name().is_some()
    }

    // Builder-style helpers, mostly for fixtures

    pub fn with_static_refs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec.report_queries = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_dynamic_refs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec.dynamic_report_queries = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_data_sources<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec.data_sources = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_reports<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec.reports = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_inputs(mut self, inputs: Vec<InputDefinition>) -> Self {
        self.spec.inputs = inputs;
        self
    }

    pub fn with_view_disabled(mut self, disabled: bool) -> Self {
        self.spec.view.disabled = disabled;
        self
    }

    pub fn with_view_name(mut self, view_name: impl Into<String>) -> Self {
        self.status.view_name = Some(view_name.into());
        self
    }
}

impl Named for GenerationQuery {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Status shared by definitions backed by a table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
}

impl TableStatus {
    fn table_name(&self) -> Option<&str> {
        self.table_name.as_deref().filter(|t| !t.is_empty())
    }
}

/// Leaf definition backed by a materialized table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    #[serde(default)]
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub status: TableStatus,
}

impl DataSource {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            status: TableStatus::default(),
        }
    }

    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.status.table_name = Some(table_name.into());
        self
    }

    pub fn table_name(&self) -> Option<&str> {
        self.status.table_name()
    }

    pub fn is_ready(&self) -> bool {
        self.table_name().is_some()
    }
}

impl Named for DataSource {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Computed output of a query; has no dependency refs of its own
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    #[serde(default)]
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub status: TableStatus,
}

impl Report {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            status: TableStatus::default(),
        }
    }

    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.status.table_name = Some(table_name.into());
        self
    }

    pub fn table_name(&self) -> Option<&str> {
        self.status.table_name()
    }

    pub fn is_ready(&self) -> bool {
        self.table_name().is_some()
    }
}

impl Named for Report {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Declared input parameter of a generation query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputDefinition {
    pub name: String,
    /// `string` (default), `time` or `int`; kept raw so unknown types
    /// surface as an input error instead of a parse error
    #[serde(default, rename = "type")]
    pub input_type: String,
    #[serde(default)]
    pub required: bool,
}

impl InputDefinition {
    pub fn new(name: impl Into<String>, input_type: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            input_type: input_type.into(),
            required,
        }
    }
}

/// Caller-supplied input value, still encoded
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputValue {
    pub name: String,
    /// `None` and JSON `null` both mean "explicitly null"
    #[serde(default)]
    pub value: Option<Value>,
}

impl InputValue {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    pub fn null(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// Raw payload, `None` when explicitly null
    pub fn raw(&self) -> Option<&Value> {
        self.value.as_ref().filter(|v| !v.is_null())
    }
}
