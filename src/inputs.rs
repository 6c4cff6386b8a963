//! Input parameter validation and type coercion
//!
//! Supplied values arrive JSON-encoded and are decoded according to the
//! query's declared input types:
//! - `string` (also the default for empty or undeclared types)
//! - `time`: RFC 3339 timestamp
//! - `int` / `integer`: JSON integer
//!
//! The reporting period inputs are always decoded as `time`.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::ReportDepsError;
use crate::model::{GenerationQuery, InputDefinition, InputValue};

/// Reserved input carrying the start of the reporting period
pub const REPORTING_START_INPUT_NAME: &str = "ReportingStart";
/// Reserved input carrying the end of the reporting period
pub const REPORTING_END_INPUT_NAME: &str = "ReportingEnd";

/// Decoded input value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TypedInput {
    Null,
    String(String),
    Time(DateTime<Utc>),
    Int(i64),
}

impl TypedInput {
    pub fn as_time(&self) -> Option<DateTime<Utc>> {
        match self {
            TypedInput::Time(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            TypedInput::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedInput::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, TypedInput::Null)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputType {
    String,
    Time,
    Int,
}

impl InputType {
    fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "" | "string" => Some(InputType::String),
            "time" => Some(InputType::Time),
            "int" | "integer" => Some(InputType::Int),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            InputType::String => "string",
            InputType::Time => "time",
            InputType::Int => "int",
        }
    }

    fn decode(self, raw: &Value) -> Result<TypedInput, serde_json::Error> {
        match self {
            InputType::String => String::deserialize(raw).map(TypedInput::String),
            InputType::Time => DateTime::<Utc>::deserialize(raw).map(TypedInput::Time),
            InputType::Int => i64::deserialize(raw).map(TypedInput::Int),
        }
    }
}

fn is_reporting_period_input(name: &str) -> bool {
    name.eq_ignore_ascii_case(REPORTING_START_INPUT_NAME)
        || name.eq_ignore_ascii_case(REPORTING_END_INPUT_NAME)
}

/// Decode one supplied value against its definition (if any)
fn coerce(
    value: &InputValue,
    definition: Option<&InputDefinition>,
) -> Result<TypedInput, ReportDepsError> {
    let Some(raw) = value.raw() else {
        return Ok(TypedInput::Null);
    };

    let declared = definition.map_or("", |d| d.input_type.as_str());
    let input_type = if is_reporting_period_input(&value.name) {
        InputType::Time
    } else {
        InputType::parse(declared).ok_or_else(|| ReportDepsError::UnsupportedType {
            name: value.name.clone(),
            input_type: declared.to_ascii_lowercase(),
        })?
    };

    input_type
        .decode(raw)
        .map_err(|source| ReportDepsError::TypeMismatch {
            name: value.name.clone(),
            expected: input_type.as_str().to_string(),
            value: raw.to_string(),
            source,
        })
}

/// Validate `supplied` against `query`'s declared inputs and decode each value.
///
/// Optional inputs that were not supplied are absent from the result; no
/// defaults are filled in.
pub fn validate_and_coerce_inputs(
    query: &GenerationQuery,
    supplied: &[InputValue],
) -> Result<BTreeMap<String, TypedInput>, ReportDepsError> {
    let definitions: HashMap<&str, &InputDefinition> = query
        .spec
        .inputs
        .iter()
        .map(|d| (d.name.as_str(), d))
        .collect();

    let mut values = BTreeMap::new();
    let mut given: Vec<String> = Vec::with_capacity(supplied.len());
    for value in supplied {
        let typed = coerce(value, definitions.get(value.name.as_str()).copied())?;
        values.insert(value.name.clone(), typed);
        given.push(value.name.clone());
    }

    let given_set: HashSet<&str> = given.iter().map(String::as_str).collect();
    let missing: Vec<&str> = query
        .spec
        .inputs
        .iter()
        .filter(|d| d.required && !given_set.contains(d.name.as_str()))
        .map(|d| d.name.as_str())
        .collect();

    if !missing.is_empty() {
        debug!(query = %query.name, ?missing, "missing required inputs");
        let mut expected: Vec<String> = query.spec.inputs.iter().map(|d| d.name.clone()).collect();
        expected.sort();
        given.sort();
        return Err(ReportDepsError::MissingRequiredInputs {
            query: query.name.clone(),
            expected,
            given,
        });
    }

    Ok(values)
}
