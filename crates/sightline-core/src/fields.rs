//! Output field descriptions and dynamically typed field values.
//!
//! Search callers name their output columns as dotted field paths
//! (`"occurrence.lifestage.value"`, `"project-7.parameter-3"`). Each path is
//! described once per query by a [`PropertyFieldDescription`] and resolved
//! per result row into a [`FieldValue`], a closed sum type so the
//! string-formatting step can be exhaustive instead of reflective.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// FIELD VALUES
// =============================================================================

/// Declared data type of a requested output field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldDataType {
    Boolean,
    DateTime,
    Double,
    Int32,
    Int64,
    TimeSpan,
    String,
}

/// A dynamically typed value extracted from an observation record.
///
/// `TimeSpan` carries whole seconds (time-of-day offsets such as event start
/// times). `Null` means "field exists but has no value for this record" and
/// renders as the empty string, never the literal `"null"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "value")]
pub enum FieldValue {
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Double(f64),
    DateTime(DateTime<Utc>),
    TimeSpan(i64),
    String(String),
    Null,
}

impl FieldValue {
    /// True when the value is [`FieldValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Format the value for fixed-column output under the field's declared
    /// data type.
    ///
    /// Typed variants format via [`format`](Self::format). String values —
    /// dynamic project parameters arrive as strings whatever their declared
    /// type — are narrowed to the declared boolean/numeric type when they
    /// parse, and passed through verbatim when they do not.
    pub fn format_as(&self, data_type: FieldDataType) -> String {
        match (data_type, self) {
            (FieldDataType::Boolean, FieldValue::String(s)) => s
                .parse::<bool>()
                .map(|v| v.to_string())
                .unwrap_or_else(|_| s.clone()),
            (FieldDataType::Int32, FieldValue::String(s)) => s
                .parse::<i32>()
                .map(|v| v.to_string())
                .unwrap_or_else(|_| s.clone()),
            (FieldDataType::Int64, FieldValue::String(s)) => s
                .parse::<i64>()
                .map(|v| v.to_string())
                .unwrap_or_else(|_| s.clone()),
            (FieldDataType::Double, FieldValue::String(s)) => s
                .parse::<f64>()
                .map(|v| v.to_string())
                .unwrap_or_else(|_| s.clone()),
            _ => self.format(),
        }
    }

    /// Format the value for fixed-column output (CSV cells and the like).
    ///
    /// Culture-invariant: booleans as `true`/`false`, dates as short ISO
    /// date, `TimeSpan` as zero-padded `hh:mm`, numbers via Rust's default
    /// (invariant) formatting. `Null` is the empty string.
    pub fn format(&self) -> String {
        match self {
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Int32(v) => v.to_string(),
            FieldValue::Int64(v) => v.to_string(),
            FieldValue::Double(v) => v.to_string(),
            FieldValue::DateTime(dt) => dt.format("%Y-%m-%d").to_string(),
            FieldValue::TimeSpan(secs) => {
                let hours = secs / 3600;
                let minutes = (secs % 3600) / 60;
                format!("{:02}:{:02}", hours, minutes)
            }
            FieldValue::String(s) => s.clone(),
            FieldValue::Null => String::new(),
        }
    }
}

impl From<Option<String>> for FieldValue {
    fn from(v: Option<String>) -> Self {
        v.map(FieldValue::String).unwrap_or(FieldValue::Null)
    }
}

impl From<Option<bool>> for FieldValue {
    fn from(v: Option<bool>) -> Self {
        v.map(FieldValue::Bool).unwrap_or(FieldValue::Null)
    }
}

impl From<Option<i32>> for FieldValue {
    fn from(v: Option<i32>) -> Self {
        v.map(FieldValue::Int32).unwrap_or(FieldValue::Null)
    }
}

impl From<Option<i64>> for FieldValue {
    fn from(v: Option<i64>) -> Self {
        v.map(FieldValue::Int64).unwrap_or(FieldValue::Null)
    }
}

impl From<Option<f64>> for FieldValue {
    fn from(v: Option<f64>) -> Self {
        v.map(FieldValue::Double).unwrap_or(FieldValue::Null)
    }
}

impl From<Option<DateTime<Utc>>> for FieldValue {
    fn from(v: Option<DateTime<Utc>>) -> Self {
        v.map(FieldValue::DateTime).unwrap_or(FieldValue::Null)
    }
}

// =============================================================================
// PROPERTY FIELD DESCRIPTIONS
// =============================================================================

/// Describes one requested output field of a search.
///
/// Constructed once per requested field per query, consumed during result
/// projection. Paths are matched case-insensitively. Dynamic per-project
/// paths (`project-<id>`, `project-<id>.parameter-<id>`, ...) are flagged at
/// construction time and their embedded numeric ids pre-parsed into
/// [`dynamic_ids`](Self::dynamic_ids) so resolution never re-parses the
/// string per row. Deserialization canonicalizes the same way, so a
/// descriptor arriving on the wire is indistinguishable from one built via
/// [`new`](Self::new).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyFieldDescription {
    /// Dotted field path, stored lowercase.
    pub path: String,
    /// Declared data type, drives string formatting.
    pub data_type: FieldDataType,
    /// True for per-project/per-parameter paths not in the static map.
    pub is_dynamic_created: bool,
    /// Ordered numeric ids embedded in a dynamic path (project id, then
    /// parameter id when present). Empty for static paths.
    pub dynamic_ids: Vec<i32>,
}

impl<'de> Deserialize<'de> for PropertyFieldDescription {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Wire {
            path: String,
            data_type: FieldDataType,
            #[serde(default)]
            is_dynamic_created: bool,
            #[serde(default)]
            dynamic_ids: Vec<i32>,
        }

        let wire = Wire::deserialize(deserializer)?;
        let path = wire.path.to_lowercase();
        let dynamic_ids = if wire.dynamic_ids.is_empty() {
            extract_dynamic_ids(&path)
        } else {
            wire.dynamic_ids
        };
        let is_dynamic_created = wire.is_dynamic_created || !dynamic_ids.is_empty();
        Ok(Self {
            path,
            data_type: wire.data_type,
            is_dynamic_created,
            dynamic_ids,
        })
    }
}

impl PropertyFieldDescription {
    /// Describe a static (non-dynamic) field.
    pub fn new(path: impl Into<String>, data_type: FieldDataType) -> Self {
        let path = path.into().to_lowercase();
        let dynamic_ids = extract_dynamic_ids(&path);
        let is_dynamic_created = !dynamic_ids.is_empty();
        Self {
            path,
            data_type,
            is_dynamic_created,
            dynamic_ids,
        }
    }

    /// Describe a dynamically created field with explicit ids.
    ///
    /// Used when the field set is derived from a record corpus rather than
    /// parsed from caller-supplied path strings.
    pub fn dynamic(path: impl Into<String>, data_type: FieldDataType, ids: Vec<i32>) -> Self {
        Self {
            path: path.into().to_lowercase(),
            data_type,
            is_dynamic_created: true,
            dynamic_ids: ids,
        }
    }
}

/// Pull the ordered numeric ids out of a dynamic field path.
///
/// `"project-7.parameter-3"` yields `[7, 3]`. Paths without a `project-`
/// prefix yield an empty list; segments whose digits do not parse are
/// skipped rather than failing the whole description.
fn extract_dynamic_ids(path: &str) -> Vec<i32> {
    if !path.starts_with("project-") {
        return Vec::new();
    }
    path.split('.')
        .filter_map(|segment| {
            let digits = segment.rsplit('-').next()?;
            digits.parse::<i32>().ok()
        })
        .collect()
}
