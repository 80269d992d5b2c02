//! Field definitions for extracted source data and target form schemas.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Best-guess type of a field's content.
///
/// The guess comes from an upstream extractor and may be wrong; scoring
/// treats it as a signal, never a hard constraint. `Unknown` makes
/// type-compatibility scoring total over the enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Name,
    Email,
    Phone,
    Date,
    Numeric,
    Currency,
    Address,
    Boolean,
    Text,
    #[serde(other)]
    Unknown,
}

impl FieldType {
    /// All variants, for iteration in compatibility tables and the CLI.
    pub const ALL: [FieldType; 10] = [
        FieldType::Name,
        FieldType::Email,
        FieldType::Phone,
        FieldType::Date,
        FieldType::Numeric,
        FieldType::Currency,
        FieldType::Address,
        FieldType::Boolean,
        FieldType::Text,
        FieldType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Name => "name",
            FieldType::Email => "email",
            FieldType::Phone => "phone",
            FieldType::Date => "date",
            FieldType::Numeric => "numeric",
            FieldType::Currency => "currency",
            FieldType::Address => "address",
            FieldType::Boolean => "boolean",
            FieldType::Text => "text",
            FieldType::Unknown => "unknown",
        }
    }

    /// Parse a type label leniently.
    ///
    /// Unrecognized labels map to `Unknown` rather than erroring; upstream
    /// extractors emit free-form labels and the core never rejects them.
    pub fn parse_lenient(raw: &str) -> FieldType {
        match raw.trim().to_lowercase().as_str() {
            "name" | "person" | "fullname" => FieldType::Name,
            "email" | "e-mail" | "mail" => FieldType::Email,
            "phone" | "tel" | "telephone" | "mobile" => FieldType::Phone,
            "date" | "datetime" | "time" => FieldType::Date,
            "numeric" | "number" | "int" | "integer" | "float" => FieldType::Numeric,
            "currency" | "money" | "amount" => FieldType::Currency,
            "address" | "addr" | "location" => FieldType::Address,
            "boolean" | "bool" | "checkbox" => FieldType::Boolean,
            "text" | "string" => FieldType::Text,
            _ => FieldType::Unknown,
        }
    }
}

impl Default for FieldType {
    /// Extractors that supply no guess get `Text` per the input contract.
    fn default() -> Self {
        FieldType::Text
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(FieldType::parse_lenient(s))
    }
}

/// A field extracted from a user document.
///
/// Immutable once handed to the core. `value` may be empty but is never
/// absent; `document_id` identifies the originating document in
/// multi-source merge jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceField {
    pub name: String,
    pub value: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
}

impl SourceField {
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        field_type: FieldType,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            field_type,
            context: None,
            document_id: None,
        }
    }

    pub fn with_document_id(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into());
        self
    }
}

/// A field in the destination form schema.
///
/// Read-only for the duration of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetField {
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl TargetField {
    pub fn new(name: impl Into<String>, field_type: FieldType, required: bool) -> Self {
        Self {
            name: name.into(),
            field_type,
            required,
            options: None,
        }
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = Some(options);
        self
    }
}
