//! Schema document as produced by the gateway's introspection endpoint.
//!
//! Two shapes are accepted: the full graph document (`{"version": 1,
//! "entities": {...}}`) and a bare map of entity name to definition. Keys the
//! layout has no use for (filters, access, presets, ...) are ignored.

use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Invalid schema JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Schema must be a JSON object, found {0}")]
    NotAnObject(&'static str),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub entities: BTreeMap<String, Entity>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Entity {
    pub service: String,
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, Field>,
    #[serde(default)]
    pub relations: BTreeMap<String, Relation>,
}

impl Entity {
    /// The identity field: first declared key, falling back to `default`.
    pub fn identity_field<'a>(&'a self, default: &'a str) -> &'a str {
        self.keys.first().map(String::as_str).unwrap_or(default)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Field {
    #[serde(rename = "type", default = "default_field_type")]
    pub typ: String,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub fk: Option<ForeignKey>,
}

fn default_field_type() -> String {
    "string".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ForeignKey {
    pub target_entity: String,
    #[serde(default = "default_target_field")]
    pub target_field: String,
}

fn default_target_field() -> String {
    "id".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Relation {
    pub target: String,
    #[serde(default)]
    pub cardinality: Cardinality,
    #[serde(default, rename = "ref")]
    pub reference: Option<Ref>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Ref {
    pub from_field: String,
    pub to_field: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    One,
    #[default]
    Many,
}

/// Parse a schema document from JSON text.
pub fn parse_schema(input: &str) -> Result<Schema, SchemaError> {
    let value: serde_json::Value = serde_json::from_str(input)?;
    schema_from_value(value)
}

pub fn schema_from_value(value: serde_json::Value) -> Result<Schema, SchemaError> {
    let object = match &value {
        serde_json::Value::Object(object) => object,
        serde_json::Value::Array(_) => return Err(SchemaError::NotAnObject("array")),
        serde_json::Value::String(_) => return Err(SchemaError::NotAnObject("string")),
        serde_json::Value::Number(_) => return Err(SchemaError::NotAnObject("number")),
        serde_json::Value::Bool(_) => return Err(SchemaError::NotAnObject("boolean")),
        serde_json::Value::Null => return Err(SchemaError::NotAnObject("null")),
    };

    if object.contains_key("entities") {
        return Ok(Schema::deserialize(value)?);
    }

    let entities = BTreeMap::<String, Entity>::deserialize(value)?;
    Ok(Schema { entities })
}
