//! Typed graph built from a schema: one node per entity, classified edges.

mod build;
mod edges;
mod fields;
mod hub;

use crate::schema::Cardinality;
use serde::{Deserialize, Serialize};

pub use hub::HubRoutes;

/// Options controlling how the schema is read into a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelOptions {
    /// Reserved name of the junction entity.
    pub hub_entity: String,
    /// Hub field holding the subject (inbound) side.
    pub inbound_field: String,
    /// Hub field holding the object (outbound) side.
    pub outbound_field: String,
    /// Identity field used when an entity declares no keys.
    pub identity_field: String,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            hub_entity: "Relationship".to_string(),
            inbound_field: "subject_id".to_string(),
            outbound_field: "object_id".to_string(),
            identity_field: "id".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphModel {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    /// Id of the hub node, when it is part of this graph.
    pub hub: Option<String>,
    /// Every service of the source schema, sorted. Filtering keeps this list
    /// intact so palette colors stay put.
    pub services: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub service: String,
    pub fields: Vec<FieldInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub typ: String,
    pub nullable: bool,
    pub is_identity: bool,
    pub fk: Option<FkTarget>,
}

impl FieldInfo {
    pub fn is_fk(&self) -> bool {
        self.fk.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FkTarget {
    Entity { entity: String, field: String },
    /// Hub slot that may point at any of the listed entities.
    Polymorphic { entities: Vec<String> },
}

impl FkTarget {
    /// Label shown next to the field, e.g. `Person.id` or `[Company, Person]`.
    pub fn display(&self) -> String {
        match self {
            FkTarget::Entity { entity, field } => format!("{}.{}", entity, field),
            FkTarget::Polymorphic { entities } => format!("[{}]", entities.join(", ")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Relation,
    ForeignKey,
    HubInbound,
    HubOutbound,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphEdge {
    pub id: String,
    pub kind: EdgeKind,
    pub source: String,
    pub target: String,
    pub source_field: Option<String>,
    pub target_field: Option<String>,
    /// Declaring relation, absent for plain foreign keys.
    pub relation: Option<String>,
    pub cardinality: Cardinality,
    pub explicit_ref: bool,
    pub cross_service: bool,
    pub animated: bool,
}

impl GraphEdge {
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }

    /// The endpoint opposite `node_id`, if the edge touches it.
    pub fn other_end(&self, node_id: &str) -> Option<&str> {
        if self.source == node_id {
            Some(&self.target)
        } else if self.target == node_id {
            Some(&self.source)
        } else {
            None
        }
    }
}

impl GraphModel {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node(id).is_some()
    }
}
