//! Edge materialization with id and pair deduplication.

use crate::schema::Cardinality;
use std::collections::{HashMap, HashSet};

use super::hub::pair_key;
use super::{EdgeKind, GraphEdge};

/// Collects edges while enforcing the one-edge-per-pair rule.
pub(super) struct EdgeSet<'a> {
    services: &'a HashMap<String, String>,
    edges: Vec<GraphEdge>,
    ids: HashSet<String>,
    wired: HashSet<(String, String)>,
}

/// Endpoint data shared by every edge kind.
pub(super) struct EdgeSpec<'s> {
    pub kind: EdgeKind,
    pub source: &'s str,
    pub target: &'s str,
    pub source_field: Option<&'s str>,
    pub target_field: Option<&'s str>,
    pub relation: Option<&'s str>,
    pub cardinality: Cardinality,
    pub explicit_ref: bool,
}

impl<'a> EdgeSet<'a> {
    /// `reserved` holds unordered pairs joined through the hub; they never get
    /// a direct edge.
    pub fn new(
        services: &'a HashMap<String, String>,
        reserved: HashSet<(String, String)>,
    ) -> Self {
        Self {
            services,
            edges: Vec::new(),
            ids: HashSet::new(),
            wired: reserved,
        }
    }

    pub fn has_entity(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    pub fn is_wired(&self, a: &str, b: &str) -> bool {
        self.wired.contains(&pair_key(a, b))
    }

    /// Hub legs are keyed by direction, so the same entity may appear on both
    /// the inbound and the outbound side.
    pub fn push_hub_leg(&mut self, spec: EdgeSpec<'_>) -> bool {
        let id = format!("{}->{}", spec.source, spec.target);
        if !self.ids.insert(id.clone()) {
            return false;
        }
        self.wired.insert(pair_key(spec.source, spec.target));
        self.push(id, spec);
        true
    }

    /// Direct edges are skipped when the pair is already joined.
    pub fn push_direct(&mut self, id: String, spec: EdgeSpec<'_>) -> bool {
        if self.is_wired(spec.source, spec.target) || !self.ids.insert(id.clone()) {
            return false;
        }
        self.wired.insert(pair_key(spec.source, spec.target));
        self.push(id, spec);
        true
    }

    fn push(&mut self, id: String, spec: EdgeSpec<'_>) {
        let cross_service = self.services.get(spec.source) != self.services.get(spec.target);
        self.edges.push(GraphEdge {
            id,
            kind: spec.kind,
            source: spec.source.to_string(),
            target: spec.target.to_string(),
            source_field: spec.source_field.map(str::to_string),
            target_field: spec.target_field.map(str::to_string),
            relation: spec.relation.map(str::to_string),
            cardinality: spec.cardinality,
            explicit_ref: spec.explicit_ref,
            cross_service,
            animated: spec.cardinality == Cardinality::Many,
        });
    }

    pub fn finish(self) -> Vec<GraphEdge> {
        self.edges
    }
}
