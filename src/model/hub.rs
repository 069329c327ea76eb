//! Detection of relations routed through the hub entity.

use crate::schema::{Cardinality, Schema};
use std::collections::{BTreeSet, HashSet};

use super::ModelOptions;

/// A relation without an explicit reference, drawn as `source -> hub -> target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediatedRelation {
    pub source: String,
    pub target: String,
    pub relation: String,
    pub cardinality: Cardinality,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubRoutes {
    pub hub: String,
    /// Entities feeding the hub's inbound slot.
    pub inbound: BTreeSet<String>,
    /// Entities the hub's outbound slot points at.
    pub outbound: BTreeSet<String>,
    pub relations: Vec<MediatedRelation>,
}

impl HubRoutes {
    /// Scan every non-hub entity for relations lacking a reference.
    /// Returns `None` when the schema has no hub entity.
    pub fn detect(schema: &Schema, options: &ModelOptions) -> Option<Self> {
        let hub = options.hub_entity.as_str();
        if !schema.entities.contains_key(hub) {
            return None;
        }

        let mut routes = HubRoutes {
            hub: hub.to_string(),
            inbound: BTreeSet::new(),
            outbound: BTreeSet::new(),
            relations: Vec::new(),
        };

        for (name, entity) in &schema.entities {
            if name == hub {
                continue;
            }
            for (rel_name, rel) in &entity.relations {
                if rel.reference.is_some() || rel.target == hub {
                    continue;
                }
                if !schema.entities.contains_key(&rel.target) {
                    continue;
                }
                routes.inbound.insert(name.clone());
                routes.outbound.insert(rel.target.clone());
                routes.relations.push(MediatedRelation {
                    source: name.clone(),
                    target: rel.target.clone(),
                    relation: rel_name.clone(),
                    cardinality: rel.cardinality,
                });
            }
        }

        Some(routes)
    }

    pub fn is_mediated(&self, entity: &str, relation: &str) -> bool {
        self.relations
            .iter()
            .any(|r| r.source == entity && r.relation == relation)
    }

    /// Unordered entity pairs that must never be joined by a direct edge.
    pub fn mediated_pairs(&self) -> HashSet<(String, String)> {
        self.relations
            .iter()
            .map(|r| pair_key(&r.source, &r.target))
            .collect()
    }
}

pub(super) fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse_schema;
    use serde_json::json;

    fn schema() -> Schema {
        parse_schema(
            &json!({
                "Relationship": {
                    "service": "relations",
                    "fields": { "id": {}, "subject_id": {}, "object_id": {} },
                    "relations": {
                        "property": { "target": "Property", "cardinality": "one",
                                      "ref": { "from_field": "object_id", "to_field": "id" } }
                    }
                },
                "Person": {
                    "service": "person",
                    "relations": {
                        "properties": { "target": "Property" },
                        "ghost": { "target": "Missing" },
                        "links": { "target": "Relationship" }
                    }
                },
                "Property": { "service": "property" }
            })
            .to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_detect_routes() {
        let routes = HubRoutes::detect(&schema(), &ModelOptions::default()).unwrap();
        assert_eq!(routes.hub, "Relationship");
        assert_eq!(routes.inbound.iter().collect::<Vec<_>>(), vec!["Person"]);
        assert_eq!(routes.outbound.iter().collect::<Vec<_>>(), vec!["Property"]);
        assert_eq!(routes.relations.len(), 1);
        assert!(routes.is_mediated("Person", "properties"));
        assert!(!routes.is_mediated("Person", "links"));
    }

    #[test]
    fn test_hub_relations_are_not_mediated() {
        let routes = HubRoutes::detect(&schema(), &ModelOptions::default()).unwrap();
        assert!(!routes.inbound.contains("Relationship"));
    }

    #[test]
    fn test_no_hub() {
        let schema = parse_schema(r#"{"A": {"service": "a"}}"#).unwrap();
        assert!(HubRoutes::detect(&schema, &ModelOptions::default()).is_none());
    }

    #[test]
    fn test_pair_key_is_unordered() {
        assert_eq!(pair_key("b", "a"), pair_key("a", "b"));
    }
}
