//! Schema to graph model conversion.

use crate::schema::{Cardinality, Schema};
use std::collections::HashMap;
use tracing::debug;

use super::edges::{EdgeSet, EdgeSpec};
use super::fields::build_fields;
use super::hub::HubRoutes;
use super::{EdgeKind, FkTarget, GraphModel, GraphNode, ModelOptions};

impl GraphModel {
    pub fn from_schema(schema: &Schema, options: &ModelOptions) -> Self {
        let routes = HubRoutes::detect(schema, options);

        let nodes: Vec<GraphNode> = schema
            .entities
            .iter()
            .map(|(name, entity)| GraphNode {
                id: name.clone(),
                service: entity.service.clone(),
                fields: build_fields(name, entity, options, routes.as_ref()),
            })
            .collect();

        let services: HashMap<String, String> = nodes
            .iter()
            .map(|n| (n.id.clone(), n.service.clone()))
            .collect();

        let reserved = routes
            .as_ref()
            .map(HubRoutes::mediated_pairs)
            .unwrap_or_default();
        let mut edges = EdgeSet::new(&services, reserved);

        // Hub legs go first so that no direct edge can claim a mediated pair.
        if let Some(routes) = &routes {
            wire_hub(&mut edges, schema, options, routes);
        }

        for node in &nodes {
            let Some(entity) = schema.entities.get(&node.id) else {
                continue;
            };

            for (rel_name, rel) in &entity.relations {
                if routes
                    .as_ref()
                    .is_some_and(|r| r.is_mediated(&node.id, rel_name))
                {
                    continue;
                }
                if !edges.has_entity(&rel.target) {
                    debug!(
                        entity = %node.id,
                        relation = %rel_name,
                        target = %rel.target,
                        "dropping relation to unknown entity"
                    );
                    continue;
                }

                let reference = rel.reference.as_ref();
                edges.push_direct(
                    format!("{}.{}->{}", node.id, rel_name, rel.target),
                    EdgeSpec {
                        kind: EdgeKind::Relation,
                        source: &node.id,
                        target: &rel.target,
                        source_field: reference.map(|r| r.from_field.as_str()),
                        target_field: reference.map(|r| r.to_field.as_str()),
                        relation: Some(rel_name.as_str()),
                        cardinality: rel.cardinality,
                        explicit_ref: reference.is_some(),
                    },
                );
            }
        }

        // Foreign keys only fill pairs no relation claimed, whatever the
        // entity names.
        for node in &nodes {
            for field in &node.fields {
                let Some(FkTarget::Entity {
                    entity: target,
                    field: target_field,
                }) = &field.fk
                else {
                    continue;
                };
                if !edges.has_entity(target) {
                    debug!(
                        entity = %node.id,
                        field = %field.name,
                        target = %target,
                        "dropping foreign key to unknown entity"
                    );
                    continue;
                }

                edges.push_direct(
                    format!("{}.{}->{}", node.id, field.name, target),
                    EdgeSpec {
                        kind: EdgeKind::ForeignKey,
                        source: &node.id,
                        target,
                        source_field: Some(field.name.as_str()),
                        target_field: Some(target_field.as_str()),
                        relation: None,
                        cardinality: Cardinality::One,
                        explicit_ref: true,
                    },
                );
            }
        }

        let edges = edges.finish();
        debug!(
            nodes = nodes.len(),
            edges = edges.len(),
            "built graph model"
        );

        let mut services: Vec<String> = nodes.iter().map(|n| n.service.clone()).collect();
        services.sort();
        services.dedup();

        GraphModel {
            nodes,
            edges,
            hub: routes.map(|r| r.hub),
            services,
        }
    }
}

fn wire_hub(edges: &mut EdgeSet<'_>, schema: &Schema, options: &ModelOptions, routes: &HubRoutes) {
    let hub = routes.hub.as_str();
    let identity = |name: &str| {
        schema
            .entities
            .get(name)
            .map(|e| e.identity_field(&options.identity_field).to_string())
    };

    for rel in &routes.relations {
        let source_identity = identity(&rel.source);
        edges.push_hub_leg(EdgeSpec {
            kind: EdgeKind::HubInbound,
            source: &rel.source,
            target: hub,
            source_field: source_identity.as_deref(),
            target_field: Some(options.inbound_field.as_str()),
            relation: Some(rel.relation.as_str()),
            cardinality: rel.cardinality,
            explicit_ref: false,
        });

        let target_identity = identity(&rel.target);
        edges.push_hub_leg(EdgeSpec {
            kind: EdgeKind::HubOutbound,
            source: hub,
            target: &rel.target,
            source_field: Some(options.outbound_field.as_str()),
            target_field: target_identity.as_deref(),
            relation: Some(rel.relation.as_str()),
            cardinality: rel.cardinality,
            explicit_ref: false,
        });
    }
}
