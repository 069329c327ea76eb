//! Field list construction and ordering.

use crate::schema::Entity;
use std::cmp::Ordering;

use super::hub::HubRoutes;
use super::{FieldInfo, FkTarget, ModelOptions};

/// Build the ordered field list for one entity.
pub(super) fn build_fields(
    name: &str,
    entity: &Entity,
    options: &ModelOptions,
    routes: Option<&HubRoutes>,
) -> Vec<FieldInfo> {
    let identity = entity.identity_field(&options.identity_field);
    let hub_routes = routes.filter(|r| r.hub == name);

    let mut fields: Vec<FieldInfo> = entity
        .fields
        .iter()
        .map(|(field_name, field)| {
            let fk = match hub_routes {
                Some(r) if *field_name == options.inbound_field => Some(FkTarget::Polymorphic {
                    entities: r.inbound.iter().cloned().collect(),
                }),
                Some(r) if *field_name == options.outbound_field => Some(FkTarget::Polymorphic {
                    entities: r.outbound.iter().cloned().collect(),
                }),
                _ => resolve_fk(field_name, entity),
            };

            FieldInfo {
                name: field_name.clone(),
                typ: field.typ.clone(),
                nullable: field.nullable,
                is_identity: field_name == identity,
                fk,
            }
        })
        .collect();

    sort_fields(&mut fields);
    fields
}

/// Explicit FK metadata wins; otherwise a relation whose reference starts at
/// this field makes it a foreign key.
fn resolve_fk(field_name: &str, entity: &Entity) -> Option<FkTarget> {
    if let Some(fk) = entity.fields.get(field_name).and_then(|f| f.fk.as_ref()) {
        return Some(FkTarget::Entity {
            entity: fk.target_entity.clone(),
            field: fk.target_field.clone(),
        });
    }

    entity.relations.values().find_map(|rel| {
        let reference = rel.reference.as_ref()?;
        (reference.from_field == field_name).then(|| FkTarget::Entity {
            entity: rel.target.clone(),
            field: reference.to_field.clone(),
        })
    })
}

/// Identity first, then foreign keys, then everything else; alphabetical
/// within each band.
pub(super) fn sort_fields(fields: &mut [FieldInfo]) {
    fields.sort_by(|a, b| match band(a).cmp(&band(b)) {
        Ordering::Equal => a.name.cmp(&b.name),
        other => other,
    });
}

fn band(field: &FieldInfo) -> u8 {
    if field.is_identity {
        0
    } else if field.is_fk() {
        1
    } else {
        2
    }
}
