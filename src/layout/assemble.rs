//! Combine macro placement and per-group layouts into absolute coordinates.

use crate::model::GraphModel;
use crate::style::{edge_style, service_color};

use super::groups::{GroupGraph, GroupMetrics};
use super::oracle::GroupLayout;
use super::placement::MacroLayout;
use super::types::{GroupBox, Layout, LayoutEdge, LayoutNode};

/// `layouts` and `placement.positions` are index-aligned with `groups.groups`.
pub fn assemble(
    model: &GraphModel,
    groups: &GroupGraph<'_>,
    layouts: &[GroupLayout],
    placement: &MacroLayout,
    metrics: &GroupMetrics,
) -> Layout {
    let mut boxes: Vec<GroupBox> = groups
        .groups
        .iter()
        .zip(layouts)
        .zip(&placement.positions)
        .enumerate()
        .map(|(index, ((group, layout), center))| GroupBox {
            service: group.service.clone(),
            color: service_color(group.color_index),
            x: center.x - layout.width / 2.0,
            y: center.y - layout.height / 2.0,
            width: layout.width,
            height: layout.height,
            anchor: placement.anchor == Some(index),
        })
        .collect();

    // Renderer coordinates: the drawing's bounding box starts at the margin.
    let min_x = boxes.iter().map(|b| b.x).fold(f64::INFINITY, f64::min);
    let min_y = boxes.iter().map(|b| b.y).fold(f64::INFINITY, f64::min);
    let (shift_x, shift_y) = if boxes.is_empty() {
        (0.0, 0.0)
    } else {
        (metrics.margin - min_x, metrics.margin - min_y)
    };
    for b in &mut boxes {
        b.x += shift_x;
        b.y += shift_y;
    }

    let mut nodes = Vec::with_capacity(model.nodes.len());
    for node in &model.nodes {
        let Some(index) = groups.group_of(&node.id) else {
            continue;
        };
        let (Some(group_box), Some(local)) = (
            boxes.get(index),
            layouts.get(index).and_then(|l| l.nodes.get(&node.id)),
        ) else {
            continue;
        };
        nodes.push(LayoutNode {
            id: node.id.clone(),
            service: node.service.clone(),
            x: group_box.x + metrics.padding + local.x,
            y: group_box.y + metrics.padding + metrics.header_height + local.y,
            width: local.width,
            height: local.height,
            fields: node.fields.clone(),
        });
    }

    let edges = model
        .edges
        .iter()
        .map(|edge| LayoutEdge {
            id: edge.id.clone(),
            kind: edge.kind,
            source: edge.source.clone(),
            target: edge.target.clone(),
            source_field: edge.source_field.clone(),
            target_field: edge.target_field.clone(),
            label: edge.relation.clone(),
            cardinality: edge.cardinality,
            cross_service: edge.cross_service,
            style: edge_style(edge),
        })
        .collect();

    let width = boxes.iter().map(|b| b.x + b.width).fold(0.0, f64::max);
    let height = boxes.iter().map(|b| b.y + b.height).fold(0.0, f64::max);

    Layout {
        nodes,
        edges,
        groups: boxes,
        width: if width > 0.0 { width + metrics.margin } else { 0.0 },
        height: if height > 0.0 { height + metrics.margin } else { 0.0 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::oracle::LocalNode;
    use crate::layout::types::Vec2;
    use crate::model::ModelOptions;
    use crate::schema::parse_schema;
    use serde_json::json;
    use std::collections::HashMap;

    fn group_layout(ids: &[&str]) -> GroupLayout {
        let nodes: HashMap<String, LocalNode> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                (
                    id.to_string(),
                    LocalNode {
                        x: 0.0,
                        y: i as f64 * 100.0,
                        width: 120.0,
                        height: 80.0,
                    },
                )
            })
            .collect();
        GroupLayout {
            nodes,
            width: 200.0,
            height: 300.0,
            fallback: false,
        }
    }

    #[test]
    fn test_translates_to_margin_and_offsets_nodes() {
        let schema = parse_schema(
            &json!({
                "Order": { "service": "shop", "relations": { "product": { "target": "Product", "cardinality": "one" } } },
                "Product": { "service": "catalog" }
            })
            .to_string(),
        )
        .unwrap();
        let model = GraphModel::from_schema(&schema, &ModelOptions::default());
        let groups = GroupGraph::build(&model);
        let layouts = vec![group_layout(&["Product"]), group_layout(&["Order"])];
        let placement = MacroLayout {
            positions: vec![Vec2::new(-300.0, 0.0), Vec2::new(300.0, 50.0)],
            radii: vec![180.0, 180.0],
            anchor: Some(0),
        };
        let metrics = GroupMetrics::default();

        let layout = assemble(&model, &groups, &layouts, &placement, &metrics);

        let catalog = &layout.groups[0];
        assert_eq!(catalog.service, "catalog");
        assert!(catalog.anchor);
        assert_eq!((catalog.x, catalog.y), (metrics.margin, metrics.margin));

        let shop = &layout.groups[1];
        assert_eq!(shop.x - catalog.x, 600.0);
        assert_eq!(shop.y - catalog.y, 50.0);

        let product = layout.node("Product").unwrap();
        assert_eq!(product.x, catalog.x + metrics.padding);
        assert_eq!(product.y, catalog.y + metrics.padding + metrics.header_height);

        assert_eq!(layout.width, shop.x + shop.width + metrics.margin);
        assert_eq!(layout.height, shop.y + shop.height + metrics.margin);

        assert_eq!(layout.edges.len(), 1);
        assert_eq!(layout.edges[0].label.as_deref(), Some("product"));
        assert!(layout.edges[0].style.dashed);
    }

    #[test]
    fn test_empty_inputs() {
        let model = GraphModel::default();
        let groups = GroupGraph::build(&model);
        let placement = MacroLayout {
            positions: vec![],
            radii: vec![],
            anchor: None,
        };
        let layout = assemble(&model, &groups, &[], &placement, &GroupMetrics::default());
        assert_eq!(layout, Layout::default());
    }
}
