//! Layout engine core implementation.

use crate::config::LayoutConfig;
use crate::model::GraphModel;
use tracing::debug;

use super::assemble::assemble;
use super::groups::GroupGraph;
use super::layered::LayeredOracle;
use super::oracle::{GroupLayout, LayoutOracle, OracleAdapter};
use super::placement::MacroPlacement;
use super::types::Layout;

/// Layout engine configuration and computation.
pub struct LayoutEngine {
    config: LayoutConfig,
    oracle: Box<dyn LayoutOracle>,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl LayoutEngine {
    /// Engine backed by the built-in layered oracle.
    pub fn new(config: LayoutConfig) -> Self {
        let oracle = LayeredOracle::new(config.layered.clone());
        Self::with_oracle(config, oracle)
    }

    pub fn with_oracle(config: LayoutConfig, oracle: impl LayoutOracle + 'static) -> Self {
        Self {
            config,
            oracle: Box::new(oracle),
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Compute layout for the given graph.
    pub fn layout(&self, model: &GraphModel) -> Layout {
        if model.is_empty() {
            debug!("empty model, nothing to lay out");
            return Layout::default();
        }

        // Phase 1: Partition by service
        let groups = GroupGraph::build(model);

        // Phase 2: Per-group layered layout
        let adapter = OracleAdapter::new(
            self.oracle.as_ref(),
            &self.config.metrics,
            &self.config.group,
            &self.config.oracle,
        );
        let layouts: Vec<GroupLayout> = groups
            .groups
            .iter()
            .map(|g| adapter.layout_group(&g.service, &g.nodes, &g.internal_edges))
            .collect();

        // Phase 3: Macro placement of group discs
        let sizes: Vec<(f64, f64)> = layouts.iter().map(|l| (l.width, l.height)).collect();
        let anchor = groups.anchor(model.hub.as_deref());
        let placement =
            MacroPlacement::new(&self.config.placement).place(&sizes, &groups.link_matrix(), anchor);

        // Phase 4: Absolute coordinates and styling
        let layout = assemble(model, &groups, &layouts, &placement, &self.config.group);

        debug!(
            nodes = layout.nodes.len(),
            edges = layout.edges.len(),
            groups = layout.groups.len(),
            fallbacks = layouts.iter().filter(|l| l.fallback).count(),
            "layout computed"
        );
        layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::oracle::{OracleError, OracleRequest, OracleResponse};
    use crate::layout::types::GroupBox;
    use crate::schema::parse_schema;
    use serde_json::json;

    fn model(value: serde_json::Value) -> GraphModel {
        let schema = parse_schema(&value.to_string()).unwrap();
        GraphModel::from_schema(&schema, &LayoutConfig::default().hub)
    }

    fn boxes_overlap(a: &GroupBox, b: &GroupBox) -> bool {
        a.x < b.x + b.width && b.x < a.x + a.width && a.y < b.y + b.height && b.y < a.y + a.height
    }

    fn assert_well_formed(layout: &Layout) {
        for (i, a) in layout.groups.iter().enumerate() {
            for b in &layout.groups[i + 1..] {
                assert!(!boxes_overlap(a, b), "{} overlaps {}", a.service, b.service);
            }
        }
        for node in &layout.nodes {
            let group = layout.groups.iter().find(|g| g.service == node.service).unwrap();
            assert!(node.x >= group.x && node.x + node.width <= group.x + group.width);
            assert!(node.y >= group.y && node.y + node.height <= group.y + group.height);
        }
    }

    #[test]
    fn test_empty_model() {
        let layout = LayoutEngine::default().layout(&GraphModel::default());
        assert_eq!(layout, Layout::default());
    }

    #[test]
    fn test_isolated_and_linked_services() {
        let m = model(json!({
            "A1": { "service": "A" }, "A2": { "service": "A" }, "A3": { "service": "A" },
            "B1": { "service": "B", "relations": { "peer": { "target": "B2" } } },
            "B2": { "service": "B" }
        }));
        let layout = LayoutEngine::default().layout(&m);

        assert_eq!(layout.nodes.len(), 5);
        assert_eq!(layout.groups.len(), 2);
        let anchor = layout.groups.iter().find(|g| g.anchor).unwrap();
        assert_eq!(anchor.service, "A");
        assert_well_formed(&layout);

        // B1 -> B2 runs left to right inside the group.
        assert!(layout.node("B1").unwrap().x < layout.node("B2").unwrap().x);
    }

    #[test]
    fn test_hub_group_is_anchor() {
        let m = model(json!({
            "Relationship": { "service": "rel", "fields": { "subject_id": {}, "object_id": {} } },
            "Person": { "service": "people", "relations": { "employer": { "target": "Company" } } },
            "Company": { "service": "orgs" },
            "Invoice": { "service": "billing", "fields": { "company_id": { "fk": { "target_entity": "Company" } } } }
        }));
        let layout = LayoutEngine::default().layout(&m);
        let anchor = layout.groups.iter().find(|g| g.anchor).unwrap();
        assert_eq!(anchor.service, "rel");
        assert_eq!(layout.edges.len(), m.edges.len());
        assert_well_formed(&layout);
    }

    struct Broken;

    impl LayoutOracle for Broken {
        fn layout(&self, _request: &OracleRequest) -> Result<OracleResponse, OracleError> {
            Err(OracleError::Failed("offline".into()))
        }
    }

    #[test]
    fn test_broken_oracle_still_lays_out() {
        let m = model(json!({
            "Order": { "service": "shop", "relations": { "items": { "target": "Item" } } },
            "Item": { "service": "shop" },
            "Product": { "service": "catalog" }
        }));
        let layout = LayoutEngine::with_oracle(LayoutConfig::default(), Broken).layout(&m);
        assert_eq!(layout.nodes.len(), 3);
        assert_eq!(layout.node("Order").unwrap().x, layout.node("Item").unwrap().x);
        assert_well_formed(&layout);
    }

    #[test]
    fn test_layout_is_deterministic() {
        let m = model(json!({
            "A": { "service": "s1", "relations": { "b": { "target": "B" }, "c": { "target": "C" } } },
            "B": { "service": "s2" },
            "C": { "service": "s3", "relations": { "d": { "target": "D" } } },
            "D": { "service": "s4" }
        }));
        let engine = LayoutEngine::default();
        assert_eq!(engine.layout(&m), engine.layout(&m));
    }
}
