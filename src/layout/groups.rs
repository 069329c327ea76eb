//! Partitioning of the graph into service groups.

use crate::model::{GraphEdge, GraphModel, GraphNode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupMetrics {
    /// Inner padding on every side of a group box.
    pub padding: f64,
    /// Space above the content reserved for the service label.
    pub header_height: f64,
    /// Outer margin around the whole drawing.
    pub margin: f64,
}

impl Default for GroupMetrics {
    fn default() -> Self {
        Self {
            padding: 24.0,
            header_height: 36.0,
            margin: 40.0,
        }
    }
}

#[derive(Debug)]
pub struct ServiceGroup<'m> {
    pub service: String,
    pub color_index: usize,
    pub nodes: Vec<&'m GraphNode>,
    /// Edges with both endpoints inside the group.
    pub internal_edges: Vec<&'m GraphEdge>,
}

/// Groups plus the connection counts between them.
#[derive(Debug)]
pub struct GroupGraph<'m> {
    pub groups: Vec<ServiceGroup<'m>>,
    group_of: HashMap<&'m str, usize>,
    /// (lower index, higher index) -> number of edges between the two groups
    links: BTreeMap<(usize, usize), usize>,
}

impl<'m> GroupGraph<'m> {
    /// Groups come out sorted by service name.
    pub fn build(model: &'m GraphModel) -> Self {
        let mut by_service: BTreeMap<&str, Vec<&GraphNode>> = BTreeMap::new();
        for node in &model.nodes {
            by_service.entry(node.service.as_str()).or_default().push(node);
        }

        let mut groups: Vec<ServiceGroup<'m>> = Vec::with_capacity(by_service.len());
        let mut group_of = HashMap::new();
        for (index, (service, nodes)) in by_service.into_iter().enumerate() {
            for &node in &nodes {
                group_of.insert(node.id.as_str(), index);
            }
            let color_index = model
                .services
                .iter()
                .position(|s| s == service)
                .unwrap_or(index);
            groups.push(ServiceGroup {
                service: service.to_string(),
                color_index,
                nodes,
                internal_edges: Vec::new(),
            });
        }

        let mut links = BTreeMap::new();
        for edge in &model.edges {
            let (Some(&a), Some(&b)) = (
                group_of.get(edge.source.as_str()),
                group_of.get(edge.target.as_str()),
            ) else {
                continue;
            };
            if a == b {
                groups[a].internal_edges.push(edge);
            } else {
                *links.entry((a.min(b), a.max(b))).or_insert(0) += 1;
            }
        }

        Self {
            groups,
            group_of,
            links,
        }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn group_of(&self, node_id: &str) -> Option<usize> {
        self.group_of.get(node_id).copied()
    }

    pub fn link_count(&self, a: usize, b: usize) -> usize {
        self.links.get(&(a.min(b), a.max(b))).copied().unwrap_or(0)
    }

    /// Total number of edges leaving group `index`.
    pub fn cross_edges(&self, index: usize) -> usize {
        self.links
            .iter()
            .filter(|((a, b), _)| *a == index || *b == index)
            .map(|(_, count)| count)
            .sum()
    }

    /// Dense link matrix, `links[i][j]` = edge count between groups i and j.
    pub fn link_matrix(&self) -> Vec<Vec<usize>> {
        let n = self.groups.len();
        let mut matrix = vec![vec![0; n]; n];
        for (&(a, b), &count) in &self.links {
            matrix[a][b] = count;
            matrix[b][a] = count;
        }
        matrix
    }

    /// The group that stays fixed during placement: the hub's group when the
    /// hub is present, otherwise the group with the most cross-group edges.
    /// Ties go to the alphabetically first service.
    pub fn anchor(&self, hub: Option<&str>) -> Option<usize> {
        if let Some(index) = hub.and_then(|h| self.group_of(h)) {
            return Some(index);
        }

        let mut best: Option<(usize, usize)> = None;
        for index in 0..self.groups.len() {
            let edges = self.cross_edges(index);
            if best.is_none_or(|(_, most)| edges > most) {
                best = Some((index, edges));
            }
        }
        best.map(|(index, _)| index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelOptions;
    use crate::schema::parse_schema;
    use serde_json::json;

    fn model(value: serde_json::Value) -> GraphModel {
        let schema = parse_schema(&value.to_string()).unwrap();
        GraphModel::from_schema(&schema, &ModelOptions::default())
    }

    #[test]
    fn test_groups_sorted_with_internal_edges() {
        let m = model(json!({
            "Order": { "service": "shop", "relations": { "items": { "target": "Item" } } },
            "Item": { "service": "shop", "relations": { "product": { "target": "Product", "cardinality": "one" } } },
            "Product": { "service": "catalog" }
        }));
        let graph = GroupGraph::build(&m);
        let services: Vec<_> = graph.groups.iter().map(|g| g.service.as_str()).collect();
        assert_eq!(services, vec!["catalog", "shop"]);
        assert_eq!(graph.groups[1].nodes.len(), 2);
        assert_eq!(graph.groups[1].internal_edges.len(), 1);
        assert_eq!(graph.link_count(0, 1), 1);
        assert_eq!(graph.link_count(1, 0), 1);
        assert_eq!(graph.cross_edges(0), 1);
        assert_eq!(graph.link_matrix()[1][0], 1);
    }

    #[test]
    fn test_anchor_prefers_hub_group() {
        let m = model(json!({
            "Relationship": { "service": "relations", "fields": { "subject_id": {}, "object_id": {} } },
            "A": { "service": "a", "relations": { "bs": { "target": "B" } } },
            "B": { "service": "b" }
        }));
        let graph = GroupGraph::build(&m);
        let anchor = graph.anchor(m.hub.as_deref()).unwrap();
        assert_eq!(graph.groups[anchor].service, "relations");
    }

    #[test]
    fn test_anchor_most_connected() {
        let m = model(json!({
            "A1": { "service": "a" },
            "B1": { "service": "b", "relations": {
                "x": { "target": "A1" }, "y": { "target": "C1" } } },
            "C1": { "service": "c" }
        }));
        let graph = GroupGraph::build(&m);
        assert_eq!(graph.groups[graph.anchor(None).unwrap()].service, "b");
    }

    #[test]
    fn test_anchor_tie_breaks_alphabetically() {
        // Service A: three isolated entities. Service B: two linked entities.
        let m = model(json!({
            "A1": { "service": "A" }, "A2": { "service": "A" }, "A3": { "service": "A" },
            "B1": { "service": "B", "relations": { "peer": { "target": "B2" } } },
            "B2": { "service": "B" }
        }));
        let graph = GroupGraph::build(&m);
        assert_eq!(graph.cross_edges(0), 0);
        assert_eq!(graph.cross_edges(1), 0);
        assert_eq!(graph.groups[graph.anchor(None).unwrap()].service, "A");
    }

    #[test]
    fn test_color_index_follows_full_service_list() {
        let mut m = model(json!({
            "A1": { "service": "a" }, "B1": { "service": "b" }, "C1": { "service": "c" }
        }));
        m.nodes.retain(|n| n.service == "c");
        let graph = GroupGraph::build(&m);
        assert_eq!(graph.groups[0].color_index, 2);
    }

    #[test]
    fn test_empty_model_has_no_anchor() {
        let m = GraphModel::default();
        let graph = GroupGraph::build(&m);
        assert!(graph.is_empty());
        assert_eq!(graph.anchor(None), None);
    }
}
