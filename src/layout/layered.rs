//! Built-in layered layout for a single service group.
//!
//! Classic four phases, oriented left to right:
//! 1. Cycle removal (DFS, back edges reversed)
//! 2. Rank assignment (longest path)
//! 3. Crossing reduction (barycenter sweeps)
//! 4. Coordinate assignment (ranks as columns, nodes stacked and centred)

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

use super::oracle::{LayoutOracle, OracleError, OraclePosition, OracleRequest, OracleResponse};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayeredParams {
    /// Horizontal gap between rank columns.
    pub rank_gap: f64,
    /// Vertical gap between nodes of the same rank.
    pub node_gap: f64,
    /// Number of down+up barycenter sweeps.
    pub sweeps: usize,
}

impl Default for LayeredParams {
    fn default() -> Self {
        Self {
            rank_gap: 80.0,
            node_gap: 30.0,
            sweeps: 8,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LayeredOracle {
    params: LayeredParams,
}

impl LayeredOracle {
    pub fn new(params: LayeredParams) -> Self {
        Self { params }
    }
}

impl LayoutOracle for LayeredOracle {
    fn layout(&self, request: &OracleRequest) -> Result<OracleResponse, OracleError> {
        let n = request.nodes.len();
        let index: HashMap<&str, usize> = request
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id.as_str(), i))
            .collect();

        let mut seen = HashSet::new();
        let mut edges = Vec::with_capacity(request.edges.len());
        for edge in &request.edges {
            let (Some(&src), Some(&dst)) = (
                index.get(edge.source.as_str()),
                index.get(edge.target.as_str()),
            ) else {
                return Err(OracleError::Failed(format!(
                    "edge {} references a node outside the group",
                    edge.id
                )));
            };
            if src != dst && seen.insert((src, dst)) {
                edges.push((src, dst));
            }
        }

        let acyclic = remove_cycles(n, &edges);
        let ranks = assign_ranks(n, &acyclic);
        let ordered = reduce_crossings(&ranks, &acyclic, self.params.sweeps);

        Ok(self.assign_coordinates(request, &ordered))
    }
}

impl LayeredOracle {
    fn assign_coordinates(&self, request: &OracleRequest, ordered: &[Vec<usize>]) -> OracleResponse {
        let size = |i: usize| (request.nodes[i].width, request.nodes[i].height);

        let column_heights: Vec<f64> = ordered
            .iter()
            .map(|rank| {
                rank.iter().map(|&i| size(i).1).sum::<f64>()
                    + rank.len().saturating_sub(1) as f64 * self.params.node_gap
            })
            .collect();
        let height = column_heights.iter().copied().fold(0.0, f64::max);

        let mut positions = Vec::with_capacity(request.nodes.len());
        let mut x = 0.0;
        let mut width: f64 = 0.0;

        for (rank, column_height) in ordered.iter().zip(&column_heights) {
            let column_width = rank.iter().map(|&i| size(i).0).fold(0.0, f64::max);
            let mut y = (height - column_height) / 2.0;

            for &i in rank {
                let (w, h) = size(i);
                positions.push(OraclePosition {
                    id: request.nodes[i].id.clone(),
                    x: x + (column_width - w) / 2.0,
                    y,
                });
                y += h + self.params.node_gap;
            }

            width = x + column_width;
            x += column_width + self.params.rank_gap;
        }

        OracleResponse {
            positions,
            width,
            height,
        }
    }
}

/// Reverse DFS back edges so the result is acyclic.
fn remove_cycles(n: usize, edges: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); n];
    for &(src, dst) in edges {
        adj[src].push(dst);
    }

    let mut visited = vec![false; n];
    let mut in_stack = vec![false; n];
    let mut out = Vec::with_capacity(edges.len());
    // (node, index of the next child to visit)
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for root in 0..n {
        if visited[root] {
            continue;
        }
        visited[root] = true;
        in_stack[root] = true;
        stack.push((root, 0));

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            let Some(&dst) = adj[node].get(frame.1) else {
                in_stack[node] = false;
                stack.pop();
                continue;
            };
            frame.1 += 1;

            if in_stack[dst] {
                out.push((dst, node));
            } else {
                out.push((node, dst));
                if !visited[dst] {
                    visited[dst] = true;
                    in_stack[dst] = true;
                    stack.push((dst, 0));
                }
            }
        }
    }

    let mut seen = HashSet::new();
    out.retain(|&e| seen.insert(e));
    out
}

/// Longest-path ranking; returns the rank of every node.
fn assign_ranks(n: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    let mut in_degree = vec![0usize; n];
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); n];
    for &(src, dst) in edges {
        in_degree[dst] += 1;
        adj[src].push(dst);
    }

    let mut rank = vec![0usize; n];
    let mut queue: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();

    while let Some(node) = queue.pop_front() {
        for &next in &adj[node] {
            rank[next] = rank[next].max(rank[node] + 1);
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                queue.push_back(next);
            }
        }
    }

    rank
}

/// Barycenter ordering within ranks, starting from request order.
fn reduce_crossings(ranks: &[usize], edges: &[(usize, usize)], sweeps: usize) -> Vec<Vec<usize>> {
    let columns = ranks.iter().max().map_or(0, |&r| r + 1);
    let mut ordered: Vec<Vec<usize>> = vec![Vec::new(); columns];
    for (node, &r) in ranks.iter().enumerate() {
        ordered[r].push(node);
    }

    let mut position = vec![0usize; ranks.len()];
    let refresh = |ordered: &[Vec<usize>], position: &mut [usize]| {
        for rank in ordered {
            for (i, &node) in rank.iter().enumerate() {
                position[node] = i;
            }
        }
    };
    refresh(&ordered, &mut position);

    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); ranks.len()];
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); ranks.len()];
    for &(src, dst) in edges {
        successors[src].push(dst);
        predecessors[dst].push(src);
    }

    let barycenter = |node: usize, neighbors: &[usize], position: &[usize]| {
        if neighbors.is_empty() {
            position[node] as f64
        } else {
            neighbors.iter().map(|&m| position[m] as f64).sum::<f64>() / neighbors.len() as f64
        }
    };

    for _ in 0..sweeps {
        for r in 1..ordered.len() {
            let mut keyed: Vec<(usize, f64)> = ordered[r]
                .iter()
                .map(|&node| (node, barycenter(node, &predecessors[node], &position)))
                .collect();
            keyed.sort_by(|a, b| a.1.total_cmp(&b.1));
            ordered[r] = keyed.into_iter().map(|(node, _)| node).collect();
            refresh(&ordered, &mut position);
        }

        for r in (0..ordered.len().saturating_sub(1)).rev() {
            let mut keyed: Vec<(usize, f64)> = ordered[r]
                .iter()
                .map(|&node| (node, barycenter(node, &successors[node], &position)))
                .collect();
            keyed.sort_by(|a, b| a.1.total_cmp(&b.1));
            ordered[r] = keyed.into_iter().map(|(node, _)| node).collect();
            refresh(&ordered, &mut position);
        }
    }

    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::oracle::{OracleEdge, OracleNode};

    fn request(nodes: &[&str], edges: &[(&str, &str)]) -> OracleRequest {
        OracleRequest {
            nodes: nodes
                .iter()
                .map(|id| OracleNode {
                    id: id.to_string(),
                    width: 100.0,
                    height: 50.0,
                })
                .collect(),
            edges: edges
                .iter()
                .map(|(s, t)| OracleEdge {
                    id: format!("{s}->{t}"),
                    source: s.to_string(),
                    target: t.to_string(),
                })
                .collect(),
        }
    }

    fn pos<'a>(response: &'a OracleResponse, id: &str) -> &'a OraclePosition {
        response.positions.iter().find(|p| p.id == id).unwrap()
    }

    #[test]
    fn test_chain_flows_left_to_right() {
        let response = LayeredOracle::default()
            .layout(&request(&["A", "B", "C"], &[("A", "B"), ("B", "C")]))
            .unwrap();
        assert!(pos(&response, "A").x < pos(&response, "B").x);
        assert!(pos(&response, "B").x < pos(&response, "C").x);
        assert_eq!(response.width, 3.0 * 100.0 + 2.0 * 80.0);
        assert_eq!(response.height, 50.0);
    }

    #[test]
    fn test_isolated_nodes_share_first_column() {
        let response = LayeredOracle::default()
            .layout(&request(&["A", "B", "C"], &[]))
            .unwrap();
        assert!(response.positions.iter().all(|p| p.x == 0.0));
        assert_eq!(response.height, 3.0 * 50.0 + 2.0 * 30.0);
        assert_eq!(pos(&response, "B").y, 80.0);
    }

    #[test]
    fn test_cycle_is_broken() {
        let response = LayeredOracle::default()
            .layout(&request(&["A", "B"], &[("A", "B"), ("B", "A")]))
            .unwrap();
        assert_eq!(response.positions.len(), 2);
        assert_ne!(pos(&response, "A").x, pos(&response, "B").x);
    }

    #[test]
    fn test_long_chain_does_not_recurse() {
        let n = 200_000;
        let mut edges: Vec<(usize, usize)> = (0..n - 1).map(|i| (i, i + 1)).collect();
        edges.push((n - 1, 0));
        let acyclic = remove_cycles(n, &edges);
        assert_eq!(acyclic.len(), n);
        assert!(acyclic.contains(&(0, n - 1)));
        assert!(!acyclic.contains(&(n - 1, 0)));
    }

    #[test]
    fn test_self_loop_ignored() {
        let response = LayeredOracle::default()
            .layout(&request(&["A"], &[("A", "A")]))
            .unwrap();
        assert_eq!(pos(&response, "A").x, 0.0);
    }

    #[test]
    fn test_unknown_endpoint_is_an_error() {
        let result = LayeredOracle::default().layout(&request(&["A"], &[("A", "Z")]));
        assert!(matches!(result, Err(OracleError::Failed(_))));
    }

    #[test]
    fn test_barycenter_uncrosses() {
        // Request order puts C above D, which crosses A->D and B->C.
        let response = LayeredOracle::default()
            .layout(&request(&["A", "B", "C", "D"], &[("A", "D"), ("B", "C")]))
            .unwrap();
        let a_above_b = pos(&response, "A").y < pos(&response, "B").y;
        let d_above_c = pos(&response, "D").y < pos(&response, "C").y;
        assert_eq!(a_above_b, d_above_c);
    }

    #[test]
    fn test_empty_request() {
        let response = LayeredOracle::default().layout(&request(&[], &[])).unwrap();
        assert!(response.positions.is_empty());
        assert_eq!(response.width, 0.0);
        assert_eq!(response.height, 0.0);
    }
}
