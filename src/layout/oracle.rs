//! Boundary to the per-group layered layout.
//!
//! The oracle sees one service group at a time: node sizes plus the edges
//! whose endpoints both sit inside the group. It answers with positions local
//! to the group's content origin. Anything that goes wrong on the oracle side
//! (an error, a missing or non-finite position, a blown time budget) is
//! absorbed here by a single-column arrangement so a layout is always produced.

use crate::measure::TextMetrics;
use crate::model::{GraphEdge, GraphNode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use super::groups::GroupMetrics;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OracleNode {
    pub id: String,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OracleEdge {
    pub id: String,
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OracleRequest {
    pub nodes: Vec<OracleNode>,
    pub edges: Vec<OracleEdge>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OraclePosition {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OracleResponse {
    pub positions: Vec<OraclePosition>,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("Layout oracle failed: {0}")]
    Failed(String),
    #[error("Layout oracle did not place node {0}")]
    MissingNode(String),
    #[error("Layout oracle returned a non-finite coordinate for {0}")]
    NonFinite(String),
    #[error("Layout oracle took {elapsed_ms} ms, budget is {budget_ms} ms")]
    TimedOut { elapsed_ms: u64, budget_ms: u64 },
}

/// Computes node positions inside a single service group, left to right.
pub trait LayoutOracle {
    fn layout(&self, request: &OracleRequest) -> Result<OracleResponse, OracleError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleParams {
    /// Responses slower than this are discarded. `None` disables the check.
    ///
    /// The budget is checked once the oracle returns; it does not interrupt
    /// the call, so an oracle that never returns blocks the layout.
    pub budget_ms: Option<u64>,
    /// Vertical gap between nodes in the single-column fallback.
    pub fallback_gap: f64,
}

impl Default for OracleParams {
    fn default() -> Self {
        Self {
            budget_ms: Some(2_000),
            fallback_gap: 30.0,
        }
    }
}

/// Node placement inside a group, relative to the group's content origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalNode {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupLayout {
    pub nodes: HashMap<String, LocalNode>,
    /// Outer size including padding and header.
    pub width: f64,
    pub height: f64,
    pub fallback: bool,
}

pub struct OracleAdapter<'a> {
    oracle: &'a dyn LayoutOracle,
    metrics: &'a TextMetrics,
    group: &'a GroupMetrics,
    params: &'a OracleParams,
}

impl<'a> OracleAdapter<'a> {
    pub fn new(
        oracle: &'a dyn LayoutOracle,
        metrics: &'a TextMetrics,
        group: &'a GroupMetrics,
        params: &'a OracleParams,
    ) -> Self {
        Self {
            oracle,
            metrics,
            group,
            params,
        }
    }

    pub fn layout_group(
        &self,
        service: &str,
        nodes: &[&GraphNode],
        edges: &[&GraphEdge],
    ) -> GroupLayout {
        let request = OracleRequest {
            nodes: nodes
                .iter()
                .map(|n| {
                    let (width, height) = self.metrics.node_size(n);
                    OracleNode {
                        id: n.id.clone(),
                        width,
                        height,
                    }
                })
                .collect(),
            edges: edges
                .iter()
                .map(|e| OracleEdge {
                    id: e.id.clone(),
                    source: e.source.clone(),
                    target: e.target.clone(),
                })
                .collect(),
        };

        let stopwatch = Stopwatch::start();
        let outcome = self
            .oracle
            .layout(&request)
            .and_then(|response| self.check_budget(&stopwatch).map(|_| response))
            .and_then(|response| place_from_response(&request, &response));

        let (placed, content_width, content_height, fallback) = match outcome {
            Ok((placed, w, h)) => (placed, w, h, false),
            Err(err) => {
                warn!(service, error = %err, "layout oracle failed, using single column");
                let (placed, w, h) = single_column(&request, self.params.fallback_gap);
                (placed, w, h, true)
            }
        };

        GroupLayout {
            nodes: placed,
            width: content_width + self.group.padding * 2.0,
            height: content_height + self.group.padding * 2.0 + self.group.header_height,
            fallback,
        }
    }

    fn check_budget(&self, stopwatch: &Stopwatch) -> Result<(), OracleError> {
        let Some(budget_ms) = self.params.budget_ms else {
            return Ok(());
        };
        let elapsed_ms = stopwatch.elapsed_ms();
        if elapsed_ms > budget_ms {
            return Err(OracleError::TimedOut {
                elapsed_ms,
                budget_ms,
            });
        }
        Ok(())
    }
}

type Placed = (HashMap<String, LocalNode>, f64, f64);

/// Validate a response and normalize it so content starts at the origin.
fn place_from_response(
    request: &OracleRequest,
    response: &OracleResponse,
) -> Result<Placed, OracleError> {
    let by_id: HashMap<&str, &OraclePosition> = response
        .positions
        .iter()
        .map(|p| (p.id.as_str(), p))
        .collect();

    let mut placed = HashMap::with_capacity(request.nodes.len());
    for node in &request.nodes {
        let pos = by_id
            .get(node.id.as_str())
            .ok_or_else(|| OracleError::MissingNode(node.id.clone()))?;
        if !pos.x.is_finite() || !pos.y.is_finite() {
            return Err(OracleError::NonFinite(node.id.clone()));
        }
        placed.insert(
            node.id.clone(),
            LocalNode {
                x: pos.x,
                y: pos.y,
                width: node.width,
                height: node.height,
            },
        );
    }

    let min_x = placed.values().map(|n| n.x).fold(f64::INFINITY, f64::min);
    let min_y = placed.values().map(|n| n.y).fold(f64::INFINITY, f64::min);
    let (shift_x, shift_y) = (min_x.min(0.0), min_y.min(0.0));
    for node in placed.values_mut() {
        node.x -= shift_x;
        node.y -= shift_y;
    }

    let right = placed.values().map(|n| n.x + n.width).fold(0.0, f64::max);
    let bottom = placed.values().map(|n| n.y + n.height).fold(0.0, f64::max);
    let width = if response.width.is_finite() {
        response.width.max(right)
    } else {
        right
    };
    let height = if response.height.is_finite() {
        response.height.max(bottom)
    } else {
        bottom
    };

    Ok((placed, width, height))
}

/// Deterministic fallback: nodes stacked top to bottom in request order.
fn single_column(request: &OracleRequest, gap: f64) -> Placed {
    let mut placed = HashMap::with_capacity(request.nodes.len());
    let mut y = 0.0;
    let mut width: f64 = 0.0;

    for node in &request.nodes {
        placed.insert(
            node.id.clone(),
            LocalNode {
                x: 0.0,
                y,
                width: node.width,
                height: node.height,
            },
        );
        y += node.height + gap;
        width = width.max(node.width);
    }

    let height = (y - gap).max(0.0);
    (placed, width, height)
}

struct Stopwatch {
    #[cfg(not(target_arch = "wasm32"))]
    start: std::time::Instant,
    #[cfg(target_arch = "wasm32")]
    start_ms: f64,
}

impl Stopwatch {
    #[cfg(not(target_arch = "wasm32"))]
    fn start() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn start() -> Self {
        Self {
            start_ms: js_sys::Date::now(),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    #[cfg(target_arch = "wasm32")]
    fn elapsed_ms(&self) -> u64 {
        (js_sys::Date::now() - self.start_ms).max(0.0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GraphNode;

    struct Failing;

    impl LayoutOracle for Failing {
        fn layout(&self, _request: &OracleRequest) -> Result<OracleResponse, OracleError> {
            Err(OracleError::Failed("unavailable".into()))
        }
    }

    /// Places every node on a diagonal, optionally forgetting the last one.
    struct Diagonal {
        drop_last: bool,
        offset: f64,
    }

    impl LayoutOracle for Diagonal {
        fn layout(&self, request: &OracleRequest) -> Result<OracleResponse, OracleError> {
            let mut positions: Vec<OraclePosition> = request
                .nodes
                .iter()
                .enumerate()
                .map(|(i, n)| OraclePosition {
                    id: n.id.clone(),
                    x: self.offset + i as f64 * 200.0,
                    y: self.offset + i as f64 * 100.0,
                })
                .collect();
            if self.drop_last {
                positions.pop();
            }
            Ok(OracleResponse {
                positions,
                width: 0.0,
                height: 0.0,
            })
        }
    }

    struct Slow;

    impl LayoutOracle for Slow {
        fn layout(&self, request: &OracleRequest) -> Result<OracleResponse, OracleError> {
            std::thread::sleep(std::time::Duration::from_millis(30));
            Diagonal {
                drop_last: false,
                offset: 0.0,
            }
            .layout(request)
        }
    }

    fn nodes() -> Vec<GraphNode> {
        ["A", "B", "C"]
            .iter()
            .map(|id| GraphNode {
                id: id.to_string(),
                service: "svc".into(),
                fields: vec![],
            })
            .collect()
    }

    fn run(oracle: &dyn LayoutOracle, params: &OracleParams) -> GroupLayout {
        let metrics = TextMetrics::default();
        let group = GroupMetrics::default();
        let nodes = nodes();
        let refs: Vec<&GraphNode> = nodes.iter().collect();
        OracleAdapter::new(oracle, &metrics, &group, params).layout_group("svc", &refs, &[])
    }

    #[test]
    fn test_failure_falls_back_to_single_column() {
        let params = OracleParams::default();
        let layout = run(&Failing, &params);
        assert!(layout.fallback);
        assert_eq!(layout.nodes["A"].y, 0.0);
        assert_eq!(layout.nodes["B"].y, 60.0 + params.fallback_gap);
        assert!(layout.nodes.values().all(|n| n.x == 0.0));

        let group = GroupMetrics::default();
        let content_h = 3.0 * 60.0 + 2.0 * params.fallback_gap;
        assert_eq!(
            layout.height,
            content_h + group.padding * 2.0 + group.header_height
        );
    }

    #[test]
    fn test_missing_node_falls_back() {
        let layout = run(
            &Diagonal {
                drop_last: true,
                offset: 0.0,
            },
            &OracleParams::default(),
        );
        assert!(layout.fallback);
    }

    #[test]
    fn test_response_normalized_and_bounded() {
        let layout = run(
            &Diagonal {
                drop_last: false,
                offset: -50.0,
            },
            &OracleParams::default(),
        );
        assert!(!layout.fallback);
        assert_eq!(layout.nodes["A"].x, 0.0);
        assert_eq!(layout.nodes["C"].x, 400.0);

        let group = GroupMetrics::default();
        let c = layout.nodes["C"];
        assert_eq!(layout.width, c.x + c.width + group.padding * 2.0);
    }

    #[test]
    fn test_slow_oracle_exceeds_budget() {
        let params = OracleParams {
            budget_ms: Some(0),
            ..OracleParams::default()
        };
        assert!(run(&Slow, &params).fallback);

        let unlimited = OracleParams {
            budget_ms: None,
            ..OracleParams::default()
        };
        assert!(!run(&Slow, &unlimited).fallback);
    }
}
