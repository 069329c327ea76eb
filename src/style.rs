//! Visual styling resolved from edge kind and flags.

use crate::model::{EdgeKind, GraphEdge};
use serde::Serialize;

/// Service group colors, assigned by alphabetical service rank.
pub const SERVICE_PALETTE: [&str; 8] = [
    "#3b82f6", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6", "#ec4899", "#14b8a6", "#f97316",
];

pub fn service_color(index: usize) -> &'static str {
    SERVICE_PALETTE[index % SERVICE_PALETTE.len()]
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EdgeStyle {
    pub stroke: &'static str,
    pub stroke_width: f64,
    pub dashed: bool,
    pub animated: bool,
}

const RELATION: &str = "#64748b";
const RELATION_REF: &str = "#3b82f6";
const CROSS_SERVICE: &str = "#f59e0b";
const FOREIGN_KEY: &str = "#a855f7";
const FOREIGN_KEY_CROSS: &str = "#eab308";
const HUB_INBOUND: &str = "#10b981";
const HUB_OUTBOUND: &str = "#ef4444";

pub fn edge_style(edge: &GraphEdge) -> EdgeStyle {
    let (stroke, stroke_width, dashed) = match edge.kind {
        EdgeKind::Relation if edge.cross_service => (CROSS_SERVICE, 2.0, true),
        EdgeKind::Relation if edge.explicit_ref => (RELATION_REF, 2.0, false),
        EdgeKind::Relation => (RELATION, 1.5, false),
        EdgeKind::ForeignKey if edge.cross_service => (FOREIGN_KEY_CROSS, 1.5, true),
        EdgeKind::ForeignKey => (FOREIGN_KEY, 1.5, false),
        EdgeKind::HubInbound => (HUB_INBOUND, 2.0, edge.cross_service),
        EdgeKind::HubOutbound => (HUB_OUTBOUND, 2.0, edge.cross_service),
    };

    EdgeStyle {
        stroke,
        stroke_width,
        dashed,
        animated: edge.animated,
    }
}
