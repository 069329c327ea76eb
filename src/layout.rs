//! Macro layout: per-service groups laid out by an oracle, then placed in the
//! plane by a force-directed pass around a fixed anchor group.

mod assemble;
mod engine;
mod forces;
mod groups;
mod layered;
mod oracle;
mod placement;
mod types;

pub use assemble::assemble;
pub use engine::LayoutEngine;
pub use groups::{GroupGraph, GroupMetrics, ServiceGroup};
pub use layered::{LayeredOracle, LayeredParams};
pub use oracle::{
    GroupLayout, LayoutOracle, LocalNode, OracleAdapter, OracleEdge, OracleError, OracleNode,
    OracleParams, OraclePosition, OracleRequest, OracleResponse,
};
pub use placement::{MacroLayout, MacroPlacement, PlacementParams};
pub use types::{GroupBox, Layout, LayoutEdge, LayoutNode, Vec2};
