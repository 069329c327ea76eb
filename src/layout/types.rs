//! Data structures for layout computation.

use crate::model::{EdgeKind, FieldInfo};
use crate::schema::Cardinality;
use crate::style::EdgeStyle;
use serde::Serialize;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

/// Plain 2-D vector used by macro placement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length_sq(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(self) -> f64 {
        self.length_sq().sqrt()
    }

    pub fn from_angle(angle: f64) -> Self {
        Self::new(angle.cos(), angle.sin())
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Vec2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

/// A positioned entity in absolute drawing coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutNode {
    pub id: String,
    pub service: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fields: Vec<FieldInfo>,
}

/// A styled connection; endpoints reference nodes and field anchors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutEdge {
    pub id: String,
    pub kind: EdgeKind,
    pub source: String,
    pub target: String,
    pub source_field: Option<String>,
    pub target_field: Option<String>,
    pub label: Option<String>,
    pub cardinality: Cardinality,
    pub cross_service: bool,
    pub style: EdgeStyle,
}

/// Bounding box of one service group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupBox {
    pub service: String,
    pub color: &'static str,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub anchor: bool,
}

/// The complete layout result handed to a renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layout {
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<LayoutEdge>,
    pub groups: Vec<GroupBox>,
    pub width: f64,
    pub height: f64,
}

impl Layout {
    pub fn node(&self, id: &str) -> Option<&LayoutNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}
