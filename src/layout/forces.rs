//! Pairwise forces between service groups, modelled as discs.

use std::f64::consts::TAU;

use super::types::Vec2;

const MIN_DISTANCE: f64 = 1e-4;

#[derive(Debug, Clone, Copy)]
pub(super) struct ForceParams {
    pub(super) gap: f64,
    pub(super) margin: f64,
    pub(super) overlap_strength: f64,
    pub(super) repulsion_strength: f64,
    pub(super) attraction_strength: f64,
    pub(super) centering_strength: f64,
}

/// Unit vector along `delta` and its length. Coincident centres get a fixed
/// golden-angle direction derived from the pair indices.
pub(super) fn direction(from: usize, to: usize, delta: Vec2) -> (Vec2, f64) {
    let distance = delta.length();
    if distance > MIN_DISTANCE {
        (delta * (1.0 / distance), distance)
    } else {
        let angle = ((from as f64) * 0.618_034 + (to as f64) * 0.414_214) * TAU;
        (Vec2::from_angle(angle), 0.0)
    }
}

/// Push on `i` away from `j`: linear in the overlap while the discs (plus the
/// gap) intersect, weak inverse-square once they are clear.
pub(super) fn repulsion(
    i: usize,
    j: usize,
    positions: &[Vec2],
    radii: &[f64],
    params: &ForceParams,
) -> Vec2 {
    let (dir, distance) = direction(i, j, positions[i] - positions[j]);
    let min_distance = radii[i] + radii[j] + params.gap;
    if distance < min_distance {
        dir * ((min_distance - distance) * params.overlap_strength)
    } else {
        dir * (params.repulsion_strength / (distance * distance))
    }
}

/// Pull on `i` toward `j` when they are farther apart than the ideal
/// distance, scaled by the square root of the number of linking edges.
pub(super) fn attraction(
    i: usize,
    j: usize,
    links: usize,
    positions: &[Vec2],
    radii: &[f64],
    params: &ForceParams,
) -> Vec2 {
    if links == 0 {
        return Vec2::ZERO;
    }
    let (dir, distance) = direction(i, j, positions[j] - positions[i]);
    let ideal = radii[i] + radii[j] + params.gap + params.margin;
    if distance <= ideal {
        return Vec2::ZERO;
    }
    dir * ((distance - ideal) * params.attraction_strength * (links as f64).sqrt())
}

/// Pull toward the anchor, weaker for groups with many cross-group edges.
pub(super) fn centering(position: Vec2, anchor: Vec2, cross_edges: usize, params: &ForceParams) -> Vec2 {
    (anchor - position) * (params.centering_strength / (1.0 + cross_edges as f64))
}
