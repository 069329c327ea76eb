//! Force-directed placement of service groups.
//!
//! Every group is a disc whose radius is half its bounding-box diagonal. The
//! anchor group sits at the centre and never moves; the rest start on a ring
//! around it and settle over a fixed number of damped iterations. A final
//! separation sweep removes whatever overlap the forces left behind.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use tracing::debug;

use super::forces::{self, ForceParams};
use super::types::Vec2;

/// Overlap smaller than this counts as touching.
const TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementParams {
    pub iterations: usize,
    /// Clearance kept between group discs.
    pub gap: f64,
    /// Extra distance beyond the gap that linked groups settle at.
    pub attraction_margin: f64,
    pub overlap_strength: f64,
    pub repulsion_strength: f64,
    pub attraction_strength: f64,
    pub centering_strength: f64,
    /// Damping falls linearly from 1.0 to this value over the iterations.
    pub damping_floor: f64,
    /// Initial ring offset, divided by one plus the edges to the anchor.
    pub ring_base: f64,
    /// Pairwise projection passes before the greedy settle.
    pub separation_passes: usize,
    pub center_x: f64,
    pub center_y: f64,
}

impl Default for PlacementParams {
    fn default() -> Self {
        Self {
            iterations: 150,
            gap: 60.0,
            attraction_margin: 80.0,
            overlap_strength: 0.5,
            repulsion_strength: 20_000.0,
            attraction_strength: 0.05,
            centering_strength: 0.01,
            damping_floor: 0.1,
            ring_base: 200.0,
            separation_passes: 50,
            center_x: 0.0,
            center_y: 0.0,
        }
    }
}

impl PlacementParams {
    fn forces(&self) -> ForceParams {
        ForceParams {
            gap: self.gap,
            margin: self.attraction_margin,
            overlap_strength: self.overlap_strength,
            repulsion_strength: self.repulsion_strength,
            attraction_strength: self.attraction_strength,
            centering_strength: self.centering_strength,
        }
    }

    fn center(&self) -> Vec2 {
        Vec2::new(self.center_x, self.center_y)
    }
}

/// Group centres after placement, index-aligned with the input sizes.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroLayout {
    pub positions: Vec<Vec2>,
    pub radii: Vec<f64>,
    pub anchor: Option<usize>,
}

impl MacroLayout {
    /// True when every pair of discs is at least `gap` apart.
    pub fn is_collision_free(&self, gap: f64) -> bool {
        let n = self.positions.len();
        (0..n).all(|i| {
            ((i + 1)..n).all(|j| {
                (self.positions[i] - self.positions[j]).length()
                    >= self.radii[i] + self.radii[j] + gap - TOLERANCE
            })
        })
    }
}

pub struct MacroPlacement<'a> {
    params: &'a PlacementParams,
}

impl<'a> MacroPlacement<'a> {
    pub fn new(params: &'a PlacementParams) -> Self {
        Self { params }
    }

    /// Place groups given their outer sizes and the symmetric link matrix.
    pub fn place(
        &self,
        sizes: &[(f64, f64)],
        links: &[Vec<usize>],
        anchor: Option<usize>,
    ) -> MacroLayout {
        let n = sizes.len();
        if n == 0 {
            return MacroLayout {
                positions: Vec::new(),
                radii: Vec::new(),
                anchor: None,
            };
        }

        let anchor = anchor.filter(|&a| a < n).unwrap_or(0);
        let radii: Vec<f64> = sizes
            .iter()
            .map(|&(w, h)| (w * w + h * h).sqrt() / 2.0)
            .collect();
        let link = |i: usize, j: usize| links.get(i).and_then(|row| row.get(j)).copied().unwrap_or(0);
        let cross_edges: Vec<usize> = (0..n).map(|i| (0..n).map(|j| link(i, j)).sum()).collect();

        let mut positions = self.initial_ring(&radii, anchor, &link);
        self.relax(&mut positions, &radii, anchor, &link, &cross_edges);
        self.separate(&mut positions, &radii, anchor);

        debug!(groups = n, anchor, "macro placement finished");
        MacroLayout {
            positions,
            radii,
            anchor: Some(anchor),
        }
    }

    fn initial_ring(
        &self,
        radii: &[f64],
        anchor: usize,
        link: &dyn Fn(usize, usize) -> usize,
    ) -> Vec<Vec2> {
        let center = self.params.center();
        let others = radii.len() - 1;
        let mut positions = vec![center; radii.len()];

        let mut slot = 0;
        for i in 0..radii.len() {
            if i == anchor {
                continue;
            }
            let angle = slot as f64 * TAU / others as f64;
            let distance = radii[anchor]
                + radii[i]
                + self.params.gap
                + self.params.ring_base / (1.0 + link(i, anchor) as f64);
            positions[i] = center + Vec2::from_angle(angle) * distance;
            slot += 1;
        }
        positions
    }

    fn relax(
        &self,
        positions: &mut [Vec2],
        radii: &[f64],
        anchor: usize,
        link: &dyn Fn(usize, usize) -> usize,
        cross_edges: &[usize],
    ) {
        let params = self.params.forces();
        let iterations = self.params.iterations;
        let n = positions.len();
        let mut forces = vec![Vec2::ZERO; n];

        for iteration in 0..iterations {
            let progress = if iterations > 1 {
                iteration as f64 / (iterations - 1) as f64
            } else {
                1.0
            };
            let damping = 1.0 - (1.0 - self.params.damping_floor) * progress;

            for (i, force) in forces.iter_mut().enumerate() {
                *force = Vec2::ZERO;
                if i == anchor {
                    continue;
                }
                for j in 0..n {
                    if i == j {
                        continue;
                    }
                    *force += forces::repulsion(i, j, positions, radii, &params);
                    *force += forces::attraction(i, j, link(i, j), positions, radii, &params);
                }
                *force += forces::centering(positions[i], positions[anchor], cross_edges[i], &params);
            }

            for (position, force) in positions.iter_mut().zip(&forces) {
                *position += *force * damping;
            }
        }
    }

    /// Project overlapping pairs apart, then settle any leftovers outward
    /// along their ray from the anchor until they clear every settled group.
    fn separate(&self, positions: &mut [Vec2], radii: &[f64], anchor: usize) {
        let n = positions.len();
        let gap = self.params.gap;
        let required = |i: usize, j: usize| radii[i] + radii[j] + gap;

        for _ in 0..self.params.separation_passes {
            let mut moved = false;
            for i in 0..n {
                for j in (i + 1)..n {
                    let (dir, distance) = forces::direction(i, j, positions[i] - positions[j]);
                    let overlap = required(i, j) - distance;
                    if overlap <= TOLERANCE {
                        continue;
                    }
                    moved = true;
                    if i == anchor {
                        positions[j] -= dir * overlap;
                    } else if j == anchor {
                        positions[i] += dir * overlap;
                    } else {
                        positions[i] += dir * (overlap / 2.0);
                        positions[j] -= dir * (overlap / 2.0);
                    }
                }
            }
            if !moved {
                return;
            }
        }

        let origin = positions[anchor];
        let mut order: Vec<usize> = (0..n).filter(|&i| i != anchor).collect();
        order.sort_by(|&a, &b| {
            (positions[a] - origin)
                .length_sq()
                .total_cmp(&(positions[b] - origin).length_sq())
                .then(a.cmp(&b))
        });

        let mut settled = vec![anchor];
        let mut pushed = 0;
        for i in order {
            let (ray, mut distance) = forces::direction(i, anchor, positions[i] - origin);
            loop {
                let blocker = settled.iter().copied().find(|&j| {
                    (positions[i] - positions[j]).length() < required(i, j) - TOLERANCE
                });
                let Some(j) = blocker else {
                    break;
                };
                pushed += 1;
                let shortfall = required(i, j) - (positions[i] - positions[j]).length();
                distance += shortfall.max(1.0);
                positions[i] = origin + ray * distance;
            }
            settled.push(i);
        }
        if pushed > 0 {
            debug!(pushed, "separation sweep needed a greedy settle");
        }
    }
}
