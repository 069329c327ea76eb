//! Selection-driven focus on one entity and its neighbourhood.
//!
//! Filtering is a pure function of (full model, selection); every change
//! produces a fresh layout request. [`LayoutSession`] tags requests with a
//! generation number so a result computed for a superseded request is never
//! published.

use crate::layout::{Layout, LayoutEngine};
use crate::model::GraphModel;
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    Unselected,
    Selected(String),
}

impl Selection {
    pub fn selected(&self) -> Option<&str> {
        match self {
            Selection::Unselected => None,
            Selection::Selected(id) => Some(id),
        }
    }

    /// Apply a `select(node | null)` event and report whether the state
    /// changed. Selecting the current node again deselects it; ids that are
    /// not in `model` are ignored.
    pub fn select(&mut self, id: Option<&str>, model: &GraphModel) -> bool {
        let next = match id {
            None => Selection::Unselected,
            Some(id) if self.selected() == Some(id) => Selection::Unselected,
            Some(id) if model.contains(id) => Selection::Selected(id.to_string()),
            Some(id) => {
                debug!(id, "ignoring selection of unknown node");
                return false;
            }
        };
        if next == *self {
            return false;
        }
        *self = next;
        true
    }

    /// The graph to lay out for this selection.
    pub fn visible_graph(&self, model: &GraphModel) -> GraphModel {
        match self {
            Selection::Unselected => model.clone(),
            Selection::Selected(id) => focus_subgraph(model, id),
        }
    }
}

/// `id`, its direct neighbours and the edges to them. When the hub is one of
/// those neighbours (and `id` is not the hub), every node adjacent to the hub
/// is added along with the hub's edges. Only one level of hub traversal.
pub fn focus_subgraph(model: &GraphModel, id: &str) -> GraphModel {
    if !model.contains(id) {
        return model.clone();
    }

    let mut keep: HashSet<&str> = HashSet::from([id]);
    let mut relevant: HashSet<&str> = HashSet::new();

    collect_neighbours(model, id, &mut keep, &mut relevant);
    if let Some(hub) = model.hub.as_deref() {
        if hub != id && keep.contains(hub) {
            collect_neighbours(model, hub, &mut keep, &mut relevant);
        }
    }

    GraphModel {
        nodes: model
            .nodes
            .iter()
            .filter(|n| keep.contains(n.id.as_str()))
            .cloned()
            .collect(),
        edges: model
            .edges
            .iter()
            .filter(|e| relevant.contains(e.id.as_str()))
            .cloned()
            .collect(),
        hub: model.hub.clone().filter(|h| keep.contains(h.as_str())),
        services: model.services.clone(),
    }
}

fn collect_neighbours<'m>(
    model: &'m GraphModel,
    center: &str,
    keep: &mut HashSet<&'m str>,
    relevant: &mut HashSet<&'m str>,
) {
    for edge in &model.edges {
        if let Some(other) = edge.other_end(center) {
            keep.insert(other);
            relevant.insert(edge.id.as_str());
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Layout for generation {generation} was superseded by generation {current}")]
pub struct StaleLayout {
    pub generation: u64,
    pub current: u64,
}

/// A graph to lay out, tagged with the generation that issued it.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutRequest {
    pub generation: u64,
    pub graph: GraphModel,
}

/// Full model, current selection and the last published layout.
#[derive(Debug, Default)]
pub struct LayoutSession {
    model: GraphModel,
    selection: Selection,
    generation: u64,
    layout: Option<Layout>,
}

impl LayoutSession {
    pub fn new(model: GraphModel) -> Self {
        Self {
            model,
            ..Self::default()
        }
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Last published layout.
    pub fn layout(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }

    /// Issue a request for the current model and selection. Any request
    /// issued earlier becomes stale.
    pub fn request(&mut self) -> LayoutRequest {
        self.generation += 1;
        LayoutRequest {
            generation: self.generation,
            graph: self.selection.visible_graph(&self.model),
        }
    }

    /// Returns a new request when the selection actually changed.
    pub fn select(&mut self, id: Option<&str>) -> Option<LayoutRequest> {
        if self.selection.select(id, &self.model) {
            Some(self.request())
        } else {
            None
        }
    }

    /// Swap in a rebuilt model. A selection whose node disappeared is cleared.
    pub fn set_model(&mut self, model: GraphModel) -> LayoutRequest {
        if let Some(id) = self.selection.selected() {
            if !model.contains(id) {
                debug!(id, "selected node left the model, clearing selection");
                self.selection = Selection::Unselected;
            }
        }
        self.model = model;
        self.request()
    }

    pub fn publish(&mut self, generation: u64, layout: Layout) -> Result<(), StaleLayout> {
        if generation != self.generation {
            return Err(StaleLayout {
                generation,
                current: self.generation,
            });
        }
        self.layout = Some(layout);
        Ok(())
    }

    /// Request, lay out and publish in one step.
    pub fn refresh(&mut self, engine: &LayoutEngine) -> &Layout {
        let request = self.request();
        let layout = engine.layout(&request.graph);
        // Nothing can run between issuing and publishing here, so the
        // request is still current.
        self.layout.insert(layout)
    }
}
