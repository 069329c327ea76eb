pub mod config;
pub mod focus;
pub mod layout;
pub mod measure;
pub mod model;
pub mod schema;
pub mod style;
pub mod svg;

use wasm_bindgen::prelude::*;

use config::LayoutConfig;
use focus::Selection;
use layout::{Layout, LayoutEngine};
use model::GraphModel;
use svg::SvgRenderer;

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Parse, build, focus and lay out in one go.
pub fn layout_schema_with(
    schema_json: &str,
    selected: Option<&str>,
    engine: &LayoutEngine,
) -> Result<Layout, schema::SchemaError> {
    let schema = schema::parse_schema(schema_json)?;
    let model = GraphModel::from_schema(&schema, &engine.config().hub);

    let mut selection = Selection::default();
    selection.select(selected, &model);
    Ok(engine.layout(&selection.visible_graph(&model)))
}

/// Lay out a schema document and return the layout as JSON
#[wasm_bindgen(js_name = "layoutSchema")]
pub fn layout_schema(schema_json: &str, selected: Option<String>) -> Result<String, String> {
    let engine = LayoutEngine::new(LayoutConfig::default());
    let layout =
        layout_schema_with(schema_json, selected.as_deref(), &engine).map_err(|e| e.to_string())?;
    serde_json::to_string(&layout).map_err(|e| e.to_string())
}

/// Render a schema document to SVG
#[wasm_bindgen(js_name = "schemaToSvg")]
pub fn schema_to_svg(schema_json: &str, selected: Option<String>) -> Result<String, String> {
    let engine = LayoutEngine::new(LayoutConfig::default());
    let layout =
        layout_schema_with(schema_json, selected.as_deref(), &engine).map_err(|e| e.to_string())?;
    Ok(SvgRenderer::new(engine.config().metrics.clone()).render(&layout))
}
