use crate::model::{FieldInfo, GraphNode};
use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextMetrics {
    pub char_width: f64,
    pub line_height: f64,
    pub padding_x: f64,
    pub padding_y: f64,
    pub header_padding: f64,
    pub min_node_width: f64,
    pub min_node_height: f64,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            char_width: 8.0,
            line_height: 20.0,
            padding_x: 12.0,
            padding_y: 8.0,
            header_padding: 4.0,
            min_node_width: 120.0,
            min_node_height: 60.0,
        }
    }
}

impl TextMetrics {
    pub fn text_width(&self, text: &str) -> f64 {
        let width = UnicodeWidthStr::width(text);
        width as f64 * self.char_width
    }

    pub fn header_height(&self) -> f64 {
        self.line_height + self.header_padding * 2.0
    }

    /// Text drawn for one field row.
    pub fn field_label(field: &FieldInfo) -> String {
        match &field.fk {
            Some(target) => format!("{}: {} → {}", field.name, field.typ, target.display()),
            None => format!("{}: {}", field.name, field.typ),
        }
    }

    /// Vertical centre of field row `index`, relative to the node's top edge.
    pub fn field_row_center(&self, index: usize) -> f64 {
        self.header_height() + self.padding_y + (index as f64 + 0.5) * self.line_height
    }

    pub fn node_size(&self, node: &GraphNode) -> (f64, f64) {
        let header_width = self.text_width(&node.id);

        let max_field_width = node
            .fields
            .iter()
            .map(|f| self.text_width(&Self::field_label(f)) + self.char_width * 2.0)
            .fold(0.0, f64::max);

        let content_width = header_width.max(max_field_width) + self.padding_x * 2.0;
        let width = content_width.max(self.min_node_width);

        let body_height = if node.fields.is_empty() {
            0.0
        } else {
            node.fields.len() as f64 * self.line_height + self.padding_y * 2.0
        };

        let height = (self.header_height() + body_height).max(self.min_node_height);

        (width, height)
    }
}
