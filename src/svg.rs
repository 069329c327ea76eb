use crate::layout::{GroupBox, Layout, LayoutEdge, LayoutNode};
use crate::measure::TextMetrics;
use crate::schema::Cardinality;
use std::collections::HashMap;
use std::fmt::{self, Write};

#[derive(Default)]
pub struct SvgRenderer {
    metrics: TextMetrics,
}

impl SvgRenderer {
    pub fn new(metrics: TextMetrics) -> Self {
        Self { metrics }
    }

    pub fn render(&self, layout: &Layout) -> String {
        let mut svg = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_to(&mut svg, layout);
        svg
    }

    pub fn write_to<W: Write>(&self, out: &mut W, layout: &Layout) -> fmt::Result {
        writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
            layout.width, layout.height, layout.width, layout.height
        )?;

        // Style
        writeln!(
            out,
            r#"<style>
  .group-bg {{ fill-opacity: 0.06; stroke-width: 1.5; }}
  .group-anchor {{ stroke-width: 3; }}
  .group-name {{ font-family: sans-serif; font-size: 14px; font-weight: bold; }}
  .entity-bg {{ fill: #fff; }}
  .entity-header {{ fill: #e0e0e0; }}
  .entity-border {{ fill: none; stroke: #333; stroke-width: 1.5; }}
  .entity-name {{ font-family: monospace; font-size: 14px; font-weight: bold; }}
  .column-text {{ font-family: monospace; font-size: 12px; }}
  .pk {{ font-weight: bold; }}
  .fk {{ font-style: italic; }}
  .edge {{ fill: none; }}
  .edge-label {{ font-family: monospace; font-size: 11px; fill: #666; }}
  .cardinality {{ font-family: monospace; font-size: 11px; fill: #333; }}
  .animated {{ stroke-dasharray: 6 4; animation: flow 1s linear infinite; }}
  @keyframes flow {{ to {{ stroke-dashoffset: -10; }} }}
</style>"#
        )?;

        for group in &layout.groups {
            self.render_group(out, group)?;
        }

        let node_map: HashMap<&str, &LayoutNode> =
            layout.nodes.iter().map(|n| (n.id.as_str(), n)).collect();

        // Edges go behind nodes
        for edge in &layout.edges {
            if let (Some(source), Some(target)) = (
                node_map.get(edge.source.as_str()),
                node_map.get(edge.target.as_str()),
            ) {
                self.render_edge(out, edge, source, target)?;
            }
        }

        for node in &layout.nodes {
            self.render_node(out, node)?;
        }

        writeln!(out, "</svg>")
    }

    fn render_group<W: Write>(&self, out: &mut W, group: &GroupBox) -> fmt::Result {
        let class = if group.anchor {
            "group-bg group-anchor"
        } else {
            "group-bg"
        };
        writeln!(
            out,
            r#"<rect class="{}" x="{}" y="{}" width="{}" height="{}" rx="8" fill="{}" stroke="{}" />"#,
            class, group.x, group.y, group.width, group.height, group.color, group.color
        )?;
        writeln!(
            out,
            r#"<text class="group-name" x="{}" y="{}" fill="{}">{}</text>"#,
            group.x + 12.0,
            group.y + 22.0,
            group.color,
            escape_xml(&group.service)
        )
    }

    fn render_node<W: Write>(&self, out: &mut W, node: &LayoutNode) -> fmt::Result {
        let x = node.x;
        let y = node.y;
        let w = node.width;
        let header_h = self.metrics.header_height();

        writeln!(
            out,
            r#"<rect class="entity-bg" x="{}" y="{}" width="{}" height="{}" rx="4" />"#,
            x, y, w, node.height
        )?;

        if node.fields.is_empty() {
            writeln!(
                out,
                r#"<rect class="entity-header" x="{}" y="{}" width="{}" height="{}" rx="4" />"#,
                x, y, w, node.height
            )?;
        } else {
            // Header with square bottom corners
            writeln!(
                out,
                r#"<rect class="entity-header" x="{}" y="{}" width="{}" height="{}" rx="4" />"#,
                x, y, w, header_h
            )?;
            writeln!(
                out,
                r#"<rect class="entity-header" x="{}" y="{}" width="{}" height="{}" />"#,
                x,
                y + header_h - 4.0,
                w,
                4.0
            )?;
        }

        writeln!(
            out,
            r#"<text class="entity-name" x="{}" y="{}" text-anchor="middle">{}</text>"#,
            x + w / 2.0,
            y + header_h / 2.0 + 5.0,
            escape_xml(&node.id)
        )?;

        if !node.fields.is_empty() {
            writeln!(
                out,
                r##"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="#333" stroke-width="1" />"##,
                x,
                y + header_h,
                x + w,
                y + header_h
            )?;

            for (index, field) in node.fields.iter().enumerate() {
                let mut class = "column-text".to_string();
                if field.is_identity {
                    class.push_str(" pk");
                }
                if field.is_fk() {
                    class.push_str(" fk");
                }

                let prefix = if field.is_identity { "◆ " } else { "  " };
                let nullable = if field.nullable { "?" } else { "" };
                let text = format!("{}{}{}", prefix, TextMetrics::field_label(field), nullable);

                writeln!(
                    out,
                    r#"<text class="{}" x="{}" y="{}" dominant-baseline="middle">{}</text>"#,
                    class,
                    x + self.metrics.padding_x,
                    y + self.metrics.field_row_center(index),
                    escape_xml(&text)
                )?;
            }
        }

        // Border last so it sits on top
        writeln!(
            out,
            r#"<rect class="entity-border" x="{}" y="{}" width="{}" height="{}" rx="4" />"#,
            x, y, w, node.height
        )
    }

    /// Vertical anchor of `field` on `node`, or the node's centre.
    fn anchor_y(&self, node: &LayoutNode, field: Option<&str>) -> f64 {
        field
            .and_then(|name| node.fields.iter().position(|f| f.name == name))
            .map(|index| node.y + self.metrics.field_row_center(index))
            .unwrap_or(node.y + node.height / 2.0)
    }

    fn render_edge<W: Write>(
        &self,
        out: &mut W,
        edge: &LayoutEdge,
        source: &LayoutNode,
        target: &LayoutNode,
    ) -> fmt::Result {
        let y1 = self.anchor_y(source, edge.source_field.as_deref());
        let y2 = self.anchor_y(target, edge.target_field.as_deref());

        // Leave from the side facing the target; self references loop on the right.
        let (x1, x2, bend) = if edge.source == edge.target {
            let right = source.x + source.width;
            (right, right, 40.0)
        } else if source.x + source.width / 2.0 <= target.x + target.width / 2.0 {
            (source.x + source.width, target.x, 0.0)
        } else {
            (source.x, target.x + target.width, 0.0)
        };
        let pull = ((x2 - x1).abs() / 2.0).max(30.0) + bend;
        let (c1, c2) = if bend > 0.0 || x1 <= x2 {
            (x1 + pull, x2 + if bend > 0.0 { pull } else { -pull })
        } else {
            (x1 - pull, x2 + pull)
        };

        let style = &edge.style;
        let mut class = "edge".to_string();
        if style.animated {
            class.push_str(" animated");
        }
        let dash = if style.dashed && !style.animated {
            r#" stroke-dasharray="6 4""#
        } else {
            ""
        };

        writeln!(
            out,
            r#"<path class="{}" d="M {} {} C {} {}, {} {}, {} {}" stroke="{}" stroke-width="{}"{} />"#,
            class, x1, y1, c1, y1, c2, y2, x2, y2, style.stroke, style.stroke_width, dash
        )?;

        writeln!(
            out,
            r#"<text class="cardinality" x="{}" y="{}" text-anchor="middle">{}</text>"#,
            if x2 >= x1 { x2 - 8.0 } else { x2 + 8.0 },
            y2 - 5.0,
            cardinality_symbol(edge.cardinality)
        )?;

        if let Some(label) = &edge.label {
            writeln!(
                out,
                r#"<text class="edge-label" x="{}" y="{}" text-anchor="middle">{}</text>"#,
                (x1 + x2) / 2.0 + bend,
                (y1 + y2) / 2.0 - 5.0,
                escape_xml(label)
            )?;
        }
        Ok(())
    }
}

fn cardinality_symbol(c: Cardinality) -> &'static str {
    match c {
        Cardinality::One => "1",
        Cardinality::Many => "*",
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
