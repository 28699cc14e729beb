//! SVG serialization of page snapshots.
//!
//! The SVG is the intermediate the rasterizer consumes: its `width` and
//! `height` are the output size in device pixels and its `viewBox` is the
//! page in CSS pixels.

use std::fmt::Write;

use crate::element::TextStyle;
use crate::snapshot::{PageSnapshot, SnapshotContent, SnapshotNode};

/// Line height as a multiple of the font size.
const LINE_HEIGHT: f32 = 1.4;

/// Average glyph advance as a multiple of the font size.
const GLYPH_ADVANCE: f32 = 0.55;

const BLOCK_BORDER: &str = "#e5e7eb";
const TABLE_FONT_SIZE: f32 = 10.0;
const TABLE_CELL_PADDING: f32 = 2.0;

/// Serialize a snapshot to SVG at the given device pixel ratio.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn render_snapshot_svg(snapshot: &PageSnapshot, scale: f32) -> String {
    let out_w = ((snapshot.width * scale) as u32).max(1);
    let out_h = ((snapshot.height * scale) as u32).max(1);

    let mut svg = String::with_capacity(8192);
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{out_w}\" height=\"{out_h}\" viewBox=\"0 0 {} {}\">",
        snapshot.width, snapshot.height,
    );
    let _ = write!(
        svg,
        "<rect width=\"{}\" height=\"{}\" fill=\"{}\"/>",
        snapshot.width,
        snapshot.height,
        escape_xml(&snapshot.background),
    );

    let mut clip_id = 0_usize;
    for cell in &snapshot.cells {
        let b = &cell.bounds;
        let _ = write!(
            svg,
            "<g data-cell=\"{}\"><rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\"/>",
            escape_xml(&cell.name),
            b.left,
            b.top,
            b.width,
            b.height,
            escape_xml(&cell.background),
        );
        for node in &cell.nodes {
            render_node(&mut svg, node, b.left, b.top, clip_id);
            clip_id += 1;
        }
        svg.push_str("</g>");
    }

    svg.push_str("</svg>");
    svg
}

fn render_node(svg: &mut String, node: &SnapshotNode, origin_x: f32, origin_y: f32, clip_id: usize) {
    let g = node.geometry;
    let (x, y) = (origin_x + g.x, origin_y + g.y);
    let _ = write!(
        svg,
        "<clipPath id=\"clip{clip_id}\"><rect x=\"{x}\" y=\"{y}\" width=\"{}\" height=\"{}\" rx=\"6\"/></clipPath>",
        g.width, g.height,
    );
    let _ = write!(
        svg,
        "<g data-element=\"{}\" clip-path=\"url(#clip{clip_id})\"><rect x=\"{x}\" y=\"{y}\" width=\"{}\" height=\"{}\" rx=\"6\" fill=\"#ffffff\" stroke=\"{BLOCK_BORDER}\" stroke-width=\"1\"/>",
        escape_xml(node.id.as_str()),
        g.width,
        g.height,
    );

    let pad = node.content.padding();
    let (cx, cy) = (x + pad, y + pad);
    let (cw, ch) = ((g.width - pad * 2.0).max(0.0), (g.height - pad * 2.0).max(0.0));

    match &node.content {
        SnapshotContent::Text { tag, text, style } => {
            render_text(svg, tag, text, style, cx, cy, cw, ch);
        }
        SnapshotContent::Table { rows } => render_table(svg, rows, cx, cy, cw),
        SnapshotContent::Image { href } => {
            let _ = write!(
                svg,
                "<image x=\"{cx}\" y=\"{cy}\" width=\"{cw}\" height=\"{ch}\" preserveAspectRatio=\"xMidYMid meet\" xlink:href=\"{}\"/>",
                escape_xml(href),
            );
        }
        SnapshotContent::ImagePlaceholder => {
            let _ = write!(
                svg,
                "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"none\" stroke=\"#d1d5db\" stroke-width=\"2\" stroke-dasharray=\"6,4\"/><text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"#9ca3af\" text-anchor=\"middle\" font-family=\"sans-serif\">Placeholder Image</text>",
                cx + 1.0,
                cy + 1.0,
                (cw - 2.0).max(0.0),
                (ch - 2.0).max(0.0),
                cx + cw / 2.0,
                cy + ch / 2.0 + 4.0,
            );
        }
        SnapshotContent::Chart(handle) => {
            let _ = write!(svg, "<g transform=\"translate({cx},{cy})\">{}</g>", handle.svg());
        }
    }

    svg.push_str("</g>");
}

#[allow(clippy::too_many_arguments)]
fn render_text(
    svg: &mut String,
    tag: &str,
    text: &str,
    style: &TextStyle,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
) {
    let size = style.font_size;
    let line_height = size * LINE_HEIGHT;
    let weight = if style.bold { "bold" } else { "normal" };
    let font_style = if style.italic { "italic" } else { "normal" };

    let _ = write!(
        svg,
        "<text data-tag=\"{tag}\" font-size=\"{size}\" font-weight=\"{weight}\" font-style=\"{font_style}\" fill=\"{}\" font-family=\"sans-serif\">",
        escape_xml(&style.color),
    );
    let mut baseline = y + size;
    for line in wrap_text(text, width, size) {
        if baseline - size > y + height {
            break;
        }
        let _ = write!(
            svg,
            "<tspan x=\"{x}\" y=\"{baseline}\">{}</tspan>",
            escape_xml(&line),
        );
        baseline += line_height;
    }
    svg.push_str("</text>");
}

#[allow(clippy::cast_precision_loss)]
fn render_table(svg: &mut String, rows: &[Vec<String>], x: f32, y: f32, width: f32) {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    if columns == 0 {
        return;
    }
    let col_w = width / columns as f32;
    let row_h = TABLE_FONT_SIZE * LINE_HEIGHT + TABLE_CELL_PADDING * 2.0;

    for (r, row) in rows.iter().enumerate() {
        let ry = y + row_h * r as f32;
        for c in 0..columns {
            let rx = x + col_w * c as f32;
            let _ = write!(
                svg,
                "<rect x=\"{rx}\" y=\"{ry}\" width=\"{col_w}\" height=\"{row_h}\" fill=\"none\" stroke=\"{BLOCK_BORDER}\" stroke-width=\"1\"/>",
            );
            let value = row.get(c).map_or("", String::as_str);
            if value.is_empty() {
                continue;
            }
            let fits = wrap_text(value, col_w - TABLE_CELL_PADDING * 2.0, TABLE_FONT_SIZE);
            let _ = write!(
                svg,
                "<text x=\"{}\" y=\"{}\" font-size=\"{TABLE_FONT_SIZE}\" fill=\"#000000\" font-family=\"sans-serif\">{}</text>",
                rx + TABLE_CELL_PADDING,
                ry + TABLE_CELL_PADDING + TABLE_FONT_SIZE,
                escape_xml(fits.first().map_or("", String::as_str)),
            );
        }
    }
}

/// Greedy word wrap using an average glyph width. Words longer than a line
/// are broken.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn wrap_text(text: &str, width: f32, font_size: f32) -> Vec<String> {
    let max_chars = ((width / (font_size * GLYPH_ADVANCE)).floor() as usize).max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut line_len = 0_usize;
        for word in paragraph.split_whitespace() {
            let mut chars: Vec<char> = word.chars().collect();
            while !chars.is_empty() {
                let room = if line_len == 0 { max_chars } else { max_chars.saturating_sub(line_len + 1) };
                if chars.len() <= room {
                    if line_len > 0 {
                        line.push(' ');
                        line_len += 1;
                    }
                    line.extend(chars.iter());
                    line_len += chars.len();
                    chars.clear();
                } else if line_len > 0 {
                    lines.push(std::mem::take(&mut line));
                    line_len = 0;
                } else {
                    let rest = chars.split_off(max_chars);
                    lines.push(chars.iter().collect());
                    chars = rest;
                }
            }
        }
        lines.push(line);
    }

    lines
}

/// Escape special XML characters.
#[must_use]
pub fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
