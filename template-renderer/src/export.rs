//! Document export to PDF, PNG and SVG.
//!
//! Every page is rendered from a detached [`PageSnapshot`](crate::snapshot::PageSnapshot),
//! never from the live view: build the snapshot, mount it, yield one tick so
//! charts can paint, serialize to SVG and rasterize with resvg/tiny-skia.
//! The mount guard unmounts the snapshot and disposes its charts on success
//! and failure alike. PDF output places one full-bleed bitmap per A4 page.

use std::fmt;
use std::str::FromStr;

use template_core::{GridMetrics, Page};

use crate::chart::ChartRegistry;
use crate::error::{RenderError, RenderResult};
use crate::snapshot::{build_snapshot, SnapshotHost};
use crate::svg::render_snapshot_svg;

/// Default name of an exported document.
pub const DEFAULT_EXPORT_FILENAME: &str = "template.pdf";

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Multi-page PDF document with one raster image per page.
    #[default]
    Pdf,
    /// PNG image of a single page.
    Png,
    /// SVG of a single page's snapshot.
    Svg,
}

impl ExportFormat {
    /// File extension for the format.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "png" => Ok(Self::Png),
            "svg" => Ok(Self::Svg),
            _ => Err(format!("Unknown export format: {s}")),
        }
    }
}

/// Configuration for document export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    /// Page width in CSS pixels.
    pub page_width: f32,
    /// Page height in CSS pixels.
    pub page_height: f32,
    /// Page padding in CSS pixels.
    pub padding: f32,
    /// Gap between cells in CSS pixels.
    pub gap: f32,
    /// Minimum cell height in CSS pixels.
    pub min_cell_height: f32,
    /// Device pixel ratio used for rasterization.
    pub scale: f32,
    /// PDF page width in millimetres.
    pub page_width_mm: f32,
    /// PDF page height in millimetres.
    pub page_height_mm: f32,
    /// PDF document title.
    pub title: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        let metrics = GridMetrics::A4;
        Self {
            page_width: metrics.page_width,
            page_height: metrics.page_height,
            padding: metrics.padding,
            gap: metrics.gap,
            min_cell_height: metrics.min_cell_height,
            scale: 2.0,
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            title: "Template".to_string(),
        }
    }
}

impl ExportConfig {
    /// Grid metrics of the exported page.
    #[must_use]
    pub const fn metrics(&self) -> GridMetrics {
        GridMetrics {
            page_width: self.page_width,
            page_height: self.page_height,
            padding: self.padding,
            gap: self.gap,
            min_cell_height: self.min_cell_height,
        }
    }
}

/// Turns an SVG document into PNG bytes.
pub trait Rasterizer {
    /// Rasterize `svg` at the size given by its root `width`/`height`.
    ///
    /// # Errors
    ///
    /// Returns an error if the SVG cannot be parsed or encoded.
    fn rasterize(&self, svg: &str) -> RenderResult<Vec<u8>>;
}

/// Rasterizer backed by usvg, resvg and tiny-skia.
pub struct ResvgRasterizer {
    options: usvg::Options<'static>,
}

impl ResvgRasterizer {
    /// Create a rasterizer with the system fonts loaded.
    #[must_use]
    pub fn new() -> Self {
        let mut options = usvg::Options::default();
        options.fontdb_mut().load_system_fonts();
        Self { options }
    }
}

impl Default for ResvgRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer for ResvgRasterizer {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn rasterize(&self, svg: &str) -> RenderResult<Vec<u8>> {
        let tree = usvg::Tree::from_str(svg, &self.options)
            .map_err(|e| RenderError::ExportFailed(format!("SVG parsing failed: {e}")))?;

        let px_w = tree.size().width() as u32;
        let px_h = tree.size().height() as u32;

        let mut pixmap = tiny_skia::Pixmap::new(px_w.max(1), px_h.max(1))
            .ok_or_else(|| RenderError::ExportFailed("Failed to create pixmap".to_string()))?;
        pixmap.fill(tiny_skia::Color::WHITE);

        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        pixmap
            .encode_png()
            .map_err(|e| RenderError::ExportFailed(format!("PNG encoding failed: {e}")))
    }
}

/// Exports template documents.
pub struct TemplateExporter<R = ResvgRasterizer> {
    config: ExportConfig,
    rasterizer: R,
    registry: ChartRegistry,
    host: SnapshotHost,
}

impl TemplateExporter<ResvgRasterizer> {
    /// Create an exporter with the resvg rasterizer.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        Self::with_rasterizer(config, ResvgRasterizer::new())
    }

    /// Create an exporter with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ExportConfig::default())
    }
}

impl<R: Rasterizer> TemplateExporter<R> {
    /// Create an exporter with a custom rasterizer.
    #[must_use]
    pub fn with_rasterizer(config: ExportConfig, rasterizer: R) -> Self {
        Self {
            config,
            rasterizer,
            registry: ChartRegistry::new(),
            host: SnapshotHost::new(),
        }
    }

    /// Export configuration.
    #[must_use]
    pub const fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Host snapshots are mounted into during export.
    #[must_use]
    pub const fn host(&self) -> &SnapshotHost {
        &self.host
    }

    /// Registry of the offscreen charts drawn during export.
    #[must_use]
    pub const fn registry(&self) -> &ChartRegistry {
        &self.registry
    }

    /// Export a document.
    ///
    /// PDF covers every page; PNG and SVG render `page_index` only.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ExportFailed`] if any page fails to render or
    /// `page_index` is out of range. No partial output is produced.
    pub async fn export(
        &self,
        pages: &[Page],
        format: ExportFormat,
        page_index: usize,
    ) -> RenderResult<Vec<u8>> {
        match format {
            ExportFormat::Pdf => self.export_pdf(pages).await,
            ExportFormat::Png => {
                let page = Self::page_at(pages, page_index)?;
                self.render_page_png(page).await
            }
            ExportFormat::Svg => {
                let page = Self::page_at(pages, page_index)?;
                self.render_page_svg(page).map(String::into_bytes)
            }
        }
    }

    fn page_at(pages: &[Page], index: usize) -> RenderResult<&Page> {
        pages.get(index).ok_or_else(|| {
            RenderError::ExportFailed(format!(
                "page {} out of range ({} pages)",
                index + 1,
                pages.len()
            ))
        })
    }

    /// Serialize one page's snapshot to SVG.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ExportFailed`] if the snapshot cannot be built.
    pub fn render_page_svg(&self, page: &Page) -> RenderResult<String> {
        let snapshot = build_snapshot(page, &self.config.metrics(), &self.registry)
            .map_err(export_failed)?;
        let guard = self.host.mount(snapshot);
        Ok(render_snapshot_svg(guard.snapshot(), self.config.scale))
    }

    /// Render one page to PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ExportFailed`] if the snapshot cannot be built
    /// or rasterized.
    pub async fn render_page_png(&self, page: &Page) -> RenderResult<Vec<u8>> {
        let snapshot = build_snapshot(page, &self.config.metrics(), &self.registry)
            .map_err(export_failed)?;
        let guard = self.host.mount(snapshot);

        // Let offscreen charts paint before capture.
        tokio::task::yield_now().await;

        let svg = render_snapshot_svg(guard.snapshot(), self.config.scale);
        let png = self.rasterizer.rasterize(&svg).map_err(export_failed)?;
        drop(guard);
        Ok(png)
    }

    /// Export every page into one PDF document.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ExportFailed`] if the document is empty or any
    /// page fails.
    pub async fn export_pdf(&self, pages: &[Page]) -> RenderResult<Vec<u8>> {
        if pages.is_empty() {
            return Err(RenderError::ExportFailed("document has no pages".to_string()));
        }

        let mut bitmaps = Vec::with_capacity(pages.len());
        for (index, page) in pages.iter().enumerate() {
            let png = self.render_page_png(page).await.map_err(|e| {
                tracing::warn!(page = index + 1, error = %e, "Page export failed");
                RenderError::ExportFailed(format!("page {}: {}", index + 1, strip_prefix(&e)))
            })?;
            bitmaps.push(png);
        }

        let pdf = self.assemble_pdf(&bitmaps)?;
        tracing::info!(pages = pages.len(), bytes = pdf.len(), "PDF exported");
        Ok(pdf)
    }

    /// Place one bitmap per page, full-bleed, in a new PDF.
    #[allow(clippy::cast_precision_loss)]
    fn assemble_pdf(&self, bitmaps: &[Vec<u8>]) -> RenderResult<Vec<u8>> {
        let (w_mm, h_mm) = (self.config.page_width_mm, self.config.page_height_mm);
        let (doc, first_page, first_layer) = printpdf::PdfDocument::new(
            self.config.title.as_str(),
            printpdf::Mm(w_mm),
            printpdf::Mm(h_mm),
            "Layer 1",
        );

        for (index, png) in bitmaps.iter().enumerate() {
            let (page, layer) = if index == 0 {
                (first_page, first_layer)
            } else {
                doc.add_page(printpdf::Mm(w_mm), printpdf::Mm(h_mm), format!("Page {}", index + 1))
            };
            let current_layer = doc.get_page(page).get_layer(layer);

            let decoded = printpdf::image_crate::load_from_memory(png).map_err(|e| {
                RenderError::ExportFailed(format!("Failed to decode PNG for PDF: {e}"))
            })?;
            let pixels = decoded.to_rgb8();
            let dpi = pixels.width() as f32 / (w_mm / 25.4);
            let rgb = printpdf::image_crate::DynamicImage::ImageRgb8(pixels);

            printpdf::Image::from_dynamic_image(&rgb).add_to_layer(
                current_layer,
                printpdf::ImageTransform {
                    translate_x: Some(printpdf::Mm(0.0)),
                    translate_y: Some(printpdf::Mm(0.0)),
                    dpi: Some(dpi),
                    ..Default::default()
                },
            );
        }

        doc.save_to_bytes()
            .map_err(|e| RenderError::ExportFailed(format!("PDF save failed: {e}")))
    }
}

/// Output filename for an export: the caller's name, or `template.<ext>`.
#[must_use]
pub fn output_filename(requested: Option<&str>, format: ExportFormat) -> String {
    match requested.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => name.to_string(),
        None => format!("template.{}", format.extension()),
    }
}

fn export_failed(error: RenderError) -> RenderError {
    match error {
        RenderError::ExportFailed(_) => error,
        other => RenderError::ExportFailed(other.to_string()),
    }
}

fn strip_prefix(error: &RenderError) -> String {
    match error {
        RenderError::ExportFailed(message) => message.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingRasterizer;

    impl Rasterizer for FailingRasterizer {
        fn rasterize(&self, _svg: &str) -> RenderResult<Vec<u8>> {
            Err(RenderError::Resource("device lost".to_string()))
        }
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("PDF".parse::<ExportFormat>(), Ok(ExportFormat::Pdf));
        assert_eq!("svg".parse::<ExportFormat>(), Ok(ExportFormat::Svg));
        assert!("jpeg".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_output_filename() {
        assert_eq!(output_filename(None, ExportFormat::Pdf), DEFAULT_EXPORT_FILENAME);
        assert_eq!(output_filename(Some("  "), ExportFormat::Png), "template.png");
        assert_eq!(output_filename(Some("report.pdf"), ExportFormat::Pdf), "report.pdf");
    }

    #[test]
    fn test_default_config_matches_a4() {
        let config = ExportConfig::default();
        assert_eq!(config.metrics(), GridMetrics::A4);
        assert_eq!(config.scale, 2.0);
    }

    #[tokio::test]
    async fn test_png_export_produces_valid_bytes() {
        let exporter = TemplateExporter::new(ExportConfig {
            scale: 0.25,
            ..ExportConfig::default()
        });
        let png = exporter.render_page_png(&Page::default()).await.expect("png");
        assert_eq!(&png[0..4], &[137, 80, 78, 71]);
        assert_eq!(exporter.host().mounted_count(), 0);
    }

    #[tokio::test]
    async fn test_rasterizer_failure_is_export_failed() {
        let exporter = TemplateExporter::with_rasterizer(ExportConfig::default(), FailingRasterizer);
        let err = exporter
            .export_pdf(&[Page::default(), Page::default()])
            .await
            .expect_err("must fail");
        assert!(matches!(err, RenderError::ExportFailed(ref m) if m.contains("page 1")));
        assert_eq!(exporter.host().mounted_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_document_rejected() {
        let exporter = TemplateExporter::with_rasterizer(ExportConfig::default(), FailingRasterizer);
        assert!(matches!(
            exporter.export_pdf(&[]).await,
            Err(RenderError::ExportFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_page_index_out_of_range() {
        let exporter = TemplateExporter::with_rasterizer(ExportConfig::default(), FailingRasterizer);
        let err = exporter
            .export(&[Page::default()], ExportFormat::Svg, 3)
            .await
            .expect_err("out of range");
        assert!(err.to_string().contains("page 4"));
    }
}
