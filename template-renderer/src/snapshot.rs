//! Detached export snapshots of pages.
//!
//! A [`PageSnapshot`] is a self-contained static tree built from a page,
//! independent of any live view. It is mounted in a [`SnapshotHost`] for
//! the duration of rasterization; the returned [`MountGuard`] unmounts it
//! and disposes its charts when dropped, whether rendering succeeded or not.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use template_core::{ContainerBounds, ElementId, Geometry, GridMetrics, Page};

use crate::chart::{ChartHandle, ChartRegistry};
use crate::color::{safe_color, ColorRole};
use crate::element::{snapshot_content, TextStyle, CHART_PADDING, TEXT_PADDING};
use crate::error::RenderResult;

/// Static content of one snapshot node.
#[derive(Debug)]
pub enum SnapshotContent {
    /// Paragraph or heading.
    Text {
        /// Markup tag: `p`, `h1`, `h2` or `h3`.
        tag: &'static str,
        /// Text to lay out.
        text: String,
        /// Sanitized styling.
        style: TextStyle,
    },
    /// Static table.
    Table {
        /// Cell values, row-major.
        rows: Vec<Vec<String>>,
    },
    /// Embedded image.
    Image {
        /// A decodable `data:` URL.
        href: String,
    },
    /// Dashed "Placeholder Image" block.
    ImagePlaceholder,
    /// Chart drawn on an offscreen canvas.
    Chart(ChartHandle),
}

impl SnapshotContent {
    /// Inner padding of the block holding this content.
    #[must_use]
    pub const fn padding(&self) -> f32 {
        match self {
            Self::Text { .. } => TEXT_PADDING,
            Self::Table { .. } | Self::Chart(_) => CHART_PADDING,
            Self::Image { .. } | Self::ImagePlaceholder => 0.0,
        }
    }
}

/// One absolutely positioned element block.
#[derive(Debug)]
pub struct SnapshotNode {
    /// Source element.
    pub id: ElementId,
    /// Position and size relative to the cell.
    pub geometry: Geometry,
    /// Static content.
    pub content: SnapshotContent,
}

/// One grid cell with its element blocks.
#[derive(Debug)]
pub struct SnapshotCell {
    /// Cell name.
    pub name: String,
    /// Page-space bounds.
    pub bounds: ContainerBounds,
    /// Sanitized background color.
    pub background: String,
    /// Element blocks in document order.
    pub nodes: Vec<SnapshotNode>,
}

/// A detached page ready for rasterization.
#[derive(Debug)]
pub struct PageSnapshot {
    /// Page width in CSS pixels.
    pub width: f32,
    /// Page height in CSS pixels.
    pub height: f32,
    /// Sanitized page background.
    pub background: String,
    /// Cells in declaration order.
    pub cells: Vec<SnapshotCell>,
}

impl PageSnapshot {
    /// Number of element blocks across all cells.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.cells.iter().map(|c| c.nodes.len()).sum()
    }
}

/// Build the export snapshot of a page.
///
/// Elements whose cell is missing from the layout are skipped.
///
/// # Errors
///
/// Returns an error if the page layout is malformed or a chart cannot be
/// bound.
pub fn build_snapshot(
    page: &Page,
    metrics: &GridMetrics,
    registry: &ChartRegistry,
) -> RenderResult<PageSnapshot> {
    let layout = page.layout()?;
    let background = safe_color(&page.grid_color, ColorRole::Surface);

    let mut cells: Vec<SnapshotCell> = layout
        .place_containers(metrics)
        .into_iter()
        .map(|placed| SnapshotCell {
            name: placed.name,
            bounds: placed.bounds,
            background: background.clone(),
            nodes: Vec::new(),
        })
        .collect();

    for element in &page.elements {
        let Some(cell) = cells.iter_mut().find(|c| c.name == element.container_id) else {
            tracing::debug!(
                element = %element.id,
                container = %element.container_id,
                "Skipping element without a cell"
            );
            continue;
        };
        cell.nodes.push(SnapshotNode {
            id: element.id.clone(),
            geometry: element.geometry(),
            content: snapshot_content(element, registry)?,
        });
    }

    Ok(PageSnapshot {
        width: metrics.page_width,
        height: metrics.page_height,
        background: safe_color(&page.background_color, ColorRole::Surface),
        cells,
    })
}

/// Host that snapshots are mounted into while they are rasterized.
#[derive(Debug, Clone, Default)]
pub struct SnapshotHost {
    mounted: Arc<RwLock<HashMap<u64, usize>>>,
    next_id: Arc<AtomicU64>,
}

impl SnapshotHost {
    /// Create an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount a snapshot. It stays mounted until the guard is dropped.
    #[must_use]
    pub fn mount(&self, snapshot: PageSnapshot) -> MountGuard {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.mounted
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, snapshot.node_count());
        tracing::debug!(mount = id, nodes = snapshot.node_count(), "Snapshot mounted");
        MountGuard {
            host: self.clone(),
            id,
            snapshot,
        }
    }

    /// Number of snapshots currently mounted.
    #[must_use]
    pub fn mounted_count(&self) -> usize {
        self.mounted
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Keeps a snapshot mounted; unmounts and disposes it on drop.
#[derive(Debug)]
pub struct MountGuard {
    host: SnapshotHost,
    id: u64,
    snapshot: PageSnapshot,
}

impl MountGuard {
    /// The mounted snapshot.
    #[must_use]
    pub const fn snapshot(&self) -> &PageSnapshot {
        &self.snapshot
    }
}

impl Drop for MountGuard {
    fn drop(&mut self) {
        self.host
            .mounted
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
        tracing::debug!(mount = self.id, "Snapshot unmounted");
    }
}
