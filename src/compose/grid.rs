use kurbo::{Affine, Rect, Size, Vec2};

/// Cell geometry of a multi-panel page, in PDF points.
///
/// Cells are filled left to right, then top to bottom. Every cell is as large as the largest
/// panel in each dimension, and each panel is drawn unscaled and centered in its cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridLayout {
    /// Number of rows.
    pub rows: u32,
    /// Number of columns.
    pub columns: u32,
    /// Size shared by every cell.
    pub cell: Size,
}

impl GridLayout {
    /// Size the grid for panels of the given sizes.
    pub fn for_panels(rows: u32, columns: u32, panels: &[Size]) -> Self {
        let cell_w = panels.iter().map(|s| s.width).fold(0.0, f64::max);
        let cell_h = panels.iter().map(|s| s.height).fold(0.0, f64::max);
        Self {
            rows,
            columns,
            cell: Size::new(cell_w, cell_h),
        }
    }

    /// The composed page's media box.
    pub fn page_rect(&self) -> Rect {
        Rect::new(
            0.0,
            0.0,
            f64::from(self.columns) * self.cell.width,
            f64::from(self.rows) * self.cell.height,
        )
    }

    /// Rectangle of cell `index`, with row 0 at the top of the page.
    pub fn cell_rect(&self, index: usize) -> Rect {
        let cols = self.columns.max(1) as usize;
        let row = (index / cols) as f64;
        let col = (index % cols) as f64;
        let y_from_top = (row + 1.0) * self.cell.height;
        let origin = (col * self.cell.width, self.page_rect().height() - y_from_top);
        Rect::from_origin_size(origin, self.cell)
    }

    /// Transform placing a panel with media box `panel` centered in cell `index`.
    pub fn placement(&self, index: usize, panel: Rect) -> Affine {
        let cell = self.cell_rect(index);
        let offset = Vec2::new(
            cell.x0 + (cell.width() - panel.width()) / 2.0 - panel.x0,
            cell.y0 + (cell.height() - panel.height()) / 2.0 - panel.y0,
        );
        Affine::translate(offset)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/grid.rs"]
mod tests;
