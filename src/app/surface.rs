//! Terminal cells as a pixel surface.
//!
//! Each cell holds two pixels stacked vertically using the upper half block: the glyph's
//! foreground is the top pixel and the cell background shows through as the bottom one.
use ratatui::{buffer::Buffer, layout::Rect};

use crate::scope::{canvas::Rgb, present::Surface};

const UPPER_HALF: char = '▀';

pub struct TerminalSurface<'a> {
    area: Rect,
    buf: &'a mut Buffer,
}

impl<'a> TerminalSurface<'a> {
    pub fn new(area: Rect, buf: &'a mut Buffer) -> Self {
        Self { area, buf }
    }

    /// Pixel dimensions a canvas needs to fill `area` exactly
    pub fn pixel_size(area: Rect) -> (u32, u32) {
        (area.width as u32, area.height as u32 * 2)
    }
}

impl Surface for TerminalSurface<'_> {
    fn size(&self) -> (u32, u32) {
        Self::pixel_size(self.area)
    }

    fn put(&mut self, x: u32, y: u32, color: Rgb) {
        let (width, height) = self.size();
        if x >= width || y >= height {
            return;
        }
        let position = (self.area.x + x as u16, self.area.y + (y / 2) as u16);
        if let Some(cell) = self.buf.cell_mut(position) {
            cell.set_char(UPPER_HALF);
            if y % 2 == 0 {
                cell.set_fg(color.into());
            } else {
                cell.set_bg(color.into());
            }
        }
    }
}
