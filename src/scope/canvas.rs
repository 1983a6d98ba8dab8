//! A plain RGB raster that trace segments accumulate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl From<Rgb> for ratatui::style::Color {
    fn from(Rgb(r, g, b): Rgb) -> Self {
        Self::Rgb(r, g, b)
    }
}

pub const BACKGROUND: Rgb = Rgb(0, 0, 0);
/// Subtle, so traces stay readable over it
pub const GRID: Rgb = Rgb(40, 40, 40);

/// One color per channel, in channel order
pub const CHANNEL_COLORS: [Rgb; super::MAX_CHANNELS] = [
    Rgb(255, 0, 0),
    Rgb(255, 255, 0),
    Rgb(0, 255, 0),
    Rgb(0, 255, 234),
    Rgb(89, 89, 247),
    Rgb(240, 15, 247),
    Rgb(252, 187, 24),
    Rgb(101, 240, 197),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![BACKGROUND; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        (x < self.width && y < self.height).then(|| self.pixels[self.index(x, y)])
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgb) {
        if x < self.width && y < self.height {
            let i = self.index(x, y);
            self.pixels[i] = color;
        }
    }

    pub fn fill(&mut self, color: Rgb) {
        self.pixels.fill(color);
    }

    /// Bresenham between two points in canvas space. Endpoints are rounded to the nearest pixel
    /// and pulled inside the canvas, so a sample sitting exactly on the bottom or right edge still
    /// lands on the last row or column.
    pub fn draw_line(&mut self, from: (f32, f32), to: (f32, f32), color: Rgb) {
        if self.pixels.is_empty() {
            return;
        }
        let (mut x0, mut y0) = self.snap(from);
        let (x1, y1) = self.snap(to);

        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.set_pixel(x0 as u32, y0 as u32, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    fn snap(&self, (x, y): (f32, f32)) -> (i64, i64) {
        let clamp = |v: f32, max: u32| (v.round() as i64).clamp(0, max as i64 - 1);
        (clamp(x, self.width), clamp(y, self.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb = Rgb(255, 0, 0);

    fn lit(canvas: &Canvas) -> Vec<(u32, u32)> {
        let mut out = vec![];
        for y in 0..canvas.height() {
            for x in 0..canvas.width() {
                if canvas.pixel(x, y) != Some(BACKGROUND) {
                    out.push((x, y));
                }
            }
        }
        out
    }

    #[test]
    fn test_line_hits_both_endpoints() {
        let mut canvas = Canvas::new(10, 10);
        canvas.draw_line((1.0, 1.0), (7.0, 4.0), RED);
        let lit = lit(&canvas);
        assert!(lit.contains(&(1, 1)));
        assert!(lit.contains(&(7, 4)));
        // One pixel per column on a shallow line
        assert_eq!(lit.len(), 7);
    }

    #[test]
    fn test_line_is_symmetric() {
        let mut forward = Canvas::new(16, 16);
        let mut backward = Canvas::new(16, 16);
        forward.draw_line((0.0, 0.0), (15.0, 15.0), RED);
        backward.draw_line((15.0, 15.0), (0.0, 0.0), RED);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_line_clamps_to_edges() {
        let mut canvas = Canvas::new(4, 4);
        canvas.draw_line((-5.0, 4.0), (100.0, 4.0), RED);
        assert_eq!(lit(&canvas), vec![(0, 3), (1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn test_out_of_bounds_access() {
        let mut canvas = Canvas::new(2, 2);
        canvas.set_pixel(5, 5, RED);
        assert_eq!(canvas.pixel(5, 5), None);
        assert_eq!(lit(&canvas), vec![]);
    }
}
