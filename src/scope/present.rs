//! Copies the latest finished canvas onto whatever the user is looking at.
use std::sync::Arc;

use arc_swap::ArcSwap;
use derive_new::new;

use super::canvas::{Canvas, Rgb};

/// Anything a canvas can be blitted onto, pixel by pixel.
pub trait Surface {
    /// Width and height in pixels
    fn size(&self) -> (u32, u32);
    fn put(&mut self, x: u32, y: u32, color: Rgb);
}

impl Surface for Canvas {
    fn size(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    fn put(&mut self, x: u32, y: u32, color: Rgb) {
        self.set_pixel(x, y, color);
    }
}

/// Read-only handle on the accumulator's published frames. Cheap to clone and never takes the
/// shared lock.
#[derive(new, Clone)]
pub struct Presenter {
    frame: Arc<ArcSwap<Canvas>>,
}

impl Presenter {
    /// Copy the current frame verbatim, anchored top-left. Anything that doesn't overlap is left
    /// alone on the surface.
    pub fn present<S: Surface + ?Sized>(&self, surface: &mut S) {
        let frame = self.snapshot();
        let (width, height) = surface.size();
        for y in 0..height.min(frame.height()) {
            for x in 0..width.min(frame.width()) {
                if let Some(color) = frame.pixel(x, y) {
                    surface.put(x, y, color);
                }
            }
        }
    }

    /// The current frame, kept alive for as long as the caller holds it
    pub fn snapshot(&self) -> Arc<Canvas> {
        self.frame.load_full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::canvas::{BACKGROUND, CHANNEL_COLORS};

    fn presenter_for(canvas: Canvas) -> Presenter {
        Presenter::new(Arc::new(ArcSwap::from_pointee(canvas)))
    }

    #[test]
    fn test_present_is_verbatim() {
        let mut canvas = Canvas::new(8, 6);
        canvas.draw_line((0.0, 0.0), (7.0, 5.0), CHANNEL_COLORS[2]);
        canvas.draw_line((7.0, 0.0), (0.0, 5.0), CHANNEL_COLORS[5]);

        let presenter = presenter_for(canvas.clone());
        let mut screen = Canvas::new(8, 6);
        screen.fill(Rgb(1, 2, 3));
        presenter.present(&mut screen);
        assert_eq!(screen, canvas);
    }

    #[test]
    fn test_present_clips_to_smaller_surface() {
        let mut canvas = Canvas::new(8, 8);
        canvas.set_pixel(7, 7, CHANNEL_COLORS[0]);
        canvas.set_pixel(1, 1, CHANNEL_COLORS[1]);

        let mut screen = Canvas::new(4, 4);
        presenter_for(canvas).present(&mut screen);
        assert_eq!(screen.pixel(1, 1), Some(CHANNEL_COLORS[1]));
        assert_eq!(screen.pixel(3, 3), Some(BACKGROUND));
    }

    #[test]
    fn test_present_leaves_overhang_alone() {
        let mut screen = Canvas::new(4, 4);
        screen.fill(Rgb(9, 9, 9));
        presenter_for(Canvas::new(2, 2)).present(&mut screen);
        assert_eq!(screen.pixel(0, 0), Some(BACKGROUND));
        assert_eq!(screen.pixel(3, 3), Some(Rgb(9, 9, 9)));
    }
}
