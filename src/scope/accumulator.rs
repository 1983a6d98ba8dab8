//! Draws drained batches onto the persistent canvas and publishes finished frames.
//!
//! The accumulator is the only thing that ever writes to the canvas. It keeps its working copy to
//! itself and hands readers a fresh snapshot through an [`ArcSwap`] once a whole drain has been
//! drawn, so a presenter can never observe a half-drawn frame.
use std::sync::Arc;

use arc_swap::ArcSwap;

use super::{
    Batch, MAX_CHANNELS, Point,
    canvas::{BACKGROUND, CHANNEL_COLORS, Canvas, GRID},
    present::Presenter,
    scale::ScaleParameters,
};

pub struct CanvasAccumulator {
    canvas: Canvas,
    params: ScaleParameters,
    /// Where each channel's trace currently ends. `None` until a sample lands after a clear.
    last: [Option<Point>; MAX_CHANNELS],
    published: Arc<ArcSwap<Canvas>>,
}

impl CanvasAccumulator {
    pub fn new(params: &ScaleParameters) -> Self {
        let mut acc = Self {
            canvas: Canvas::new(params.width(), params.height()),
            params: *params,
            last: [None; MAX_CHANNELS],
            published: Arc::new(ArcSwap::from_pointee(Canvas::new(0, 0))),
        };
        acc.wipe();
        acc.publish();
        acc
    }

    /// Throw the canvas away and start over at the new geometry.
    pub fn reallocate(&mut self, params: &ScaleParameters) {
        self.canvas = Canvas::new(params.width(), params.height());
        self.params = *params;
        self.wipe();
        self.publish();
    }

    /// Draw batches in order, returning how many segments were drawn.
    ///
    /// A batch that ends a sweep is drawn first and *then* the canvas is wiped, so the tail of the
    /// old sweep is never joined to the head of the new one.
    pub fn render(&mut self, batches: &[Batch]) -> usize {
        if batches.is_empty() {
            return 0;
        }

        let mut segments = 0;
        for batch in batches {
            for (i, point) in batch.points.iter().enumerate() {
                if let Some(prev) = self.last[i] {
                    self.canvas
                        .draw_line((prev.x, prev.y), (point.x, point.y), CHANNEL_COLORS[i]);
                    segments += 1;
                }
                self.last[i] = Some(*point);
            }
            if batch.ends_sweep {
                self.wipe();
            }
        }
        self.publish();
        segments
    }

    #[cfg(test)]
    pub fn last_points(&self) -> &[Option<Point>; MAX_CHANNELS] {
        &self.last
    }

    pub fn presenter(&self) -> Presenter {
        Presenter::new(self.published.clone())
    }

    /// Clear to background, then lay down the interior grid lines (no border).
    fn wipe(&mut self) {
        self.canvas.fill(BACKGROUND);
        let (w, h) = (self.params.width() as f32, self.params.height() as f32);
        let config = self.params.config();
        for i in 1..config.rows {
            let y = i as f32 * self.params.y_step();
            self.canvas.draw_line((0.0, y), (w, y), GRID);
        }
        for i in 1..config.cols {
            let x = i as f32 * self.params.x_step();
            self.canvas.draw_line((x, 0.0), (x, h), GRID);
        }
        self.last = [None; MAX_CHANNELS];
    }

    fn publish(&self) {
        self.published.store(Arc::new(self.canvas.clone()));
    }
}
