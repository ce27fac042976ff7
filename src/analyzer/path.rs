//! Spectrum -> polyline conversion for the analyzer display.

use crate::dsp::utils::{map_from_log10, map_range, DISPLAY_MAX_HZ, DISPLAY_MIN_HZ};
use crate::fifo::{Fifo, FifoConsumer, FifoProducer};

/// Extra room below the bottom edge for the floor level, in display units.
const FLOOR_MARGIN: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathElement {
    MoveTo(Point),
    LineTo(Point),
}

/// Display rectangle. `y` grows downward, so `bottom()` is the larger value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn with_trimmed_top(&self, amount: f32) -> Self {
        Self::new(self.x, self.y + amount, self.width, (self.height - amount).max(0.0))
    }

    pub fn with_trimmed_bottom(&self, amount: f32) -> Self {
        Self::new(self.x, self.y, self.width, (self.height - amount).max(0.0))
    }

    pub fn reduced_horizontally(&self, amount: f32) -> Self {
        Self::new(
            self.x + amount,
            self.y,
            (self.width - 2.0 * amount).max(0.0),
            self.height,
        )
    }
}

/// A polyline made of sub-paths. Capacity is reused across `clear()` calls.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalyzerPath {
    elements: Vec<PathElement>,
}

impl AnalyzerPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            elements: Vec::with_capacity(capacity),
        }
    }

    pub fn start_new_sub_path(&mut self, point: Point) {
        self.elements.push(PathElement::MoveTo(point));
    }

    pub fn line_to(&mut self, point: Point) {
        self.elements.push(PathElement::LineTo(point));
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn elements(&self) -> &[PathElement] {
        &self.elements
    }

    /// Copy of the path moved by `(dx, dy)`.
    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        let shift = |p: Point| Point::new(p.x + dx, p.y + dy);
        Self {
            elements: self
                .elements
                .iter()
                .map(|e| match *e {
                    PathElement::MoveTo(p) => PathElement::MoveTo(shift(p)),
                    PathElement::LineTo(p) => PathElement::LineTo(shift(p)),
                })
                .collect(),
        }
    }
}

/// Maps dB spectra onto a log-frequency polyline and queues the result.
pub struct AnalyzerPathGenerator {
    resolution: usize,
    scratch: AnalyzerPath,
    producer: FifoProducer<AnalyzerPath>,
    consumer: FifoConsumer<AnalyzerPath>,
}

impl AnalyzerPathGenerator {
    /// `resolution` is the bin stride and must be at least 1.
    pub fn new(resolution: usize, capacity: usize) -> Self {
        assert!(resolution >= 1, "path resolution must be >= 1");
        let (producer, consumer) = Fifo::new(capacity, AnalyzerPath::new()).split();
        Self {
            resolution,
            scratch: AnalyzerPath::new(),
            producer,
            consumer,
        }
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Builds the path for one spectrum inside `bounds` and queues it.
    /// X positions are relative to the left edge of `bounds`.
    pub fn generate_path(
        &mut self,
        render_data: &[f32],
        bounds: Rect,
        fft_size: usize,
        bin_width: f32,
        floor_db: f32,
    ) -> bool {
        let top = bounds.y;
        let bottom = bounds.bottom();
        let width = bounds.width;
        let num_bins = (fft_size / 2).min(render_data.len());

        let map = |v: f32| map_range(v, floor_db, 0.0, bottom + FLOOR_MARGIN, top);

        self.scratch.clear();
        if num_bins == 0 {
            return false;
        }

        let mut y = map(render_data[0]);
        if !y.is_finite() {
            y = bottom;
        }
        self.scratch.start_new_sub_path(Point::new(0.0, y));

        for bin in (1..num_bins).step_by(self.resolution) {
            let y = map(render_data[bin]);
            if !y.is_finite() {
                continue;
            }
            let freq = bin as f32 * bin_width;
            let norm_x = map_from_log10(freq, DISPLAY_MIN_HZ, DISPLAY_MAX_HZ);
            self.scratch
                .line_to(Point::new((norm_x * width).floor(), y));
        }

        self.producer.push(&self.scratch)
    }

    pub fn num_paths_available(&self) -> usize {
        self.consumer.available_for_reading()
    }

    pub fn get_path(&mut self, out: &mut AnalyzerPath) -> bool {
        self.consumer.pull(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Rect {
        Rect::new(0.0, 0.0, 400.0, 100.0)
    }

    fn generate(render_data: &[f32], resolution: usize) -> AnalyzerPath {
        let mut gen = AnalyzerPathGenerator::new(resolution, 4);
        assert!(gen.generate_path(render_data, bounds(), render_data.len() * 2, 20.0, -48.0));
        let mut path = AnalyzerPath::new();
        assert!(gen.get_path(&mut path));
        path
    }

    #[test]
    fn test_levels_map_between_floor_and_top() {
        let path = generate(&[-48.0, 0.0, -24.0], 1);
        let points: Vec<Point> = path
            .elements()
            .iter()
            .map(|e| match *e {
                PathElement::MoveTo(p) | PathElement::LineTo(p) => p,
            })
            .collect();

        assert!(matches!(path.elements()[0], PathElement::MoveTo(_)));
        assert_eq!(points[0], Point::new(0.0, 110.0));
        assert_eq!(points[1].y, 0.0);
        assert_eq!(points[2].y, 55.0);
        // Bin 1 at 20 Hz sits on the left edge
        assert_eq!(points[1].x, 0.0);
    }

    #[test]
    fn test_non_finite_bins_are_skipped() {
        let data = [f32::NAN, -12.0, f32::INFINITY, -6.0, f32::NAN, -3.0];
        let path = generate(&data, 1);

        // First bin replaced by the bottom edge, bins 2 and 4 dropped
        assert_eq!(path.elements()[0], PathElement::MoveTo(Point::new(0.0, 100.0)));
        assert_eq!(path.len(), 4);
        assert!(path
            .elements()
            .iter()
            .skip(1)
            .all(|e| matches!(e, PathElement::LineTo(_))));
    }

    #[test]
    fn test_resolution_strides_bins() {
        let data = vec![-20.0; 64];
        let every = generate(&data, 1);
        let every_other = generate(&data, 2);
        assert_eq!(every.len(), 64);
        // MoveTo plus bins 1, 3, ..., 63
        assert_eq!(every_other.len(), 1 + 32);
    }

    #[test]
    fn test_x_is_log_frequency() {
        // 1024 bins of 20 Hz: bin 1000 is 20 kHz, the right edge
        let mut data = vec![-48.0; 1024];
        data[1000] = 0.0;
        let path = generate(&data, 1);
        let hit = path
            .elements()
            .iter()
            .find_map(|e| match *e {
                PathElement::LineTo(p) if p.y == 0.0 => Some(p),
                _ => None,
            })
            .unwrap();
        assert_eq!(hit.x, 400.0);
    }

    #[test]
    fn test_translated_moves_every_point() {
        let mut path = AnalyzerPath::new();
        path.start_new_sub_path(Point::new(0.0, 1.0));
        path.line_to(Point::new(2.0, 3.0));
        let moved = path.translated(10.0, 20.0);
        assert_eq!(
            moved.elements(),
            &[
                PathElement::MoveTo(Point::new(10.0, 21.0)),
                PathElement::LineTo(Point::new(12.0, 23.0)),
            ]
        );
    }

    #[test]
    fn test_rect_helpers() {
        let r = Rect::new(0.0, 0.0, 200.0, 100.0);
        assert_eq!(r.with_trimmed_top(12.0), Rect::new(0.0, 12.0, 200.0, 88.0));
        assert_eq!(r.reduced_horizontally(20.0), Rect::new(20.0, 0.0, 160.0, 100.0));
        assert_eq!(r.right(), 200.0);
        assert_eq!(r.bottom(), 100.0);
    }
}
