use crate::utils::vector::{Vec2, distance};

/// Tracks per-stroke state: the previous sample and the accumulated path
/// length, shared by the mask brush and the magic pen.
pub struct StrokeState {
    pub last_pos: Option<Vec2>,
    path_len: f32,
}

impl StrokeState {
    /// Create an empty stroke state.
    pub fn new() -> Self {
        Self {
            last_pos: None,
            path_len: 0.0,
        }
    }

    /// Total Euclidean length of the stroke so far.
    pub fn path_len(&self) -> f32 {
        self.path_len
    }

    /// Feed one pointer sample, invoking `stamp` for each spacing-separated
    /// point along the segment from the previous sample. The second callback
    /// argument is the accumulated stroke length, updated once per sample
    /// (all stamps of one segment see the same length).
    ///
    /// The first sample stamps once at its own position. Subsequent samples
    /// at distance `d > spacing` stamp at parametric positions
    /// `k * spacing / d` for k = 1.. while the position stays within the
    /// segment (the far end included when it lands on the grid, the start
    /// point excluded since the previous call already stamped it). A sample
    /// within `spacing` of the previous one stamps once at the endpoint.
    pub fn add_point(&mut self, spacing: f32, pos: Vec2, stamp: &mut impl FnMut(Vec2, f32)) {
        if let Some(prev) = self.last_pos {
            let d = distance(prev, pos);
            self.path_len += d;
            if d > spacing {
                let step = spacing / d;
                let mut t = step;
                while t <= 1.0 {
                    stamp(prev + (pos - prev) * t, self.path_len);
                    t += step;
                }
            } else {
                stamp(pos, self.path_len);
            }
        } else {
            stamp(pos, self.path_len);
        }
        self.last_pos = Some(pos);
    }

    /// Reset the stroke state for the next gesture.
    pub fn end(&mut self) {
        self.last_pos = None;
        self.path_len = 0.0;
    }
}

impl Default for StrokeState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_stamps(samples: &[(f32, f32)], spacing: f32) -> Vec<Vec2> {
        let mut stroke = StrokeState::new();
        let mut stamps = Vec::new();
        for &(x, y) in samples {
            stroke.add_point(spacing, Vec2::new(x, y), &mut |p, _| stamps.push(p));
        }
        stamps
    }

    #[test]
    fn first_sample_stamps_once() {
        let stamps = collect_stamps(&[(5.0, 5.0)], 1.0);
        assert_eq!(stamps, vec![Vec2::new(5.0, 5.0)]);
    }

    #[test]
    fn interpolation_is_continuous() {
        // 10 px apart with spacing 1: at least 9 intermediate stamps, none
        // farther than the spacing apart along the segment.
        let stamps = collect_stamps(&[(0.0, 0.0), (10.0, 0.0)], 1.0);
        assert!(stamps.len() >= 10, "got {} stamps", stamps.len());
        for pair in stamps.windows(2) {
            assert!(distance(pair[0], pair[1]) <= 1.0 + 1e-4);
        }
        // The interpolation reaches the far end of the segment.
        let last = stamps.last().unwrap();
        assert!(distance(*last, Vec2::new(10.0, 0.0)) <= 1.0 + 1e-4);
    }

    #[test]
    fn short_segment_stamps_at_endpoint() {
        let stamps = collect_stamps(&[(0.0, 0.0), (0.5, 0.0)], 1.0);
        assert_eq!(stamps, vec![Vec2::new(0.0, 0.0), Vec2::new(0.5, 0.0)]);
    }

    #[test]
    fn path_len_accumulates_per_sample() {
        let mut stroke = StrokeState::new();
        let mut noop = |_p: Vec2, _len: f32| {};
        stroke.add_point(1.0, Vec2::new(0.0, 0.0), &mut noop);
        stroke.add_point(1.0, Vec2::new(3.0, 4.0), &mut noop);
        assert!((stroke.path_len() - 5.0).abs() < 1e-5);
        stroke.add_point(1.0, Vec2::new(3.0, 10.0), &mut noop);
        assert!((stroke.path_len() - 11.0).abs() < 1e-5);
    }

    #[test]
    fn stamps_see_the_segment_end_length() {
        let mut stroke = StrokeState::new();
        let mut lengths = Vec::new();
        stroke.add_point(1.0, Vec2::new(0.0, 0.0), &mut |_, l| lengths.push(l));
        stroke.add_point(1.0, Vec2::new(4.0, 0.0), &mut |_, l| lengths.push(l));
        assert_eq!(lengths[0], 0.0);
        assert!(lengths[1..].iter().all(|&l| (l - 4.0).abs() < 1e-5));
    }

    #[test]
    fn end_resets_state() {
        let mut stroke = StrokeState::new();
        let mut noop = |_p: Vec2, _len: f32| {};
        stroke.add_point(1.0, Vec2::new(1.0, 1.0), &mut noop);
        stroke.end();
        assert!(stroke.last_pos.is_none());
        assert_eq!(stroke.path_len(), 0.0);
    }
}
