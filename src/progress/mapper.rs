/// Map progress onto a frame index: `round(p * (count - 1))`, clamped.
///
/// Rounds rather than truncates so the last frame is reached at `p = 1` and
/// every frame owns an equal slice of the scroll range.
pub fn frame_index(progress: f64, frame_count: usize) -> usize {
    if frame_count == 0 {
        return 0;
    }
    let last = frame_count - 1;
    let p = if progress.is_finite() {
        progress.clamp(0.0, 1.0)
    } else {
        0.0
    };
    ((p * last as f64).round() as usize).min(last)
}

/// Clamped piecewise-linear map through matching `inputs`/`outputs`
/// keyframes. `inputs` must be non-decreasing; repeated stops act as steps.
pub fn interpolate(inputs: &[f64], outputs: &[f64], x: f64) -> f64 {
    let n = inputs.len().min(outputs.len());
    if n == 0 {
        return 0.0;
    }
    if n == 1 || !x.is_finite() || x <= inputs[0] {
        return outputs[0];
    }
    if x >= inputs[n - 1] {
        return outputs[n - 1];
    }
    for i in 1..n {
        let (x0, x1) = (inputs[i - 1], inputs[i]);
        if x < x1 {
            let span = x1 - x0;
            if span <= 0.0 {
                return outputs[i];
            }
            let t = (x - x0) / span;
            return outputs[i - 1] + (outputs[i] - outputs[i - 1]) * t;
        }
    }
    outputs[n - 1]
}

/// Clamp `(x - start) / span` into `[0, 1]`.
pub fn ramp(x: f64, start: f64, span: f64) -> f64 {
    interpolate(&[start, start + span], &[0.0, 1.0], x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_nearest_frame() {
        assert_eq!(frame_index(0.0, 144), 0);
        assert_eq!(frame_index(1.0, 144), 143);
        // 0.5 * 143 = 71.5 rounds away from zero.
        assert_eq!(frame_index(0.5, 144), 72);
        // Truncation would give 0 here.
        assert_eq!(frame_index(0.006, 144), 1);
    }

    #[test]
    fn clamps_out_of_range_input() {
        assert_eq!(frame_index(-0.3, 10), 0);
        assert_eq!(frame_index(7.0, 10), 9);
        assert_eq!(frame_index(f64::NAN, 10), 0);
        assert_eq!(frame_index(0.7, 1), 0);
        assert_eq!(frame_index(0.7, 0), 0);
    }

    #[test]
    fn index_is_monotonic_and_in_range() {
        for count in [1usize, 2, 3, 17, 144] {
            let mut prev = 0;
            for step in 0..=1000 {
                let s = step as f64 / 1000.0;
                let idx = frame_index(s, count);
                assert!(idx < count);
                assert!(idx >= prev);
                assert_eq!(idx, (s * (count - 1) as f64).round() as usize);
                prev = idx;
            }
        }
    }

    #[test]
    fn interpolate_holds_ends_and_blends_between() {
        let ins = [0.0, 0.1, 0.2, 0.25];
        let outs = [0.0, 1.0, 1.0, 0.0];
        assert_eq!(interpolate(&ins, &outs, -1.0), 0.0);
        assert!((interpolate(&ins, &outs, 0.05) - 0.5).abs() < 1e-9);
        assert_eq!(interpolate(&ins, &outs, 0.15), 1.0);
        assert!((interpolate(&ins, &outs, 0.225) - 0.5).abs() < 1e-9);
        assert_eq!(interpolate(&ins, &outs, 0.3), 0.0);
    }

    #[test]
    fn ramp_clamps() {
        assert_eq!(ramp(0.1, 0.2, 0.6), 0.0);
        assert!((ramp(0.5, 0.2, 0.6) - 0.5).abs() < 1e-9);
        assert_eq!(ramp(0.9, 0.2, 0.6), 1.0);
    }
}
