//! Band-limited step correction shared by the master square and the pulse shapers.

use libm::floorf;

/// Wrap a phase into `[0, 1)`.
#[inline]
pub(crate) fn wrap_phase(phase: f32) -> f32 {
    let r = phase - floorf(phase);
    if r >= 1.0 { 0.0 } else { r }
}

/// 4th-order PolyBLEP residual.
///
/// C²-continuous piecewise polynomial spanning two samples either side of a
/// unit step at `t = 0`. Returns `-1` at the step itself, so a bipolar edge
/// is corrected by adding the residual at a rising edge and subtracting it
/// at a falling edge.
///
/// * `t` - phase distance past the discontinuity, in `[0, 1)`
/// * `dt` - phase increment per sample
///
/// Reference: Välimäki et al., "Antialiasing Oscillators", IEEE Signal
/// Processing Magazine, 2010.
#[inline]
pub(crate) fn poly_blep(t: f32, dt: f32) -> f32 {
    const A4: f32 = -43.0 / 48.0;
    const A3: f32 = 7.0 / 6.0;
    const A2: f32 = 0.5;
    const A0: f32 = -1.0;
    const C: f32 = -11.0 / 48.0;

    if dt <= 0.0 {
        return 0.0;
    }

    let residual = |n: f32| -> f32 {
        if n < 1.0 {
            let n2 = n * n;
            A4 * n2 * n2 + A3 * n2 * n + A2 * n2 + A0
        } else {
            let u = 2.0 - n;
            let u2 = u * u;
            C * u2 * u2
        }
    };

    let window = 2.0 * dt;
    if t < window {
        residual(t / dt)
    } else if t > 1.0 - window {
        -residual((1.0 - t) / dt)
    } else {
        0.0
    }
}

/// Band-limited bipolar pulse: `+1` for `phase < duty`, `-1` after, with
/// both edges corrected.
#[inline]
pub(crate) fn blep_pulse(phase: f32, duty: f32, dt: f32) -> f32 {
    let naive = if phase < duty { 1.0 } else { -1.0 };
    naive + poly_blep(phase, dt) - poly_blep(wrap_phase(phase - duty), dt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn residual_is_zero_away_from_edges() {
        assert_eq!(poly_blep(0.5, 0.01), 0.0);
        assert_eq!(poly_blep(0.3, 0.001), 0.0);
    }

    #[test]
    fn residual_at_step_is_minus_one() {
        assert!((poly_blep(0.0, 0.01) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn residual_is_continuous_at_window_edges() {
        let dt = 0.01;
        assert!(poly_blep(2.0 * dt - 1e-6, dt).abs() < 1e-4);
        assert!(poly_blep(1.0 - 2.0 * dt + 1e-6, dt).abs() < 1e-4);
    }

    #[test]
    fn pulse_midpoint_at_rising_edge() {
        assert!(blep_pulse(0.0, 0.5, 0.01).abs() < 1e-6);
    }

    #[test]
    fn pulse_plateaus() {
        assert_eq!(blep_pulse(0.25, 0.5, 0.001), 1.0);
        assert_eq!(blep_pulse(0.75, 0.5, 0.001), -1.0);
    }

    #[test]
    fn wrap_phase_range() {
        assert_eq!(wrap_phase(1.25), 0.25);
        assert_eq!(wrap_phase(-0.25), 0.75);
        assert_eq!(wrap_phase(0.0), 0.0);
    }

    #[test]
    fn zero_increment_disables_correction() {
        assert_eq!(poly_blep(0.0, 0.0), 0.0);
    }
}
