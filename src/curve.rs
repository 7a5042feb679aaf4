// Camera response curve as a pair of lookup tables.
// `finverse` maps a display-encoded value to linear radiance (used when
// linearizing photographs); `f` maps linear radiance back to a display value
// (used by the tonemap). Both are sampled at the same resolution and are
// monotonic non-decreasing.

use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

/// Table size used when no explicit curve is given.
pub const DEFAULT_CURVE_SIZE: usize = 4096;

/// Which value each output index of `f` is solved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum InversionTarget {
    /// `i / (N-1)`: `f` is the true inverse of `finverse`.
    #[default]
    Linear,
    /// `(i / (N-1))^2`: pairs with the default squared ramp to give an
    /// identity `f`.
    Squared,
}

impl InversionTarget {
    #[inline]
    fn at(self, i: usize, n: usize) -> f64 {
        let t = i as f64 / (n - 1) as f64;
        match self {
            InversionTarget::Linear => t,
            InversionTarget::Squared => t * t,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResponseCurve {
    finverse: Vec<f32>,
    f: Vec<f32>,
}

impl ResponseCurve {
    /// Build from explicit `finverse` samples, or the squared ramp when `None`.
    pub fn build(samples: Option<Vec<f32>>, size: usize, target: InversionTarget) -> Result<Self> {
        let finverse = match samples {
            Some(s) => s,
            None => squared_ramp(size),
        };
        validate(&finverse)?;
        let f = invert(&finverse, target);
        debug!(size = finverse.len(), ?target, "response curve built");
        Ok(Self { finverse, f })
    }

    /// Read whitespace-separated `finverse` samples from a text file.
    pub fn from_file(path: &Path, target: InversionTarget) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let samples = parse_samples(&text)?;
        Self::build(Some(samples), 0, target)
    }

    pub fn size(&self) -> usize {
        self.finverse.len()
    }

    /// Display value → linear radiance.
    #[inline]
    pub fn to_linear(&self, x: f32) -> f32 {
        evaluate(&self.finverse, x)
    }

    /// Linear radiance → display value.
    #[inline]
    pub fn to_display(&self, x: f32) -> f32 {
        evaluate(&self.f, x)
    }
}

/// `finverse[i] = (i / (N-1))^2`.
pub fn squared_ramp(size: usize) -> Vec<f32> {
    let denom = size.saturating_sub(1).max(1) as f64;
    (0..size)
        .map(|i| {
            let t = i as f64 / denom;
            (t * t) as f32
        })
        .collect()
}

fn validate(table: &[f32]) -> Result<()> {
    if table.len() < 2 {
        return Err(Error::InvalidCurve(format!(
            "need at least 2 samples, got {}",
            table.len()
        )));
    }
    if let Some(i) = table.iter().position(|v| !(0.0..=1.0).contains(v)) {
        return Err(Error::InvalidCurve(format!(
            "sample {i} = {} is outside [0, 1]",
            table[i]
        )));
    }
    if let Some(i) = table.windows(2).position(|w| w[1] < w[0]) {
        return Err(Error::InvalidCurve(format!(
            "samples decrease between index {i} and {}",
            i + 1
        )));
    }
    Ok(())
}

fn parse_samples(text: &str) -> Result<Vec<f32>> {
    text.split_whitespace()
        .map(|tok| {
            tok.parse::<f32>()
                .map_err(|e| Error::InvalidCurve(format!("bad sample {tok:?}: {e}")))
        })
        .collect()
}

/// Numerically invert a monotonic table.
///
/// For each output index the nearest sample to the target is found by a full
/// scan (first hit wins on ties). Whether the target sits below or above that
/// sample picks the bracketing interval, and the fractional index is linearly
/// interpolated inside it. O(N²), fine for a few thousand entries. `table.len() >= 2`.
pub fn invert(table: &[f32], target: InversionTarget) -> Vec<f32> {
    let n = table.len();
    let last = (n - 1) as f64;
    let mut out = vec![0.0f32; n];

    for (i, slot) in out.iter_mut().enumerate() {
        let want = target.at(i, n);

        let mut nearest = 0;
        let mut min_diff = f64::MAX;
        for (j, &v) in table.iter().enumerate() {
            let diff = (want - v as f64).abs();
            if diff < min_diff {
                min_diff = diff;
                nearest = j;
            }
        }

        // The crossing lies below the nearest sample when the target does.
        let (lo, hi) = if want < table[nearest] as f64 && nearest > 0 {
            (nearest - 1, nearest)
        } else if nearest + 1 < n {
            (nearest, nearest + 1)
        } else {
            (nearest - 1, nearest)
        };

        let rise = table[hi] as f64 - table[lo] as f64;
        let frac = if rise > 0.0 {
            (want - table[lo] as f64) / rise
        } else {
            0.0 // plateau: stay on the low end
        };
        let index = (lo as f64 + frac).clamp(0.0, last);
        *slot = (index / last) as f32;
    }
    out
}

/// Linear-interpolated lookup at `x * (N-1)`; `x` is clamped to [0,1].
#[inline]
pub fn evaluate(table: &[f32], x: f32) -> f32 {
    let last = table.len() - 1;
    let pos = x.clamp(0.0, 1.0) * last as f32;
    let i0 = (pos.floor() as usize).min(last);
    let i1 = (i0 + 1).min(last);
    let frac = pos - i0 as f32;
    table[i0] + (table[i1] - table[i0]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::io::Write;

    fn identity(n: usize) -> Vec<f32> {
        (0..n).map(|i| i as f32 / (n - 1) as f32).collect()
    }

    #[test]
    fn round_trip_gentle_curve() {
        let n = 256;
        // finverse(x) = (x + x^2) / 2: slope bounded away from zero.
        let table: Vec<f32> = identity(n).iter().map(|&x| 0.5 * (x + x * x)).collect();
        let curve = ResponseCurve::build(Some(table), 0, InversionTarget::Linear).unwrap();
        let step = 1.0 / (n - 1) as f32;

        for k in 0..=200 {
            let x = k as f32 / 200.0;
            let back = curve.to_display(curve.to_linear(x));
            assert_abs_diff_eq!(back, x, epsilon = step);
        }
    }

    #[test]
    fn round_trip_default_squared_curve() {
        let n = 256;
        let curve = ResponseCurve::build(None, n, InversionTarget::Linear).unwrap();
        let step = 1.0 / (n - 1) as f32;

        for k in 20..=200 {
            let x = k as f32 / 200.0;
            let back = curve.to_display(curve.to_linear(x));
            assert_abs_diff_eq!(back, x, epsilon = step);
        }
        // f is the square root of the ramp it inverts.
        assert_abs_diff_eq!(curve.to_display(0.25), 0.5, epsilon = step);
    }

    #[test]
    fn round_trip_concave_curve() {
        let n = 256;
        let table: Vec<f32> = identity(n).iter().map(|x| x.sqrt()).collect();
        let curve = ResponseCurve::build(Some(table), 0, InversionTarget::Linear).unwrap();
        let step = 1.0 / (n - 1) as f32;

        for k in 20..=200 {
            let x = k as f32 / 200.0;
            let back = curve.to_display(curve.to_linear(x));
            assert_abs_diff_eq!(back, x, epsilon = step);
        }
    }

    fn assert_non_decreasing(f: &[f32], label: &str) {
        let drops: Vec<_> = f
            .windows(2)
            .enumerate()
            .filter(|(_, w)| w[1] < w[0])
            .map(|(i, w)| (i, w[0], w[1]))
            .collect();
        assert!(drops.is_empty(), "{label}: f decreases at {drops:?}");
        assert!(f.iter().all(|v| (0.0..=1.0).contains(v)), "{label}: f leaves [0, 1]");
    }

    #[test]
    fn inverse_is_monotonic() {
        let n = 256;
        let concave: Vec<f32> = identity(n).iter().map(|x| x.sqrt()).collect();
        // steep up to the knee at 0.5, shallow after it
        let knee: Vec<f32> = identity(n)
            .iter()
            .map(|&x| if x < 0.5 { 1.6 * x } else { 0.8 + 0.4 * (x - 0.5) })
            .collect();
        // flat at 0.4 across the middle third
        let plateau: Vec<f32> = identity(n)
            .iter()
            .map(|&x| match x {
                x if x < 0.3 => x * 4.0 / 3.0,
                x if x <= 0.6 => 0.4,
                x => (0.4 + (x - 0.6) * 1.5).min(1.0),
            })
            .collect();

        for target in [InversionTarget::Linear, InversionTarget::Squared] {
            let tables = [
                ("squared", squared_ramp(512)),
                ("concave", concave.clone()),
                ("knee", knee.clone()),
                ("plateau", plateau.clone()),
            ];
            for (name, table) in tables {
                let curve = ResponseCurve::build(Some(table), 0, target).unwrap();
                assert_non_decreasing(&curve.f, &format!("{name}/{target:?}"));
            }
        }
    }

    #[test]
    fn squared_target_interpolates_between_samples() {
        // Off-sample targets land at the plain fractional index; the slope is
        // not rescaled by the table length.
        let f = invert(&identity(5), InversionTarget::Squared);
        for (got, want) in f.iter().zip([0.0, 0.0625, 0.25, 0.5625, 1.0]) {
            assert_abs_diff_eq!(*got, want, epsilon = 1e-6);
        }
    }

    #[test]
    fn identity_inverts_to_identity() {
        let n = 64;
        let curve = ResponseCurve::build(Some(identity(n)), 0, InversionTarget::Linear).unwrap();
        for (got, want) in curve.f.iter().zip(identity(n)) {
            assert_abs_diff_eq!(*got, want, epsilon = 1e-5);
        }
    }

    #[test]
    fn squared_target_on_squared_ramp_is_linear() {
        // Solving for t^2 against a t^2 table gives back t.
        let n = 128;
        let f = invert(&squared_ramp(n), InversionTarget::Squared);
        for (got, want) in f.iter().zip(identity(n)) {
            assert_abs_diff_eq!(*got, want, epsilon = 1e-5);
        }
    }

    #[test]
    fn evaluate_interpolates_and_clamps() {
        let table = [0.0, 0.5, 1.0];
        assert_abs_diff_eq!(evaluate(&table, 0.25), 0.25);
        assert_eq!(evaluate(&table, -3.0), 0.0);
        assert_eq!(evaluate(&table, 1.0), 1.0);
        assert_eq!(evaluate(&table, 7.0), 1.0);
    }

    #[test]
    fn rejects_bad_tables() {
        let t = InversionTarget::Linear;
        assert!(matches!(ResponseCurve::build(Some(vec![0.5]), 0, t), Err(Error::InvalidCurve(_))));
        assert!(matches!(
            ResponseCurve::build(Some(vec![0.0, 0.6, 0.4, 1.0]), 0, t),
            Err(Error::InvalidCurve(_))
        ));
        assert!(matches!(
            ResponseCurve::build(Some(vec![0.0, 1.5]), 0, t),
            Err(Error::InvalidCurve(_))
        ));
    }

    #[test]
    fn loads_table_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0.0 0.1\n0.4\n  1.0").unwrap();
        let curve = ResponseCurve::from_file(file.path(), InversionTarget::Linear).unwrap();
        assert_eq!(curve.finverse, vec![0.0, 0.1, 0.4, 1.0]);

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        writeln!(bad, "0.0 zero 1.0").unwrap();
        assert!(matches!(
            ResponseCurve::from_file(bad.path(), InversionTarget::Linear),
            Err(Error::InvalidCurve(_))
        ));
    }
}
