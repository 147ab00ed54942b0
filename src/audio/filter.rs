//! Butterworth high-pass design and causal IIR filtering.
//!
//! The design follows the classic analog-prototype route: Butterworth poles
//! on the unit circle, low-pass to high-pass transform at the pre-warped
//! cutoff, then the bilinear transform to the z-plane. The result is a
//! transfer function `b / a` applied with a single forward pass.

use realfft::num_complex::Complex64;
use std::f64::consts::PI;

/// Digital IIR filter in transfer-function form, normalized so `a[0] == 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct IirFilter {
    b: Vec<f64>,
    a: Vec<f64>,
}

impl IirFilter {
    /// Design a Butterworth high-pass filter.
    ///
    /// `cutoff` is normalized to the Nyquist frequency and must lie strictly
    /// between 0 and 1. Returns `None` otherwise, or for order 0.
    pub fn butterworth_highpass(order: usize, cutoff: f64) -> Option<Self> {
        if order == 0 || !(cutoff > 0.0 && cutoff < 1.0) {
            return None;
        }

        #[allow(clippy::cast_precision_loss)]
        let n = order as f64;

        // Analog low-pass prototype: poles at -exp(j*pi*m/(2N)), m = -N+1, -N+3, ..., N-1
        let prototype: Vec<Complex64> = (0..order)
            .map(|k| {
                #[allow(clippy::cast_precision_loss)]
                let m = 2.0f64.mul_add(k as f64, 1.0 - n);
                -Complex64::from_polar(1.0, PI * m / (2.0 * n))
            })
            .collect();

        // Pre-warp for a sampling rate of 2 (cutoff relative to Nyquist)
        let fs2: f64 = 4.0;
        let warped = fs2 * (PI * cutoff / 2.0).tan();

        // Low-pass to high-pass: poles invert, N zeros appear at the origin
        let hp_poles: Vec<Complex64> = prototype.iter().map(|&p| warped / p).collect();
        let hp_gain = (Complex64::new(1.0, 0.0) / product(prototype.iter().map(|&p| -p))).re;

        // Bilinear transform: zeros at the origin map to z = 1
        let z_poles: Vec<Complex64> = hp_poles.iter().map(|&p| (fs2 + p) / (fs2 - p)).collect();
        let z_zeros = vec![Complex64::new(1.0, 0.0); order];
        let gain = hp_gain
            * (Complex64::new(fs2.powi(i32::try_from(order).ok()?), 0.0)
                / product(hp_poles.iter().map(|&p| fs2 - p)))
            .re;

        let b = poly(&z_zeros).into_iter().map(|c| c.re * gain).collect();
        let a = poly(&z_poles).into_iter().map(|c| c.re).collect();

        Some(Self { b, a })
    }

    /// Numerator coefficients.
    pub fn numerator(&self) -> &[f64] {
        &self.b
    }

    /// Denominator coefficients.
    pub fn denominator(&self) -> &[f64] {
        &self.a
    }

    /// Filter a signal in one causal pass, starting from zero state.
    ///
    /// Direct form II transposed.
    pub fn apply(&self, input: &[f32]) -> Vec<f64> {
        let a0 = self.a[0];
        let b: Vec<f64> = self.b.iter().map(|c| c / a0).collect();
        let a: Vec<f64> = self.a.iter().map(|c| c / a0).collect();
        let order = b.len().max(a.len()) - 1;

        let mut state = vec![0.0f64; order + 1];
        let mut output = Vec::with_capacity(input.len());

        for &x in input {
            let x = f64::from(x);
            let y = b[0].mul_add(x, state[0]);
            for i in 0..order {
                let bi = b.get(i + 1).copied().unwrap_or(0.0);
                let ai = a.get(i + 1).copied().unwrap_or(0.0);
                state[i] = bi.mul_add(x, state[i + 1]) - ai * y;
            }
            output.push(y);
        }

        output
    }
}

fn product(values: impl Iterator<Item = Complex64>) -> Complex64 {
    values.fold(Complex64::new(1.0, 0.0), |acc, v| acc * v)
}

/// Polynomial coefficients (highest power first) with the given roots.
fn poly(roots: &[Complex64]) -> Vec<Complex64> {
    let mut coeffs = vec![Complex64::new(1.0, 0.0)];
    for root in roots {
        let mut next = coeffs.clone();
        next.push(Complex64::new(0.0, 0.0));
        for (i, c) in coeffs.iter().enumerate() {
            next[i + 1] -= *root * *c;
        }
        coeffs = next;
    }
    coeffs
}
