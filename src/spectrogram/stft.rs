//! Short-time Fourier analysis: power spectrogram, STFT/ISTFT round trip
//! and spectral subtraction.

use crate::constants::spectrogram::{FFT_SIZE, HOP_SIZE, NOISE_ESTIMATE_SECS};
use crate::error::{Error, Result};
use realfft::RealFftPlanner;
use realfft::num_complex::Complex64;
use std::cell::RefCell;
use std::f64::consts::PI;

thread_local! {
    static FFT_PLANNER: RefCell<RealFftPlanner<f64>> = RefCell::new(RealFftPlanner::new());
}

/// Periodic Hann window of the given length.
pub fn periodic_hann(len: usize) -> Vec<f64> {
    #[allow(clippy::cast_precision_loss)]
    let n = len as f64;
    (0..len)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let phase = 2.0 * PI * i as f64 / n;
            0.5 - 0.5 * phase.cos()
        })
        .collect()
}

fn fft_error(e: impl std::fmt::Display) -> Error {
    Error::Internal {
        message: format!("FFT failed: {e}"),
    }
}

/// One-sided power spectral density over time.
///
/// Frames are stored column-wise: `frames()[t][f]` is the power of bin `f`
/// in frame `t`.
#[derive(Debug, Clone)]
pub struct Spectrogram {
    sample_rate: f64,
    bin_width_hz: f64,
    frame_step_secs: f64,
    times: Vec<f64>,
    frames: Vec<Vec<f64>>,
}

impl Spectrogram {
    /// Compute the spectrogram of a segment.
    ///
    /// Hann-windowed frames of 512 samples with 50% overlap, constant
    /// detrend per frame, density scaling. A segment shorter than one frame
    /// is analysed as a single frame of its own length.
    pub fn compute(samples: &[f32], sample_rate: u32) -> Result<Self> {
        if samples.is_empty() {
            return Err(Error::Internal {
                message: "cannot compute the spectrogram of an empty segment".to_string(),
            });
        }

        let fs = f64::from(sample_rate);
        let nperseg = FFT_SIZE.min(samples.len());
        let step = if nperseg == FFT_SIZE { HOP_SIZE } else { nperseg };
        let frame_count = (samples.len() - nperseg) / step + 1;
        let bins = nperseg / 2 + 1;

        let window = periodic_hann(nperseg);
        let scale = 1.0 / (fs * window.iter().map(|w| w * w).sum::<f64>());

        let fft = FFT_PLANNER.with(|p| p.borrow_mut().plan_fft_forward(nperseg));
        let mut input = fft.make_input_vec();
        let mut spectrum = fft.make_output_vec();

        let mut frames = Vec::with_capacity(frame_count);
        let mut times = Vec::with_capacity(frame_count);

        for t in 0..frame_count {
            let start = t * step;
            let frame = &samples[start..start + nperseg];

            #[allow(clippy::cast_precision_loss)]
            let mean = frame.iter().map(|&s| f64::from(s)).sum::<f64>() / nperseg as f64;
            for (slot, (&s, &w)) in input.iter_mut().zip(frame.iter().zip(window.iter())) {
                *slot = (f64::from(s) - mean) * w;
            }
            fft.process(&mut input, &mut spectrum).map_err(fft_error)?;

            let mut power: Vec<f64> = spectrum.iter().map(|c| c.norm_sqr() * scale).collect();
            // One-sided: double everything except DC and (for even lengths) Nyquist
            let doubled_end = if nperseg % 2 == 0 { bins - 1 } else { bins };
            for p in power.iter_mut().take(doubled_end).skip(1) {
                *p *= 2.0;
            }

            frames.push(power);
            #[allow(clippy::cast_precision_loss)]
            times.push((nperseg as f64 / 2.0 + start as f64) / fs);
        }

        #[allow(clippy::cast_precision_loss)]
        Ok(Self {
            sample_rate: fs,
            bin_width_hz: fs / nperseg as f64,
            frame_step_secs: HOP_SIZE as f64 / fs,
            times,
            frames,
        })
    }

    /// Make the frequency axis cover exactly `[0, max_hz]`.
    ///
    /// Below-range Nyquist frequencies are padded with zero-power bins at the
    /// native bin width; higher ones are truncated.
    pub fn limit_frequency(&mut self, max_hz: f64) {
        let nyquist = self.sample_rate / 2.0;
        if nyquist < max_hz {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let extra = ((max_hz - nyquist) / self.bin_width_hz).floor() as usize;
            for frame in &mut self.frames {
                frame.resize(frame.len() + extra, 0.0);
            }
        } else {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let keep = (max_hz / self.bin_width_hz).floor() as usize + 1;
            for frame in &mut self.frames {
                frame.truncate(keep);
            }
        }
    }

    /// Append zero-power frames until the time axis reaches `duration_secs`.
    pub fn pad_time(&mut self, duration_secs: f64) {
        let Some(&last) = self.times.last() else {
            return;
        };
        if last >= duration_secs {
            return;
        }

        let dt = self.frame_step_secs;
        let first = last + dt;
        let span = duration_secs + 1e-9 - first;
        if span <= 0.0 {
            return;
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let extra = (span / dt).ceil() as usize;
        let bins = self.bin_count();
        for k in 0..extra {
            #[allow(clippy::cast_precision_loss)]
            self.times.push(first + k as f64 * dt);
            self.frames.push(vec![0.0; bins]);
        }
    }

    /// Power values, one vector of bins per frame.
    pub fn frames(&self) -> &[Vec<f64>] {
        &self.frames
    }

    /// Frame centre times in seconds.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Number of frequency bins per frame.
    pub fn bin_count(&self) -> usize {
        self.frames.first().map_or(0, Vec::len)
    }

    /// Width of one frequency bin in Hz.
    pub fn bin_width_hz(&self) -> f64 {
        self.bin_width_hz
    }
}

/// Complex short-time spectrum with magnitude scaled by the window sum.
#[derive(Debug, Clone)]
pub struct ShortTimeSpectrum {
    nperseg: usize,
    step: usize,
    input_len: usize,
    frames: Vec<Vec<Complex64>>,
}

impl ShortTimeSpectrum {
    /// Analyse `samples` with a periodic Hann window of `min(512, len)`
    /// samples, 50% overlap and zero padding at both boundaries.
    pub fn analyse(samples: &[f32]) -> Result<Self> {
        if samples.is_empty() {
            return Ok(Self {
                nperseg: 0,
                step: 1,
                input_len: 0,
                frames: Vec::new(),
            });
        }

        let nperseg = FFT_SIZE.min(samples.len());
        let half = nperseg / 2;
        let step = nperseg - half;

        let padded_len = samples.len() + 2 * half;
        let remainder = (padded_len - nperseg) % step;
        let tail = if remainder == 0 { 0 } else { step - remainder };

        let mut padded = vec![0.0f64; padded_len + tail];
        for (slot, &s) in padded[half..].iter_mut().zip(samples) {
            *slot = f64::from(s);
        }

        let window = periodic_hann(nperseg);
        let window_sum: f64 = window.iter().sum();

        let fft = FFT_PLANNER.with(|p| p.borrow_mut().plan_fft_forward(nperseg));
        let mut input = fft.make_input_vec();

        let frame_count = (padded.len() - nperseg) / step + 1;
        let mut frames = Vec::with_capacity(frame_count);
        for t in 0..frame_count {
            let start = t * step;
            for (slot, (&s, &w)) in input
                .iter_mut()
                .zip(padded[start..start + nperseg].iter().zip(window.iter()))
            {
                *slot = s * w;
            }
            let mut spectrum = fft.make_output_vec();
            fft.process(&mut input, &mut spectrum).map_err(fft_error)?;
            for c in &mut spectrum {
                *c /= window_sum;
            }
            frames.push(spectrum);
        }

        Ok(Self {
            nperseg,
            step,
            input_len: samples.len(),
            frames,
        })
    }

    /// Subtract `weight * floor` from every magnitude, clipping at zero and
    /// keeping the phase.
    pub fn subtract_magnitude(&mut self, floor: f64, weight: f64) {
        let offset = weight * floor;
        for frame in &mut self.frames {
            for c in frame.iter_mut() {
                let magnitude = c.norm();
                let reduced = (magnitude - offset).max(0.0);
                *c = if magnitude > 0.0 {
                    *c * (reduced / magnitude)
                } else {
                    Complex64::new(0.0, 0.0)
                };
            }
        }
    }

    /// Reconstruct the signal by weighted overlap-add.
    ///
    /// The result has the same length as the analysed input.
    pub fn synthesise(&self) -> Result<Vec<f32>> {
        if self.frames.is_empty() {
            return Ok(Vec::new());
        }

        let nperseg = self.nperseg;
        let window = periodic_hann(nperseg);
        let window_sum: f64 = window.iter().sum();

        let ifft = FFT_PLANNER.with(|p| p.borrow_mut().plan_fft_inverse(nperseg));
        let mut output = ifft.make_output_vec();

        let total = nperseg + (self.frames.len() - 1) * self.step;
        let mut signal = vec![0.0f64; total];
        let mut norm = vec![0.0f64; total];

        #[allow(clippy::cast_precision_loss)]
        let inverse_scale = window_sum / nperseg as f64;

        for (t, frame) in self.frames.iter().enumerate() {
            let mut spectrum = frame.clone();
            // Real input: DC and Nyquist carry no imaginary part
            if let Some(dc) = spectrum.first_mut() {
                dc.im = 0.0;
            }
            if nperseg % 2 == 0
                && let Some(nyquist) = spectrum.last_mut()
            {
                nyquist.im = 0.0;
            }
            ifft.process(&mut spectrum, &mut output).map_err(fft_error)?;

            let start = t * self.step;
            for (k, (&x, &w)) in output.iter().zip(window.iter()).enumerate() {
                signal[start + k] += x * inverse_scale * w;
                norm[start + k] += w * w;
            }
        }

        let half = nperseg / 2;
        #[allow(clippy::cast_possible_truncation)]
        let result = signal[half..]
            .iter()
            .zip(&norm[half..])
            .take(self.input_len)
            .map(|(&x, &n)| if n > 1e-10 { (x / n) as f32 } else { x as f32 })
            .collect();
        Ok(result)
    }
}

/// Mean absolute amplitude of the first half second of a segment.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn noise_floor(samples: &[f32], sample_rate: u32) -> f64 {
    let head_len = ((NOISE_ESTIMATE_SECS * f64::from(sample_rate)) as usize).min(samples.len());
    if head_len == 0 {
        return 0.0;
    }

    samples[..head_len]
        .iter()
        .map(|s| f64::from(s.abs()))
        .sum::<f64>()
        / head_len as f64
}

/// Suppress stationary background noise by spectral subtraction.
///
/// The noise floor is flat across frequency bins.
pub fn spectral_subtraction(samples: &[f32], noise_floor: f64, weight: f64) -> Result<Vec<f32>> {
    let mut spectrum = ShortTimeSpectrum::analyse(samples)?;
    spectrum.subtract_magnitude(noise_floor, weight);
    spectrum.synthesise()
}
