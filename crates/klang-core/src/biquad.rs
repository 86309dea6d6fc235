//! Second-order IIR filter with Butterworth constructors.
//!
//! The voice's high-pass and band-pass stages and the reverb pre-emphasis
//! filters are second-order Butterworth sections. The coefficient formulas
//! are the classic bilinear-transform derivations (C = tan(pi*fc/sr) form);
//! the band-pass uses the bandwidth parameterisation so the engine can map
//! resonance to bandwidth directly.

use libm::{cosf, tanf};

/// Direct form I biquad section.
///
/// Difference equation:
///
/// ```text
/// y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2] - a1*y[n-1] - a2*y[n-2]
/// ```
#[derive(Debug, Clone, Default)]
pub struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// Create a pass-through biquad (b0 = 1, everything else 0).
    pub fn new() -> Self {
        Self {
            b0: 1.0,
            ..Default::default()
        }
    }

    /// Install normalized coefficients (a0 already divided out).
    pub fn set_coefficients(&mut self, b0: f32, b1: f32, b2: f32, a1: f32, a2: f32) {
        self.b0 = b0;
        self.b1 = b1;
        self.b2 = b2;
        self.a1 = a1;
        self.a2 = a2;
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = crate::flush_denormal(output);
        output
    }

    /// Clear filter history.
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

/// Minimum stable corner/center frequency in Hz.
const MIN_FREQ: f32 = 1.0;

/// Second-order Butterworth high-pass.
///
/// Wraps a [`Biquad`] with a cached corner frequency so per-sample cutoff
/// writes only recompute coefficients when the value actually moves.
#[derive(Debug, Clone)]
pub struct ButterworthHighpass {
    biquad: Biquad,
    sample_rate: f32,
    freq: f32,
}

impl ButterworthHighpass {
    /// Create at the given sample rate and corner frequency.
    pub fn new(sample_rate: f32, freq_hz: f32) -> Self {
        let mut hp = Self {
            biquad: Biquad::new(),
            sample_rate,
            freq: 0.0,
        };
        hp.set_frequency(freq_hz);
        hp
    }

    /// Set the corner frequency in Hz. No-op when unchanged.
    #[inline]
    pub fn set_frequency(&mut self, freq_hz: f32) {
        let freq = freq_hz.clamp(MIN_FREQ, self.sample_rate * 0.49);
        if (freq - self.freq).abs() < f32::EPSILON {
            return;
        }
        self.freq = freq;

        let c = tanf(core::f32::consts::PI * freq / self.sample_rate);
        let c2 = c * c;
        let sqrt2c = core::f32::consts::SQRT_2 * c;
        let norm = 1.0 / (1.0 + sqrt2c + c2);
        self.biquad.set_coefficients(
            norm,
            -2.0 * norm,
            norm,
            2.0 * (c2 - 1.0) * norm,
            (1.0 - sqrt2c + c2) * norm,
        );
    }

    /// Current corner frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.freq
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.biquad.process(input)
    }

    /// Clear filter history.
    pub fn reset(&mut self) {
        self.biquad.reset();
    }
}

/// Second-order Butterworth band-pass, bandwidth form.
///
/// Parameterised by center frequency and bandwidth (both Hz), matching the
/// resonance-to-bandwidth mapping the voice filter applies.
#[derive(Debug, Clone)]
pub struct ButterworthBandpass {
    biquad: Biquad,
    sample_rate: f32,
    freq: f32,
    bandwidth: f32,
}

impl ButterworthBandpass {
    /// Create at the given sample rate, center frequency, and bandwidth.
    pub fn new(sample_rate: f32, freq_hz: f32, bandwidth_hz: f32) -> Self {
        let mut bp = Self {
            biquad: Biquad::new(),
            sample_rate,
            freq: 0.0,
            bandwidth: 0.0,
        };
        bp.set_params(freq_hz, bandwidth_hz);
        bp
    }

    /// Set center frequency and bandwidth in Hz. No-op when both unchanged.
    #[inline]
    pub fn set_params(&mut self, freq_hz: f32, bandwidth_hz: f32) {
        let freq = freq_hz.clamp(MIN_FREQ, self.sample_rate * 0.49);
        let bw = bandwidth_hz.clamp(MIN_FREQ, self.sample_rate * 0.49);
        if (freq - self.freq).abs() < f32::EPSILON && (bw - self.bandwidth).abs() < f32::EPSILON {
            return;
        }
        self.freq = freq;
        self.bandwidth = bw;

        let c = 1.0 / tanf(core::f32::consts::PI * bw / self.sample_rate);
        let d = 2.0 * cosf(core::f32::consts::TAU * freq / self.sample_rate);
        let norm = 1.0 / (1.0 + c);
        self.biquad.set_coefficients(
            norm,
            0.0,
            -norm,
            -c * d * norm,
            (c - 1.0) * norm,
        );
    }

    /// Current center frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.freq
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.biquad.process(input)
    }

    /// Clear filter history.
    pub fn reset(&mut self) {
        self.biquad.reset();
    }
}
