//! Parameter cells: smoothing for the audio path, atomics for the control surface.
//!
//! - [`SmoothedParam`]: one-pole smoothing toward a target, used wherever a
//!   block-rate control value would otherwise step audibly at block edges.
//! - [`AtomicParam`]: lock-free `f32` cell (bit-cast into an `AtomicU32`) that a
//!   host/UI thread writes and the audio thread reads once per block.
//!
//! ## Usage
//!
//! ```rust
//! use voltage_core::SmoothedParam;
//!
//! let mut gain = SmoothedParam::with_config(1.0, 48000.0, 5.0);
//! gain.set_target(0.5);
//! for _ in 0..480 {
//!     let _g = gain.advance();
//! }
//! assert!(gain.get() < 1.0);
//! ```

use core::sync::atomic::{AtomicU32, Ordering};
use libm::expf;

/// A parameter with exponential (one-pole) smoothing.
#[derive(Debug, Clone)]
pub struct SmoothedParam {
    /// Current smoothed value
    current: f32,
    /// Target value we're smoothing towards
    target: f32,
    /// Smoothing coefficient (1 = instant, toward 0 = slower)
    coeff: f32,
    /// Sample rate in Hz
    sample_rate: f32,
    /// Smoothing time in milliseconds
    smoothing_time_ms: f32,
}

impl SmoothedParam {
    /// Create a new smoothed parameter with instant response.
    ///
    /// Call [`set_sample_rate`](Self::set_sample_rate) and
    /// [`set_smoothing_time_ms`](Self::set_smoothing_time_ms) to enable smoothing.
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            coeff: 1.0,
            sample_rate: 44100.0,
            smoothing_time_ms: 0.0,
        }
    }

    /// Create a smoothed parameter with full configuration.
    pub fn with_config(initial: f32, sample_rate: f32, smoothing_time_ms: f32) -> Self {
        let mut param = Self::new(initial);
        param.sample_rate = sample_rate;
        param.smoothing_time_ms = smoothing_time_ms;
        param.recalculate_coeff();
        param
    }

    /// Set the target value.
    #[inline]
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Set target and immediately snap to it.
    #[inline]
    pub fn set_immediate(&mut self, value: f32) {
        self.target = value;
        self.current = value;
    }

    /// Update sample rate and recalculate smoothing coefficient.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_coeff();
    }

    /// Set smoothing time constant in milliseconds. 0 disables smoothing.
    pub fn set_smoothing_time_ms(&mut self, time_ms: f32) {
        self.smoothing_time_ms = time_ms;
        self.recalculate_coeff();
    }

    /// Advance by one sample and return the smoothed value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        self.current += self.coeff * (self.target - self.current);
        self.current
    }

    /// Current smoothed value without advancing.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Target value.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Whether the value has reached its target (within 1e-6).
    #[inline]
    pub fn is_settled(&self) -> bool {
        (self.current - self.target).abs() < 1e-6
    }

    /// `coeff = 1 - exp(-1 / (tau * fs))`; instant when the time is zero.
    fn recalculate_coeff(&mut self) {
        if self.smoothing_time_ms <= 0.0 || self.sample_rate <= 0.0 {
            self.coeff = 1.0;
        } else {
            let samples = self.smoothing_time_ms / 1000.0 * self.sample_rate;
            self.coeff = 1.0 - expf(-1.0 / samples);
        }
    }
}

impl Default for SmoothedParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Lock-free `f32` parameter cell.
///
/// Stores the value bit-cast into an `AtomicU32`. Writes use `Release`,
/// reads use `Acquire`, so a reader that observes a value also observes
/// everything the writer did before storing it.
///
/// ```rust
/// use voltage_core::AtomicParam;
///
/// let cell = AtomicParam::new(0.25);
/// cell.store(0.75);
/// assert_eq!(cell.load(), 0.75);
/// ```
#[derive(Debug)]
pub struct AtomicParam(AtomicU32);

impl AtomicParam {
    /// Create a cell holding `value`.
    pub const fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    /// Read the current value.
    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Acquire))
    }

    /// Write a new value.
    #[inline]
    pub fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Release);
    }
}

impl Default for AtomicParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}
