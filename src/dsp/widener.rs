//! # Stereo Widener
//!
//! Turns a (near-)mono stereo pair into a wide one by feeding the mono sum
//! through a very short delay and mixing the delayed copy back in with
//! *opposite polarity* on each side:
//!
//! ```text
//! in_l ──┬──────────────────────────────────── × (1 - mix) ──►(+)──► out_l
//!        │                                                     ▲
//!        ├──►(+)──► [Delay Line] ──► delayed × mix ──► × -1 ───┘
//!        │    ▲       (≤ 10 ms)              │
//! in_r ──┼────┘                              └────────────────┐
//!        │                                                     ▼
//!        └──────────────────────────────────── × (1 - mix) ──►(+)──► out_r
//! ```
//!
//! With a delay of a few milliseconds the ear doesn't hear an echo. It
//! hears the two channels drift apart (the Haas effect), and because the
//! same delayed signal is added to one side and subtracted from the other,
//! a mono fold-down cancels the wet part and lands back on the dry signal.
//!
//! There is exactly one delay line, and it holds the *mono sum*. Both
//! outputs are derived from that one history; splitting it per channel
//! would remove the effect.
//!
//! ## Lifecycle
//!
//! ```text
//! Unprepared ──prepare()──► Prepared ◄──prepare()── Released
//!                            │   ▲                      ▲
//!                            └───┘ process_block()      │
//!                            │                          │
//!                            └────────release()─────────┘
//! ```
//!
//! `prepare()` may be called again at any time (for example when the host
//! switches sample rate). Only `prepare()` allocates.

use std::num::NonZeroUsize;

use nih_plug::{nih_debug_assert, nih_debug_assert_eq, nih_debug_assert_failure};

use super::delay_line::DelayLine;

/// The longest delay the ring is sized for, in milliseconds. The delay
/// line holds `sample_rate * MAX_DELAY_MS / 1000` samples.
pub const MAX_DELAY_MS: f32 = 10.0;

/// The shortest delay ever read, in samples. Keeps both interpolation taps
/// behind the write head.
pub const MIN_DELAY_SAMPLES: f32 = 2.0;

/// Where the processor is in the host's prepare/release cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Constructed, no buffer allocated yet.
    Unprepared,
    /// Buffer allocated and ready for `process_block()`.
    Prepared,
    /// The host released its resources. History is cleared; a new
    /// `prepare()` is required before processing again.
    Released,
}

/// The mono-to-stereo widening processor.
pub struct StereoWidener {
    /// History of the mono sum. `None` until the first `prepare()`.
    delay_line: Option<DelayLine>,
    sample_rate: f32,
    /// Largest block the host promised to send, from `prepare()`.
    max_block_size: usize,
    lifecycle: Lifecycle,
}

impl Default for StereoWidener {
    fn default() -> Self {
        Self::new()
    }
}

impl StereoWidener {
    pub fn new() -> Self {
        Self {
            delay_line: None,
            sample_rate: 0.0,
            max_block_size: 0,
            lifecycle: Lifecycle::Unprepared,
        }
    }

    #[allow(dead_code)]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Length of the delay ring in samples, or 0 before the first
    /// successful `prepare()`.
    pub fn capacity(&self) -> usize {
        self.delay_line.as_ref().map_or(0, DelayLine::capacity)
    }

    /// Size the delay line for `sample_rate` and clear it.
    ///
    /// Returns `false`, leaving the processor untouched, if the sample rate
    /// is too low (or not a number at all) to hold even one sample of
    /// history.
    ///
    /// If the new capacity matches the current one, the existing buffer is
    /// cleared and reused instead of being reallocated.
    pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize) -> bool {
        let Some(capacity) = delay_capacity(sample_rate) else {
            return false;
        };

        let reusable = self
            .delay_line
            .as_ref()
            .is_some_and(|delay_line| delay_line.capacity() == capacity.get());
        if reusable {
            self.reset();
        } else {
            self.delay_line = Some(DelayLine::new(capacity));
        }

        self.sample_rate = sample_rate;
        self.max_block_size = max_block_size;
        self.lifecycle = Lifecycle::Prepared;

        true
    }

    /// Forget all history without leaving the `Prepared` state. Used when
    /// the transport restarts.
    pub fn reset(&mut self) {
        if let Some(delay_line) = &mut self.delay_line {
            delay_line.clear();
        }
    }

    /// Clear all history and mark the processor as released. The buffer
    /// stays allocated so a following `prepare()` at the same sample rate
    /// doesn't have to allocate again.
    pub fn release(&mut self) {
        self.reset();
        if self.lifecycle == Lifecycle::Prepared {
            self.lifecycle = Lifecycle::Released;
        }
    }

    /// Process one block in place.
    ///
    /// `delay_time_ms` and `mix` are sampled once and held for the whole
    /// block. Both are clamped rather than rejected: the delay into
    /// `[MIN_DELAY_SAMPLES, capacity - 1]` samples and the mix into
    /// `[0, 1]`. A NaN delay becomes the minimum delay and a NaN mix
    /// becomes fully dry.
    ///
    /// The block length is `left.len()`. Both slices must be the same
    /// length and no longer than the `max_block_size` given to
    /// `prepare()`. Calling this outside the `Prepared` state is a bug in
    /// the caller; the block is then left as-is.
    pub fn process_block(
        &mut self,
        left: &mut [f32],
        right: &mut [f32],
        delay_time_ms: f32,
        mix: f32,
    ) {
        if self.lifecycle != Lifecycle::Prepared {
            nih_debug_assert_failure!("process_block() called in state {:?}", self.lifecycle);
            return;
        }
        let Some(delay_line) = self.delay_line.as_mut() else {
            return;
        };

        nih_debug_assert_eq!(left.len(), right.len());
        nih_debug_assert!(left.len() <= self.max_block_size);

        let delay_samples =
            delay_in_samples(delay_time_ms, self.sample_rate, delay_line.capacity());
        // `max` discards NaN, so an invalid mix falls back to fully dry.
        let mix = mix.max(0.0).min(1.0);
        let dry = 1.0 - mix;

        for (sample_l, sample_r) in left.iter_mut().zip(right.iter_mut()) {
            let in_l = *sample_l;
            let in_r = *sample_r;

            // Step 1: READ the mono sum from `delay_samples` ago.
            //
            // This happens before the write, so the tap only ever sees
            // earlier input, never the sample being processed right now.
            let delayed = delay_line.read_delay(delay_samples);

            // Step 2: WRITE the current mono sum into the ring. The write
            // also advances the head, ready for the next sample.
            delay_line.write(in_l + in_r);

            // Step 3: SCALE the delayed signal by the mix amount.
            let mix_out = delayed * mix;

            // Step 4: LEFT gets the delayed copy with inverted polarity,
            // on top of the scaled-down dry input.
            *sample_l = -mix_out + in_l * dry;

            // Step 5: RIGHT gets the same copy upright. Summed to mono,
            // the two wet halves cancel out.
            *sample_r = mix_out + in_r * dry;
        }
    }
}

/// Ring length for a given sample rate, or `None` if it would be empty.
///
/// Computed in `f64` so common rates land on whole sample counts
/// (48 kHz → exactly 480 samples).
pub fn delay_capacity(sample_rate: f32) -> Option<NonZeroUsize> {
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return None;
    }

    let samples = f64::from(sample_rate) * f64::from(MAX_DELAY_MS) / 1000.0;
    NonZeroUsize::new(samples as usize)
}

/// Convert a delay time to a read offset the delay line can serve.
///
/// ```text
/// delay_samples = delay_ms * sample_rate / 1000
/// ```
///
/// clamped to `[MIN_DELAY_SAMPLES, capacity - 1]`. For rings shorter than
/// three samples the upper bound wins.
fn delay_in_samples(delay_time_ms: f32, sample_rate: f32, capacity: usize) -> f32 {
    let longest = capacity.saturating_sub(1) as f32;

    // `max` discards NaN, so a bogus delay falls back to the minimum.
    (delay_time_ms * sample_rate / 1000.0)
        .max(MIN_DELAY_SAMPLES)
        .min(longest)
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48000.0;
    const MAX_BLOCK: usize = 512;

    fn prepared(sample_rate: f32) -> StereoWidener {
        let mut widener = StereoWidener::new();
        assert!(widener.prepare(sample_rate, MAX_BLOCK));
        widener
    }

    /// Run a block of deterministic, non-zero input so the delay line
    /// holds something other than silence.
    fn fill_history(widener: &mut StereoWidener) {
        let mut left: Vec<f32> = (0..MAX_BLOCK).map(|i| (i as f32 * 0.37).sin()).collect();
        let mut right: Vec<f32> = (0..MAX_BLOCK).map(|i| (i as f32 * 0.11).cos()).collect();
        widener.process_block(&mut left, &mut right, 7.3, 0.8);
    }

    #[test]
    fn test_capacity_follows_sample_rate() {
        assert_eq!(delay_capacity(44100.0).map(NonZeroUsize::get), Some(441));
        assert_eq!(delay_capacity(48000.0).map(NonZeroUsize::get), Some(480));
        assert_eq!(delay_capacity(96000.0).map(NonZeroUsize::get), Some(960));

        // Below 100 Hz a 10 ms ring holds no samples at all.
        assert_eq!(delay_capacity(99.0), None);
        assert_eq!(delay_capacity(0.0), None);
        assert_eq!(delay_capacity(-48000.0), None);
        assert_eq!(delay_capacity(f32::NAN), None);
        assert_eq!(delay_capacity(f32::INFINITY), None);
    }

    #[test]
    fn test_delay_in_samples_clamping() {
        // 5 ms at 48 kHz is exactly 240 samples.
        assert_eq!(delay_in_samples(5.0, SAMPLE_RATE, 480), 240.0);

        // Short and negative delays are raised to the minimum.
        assert_eq!(delay_in_samples(0.0, SAMPLE_RATE, 480), MIN_DELAY_SAMPLES);
        assert_eq!(delay_in_samples(-3.0, SAMPLE_RATE, 480), MIN_DELAY_SAMPLES);
        assert_eq!(delay_in_samples(f32::NAN, SAMPLE_RATE, 480), MIN_DELAY_SAMPLES);

        // The full 10 ms would land on the write head, so it is pulled
        // back one sample. Anything longer is too.
        assert_eq!(delay_in_samples(10.0, SAMPLE_RATE, 480), 479.0);
        assert_eq!(delay_in_samples(250.0, SAMPLE_RATE, 480), 479.0);
        assert_eq!(delay_in_samples(f32::INFINITY, SAMPLE_RATE, 480), 479.0);

        // Tiny rings: the upper bound wins over the minimum.
        assert_eq!(delay_in_samples(5.0, SAMPLE_RATE, 2), 1.0);
        assert_eq!(delay_in_samples(5.0, SAMPLE_RATE, 1), 0.0);
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut widener = StereoWidener::new();
        assert_eq!(widener.lifecycle(), Lifecycle::Unprepared);
        assert_eq!(widener.capacity(), 0);

        assert!(widener.prepare(SAMPLE_RATE, MAX_BLOCK));
        assert_eq!(widener.lifecycle(), Lifecycle::Prepared);
        assert_eq!(widener.capacity(), 480);

        widener.release();
        assert_eq!(widener.lifecycle(), Lifecycle::Released);

        // The cycle may repeat, including at a different sample rate.
        assert!(widener.prepare(96000.0, MAX_BLOCK));
        assert_eq!(widener.lifecycle(), Lifecycle::Prepared);
        assert_eq!(widener.capacity(), 960);
    }

    #[test]
    fn test_prepare_rejects_unusable_sample_rate() {
        let mut widener = StereoWidener::new();
        assert!(!widener.prepare(0.0, MAX_BLOCK));
        assert!(!widener.prepare(f32::NAN, MAX_BLOCK));
        assert_eq!(widener.lifecycle(), Lifecycle::Unprepared);

        // A failed prepare leaves an already prepared processor alone.
        assert!(widener.prepare(SAMPLE_RATE, MAX_BLOCK));
        assert!(!widener.prepare(50.0, MAX_BLOCK));
        assert_eq!(widener.lifecycle(), Lifecycle::Prepared);
        assert_eq!(widener.capacity(), 480);
    }

    /// The 48 kHz / 5 ms scenario: an impulse on the left input comes
    /// back 240 samples later, inverted on the left and upright on the
    /// right, and nowhere else.
    #[test]
    fn test_impulse_returns_after_delay() {
        let mut widener = prepared(SAMPLE_RATE);

        let mut left = vec![0.0_f32; 300];
        let mut right = vec![0.0_f32; 300];
        left[0] = 1.0;

        widener.process_block(&mut left, &mut right, 5.0, 1.0);

        assert!((left[240] + 1.0).abs() < 1e-6, "left[240] = {}", left[240]);
        assert!((right[240] - 1.0).abs() < 1e-6, "right[240] = {}", right[240]);

        for i in (0..300).filter(|&i| i != 240) {
            assert!(left[i].abs() < 1e-6, "left[{i}] = {}", left[i]);
            assert!(right[i].abs() < 1e-6, "right[{i}] = {}", right[i]);
        }
    }

    /// At mix = 0 the output is the input, whatever the delay line holds.
    #[test]
    fn test_mix_zero_is_dry() {
        let mut widener = prepared(SAMPLE_RATE);
        fill_history(&mut widener);

        let input_l: Vec<f32> = (0..256).map(|i| (i as f32 * 0.05).sin() * 0.9).collect();
        let input_r: Vec<f32> = (0..256).map(|i| (i as f32 * 0.21).cos() * 0.4).collect();
        let mut left = input_l.clone();
        let mut right = input_r.clone();

        widener.process_block(&mut left, &mut right, 4.2, 0.0);

        assert_eq!(left, input_l);
        assert_eq!(right, input_r);
    }

    /// At mix = 1 the dry input disappears: left is the inverted delayed
    /// mono sum and right is the delayed mono sum.
    #[test]
    fn test_mix_one_is_fully_wet() {
        // 1 kHz gives a 10-sample ring; 5 ms is a 5-sample delay.
        let mut widener = prepared(1000.0);

        let mut left: Vec<f32> = (0..32).map(|i| i as f32).collect();
        let mut right: Vec<f32> = (0..32).map(|i| i as f32 * 0.5).collect();

        widener.process_block(&mut left, &mut right, 5.0, 1.0);

        for n in 0..32 {
            let delayed = if n >= 5 { (n - 5) as f32 * 1.5 } else { 0.0 };
            assert_eq!(left[n], -delayed, "left[{n}]");
            assert_eq!(right[n], delayed, "right[{n}]");
        }
    }

    /// Partial mix: each side is the scaled dry signal plus or minus the
    /// scaled delayed mono sum.
    #[test]
    fn test_partial_mix_blends_dry_and_wet() {
        let mut widener = prepared(1000.0);

        let mut left = vec![1.0_f32; 8];
        let mut right = vec![0.5_f32; 8];

        widener.process_block(&mut left, &mut right, 2.0, 0.25);

        // Before the delay has filled, only the dry signal is heard.
        assert_eq!(left[0], 0.75);
        assert_eq!(right[0], 0.375);
        assert_eq!(left[1], 0.75);

        // From sample 2 on, the 1.5 mono sum is back at 25%.
        assert_eq!(left[2], -0.375 + 0.75);
        assert_eq!(right[2], 0.375 + 0.375);
    }

    #[test]
    fn test_history_carries_across_blocks() {
        let mut widener = prepared(SAMPLE_RATE);

        let mut left = vec![0.0_f32; 200];
        let mut right = vec![0.0_f32; 200];
        right[100] = 1.0;
        widener.process_block(&mut left, &mut right, 5.0, 1.0);

        // The impulse at 100 returns at 340, i.e. index 140 of the next
        // block.
        let mut left = vec![0.0_f32; 200];
        let mut right = vec![0.0_f32; 200];
        widener.process_block(&mut left, &mut right, 5.0, 1.0);

        assert!((left[140] + 1.0).abs() < 1e-6);
        assert!((right[140] - 1.0).abs() < 1e-6);
    }

    /// Release followed by prepare at the same rate reuses the buffer but
    /// leaves no trace of the earlier signal.
    #[test]
    fn test_release_then_prepare_clears_history() {
        let mut widener = prepared(SAMPLE_RATE);
        fill_history(&mut widener);

        widener.release();
        assert!(widener.prepare(SAMPLE_RATE, MAX_BLOCK));

        let delay_line = widener.delay_line.as_ref().unwrap();
        for d in 0..delay_line.capacity() {
            assert_eq!(delay_line.read_delay(d as f32), 0.0, "history at {d}");
        }

        let mut left = vec![0.0_f32; MAX_BLOCK];
        let mut right = vec![0.0_f32; MAX_BLOCK];
        widener.process_block(&mut left, &mut right, 3.0, 1.0);
        assert!(left.iter().chain(&right).all(|&s| s == 0.0));
    }

    #[test]
    fn test_reset_clears_history_but_stays_prepared() {
        let mut widener = prepared(SAMPLE_RATE);
        fill_history(&mut widener);

        widener.reset();
        assert_eq!(widener.lifecycle(), Lifecycle::Prepared);

        let mut left = vec![0.0_f32; 64];
        let mut right = vec![0.0_f32; 64];
        widener.process_block(&mut left, &mut right, 0.5, 1.0);
        assert!(left.iter().chain(&right).all(|&s| s == 0.0));
    }

    /// Out-of-range controls are clamped: a mix above 1 behaves like 1,
    /// a negative or NaN mix like 0.
    #[test]
    fn test_out_of_range_mix_is_clamped() {
        let input: Vec<f32> = (0..64).map(|i| (i as f32 * 0.3).sin()).collect();

        let run = |mix: f32| {
            let mut widener = prepared(SAMPLE_RATE);
            let mut left = input.clone();
            let mut right = input.clone();
            widener.process_block(&mut left, &mut right, 0.1, mix);
            (left, right)
        };

        assert_eq!(run(3.0), run(1.0));
        assert_eq!(run(-0.5), run(0.0));
        assert_eq!(run(f32::NAN), run(0.0));
    }

    #[test]
    fn test_process_before_prepare_leaves_block_untouched() {
        let mut widener = StereoWidener::new();

        let mut left = vec![0.3_f32; 16];
        let mut right = vec![-0.2_f32; 16];
        widener.process_block(&mut left, &mut right, 5.0, 1.0);

        assert!(left.iter().all(|&s| s == 0.3));
        assert!(right.iter().all(|&s| s == -0.2));
    }
}
