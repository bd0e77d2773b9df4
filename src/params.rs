//! # Plugin Parameters
//!
//! The widener exposes two knobs:
//!
//! - **Delay**: how far (in milliseconds) the mono sum lags behind the dry
//!   signal before it is mixed back in.
//! - **Mix**: how much of that delayed, polarity-split signal replaces the
//!   dry signal.
//!
//! Each `FloatParam` keeps its current value in an atomic, so the host or
//! the UI can move a knob on one thread while the audio thread reads it
//! on another. The audio thread never sees a half-written value and never
//! takes a lock.
//!
//! ## No Smoothing
//!
//! Neither parameter has a smoother. The audio thread reads both once at
//! the start of each block and holds them for the whole block, so a jump
//! between blocks is a jump in the output. Fast automation can click.

use nih_plug::prelude::*;

use crate::dsp::widener::MAX_DELAY_MS;

/// All user-facing parameters for the Mono To Stereo plugin.
///
/// The IDs (`"delay"`, `"mix"`) are what the host stores in sessions and
/// presets. Never rename them.
#[derive(Params)]
pub struct WidenerParams {
    /// **Delay** — lag of the delayed mono sum, 0 to 10 ms.
    ///
    /// Very short values (under ~2 ms) mostly colour the sound like a
    /// comb filter; 5-10 ms gives the widest image before the ear starts
    /// to pick out a separate slap.
    ///
    /// The processor never reads closer than two samples behind the write
    /// head, so 0 ms behaves like the two-sample minimum.
    #[id = "delay"]
    pub delay_time: FloatParam,

    /// **Mix** — 0% is the untouched input, 100% is only the delayed mono
    /// sum (inverted on the left, upright on the right).
    #[id = "mix"]
    pub mix: FloatParam,
}

impl Default for WidenerParams {
    fn default() -> Self {
        Self {
            delay_time: FloatParam::new(
                "Delay",
                5.0, // Default: 5 ms, the middle of the range
                FloatRange::Linear {
                    min: 0.0,
                    max: MAX_DELAY_MS,
                },
            )
            .with_unit(" ms")
            .with_value_to_string(formatters::v2s_f32_rounded(2)),

            mix: FloatParam::new(
                "Mix",
                0.50, // Default: 50%
                FloatRange::Linear { min: 0.0, max: 1.0 },
            )
            .with_unit("%")
            // Display as percentage: 0.50 → "50.0%"
            .with_value_to_string(formatters::v2s_f32_percentage(1))
            .with_string_to_value(formatters::s2v_f32_percentage()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
