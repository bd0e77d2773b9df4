//! # Mono To Stereo — An AU/VST3/CLAP Stereo Widener
//!
//! A small stereo-widening plugin built with
//! [nih-plug](https://github.com/robbert-vdh/nih-plug). It takes a stereo
//! track that sounds narrow (or a mono source on a stereo bus) and spreads
//! it out with a Haas-style trick: the mono sum is delayed by a few
//! milliseconds and added back with opposite polarity on each side.
//!
//! ## Signal Flow
//!
//! ```text
//! L ──┬────────────────────────────────────────── × (1 - mix) ──►(+)──► L
//!     │                                                           ▲
//!    (+)──► [Delay Line, ≤ 10 ms] ──► × mix ──┬──► × -1 ──────────┘
//!     │      (one ring, mono sum)             │
//! R ──┴────────────────────────────────────── │ ─ × (1 - mix) ──►(+)──► R
//!                                             └───────────────────┘
//! ```
//!
//! The plugin itself is a thin shell: it maps the host's lifecycle calls
//! onto [`StereoWidener`] and hands it the two parameter values once per
//! block. All DSP lives in [`dsp`].

mod dsp;
mod params;

use std::num::NonZeroU32;
use std::sync::Arc;

use dsp::widener::{StereoWidener, MAX_DELAY_MS};
use nih_plug::prelude::*;
use params::WidenerParams;

/// The main plugin struct.
///
/// `params` is shared with the host and the UI thread via `Arc`; the
/// widener (and the delay line inside it) is owned by the audio thread
/// alone.
struct MonoToStereo {
    params: Arc<WidenerParams>,
    widener: StereoWidener,
}

impl Default for MonoToStereo {
    fn default() -> Self {
        Self {
            params: Arc::new(WidenerParams::default()),
            // Unprepared: the delay line is only allocated in initialize(),
            // once the host has told us the sample rate.
            widener: StereoWidener::new(),
        }
    }
}

impl Plugin for MonoToStereo {
    const NAME: &'static str = "Mono To Stereo";
    const VENDOR: &'static str = "Mono To Stereo";
    const URL: &'static str = "";
    const EMAIL: &'static str = "";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    // Stereo in, stereo out, nothing else. The effect reads two inputs
    // and writes two outputs; a mono layout would leave it nothing to
    // widen into.
    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[AudioIOLayout {
        main_input_channels: NonZeroU32::new(2),
        main_output_channels: NonZeroU32::new(2),
        aux_input_ports: &[],
        aux_output_ports: &[],
        names: PortNames::const_default(),
    }];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;

    // Parameters are read once per block, so there is nothing to gain
    // from the host splitting blocks at automation points.
    const SAMPLE_ACCURATE_AUTOMATION: bool = false;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    /// Size the delay line for the host's sample rate.
    ///
    /// Returning `false` tells the host this configuration can't be used.
    /// That only happens for sample rates so low that 10 ms is less than
    /// one sample.
    fn initialize(
        &mut self,
        _audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        let sample_rate = buffer_config.sample_rate;
        let max_block_size = buffer_config.max_buffer_size as usize;

        if !self.widener.prepare(sample_rate, max_block_size) {
            nih_error!(
                "Sample rate {sample_rate} Hz can't hold {MAX_DELAY_MS} ms of delay, refusing to initialize"
            );
            return false;
        }

        nih_log!(
            "Prepared at {sample_rate} Hz: {} samples of delay, blocks up to {max_block_size}",
            self.widener.capacity()
        );

        true
    }

    /// Called when playback restarts. Clears the delay line so the tail of
    /// the previous run doesn't spill into the first few milliseconds of
    /// the next one.
    fn reset(&mut self) {
        self.widener.reset();
    }

    /// Called when the host deactivates the plugin. The next activation
    /// goes through `initialize()` again.
    fn deactivate(&mut self) {
        self.widener.release();
        nih_log!("Released");
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        // One snapshot per block. Each `value()` is a single atomic load.
        let delay_ms = self.params.delay_time.value();
        let mix = self.params.mix.value();

        widen_channels(&mut self.widener, buffer.as_slice(), delay_ms, mix);

        // At most 10 ms of delay and no feedback: nothing rings on after
        // the input stops that's worth keeping the plugin alive for.
        ProcessStatus::Normal
    }
}

/// Widen channels 0 (left) and 1 (right) in place and silence any channels
/// after them.
///
/// Anything with fewer than two channels is left untouched; the stereo-only
/// layout means the host should never hand us one.
fn widen_channels(
    widener: &mut StereoWidener,
    channels: &mut [&mut [f32]],
    delay_ms: f32,
    mix: f32,
) {
    match channels {
        [left, right, extra @ ..] => {
            widener.process_block(left, right, delay_ms, mix);

            // Outputs past the first two never carry input, and their
            // contents are not guaranteed to be silent.
            for channel in extra {
                channel.fill(0.0);
            }
        }
        channels => {
            nih_debug_assert_failure!("Expected two channels, got {}", channels.len());
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Plugin format trait implementations
// ─────────────────────────────────────────────────────────────────────

impl ClapPlugin for MonoToStereo {
    const CLAP_ID: &'static str = "com.mono-to-stereo.mono-to-stereo";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("Haas-style stereo widener driven by a short delay of the mono sum");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Delay,
    ];
}

impl Vst3Plugin for MonoToStereo {
    // `*b"..."` turns the 16-character ASCII literal into a `[u8; 16]`.
    const VST3_CLASS_ID: [u8; 16] = *b"MonoToStereo_v01";

    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] = &[
        Vst3SubCategory::Fx,
        Vst3SubCategory::Spatial,
        Vst3SubCategory::Stereo,
    ];
}

// ─────────────────────────────────────────────────────────────────────
// Export macros
// ─────────────────────────────────────────────────────────────────────

nih_export_clap!(MonoToStereo);
nih_export_vst3!(MonoToStereo);

// Logic Pro only loads Audio Units; clap-wrapper re-exports the CLAP
// entry point as an AUv2 component.
clap_wrapper::export_auv2!();

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
