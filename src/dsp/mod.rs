//! # DSP (Digital Signal Processing) Core
//!
//! - **`delay_line`**: a fixed-size ring buffer that remembers the last few
//!   milliseconds of a signal and reads it back at fractional offsets.
//!
//! - **`widener`**: the per-block stereo widening algorithm. It pushes the
//!   mono sum through one delay line and mixes the result back into the
//!   left and right channels with opposite polarity.

pub mod delay_line;
pub mod widener;
