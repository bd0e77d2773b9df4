//! # Delay Line (Ring Buffer)
//!
//! A delay line remembers the most recent N samples of a single-channel
//! signal and lets you read them back from any point in that history,
//! including positions *between* two stored samples.
//!
//! ## How the Ring Buffer Works
//!
//! Picture a circular tape loop with one write head. Every sample the
//! write head records overwrites the oldest sample on the loop, then the
//! head steps forward by one slot. When it runs off the end of the
//! `Vec<f32>` it wraps back to slot 0:
//!
//! ```text
//!             write_head
//!                 ▼
//!   [ 4.0 | 5.0 | 2.0 | 3.0 ]     capacity = 4
//!     newer ◄──┘    └──► oldest
//! ```
//!
//! The slot directly under the write head always holds the *oldest*
//! sample, and the slot just behind it holds the *newest*.
//!
//! ## Fractional Readout
//!
//! To read `d` samples into the past we step back `d` slots from the write
//! head. When `d` isn't a whole number (e.g. 240.37 samples for a delay
//! time that is being automated), we blend the two neighbouring slots:
//!
//! ```text
//! read_pos = write_head + capacity - d
//! i0       = floor(read_pos) mod capacity     (older tap)
//! i1       = (i0 + 1) mod capacity            (newer tap)
//! frac     = read_pos - floor(read_pos)
//! result   = storage[i0] * (1 - frac) + storage[i1] * frac
//! ```
//!
//! Adding `capacity` before subtracting keeps `read_pos` non-negative for
//! every legal `d`, so a single modulo brings it back onto the ring.
//!
//! Linear interpolation slightly dulls the very top of the spectrum, but
//! it removes the pitch "stepping" you'd otherwise hear when the delay
//! time slides between whole sample positions.

use std::num::NonZeroUsize;

use nih_plug::nih_debug_assert;

/// A fixed-capacity circular buffer with interpolated read access.
///
/// The storage is allocated exactly once in [`new()`](Self::new). Reads
/// and writes never allocate, so both are safe to call from the audio
/// thread.
pub struct DelayLine {
    /// The ring itself. Starts out as silence (0.0).
    storage: Vec<f32>,

    /// Index of the slot the *next* [`write()`](Self::write) fills.
    /// Always `< capacity`.
    write_head: usize,

    /// Number of slots in `storage`. Cached so the wrap-around arithmetic
    /// reads naturally, and `NonZeroUsize` so a zero-length ring (which
    /// would turn every modulo into a division by zero) can't exist.
    capacity: NonZeroUsize,
}

impl DelayLine {
    /// Allocate a silent delay line holding `capacity` samples.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            storage: vec![0.0; capacity.get()],
            write_head: 0,
            capacity,
        }
    }

    /// The ring length in samples.
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Silence the whole ring and move the write head back to slot 0.
    ///
    /// Called whenever the stream restarts so that leftover transients
    /// (or denormals) from the last run never reach the output.
    pub fn clear(&mut self) {
        self.storage.fill(0.0);
        self.write_head = 0;
    }

    /// Store `sample` under the write head, then advance the head by one,
    /// wrapping to 0 at the end of the ring.
    ///
    /// Unlike a read-modify-advance design, the head moves as part of the
    /// write: anything you want to read relative to the *current* sample
    /// has to be read first.
    pub fn write(&mut self, sample: f32) {
        self.storage[self.write_head] = sample;

        self.write_head += 1;
        if self.write_head >= self.capacity.get() {
            self.write_head = 0;
        }
    }

    /// Peek at the slot under the write head without interpolating.
    ///
    /// That slot is the one about to be overwritten, i.e. the oldest
    /// sample still in the ring.
    #[allow(dead_code)]
    pub fn read(&self) -> f32 {
        self.storage[self.write_head]
    }

    /// Read the signal `delay_samples` samples before the next write
    /// position, linearly interpolating between the two closest slots.
    ///
    /// `delay_samples` must lie in `[0, capacity)`. Keeping it there is the
    /// caller's job; a request outside that window is flagged in debug
    /// builds and would otherwise alias stale history.
    pub fn read_delay(&self, delay_samples: f32) -> f32 {
        let capacity = self.capacity.get();
        nih_debug_assert!(delay_samples >= 0.0 && delay_samples < capacity as f32);

        let read_pos = (self.write_head + capacity) as f32 - delay_samples;
        let floor = read_pos.floor();

        // `read_pos` is at most `2 * capacity`, so one modulo per tap is
        // enough to land back inside the ring.
        let i0 = floor as usize % capacity;
        let i1 = (i0 + 1) % capacity;
        let frac = read_pos - floor;

        self.storage[i0] * (1.0 - frac) + self.storage[i1] * frac
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
