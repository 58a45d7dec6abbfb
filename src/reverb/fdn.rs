//! Feedback Delay Network - Statistical Late Reverberation
//!
//! N delay lines run in parallel. Every output is filtered, mixed with all
//! other outputs through an orthogonal matrix and fed back into the inputs:
//!
//! ```text
//!            ┌──────────────── M (N×N, orthogonal) ◄───────────┐
//!            │                                                  │
//!  x ──(+)──►│─► [delay 0] ─► [decay filter 0] ─┬──────────────►│
//!            │─► [delay 1] ─► [decay filter 1] ─┼──────────────►│
//!            │       ⋮                ⋮          │               │
//!            └─► [delay N-1] ► [decay filter N-1]┴──────────────►┘
//!                                                │
//!                                   path p ──► channel p mod C
//! ```
//!
//! The matrix only redistributes energy, so how fast the tail dies is set
//! entirely by the per-band decay weights. A path of `D` samples that should
//! lose 60 dB in `T60` seconds gets the weight
//!
//! ```text
//! w = 10^(-3·D / (T60·fs)) = exp(-3·ln(10)·D / (T60·fs))
//! ```
//!
//! Delay lengths follow the room: path `p` uses the extent of axis `p mod 3`
//! plus a random jitter of up to ±10 % of the mean extent, so the modes of
//! the network do not line up.

use std::f32::consts::LN_10;

use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::render::{clear_outputs, AudioRender};
use crate::dsp::{FilteredDelay, Matrix};
use crate::error::{Result, ReverbError};
use crate::{N_BANDS, SPEED_OF_SOUND};

/// Jitter applied to every path length, as a fraction of the mean extent.
const DELAY_JITTER: f32 = 0.1;

/// Extents used until a room is set.
pub const DEFAULT_FDN_ROOM: [f32; 3] = [5.0, 7.0, 3.5];
pub const DEFAULT_T60: [f32; N_BANDS] = [2.0, 1.0, 0.2];

/// Per-band feedback weight for a path of `delay` samples.
///
/// Non-positive or non-finite reverberation times give 0 (no feedback).
pub fn decay_weight(delay: usize, t60: f32, sample_rate: f32) -> f32 {
    if !(t60.is_finite() && t60 > 0.0) {
        return 0.0;
    }
    (-3.0 * LN_10 * delay as f32 / (t60 * sample_rate)).exp()
}

pub struct Fdn {
    sample_rate: f32,
    n_channels: usize,
    paths: Vec<FilteredDelay>,
    matrix: Matrix,
    delay_out: Vec<f32>,
    matrix_out: Vec<f32>,
    t60: [f32; N_BANDS],
    room: [f32; 3],
    rng: ChaCha8Rng,
}

impl Fdn {
    /// Build a network of `n_paths` lines able to model rooms up to
    /// `max_extent` meters along any axis.
    ///
    /// `seed` makes the delay jitter reproducible.
    pub fn new(
        sample_rate: f32,
        n_paths: usize,
        n_channels: usize,
        crossovers: [f32; 2],
        max_extent: f32,
        seed: Option<u64>,
    ) -> Result<Self> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(ReverbError::InvalidSampleRate(sample_rate));
        }
        if n_channels == 0 {
            return Err(ReverbError::InvalidChannelCount(n_channels));
        }
        if !(max_extent.is_finite() && max_extent > 0.0) {
            return Err(ReverbError::InvalidRoom {
                x: max_extent,
                y: max_extent,
                z: max_extent,
            });
        }
        let matrix = Matrix::hadamard(n_paths)?;

        let max_delay =
            ((max_extent * (1.0 + DELAY_JITTER)) / SPEED_OF_SOUND * sample_rate).ceil() as usize + 1;
        let paths = (0..n_paths)
            .map(|_| FilteredDelay::new(max_delay, crossovers, sample_rate))
            .collect();

        let seed = seed.unwrap_or_else(rand::random);
        let room = DEFAULT_FDN_ROOM.map(|e| e.min(max_extent));
        let mut fdn = Self {
            sample_rate,
            n_channels,
            paths,
            matrix,
            delay_out: vec![0.0; n_paths],
            matrix_out: vec![0.0; n_paths],
            t60: DEFAULT_T60,
            room,
            rng: ChaCha8Rng::seed_from_u64(seed),
        };
        fdn.set_room(room[0], room[1], room[2]);

        debug!(
            "fdn: {} paths -> {} channels at {} Hz, seed {}, max delay {} samples",
            n_paths, n_channels, sample_rate, seed, max_delay
        );
        Ok(fdn)
    }

    /// Process one block. Each output channel gets `input.len()` samples,
    /// added on top of what it already holds.
    pub fn process<O: AsMut<[f32]>>(&mut self, input: &[f32], outputs: &mut [O]) {
        debug_assert!(outputs.len() >= self.n_channels);
        let scale = 1.0 / self.n_channels as f32;

        for (i, &x) in input.iter().enumerate() {
            for ((path, out), fb) in self
                .paths
                .iter_mut()
                .zip(self.delay_out.iter_mut())
                .zip(self.matrix_out.iter())
            {
                *out = path.process(fb + x);
            }

            for (p, &y) in self.delay_out.iter().enumerate() {
                outputs[p % self.n_channels].as_mut()[i] += y * scale;
            }

            self.matrix.apply(&self.delay_out, &mut self.matrix_out);
        }
    }

    /// Target reverberation time of one band. Out-of-range bands are ignored.
    pub fn set_t60(&mut self, t60: f32, band: usize) {
        if band >= N_BANDS {
            return;
        }
        self.t60[band] = t60;
        for path in &mut self.paths {
            let weight = decay_weight(path.delay(), t60, self.sample_rate);
            path.set_weight(band, weight);
        }
    }

    /// Re-derive every band weight from the stored reverberation times.
    pub fn update_t60(&mut self) {
        for band in 0..N_BANDS {
            self.set_t60(self.t60[band], band);
        }
    }

    pub fn set_crossovers(&mut self, low_hz: f32, high_hz: f32) {
        for path in &mut self.paths {
            path.set_crossovers(low_hz, high_hz);
        }
    }

    /// Draw new path lengths for a room of the given extents, then refresh
    /// the decay weights to match.
    pub fn set_room(&mut self, x: f32, y: f32, z: f32) {
        self.room = [x, y, z];
        let mean = (x + y + z) / 3.0;
        for (p, path) in self.paths.iter_mut().enumerate() {
            let jitter = mean * self.rng.random_range(-DELAY_JITTER..DELAY_JITTER);
            let length = ((self.room[p % 3] + jitter) / SPEED_OF_SOUND * self.sample_rate).round();
            path.set_delay(length.max(1.0) as usize);
        }
        self.update_t60();
    }

    pub fn room(&self) -> [f32; 3] {
        self.room
    }

    /// Reverberation time of `band`; 0 for bands the network does not have.
    pub fn t60(&self, band: usize) -> f32 {
        self.t60.get(band).copied().unwrap_or(0.0)
    }

    pub fn n_paths(&self) -> usize {
        self.paths.len()
    }

    pub fn delay(&self, path: usize) -> usize {
        self.paths[path].delay()
    }

    pub fn band_weight(&self, path: usize, band: usize) -> f32 {
        self.paths[path].weight(band)
    }

    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}

impl AudioRender for Fdn {
    fn render(&mut self, input: &[f32], outputs: &mut [&mut [f32]]) {
        clear_outputs(outputs, input.len());
        self.process(input, outputs);
    }

    fn n_channels(&self) -> usize {
        self.n_channels
    }

    fn reset(&mut self) {
        for path in &mut self.paths {
            path.reset();
        }
        self.delay_out.fill(0.0);
        self.matrix_out.fill(0.0);
    }
}
