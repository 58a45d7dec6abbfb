//! Image-Source Model - Geometric Early Reflections
//!
//! Every wall reflection is modelled as a virtual "image" source: the real
//! source mirrored across the wall. Higher reflection orders mirror the
//! images again. Each image becomes one delayed, attenuated copy of the
//! input, panned to the output channel facing it.
//!
//! # Signal flow
//!
//! ```text
//!                        ┌─ Σ w[1][b]·band ─► [line 1] ─► taps(ch, 1) ─┐
//!  x ─► [crossover] ─┬──►├─ Σ w[2][b]·band ─► [line 2] ─► taps(ch, 2) ─┼─► Σ ─► channel ch
//!      low/mid/high  │   └─ ...                                         ┘
//! ```
//!
//! One delay line per reflection order carries the input filtered with that
//! order's band weights (each bounce absorbs a little more, faster at high
//! frequencies). Every channel reads that line at the arrival delays of the
//! images panned to it.
//!
//! # Geometry refresh
//!
//! Moving the source, the listener or a wall marks the geometry dirty. The
//! next block recomputes all images once:
//!
//! - `gain  = min(1 / distance, 1)`
//! - `delay = round((distance − direct) / c · fs)`, relative to the direct path
//! - azimuth from the listener picks two adjacent channels, split linearly
//!
//! The new taps fade in over [`TAP_FADE_SAMPLES`] while the old ones fade
//! out. Changes arriving during a fade wait for it to finish. A source
//! outside the floor plan has no meaningful reflections: all taps are
//! dropped at once and the engine goes silent.
//!
//! # Band weights
//!
//! Sabine's formula relates reverberation time to the mean absorption
//! `α = 24·ln(10)·V / (c·S·T60)`. One bounce keeps `1 − α` of the energy, so
//! order `k` is weighted `(1 − α)^k`.

use std::f32::consts::{LN_10, PI, TAU};

use log::debug;

use super::render::{clear_outputs, AudioRender};
use crate::dsp::{Crossover, DelayLine, Tap, TapTable};
use crate::error::{Result, ReverbError};
use crate::geometry::{shell_size, MirrorSourceSet, Room, Vector3D};
use crate::{MAX_BLOCK_SIZE, N_BANDS, SPEED_OF_SOUND};

/// Crossfade length when the tap set changes.
pub const TAP_FADE_SAMPLES: usize = 512;
/// Per-bounce band weights used until a reverberation time is set.
pub const DEFAULT_BAND_WEIGHTS: [f32; N_BANDS] = [0.9, 0.8, 0.7];

const MIN_DISTANCE: f32 = 1e-6;

/// One image source as heard from the listener.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reflection {
    pub position: Vector3D,
    pub distance: f32,
    /// Direction from the listener, radians.
    pub azimuth: f32,
    /// Arrival after the direct sound, samples.
    pub delay: usize,
    /// Distance attenuation before panning.
    pub gain: f32,
    /// Channel closest to the azimuth.
    pub channel: usize,
}

/// Energy kept per bounce for a room of `volume` and `surface` reverberating
/// for `t60` seconds, in [0, 1].
pub fn sabine_estimate(volume: f32, surface: f32, t60: f32) -> f32 {
    let valid = |v: f32| v.is_finite() && v > 0.0;
    if !(valid(volume) && valid(surface) && valid(t60)) {
        return 0.0;
    }
    (1.0 - 24.0 * LN_10 * volume / (SPEED_OF_SOUND * t60 * surface)).clamp(0.0, 1.0)
}

/// Azimuth of every output channel: evenly spaced from +x, counter-clockwise,
/// wrapped into (-π, π].
pub fn channel_azimuths(n_channels: usize) -> impl Iterator<Item = f32> {
    (0..n_channels).map(move |c| {
        let a = TAU * c as f32 / n_channels as f32;
        if a > PI {
            a - TAU
        } else {
            a
        }
    })
}

/// Split an azimuth between the nearest channel and the next one towards it.
///
/// Returns `((nearest, weight), (neighbour, weight))`; the weights sum to one
/// and move linearly with the angle, so a source circling the listener pans
/// without jumps.
pub fn pan(azimuth: f32, n_channels: usize) -> ((usize, f32), (usize, f32)) {
    if n_channels <= 1 {
        return ((0, 1.0), (0, 0.0));
    }
    let pos = azimuth / (TAU / n_channels as f32);
    let nearest = pos.round();
    let offset = pos - nearest;
    let n = n_channels as i64;
    let channel = (nearest as i64).rem_euclid(n) as usize;
    let neighbour = if offset >= 0.0 {
        (channel + 1) % n_channels
    } else {
        (channel + n_channels - 1) % n_channels
    };
    let t = offset.abs();
    ((channel, 1.0 - t), (neighbour, t))
}

pub struct IsmVerb {
    sample_rate: f32,
    block_size: usize,
    n_channels: usize,
    order: usize,

    room: Room,
    source: Vector3D,
    listener: Vector3D,
    dirty: bool,
    tracked_id: u32,
    tracking: bool,

    mirrors: MirrorSourceSet,
    shell: Vec<Vector3D>,
    reflections: Vec<Vec<Reflection>>,
    dropped_taps: usize,

    current: TapTable,
    previous: TapTable,
    fade_pos: usize,

    crossover: Crossover,
    bands: Vec<[f32; N_BANDS]>,
    lines: Vec<DelayLine>,
    max_delay: usize,

    t60: [Option<f32>; N_BANDS],
    band_weights: Vec<[f32; N_BANDS]>,
}

impl IsmVerb {
    /// Engine rendering reflections up to `order` onto `n_channels`.
    ///
    /// `max_delay` bounds every reflection's arrival (samples after the
    /// direct sound); later reflections are dropped.
    pub fn new(
        room: Room,
        order: usize,
        sample_rate: f32,
        block_size: usize,
        n_channels: usize,
        max_delay: usize,
        crossovers: [f32; 2],
    ) -> Result<Self> {
        if order == 0 {
            return Err(ReverbError::InvalidOrder(order));
        }
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(ReverbError::InvalidSampleRate(sample_rate));
        }
        if block_size == 0 || block_size > MAX_BLOCK_SIZE {
            return Err(ReverbError::InvalidBlockSize(block_size));
        }
        if n_channels == 0 {
            return Err(ReverbError::InvalidChannelCount(n_channels));
        }

        let [x, y, z] = room.dimensions();
        let band_weights = (1..=order)
            .map(|k| DEFAULT_BAND_WEIGHTS.map(|w| w.powi(k as i32)))
            .collect();

        debug!(
            "ism: order {} -> {} channels at {} Hz, max delay {} samples",
            order, n_channels, sample_rate, max_delay
        );

        Ok(Self {
            sample_rate,
            block_size,
            n_channels,
            order,
            room,
            source: Vector3D::new(x, y, z) / 3.0,
            listener: Vector3D::new(x, y, z) * (2.0 / 3.0),
            dirty: true,
            tracked_id: 0,
            tracking: false,
            mirrors: MirrorSourceSet::new(order),
            shell: vec![Vector3D::ZERO; shell_size(order)],
            reflections: (1..=order).map(|k| Vec::with_capacity(shell_size(k))).collect(),
            dropped_taps: 0,
            current: TapTable::new(n_channels, order),
            previous: TapTable::new(n_channels, order),
            fade_pos: TAP_FADE_SAMPLES,
            crossover: Crossover::new(crossovers[0], crossovers[1], sample_rate),
            bands: vec![[0.0; N_BANDS]; block_size],
            lines: (0..order).map(|_| DelayLine::new(max_delay)).collect(),
            max_delay,
            t60: [None; N_BANDS],
            band_weights,
        })
    }

    pub fn set_source(&mut self, source: Vector3D) {
        if source.is_finite() && source != self.source {
            self.source = source;
            self.dirty = true;
        }
    }

    pub fn set_listener(&mut self, listener: Vector3D) {
        if listener.is_finite() && listener != self.listener {
            self.listener = listener;
            self.dirty = true;
        }
    }

    /// Resize the room; band weights follow the new volume and surface.
    pub fn set_room_dimensions(&mut self, x: f32, y: f32, z: f32) -> Result<()> {
        self.room.set_dimensions(x, y, z)?;
        for band in 0..N_BANDS {
            if let Some(t60) = self.t60[band] {
                self.set_t60(t60, band);
            }
        }
        self.dirty = true;
        Ok(())
    }

    /// Derive the band weights of every order from a reverberation time.
    pub fn set_t60(&mut self, t60: f32, band: usize) {
        if band >= N_BANDS {
            return;
        }
        self.t60[band] = Some(t60);
        let estimate = sabine_estimate(self.room.volume(), self.room.surface(), t60);
        for (k, weights) in self.band_weights.iter_mut().enumerate() {
            weights[band] = estimate.powi(k as i32 + 1);
        }
    }

    pub fn set_crossovers(&mut self, low_hz: f32, high_hz: f32) {
        self.crossover.set_frequencies(low_hz, high_hz);
    }

    pub fn set_tracked_source(&mut self, id: u32) {
        self.tracked_id = id;
    }

    pub fn tracked_source(&self) -> u32 {
        self.tracked_id
    }

    pub fn set_tracking(&mut self, tracking: bool) {
        self.tracking = tracking;
    }

    pub fn tracking(&self) -> bool {
        self.tracking
    }

    pub fn source(&self) -> Vector3D {
        self.source
    }

    pub fn listener(&self) -> Vector3D {
        self.listener
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn max_delay(&self) -> usize {
        self.max_delay
    }

    pub fn channel_azimuths(&self) -> impl Iterator<Item = f32> {
        channel_azimuths(self.n_channels)
    }

    /// Reflections of one order from the last geometry refresh.
    pub fn reflections(&self, order: usize) -> &[Reflection] {
        order
            .checked_sub(1)
            .and_then(|k| self.reflections.get(k))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Active taps of one (channel, order) slot.
    pub fn taps(&self, channel: usize, order: usize) -> &[Tap] {
        self.current.taps(channel, order)
    }

    /// Reflections dropped because they arrive later than the delay lines
    /// can hold.
    pub fn dropped_taps(&self) -> usize {
        self.dropped_taps
    }

    /// Weight of `band` at reflection `order` (1-based). 0 outside the
    /// engine's orders and bands.
    pub fn band_weight(&self, order: usize, band: usize) -> f32 {
        order
            .checked_sub(1)
            .and_then(|k| self.band_weights.get(k))
            .and_then(|weights| weights.get(band))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn is_silent(&self) -> bool {
        self.current.is_empty() && self.previous.is_empty()
    }

    /// A pending geometry change waits for the running tap fade to finish,
    /// so `previous` never loses weight it still carries. Muting for a
    /// source outside the room is not deferred.
    fn refresh_due(&self) -> bool {
        self.dirty
            && (self.fade_pos >= TAP_FADE_SAMPLES || !self.room.contains_horizontal(self.source))
    }

    /// Recompute the image sources now instead of at the next block.
    ///
    /// Unlike the deferred refresh in [`process`](Self::process), this cuts a
    /// running tap fade short.
    pub fn refresh(&mut self) {
        self.dirty = false;
        self.dropped_taps = 0;
        for reflections in &mut self.reflections {
            reflections.clear();
        }

        if !self.room.contains_horizontal(self.source) {
            self.current.clear();
            self.previous.clear();
            self.fade_pos = TAP_FADE_SAMPLES;
            return;
        }

        std::mem::swap(&mut self.current, &mut self.previous);
        self.current.clear();
        self.fade_pos = 0;

        self.room.mirror_point(self.source, self.order, &mut self.mirrors);
        let direct = self.listener.distance_to(self.source);
        let samples_per_meter = self.sample_rate / SPEED_OF_SOUND;

        for k in 1..=self.order {
            let n = self.room.extract_order(k, &self.mirrors, &mut self.shell);
            for &position in &self.shell[..n] {
                let distance = self.listener.distance_to(position);
                let gain = if distance <= MIN_DISTANCE {
                    1.0
                } else {
                    (1.0 / distance).min(1.0)
                };
                let delay = ((distance - direct) * samples_per_meter).round().max(0.0) as usize;
                if delay > self.max_delay {
                    self.dropped_taps += 1;
                    continue;
                }
                let azimuth = self.listener.azimuth_to(position);
                let ((channel, near), (neighbour, far)) = pan(azimuth, self.n_channels);

                self.reflections[k - 1].push(Reflection {
                    position,
                    distance,
                    azimuth,
                    delay,
                    gain,
                    channel,
                });

                if !self.current.push(channel, k, Tap { delay, gain: gain * near }) {
                    self.dropped_taps += 1;
                }
                if far > 0.0
                    && neighbour != channel
                    && !self.current.push(neighbour, k, Tap { delay, gain: gain * far })
                {
                    self.dropped_taps += 1;
                }
            }
        }
    }

    /// Render `input.len()` frames, adding into each channel.
    pub fn process<O: AsMut<[f32]>>(&mut self, input: &[f32], outputs: &mut [O]) {
        debug_assert!(outputs.len() >= self.n_channels);

        for (chunk_idx, chunk) in input.chunks(self.block_size).enumerate() {
            let start = chunk_idx * self.block_size;
            if self.refresh_due() {
                self.refresh();
            }
            for (band, &x) in self.bands.iter_mut().zip(chunk) {
                *band = self.crossover.process(x);
            }

            for (i, bands) in self.bands[..chunk.len()].iter().enumerate() {
                for (line, weights) in self.lines.iter_mut().zip(&self.band_weights) {
                    line.write(bands[0] * weights[0] + bands[1] * weights[1] + bands[2] * weights[2]);
                }

                let fading = self.fade_pos < TAP_FADE_SAMPLES;
                let alpha = if fading {
                    self.fade_pos += 1;
                    self.fade_pos as f32 / TAP_FADE_SAMPLES as f32
                } else {
                    1.0
                };

                for (ch, out) in outputs.iter_mut().take(self.n_channels).enumerate() {
                    let mut acc = 0.0;
                    for (k, line) in self.lines.iter().enumerate() {
                        acc += self.current.read(ch, k + 1, line) * alpha;
                        if fading {
                            acc += self.previous.read(ch, k + 1, line) * (1.0 - alpha);
                        }
                    }
                    out.as_mut()[start + i] += acc;
                }
            }
        }
    }
}

impl AudioRender for IsmVerb {
    fn render(&mut self, input: &[f32], outputs: &mut [&mut [f32]]) {
        clear_outputs(outputs, input.len());
        self.process(input, outputs);
    }

    fn n_channels(&self) -> usize {
        self.n_channels
    }

    fn reset(&mut self) {
        self.crossover.reset();
        for line in &mut self.lines {
            line.reset();
        }
    }
}
