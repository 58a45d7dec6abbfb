//! Orchestrator: one FDN tail plus image-source early reflections.
//!
//! ```text
//!              ┌─► Fdn ─────► × fdn_gain ─┐
//!   input ─────┤                          ├─► crossfade(mix) ─► × gain ─► channels
//!              └─► IsmVerb ─► × ism_gain ─┘
//! ```
//!
//! Blocks from the transport are cut into sub-blocks of at most the
//! configured block size. At each sub-block boundary the engine drains
//! queued scene events, picks up every parameter group the control handle
//! flagged, and retargets the gain/mix ramps. The FDN only cares about the
//! room and its filters; source and listener positions go to the image
//! sources alone.

use std::sync::Arc;

use log::{info, warn};

use super::fdn::Fdn;
use super::ism::IsmVerb;
use super::render::AudioRender;
use crate::config::ReverbConfig;
use crate::control::params::{
    DIRTY_CROSSOVERS, DIRTY_LISTENER, DIRTY_ROOM, DIRTY_SOURCE, DIRTY_T60, DIRTY_TRACKING,
};
use crate::control::{ChannelRing, ControlState, ReverbControl, SceneReceiver, SourceTracker};
use crate::dsp::mix::{crossfade, interleave};
use crate::dsp::LinearRamp;
use crate::error::Result;
use crate::geometry::Room;
use crate::{N_BANDS, SPEED_OF_SOUND};

pub struct DynamicFdn {
    sample_rate: f32,
    block_size: usize,
    n_channels: usize,

    fdn: Fdn,
    ism: IsmVerb,
    state: Arc<ControlState>,
    scene: Option<SourceTracker>,

    fdn_buf: Vec<Vec<f32>>,
    ism_buf: Vec<Vec<f32>>,
    mix_buf: Vec<Vec<f32>>,

    gain: LinearRamp,
    mix: LinearRamp,
    fdn_gain: LinearRamp,
    ism_gain: LinearRamp,
}

/// Longest arrival any image source of `order` can have in a room no larger
/// than `max_extent` along each axis, in samples.
fn ism_max_delay(order: usize, max_extent: f32, sample_rate: f32) -> usize {
    let reach = (order + 1) as f32 * max_extent * 3f32.sqrt();
    (reach / SPEED_OF_SOUND * sample_rate).ceil() as usize
}

impl DynamicFdn {
    /// Build both engines and the control handle that steers them.
    pub fn new(config: ReverbConfig) -> Result<(Self, ReverbControl)> {
        config.validate()?;

        let [x, y, z] = config.room;
        let sample_rate = config.sample_rate;
        let n_channels = config.n_channels;
        let block_size = config.block_size;

        let mut fdn = Fdn::new(
            sample_rate,
            config.fdn_paths,
            n_channels,
            config.crossovers,
            config.max_room_extent,
            config.seed,
        )?;
        fdn.set_room(x, y, z);

        let mut ism = IsmVerb::new(
            Room::new(x, y, z)?,
            config.ism_order,
            sample_rate,
            block_size,
            n_channels,
            ism_max_delay(config.ism_order, config.max_room_extent, sample_rate),
            config.crossovers,
        )?;
        ism.set_source(config.source);
        ism.set_listener(config.listener);

        for (band, &t60) in config.t60.iter().enumerate() {
            fdn.set_t60(t60, band);
            ism.set_t60(t60, band);
        }

        let state = Arc::new(ControlState::new(&config));
        let control = ReverbControl::new(state.clone());
        let ramp = config.ramp_samples;

        info!(
            "roomverb: {} Hz, {} channels, {}-path FDN, order-{} ISM, room {}x{}x{} m",
            sample_rate, n_channels, config.fdn_paths, config.ism_order, x, y, z
        );

        let engine = Self {
            sample_rate,
            block_size,
            n_channels,
            fdn,
            ism,
            scene: None,
            fdn_buf: vec![vec![0.0; block_size]; n_channels],
            ism_buf: vec![vec![0.0; block_size]; n_channels],
            mix_buf: vec![vec![0.0; block_size]; n_channels],
            gain: LinearRamp::new(state.gain(), ramp),
            mix: LinearRamp::new(state.mix(), ramp),
            fdn_gain: LinearRamp::new(state.fdn_gain(), ramp),
            ism_gain: LinearRamp::new(state.ism_gain(), ramp),
            state,
        };
        Ok((engine, control))
    }

    /// Feed scene events from `receiver` into the engine. Replaces any
    /// previous receiver.
    pub fn attach_scene(&mut self, receiver: impl SceneReceiver + Send + 'static) {
        self.scene = Some(SourceTracker::new(receiver));
    }

    /// A new handle on this engine's parameters.
    pub fn control(&self) -> ReverbControl {
        ReverbControl::new(self.state.clone())
    }

    pub fn fdn(&self) -> &Fdn {
        &self.fdn
    }

    pub fn ism(&self) -> &IsmVerb {
        &self.ism
    }

    /// Ring of reverb sources around the current listener.
    pub fn channel_ring(&self) -> ChannelRing {
        self.state.channel_ring()
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Pull pending control changes into the engines. Audio thread, once per
    /// sub-block.
    fn apply_pending(&mut self) {
        if let Some(scene) = &mut self.scene {
            scene.drain(&self.state);
        }

        let dirty = self.state.take_dirty();
        if dirty & DIRTY_ROOM != 0 {
            let [x, y, z] = self.state.room();
            // Both engines keep the previous room if the walls are refused.
            match self.ism.set_room_dimensions(x, y, z) {
                Ok(()) => self.fdn.set_room(x, y, z),
                Err(e) => warn!("room {}x{}x{} m refused: {}", x, y, z, e),
            }
        }
        if dirty & DIRTY_T60 != 0 {
            for band in 0..N_BANDS {
                let t60 = self.state.t60(band);
                self.fdn.set_t60(t60, band);
                self.ism.set_t60(t60, band);
            }
        }
        if dirty & DIRTY_CROSSOVERS != 0 {
            let [low, high] = self.state.crossovers();
            self.fdn.set_crossovers(low, high);
            self.ism.set_crossovers(low, high);
        }
        if dirty & DIRTY_SOURCE != 0 {
            self.ism.set_source(self.state.source());
        }
        if dirty & DIRTY_LISTENER != 0 {
            self.ism.set_listener(self.state.listener());
        }
        if dirty & DIRTY_TRACKING != 0 {
            self.ism.set_tracked_source(self.state.tracked_source());
            self.ism.set_tracking(self.state.tracking());
        }

        self.gain.set_target(self.state.gain());
        self.mix.set_target(self.state.mix());
        self.fdn_gain.set_target(self.state.fdn_gain());
        self.ism_gain.set_target(self.state.ism_gain());
    }

    /// Render `input.len()` frames into planar outputs, overwriting them.
    pub fn process<O: AsMut<[f32]>>(&mut self, input: &[f32], outputs: &mut [O]) {
        debug_assert!(outputs.len() >= self.n_channels);

        for (chunk_idx, chunk) in input.chunks(self.block_size).enumerate() {
            let start = chunk_idx * self.block_size;
            let n = chunk.len();
            self.apply_pending();

            for buf in self.fdn_buf.iter_mut().chain(self.ism_buf.iter_mut()) {
                buf[..n].fill(0.0);
            }
            self.fdn.process(chunk, &mut self.fdn_buf);
            self.ism.process(chunk, &mut self.ism_buf);

            for i in 0..n {
                let gain = self.gain.next();
                let mix = self.mix.next();
                let fdn_gain = self.fdn_gain.next();
                let ism_gain = self.ism_gain.next();
                for ((out, fdn), ism) in outputs
                    .iter_mut()
                    .zip(&self.fdn_buf)
                    .zip(&self.ism_buf)
                    .take(self.n_channels)
                {
                    out.as_mut()[start + i] = crossfade(fdn[i] * fdn_gain, ism[i] * ism_gain, mix) * gain;
                }
            }
        }
    }

    /// Render into one interleaved buffer of `input.len() × n_channels`
    /// samples.
    pub fn render_interleaved(&mut self, input: &[f32], output: &mut [f32]) {
        debug_assert!(output.len() >= input.len() * self.n_channels);
        let mut mix_buf = std::mem::take(&mut self.mix_buf);

        for (chunk_idx, chunk) in input.chunks(self.block_size).enumerate() {
            let offset = chunk_idx * self.block_size * self.n_channels;
            self.process(chunk, &mut mix_buf);
            interleave(&mix_buf, chunk.len(), &mut output[offset..]);
        }

        self.mix_buf = mix_buf;
    }
}

impl AudioRender for DynamicFdn {
    fn render(&mut self, input: &[f32], outputs: &mut [&mut [f32]]) {
        self.process(input, outputs);
    }

    fn n_channels(&self) -> usize {
        self.n_channels
    }

    fn reset(&mut self) {
        self.fdn.reset();
        self.ism.reset();
    }
}
