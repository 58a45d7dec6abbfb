/// Capability shared by every engine: turn one mono input block into a set of
/// output channels.
///
/// Each call overwrites the first `input.len()` samples of every output
/// channel. Implementations must not allocate, lock or block.
pub trait AudioRender: Send {
    fn render(&mut self, input: &[f32], outputs: &mut [&mut [f32]]);

    fn n_channels(&self) -> usize;

    /// Clear all internal signal state (delay lines, filters).
    ///
    /// Default implementation does nothing (stateless engines).
    fn reset(&mut self) {
        // Default: do nothing
    }
}

/// Allow boxed engines to be used as engines (for dynamic dispatch)
impl AudioRender for Box<dyn AudioRender> {
    fn render(&mut self, input: &[f32], outputs: &mut [&mut [f32]]) {
        (**self).render(input, outputs)
    }

    fn n_channels(&self) -> usize {
        (**self).n_channels()
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

/// Zero the first `frames` samples of every channel.
#[inline]
pub(crate) fn clear_outputs(outputs: &mut [&mut [f32]], frames: usize) {
    for channel in outputs.iter_mut() {
        let n = frames.min(channel.len());
        channel[..n].fill(0.0);
    }
}
