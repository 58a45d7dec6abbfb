//! Engine cross-mixing and channel layout helpers.

/*
Engine Mix
==========

The late tail (FDN) and the early reflections (ISM) render onto the same
channels and are blended per sample:

    out = (fdn × fdn_gain × mix + ism × ism_gain × (1 − mix)) × gain

  mix = 1.0  →  FDN only
  mix = 0.5  →  both at half level
  mix = 0.0  →  image sources only

This is a LINEAR crossfade: the weights sum to 1, so two fully correlated
inputs never exceed their own level. Reverb tails from two engines are
mostly uncorrelated, which makes the middle of the fade sound slightly
quieter than the ends. That dip is accepted.

    Level
      1.0 ──────╲      ╱──────
                 ╲    ╱
      0.5         ╲  ╱
                   ╲╱
      0.0 ─────────────────────
          0.0     0.5     1.0
                  mix

Per-engine gains sit on top of the crossfade and may exceed 1.0 (up to 2.0),
so the blended sum CAN leave [-1, +1]. Limiting is the transport's job.
*/

/// Blend the two engines for one sample.
///
/// `mix` is clamped into [0, 1]; 1.0 is all `fdn`.
#[inline]
pub fn crossfade(fdn: f32, ism: f32, mix: f32) -> f32 {
    let mix = mix.clamp(0.0, 1.0);
    fdn * mix + ism * (1.0 - mix)
}

/// Copy planar channels into one interleaved buffer.
///
/// Writes `frames × channels.len()` samples; extra room in `out` is left
/// untouched.
pub fn interleave<C: AsRef<[f32]>>(channels: &[C], frames: usize, out: &mut [f32]) {
    let n = channels.len();
    debug_assert!(out.len() >= frames * n);
    for (c, channel) in channels.iter().enumerate() {
        for (i, &s) in channel.as_ref().iter().take(frames).enumerate() {
            out[i * n + c] = s;
        }
    }
}
