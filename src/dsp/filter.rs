use std::f32::consts::{FRAC_1_SQRT_2, PI};

/*
Three-band crossover
====================

Each decay filter splits its signal into low / mid / high bands, scales each
band by its own gain and sums the result. For a feedback network this only
stays stable if the weighted sum never exceeds the largest band gain, which
holds when all bands share one phase response and their magnitudes add up
to one. Linkwitz-Riley 4th-order splits give exactly that:

  LR4 low  = (Butterworth LP)²       LR4 high = (Butterworth HP)²
  LR4 low + LR4 high = second-order allpass, both bands in phase

  input ──[LR4 @ f1]──┬─ low1 ──[allpass @ f2]──────────── low
                      └─ hi1  ──[LR4 @ f2]──┬─ mid
                                            └─ high

The allpass on the low branch gives it the same phase shift the f2 split
gives the other two, so

  low + mid + high = allpass(f1) · allpass(f2)

and |w_low·low + w_mid·mid + w_high·high| <= max(w).

Every stage is the same TPT state-variable filter run with Butterworth
damping k = √2.
*/

pub struct FilterOutputs {
    pub lowpass: f32,
    pub bandpass: f32,
    pub highpass: f32,
    pub allpass: f32,
}

/// Topology-preserving-transform state-variable filter.
pub struct SVFilter {
    ic1eq: f32, // First integrator's memory
    ic2eq: f32, // Second integrator's memory

    cutoff_hz: f32,
    resonance: f32,
    g: f32,
    k: f32,
}

impl SVFilter {
    pub fn new(cutoff_hz: f32, resonance: f32, sample_rate: f32) -> Self {
        let mut filter = Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            cutoff_hz,
            resonance,
            g: 0.0,
            k: 2.0 - 2.0 * resonance,
        };
        filter.set_cutoff(cutoff_hz, sample_rate);
        filter
    }

    /// Q = 1/√2, i.e. k = √2.
    pub fn butterworth(cutoff_hz: f32, sample_rate: f32) -> Self {
        Self::new(cutoff_hz, 1.0 - FRAC_1_SQRT_2, sample_rate)
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff_hz
    }

    pub fn resonance(&self) -> f32 {
        self.resonance
    }

    /// Prewarped integrator gain `tan(π·fc/fs)`. The cutoff is kept below
    /// Nyquist.
    #[inline]
    fn compute_g(cutoff_hz: f32, sample_rate: f32) -> f32 {
        let fc = cutoff_hz.clamp(1.0, sample_rate * 0.49);
        (PI * fc / sample_rate).tan()
    }

    #[inline]
    pub fn next_sample(&mut self, sample: f32) -> FilterOutputs {
        let (g, k) = (self.g, self.k);
        let h = 1.0 / (1.0 + g * (g + k));
        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        FilterOutputs {
            lowpass: v2,
            bandpass: v1,
            highpass: sample - k * v1 - v2,
            allpass: sample - 2.0 * k * v1,
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }

    /// Retune without touching the integrator state.
    pub fn set_cutoff(&mut self, cutoff_hz: f32, sample_rate: f32) {
        self.cutoff_hz = cutoff_hz;
        self.g = Self::compute_g(cutoff_hz, sample_rate);
    }

    pub fn set_resonance(&mut self, resonance: f32) {
        self.resonance = resonance;
        self.k = 2.0 - 2.0 * resonance;
    }
}

/// Linkwitz-Riley 4th-order split at one frequency.
struct LrSplit {
    split: SVFilter,
    low: SVFilter,
    high: SVFilter,
}

impl LrSplit {
    fn new(cutoff_hz: f32, sample_rate: f32) -> Self {
        Self {
            split: SVFilter::butterworth(cutoff_hz, sample_rate),
            low: SVFilter::butterworth(cutoff_hz, sample_rate),
            high: SVFilter::butterworth(cutoff_hz, sample_rate),
        }
    }

    #[inline]
    fn process(&mut self, sample: f32) -> (f32, f32) {
        let first = self.split.next_sample(sample);
        let low = self.low.next_sample(first.lowpass).lowpass;
        let high = self.high.next_sample(first.highpass).highpass;
        (low, high)
    }

    fn set_cutoff(&mut self, cutoff_hz: f32, sample_rate: f32) {
        self.split.set_cutoff(cutoff_hz, sample_rate);
        self.low.set_cutoff(cutoff_hz, sample_rate);
        self.high.set_cutoff(cutoff_hz, sample_rate);
    }

    fn reset(&mut self) {
        self.split.reset();
        self.low.reset();
        self.high.reset();
    }
}

/// Phase-matched low / mid / high filter bank.
pub struct Crossover {
    sample_rate: f32,
    frequencies: [f32; 2],
    lower: LrSplit,
    upper: LrSplit,
    low_allpass: SVFilter,
}

impl Crossover {
    pub fn new(low_hz: f32, high_hz: f32, sample_rate: f32) -> Self {
        Self {
            sample_rate,
            frequencies: [low_hz, high_hz],
            lower: LrSplit::new(low_hz, sample_rate),
            upper: LrSplit::new(high_hz, sample_rate),
            low_allpass: SVFilter::butterworth(high_hz, sample_rate),
        }
    }

    pub fn frequencies(&self) -> [f32; 2] {
        self.frequencies
    }

    /// Retune both band edges (RT-safe, no allocation).
    pub fn set_frequencies(&mut self, low_hz: f32, high_hz: f32) {
        self.frequencies = [low_hz, high_hz];
        self.lower.set_cutoff(low_hz, self.sample_rate);
        self.upper.set_cutoff(high_hz, self.sample_rate);
        self.low_allpass.set_cutoff(high_hz, self.sample_rate);
    }

    /// Split one sample into `[low, mid, high]`.
    #[inline]
    pub fn process(&mut self, sample: f32) -> [f32; 3] {
        let (low, rest) = self.lower.process(sample);
        let low = self.low_allpass.next_sample(low).allpass;
        let (mid, high) = self.upper.process(rest);
        [low, mid, high]
    }

    pub fn reset(&mut self) {
        self.lower.reset();
        self.upper.reset();
        self.low_allpass.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn sine(freq: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (TAU * freq * i as f32 / SAMPLE_RATE).sin())
            .collect()
    }

    fn peak_after_transient(buffer: &[f32]) -> f32 {
        let skip = buffer.len() / 2;
        buffer[skip..].iter().fold(0.0f32, |acc, &x| acc.max(x.abs()))
    }

    fn band_peaks(freq: f32) -> [f32; 3] {
        let mut xover = Crossover::new(300.0, 3000.0, SAMPLE_RATE);
        let input = sine(freq, 8192);
        let mut bands = [vec![0.0; input.len()], vec![0.0; input.len()], vec![0.0; input.len()]];
        for (i, &x) in input.iter().enumerate() {
            let out = xover.process(x);
            for b in 0..3 {
                bands[b][i] = out[b];
            }
        }
        [
            peak_after_transient(&bands[0]),
            peak_after_transient(&bands[1]),
            peak_after_transient(&bands[2]),
        ]
    }

    #[test]
    fn test_lowpass_passes_dc() {
        let mut filter = SVFilter::butterworth(500.0, SAMPLE_RATE);
        let mut last = 0.0;
        for _ in 0..512 {
            last = filter.next_sample(1.0).lowpass;
        }
        assert!(last > 0.99, "Expected DC to pass, got {}", last);
    }

    #[test]
    fn test_highpass_blocks_dc() {
        let mut filter = SVFilter::butterworth(500.0, SAMPLE_RATE);
        let mut last = 1.0;
        for _ in 0..512 {
            last = filter.next_sample(1.0).highpass;
        }
        assert!(last.abs() < 0.001, "Expected DC rejection, got {}", last);
    }

    #[test]
    fn test_allpass_keeps_amplitude() {
        let mut filter = SVFilter::butterworth(1_000.0, SAMPLE_RATE);
        let out: Vec<f32> = sine(1_000.0, 4096)
            .into_iter()
            .map(|x| filter.next_sample(x).allpass)
            .collect();
        let peak = peak_after_transient(&out);
        assert!((peak - 1.0).abs() < 0.02, "allpass peak: {}", peak);
    }

    #[test]
    fn test_bands_select_their_range() {
        let low = band_peaks(60.0);
        assert!(low[0] > 0.9 && low[2] < 0.01, "60 Hz: {:?}", low);

        let mid = band_peaks(1_000.0);
        assert!(mid[1] > 0.8, "1 kHz: {:?}", mid);
        assert!(mid[0] < 0.1 && mid[2] < 0.1, "1 kHz: {:?}", mid);

        let high = band_peaks(12_000.0);
        assert!(high[2] > 0.9 && high[0] < 0.01, "12 kHz: {:?}", high);
    }

    #[test]
    fn test_band_sum_is_allpass() {
        for &freq in &[100.0, 300.0, 1_000.0, 3_000.0, 8_000.0] {
            let mut xover = Crossover::new(300.0, 3000.0, SAMPLE_RATE);
            let out: Vec<f32> = sine(freq, 8192)
                .into_iter()
                .map(|x| xover.process(x).iter().sum())
                .collect();
            let peak = peak_after_transient(&out);
            assert!(
                (peak - 1.0).abs() < 0.02,
                "band sum at {} Hz has peak {}",
                freq,
                peak
            );
        }
    }

    #[test]
    fn test_weighted_sum_bounded_by_largest_weight() {
        let weights = [0.9, 0.2, 0.5];
        let mut xover = Crossover::new(300.0, 3000.0, SAMPLE_RATE);
        let mut energy_in = 0.0;
        let mut energy_out = 0.0;
        for i in 0..20_000 {
            let x = if i == 0 { 1.0 } else { 0.0 };
            let bands = xover.process(x);
            let y: f32 = bands.iter().zip(weights.iter()).map(|(b, w)| b * w).sum();
            energy_in += x * x;
            energy_out += y * y;
        }
        assert!(
            energy_out <= energy_in * 0.81 + 1e-4,
            "weighted energy {} exceeds bound",
            energy_out
        );
    }

    #[test]
    fn test_set_frequencies_moves_bands() {
        let mut xover = Crossover::new(300.0, 3000.0, SAMPLE_RATE);
        xover.set_frequencies(2_000.0, 6_000.0);
        assert_eq!(xover.frequencies(), [2_000.0, 6_000.0]);

        let out: Vec<f32> = sine(1_000.0, 8192)
            .into_iter()
            .map(|x| xover.process(x)[0])
            .collect();
        assert!(peak_after_transient(&out) > 0.8);
    }

    #[test]
    fn test_set_resonance_updates_damping() {
        let mut filter = SVFilter::butterworth(1_000.0, SAMPLE_RATE);
        assert!((filter.resonance() - (1.0 - FRAC_1_SQRT_2)).abs() < 1e-6);
        filter.set_resonance(0.9);
        assert!((filter.resonance() - 0.9).abs() < 1e-6);
        assert!((filter.cutoff() - 1_000.0).abs() < 0.1);
    }
}
