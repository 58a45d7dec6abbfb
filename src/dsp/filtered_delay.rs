use super::delay::DelayLine;
use super::filter::Crossover;
use crate::N_BANDS;

/// One feedback path: a delay followed by a three-band decay filter.
///
/// Each band is scaled by its own weight, so low and high frequencies can
/// die away at different rates. With weights ≤ 1 the path never gains.
pub struct FilteredDelay {
    line: DelayLine,
    delay: usize,
    crossover: Crossover,
    weights: [f32; N_BANDS],
}

impl FilteredDelay {
    pub fn new(max_delay: usize, crossovers: [f32; 2], sample_rate: f32) -> Self {
        Self {
            line: DelayLine::new(max_delay),
            delay: 0,
            crossover: Crossover::new(crossovers[0], crossovers[1], sample_rate),
            weights: [1.0; N_BANDS],
        }
    }

    /// Set the path length, clamped to the line's capacity. Returns the
    /// length actually applied.
    pub fn set_delay(&mut self, delay: usize) -> usize {
        self.delay = delay.min(self.line.max_delay());
        self.delay
    }

    pub fn delay(&self) -> usize {
        self.delay
    }

    pub fn max_delay(&self) -> usize {
        self.line.max_delay()
    }

    pub fn set_weight(&mut self, band: usize, weight: f32) {
        if let Some(w) = self.weights.get_mut(band) {
            *w = weight;
        }
    }

    pub fn weight(&self, band: usize) -> f32 {
        self.weights.get(band).copied().unwrap_or(0.0)
    }

    pub fn set_crossovers(&mut self, low_hz: f32, high_hz: f32) {
        self.crossover.set_frequencies(low_hz, high_hz);
    }

    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        let delayed = self.line.next_sample(sample, self.delay);
        let bands = self.crossover.process(delayed);
        bands
            .iter()
            .zip(self.weights.iter())
            .map(|(b, w)| b * w)
            .sum()
    }

    pub fn reset(&mut self) {
        self.line.reset();
        self.crossover.reset();
    }
}
