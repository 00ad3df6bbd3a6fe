/// Producer of per-frame frequency magnitudes.
///
/// `fill_snapshot` must not block and must not fail: with no audio flowing it
/// writes the last known values or zeros. `sample_count` is fixed for the
/// lifetime of a source.
pub trait SpectrumSource {
    fn sample_count(&self) -> usize;

    /// Overwrite `buffer` (exactly `sample_count` bytes) with current magnitudes.
    fn fill_snapshot(&mut self, buffer: &mut [u8]);

    /// True once the underlying stream has ended.
    fn is_finished(&self) -> bool {
        false
    }

    /// Start over from the beginning. Live sources have nothing to rewind.
    fn rewind(&mut self) {}

    fn label(&self) -> &str {
        "source"
    }
}

/// Pre-allocated magnitude buffer, reused frame over frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencySnapshot {
    bins: Vec<u8>,
}

impl FrequencySnapshot {
    pub fn new(sample_count: usize) -> Self {
        Self {
            bins: vec![0; sample_count],
        }
    }

    pub fn refresh(&mut self, source: &mut dyn SpectrumSource) {
        source.fill_snapshot(&mut self.bins);
    }

    pub fn bins(&self) -> &[u8] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}

/// Every bin holds the same magnitude.
#[derive(Debug, Clone)]
pub struct FlatSource {
    sample_count: usize,
    value: u8,
}

impl FlatSource {
    pub fn new(sample_count: usize, value: u8) -> Self {
        Self {
            sample_count,
            value,
        }
    }

    pub fn silent(sample_count: usize) -> Self {
        Self::new(sample_count, 0)
    }
}

impl SpectrumSource for FlatSource {
    fn sample_count(&self) -> usize {
        self.sample_count
    }

    fn fill_snapshot(&mut self, buffer: &mut [u8]) {
        buffer.fill(self.value);
    }

    fn label(&self) -> &str {
        "flat"
    }
}

// --- Sample Track ---

/// Deterministic stand-in for a playing track.
///
/// A few spectral peaks drift across the bins on a frame counter, with a
/// kick-like low end every half second at 60 frames per second. With a
/// length set it reports end of stream after that many frames unless
/// looping.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    sample_count: usize,
    frame: u64,
    length: Option<u64>,
    looping: bool,
}

impl SyntheticSource {
    pub fn new(sample_count: usize) -> Self {
        Self {
            sample_count,
            frame: 0,
            length: None,
            looping: false,
        }
    }

    pub fn with_length(mut self, frames: u64, looping: bool) -> Self {
        self.length = Some(frames);
        self.looping = looping;
        self
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }
}

impl SpectrumSource for SyntheticSource {
    fn sample_count(&self) -> usize {
        self.sample_count
    }

    fn fill_snapshot(&mut self, buffer: &mut [u8]) {
        if self.is_finished() {
            buffer.fill(0);
            return;
        }

        let t = self.frame as f32 / 60.0;
        let n = buffer.len().max(1) as f32;
        let kick = (-((t * 2.0).fract() * 8.0)).exp();

        for (i, bin) in buffer.iter_mut().enumerate() {
            let x = i as f32 / n;
            let tilt = 0.85 - 0.55 * x;
            let peak_a = (-((x - (0.2 + 0.15 * (t * 0.7).sin())) * 12.0).powi(2)).exp();
            let peak_b = (-((x - (0.55 + 0.2 * (t * 0.4).cos())) * 9.0).powi(2)).exp();
            let shimmer = 0.15 * ((i as f32 * 0.9 + t * 6.0).sin() * 0.5 + 0.5);
            let low = kick * (-(x * 10.0)).exp();
            let level = tilt * (0.35 * peak_a + 0.3 * peak_b + shimmer) + 0.5 * low;
            *bin = (level.clamp(0.0, 1.0) * 255.0) as u8;
        }

        self.frame += 1;
        if let Some(length) = self.length {
            if self.looping && self.frame >= length {
                self.frame = 0;
            }
        }
    }

    fn is_finished(&self) -> bool {
        matches!(self.length, Some(length) if !self.looping && self.frame >= length)
    }

    fn rewind(&mut self) {
        self.frame = 0;
    }

    fn label(&self) -> &str {
        "sample track"
    }
}
