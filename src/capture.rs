//! Live spectrum source fed by the system audio device.

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use spectrum_analyzer::{
    FrequencyLimit, samples_fft_to_spectrum, scaling::divide_by_N, windows::hann_window,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::spectrum::SpectrumSource;

/// Samples per analysis window. Must be a power of two.
pub const WINDOW_SIZE: usize = 2048;

const MIN_FREQUENCY: f32 = 20.0;
const MAX_FREQUENCY: f32 = 20_000.0;
const MIN_DECIBELS: f32 = -100.0;
const MAX_DECIBELS: f32 = -30.0;
/// Weight of the previous frame when smoothing magnitudes.
const SMOOTHING: f32 = 0.8;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no default {0} device")]
    NoDevice(&'static str),
    #[error("failed to query stream config: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),
    #[error("failed to build input stream: {0}")]
    Build(#[from] cpal::BuildStreamError),
    #[error("failed to start stream: {0}")]
    Play(#[from] cpal::PlayStreamError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureDevice {
    /// Capture what the default output device is playing.
    Loopback,
    /// Capture the default input device (microphone, line in).
    Input,
}

impl CaptureDevice {
    fn name(self) -> &'static str {
        match self {
            CaptureDevice::Loopback => "output",
            CaptureDevice::Input => "input",
        }
    }
}

pub struct LiveSpectrum {
    _stream: cpal::Stream,
    samples: Arc<Mutex<Vec<f32>>>,
    sample_rate: u32,
    mapper: BinMapper,
}

impl LiveSpectrum {
    pub fn open(device: CaptureDevice, sample_count: usize) -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let (audio_device, supported) = match device {
            CaptureDevice::Loopback => {
                let d = host
                    .default_output_device()
                    .ok_or(CaptureError::NoDevice(device.name()))?;
                let config = d.default_output_config()?;
                (d, config)
            }
            CaptureDevice::Input => {
                let d = host
                    .default_input_device()
                    .ok_or(CaptureError::NoDevice(device.name()))?;
                let config = d.default_input_config()?;
                (d, config)
            }
        };

        let config: cpal::StreamConfig = supported.into();
        let channels = config.channels.max(1) as usize;
        info!(
            device = device.name(),
            sample_rate = config.sample_rate,
            channels,
            "capturing audio"
        );

        let samples = Arc::new(Mutex::new(Vec::with_capacity(WINDOW_SIZE * 2)));
        let writer = Arc::clone(&samples);
        let stream = audio_device.build_input_stream(
            &config,
            move |data: &[f32], _: &_| {
                let Ok(mut s) = writer.lock() else {
                    return;
                };
                // Downmix interleaved frames to mono.
                s.extend(
                    data.chunks(channels)
                        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32),
                );
                if s.len() > WINDOW_SIZE {
                    let keep = s.len() - WINDOW_SIZE;
                    s.drain(0..keep);
                }
            },
            |err| warn!("audio stream error: {err}"),
            None,
        )?;
        stream.play()?;

        Ok(Self {
            _stream: stream,
            samples,
            sample_rate: config.sample_rate,
            mapper: BinMapper::new(sample_count),
        })
    }
}

impl SpectrumSource for LiveSpectrum {
    fn sample_count(&self) -> usize {
        self.mapper.sample_count()
    }

    fn fill_snapshot(&mut self, buffer: &mut [u8]) {
        // Never wait on the audio thread; a busy lock repeats the last frame.
        let window = match self.samples.try_lock() {
            Ok(s) if s.len() >= WINDOW_SIZE => Some(s[s.len() - WINDOW_SIZE..].to_vec()),
            _ => None,
        };

        if let Some(window) = window {
            let windowed = hann_window(&window);
            match samples_fft_to_spectrum(
                &windowed,
                self.sample_rate,
                FrequencyLimit::Range(MIN_FREQUENCY, MAX_FREQUENCY),
                Some(&divide_by_N),
            ) {
                Ok(spectrum) => {
                    let points = spectrum.to_map();
                    self.mapper
                        .update(points.iter().map(|(freq, val)| (*freq as f32, *val)));
                }
                Err(err) => warn!("spectrum analysis failed: {err:?}"),
            }
        }

        self.mapper.write_bytes(buffer);
    }

    fn label(&self) -> &str {
        "live capture"
    }
}

/// Folds FFT output into log-spaced bins and converts them to bytes on a
/// decibel scale.
#[derive(Debug, Clone)]
pub struct BinMapper {
    smoothed: Vec<f32>,
    sums: Vec<f32>,
    counts: Vec<u32>,
}

impl BinMapper {
    pub fn new(sample_count: usize) -> Self {
        Self {
            smoothed: vec![0.0; sample_count],
            sums: vec![0.0; sample_count],
            counts: vec![0; sample_count],
        }
    }

    pub fn sample_count(&self) -> usize {
        self.smoothed.len()
    }

    /// Feed one analysis frame of (frequency in Hz, linear magnitude).
    pub fn update(&mut self, points: impl Iterator<Item = (f32, f32)>) {
        let n = self.smoothed.len();
        if n == 0 {
            return;
        }
        self.sums.fill(0.0);
        self.counts.fill(0);

        let min_log = MIN_FREQUENCY.ln();
        let log_range = MAX_FREQUENCY.ln() - min_log;
        for (f, val) in points {
            if !(MIN_FREQUENCY..=MAX_FREQUENCY).contains(&f) {
                continue;
            }
            let bin = (((f.ln() - min_log) / log_range) * n as f32) as usize;
            let bin = bin.min(n - 1);
            self.sums[bin] += val;
            self.counts[bin] += 1;
        }

        // Low bins narrower than the FFT resolution borrow their neighbour.
        let mut carry = 0.0;
        for i in 0..n {
            let magnitude = if self.counts[i] > 0 {
                self.sums[i] / self.counts[i] as f32
            } else {
                carry
            };
            carry = magnitude;
            self.smoothed[i] = SMOOTHING * self.smoothed[i] + (1.0 - SMOOTHING) * magnitude;
        }
    }

    pub fn write_bytes(&self, buffer: &mut [u8]) {
        for (byte, &magnitude) in buffer.iter_mut().zip(&self.smoothed) {
            *byte = to_byte(magnitude);
        }
    }
}

fn to_byte(magnitude: f32) -> u8 {
    if !(magnitude > 0.0) {
        return 0;
    }
    let db = 20.0 * magnitude.log10();
    let scaled = (db - MIN_DECIBELS) / (MAX_DECIBELS - MIN_DECIBELS);
    (scaled.clamp(0.0, 1.0) * 255.0) as u8
}
