//! Microphone capture into a circular clip.
//!
//! [`CaptureDevice`] is the seam between the streaming driver and the audio
//! hardware: the device owns a fixed-duration [`CaptureClip`], writes into it
//! from its own callback thread, and exposes the write cursor so the driver
//! can pull windows at its own pace.
//!
//! [`CpalCapture`] implements the trait on top of `cpal`.  The cpal callback
//! downmixes each buffer to mono and appends it to a shared clip; dropping
//! the stream on [`stop`](CaptureDevice::stop) releases the hardware.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

use super::resample::stereo_to_mono;
use super::ring::{read_window, CaptureClip, WindowError};

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors that can occur while opening or starting a capture device.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("input device `{0}` not found")]
    DeviceNotFound(String),

    #[error("failed to enumerate input devices: {0}")]
    Devices(#[from] cpal::DevicesError),

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to query supported input configs: {0}")]
    SupportedConfigs(#[from] cpal::SupportedStreamConfigsError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

// ---------------------------------------------------------------------------
// CaptureDevice
// ---------------------------------------------------------------------------

/// A capture source that fills a circular clip in the background.
///
/// The driver treats a non-zero [`samples_captured`](Self::samples_captured)
/// as the readiness signal, so implementations must keep it at 0 until the
/// first samples arrive.
pub trait CaptureDevice {
    /// Begin capturing into a clip of `buffer_secs` seconds.
    ///
    /// `requested_rate` is a hint; the rate actually in use is reported by
    /// [`sample_rate`](Self::sample_rate) afterwards.
    fn start(&mut self, buffer_secs: u32, requested_rate: u32) -> Result<(), CaptureError>;

    /// Stop capturing and release the clip.  Idempotent.
    fn stop(&mut self);

    /// `true` between a successful `start` and the next `stop`.
    fn is_capturing(&self) -> bool;

    /// Current write cursor in `[0, buffer_len)`.
    fn position(&self) -> usize;

    /// Total samples written since `start`, 0 until the hardware delivers.
    fn samples_captured(&self) -> u64;

    /// Sample rate of the clip in Hz, 0 when not capturing.
    fn sample_rate(&self) -> u32;

    /// Clip length in samples, 0 when not capturing.
    fn buffer_len(&self) -> usize;

    /// Copy `len` samples out of the clip starting at `start`, wrapping.
    fn read_window(&self, start: usize, len: usize) -> Result<Vec<f32>, WindowError>;
}

// ---------------------------------------------------------------------------
// Device enumeration
// ---------------------------------------------------------------------------

/// Names of all input devices on the default host.
///
/// Devices whose name cannot be queried are skipped.
pub fn input_device_names() -> Result<Vec<String>, CaptureError> {
    let host = cpal::default_host();
    let names = host
        .input_devices()?
        .filter_map(|d| d.name().ok())
        .collect();
    Ok(names)
}

fn find_input_device(name: Option<&str>) -> Result<cpal::Device, CaptureError> {
    let host = cpal::default_host();
    match name {
        None => host.default_input_device().ok_or(CaptureError::NoDevice),
        Some(wanted) => host
            .input_devices()?
            .find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
            .ok_or_else(|| CaptureError::DeviceNotFound(wanted.to_owned())),
    }
}

/// Pick an `f32` stream config running at `requested_rate` if the device
/// supports one, otherwise the device default.
fn choose_config(
    device: &cpal::Device,
    requested_rate: u32,
) -> Result<cpal::SupportedStreamConfig, CaptureError> {
    let wanted = cpal::SampleRate(requested_rate);
    let matching = device.supported_input_configs()?.find(|range| {
        range.sample_format() == cpal::SampleFormat::F32
            && range.min_sample_rate() <= wanted
            && wanted <= range.max_sample_rate()
    });

    match matching {
        Some(range) => Ok(range.with_sample_rate(wanted)),
        None => Ok(device.default_input_config()?),
    }
}

// ---------------------------------------------------------------------------
// CpalCapture
// ---------------------------------------------------------------------------

/// Lock the shared clip, recovering from a writer that panicked mid-write.
fn lock_clip(clip: &Mutex<CaptureClip>) -> MutexGuard<'_, CaptureClip> {
    clip.lock().unwrap_or_else(PoisonError::into_inner)
}

struct ActiveStream {
    _stream: cpal::Stream,
    clip: Arc<Mutex<CaptureClip>>,
    sample_rate: u32,
    buffer_len: usize,
}

/// Microphone capture built on `cpal`.
///
/// Nothing touches the hardware until [`CaptureDevice::start`], so a missing
/// microphone surfaces as a start failure rather than a construction failure.
///
/// # Example
///
/// ```rust,no_run
/// use mic_streamer::audio::{CaptureDevice, CpalCapture};
///
/// let mut mic = CpalCapture::new(None);
/// mic.start(5, 16_000).unwrap();
/// println!("capturing at {} Hz", mic.sample_rate());
/// mic.stop();
/// ```
pub struct CpalCapture {
    device_name: Option<String>,
    active: Option<ActiveStream>,
}

impl CpalCapture {
    /// `device_name == None` selects the host's default input device.
    pub fn new(device_name: Option<&str>) -> Self {
        Self {
            device_name: device_name.map(str::to_owned),
            active: None,
        }
    }
}

impl CaptureDevice for CpalCapture {
    fn start(&mut self, buffer_secs: u32, requested_rate: u32) -> Result<(), CaptureError> {
        self.stop();

        let device = find_input_device(self.device_name.as_deref())?;
        let supported = choose_config(&device, requested_rate)?;

        let channels = supported.channels();
        let sample_rate = supported.sample_rate().0;
        let config: cpal::StreamConfig = supported.into();

        let buffer_len = CaptureClip::len_for(buffer_secs, sample_rate);
        let clip = Arc::new(Mutex::new(CaptureClip::new(buffer_len)));
        let writer = Arc::clone(&clip);

        let stream = device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let mono = if channels > 1 {
                    stereo_to_mono(data, channels)
                } else {
                    data.to_vec()
                };
                lock_clip(&writer).write(&mono);
            },
            |err: cpal::StreamError| {
                log::error!("cpal stream error: {err}");
            },
            None,
        )?;

        stream.play()?;

        log::info!(
            "capture: dev={}, requested={} Hz, real={} Hz, channels={}, clip={} samples",
            self.device_name.as_deref().unwrap_or("default"),
            requested_rate,
            sample_rate,
            channels,
            buffer_len
        );

        self.active = Some(ActiveStream {
            _stream: stream,
            clip,
            sample_rate,
            buffer_len,
        });
        Ok(())
    }

    fn stop(&mut self) {
        if self.active.take().is_some() {
            log::debug!("capture: stream released");
        }
    }

    fn is_capturing(&self) -> bool {
        self.active.is_some()
    }

    fn position(&self) -> usize {
        self.active
            .as_ref()
            .map_or(0, |a| lock_clip(&a.clip).position())
    }

    fn samples_captured(&self) -> u64 {
        self.active
            .as_ref()
            .map_or(0, |a| lock_clip(&a.clip).total_written())
    }

    fn sample_rate(&self) -> u32 {
        self.active.as_ref().map_or(0, |a| a.sample_rate)
    }

    fn buffer_len(&self) -> usize {
        self.active.as_ref().map_or(0, |a| a.buffer_len)
    }

    fn read_window(&self, start: usize, len: usize) -> Result<Vec<f32>, WindowError> {
        match self.active.as_ref() {
            Some(active) => lock_clip(&active.clip).read_window(start, len),
            None => read_window(&[], start, len),
        }
    }
}

// ---------------------------------------------------------------------------
// MockDevice  (test-only)
// ---------------------------------------------------------------------------

/// In-memory capture device whose samples are pushed by the test.
///
/// ```text
/// let mut dev = MockDevice::new(48_000);
/// dev.start(5, 16_000)?;   // clip of 5 s @ 48 kHz
/// dev.push(&[0.1; 3072]);  // position advances by 3072
/// ```
#[cfg(test)]
pub struct MockDevice {
    rate: u32,
    available: bool,
    clip: Option<Mutex<CaptureClip>>,
    pub starts: usize,
    pub stops: usize,
}

#[cfg(test)]
impl MockDevice {
    /// A device that captures at `rate` Hz regardless of the requested rate.
    pub fn new(rate: u32) -> Self {
        Self {
            rate,
            available: true,
            clip: None,
            starts: 0,
            stops: 0,
        }
    }

    /// A device whose `start` always fails with [`CaptureError::NoDevice`].
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new(16_000)
        }
    }

    /// Append samples as if the hardware had captured them.
    pub fn push(&self, samples: &[f32]) {
        if let Some(clip) = &self.clip {
            clip.lock().unwrap().write(samples);
        }
    }

    /// Append `n` samples counting up from `first`.
    pub fn push_ramp(&self, first: usize, n: usize) {
        let samples: Vec<f32> = (first..first + n).map(|i| i as f32).collect();
        self.push(&samples);
    }
}

#[cfg(test)]
impl CaptureDevice for MockDevice {
    fn start(&mut self, buffer_secs: u32, _requested_rate: u32) -> Result<(), CaptureError> {
        if !self.available {
            return Err(CaptureError::NoDevice);
        }
        self.starts += 1;
        let len = CaptureClip::len_for(buffer_secs, self.rate);
        self.clip = Some(Mutex::new(CaptureClip::new(len)));
        Ok(())
    }

    fn stop(&mut self) {
        if self.clip.take().is_some() {
            self.stops += 1;
        }
    }

    fn is_capturing(&self) -> bool {
        self.clip.is_some()
    }

    fn position(&self) -> usize {
        self.clip
            .as_ref()
            .map_or(0, |c| c.lock().unwrap().position())
    }

    fn samples_captured(&self) -> u64 {
        self.clip
            .as_ref()
            .map_or(0, |c| c.lock().unwrap().total_written())
    }

    fn sample_rate(&self) -> u32 {
        if self.clip.is_some() {
            self.rate
        } else {
            0
        }
    }

    fn buffer_len(&self) -> usize {
        self.clip.as_ref().map_or(0, |c| c.lock().unwrap().len())
    }

    fn read_window(&self, start: usize, len: usize) -> Result<Vec<f32>, WindowError> {
        match &self.clip {
            Some(c) => c.lock().unwrap().read_window(start, len),
            None => read_window(&[], start, len),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
