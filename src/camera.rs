//! Frame acquisition.
//!
//! `Camera` yields a single frame on demand after a short warmup that lets
//! automatic exposure and focus settle. Real devices are captured over V4L2
//! behind the `camera-v4l2` feature; `stub://` device paths select a
//! synthetic backend that is always built and keeps tests and the demo
//! hardware-free.

use crate::error::PipelineError;
use crate::frame::Frame;

/// Yields one raw frame on demand.
pub trait FrameSource {
    fn capture(&mut self) -> Result<Frame, PipelineError>;
}

/// Configuration for a camera source.
#[derive(Clone, Debug)]
pub struct CameraConfig {
    /// Device path ("/dev/video0") or "stub://<name>" for the synthetic
    /// backend.
    pub device: String,
    /// Preferred capture width.
    pub width: u32,
    /// Preferred capture height.
    pub height: u32,
    /// Frames discarded before the frame that is actually used. Tunable,
    /// not a correctness requirement.
    pub warmup_frames: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: "/dev/video0".to_string(),
            width: 1280,
            height: 720,
            warmup_frames: 5,
        }
    }
}

/// Camera frame source.
pub struct Camera {
    backend: CameraBackend,
}

enum CameraBackend {
    Synthetic(SyntheticCamera),
    #[cfg(feature = "camera-v4l2")]
    Device(DeviceCamera),
}

impl Camera {
    pub fn new(config: CameraConfig) -> Result<Self, PipelineError> {
        if config.device.starts_with("stub://") {
            return Ok(Self {
                backend: CameraBackend::Synthetic(SyntheticCamera::new(config)),
            });
        }
        #[cfg(feature = "camera-v4l2")]
        {
            return Ok(Self {
                backend: CameraBackend::Device(DeviceCamera::new(config)),
            });
        }
        #[cfg(not(feature = "camera-v4l2"))]
        {
            Err(PipelineError::DeviceUnavailable {
                device: config.device,
                reason: "built without the camera-v4l2 feature; only stub:// devices are available"
                    .to_string(),
            })
        }
    }
}

impl FrameSource for Camera {
    fn capture(&mut self) -> Result<Frame, PipelineError> {
        match &mut self.backend {
            CameraBackend::Synthetic(camera) => camera.capture(),
            #[cfg(feature = "camera-v4l2")]
            CameraBackend::Device(camera) => camera.capture(),
        }
    }
}

// ----------------------------------------------------------------------------
// Synthetic source (stub://) for tests and the demo
// ----------------------------------------------------------------------------

struct SyntheticCamera {
    config: CameraConfig,
    frame_count: u64,
}

impl SyntheticCamera {
    fn new(config: CameraConfig) -> Self {
        log::info!("camera: using synthetic source {}", config.device);
        Self {
            config,
            frame_count: 0,
        }
    }

    fn capture(&mut self) -> Result<Frame, PipelineError> {
        for _ in 0..self.config.warmup_frames {
            self.next_pixels();
        }
        let pixels = self.next_pixels();
        Frame::from_rgb(self.config.width, self.config.height, pixels)
    }

    /// Simple moving pattern so consecutive frames differ.
    fn next_pixels(&mut self) -> Vec<u8> {
        self.frame_count += 1;
        let pixel_count = (self.config.width * self.config.height * 3) as usize;
        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + self.frame_count) % 256) as u8;
        }
        pixels
    }
}

// ----------------------------------------------------------------------------
// V4L2 device source
// ----------------------------------------------------------------------------

#[cfg(feature = "camera-v4l2")]
struct DeviceCamera {
    config: CameraConfig,
}

#[cfg(feature = "camera-v4l2")]
impl DeviceCamera {
    /// Pause between warmup reads so auto-exposure has frames to adapt on.
    const WARMUP_PAUSE: std::time::Duration = std::time::Duration::from_millis(50);

    fn new(config: CameraConfig) -> Self {
        Self { config }
    }

    fn capture(&mut self) -> Result<Frame, PipelineError> {
        self.read_device()
            .map_err(|e| PipelineError::DeviceUnavailable {
                device: self.config.device.clone(),
                reason: format!("{:#}", e),
            })
    }

    /// Open the device, discard the warmup frames, return the next one.
    /// The device and its stream are released when this returns.
    fn read_device(&self) -> anyhow::Result<Frame> {
        use anyhow::{bail, Context};
        use v4l::buffer::Type;
        use v4l::io::traits::CaptureStream;
        use v4l::video::Capture;

        let rgb3 = v4l::FourCC::new(b"RGB3");

        let mut device = v4l::Device::with_path(&self.config.device)
            .with_context(|| format!("open v4l2 device {}", self.config.device))?;
        let mut format = device.format().context("read v4l2 format")?;
        format.width = self.config.width;
        format.height = self.config.height;
        format.fourcc = rgb3;

        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!(
                    "camera: failed to set format on {}: {}",
                    self.config.device,
                    err
                );
                device
                    .format()
                    .context("read v4l2 format after set failure")?
            }
        };
        if format.fourcc != rgb3 {
            bail!("device delivers {:?} frames rather than RGB3", format.fourcc);
        }

        let mut stream = v4l::prelude::MmapStream::with_buffers(&mut device, Type::VideoCapture, 4)
            .context("create v4l2 buffer stream")?;

        for _ in 0..self.config.warmup_frames {
            stream.next().context("warmup v4l2 frame")?;
            std::thread::sleep(Self::WARMUP_PAUSE);
        }

        let (buf, _meta) = stream.next().context("capture v4l2 frame")?;
        let frame = Frame::from_rgb(format.width, format.height, buf.to_vec())?;
        log::info!(
            "camera: captured {}x{} frame from {}",
            format.width,
            format.height,
            self.config.device
        );
        Ok(frame)
    }
}
