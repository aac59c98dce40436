//! Frame acquisition: a real webcam or a synthetic test pattern.
//!
//! The public interface is the [`FrameSource`] trait.  The frame loop
//! doesn't need to know whether pixels came from hardware or were generated.

use anyhow::Result;

// ════════════════════════════════════════════════════════════════════════════
// Frame
// ════════════════════════════════════════════════════════════════════════════

/// One video frame as packed `0x00RRGGBB` pixels, row-major.
///
/// This is the exact buffer layout `minifb` presents, so a frame can be
/// blitted without conversion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub width:  usize,
    pub height: usize,
    pub pixels: Vec<u32>,
}

impl Frame {
    /// A frame filled with one color.
    pub fn filled(width: usize, height: usize, color: u32) -> Self {
        Frame { width, height, pixels: vec![color; width * height] }
    }

    /// Pack tightly-interleaved RGB bytes.  Missing trailing bytes read as black.
    pub fn from_rgb(width: usize, height: usize, rgb: &[u8]) -> Self {
        let mut pixels = vec![0u32; width * height];
        for (px, c) in pixels.iter_mut().zip(rgb.chunks_exact(3)) {
            *px = (c[0] as u32) << 16 | (c[1] as u32) << 8 | c[2] as u32;
        }
        Frame { width, height, pixels }
    }

    /// Unpack to RGB bytes (3 per pixel).
    pub fn to_rgb(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 3);
        for &p in &self.pixels {
            out.extend_from_slice(&[(p >> 16) as u8, (p >> 8) as u8, p as u8]);
        }
        out
    }

    /// Flip horizontally, producing the "mirror" view users expect from a
    /// front-facing camera.
    pub fn mirrored(mut self) -> Self {
        for row in self.pixels.chunks_exact_mut(self.width.max(1)) {
            row.reverse();
        }
        self
    }

    /// Nearest-neighbour resample to `width × height`.
    pub fn resized(self, width: usize, height: usize) -> Self {
        if self.width == width && self.height == height {
            return self;
        }
        if self.width == 0 || self.height == 0 {
            return Frame::filled(width, height, 0);
        }
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            let sy = y * self.height / height;
            let row = &self.pixels[sy * self.width..(sy + 1) * self.width];
            for x in 0..width {
                pixels.push(row[x * self.width / width]);
            }
        }
        Frame { width, height, pixels }
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        if x < self.width && y < self.height {
            Some(self.pixels[y * self.width + x])
        } else {
            None
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FrameSource trait: unified interface for hw and sim
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can produce video frames.
pub trait FrameSource {
    /// Grab the next frame.  An `Err` is a dropped frame: the caller skips
    /// this tick and tries again on the next one.
    fn read(&mut self) -> Result<Frame>;

    /// Release the underlying device.  Called once at shutdown.
    fn release(&mut self);

    fn name(&self) -> String;
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn read(&mut self) -> Result<Frame> { (**self).read() }
    fn release(&mut self)               { (**self).release() }
    fn name(&self) -> String            { (**self).name() }
}

// ════════════════════════════════════════════════════════════════════════════
// TestPattern: synthetic frames (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Slowly scrolling dark gradient, used in simulation mode in place of a
/// camera.
pub struct TestPattern {
    width:  usize,
    height: usize,
    tick:   usize,
}

impl TestPattern {
    pub fn new(width: usize, height: usize) -> Self {
        TestPattern { width, height, tick: 0 }
    }
}

impl FrameSource for TestPattern {
    fn read(&mut self) -> Result<Frame> {
        let mut frame = Frame::filled(self.width, self.height, 0);
        let shift = self.tick;
        for y in 0..self.height {
            let g = (y * 48 / self.height.max(1)) as u32;
            for x in 0..self.width {
                let b = (((x + shift) % self.width.max(1)) * 64 / self.width.max(1)) as u32;
                frame.pixels[y * self.width + x] = (16 << 16) | ((16 + g) << 8) | (32 + b);
            }
        }
        self.tick = self.tick.wrapping_add(2);
        Ok(frame)
    }

    fn release(&mut self) {}

    fn name(&self) -> String {
        format!("test pattern {}x{}", self.width, self.height)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// NokhwaCamera: real webcam (feature = "camera")
// ════════════════════════════════════════════════════════════════════════════

/// Webcam capture through `nokhwa`.
///
/// Requires the `camera` feature flag.  Frames are decoded to RGB and packed
/// into a [`Frame`]; resolution is whatever the device grants closest to the
/// request.
#[cfg(feature = "camera")]
pub struct NokhwaCamera {
    camera: nokhwa::Camera,
    index:  u32,
}

#[cfg(feature = "camera")]
impl NokhwaCamera {
    /// Open device `index` and start streaming.  Failure here is fatal for
    /// the application.
    pub fn open(index: u32, width: u32, height: u32, fps: u32) -> Result<Self> {
        use anyhow::Context;
        use nokhwa::pixel_format::RgbFormat;
        use nokhwa::utils::{
            CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
            Resolution,
        };

        let wanted = CameraFormat::new(Resolution::new(width, height), FrameFormat::MJPEG, fps);
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(wanted));

        let mut camera = nokhwa::Camera::new(CameraIndex::Index(index), requested)
            .with_context(|| format!("failed to open camera {}", index))?;
        camera.open_stream()
            .with_context(|| format!("failed to start stream on camera {}", index))?;

        let res = camera.resolution();
        tracing::info!(index, width = res.width(), height = res.height(), "camera opened");

        Ok(NokhwaCamera { camera, index })
    }
}

#[cfg(feature = "camera")]
impl FrameSource for NokhwaCamera {
    fn read(&mut self) -> Result<Frame> {
        use anyhow::Context;
        use nokhwa::pixel_format::RgbFormat;

        let buffer = self.camera.frame().context("camera returned no frame")?;
        let image = buffer.decode_image::<RgbFormat>().context("frame decode failed")?;
        let (w, h) = (image.width() as usize, image.height() as usize);
        Ok(Frame::from_rgb(w, h, image.as_raw()))
    }

    fn release(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            tracing::warn!(index = self.index, error = %e, "failed to stop camera stream");
        }
    }

    fn name(&self) -> String {
        format!("camera {} ({})", self.index, self.camera.info().human_name())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
