//! Frame type and pixel-level helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("buffer length mismatch: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// A captured grayscale camera frame.
#[derive(Clone)]
pub struct Frame {
    /// Grayscale pixel data (width * height bytes).
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp: std::time::Instant,
    /// Driver frame counter, useful for spotting drops in logs.
    pub sequence: u32,
}

impl Frame {
    /// Downsample by an integer factor with nearest-neighbor sampling.
    ///
    /// A factor of 4 keeps every fourth pixel along each axis, trading
    /// detection resolution for inference cost. A factor of 0 or 1
    /// returns a plain copy.
    pub fn downsample(&self, factor: u32) -> Frame {
        if factor <= 1 {
            return self.clone();
        }

        let new_w = (self.width / factor).max(1);
        let new_h = (self.height / factor).max(1);
        let mut data = Vec::with_capacity((new_w * new_h) as usize);
        for y in 0..new_h {
            let src_row = (y * factor * self.width) as usize;
            for x in 0..new_w {
                data.push(self.data[src_row + (x * factor) as usize]);
            }
        }

        Frame {
            data,
            width: new_w,
            height: new_h,
            timestamp: self.timestamp,
            sequence: self.sequence,
        }
    }
}

/// Convert packed YUYV (4:2:2) to grayscale by extracting the Y channel.
///
/// YUYV packs two pixels per 4 bytes: [Y0, U, Y1, V]; grayscale is every
/// even-indexed byte.
pub fn yuyv_to_grayscale(yuyv: &[u8], width: u32, height: u32) -> Result<Vec<u8>, FrameError> {
    let expected = (width * height * 2) as usize;
    if yuyv.len() < expected {
        return Err(FrameError::InvalidLength {
            expected,
            actual: yuyv.len(),
        });
    }
    Ok(yuyv[..expected].iter().step_by(2).copied().collect())
}
