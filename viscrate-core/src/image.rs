//! Raw raster images

use serde::{Deserialize, Serialize};

/// An 8- or 16-bit raster image with interleaved channels
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub num_channels: u32,
    pub bytes_per_channel: u32,
    pub data: Vec<u8>,
}

impl Image {
    /// Create an image from interleaved 8-bit pixels
    pub fn from_rgb8(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            num_channels: 3,
            bytes_per_channel: 1,
            data,
        }
    }

    /// Whether the image has non-zero dimensions and pixel data
    pub fn has_data(&self) -> bool {
        self.width > 0 && self.height > 0 && !self.data.is_empty()
    }

    /// Number of bytes the dimensions call for
    pub fn expected_len(&self) -> usize {
        self.width as usize
            * self.height as usize
            * self.num_channels as usize
            * self.bytes_per_channel as usize
    }

    /// Expand to tightly packed RGBA8
    ///
    /// Returns `None` for layouts other than 8-bit 1, 2, 3 or 4 channels, or
    /// when the data is shorter than the dimensions require.
    pub fn to_rgba8(&self) -> Option<Vec<u8>> {
        if self.bytes_per_channel != 1 || self.data.len() < self.expected_len() {
            return None;
        }

        let channels = self.num_channels as usize;
        let pixels = self.width as usize * self.height as usize;
        let mut out = Vec::with_capacity(pixels * 4);

        for px in self.data[..self.expected_len()].chunks_exact(channels) {
            match px {
                [l] => out.extend_from_slice(&[*l, *l, *l, 255]),
                [l, a] => out.extend_from_slice(&[*l, *l, *l, *a]),
                [r, g, b] => out.extend_from_slice(&[*r, *g, *b, 255]),
                [r, g, b, a] => out.extend_from_slice(&[*r, *g, *b, *a]),
                _ => return None,
            }
        }

        Some(out)
    }
}
