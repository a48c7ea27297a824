//! Observation pixel buffer

use crate::geometry::Rect;

/// Row-major `f32` pixel buffer of shape `(height, width[, channels])`
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    height: usize,
    width: usize,
    channels: usize,
    data: Vec<f32>,
}

impl Observation {
    /// Black buffer
    pub fn new(height: usize, width: usize, channels: usize) -> Self {
        Self {
            height,
            width,
            channels,
            data: vec![0.0; height * width * channels],
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// `[h, w]` for single-channel buffers, `[h, w, c]` otherwise
    pub fn shape(&self) -> Vec<usize> {
        if self.channels == 1 {
            vec![self.height, self.width]
        } else {
            vec![self.height, self.width, self.channels]
        }
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Raw bytes of the buffer (native endian `f32`s)
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Value at (row, col, channel), or `None` out of bounds
    pub fn get(&self, row: usize, col: usize, channel: usize) -> Option<f32> {
        if row >= self.height || col >= self.width || channel >= self.channels {
            return None;
        }
        Some(self.data[self.index(row, col, channel)])
    }

    /// All channels of one pixel
    pub fn pixel(&self, row: usize, col: usize) -> Option<&[f32]> {
        if row >= self.height || col >= self.width {
            return None;
        }
        let start = self.index(row, col, 0);
        Some(&self.data[start..start + self.channels])
    }

    /// Overwrite every pixel with `color`
    pub fn fill(&mut self, color: &[f32]) {
        for pixel in self.data.chunks_exact_mut(self.channels) {
            pixel.copy_from_slice(&color[..self.channels]);
        }
    }

    /// Fill a screen-space rectangle already clipped to the buffer
    pub fn fill_rect(&mut self, rect: &Rect, color: &[f32]) {
        let (x0, y0) = (rect.x() as usize, rect.y() as usize);
        let (x1, y1) = (rect.right() as usize, rect.far_y() as usize);
        for row in y0..y1.min(self.height) {
            for col in x0..x1.min(self.width) {
                let start = self.index(row, col, 0);
                self.data[start..start + self.channels].copy_from_slice(&color[..self.channels]);
            }
        }
    }

    /// Resize in place when the screen shape changed; contents are undefined
    pub(crate) fn ensure_shape(&mut self, height: usize, width: usize, channels: usize) {
        if (self.height, self.width, self.channels) != (height, width, channels) {
            *self = Self::new(height, width, channels);
        }
    }

    #[inline]
    fn index(&self, row: usize, col: usize, channel: usize) -> usize {
        (row * self.width + col) * self.channels + channel
    }
}
