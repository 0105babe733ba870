// Line21
// Copyright (c) 2026 The Project Line21 Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `raster` module provides primitives for reading rasterized grayscale video frames.

use std::io;
use std::io::Read;

use log::debug;

use crate::errors::Result;

/// A single grayscale video frame, cropped to the scanlines that may carry line-21 data.
///
/// Luminance samples are stored row-major, one byte per pixel. A frame is immutable once read.
pub struct RasterFrame {
    width: usize,
    height: usize,
    luma: Box<[u8]>,
}

impl RasterFrame {
    /// The frame width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The frame height in scanlines.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Gets the luminance samples of the given scanline.
    ///
    /// Panics if `index` is out of bounds.
    pub fn line(&self, index: usize) -> &[u8] {
        let start = index * self.width;
        &self.luma[start..start + self.width]
    }
}

/// Reads contiguous width x height 8-bit grayscale frames from a byte stream.
///
/// The stream carries no framing bytes. A clean or short read at a frame boundary ends the
/// stream; the frame geometry is fixed for the lifetime of the reader.
pub struct FrameReader<R: Read> {
    inner: R,
    width: usize,
    height: usize,
}

impl<R: Read> FrameReader<R> {
    pub fn new(inner: R, width: usize, height: usize) -> FrameReader<R> {
        assert!(width > 0 && height > 0, "frame dimensions must be non-zero");
        FrameReader { inner, width, height }
    }

    /// Reads the next frame, or returns `None` at the end of the stream.
    ///
    /// A partial trailing frame is treated as the end of the stream.
    pub fn next_frame(&mut self) -> Result<Option<RasterFrame>> {
        let mut luma = vec![0u8; self.width * self.height].into_boxed_slice();

        let mut filled = 0;

        while filled < luma.len() {
            match self.inner.read(&mut luma[filled..]) {
                Ok(0) => {
                    if filled > 0 {
                        debug!("discarding partial trailing frame ({} of {} bytes)", filled, luma.len());
                    }
                    return Ok(None);
                }
                Ok(count) => filled += count,
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => (),
                Err(err) => return Err(err.into()),
            }
        }

        Ok(Some(RasterFrame { width: self.width, height: self.height, luma }))
    }
}

#[cfg(test)]
mod tests {
    use super::FrameReader;

    #[test]
    fn verify_frame_reader() {
        // Two 4x2 frames followed by a partial third.
        let data: Vec<u8> = (0u8..20).collect();

        let mut reader = FrameReader::new(&data[..], 4, 2);

        let frame = reader.next_frame().unwrap().unwrap();
        assert_eq!(frame.width(), 4);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.line(0), &[0, 1, 2, 3]);
        assert_eq!(frame.line(1), &[4, 5, 6, 7]);

        let frame = reader.next_frame().unwrap().unwrap();
        assert_eq!(frame.line(1), &[12, 13, 14, 15]);

        // The trailing 4 bytes do not make a whole frame.
        assert!(reader.next_frame().unwrap().is_none());
    }
}
