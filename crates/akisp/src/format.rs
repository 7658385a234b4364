// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use crate::fourcc::FourCC;
use std::fmt;

/// Negotiated pixel format of one capture channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormat {
    pub width: u32,
    pub height: u32,
    pub fourcc: FourCC,
}

impl PixelFormat {
    pub const fn new(width: u32, height: u32, fourcc: FourCC) -> Self {
        PixelFormat {
            width,
            height,
            fourcc,
        }
    }

    /// Size in bytes of one buffer holding a frame in this format.
    ///
    /// Formats the ISP cannot emit are sized as NV12, which is what the
    /// hardware writes regardless of the request.
    pub fn sizeimage(&self) -> u32 {
        self.fourcc
            .frame_size(self.width, self.height)
            .or_else(|| FourCC::NV12.frame_size(self.width, self.height))
            .unwrap_or(0)
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}x{} {}", self.width, self.height, self.fourcc)
    }
}
