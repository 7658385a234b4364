// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies
#![forbid(unsafe_code)]

use core::{fmt, result::Result, str::FromStr};

/// V4L2 style pixel format code, stored in memory order.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// Y plane followed by interleaved CbCr, 4:2:0. The ISP's only output.
    pub const NV12: FourCC = FourCC(*b"NV12");
    /// Y plane followed by interleaved CrCb, 4:2:0.
    pub const NV21: FourCC = FourCC(*b"NV21");
    /// Packed YUV 4:2:2.
    pub const YUYV: FourCC = FourCC(*b"YUYV");

    /// Value as used in the `pixelformat` field of V4L2 structures.
    pub const fn to_u32(self) -> u32 {
        u32::from_le_bytes(self.0)
    }

    pub const fn from_u32(val: u32) -> FourCC {
        FourCC(val.to_le_bytes())
    }

    /// Bytes needed for one frame of `width` x `height`, or `None` if the
    /// format is not one the capture channels can produce.
    pub fn frame_size(self, width: u32, height: u32) -> Option<u32> {
        let pixels = width.checked_mul(height)?;
        match self {
            FourCC::NV12 | FourCC::NV21 => pixels.checked_mul(3).map(|v| v / 2),
            FourCC::YUYV => pixels.checked_mul(2),
            _ => None,
        }
    }
}

impl From<&[u8; 4]> for FourCC {
    fn from(buf: &[u8; 4]) -> FourCC {
        FourCC(*buf)
    }
}

impl From<u32> for FourCC {
    fn from(val: u32) -> FourCC {
        FourCC::from_u32(val)
    }
}

impl From<FourCC> for u32 {
    fn from(val: FourCC) -> Self {
        val.to_u32()
    }
}

impl FromStr for FourCC {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 4 {
            return Err(format!("fourcc must be exactly 4 characters: {:?}", s));
        }
        Ok(FourCC([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match core::str::from_utf8(&self.0) {
            Ok(s) => f.write_str(s),
            Err(_) => {
                for b in self.0 {
                    write!(f, "{}", core::ascii::escape_default(b))?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_tuple("FourCC")
            .field(&format_args!("{}", self))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v4l2_value() {
        // v4l2_fourcc('N', 'V', '1', '2')
        assert_eq!(FourCC::NV12.to_u32(), 0x3231_564e);
        assert_eq!(FourCC::from(0x3231_564e), FourCC::NV12);
    }

    #[test]
    fn test_frame_size() {
        assert_eq!(FourCC::NV12.frame_size(1920, 1080), Some(3_110_400));
        assert_eq!(FourCC::YUYV.frame_size(640, 480), Some(614_400));
        assert_eq!(FourCC(*b"H264").frame_size(640, 480), None);
    }

    #[test]
    fn test_parse_and_display() {
        let fourcc: FourCC = "NV21".parse().unwrap();
        assert_eq!(fourcc, FourCC::NV21);
        assert_eq!(fourcc.to_string(), "NV21");
        assert!("NV2".parse::<FourCC>().is_err());
        assert_eq!(FourCC([0, b'A', b'B', b'C']).to_string(), "\\x00ABC");
    }
}
