// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Text dumps of the ISP statistics
//!
//! Each [`Section`] renders the statistics of the ISP selected by the
//! `isp_index` attribute as `key:value` lines under an `isp-<id>:` header.
//! A failing getter replaces the whole dump with `noisp`.

use crate::{
    device::Device,
    isp::{IspCore, MD_COLS, MD_ROWS},
    Error,
};
use log::{debug, warn};
use std::{
    fmt::{self, Write},
    str::FromStr,
    sync::{
        atomic::{AtomicI32, Ordering},
        Arc,
    },
};

const NO_ISP: &str = "noisp\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    IspIndex,
    IspVersion,
    AeRunInfo,
    FrameRate,
    AfStatInfo,
    AwbStatInfo,
    /// Motion detection rows 0 to 11.
    Nr3dUpper,
    /// Motion detection rows 12 to 23.
    Nr3dLower,
    AeAttr,
}

impl Section {
    pub const ALL: [Section; 9] = [
        Section::IspIndex,
        Section::IspVersion,
        Section::AeRunInfo,
        Section::FrameRate,
        Section::AfStatInfo,
        Section::AwbStatInfo,
        Section::Nr3dUpper,
        Section::Nr3dLower,
        Section::AeAttr,
    ];

    /// Attribute name of the section.
    pub const fn name(self) -> &'static str {
        match self {
            Section::IspIndex => "isp_index",
            Section::IspVersion => "isp_version",
            Section::AeRunInfo => "ae_run_info",
            Section::FrameRate => "frame_rate",
            Section::AfStatInfo => "af_stat_info",
            Section::AwbStatInfo => "awb_stat_info",
            Section::Nr3dUpper => "3d_nr_stat_info_0_11",
            Section::Nr3dLower => "3d_nr_stat_info_12_23",
            Section::AeAttr => "ae_attr",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Section {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .into_iter()
            .find(|section| section.name() == s)
            .ok_or(Error::NotSupported("diagnostics section"))
    }
}

/// Decimal prefix of `s` the way `strtol` reads it: leading whitespace and
/// one sign are accepted, parsing stops at the first non-digit and an empty
/// prefix reads as zero. Out of range values saturate.
pub fn parse_lenient(s: &str) -> i32 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let magnitude = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, digit| {
            acc.saturating_mul(10)
                .saturating_add(i64::from(digit - b'0'))
        });
    let value = if negative { -magnitude } else { magnitude };
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Diagnostics attribute group of one device.
#[derive(Debug, Default)]
pub struct Diagnostics {
    isp_index: AtomicI32,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    pub fn isp_index(&self) -> i32 {
        self.isp_index.load(Ordering::Acquire)
    }

    /// Select the ISP later sections report on.
    pub fn store_isp_index(&self, buf: &str) -> i32 {
        let index = parse_lenient(buf);
        debug!("diagnostics isp index {}", index);
        self.isp_index.store(index, Ordering::Release);
        index
    }

    /// Render `section` for the ISP of the selected input of `device`.
    pub fn show(&self, device: &Device, section: Section) -> String {
        let cores: Vec<Arc<dyn IspCore>> = (0..device.input_count())
            .filter_map(|id| device.isp(id).ok())
            .collect();
        self.show_cores(&cores, section)
    }

    /// Render `section` for the selected core of `cores`, indexed by input.
    pub fn show_cores(&self, cores: &[Arc<dyn IspCore>], section: Section) -> String {
        if section == Section::IspIndex {
            return format!("isp_index:{}\n", self.isp_index());
        }

        let mut buf = String::new();
        for (id, isp) in cores.iter().enumerate() {
            if usize::try_from(self.isp_index()).ok() != Some(id) {
                continue;
            }
            if let Err(err) = render(&mut buf, id, isp.as_ref(), section) {
                warn!("isp-{} {}: {}", id, section, err);
                return NO_ISP.to_owned();
            }
        }
        buf
    }
}

fn render(buf: &mut String, id: usize, isp: &dyn IspCore, section: Section) -> Result<(), Error> {
    if section == Section::IspVersion {
        let version = isp.version()?;
        let _ = writeln!(buf, "version:{}", version);
        return Ok(());
    }

    let working = isp.is_attached();
    let _ = writeln!(
        buf,
        "isp-{}:{}",
        id,
        if working { "working" } else { "noworking" }
    );
    if !working {
        return Ok(());
    }

    match section {
        Section::AeRunInfo => {
            let info = isp.ae_run_info()?;
            kv(buf, "current_calc_avg_lumi", info.current_calc_avg_lumi);
            kv(
                buf,
                "current_calc_avg_compensation_lumi",
                info.current_calc_avg_compensation_lumi,
            );
            kv(buf, "current_a_gain", info.current_a_gain);
            kv(buf, "current_d_gain", info.current_d_gain);
            kv(buf, "current_isp_d_gain", info.current_isp_d_gain);
            kv(buf, "current_exp_time", info.current_exp_time);
            kv(buf, "current_exp_time_step", info.current_exp_time_step);
        }
        Section::FrameRate => {
            // key names match the vendor tools
            let rate = isp.frame_rate()?;
            kv(buf, "hight_light_frame_rate", rate.high_light_frame_rate);
            kv(buf, "hight_light_max_exp_time", rate.high_light_max_exp_time);
            kv(buf, "low_light_frame_rate", rate.low_light_frame_rate);
            kv(buf, "low_light_max_exp_time", rate.low_light_max_exp_time);
            kv(
                buf,
                "low_light_to_hight_light_gain",
                rate.low_light_to_high_light_gain,
            );
        }
        Section::AfStatInfo => {
            let stat = isp.af_stat()?;
            for (i, value) in stat.af_statics.iter().enumerate() {
                let _ = writeln!(buf, "af_statics[{}]:{}", i, value);
            }
        }
        Section::AwbStatInfo => {
            let stat = isp.awb_stat()?;
            kv(buf, "r_gain", stat.r_gain);
            kv(buf, "g_gain", stat.g_gain);
            kv(buf, "b_gain", stat.b_gain);
            kv(buf, "r_offset", stat.r_offset);
            kv(buf, "g_offset", stat.g_offset);
            kv(buf, "b_offset", stat.b_offset);
            kv(buf, "current_colortemp_index", stat.current_colortemp_index);
        }
        Section::Nr3dUpper | Section::Nr3dLower => {
            let (start, end) = if section == Section::Nr3dUpper {
                (0, MD_ROWS / 2 - 1)
            } else {
                (MD_ROWS / 2, MD_ROWS - 1)
            };
            let stat = isp.nr3d_stat()?;
            kv(buf, "MD_level", stat.md_level);
            let _ = writeln!(buf, "start-line:{}, end-line:{}", start, end);
            for row in &stat.md_stat[start..=end] {
                for cell in row.iter().take(MD_COLS) {
                    let _ = write!(buf, "{}\t", cell);
                }
                buf.push('\n');
            }
        }
        Section::AeAttr => {
            let attr = isp.ae_attr()?;
            kv(buf, "exp_time_max", attr.exp_time_max);
            kv(buf, "exp_time_min", attr.exp_time_min);
            kv(buf, "d_gain_max", attr.d_gain_max);
            kv(buf, "d_gain_min", attr.d_gain_min);
            kv(buf, "isp_d_gain_max", attr.isp_d_gain_max);
            kv(buf, "isp_d_gain_min", attr.isp_d_gain_min);
            kv(buf, "a_gain_max", attr.a_gain_max);
            kv(buf, "a_gain_min", attr.a_gain_min);
            kv(buf, "exp_step", attr.exp_step);
            kv(buf, "exp_stable_range", attr.exp_stable_range);
        }
        Section::IspIndex | Section::IspVersion => {}
    }
    Ok(())
}

fn kv(buf: &mut String, key: &str, value: impl fmt::Display) {
    let _ = writeln!(buf, "{}:{}", key, value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        device::{DeviceConfig, InputDesc},
        hw::Hardware,
        isp::VendorIsp,
        sim::{EventLog, SimBoard, SimCameraCtrl, SimPinController, SimSensor, SimSensorConfig},
    };

    fn device() -> Device {
        let (device, _) = SimBoard::new()
            .with_input(SimSensorConfig::dvp())
            .with_input(SimSensorConfig::dvp())
            .build()
            .unwrap();
        device
    }

    #[test]
    fn test_section_names() {
        for section in Section::ALL {
            assert_eq!(section.name().parse::<Section>().unwrap(), section);
        }
        assert!("3d_nr".parse::<Section>().is_err());
    }

    #[test]
    fn test_parse_lenient() {
        assert_eq!(parse_lenient("1\n"), 1);
        assert_eq!(parse_lenient("  -3abc"), -3);
        assert_eq!(parse_lenient("+7"), 7);
        assert_eq!(parse_lenient("abc"), 0);
        assert_eq!(parse_lenient(""), 0);
        assert_eq!(parse_lenient("99999999999"), i32::MAX);
    }

    #[test]
    fn test_isp_index() {
        let diag = Diagnostics::new();
        let device = device();
        assert_eq!(diag.show(&device, Section::IspIndex), "isp_index:0\n");
        assert_eq!(diag.store_isp_index("1\n"), 1);
        assert_eq!(diag.show(&device, Section::IspIndex), "isp_index:1\n");
    }

    #[test]
    fn test_selects_one_input() {
        let diag = Diagnostics::new();
        let device = device();
        diag.store_isp_index("1");
        let text = diag.show(&device, Section::AwbStatInfo);
        assert!(text.starts_with("isp-1:working\nr_gain:256\n"));
        assert!(!text.contains("isp-0"));

        diag.store_isp_index("5");
        assert_eq!(diag.show(&device, Section::AwbStatInfo), "");
    }

    #[test]
    fn test_version_and_frame_rate() {
        let diag = Diagnostics::new();
        let device = device();
        assert_eq!(diag.show(&device, Section::IspVersion), "version:sim-isp\n");
        let text = diag.show(&device, Section::FrameRate);
        assert!(text.contains("hight_light_frame_rate:25\n"));
        assert!(text.contains("low_light_frame_rate:12\n"));
    }

    #[test]
    fn test_3dnr_rows() {
        let diag = Diagnostics::new();
        let device = device();

        let upper = diag.show(&device, Section::Nr3dUpper);
        let lines: Vec<&str> = upper.lines().collect();
        assert_eq!(lines[0], "isp-0:working");
        assert_eq!(lines[1], "MD_level:2");
        assert_eq!(lines[2], "start-line:0, end-line:11");
        assert_eq!(lines.len(), 3 + 12);
        assert_eq!(lines[3], "0\t".repeat(MD_COLS));

        let lower = diag.show(&device, Section::Nr3dLower);
        assert!(lower.contains("start-line:12, end-line:23\n"));
        assert!(lower.ends_with(&format!("{}\n", "23\t".repeat(MD_COLS))));
    }

    #[test]
    fn test_ae_attr() {
        let diag = Diagnostics::new();
        let text = diag.show(&device(), Section::AeAttr);
        assert!(text.contains("exp_time_max:1125\n"));
        assert!(text.contains("a_gain_min:0\n"));
        assert!(text.ends_with("exp_stable_range:0\n"));
    }

    #[test]
    fn test_failing_getter_is_noisp() {
        let log = EventLog::default();
        let hw = Hardware::new(
            Arc::new(SimPinController::new(log.clone())),
            Arc::new(SimCameraCtrl::new(log.clone())),
        );
        let input = InputDesc::new(
            Arc::new(SimSensor::new(0, SimSensorConfig::dvp(), log)),
            Arc::new(VendorIsp::with_library(None)),
        );
        let device = Device::new(hw, DeviceConfig::default(), vec![input]).unwrap();
        let diag = Diagnostics::new();

        // a detached core reports the header only
        assert_eq!(diag.show(&device, Section::AeRunInfo), "isp-0:noworking\n");
        assert_eq!(diag.show(&device, Section::IspVersion), "noisp\n");
    }
}
