// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use super::{
    AeAttr, AeRunInfo, AfStat, AwbStat, FrameRateAttr, IspCore, IspMode, IspTiming, MeAttr,
    Nr3dStat, OutputFormat, UvnrAttr, ISP_BUFFER_SLOTS,
};
use crate::{device::ChannelId, errno, isp_call, sensor::AeFastDefault, subdev::Rect, Error};
use akisp_sys as ffi;
use log::{debug, warn};
use std::{
    fmt,
    os::raw::{c_char, c_int, c_ulong, c_void},
    ptr::NonNull,
};

/// Opaque handle of the ISP core instance serving one input.
///
/// The core driver creates one per input when the sensor is attached and
/// owns it for the lifetime of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IspHandle(NonNull<c_void>);

// SAFETY: the handle is never dereferenced on this side; it is only passed
// back to the core, which serializes access to its own instance.
unsafe impl Send for IspHandle {}
unsafe impl Sync for IspHandle {}

impl IspHandle {
    /// Wrap a core handle, `None` for a null pointer.
    ///
    /// # Safety
    ///
    /// `ptr` must be a handle the ISP core driver created for one input and
    /// must stay valid while any [`VendorIsp`] holds it.
    pub unsafe fn from_raw(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(IspHandle)
    }

    pub fn as_ptr(self) -> ffi::isp_ctx {
        self.0.as_ptr()
    }
}

/// [`IspCore`] backed by the vendor library.
///
/// Capture-path calls are routed to the core instance named by the adapter's
/// [`IspHandle`]; without one they fail with [`Error::IspDetached`].
/// Statistics and tuning calls are process-wide. Entry points the installed
/// library lacks report [`Error::NotImplemented`]; if the library is absent
/// altogether every call does.
pub struct VendorIsp {
    lib: Option<&'static ffi::AkIspLibrary>,
    handle: Option<IspHandle>,
}

impl fmt::Debug for VendorIsp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("VendorIsp")
            .field("loaded", &self.lib.is_some())
            .field("handle", &self.handle)
            .finish()
    }
}

impl Default for VendorIsp {
    fn default() -> Self {
        VendorIsp::new()
    }
}

impl VendorIsp {
    /// Adapter over the process-wide library, degrading to a detached core
    /// when it cannot be loaded.
    pub fn new() -> Self {
        match ffi::init() {
            Ok(lib) => {
                let missing = lib.missing_symbols();
                if !missing.is_empty() {
                    debug!("ISP core lacks {}", missing.join(", "));
                }
                VendorIsp::with_library(Some(lib))
            }
            Err(err) => {
                warn!("ISP core {} not loaded: {}", ffi::library_path(), err);
                VendorIsp::with_library(None)
            }
        }
    }

    /// Adapter that requires the library to be present.
    pub fn load() -> Result<Self, Error> {
        let lib = ffi::init()?;
        Ok(VendorIsp::with_library(Some(lib)))
    }

    /// Adapter for the core instance of one input.
    pub fn attach(handle: IspHandle) -> Result<Self, Error> {
        Ok(VendorIsp::load()?.with_handle(handle))
    }

    pub fn with_library(lib: Option<&'static ffi::AkIspLibrary>) -> Self {
        VendorIsp { lib, handle: None }
    }

    pub fn with_handle(mut self, handle: IspHandle) -> Self {
        self.handle = Some(handle);
        self
    }

    pub fn handle(&self) -> Option<IspHandle> {
        self.handle
    }

    fn ctx(&self, call: &'static str) -> Result<ffi::isp_ctx, Error> {
        self.handle
            .map(IspHandle::as_ptr)
            .ok_or(Error::IspDetached(call))
    }

    fn slot_id(slot: usize) -> Result<c_int, Error> {
        if slot >= ISP_BUFFER_SLOTS {
            return Err(Error::InvalidBufferIndex {
                index: slot,
                capacity: ISP_BUFFER_SLOTS,
            });
        }
        Ok(ffi::AK_ISP_BUFFER_ONE + slot as c_int)
    }
}

fn check(call: &'static str, ret: c_int) -> Result<c_int, Error> {
    if ret < 0 {
        return Err(Error::Isp { call, code: ret });
    }
    Ok(ret)
}

fn to_c_int(call: &'static str, value: impl TryInto<c_int>) -> Result<c_int, Error> {
    value.try_into().map_err(|_| Error::Isp {
        call,
        code: -errno::EINVAL,
    })
}

pub(crate) fn c_buf_to_string(buf: &[c_char]) -> Result<String, Error> {
    let bytes: Vec<u8> = buf
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    Ok(std::str::from_utf8(&bytes)?.to_owned())
}

macro_rules! get_stat {
    ($self:ident, $call:ident, $raw:ty) => {{
        let mut raw = <$raw>::default();
        let ret = isp_call!($self.lib, $call(&mut raw))?;
        check(stringify!($call), ret)?;
        Ok(raw.into())
    }};
}

/// Call a per-input entry point with the adapter's core handle.
macro_rules! ctx_call {
    ($self:ident, $call:ident($($args:expr),*)) => {{
        let ctx = $self.ctx(stringify!($call))?;
        let ret = isp_call!($self.lib, $call(ctx $(, $args)*))?;
        check(stringify!($call), ret)
    }};
}

impl IspCore for VendorIsp {
    /// Statistics are process-wide, so a loaded library is enough.
    fn is_attached(&self) -> bool {
        self.lib.is_some()
    }

    fn bits_width(&self) -> Result<i32, Error> {
        ctx_call!(self, ak_isp_get_bits_width_compat())
    }

    fn pclk_polarity(&self) -> Result<i32, Error> {
        ctx_call!(self, ak_isp_get_pclk_polar_compat())
    }

    fn apply_mode(&self, mode: IspMode) -> Result<(), Error> {
        ctx_call!(self, ak_isp_vi_apply_mode_compat(mode.to_raw())).map(|_| ())
    }

    fn set_crop(&self, rect: Rect) -> Result<(), Error> {
        let call = "ak_isp_vi_set_crop_compat";
        let width = to_c_int(call, rect.width)?;
        let height = to_c_int(call, rect.height)?;
        ctx_call!(
            self,
            ak_isp_vi_set_crop_compat(rect.left, rect.top, width, height)
        )
        .map(|_| ())
    }

    fn crop(&self) -> Result<Rect, Error> {
        let (mut sx, mut sy, mut width, mut height): (c_int, c_int, c_int, c_int) = (0, 0, 0, 0);
        ctx_call!(
            self,
            ak_isp_vi_get_crop(&mut sx, &mut sy, &mut width, &mut height)
        )?;
        Ok(Rect::new(
            sx,
            sy,
            u32::try_from(width).unwrap_or(0),
            u32::try_from(height).unwrap_or(0),
        ))
    }

    fn set_misc_attr(&self, timing: &IspTiming) -> Result<(), Error> {
        ctx_call!(
            self,
            ak_isp_set_misc_attr_ex(timing.oneline, timing.fsden, timing.hblank, timing.fsdnum)
        )
        .map(|_| ())
    }

    fn set_ae_fast_default(&self, ae: &AeFastDefault) -> Result<(), Error> {
        let ae_fast = ffi::ae_fast_struct { words: ae.words };
        ctx_call!(self, ak_isp_set_ae_fast_struct_default(&ae_fast)).map(|_| ())
    }

    fn set_buffer_addr(&self, channel: ChannelId, slot: usize, addr: u64) -> Result<(), Error> {
        let id = VendorIsp::slot_id(slot)?;
        let addr = c_ulong::try_from(addr).map_err(|_| Error::Isp {
            call: "set_buffer_addr",
            code: -errno::EINVAL,
        })?;
        match channel {
            ChannelId::Main => ctx_call!(self, ak_isp_vo_set_main_buffer_addr(id, addr)),
            ChannelId::Sub => ctx_call!(self, ak_isp_vo_set_sub_buffer_addr(id, addr)),
            ChannelId::Third => ctx_call!(self, ak_isp_vo_set_ch3_buffer_addr(id, addr)),
        }
        .map(|_| ())
    }

    fn enable_buffer(&self, channel: ChannelId, slot: usize) -> Result<(), Error> {
        let id = VendorIsp::slot_id(slot)?;
        match channel {
            ChannelId::Main => ctx_call!(self, ak_isp_vo_enable_buffer_main(id)),
            ChannelId::Sub => ctx_call!(self, ak_isp_vo_enable_buffer_sub(id)),
            ChannelId::Third => ctx_call!(self, ak_isp_vo_enable_buffer_ch3(id)),
        }
        .map(|_| ())
    }

    fn disable_buffer(&self, channel: ChannelId, slot: usize) -> Result<(), Error> {
        let id = VendorIsp::slot_id(slot)?;
        match channel {
            ChannelId::Main => ctx_call!(self, ak_isp_vo_disable_buffer_main(id)),
            ChannelId::Sub => ctx_call!(self, ak_isp_vo_disable_buffer_sub(id)),
            ChannelId::Third => ctx_call!(self, ak_isp_vo_disable_buffer_ch3(id)),
        }
        .map(|_| ())
    }

    fn start_capturing(&self, format: OutputFormat) -> Result<(), Error> {
        debug!("start capturing {:?}", format);
        ctx_call!(self, ak_isp_vi_start_capturing_compat(format.to_raw())).map(|_| ())
    }

    fn stop_capturing(&self) -> Result<(), Error> {
        ctx_call!(self, ak_isp_vi_stop_capturing_compat()).map(|_| ())
    }

    fn check_irq_status(&self) -> Result<i32, Error> {
        ctx_call!(self, ak_isp_vo_check_irq_status_compat())
    }

    fn clear_irq_status(&self, bit: i32) -> Result<(), Error> {
        ctx_call!(self, ak_isp_vo_clear_irq_status_compat(bit)).map(|_| ())
    }

    fn version(&self) -> Result<String, Error> {
        let mut buf = [0 as c_char; 64];
        let len = to_c_int("ak_isp_get_version", buf.len())?;
        let ret = isp_call!(self.lib, ak_isp_get_version(buf.as_mut_ptr(), len))?;
        check("ak_isp_get_version", ret)?;
        c_buf_to_string(&buf)
    }

    fn ae_run_info(&self) -> Result<AeRunInfo, Error> {
        get_stat!(self, ak_isp_vp_get_ae_run_info, ffi::AK_ISP_AE_RUN_INFO)
    }

    fn frame_rate(&self) -> Result<FrameRateAttr, Error> {
        get_stat!(self, ak_isp_vp_get_frame_rate, ffi::AK_ISP_FRAME_RATE_ATTR)
    }

    fn af_stat(&self) -> Result<AfStat, Error> {
        get_stat!(self, ak_isp_vp_get_af_stat_info, ffi::AK_ISP_AF_STAT_INFO)
    }

    fn awb_stat(&self) -> Result<AwbStat, Error> {
        get_stat!(self, ak_isp_vp_get_awb_stat_info, ffi::AK_ISP_AWB_STAT_INFO)
    }

    fn nr3d_stat(&self) -> Result<Nr3dStat, Error> {
        get_stat!(
            self,
            ak_isp_vp_get_3d_nr_stat_info,
            ffi::AK_ISP_3D_NR_STAT_INFO
        )
    }

    fn ae_attr(&self) -> Result<AeAttr, Error> {
        get_stat!(self, ak_isp_vp_get_ae_attr, ffi::AK_ISP_AE_ATTR)
    }

    fn set_me_attr(&self, attr: &MeAttr) -> Result<(), Error> {
        let raw = ffi::AK_ISP_ME_ATTR::from(*attr);
        let ret = isp_call!(self.lib, ak_isp_vp_set_me_attr(&raw))?;
        check("ak_isp_vp_set_me_attr", ret).map(|_| ())
    }

    fn me_attr(&self) -> Result<MeAttr, Error> {
        get_stat!(self, ak_isp_vp_get_me_attr, ffi::AK_ISP_ME_ATTR)
    }

    fn set_uvnr_attr(&self, attr: &UvnrAttr) -> Result<(), Error> {
        let raw = ffi::AK_ISP_UVNR_ATTR::from(*attr);
        let ret = isp_call!(self.lib, ak_isp_vp_set_uvnr_attr(&raw))?;
        check("ak_isp_vp_set_uvnr_attr", ret).map(|_| ())
    }

    fn uvnr_attr(&self) -> Result<UvnrAttr, Error> {
        get_stat!(self, ak_isp_vp_get_uvnr_attr, ffi::AK_ISP_UVNR_ATTR)
    }

    fn set_ae_work_suspend(&self, suspend: i32) -> Result<(), Error> {
        let ret = isp_call!(self.lib, ak_isp_set_ae_work_suspend(suspend))?;
        check("ak_isp_set_ae_work_suspend", ret).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn dangling_handle() -> IspHandle {
        // never dereferenced: the library is absent in these tests
        unsafe { IspHandle::from_raw(NonNull::<c_void>::dangling().as_ptr()) }.unwrap()
    }

    #[test]
    fn test_null_handle_is_rejected() {
        assert!(unsafe { IspHandle::from_raw(std::ptr::null_mut()) }.is_none());
    }

    #[test]
    fn test_capture_path_needs_handle() {
        let isp = VendorIsp::with_library(None);
        assert!(isp.handle().is_none());
        assert!(matches!(
            isp.bits_width(),
            Err(Error::IspDetached("ak_isp_get_bits_width_compat"))
        ));
        assert!(matches!(
            isp.start_capturing(OutputFormat::Yuv420SemiPlanar),
            Err(Error::IspDetached("ak_isp_vi_start_capturing_compat"))
        ));
        // process-wide calls do not need one
        assert!(matches!(
            isp.version(),
            Err(Error::NotImplemented("ak_isp_get_version"))
        ));
    }

    #[test]
    fn test_detached_library() {
        let isp = VendorIsp::with_library(None).with_handle(dangling_handle());
        assert!(!isp.is_attached());
        assert!(matches!(
            isp.bits_width(),
            Err(Error::NotImplemented("ak_isp_get_bits_width_compat"))
        ));
        assert!(matches!(
            isp.apply_mode(IspMode::RgbOut),
            Err(Error::NotImplemented("ak_isp_vi_apply_mode_compat"))
        ));
    }

    #[test]
    fn test_buffer_calls_are_per_channel() {
        let isp = VendorIsp::with_library(None).with_handle(dangling_handle());
        let expected = [
            (
                ChannelId::Main,
                "ak_isp_vo_set_main_buffer_addr",
                "ak_isp_vo_enable_buffer_main",
                "ak_isp_vo_disable_buffer_main",
            ),
            (
                ChannelId::Sub,
                "ak_isp_vo_set_sub_buffer_addr",
                "ak_isp_vo_enable_buffer_sub",
                "ak_isp_vo_disable_buffer_sub",
            ),
            (
                ChannelId::Third,
                "ak_isp_vo_set_ch3_buffer_addr",
                "ak_isp_vo_enable_buffer_ch3",
                "ak_isp_vo_disable_buffer_ch3",
            ),
        ];
        for (chn, set, enable, disable) in expected {
            match isp.set_buffer_addr(chn, 1, 0x8000_0000) {
                Err(Error::NotImplemented(call)) => assert_eq!(call, set),
                other => panic!("{}: {:?}", chn, other),
            }
            match isp.enable_buffer(chn, 1) {
                Err(Error::NotImplemented(call)) => assert_eq!(call, enable),
                other => panic!("{}: {:?}", chn, other),
            }
            match isp.disable_buffer(chn, 1) {
                Err(Error::NotImplemented(call)) => assert_eq!(call, disable),
                other => panic!("{}: {:?}", chn, other),
            }
        }
    }

    #[test]
    fn test_slot_range_checked_first() {
        let isp = VendorIsp::with_library(None);
        assert!(matches!(
            isp.enable_buffer(ChannelId::Main, ISP_BUFFER_SLOTS),
            Err(Error::InvalidBufferIndex { index: 4, capacity: 4 })
        ));
    }

    #[test]
    fn test_c_buf_to_string() {
        let mut buf = [0 as c_char; 16];
        for (dst, src) in buf.iter_mut().zip(b"V3.1.02") {
            *dst = *src as c_char;
        }
        assert_eq!(c_buf_to_string(&buf).unwrap(), "V3.1.02");
        assert_eq!(c_buf_to_string(&[0 as c_char; 4]).unwrap(), "");
    }

    #[test]
    #[serial]
    fn test_missing_library_degrades() {
        if ffi::try_library().is_some() {
            return;
        }
        let prev = std::env::var(ffi::LIBRARY_ENV).ok();
        std::env::set_var(ffi::LIBRARY_ENV, "/nonexistent/libakisp-test.so");

        assert!(matches!(VendorIsp::load(), Err(Error::LibraryNotLoaded(_))));
        assert!(matches!(
            VendorIsp::attach(dangling_handle()),
            Err(Error::LibraryNotLoaded(_))
        ));
        let isp = VendorIsp::new();
        assert!(!isp.is_attached());
        assert!(matches!(isp.ae_attr(), Err(Error::NotImplemented(_))));

        match prev {
            Some(path) => std::env::set_var(ffi::LIBRARY_ENV, path),
            None => std::env::remove_var(ffi::LIBRARY_ENV),
        }
    }
}
