// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies
//
// Interface bring-up tests against the simulated board.
//
// Every test builds a fresh `SimBoard` and checks the hardware event trace
// the glue leaves behind. No hardware or vendor library is required.
//
// RUN:
//   cargo test -p akisp --test bringup

use akisp::{
    hw::{IoLevel, MipiMode, MipiPort},
    sim::{EventLog, HwEvent, SimBoard, SimIspConfig, SimSensorConfig},
    ChannelId, ChannelState, ClockId, Device, Error, PinState,
};

fn build(board: SimBoard) -> (Device, EventLog) {
    let _ = env_logger::builder().is_test(true).try_init();
    board.build().expect("simulated board")
}

/// Open a channel and bind `count` buffers, which triggers route init on
/// the last one.
fn bind_buffers(device: &Device, input: usize, channel: ChannelId, count: usize) -> Result<(), Error> {
    device.open(input, channel)?;
    device.queue_setup(input, channel, count)?;
    for index in 0..count {
        device.buffer_init(input, channel, index, 0x8000_0000 + (index as u64) * 0x10_0000)?;
    }
    Ok(())
}

#[test]
fn test_dvp_10bit_2v5_primary() {
    let mut sensor = SimSensorConfig::dvp();
    sensor.io_level = 1;
    let (device, log) = build(SimBoard::new().with_input(sensor).with_isp_config(SimIspConfig {
        bits_width: 10,
        ..Default::default()
    }));

    device.vi_interface_init(0).unwrap();

    assert_eq!(
        log.snapshot(),
        vec![
            HwEvent::ClockEnable(ClockId::Isp),
            HwEvent::PinSelect(PinState::Dvp0Bits10),
            HwEvent::DvpPort {
                input: 0,
                level: IoLevel::V2_5,
                bits: 10
            },
            HwEvent::PclkPolar {
                input: 0,
                rising: true
            },
            HwEvent::ClockEnable(ClockId::Sclk0),
            HwEvent::ClockRate(ClockId::Sclk0, 24_000_000),
        ]
    );
    assert_eq!(
        device.hardware().active_pin_state(),
        Some(PinState::Dvp0Bits10)
    );
}

#[test]
fn test_mipi_secondary_two_lanes() {
    let (device, log) = build(
        SimBoard::new()
            .with_input(SimSensorConfig::mipi(2, 24))
            .with_input(SimSensorConfig::mipi(2, 24)),
    );

    device.vi_interface_init(1).unwrap();

    assert_eq!(
        log.snapshot(),
        vec![
            HwEvent::PinSelect(PinState::Mipi1TwoLane),
            HwEvent::MipiPclk(100),
            HwEvent::MipiPrepare(MipiMode::Dual),
            HwEvent::MipiPortCfg {
                port: MipiPort::Port1,
                mhz: 24,
                lanes: 2
            },
            HwEvent::PclkPolar {
                input: 1,
                rising: true
            },
            HwEvent::Sclk1(24),
        ]
    );
    assert!(device.hardware().mipi_prepared());
}

#[test]
fn test_falling_edge_polarity() {
    let (device, log) = build(
        SimBoard::new()
            .with_input(SimSensorConfig::dvp())
            .with_isp_config(SimIspConfig {
                pclk_polarity: 1,
                ..Default::default()
            }),
    );

    device.vi_interface_init(0).unwrap();
    assert!(log.snapshot().contains(&HwEvent::PclkPolar {
        input: 0,
        rising: false
    }));
}

#[test]
fn test_unsupported_lanes_keep_pins() {
    let (device, _log) = build(SimBoard::new().with_input(SimSensorConfig::mipi(3, 24)));
    device.register_input(0).unwrap();
    assert_eq!(device.hardware().active_pin_state(), Some(PinState::Csi0Sclk));

    let err = bind_buffers(&device, 0, ChannelId::Main, 2).unwrap_err();
    assert!(matches!(err, Error::UnsupportedLanes(3)));

    assert_eq!(device.hardware().active_pin_state(), Some(PinState::Csi0Sclk));
    assert!(!device.is_route_initialized(0).unwrap());
    assert_eq!(
        device.channel(0, ChannelId::Main).unwrap().state(),
        ChannelState::AddressBound
    );
    assert!(matches!(
        device.start_streaming(0, ChannelId::Main),
        Err(Error::ChannelNotReady { .. })
    ));
}

#[test]
fn test_missing_pin_state() {
    let (device, log) = build(
        SimBoard::new()
            .with_input(SimSensorConfig::dvp())
            .without_pin_state(PinState::Dvp0Bits8),
    );

    let err = device.vi_interface_init(0).unwrap_err();
    assert!(matches!(err, Error::PinStateNotFound(PinState::Dvp0Bits8)));
    assert_eq!(err.errno(), -akisp::errno::EINVAL);
    assert!(!log
        .snapshot()
        .iter()
        .any(|e| matches!(e, HwEvent::DvpPort { .. })));
}

#[test]
fn test_missing_clocks() {
    let (device, log) = build(
        SimBoard::new()
            .with_input(SimSensorConfig::dvp())
            .without_clocks(),
    );

    // registration tolerates the missing sensor clock
    device.register_input(0).unwrap();

    let err = device.vi_interface_init(0).unwrap_err();
    assert!(matches!(err, Error::ClockUnavailable(ClockId::Isp)));
    assert_eq!(err.errno(), -akisp::errno::ENODEV);
    assert!(!log
        .snapshot()
        .iter()
        .any(|e| matches!(e, HwEvent::ClockEnable(_))));
}

#[test]
fn test_scan_method_defaults_to_progressive() {
    let mut sensor = SimSensorConfig::dvp();
    sensor.scan_method = None;
    let (device, _) = build(SimBoard::new().with_input(sensor));
    device.register_input(0).unwrap();

    bind_buffers(&device, 0, ChannelId::Main, 2).unwrap();
    assert!(device.is_route_initialized(0).unwrap());
    assert_eq!(
        device.scan_method(0).unwrap(),
        akisp::sensor::ScanMethod::Progressive
    );
}

#[test]
fn test_scan_method_interlaced() {
    let mut sensor = SimSensorConfig::dvp();
    sensor.scan_method = Some(1);
    let (device, _) = build(SimBoard::new().with_input(sensor));
    device.register_input(0).unwrap();

    bind_buffers(&device, 0, ChannelId::Main, 2).unwrap();
    assert_eq!(
        device.scan_method(0).unwrap(),
        akisp::sensor::ScanMethod::Interlaced
    );
}

#[test]
fn test_sensor_init_failure_retries() {
    let mut sensor = SimSensorConfig::dvp();
    sensor.fail_init = true;
    let (device, log) = build(SimBoard::new().with_input(sensor));
    device.register_input(0).unwrap();

    let err = bind_buffers(&device, 0, ChannelId::Main, 1).unwrap_err();
    assert!(matches!(err, Error::Sensor { op: "init", .. }));
    assert!(!device.is_route_initialized(0).unwrap());

    // the next completed batch runs bring-up again
    log.clear();
    device.queue_setup(0, ChannelId::Main, 1).unwrap();
    assert!(device.buffer_init(0, ChannelId::Main, 0, 0x1000).is_err());
    assert_eq!(
        log.count(|e| matches!(e, HwEvent::PinSelect(PinState::Dvp0Bits8))),
        1
    );
}

#[test]
fn test_route_init_once_per_session() {
    let (device, log) = build(SimBoard::new().with_input(SimSensorConfig::dvp()));
    device.register_input(0).unwrap();
    log.clear();

    for chn in ChannelId::ALL {
        bind_buffers(&device, 0, chn, 3).unwrap();
    }
    let dvp_pins = |e: &HwEvent| matches!(e, HwEvent::PinSelect(PinState::Dvp0Bits8));
    assert_eq!(log.count(dvp_pins), 1);
    assert_eq!(log.count(|e| matches!(e, HwEvent::SensorInit(0))), 1);
    assert_eq!(device.opened_count(0).unwrap(), 3);

    for chn in ChannelId::ALL {
        device.close(0, chn).unwrap();
    }
    assert_eq!(device.opened_count(0).unwrap(), 0);
    assert!(!device.is_route_initialized(0).unwrap());

    bind_buffers(&device, 0, ChannelId::Main, 3).unwrap();
    assert_eq!(log.count(dvp_pins), 2);
    assert_eq!(log.count(|e| matches!(e, HwEvent::SensorInit(0))), 2);
}

#[test]
fn test_concurrent_channels_single_route_init() {
    let (device, log) = build(SimBoard::new().with_input(SimSensorConfig::mipi(2, 24)));
    device.register_input(0).unwrap();
    log.clear();

    std::thread::scope(|s| {
        for chn in ChannelId::ALL {
            let device = &device;
            s.spawn(move || bind_buffers(device, 0, chn, 4).unwrap());
        }
    });

    assert!(device.is_route_initialized(0).unwrap());
    assert_eq!(
        log.count(|e| matches!(e, HwEvent::PinSelect(PinState::Mipi0TwoLane))),
        1
    );
    assert_eq!(log.count(|e| matches!(e, HwEvent::MipiPrepare(_))), 1);
    assert_eq!(log.count(|e| matches!(e, HwEvent::SensorInit(0))), 1);
    for chn in ChannelId::ALL {
        assert_eq!(
            device.channel(0, chn).unwrap().state(),
            ChannelState::AllBufferInit
        );
    }
}

#[test]
fn test_timing_callback_reaches_isp() {
    use akisp::{
        hw::Hardware,
        isp::IspTiming,
        sim::{SimCameraCtrl, SimClock, SimIsp, SimPinController, SimSensor, SimSubdev},
        DeviceConfig, InputDesc,
    };
    use std::sync::Arc;

    let log = EventLog::default();
    let hw = Hardware::new(
        Arc::new(SimPinController::new(log.clone())),
        Arc::new(SimCameraCtrl::new(log.clone())),
    )
    .with_isp_clock(Arc::new(SimClock::new(ClockId::Isp, log.clone())))
    .with_sclk0(Arc::new(SimClock::new(ClockId::Sclk0, log.clone())));
    let subdev = Arc::new(SimSubdev::new(0, log.clone()));
    let input = InputDesc::new(
        Arc::new(SimSensor::new(0, SimSensorConfig::dvp(), log.clone())),
        Arc::new(SimIsp::new(0, SimIspConfig::default(), log.clone())),
    )
    .with_subdev(subdev.clone());
    let device = Device::new(hw, DeviceConfig::default(), vec![input]).unwrap();

    device.register_input(0).unwrap();
    assert!(!device.sensor(0).unwrap().has_fallback_subdev());
    bind_buffers(&device, 0, ChannelId::Main, 1).unwrap();

    let timing = IspTiming {
        oneline: 2200,
        fsden: 1,
        hblank: 280,
        fsdnum: 0,
    };
    subdev.fire_timing(&timing).unwrap();
    assert!(log
        .snapshot()
        .contains(&HwEvent::IspMisc { input: 0, timing }));

    // an external control object survives unregister
    device.unregister_input(0).unwrap();
    assert!(device.sensor(0).unwrap().subdev().is_some());
}

#[test]
fn test_cropcap_defaults() {
    let (device, _) = build(
        SimBoard::new()
            .with_input(SimSensorConfig::dvp())
            .with_external_subdev(),
    );
    let default = akisp::subdev::CropCap::default();

    assert_eq!(device.cropcap(0, ChannelId::Main).unwrap(), default);
    assert_eq!(default.bounds, akisp::subdev::Rect::new(0, 0, 1920, 1080));
    assert_eq!(default.defrect, default.bounds);

    let (device, _) = build(SimBoard::new().with_input(SimSensorConfig::dvp()));
    assert_eq!(device.cropcap(0, ChannelId::Sub).unwrap(), default);
}
