// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies
//
// Capture buffer state machine tests.
//
// Drives queue setup, buffer binding, start and stop on the simulated ISP
// and checks the slot programming it receives.
//
// RUN:
//   cargo test -p akisp --test streaming

use akisp::{
    isp::{IspMode, IspStatus},
    sim::{EventLog, HwEvent, SimBoard, SimIspConfig, SimSensorConfig},
    ChannelId, ChannelState, Device, Error,
};

fn single(sensor: SimSensorConfig) -> (Device, EventLog) {
    let _ = env_logger::builder().is_test(true).try_init();
    let (device, log) = SimBoard::new()
        .with_input(sensor)
        .build()
        .expect("simulated board");
    device.register_input(0).unwrap();
    log.clear();
    (device, log)
}

fn addr(channel: ChannelId, index: usize) -> u64 {
    0x8000_0000 + channel.index() as u64 * 0x0100_0000 + index as u64 * 0x10_0000
}

fn stream(device: &Device, channel: ChannelId, count: usize) -> Result<(), Error> {
    device.open(0, channel)?;
    device.queue_setup(0, channel, count)?;
    for index in 0..count {
        device.buffer_init(0, channel, index, addr(channel, index))?;
    }
    device.start_streaming(0, channel)
}

#[test]
fn test_start_programs_slots() {
    let (device, log) = single(SimSensorConfig::dvp());
    stream(&device, ChannelId::Main, 6).unwrap();

    let slots: Vec<(usize, u64)> = log
        .snapshot()
        .into_iter()
        .filter_map(|e| match e {
            HwEvent::IspBufferAddr {
                channel: ChannelId::Main,
                slot,
                addr,
                ..
            } => Some((slot, addr)),
            _ => None,
        })
        .collect();
    assert_eq!(
        slots,
        (0..4)
            .map(|i| (i, addr(ChannelId::Main, i)))
            .collect::<Vec<_>>()
    );
    assert_eq!(
        log.count(|e| matches!(e, HwEvent::IspBufferEnable { .. })),
        4
    );

    let chn = device.channel(0, ChannelId::Main).unwrap();
    assert!(chn.is_streaming());
    assert_eq!(chn.bound_addrs().len(), 6);
    assert_eq!(device.isp_status(0).unwrap(), IspStatus::Running);
    assert_eq!(device.isp_mode(0).unwrap(), IspMode::RgbVideoOut);
    assert!(log.snapshot().contains(&HwEvent::IspMode {
        input: 0,
        mode: IspMode::RgbVideoOut
    }));
}

#[test]
fn test_capture_starts_once() {
    let (device, log) = single(SimSensorConfig::dvp());
    for chn in ChannelId::ALL {
        stream(&device, chn, 2).unwrap();
    }
    assert_eq!(log.count(|e| matches!(e, HwEvent::IspStart(0))), 1);
    assert!(log.snapshot().contains(&HwEvent::IspBufferAddr {
        input: 0,
        channel: ChannelId::Third,
        slot: 1,
        addr: addr(ChannelId::Third, 1),
    }));

    // starting twice is a no-op
    device.start_streaming(0, ChannelId::Main).unwrap();
    assert_eq!(log.count(|e| matches!(e, HwEvent::IspStart(0))), 1);
}

#[test]
fn test_stop_with_last_channel() {
    let (device, log) = single(SimSensorConfig::dvp());
    stream(&device, ChannelId::Main, 2).unwrap();
    stream(&device, ChannelId::Sub, 2).unwrap();

    device.stop_streaming(0, ChannelId::Main).unwrap();
    assert_eq!(log.count(|e| matches!(e, HwEvent::IspStop(0))), 0);
    assert_eq!(device.isp_status(0).unwrap(), IspStatus::Running);

    let main = device.channel(0, ChannelId::Main).unwrap();
    assert_eq!(main.state(), ChannelState::Unqueued);
    assert_eq!(main.vb_num(), 0);
    assert!(main.bound_addrs().is_empty());

    device.stop_streaming(0, ChannelId::Sub).unwrap();
    assert_eq!(log.count(|e| matches!(e, HwEvent::IspStop(0))), 1);
    // two slots from each channel
    assert_eq!(
        log.count(|e| matches!(e, HwEvent::IspBufferDisable { .. })),
        4
    );
    assert_eq!(device.isp_status(0).unwrap(), IspStatus::Stop);
}

#[test]
fn test_stop_disarms_only_that_channel() {
    let (device, log) = single(SimSensorConfig::dvp());
    stream(&device, ChannelId::Main, 2).unwrap();
    stream(&device, ChannelId::Sub, 2).unwrap();
    log.clear();

    device.stop_streaming(0, ChannelId::Main).unwrap();
    let disabled: Vec<(ChannelId, usize)> = log
        .snapshot()
        .into_iter()
        .filter_map(|e| match e {
            HwEvent::IspBufferDisable { channel, slot, .. } => Some((channel, slot)),
            _ => None,
        })
        .collect();
    assert_eq!(disabled, vec![(ChannelId::Main, 0), (ChannelId::Main, 1)]);
    assert_eq!(log.count(|e| matches!(e, HwEvent::IspStop(0))), 0);
    assert_eq!(
        device.channel(0, ChannelId::Main).unwrap().armed_slots(),
        0
    );

    let sub = device.channel(0, ChannelId::Sub).unwrap();
    assert!(sub.is_streaming());
    assert_eq!(sub.armed_slots(), 2);
    assert_eq!(device.isp_status(0).unwrap(), IspStatus::Running);

    // stopping again has nothing left to disarm
    log.clear();
    device.stop_streaming(0, ChannelId::Main).unwrap();
    assert_eq!(
        log.count(|e| matches!(e, HwEvent::IspBufferDisable { .. })),
        0
    );
}

#[test]
fn test_armed_slots_capped() {
    let (device, _log) = single(SimSensorConfig::dvp());
    stream(&device, ChannelId::Main, 6).unwrap();
    assert_eq!(
        device.channel(0, ChannelId::Main).unwrap().armed_slots(),
        4
    );
}

#[test]
fn test_failed_start_disarms_slots() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (device, log) = SimBoard::new()
        .with_input(SimSensorConfig::dvp())
        .with_isp_config(SimIspConfig {
            start_error: Some(-5),
            ..Default::default()
        })
        .build()
        .expect("simulated board");
    device.register_input(0).unwrap();
    log.clear();

    let err = stream(&device, ChannelId::Main, 3).unwrap_err();
    assert!(matches!(err, Error::Isp { code: -5, .. }));
    assert_eq!(
        log.count(|e| matches!(e, HwEvent::IspBufferEnable { .. })),
        3
    );
    assert_eq!(
        log.count(|e| matches!(
            e,
            HwEvent::IspBufferDisable {
                channel: ChannelId::Main,
                ..
            }
        )),
        3
    );

    let chn = device.channel(0, ChannelId::Main).unwrap();
    assert!(!chn.is_streaming());
    assert_eq!(chn.armed_slots(), 0);
    assert_eq!(device.isp_status(0).unwrap(), IspStatus::Stop);
}

#[test]
fn test_close_stops_streaming() {
    let (device, log) = single(SimSensorConfig::dvp());
    stream(&device, ChannelId::Main, 2).unwrap();

    device.close(0, ChannelId::Main).unwrap();
    assert_eq!(log.count(|e| matches!(e, HwEvent::IspStop(0))), 1);
    assert!(!device.channel(0, ChannelId::Main).unwrap().is_streaming());
    assert!(!device.is_route_initialized(0).unwrap());

    // a closed input can stream again
    stream(&device, ChannelId::Main, 2).unwrap();
    assert_eq!(log.count(|e| matches!(e, HwEvent::IspStart(0))), 2);
    assert_eq!(log.count(|e| matches!(e, HwEvent::SensorInit(0))), 2);
}

#[test]
fn test_unregister_stops_streaming() {
    let (device, log) = single(SimSensorConfig::dvp());
    stream(&device, ChannelId::Sub, 3).unwrap();

    device.unregister_input(0).unwrap();
    assert_eq!(log.count(|e| matches!(e, HwEvent::IspStop(0))), 1);
    assert!(!device.is_registered(0).unwrap());
    assert!(matches!(
        device.open(0, ChannelId::Main),
        Err(Error::InputNotRegistered(0))
    ));
}

#[test]
fn test_requeue_while_streaming() {
    let (device, _) = single(SimSensorConfig::dvp());
    stream(&device, ChannelId::Main, 2).unwrap();

    let err = device.queue_setup(0, ChannelId::Main, 4).unwrap_err();
    assert!(matches!(err, Error::ChannelBusy { .. }));
    assert_eq!(err.errno(), -akisp::errno::EBUSY);
}
