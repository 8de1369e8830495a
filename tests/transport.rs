mod common;

use common::{Cmd, Event, Rig};
use tiltpanel::command::{reg, Command, Transport, MAX_PARAMETERS};
use tiltpanel::ErrorKind;

fn transport(rig: &Rig) -> Transport<common::MockSpi, common::MockPin> {
    Transport::new(rig.spi(), rig.dc_pin(), 10)
}

#[test]
fn command_frame_on_the_wire() {
    let rig = Rig::new();
    let mut t = transport(&rig);

    t.send(&rig.clock(), &Command::with(reg::COLMOD, &[0x05])).unwrap();

    assert_eq!(
        rig.events(),
        vec![
            Event::Dc(false),
            Event::SpiOn,
            Event::Byte(reg::COLMOD),
            Event::Dc(true),
            Event::Byte(0x05),
            Event::SpiOff,
        ]
    );
}

#[test]
fn too_many_parameters_never_touches_the_port() {
    let rig = Rig::new();
    let mut t = transport(&rig);
    let params = [0u8; MAX_PARAMETERS + 1];

    let err = t
        .send_command(&rig.clock(), reg::GMCTRP1, Some(&params), MAX_PARAMETERS + 1)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::TooManyParameters);
    assert!(rig.events().is_empty());
}

#[test]
fn missing_parameters_are_rejected_before_io() {
    let rig = Rig::new();
    let mut t = transport(&rig);

    let err = t.send_command(&rig.clock(), reg::CASET, None, 4).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameters);

    let err = t.send_command(&rig.clock(), reg::CASET, Some(&[0, 1]), 4).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameters);

    assert!(rig.events().is_empty());
}

#[test]
fn zero_count_sends_bare_register() {
    let rig = Rig::new();
    let mut t = transport(&rig);

    t.send_command(&rig.clock(), reg::SLPOUT, None, 0).unwrap();

    assert_eq!(rig.commands(), vec![Cmd { register: reg::SLPOUT, params: vec![] }]);
}

#[test]
fn timeout_still_disables_the_port() {
    let rig = Rig::new();
    rig.stall_on.set(Some(reg::SWRESET));
    let mut t = transport(&rig);

    let err = t.send(&rig.clock(), &Command::bare(reg::SWRESET)).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(rig.events().last(), Some(&Event::SpiOff));
    assert_eq!(rig.count(&Event::SpiOn), rig.count(&Event::SpiOff));
}

#[test]
fn stalled_port_times_out_within_the_bound() {
    let rig = Rig::new();
    rig.stalled.set(true);
    let mut t = transport(&rig);

    let err = t.send(&rig.clock(), &Command::bare(reg::NOP)).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(rig.now.get() <= 12, "waited {} ms", rig.now.get());
    assert_eq!(rig.count(&Event::Byte(reg::NOP)), 0);
}

#[test]
fn released_port_reports_no_transport() {
    let rig = Rig::new();
    let mut t = transport(&rig);
    assert!(t.release().is_some());
    assert!(!t.is_bound());

    let err = t.send(&rig.clock(), &Command::bare(reg::NOP)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoTransport);
    assert!(rig.events().is_empty());

    t.bind(rig.spi());
    t.send(&rig.clock(), &Command::bare(reg::NOP)).unwrap();
}
