use atmega328pb_firmware::application::{Dispatch, FanControl};
use atmega328pb_firmware::drivers::Console;
use atmega328pb_firmware::hal::{DutyLevel, FanPwm, PwmConfig};
use atmega328pb_firmware::sim::RegisterFile;
use embedded_hal_mock::serial::{Mock, Transaction};

fn fan(serial: &Mock<u8>) -> FanControl<Mock<u8>, RegisterFile> {
    let mut pwm = FanPwm::new(RegisterFile::new(), PwmConfig::default());
    pwm.configure();
    FanControl::new(Console::new(serial.clone()), pwm)
}

#[test]
fn banner_lists_commands() {
    let serial = Mock::new(&[
        Transaction::write_many(b"Fan Control Ready\r\n"),
        Transaction::write_many(b"Commands: w=low, s=medium, W=high, x=stop\r\n"),
    ]);
    let mut app = fan(&serial);
    app.banner().unwrap();
    serial.clone().done();
}

#[test]
fn idle_line_does_nothing() {
    let serial = Mock::new(&[Transaction::read_error(nb::Error::WouldBlock)]);
    let mut app = fan(&serial);
    assert_eq!(app.poll(), Ok(None));
    assert_eq!(app.pwm().level(), DutyLevel::Off);
    serial.clone().done();
}

#[test]
fn command_sequence_drives_duty() {
    let serial = Mock::new(&[
        Transaction::read(b'w'),
        Transaction::write_many(b"Fan: LOW (25%)\r\n"),
        Transaction::read_error(nb::Error::WouldBlock),
        Transaction::read(b's'),
        Transaction::write_many(b"Fan: MEDIUM (50%)\r\n"),
        Transaction::read(b'W'),
        Transaction::write_many(b"Fan: HIGH (80%)\r\n"),
        Transaction::read(b'x'),
        Transaction::write_many(b"Fan: STOPPED\r\n"),
        Transaction::read(b'q'),
        Transaction::write_many(b"Unknown: q\r\n"),
    ]);
    let mut app = fan(&serial);

    let mut transitions = Vec::new();
    let mut unrecognized = Vec::new();
    let mut compares = Vec::new();
    for _ in 0..6 {
        match app.poll().unwrap() {
            Some(Dispatch::Duty(level)) => {
                transitions.push(level);
                compares.push(app.pwm().compare());
            }
            Some(Dispatch::Unrecognized(byte)) => {
                unrecognized.push(byte);
                assert_eq!(app.pwm().level(), DutyLevel::Off);
                assert_eq!(app.pwm().compare(), 0);
            }
            None => {}
        }
    }

    assert_eq!(
        transitions,
        [DutyLevel::Low, DutyLevel::Medium, DutyLevel::High, DutyLevel::Off]
    );
    assert_eq!(unrecognized, [b'q']);

    let top = app.pwm().top() as u16;
    let expected: Vec<u8> = [25u16, 50, 80, 0]
        .iter()
        .map(|pct| (top * pct / 100) as u8)
        .collect();
    assert_eq!(compares, expected);
    serial.clone().done();
}

#[test]
fn upper_case_x_also_stops() {
    let serial = Mock::new(&[
        Transaction::read(b'W'),
        Transaction::write_many(b"Fan: HIGH (80%)\r\n"),
        Transaction::read(b'X'),
        Transaction::write_many(b"Fan: STOPPED\r\n"),
    ]);
    let mut app = fan(&serial);
    app.poll().unwrap();
    assert_eq!(app.poll(), Ok(Some(Dispatch::Duty(DutyLevel::Off))));
    assert_eq!(app.pwm().compare(), 0);
    serial.clone().done();
}
