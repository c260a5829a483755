//! Host-side demo: runs a scripted host session through the engine over
//! in-memory transports and prints what the board would answer.

use std::{collections::VecDeque, convert::Infallible};

use embedded_hal_nb::serial::{ErrorType, Read, Write};
use firmata_engine::{EngineCallback, Firmata, PinMode};

const PINS: usize = 20;

type Callback = EngineCallback<TxBuffer, PINS>;

#[derive(Debug, Default)]
struct TxBuffer(Vec<u8>);

impl ErrorType for TxBuffer {
    type Error = Infallible;
}

impl Write for TxBuffer {
    fn write(&mut self, c: u8) -> nb::Result<(), Self::Error> {
        self.0.push(c);
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        Ok(())
    }
}

#[derive(Debug)]
struct ReadBuffer(VecDeque<u8>);

impl ErrorType for ReadBuffer {
    type Error = Infallible;
}

impl Read for ReadBuffer {
    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        self.0.pop_front().ok_or(nb::Error::WouldBlock)
    }
}

fn main() {
    let session = [
        0xF9, // version query
        0xF0, 0x79, 0xF7, // firmware query
        0xF4, 13, 0x01, // pin 13 -> output
        0x91, 0x20, 0x00, // port 1, pin 13 high
        0xC0, 0x01, // report analog 0
        0xF0, 0x71, b'h', 0, b'i', 0, 0xF7, // string
    ];

    let rx = ReadBuffer(VecDeque::from(session.to_vec()));
    let mut firmata: Firmata<ReadBuffer, TxBuffer, PINS> = Firmata::new(rx, TxBuffer::default());
    firmata.set_firmware_name_and_version("demo", 3, 1);

    firmata.attach(Callback::set_pin_mode(|_, pin, mode| {
        println!("pin {pin} mode {mode:?}");
    }));
    firmata.attach(Callback::digital_message(|ctx, port, value| {
        println!("port {port} <- {value:#010b}");
        for bit in 0..8u8 {
            let pin = port * 8 + bit;
            if ctx.pins.mode(pin) == Some(PinMode::Output) {
                ctx.pins.set_state(pin, ((value >> bit) & 1) as u8);
            }
        }
    }));
    firmata.attach(Callback::report_analog(|ctx, pin, enable| {
        println!("report analog {pin}: {enable}");
        if enable != 0 {
            let _ = ctx.reply.send_analog(pin, 512);
        }
    }));
    firmata.attach(Callback::string_data(|_, s| println!("host says {s:?}")));

    if let Err(e) = firmata.begin() {
        eprintln!("{e}");
        return;
    }
    match firmata.process_block() {
        Ok(n) => println!("consumed {n} bytes"),
        Err(e) => eprintln!("{e}"),
    }
    println!("pin 13 state {:?}", firmata.pin_state(13));

    let (_, tx) = firmata.release();
    let hex: Vec<String> = tx.0.iter().map(|b| format!("{b:02X}")).collect();
    println!("reply: {}", hex.join(" "));
}
