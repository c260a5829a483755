#![allow(dead_code)]

use std::{cell::RefCell, collections::VecDeque, convert::Infallible, rc::Rc};

use embedded_hal_nb::serial::{ErrorType, Read, Write};
use firmata_engine::{BufferedTx, Callback, Firmata, PinMode};

pub const PINS: usize = 20;

pub type Engine = Firmata<ReadBuffer, TxBuffer, PINS>;

/// Output transport that shares what it was sent with the test.
#[derive(Debug, Clone, Default)]
pub struct TxBuffer(pub Rc<RefCell<Vec<u8>>>);

impl TxBuffer {
    pub fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.0.borrow_mut())
    }
}

impl ErrorType for TxBuffer {
    type Error = Infallible;
}

impl Write for TxBuffer {
    fn write(&mut self, c: u8) -> nb::Result<(), Self::Error> {
        self.0.borrow_mut().push(c);
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        Ok(())
    }
}

/// Input transport the test can keep feeding.
#[derive(Debug, Clone, Default)]
pub struct ReadBuffer(pub Rc<RefCell<VecDeque<u8>>>);

impl ReadBuffer {
    pub fn push(&self, data: &[u8]) {
        self.0.borrow_mut().extend(data.iter().copied());
    }
}

impl ErrorType for ReadBuffer {
    type Error = Infallible;
}

impl Read for ReadBuffer {
    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        self.0.borrow_mut().pop_front().ok_or(nb::Error::WouldBlock)
    }
}

/// Everything a handler was called with, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Digital(u8, u16),
    ReportAnalog(u8, u16),
    ReportDigital(u8, u16),
    PinMode(u8, PinMode),
    PinValue(u8, u16),
    Reset,
    String(String),
    Sysex(u8, Vec<u8>),
    Delay(u32),
}

pub type Events = Rc<RefCell<Vec<Event>>>;

pub struct Harness {
    pub engine: Engine,
    pub input: ReadBuffer,
    pub output: TxBuffer,
    pub events: Events,
}

impl Harness {
    pub fn new() -> Harness {
        let input = ReadBuffer::default();
        let output = TxBuffer::default();
        let engine = Firmata::new(input.clone(), output.clone());
        Harness {
            engine,
            input,
            output,
            events: Rc::default(),
        }
    }

    /// A harness with every handler attached and recording.
    pub fn recording() -> Harness {
        let mut h = Harness::new();
        let events = h.events.clone();
        attach_recorders(&mut h.engine, &events);
        h
    }

    /// Push bytes and process them one at a time until the input is dry.
    pub fn send(&mut self, bytes: &[u8]) {
        self.input.push(bytes);
        loop {
            match self.engine.process_input() {
                Ok(()) => {}
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(e)) => panic!("{e}"),
            }
        }
        self.engine.poll_flush().unwrap();
    }

    /// Push bytes and process them as one block.
    pub fn send_block(&mut self, bytes: &[u8]) -> usize {
        self.input.push(bytes);
        let n = self.engine.process_block().unwrap();
        self.engine.poll_flush().unwrap();
        n
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn output(&self) -> Vec<u8> {
        self.output.take()
    }
}

pub fn attach_recorders(engine: &mut Engine, events: &Events) {
    type Cb = Callback<BufferedTx<TxBuffer>, PINS>;

    let e = events.clone();
    engine.attach(Cb::digital_message(move |_, port, value| {
        e.borrow_mut().push(Event::Digital(port, value))
    }));
    let e = events.clone();
    engine.attach(Cb::report_analog(move |_, pin, enable| {
        e.borrow_mut().push(Event::ReportAnalog(pin, enable))
    }));
    let e = events.clone();
    engine.attach(Cb::report_digital(move |_, port, enable| {
        e.borrow_mut().push(Event::ReportDigital(port, enable))
    }));
    let e = events.clone();
    engine.attach(Cb::set_pin_mode(move |_, pin, mode| {
        e.borrow_mut().push(Event::PinMode(pin, mode))
    }));
    let e = events.clone();
    engine.attach(Cb::set_digital_pin_value(move |_, pin, value| {
        e.borrow_mut().push(Event::PinValue(pin, value))
    }));
    let e = events.clone();
    engine.attach(Cb::system_reset(move |_| e.borrow_mut().push(Event::Reset)));
    let e = events.clone();
    engine.attach(Cb::string_data(move |_, s| {
        e.borrow_mut().push(Event::String(s.to_string()))
    }));
    let e = events.clone();
    engine.attach(Cb::sysex(move |_, command, payload| {
        e.borrow_mut().push(Event::Sysex(command, payload.to_vec()))
    }));
    let e = events.clone();
    engine.attach(Cb::delay_task(move |_, ms| e.borrow_mut().push(Event::Delay(ms))));
}
