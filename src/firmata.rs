//! The engine: owns the transport, parser, pin table and callbacks.

use embedded_hal_nb::serial::{ErrorType, Read, Write};

use crate::callbacks::{Callback, CallbackRegistry, Category};
use crate::dispatch::Dispatcher;
use crate::encoder::Encoder;
use crate::error::FirmataError;
use crate::parser::Parser;
use crate::pins::{PinEntry, PinTable};
use crate::protocol::PinMode;
use crate::serial::{BufferedRx, BufferedTx};

/// Callback type accepted by [`Firmata::attach`].
pub type EngineCallback<Tx, const PINS: usize> = Callback<BufferedTx<Tx>, PINS>;

pub type EngineError<Rx, Tx> =
    FirmataError<<Rx as ErrorType>::Error, <Tx as ErrorType>::Error>;

/// Name and version reported in reply to REPORT_FIRMWARE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FirmwareInfo {
    pub name: &'static str,
    pub major: u8,
    pub minor: u8,
}

pub struct Firmata<Rx: Read, Tx: Write, const PINS: usize> {
    rx: BufferedRx<Rx>,
    tx: BufferedTx<Tx>,
    parser: Parser,
    pins: PinTable<PINS>,
    callbacks: CallbackRegistry<BufferedTx<Tx>, PINS>,
    firmware: FirmwareInfo,
}

impl<Rx: Read, Tx: Write, const PINS: usize> Firmata<Rx, Tx, PINS> {
    pub fn new(rx: Rx, tx: Tx) -> Self {
        Firmata {
            rx: BufferedRx::new(rx),
            tx: BufferedTx::new(tx),
            parser: Parser::new(),
            pins: PinTable::new(),
            callbacks: CallbackRegistry::new(),
            firmware: FirmwareInfo::default(),
        }
    }

    fn dispatcher(&mut self) -> Dispatcher<'_, BufferedTx<Tx>, PINS> {
        Dispatcher {
            pins: &mut self.pins,
            callbacks: &mut self.callbacks,
            tx: &mut self.tx,
            firmware: &self.firmware,
        }
    }

    /// Announce ourselves to the host: protocol version, then firmware
    /// name and version.
    pub fn begin(&mut self) -> Result<(), EngineError<Rx, Tx>> {
        log::debug!(
            "starting {} {}.{}",
            self.firmware.name,
            self.firmware.major,
            self.firmware.minor
        );
        let firmware = self.firmware;
        let mut encoder = self.encoder();
        encoder.print_version()?;
        encoder.report_firmware(&firmware)?;
        Ok(())
    }

    pub fn set_firmware_name_and_version(&mut self, name: &'static str, major: u8, minor: u8) {
        self.firmware = FirmwareInfo { name, major, minor };
    }

    pub fn firmware(&self) -> &FirmwareInfo {
        &self.firmware
    }

    /// Bytes waiting to be parsed.
    pub fn available(&mut self) -> Result<usize, Rx::Error> {
        self.rx.available()
    }

    /// Parse one byte from the transport. `WouldBlock` when there is none.
    pub fn process_input(&mut self) -> nb::Result<(), EngineError<Rx, Tx>> {
        match self.rx.read() {
            Ok(byte) => self.parse(byte).map_err(nb::Error::Other),
            Err(nb::Error::WouldBlock) => Err(nb::Error::WouldBlock),
            Err(nb::Error::Other(e)) => Err(nb::Error::Other(FirmataError::Read(e))),
        }
    }

    /// Parse everything the transport has right now. Plain data bytes
    /// inside a sysex block are copied into the arena a run at a time
    /// instead of going through the state machine one by one. Returns the
    /// number of bytes consumed.
    pub fn process_block(&mut self) -> Result<usize, EngineError<Rx, Tx>> {
        self.rx.fill().map_err(FirmataError::Read)?;
        let mut count = 0;
        loop {
            let taken = self.parser.extend_sysex(self.rx.slice());
            if taken > 0 {
                self.rx.consume(taken);
                count += taken;
                continue;
            }
            let Some(byte) = self.rx.buf.pop_front() else {
                break;
            };
            self.parse(byte)?;
            count += 1;
        }
        Ok(count)
    }

    /// Feed a single byte to the state machine and act on whatever it
    /// completes.
    pub fn parse(&mut self, byte: u8) -> Result<(), EngineError<Rx, Tx>> {
        let Some(message) = self.parser.feed(byte) else {
            return Ok(());
        };
        let mut dispatcher = Dispatcher {
            pins: &mut self.pins,
            callbacks: &mut self.callbacks,
            tx: &mut self.tx,
            firmware: &self.firmware,
        };
        dispatcher.message(message)?;
        Ok(())
    }

    /// Drop any partially received message.
    pub fn reset_parser(&mut self) {
        self.parser.reset();
    }

    pub fn is_parsing_message(&self) -> bool {
        self.parser.is_parsing_message()
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    /// Same as receiving SYSTEM_RESET: parser cleared, pin states zeroed,
    /// reset handler called. Safe to call at any time.
    pub fn system_reset(&mut self) {
        self.parser.reset();
        self.dispatcher().system_reset();
    }

    pub fn attach(&mut self, callback: EngineCallback<Tx, PINS>) {
        self.callbacks.attach(callback);
    }

    pub fn detach(&mut self, category: Category) {
        self.callbacks.detach(category);
    }

    /// Detach by wire command value, START_SYSEX standing for the generic
    /// sysex handler. Unknown commands are ignored.
    pub fn detach_command(&mut self, command: u8) {
        if let Some(category) = Category::from_command(command) {
            self.callbacks.detach(category);
        }
    }

    pub fn is_attached(&self, category: Category) -> bool {
        self.callbacks.is_attached(category)
    }

    /// Hand a delay to the scheduler, if one registered.
    pub fn delay_task(&mut self, delay_ms: u32) {
        self.dispatcher().delay_task(delay_ms);
    }

    pub fn pin_mode(&self, pin: u8) -> Option<PinMode> {
        self.pins.mode(pin)
    }

    /// Pins marked `Ignore` keep that mode for good.
    pub fn set_pin_mode(&mut self, pin: u8, mode: PinMode) {
        self.dispatcher().set_pin_mode(pin, mode);
    }

    pub fn pin_state(&self, pin: u8) -> Option<u8> {
        self.pins.state(pin)
    }

    pub fn set_pin_state(&mut self, pin: u8, state: u8) {
        self.pins.set_state(pin, state);
    }

    pub fn pin(&self, pin: u8) -> Option<&PinEntry> {
        self.pins.get(pin)
    }

    pub fn pins(&self) -> &PinTable<PINS> {
        &self.pins
    }

    /// Writer for unsolicited output such as analog or digital reports.
    pub fn encoder(&mut self) -> Encoder<'_, BufferedTx<Tx>> {
        Encoder::new(&mut self.tx)
    }

    /// Push queued output to the hardware. `WouldBlock` while bytes remain.
    pub fn poll_flush(&mut self) -> nb::Result<(), Tx::Error> {
        Write::flush(&mut self.tx)
    }

    /// Give back the raw transports. Output still queued because the
    /// hardware was busy is dropped; call [`Firmata::poll_flush`] until it
    /// returns `Ok` first to keep it.
    pub fn release(self) -> (Rx, Tx) {
        if self.tx.pending() > 0 {
            log::warn!("releasing with {} unsent bytes", self.tx.pending());
        }
        (self.rx.into_inner(), self.tx.into_inner())
    }
}
