//! Acting on completed messages.
//!
//! REPORT_VERSION, REPORT_FIRMWARE and overflow diagnostics are answered
//! here; everything else goes to the registered callbacks or, for pin
//! modes, into the pin table first.

use embedded_io::Write;
use heapless::String;

use crate::callbacks::{CallbackRegistry, Context};
use crate::encoder::Encoder;
use crate::firmata::FirmwareInfo;
use crate::packed::from_two_7bit_bytes;
use crate::parser::{FixedCommand, Message};
use crate::pins::PinTable;
use crate::protocol::{EXTENDED_ANALOG, MAX_DATA_BYTES, PinMode, REPORT_FIRMWARE, STRING_DATA};

/// Worst case for a decoded string: every character is two payload bytes
/// and up to three bytes of UTF-8.
pub const STRING_CAPACITY: usize = MAX_DATA_BYTES / 2 * 3;

pub const OVERFLOW_MESSAGE: &str = "Discarding input message, out of buffer";

pub struct Dispatcher<'a, W: Write, const PINS: usize> {
    pub pins: &'a mut PinTable<PINS>,
    pub callbacks: &'a mut CallbackRegistry<W, PINS>,
    pub tx: &'a mut W,
    pub firmware: &'a FirmwareInfo,
}

impl<'a, W: Write, const PINS: usize> Dispatcher<'a, W, PINS> {
    fn split(&mut self) -> (Context<'_, W, PINS>, &mut CallbackRegistry<W, PINS>) {
        let ctx = Context {
            reply: Encoder::new(&mut *self.tx),
            pins: &mut *self.pins,
        };
        (ctx, &mut *self.callbacks)
    }

    pub fn message(&mut self, message: Message<'_>) -> Result<(), W::Error> {
        match message {
            Message::SystemReset => {
                self.system_reset();
                Ok(())
            }
            Message::ReportVersion => Encoder::new(&mut *self.tx).print_version(),
            Message::Overflow => {
                log::warn!("sysex message exceeded {MAX_DATA_BYTES} bytes, discarded");
                Encoder::new(&mut *self.tx).send_string(OVERFLOW_MESSAGE)
            }
            Message::Fixed {
                command,
                channel,
                args,
            } => self.fixed(command, channel, args),
            Message::Sysex(data) => self.sysex(data),
        }
    }

    /// `args` is in arena order, last wire byte first.
    pub fn fixed(&mut self, command: FixedCommand, channel: u8, args: &[u8]) -> Result<(), W::Error> {
        match command {
            FixedCommand::AnalogMessage => {
                // Same path as EXTENDED_ANALOG so one handler sees every analog write
                let repacked = [EXTENDED_ANALOG, channel, args[1], args[0]];
                return self.sysex(&repacked);
            }
            FixedCommand::SetPinMode => {
                self.set_pin_mode(args[1], PinMode::from(args[0]));
                return Ok(());
            }
            _ => {}
        }
        let (mut ctx, callbacks) = self.split();
        match command {
            FixedCommand::AnalogMessage | FixedCommand::SetPinMode => {}
            FixedCommand::DigitalMessage => {
                if let Some(f) = callbacks.digital_message.as_mut() {
                    f(&mut ctx, channel, from_two_7bit_bytes(args[1], args[0]));
                }
            }
            FixedCommand::SetDigitalPinValue => {
                if let Some(f) = callbacks.set_digital_pin_value.as_mut() {
                    f(&mut ctx, args[1], args[0] as u16);
                }
            }
            FixedCommand::ReportAnalog => {
                if let Some(f) = callbacks.report_analog.as_mut() {
                    f(&mut ctx, channel, args[0] as u16);
                }
            }
            FixedCommand::ReportDigital => {
                if let Some(f) = callbacks.report_digital.as_mut() {
                    f(&mut ctx, channel, args[0] as u16);
                }
            }
        }
        Ok(())
    }

    pub fn sysex(&mut self, data: &[u8]) -> Result<(), W::Error> {
        let Some((&command, payload)) = data.split_first() else {
            log::trace!("empty sysex message");
            return Ok(());
        };
        log::debug!("sysex {command:#04x}, {} payload bytes", payload.len());
        match command {
            REPORT_FIRMWARE => Encoder::new(&mut *self.tx).report_firmware(self.firmware),
            STRING_DATA => {
                self.string(payload);
                Ok(())
            }
            _ => {
                let (mut ctx, callbacks) = self.split();
                match callbacks.sysex.as_mut() {
                    Some(f) => f(&mut ctx, command, payload),
                    None => log::trace!("no handler for sysex {command:#04x}"),
                }
                Ok(())
            }
        }
    }

    fn string(&mut self, payload: &[u8]) {
        let (mut ctx, callbacks) = self.split();
        let Some(f) = callbacks.string_data.as_mut() else {
            return;
        };
        if payload.len() < 2 {
            return;
        }
        let decoded = decode_string(payload);
        f(&mut ctx, decoded.as_str());
    }

    pub fn set_pin_mode(&mut self, pin: u8, mode: PinMode) {
        if !self.pins.set_mode(pin, mode) {
            log::trace!("pin {pin} keeps its mode");
            return;
        }
        let (mut ctx, callbacks) = self.split();
        if let Some(f) = callbacks.set_pin_mode.as_mut() {
            f(&mut ctx, pin, mode);
        }
    }

    /// Pin states go back to 0, then the reset handler gets its turn.
    pub fn system_reset(&mut self) {
        log::debug!("system reset");
        self.pins.reset_states();
        let (mut ctx, callbacks) = self.split();
        if let Some(f) = callbacks.system_reset.as_mut() {
            f(&mut ctx);
        }
    }

    pub fn delay_task(&mut self, delay_ms: u32) {
        let (mut ctx, callbacks) = self.split();
        if let Some(f) = callbacks.delay_task.as_mut() {
            f(&mut ctx, delay_ms);
        }
    }
}

/// Characters arrive as two 7-bit bytes each. Decoding ends at a NUL
/// character; an odd trailing byte is ignored.
pub fn decode_string(payload: &[u8]) -> String<STRING_CAPACITY> {
    let mut out = String::new();
    for pair in payload.chunks_exact(2) {
        let code = from_two_7bit_bytes(pair[0], pair[1]);
        if code == 0 {
            break;
        }
        let c = char::from_u32(code as u32).unwrap_or(char::REPLACEMENT_CHARACTER);
        if out.push(c).is_err() {
            log::warn!("string message truncated");
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_two_byte_characters() {
        assert_eq!(decode_string(&[0x48, 0x00, 0x69, 0x00]).as_str(), "Hi");
    }

    #[test]
    fn high_bits_come_from_the_second_byte() {
        // U+00E9 = 0x69 | 0x01 << 7
        assert_eq!(decode_string(&[0x69, 0x01]).as_str(), "\u{e9}");
    }

    #[test]
    fn stops_at_nul_and_drops_odd_byte() {
        assert_eq!(decode_string(&[0x41, 0, 0, 0, 0x42, 0]).as_str(), "A");
        assert_eq!(decode_string(&[0x41, 0, 0x42]).as_str(), "A");
    }

    #[test]
    fn largest_payload_fits() {
        let payload = [0x7F; MAX_DATA_BYTES - 1];
        let s = decode_string(&payload);
        assert_eq!(s.chars().count(), (MAX_DATA_BYTES - 1) / 2);
    }
}
