//! Outgoing messages.
//!
//! An [`Encoder`] borrows the output transport for the length of one or more
//! messages. Every complete message ends with a flush.

use core::fmt;

use embedded_io::Write;

use crate::firmata::FirmwareInfo;
use crate::packed::{PackedU32, PackedU64, two_7bit_bytes};
use crate::protocol::{
    ANALOG_MESSAGE, DIGITAL_MESSAGE, END_SYSEX, EXTENDED_ANALOG, PROTOCOL_MAJOR_VERSION,
    PROTOCOL_MINOR_VERSION, REPORT_FIRMWARE, REPORT_VERSION, START_SYSEX, STRING_DATA,
};

pub struct Encoder<'a, W: Write> {
    tx: &'a mut W,
}

impl<'a, W: Write> Encoder<'a, W> {
    pub fn new(tx: &'a mut W) -> Encoder<'a, W> {
        Encoder { tx }
    }

    pub fn write_byte(&mut self, c: u8) -> Result<(), W::Error> {
        self.tx.write_all(&[c])
    }

    pub fn write_bytes(&mut self, buf: &[u8]) -> Result<(), W::Error> {
        self.tx.write_all(buf)
    }

    pub fn flush(&mut self) -> Result<(), W::Error> {
        self.tx.flush()
    }

    /// Split a 14-bit value into two 7-bit bytes and write both, LSB first.
    pub fn send_value_as_two_7bit_bytes(&mut self, value: u16) -> Result<(), W::Error> {
        self.write_bytes(&two_7bit_bytes(value))
    }

    pub fn start_sysex(&mut self) -> Result<(), W::Error> {
        self.write_byte(START_SYSEX)
    }

    pub fn end_sysex(&mut self) -> Result<(), W::Error> {
        self.write_byte(END_SYSEX)?;
        self.flush()
    }

    /// Reply to REPORT_VERSION with the protocol version.
    pub fn print_version(&mut self) -> Result<(), W::Error> {
        self.write_bytes(&[REPORT_VERSION, PROTOCOL_MAJOR_VERSION, PROTOCOL_MINOR_VERSION])?;
        self.flush()
    }

    /// Sends name and version of the firmware. Nothing is sent until a
    /// version has been set (major != 0).
    pub fn report_firmware(&mut self, firmware: &FirmwareInfo) -> Result<(), W::Error> {
        if firmware.major == 0 {
            return Ok(());
        }
        self.start_sysex()?;
        self.write_bytes(&[REPORT_FIRMWARE, firmware.major, firmware.minor])?;
        self.write_chars(firmware.name)?;
        self.end_sysex()
    }

    /// Analog value of a pin. Pins 0-15 fit the short form with the pin in
    /// the command nibble, higher pins go out as EXTENDED_ANALOG.
    pub fn send_analog(&mut self, pin: u8, value: u16) -> Result<(), W::Error> {
        if pin <= 15 {
            self.write_byte(ANALOG_MESSAGE | (pin & 0x0F))?;
            self.send_value_as_two_7bit_bytes(value)?;
            self.flush()
        } else {
            self.start_sysex()?;
            self.write_bytes(&[EXTENDED_ANALOG, pin])?;
            self.send_value_as_two_7bit_bytes(value)?;
            self.end_sysex()
        }
    }

    /// An 8 pin port in one digital message. Port 0 is pins 0-7, port 1
    /// pins 8-15 and so on.
    pub fn send_digital_port(&mut self, port: u8, data: u16) -> Result<(), W::Error> {
        self.write_bytes(&[
            DIGITAL_MESSAGE | (port & 0x0F),
            (data & 0x7F) as u8,
            (data >> 7) as u8,
        ])?;
        self.flush()
    }

    /// Sysex message with every data byte sent as two 7-bit bytes.
    pub fn send_sysex(&mut self, command: u8, data: &[u8]) -> Result<(), W::Error> {
        self.start_sysex()?;
        self.write_byte(command)?;
        for &b in data {
            self.send_value_as_two_7bit_bytes(b as u16)?;
        }
        self.end_sysex()
    }

    pub fn send_string(&mut self, s: &str) -> Result<(), W::Error> {
        self.start_sysex()?;
        self.write_byte(STRING_DATA)?;
        self.write_chars(s)?;
        self.end_sysex()
    }

    /// String followed by `data` rendered in hex, as one message. Used to
    /// report things like an unrecognized command number.
    pub fn send_string_with_data(&mut self, s: &str, data: u32) -> Result<(), W::Error> {
        self.send_fmt(format_args!("{s}{data:x}"))
    }

    /// Formats straight into a STRING_DATA message.
    pub fn send_fmt(&mut self, args: fmt::Arguments<'_>) -> Result<(), W::Error> {
        self.start_sysex()?;
        self.write_byte(STRING_DATA)?;
        let mut chars = CharWriter {
            encoder: &mut *self,
            error: None,
        };
        let formatted = fmt::write(&mut chars, args);
        if let Some(e) = chars.error {
            return Err(e);
        }
        if formatted.is_err() {
            log::warn!("formatting a string message failed");
        }
        self.end_sysex()
    }

    pub fn send_packed_u14(&mut self, value: u16) -> Result<(), W::Error> {
        self.send_value_as_two_7bit_bytes(value)
    }

    pub fn send_packed_u32(&mut self, value: u32) -> Result<(), W::Error> {
        self.write_bytes(&PackedU32(value).bytes())
    }

    pub fn send_packed_u64(&mut self, value: u64) -> Result<(), W::Error> {
        self.write_bytes(&PackedU64(value).bytes())
    }

    /// Characters go out as their code point, 14 bits each.
    fn write_chars(&mut self, s: &str) -> Result<(), W::Error> {
        for c in s.chars() {
            self.send_value_as_two_7bit_bytes(c as u32 as u16)?;
        }
        Ok(())
    }
}

struct CharWriter<'e, 'a, W: Write> {
    encoder: &'e mut Encoder<'a, W>,
    error: Option<W::Error>,
}

impl<W: Write> fmt::Write for CharWriter<'_, '_, W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.encoder.write_chars(s).map_err(|e| {
            self.error = Some(e);
            fmt::Error
        })
    }
}
