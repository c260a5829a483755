//! Wire vocabulary of the Firmata protocol.
//!
//! Command bytes live in 0x80..=0xFF, sysex sub-commands in 0x00..=0x7F.
//! Commands below 0xF0 carry a channel in their low nibble.

use bilge::prelude::*;

/// Protocol version reported in reply to [`REPORT_VERSION`]
pub const PROTOCOL_MAJOR_VERSION: u8 = 2;
pub const PROTOCOL_MINOR_VERSION: u8 = 7;
pub const PROTOCOL_BUGFIX_VERSION: u8 = 0;

/// Version of this firmware library, distinct from the protocol version
pub const FIRMWARE_MAJOR_VERSION: u8 = 3;
pub const FIRMWARE_MINOR_VERSION: u8 = 1;
pub const FIRMWARE_BUGFIX_VERSION: u8 = 0;

/// Size of the incoming message arena. Must stay below 256, message
/// lengths are handed around as single bytes by host clients.
#[cfg(not(feature = "large-buffer"))]
pub const MAX_DATA_BYTES: usize = 64;
#[cfg(feature = "large-buffer")]
pub const MAX_DATA_BYTES: usize = 252;

// message command bytes (0x80-0xFF)
pub const DIGITAL_MESSAGE: u8 = 0x90;
pub const ANALOG_MESSAGE: u8 = 0xE0;
pub const REPORT_ANALOG: u8 = 0xC0;
pub const REPORT_DIGITAL: u8 = 0xD0;
pub const SET_PIN_MODE: u8 = 0xF4;
pub const SET_DIGITAL_PIN_VALUE: u8 = 0xF5;
pub const REPORT_VERSION: u8 = 0xF9;
pub const SYSTEM_RESET: u8 = 0xFF;
pub const START_SYSEX: u8 = 0xF0;
pub const END_SYSEX: u8 = 0xF7;

// extended command set using sysex (0x00-0x7F), 0x00-0x0F are user defined
pub const SERIAL_MESSAGE: u8 = 0x60;
pub const ENCODER_DATA: u8 = 0x61;
pub const ACCELSTEPPER_DATA: u8 = 0x62;
pub const REPORT_DIGITAL_PIN: u8 = 0x63;
pub const EXTENDED_REPORT_ANALOG: u8 = 0x64;
pub const REPORT_FEATURES: u8 = 0x65;
pub const SPI_DATA: u8 = 0x68;
pub const ANALOG_MAPPING_QUERY: u8 = 0x69;
pub const ANALOG_MAPPING_RESPONSE: u8 = 0x6A;
pub const CAPABILITY_QUERY: u8 = 0x6B;
pub const CAPABILITY_RESPONSE: u8 = 0x6C;
pub const PIN_STATE_QUERY: u8 = 0x6D;
pub const PIN_STATE_RESPONSE: u8 = 0x6E;
pub const EXTENDED_ANALOG: u8 = 0x6F;
pub const SERVO_CONFIG: u8 = 0x70;
pub const STRING_DATA: u8 = 0x71;
pub const STEPPER_DATA: u8 = 0x72;
pub const ONEWIRE_DATA: u8 = 0x73;
pub const DHTSENSOR_DATA: u8 = 0x74;
pub const SHIFT_DATA: u8 = 0x75;
pub const I2C_REQUEST: u8 = 0x76;
pub const I2C_REPLY: u8 = 0x77;
pub const I2C_CONFIG: u8 = 0x78;
pub const REPORT_FIRMWARE: u8 = 0x79;
pub const SAMPLING_INTERVAL: u8 = 0x7A;
pub const SCHEDULER_DATA: u8 = 0x7B;
pub const ANALOG_CONFIG: u8 = 0x7C;
pub const FREQUENCY_COMMAND: u8 = 0x7D;
pub const SYSEX_NON_REALTIME: u8 = 0x7E;
pub const SYSEX_REALTIME: u8 = 0x7F;

/// Mode count as announced on the wire. Not a bound on [`PinMode`] values.
pub const TOTAL_PIN_MODES: u8 = 16;

/// A command byte below 0xF0: high nibble selects the command, low nibble
/// the channel (analog pin or digital port).
#[bitsize(8)]
#[derive(DebugBits, Clone, Copy, FromBits)]
pub struct CommandByte {
    pub channel: u4,
    pub command: u4,
}

impl CommandByte {
    /// Command value with the channel nibble masked off
    pub fn command_value(&self) -> u8 {
        self.command().value() << 4
    }

    pub fn channel_value(&self) -> u8 {
        self.channel().value()
    }
}

/// Splits a raw command byte into `(command, channel)`. Bytes in the 0xF0
/// range are whole commands and carry no channel.
pub fn split_command(byte: u8) -> (u8, Option<u8>) {
    if byte < START_SYSEX {
        let c = CommandByte::from(byte);
        (c.command_value(), Some(c.channel_value()))
    } else {
        (byte, None)
    }
}

/// Configured function of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PinMode {
    #[default]
    Input,
    Output,
    Analog,
    Pwm,
    Servo,
    Shift,
    I2c,
    OneWire,
    Stepper,
    Encoder,
    Serial,
    Pullup,
    Spi,
    Sonar,
    Tone,
    Dht,
    Frequency,
    /// Pin is excluded from Firmata; once set it can't be changed
    Ignore,
    /// Mode byte outside the known table, kept as received
    Unknown(u8),
}

impl From<u8> for PinMode {
    fn from(value: u8) -> Self {
        match value {
            0x00 => PinMode::Input,
            0x01 => PinMode::Output,
            0x02 => PinMode::Analog,
            0x03 => PinMode::Pwm,
            0x04 => PinMode::Servo,
            0x05 => PinMode::Shift,
            0x06 => PinMode::I2c,
            0x07 => PinMode::OneWire,
            0x08 => PinMode::Stepper,
            0x09 => PinMode::Encoder,
            0x0A => PinMode::Serial,
            0x0B => PinMode::Pullup,
            0x0C => PinMode::Spi,
            0x0D => PinMode::Sonar,
            0x0E => PinMode::Tone,
            0x0F => PinMode::Dht,
            0x10 => PinMode::Frequency,
            0x7F => PinMode::Ignore,
            x => PinMode::Unknown(x),
        }
    }
}

impl From<PinMode> for u8 {
    fn from(value: PinMode) -> Self {
        match value {
            PinMode::Input => 0x00,
            PinMode::Output => 0x01,
            PinMode::Analog => 0x02,
            PinMode::Pwm => 0x03,
            PinMode::Servo => 0x04,
            PinMode::Shift => 0x05,
            PinMode::I2c => 0x06,
            PinMode::OneWire => 0x07,
            PinMode::Stepper => 0x08,
            PinMode::Encoder => 0x09,
            PinMode::Serial => 0x0A,
            PinMode::Pullup => 0x0B,
            PinMode::Spi => 0x0C,
            PinMode::Sonar => 0x0D,
            PinMode::Tone => 0x0E,
            PinMode::Dht => 0x0F,
            PinMode::Frequency => 0x10,
            PinMode::Ignore => 0x7F,
            PinMode::Unknown(x) => x,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_commands_split_on_nibbles() {
        assert_eq!(split_command(0xE3), (ANALOG_MESSAGE, Some(3)));
        assert_eq!(split_command(0x9F), (DIGITAL_MESSAGE, Some(15)));
        assert_eq!(split_command(0xC0), (REPORT_ANALOG, Some(0)));
    }

    #[test]
    fn high_range_commands_have_no_channel() {
        assert_eq!(split_command(SET_PIN_MODE), (SET_PIN_MODE, None));
        assert_eq!(split_command(START_SYSEX), (START_SYSEX, None));
        assert_eq!(split_command(SYSTEM_RESET), (SYSTEM_RESET, None));
    }

    #[test]
    fn pin_modes_keep_wire_values() {
        for raw in 0..=u8::MAX {
            assert_eq!(u8::from(PinMode::from(raw)), raw);
        }
        assert_eq!(PinMode::from(0x7F), PinMode::Ignore);
        assert_eq!(PinMode::from(0x42), PinMode::Unknown(0x42));
    }
}
