//! Incremental parser for the incoming byte stream.
//!
//! Three framings share one arena:
//! - single byte commands (REPORT_VERSION, SYSTEM_RESET)
//! - fixed length commands followed by one or two 7-bit data bytes
//! - sysex blocks between START_SYSEX and END_SYSEX
//!
//! Only one framing is ever in flight, so the arena is never aliased.
//! SYSTEM_RESET is honoured in every phase.

use crate::protocol::{
    ANALOG_MESSAGE, DIGITAL_MESSAGE, END_SYSEX, MAX_DATA_BYTES, REPORT_ANALOG, REPORT_DIGITAL,
    REPORT_VERSION, SET_DIGITAL_PIN_VALUE, SET_PIN_MODE, START_SYSEX, SYSTEM_RESET, split_command,
};

/// Commands that take a fixed number of data bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedCommand {
    AnalogMessage,
    DigitalMessage,
    SetPinMode,
    SetDigitalPinValue,
    ReportAnalog,
    ReportDigital,
}

impl FixedCommand {
    fn from_command(command: u8) -> Option<FixedCommand> {
        match command {
            ANALOG_MESSAGE => Some(FixedCommand::AnalogMessage),
            DIGITAL_MESSAGE => Some(FixedCommand::DigitalMessage),
            SET_PIN_MODE => Some(FixedCommand::SetPinMode),
            SET_DIGITAL_PIN_VALUE => Some(FixedCommand::SetDigitalPinValue),
            REPORT_ANALOG => Some(FixedCommand::ReportAnalog),
            REPORT_DIGITAL => Some(FixedCommand::ReportDigital),
            _ => None,
        }
    }

    pub fn arg_count(self) -> u8 {
        match self {
            FixedCommand::ReportAnalog | FixedCommand::ReportDigital => 1,
            _ => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingFixedBytes {
        remaining: u8,
        command: FixedCommand,
    },
    CollectingSysex,
}

/// A completed message, borrowing the parser's arena.
#[derive(Debug, PartialEq, Eq)]
pub enum Message<'a> {
    SystemReset,
    ReportVersion,
    /// A sysex block outgrew the arena and was thrown away
    Overflow,
    /// `args` holds the data bytes last-received first: `args[0]` is the
    /// final byte on the wire.
    Fixed {
        command: FixedCommand,
        channel: u8,
        args: &'a [u8],
    },
    /// Sysex contents: sub-command followed by its payload
    Sysex(&'a [u8]),
}

#[derive(Debug, Clone)]
pub struct Parser {
    phase: Phase,
    channel: u8,
    arena: [u8; MAX_DATA_BYTES],
    len: usize,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub const CAPACITY: usize = MAX_DATA_BYTES;

    pub fn new() -> Self {
        Parser {
            phase: Phase::Idle,
            channel: 0,
            arena: [0; MAX_DATA_BYTES],
            len: 0,
        }
    }

    /// Back to idle with counters, channel and arena cleared.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.channel = 0;
        self.arena = [0; MAX_DATA_BYTES];
        self.len = 0;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_parsing_message(&self) -> bool {
        self.phase != Phase::Idle
    }

    pub fn bytes_in_buffer(&self) -> usize {
        self.len
    }

    /// Feed a single byte to the parser.
    ///
    /// Returns `Some` when the byte completes something the engine has to
    /// act on.
    pub fn feed(&mut self, byte: u8) -> Option<Message<'_>> {
        if byte == SYSTEM_RESET {
            self.reset();
            return Some(Message::SystemReset);
        }
        match self.phase {
            Phase::CollectingSysex => {
                if byte == END_SYSEX {
                    self.phase = Phase::Idle;
                    return Some(Message::Sysex(&self.arena[..self.len]));
                }
                if self.len == Self::CAPACITY {
                    self.phase = Phase::Idle;
                    self.len = 0;
                    return Some(Message::Overflow);
                }
                self.arena[self.len] = byte;
                self.len += 1;
                None
            }
            Phase::AwaitingFixedBytes { remaining, command } if byte < 0x80 => {
                // Stored back to front
                let remaining = remaining - 1;
                self.arena[remaining as usize] = byte;
                if remaining > 0 {
                    self.phase = Phase::AwaitingFixedBytes { remaining, command };
                    return None;
                }
                self.phase = Phase::Idle;
                Some(Message::Fixed {
                    command,
                    channel: self.channel,
                    args: &self.arena[..command.arg_count() as usize],
                })
            }
            _ => self.command(byte),
        }
    }

    fn command(&mut self, byte: u8) -> Option<Message<'_>> {
        let (command, channel) = split_command(byte);
        if let Some(channel) = channel {
            self.channel = channel;
        }
        if let Some(fixed) = FixedCommand::from_command(command) {
            self.phase = Phase::AwaitingFixedBytes {
                remaining: fixed.arg_count(),
                command: fixed,
            };
            return None;
        }
        match command {
            START_SYSEX => {
                self.len = 0;
                self.phase = Phase::CollectingSysex;
                None
            }
            REPORT_VERSION => Some(Message::ReportVersion),
            _ => {
                log::trace!("ignoring byte {byte:#04x}");
                None
            }
        }
    }

    /// Copy a run of sysex data bytes into the arena in one go. Stops at
    /// the first byte with its top bit set and at arena capacity; returns
    /// how many bytes were taken. Takes nothing outside a sysex block.
    pub fn extend_sysex(&mut self, data: &[u8]) -> usize {
        if self.phase != Phase::CollectingSysex {
            return 0;
        }
        let room = Self::CAPACITY - self.len;
        let n = data
            .iter()
            .take(room)
            .take_while(|&&b| b & 0x80 == 0)
            .count();
        self.arena[self.len..self.len + n].copy_from_slice(&data[..n]);
        self.len += n;
        n
    }
}
