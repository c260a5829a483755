//! Device-side engine for the Firmata serial protocol.
//!
//! The engine pulls bytes one at a time from a non-blocking serial transport,
//! assembles fixed-length commands and sysex blocks, and hands completed
//! messages to registered callbacks. Replies are written through an
//! [`Encoder`] on the same transport.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

pub mod callbacks;
pub mod dispatch;
pub mod encoder;
pub mod error;
pub mod firmata;
pub mod packed;
pub mod parser;
pub mod pins;
pub mod protocol;
pub mod serial;

pub trait Encode {
    type Error;

    /// Writes the encoded form into `buffer`, returning the bytes used.
    fn encode(&self, buffer: &mut [u8]) -> Result<usize, Self::Error>;
}

pub trait Decode<'a>
where
    Self: Sized,
{
    type Error;

    fn decode(data: &'a [u8]) -> Result<Self, Self::Error>;
}

pub use callbacks::{Callback, CallbackRegistry, Category, Context};
pub use encoder::Encoder;
pub use error::FirmataError;
pub use firmata::{EngineCallback, Firmata, FirmwareInfo};
pub use packed::{PackError, PackedU14, PackedU32, PackedU64};
pub use parser::{Message, Parser};
pub use pins::{PinEntry, PinTable};
pub use protocol::{MAX_DATA_BYTES, PinMode};
pub use serial::{BufferedRx, BufferedTx, ErrorShim, TX_CAPACITY};
