extern crate alloc;

use alloc::collections::VecDeque;
use embedded_hal_nb::serial::{Error, ErrorType, Read, Write};
use heapless::Deque;

/// Most bytes the transmit side holds while the hardware is busy.
pub const TX_CAPACITY: usize = 256;

/// Receive side of the transport. Bytes are pulled from `rx` whenever it
/// has them and queued until the parser consumes them.
#[derive(Debug)]
pub struct BufferedRx<Rx: Read> {
    pub rx: Rx,
    pub buf: VecDeque<u8>,
}

impl<Rx: Read> BufferedRx<Rx> {
    pub fn new(rx: Rx) -> BufferedRx<Rx> {
        BufferedRx {
            rx,
            buf: VecDeque::new(),
        }
    }

    /// Load as much as we can from rx into the internal buf. Stops on the
    /// first WouldBlock and returns the number of bytes pulled in.
    pub fn fill(&mut self) -> Result<usize, Rx::Error> {
        let mut count = 0;
        loop {
            match self.rx.read() {
                Ok(c) => {
                    self.buf.push_back(c);
                    count += 1;
                }
                Err(nb::Error::WouldBlock) => return Ok(count),
                Err(nb::Error::Other(e)) => return Err(e),
            }
        }
    }

    /// Number of bytes ready to parse, after pulling in anything pending.
    pub fn available(&mut self) -> Result<usize, Rx::Error> {
        self.fill()?;
        Ok(self.buf.len())
    }

    pub fn peek(&self) -> Option<u8> {
        self.buf.front().copied()
    }

    /// Drops `amount` bytes from the front of the buffer.
    pub fn consume(&mut self, amount: usize) {
        self.buf.drain(..amount.min(self.buf.len()));
    }

    /// All buffered bytes as one slice.
    pub fn slice(&mut self) -> &[u8] {
        self.buf.make_contiguous()
    }

    pub fn into_inner(self) -> Rx {
        self.rx
    }
}

impl<Rx: Read> ErrorType for BufferedRx<Rx> {
    type Error = Rx::Error;
}

impl<Rx: Read> Read for BufferedRx<Rx> {
    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        if let Some(c) = self.buf.pop_front() {
            return Ok(c);
        }
        self.rx.read()
    }
}

/// Transmit side of the transport. Writes are queued and drained to `tx`
/// on flush; whatever the hardware refuses stays queued for the next flush.
/// The queue holds at most [`TX_CAPACITY`] bytes.
#[derive(Debug)]
pub struct BufferedTx<Tx: Write> {
    tx: Tx,
    buf: Deque<u8, TX_CAPACITY>,
}

impl<Tx: Write> BufferedTx<Tx> {
    pub fn new(tx: Tx) -> BufferedTx<Tx> {
        BufferedTx {
            tx,
            buf: Deque::new(),
        }
    }

    /// Hands queued bytes to the hardware until it blocks.
    fn push_out(&mut self) -> nb::Result<(), Tx::Error> {
        while let Some(&x) = self.buf.front() {
            // Only dequeue once the hardware took the byte
            self.tx.write(x)?;
            self.buf.pop_front();
        }
        Ok(())
    }

    /// Make room if the queue is full. Busy hardware is not an error here.
    fn make_room(&mut self) -> Result<(), Tx::Error> {
        if !self.buf.is_full() {
            return Ok(());
        }
        match self.push_out() {
            Err(nb::Error::Other(e)) => Err(e),
            _ => Ok(()),
        }
    }

    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    pub fn inner(&self) -> &Tx {
        &self.tx
    }

    pub fn into_inner(self) -> Tx {
        self.tx
    }
}

impl<Tx: Write> ErrorType for BufferedTx<Tx> {
    type Error = Tx::Error;
}

#[derive(Debug)]
pub enum ErrorShim<T: Error> {
    Serial(T),
    /// The transmit queue is full and the hardware is not taking bytes.
    QueueFull,
}

impl<T: Error> embedded_io::Error for ErrorShim<T> {
    fn kind(&self) -> embedded_io::ErrorKind {
        use embedded_hal_nb::serial::ErrorKind::*;
        let ErrorShim::Serial(e) = self else {
            return embedded_io::ErrorKind::OutOfMemory;
        };
        match e.kind() {
            Overrun => embedded_io::ErrorKind::OutOfMemory,
            FrameFormat => embedded_io::ErrorKind::InvalidData,
            Noise => embedded_io::ErrorKind::Other,
            Parity => embedded_io::ErrorKind::InvalidData,
            _ => embedded_io::ErrorKind::Other,
        }
    }
}

impl<T: Error> From<T> for ErrorShim<T> {
    fn from(value: T) -> Self {
        ErrorShim::Serial(value)
    }
}

impl<Tx: Write> embedded_io::ErrorType for BufferedTx<Tx> {
    type Error = ErrorShim<Tx::Error>;
}

impl<Tx: Write> Write for BufferedTx<Tx> {
    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        self.make_room()?;
        self.buf.push_back(word).map_err(|_| nb::Error::WouldBlock)
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        self.push_out()?;
        self.tx.flush()
    }
}

impl<Tx: Write> embedded_io::Write for BufferedTx<Tx> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.make_room()?;
        let mut queued = 0;
        for &b in buf {
            if self.buf.push_back(b).is_err() {
                break;
            }
            queued += 1;
        }
        if queued == 0 {
            log::warn!("tx queue full, hardware not draining");
            return Err(ErrorShim::QueueFull);
        }
        Ok(queued)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        match Write::flush(self) {
            Ok(()) => Ok(()),
            Err(nb::Error::Other(e)) => Err(ErrorShim::Serial(e)),
            Err(nb::Error::WouldBlock) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::Encoder;
    use core::convert::Infallible;
    use std::vec::Vec;

    /// Accepts `budget` bytes then blocks.
    struct Throttled {
        out: Vec<u8>,
        budget: usize,
    }

    impl ErrorType for Throttled {
        type Error = Infallible;
    }

    impl Write for Throttled {
        fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
            if self.budget == 0 {
                return Err(nb::Error::WouldBlock);
            }
            self.budget -= 1;
            self.out.push(word);
            Ok(())
        }

        fn flush(&mut self) -> nb::Result<(), Self::Error> {
            Ok(())
        }
    }

    struct Script(VecDeque<u8>);

    impl ErrorType for Script {
        type Error = Infallible;
    }

    impl Read for Script {
        fn read(&mut self) -> nb::Result<u8, Self::Error> {
            self.0.pop_front().ok_or(nb::Error::WouldBlock)
        }
    }

    #[test]
    fn blocked_bytes_stay_queued() {
        let mut tx = BufferedTx::new(Throttled {
            out: Vec::new(),
            budget: 2,
        });
        embedded_io::Write::write_all(&mut tx, &[1, 2, 3, 4]).unwrap();
        embedded_io::Write::flush(&mut tx).unwrap();
        assert_eq!(tx.inner().out, [1, 2]);
        assert_eq!(tx.pending(), 2);

        tx.tx.budget = 10;
        embedded_io::Write::flush(&mut tx).unwrap();
        assert_eq!(tx.inner().out, [1, 2, 3, 4]);
        assert_eq!(tx.pending(), 0);
    }

    #[test]
    fn available_pulls_everything_pending() {
        let mut rx = BufferedRx::new(Script(VecDeque::from([0xF0, 0x01, 0xF7])));
        assert_eq!(rx.available().unwrap(), 3);
        assert_eq!(rx.peek(), Some(0xF0));
        assert_eq!(rx.read(), Ok(0xF0));
        assert_eq!(rx.slice(), &[0x01, 0xF7]);
        rx.consume(2);
        assert_eq!(rx.read(), Err(nb::Error::WouldBlock));
    }

    #[test]
    fn stalled_hardware_caps_the_queue() {
        let mut tx = BufferedTx::new(Throttled {
            out: Vec::new(),
            budget: 0,
        });
        let mut refused = 0;
        for _ in 0..1000 {
            if Encoder::new(&mut tx).print_version().is_err() {
                refused += 1;
            }
        }
        assert_eq!(tx.pending(), TX_CAPACITY);
        assert!(refused > 0);
        assert!(matches!(
            embedded_io::Write::write(&mut tx, &[0xF9]),
            Err(ErrorShim::QueueFull)
        ));
        assert_eq!(Write::write(&mut tx, 0xF9), Err(nb::Error::WouldBlock));
    }

    #[test]
    fn full_queue_drains_into_hardware_before_refusing() {
        let mut tx = BufferedTx::new(Throttled {
            out: Vec::new(),
            budget: 0,
        });
        let block = [0x55; TX_CAPACITY];
        embedded_io::Write::write_all(&mut tx, &block).unwrap();
        assert_eq!(tx.pending(), TX_CAPACITY);

        tx.tx.budget = 4;
        embedded_io::Write::write_all(&mut tx, &[1, 2, 3]).unwrap();
        assert_eq!(tx.inner().out.len(), 4);
        assert_eq!(tx.pending(), TX_CAPACITY - 1);

        tx.tx.budget = usize::MAX;
        embedded_io::Write::flush(&mut tx).unwrap();
        assert_eq!(tx.pending(), 0);
        assert_eq!(tx.inner().out.len(), TX_CAPACITY + 3);
        assert_eq!(tx.inner().out[TX_CAPACITY..], [1, 2, 3]);
    }
}
