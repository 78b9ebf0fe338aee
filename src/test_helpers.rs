use core::convert::Infallible;
use std::collections::VecDeque;
use std::sync::Once;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_io::{ErrorType, Read, ReadReady, Write};

use crate::baud::SetBaudRate;

static INIT: Once = Once::new();

pub fn init_logger() {
    INIT.call_once(|| {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("trace"))
            .is_test(true)
            .try_init();
    });
}

/// Scripted serial port.
///
/// Bytes queued with [`MockTransport::preload`] are readable immediately.
/// Exchanges queued with [`MockTransport::expect`] are answered in order: once
/// a flush completes a command line equal to the expected one, its reply
/// becomes readable.
#[derive(Debug, Default)]
pub struct MockTransport {
    rx: VecDeque<u8>,
    pending: Vec<u8>,
    exchanges: VecDeque<(Vec<u8>, Vec<u8>)>,
    pub written: Vec<u8>,
    pub flushes: usize,
    pub baud: u32,
    live_baud: Option<u32>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn preload(mut self, bytes: &[u8]) -> Self {
        self.rx.extend(bytes.iter().copied());
        self
    }

    pub fn expect(mut self, command: &[u8], reply: &[u8]) -> Self {
        self.exchanges.push_back((command.to_vec(), reply.to_vec()));
        self
    }

    /// Only answer while the port runs at `baud`.
    pub fn live_at(mut self, baud: u32) -> Self {
        self.live_baud = Some(baud);
        self
    }

    pub fn remaining(&self) -> Vec<u8> {
        self.rx.iter().copied().collect()
    }

    pub fn unanswered(&self) -> usize {
        self.exchanges.len()
    }
}

impl ErrorType for MockTransport {
    type Error = Infallible;
}

impl Read for MockTransport {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut n = 0;
        while n < buf.len() {
            match self.rx.pop_front() {
                Some(b) => {
                    buf[n] = b;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

impl ReadReady for MockTransport {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.rx.is_empty())
    }
}

impl Write for MockTransport {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.written.extend_from_slice(buf);
        self.pending.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.flushes += 1;
        let line = core::mem::take(&mut self.pending);

        if self.live_baud.is_some_and(|b| b != self.baud) {
            return Ok(());
        }

        if matches!(self.exchanges.front(), Some((cmd, _)) if *cmd == line) {
            if let Some((_, reply)) = self.exchanges.pop_front() {
                self.rx.extend(reply);
            }
        }
        Ok(())
    }
}

impl SetBaudRate for MockTransport {
    type Error = Infallible;

    fn set_baud_rate(&mut self, baud: u32) -> Result<(), Self::Error> {
        self.baud = baud;
        Ok(())
    }
}

/// Delay provider that sleeps on the host, counting cooperative yields.
#[derive(Debug, Default)]
pub struct MockDelay {
    pub yields: usize,
    pub slept_ns: u64,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        if ns == 0 {
            self.yields += 1;
            std::thread::yield_now();
        } else {
            self.slept_ns += u64::from(ns);
            std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
        }
    }
}

mod tests {
    use super::*;

    #[test]
    fn mock_transport_answers_in_order() {
        let mut t = MockTransport::new()
            .expect(b"AT\r\n", b"OK\r\n")
            .expect(b"ATE0\r\n", b"ERROR\r\n");

        t.write_all(b"ATE0\r\n").unwrap();
        t.flush().unwrap();
        assert!(!t.read_ready().unwrap());

        t.write_all(b"AT\r\n").unwrap();
        t.flush().unwrap();
        assert_eq!(t.remaining(), b"OK\r\n");
        assert_eq!(t.unanswered(), 1);
    }

    #[test]
    fn mock_transport_silent_at_wrong_baud() {
        let mut t = MockTransport::new().expect(b"AT\r\n", b"OK\r\n").live_at(9600);
        t.set_baud_rate(115_200).unwrap();
        t.write_all(b"AT\r\n").unwrap();
        t.flush().unwrap();
        assert!(!t.read_ready().unwrap());
    }
}
