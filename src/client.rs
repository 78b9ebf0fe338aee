use core::fmt::{Display, Write as _};

use embassy_time::{Duration, Instant};
use embedded_hal::delay::DelayNs;
use embedded_io::{Read, ReadReady, Write};
use heapless::{String, Vec};

use crate::config::{Config, MAX_COMMAND_LEN};
use crate::error::Error;
use crate::fmt::LossyStr;
use crate::matcher::{Match, PatternMatcher, Patterns};
use crate::modules::{LineTerminator, ModuleParams};

/// Byte stream a modem is attached to.
///
/// `read_ready` reports whether a byte can be read without blocking; the
/// client only calls `read` after it returned `true`.
pub trait Transport: Read + ReadReady + Write {}

impl<T: Read + ReadReady + Write> Transport for T {}

/// Client responsible for sending AT commands and classifying the replies.
///
/// The client owns the transport exclusively. All waits are bounded by a
/// wall-clock timeout and hand control to the `delay` provider with a zero
/// length delay whenever no byte is available.
pub struct AtClient<T, D> {
    transport: T,
    delay: D,
    line_term: LineTerminator,
    config: Config,
    last_command: Option<Instant>,
}

impl<T, D> AtClient<T, D>
where
    T: Transport,
    D: DelayNs,
{
    pub fn new(transport: T, delay: D, config: Config) -> Self {
        Self {
            transport,
            delay,
            line_term: config.module.line_terminator(),
            config,
            last_command: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn line_terminator(&self) -> LineTerminator {
        self.line_term
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn release(self) -> (T, D) {
        (self.transport, self.delay)
    }

    /// Write every fragment, formatted with `Display`, without any prefix or
    /// terminator.
    pub fn stream_write(&mut self, fragments: &[&dyn Display]) -> Result<(), Error> {
        for fragment in fragments {
            write!(self.transport, "{}", fragment).map_err(|_| Error::Write)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), Error> {
        self.transport.flush().map_err(|_| Error::Write)
    }

    /// Send `AT`, the fragments, and the line terminator as one flushed write.
    ///
    /// Sending `&[]` produces a bare `AT`.
    pub fn send_at(&mut self, fragments: &[&dyn Display]) -> Result<(), Error> {
        let mut cmd: String<MAX_COMMAND_LEN> = String::new();
        cmd.push_str("AT").map_err(|_| Error::Overflow)?;
        for fragment in fragments {
            write!(cmd, "{}", fragment).map_err(|_| Error::Overflow)?;
        }
        cmd.push_str(self.line_term.as_str())
            .map_err(|_| Error::Overflow)?;

        self.space_commands();
        debug!("Sending command: {:?}", LossyStr(cmd.as_bytes()));

        self.transport
            .write_all(cmd.as_bytes())
            .map_err(|_| Error::Write)?;
        self.transport.flush().map_err(|_| Error::Write)?;
        self.last_command = Some(Instant::now());
        self.yield_now();
        Ok(())
    }

    /// Hold off until the family's minimum spacing since the previous command
    /// has passed.
    fn space_commands(&mut self) {
        let Some(last) = self.last_command else {
            return;
        };
        let spacing = self.config.module.command_delay_default();
        let elapsed = last.elapsed();
        if elapsed < spacing {
            let us = u32::try_from((spacing - elapsed).as_micros()).unwrap_or(u32::MAX);
            if us > 0 {
                self.delay.delay_us(us);
            }
        }
    }

    /// Wait for the session's `OK` (slot 1) or `ERROR` (slot 2) result code.
    pub fn wait_response(&mut self, timeout: Duration) -> Result<Match, Error> {
        let patterns = Patterns::pair(self.line_term.ok(), self.line_term.error());
        self.wait_for(timeout, &patterns)
    }

    /// Wait for the first of `patterns` to appear in the stream.
    pub fn wait_for(&mut self, timeout: Duration, patterns: &Patterns<'_>) -> Result<Match, Error> {
        self.wait_inner::<0>(timeout, patterns, None)
    }

    /// Like [`wait_for`], additionally collecting everything received before
    /// the matched terminator into `data`.
    ///
    /// `data` is cleared first. When it fills up, later bytes are dropped but
    /// matching continues.
    ///
    /// [`wait_for`]: Self::wait_for
    pub fn wait_response_with_data<const N: usize>(
        &mut self,
        timeout: Duration,
        patterns: &Patterns<'_>,
        data: &mut Vec<u8, N>,
    ) -> Result<Match, Error> {
        data.clear();
        self.wait_inner(timeout, patterns, Some(data))
    }

    fn wait_inner<const N: usize>(
        &mut self,
        timeout: Duration,
        patterns: &Patterns<'_>,
        mut data: Option<&mut Vec<u8, N>>,
    ) -> Result<Match, Error> {
        let start = Instant::now();
        let mut matcher = PatternMatcher::new(patterns);
        // Newest bytes that did not fit in `data`
        let mut dropped = 0usize;

        while start.elapsed() < timeout {
            let Some(byte) = self.poll_byte()? else {
                self.yield_now();
                continue;
            };

            if let Some(buf) = data.as_deref_mut() {
                if buf.push(byte).is_err() {
                    if dropped == 0 {
                        warn!("Response buffer full ({} bytes), dropping input", N);
                    }
                    dropped += 1;
                }
            }

            if let Some(done) = matcher.feed(byte) {
                if let Some(buf) = data.as_deref_mut() {
                    let stored = done.len.saturating_sub(dropped);
                    buf.truncate(buf.len().saturating_sub(stored));
                    trace!("Matched slot {}: {:?}", done.slot, LossyStr(buf));
                } else {
                    trace!("Matched slot {}", done.slot);
                }
                return Ok(Match::Pattern(done.slot));
            }
        }

        trace!("No response within {} ms", timeout.as_millis());
        Ok(Match::Timeout)
    }

    /// Discard input up to and including `target`, bounded by the configured
    /// skip timeout.
    pub fn skip_until(&mut self, target: u8) -> Result<bool, Error> {
        self.skip_until_timeout(target, self.config.skip_timeout)
    }

    pub fn skip_until_timeout(&mut self, target: u8, timeout: Duration) -> Result<bool, Error> {
        let start = Instant::now();

        while start.elapsed() < timeout {
            match self.poll_byte()? {
                Some(b) if b == target => return Ok(true),
                Some(_) => {}
                None => self.yield_now(),
            }
        }

        trace!("{:?} not seen within {} ms", target as char, timeout.as_millis());
        Ok(false)
    }

    /// Block for `duration` on the delay provider.
    pub fn pause(&mut self, duration: Duration) {
        let ms = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
        self.delay.delay_ms(ms);
    }

    fn yield_now(&mut self) {
        self.delay.delay_ns(0);
    }

    fn poll_byte(&mut self) -> Result<Option<u8>, Error> {
        if !self.transport.read_ready().map_err(|_| Error::Read)? {
            return Ok(None);
        }

        let mut byte = [0u8; 1];
        match self.transport.read(&mut byte).map_err(|_| Error::Read)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }
}
