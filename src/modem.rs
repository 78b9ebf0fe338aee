//! Device level operations built on the AT client.
//!
//! [`Modem`] lists everything an application can ask of a modem. Families
//! implement the subset they support; everything else reports
//! [`GenericError::Unsupported`](crate::error::GenericError::Unsupported).
//! [`GenericModem`] covers the portable 3GPP TS 27.007 commands.

use core::fmt::Display;
use core::str::FromStr;

use embassy_time::{Duration, Instant};
use embedded_hal::delay::DelayNs;
use heapless::{String, Vec};
use no_std_net::Ipv4Addr;

use crate::client::{AtClient, Transport};
use crate::error::{Error, GenericError};
use crate::ip::ip_from_str;
use crate::matcher::{Match, Patterns};
use crate::modules::{Capabilities, ModuleParams};
use crate::text::{decode_text, TextEncoding};

/// Capacity of identifiers read back from the modem, such as the IMEI, the
/// ICCID, the operator name and the local address.
pub const IDENT_LEN: usize = 32;

/// Capacity of a decoded USSD reply.
pub const USSD_LEN: usize = 256;

const USSD_HEX_LEN: usize = 320;

const INIT_TIMEOUT: Duration = Duration::from_secs(10);
const TEST_AT_WAIT: Duration = Duration::from_millis(200);
const TEST_AT_PAUSE: Duration = Duration::from_millis(100);
const SIM_RETRY_INTERVAL: Duration = Duration::from_millis(1000);
const RADIO_TIMEOUT: Duration = Duration::from_secs(10);
const GPRS_TIMEOUT: Duration = Duration::from_secs(60);
const USSD_TIMEOUT: Duration = Duration::from_secs(10);
const SMS_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SimStatus {
    #[default]
    Error,
    Ready,
    /// Waiting for a PIN or PUK
    Locked,
    NotInserted,
}

/// Circuit switched registration state, as reported by `+CREG`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistrationStatus {
    Unregistered,
    Home,
    Searching,
    Denied,
    #[default]
    Unknown,
    Roaming,
}

impl From<u8> for RegistrationStatus {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::Unregistered,
            1 => Self::Home,
            2 => Self::Searching,
            3 => Self::Denied,
            5 => Self::Roaming,
            _ => Self::Unknown,
        }
    }
}

impl RegistrationStatus {
    pub const fn is_registered(self) -> bool {
        matches!(self, Self::Home | Self::Roaming)
    }
}

/// Operations a modem family may support.
///
/// Only [`init`](Modem::init), [`test_at`](Modem::test_at),
/// [`is_network_connected`](Modem::is_network_connected) and
/// [`idle`](Modem::idle) are mandatory.
pub trait Modem {
    /// Bring the modem into a known state.
    fn begin(&mut self) -> Result<(), Error> {
        self.init()
    }

    fn init(&mut self) -> Result<(), Error>;

    /// Poll with bare `AT` until the modem answers or `timeout` expires.
    fn test_at(&mut self, timeout: Duration) -> Result<bool, Error>;

    /// Handle pending unsolicited output.
    fn maintain(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn set_baud(&mut self, _baud: u32) -> Result<(), Error> {
        Err(Error::unsupported())
    }

    fn factory_default(&mut self) -> Result<(), Error> {
        Err(Error::unsupported())
    }

    fn has_ssl(&self) -> bool {
        false
    }

    fn restart(&mut self) -> Result<(), Error> {
        Err(Error::unsupported())
    }

    fn power_off(&mut self) -> Result<(), Error> {
        Err(Error::unsupported())
    }

    fn radio_off(&mut self) -> Result<(), Error> {
        Err(Error::unsupported())
    }

    fn sleep_enable(&mut self, _enable: bool) -> Result<(), Error> {
        Err(Error::unsupported())
    }

    fn sim_unlock(&mut self, _pin: &str) -> Result<(), Error> {
        Err(Error::unsupported())
    }

    fn sim_ccid(&mut self) -> Result<String<IDENT_LEN>, Error> {
        Err(Error::unsupported())
    }

    fn imei(&mut self) -> Result<String<IDENT_LEN>, Error> {
        Err(Error::unsupported())
    }

    fn sim_status(&mut self, _timeout: Duration) -> Result<SimStatus, Error> {
        Err(Error::unsupported())
    }

    fn operator(&mut self) -> Result<String<IDENT_LEN>, Error> {
        Err(Error::unsupported())
    }

    fn registration_status(&mut self) -> Result<RegistrationStatus, Error> {
        Err(Error::unsupported())
    }

    /// Raw `+CSQ` RSSI value, 99 when unknown.
    fn signal_quality(&mut self) -> Result<u8, Error> {
        Err(Error::unsupported())
    }

    fn is_network_connected(&mut self) -> Result<bool, Error>;

    /// Interval between polls in [`wait_for_network`](Modem::wait_for_network).
    fn network_poll_interval(&self) -> Duration {
        Duration::from_millis(250)
    }

    /// Block for `duration`, handing control to the host while waiting.
    fn idle(&mut self, duration: Duration);

    /// Poll [`is_network_connected`](Modem::is_network_connected) until it
    /// reports `true` or `timeout` expires. Polls that time out count as not
    /// connected.
    fn wait_for_network(&mut self, timeout: Duration) -> Result<bool, Error> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            match self.is_network_connected() {
                Ok(true) => return Ok(true),
                Ok(false) | Err(Error::Generic(GenericError::Timeout)) => {}
                Err(e) => return Err(e),
            }
            let interval = self.network_poll_interval();
            self.idle(interval);
        }
        Ok(false)
    }

    fn local_ip_str(&mut self) -> Result<String<IDENT_LEN>, Error> {
        Err(Error::unsupported())
    }

    fn local_ip(&mut self) -> Result<Ipv4Addr, Error> {
        Ok(ip_from_str(&self.local_ip_str()?))
    }

    fn network_connect(&mut self, _ssid: &str, _password: &str) -> Result<(), Error> {
        Err(Error::unsupported())
    }

    fn network_disconnect(&mut self) -> Result<(), Error> {
        Err(Error::unsupported())
    }

    fn gprs_connect(&mut self, _apn: &str, _user: &str, _password: &str) -> Result<(), Error> {
        Err(Error::unsupported())
    }

    fn gprs_disconnect(&mut self) -> Result<(), Error> {
        Err(Error::unsupported())
    }

    fn send_ussd(&mut self, _code: &str) -> Result<String<USSD_LEN>, Error> {
        Err(Error::unsupported())
    }

    fn send_sms(&mut self, _number: &str, _text: &str) -> Result<(), Error> {
        Err(Error::unsupported())
    }

    fn gsm_location(&mut self) -> Result<String<IDENT_LEN>, Error> {
        Err(Error::unsupported())
    }

    fn battery_voltage(&mut self) -> Result<u16, Error> {
        Err(Error::unsupported())
    }

    fn battery_percent(&mut self) -> Result<u8, Error> {
        Err(Error::unsupported())
    }
}

fn require(supported: bool) -> Result<(), Error> {
    if supported {
        Ok(())
    } else {
        Err(Error::unsupported())
    }
}

fn result_code(m: Match) -> Result<(), Error> {
    match m {
        Match::Pattern(1) => Ok(()),
        Match::Pattern(_) => Err(Error::ErrorResponse),
        Match::Timeout => Err(Error::timeout()),
    }
}

fn trimmed(data: &[u8]) -> Result<&str, Error> {
    core::str::from_utf8(data)
        .map(str::trim)
        .map_err(|_| Error::InvalidResponse)
}

fn parse<N: FromStr>(data: &[u8]) -> Result<N, Error> {
    trimmed(data)?
        .parse()
        .map_err(|_| Error::InvalidResponse)
}

fn ident(s: &str) -> Result<String<IDENT_LEN>, Error> {
    String::try_from(s).map_err(|_| Error::Overflow)
}

/// Modem driven through standard 3GPP TS 27.007 commands.
///
/// Operations are gated by the [`Capabilities`] of the configured family.
pub struct GenericModem<T, D> {
    client: AtClient<T, D>,
}

impl<T, D> GenericModem<T, D>
where
    T: Transport,
    D: DelayNs,
{
    pub fn new(client: AtClient<T, D>) -> Self {
        Self { client }
    }

    pub fn client_mut(&mut self) -> &mut AtClient<T, D> {
        &mut self.client
    }

    pub fn release(self) -> AtClient<T, D> {
        self.client
    }

    fn capabilities(&self) -> Capabilities {
        self.client.config().module().capabilities()
    }

    fn timeout(&self) -> Duration {
        self.client.config().response_timeout
    }

    fn command(&mut self, fragments: &[&dyn Display]) -> Result<(), Error> {
        let timeout = self.timeout();
        self.command_timeout(fragments, timeout)
    }

    fn command_timeout(
        &mut self,
        fragments: &[&dyn Display],
        timeout: Duration,
    ) -> Result<(), Error> {
        self.client.send_at(fragments)?;
        result_code(self.client.wait_response(timeout)?)
    }

    /// Send a query and consume its reply up to and including `prefix`.
    fn query(&mut self, fragments: &[&dyn Display], prefix: &[u8]) -> Result<(), Error> {
        self.client.send_at(fragments)?;
        let timeout = self.timeout();
        let error = self.client.line_terminator().error();
        result_code(self.client.wait_for(timeout, &Patterns::pair(prefix, error))?)
    }

    /// Consume the final result code of a query.
    fn finish(&mut self) -> Result<(), Error> {
        let timeout = self.timeout();
        result_code(self.client.wait_response(timeout)?)
    }

    fn read_until<const N: usize>(&mut self, end: &[u8]) -> Result<Vec<u8, N>, Error> {
        let timeout = self.timeout();
        let mut data = Vec::new();
        match self
            .client
            .wait_response_with_data(timeout, &Patterns::new(end), &mut data)?
        {
            Match::Timeout => Err(Error::timeout()),
            Match::Pattern(_) => Ok(data),
        }
    }

    fn read_line<const N: usize>(&mut self) -> Result<Vec<u8, N>, Error> {
        let end = self.client.line_terminator().as_bytes();
        self.read_until(end)
    }

    fn skip_until(&mut self, target: u8) -> Result<(), Error> {
        if self.client.skip_until(target)? {
            Ok(())
        } else {
            Err(Error::InvalidResponse)
        }
    }

    /// Rest of the line after `prefix`, with the final result code consumed.
    fn query_line<const N: usize>(
        &mut self,
        fragments: &[&dyn Display],
        prefix: &[u8],
    ) -> Result<Vec<u8, N>, Error> {
        self.query(fragments, prefix)?;
        let line = self.read_line()?;
        self.finish()?;
        Ok(line)
    }

    /// Comma separated field of the `+CBC` battery report.
    fn battery_field(&mut self, index: usize) -> Result<u16, Error> {
        require(self.capabilities().battery)?;
        let line: Vec<u8, IDENT_LEN> = self.query_line(&[&"+CBC"], b"+CBC:")?;
        trimmed(&line)?
            .split(',')
            .nth(index)
            .ok_or(Error::InvalidResponse)?
            .trim()
            .parse()
            .map_err(|_| Error::InvalidResponse)
    }
}

impl<T, D> Modem for GenericModem<T, D>
where
    T: Transport,
    D: DelayNs,
{
    fn init(&mut self) -> Result<(), Error> {
        if !self.test_at(INIT_TIMEOUT)? {
            return Err(Error::timeout());
        }

        // Factory profile is optional, the result code is not checked
        self.client.send_at(&[&"&FZ"])?;
        let timeout = self.timeout();
        self.client.wait_response(timeout)?;

        self.command(&[&"E0"])?;
        info!("Modem initialized");
        Ok(())
    }

    fn test_at(&mut self, timeout: Duration) -> Result<bool, Error> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            self.client.send_at(&[])?;
            if self.client.wait_response(TEST_AT_WAIT)?.is(1) {
                return Ok(true);
            }
            self.client.pause(TEST_AT_PAUSE);
        }
        Ok(false)
    }

    fn set_baud(&mut self, baud: u32) -> Result<(), Error> {
        self.command(&[&"+IPR=", &baud])
    }

    fn factory_default(&mut self) -> Result<(), Error> {
        self.command(&[&"&FZE0&W"])
    }

    fn has_ssl(&self) -> bool {
        self.capabilities().ssl
    }

    fn restart(&mut self) -> Result<(), Error> {
        require(self.capabilities().gprs)?;
        self.command_timeout(&[&"+CFUN=1,1"], RADIO_TIMEOUT)?;
        let boot_wait = self.client.config().module().boot_wait();
        self.client.pause(boot_wait);
        self.init()
    }

    fn radio_off(&mut self) -> Result<(), Error> {
        require(self.capabilities().gprs)?;
        self.command_timeout(&[&"+CFUN=0"], RADIO_TIMEOUT)
    }

    fn sim_unlock(&mut self, pin: &str) -> Result<(), Error> {
        require(self.capabilities().gprs)?;
        self.command(&[&"+CPIN=\"", &pin, &"\""])
    }

    fn sim_ccid(&mut self) -> Result<String<IDENT_LEN>, Error> {
        require(self.capabilities().gprs)?;
        let line: Vec<u8, IDENT_LEN> = self.query_line(&[&"+CCID"], b"+CCID:")?;
        ident(trimmed(&line)?)
    }

    fn imei(&mut self) -> Result<String<IDENT_LEN>, Error> {
        require(self.capabilities().gprs)?;
        self.client.send_at(&[&"+GSN"])?;

        let timeout = self.timeout();
        let lt = self.client.line_terminator();
        let mut data: Vec<u8, 64> = Vec::new();
        let m = self.client.wait_response_with_data(
            timeout,
            &Patterns::pair(lt.ok(), lt.error()),
            &mut data,
        )?;
        result_code(m)?;
        ident(trimmed(&data)?)
    }

    fn sim_status(&mut self, timeout: Duration) -> Result<SimStatus, Error> {
        require(self.capabilities().gprs)?;
        // "NOT READY" must precede "READY", both complete on the same byte
        let states = Patterns::from_list(&[
            b"NOT READY".as_slice(),
            b"READY",
            b"SIM PIN",
            b"SIM PUK",
            b"NOT INSERTED",
        ])?;

        let start = Instant::now();
        while start.elapsed() < timeout {
            match self.query(&[&"+CPIN?"], b"+CPIN:") {
                Ok(()) => {}
                Err(Error::ErrorResponse | Error::Generic(GenericError::Timeout)) => {
                    self.client.pause(SIM_RETRY_INTERVAL);
                    continue;
                }
                Err(e) => return Err(e),
            }

            let response_timeout = self.timeout();
            let status = match self.client.wait_for(response_timeout, &states)? {
                Match::Pattern(2) => SimStatus::Ready,
                Match::Pattern(3 | 4) => SimStatus::Locked,
                Match::Pattern(5) => SimStatus::NotInserted,
                _ => SimStatus::Error,
            };
            self.client.wait_response(response_timeout)?;
            debug!("SIM status: {:?}", status);
            return Ok(status);
        }

        Ok(SimStatus::Error)
    }

    fn operator(&mut self) -> Result<String<IDENT_LEN>, Error> {
        require(self.capabilities().gprs)?;
        self.query(&[&"+COPS?"], b"+COPS:")?;

        // No operator is selected when the name is missing
        if !self.client.skip_until(b'"')? {
            return Ok(String::new());
        }
        let name: Vec<u8, IDENT_LEN> = self.read_until(b"\"")?;
        self.finish()?;
        ident(trimmed(&name)?)
    }

    fn registration_status(&mut self) -> Result<RegistrationStatus, Error> {
        require(self.capabilities().gprs)?;
        self.query(&[&"+CREG?"], b"+CREG:")?;
        self.skip_until(b',')?;
        let stat: Vec<u8, 8> = self.read_line()?;
        self.finish()?;
        Ok(RegistrationStatus::from(parse::<u8>(&stat)?))
    }

    fn signal_quality(&mut self) -> Result<u8, Error> {
        require(self.capabilities().gprs)?;
        self.query(&[&"+CSQ"], b"+CSQ:")?;
        let rssi: Vec<u8, 8> = self.read_until(b",")?;
        self.finish()?;
        parse(&rssi)
    }

    fn is_network_connected(&mut self) -> Result<bool, Error> {
        Ok(self.registration_status()?.is_registered())
    }

    fn network_poll_interval(&self) -> Duration {
        self.client.config().network_poll_interval
    }

    fn idle(&mut self, duration: Duration) {
        self.client.pause(duration);
    }

    fn local_ip_str(&mut self) -> Result<String<IDENT_LEN>, Error> {
        require(self.capabilities().gprs)?;
        self.query(&[&"+CGPADDR=1"], b"+CGPADDR:")?;
        self.skip_until(b',')?;
        let addr: Vec<u8, IDENT_LEN> = self.read_line()?;
        self.finish()?;
        ident(trimmed(&addr)?.trim_matches('"'))
    }

    fn gprs_connect(&mut self, apn: &str, user: &str, password: &str) -> Result<(), Error> {
        require(self.capabilities().gprs)?;
        info!("Connecting to APN {}", apn);

        self.command(&[&"+CGDCONT=1,\"IP\",\"", &apn, &"\""])?;
        if !user.is_empty() {
            self.command(&[&"+CGAUTH=1,1,\"", &user, &"\",\"", &password, &"\""])?;
        }
        self.command_timeout(&[&"+CGATT=1"], GPRS_TIMEOUT)?;
        self.command_timeout(&[&"+CGACT=1,1"], GPRS_TIMEOUT)
    }

    fn gprs_disconnect(&mut self) -> Result<(), Error> {
        require(self.capabilities().gprs)?;
        self.command_timeout(&[&"+CGACT=0,1"], GPRS_TIMEOUT)?;
        self.command_timeout(&[&"+CGATT=0"], GPRS_TIMEOUT)
    }

    /// Send a USSD request and decode the network's reply according to its
    /// data coding scheme. Replies in an unknown scheme are returned as the
    /// raw hex string.
    fn send_ussd(&mut self, code: &str) -> Result<String<USSD_LEN>, Error> {
        require(self.capabilities().ussd)?;
        self.command(&[&"+CMGF=1"])?;
        self.command(&[&"+CSCS=\"HEX\""])?;
        self.command(&[&"+CUSD=1,\"", &code, &"\""])?;

        if !self
            .client
            .wait_for(USSD_TIMEOUT, &Patterns::new(b"+CUSD:"))?
            .is(1)
        {
            return Err(Error::timeout());
        }
        self.skip_until(b'"')?;
        let hex: Vec<u8, USSD_HEX_LEN> = self.read_until(b"\"")?;
        self.skip_until(b',')?;
        let dcs: Vec<u8, 8> = self.read_line()?;

        let hex = core::str::from_utf8(&hex).map_err(|_| Error::InvalidResponse)?;
        let dcs: u8 = parse(&dcs)?;
        match TextEncoding::from_dcs(dcs) {
            Some(encoding) => {
                let fallback = self.client.config().unicode_fallback;
                Ok(decode_text(hex, encoding, fallback)?)
            }
            None => {
                warn!("Unknown USSD coding scheme {}", dcs);
                String::try_from(hex).map_err(|_| Error::Overflow)
            }
        }
    }

    fn send_sms(&mut self, number: &str, text: &str) -> Result<(), Error> {
        require(self.capabilities().sms)?;
        self.command(&[&"+CMGF=1"])?;
        self.command(&[&"+CSCS=\"GSM\""])?;

        self.client.send_at(&[&"+CMGS=\"", &number, &"\""])?;
        let timeout = self.timeout();
        if !self.client.wait_for(timeout, &Patterns::new(b">"))?.is(1) {
            return Err(Error::timeout());
        }

        self.client.stream_write(&[&text, &'\x1A'])?;
        self.client.flush()?;
        result_code(self.client.wait_response(SMS_TIMEOUT)?)
    }

    fn battery_voltage(&mut self) -> Result<u16, Error> {
        self.battery_field(2)
    }

    fn battery_percent(&mut self) -> Result<u8, Error> {
        u8::try_from(self.battery_field(1)?).map_err(|_| Error::InvalidResponse)
    }
}
