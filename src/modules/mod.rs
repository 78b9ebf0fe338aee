pub mod a6;
pub mod esp8266;
pub mod m590;
pub mod sim800;
pub mod u201;
pub mod xbee;

use embassy_time::Duration;
use serde::{Deserialize, Serialize};

/// Line terminator appended to every command, fixed per device family.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineTerminator {
    #[default]
    CrLf,
    Cr,
}

impl LineTerminator {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CrLf => "\r\n",
            Self::Cr => "\r",
        }
    }

    pub const fn as_bytes(self) -> &'static [u8] {
        self.as_str().as_bytes()
    }

    /// Final result code for a successful command
    pub const fn ok(self) -> &'static [u8] {
        match self {
            Self::CrLf => b"OK\r\n",
            Self::Cr => b"OK\r",
        }
    }

    /// Final result code for a failed command
    pub const fn error(self) -> &'static [u8] {
        match self {
            Self::CrLf => b"ERROR\r\n",
            Self::Cr => b"ERROR\r",
        }
    }
}

/// Feature set of a device family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Capabilities {
    pub gprs: bool,
    pub wifi: bool,
    pub sms: bool,
    pub ussd: bool,
    pub ssl: bool,
    pub location: bool,
    pub battery: bool,
}

impl Capabilities {
    pub const CELLULAR: Self = Self {
        gprs: true,
        wifi: false,
        sms: true,
        ussd: true,
        ssl: false,
        location: false,
        battery: false,
    };

    pub const NONE: Self = Self {
        gprs: false,
        wifi: false,
        sms: false,
        ussd: false,
        ssl: false,
        location: false,
        battery: false,
    };
}

pub trait ModuleParams: Copy {
    /// Terminator appended to every command line
    fn line_terminator(&self) -> LineTerminator {
        LineTerminator::CrLf
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::CELLULAR
    }

    /// Baud rate the module ships with
    fn default_baud(&self) -> u32 {
        115_200
    }

    /// How long to wait before the module is ready after boot
    fn boot_wait(&self) -> Duration {
        Duration::from_secs(3)
    }

    /// Minimum spacing the client keeps between any two consecutive AT
    /// commands, measured from the previous send
    fn command_delay_default(&self) -> Duration {
        Duration::from_millis(20)
    }
}

/// Device family driven by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Module {
    Sim800(sim800::Sim800),
    A6(a6::A6),
    M590(m590::M590),
    U201(u201::U201),
    Esp8266(esp8266::Esp8266),
    Xbee(xbee::Xbee),
    Generic(Generic),
}

impl Default for Module {
    fn default() -> Self {
        Self::Generic(Generic)
    }
}

const SIMCOM_MODELS: [&[u8]; 4] = [b"SIM800", b"SIM900", b"SIM808", b"SIM868"];

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

impl Module {
    /// Pick a family from an `ATI` / `AT+CGMM` model string.
    pub fn from_model_id(model_id: &[u8]) -> Self {
        if SIMCOM_MODELS.iter().any(|id| contains(model_id, id)) {
            Self::Sim800(sim800::Sim800)
        } else if contains(model_id, b"A6") || contains(model_id, b"A7") {
            Self::A6(a6::A6)
        } else if contains(model_id, b"M590") {
            Self::M590(m590::M590)
        } else if contains(model_id, b"U201") {
            Self::U201(u201::U201)
        } else if contains(model_id, b"ESP8266") || contains(model_id, b"ESP_AT") {
            Self::Esp8266(esp8266::Esp8266)
        } else if contains(model_id, b"XBee") || contains(model_id, b"XBEE") {
            Self::Xbee(xbee::Xbee)
        } else {
            warn!(
                "Attempting to run {:?} using generic module parameters! This may or may not work.",
                crate::fmt::LossyStr(model_id)
            );
            Self::Generic(Generic)
        }
    }
}

macro_rules! inner {
    ($self: ident, $fn: ident) => {
        match $self {
            Self::Sim800(inner) => inner.$fn(),
            Self::A6(inner) => inner.$fn(),
            Self::M590(inner) => inner.$fn(),
            Self::U201(inner) => inner.$fn(),
            Self::Esp8266(inner) => inner.$fn(),
            Self::Xbee(inner) => inner.$fn(),
            Self::Generic(inner) => inner.$fn(),
        }
    };
}

impl ModuleParams for Module {
    fn line_terminator(&self) -> LineTerminator {
        inner!(self, line_terminator)
    }

    fn capabilities(&self) -> Capabilities {
        inner!(self, capabilities)
    }

    fn default_baud(&self) -> u32 {
        inner!(self, default_baud)
    }

    fn boot_wait(&self) -> Duration {
        inner!(self, boot_wait)
    }

    fn command_delay_default(&self) -> Duration {
        inner!(self, command_delay_default)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Generic;

impl ModuleParams for Generic {}
