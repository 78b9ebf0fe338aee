use super::{Capabilities, ModuleParams};
use embassy_time::Duration;

/// Espressif ESP8266 running the AT firmware
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Esp8266;

impl ModuleParams for Esp8266 {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            wifi: true,
            ssl: true,
            ..Capabilities::NONE
        }
    }
    fn boot_wait(&self) -> Duration {
        Duration::from_secs(1)
    }
}
