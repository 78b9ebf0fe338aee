use super::{Capabilities, ModuleParams};
use embassy_time::Duration;

/// u-blox SARA-U201
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct U201;

impl ModuleParams for U201 {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            ssl: true,
            location: true,
            ..Capabilities::CELLULAR
        }
    }
    fn boot_wait(&self) -> Duration {
        Duration::from_secs(5)
    }
    fn command_delay_default(&self) -> Duration {
        Duration::from_millis(20)
    }
}
