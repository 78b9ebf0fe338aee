use super::{Capabilities, ModuleParams};
use embassy_time::Duration;

/// Neoway M590
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct M590;

impl ModuleParams for M590 {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            ussd: false,
            ..Capabilities::CELLULAR
        }
    }
    fn command_delay_default(&self) -> Duration {
        Duration::from_millis(50)
    }
}
