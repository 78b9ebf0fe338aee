use super::{Capabilities, ModuleParams};
use embassy_time::Duration;

/// Ai-Thinker A6 and A7
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct A6;

impl ModuleParams for A6 {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            battery: true,
            ..Capabilities::CELLULAR
        }
    }
    fn boot_wait(&self) -> Duration {
        Duration::from_secs(5)
    }
}
