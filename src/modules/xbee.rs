use super::{Capabilities, LineTerminator, ModuleParams};

/// Digi XBee, cellular or WiFi variant, in command mode
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Xbee;

impl ModuleParams for Xbee {
    fn line_terminator(&self) -> LineTerminator {
        LineTerminator::Cr
    }
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            gprs: true,
            wifi: true,
            ..Capabilities::NONE
        }
    }
    fn default_baud(&self) -> u32 {
        9600
    }
}
