use super::{Capabilities, ModuleParams};

/// SIMCom SIM800, SIM808, SIM868 and SIM900
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Sim800;

impl ModuleParams for Sim800 {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            ssl: true,
            location: true,
            battery: true,
            ..Capabilities::CELLULAR
        }
    }
}
