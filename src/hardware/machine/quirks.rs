use log::debug;

use crate::hardware::io::{PortConflictError, PortHandlers};
use crate::hardware::switches_cfg::{m290_switches, SW_PORT_M290};
use crate::hardware::sys::Session;

/// Board-specific hardware that is not a device of its own, installed
/// straight on the port table after all devices are in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quirk {
    /// Read-only DIP switch bank of the Olivetti M290 at port 0x69.
    M290DipSwitches,
}

impl Quirk {
    pub fn install(&self, session: &mut Session) -> Result<(), PortConflictError> {
        match self {
            Quirk::M290DipSwitches => {
                let display = session.platform.display.clone();
                let handlers = PortHandlers::new("m290 dip switches")
                    .on_read8(move |_| m290_switches(display.is_cga()));

                session.claim_ports(SW_PORT_M290, 1, handlers)?;
            }
        }

        debug!("Installed {self:?}");
        Ok(())
    }
}
