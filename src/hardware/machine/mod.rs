//! Machine composition.
//!
//! A [`MachineDescriptor`] names the firmware of a motherboard and the devices
//! soldered onto it. [`init`] turns one into a running [`Session`]: firmware
//! first, then every device in stage order, then board quirks.

pub mod catalog;
pub mod quirks;

use std::fmt;

use log::{error, info, warn};

pub use quirks::Quirk;

use super::device::{DeviceConstructionFault, DeviceDescriptor};
use super::io::PortConflictError;
use super::peripheral::at_core::AT_CORE;
use super::peripheral::display::external_card;
use super::peripheral::ide::IDE_ISA;
use super::peripheral::kbc_at::KEYBOARD_AT;
use super::rom::{RomLoadError, RomSpec};
use super::sys::Session;
use crate::config::{GfxCard, SessionConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuFamily {
    I286,
    I386Sx,
}

impl fmt::Display for CpuFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            CpuFamily::I286 => "286",
            CpuFamily::I386Sx => "386SX",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Always,
    /// Only when the session uses the board's own video.
    InternalVideo,
}

impl Condition {
    pub fn holds(self, config: &SessionConfig) -> bool {
        match self {
            Condition::Always => true,
            Condition::InternalVideo => config.gfx_card == GfxCard::Internal,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SlotBinding {
    pub device: &'static DeviceDescriptor,
    /// `None` adds the singleton instance.
    pub instance: Option<u32>,
    pub condition: Condition,
}

impl SlotBinding {
    pub const fn always(device: &'static DeviceDescriptor) -> Self {
        Self {
            device,
            instance: None,
            condition: Condition::Always,
        }
    }

    pub const fn internal_video(device: &'static DeviceDescriptor) -> Self {
        Self {
            device,
            instance: None,
            condition: Condition::InternalVideo,
        }
    }

    pub const fn instance(device: &'static DeviceDescriptor, index: u32) -> Self {
        Self {
            device,
            instance: Some(index),
            condition: Condition::Always,
        }
    }
}

static COMMON: [SlotBinding; 1] = [SlotBinding::always(&AT_CORE)];
static COMMON_IDE: [SlotBinding; 2] = [SlotBinding::always(&AT_CORE), SlotBinding::always(&IDE_ISA)];
static WITH_KEYBOARD: [SlotBinding; 2] = [SlotBinding::always(&AT_CORE), SlotBinding::always(&KEYBOARD_AT)];

/// Devices every AT board of a family shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtBase {
    Common,
    /// Plus the ISA IDE controller.
    CommonIde,
    /// Plus the plain AT keyboard controller.
    WithKeyboard,
}

impl AtBase {
    pub fn devices(self) -> &'static [SlotBinding] {
        match self {
            AtBase::Common => &COMMON,
            AtBase::CommonIde => &COMMON_IDE,
            AtBase::WithKeyboard => &WITH_KEYBOARD,
        }
    }
}

#[derive(Debug)]
pub struct MachineDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub cpu: CpuFamily,
    pub roms: RomSpec,
    pub base: AtBase,
    pub devices: &'static [SlotBinding],
    pub quirks: &'static [Quirk],
}

/// One device the composer is going to add.
#[derive(Debug, Clone, Copy)]
pub struct PlannedDevice {
    pub device: &'static DeviceDescriptor,
    pub instance: Option<u32>,
}

impl MachineDescriptor {
    /// Onboard video device, if the board has one.
    pub fn internal_video(&self) -> Option<&'static DeviceDescriptor> {
        self.devices
            .iter()
            .find(|b| b.condition == Condition::InternalVideo)
            .map(|b| b.device)
    }

    /// Devices to add for `config`, in registration order.
    pub fn device_plan(&self, config: &SessionConfig) -> Vec<PlannedDevice> {
        let mut plan: Vec<_> = self
            .base
            .devices()
            .iter()
            .chain(self.devices)
            .filter(|b| b.condition.holds(config))
            .map(|b| PlannedDevice {
                device: b.device,
                instance: b.instance,
            })
            .collect();

        // Stable, so devices sharing a stage keep table order
        plan.sort_by_key(|p| p.device.slot.stage());

        if let GfxCard::External(adapter) = config.gfx_card {
            plan.push(PlannedDevice {
                device: external_card(adapter),
                instance: None,
            });
        }

        plan
    }
}

#[derive(Debug)]
pub enum MachineError {
    /// The primary firmware image could not be loaded.
    RomUnavailable {
        machine: &'static str,
        source: RomLoadError,
    },
    Device(DeviceConstructionFault),
    PortConflict(PortConflictError),
}

impl fmt::Display for MachineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RomUnavailable { machine, source } => {
                write!(f, "BIOS for {machine} unavailable: {source}")
            }
            Self::Device(fault) => write!(f, "{fault}"),
            Self::PortConflict(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for MachineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::RomUnavailable { source, .. } => Some(source),
            Self::Device(fault) => Some(fault),
            Self::PortConflict(e) => Some(e),
        }
    }
}

impl From<DeviceConstructionFault> for MachineError {
    fn from(fault: DeviceConstructionFault) -> Self {
        Self::Device(fault)
    }
}

impl From<PortConflictError> for MachineError {
    fn from(e: PortConflictError) -> Self {
        Self::PortConflict(e)
    }
}

/// Bring `session` up as `model`. A session that already runs a machine is
/// torn down first. On failure the session is left empty.
pub fn init(session: &mut Session, model: &'static MachineDescriptor) -> Result<(), MachineError> {
    if session.machine().is_some() || !session.devices.is_empty() || !session.io().is_empty() {
        session.rst();
    }

    // Read everything before touching memory
    let loader = session.rom_loader();
    let primary = loader.read(&model.roms.primary).map_err(|source| {
        warn!("{}: {source}", model.id);
        MachineError::RomUnavailable {
            machine: model.id,
            source,
        }
    })?;

    let aux = model.roms.aux.and_then(|spec| match loader.read(&spec) {
        Ok(image) => Some(image),
        Err(e) => {
            warn!("{}: auxiliary ROM not loaded: {e}", model.id);
            None
        }
    });

    session.platform.memory.map_rom(&primary);
    if let Some(aux) = &aux {
        session.platform.memory.map_rom(aux);
    }
    session.set_machine(model);
    info!("Loaded BIOS for {} ({})", model.name, model.id);

    if session.config.check_only {
        return Ok(());
    }

    for planned in model.device_plan(&session.config) {
        let added = match planned.instance {
            Some(index) => session.add_device_instance(planned.device, index),
            None => session.add_device(planned.device),
        };

        if let Err(fault) = added {
            error!("{}: composition aborted", model.id);
            session.rst();
            return Err(fault.into());
        }
    }

    for quirk in model.quirks {
        if let Err(e) = quirk.install(session) {
            error!("{}: {e}", model.id);
            session.rst();
            return Err(e.into());
        }
    }

    info!(
        "{} up: {} devices, {} port bindings",
        model.id,
        session.devices.len(),
        session.io().len()
    );
    Ok(())
}

/// Build a fresh session running `model`.
pub fn compose(model: &'static MachineDescriptor, config: SessionConfig) -> Result<Session, MachineError> {
    let mut session = Session::new(config);
    init(&mut session, model)?;
    Ok(session)
}

/// Whether the firmware of `model` is present under the configured ROM root.
pub fn is_available(model: &'static MachineDescriptor, config: &SessionConfig) -> bool {
    compose(model, config.clone().set_check_only(true)).is_ok()
}
