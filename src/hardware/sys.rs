use log::info;

use super::bus::MemoryMap;
use super::device::{DeviceConstructionFault, DeviceDescriptor, DeviceRegistry, InstanceHandle};
use super::io::{BindingHandle, IoBus, PortConflictError, PortHandlers};
use super::machine::MachineDescriptor;
use super::peripheral::display::ActiveDisplay;
use super::rom::RomLoader;
use crate::config::SessionConfig;

/// Shared infrastructure devices plug into.
#[derive(Default)]
pub struct Platform {
    pub memory: MemoryMap,
    pub io: IoBus,
    pub display: ActiveDisplay,
}

impl Platform {
    pub fn new() -> Self {
        Self::default()
    }
}

/// One emulated machine: configuration, address space, port table and the
/// devices living on them. Dropping the session tears every device down.
pub struct Session {
    pub config: SessionConfig,
    pub platform: Platform,
    pub devices: DeviceRegistry,

    machine: Option<&'static MachineDescriptor>,
    // Ports claimed by the machine itself rather than by a device.
    machine_ports: Vec<BindingHandle>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Session {
            config,
            platform: Platform::new(),
            devices: DeviceRegistry::new(),

            machine: None,
            machine_ports: Vec::new(),
        }
    }

    pub fn machine(&self) -> Option<&'static MachineDescriptor> {
        self.machine
    }

    pub(crate) fn set_machine(&mut self, machine: &'static MachineDescriptor) {
        self.machine = Some(machine);
    }

    pub fn rom_loader(&self) -> RomLoader {
        RomLoader::new(&self.config.rom_path)
    }

    pub fn io(&self) -> &IoBus {
        &self.platform.io
    }

    pub fn memory(&self) -> &MemoryMap {
        &self.platform.memory
    }

    pub fn add_device(
        &mut self,
        descriptor: &'static DeviceDescriptor,
    ) -> Result<InstanceHandle, DeviceConstructionFault> {
        self.devices
            .add(&mut self.platform, &self.config, descriptor)
    }

    pub fn add_device_instance(
        &mut self,
        descriptor: &'static DeviceDescriptor,
        index: u32,
    ) -> Result<InstanceHandle, DeviceConstructionFault> {
        self.devices
            .add_instance(&mut self.platform, &self.config, descriptor, index)
    }

    /// Claim ports on behalf of the machine. Released by [`Session::rst`].
    pub fn claim_ports(
        &mut self,
        start: u16,
        count: u16,
        handlers: PortHandlers,
    ) -> Result<BindingHandle, PortConflictError> {
        let handle = self.platform.io.register(start, count, handlers)?;
        self.machine_ports.push(handle);
        Ok(handle)
    }

    /// Tear the machine down: devices newest first, then the machine's own
    /// ports, then the address space.
    pub fn rst(&mut self) {
        self.devices.close_all(&mut self.platform);

        for handle in self.machine_ports.drain(..).rev() {
            self.platform.io.unregister(handle);
        }

        if let Some(machine) = self.machine.take() {
            info!("Session for {} torn down", machine.id);
        }

        self.platform = Platform::new();
    }

    /// Soft reset every device without tearing anything down.
    pub fn soft_reset(&mut self) {
        self.devices.reset_all();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.rst();
    }
}
