//! Device registry.
//!
//! Tracks the device instances of one session in registration order. Each
//! constructor gets a [`DeviceContext`] that records every port range and
//! memory region it claims, so the registry can release them again on
//! teardown or when the constructor fails halfway.

use std::fmt;

use log::{debug, error, info};

use super::bus::{RegionConflictError, RegionHandle};
use super::io::{BindingHandle, PortConflictError, PortHandlers};
use super::sys::Platform;
use crate::config::SessionConfig;

/// Logical role a device plays on the motherboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceSlot {
    Platform,
    Chipset,
    SuperIo,
    KeyboardController,
    FloppyController,
    HardDiskController,
    Flash,
    Video,
}

impl DeviceSlot {
    /// Registration stage. Devices in earlier stages set up infrastructure
    /// that later stages rely on.
    pub fn stage(self) -> u8 {
        match self {
            DeviceSlot::Platform => 0,
            DeviceSlot::Chipset => 1,
            DeviceSlot::SuperIo => 2,
            DeviceSlot::KeyboardController
            | DeviceSlot::FloppyController
            | DeviceSlot::HardDiskController
            | DeviceSlot::Flash => 3,
            DeviceSlot::Video => 4,
        }
    }
}

pub trait Device: Send {
    /// Soft reset, the device stays registered.
    fn reset(&mut self) {}

    /// Called once before the registry releases the device's resources.
    fn close(&mut self, _platform: &mut Platform) {}
}

pub type InitFn = fn(&mut DeviceContext<'_>) -> Result<Box<dyn Device>, FaultCause>;

pub struct DeviceDescriptor {
    pub name: &'static str,
    pub internal_name: &'static str,
    pub slot: DeviceSlot,
    pub init: InitFn,
}

impl fmt::Debug for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceDescriptor")
            .field("internal_name", &self.internal_name)
            .field("slot", &self.slot)
            .finish()
    }
}

impl PartialEq for DeviceDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.internal_name == other.internal_name
    }
}

#[derive(Debug)]
pub enum FaultCause {
    /// Another instance of a singleton device, or a reused instance index.
    Duplicate,
    PortConflict(PortConflictError),
    RegionConflict(RegionConflictError),
    Failed(String),
}

impl fmt::Display for FaultCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate => write!(f, "device already present"),
            Self::PortConflict(e) => write!(f, "{e}"),
            Self::RegionConflict(e) => write!(f, "{e}"),
            Self::Failed(reason) => write!(f, "{reason}"),
        }
    }
}

impl From<PortConflictError> for FaultCause {
    fn from(e: PortConflictError) -> Self {
        Self::PortConflict(e)
    }
}

impl From<RegionConflictError> for FaultCause {
    fn from(e: RegionConflictError) -> Self {
        Self::RegionConflict(e)
    }
}

/// A device could not be constructed. Means the machine table and the
/// device models disagree; it is not recoverable at run time.
#[derive(Debug)]
pub struct DeviceConstructionFault {
    pub device: &'static str,
    pub instance: u32,
    pub cause: FaultCause,
}

impl fmt::Display for DeviceConstructionFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot construct {} (instance {}): {}",
            self.device, self.instance, self.cause
        )
    }
}

impl std::error::Error for DeviceConstructionFault {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.cause {
            FaultCause::PortConflict(e) => Some(e),
            FaultCause::RegionConflict(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Resource {
    Ports(BindingHandle),
    Memory(RegionHandle),
}

impl Resource {
    fn release(self, platform: &mut Platform) {
        match self {
            Resource::Ports(handle) => {
                platform.io.unregister(handle);
            }
            Resource::Memory(handle) => {
                platform.memory.release(handle);
            }
        }
    }
}

fn release_all(resources: Vec<Resource>, platform: &mut Platform) {
    for resource in resources.into_iter().rev() {
        resource.release(platform);
    }
}

/// What a device constructor gets to work with.
pub struct DeviceContext<'a> {
    pub platform: &'a mut Platform,
    pub config: &'a SessionConfig,

    name: &'static str,
    instance: u32,
    resources: Vec<Resource>,
}

impl<'a> DeviceContext<'a> {
    /// 0 for singleton devices, the explicit index otherwise.
    pub fn instance(&self) -> u32 {
        self.instance
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn claim_ports(
        &mut self,
        start: u16,
        count: u16,
        handlers: PortHandlers,
    ) -> Result<BindingHandle, PortConflictError> {
        let handle = self.platform.io.register(start, count, handlers)?;
        self.resources.push(Resource::Ports(handle));
        Ok(handle)
    }

    pub fn claim_memory(&mut self, base: u32, size: u32) -> Result<RegionHandle, RegionConflictError> {
        let handle = self.platform.memory.claim(self.name, base, size)?;
        self.resources.push(Resource::Memory(handle));
        Ok(handle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceHandle(u32);

struct DeviceInstance {
    handle: InstanceHandle,
    descriptor: &'static DeviceDescriptor,
    index: u32,

    device: Box<dyn Device>,
    resources: Vec<Resource>,
}

/// Summary of a live instance, for listings and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceInfo {
    pub handle: InstanceHandle,
    pub name: &'static str,
    pub slot: DeviceSlot,
    pub index: u32,
}

#[derive(Default)]
pub struct DeviceRegistry {
    instances: Vec<DeviceInstance>,
    next_handle: u32,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        platform: &mut Platform,
        config: &SessionConfig,
        descriptor: &'static DeviceDescriptor,
    ) -> Result<InstanceHandle, DeviceConstructionFault> {
        self.add_instance(platform, config, descriptor, 0)
    }

    /// Add instance `index` of a device. Index 0 is the singleton instance;
    /// indices from 1 up let several copies of one kind coexist.
    pub fn add_instance(
        &mut self,
        platform: &mut Platform,
        config: &SessionConfig,
        descriptor: &'static DeviceDescriptor,
        index: u32,
    ) -> Result<InstanceHandle, DeviceConstructionFault> {
        let fault = |cause| {
            let fault = DeviceConstructionFault {
                device: descriptor.internal_name,
                instance: index,
                cause,
            };
            error!("{fault}");
            fault
        };

        let taken = self
            .instances
            .iter()
            .filter(|i| i.descriptor.internal_name == descriptor.internal_name)
            .any(|i| index == 0 || i.index == 0 || i.index == index);
        if taken {
            return Err(fault(FaultCause::Duplicate));
        }

        let mut ctx = DeviceContext {
            platform,
            config,
            name: descriptor.internal_name,
            instance: index,
            resources: Vec::new(),
        };

        let device = match (descriptor.init)(&mut ctx) {
            Ok(device) => device,
            Err(cause) => {
                let resources = std::mem::take(&mut ctx.resources);
                release_all(resources, ctx.platform);
                return Err(fault(cause));
            }
        };

        let handle = InstanceHandle(self.next_handle);
        self.next_handle += 1;

        debug!(
            "Added {} ({}) instance {index}",
            descriptor.name, descriptor.internal_name
        );
        self.instances.push(DeviceInstance {
            handle,
            descriptor,
            index,
            device,
            resources: ctx.resources,
        });

        Ok(handle)
    }

    /// Tear every device down, newest first.
    pub fn close_all(&mut self, platform: &mut Platform) {
        if self.instances.is_empty() {
            return;
        }

        info!("Closing {} devices", self.instances.len());
        while let Some(mut instance) = self.instances.pop() {
            instance.device.close(platform);
            release_all(instance.resources, platform);
            debug!("Closed {}", instance.descriptor.internal_name);
        }
    }

    pub fn reset_all(&mut self) {
        for instance in self.instances.iter_mut() {
            instance.device.reset();
        }
    }

    pub fn contains(&self, internal_name: &str) -> bool {
        self.instances
            .iter()
            .any(|i| i.descriptor.internal_name == internal_name)
    }

    pub fn instances(&self) -> impl Iterator<Item = InstanceInfo> + '_ {
        self.instances.iter().map(|i| InstanceInfo {
            handle: i.handle,
            name: i.descriptor.internal_name,
            slot: i.descriptor.slot,
            index: i.index,
        })
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
