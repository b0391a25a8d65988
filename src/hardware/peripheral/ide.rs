use std::sync::Arc;

use super::{lock, port_handlers, shared, Peripheral, PeripheralDevice};
use crate::hardware::device::{Device, DeviceContext, DeviceDescriptor, DeviceSlot, FaultCause};

pub const IDE_PRIMARY: u16 = 0x1F0;
pub const IDE_PRIMARY_CTRL: u16 = 0x3F6;

const STAT_ERR: u8 = 0b00000001;
const STAT_DRDY: u8 = 0b01000000;

const ERR_ABRT: u8 = 0b00000100;

const CTRL_SRST: u8 = 0b00000100;

/// Task file of one ATA channel. No drives are ever attached, so every
/// command is aborted and the data port returns nothing.
#[derive(Default)]
pub struct IdeChannel {
    error: u8,
    pub features: u8,
    sector_count: u8,
    sector_number: u8,
    cylinder: [u8; 2],
    pub drive_head: u8,
    status: u8,
    pub control: u8,
}

impl IdeChannel {
    pub fn new() -> Self {
        Self::default()
    }

    fn command(&mut self, cmd: u8) {
        log::trace!("IDE command {cmd:#04X} with no drive attached");
        self.error = ERR_ABRT;
        self.status = STAT_DRDY | STAT_ERR;
    }

    fn write_control(&mut self, val: u8) {
        if val & CTRL_SRST != 0 && self.control & CTRL_SRST == 0 {
            self.error = 0;
            self.status = 0;
        }
        self.control = val;
    }
}

impl Peripheral for IdeChannel {
    fn port_in(&mut self, port: u16) -> u8 {
        match port {
            0x1F1 => self.error,
            0x1F2 => self.sector_count,
            0x1F3 => self.sector_number,
            0x1F4 => self.cylinder[0],
            0x1F5 => self.cylinder[1],
            0x1F6 => self.drive_head | 0xA0,
            0x1F7 | IDE_PRIMARY_CTRL => self.status,
            _ => 0xFF,
        }
    }

    fn port_out(&mut self, val: u8, port: u16) {
        match port {
            0x1F1 => self.features = val,
            0x1F2 => self.sector_count = val,
            0x1F3 => self.sector_number = val,
            0x1F4 => self.cylinder[0] = val,
            0x1F5 => self.cylinder[1] = val,
            0x1F6 => self.drive_head = val,
            0x1F7 => self.command(val),
            IDE_PRIMARY_CTRL => self.write_control(val),
            _ => {}
        }
    }

    fn reset(&mut self) {
        *self = IdeChannel::new();
    }
}

fn ide_isa_init(ctx: &mut DeviceContext<'_>) -> Result<Box<dyn Device>, FaultCause> {
    let ide = shared(IdeChannel::new());

    // The data register is 16 bits wide, byte accesses to it float
    let data = Arc::clone(&ide);
    let handlers = port_handlers("ide", &ide)
        .on_read16(move |port| match port {
            IDE_PRIMARY => 0x0000,
            _ => {
                let mut ide = lock(&data);
                let lo = ide.port_in(port) as u16;
                lo | (ide.port_in(port + 1) as u16) << 8
            }
        })
        .on_write16(|_, _| {});

    ctx.claim_ports(IDE_PRIMARY, 8, handlers)?;
    ctx.claim_ports(IDE_PRIMARY_CTRL, 1, port_handlers("ide ctrl", &ide))?;

    Ok(PeripheralDevice::boxed(ide))
}

pub static IDE_ISA: DeviceDescriptor = DeviceDescriptor {
    name: "PC/AT IDE Controller",
    internal_name: "ide_isa",
    slot: DeviceSlot::HardDiskController,
    init: ide_isa_init,
};
