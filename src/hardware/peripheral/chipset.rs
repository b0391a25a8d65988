//! Motherboard chipsets. None of them change the memory map here, they only
//! need their configuration registers to be present so the BIOS can program
//! them and read the values back.

use std::sync::Arc;

use super::{lock, port_handlers, shared, Peripheral, PeripheralDevice};
use crate::hardware::device::{Device, DeviceContext, DeviceDescriptor, DeviceSlot, FaultCause};

/// Index/data register file: a write to `index_port` selects a register,
/// `data_port` reads or writes it.
pub struct IndexedRegisters {
    index_port: u16,
    data_port: u16,

    pub index: u8,
    regs: [u8; 256],
}

impl IndexedRegisters {
    pub fn new(index_port: u16, data_port: u16) -> Self {
        Self {
            index_port,
            data_port,

            index: 0,
            regs: [0; 256],
        }
    }
}

impl Peripheral for IndexedRegisters {
    fn port_in(&mut self, port: u16) -> u8 {
        if port == self.data_port {
            self.regs[self.index as usize]
        } else if port == self.index_port {
            self.index
        } else {
            0xFF
        }
    }

    fn port_out(&mut self, val: u8, port: u16) {
        if port == self.index_port {
            self.index = val;
        } else if port == self.data_port {
            self.regs[self.index as usize] = val;
        }
    }

    fn reset(&mut self) {
        self.index = 0;
        self.regs = [0; 256];
    }
}

fn indexed_init(
    ctx: &mut DeviceContext<'_>,
    index_port: u16,
    data_port: u16,
) -> Result<Box<dyn Device>, FaultCause> {
    let chipset = shared(IndexedRegisters::new(index_port, data_port));
    let name = ctx.name();

    if data_port == index_port + 1 {
        ctx.claim_ports(index_port, 2, port_handlers(name, &chipset))?;
    } else {
        ctx.claim_ports(index_port, 1, port_handlers(name, &chipset))?;
        ctx.claim_ports(data_port, 1, port_handlers(name, &chipset))?;
    }

    Ok(PeripheralDevice::boxed(chipset))
}

macro_rules! indexed_chipset {
    ($id:ident, $name:expr, $internal:expr, $index:expr, $data:expr) => {
        pub static $id: DeviceDescriptor = DeviceDescriptor {
            name: $name,
            internal_name: $internal,
            slot: DeviceSlot::Chipset,
            init: |ctx| indexed_init(ctx, $index, $data),
        };
    };
}

indexed_chipset!(HEADLAND_GC10X, "Headland GC101/102/103", "headland_gc10x", 0x22, 0x23);
indexed_chipset!(HEADLAND_HT18B, "Headland HT18B", "headland_ht18b", 0x22, 0x23);
indexed_chipset!(NEAT, "C&T CS8121 (NEAT)", "neat", 0x22, 0x23);
indexed_chipset!(SCAT, "C&T 82C235 SCAT", "scat", 0x22, 0x23);
indexed_chipset!(SCAT_4, "C&T 82C236 SCAT", "scat_4", 0x22, 0x23);
indexed_chipset!(SCAT_SX, "C&T 82C836 SCATsx", "scat_sx", 0x22, 0x23);
indexed_chipset!(ALI6117D, "ALi M6117D", "ali6117d", 0x22, 0x23);
indexed_chipset!(INTEL_82335, "Intel 82335", "intel_82335", 0x22, 0x24);
indexed_chipset!(OPTI291, "OPTi 82C291", "opti291", 0x22, 0x24);
indexed_chipset!(VLSI_SCAMP, "VLSI VL82C311 (SCAMP)", "vlsi_scamp", 0xEC, 0xED);

pub const WD76C10_PORTS: [u16; 4] = [0x1072, 0x1872, 0x2072, 0x2872];

/// WD76C10 configuration space: one 16 bit register per port.
#[derive(Default)]
pub struct Wd76c10 {
    regs: [u16; WD76C10_PORTS.len()],
}

impl Wd76c10 {
    fn slot(port: u16) -> Option<usize> {
        WD76C10_PORTS.iter().position(|&p| p == port & !1)
    }

    pub fn read_16(&self, port: u16) -> u16 {
        Self::slot(port).map_or(0xFFFF, |i| self.regs[i])
    }

    pub fn write_16(&mut self, port: u16, val: u16) {
        if let Some(i) = Self::slot(port) {
            self.regs[i] = val;
        }
    }
}

impl Peripheral for Wd76c10 {
    fn port_in(&mut self, port: u16) -> u8 {
        let word = self.read_16(port);
        if port & 1 == 0 {
            word as u8
        } else {
            (word >> 8) as u8
        }
    }

    fn port_out(&mut self, val: u8, port: u16) {
        let Some(i) = Self::slot(port) else {
            return;
        };
        let reg = &mut self.regs[i];
        if port & 1 == 0 {
            *reg = (*reg & 0xFF00) | val as u16;
        } else {
            *reg = (*reg & 0x00FF) | ((val as u16) << 8);
        }
    }

    fn reset(&mut self) {
        self.regs = Default::default();
    }
}

fn wd76c10_init(ctx: &mut DeviceContext<'_>) -> Result<Box<dyn Device>, FaultCause> {
    let chipset = shared(Wd76c10::default());

    for port in WD76C10_PORTS {
        let rd = Arc::clone(&chipset);
        let wr = Arc::clone(&chipset);
        let handlers = port_handlers("wd76c10", &chipset)
            .on_read16(move |port| lock(&rd).read_16(port))
            .on_write16(move |port, val| lock(&wr).write_16(port, val));
        ctx.claim_ports(port, 2, handlers)?;
    }

    Ok(PeripheralDevice::boxed(chipset))
}

pub static WD76C10: DeviceDescriptor = DeviceDescriptor {
    name: "Western Digital WD76C10",
    internal_name: "wd76c10",
    slot: DeviceSlot::Chipset,
    init: wd76c10_init,
};
