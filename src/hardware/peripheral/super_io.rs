use super::fdc_necupd765::{claim_fdc, FloppyDiskController, FDC_PRIMARY, FDC_SECONDARY};
use super::{lock, port_handlers, shared, Peripheral, PeripheralDevice, Shared};
use crate::hardware::device::{Device, DeviceContext, DeviceDescriptor, DeviceSlot, FaultCause};

const FDC37C669_DEVICE_ID: u8 = 0x03;
const FDC37C669_REVISION: u8 = 0x02;

/// SMC FDC37C669 configuration interface. Writing 0x55 twice to the index
/// port unlocks it, 0xAA locks it again.
pub struct Fdc37c669Config {
    base: u16,
    unlock_count: u8,
    pub index: u8,
    regs: [u8; 0x30],
}

impl Fdc37c669Config {
    pub fn new(base: u16) -> Self {
        let mut regs = [0; 0x30];
        regs[0x0D] = FDC37C669_DEVICE_ID;
        regs[0x0E] = FDC37C669_REVISION;

        Self {
            base,
            unlock_count: 0,
            index: 0,
            regs,
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlock_count >= 2
    }
}

impl Peripheral for Fdc37c669Config {
    fn port_in(&mut self, port: u16) -> u8 {
        if !self.is_unlocked() {
            return 0xFF;
        }

        match port - self.base {
            0 => self.index,
            _ => self.regs.get(self.index as usize).copied().unwrap_or(0xFF),
        }
    }

    fn port_out(&mut self, val: u8, port: u16) {
        match port - self.base {
            0 if !self.is_unlocked() => {
                self.unlock_count = if val == 0x55 { self.unlock_count + 1 } else { 0 };
            }
            0 if val == 0xAA => self.unlock_count = 0,
            0 => self.index = val,
            _ => {
                // Identification registers are read-only
                let idx = self.index as usize;
                if self.is_unlocked() && idx < self.regs.len() && idx != 0x0D && idx != 0x0E {
                    self.regs[idx] = val;
                }
            }
        }
    }

    fn reset(&mut self) {
        *self = Fdc37c669Config::new(self.base);
    }
}

pub struct Fdc37c669 {
    pub config: Shared<Fdc37c669Config>,
    pub fdc: Shared<FloppyDiskController>,
}

impl Device for Fdc37c669 {
    fn reset(&mut self) {
        lock(&self.config).reset();
        lock(&self.fdc).reset();
    }
}

fn fdc37c669_init(ctx: &mut DeviceContext<'_>) -> Result<Box<dyn Device>, FaultCause> {
    // The second chip of a dual configuration sits at the secondary address
    let base = if ctx.instance() == 2 { FDC_SECONDARY } else { FDC_PRIMARY };

    let config = shared(Fdc37c669Config::new(base));
    ctx.claim_ports(base, 2, port_handlers("fdc37c669", &config))?;
    let fdc = claim_fdc(ctx, base)?;

    Ok(Box::new(Fdc37c669 { config, fdc }))
}

pub static FDC37C669: DeviceDescriptor = DeviceDescriptor {
    name: "SMC FDC37C669 Super I/O",
    internal_name: "fdc37c669",
    slot: DeviceSlot::SuperIo,
    init: fdc37c669_init,
};

/// C&T 82C710 configuration latches. The chip is programmed by writing the
/// unlock sequence to 0x2FA and 0x3FA, after which the BIOS pokes its
/// configuration through the same two ports.
#[derive(Default)]
pub struct F82c710 {
    pub latches: [u8; 2],
}

impl Peripheral for F82c710 {
    fn port_in(&mut self, port: u16) -> u8 {
        match port {
            0x2FA => self.latches[0],
            0x3FA => self.latches[1],
            _ => 0xFF,
        }
    }

    fn port_out(&mut self, val: u8, port: u16) {
        match port {
            0x2FA => self.latches[0] = val,
            0x3FA => self.latches[1] = val,
            _ => {}
        }
    }

    fn reset(&mut self) {
        self.latches = [0; 2];
    }
}

fn f82c710_init(ctx: &mut DeviceContext<'_>) -> Result<Box<dyn Device>, FaultCause> {
    let upc = shared(F82c710::default());

    ctx.claim_ports(0x2FA, 1, port_handlers("f82c710", &upc))?;
    ctx.claim_ports(0x3FA, 1, port_handlers("f82c710", &upc))?;

    Ok(PeripheralDevice::boxed(upc))
}

pub static F82C710: DeviceDescriptor = DeviceDescriptor {
    name: "C&T 82C710 Universal Peripheral Controller",
    internal_name: "f82c710",
    slot: DeviceSlot::SuperIo,
    init: f82c710_init,
};
