use std::collections::VecDeque;

use super::{port_handlers, shared, Peripheral, PeripheralDevice};
use crate::hardware::device::{Device, DeviceContext, DeviceDescriptor, DeviceSlot, FaultCause};

const STAT_OBF: u8 = 0b00000001;
const STAT_SYS: u8 = 0b00000100;
const STAT_CMD: u8 = 0b00001000;
const STAT_UNLOCKED: u8 = 0b00010000;

const CCB_SYS: u8 = 0b00000100;
const CCB_KBD_DISABLED: u8 = 0b00010000;
const CCB_AUX_DISABLED: u8 = 0b00100000;

const OUT_A20: u8 = 0b00000010;

// Bytes the keyboard side can have queued before it drops new ones
const OUTPUT_DEPTH: usize = 16;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum KbcVariant {
    Ibm,
    Ami,
    Ncr,
    Ps2Quadtel,
    Ps2AmiPci,
}

impl KbcVariant {
    pub fn is_ps2(self) -> bool {
        matches!(self, KbcVariant::Ps2Quadtel | KbcVariant::Ps2AmiPci)
    }

    /// Answer to the 0xA1 "controller version" command, if the firmware has one.
    pub fn version(self) -> Option<u8> {
        match self {
            KbcVariant::Ami => Some(b'F'),
            KbcVariant::Ps2AmiPci => Some(b'H'),
            _ => None,
        }
    }
}

/// 8042 keyboard controller as seen from ports 0x60/0x64.
pub struct KeyboardController {
    pub variant: KbcVariant,

    status: u8,
    pub command_byte: u8,
    pub output_port: u8,
    output: VecDeque<u8>,

    // Controller command waiting for its data byte
    pending: Option<u8>,
}

impl KeyboardController {
    pub fn new(variant: KbcVariant) -> Self {
        Self {
            variant,

            status: STAT_UNLOCKED,
            command_byte: 0,
            output_port: 0xCF,
            output: VecDeque::with_capacity(OUTPUT_DEPTH),

            pending: None,
        }
    }

    pub fn a20_enabled(&self) -> bool {
        self.output_port & OUT_A20 != 0
    }

    fn push(&mut self, val: u8) {
        if self.output.len() < OUTPUT_DEPTH {
            self.output.push_back(val);
        }
    }

    fn command(&mut self, cmd: u8) {
        match cmd {
            0x20 => self.push(self.command_byte),
            0x60 | 0xD1 => self.pending = Some(cmd),
            0xA1 => {
                if let Some(version) = self.variant.version() {
                    self.push(version);
                }
            }
            0xA7 if self.variant.is_ps2() => self.command_byte |= CCB_AUX_DISABLED,
            0xA8 if self.variant.is_ps2() => self.command_byte &= !CCB_AUX_DISABLED,
            0xA9 if self.variant.is_ps2() => self.push(0x00),
            0xAA => {
                self.status |= STAT_SYS;
                self.push(0x55);
            }
            0xAB => self.push(0x00),
            0xAD => self.command_byte |= CCB_KBD_DISABLED,
            0xAE => self.command_byte &= !CCB_KBD_DISABLED,
            0xC0 => self.push(0x80),
            0xD0 => self.push(self.output_port),
            _ => {}
        }
    }

    fn data(&mut self, val: u8) {
        match self.pending.take() {
            Some(0x60) => {
                self.command_byte = val;
                if val & CCB_SYS != 0 {
                    self.status |= STAT_SYS;
                } else {
                    self.status &= !STAT_SYS;
                }
            }
            Some(_) => self.output_port = val,
            None => {
                // Straight to the keyboard, which acknowledges everything
                self.push(0xFA);
                if val == 0xFF {
                    self.push(0xAA);
                }
            }
        }
    }
}

impl Peripheral for KeyboardController {
    fn port_in(&mut self, port: u16) -> u8 {
        match port {
            0x60 => self.output.pop_front().unwrap_or(0x00),
            _ => {
                let obf = if self.output.is_empty() { 0 } else { STAT_OBF };
                self.status | obf
            }
        }
    }

    fn port_out(&mut self, val: u8, port: u16) {
        match port {
            0x60 => {
                self.status &= !STAT_CMD;
                self.data(val);
            }
            _ => {
                self.status |= STAT_CMD;
                self.command(val);
            }
        }
    }

    fn reset(&mut self) {
        *self = KeyboardController::new(self.variant);
    }
}

fn kbc_init(ctx: &mut DeviceContext<'_>, variant: KbcVariant) -> Result<Box<dyn Device>, FaultCause> {
    let kbc = shared(KeyboardController::new(variant));

    ctx.claim_ports(0x60, 1, port_handlers("kbc data", &kbc))?;
    ctx.claim_ports(0x64, 1, port_handlers("kbc status", &kbc))?;

    Ok(PeripheralDevice::boxed(kbc))
}

pub static KEYBOARD_AT: DeviceDescriptor = DeviceDescriptor {
    name: "PC/AT Keyboard",
    internal_name: "keyboard_at",
    slot: DeviceSlot::KeyboardController,
    init: |ctx| kbc_init(ctx, KbcVariant::Ibm),
};

pub static KEYBOARD_AT_AMI: DeviceDescriptor = DeviceDescriptor {
    name: "PC/AT Keyboard (AMI)",
    internal_name: "keyboard_at_ami",
    slot: DeviceSlot::KeyboardController,
    init: |ctx| kbc_init(ctx, KbcVariant::Ami),
};

pub static KEYBOARD_AT_NCR: DeviceDescriptor = DeviceDescriptor {
    name: "PC/AT Keyboard (NCR)",
    internal_name: "keyboard_at_ncr",
    slot: DeviceSlot::KeyboardController,
    init: |ctx| kbc_init(ctx, KbcVariant::Ncr),
};

pub static KEYBOARD_PS2_QUADTEL: DeviceDescriptor = DeviceDescriptor {
    name: "PS/2 Keyboard (Quadtel/MegaPC)",
    internal_name: "keyboard_ps2_quadtel",
    slot: DeviceSlot::KeyboardController,
    init: |ctx| kbc_init(ctx, KbcVariant::Ps2Quadtel),
};

pub static KEYBOARD_PS2_AMI_PCI: DeviceDescriptor = DeviceDescriptor {
    name: "PS/2 Keyboard (AMI)",
    internal_name: "keyboard_ps2_ami_pci",
    slot: DeviceSlot::KeyboardController,
    init: |ctx| kbc_init(ctx, KbcVariant::Ps2AmiPci),
};
