use std::collections::VecDeque;

use super::{port_handlers, shared, Peripheral, PeripheralDevice, Shared};
use crate::hardware::device::{Device, DeviceContext, DeviceDescriptor, DeviceSlot, FaultCause};
use crate::hardware::io::PortConflictError;

pub const FDC_PRIMARY: u16 = 0x3F0;
pub const FDC_SECONDARY: u16 = 0x370;

const MSR_RQM: u8 = 0b10000000;
const MSR_DIO: u8 = 0b01000000;
const MSR_BUSY: u8 = 0b00010000;

const ST0_INVALID: u8 = 0x80;
const ST0_SEEK_END: u8 = 0x20;
const ST0_READY_CHANGED: u8 = 0xC0;

pub struct FloppyDiskController {
    base: u16,

    dor_register: u8,
    status_register: u8,
    pub data_rate: u8,

    command: Vec<u8>,
    result: VecDeque<u8>,

    pcn: [u8; 4],
    interrupts: VecDeque<(u8, u8)>,

    pub specify: [u8; 2],
}

impl FloppyDiskController {
    pub fn new(base: u16) -> Self {
        Self {
            base,

            dor_register: 0,
            status_register: 0,
            data_rate: 0,

            command: Vec::with_capacity(9),
            result: VecDeque::with_capacity(7),

            pcn: [0; 4],
            interrupts: VecDeque::new(),

            specify: [0; 2],
        }
    }

    pub fn base(&self) -> u16 {
        self.base
    }

    fn is_enabled(&self) -> bool {
        self.dor_register & 0b00000100 != 0
    }

    pub fn get_selected_drive(&self) -> usize {
        (self.dor_register & 0b00000011) as usize
    }

    pub fn is_dma_irq_mode(&self) -> bool {
        self.dor_register & 0b00001000 != 0
    }

    pub fn is_motor_started(&self, drive: u8) -> bool {
        self.dor_register & (0b00010000 << drive) != 0
    }

    fn write_dor(&mut self, val: u8) {
        let was_enabled = self.is_enabled();
        self.dor_register = val;

        if !self.is_enabled() {
            self.status_register = 0;
            self.command.clear();
            self.result.clear();
        } else if !was_enabled {
            // Leaving reset raises one ready-changed interrupt per drive
            self.status_register = MSR_RQM;
            self.interrupts = (0..4).map(|d| (ST0_READY_CHANGED | d, 0)).collect();
        }
    }

    fn update_status(&mut self) {
        self.status_register = if self.result.is_empty() {
            if self.command.is_empty() {
                MSR_RQM
            } else {
                MSR_RQM | MSR_BUSY
            }
        } else {
            MSR_RQM | MSR_DIO | MSR_BUSY
        };
    }

    // Total length of a command, opcode included
    fn command_len(opcode: u8) -> usize {
        match opcode & 0x1F {
            0x03 => 3,
            0x04 => 2,
            0x07 => 2,
            0x08 => 1,
            0x0F => 3,
            0x10 => 1,
            _ => 1,
        }
    }

    fn execute(&mut self) {
        let cmd = std::mem::take(&mut self.command);
        let drive = cmd.get(1).map(|d| d & 0b11).unwrap_or(0);

        match cmd[0] & 0x1F {
            // Specify: step rate and head timings, no result phase
            0x03 => self.specify = [cmd[1], cmd[2]],
            // Sense drive status
            0x04 => {
                let track0 = if self.pcn[drive as usize] == 0 { 0x10 } else { 0 };
                self.result.push_back(0x28 | track0 | (cmd[1] & 0b111));
            }
            // Recalibrate
            0x07 => {
                self.pcn[drive as usize] = 0;
                self.interrupts.push_back((ST0_SEEK_END | drive, 0));
            }
            // Sense interrupt status
            0x08 => match self.interrupts.pop_front() {
                Some((st0, pcn)) => {
                    self.result.push_back(st0);
                    self.result.push_back(pcn);
                }
                None => self.result.push_back(ST0_INVALID),
            },
            // Seek
            0x0F => {
                self.pcn[drive as usize] = cmd[2];
                self.interrupts.push_back((ST0_SEEK_END | drive, cmd[2]));
            }
            // Version: plain uPD765A
            0x10 => self.result.push_back(0x80),
            _ => self.result.push_back(ST0_INVALID),
        }
    }

    fn write_data(&mut self, val: u8) {
        if !self.is_enabled() || !self.result.is_empty() {
            return;
        }

        self.command.push(val);
        if self.command.len() >= Self::command_len(self.command[0]) {
            self.execute();
        }
        self.update_status();
    }

    fn read_data(&mut self) -> u8 {
        let val = self.result.pop_front().unwrap_or(0xFF);
        if self.is_enabled() {
            self.update_status();
        }
        val
    }
}

impl Peripheral for FloppyDiskController {
    fn port_in(&mut self, port: u16) -> u8 {
        match port.wrapping_sub(self.base) {
            2 => self.dor_register,
            4 => self.status_register,
            5 => self.read_data(),
            // No disk change
            7 => 0x00,
            _ => 0xFF,
        }
    }

    fn port_out(&mut self, val: u8, port: u16) {
        match port.wrapping_sub(self.base) {
            2 => self.write_dor(val),
            5 => self.write_data(val),
            7 => self.data_rate = val & 0b11,
            _ => {}
        }
    }

    fn reset(&mut self) {
        *self = FloppyDiskController::new(self.base);
    }
}

/// Build a controller at `base` and claim its ports. 0x3F6 is left alone,
/// it belongs to the hard disk controller.
pub fn claim_fdc(
    ctx: &mut DeviceContext<'_>,
    base: u16,
) -> Result<Shared<FloppyDiskController>, PortConflictError> {
    let fdc = shared(FloppyDiskController::new(base));

    ctx.claim_ports(base + 2, 4, port_handlers("fdc", &fdc))?;
    ctx.claim_ports(base + 7, 1, port_handlers("fdc dir", &fdc))?;

    Ok(fdc)
}

fn fdc_at_init(ctx: &mut DeviceContext<'_>) -> Result<Box<dyn Device>, FaultCause> {
    let fdc = claim_fdc(ctx, FDC_PRIMARY)?;
    Ok(PeripheralDevice::boxed(fdc))
}

pub static FDC_AT: DeviceDescriptor = DeviceDescriptor {
    name: "PC/AT Floppy Drive Controller",
    internal_name: "fdc_at",
    slot: DeviceSlot::FloppyController,
    init: fdc_at_init,
};
