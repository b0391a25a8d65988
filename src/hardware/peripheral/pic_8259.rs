use super::Peripheral;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EOIMode {
    AutoEOI,
    NormalEOI,
}

/// Programming state of one 8259A. Interrupt delivery belongs to the CPU
/// core, this only keeps what the BIOS writes and reads back.
pub struct PIC8259 {
    pub isr: u8,
    pub imr: u8,
    pub irr: u8,

    icw_step: usize,
    icw_4_needed: bool,
    single: bool,

    pub interrupt_vector: u8,
    pub eoi_mode: EOIMode,

    read_isr: bool,
}

impl PIC8259 {
    pub fn new() -> Self {
        Self {
            isr: 0,    // In-Service Register
            imr: 0xFF, // Interrupt Mask Register
            irr: 0,    // Interrupt Request Register

            icw_step: 0,
            icw_4_needed: false,
            single: false,

            interrupt_vector: 0,
            eoi_mode: EOIMode::NormalEOI,

            read_isr: false,
        }
    }

    fn next_icw_step(&mut self) {
        match self.icw_step {
            1 => {
                self.icw_step = if self.single { 3 } else { 2 };
                if self.single && !self.icw_4_needed {
                    self.icw_step = 0;
                }
            }
            2 => {
                self.icw_step = if self.icw_4_needed { 3 } else { 0 };
            }
            3 => self.icw_step = 0,
            _ => {}
        }
    }

    fn non_specific_eoi(&mut self) {
        // Lowest set bit is the highest priority with fixed priorities
        if self.isr != 0 {
            self.isr &= self.isr - 1;
        }
    }
}

impl Default for PIC8259 {
    fn default() -> Self {
        PIC8259::new()
    }
}

impl Peripheral for PIC8259 {
    fn port_in(&mut self, port: u16) -> u8 {
        if port & 1 == 0 {
            if self.read_isr {
                self.isr
            } else {
                self.irr
            }
        } else {
            self.imr
        }
    }

    fn port_out(&mut self, val: u8, port: u16) {
        if port & 1 == 0 {
            if val & 0b00010000 != 0 {
                // ICW1
                self.icw_4_needed = val & 0b00000001 != 0;
                self.single = val & 0b00000010 != 0;
                self.icw_step = 1;

                self.imr = 0;
                self.isr = 0;
                self.read_isr = false;
            } else if val & 0b00011000 == 0 {
                // OCW2
                match val & 0b11100000 {
                    0b00100000 => self.non_specific_eoi(),
                    0b01100000 => self.isr &= !(1 << (val & 0b00000111)),
                    _ => {}
                }
            } else if val & 0b10011000 == 0b00001000 && val & 0b00000010 != 0 {
                // OCW3
                self.read_isr = val & 0b00000001 != 0;
            }
        } else {
            match self.icw_step {
                1 => self.interrupt_vector = val & 0b11111000,
                2 => { /* ICW3, cascade wiring is fixed on the AT */ }
                3 => {
                    self.eoi_mode = if val & 0b00000010 != 0 {
                        EOIMode::AutoEOI
                    } else {
                        EOIMode::NormalEOI
                    };
                }
                _ => self.imr = val,
            }

            self.next_icw_step();
        }
    }

    fn reset(&mut self) {
        *self = PIC8259::new();
    }
}
