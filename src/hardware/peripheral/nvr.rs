use super::Peripheral;

const REG_STATUS_D: usize = 0x0D;

/// MC146818 CMOS RAM behind the index/data pair at 0x70/0x71.
pub struct Nvr {
    ram: [u8; 128],
    index: usize,
    pub nmi_masked: bool,
}

impl Nvr {
    pub fn new() -> Self {
        let mut ram = [0; 128];
        // Battery good
        ram[REG_STATUS_D] = 0x80;

        Self {
            ram,
            index: 0,
            nmi_masked: false,
        }
    }
}

impl Default for Nvr {
    fn default() -> Self {
        Nvr::new()
    }
}

impl Peripheral for Nvr {
    fn port_in(&mut self, port: u16) -> u8 {
        match port & 1 {
            1 => self.ram[self.index],
            _ => 0xFF,
        }
    }

    fn port_out(&mut self, val: u8, port: u16) {
        match port & 1 {
            0 => {
                self.index = (val & 0x7F) as usize;
                self.nmi_masked = val & 0x80 != 0;
            }
            _ => {
                if self.index != REG_STATUS_D {
                    self.ram[self.index] = val;
                }
            }
        }
    }

    // CMOS contents survive a reset
    fn reset(&mut self) {
        self.index = 0;
    }
}
