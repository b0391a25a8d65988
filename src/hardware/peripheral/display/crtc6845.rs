//! Motorola 6845 CRT controller register file.

const REG_COUNT: usize = 18;

const R_START_ADDR_H: usize = 12;
const R_START_ADDR_L: usize = 13;
const R_CURSOR_H: usize = 14;
const R_CURSOR_L: usize = 15;

// Bits a write keeps, per register. R16/R17 (light pen) are read-only.
const WRITE_MASK: [u8; REG_COUNT] = [
    0xFF, 0xFF, 0xFF, 0xFF, // horizontal timing
    0x7F, 0x1F, 0x7F, 0x7F, // vertical timing
    0x03, 0x1F, // interlace, max scan line
    0x7F, 0x1F, // cursor start/end
    0x3F, 0xFF, // start address
    0x3F, 0xFF, // cursor address
    0x00, 0x00,
];

#[derive(Default, Clone)]
pub struct CRTC6845 {
    regs: [u8; REG_COUNT],
    pub addr_reg: u8,

    // Bits 0 and 3 of the status port, flipped on every poll
    retrace: u8,
}

impl CRTC6845 {
    pub fn write_reg(&mut self, reg: u8, val: u8) {
        if let Some(mask) = WRITE_MASK.get(reg as usize) {
            self.regs[reg as usize] = val & mask;
        }
    }

    /// Only the cursor and light pen registers can be read back.
    pub fn read_reg(&self, reg: u8) -> u8 {
        match reg as usize {
            r @ R_CURSOR_H..=17 => self.regs[r],
            _ => 0,
        }
    }

    /// Index register at even ports, selected register at odd ones.
    pub fn port_in(&self, port: u16) -> u8 {
        match port & 1 {
            0 => self.addr_reg,
            _ => self.read_reg(self.addr_reg),
        }
    }

    pub fn port_out(&mut self, val: u8, port: u16) {
        match port & 1 {
            0 => self.addr_reg = val & 0x1F,
            _ => self.write_reg(self.addr_reg, val),
        }
    }

    pub fn poll_status(&mut self) -> u8 {
        self.retrace ^= 0b00001001;
        self.retrace
    }

    pub fn start_address(&self) -> u16 {
        u16::from_be_bytes([self.regs[R_START_ADDR_H], self.regs[R_START_ADDR_L]])
    }

    pub fn cursor_address(&self) -> u16 {
        u16::from_be_bytes([self.regs[R_CURSOR_H], self.regs[R_CURSOR_L]])
    }
}
