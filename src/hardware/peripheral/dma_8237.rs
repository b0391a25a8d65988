use super::Peripheral;

#[derive(Default, Clone, Copy)]
struct Channel {
    addr: u16,
    length: u16,
    mode: u8,
}

/// One 8237A. The AT has two: DMA1 with byte-spaced registers at 0x00 and
/// DMA2 with word-spaced registers at 0xC0.
pub struct DMA8237 {
    channels: [Channel; 4],
    base: u16,
    shift: u16,

    // false = next access is the low byte
    flip_flop: bool,
    pub mask: u8,
    command: u8,
}

impl DMA8237 {
    pub fn new(base: u16, shift: u16) -> Self {
        DMA8237 {
            channels: [Channel::default(); 4],
            base,
            shift,

            flip_flop: false,
            mask: 0x0F,
            command: 0,
        }
    }

    pub fn channel_addr(&self, channel: usize) -> Option<u16> {
        self.channels.get(channel).map(|c| c.addr)
    }

    pub fn channel_length(&self, channel: usize) -> Option<u16> {
        self.channels.get(channel).map(|c| c.length)
    }

    fn register(&self, port: u16) -> u16 {
        (port.wrapping_sub(self.base) >> self.shift) & 0x0F
    }

    fn write(&mut self, val: u8, channel: usize, opt: u16) {
        let reg = if opt == 0 {
            &mut self.channels[channel].addr
        } else {
            &mut self.channels[channel].length
        };

        if !self.flip_flop {
            *reg = (*reg & 0xFF00) | val as u16;
        } else {
            *reg = (*reg & 0x00FF) | ((val as u16) << 8);
        }

        self.flip_flop = !self.flip_flop;
    }

    fn read(&mut self, channel: usize, opt: u16) -> u8 {
        let reg = if opt == 0 {
            self.channels[channel].addr
        } else {
            self.channels[channel].length
        };

        let val = if !self.flip_flop { reg as u8 } else { (reg >> 8) as u8 };
        self.flip_flop = !self.flip_flop;
        val
    }

    fn master_clear(&mut self) {
        self.flip_flop = false;
        self.mask = 0x0F;
        self.command = 0;
    }
}

impl Peripheral for DMA8237 {
    fn port_in(&mut self, port: u16) -> u8 {
        let reg = self.register(port);
        match reg {
            0..=7 => self.read((reg >> 1) as usize, reg & 1),
            // Status: nothing ever reaches terminal count here
            8 => 0x00,
            _ => 0xFF,
        }
    }

    fn port_out(&mut self, val: u8, port: u16) {
        let reg = self.register(port);
        match reg {
            0..=7 => self.write(val, (reg >> 1) as usize, reg & 1),
            8 => self.command = val,
            0x0A => {
                let bit = 1 << (val & 0b11);
                if val & 0b100 != 0 {
                    self.mask |= bit;
                } else {
                    self.mask &= !bit;
                }
            }
            0x0B => self.channels[(val & 0b11) as usize].mode = val,
            0x0C => self.flip_flop = false,
            0x0D => self.master_clear(),
            0x0E => self.mask = 0,
            0x0F => self.mask = val & 0x0F,
            _ => {}
        }
    }

    fn reset(&mut self) {
        *self = DMA8237::new(self.base, self.shift);
    }
}

/// Page registers at 0x80-0x8F, supplying address bits above the 8237's 16.
#[derive(Default)]
pub struct DmaPages {
    regs: [u8; 16],
}

impl Peripheral for DmaPages {
    fn port_in(&mut self, port: u16) -> u8 {
        self.regs[(port & 0x0F) as usize]
    }

    fn port_out(&mut self, val: u8, port: u16) {
        self.regs[(port & 0x0F) as usize] = val;
    }

    fn reset(&mut self) {
        self.regs = [0; 16];
    }
}
