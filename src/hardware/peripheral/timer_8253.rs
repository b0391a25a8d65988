use super::Peripheral;

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub enum Mode {
    #[default]
    Mode0,
    Mode1,
    Mode2,
    Mode3,
    Mode4,
    Mode5,
}

impl Mode {
    fn from_bits(bits: u8) -> Self {
        match bits & 0b111 {
            0 => Mode::Mode0,
            1 => Mode::Mode1,
            2 | 6 => Mode::Mode2,
            3 | 7 => Mode::Mode3,
            4 => Mode::Mode4,
            _ => Mode::Mode5,
        }
    }
}

/// PIT plus the AT system control port (0x61), which carries the channel 2
/// gate and speaker enable and the refresh toggle the BIOS polls.
#[derive(Default, Clone)]
pub struct TIM8253 {
    reload: [u16; 3],
    latched: [bool; 3],
    latch_val: [u16; 3],
    rl_mode: [u8; 3],
    pub mode: [Mode; 3],

    // true = next access is the low byte
    toggle: [bool; 3],

    pub port_b: u8,
    refresh: bool,
}

impl TIM8253 {
    pub fn new() -> Self {
        Self {
            rl_mode: [3; 3],
            toggle: [true; 3],
            ..Default::default()
        }
    }

    pub fn reload(&self, channel: usize) -> u16 {
        self.reload[channel]
    }

    fn write_control(&mut self, val: u8) {
        let channel = (val >> 6) as usize;
        if channel == 3 {
            return;
        }

        let rl = (val >> 4) & 0b11;
        if rl == 0 {
            self.latched[channel] = true;
            self.latch_val[channel] = self.reload[channel];
            return;
        }

        self.rl_mode[channel] = rl;
        self.mode[channel] = Mode::from_bits(val >> 1);
        self.toggle[channel] = true;
    }

    fn write_counter(&mut self, channel: usize, val: u8) {
        let reload = self.reload[channel];
        self.reload[channel] = match self.rl_mode[channel] {
            1 => val as u16,
            2 => (val as u16) << 8,
            _ => {
                let low_byte = self.toggle[channel];
                self.toggle[channel] = !low_byte;
                if low_byte {
                    (reload & 0xFF00) | val as u16
                } else {
                    (reload & 0x00FF) | ((val as u16) << 8)
                }
            }
        };
    }

    fn read_counter(&mut self, channel: usize) -> u8 {
        let val = if self.latched[channel] {
            self.latch_val[channel]
        } else {
            self.reload[channel]
        };

        match self.rl_mode[channel] {
            1 => {
                self.latched[channel] = false;
                val as u8
            }
            2 => {
                self.latched[channel] = false;
                (val >> 8) as u8
            }
            _ => {
                let low_byte = self.toggle[channel];
                self.toggle[channel] = !low_byte;
                if low_byte {
                    val as u8
                } else {
                    self.latched[channel] = false;
                    (val >> 8) as u8
                }
            }
        }
    }
}

impl Peripheral for TIM8253 {
    fn port_in(&mut self, port: u16) -> u8 {
        match port {
            0x40..=0x42 => self.read_counter((port - 0x40) as usize),
            0x61 => {
                self.refresh = !self.refresh;
                (self.port_b & 0x0F) | ((self.refresh as u8) << 4)
            }
            _ => 0xFF,
        }
    }

    fn port_out(&mut self, val: u8, port: u16) {
        match port {
            0x40..=0x42 => self.write_counter((port - 0x40) as usize, val),
            0x43 => self.write_control(val),
            0x61 => self.port_b = val & 0x0F,
            _ => {}
        }
    }

    fn reset(&mut self) {
        *self = TIM8253::new();
    }
}
