// Olivetti M290 mainboard DIP switch bank, read at port 0x69 (off = 1)
pub const SW_PORT_M290: u16 = 0x69;

// SW1-SW2, always off
pub const SW_ALWAYS_OFF: u8 = 0b00000011;
// SW3-SW4 off: OCG/CGA display adapter, on: anything else
pub const SW_DISPLAY_CGA: u8 = 0b00001100;
pub const SW_DISPLAY_OTHER: u8 = 0b00000000;

pub fn m290_switches(cga: bool) -> u8 {
    let display = if cga { SW_DISPLAY_CGA } else { SW_DISPLAY_OTHER };
    SW_ALWAYS_OFF | display
}
