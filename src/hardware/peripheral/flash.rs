use super::{lock, shared, Shared};
use crate::hardware::device::{Device, DeviceContext, DeviceDescriptor, DeviceSlot, FaultCause};

pub const FLASH_BASE: u32 = 0xE0000;
pub const FLASH_SIZE: u32 = 0x20000;

const SST_MANUFACTURER: u8 = 0xBF;
const SST_29EE010: u8 = 0x07;
const PAGE_SIZE: usize = 128;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum CommandState {
    Read,
    Unlock1,
    Unlock2,
    Identify,
    PageWrite,
}

/// SST 29EE010 1 Mbit page-write flash holding the BIOS. Starts out as a
/// copy of whatever image was mapped at its window.
pub struct Sst29ee010 {
    data: Vec<u8>,
    state: CommandState,
    page: Option<usize>,
}

impl Sst29ee010 {
    pub fn new(contents: &[u8]) -> Self {
        Self {
            data: contents.to_vec(),
            state: CommandState::Read,
            page: None,
        }
    }

    // Offsets wrap around the chip. An empty chip has no cells at all.
    fn wrap(&self, offset: u32) -> Option<usize> {
        (offset as usize).checked_rem(self.data.len())
    }

    pub fn read(&self, offset: u32) -> u8 {
        let Some(offset) = self.wrap(offset) else {
            return 0xFF;
        };
        match (self.state, offset & 1) {
            (CommandState::Identify, 0) => SST_MANUFACTURER,
            (CommandState::Identify, _) => SST_29EE010,
            _ => self.data[offset],
        }
    }

    pub fn write(&mut self, offset: u32, val: u8) {
        let Some(offset) = self.wrap(offset) else {
            return;
        };

        if self.state == CommandState::PageWrite {
            // Every byte of the write must land in the page latched first
            let page = *self.page.get_or_insert(offset / PAGE_SIZE);
            if offset / PAGE_SIZE == page {
                self.data[offset] = val;
                return;
            }
            self.state = CommandState::Read;
            self.page = None;
        }

        self.state = match (self.state, offset & 0x7FFF, val) {
            (_, _, 0xF0) => CommandState::Read,
            (CommandState::Read | CommandState::Identify, 0x5555, 0xAA) => CommandState::Unlock1,
            (CommandState::Unlock1, 0x2AAA, 0x55) => CommandState::Unlock2,
            (CommandState::Unlock2, 0x5555, 0x90) => CommandState::Identify,
            (CommandState::Unlock2, 0x5555, 0xA0) => CommandState::PageWrite,
            (CommandState::Identify, _, _) => CommandState::Identify,
            _ => CommandState::Read,
        };
    }

    /// Ends a page write, which the chip does on its own after a short
    /// idle period.
    pub fn commit(&mut self) {
        if self.state == CommandState::PageWrite {
            self.state = CommandState::Read;
            self.page = None;
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

pub struct FlashDevice {
    pub flash: Shared<Sst29ee010>,
}

impl Device for FlashDevice {
    fn reset(&mut self) {
        lock(&self.flash).commit();
    }
}

fn sst_flash_29ee010_init(ctx: &mut DeviceContext<'_>) -> Result<Box<dyn Device>, FaultCause> {
    ctx.claim_memory(FLASH_BASE, FLASH_SIZE)?;

    let contents = ctx
        .platform
        .memory
        .slice(FLASH_BASE, FLASH_SIZE as usize)
        .unwrap_or_default();
    let flash = shared(Sst29ee010::new(contents));

    Ok(Box::new(FlashDevice { flash }))
}

pub static SST_FLASH_29EE010: DeviceDescriptor = DeviceDescriptor {
    name: "SST 29EE010 Flash BIOS",
    internal_name: "sst_flash_29ee010",
    slot: DeviceSlot::Flash,
    init: sst_flash_29ee010_init,
};
