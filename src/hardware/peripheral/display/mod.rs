//! Video cards, as far as the rest of the machine sees them: the port
//! ranges and memory windows they claim, and which adapter class is active.

pub mod crtc6845;

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{port_handlers, shared, Peripheral, Shared};
use crate::hardware::device::{Device, DeviceContext, DeviceDescriptor, DeviceSlot, FaultCause};
use crate::hardware::sys::Platform;
use crtc6845::CRTC6845;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayAdapter {
    Mda,
    Hercules,
    Cga,
    Ega,
    Vga,
}

impl DisplayAdapter {
    pub fn is_cga(self) -> bool {
        self == DisplayAdapter::Cga
    }

    pub fn is_mono(self) -> bool {
        matches!(self, DisplayAdapter::Mda | DisplayAdapter::Hercules)
    }

    fn code(self) -> u8 {
        match self {
            DisplayAdapter::Mda => 1,
            DisplayAdapter::Hercules => 2,
            DisplayAdapter::Cga => 3,
            DisplayAdapter::Ega => 4,
            DisplayAdapter::Vga => 5,
        }
    }

    fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(DisplayAdapter::Mda),
            2 => Some(DisplayAdapter::Hercules),
            3 => Some(DisplayAdapter::Cga),
            4 => Some(DisplayAdapter::Ega),
            5 => Some(DisplayAdapter::Vga),
            _ => None,
        }
    }
}

/// Class of the video card currently installed, readable from port handlers
/// that outlive any borrow of the platform.
#[derive(Debug, Clone, Default)]
pub struct ActiveDisplay(Arc<AtomicU8>);

impl ActiveDisplay {
    pub fn get(&self) -> Option<DisplayAdapter> {
        DisplayAdapter::from_code(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, adapter: DisplayAdapter) {
        self.0.store(adapter.code(), Ordering::Release);
    }

    /// Clear the cell only if `adapter` is still the active one.
    pub fn release(&self, adapter: DisplayAdapter) {
        let _ = self
            .0
            .compare_exchange(adapter.code(), 0, Ordering::AcqRel, Ordering::Acquire);
    }

    pub fn is_cga(&self) -> bool {
        self.get().is_some_and(DisplayAdapter::is_cga)
    }
}

/// Register-level view of a card: the CRTC, mode control and, for EGA/VGA
/// class cards, the sequencer and graphics controller.
pub struct VideoCard {
    pub adapter: DisplayAdapter,
    pub crtc: CRTC6845,

    pub mode_control: u8,
    pub color_select: u8,
    pub misc_output: u8,

    seq_index: u8,
    seq: [u8; 8],
    gc_index: u8,
    gc: [u8; 16],
}

impl VideoCard {
    pub fn new(adapter: DisplayAdapter) -> Self {
        Self {
            adapter,
            crtc: CRTC6845::default(),

            mode_control: 0,
            color_select: 0,
            misc_output: if adapter.is_mono() { 0x00 } else { 0x01 },

            seq_index: 0,
            seq: [0; 8],
            gc_index: 0,
            gc: [0; 16],
        }
    }

    fn has_vga_registers(&self) -> bool {
        matches!(self.adapter, DisplayAdapter::Ega | DisplayAdapter::Vga)
    }

    /// 0x3B0 for monochrome addressing, 0x3D0 for colour.
    pub fn crtc_base(&self) -> u16 {
        match self.adapter {
            DisplayAdapter::Mda | DisplayAdapter::Hercules => 0x3B0,
            DisplayAdapter::Cga => 0x3D0,
            _ if self.misc_output & 1 != 0 => 0x3D0,
            _ => 0x3B0,
        }
    }
}

impl Peripheral for VideoCard {
    fn port_in(&mut self, port: u16) -> u8 {
        let base = self.crtc_base();
        match port {
            p if (base..base + 8).contains(&p) => self.crtc.port_in(p),
            p if p == base + 0x0A => self.crtc.poll_status(),
            p if p == base + 0x08 => self.mode_control,
            0x3C4 if self.has_vga_registers() => self.seq_index,
            0x3C5 if self.has_vga_registers() => self.seq[(self.seq_index & 7) as usize],
            0x3CC if self.has_vga_registers() => self.misc_output,
            0x3CE if self.has_vga_registers() => self.gc_index,
            0x3CF if self.has_vga_registers() => self.gc[(self.gc_index & 0x0F) as usize],
            _ => 0xFF,
        }
    }

    fn port_out(&mut self, val: u8, port: u16) {
        let base = self.crtc_base();
        match port {
            p if (base..base + 8).contains(&p) => self.crtc.port_out(val, p),
            p if p == base + 0x08 => self.mode_control = val,
            p if p == base + 0x09 => self.color_select = val,
            0x3C2 if self.has_vga_registers() => self.misc_output = val,
            0x3C4 if self.has_vga_registers() => self.seq_index = val,
            0x3C5 if self.has_vga_registers() => self.seq[(self.seq_index & 7) as usize] = val,
            0x3CE if self.has_vga_registers() => self.gc_index = val,
            0x3CF if self.has_vga_registers() => self.gc[(self.gc_index & 0x0F) as usize] = val,
            _ => {}
        }
    }

    fn reset(&mut self) {
        *self = VideoCard::new(self.adapter);
    }
}

pub struct VideoDevice {
    pub card: Shared<VideoCard>,
}

impl Device for VideoDevice {
    fn reset(&mut self) {
        super::lock(&self.card).reset();
    }

    fn close(&mut self, platform: &mut Platform) {
        let adapter = super::lock(&self.card).adapter;
        platform.display.release(adapter);
    }
}

/// Port range, memory window base and size for a card class.
fn layout(adapter: DisplayAdapter) -> (u16, u16, u32, u32) {
    match adapter {
        DisplayAdapter::Mda => (0x3B0, 16, 0xB0000, 0x8000),
        DisplayAdapter::Hercules => (0x3B0, 16, 0xB0000, 0x10000),
        DisplayAdapter::Cga => (0x3D0, 16, 0xB8000, 0x8000),
        DisplayAdapter::Ega | DisplayAdapter::Vga => (0x3B0, 48, 0xA0000, 0x20000),
    }
}

fn video_init(ctx: &mut DeviceContext<'_>, adapter: DisplayAdapter) -> Result<Box<dyn Device>, FaultCause> {
    let (ports, count, vram, vram_size) = layout(adapter);
    let card = shared(VideoCard::new(adapter));
    let name = ctx.name();

    ctx.claim_ports(ports, count, port_handlers(name, &card))?;
    ctx.claim_memory(vram, vram_size)?;
    ctx.platform.display.set(adapter);

    Ok(Box::new(VideoDevice { card }))
}

macro_rules! video_card {
    ($id:ident, $name:expr, $internal:expr, $adapter:expr) => {
        pub static $id: DeviceDescriptor = DeviceDescriptor {
            name: $name,
            internal_name: $internal,
            slot: DeviceSlot::Video,
            init: |ctx| video_init(ctx, $adapter),
        };
    };
}

// Onboard video of specific motherboards
video_card!(OTI067_AMA932J, "Oak OTI-067 (Allstar AMA-932J)", "oti067_ama932j", DisplayAdapter::Vga);
video_card!(PARADISE_WD90C11_MEGAPC, "Paradise WD90C11 (Amstrad MegaPC)", "paradise_wd90c11_megapc", DisplayAdapter::Vga);
video_card!(GD5402_ONBOARD, "Cirrus Logic GD-5402 (onboard)", "gd5402_onboard", DisplayAdapter::Vga);
video_card!(PARADISE_PVGA1A, "Paradise PVGA1A", "paradise_pvga1a", DisplayAdapter::Vga);

video_card!(MDA, "IBM MDA", "mda", DisplayAdapter::Mda);
video_card!(HERCULES, "Hercules", "hercules", DisplayAdapter::Hercules);
video_card!(CGA, "IBM CGA", "cga", DisplayAdapter::Cga);
video_card!(EGA, "IBM EGA", "ega", DisplayAdapter::Ega);
video_card!(VGA, "IBM VGA", "vga", DisplayAdapter::Vga);

/// Descriptor of the add-in card for an adapter class.
pub fn external_card(adapter: DisplayAdapter) -> &'static DeviceDescriptor {
    match adapter {
        DisplayAdapter::Mda => &MDA,
        DisplayAdapter::Hercules => &HERCULES,
        DisplayAdapter::Cga => &CGA,
        DisplayAdapter::Ega => &EGA,
        DisplayAdapter::Vga => &VGA,
    }
}
