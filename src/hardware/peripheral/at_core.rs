//! Core AT logic every 286/386SX board carries: two PICs, the PIT and
//! system control port, both DMA controllers with their page registers,
//! and the CMOS NVR.

use super::dma_8237::{DmaPages, DMA8237};
use super::nvr::Nvr;
use super::pic_8259::PIC8259;
use super::timer_8253::TIM8253;
use super::{lock, port_handlers, shared, Shared};
use crate::hardware::device::{Device, DeviceContext, DeviceDescriptor, DeviceSlot, FaultCause};

pub static AT_CORE: DeviceDescriptor = DeviceDescriptor {
    name: "AT core logic",
    internal_name: "at_core",
    slot: DeviceSlot::Platform,
    init: at_core_init,
};

pub struct AtCore {
    pub pic: [Shared<PIC8259>; 2],
    pub pit: Shared<TIM8253>,
    pub dma: [Shared<DMA8237>; 2],
    pub pages: Shared<DmaPages>,
    pub nvr: Shared<Nvr>,
}

fn at_core_init(ctx: &mut DeviceContext<'_>) -> Result<Box<dyn Device>, FaultCause> {
    let core = AtCore {
        pic: [shared(PIC8259::new()), shared(PIC8259::new())],
        pit: shared(TIM8253::new()),
        dma: [shared(DMA8237::new(0x00, 0)), shared(DMA8237::new(0xC0, 1))],
        pages: shared(DmaPages::default()),
        nvr: shared(Nvr::new()),
    };

    ctx.claim_ports(0x00, 16, port_handlers("dma1", &core.dma[0]))?;
    ctx.claim_ports(0x20, 2, port_handlers("pic1", &core.pic[0]))?;
    ctx.claim_ports(0x40, 4, port_handlers("pit", &core.pit))?;
    ctx.claim_ports(0x61, 1, port_handlers("system control", &core.pit))?;
    ctx.claim_ports(0x70, 2, port_handlers("nvr", &core.nvr))?;
    ctx.claim_ports(0x80, 16, port_handlers("dma pages", &core.pages))?;
    ctx.claim_ports(0xA0, 2, port_handlers("pic2", &core.pic[1]))?;
    ctx.claim_ports(0xC0, 32, port_handlers("dma2", &core.dma[1]))?;

    Ok(Box::new(core))
}

impl Device for AtCore {
    fn reset(&mut self) {
        use super::Peripheral;

        for pic in &self.pic {
            lock(pic).reset();
        }
        for dma in &self.dma {
            lock(dma).reset();
        }
        lock(&self.pit).reset();
        lock(&self.pages).reset();
        lock(&self.nvr).reset();
    }
}
