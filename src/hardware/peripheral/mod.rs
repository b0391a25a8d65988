pub mod at_core;
pub mod chipset;
pub mod display;
pub mod dma_8237;
pub mod fdc_necupd765;
pub mod flash;
pub mod ide;
pub mod kbc_at;
pub mod nvr;
pub mod pic_8259;
pub mod super_io;
pub mod timer_8253;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::device::Device;
use super::io::PortHandlers;

/// A device model reached through byte-wide port accesses.
pub trait Peripheral: Send {
    fn port_in(&mut self, port: u16) -> u8;
    fn port_out(&mut self, val: u8, port: u16);

    fn reset(&mut self) {}
}

pub type Shared<P> = Arc<Mutex<P>>;

pub fn shared<P>(p: P) -> Shared<P> {
    Arc::new(Mutex::new(p))
}

/// Lock a peripheral. A handler that panicked mid-access leaves the state
/// usable, so poisoning is ignored.
pub fn lock<P: ?Sized>(p: &Mutex<P>) -> MutexGuard<'_, P> {
    p.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Byte-wide read/write handlers forwarding to a shared peripheral.
pub fn port_handlers<P: Peripheral + 'static>(label: &'static str, dev: &Shared<P>) -> PortHandlers {
    let rd = Arc::clone(dev);
    let wr = Arc::clone(dev);

    PortHandlers::new(label)
        .on_read8(move |port| lock(&rd).port_in(port))
        .on_write8(move |port, val| lock(&wr).port_out(val, port))
}

/// Registry-side owner of a shared peripheral.
pub struct PeripheralDevice<P> {
    pub inner: Shared<P>,
}

impl<P> PeripheralDevice<P> {
    pub fn boxed(inner: Shared<P>) -> Box<Self> {
        Box::new(Self { inner })
    }
}

impl<P: Peripheral + 'static> Device for PeripheralDevice<P> {
    fn reset(&mut self) {
        lock(&self.inner).reset();
    }
}
