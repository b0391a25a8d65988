//! Port I/O dispatch.
//!
//! Bindings map a contiguous range of 16-bit ports to up to six handlers, one
//! per access width and direction. Ranges never overlap: registering exactly
//! the same range again replaces the old binding, while a partial overlap is
//! rejected with [`PortConflictError`].
//!
//! Registration takes `&mut IoBus` and dispatch takes `&IoBus`, so the bus can
//! be shared with an emulation thread once setup is done.

use std::fmt;
use std::sync::Arc;

use log::{debug, warn};

/// Read value of an unhandled byte access (floating bus).
pub const FILL_8: u8 = 0xFF;
pub const FILL_16: u16 = 0xFFFF;
pub const FILL_32: u32 = 0xFFFF_FFFF;

pub type ReadFn<T> = Arc<dyn Fn(u16) -> T + Send + Sync>;
pub type WriteFn<T> = Arc<dyn Fn(u16, T) + Send + Sync>;

/// Handler set for one port range. Any handler may be absent.
#[derive(Clone)]
pub struct PortHandlers {
    pub label: &'static str,

    pub read8: Option<ReadFn<u8>>,
    pub write8: Option<WriteFn<u8>>,
    pub read16: Option<ReadFn<u16>>,
    pub write16: Option<WriteFn<u16>>,
    pub read32: Option<ReadFn<u32>>,
    pub write32: Option<WriteFn<u32>>,
}

impl PortHandlers {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            read8: None,
            write8: None,
            read16: None,
            write16: None,
            read32: None,
            write32: None,
        }
    }

    pub fn on_read8(mut self, f: impl Fn(u16) -> u8 + Send + Sync + 'static) -> Self {
        self.read8 = Some(Arc::new(f));
        self
    }

    pub fn on_write8(mut self, f: impl Fn(u16, u8) + Send + Sync + 'static) -> Self {
        self.write8 = Some(Arc::new(f));
        self
    }

    pub fn on_read16(mut self, f: impl Fn(u16) -> u16 + Send + Sync + 'static) -> Self {
        self.read16 = Some(Arc::new(f));
        self
    }

    pub fn on_write16(mut self, f: impl Fn(u16, u16) + Send + Sync + 'static) -> Self {
        self.write16 = Some(Arc::new(f));
        self
    }

    pub fn on_read32(mut self, f: impl Fn(u16) -> u32 + Send + Sync + 'static) -> Self {
        self.read32 = Some(Arc::new(f));
        self
    }

    pub fn on_write32(mut self, f: impl Fn(u16, u32) + Send + Sync + 'static) -> Self {
        self.write32 = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for PortHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortHandlers")
            .field("label", &self.label)
            .field("read8", &self.read8.is_some())
            .field("write8", &self.write8.is_some())
            .field("read16", &self.read16.is_some())
            .field("write16", &self.write16.is_some())
            .field("read32", &self.read32.is_some())
            .field("write32", &self.write32.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingHandle(u32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortConflictError {
    /// Empty range, or one running past port 0xFFFF.
    InvalidRange {
        label: &'static str,
        start: u16,
        count: u16,
    },
    Overlap {
        label: &'static str,
        start: u16,
        count: u16,
        other: &'static str,
        other_start: u16,
        other_count: u16,
    },
}

impl fmt::Display for PortConflictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRange {
                label,
                start,
                count,
            } => write!(
                f,
                "{label}: invalid I/O range of {count} ports at {start:#06X}"
            ),
            Self::Overlap {
                label,
                start,
                count,
                other,
                other_start,
                other_count,
            } => write!(
                f,
                "{label}: I/O ports [{start:#06X}..{:#06X}) overlap {other} [{other_start:#06X}..{:#06X})",
                *start as u32 + *count as u32,
                *other_start as u32 + *other_count as u32
            ),
        }
    }
}

impl std::error::Error for PortConflictError {}

struct Binding {
    handle: BindingHandle,
    start: u16,
    count: u16,
    handlers: PortHandlers,
}

impl Binding {
    fn end(&self) -> u32 {
        self.start as u32 + self.count as u32
    }

    fn contains(&self, port: u16) -> bool {
        port >= self.start && (port as u32) < self.end()
    }
}

#[derive(Default)]
pub struct IoBus {
    // Sorted by start port, never overlapping.
    bindings: Vec<Binding>,
    next_handle: u32,
}

impl IoBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        start: u16,
        count: u16,
        handlers: PortHandlers,
    ) -> Result<BindingHandle, PortConflictError> {
        let label = handlers.label;
        let end = start as u32 + count as u32;
        if count == 0 || end > 0x1_0000 {
            return Err(PortConflictError::InvalidRange {
                label,
                start,
                count,
            });
        }

        let handle = BindingHandle(self.next_handle);
        let idx = self.bindings.partition_point(|b| b.start < start);

        if let Some(existing) = self.bindings.get_mut(idx) {
            if existing.start == start && existing.count == count {
                warn!(
                    "{label} replaces {} on I/O ports {start:#06X}..{end:#06X}",
                    existing.handlers.label
                );
                self.next_handle += 1;
                *existing = Binding {
                    handle,
                    start,
                    count,
                    handlers,
                };
                return Ok(handle);
            }
        }

        let overlapping = idx
            .checked_sub(1)
            .and_then(|prev| self.bindings.get(prev))
            .filter(|prev| prev.end() > start as u32)
            .or_else(|| {
                self.bindings
                    .get(idx)
                    .filter(|next| (next.start as u32) < end)
            });

        if let Some(other) = overlapping {
            return Err(PortConflictError::Overlap {
                label,
                start,
                count,
                other: other.handlers.label,
                other_start: other.start,
                other_count: other.count,
            });
        }

        debug!("{label} registered I/O ports {start:#06X}..{end:#06X}");
        self.next_handle += 1;
        self.bindings.insert(
            idx,
            Binding {
                handle,
                start,
                count,
                handlers,
            },
        );

        Ok(handle)
    }

    /// Remove a binding. Returns false if it was already removed or replaced.
    pub fn unregister(&mut self, handle: BindingHandle) -> bool {
        match self.bindings.iter().position(|b| b.handle == handle) {
            Some(idx) => {
                let binding = self.bindings.remove(idx);
                debug!(
                    "{} released I/O ports {:#06X}..{:#06X}",
                    binding.handlers.label,
                    binding.start,
                    binding.end()
                );
                true
            }
            None => false,
        }
    }

    fn find(&self, port: u16) -> Option<&Binding> {
        let idx = self.bindings.partition_point(|b| b.start <= port);
        let cand = self.bindings.get(idx.checked_sub(1)?)?;
        cand.contains(port).then_some(cand)
    }

    pub fn read8(&self, port: u16) -> u8 {
        match self.find(port).and_then(|b| b.handlers.read8.as_ref()) {
            Some(f) => f(port),
            None => FILL_8,
        }
    }

    pub fn read16(&self, port: u16) -> u16 {
        match self.find(port).and_then(|b| b.handlers.read16.as_ref()) {
            Some(f) => f(port),
            None => FILL_16,
        }
    }

    pub fn read32(&self, port: u16) -> u32 {
        match self.find(port).and_then(|b| b.handlers.read32.as_ref()) {
            Some(f) => f(port),
            None => FILL_32,
        }
    }

    pub fn write8(&self, port: u16, val: u8) {
        if let Some(f) = self.find(port).and_then(|b| b.handlers.write8.as_ref()) {
            f(port, val);
        }
    }

    pub fn write16(&self, port: u16, val: u16) {
        if let Some(f) = self.find(port).and_then(|b| b.handlers.write16.as_ref()) {
            f(port, val);
        }
    }

    pub fn write32(&self, port: u16, val: u32) {
        if let Some(f) = self.find(port).and_then(|b| b.handlers.write32.as_ref()) {
            f(port, val);
        }
    }

    pub fn is_bound(&self, port: u16) -> bool {
        self.find(port).is_some()
    }

    pub fn label_at(&self, port: u16) -> Option<&'static str> {
        self.find(port).map(|b| b.handlers.label)
    }

    /// `(start, count, label)` of every binding, in port order.
    pub fn bindings(&self) -> impl Iterator<Item = (u16, u16, &'static str)> + '_ {
        self.bindings
            .iter()
            .map(|b| (b.start, b.count, b.handlers.label))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
