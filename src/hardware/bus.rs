use std::fmt;

use log::debug;

use super::rom::RomImage;

/// Size of the real-mode address space the BIOS lives in.
pub const ADDRESS_SPACE: usize = 0x100000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionHandle(u32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionConflictError {
    OutOfRange {
        name: &'static str,
        base: u32,
        size: u32,
    },
    Overlap {
        name: &'static str,
        base: u32,
        size: u32,
        other: &'static str,
        other_base: u32,
        other_size: u32,
    },
}

impl fmt::Display for RegionConflictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { name, base, size } => write!(
                f,
                "memory region {name} [{base:05X}..{:05X}) is outside the address space",
                *base as u64 + *size as u64
            ),
            Self::Overlap {
                name,
                base,
                size,
                other,
                other_base,
                other_size,
            } => write!(
                f,
                "memory region {name} [{base:05X}..{:05X}) overlaps {other} [{other_base:05X}..{:05X})",
                base + size,
                other_base + other_size
            ),
        }
    }
}

impl std::error::Error for RegionConflictError {}

struct Region {
    handle: RegionHandle,
    name: &'static str,
    base: u32,
    size: u32,
}

impl Region {
    fn end(&self) -> u32 {
        self.base + self.size
    }
}

/// Emulated address space plus the memory-mapped regions devices have claimed.
pub struct MemoryMap {
    pub memory: Vec<u8>,

    regions: Vec<Region>,
    next_region: u32,
}

impl MemoryMap {
    pub fn new() -> Self {
        MemoryMap {
            memory: vec![0x00; ADDRESS_SPACE],

            regions: Vec::new(),
            next_region: 0,
        }
    }

    pub fn read_8(self: &Self, addr: u32) -> u8 {
        self.memory[addr as usize % ADDRESS_SPACE]
    }

    pub fn read_16(self: &Self, addr: u32) -> u16 {
        u16::from_le_bytes([self.read_8(addr), self.read_8(addr + 1)])
    }

    pub fn write_8(self: &mut Self, addr: u32, val: u8) {
        self.memory[addr as usize % ADDRESS_SPACE] = val;
    }

    /// `None` if the range runs past the end of the address space.
    pub fn slice(&self, base: u32, len: usize) -> Option<&[u8]> {
        let end = (base as usize).checked_add(len)?;
        self.memory.get(base as usize..end)
    }

    /// Copy a staged ROM image into the address space.
    pub fn map_rom(&mut self, image: &RomImage) {
        let base = image.base() as usize;
        self.memory[base..base + image.len()].copy_from_slice(image.data());

        debug!(
            "Mapped ROM image at {:05X}..{:05X}",
            base,
            base + image.len()
        );
    }

    pub fn claim(
        &mut self,
        name: &'static str,
        base: u32,
        size: u32,
    ) -> Result<RegionHandle, RegionConflictError> {
        if size == 0 || base as u64 + size as u64 > ADDRESS_SPACE as u64 {
            return Err(RegionConflictError::OutOfRange { name, base, size });
        }

        let end = base + size;
        if let Some(other) = self
            .regions
            .iter()
            .find(|r| base < r.end() && r.base < end)
        {
            return Err(RegionConflictError::Overlap {
                name,
                base,
                size,
                other: other.name,
                other_base: other.base,
                other_size: other.size,
            });
        }

        let handle = RegionHandle(self.next_region);
        self.next_region += 1;
        self.regions.push(Region {
            handle,
            name,
            base,
            size,
        });

        debug!("{name} claimed memory {base:05X}..{end:05X}");
        Ok(handle)
    }

    pub fn release(&mut self, handle: RegionHandle) -> bool {
        match self.regions.iter().position(|r| r.handle == handle) {
            Some(idx) => {
                let region = self.regions.remove(idx);
                debug!(
                    "{} released memory {:05X}..{:05X}",
                    region.name,
                    region.base,
                    region.end()
                );
                true
            }
            None => false,
        }
    }

    /// Name of the device region covering `addr`, if any.
    pub fn owner_of(&self, addr: u32) -> Option<&'static str> {
        self.regions
            .iter()
            .find(|r| addr >= r.base && addr < r.end())
            .map(|r| r.name)
    }

    pub fn regions(&self) -> impl Iterator<Item = (&'static str, u32, u32)> + '_ {
        self.regions.iter().map(|r| (r.name, r.base, r.size))
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }
}

impl Default for MemoryMap {
    fn default() -> Self {
        MemoryMap::new()
    }
}
