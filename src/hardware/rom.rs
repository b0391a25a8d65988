//! Firmware image loading.
//!
//! Images are read from a ROM asset root into a staged [`RomImage`] first and
//! only then copied into the [`MemoryMap`], so a missing or short file never
//! leaves a half-written BIOS behind.

use std::fmt;
use std::io;
use std::path::PathBuf;

use log::{debug, info};

use super::bus::{MemoryMap, ADDRESS_SPACE};

#[derive(Debug)]
pub enum RomLoadError {
    /// The file exists but could not be read.
    Io { file: PathBuf, source: io::Error },

    MissingFile(PathBuf),

    /// The file holds fewer than `skip + size` bytes.
    Truncated {
        file: PathBuf,
        expected: usize,
        actual: usize,
    },

    /// The image is empty or would not fit in the address space.
    OutOfRange { base: u32, size: usize },
}

impl fmt::Display for RomLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { file, source } => write!(f, "ROM {}: {source}", file.display()),
            Self::MissingFile(file) => write!(f, "missing ROM file: {}", file.display()),
            Self::Truncated {
                file,
                expected,
                actual,
            } => write!(
                f,
                "ROM {}: expected at least {expected} bytes, got {actual}",
                file.display()
            ),
            Self::OutOfRange { base, size } => write!(
                f,
                "ROM image of {size} bytes at {base:05X} does not fit the address space"
            ),
        }
    }
}

impl std::error::Error for RomLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RomLayout {
    Linear(&'static str),

    /// Even bytes come from `even`, odd bytes from `odd`.
    Interleaved {
        even: &'static str,
        odd: &'static str,
    },
}

/// Where one firmware image comes from and where it lands.
///
/// For interleaved layouts `size` is the number of bytes taken from each chip,
/// so the mapped image is twice as large.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RomImageSpec {
    pub layout: RomLayout,
    pub base: u32,
    pub size: usize,
    pub skip: usize,
}

impl RomImageSpec {
    pub const fn linear(path: &'static str, base: u32, size: usize, skip: usize) -> Self {
        Self {
            layout: RomLayout::Linear(path),
            base,
            size,
            skip,
        }
    }

    pub const fn interleaved(
        even: &'static str,
        odd: &'static str,
        base: u32,
        size: usize,
        skip: usize,
    ) -> Self {
        Self {
            layout: RomLayout::Interleaved { even, odd },
            base,
            size,
            skip,
        }
    }

    pub fn mapped_size(&self) -> usize {
        match self.layout {
            RomLayout::Linear(_) => self.size,
            RomLayout::Interleaved { .. } => self.size * 2,
        }
    }

    pub fn files(&self) -> Vec<&'static str> {
        match self.layout {
            RomLayout::Linear(path) => vec![path],
            RomLayout::Interleaved { even, odd } => vec![even, odd],
        }
    }
}

/// Firmware of a machine model: the BIOS proper plus an optional second
/// region (e.g. a setup utility) mapped after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RomSpec {
    pub primary: RomImageSpec,
    pub aux: Option<RomImageSpec>,
}

impl RomSpec {
    pub const fn new(primary: RomImageSpec) -> Self {
        Self { primary, aux: None }
    }

    pub const fn with_aux(primary: RomImageSpec, aux: RomImageSpec) -> Self {
        Self {
            primary,
            aux: Some(aux),
        }
    }
}

/// A firmware image read from disk, not yet mapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomImage {
    base: u32,
    data: Vec<u8>,
}

impl RomImage {
    fn new(base: u32, data: Vec<u8>) -> Result<Self, RomLoadError> {
        check_range(base, data.len())?;
        Ok(Self { base, data })
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

fn check_range(base: u32, size: usize) -> Result<(), RomLoadError> {
    if size == 0 || base as usize + size > ADDRESS_SPACE {
        return Err(RomLoadError::OutOfRange { base, size });
    }
    Ok(())
}

pub struct RomLoader {
    root: PathBuf,
}

impl RomLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    /// Read `size` bytes of one chip starting at `skip`.
    fn read_chip(&self, path: &str, size: usize, skip: usize) -> Result<Vec<u8>, RomLoadError> {
        let file = self.resolve(path);
        let mut data = match std::fs::read(&file) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(RomLoadError::MissingFile(file))
            }
            Err(source) => return Err(RomLoadError::Io { file, source }),
        };

        let end = match skip.checked_add(size) {
            Some(end) if end <= data.len() => end,
            end => {
                return Err(RomLoadError::Truncated {
                    file,
                    expected: end.unwrap_or(usize::MAX),
                    actual: data.len(),
                })
            }
        };

        data.truncate(end);
        data.drain(..skip);
        Ok(data)
    }

    pub fn read_linear(
        &self,
        path: &str,
        base: u32,
        size: usize,
        skip: usize,
    ) -> Result<RomImage, RomLoadError> {
        check_range(base, size)?;
        let data = self.read_chip(path, size, skip)?;

        debug!("Read {size} bytes from {path} (skip {skip:#X})");
        RomImage::new(base, data)
    }

    pub fn read_interleaved(
        &self,
        path_even: &str,
        path_odd: &str,
        base: u32,
        size: usize,
        skip: usize,
    ) -> Result<RomImage, RomLoadError> {
        check_range(base, size * 2)?;
        let even = self.read_chip(path_even, size, skip)?;
        let odd = self.read_chip(path_odd, size, skip)?;

        let data = even
            .iter()
            .zip(odd.iter())
            .flat_map(|(&e, &o)| [e, o])
            .collect();

        debug!("Read {size} bytes each from {path_even} and {path_odd} (skip {skip:#X})");
        RomImage::new(base, data)
    }

    pub fn read(&self, spec: &RomImageSpec) -> Result<RomImage, RomLoadError> {
        match spec.layout {
            RomLayout::Linear(path) => self.read_linear(path, spec.base, spec.size, spec.skip),
            RomLayout::Interleaved { even, odd } => {
                self.read_interleaved(even, odd, spec.base, spec.size, spec.skip)
            }
        }
    }

    pub fn load_linear(
        &self,
        memory: &mut MemoryMap,
        path: &str,
        base: u32,
        size: usize,
        skip: usize,
    ) -> Result<(), RomLoadError> {
        let image = self.read_linear(path, base, size, skip)?;
        memory.map_rom(&image);

        info!("Loaded BIOS {path} at {base:05X}");
        Ok(())
    }

    pub fn load_interleaved(
        &self,
        memory: &mut MemoryMap,
        path_even: &str,
        path_odd: &str,
        base: u32,
        size: usize,
        skip: usize,
    ) -> Result<(), RomLoadError> {
        let image = self.read_interleaved(path_even, path_odd, base, size, skip)?;
        memory.map_rom(&image);

        info!("Loaded interleaved BIOS {path_even} + {path_odd} at {base:05X}");
        Ok(())
    }

    /// Load a second, disjoint region such as a setup utility ROM. It may land
    /// on top of part of the primary image.
    pub fn load_aux_linear(
        &self,
        memory: &mut MemoryMap,
        path: &str,
        base: u32,
        size: usize,
        skip: usize,
    ) -> Result<(), RomLoadError> {
        let image = self.read_linear(path, base, size, skip)?;
        memory.map_rom(&image);

        info!("Loaded auxiliary ROM {path} at {base:05X}");
        Ok(())
    }
}
