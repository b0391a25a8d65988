#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use ibm_at::hardware::rom::RomImageSpec;
use ibm_at::{MachineDescriptor, SessionConfig};
use rand::Rng;

pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| rng.gen()).collect()
}

/// Scratch ROM root under the system temp dir, removed on drop.
pub struct RomDir {
    pub path: PathBuf,
}

impl RomDir {
    pub fn new(tag: &str) -> Self {
        let path = std::env::temp_dir().join(format!("ibm_at_{tag}_{:016x}", rand::random::<u64>()));
        fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    pub fn write(&self, file: &str, data: &[u8]) {
        let file = self.path.join(file);
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(file, data).unwrap();
    }

    pub fn remove(&self, file: &str) {
        fs::remove_file(self.path.join(file)).unwrap();
    }

    pub fn config(&self) -> SessionConfig {
        SessionConfig::builder().set_rom_path(self.path.clone())
    }

    /// Write random contents for every file of `spec`, returning them in
    /// the order of `spec.files()`.
    pub fn install_image(&self, spec: &RomImageSpec) -> Vec<Vec<u8>> {
        spec.files()
            .into_iter()
            .map(|file| {
                let data = random_bytes(spec.skip + spec.size);
                self.write(file, &data);
                data
            })
            .collect()
    }

    pub fn install(&self, machine: &MachineDescriptor) {
        self.install_image(&machine.roms.primary);
        if let Some(aux) = &machine.roms.aux {
            self.install_image(aux);
        }
    }
}

impl Drop for RomDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}
