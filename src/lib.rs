pub mod config;
pub mod hardware;

pub use config::{GfxCard, SessionConfig};
pub use hardware::machine::{catalog, compose, MachineDescriptor, MachineError};
pub use hardware::peripheral::display::DisplayAdapter;
pub use hardware::sys::Session;
