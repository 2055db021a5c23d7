//! IP cache implementations

pub mod file;
pub mod memory;

pub use file::FileIpCache;
pub use memory::MemoryIpCache;
