pub mod layout;
mod guest;
mod maps;
mod process;
pub mod scanner;

#[cfg(test)]
pub mod mock;

pub use guest::{GuestMemory, RawMemory};
pub use maps::{MemoryRegion, parse_maps};
pub use process::{DiscoveredProcess, ProcessHandle, ProcessProvider, ProcfsProvider};

#[cfg(test)]
pub use mock::{MockMemory, MockMemoryBuilder};
