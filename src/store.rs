mod file;
mod memory;

pub use file::FileSubscriptionStore;
pub use memory::MemorySubscriptionStore;
