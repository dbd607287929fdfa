// Gateway module for storage - follows the Train Station Pattern
// All external access must go through this gateway

mod file;
mod memory;
mod traits;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use traits::KeyValueStorage;
