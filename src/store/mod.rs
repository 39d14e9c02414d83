//! Local persistence — secure key-value storage for session data.

pub mod file;
pub mod keys;
pub mod memory;
pub mod storage;
pub mod traits;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use storage::{SavedCredentials, Storage};
pub use traits::SecureStore;
