//! Account and space records plus the storage seam the access-control core reads from.
//!
//! The durable store is an external collaborator; `MemoryStore` is the
//! in-process implementation used by the server binary and the tests.

pub mod error;
pub mod memory;
pub mod model;
pub mod store;

pub use memory::MemoryStore;
pub use store::Store;
