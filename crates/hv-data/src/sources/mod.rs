pub mod memory;

pub use memory::{MemoryDocument, MemoryDocumentBuilder, MemoryObject, Operation, SessionRequest};
