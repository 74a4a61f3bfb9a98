pub mod error;
pub mod memory;
pub mod store;
pub mod types;

pub use error::BlobError;
pub use memory::MemoryBlobStore;
pub use store::BlobStore;
pub use types::{BLOB_ID_LEN, Blob, BlobId};
