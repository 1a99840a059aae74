pub mod filesystem;
pub mod memory;

pub use filesystem::FileSystemBlobSink;
pub use memory::InMemoryBlobSink;
