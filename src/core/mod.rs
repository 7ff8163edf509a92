//! Core module: bounded buffers, connection pool, static resources
//!
//! Prinsip desain:
//! - Bounded: setiap buffer punya kapasitas tetap dan cek panjang eksplisit
//! - O(1) slot management: free-list, tidak ada scan linear
//! - Zero-Copy read: isi file di-mmap langsung dari page cache

mod buffer;
mod pool;
mod resource;

pub use buffer::{InputBuffer, OutputBuffer};
pub use pool::ConnectionPool;
pub use resource::{DocumentRoot, FileContents, StaticFile};
