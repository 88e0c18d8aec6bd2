pub mod disk;
pub mod environment;
pub mod fs;
pub mod shell;

pub use disk::{BlockDevice, FileDisk, MemoryDisk};
pub use fs::{error::FileSystemError, FileSystem};
