pub mod block_device;
pub mod file_disk;
pub mod init;
pub mod memory_disk;
pub mod types;

pub use block_device::BlockDevice;
pub use file_disk::FileDisk;
pub use memory_disk::MemoryDisk;
pub use types::{
    Block, BlockReference, BLOCK_COUNT, BLOCK_HEADER_SIZE, BLOCK_SIZE, DISK_SIZE,
    UNALLOCATED_BLOCK,
};
