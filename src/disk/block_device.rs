use std::io::Result;

use crate::disk::types::{Block, BlockReference};

/// 后端存储：按块编号读写定长块
pub trait BlockDevice: Send + Sync {
    fn read_block(&self, block_id: BlockReference, buf: &mut Block) -> Result<()>;
    fn write_block(&self, block_id: BlockReference, buf: &Block) -> Result<()>;
    /// 设备上的块总数
    fn block_count(&self) -> u64;
}

pub(crate) fn out_of_range(block_id: BlockReference, count: u64) -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        format!("block {} out of range (device has {} blocks)", block_id, count),
    )
}

pub(crate) fn poisoned() -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, "block device lock poisoned")
}
