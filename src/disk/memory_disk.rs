use std::{io::Result, sync::Mutex};

use crate::disk::{
    block_device::{out_of_range, poisoned, BlockDevice},
    types::{Block, BlockReference, BLOCK_SIZE},
};

/// 内存中的虚拟磁盘，不落盘
#[derive(Debug)]
pub struct MemoryDisk {
    blocks: Mutex<Vec<Block>>,
    count: u64,
}

impl MemoryDisk {
    pub fn new(count: u64) -> Self {
        Self {
            blocks: Mutex::new(vec![[0u8; BLOCK_SIZE]; count as usize]),
            count,
        }
    }
}

impl BlockDevice for MemoryDisk {
    fn read_block(&self, block_id: BlockReference, buf: &mut Block) -> Result<()> {
        let blocks = self.blocks.lock().map_err(|_| poisoned())?;
        let block = blocks
            .get(usize::from(block_id))
            .ok_or_else(|| out_of_range(block_id, self.count))?;
        buf.copy_from_slice(block);
        Ok(())
    }

    fn write_block(&self, block_id: BlockReference, buf: &Block) -> Result<()> {
        let mut blocks = self.blocks.lock().map_err(|_| poisoned())?;
        let block = blocks
            .get_mut(usize::from(block_id))
            .ok_or_else(|| out_of_range(block_id, self.count))?;
        block.copy_from_slice(buf);
        Ok(())
    }

    fn block_count(&self) -> u64 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_zeroed_and_keeps_writes() {
        let disk = MemoryDisk::new(4);
        let mut buf = [0xFFu8; BLOCK_SIZE];
        disk.read_block(2, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0));

        buf[7] = 42;
        disk.write_block(2, &buf).unwrap();
        let mut other = [0u8; BLOCK_SIZE];
        disk.read_block(2, &mut other).unwrap();
        assert_eq!(other[7], 42);
    }

    #[test]
    fn out_of_range_is_an_io_error() {
        let disk = MemoryDisk::new(4);
        let buf = [0u8; BLOCK_SIZE];
        assert!(disk.write_block(4, &buf).is_err());
    }
}
