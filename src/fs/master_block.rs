use serde::{Deserialize, Serialize};

use crate::{
    disk::{
        types::{empty_block, payload, payload_mut},
        BlockDevice, BlockReference, BLOCK_SIZE, UNALLOCATED_BLOCK,
    },
    fs::{
        config::{FIRST_POOL_BLOCK, MASTER_BLOCK_REFERENCE, ROOT_INODE},
        decode_record, encode_record,
        error::Result,
        inode_bitmap::InodeBitmap,
    },
};

/// 主块（0 号块）：inode 位图 + 空闲块链表的首尾
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterBlock {
    pub inode_bitmap: InodeBitmap,
    pub unallocated_front: BlockReference, // 空闲链表头，下一次分配从这里取
    pub unallocated_end: BlockReference,   // 空闲链表尾，释放的块追加到这里
}

impl MasterBlock {
    /// 格式化时的初始状态：根 inode 已占用，数据区全部空闲
    pub fn new(block_count: u64) -> Self {
        let mut inode_bitmap = InodeBitmap::default();
        inode_bitmap.set(usize::from(ROOT_INODE));
        Self {
            inode_bitmap,
            unallocated_front: FIRST_POOL_BLOCK,
            unallocated_end: (block_count - 1) as BlockReference,
        }
    }

    pub fn free_list_is_empty(&self) -> bool {
        self.unallocated_front == UNALLOCATED_BLOCK
    }

    pub fn load<D: BlockDevice>(disk: &D) -> Result<Self> {
        let mut block = [0u8; BLOCK_SIZE];
        disk.read_block(MASTER_BLOCK_REFERENCE, &mut block)?;
        decode_record(payload(&block))
    }

    pub fn sync<D: BlockDevice>(&self, disk: &D) -> Result<()> {
        let mut block = empty_block();
        encode_record(payload_mut(&mut block), self)?;
        disk.write_block(MASTER_BLOCK_REFERENCE, &block)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::{types::next_block, MemoryDisk};

    #[test]
    fn on_disk_layout_is_bitmap_then_front_then_end() {
        let disk = MemoryDisk::new(128);
        MasterBlock::new(128).sync(&disk).unwrap();

        let mut block = [0u8; BLOCK_SIZE];
        disk.read_block(MASTER_BLOCK_REFERENCE, &mut block).unwrap();
        assert_eq!(next_block(&block), UNALLOCATED_BLOCK);
        // 2 字节块头 + 16 字节位图
        assert_eq!(block[2], 0x80);
        assert!(block[3..18].iter().all(|&b| b == 0));
        assert_eq!(&block[18..20], &FIRST_POOL_BLOCK.to_le_bytes());
        assert_eq!(&block[20..22], &127u16.to_le_bytes());
    }

    #[test]
    fn load_reads_back_what_sync_wrote() {
        let disk = MemoryDisk::new(32);
        let mut master = MasterBlock::new(32);
        master.unallocated_front = 9;
        master.inode_bitmap.set(5);
        master.sync(&disk).unwrap();

        let loaded = MasterBlock::load(&disk).unwrap();
        assert_eq!(loaded, master);
        assert!(loaded.inode_bitmap.is_used(5));
        assert!(!loaded.free_list_is_empty());
    }
}
