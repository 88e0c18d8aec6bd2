use log::debug;

use crate::{
    disk::{
        types::{empty_block, next_block, set_next_block},
        BlockDevice, BlockReference, UNALLOCATED_BLOCK,
    },
    fs::{
        config::FIRST_POOL_BLOCK,
        error::{FileSystemError, Result},
        master_block::MasterBlock,
        FileSystem,
    },
};

// 空闲块链表：链接存放在每个空闲块自己的 next_block 字段里，
// 首尾保存在主块。分配从表头取，释放追加到表尾（FIFO）。
impl<D: BlockDevice> FileSystem<D> {
    /// 从空闲链表头取出一个块
    pub fn allocate_block(&mut self) -> Result<BlockReference> {
        let mut master = MasterBlock::load(&self.disk)?;
        if master.free_list_is_empty() {
            return Err(FileSystemError::DiskFull);
        }

        let head = master.unallocated_front;
        let block = self.read_block(head)?;
        master.unallocated_front = next_block(&block);
        if master.unallocated_front == UNALLOCATED_BLOCK {
            master.unallocated_end = UNALLOCATED_BLOCK;
        }
        master.sync(&self.disk)?;

        debug!("allocated block {}", head);
        Ok(head)
    }

    /// 把块追加到空闲链表尾部。调用方保证该块当前归自己所有。
    pub fn free_block(&mut self, block_ref: BlockReference) -> Result<()> {
        if block_ref < FIRST_POOL_BLOCK || u64::from(block_ref) >= self.block_count() {
            return Err(FileSystemError::InvalidBlock(block_ref));
        }

        // 先把被释放的块写成链表终点
        self.write_block(block_ref, &empty_block())?;

        let mut master = MasterBlock::load(&self.disk)?;
        if master.free_list_is_empty() {
            master.unallocated_front = block_ref;
        } else {
            let tail = master.unallocated_end;
            let mut block = self.read_block(tail)?;
            set_next_block(&mut block, block_ref);
            self.write_block(tail, &block)?;
        }
        master.unallocated_end = block_ref;
        master.sync(&self.disk)?;

        debug!("freed block {}", block_ref);
        Ok(())
    }

    /// 沿链表统计空闲块数
    pub(crate) fn count_free_blocks(&self) -> Result<u64> {
        let master = MasterBlock::load(&self.disk)?;
        let mut count = 0;
        let mut cursor = master.unallocated_front;
        while cursor != UNALLOCATED_BLOCK {
            count += 1;
            if count > self.block_count() {
                return Err(FileSystemError::Corrupted(
                    "free block list contains a cycle".to_string(),
                ));
            }
            cursor = next_block(&self.read_block(cursor)?);
        }
        Ok(count)
    }
}
