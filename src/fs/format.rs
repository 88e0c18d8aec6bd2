use log::info;

use crate::{
    disk::{
        types::{empty_block, set_next_block},
        BlockDevice, BlockReference, BLOCK_SIZE, UNALLOCATED_BLOCK,
    },
    fs::{
        config::{
            FIRST_POOL_BLOCK, INODE_TABLE_START_BLOCK, N_INODE_BLOCKS, ROOT_DIRECTORY_BLOCK,
            ROOT_INODE,
        },
        directory::DirectoryBlock,
        error::Result,
        inode_table::{unused_inode_block, Inode},
        master_block::MasterBlock,
        FileSystem,
    },
};

impl<D: BlockDevice> FileSystem<D> {
    /// 把整个设备初始化成一个只有根目录的空文件系统
    pub fn format(&mut self) -> Result<()> {
        self.format_with_progress(|_, _| {})
    }

    /// 同 `format`，每写完一个块回调一次 `(已完成, 总数)`。
    ///
    /// 任何一次写失败都会立即返回，设备停留在写了一半的状态。
    pub fn format_with_progress<F>(&mut self, mut progress: F) -> Result<()>
    where
        F: FnMut(u64, u64),
    {
        let blocks = self.block_count();
        // 清零 + 主块 + inode 表 + 空闲链表 + 根目录块 + 根 inode
        let total = blocks * 2 + 1;
        let mut done = 0;
        let mut step = |progress: &mut F| {
            done += 1;
            progress(done, total);
        };

        info!("formatting {} blocks", blocks);
        let zero = [0u8; BLOCK_SIZE];
        for block_ref in 0..blocks {
            self.write_block(block_ref as BlockReference, &zero)?;
            step(&mut progress);
        }

        MasterBlock::new(blocks).sync(&self.disk)?;
        step(&mut progress);

        let inode_block = unused_inode_block()?;
        for offset in 0..N_INODE_BLOCKS {
            self.write_block(INODE_TABLE_START_BLOCK + offset, &inode_block)?;
            step(&mut progress);
        }

        // 按顺序把数据区串成空闲链表，最后一块指向哨兵
        let last = (blocks - 1) as BlockReference;
        for block_ref in FIRST_POOL_BLOCK..=last {
            let mut link = empty_block();
            if block_ref < last {
                set_next_block(&mut link, block_ref + 1);
            } else {
                set_next_block(&mut link, UNALLOCATED_BLOCK);
            }
            self.write_block(block_ref, &link)?;
            step(&mut progress);
        }

        let root = DirectoryBlock::new(ROOT_INODE, ROOT_INODE);
        self.write_directory(ROOT_DIRECTORY_BLOCK, &root)?;
        step(&mut progress);

        self.write_inode(ROOT_INODE, &Inode::directory(ROOT_DIRECTORY_BLOCK))?;
        step(&mut progress);

        info!("format complete, {} free blocks", blocks - u64::from(FIRST_POOL_BLOCK));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        disk::{types::next_block, MemoryDisk, BLOCK_COUNT},
        fs::{
            config::{TOTAL_INODES, UNALLOCATED_INODE},
            error::FileSystemError,
            inode_table::InodeType,
        },
    };

    fn formatted(blocks: u64) -> FileSystem<MemoryDisk> {
        let mut fs = FileSystem::new(MemoryDisk::new(blocks)).unwrap();
        fs.format().unwrap();
        fs
    }

    #[test]
    fn empty_file_system_has_only_root() {
        let fs = formatted(BLOCK_COUNT);

        let root = fs.read_inode(ROOT_INODE).unwrap();
        assert_eq!(root.inode_type, InodeType::Directory);
        assert_eq!(root.size, 2);
        assert_eq!(root.n_references, 1);
        assert_eq!(root.content, ROOT_DIRECTORY_BLOCK);

        let dir = fs.read_directory(&root).unwrap();
        let entries: Vec<_> = dir.allocated().cloned().collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(dir.find("."), Some(ROOT_INODE));
        assert_eq!(dir.find(".."), Some(ROOT_INODE));
        assert!(dir
            .slots()
            .iter()
            .skip(2)
            .all(|e| e.inode_reference == UNALLOCATED_INODE));
    }

    #[test]
    fn free_counts_after_format() {
        let fs = formatted(BLOCK_COUNT);
        let usage = fs.usage().unwrap();
        // 总块数 - (主块 + 4 个 inode 表块 + 根目录块)
        assert_eq!(usage.free_blocks, BLOCK_COUNT - 6);
        assert_eq!(usage.free_inodes, TOTAL_INODES as u64 - 1);
    }

    #[test]
    fn every_other_inode_is_unused() {
        let fs = formatted(16);
        for inode in 1..TOTAL_INODES as u16 {
            assert_eq!(fs.read_inode(inode).unwrap(), Inode::unused());
        }
    }

    #[test]
    fn pool_is_linked_front_to_back() {
        let fs = formatted(10);
        let master = MasterBlock::load(&fs.disk).unwrap();
        assert_eq!(master.unallocated_front, 6);
        assert_eq!(master.unallocated_end, 9);
        for block_ref in 6..9 {
            assert_eq!(next_block(&fs.read_block(block_ref).unwrap()), block_ref + 1);
        }
        assert_eq!(next_block(&fs.read_block(9).unwrap()), UNALLOCATED_BLOCK);
    }

    #[test]
    fn reformat_wipes_previous_content() {
        let mut fs = formatted(32);
        fs.mkdir("/", "/old").unwrap();
        fs.format().unwrap();
        assert_eq!(fs.list("/", "/").unwrap(), vec!["./", "../"]);
        assert_eq!(fs.usage().unwrap().free_blocks, 32 - 6);
    }

    #[test]
    fn progress_reaches_total() {
        let mut fs = FileSystem::new(MemoryDisk::new(20)).unwrap();
        let mut last = (0, 0);
        fs.format_with_progress(|done, total| last = (done, total)).unwrap();
        assert_eq!(last.0, last.1);
        assert_eq!(last.1, 41);
    }

    #[test]
    fn write_failure_aborts_format() {
        struct FailingDisk;
        impl BlockDevice for FailingDisk {
            fn read_block(&self, _: BlockReference, _: &mut crate::disk::Block) -> std::io::Result<()> {
                Ok(())
            }
            fn write_block(&self, _: BlockReference, _: &crate::disk::Block) -> std::io::Result<()> {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "device gone"))
            }
            fn block_count(&self) -> u64 {
                16
            }
        }

        let mut fs = FileSystem::new(FailingDisk).unwrap();
        assert!(matches!(fs.format(), Err(FileSystemError::Io(_))));
    }
}
