use log::{info, trace};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    disk::{Block, BlockDevice, BlockReference, BLOCK_SIZE, UNALLOCATED_BLOCK},
    fs::{
        config::{
            FIRST_POOL_BLOCK, ROOT_DIRECTORY_BLOCK, ROOT_INODE, TOTAL_INODES,
        },
        error::Result,
        master_block::MasterBlock,
    },
};

pub mod config;
pub mod directory;
pub mod error;
pub mod format;
pub mod free_list;
pub mod inode_bitmap;
pub mod inode_table;
pub mod master_block;
pub mod ops;
pub mod path;

pub use directory::{DirectoryBlock, DirectoryEntry};
pub use error::FileSystemError;
pub use inode_table::{Inode, InodeType};
pub use path::Lookup;

/// 挂在一个块设备上的文件系统。
///
/// 不缓存任何元数据：主块、inode 表和目录块每次都从设备读取，
/// 修改后立即写回。所有修改操作都要求 `&mut self`，同一时间只有一个写者。
#[derive(Debug)]
pub struct FileSystem<D: BlockDevice> {
    disk: D, // 底层磁盘抽象层
}

/// 空间使用情况
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub total_blocks: u64,
    pub free_blocks: u64,
    pub total_inodes: u64,
    pub free_inodes: u64,
}

impl<D: BlockDevice> FileSystem<D> {
    pub fn new(disk: D) -> Result<Self> {
        let blocks = disk.block_count();
        if blocks <= u64::from(FIRST_POOL_BLOCK) || blocks > u64::from(BlockReference::MAX) {
            return Err(FileSystemError::UnsupportedGeometry(blocks));
        }
        Ok(Self { disk })
    }

    /// 取回底层设备（用于 detach）
    pub fn into_device(self) -> D {
        self.disk
    }

    pub fn block_count(&self) -> u64 {
        self.disk.block_count()
    }

    /// 检查已格式化的磁盘是否可用
    pub fn mount(&self) -> Result<()> {
        let master = MasterBlock::load(&self.disk)?;
        if !master.inode_bitmap.is_used(usize::from(ROOT_INODE)) {
            return Err(FileSystemError::Corrupted(
                "root inode is not marked allocated".to_string(),
            ));
        }

        let in_pool = |b: BlockReference| {
            b >= FIRST_POOL_BLOCK && u64::from(b) < self.block_count()
        };
        let empty = master.free_list_is_empty();
        let consistent = if empty {
            master.unallocated_end == UNALLOCATED_BLOCK
        } else {
            in_pool(master.unallocated_front) && in_pool(master.unallocated_end)
        };
        if !consistent {
            return Err(FileSystemError::Corrupted(format!(
                "free list bounds {}..{} are invalid",
                master.unallocated_front, master.unallocated_end
            )));
        }

        let root = self.read_inode(ROOT_INODE)?;
        if !root.is_directory() || root.content != ROOT_DIRECTORY_BLOCK {
            return Err(FileSystemError::Corrupted(
                "root inode is not the root directory".to_string(),
            ));
        }
        info!("mounted file system with {} blocks", self.block_count());
        Ok(())
    }

    pub fn usage(&self) -> Result<Usage> {
        let master = MasterBlock::load(&self.disk)?;
        Ok(Usage {
            total_blocks: self.block_count(),
            free_blocks: self.count_free_blocks()?,
            total_inodes: TOTAL_INODES as u64,
            free_inodes: master.inode_bitmap.free_count() as u64,
        })
    }

    pub(crate) fn read_block(&self, block_ref: BlockReference) -> Result<Block> {
        if u64::from(block_ref) >= self.block_count() {
            return Err(FileSystemError::InvalidBlock(block_ref));
        }
        trace!("read block {}", block_ref);
        let mut block = [0u8; BLOCK_SIZE];
        self.disk.read_block(block_ref, &mut block)?;
        Ok(block)
    }

    pub(crate) fn write_block(&mut self, block_ref: BlockReference, block: &Block) -> Result<()> {
        if u64::from(block_ref) >= self.block_count() {
            return Err(FileSystemError::InvalidBlock(block_ref));
        }
        trace!("write block {}", block_ref);
        self.disk.write_block(block_ref, block)?;
        Ok(())
    }

    /// 读出目录 inode 的内容块
    pub fn read_directory(&self, inode: &Inode) -> Result<DirectoryBlock> {
        DirectoryBlock::decode(&self.read_block(inode.content)?)
    }

    pub(crate) fn write_directory(
        &mut self,
        block_ref: BlockReference,
        directory: &DirectoryBlock,
    ) -> Result<()> {
        let block = directory.encode()?;
        self.write_block(block_ref, &block)
    }
}

/// 从定长字节区解码一条记录
pub(crate) fn decode_record<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(bincode::deserialize(bytes)?)
}

/// 把一条记录编码进定长字节区，空间不够时报错
pub(crate) fn encode_record<T: Serialize>(bytes: &mut [u8], value: &T) -> Result<()> {
    bincode::serialize_into(bytes, value)?;
    Ok(())
}
