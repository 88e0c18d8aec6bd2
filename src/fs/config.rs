use crate::disk::{BlockReference, BLOCK_HEADER_SIZE, BLOCK_SIZE};

/// inode 编号
pub type InodeReference = u16;

/// “没有 inode” 的哨兵值，目录项空槽使用
pub const UNALLOCATED_INODE: InodeReference = InodeReference::MAX;

pub const MASTER_BLOCK_REFERENCE: BlockReference = 0;
pub const INODE_TABLE_START_BLOCK: BlockReference = 1;

// Inode 表占用的块数
pub const N_INODE_BLOCKS: BlockReference = 4;

// 根目录内容块紧跟在 inode 表之后，格式化时预留
pub const ROOT_DIRECTORY_BLOCK: BlockReference = INODE_TABLE_START_BLOCK + N_INODE_BLOCKS;

// 空闲链表管理的第一个块
pub const FIRST_POOL_BLOCK: BlockReference = ROOT_DIRECTORY_BLOCK + 1;

pub const ROOT_INODE: InodeReference = 0;

// type(1) + n_references(1) + content(2) + size(4)
pub const INODE_SIZE: usize = 8;
pub const INODES_PER_BLOCK: usize = (BLOCK_SIZE - BLOCK_HEADER_SIZE) / INODE_SIZE;
pub const TOTAL_INODES: usize = INODES_PER_BLOCK * N_INODE_BLOCKS as usize;

/// inode 位图字节数，每个 bit 对应一个 inode
pub const INODE_BITMAP_BYTES: usize = (TOTAL_INODES + 7) / 8;

/// 文件名字段长度（含结尾 NUL）
pub const FILE_NAME_SIZE: usize = 14;
pub const MAX_NAME_LENGTH: usize = FILE_NAME_SIZE - 1;
pub const DIRECTORY_ENTRY_SIZE: usize = FILE_NAME_SIZE + 2;
pub const DIRECTORY_ENTRIES_PER_BLOCK: usize =
    (BLOCK_SIZE - BLOCK_HEADER_SIZE) / DIRECTORY_ENTRY_SIZE;

pub const PATH_SEPARATOR: char = '/';
