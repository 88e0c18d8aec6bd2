use serde::{Deserialize, Serialize};

use crate::{
    disk::{
        types::{empty_block, payload, payload_mut},
        Block, BlockDevice, BlockReference, BLOCK_HEADER_SIZE, UNALLOCATED_BLOCK,
    },
    fs::{
        config::{
            InodeReference, INODES_PER_BLOCK, INODE_SIZE, INODE_TABLE_START_BLOCK, TOTAL_INODES,
        },
        decode_record, encode_record,
        error::{FileSystemError, Result},
        FileSystem,
    },
};

/// inode 类型，磁盘上占 1 字节
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(into = "u8", try_from = "u8")]
pub enum InodeType {
    Unused,    // 空闲槽
    Directory, // 目录
    File,      // 文件
}

impl InodeType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unused => "UNUSED",
            Self::Directory => "DIRECTORY",
            Self::File => "FILE",
        }
    }
}

impl From<InodeType> for u8 {
    fn from(kind: InodeType) -> u8 {
        match kind {
            InodeType::Unused => 0,
            InodeType::Directory => 1,
            InodeType::File => 2,
        }
    }
}

impl TryFrom<u8> for InodeType {
    type Error = String;

    fn try_from(raw: u8) -> std::result::Result<Self, Self::Error> {
        match raw {
            0 => Ok(Self::Unused),
            1 => Ok(Self::Directory),
            2 => Ok(Self::File),
            other => Err(format!("unknown inode type {}", other)),
        }
    }
}

/// 磁盘上的 inode 记录，定长 `INODE_SIZE` 字节
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Inode {
    pub inode_type: InodeType,
    pub n_references: u8,        // 有多少目录项链接到该 inode
    pub content: BlockReference, // 内容块；没有则为 UNALLOCATED_BLOCK
    pub size: u32,               // 目录：目录项数；文件：字节数
}

impl Inode {
    pub fn unused() -> Self {
        Self {
            inode_type: InodeType::Unused,
            n_references: 0,
            content: UNALLOCATED_BLOCK,
            size: 0,
        }
    }

    /// 新目录只含 `.` 和 `..` 两项
    pub fn directory(content: BlockReference) -> Self {
        Self {
            inode_type: InodeType::Directory,
            n_references: 1,
            content,
            size: 2,
        }
    }

    pub fn empty_file() -> Self {
        Self {
            inode_type: InodeType::File,
            n_references: 1,
            content: UNALLOCATED_BLOCK,
            size: 0,
        }
    }

    pub fn is_directory(&self) -> bool {
        self.inode_type == InodeType::Directory
    }

    pub fn dec_link(&mut self) {
        if self.n_references > 0 {
            self.n_references -= 1;
        }
    }
}

/// inode 所在的块号以及在块内的字节偏移
fn locate(inode: InodeReference) -> Result<(BlockReference, usize)> {
    let index = usize::from(inode);
    if index >= TOTAL_INODES {
        return Err(FileSystemError::InvalidInode(inode));
    }
    let block = INODE_TABLE_START_BLOCK + (index / INODES_PER_BLOCK) as BlockReference;
    let offset = (index % INODES_PER_BLOCK) * INODE_SIZE;
    Ok((block, offset))
}

impl<D: BlockDevice> FileSystem<D> {
    pub fn read_inode(&self, inode: InodeReference) -> Result<Inode> {
        let (block_ref, offset) = locate(inode)?;
        let block = self.read_block(block_ref)?;
        decode_record(&payload(&block)[offset..offset + INODE_SIZE])
    }

    /// 读出所在块、覆盖一个槽、整块写回
    pub fn write_inode(&mut self, inode: InodeReference, record: &Inode) -> Result<()> {
        let (block_ref, offset) = locate(inode)?;
        let mut block = self.read_block(block_ref)?;
        encode_record(&mut payload_mut(&mut block)[offset..offset + INODE_SIZE], record)?;
        self.write_block(block_ref, &block)
    }
}

/// 一个 inode 表块的全部槽位都置为 UNUSED
pub(crate) fn unused_inode_block() -> Result<Block> {
    let mut block = empty_block();
    let unused = Inode::unused();
    for slot in 0..INODES_PER_BLOCK {
        let start = BLOCK_HEADER_SIZE + slot * INODE_SIZE;
        encode_record(&mut block[start..start + INODE_SIZE], &unused)?;
    }
    Ok(block)
}
