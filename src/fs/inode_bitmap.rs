use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    disk::BlockDevice,
    fs::{
        config::{InodeReference, INODE_BITMAP_BYTES, TOTAL_INODES},
        error::{FileSystemError, Result},
        master_block::MasterBlock,
        FileSystem,
    },
};

/// inode 分配位图，保存在主块中
///
/// inode `i` 对应第 `i / 8` 个字节的 `0x80 >> (i % 8)` 位（高位在前）。
/// 末尾字节中超出 `TOTAL_INODES` 的填充位永远不会被分配。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InodeBitmap {
    bits: [u8; INODE_BITMAP_BYTES],
}

impl InodeBitmap {
    fn mask(inode_index: usize) -> (usize, u8) {
        (inode_index / 8, 0x80 >> (inode_index % 8))
    }

    // 分配最小编号的空闲 inode
    pub fn alloc(&mut self) -> Option<InodeReference> {
        let index = (0..TOTAL_INODES).find(|&i| !self.is_used(i))?;
        self.set(index);
        Some(index as InodeReference)
    }

    pub fn set(&mut self, inode_index: usize) {
        let (byte, bit) = Self::mask(inode_index);
        self.bits[byte] |= bit;
    }

    // 释放一个 inode
    pub fn free(&mut self, inode_index: usize) {
        let (byte, bit) = Self::mask(inode_index);
        self.bits[byte] &= !bit;
    }

    pub fn is_used(&self, inode_index: usize) -> bool {
        let (byte, bit) = Self::mask(inode_index);
        self.bits[byte] & bit != 0
    }

    pub fn free_count(&self) -> usize {
        (0..TOTAL_INODES).filter(|&i| !self.is_used(i)).count()
    }
}

impl<D: BlockDevice> FileSystem<D> {
    /// 分配一个 inode 并持久化主块
    pub fn allocate_inode(&mut self) -> Result<InodeReference> {
        let mut master = MasterBlock::load(&self.disk)?;
        let inode = master
            .inode_bitmap
            .alloc()
            .ok_or(FileSystemError::InodeFull)?;
        master.sync(&self.disk)?;
        debug!("allocated inode {}", inode);
        Ok(inode)
    }

    /// 清除 inode 的分配位；根 inode 由调用方保证不会被释放
    pub fn free_inode(&mut self, inode: InodeReference) -> Result<()> {
        if usize::from(inode) >= TOTAL_INODES {
            return Err(FileSystemError::InvalidInode(inode));
        }
        let mut master = MasterBlock::load(&self.disk)?;
        master.inode_bitmap.free(usize::from(inode));
        master.sync(&self.disk)?;
        debug!("freed inode {}", inode);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        disk::MemoryDisk,
        fs::config::ROOT_INODE,
    };

    #[test]
    fn root_is_the_high_bit_of_the_first_byte() {
        let mut bitmap = InodeBitmap::default();
        bitmap.set(0);
        assert_eq!(bitmap.bits[0], 0x80);
        bitmap.set(9);
        assert_eq!(bitmap.bits[1], 0x40);
    }

    #[test]
    fn alloc_picks_lowest_free_index() {
        let mut bitmap = InodeBitmap::default();
        assert_eq!(bitmap.alloc(), Some(0));
        assert_eq!(bitmap.alloc(), Some(1));
        assert_eq!(bitmap.alloc(), Some(2));
        bitmap.free(1);
        assert_eq!(bitmap.alloc(), Some(1));
        assert_eq!(bitmap.alloc(), Some(3));
    }

    #[test]
    fn alloc_stops_at_total_inodes() {
        let mut bitmap = InodeBitmap::default();
        for expected in 0..TOTAL_INODES {
            assert_eq!(bitmap.alloc(), Some(expected as InodeReference));
        }
        assert_eq!(bitmap.alloc(), None);
        assert_eq!(bitmap.free_count(), 0);
    }

    #[test]
    fn inode_exhaustion_and_recovery() {
        let mut fs = FileSystem::new(MemoryDisk::new(16)).unwrap();
        fs.format().unwrap();

        let mut allocated = Vec::new();
        loop {
            match fs.allocate_inode() {
                Ok(inode) => allocated.push(inode),
                Err(e) => {
                    assert!(matches!(e, FileSystemError::InodeFull));
                    break;
                }
            }
        }
        assert_eq!(allocated.len(), TOTAL_INODES - 1);
        assert!(!allocated.contains(&ROOT_INODE));

        fs.free_inode(17).unwrap();
        assert_eq!(fs.allocate_inode().unwrap(), 17);
        assert!(matches!(fs.allocate_inode(), Err(FileSystemError::InodeFull)));
    }

    #[test]
    fn free_inode_rejects_out_of_range() {
        let mut fs = FileSystem::new(MemoryDisk::new(16)).unwrap();
        fs.format().unwrap();
        let bad = TOTAL_INODES as InodeReference;
        assert!(matches!(
            fs.free_inode(bad),
            Err(FileSystemError::InvalidInode(r)) if r == bad
        ));
    }
}
