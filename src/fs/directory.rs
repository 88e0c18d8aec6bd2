use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::{
    disk::{
        types::{empty_block, payload, payload_mut},
        Block,
    },
    fs::{
        config::{
            InodeReference, DIRECTORY_ENTRIES_PER_BLOCK, DIRECTORY_ENTRY_SIZE, FILE_NAME_SIZE,
            MAX_NAME_LENGTH, PATH_SEPARATOR, UNALLOCATED_INODE,
        },
        decode_record, encode_record,
        error::{FileSystemError, Result},
    },
};

// 磁盘上的目录项：NUL 填充的名字 + inode 编号
#[derive(Serialize, Deserialize)]
struct RawEntry {
    name: [u8; FILE_NAME_SIZE],
    inode_reference: InodeReference,
}

// 一个目录项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub inode_reference: InodeReference,
}

/// 列目录时的排序键：空槽排在前面，其余按名字字节序
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum EntryOrder<'a> {
    Unallocated,
    Allocated(&'a str),
}

impl DirectoryEntry {
    pub fn new(name: &str, inode_reference: InodeReference) -> Self {
        Self {
            name: name.to_string(),
            inode_reference,
        }
    }

    pub fn unallocated() -> Self {
        Self::new("", UNALLOCATED_INODE)
    }

    pub fn is_allocated(&self) -> bool {
        self.inode_reference != UNALLOCATED_INODE
    }

    pub fn order_key(&self) -> EntryOrder<'_> {
        if self.is_allocated() {
            EntryOrder::Allocated(&self.name)
        } else {
            EntryOrder::Unallocated
        }
    }

    pub fn compare(&self, other: &Self) -> Ordering {
        self.order_key().cmp(&other.order_key())
    }

    fn to_raw(&self) -> RawEntry {
        let mut name = [0u8; FILE_NAME_SIZE];
        if self.is_allocated() {
            let bytes = self.name.as_bytes();
            let len = bytes.len().min(MAX_NAME_LENGTH);
            name[..len].copy_from_slice(&bytes[..len]);
        }
        RawEntry {
            name,
            inode_reference: self.inode_reference,
        }
    }

    fn from_raw(raw: RawEntry) -> Result<Self> {
        if raw.inode_reference == UNALLOCATED_INODE {
            return Ok(Self::unallocated());
        }
        let len = raw.name.iter().position(|&b| b == 0).unwrap_or(FILE_NAME_SIZE);
        let name = std::str::from_utf8(&raw.name[..len]).map_err(|_| {
            FileSystemError::Corrupted(format!(
                "directory entry for inode {} has a non UTF-8 name",
                raw.inode_reference
            ))
        })?;
        Ok(Self::new(name, raw.inode_reference))
    }
}

/// 检查一个目录项名字能否写进定长名字段
pub fn validate_name(name: &str) -> Result<()> {
    let fits = !name.is_empty() && name.len() <= MAX_NAME_LENGTH;
    if !fits || name.contains(PATH_SEPARATOR) || name.contains('\0') {
        return Err(FileSystemError::InvalidPath(name.to_string()));
    }
    Ok(())
}

/// 单个目录块：定长的目录项数组，槽位顺序没有含义
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryBlock {
    entries: Vec<DirectoryEntry>,
}

impl DirectoryBlock {
    /// 新目录：`.` 指向自己，`..` 指向父目录
    pub fn new(self_ref: InodeReference, parent_ref: InodeReference) -> Self {
        let mut entries = vec![DirectoryEntry::unallocated(); DIRECTORY_ENTRIES_PER_BLOCK];
        entries[0] = DirectoryEntry::new(".", self_ref);
        entries[1] = DirectoryEntry::new("..", parent_ref);
        Self { entries }
    }

    pub fn decode(block: &Block) -> Result<Self> {
        let bytes = payload(block);
        let entries = (0..DIRECTORY_ENTRIES_PER_BLOCK)
            .map(|slot| {
                let start = slot * DIRECTORY_ENTRY_SIZE;
                let raw: RawEntry = decode_record(&bytes[start..start + DIRECTORY_ENTRY_SIZE])?;
                DirectoryEntry::from_raw(raw)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    pub fn encode(&self) -> Result<Block> {
        let mut block = empty_block();
        let bytes = payload_mut(&mut block);
        for (slot, entry) in self.entries.iter().enumerate() {
            let start = slot * DIRECTORY_ENTRY_SIZE;
            encode_record(&mut bytes[start..start + DIRECTORY_ENTRY_SIZE], &entry.to_raw())?;
        }
        Ok(block)
    }

    /// 全部槽位（含空槽）
    pub fn slots(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn allocated(&self) -> impl Iterator<Item = &DirectoryEntry> {
        self.entries.iter().filter(|e| e.is_allocated())
    }

    // 线性查找，名字区分大小写
    pub fn find(&self, name: &str) -> Option<InodeReference> {
        self.allocated()
            .find(|e| e.name == name)
            .map(|e| e.inode_reference)
    }

    pub fn has_free_slot(&self) -> bool {
        self.entries.iter().any(|e| !e.is_allocated())
    }

    /// 写入第一个空槽
    pub fn insert(&mut self, name: &str, inode_reference: InodeReference) -> Result<()> {
        validate_name(name)?;
        let slot = self
            .entries
            .iter_mut()
            .find(|e| !e.is_allocated())
            .ok_or_else(|| FileSystemError::DirectoryFull(name.to_string()))?;
        *slot = DirectoryEntry::new(name, inode_reference);
        Ok(())
    }

    /// 把同名槽位置为空槽，不移动其余目录项
    pub fn remove(&mut self, name: &str) -> Option<InodeReference> {
        let slot = self
            .entries
            .iter_mut()
            .find(|e| e.is_allocated() && e.name == name)?;
        let inode = slot.inode_reference;
        *slot = DirectoryEntry::unallocated();
        Some(inode)
    }

    /// 按排序键排好的目录项，空槽已排除
    pub fn sorted(&self) -> Vec<DirectoryEntry> {
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| a.compare(b));
        entries.retain(|e| e.is_allocated());
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_block_has_self_and_parent() {
        let dir = DirectoryBlock::new(7, 3);
        assert_eq!(dir.find("."), Some(7));
        assert_eq!(dir.find(".."), Some(3));
        assert_eq!(dir.allocated().count(), 2);
        assert_eq!(dir.slots().len(), DIRECTORY_ENTRIES_PER_BLOCK);
    }

    #[test]
    fn decode_keeps_slot_positions() {
        let mut dir = DirectoryBlock::new(0, 0);
        dir.insert("a", 1).unwrap();
        dir.insert("b", 2).unwrap();
        dir.insert("c", 3).unwrap();
        dir.remove("b");

        let decoded = DirectoryBlock::decode(&dir.encode().unwrap()).unwrap();
        assert_eq!(decoded, dir);
        assert!(!decoded.slots()[3].is_allocated());
        assert_eq!(decoded.slots()[4].name, "c");
    }

    #[test]
    fn entry_layout_is_name_then_reference() {
        let dir = DirectoryBlock::new(0x0102, 0);
        let block = dir.encode().unwrap();
        assert_eq!(block[2], b'.');
        assert!(block[3..16].iter().all(|&b| b == 0));
        assert_eq!(&block[16..18], &[0x02, 0x01]);
        // 第三个槽是空槽
        let third = 2 + 2 * DIRECTORY_ENTRY_SIZE;
        assert_eq!(
            &block[third + FILE_NAME_SIZE..third + DIRECTORY_ENTRY_SIZE],
            &[0xFF, 0xFF]
        );
    }

    #[test]
    fn insert_reuses_the_first_free_slot() {
        let mut dir = DirectoryBlock::new(0, 0);
        dir.insert("one", 1).unwrap();
        dir.insert("two", 2).unwrap();
        dir.remove("one");
        dir.insert("three", 3).unwrap();
        assert_eq!(dir.slots()[2].name, "three");
        assert_eq!(dir.slots()[3].name, "two");
    }

    #[test]
    fn full_block_rejects_insert() {
        let mut dir = DirectoryBlock::new(0, 0);
        for i in 0..DIRECTORY_ENTRIES_PER_BLOCK - 2 {
            dir.insert(&format!("d{}", i), i as InodeReference + 1).unwrap();
        }
        assert!(!dir.has_free_slot());
        assert!(matches!(
            dir.insert("extra", 99),
            Err(FileSystemError::DirectoryFull(_))
        ));
    }

    #[test]
    fn names_must_fit_the_name_field() {
        assert!(validate_name("thirteen_char").is_ok());
        assert!(validate_name("fourteen_chars").is_err());
        assert!(validate_name("").is_err());
        assert!(validate_name("a/b").is_err());
    }

    #[test]
    fn unallocated_sorts_before_allocated() {
        let empty = DirectoryEntry::unallocated();
        let named = DirectoryEntry::new("a", 1);
        assert_eq!(empty.compare(&named), Ordering::Less);
        assert_eq!(named.compare(&empty), Ordering::Greater);
        assert_eq!(empty.compare(&DirectoryEntry::unallocated()), Ordering::Equal);
    }

    #[test]
    fn sorted_orders_by_name_and_drops_free_slots() {
        let mut dir = DirectoryBlock::new(0, 0);
        dir.insert("zeta", 1).unwrap();
        dir.insert("alpha", 2).unwrap();
        dir.insert("mid", 3).unwrap();
        let names: Vec<_> = dir.sorted().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec![".", "..", "alpha", "mid", "zeta"]);
    }
}
