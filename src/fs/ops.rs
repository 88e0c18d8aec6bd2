use log::debug;

use crate::{
    disk::{BlockDevice, UNALLOCATED_BLOCK},
    fs::{
        config::{InodeReference, PATH_SEPARATOR, ROOT_INODE},
        directory::{validate_name, DirectoryBlock},
        error::{FileSystemError, Result},
        inode_table::{Inode, InodeType},
        path::Lookup,
        FileSystem,
    },
};

fn is_dot_entry(name: &str) -> bool {
    name == "." || name == ".."
}

impl<D: BlockDevice> FileSystem<D> {
    /// 列出文件或目录。
    ///
    /// 文件只返回自己的名字；目录返回排好序的目录项，子目录名后带 `/`。
    pub fn list(&self, cwd: &str, path: &str) -> Result<Vec<String>> {
        let lookup = self.find(cwd, path)?;
        let child = lookup
            .child
            .ok_or_else(|| FileSystemError::NotFound(path.to_string()))?;
        let inode = self.read_inode(child)?;
        debug!("list {:?}: inode {} ({})", path, child, inode.inode_type.name());

        match inode.inode_type {
            InodeType::File => Ok(vec![lookup.name]),
            InodeType::Directory => {
                let directory = self.read_directory(&inode)?;
                let mut lines = Vec::new();
                for entry in directory.sorted() {
                    let kind = self.read_inode(entry.inode_reference)?.inode_type;
                    if kind == InodeType::Directory {
                        lines.push(format!("{}{}", entry.name, PATH_SEPARATOR));
                    } else {
                        lines.push(entry.name);
                    }
                }
                Ok(lines)
            }
            InodeType::Unused => Err(FileSystemError::Corrupted(format!(
                "{} refers to unused inode {}",
                path, child
            ))),
        }
    }

    /// 创建目录
    pub fn mkdir(&mut self, cwd: &str, path: &str) -> Result<InodeReference> {
        let (lookup, mut parent, mut parent_dir) = self.prepare_create(cwd, path)?;

        let inode_ref = self.allocate_inode()?;
        let block_ref = match self.allocate_block() {
            Ok(block_ref) => block_ref,
            Err(e @ FileSystemError::DiskFull) => {
                // 没有块可用时把刚分配的 inode 还回去
                self.free_inode(inode_ref)?;
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        self.write_directory(block_ref, &DirectoryBlock::new(inode_ref, lookup.parent))?;
        self.write_inode(inode_ref, &Inode::directory(block_ref))?;
        self.link(&lookup, &mut parent, &mut parent_dir, inode_ref)?;

        debug!("mkdir {:?}: inode {} block {}", path, inode_ref, block_ref);
        Ok(inode_ref)
    }

    /// 删除空目录
    pub fn rmdir(&mut self, cwd: &str, path: &str) -> Result<()> {
        let lookup = self.find(cwd, path)?;
        if is_dot_entry(&lookup.name) {
            return Err(FileSystemError::InvalidOperation(path.to_string()));
        }
        let child = lookup
            .child
            .ok_or_else(|| FileSystemError::NotFound(path.to_string()))?;
        if child == ROOT_INODE {
            return Err(FileSystemError::InvalidOperation(path.to_string()));
        }

        let inode = self.read_inode(child)?;
        if !inode.is_directory() {
            return Err(FileSystemError::NotADirectory(path.to_string()));
        }
        if inode.size > 2 {
            return Err(FileSystemError::DirectoryNotEmpty(path.to_string()));
        }

        self.unlink(&lookup, path)?;
        self.free_block(inode.content)?;
        self.write_inode(child, &Inode::unused())?;
        self.free_inode(child)?;

        debug!("rmdir {:?}: released inode {} block {}", path, child, inode.content);
        Ok(())
    }

    /// 创建空文件；已存在时什么也不做
    pub fn touch(&mut self, cwd: &str, path: &str) -> Result<InodeReference> {
        let lookup = self.find(cwd, path)?;
        if let Some(existing) = lookup.child {
            return Ok(existing);
        }
        let (lookup, mut parent, mut parent_dir) = self.prepare_create(cwd, path)?;

        let inode_ref = self.allocate_inode()?;
        self.write_inode(inode_ref, &Inode::empty_file())?;
        self.link(&lookup, &mut parent, &mut parent_dir, inode_ref)?;

        debug!("touch {:?}: inode {}", path, inode_ref);
        Ok(inode_ref)
    }

    /// 删除文件的一个链接，链接数归零时回收 inode 和内容块
    pub fn remove(&mut self, cwd: &str, path: &str) -> Result<()> {
        let lookup = self.find(cwd, path)?;
        if is_dot_entry(&lookup.name) {
            return Err(FileSystemError::InvalidOperation(path.to_string()));
        }
        let child = lookup
            .child
            .ok_or_else(|| FileSystemError::NotFound(path.to_string()))?;

        let mut inode = self.read_inode(child)?;
        if inode.is_directory() {
            return Err(FileSystemError::IsADirectory(path.to_string()));
        }

        self.unlink(&lookup, path)?;
        inode.dec_link();
        if inode.n_references > 0 {
            return self.write_inode(child, &inode);
        }

        if inode.content != UNALLOCATED_BLOCK {
            self.free_block(inode.content)?;
        }
        self.write_inode(child, &Inode::unused())?;
        self.free_inode(child)?;
        debug!("remove {:?}: released inode {}", path, child);
        Ok(())
    }

    /// 查看路径对应的 inode
    pub fn stat(&self, cwd: &str, path: &str) -> Result<(InodeReference, Inode)> {
        let child = self
            .find(cwd, path)?
            .child
            .ok_or_else(|| FileSystemError::NotFound(path.to_string()))?;
        Ok((child, self.read_inode(child)?))
    }

    // 创建前的公共检查：目标不存在、名字合法、父目录有空槽
    fn prepare_create(
        &self,
        cwd: &str,
        path: &str,
    ) -> Result<(Lookup, Inode, DirectoryBlock)> {
        let lookup = self.find(cwd, path)?;
        if lookup.child.is_some() {
            return Err(FileSystemError::AlreadyExists(path.to_string()));
        }
        validate_name(&lookup.name)?;

        let parent = self.read_inode(lookup.parent)?;
        if !parent.is_directory() {
            return Err(FileSystemError::NotADirectory(path.to_string()));
        }
        let parent_dir = self.read_directory(&parent)?;
        if !parent_dir.has_free_slot() {
            return Err(FileSystemError::DirectoryFull(path.to_string()));
        }
        Ok((lookup, parent, parent_dir))
    }

    // 把新 inode 挂到父目录，父目录项数加一
    fn link(
        &mut self,
        lookup: &Lookup,
        parent: &mut Inode,
        parent_dir: &mut DirectoryBlock,
        inode_ref: InodeReference,
    ) -> Result<()> {
        parent_dir.insert(&lookup.name, inode_ref)?;
        self.write_directory(parent.content, parent_dir)?;
        parent.size += 1;
        self.write_inode(lookup.parent, parent)
    }

    // 从父目录摘掉目录项，父目录项数减一
    fn unlink(&mut self, lookup: &Lookup, path: &str) -> Result<()> {
        let mut parent = self.read_inode(lookup.parent)?;
        let mut parent_dir = self.read_directory(&parent)?;
        parent_dir
            .remove(&lookup.name)
            .ok_or_else(|| FileSystemError::NotFound(path.to_string()))?;
        self.write_directory(parent.content, &parent_dir)?;
        parent.size = parent.size.saturating_sub(1);
        self.write_inode(lookup.parent, &parent)
    }
}
