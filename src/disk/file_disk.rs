use std::{
    fs::{File, OpenOptions},
    io::{Read, Result, Seek, SeekFrom, Write},
    path::Path,
    sync::Mutex,
};

use log::{debug, trace};

use crate::disk::{
    block_device::{out_of_range, poisoned, BlockDevice},
    types::{Block, BlockReference, BLOCK_COUNT, BLOCK_SIZE},
};

/// 以普通文件作为虚拟磁盘
#[derive(Debug)]
pub struct FileDisk {
    file: Mutex<File>,
    blocks: u64,
}

impl FileDisk {
    /// 挂接默认大小的磁盘镜像，不存在则创建
    pub fn attach<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::attach_with_blocks(path, BLOCK_COUNT)
    }

    pub fn attach_with_blocks<P: AsRef<Path>>(path: P, blocks: u64) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;

        let disk_size = blocks * BLOCK_SIZE as u64;
        if file.metadata()?.len() < disk_size {
            debug!("allocating {} bytes for {}", disk_size, path.display());
            file.set_len(disk_size)?;
        }

        Ok(Self {
            file: Mutex::new(file),
            blocks,
        })
    }

    /// 刷盘并关闭镜像
    pub fn detach(self) -> Result<()> {
        let file = self.file.into_inner().map_err(|_| poisoned())?;
        file.sync_all()
    }

    fn check(&self, block_id: BlockReference) -> Result<()> {
        if u64::from(block_id) >= self.blocks {
            return Err(out_of_range(block_id, self.blocks));
        }
        Ok(())
    }
}

impl BlockDevice for FileDisk {
    fn read_block(&self, block_id: BlockReference, buf: &mut Block) -> Result<()> {
        self.check(block_id)?;
        trace!("file disk read block {}", block_id);
        let mut file = self.file.lock().map_err(|_| poisoned())?;
        file.seek(SeekFrom::Start(u64::from(block_id) * BLOCK_SIZE as u64))?;
        file.read_exact(buf)?;
        Ok(())
    }

    fn write_block(&self, block_id: BlockReference, buf: &Block) -> Result<()> {
        self.check(block_id)?;
        trace!("file disk write block {}", block_id);
        let mut file = self.file.lock().map_err(|_| poisoned())?;
        file.seek(SeekFrom::Start(u64::from(block_id) * BLOCK_SIZE as u64))?;
        file.write_all(buf)?;
        Ok(())
    }

    fn block_count(&self) -> u64 {
        self.blocks
    }
}
