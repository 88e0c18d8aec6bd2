use std::fmt;

use crate::{disk::BlockReference, fs::config::InodeReference};

/// 文件系统错误类型
#[derive(Debug)]
pub enum FileSystemError {
    Io(std::io::Error),             // 底层 I/O 错误
    DiskFull,                       // 空闲块链表为空
    InodeFull,                      // inode 已满
    NotFound(String),               // 文件或目录不存在，带路径
    AlreadyExists(String),          // 文件或目录已存在，带路径
    NotADirectory(String),          // 期望目录，实际不是
    IsADirectory(String),           // 期望文件，实际是目录
    DirectoryNotEmpty(String),      // 目录非空
    DirectoryFull(String),          // 目录块没有空槽
    InvalidOperation(String),       // 不允许删除 . / .. / 根目录
    InvalidPath(String),            // 路径或名字非法
    InvalidInode(InodeReference),   // inode 编号越界
    InvalidBlock(BlockReference),   // 块编号越界或不属于数据区
    UnsupportedGeometry(u64),       // 设备块数无法容纳布局
    Corrupted(String),              // 文件系统损坏
}

impl FileSystemError {
    /// 块或 inode 用尽
    pub fn is_out_of_space(&self) -> bool {
        matches!(self, Self::DiskFull | Self::InodeFull)
    }
}

impl From<std::io::Error> for FileSystemError {
    fn from(e: std::io::Error) -> Self {
        FileSystemError::Io(e)
    }
}

impl From<bincode::Error> for FileSystemError {
    fn from(e: bincode::Error) -> Self {
        FileSystemError::Corrupted(format!("record codec: {}", e))
    }
}

// 实现 Display trait，用于打印错误信息
impl fmt::Display for FileSystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "Disk I/O error: {}", e),
            Self::DiskFull => write!(f, "Disk space is full"),
            Self::InodeFull => write!(f, "No free inode available"),
            Self::NotFound(path) => write!(f, "File or directory not found: {}", path),
            Self::AlreadyExists(path) => write!(f, "File or directory already exists: {}", path),
            Self::NotADirectory(path) => write!(f, "Expected a directory, found a file: {}", path),
            Self::IsADirectory(path) => write!(f, "Expected a file, found a directory: {}", path),
            Self::DirectoryNotEmpty(path) => write!(f, "Directory is not empty: {}", path),
            Self::DirectoryFull(path) => write!(f, "Directory has no free entry: {}", path),
            Self::InvalidOperation(path) => write!(f, "Operation not permitted on: {}", path),
            Self::InvalidPath(path) => write!(f, "Invalid path: {}", path),
            Self::InvalidInode(inode) => write!(f, "Invalid inode: {}", inode),
            Self::InvalidBlock(block) => write!(f, "Invalid block: {}", block),
            Self::UnsupportedGeometry(blocks) => {
                write!(f, "Unsupported disk size: {} blocks", blocks)
            }
            Self::Corrupted(desc) => write!(f, "File system corrupted: {}", desc),
        }
    }
}

// 支持链式错误，方便追踪底层原因
impl std::error::Error for FileSystemError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// 文件系统统一结果类型
pub type Result<T> = std::result::Result<T, FileSystemError>;
