use std::path::Path;

use log::info;

use crate::{
    disk::file_disk::FileDisk,
    fs::{error::Result, FileSystem},
};

/// 启动过程中的进度事件，由前端负责展示
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootProgress {
    Step(&'static str),
    Formatting { done: u64, total: u64 },
}

/// 挂接磁盘镜像；镜像不存在时先格式化，最后统一 mount
pub fn perform_disk_initialization<P, F>(disk_path: P, mut report: F) -> Result<FileSystem<FileDisk>>
where
    P: AsRef<Path>,
    F: FnMut(BootProgress),
{
    let disk_path = disk_path.as_ref();
    report(BootProgress::Step("Initializing virtual disk..."));

    let disk_exists = disk_path.exists();
    let disk = FileDisk::attach(disk_path)?;
    let mut fs = FileSystem::new(disk)?;

    if !disk_exists {
        // 只有“明确是新磁盘”才格式化
        info!("no disk image at {}, formatting", disk_path.display());
        report(BootProgress::Step("No disk found, formatting new file system..."));
        fs.format_with_progress(|done, total| report(BootProgress::Formatting { done, total }))?;
    }

    report(BootProgress::Step("Mounting file system..."));
    fs.mount()?;
    Ok(fs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_image_is_formatted_then_reused() {
        let path = std::env::temp_dir().join(format!("mini_fs_boot_{}.img", std::process::id()));
        if path.exists() {
            std::fs::remove_file(&path).unwrap();
        }

        let mut events = Vec::new();
        let mut fs = perform_disk_initialization(&path, |e| events.push(e)).unwrap();
        assert!(events.contains(&BootProgress::Step("No disk found, formatting new file system...")));
        assert!(events.iter().any(|e| matches!(e, BootProgress::Formatting { done, total } if done == total)));
        fs.mkdir("/", "/kept").unwrap();
        fs.into_device().detach().unwrap();

        let mut events = Vec::new();
        let fs = perform_disk_initialization(&path, |e| events.push(e)).unwrap();
        assert!(!events.iter().any(|e| matches!(e, BootProgress::Formatting { .. })));
        assert_eq!(fs.list("/", "/").unwrap(), vec!["./", "../", "kept/"]);
        fs.into_device().detach().unwrap();
        std::fs::remove_file(&path).unwrap();
    }
}
