use std::path::PathBuf;

use log::LevelFilter;

pub const PWD_VAR: &str = "MINIFS_PWD";
pub const DISK_VAR: &str = "MINIFS_DISK";
pub const DEBUG_VAR: &str = "MINIFS_DEBUG";

pub const DEFAULT_PWD: &str = "/";
pub const DEFAULT_DISK_PATH: &str = "disk.img";

/// 运行时配置，启动时从环境变量读取一次
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub cwd: String,         // 初始工作目录（文件系统内的绝对路径）
    pub disk_path: PathBuf,  // 虚拟磁盘镜像位置
    pub debug: bool,         // 是否输出调试日志
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            cwd: DEFAULT_PWD.to_string(),
            disk_path: PathBuf::from(DEFAULT_DISK_PATH),
            debug: false,
        }
    }
}

impl Environment {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 通过任意查找函数构造，没设置的变量取默认值
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let cwd = lookup(PWD_VAR)
            .filter(|cwd| cwd.starts_with('/'))
            .unwrap_or(defaults.cwd);
        let disk_path = lookup(DISK_VAR)
            .filter(|path| !path.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.disk_path);
        let debug = lookup(DEBUG_VAR)
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(defaults.debug);

        Self {
            cwd,
            disk_path,
            debug,
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.debug {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        }
    }

    /// 初始化日志；RUST_LOG 优先于 debug 开关
    pub fn init_logger(&self) {
        let _ = env_logger::builder()
            .filter_level(self.log_level())
            .parse_default_env()
            .format_timestamp_millis()
            .try_init();
    }
}
