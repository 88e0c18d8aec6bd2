use colored::*;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use std::error::Error;

use crate::{
    disk::BlockDevice,
    fs::{config::PATH_SEPARATOR, error::FileSystemError, FileSystem},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Ls(Option<String>),
    Pwd,
    Cd(String),
    Mkdir(String),
    Rmdir(String),
    Create(String),
    Rm(String),
    Stat(String),
    Df,
    Format,
    Exit,
}

/// 把 `path` 相对 `cwd` 展开成规范的绝对路径（折叠 `.` 和 `..`）
pub fn normalize_path(cwd: &str, path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    let base = if path.starts_with(PATH_SEPARATOR) { "" } else { cwd };
    for part in base.split(PATH_SEPARATOR).chain(path.split(PATH_SEPARATOR)) {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            name => parts.push(name),
        }
    }
    format!("{}{}", PATH_SEPARATOR, parts.join("/"))
}

pub fn execute_command<D: BlockDevice>(
    cmd: &Command,
    fs: &mut FileSystem<D>,
    current_dir: &mut String,
) -> Result<(), Box<dyn Error>> {
    match cmd {
        Command::Help => print_help(),
        Command::Ls(path) => {
            let target = path.as_deref().unwrap_or("");
            for line in fs.list(current_dir, target)? {
                if line.ends_with(PATH_SEPARATOR) {
                    println!("📁  {}", line.blue());
                } else {
                    println!("📄  {}", line);
                }
            }
        }
        Command::Pwd => println!("📍 {}", current_dir.cyan()),
        Command::Cd(path) => {
            let target = normalize_path(current_dir, path);
            fs.resolve_directory(&target)?;
            *current_dir = target;
            println!("📂 Moved to {}", current_dir.blue());
        }
        Command::Mkdir(path) => {
            fs.mkdir(current_dir, path)?;
            println!(
                "✅ Created directory: {}",
                normalize_path(current_dir, path).green()
            );
        }
        Command::Rmdir(path) => {
            fs.rmdir(current_dir, path)?;
            println!(
                "🗑️ Removed directory: {}",
                normalize_path(current_dir, path).red()
            );
        }
        Command::Create(path) => {
            fs.touch(current_dir, path)?;
            println!(
                "📝 Created file: {}",
                normalize_path(current_dir, path).green()
            );
        }
        Command::Rm(path) => {
            fs.remove(current_dir, path)?;
            println!(
                "❌ Deleted file: {}",
                normalize_path(current_dir, path).red()
            );
        }
        Command::Stat(path) => {
            let (inode_ref, inode) = fs.stat(current_dir, path)?;
            println!(
                "{}\n{}: {}\n{}: {}\n{}: {}\n{}: {}\n{}: {}\n",
                "📊 Inode Info".bright_yellow().bold(),
                "Path".blue(),
                normalize_path(current_dir, path),
                "Inode".blue(),
                inode_ref,
                "Type".blue(),
                inode.inode_type.name(),
                "Links".blue(),
                inode.n_references,
                "Size".blue(),
                inode.size
            );
        }
        Command::Df => {
            let usage = fs.usage()?;
            println!(
                "{}: {}/{} free\n{}: {}/{} free",
                "Blocks".blue(),
                usage.free_blocks,
                usage.total_blocks,
                "Inodes".blue(),
                usage.free_inodes,
                usage.total_inodes
            );
        }
        Command::Format => {
            let confirmed = Confirm::new()
                .with_prompt("Formatting erases every file on the virtual disk. Continue?")
                .default(false)
                .interact()?;
            if !confirmed {
                println!("{}", "Format cancelled.".yellow());
                return Ok(());
            }
            format_with_progress_bar(fs)?;
            *current_dir = PATH_SEPARATOR.to_string();
        }
        Command::Exit => println!("{}", "👋 Exiting MiniFS shell...".yellow().bold()),
    }

    Ok(())
}

pub fn format_with_progress_bar<D: BlockDevice>(
    fs: &mut FileSystem<D>,
) -> Result<(), FileSystemError> {
    println!("💾 Formatting virtual disk...");
    let pb = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::with_template("[{bar:40.green/black}] {pos:>3}/{len} {msg}") {
        pb.set_style(style.progress_chars("#>-"));
    }
    fs.format_with_progress(|done, total| {
        pb.set_length(total);
        pb.set_position(done);
    })?;
    pb.finish_with_message("✅ Disk formatted successfully!");
    Ok(())
}

fn print_help() {
    println!("{}", "📘 MiniFS Commands".bright_cyan().bold());
    println!(
        "{}",
        "
  ls [path]          List a directory (or show a file)
  pwd                Print current path
  cd [path]          Change directory (default /)
  mkdir <path>       Create directory
  rmdir <path>       Remove an empty directory
  create <path>      Create an empty file
  rm <path>          Remove file
  stat <path>        Show inode info
  df                 Show free blocks and inodes
  format             Format virtual disk
  help               Show this help message
  exit               Quit the shell
"
        .bright_black()
    );
}
