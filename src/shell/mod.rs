pub mod command;
pub mod parse;

use crate::{
    disk::init::{perform_disk_initialization, BootProgress},
    environment::Environment,
    shell::{command::execute_command, parse::parse_command},
};
use colored::*;
use crossterm::{
    cursor, execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use indicatif::{ProgressBar, ProgressStyle};
use log::warn;
use reedline::{DefaultCompleter, DefaultPrompt, DefaultPromptSegment, Reedline, Signal};
use std::{io::stdout, path::PathBuf};

const COMMANDS: [&str; 12] = [
    "help", "ls", "pwd", "cd", "mkdir", "rmdir", "create", "rm", "stat", "df", "format", "exit",
];

pub fn start_shell(env: Environment) {
    boot_banner();

    let mut fs = match boot(&env) {
        Some(fs) => fs,
        None => return,
    };

    let username = whoami::username();
    let hostname = whoami::fallible::hostname().unwrap_or_else(|_| "localhost".to_string());

    // 初始工作目录不存在时退回根目录
    let mut current_dir = if fs.resolve_directory(&env.cwd).is_ok() {
        env.cwd.clone()
    } else {
        warn!("{} is not a directory on this disk, starting at /", env.cwd);
        "/".to_string()
    };

    println!(
        "{}",
        "Type 'help' for available commands. Use ↑↓ for history, Tab for auto-completion.\n"
            .bright_black()
    );

    // 初始化 reedline
    let history_path = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".minifs_history");

    let mut line_editor = Reedline::create();
    match reedline::FileBackedHistory::with_file(100, history_path) {
        Ok(history) => line_editor = line_editor.with_history(Box::new(history)),
        Err(e) => warn!("command history disabled: {}", e),
    }

    // 命令补全
    let completer =
        DefaultCompleter::new_with_wordlen(COMMANDS.iter().map(|c| c.to_string()).collect(), 2);
    line_editor = line_editor.with_completer(Box::new(completer));

    loop {
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic(format!("{}@{}:{}", username, hostname, current_dir)),
            DefaultPromptSegment::Basic("MiniFS".to_string()),
        );

        match line_editor.read_line(&prompt) {
            Ok(Signal::Success(buffer)) => {
                let trimmed = buffer.trim();
                if trimmed.is_empty() {
                    continue;
                }

                match parse_command(trimmed) {
                    Some(cmd) => {
                        if let Err(e) = execute_command(&cmd, &mut fs, &mut current_dir) {
                            println!("{} {}", "❌ Error:".red().bold(), e);
                        }
                        if matches!(cmd, command::Command::Exit) {
                            break;
                        }
                    }
                    None => println!(
                        "{}",
                        "⚠️  Unknown command. Type 'help' for command list.".yellow()
                    ),
                }
            }
            Ok(Signal::CtrlC) => {
                println!();
                continue;
            }
            Ok(Signal::CtrlD) => {
                println!("{}", "Exiting MiniFS...".yellow());
                break;
            }
            #[allow(unreachable_patterns)]
            Ok(_) => continue,
            Err(e) => {
                println!("Error reading line: {}", e);
                break;
            }
        }
    }

    if let Err(e) = fs.into_device().detach() {
        println!("{} {}", "❌ Failed to detach disk:".red().bold(), e);
    }
    println!("{}", "GoodBye!".bright_yellow());
}

/// 挂接磁盘，新盘格式化时显示进度条
fn boot(env: &Environment) -> Option<crate::fs::FileSystem<crate::disk::FileDisk>> {
    let pb = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::with_template("[{bar:40.cyan/blue}] {pos:>3}/{len} {msg}") {
        pb.set_style(style.progress_chars("=> "));
    }

    let result = perform_disk_initialization(&env.disk_path, |event| match event {
        BootProgress::Step(step) => pb.println(step),
        BootProgress::Formatting { done, total } => {
            pb.set_length(total);
            pb.set_position(done);
        }
    });

    match result {
        Ok(fs) => {
            pb.finish_and_clear();
            println!("{} {}", "✅ Ready:".green(), env.disk_path.display());
            Some(fs)
        }
        Err(e) => {
            pb.abandon();
            println!("{} {}", "❌ Failed to mount disk:".red().bold(), e);
            None
        }
    }
}

/// 欢迎画面
fn boot_banner() {
    let mut stdout = stdout();
    let _ = execute!(
        stdout,
        Clear(ClearType::All),
        cursor::MoveTo(0, 0),
        SetForegroundColor(Color::Cyan),
        Print("Welcome to MiniFS v0.3.0\n"),
        ResetColor
    );
    println!("{}", "[MiniFS Booting...]".bright_yellow().bold());
}
