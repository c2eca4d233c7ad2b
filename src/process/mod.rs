//! 进程执行模块
//!
//! 该模块定义了执行外部命令的统一接口，`ExecutableTest` 只通过
//! `ProcessExecutor` 与子进程打交道。

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// 待执行的命令
#[derive(Debug, Clone, Default)]
pub struct CommandSpec {
    /// 参数向量，第一个元素为可执行文件
    pub argv: Vec<String>,
    /// 额外的环境变量
    pub env: BTreeMap<String, String>,
    /// 工作目录
    pub cwd: Option<PathBuf>,
    /// 超时时间，`None` 表示一直等待
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// 以空格拼接的命令行，仅用于记录和日志
    pub fn command_line(&self) -> String {
        self.argv.join(" ")
    }
}

/// 命令执行结果
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// 标准输出
    pub stdout: String,
    /// 标准错误
    pub stderr: String,
    /// 退出码，被信号终止时为负的信号值，超时被杀时为 `None`
    pub exit_code: Option<i32>,
    /// 是否超时
    pub timed_out: bool,
    /// 耗时
    pub elapsed: Duration,
}

impl CommandOutput {
    /// 合并后的输出：标准输出在前，标准错误在后
    ///
    /// 标准输出最后一行没有换行符时补一个，两者的行不会被拼在一起。
    pub fn combined(&self) -> String {
        let mut out = String::with_capacity(self.stdout.len() + self.stderr.len() + 1);
        out.push_str(&self.stdout);
        if !self.stdout.is_empty() && !self.stdout.ends_with('\n') && !self.stderr.is_empty() {
            out.push('\n');
        }
        out.push_str(&self.stderr);
        out
    }
}

/// 执行层错误
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("command is empty")]
    EmptyCommand,
    /// 进程根本没有启动（找不到可执行文件、没有权限等）
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    /// 进程已启动，但读取输出或等待退出时出错
    #[error("I/O error while running command: {0}")]
    Io(#[from] io::Error),
}

impl ExecError {
    /// 子进程是否从未产生过输出流
    pub fn is_spawn_failure(&self) -> bool {
        matches!(self, ExecError::EmptyCommand | ExecError::Spawn { .. })
    }
}

/// 进程执行器特质
#[cfg_attr(test, mockall::automock)]
pub trait ProcessExecutor {
    /// 执行命令，阻塞直到进程退出且输出读取完毕
    ///
    /// 超时被杀掉时，只保证返回杀掉之前已经写出的输出。
    fn execute(&mut self, spec: &CommandSpec) -> Result<CommandOutput, ExecError>;
}

mod local;
pub use local::LocalExecutor;
