//! 可执行测试
//!
//! `ExecutableTest` 负责一次子进程调用的完整生命周期：执行命令、
//! 收集输出，再交给解释策略（`Interpret`）把输出转换成结构化结果。
//! 执行层出错（命令找不到、无法启动）时直接返回，解释步骤不会被调用。

use anyhow::{bail, Context, Result};
use chrono::Local;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::process::{CommandSpec, LocalExecutor, ProcessExecutor};
use crate::result::ResultRecord;
use crate::utils;

pub mod fallback;
pub mod protocol;

pub use protocol::{MarkerProtocol, ProtocolUpdate, DEFAULT_SENTINEL};

/// 输出解释策略
///
/// 默认实现什么也不做，具体协议通过实现该特质来定义如何把
/// `raw_output` 转换成 `overall_result` 和 `subtests`。
#[cfg_attr(test, mockall::automock)]
pub trait Interpret {
    /// 解释 `result.raw_output` 并就地修改 `result`
    ///
    /// 返回的错误代表逻辑错误，会原样传递给 `run()` 的调用者。
    fn interpret_result(&mut self, _result: &mut ResultRecord) -> Result<()> {
        Ok(())
    }
}

/// 不做任何解释，只保留原始输出
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInterpretation;

impl Interpret for NoInterpretation {}

/// `run()` 的结束方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// 子进程已运行完毕，输出已解释
    Completed,
    /// 子进程没有启动，解释步骤被跳过
    NotLaunched { reason: String },
}

/// 一个通过外部命令执行的测试
pub struct ExecutableTest<I = NoInterpretation> {
    command: Vec<String>,
    env: BTreeMap<String, String>,
    cwd: Option<PathBuf>,
    timeout: Option<Duration>,
    result: ResultRecord,
    interpreter: I,
    executor: Box<dyn ProcessExecutor + Send>,
}

/// 使用标记协议解释输出的测试
pub type MarkerProtocolTest = ExecutableTest<MarkerProtocol>;

impl MarkerProtocolTest {
    /// 以默认哨兵前缀创建测试
    pub fn with_marker_protocol<C, S>(command: C) -> Result<Self>
    where
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(command, MarkerProtocol::default())
    }
}

impl<I: Interpret> ExecutableTest<I> {
    /// 创建新的可执行测试，命令不能为空
    pub fn new<C, S>(command: C, interpreter: I) -> Result<Self>
    where
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let command: Vec<String> = command.into_iter().map(Into::into).collect();
        if command.is_empty() {
            bail!("Test command must not be empty");
        }
        Ok(Self {
            command,
            env: BTreeMap::new(),
            cwd: None,
            timeout: None,
            result: ResultRecord::new(),
            interpreter,
            executor: Box::new(LocalExecutor::new()),
        })
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_envs<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// 替换进程执行器（默认为 `LocalExecutor`）
    pub fn with_executor(mut self, executor: Box<dyn ProcessExecutor + Send>) -> Self {
        self.executor = executor;
        self
    }

    pub fn command(&self) -> &[String] {
        &self.command
    }

    pub fn result(&self) -> &ResultRecord {
        &self.result
    }

    /// 可变访问结果记录，用于注入在别处采集到的输出
    pub fn result_mut(&mut self) -> &mut ResultRecord {
        &mut self.result
    }

    pub fn into_result(self) -> ResultRecord {
        self.result
    }

    pub fn interpreter(&self) -> &I {
        &self.interpreter
    }

    fn command_spec(&self) -> CommandSpec {
        CommandSpec {
            argv: self.command.clone(),
            env: self.env.clone(),
            cwd: self.cwd.clone(),
            timeout: self.timeout,
        }
    }

    /// 执行命令并解释输出
    ///
    /// 每次调用都会从一个新的 `ResultRecord` 开始。命令无法启动时返回
    /// `RunStatus::NotLaunched`，此时 `overall_result` 保持为空，由调用者决定。
    pub fn run(&mut self) -> Result<RunStatus> {
        let spec = self.command_spec();

        self.result = ResultRecord::new();
        self.result.command = spec.command_line();
        self.result.environment = utils::format_environment(&spec.env);
        self.result.started = Some(Local::now());

        let output = match self.executor.execute(&spec) {
            Ok(output) => output,
            Err(e) if e.is_spawn_failure() => {
                warn!("无法启动测试命令 `{}`: {e}", self.result.command);
                return Ok(RunStatus::NotLaunched {
                    reason: e.to_string(),
                });
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to run `{}`", self.result.command));
            }
        };

        self.result.raw_output = output.combined();
        self.result.returncode = output.exit_code;
        self.result.time = Some(output.elapsed);
        self.result.timed_out = output.timed_out;

        self.interpret_result()?;
        debug!(
            "测试 `{}` 完成: result={:?}, {} 个子测试",
            self.result.command,
            self.result.overall_result,
            self.result.subtests().len()
        );
        Ok(RunStatus::Completed)
    }

    /// 对当前结果记录执行解释步骤
    pub fn interpret_result(&mut self) -> Result<()> {
        self.interpreter.interpret_result(&mut self.result)
    }
}
