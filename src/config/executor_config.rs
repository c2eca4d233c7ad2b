//! 执行器配置参数
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;

use crate::config::CliArgs;
use crate::executable::DEFAULT_SENTINEL;
use crate::utils;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ExecutorConfig {
    /// 协议行前缀
    pub sentinel: String,
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,
    pub cwd: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
    /// 是否解释协议行，关闭时只保留原始输出
    pub interpret: bool,
    /// 是否在解释之后应用退出码兜底策略
    pub fallback: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            sentinel: DEFAULT_SENTINEL.to_string(),
            timeout: None,
            cwd: None,
            env: BTreeMap::new(),
            interpret: true,
            fallback: true,
        }
    }
}

impl ExecutorConfig {
    /// 从文件中读取
    pub fn from_file(path: &Path) -> Result<Self> {
        utils::read_toml_from_file(path)
    }

    /// 用命令行参数覆盖配置
    pub fn apply_cli(&mut self, args: &CliArgs) {
        if let Some(sentinel) = &args.sentinel {
            self.sentinel = sentinel.clone();
        }
        if let Some(secs) = args.timeout {
            self.timeout = Some(Duration::from_secs(secs));
        }
        if let Some(cwd) = &args.cwd {
            self.cwd = Some(cwd.clone());
        }
        self.env.extend(args.env.iter().cloned());
        if args.raw {
            self.interpret = false;
        }
        if args.no_fallback {
            self.fallback = false;
        }
    }
}
