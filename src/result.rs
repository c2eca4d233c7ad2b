//! 单次测试执行的结果记录

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::status::Status;

/// 一次测试调用累积下来的结果
///
/// `subtests` 只能按键增量写入（`upsert_subtest` / `merge_subtests`），
/// 后写入的同名子测试覆盖旧值，但不会影响其他子测试。
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ResultRecord {
    /// 子进程的标准输出，后接标准错误
    #[serde(rename = "out")]
    pub raw_output: String,
    /// 整体结果，未被协议行或兜底策略设置前为空
    #[serde(rename = "result", default, skip_serializing_if = "Option::is_none")]
    pub overall_result: Option<Status>,
    /// 子测试名称 -> 状态
    #[serde(rename = "subtest", default)]
    subtests: BTreeMap<String, Status>,
    /// 实际执行的命令行
    #[serde(default)]
    pub command: String,
    /// 额外的环境变量，形如 `KEY="VALUE"`
    #[serde(default)]
    pub environment: String,
    /// 退出码；被信号终止时为负的信号值
    #[serde(default)]
    pub returncode: Option<i32>,
    /// 开始执行的时间
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started: Option<DateTime<Local>>,
    /// 执行耗时
    #[serde(with = "humantime_serde", default, skip_serializing_if = "Option::is_none")]
    pub time: Option<Duration>,
    /// 是否因超时被终止
    #[serde(default)]
    pub timed_out: bool,
}

impl ResultRecord {
    /// 创建一个空的结果记录
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置整体结果，后写入者生效
    pub fn set_result(&mut self, status: impl Into<Status>) {
        self.overall_result = Some(status.into());
    }

    /// 写入单个子测试的状态，返回被覆盖的旧值
    pub fn upsert_subtest(
        &mut self,
        name: impl Into<String>,
        status: impl Into<Status>,
    ) -> Option<Status> {
        self.subtests.insert(name.into(), status.into())
    }

    /// 按顺序写入一批子测试
    pub fn merge_subtests<I, K, V>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Status>,
    {
        for (name, status) in entries {
            self.upsert_subtest(name, status);
        }
    }

    pub fn subtests(&self) -> &BTreeMap<String, Status> {
        &self.subtests
    }

    pub fn subtest(&self, name: &str) -> Option<&Status> {
        self.subtests.get(name)
    }

    /// 输出中不以 `sentinel` 开头的行，即普通的诊断/日志输出
    pub fn diagnostic_lines<'a>(&'a self, sentinel: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.raw_output
            .lines()
            .filter(move |line| !line.starts_with(sentinel))
    }
}
