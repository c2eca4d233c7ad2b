//! Utility helpers shared by the library and the command line front end.

use anyhow::{Context, Result};
use log::error;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Reads a TOML file into an arbitrary struct.
///
/// # Parameters
///
/// - `path`: The path of the TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or data parsing fails.
pub fn read_toml_from_file<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned,
{
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: T = match toml::de::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to parse TOML file: {e}");
            return Err(e).with_context(|| format!("Invalid TOML in {}", path.display()));
        }
    };
    Ok(config)
}

/// 把环境变量格式化为 `KEY="VALUE"`，以空格分隔
pub fn format_environment(env: &BTreeMap<String, String>) -> String {
    env.iter()
        .map(|(key, value)| format!("{key}=\"{value}\""))
        .collect::<Vec<_>>()
        .join(" ")
}

/// 解析 `KEY=VALUE` 形式的命令行参数
pub fn parse_env_pair(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("invalid KEY=VALUE pair: `{s}`")),
    }
}
