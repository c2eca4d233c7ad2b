//! 配置模块
//!
//! 命令行参数与 TOML 配置文件，命令行中给出的值覆盖配置文件。

pub mod cli_args;
pub mod executor_config;

pub use cli_args::CliArgs;
pub use executor_config::ExecutorConfig;
