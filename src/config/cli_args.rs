use clap::Parser;
use std::path::PathBuf;

use crate::utils::parse_env_pair;

// exectest - 运行单个测试命令并解释其输出中的协议行
#[derive(Parser, Debug)]
#[clap(
    name = "exectest",
    version,
    about = "Run a test command and interpret its result protocol",
    override_usage = "exectest [OPTIONS] -- <COMMAND>...",
    after_help = "PROTOCOL:\n  Lines on stdout starting with the sentinel carry a JSON object:\n    PROTOCOL: {\"result\": \"pass\"}\n    PROTOCOL: {\"subtest\": {\"name\": \"fail\"}}\n\nEXAMPLES:\n  exectest -- ./my-test --quick\n  exectest --timeout 60 -e MESA_DEBUG=silent -- ./my-test\n  exectest -c exectest.toml -o result.json -- ./my-test"
)]
pub struct CliArgs {
    // Config file - TOML executor configuration
    // 配置文件 - TOML 格式的执行器配置
    #[clap(short = 'c', long = "config", help = "TOML executor configuration file")]
    pub config: Option<PathBuf>,

    // Protocol sentinel - Prefix that marks a protocol line
    // 协议前缀 - 标记协议行的前缀
    #[clap(long = "sentinel", help = "Protocol line prefix [default: \"PROTOCOL: \"]")]
    pub sentinel: Option<String>,

    // Command execution timeout (seconds)
    // 执行命令超时时间（秒）
    #[clap(long = "timeout", help = "Kill the command after this many seconds")]
    pub timeout: Option<u64>,

    // Extra environment variables
    // 额外的环境变量
    #[clap(
        short = 'e',
        long = "env",
        value_parser = parse_env_pair,
        help = "Extra environment variable KEY=VALUE (repeatable)"
    )]
    pub env: Vec<(String, String)>,

    // Working directory
    // 工作目录
    #[clap(short = 'C', long = "cwd", help = "Working directory for the command")]
    pub cwd: Option<PathBuf>,

    // Raw mode - Keep the output but do not interpret protocol lines
    // 原始模式 - 只保留输出，不解释协议行
    #[clap(long = "raw", help = "Skip protocol interpretation")]
    pub raw: bool,

    // Disable the exit status fallback
    // 不使用退出码兜底策略
    #[clap(long = "no-fallback", help = "Do not derive the result from the exit status")]
    pub no_fallback: bool,

    // Output file for the JSON result record
    // 结果记录的输出文件
    #[clap(
        long = "output",
        short = 'o',
        help = "Write the JSON result to this file instead of stdout"
    )]
    pub output: Option<PathBuf>,

    // Verbose mode - Show more log information
    // 详细模式 - 显示更多日志信息
    #[clap(short = 'v', long = "verbose", help = "Enable verbose logging")]
    pub verbose: bool,

    // Quiet mode - Only log errors
    // 安静模式 - 只输出错误日志
    #[clap(short = 'q', long = "quiet", help = "Suppress non-essential output")]
    pub quiet: bool,

    // The test command and its arguments
    // 测试命令及其参数
    #[clap(
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        help = "Test command and its arguments"
    )]
    pub command: Vec<String>,
}

impl CliArgs {
    /// Parse command line arguments
    /// 解析命令行参数
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get log level
    /// 获取日志级别
    pub fn get_log_level(&self) -> &str {
        if self.quiet {
            "error"
        } else if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}
