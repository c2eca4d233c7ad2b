use std::fs;
use std::process;

use anyhow::{Context, Result};
use log::{debug, error, info, warn};

use exectest::config::{CliArgs, ExecutorConfig};
use exectest::executable::fallback;
use exectest::{
    ExecutableTest, Interpret, MarkerProtocol, NoInterpretation, ResultRecord, RunStatus,
};

fn main() {
    let args = CliArgs::parse_args();

    // RUST_LOG 优先于 -v / -q
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(args.get_log_level()),
    )
    .init();

    let code = match run(&args) {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            2
        }
    };
    process::exit(code);
}

fn run(args: &CliArgs) -> Result<i32> {
    let mut config = match &args.config {
        Some(path) => ExecutorConfig::from_file(path)?,
        None => ExecutorConfig::default(),
    };
    config.apply_cli(args);
    debug!("Executor config: {config:?}");

    let record = if config.interpret {
        let protocol = MarkerProtocol::with_sentinel(config.sentinel.clone());
        execute(&args.command, &config, protocol)?
    } else {
        execute(&args.command, &config, NoInterpretation)?
    };

    let json = serde_json::to_string_pretty(&record)?;
    match &args.output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Result written to {}", path.display());
        }
        None => println!("{json}"),
    }

    Ok(if fallback::is_success(record.overall_result.as_ref()) {
        0
    } else {
        1
    })
}

fn execute<I: Interpret>(
    command: &[String],
    config: &ExecutorConfig,
    interpreter: I,
) -> Result<ResultRecord> {
    let mut test = ExecutableTest::new(command.iter().cloned(), interpreter)?
        .with_envs(config.env.clone())
        .with_timeout(config.timeout);
    if let Some(cwd) = &config.cwd {
        test = test.with_cwd(cwd.clone());
    }

    let status = test.run()?;
    let mut record = test.into_result();
    match status {
        RunStatus::NotLaunched { reason } => {
            warn!("Test was not launched: {reason}");
            fallback::mark_not_launched(&mut record, &reason);
        }
        RunStatus::Completed if config.fallback => fallback::apply_exit_fallback(&mut record),
        RunStatus::Completed => {}
    }

    info!(
        "{}: {} ({} subtests)",
        record.command,
        record
            .overall_result
            .as_ref()
            .map_or("<none>", |r| r.as_str()),
        record.subtests().len()
    );
    Ok(record)
}
