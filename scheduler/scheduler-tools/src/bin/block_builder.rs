use anyhow::Context;
use env_logger::{Builder, Env};
use scheduler_tools::config::{BlockBuilderCli, BlockConfig};
use scheduler_tools::genesis::Genesis;
use scheduler_tools::ledger::InMemoryLedger;
use scheduler_tools::pending::load_pending;
use std::io::Write;
use structopt::StructOpt;

#[macro_use]
extern crate log;

fn main() -> anyhow::Result<()> {
    let cli = BlockBuilderCli::from_args();
    setup_logger(cli.trace, cli.debug, cli.no_log_timestamp);
    info!("Starting up block-builder version {}!", env!("CARGO_PKG_VERSION"));

    let config = BlockConfig::resolve(&cli)?;
    debug!("{:?}", config);

    let genesis = Genesis::from_file(&cli.genesis)
        .with_context(|| format!("Could not load genesis from {}", cli.genesis.display()))?;
    let mut ledger = InMemoryLedger::from_genesis(genesis);
    info!("Loaded ledger with {} accounts", ledger.account_count());

    let pending = load_pending(&cli.pending).with_context(|| {
        format!("Could not load pending items from {}", cli.pending.display())
    })?;
    info!("Loaded {} pending items", pending.len());

    let filtered = scheduler_tools::build_block(&config, &mut ledger, pending.into_groups())?;
    info!(
        "Charged {} in execution costs, enqueued {} chain updates",
        ledger.execution_costs(),
        ledger.enqueued_updates().len()
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &filtered)?;
    writeln!(out)?;
    Ok(())
}

fn setup_logger(trace: bool, debug: bool, no_log_timestamp: bool) {
    let env = if trace {
        Env::default().filter_or("LOG_LEVEL", "trace")
    } else if debug {
        Env::default().filter_or("LOG_LEVEL", "debug")
    } else {
        Env::default().filter_or("LOG_LEVEL", "info")
    };

    let mut log_builder = Builder::from_env(env);
    if no_log_timestamp {
        log_builder.format_timestamp(None);
    } else {
        log_builder.format(|buf, record| {
            writeln!(buf, "{}: {}: {}", buf.timestamp_nanos(), record.level(), record.args())
        });
    }
    log_builder.init();
}
