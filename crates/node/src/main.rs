mod blockfiles;
mod config;
mod context;
mod engine;

use std::fs::{self, File};
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;

use argond_chaindb::loader::CheckParams;
use argond_consensus::chain_params;
use argond_log::{log_error, log_info, LogConfig};
use argond_primitives::hash::hash_to_hex;
use argond_storage::{KeyValueStore, StoreOptions};
use fs2::FileExt;

use crate::config::{Config, USAGE};
use crate::context::NodeContext;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match Config::parse(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("argond: {err}");
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    argond_log::init(LogConfig {
        level: config.log_level,
        format: config.log_format,
        timestamps: true,
    });

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log_error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> Result<(), String> {
    fs::create_dir_all(&config.data_dir)
        .map_err(|err| format!("cannot create {}: {err}", config.data_dir.display()))?;

    let lock_path = config.data_dir.join(".lock");
    let lock_file =
        File::create(&lock_path).map_err(|err| format!("cannot create lock file: {err}"))?;
    lock_file.try_lock_exclusive().map_err(|_| {
        format!(
            "data directory {} is already in use",
            config.data_dir.display()
        )
    })?;

    let params = chain_params(config.network);
    log_info!(
        "starting argond on {:?}, datadir {}",
        params.network,
        config.data_dir.display()
    );

    let options = StoreOptions {
        create_if_missing: true,
        cache_bytes: config.db_cache_mb * 1024 * 1024,
        ..StoreOptions::default()
    };
    let context =
        NodeContext::open(params, &config.data_dir, options).map_err(|err| err.to_string())?;

    if let Some(key) = &config.spork_key {
        context
            .sporks()
            .set_signing_key(key)
            .map_err(|err| format!("spork key rejected: {err}"))?;
    }

    let shutdown = AtomicBool::new(false);
    let check = CheckParams {
        level: config.check_level,
        depth: config.check_blocks,
    };
    let outcome = context
        .startup(check, &shutdown)
        .map_err(|err| format!("block index load failed: {err}"))?;

    match &outcome.best {
        Some(tip) => log_info!(
            "chain index ready: height={} tip={} trust={}",
            tip.height,
            hash_to_hex(&tip.hash),
            tip.chain_trust
        ),
        None => log_info!("chain index ready: fresh state, no tip yet"),
    }
    if let Some(fork) = &outcome.reorged_to {
        log_info!("self-check rewound the best chain to {}", hash_to_hex(fork));
    }

    context
        .db()
        .store()
        .close()
        .map_err(|err| format!("close failed: {err}"))?;
    Ok(())
}
