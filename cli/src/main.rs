//! chainsync CLI — synchronize a contract's events and inspect the stored cursor.
//!
//! Usage:
//! ```bash
//! chainsync sync   --rpc http://localhost:8545 --contract 0x2E64… --db gravity.db --target 0xabc…
//! chainsync status --db gravity.db --id gravity
//! chainsync info
//! ```

mod logging;

use std::collections::{HashMap, HashSet};
use std::env;
use std::process;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};

use chainsync_core::{BlockHash, Checkpoint, Cursor, SyncConfig, SyncStore};
use chainsync_evm::{GravatarDecoder, JsonRpcLedger, SyncBuilder};
use chainsync_storage::SqliteStorage;

use logging::{init_tracing, LogConfig, LOG_ENV};

/// Flags that take no value.
const SWITCHES: &[&str] = &["json", "verify-canonical"];

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "info" => {
            cmd_info();
            Ok(())
        }
        "status" => cmd_status(&args[2..]).await,
        "sync" => cmd_sync(&args[2..]).await,
        "version" | "--version" | "-V" => {
            println!("chainsync {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn print_usage() {
    println!("chainsync {}", env!("CARGO_PKG_VERSION"));
    println!("Incremental, cursor-based contract event synchronization\n");
    println!("USAGE:");
    println!("    chainsync <COMMAND> [OPTIONS]\n");
    println!("COMMANDS:");
    println!("    sync     Apply every event up to a target block and advance the cursor");
    println!("    status   Show the stored cursor and entity count");
    println!("    info     Show ChainSync configuration info");
    println!("    version  Print version");
    println!("    help     Print this help\n");
    println!("SYNC OPTIONS:");
    println!("    --rpc <url>            JSON-RPC endpoint");
    println!("    --contract <address>   Watched contract");
    println!("    --db <path>            SQLite database file");
    println!("    --target <hash>        Block hash to synchronize up to");
    println!("    --id <name>            Instance id (default: \"default\")");
    println!("    --config <file>        JSON config; flags override its fields");
    println!("    --max-range <blocks>   Walk limit per call (0 = unbounded)");
    println!("    --verify-canonical     Re-check the target before advancing the cursor");
    println!("    --log-level <level>    trace | debug | info | warn | error");
    println!("    --json                 JSON log output\n");
    println!("STATUS OPTIONS:");
    println!("    --db <path>            SQLite database file");
    println!("    --id <name>            Instance id (default: \"default\")\n");
    println!("ENVIRONMENT:");
    println!("    {LOG_ENV}          Log filter directive, overrides --log-level");
}

fn cmd_info() {
    let defaults = SyncConfig::default();
    println!("ChainSync v{}", env!("CARGO_PKG_VERSION"));
    println!("  Default instance id: {}", defaults.id);
    match defaults.max_range {
        Some(n) => println!("  Default walk limit: {n} blocks/call"),
        None => println!("  Default walk limit: unbounded"),
    }
    println!("  Cursor writes: one per successful call");
    println!("  Event order per block: created, then updated");
    println!("  Storage backends: memory, SQLite (feature: sqlite)");
    println!("  Decoders: Gravity registry (NewGravatar, UpdatedGravatar)");
}

async fn cmd_status(args: &[String]) -> Result<()> {
    let flags = Flags::parse(args)?;
    init_tracing(&flags.log_config());

    let db = flags.required("db")?;
    let id = flags.get("id").unwrap_or("default");
    let store = SqliteStorage::open(db)
        .await
        .with_context(|| format!("opening {db}"))?;

    let checkpoint = store.load_cursor(id).await?;
    for line in status_lines(id, checkpoint.as_ref()) {
        println!("{line}");
    }
    println!("entities:  {}", store.entity_count().await?);
    let cursor = Cursor::from(checkpoint.map(|cp| cp.block_hash));
    tracing::debug!(id, %cursor, "status read");
    Ok(())
}

/// The cursor part of `status` output.
fn status_lines(id: &str, checkpoint: Option<&Checkpoint>) -> Vec<String> {
    let mut lines = vec![format!("instance:  {id}")];
    match checkpoint {
        Some(cp) => {
            lines.push(format!("cursor:    {} (block {})", cp.block_hash, cp.block_number));
            lines.push(format!("updated:   {}", cp.updated_at));
        }
        None => lines.push("cursor:    none".to_string()),
    }
    lines
}

async fn cmd_sync(args: &[String]) -> Result<()> {
    let flags = Flags::parse(args)?;
    init_tracing(&flags.log_config());

    let config = flags.sync_config()?;
    let rpc = flags.required("rpc")?;
    let db = flags.required("db")?;
    let target = BlockHash::new(flags.required("target")?);

    let ledger = JsonRpcLedger::new(rpc)?;
    let store = SqliteStorage::open(db)
        .await
        .with_context(|| format!("opening {db}"))?;

    let sync = SyncBuilder::from_config(config).build(
        Arc::new(ledger),
        Arc::new(GravatarDecoder::new()),
        Arc::new(store),
    )?;

    let report = sync.synchronize(&target).await?;
    println!("previous cursor: {}", report.previous_cursor);
    println!("cursor:          {}", report.cursor);
    println!("blocks applied:  {}", report.blocks);
    println!("created:         {}", report.created);
    println!("updated:         {}", report.updated);
    println!("skipped logs:    {}", report.skipped_logs);
    Ok(())
}

/// `--key value` options and bare `--switch` flags.
#[derive(Debug, Default)]
struct Flags {
    values: HashMap<String, String>,
    switches: HashSet<String>,
}

impl Flags {
    fn parse(args: &[String]) -> Result<Self> {
        let mut flags = Self::default();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            let name = arg
                .strip_prefix("--")
                .ok_or_else(|| anyhow!("unexpected argument: {arg}"))?;
            if SWITCHES.contains(&name) {
                flags.switches.insert(name.to_string());
                continue;
            }
            let value = iter
                .next()
                .ok_or_else(|| anyhow!("--{name} requires a value"))?;
            flags.values.insert(name.to_string(), value.clone());
        }
        Ok(flags)
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    fn required(&self, name: &str) -> Result<&str> {
        self.get(name).ok_or_else(|| anyhow!("missing --{name}"))
    }

    fn switch(&self, name: &str) -> bool {
        self.switches.contains(name)
    }

    fn log_config(&self) -> LogConfig {
        LogConfig {
            level: self.get("log-level").unwrap_or("info").to_string(),
            json: self.switch("json"),
        }
    }

    /// Config file (if any) with flag overrides applied.
    fn sync_config(&self) -> Result<SyncConfig> {
        let mut config = match self.get("config") {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {path}"))?;
                SyncConfig::from_json_str(&text)?
            }
            None => SyncConfig::default(),
        };
        if let Some(id) = self.get("id") {
            config.id = id.to_string();
        }
        if let Some(contract) = self.get("contract") {
            config.contract_address = contract.to_string();
        }
        if let Some(raw) = self.get("max-range") {
            let n: u64 = raw
                .parse()
                .with_context(|| format!("invalid --max-range: {raw}"))?;
            config.max_range = if n == 0 { None } else { Some(n) };
        }
        if self.switch("verify-canonical") {
            config.verify_canonical = true;
        }
        if config.contract_address.is_empty() {
            bail!("missing --contract (or contract_address in --config)");
        }
        Ok(config)
    }
}
