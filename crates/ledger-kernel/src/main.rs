//! Ledger Kernel CLI
//!
//! Demo, throughput benchmark and simulator front end.

use anyhow::{bail, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use ed25519_dalek::SigningKey;
use ledger_kernel::prelude::*;
use ledger_kernel::resource::chunk_lengths;
use ledger_kernel::test_harness::{run_simulator, SimulatorConfig, TestHarness};
use rand::rngs::OsRng;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut cli = Command::new("ledger-kernel")
        .version(ledger_kernel::VERSION)
        .about("Atomic batch-mutation kernel for keyed numeric records")
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .help("Path to a TOML ledger configuration"),
        )
        .subcommand(
            Command::new("demo")
                .about("Initialize records and apply one batch to all of them")
                .arg(
                    Arg::new("items")
                        .long("items")
                        .default_value("10")
                        .value_parser(value_parser!(usize))
                        .help("Number of records to create"),
                )
                .arg(
                    Arg::new("amount")
                        .long("amount")
                        .default_value("10")
                        .value_parser(value_parser!(u64))
                        .help("Amount added to every record"),
                ),
        )
        .subcommand(
            Command::new("bench")
                .about("Measure batch throughput")
                .arg(
                    Arg::new("items")
                        .long("items")
                        .default_value("1024")
                        .value_parser(value_parser!(usize))
                        .help("Number of records to create"),
                )
                .arg(
                    Arg::new("rounds")
                        .long("rounds")
                        .default_value("10")
                        .value_parser(value_parser!(u64))
                        .help("Times every record is incremented"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("simulate")
                .about("Run the ledger simulator")
                .arg(
                    Arg::new("batches")
                        .long("batches")
                        .default_value("1000")
                        .value_parser(value_parser!(u64))
                        .help("Number of batches to submit"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .default_value("42")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                )
                .arg(
                    Arg::new("seeds")
                        .long("seeds")
                        .value_parser(value_parser!(u64))
                        .help("Certify over seeds 0..N instead of a single seed"),
                )
                .arg(
                    Arg::new("stop-on-violation")
                        .long("stop-on-violation")
                        .action(ArgAction::SetTrue)
                        .help("Stop simulation on first violation"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        );

    let matches = cli.get_matches_mut();
    let config = load_config(&matches)?;

    match matches.subcommand() {
        Some(("demo", args)) => demo(config, args),
        Some(("bench", args)) => bench(config, args),
        Some(("simulate", args)) => simulate(config, args),
        _ => {
            cli.print_help()?;
            Ok(())
        }
    }
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<LedgerConfig> {
    match matches.get_one::<String>("config") {
        Some(path) => LedgerConfig::from_path(path)
            .with_context(|| format!("loading configuration from {path}")),
        None => Ok(LedgerConfig::default()),
    }
}

fn demo(config: LedgerConfig, args: &ArgMatches) -> anyhow::Result<()> {
    let items = args.get_one::<usize>("items").copied().unwrap_or(10);
    let amount = args.get_one::<u64>("amount").copied().unwrap_or(10);

    let signing_key = SigningKey::generate(&mut OsRng);
    let authority = Authority::from(&signing_key);
    let ledger = Ledger::with_config(config)?;

    println!("Initializing {items} items...");
    let keys = (0..items)
        .map(|_| ledger.initialize_item(authority, 0))
        .collect::<Result<Vec<_>, _>>()?;

    let operations = vec![Operation::add(amount); items];
    let refs: Vec<RecordRef> = keys.iter().copied().map(RecordRef::writable).collect();
    let credential = AuthorityCredential::sign(&signing_key, &operations, &keys);

    println!("Items initialized. Starting batch process...");
    let receipt = ledger.batch_process(Some(&credential), &operations, &refs)?;
    println!("Batch {} applied {} operations", receipt.batch_id, receipt.applied);

    for key in &keys {
        let value = ledger.fetch(*key)?;
        println!("  {key}: {value}");
        if value != amount {
            bail!("record {key} holds {value}, expected {amount}");
        }
    }
    println!("Journal entries: {}", ledger.journal().len());
    ledger.verify_journal()?;
    Ok(())
}

fn bench(config: LedgerConfig, args: &ArgMatches) -> anyhow::Result<()> {
    let items = args.get_one::<usize>("items").copied().unwrap_or(1024);
    let rounds = args.get_one::<u64>("rounds").copied().unwrap_or(10);
    let json = args.get_flag("json");

    let signing_key = SigningKey::generate(&mut OsRng);
    let authority = Authority::from(&signing_key);
    let max_batch_size = config.max_batch_size;
    let ledger = Ledger::with_config(config)?;

    let keys = (0..items)
        .map(|_| ledger.initialize_item(authority, 0))
        .collect::<Result<Vec<_>, _>>()?;

    // Pre-sign every chunk so the timed loop measures the kernel only
    let mut batches = Vec::new();
    let mut offset = 0;
    for len in chunk_lengths(items, max_batch_size) {
        let chunk = &keys[offset..offset + len];
        let operations = vec![Operation::add(1); len];
        let refs: Vec<RecordRef> = chunk.iter().copied().map(RecordRef::writable).collect();
        let credential = AuthorityCredential::sign(&signing_key, &operations, chunk);
        batches.push((credential, operations, refs));
        offset += len;
    }

    let start = Instant::now();
    for _ in 0..rounds {
        for (credential, operations, refs) in &batches {
            ledger.batch_process(Some(credential), operations, refs)?;
        }
    }
    let elapsed = start.elapsed();

    for key in &keys {
        let value = ledger.fetch(*key)?;
        if value != rounds {
            bail!("record {key} holds {value} after {rounds} rounds");
        }
    }

    let operations = items as u64 * rounds;
    let batch_count = batches.len() as u64 * rounds;
    let ops_per_sec = operations as f64 / elapsed.as_secs_f64().max(f64::EPSILON);

    if json {
        let report = serde_json::json!({
            "kernel_version": ledger_kernel::VERSION,
            "api_version": ledger.api_version().to_string(),
            "items": items,
            "rounds": rounds,
            "max_batch_size": max_batch_size,
            "batches": batch_count,
            "operations": operations,
            "elapsed_ms": elapsed.as_millis() as u64,
            "operations_per_sec": ops_per_sec,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Benchmark Report");
        println!("================");
        println!("Items: {items}");
        println!("Rounds: {rounds}");
        println!("Batches: {batch_count} (max {max_batch_size} entries)");
        println!("Operations: {operations}");
        println!("Elapsed: {} ms", elapsed.as_millis());
        println!("Throughput: {ops_per_sec:.0} ops/s");
    }
    Ok(())
}

fn simulate(config: LedgerConfig, args: &ArgMatches) -> anyhow::Result<()> {
    let batches = args.get_one::<u64>("batches").copied().unwrap_or(1000);
    let seed = args.get_one::<u64>("seed").copied().unwrap_or(42);
    let json = args.get_flag("json");

    let sim_config = SimulatorConfig {
        seed,
        total_batches: batches,
        stop_on_first_violation: args.get_flag("stop-on-violation"),
        ledger: config,
        ..Default::default()
    };

    let passed = if let Some(&seeds) = args.get_one::<u64>("seeds") {
        let report = TestHarness::run_certification(seeds, sim_config);
        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("Certification over {} seeds", report.seeds_tested);
            println!("  Batches committed: {}", report.batches_committed);
            println!("  Violations: {}", report.total_violations);
            println!("  Failed seeds: {:?}", report.failed_seeds);
            println!("  Result: {}", if report.passed { "PASS" } else { "FAIL" });
        }
        report.passed
    } else {
        let report = run_simulator(sim_config);
        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("{}", report.generate_text());
        }
        report.passed()
    };

    if !passed {
        bail!("simulation detected invariant violations");
    }
    Ok(())
}
