use anyhow::{bail, Context};
use battle_core::{
    compute_submission_hash, Asset, BattleConfig, BattleSession, BattleSubmission, MatchResult,
    MatchSnapshot, Winner,
};
use host::market::{default_pair, fallback_assets};
use host::scheduler::wall_clock_ms;
use host::{
    spawn_ledger_worker, BattleHost, FileMarket, FrameLoop, Ledger, LoopExit,
    MemoryLedger, RetryPolicy, StartReport, SystemClock,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Saved battle report format
#[derive(Serialize, Deserialize)]
struct SavedReport {
    result: MatchResult,
    submission: BattleSubmission,
    /// Hex SHA-256 of `submission`
    submission_hash: String,
    snapshot: Option<MatchSnapshot>,
    sources: StartReport,
    config: BattleConfig,
    seed: u64,
}

struct RunArgs {
    asset_a: Option<String>,
    asset_b: Option<String>,
    data_dir: String,
    config_file: Option<String>,
    seed: Option<u64>,
    realtime: bool,
    output_file: Option<String>,
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    println!("🏓 Crypto Pong Battle");
    println!("{}", "=".repeat(70));
    println!();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        std::process::exit(1);
    }

    let command = &args[1];

    let outcome = match command.as_str() {
        "run" => parse_run_args(&args[2..]).and_then(run_command),
        "replay" => {
            if args.len() < 3 {
                eprintln!("Usage: {} replay <report_file>", args[0]);
                std::process::exit(1);
            }
            replay_command(&args[2])
        }
        "--help" | "-h" => {
            print_usage(&args[0]);
            std::process::exit(0);
        }
        _ => {
            eprintln!("❌ Unknown command: {}", command);
            print_usage(&args[0]);
            std::process::exit(1);
        }
    };

    if let Err(e) = outcome {
        eprintln!("❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} <command> [options]", program);
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  run [--a <id>] [--b <id>] [--data <dir>] [--config <file>] [--seed <n>] [--realtime] [--out <file>]");
    eprintln!("      Play one battle between two assets");
    eprintln!("      - --a, --b: asset ids (default: bitcoin vs ethereum)");
    eprintln!("      - --data: directory with <id>.json price charts, assets.json, quotes.json");
    eprintln!("                Default: ./data; missing charts fall back to synthetic prices");
    eprintln!("      - --config: JSON file overriding battle parameters");
    eprintln!("      - --seed: RNG seed for serve directions");
    eprintln!("      - --realtime: play at wall-clock speed instead of simulated time");
    eprintln!("      - --out: save the battle report (JSON)");
    eprintln!();
    eprintln!("  replay <report_file>");
    eprintln!("      Check a saved report's submission digest");
}

fn parse_run_args(args: &[String]) -> anyhow::Result<RunArgs> {
    let mut parsed = RunArgs {
        asset_a: None,
        asset_b: None,
        data_dir: "data".to_string(),
        config_file: None,
        seed: None,
        realtime: false,
        output_file: None,
    };

    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        if flag == "--realtime" {
            parsed.realtime = true;
            i += 1;
            continue;
        }
        let Some(value) = args.get(i + 1).cloned() else {
            bail!("{} requires a value", flag);
        };
        match flag {
            "--a" => parsed.asset_a = Some(value),
            "--b" => parsed.asset_b = Some(value),
            "--data" | "-d" => parsed.data_dir = value,
            "--config" | "-c" => parsed.config_file = Some(value),
            "--seed" => parsed.seed = Some(value.parse().context("--seed must be an integer")?),
            "--out" | "-o" => parsed.output_file = Some(value),
            _ => bail!("unknown option '{}'", flag),
        }
        i += 2;
    }
    Ok(parsed)
}

fn load_config(path: Option<&str>) -> anyhow::Result<BattleConfig> {
    let Some(path) = path else {
        return Ok(BattleConfig::default());
    };
    let raw = fs::read_to_string(path).with_context(|| format!("reading config '{}'", path))?;
    let cfg: BattleConfig =
        serde_json::from_str(&raw).with_context(|| format!("parsing config '{}'", path))?;
    cfg.validate()?;
    Ok(cfg)
}

fn pick(assets: &[Asset], id: Option<&str>, default: &Asset) -> Asset {
    match id {
        None => default.clone(),
        Some(id) => assets
            .iter()
            .find(|a| a.id == id)
            .cloned()
            // unlisted ids are still playable if their chart file exists
            .unwrap_or_else(|| Asset::new(id, id, id)),
    }
}

fn run_command(args: RunArgs) -> anyhow::Result<()> {
    let config = load_config(args.config_file.as_deref())?;
    let seed = args.seed.unwrap_or_else(|| wall_clock_ms() as u64);

    let host = BattleHost::new(FileMarket::new(&args.data_dir), RetryPolicy::default());
    let assets = host.assets();
    let (default_a, default_b) = default_pair(&assets)
        .or_else(|| default_pair(&fallback_assets()))
        .context("no default competitors available")?;
    let asset_a = pick(&assets, args.asset_a.as_deref(), &default_a);
    let asset_b = pick(&assets, args.asset_b.as_deref(), &default_b);

    println!("📋 Battle setup");
    println!("  Coin A: {} ({})", asset_a.symbol, asset_a.id);
    println!("  Coin B: {} ({})", asset_b.symbol, asset_b.id);
    println!("  Duration: {}s", config.duration_ms / 1000);
    println!("  Seed: {}", seed);
    for asset in [&asset_a, &asset_b] {
        if let Some(q) = host.quote(asset) {
            let arrow = if q.change_24h >= 0.0 { "↑" } else { "↓" };
            println!("  {} spot: ${:.2} {} {:.2}%", asset.symbol, q.price, arrow, q.change_24h.abs());
        }
    }
    println!();

    let ledger = Arc::new(Mutex::new(MemoryLedger::new()));
    let (observer, worker) = spawn_ledger_worker(ledger.clone());

    let mut session = BattleSession::new(config.clone(), StdRng::seed_from_u64(seed))?;
    session.subscribe(Box::new(observer));

    println!("⚔️  Battling...");
    let started = Instant::now();
    let (sources, exit) = if args.realtime {
        let mut clock = SystemClock::new(60);
        let sources = host.start_match(&mut session, Some(&asset_a), Some(&asset_b), &clock)?;
        (sources, FrameLoop::new(&config).run(&mut session, &mut clock))
    } else {
        let start_ms = wall_clock_ms();
        host.play_headless(&mut session, &asset_a, &asset_b, start_ms)?
    };
    println!("  Wall time: {:.2}s", started.elapsed().as_secs_f64());
    println!();

    let result = match exit {
        LoopExit::Finished(result) => result,
        LoopExit::Cancelled | LoopExit::Stopped => bail!("battle did not finish"),
    };
    let snapshot = session.snapshot();
    // dropping the session drops the observer, which lets the worker drain and exit
    drop(session);
    let submitted = worker.join().map_err(|_| anyhow::anyhow!("ledger worker panicked"))?;

    let submission = BattleSubmission::from(&result);
    let submission_hash = hex::encode(compute_submission_hash(&submission));

    print_result(&result, sources);
    println!("  Submission Hash: 0x{}", submission_hash);
    println!("  Ledger records: {}", submitted);
    if let Ok(l) = ledger.lock() {
        let stats = l.asset_stats(&result.asset_a.symbol);
        println!("  {} record: {}W {}L {}T", result.asset_a.symbol, stats.wins, stats.losses, stats.ties);
    }

    if let Some(path) = args.output_file.as_deref() {
        let report = SavedReport {
            result,
            submission,
            submission_hash,
            snapshot,
            sources,
            config,
            seed,
        };
        save_report(&report, path)?;
        println!();
        println!("💾 Report saved to: {}", path);
        println!("   Use 'replay {}' to check it", path);
    }
    println!("{}", "=".repeat(70));
    Ok(())
}

fn print_result(result: &MatchResult, sources: StartReport) {
    let headline = match result.winner {
        Winner::Tie => "🤝 TIE".to_string(),
        Winner::A | Winner::B => format!("🏆 {} WINS", result.winner_symbol()),
    };
    println!("{}", headline);
    println!(
        "  {}: {:+.2}%   {}: {:+.2}%   (margin {:.2}%)",
        result.asset_a.symbol,
        result.cumulative_change_a,
        result.asset_b.symbol,
        result.cumulative_change_b,
        result.margin_percent
    );
    println!(
        "  Score: {}-{} (rallies {}-{})",
        result.final_score_a, result.final_score_b, result.rally_score_a, result.rally_score_b
    );
    println!("  Price data: A {:?}, B {:?}", sources.source_a, sources.source_b);
}

fn replay_command(report_file: &str) -> anyhow::Result<()> {
    println!("📋 Checking report");
    println!("  Report file: {}", report_file);
    println!();

    let report = load_report(report_file)?;
    let expected = BattleSubmission::from(&report.result);
    if expected != report.submission {
        bail!("submission does not match the recorded result");
    }
    let digest = hex::encode(compute_submission_hash(&report.submission));
    if digest != report.submission_hash {
        bail!("digest mismatch: report says {}, computed {}", report.submission_hash, digest);
    }

    print_result(&report.result, report.sources);
    println!();
    println!("✅ Submission digest verified: 0x{}", digest);
    println!("{}", "=".repeat(70));
    Ok(())
}

fn save_report(report: &SavedReport, path: &str) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json).with_context(|| format!("writing '{}'", path))?;
    Ok(())
}

fn load_report(path: &str) -> anyhow::Result<SavedReport> {
    let json = fs::read_to_string(path).with_context(|| format!("reading '{}'", path))?;
    let report = serde_json::from_str(&json).with_context(|| format!("parsing '{}'", path))?;
    Ok(report)
}
