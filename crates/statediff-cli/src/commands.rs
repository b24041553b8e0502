use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use statediff_compare::{
    CompareConfig, DiffStatus, KeyDisplay, ModuleReportView, StatsView, StoreLocation, StorePair,
};
use statediff_server::{AppState, ServerConfig, StateDiffServer};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = store_config(&cli, CompareConfig::from_env())?;
    let (left, right) = config.locations()?;
    let pair = StorePair::open(&left, &right)?;

    if let Command::Serve(args) = &cli.command {
        return cmd_serve(&cli, args, pair, &left, &right);
    }

    let result = match &cli.command {
        Command::Modules(_) => cmd_modules(&pair, cli.format),
        Command::Stats(_) => cmd_stats(&pair, cli.format),
        Command::Versions(args) => cmd_versions(&pair, args, cli.format),
        Command::Diff(args) => cmd_diff(&pair, args, cli.format),
        Command::Serve(_) => Ok(()),
    };
    let closed = pair.close();
    result?;
    closed?;
    Ok(())
}

/// Layer the config file, the environment, and command-line flags, in
/// increasing precedence.
fn store_config(cli: &Cli, env: CompareConfig) -> anyhow::Result<CompareConfig> {
    let file = match &cli.config {
        Some(path) => CompareConfig::load(path)?,
        None => CompareConfig::default(),
    };
    let flags = CompareConfig::new(cli.left.clone(), cli.right.clone());
    Ok(file.merge(env).merge(flags))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_modules(pair: &StorePair, format: OutputFormat) -> anyhow::Result<()> {
    let summaries = pair
        .modules()?
        .iter()
        .map(|module| pair.module_summary(module))
        .collect::<Result<Vec<_>, _>>()?;

    if format == OutputFormat::Json {
        return print_json(&summaries);
    }
    if summaries.is_empty() {
        println!("No modules in common.");
        return Ok(());
    }
    println!("{} modules in common", summaries.len().to_string().bold());
    for s in &summaries {
        let versions = if s.left_version == s.right_version {
            format!("v{}", s.left_version).green()
        } else {
            format!("v{} / v{}", s.left_version, s.right_version).yellow()
        };
        println!("  {:<24} {}  keys {} / {}", s.module.bold(), versions, s.left_keys, s.right_keys);
    }
    Ok(())
}

fn cmd_stats(pair: &StorePair, format: OutputFormat) -> anyhow::Result<()> {
    let (left, right) = pair.stats()?;
    let (left, right) = (StatsView::from(&left), StatsView::from(&right));

    if format == OutputFormat::Json {
        return print_json(&serde_json::json!({ "left": left, "right": right }));
    }
    for (side, stats) in [("left", &left), ("right", &right)] {
        println!("{} store: {} keys", side.bold(), stats.count.to_string().cyan());
        for (prefix, count) in &stats.prefixes {
            println!("  {:<6} {}", prefix.yellow(), count);
        }
    }
    Ok(())
}

fn cmd_versions(pair: &StorePair, args: &VersionsArgs, format: OutputFormat) -> anyhow::Result<()> {
    let versions = pair.module_versions(&args.module)?;

    if format == OutputFormat::Json {
        return print_json(&versions);
    }
    println!("Module {}", versions.module.bold());
    println!("  left:  {}", join_versions(&versions.left));
    println!("  right: {}", join_versions(&versions.right));
    match (versions.common, &versions.reconcile_error) {
        (Some(v), _) => println!("  highest common version: {}", v.to_string().green().bold()),
        (None, Some(reason)) => println!("  {} {}", "no common version:".red(), reason),
        (None, None) => println!("  {}", "no common version".red()),
    }
    Ok(())
}

fn join_versions(versions: &[u64]) -> String {
    if versions.is_empty() {
        return "(none)".dimmed().to_string();
    }
    versions.iter().map(u64::to_string).collect::<Vec<_>>().join(", ")
}

fn cmd_diff(pair: &StorePair, args: &DiffArgs, format: OutputFormat) -> anyhow::Result<()> {
    let modules = if args.modules.is_empty() {
        pair.modules()?
    } else {
        args.modules.clone()
    };

    let mut views = Vec::with_capacity(modules.len());
    for module in &modules {
        let report = pair
            .compare_module(module)
            .with_context(|| format!("comparing module {module}"))?;
        views.push(ModuleReportView::from(&report));
    }

    if format == OutputFormat::Json {
        return print_json(&views);
    }
    if views.is_empty() {
        println!("No modules in common.");
    }
    for view in &views {
        print_report(view, args.quiet);
    }
    Ok(())
}

fn print_report(view: &ModuleReportView, quiet: bool) {
    match view.status {
        DiffStatus::Identical => {
            println!("{} {} (v{}): {}", "✓".green().bold(), view.module.bold(), view.version, view.message);
        }
        DiffStatus::HashMismatchOnly => {
            println!("{} {} (v{}): {}", "!".yellow().bold(), view.module.bold(), view.version, view.message);
            if !quiet {
                println!("  left:  {}", view.left_hash.dimmed());
                println!("  right: {}", view.right_hash.dimmed());
            }
        }
        DiffStatus::Diverged => {
            println!("{} {} (v{}): {}", "✗".red().bold(), view.module.bold(), view.version, view.message);
            if !quiet {
                print_keys("only in left", &view.only_left);
                print_keys("only in right", &view.only_right);
                print_keys("different values", &view.differing);
            }
        }
    }
}

fn print_keys(label: &str, keys: &[KeyDisplay]) {
    if keys.is_empty() {
        return;
    }
    println!("  {} ({})", label.yellow(), keys.len());
    for key in keys {
        match &key.pretty {
            Some(pretty) => println!("    {}  {}", pretty, key.hex.dimmed()),
            None => println!("    {}", key.hex),
        }
    }
}

fn cmd_serve(
    cli: &Cli,
    args: &ServeArgs,
    pair: StorePair,
    left: &StoreLocation,
    right: &StoreLocation,
) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }

    let state = AppState::new(Arc::new(pair), left.to_string(), right.to_string());
    println!("statediff server on {} ({} vs {})", config.bind_addr.to_string().bold(), left, right);
    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    runtime.block_on(StateDiffServer::new(config, state).serve())?;
    Ok(())
}
