mod cli;

use dvrpost::{config, job};

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use dvr_av::{ToolRegistry, DEFAULT_CHECKIN_INTERVAL};
use dvr_core::Config;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set; otherwise --debug shows every line of tool
    // output and --verbose shows commands and periodic progress.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.debug {
            "trace".to_string()
        } else if cli.verbose {
            "debug".to_string()
        } else {
            "info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config_dir = config::config_dir(cli.config.as_deref());
    let mut cfg = config::load_config_or_default(cli.config.as_deref(), &config_dir)?;
    cli.apply_overrides(&mut cfg);

    if cli.sample_config {
        return print_sample_config(&cfg, &config_dir);
    }
    if cli.check_tools {
        return check_tools(&cfg);
    }

    for warning in cfg.validate() {
        tracing::warn!("{warning}");
    }

    // clap rejects a missing recording unless one of the early-exit flags
    // above was given.
    let file = cli.file.unwrap_or_default();
    let checkin = (cli.verbose || cli.debug).then_some(DEFAULT_CHECKIN_INTERVAL);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let code = rt.block_on(run_job(file, cfg, checkin));
    drop(rt);

    std::process::exit(code)
}

async fn run_job(file: PathBuf, cfg: Config, checkin: Option<std::time::Duration>) -> i32 {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        job::shutdown_signal().await;
        tracing::warn!("Interrupt received; stopping and cleaning up");
        trigger.cancel();
    });

    tracing::info!("Processing {}", file.display());
    let report = job::Job::new(file, cfg)
        .with_checkin(checkin)
        .run(cancel)
        .await;

    if let Some(ref error) = report.error {
        eprintln!("Error: {error}");
        if let Some(hint) = error.suggestion() {
            eprintln!("Hint: {hint}");
        }
    }
    report.exit_code
}

fn print_sample_config(cfg: &Config, config_dir: &Path) -> Result<()> {
    println!(
        "Config directory: {} (comskip.ini: {})",
        config_dir.display(),
        cfg.comskip_ini
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| config_dir.join(config::COMSKIP_INI_NAME).display().to_string())
    );
    println!("{}", cfg.to_json_pretty()?);
    Ok(())
}

fn check_tools(cfg: &Config) -> Result<()> {
    println!("Checking external tools...\n");

    let tools = ToolRegistry::discover(&cfg.tools).check_all();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Processing will fail at the first stage that needs one.");
    }

    Ok(())
}
