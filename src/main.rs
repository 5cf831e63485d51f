use std::sync::Arc;

use clap::Parser;
use colored::*;

use verup::{
    cli::{Args, Commands},
    config::PublishConfig,
    errors::VerupError,
    publisher::Publisher,
    registry::{JsonLedger, PublishRecord, PublishRegistry},
    resolver::{FsProbe, VersionResolver},
    scanner::scan_versions,
    session::FileSession,
    utils::{default_ledger_path, humanize, init_tracing, normalize_path},
    version::{next_path, VersionedPath},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();

    run(args.cmd)
        .await
        .map_err(|e| anyhow::anyhow!(humanize(&e)))
}

async fn run(cmd: Commands) -> verup::Result<()> {
    match cmd {
        Commands::Parse { path, json } => {
            match VersionedPath::from_path(&path)? {
                Some(v) if json => {
                    let out = serde_json::to_string_pretty(&v)
                        .map_err(|e| VerupError::Config(e.to_string()))?;
                    println!("{}", out);
                }
                Some(v) => {
                    println!("{:<10} {}", "prefix".bold(), v.prefix);
                    println!("{:<10} {:?}", "separator".bold(), v.separator);
                    println!("{:<10} {}", "token".bold(), v.token().green());
                    println!("{:<10} {} (width {})", "number".bold(), v.number, v.width);
                    println!("{:<10} {}", "suffix".bold(), v.suffix);
                }
                None => return Err(VerupError::NoVersionToken(path)),
            }
        }
        Commands::Next { path } => {
            let (next, version) = next_path(&path)?;
            println!("{}\t{}", next.display(), version);
        }
        Commands::Resolve { path, budget } => {
            let mut resolver = VersionResolver::new();
            if let Some(budget) = budget {
                resolver = resolver.probe_budget(budget);
            }
            let (free, version) = resolver.resolve(&normalize_path(&path), FsProbe)?;
            println!("{}\t{}", free.display(), version);
        }
        Commands::Versions { path } => {
            let entries = scan_versions(&path)?;
            if entries.is_empty() {
                println!("{}", "No versions on disk".yellow());
            }
            let latest = entries.last().map(|e| e.number.clone());
            for entry in &entries {
                let line = format!("v{:<6} {}", entry.number, entry.path.display());
                if latest.as_ref() == Some(&entry.number) {
                    println!("{} {}", line.green(), "(latest)".dimmed());
                } else {
                    println!("{}", line);
                }
            }
        }
        Commands::Publish { path, config, deps, ledger, save_next, dry_run } => {
            let config = match config {
                Some(file) => PublishConfig::load_from_file(file)?,
                None => PublishConfig::default().compile()?,
            };
            let ledger_path = ledger
                .or_else(|| config.ledger_path.clone())
                .unwrap_or_else(default_ledger_path);
            let registry: Arc<dyn PublishRegistry> = Arc::new(JsonLedger::new(ledger_path));

            let session = FileSession::open(path).with_dependencies(deps);
            let mut publisher = Publisher::new(session, registry, config).dry_run(dry_run);

            let outcome = match publisher.run().await {
                Err(VerupError::NextVersionExists { path: free, version }) if save_next && !dry_run => {
                    println!("{} saving to v{} first", "next version taken:".yellow(), version);
                    publisher.save_session_to(&free).await?;
                    publisher.run().await?
                }
                other => other?,
            };

            match &outcome.record {
                Some(record) => print_record(record),
                None => println!("{} {}", "dry run:".yellow(), outcome.item.publish_path.display()),
            }
            if let Some((next, version)) = &outcome.next_version {
                println!("{} v{} {}", "session now at".bold(), version, next.display());
            }
        }
        Commands::History { path, ledger } => {
            let ledger = JsonLedger::new(ledger.unwrap_or_else(default_ledger_path));
            let records = match path {
                Some(p) => ledger.find_by_path(&normalize_path(&p)).await?,
                None => ledger.all().await?,
            };
            if records.is_empty() {
                println!("{}", "No publishes recorded".yellow());
            }
            records.iter().for_each(print_record);
        }
    }
    Ok(())
}

fn print_record(record: &PublishRecord) {
    let version = record
        .version
        .as_ref()
        .map(|v| format!("v{}", v))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{} {} {} {}",
        format!("#{}", record.id).bold(),
        version.green(),
        record.publish_path.display(),
        record.created_at.format("%Y/%m/%d %H:%M:%S").to_string().dimmed(),
    );
}
