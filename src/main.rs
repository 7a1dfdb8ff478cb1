use anyhow::Context;
use clap::Parser;
use hn_contract::config::load_environment;
use hn_contract::domain::rules;
use hn_contract::utils::logger::{self, LogFormat};
use hn_contract::{HackerNewsApi, Item, ProbeArgs, Story};
use std::process::ExitCode;

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let args = ProbeArgs::parse();

    logger::init_logger(LogFormat::from_json_flag(args.json_logs), args.verbose);

    tracing::info!("Starting hn-probe");
    if args.verbose {
        tracing::debug!("CLI args: {:?}", args);
    }

    match run(&args) {
        Ok(0) => {
            println!("✅ All fetched stories satisfy the story contract");
            ExitCode::SUCCESS
        }
        Ok(failures) => {
            println!("❌ {} stories violate the story contract", failures);
            ExitCode::from(1)
        }
        Err(e) => {
            tracing::error!("❌ Probe failed: {:#}", e);
            eprintln!("❌ {:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Returns the number of stories that failed the schema or the story rules.
fn run(args: &ProbeArgs) -> anyhow::Result<usize> {
    let config_path = args.config_path();
    let env_name = args.environment();
    let env = load_environment(&config_path, &env_name)
        .with_context(|| format!("loading environment {}", env_name))?;

    let mut api = HackerNewsApi::new(&env).context("creating API client")?;
    let items = api
        .get_top_stories_with_details(args.limit)
        .context("fetching top stories")?;

    let now = rules::now_timestamp();
    let mut failures = 0;
    for item in &items {
        match check(item, now) {
            Ok(Some(story)) => println!("✅ {} {}", story.id, story.title),
            Ok(None) if item.is_deleted() => {
                println!("➖ {} skipped (deleted or dead)", item.id().unwrap_or_default())
            }
            Ok(None) => println!(
                "➖ {} skipped ({} item)",
                item.id().unwrap_or_default(),
                item.kind().unwrap_or("unknown")
            ),
            Err(e) => {
                failures += 1;
                println!("❌ {} {}", item.id().unwrap_or_default(), e);
            }
        }
    }

    tracing::info!(checked = items.len(), failures, "Probe finished");
    api.close();
    Ok(failures)
}

/// Jobs and polls also rank on the front page; only live stories are checked.
fn check(item: &Item, now: i64) -> hn_contract::Result<Option<Story>> {
    if item.is_deleted() || item.kind() != Some("story") {
        return Ok(None);
    }
    let story: Story = item.parse()?;
    rules::check_story(&story, now)?;
    Ok(Some(story))
}
