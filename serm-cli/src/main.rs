use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use serm::*;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = build_cli().get_matches();
    let config_path = matches.get_one::<String>("config").map(PathBuf::from);
    let config = load_config(config_path.as_deref()).await?;
    tracing::debug!(provider = %config.provider.url, "configuration loaded");

    match matches.subcommand() {
        Some(("migrate", _)) => migrate_command(&config).await?,
        Some(("check-user", sub_matches)) => check_user_command(&config, sub_matches).await?,
        Some(("keywords", sub_matches)) => keywords_command(&config, sub_matches).await?,
        Some(("search", sub_matches)) => search_command(&config, sub_matches).await?,
        _ => {
            build_cli().print_help()?;
            std::process::exit(1);
        }
    }

    Ok(())
}

fn telegram_id_arg() -> Arg {
    Arg::new("telegram-id")
        .short('t')
        .long("telegram-id")
        .value_name("ID")
        .help("Telegram identifier of the monitored user")
        .required(true)
}

fn keywords_arg(required: bool) -> Arg {
    Arg::new("keywords")
        .value_name("KEYWORD")
        .help("Keywords, normalized to trimmed lowercase")
        .num_args(1..)
        .required(required)
}

fn build_cli() -> Command {
    Command::new("serm")
        .version("0.1.0")
        .about("Manage SERM monitored users, keyword subscriptions and searches")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .global(true)
                .help("YAML configuration file (defaults to $SERM_CONFIG)"),
        )
        .subcommand(Command::new("migrate").about("Create missing tables and indexes"))
        .subcommand(
            Command::new("check-user")
                .about("Show whether a user is registered")
                .arg(telegram_id_arg()),
        )
        .subcommand(
            Command::new("keywords")
                .about("Manage a user's keyword subscriptions")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .about("Subscribe the user to keywords")
                        .arg(telegram_id_arg())
                        .arg(keywords_arg(true)),
                )
                .subcommand(
                    Command::new("list")
                        .about("List the user's keywords")
                        .arg(telegram_id_arg()),
                )
                .subcommand(
                    Command::new("remove")
                        .about("Unsubscribe the user from keywords")
                        .arg(telegram_id_arg())
                        .arg(keywords_arg(true)),
                ),
        )
        .subcommand(
            Command::new("search")
                .about("Run a search for a user")
                .arg(telegram_id_arg())
                .arg(
                    Arg::new("keyword")
                        .short('k')
                        .long("keyword")
                        .value_name("KEYWORD")
                        .action(ArgAction::Append)
                        .help("Search for this keyword instead of the stored ones (repeatable)"),
                ),
        )
}

fn telegram_id(matches: &ArgMatches) -> Result<&str> {
    matches
        .get_one::<String>("telegram-id")
        .map(String::as_str)
        .context("--telegram-id is required")
}

fn keywords(matches: &ArgMatches, id: &str) -> Vec<String> {
    matches
        .get_many::<String>(id)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

async fn migrate_command(config: &Config) -> Result<()> {
    let pool = create_pool(&config.database)?;
    test_connection(&pool).await?;
    ensure_schema(&pool).await?;
    println!("✓ Schema is up to date");
    Ok(())
}

async fn check_user_command(config: &Config, matches: &ArgMatches) -> Result<()> {
    let monitor = Monitor::connect(config).await?;
    let telegram_id = telegram_id(matches)?;

    match monitor.find_user(telegram_id).await? {
        Some(user) => {
            println!("authorized: {} ({})", user.display_name(), user.telegram_id);
            println!("  phone: {}", user.phone);
            println!("  city: {}", user.city);
            println!("  registered: {}", user.created_at.to_rfc3339());
        }
        None => {
            println!("unauthorized: {}", telegram_id);
            std::process::exit(2);
        }
    }
    Ok(())
}

async fn keywords_command(config: &Config, matches: &ArgMatches) -> Result<()> {
    let monitor = Monitor::connect(config).await?;

    match matches.subcommand() {
        Some(("add", sub_matches)) => {
            let added = monitor
                .add_keywords(telegram_id(sub_matches)?, &keywords(sub_matches, "keywords"))
                .await?;
            println!("✓ Attached {} new keyword(s)", added.len());
            for keyword in added {
                println!("  {}", keyword.name);
            }
        }
        Some(("list", sub_matches)) => {
            for name in monitor.list_keywords(telegram_id(sub_matches)?).await? {
                println!("{}", name);
            }
        }
        Some(("remove", sub_matches)) => {
            let removed = monitor
                .remove_keywords(telegram_id(sub_matches)?, &keywords(sub_matches, "keywords"))
                .await?;
            println!("✓ Detached {} keyword(s)", removed.len());
            for name in removed {
                println!("  {}", name);
            }
        }
        _ => anyhow::bail!("unknown keywords command"),
    }
    Ok(())
}

async fn search_command(config: &Config, matches: &ArgMatches) -> Result<()> {
    let monitor = Monitor::connect(config).await?;
    let telegram_id = telegram_id(matches)?;

    let outcome = monitor
        .search(telegram_id, &keywords(matches, "keyword"), false)
        .await?;

    println!(
        "{} result(s) at {}",
        outcome.results.len(),
        outcome.generated_at.to_rfc3339()
    );
    for result in &outcome.results {
        println!();
        println!("{}. {}", result.id, result.headline);
        if let Some(url) = &result.url {
            println!("   {}", url);
        }
        if !result.snippet.is_empty() {
            println!("   {}", result.snippet);
        }
    }
    Ok(())
}
