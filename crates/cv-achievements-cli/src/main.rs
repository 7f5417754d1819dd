//! cv-achievements CLI — `cva` command.
//!
//! Redeems achievement keys against a file-backed ledger, lists skills,
//! achievements and the verification log, and mints keys for testing.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};

use cv_achievements::debug::{key_listing, storage_snapshot, FlowStep};
use cv_achievements::intake::{parse_key_list, process_bundled_keys, process_page_url};
use cv_achievements::ledger::{
    completed_game_details, completed_games, newest_first, permanent_save_instructions,
    skill_progress,
};
use cv_achievements::profile::{initialize_app, load_personal_info};
use cv_achievements::{
    encode, signed, AchievementClaim, DebugMonitor, FileStore, Ledger, LedgerConfig,
    ProcessResult,
};

// ── Directory helpers ─────────────────────────────────────────────────────────

fn default_state_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME not set; pass --state-dir")?;
    Ok(PathBuf::from(home).join(".cv-achievements"))
}

fn state_dir(cli: &Cli) -> Result<PathBuf> {
    match &cli.state_dir {
        Some(dir) => Ok(dir.clone()),
        None => default_state_dir(),
    }
}

fn load_config(path: Option<&Path>) -> Result<LedgerConfig> {
    match path {
        Some(path) => LedgerConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(LedgerConfig::default()),
    }
}

/// Open the ledger over the state directory, bootstrapping it on first use.
fn open_ledger(cli: &Cli) -> Result<Ledger<FileStore>> {
    open_ledger_with_monitor(cli).map(|(ledger, _)| ledger)
}

/// Like [`open_ledger`], also handing back the subscribed debug monitor when
/// `--verbose` or the config turns one on.
fn open_ledger_with_monitor(cli: &Cli) -> Result<(Ledger<FileStore>, Option<DebugMonitor>)> {
    let config = load_config(cli.config.as_deref())?;
    let debug = config.debug.clone();

    let dir = state_dir(cli)?;
    log::debug!("opening ledger state at {}", dir.display());
    let mut store = FileStore::new(dir).context("failed to open state directory")?;
    initialize_app(&mut store, None).context("failed to initialize state")?;

    let mut ledger = Ledger::open(store, config).context("failed to open ledger")?;
    if let Some(student) = &cli.student {
        ledger = ledger.with_student(student.clone());
    }
    let mut monitor = None;
    if cli.verbose || debug.enabled_by_default {
        let debug_monitor = DebugMonitor::from_settings(&debug);
        if !debug_monitor.is_enabled() {
            debug_monitor.enable();
        }
        ledger.subscribe(debug_monitor.clone());
        monitor = Some(debug_monitor);
    }
    Ok((ledger, monitor))
}

// ── Output helpers ────────────────────────────────────────────────────────────

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("failed to serialize output")?
    );
    Ok(())
}

fn report(result: &ProcessResult, verbose: bool) -> Result<()> {
    if !result.success {
        return Err(anyhow!("{}", result.message));
    }

    println!("{}", result.message);
    if let Some(game) = &result.game_id {
        println!("  Game: {game}");
    }
    for record in &result.new_achievements {
        println!("  {} {}: {}", record.icon, record.title, record.description);
    }
    if verbose {
        for row in skill_progress(&result.skills) {
            println!(
                "  {:<16} level {} ({} pts)",
                row.skill_id, row.level, row.points
            );
        }
    }
    Ok(())
}

/// Parse `skill:points[:description]`.
fn parse_award(award: &str) -> Result<(String, i64, String)> {
    let mut parts = award.splitn(3, ':');
    let skill = parts.next().unwrap_or_default().trim();
    let points = parts
        .next()
        .ok_or_else(|| anyhow!("award '{award}' is missing points (use skill:points)"))?;
    let points: i64 = points
        .trim()
        .parse()
        .map_err(|_| anyhow!("invalid points in award '{award}'"))?;
    let description = parts.next().unwrap_or_default().trim();
    if skill.is_empty() {
        bail!("award '{award}' is missing a skill id");
    }
    Ok((skill.to_string(), points, description.to_string()))
}

// ── CLI structure ─────────────────────────────────────────────────────────────

/// cv-achievements CLI — redeem achievement keys and inspect CV progress.
#[derive(Parser, Debug)]
#[command(
    name = "cva",
    about = "cv-achievements CLI",
    version,
    long_about = "cva — cv-achievements CLI\n\nRedeem learning-game achievement keys, track skill levels and badges,\nand mint keys compatible with the game platform."
)]
struct Cli {
    /// Directory holding the ledger state (default: ~/.cv-achievements)
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    /// JSON configuration file (default: built-in configuration)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verify student-bound keys against this id instead of the stored profile
    #[arg(long, global = true)]
    student: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Initialize the state directory
    Init {
        /// GitHub Pages URL of the CV, used to derive the GitHub username
        #[arg(long)]
        url: Option<String>,
    },

    /// Redeem an achievement key
    Redeem {
        /// The base64 key
        key: String,
    },

    /// Redeem every key in a key list file
    Load {
        /// File with one key per line, or a keys.js array
        file: PathBuf,
    },

    /// Redeem the key carried by a page URL's `key` parameter
    OpenUrl {
        /// Page URL, e.g. https://user.github.io/cv/?key=...
        url: String,
    },

    /// Check a key without applying it
    Validate {
        /// The base64 key
        key: String,
    },

    /// Show skill levels and progress
    Skills {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Show earned achievements, newest first
    Achievements {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the key verification log
    Log {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Mint a signed key
    Issue {
        /// Game id the key is for
        #[arg(long)]
        game: String,

        /// Points award as skill:points[:description] (repeatable)
        #[arg(long = "award")]
        awards: Vec<String>,

        /// Bind the key to a student id
        #[arg(long = "for")]
        for_student: Option<String>,

        /// Issuance time in unix seconds (default: now)
        #[arg(long)]
        timestamp: Option<i64>,
    },

    /// Print the link to the game platform
    PlatformUrl {
        /// URL the platform returns to (default: the CV's GitHub Pages URL)
        #[arg(long)]
        return_url: Option<String>,
    },

    /// Print instructions for making a key permanent
    Instructions {
        /// The redeemed key
        key: String,
    },

    /// Dump stored state and the verified key listing
    Debug,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let verbose = cli.verbose;

    let result = match &cli.command {
        Commands::Init { url } => cmd_init(&cli, url.as_deref()),
        Commands::Redeem { key } => cmd_redeem(&cli, key, verbose),
        Commands::Load { file } => cmd_load(&cli, file, verbose),
        Commands::OpenUrl { url } => cmd_open_url(&cli, url, verbose),
        Commands::Validate { key } => cmd_validate(&cli, key),
        Commands::Skills { json } => cmd_skills(&cli, *json),
        Commands::Achievements { json } => cmd_achievements(&cli, *json),
        Commands::Log { json } => cmd_log(&cli, *json),
        Commands::Issue {
            game,
            awards,
            for_student,
            timestamp,
        } => cmd_issue(&cli, game, awards, for_student.as_deref(), *timestamp),
        Commands::PlatformUrl { return_url } => cmd_platform_url(&cli, return_url.as_deref()),
        Commands::Instructions { key } => cmd_instructions(&cli, key),
        Commands::Debug => cmd_debug(&cli),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn cmd_init(cli: &Cli, url: Option<&str>) -> Result<()> {
    let dir = state_dir(cli)?;
    let mut store = FileStore::new(&dir).context("failed to create state directory")?;

    if initialize_app(&mut store, url).context("failed to initialize state")? {
        let info = load_personal_info(&store)?;
        println!("Initialized CV state");
        println!("  Dir:     {}", dir.display());
        println!("  Name:    {}", info.name);
        if let Some(user) = &info.github_username {
            println!("  GitHub:  {user}");
        }
    } else {
        println!("Already initialized at {}", dir.display());
    }
    Ok(())
}

fn cmd_redeem(cli: &Cli, key: &str, verbose: bool) -> Result<()> {
    let mut ledger = open_ledger(cli)?;
    let result = ledger.process(key);
    report(&result, verbose)?;
    println!();
    println!("Run `cva instructions <KEY>` to make this achievement permanent.");
    Ok(())
}

fn cmd_load(cli: &Cli, file: &Path, verbose: bool) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let keys = parse_key_list(&text);

    let mut ledger = open_ledger(cli)?;
    let summary = process_bundled_keys(&mut ledger, &keys);

    for result in &summary.results {
        let game = result.game_id.as_deref().unwrap_or("?");
        let mark = if result.success { "ok  " } else { "FAIL" };
        println!("{mark} {game:<20} {}", result.message);
        if verbose {
            for record in &result.new_achievements {
                println!("       {} {}", record.icon, record.title);
            }
        }
    }
    println!(
        "Processed {} key(s): {} applied, {} not applied",
        summary.processed(),
        summary.succeeded(),
        summary.failed()
    );
    Ok(())
}

fn cmd_open_url(cli: &Cli, url: &str, verbose: bool) -> Result<()> {
    let mut ledger = open_ledger(cli)?;
    let result = process_page_url(&mut ledger, url)
        .ok_or_else(|| anyhow!("URL has no `key` parameter: {url}"))?;
    report(&result, verbose)
}

fn cmd_validate(cli: &Cli, key: &str) -> Result<()> {
    let mut ledger = open_ledger(cli)?;
    if ledger.validate(key) {
        println!("Key is valid");
        Ok(())
    } else {
        Err(anyhow!("key is invalid"))
    }
}

fn cmd_skills(cli: &Cli, json: bool) -> Result<()> {
    let ledger = open_ledger(cli)?;
    let rows = skill_progress(&ledger.skills()?);

    if json {
        return print_json(&rows);
    }
    for row in rows {
        println!(
            "{:<16} {:<22} level {}  {:>4} pts  {:>3}%",
            row.skill_id, row.name, row.level, row.points, row.percent
        );
    }
    Ok(())
}

fn cmd_achievements(cli: &Cli, json: bool) -> Result<()> {
    let ledger = open_ledger(cli)?;
    let records = newest_first(&ledger.achievements()?);

    if json {
        return print_json(&records);
    }
    if records.is_empty() {
        println!("No achievements yet.");
        return Ok(());
    }
    for record in records {
        println!("{}  {} {}", record.date, record.icon, record.title);
        if !record.description.is_empty() {
            println!("            {}", record.description);
        }
    }
    Ok(())
}

fn cmd_log(cli: &Cli, json: bool) -> Result<()> {
    let ledger = open_ledger(cli)?;
    let entries = ledger.verification_log()?;

    if json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("No key attempts recorded.");
        return Ok(());
    }
    for entry in entries {
        let mark = if entry.success { "ok  " } else { "FAIL" };
        println!(
            "{}  {mark}  {:<14} {}",
            entry.timestamp, entry.key_fragment, entry.reason
        );
    }
    Ok(())
}

fn cmd_issue(
    cli: &Cli,
    game: &str,
    awards: &[String],
    for_student: Option<&str>,
    timestamp: Option<i64>,
) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let timestamp = timestamp.unwrap_or_else(|| chrono::Utc::now().timestamp());

    let mut claim = AchievementClaim::new(game, timestamp);
    for award in awards {
        let (skill, points, description) = parse_award(award)?;
        claim = claim.with_entry(skill, points, description);
    }
    if let Some(student) = for_student {
        claim = claim.for_student(student);
    }

    let claim = signed(claim, &config.secret).context("failed to sign key")?;
    println!("{}", encode(&claim));
    Ok(())
}

fn cmd_platform_url(cli: &Cli, return_url: Option<&str>) -> Result<()> {
    let (ledger, monitor) = open_ledger_with_monitor(cli)?;
    let info = load_personal_info(ledger.store())?;

    let return_url = match (return_url, info.github_username.as_deref()) {
        (Some(url), _) => url.to_string(),
        (None, Some(user)) => format!("https://{user}.github.io/Student-CV-Template/"),
        (None, None) => bail!("no GitHub username known; pass --return-url"),
    };

    let games = completed_games(ledger.verified_keys());
    let url = cv_achievements::platform_redirect_url(
        &ledger.config().platform_url,
        ledger.student_id(),
        &games,
        &return_url,
    )?;

    if let Some(monitor) = &monitor {
        monitor.track_navigation(
            FlowStep::Cv.title(),
            FlowStep::Platform.title(),
            serde_json::json!({
                "studentId": ledger.student_id(),
                "completedGames": games,
                "returnUrl": return_url,
            }),
        );
        if let Some(data) = monitor.flow_state(FlowStep::Platform).and_then(|s| s.data) {
            log::debug!("platform step: {data}");
        }
    }
    println!("{url}");
    Ok(())
}

fn cmd_instructions(cli: &Cli, key: &str) -> Result<()> {
    let dir = state_dir(cli)?;
    let store = FileStore::new(&dir).context("failed to open state directory")?;
    let info = load_personal_info(&store)?;
    print!(
        "{}",
        permanent_save_instructions(key, info.github_username.as_deref())
    );
    Ok(())
}

fn cmd_debug(cli: &Cli) -> Result<()> {
    let ledger = open_ledger(cli)?;
    let snapshot = storage_snapshot(ledger.store())?;
    let keys = key_listing(ledger.verified_keys());
    let games = completed_game_details(ledger.verified_keys(), ledger.config());

    print_json(&serde_json::json!({
        "studentId": ledger.student_id(),
        "completedGames": games,
        "storage": snapshot,
        "keys": keys,
    }))
}
