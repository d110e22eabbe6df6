//! Tsukuru CLI - Command-line tool for inspecting RPG Maker project data.
//!
//! This is the main entry point for the Tsukuru command-line application.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing_subscriber::EnvFilter;

use tsukuru::catalog::{EncounterDetail, TroopDetail};
use tsukuru::crypt::{find_encrypted_resources, prepare_resources_with};
use tsukuru::prelude::*;

/// Tsukuru - RPG Maker MV/MZ/VX/VX Ace project inspector
#[derive(Parser)]
#[command(name = "tsukuru")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Game directory (or its Game.exe / data directory)
    #[arg(short, long, env = "TSUKURU_GAME", global = true)]
    game: Option<PathBuf>,

    /// Decrypted-resource cache directory
    #[arg(long, env = "TSUKURU_CACHE_DIR", global = true)]
    cache_dir: Option<PathBuf>,

    /// Skip engine detection (mv, mz, vxace, vx)
    #[arg(long, global = true)]
    engine: Option<Engine>,

    /// Load on a single thread
    #[arg(long, global = true)]
    sequential: bool,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Show engine, title, record counts and warnings
    Info {
        /// List every warning
        #[arg(short, long)]
        warnings: bool,
    },

    /// Inspect an RGSS archive
    #[command(subcommand)]
    Archive(ArchiveCommand),

    /// Decrypt obfuscated images and audio into the resource cache
    Decrypt,

    /// Show the map tree
    Maps,

    /// Show an interpreted map event
    Event {
        /// Map id
        map: i32,

        /// Event id
        event: i32,

        /// Page number (1-based); all pages when omitted
        #[arg(short, long)]
        page: Option<usize>,
    },

    /// Show an interpreted common event
    Common {
        /// Common event id
        id: i32,
    },

    /// List catalog entries of one kind
    Catalog {
        kind: KindArg,

        /// Case-insensitive name filter
        filter: Option<String>,
    },

    /// Show one catalog entry
    Entry { kind: KindArg, id: i32 },

    /// Show a troop's members
    Troop { id: i32 },

    /// Show a map's random encounter table
    Encounters { map: i32 },

    /// List battles that no random encounter table starts
    Special,

    /// Draw a map's passability grid
    Passability { map: i32 },
}

#[derive(Subcommand)]
enum ArchiveCommand {
    /// List archive entries
    List {
        /// Archive file; defaults to the game's archive
        #[arg(short, long)]
        archive: Option<PathBuf>,

        /// Filter pattern (glob-style)
        #[arg(short, long)]
        filter: Option<String>,

        /// Show offsets, sizes and keys
        #[arg(short, long)]
        detailed: bool,
    },

    /// Extract archive entries
    Extract {
        /// Archive file; defaults to the game's archive
        #[arg(short, long)]
        archive: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Filter pattern (glob-style)
        #[arg(short, long)]
        filter: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Item,
    Weapon,
    Armor,
    Skill,
    Enemy,
    Troop,
}

impl From<KindArg> for RefKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Item => RefKind::Item,
            KindArg::Weapon => RefKind::Weapon,
            KindArg::Armor => RefKind::Armor,
            KindArg::Skill => RefKind::Skill,
            KindArg::Enemy => RefKind::Enemy,
            KindArg::Troop => RefKind::Troop,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);
    let global = &cli.global;

    match cli.command {
        Commands::Info { warnings } => cmd_info(global, warnings)?,
        Commands::Archive(ArchiveCommand::List {
            archive,
            filter,
            detailed,
        }) => cmd_archive_list(global, archive.as_deref(), filter.as_deref(), detailed)?,
        Commands::Archive(ArchiveCommand::Extract { archive, output, filter }) => {
            cmd_archive_extract(global, archive.as_deref(), &output, filter.as_deref())?
        }
        Commands::Decrypt => cmd_decrypt(global)?,
        Commands::Maps => cmd_maps(global)?,
        Commands::Event { map, event, page } => cmd_event(global, map, event, page)?,
        Commands::Common { id } => cmd_common(global, id)?,
        Commands::Catalog { kind, filter } => cmd_catalog(global, kind.into(), filter.as_deref().unwrap_or(""))?,
        Commands::Entry { kind, id } => cmd_entry(global, kind.into(), id)?,
        Commands::Troop { id } => cmd_troop(global, id)?,
        Commands::Encounters { map } => cmd_encounters(global, map)?,
        Commands::Special => cmd_special(global)?,
        Commands::Passability { map } => cmd_passability(global, map)?,
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn progress_bar(len: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

fn game_dir(global: &GlobalArgs) -> Result<&Path> {
    global
        .game
        .as_deref()
        .context("No game directory given (use --game or TSUKURU_GAME)")
}

fn open_handle(global: &GlobalArgs) -> Result<ProjectHandle> {
    let game = game_dir(global)?;
    let handle = match global.engine {
        Some(engine) => ProjectHandle::open_as(game, engine),
        None => ProjectHandle::open(game),
    };
    handle.with_context(|| format!("Failed to open project at {}", game.display()))
}

fn load_view(global: &GlobalArgs) -> Result<Arc<ProjectView>> {
    let game = game_dir(global)?;
    let mut options = LoadOptions::new().parallel(!global.sequential);
    if let Some(dir) = &global.cache_dir {
        options = options.cache_dir(dir);
    }
    if let Some(engine) = global.engine {
        options = options.engine(engine);
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!("Loading {}", game.display()));
    spinner.enable_steady_tick(Duration::from_millis(100));
    let start = Instant::now();
    let session = Session::load(game, &options);
    spinner.finish_and_clear();

    let session = session.with_context(|| format!("Failed to load project at {}", game.display()))?;
    tracing::info!(elapsed_ms = start.elapsed().as_millis() as u64, "project_ready");
    Ok(session.into_view())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_info(global: &GlobalArgs, list_warnings: bool) -> Result<()> {
    let start = Instant::now();
    let view = load_view(global)?;
    let db = view.database();

    println!("Title:   {}", view.title());
    println!("Engine:  {}", view.engine());
    println!("Root:    {}", view.root().display());
    println!("Loaded in {:?}", start.elapsed());
    println!();
    println!("Maps:          {} decoded / {} indexed", view.maps().count(), db.map_infos.len());
    println!("Items:         {}", db.items.len());
    println!("Weapons:       {}", db.weapons.len());
    println!("Armors:        {}", db.armors.len());
    println!("Skills:        {}", db.skills.len());
    println!("Enemies:       {}", db.enemies.len());
    println!("Troops:        {}", db.troops.len());
    println!("States:        {}", db.states.len());
    println!("Actors:        {}", db.actors.len());
    println!("Classes:       {}", db.classes.len());
    println!("Common events: {}", db.common_events.len());
    println!("Tilesets:      {}", db.tilesets.len());
    println!("Catalog:       {} entries", view.catalog().len());
    println!("Special:       {} troops", view.special_troops().len());

    let warnings = view.warnings();
    println!("\nWarnings: {}", warnings.len());
    for kind in [
        WarningKind::Format,
        WarningKind::Truncated,
        WarningKind::Key,
        WarningKind::Schema,
        WarningKind::Structure,
        WarningKind::Io,
    ] {
        let count = warnings.count(kind);
        if count > 0 {
            println!("  {kind:<10} {count}");
        }
    }
    if list_warnings {
        for warning in warnings {
            println!("{warning}");
        }
    }

    Ok(())
}

fn open_archive(global: &GlobalArgs, path: Option<&Path>) -> Result<Arc<RgssArchive>> {
    if let Some(path) = path {
        let archive = RgssArchive::open(path).with_context(|| format!("Failed to open archive {}", path.display()))?;
        return Ok(Arc::new(archive));
    }
    let handle = open_handle(global)?;
    handle
        .archive()
        .cloned()
        .context("The project has no RGSS archive (use --archive)")
}

fn entry_filter(filter: Option<&str>) -> Result<Option<glob::Pattern>> {
    filter
        .map(|pattern| glob::Pattern::new(&pattern.replace('\\', "/")))
        .transpose()
        .context("Invalid filter pattern")
}

fn entry_matches(pattern: &Option<glob::Pattern>, entry: &RgssEntry) -> bool {
    let options = glob::MatchOptions {
        case_sensitive: false,
        ..Default::default()
    };
    pattern
        .as_ref()
        .map_or(true, |p| p.matches_with(&entry.name().replace('\\', "/"), options))
}

fn cmd_archive_list(global: &GlobalArgs, path: Option<&Path>, filter: Option<&str>, detailed: bool) -> Result<()> {
    let archive = open_archive(global, path)?;
    let pattern = entry_filter(filter)?;

    if global.json {
        let names: Vec<&str> = archive
            .entries()
            .iter()
            .filter(|e| entry_matches(&pattern, e))
            .map(RgssEntry::name)
            .collect();
        return print_json(&names);
    }

    let mut count = 0;
    for entry in archive.entries().iter().filter(|e| entry_matches(&pattern, e)) {
        if detailed {
            println!(
                "{:>10} {:>10} {:08x} {}",
                entry.offset(),
                entry.size(),
                entry.key(),
                entry.name()
            );
        } else {
            println!("{}", entry.name());
        }
        count += 1;
    }

    println!("\nTotal: {} entries (version {})", count, archive.version().number());
    for warning in archive.warnings() {
        eprintln!("{warning}");
    }

    Ok(())
}

fn cmd_archive_extract(global: &GlobalArgs, path: Option<&Path>, output: &Path, filter: Option<&str>) -> Result<()> {
    let archive = open_archive(global, path)?;
    let pattern = entry_filter(filter)?;
    let entries: Vec<&RgssEntry> = archive.entries().iter().filter(|e| entry_matches(&pattern, e)).collect();

    println!("Extracting {} of {} entries...", entries.len(), archive.entry_count());
    fs::create_dir_all(output)?;

    let pb = progress_bar(entries.len())?;
    let start = Instant::now();
    let failures: Vec<String> = entries
        .par_iter()
        .filter_map(|entry| {
            let result = archive.extract_entry(entry, output);
            pb.inc(1);
            result.err().map(|e| format!("{}: {e}", entry.name()))
        })
        .collect();
    pb.finish_with_message("Done");

    for failure in &failures {
        eprintln!("Error extracting {failure}");
    }
    println!(
        "Extracted {} entries in {:?} ({} errors)",
        entries.len() - failures.len(),
        start.elapsed(),
        failures.len()
    );

    Ok(())
}

fn cmd_decrypt(global: &GlobalArgs) -> Result<()> {
    let handle = open_handle(global)?;
    let options = match &global.cache_dir {
        Some(dir) => LoadOptions::new().cache_dir(dir),
        None => LoadOptions::new(),
    };
    let cache = ResourceCache::new(options.resolved_cache_dir(handle.root()));

    let total = find_encrypted_resources(handle.root(), Some(cache.root())).len();
    println!("Found {total} encrypted resources");

    let pb = progress_bar(total)?;
    let report = prepare_resources_with(handle.root(), handle.key(), &cache, |_| pb.inc(1));
    pb.finish_and_clear();

    match &report.status {
        PrepareStatus::NotNeeded => println!("Nothing to decrypt"),
        PrepareStatus::Unavailable(reason) => println!("Cannot decrypt: {reason}"),
        PrepareStatus::Decrypted | PrepareStatus::Partial => {
            println!(
                "Written {}, unchanged {}, failed {}",
                report.written, report.unchanged, report.failed
            );
            if let Some(dir) = &report.output_dir {
                println!("Output: {}", dir.display());
            }
        }
    }
    for warning in &report.warnings {
        eprintln!("{warning}");
    }

    Ok(())
}

fn cmd_maps(global: &GlobalArgs) -> Result<()> {
    let view = load_view(global)?;
    let rows = view.map_tree().walk();

    if global.json {
        return print_json(&rows);
    }

    for row in rows {
        let name = view.database().map_infos.name(row.id).unwrap_or("");
        let size = match view.map(row.id) {
            Some(map) => format!("{}x{}, {} events", map.width, map.height, map.events.len()),
            None => "not decoded".to_owned(),
        };
        println!("{}{:03} {} ({})", "  ".repeat(row.depth), row.id, name, size);
    }

    Ok(())
}

fn print_instructions(instructions: &[Instruction]) {
    for instruction in instructions {
        let pad = "  ".repeat(instruction.indent.max(0) as usize + 1);
        println!("{pad}{}", instruction.text);
        for line in &instruction.lines {
            println!("{pad}  | {line}");
        }
        let unresolved: Vec<String> = instruction
            .mentions
            .iter()
            .filter(|m| !m.is_resolved())
            .map(|m| m.reference.to_string())
            .collect();
        if !unresolved.is_empty() {
            println!("{pad}  ! unresolved: {}", unresolved.join(", "));
        }
    }
}

fn print_page(page: &PageAnalysis) {
    let mut header = format!("Page {} [{}]", page.index, page.trigger);
    if page.story {
        header.push_str(" story");
    }
    println!("{header}");
    for condition in &page.conditions {
        println!("  if {condition}");
    }
    print_instructions(&page.instructions);
}

fn cmd_event(global: &GlobalArgs, map: i32, event: i32, page: Option<usize>) -> Result<()> {
    let view = load_view(global)?;

    if let Some(number) = page {
        let analysis = view
            .page_instructions(map, event, number)
            .with_context(|| format!("No page {number} on event {event} of map {map}"))?;
        if global.json {
            return print_json(&analysis);
        }
        print_page(&analysis);
        return Ok(());
    }

    let analysis = view
        .event(map, event)
        .with_context(|| format!("No event {event} on map {map}"))?;
    if global.json {
        return print_json(&analysis);
    }
    println!(
        "EV{:03} {} at ({}, {}) - {:?}",
        analysis.id, analysis.name, analysis.x, analysis.y, analysis.kind
    );
    for page in &analysis.pages {
        print_page(page);
    }

    Ok(())
}

fn cmd_common(global: &GlobalArgs, id: i32) -> Result<()> {
    let view = load_view(global)?;
    let instructions = view
        .common_event_instructions(id)
        .with_context(|| format!("No common event {id}"))?;
    if global.json {
        return print_json(&instructions);
    }
    let name = view.database().common_events.name(id).unwrap_or("");
    println!("CommonEvent{id:03} {name}");
    print_instructions(&instructions);
    Ok(())
}

fn cmd_catalog(global: &GlobalArgs, kind: RefKind, filter: &str) -> Result<()> {
    let view = load_view(global)?;
    let entries = view.category(kind, filter);

    if global.json {
        return print_json(&entries);
    }
    for entry in &entries {
        println!("{:>5} {}", entry.id, entry.name);
    }
    println!("\nTotal: {} entries", entries.len());

    Ok(())
}

fn cmd_entry(global: &GlobalArgs, kind: RefKind, id: i32) -> Result<()> {
    let view = load_view(global)?;
    let entry = view
        .entry(kind, id)
        .with_context(|| format!("No catalog entry for {kind} {id}"))?;

    if global.json {
        return print_json(entry);
    }
    println!("{} #{}: {}", entry.kind, entry.id, entry.name);
    if !entry.description.is_empty() {
        println!("  {}", entry.description.replace('\n', "\n  "));
    }
    for attribute in &entry.attributes {
        println!("  {:<20} {}", attribute.label, attribute.value);
    }
    for detail in &entry.details {
        println!("  - {detail}");
    }
    if !entry.references.is_empty() {
        println!("References:");
        for reference in &entry.references {
            let status = if reference.is_resolved() { "" } else { " (unresolved)" };
            println!("  {} {}{}", reference.reference, reference.label(), status);
        }
    }

    Ok(())
}

fn print_troop(troop: &TroopDetail, pad: &str) {
    println!("{pad}Troop {} {}", troop.id, troop.name.as_deref().unwrap_or("(missing)"));
    for member in &troop.members {
        let name = member.name.clone().unwrap_or_else(|| format!("#{}", member.enemy_id));
        let hidden = if member.hidden > 0 {
            format!(" ({} hidden)", member.hidden)
        } else {
            String::new()
        };
        println!("{pad}  {name} ×{}{hidden}", member.count);
    }
}

fn cmd_troop(global: &GlobalArgs, id: i32) -> Result<()> {
    let view = load_view(global)?;
    let troop = view.troop_detail(id).with_context(|| format!("No troop {id}"))?;
    if global.json {
        return print_json(troop);
    }
    print_troop(troop, "");
    Ok(())
}

fn print_encounters(detail: &EncounterDetail) {
    println!(
        "Map {:03} {} - encounter step {}",
        detail.map_id,
        detail.map_name.as_deref().unwrap_or(""),
        detail.encounter_step
    );
    for row in &detail.rows {
        let regions = if row.region_set.is_empty() {
            "whole map".to_owned()
        } else {
            let ids: Vec<String> = row.region_set.iter().map(i32::to_string).collect();
            format!("regions {}", ids.join(", "))
        };
        println!("  weight {} in {}", row.weight, regions);
        print_troop(&row.troop, "    ");
    }
}

fn cmd_encounters(global: &GlobalArgs, map: i32) -> Result<()> {
    let view = load_view(global)?;
    let detail = view
        .encounter_detail(map)
        .with_context(|| format!("Map {map} has no encounter table"))?;
    if global.json {
        return print_json(detail);
    }
    print_encounters(detail);
    Ok(())
}

fn cmd_special(global: &GlobalArgs) -> Result<()> {
    let view = load_view(global)?;
    let troops = view.special_troops();
    let encounters = view.special_encounters();

    if global.json {
        return print_json(&serde_json::json!({ "troops": troops, "encounters": encounters }));
    }

    println!("Special troops: {}", troops.len());
    for troop in troops {
        println!(
            "  {:>4} {} ({})",
            troop.troop_id,
            troop.name.as_deref().unwrap_or("(missing)"),
            troop.reason.as_str()
        );
        for site in &troop.sites {
            println!("         {site}");
        }
    }
    println!("Story encounters: {}", encounters.len());
    for encounter in encounters {
        println!("  Map {:03} {}", encounter.map_id, encounter.map_name.as_deref().unwrap_or(""));
        for site in &encounter.sites {
            println!("         {site}");
        }
    }

    Ok(())
}

fn cmd_passability(global: &GlobalArgs, map: i32) -> Result<()> {
    let view = load_view(global)?;
    let grid = view.passability(map).with_context(|| format!("Map {map} was not decoded"))?;
    if global.json {
        return print_json(&grid);
    }
    for y in 0..grid.height {
        let row: String = (0..grid.width)
            .map(|x| match grid.get(x, y) {
                Some(0xf) => '.',
                Some(0) | None => '#',
                Some(_) => '+',
            })
            .collect();
        println!("{row}");
    }
    Ok(())
}
