//! Binary entrypoint for the Taleloom player.
//!
//! Commands:
//! - `play [--save <path>] [--new]` - run the bundled story interactively
//! - `init` - create a starter `config.toml`
//! - `inspect` - print the registered story content and exit
//!
//! See the library crate docs for module-level details: `taleloom::`.
use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{info, warn};

use taleloom::config::Config;
use taleloom::engine::{format_clock, save, Action, Block, Game};
use taleloom::story;

#[derive(Parser)]
#[command(name = "taleloom")]
#[command(about = "An interpreter and world runtime for scripted interactive stories")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the bundled story
    Play {
        /// Save file path, overriding the configured location
        #[arg(short, long)]
        save: Option<String>,

        /// Start a fresh game even if a save file exists
        #[arg(short, long)]
        new: bool,
    },
    /// Initialize a new configuration file
    Init,
    /// List the registered locations, NPCs, cards and scripts
    Inspect,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config early to configure logging; Init writes its default later.
    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Config::load(&cli.config).ok(),
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Play { save, new } => {
            let config = pre_config.unwrap_or_default();
            let save_path = match save {
                Some(path) => PathBuf::from(path),
                None => config.save_path()?,
            };
            play(&config, &save_path, new)?;
        }
        Commands::Init => {
            info!("Initializing new configuration");
            Config::create_default(&cli.config)?;
            info!("Configuration file created at {}", cli.config);
            println!("Wrote {}. Run `taleloom play` to begin.", cli.config);
        }
        Commands::Inspect => {
            let content = story::content()?;
            println!("Locations:");
            for id in content.location_ids() {
                let def = content.location_def(id)?;
                println!("  {:<12} {}", id, def.name);
            }
            println!("NPCs:");
            for id in content.npc_ids() {
                let def = content.npc_def(id)?;
                println!("  {:<12} {}, {}", id, def.name, def.title);
            }
            println!("Cards:");
            for id in content.card_ids() {
                let def = content.card_def(id)?;
                println!("  {:<12} [{}] {}", id, def.kind.label(), def.name);
            }
            let mut scripts: Vec<&str> = content.script_names().collect();
            scripts.sort_unstable();
            println!("Scripts: {}", scripts.join(", "));
        }
    }

    Ok(())
}

fn play(config: &Config, save_path: &std::path::Path, force_new: bool) -> Result<()> {
    let mut game = if !force_new && save_path.exists() {
        info!("Resuming from {}", save_path.display());
        save::load_from_path(story::content()?, save_path)?
    } else {
        info!("Starting a fresh game");
        match config.game.seed {
            Some(seed) => story::new_seeded_game(seed)?,
            None => story::new_game()?,
        }
    };

    println!("=== {} ===", config.game.title);
    println!("Number an option to act. Enter looks around when nothing is pending.");
    println!("j journal, t status, s save, q quit. Anything else runs as a script.");
    println!();
    render(&game);

    let stdin = std::io::stdin();
    let mut out = std::io::stdout();
    loop {
        write!(out, "> ")?;
        out.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let input = line.trim();

        let action = match input {
            "q" | "quit" => break,
            "s" | "save" => {
                save::save_to_path(&game, save_path)?;
                println!("Saved to {}.", save_path.display());
                continue;
            }
            "j" | "journal" => {
                show_journal(&game)?;
                continue;
            }
            "t" | "status" => {
                show_status(&game);
                continue;
            }
            "" => {
                if game.scene.options.is_empty() {
                    Action::expr("look")
                } else {
                    continue;
                }
            }
            text => match text.parse::<usize>() {
                Ok(n) => {
                    let Some(choice) = game.scene.options.get(n.saturating_sub(1)) else {
                        println!("No option {}.", n);
                        continue;
                    };
                    if choice.disabled {
                        println!("That option is not available.");
                        continue;
                    }
                    choice.action.clone()
                }
                Err(_) => Action::expr(text),
            },
        };

        game.before_action()?;
        game.take_action(&action);
        game.after_action()?;

        if config.game.autosave {
            if let Err(e) = save::save_to_path(&game, save_path) {
                warn!("Autosave failed: {}", e);
            }
        }
        render(&game);
    }

    if config.game.autosave {
        save::save_to_path(&game, save_path)?;
        println!("Saved to {}.", save_path.display());
    }
    println!("Until next time.");
    Ok(())
}

/// Prints the current scene: portrait line, content blocks, then options.
fn render(game: &Game) {
    if let Some(npc_id) = game.scene.npc.as_deref() {
        if !game.scene.hide_portrait {
            if let Ok(def) = game.content().npc_def(npc_id) {
                println!("[ {}, {} ]", def.name, def.title);
            }
        }
    }

    for block in &game.scene.content {
        match block {
            Block::Paragraph { text } => println!("{}", text),
            Block::Speech { who, text } => println!("{}: \"{}\"", who, text),
            Block::Highlight { text } => println!("** {} **", text),
            Block::Notice { category, text } => println!("[{}] {}", category.label(), text),
            Block::Error { text } => println!("(!) {}", text),
        }
        println!();
    }

    for (i, choice) in game.scene.options.iter().enumerate() {
        if choice.disabled {
            println!("  {}) {} (unavailable)", i + 1, choice.label);
        } else {
            println!("  {}) {}", i + 1, choice.label);
        }
    }
    if !game.scene.options.is_empty() {
        println!();
    }
}

fn show_journal(game: &Game) -> Result<()> {
    if game.player.cards.is_empty() {
        println!("The journal is empty.");
        return Ok(());
    }
    for card in &game.player.cards {
        let def = game.content().card_def(&card.id)?;
        let state = if card.completed() { " (done)" } else { "" };
        println!("[{}] {}{}", card.kind.label(), def.name, state);
        if !def.description.is_empty() {
            println!("    {}", def.description);
        }
    }
    for line in game.reminders()? {
        println!("  * {}", line);
    }
    Ok(())
}

fn show_status(game: &Game) {
    let here = match game.content().location_def(&game.location) {
        Ok(def) => def.name.clone(),
        Err(_) => game.location.clone(),
    };
    println!("{}, {}. Score {}.", here, format_clock(game.clock), game.score);
    let stats: Vec<String> = game
        .player
        .derived
        .iter()
        .map(|(name, value)| format!("{} {:.0}", name, value))
        .collect();
    if !stats.is_empty() {
        println!("{}", stats.join(", "));
    }
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured base level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .map(|c| c.log_level())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);
    if let Some(file) = config.as_ref().and_then(|c| c.logging.file.clone()) {
        // Route log lines to the file so they do not interleave with the
        // story text on the terminal.
        if let Ok(f) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file)
        {
            let sink = std::sync::Mutex::new(f);
            builder.format(move |_, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                if let Ok(mut guard) = sink.lock() {
                    let _ = writeln!(guard, "{} [{}] {}", ts, record.level(), record.args());
                }
                Ok(())
            });
        }
    }
    let _ = builder.try_init();
}
