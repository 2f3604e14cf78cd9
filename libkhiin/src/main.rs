use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use khiin_core::{DictionaryStore, Lexicon, NGramStore, SegmentStatus, UserDictionary};
use libkhiin::{CursorDirection, Engine, KhiinConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "khiin", about = "Taiwanese POJ input engine demo")]
struct Args {
    /// KhiinConfig TOML file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Lexicon file (.json, otherwise bincode); the built-in demo lexicon if absent
    #[arg(long)]
    lexicon: Option<PathBuf>,

    /// Persistent n-gram store (redb); kept in memory if absent
    #[arg(long)]
    ngrams: Option<PathBuf>,

    /// User dictionary of "input output" lines
    #[arg(long)]
    user_dict: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Type keys line by line and watch the preedit
    Repl,
    /// Show the candidate readings of raw input
    Segment {
        input: String,
        /// Left context word
        #[arg(long, default_value = "")]
        lgram: String,
        /// Do not fall back to toneless keys
        #[arg(long)]
        strict: bool,
    },
}

fn load_lexicon(path: Option<&Path>) -> Result<Lexicon> {
    let Some(path) = path else {
        return Ok(Lexicon::load_demo());
    };
    let lexicon = if path.extension().is_some_and(|e| e == "json") {
        Lexicon::load_json(path)
    } else {
        Lexicon::load_bincode(path)
    };
    lexicon.with_context(|| format!("loading lexicon from {}", path.display()))
}

fn build_engine(args: &Args) -> Result<Engine> {
    let config = match &args.config {
        Some(path) => KhiinConfig::load_toml(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => KhiinConfig::default(),
    };

    let lexicon = load_lexicon(args.lexicon.as_deref())?;
    let ngrams = match &args.ngrams {
        Some(path) => NGramStore::new_redb(path)
            .with_context(|| format!("opening n-gram store {}", path.display()))?,
        None => NGramStore::new_in_memory(),
    };

    let mut engine = Engine::new(Box::new(DictionaryStore::new(lexicon, ngrams)), config)?;

    if let Some(path) = &args.user_dict {
        let userdict = UserDictionary::load(path)
            .with_context(|| format!("loading user dictionary {}", path.display()))?;
        tracing::info!("{} user dictionary entries", userdict.len());
        engine.set_user_dictionary(Some(userdict));
    }

    Ok(engine)
}

/// Feed one line to the engine. Characters are typed as keys; a space is
/// the space key and `<name>` sends a named key.
fn run_keys(engine: &mut Engine, line: &str, out: &mut impl Write) -> Result<()> {
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '<' && chars.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            let name: String = chars.by_ref().take_while(|&c| c != '>').collect();
            match name.as_str() {
                "enter" => {
                    if let Some(text) = engine.handle_select_or_commit() {
                        writeln!(out, "  commit: {}", text)?;
                    }
                }
                "esc" => engine.revert(),
                "bs" => {
                    engine.erase(CursorDirection::Left);
                }
                "del" => {
                    engine.erase(CursorDirection::Right);
                }
                "left" => engine.handle_left_right(CursorDirection::Left),
                "right" => engine.handle_left_right(CursorDirection::Right),
                "tab" | "down" => engine.focus_next_candidate(),
                "up" => engine.focus_prev_candidate(),
                other => writeln!(out, "  unknown key <{}>", other)?,
            }
            continue;
        }

        if ch == ' ' {
            engine.handle_select_or_focus();
        } else if !engine.insert(ch) {
            writeln!(out, "  ignored '{}'", ch)?;
        }
    }

    Ok(())
}

fn print_state(engine: &Engine, out: &mut impl Write) -> Result<()> {
    let preedit = engine.build_preedit();
    if preedit.is_empty() {
        return Ok(());
    }

    let marked: String = preedit
        .segments
        .iter()
        .map(|s| match s.status {
            SegmentStatus::Focused => format!("[{}]", s.value),
            _ => s.value.clone(),
        })
        .collect();
    writeln!(
        out,
        "  {}  ({:?}, caret {})",
        marked,
        engine.edit_state(),
        preedit.caret
    )?;

    let candidates = engine.get_candidates();
    for item in candidates.current_page_candidates() {
        let mark = if candidates.focused == Some(item.id) { '>' } else { ' ' };
        writeln!(out, "  {}{}. {}", mark, item.id + 1, item.value)?;
    }
    Ok(())
}

fn repl(engine: &mut Engine) -> Result<()> {
    println!("Type POJ keys. A space converts, <enter> commits; other keys:");
    println!("<esc> <bs> <del> <left> <right> <tab> <up> <down>");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line?;
        run_keys(engine, &line, &mut stdout)?;
        print_state(engine, &mut stdout)?;
        stdout.flush()?;
    }
    Ok(())
}

fn segment(engine: &mut Engine, input: &str, lgram: &str, fuzzy: bool) {
    let primary = engine.primary_candidate(input, lgram, fuzzy);
    let reading: Vec<String> = primary
        .iter()
        .map(|c| format!("{}={}", c.raw, c.output()))
        .collect();
    println!("primary: {}", reading.join(" "));

    for (i, cand) in engine.find_candidates(input, lgram, fuzzy).iter().enumerate() {
        let reading: Vec<&str> = cand.iter().map(|c| c.output()).collect();
        println!("{:>3}. {}", i + 1, reading.concat());
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let mut engine = build_engine(&args)?;

    match &args.command {
        Some(Command::Segment {
            input,
            lgram,
            strict,
        }) => segment(&mut engine, input, lgram, !strict),
        Some(Command::Repl) | None => repl(&mut engine)?,
    }
    Ok(())
}
