use anyhow::Context;
use chess_quest_engine::campaign::Campaign;
use chess_quest_engine::catalog_store::resolve_catalog;
use chess_quest_engine::constants::piece_display_name;
use chess_quest_engine::session::{MoveOutcome, PuzzleSession};
use chess_quest_engine::types::{Direction, EntityType, GameState, PieceType, Position, RuntimeEvent};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Level pack to play instead of the built-in curriculum.
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Level id or 1-based number to start on.
    #[arg(long)]
    level: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Command {
    MoveTo(Position),
    Step(Direction),
    Reset,
    Next,
    Levels,
    Start(String),
    Menu,
    Resume,
    Help,
    Quit,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chess_quest_engine=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let catalog = resolve_catalog(cli.catalog.as_deref()).context("failed to load level catalog")?;
    let mut campaign = Campaign::new(catalog);
    start_named(&mut campaign, cli.level.as_deref().unwrap_or("1"))?;

    let stdin = io::stdin();
    let mut out = io::stdout().lock();
    write_screen(&mut out, &mut campaign)?;

    for line in stdin.lock().lines() {
        let line = line.context("failed to read input")?;
        let Some(command) = parse_command(&line) else {
            writeln!(out, "unknown command {:?}; type help", line.trim())?;
            continue;
        };
        match command {
            Command::Quit => break,
            Command::Help => write_help(&mut out)?,
            Command::Levels => write_levels(&mut out, &campaign)?,
            Command::Reset => campaign.reset_level(),
            Command::Menu => campaign.return_to_menu(),
            Command::Resume => {
                if !campaign.resume() {
                    writeln!(out, "no level in progress")?;
                }
            }
            Command::Next => {
                if campaign.next_level()? == GameState::Menu {
                    writeln!(out, "all levels complete")?;
                }
            }
            Command::Start(name) => {
                if let Err(error) = start_named(&mut campaign, &name) {
                    writeln!(out, "{error:#}")?;
                }
            }
            Command::MoveTo(to) => report_move(&mut out, campaign.move_player(to))?,
            Command::Step(direction) => {
                report_move(&mut out, campaign.move_in_direction(direction))?
            }
        }
        write_screen(&mut out, &mut campaign)?;
    }
    Ok(())
}

fn start_named(campaign: &mut Campaign, name: &str) -> anyhow::Result<()> {
    match name.parse::<usize>() {
        Ok(number) if number >= 1 => campaign.start_level(number - 1)?,
        _ => campaign.start_level_by_id(name)?,
    };
    Ok(())
}

fn parse_command(line: &str) -> Option<Command> {
    let trimmed = line.trim();
    let mut words = trimmed.split_whitespace();
    let head = words.next()?;
    match head.to_ascii_lowercase().as_str() {
        "q" | "quit" | "exit" => return Some(Command::Quit),
        "h" | "help" | "?" => return Some(Command::Help),
        "r" | "reset" => return Some(Command::Reset),
        "n" | "next" => return Some(Command::Next),
        "levels" => return Some(Command::Levels),
        "menu" => return Some(Command::Menu),
        "resume" => return Some(Command::Resume),
        "level" | "start" => return words.next().map(|name| Command::Start(name.to_string())),
        _ => {}
    }
    if let Some(direction) = Direction::parse_move(head) {
        return Some(Command::Step(direction));
    }
    parse_position(trimmed).map(Command::MoveTo)
}

/// Accepts `x,y`, `x y`, or `(x, y)`.
fn parse_position(text: &str) -> Option<Position> {
    let cleaned = text.trim_matches(|c| c == '(' || c == ')');
    let mut parts = cleaned
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty());
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Position::new(x, y))
}

fn report_move(out: &mut impl Write, outcome: MoveOutcome) -> io::Result<()> {
    if outcome == MoveOutcome::Rejected {
        writeln!(out, "that move is not allowed")?;
    }
    Ok(())
}

fn write_screen(out: &mut impl Write, campaign: &mut Campaign) -> io::Result<()> {
    if campaign.game_state() == GameState::Menu {
        writeln!(out, "-- menu -- (levels, level <id|n>, resume, quit)")?;
        return Ok(());
    }
    let progress = campaign.progress();
    let world = campaign
        .current_world()
        .map(|world| world.name.clone())
        .unwrap_or_default();
    let Some(session) = campaign.session_mut() else {
        return Ok(());
    };
    for event in session.drain_events() {
        if let Some(text) = describe_event(&event) {
            writeln!(out, "{text}")?;
        }
    }

    let level = session.level();
    writeln!(
        out,
        "\n{world} {}/{}: {} ({})",
        progress.current,
        progress.total,
        level.name,
        piece_display_name(session.piece_type())
    )?;
    if let Some(text) = &level.meta.tutorial_text {
        writeln!(out, "{text}")?;
    }
    write!(out, "{}", render_board(session))?;
    writeln!(
        out,
        "moves {}  collected {}/{}{}",
        session.move_count(),
        session.items_collected(),
        session.total_collectibles(),
        if session.is_exit_unlocked() {
            ""
        } else {
            "  exit locked"
        }
    )?;
    match session.state() {
        GameState::Won => writeln!(out, "level complete! type next to continue")?,
        GameState::Lost => writeln!(out, "level lost. type reset to try again")?,
        _ => {}
    }
    Ok(())
}

fn describe_event(event: &RuntimeEvent) -> Option<String> {
    match event {
        RuntimeEvent::ItemCollected {
            entity_type, at, ..
        } => Some(format!("picked up {entity_type:?} at {at}").to_lowercase()),
        RuntimeEvent::EnemyCaptured { entity_id, at } => {
            Some(format!("captured {entity_id} at {at}"))
        }
        RuntimeEvent::ExitUnlocked => Some("the exit is open".to_string()),
        _ => None,
    }
}

fn piece_glyph(piece_type: PieceType) -> char {
    match piece_type {
        PieceType::Pawn => 'P',
        PieceType::Knight => 'N',
        PieceType::Rook => 'R',
        PieceType::Bishop => 'B',
        PieceType::Queen => 'Q',
        PieceType::King => 'K',
    }
}

fn entity_glyph(entity_type: EntityType, exit_unlocked: bool) -> char {
    match entity_type {
        EntityType::Player => '@',
        EntityType::Coin => 'c',
        EntityType::Treasure => 't',
        EntityType::Friend => 'f',
        EntityType::Exit if exit_unlocked => 'E',
        EntityType::Exit => 'e',
        EntityType::Slime => 's',
        EntityType::Goblin => 'g',
        EntityType::Boss => 'X',
        EntityType::Danger => '!',
    }
}

/// Text board with column and row labels; `*` marks legal destinations.
fn render_board(session: &PuzzleSession) -> String {
    let size = session.board_size();
    let valid = session.valid_moves();
    let exit_unlocked = session.is_exit_unlocked();
    let mut text = String::from("  ");
    for x in 0..size.width {
        text.push_str(&format!(" {x}"));
    }
    text.push('\n');
    for y in 0..size.height {
        text.push_str(&format!("{y:>2}"));
        for x in 0..size.width {
            let pos = Position::new(x, y);
            let glyph = if pos == session.player_position() {
                piece_glyph(session.piece_type())
            } else if let Some(entity) = session
                .board()
                .iter()
                .filter(|entity| entity.position == pos)
                .max_by_key(|entity| entity.entity_type.is_enemy())
            {
                entity_glyph(entity.entity_type, exit_unlocked)
            } else if valid.contains(&pos) {
                '*'
            } else {
                '.'
            };
            text.push(' ');
            text.push(glyph);
        }
        text.push('\n');
    }
    text
}

fn write_levels(out: &mut impl Write, campaign: &Campaign) -> io::Result<()> {
    for (index, level) in campaign.catalog().levels().iter().enumerate() {
        let marker = if index == campaign.current_index() { '>' } else { ' ' };
        writeln!(
            out,
            "{marker}{:>3} {:<28} {:<8} {}",
            index + 1,
            level.id,
            piece_display_name(level.player.piece_type),
            level.name
        )?;
    }
    Ok(())
}

fn write_help(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "x,y          move to a square")?;
    writeln!(out, "up/down/...  step one square (also w/a/s/d)")?;
    writeln!(out, "reset        restart this level")?;
    writeln!(out, "next         go to the next level")?;
    writeln!(out, "levels       list all levels")?;
    writeln!(out, "level <id|n> jump to a level")?;
    writeln!(out, "menu/resume  leave or return to the level")?;
    writeln!(out, "quit         leave the game")
}
