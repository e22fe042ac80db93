use std::io::Write;
use std::time::Duration;

use clap::Subcommand;
use hunter_core::clock::{Clock, SystemClock};
use hunter_core::error::Result;
use hunter_core::quest::{format_remaining, BoardSnapshot, QuestBoard, TickSource, Ticker};
use hunter_core::Event;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use super::{CmdResult, Context};

#[derive(Subcommand)]
pub enum QuestAction {
    /// Generate today's workout (no-op if it already exists)
    Add,
    /// List quests for the selected date
    List,
    /// Complete a quest by list position or id
    Complete {
        /// 1-based position in `quest list`, or the quest id
        quest: String,
    },
    /// Countdown, rest timer and progress
    Status,
    /// Live board: ticks every second, reads `add`, `done N`, `quit` from stdin
    Watch,
}

fn checklist(snapshot: &BoardSnapshot) -> String {
    if snapshot.quests.is_empty() {
        return format!("No quests on {}.", snapshot.selected_date);
    }
    let mut lines = vec![format!("Quests for {}:", snapshot.selected_date)];
    for (i, quest) in snapshot.quests.iter().enumerate() {
        let mark = if quest.completed { "x" } else { " " };
        lines.push(format!("{:>2}. [{mark}] {}", i + 1, quest.title));
    }
    lines.join("\n")
}

fn status_line(snapshot: &BoardSnapshot) -> String {
    let mut parts = Vec::new();
    match snapshot.remaining_ms {
        Some(ms) => {
            let flag = if snapshot.urgent { " !" } else { "" };
            parts.push(format!("Time left {}{flag}", format_remaining(ms as i64)));
        }
        None => parts.push("No countdown".to_string()),
    }
    if snapshot.penalized {
        parts.push("penalized".to_string());
    }
    if !snapshot.can_complete {
        parts.push(format!("resting {}s", snapshot.rest_remaining_secs));
    }
    parts.push(format!("points {}", snapshot.progress.points));
    parts.join(" | ")
}

pub fn run(action: QuestAction, json: bool) -> CmdResult {
    let ctx = Context::open(json)?;
    if let QuestAction::Watch = action {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        return runtime.block_on(watch(&ctx));
    }

    let mut board = QuestBoard::load(&ctx.db, &ctx.session, SystemClock, &ctx.config.quest)?;
    let mut announcer = ctx.announcer();

    // Every invocation is a tick: settle deadlines before acting.
    let mut events = board.tick()?;
    let outcome = match &action {
        QuestAction::Add => board.add_quest(),
        QuestAction::Complete { quest } => board
            .resolve(quest)
            .and_then(|id| board.complete(&id)),
        QuestAction::List | QuestAction::Status | QuestAction::Watch => Ok(Vec::new()),
    };
    // Keep timer state even when the command itself fails.
    board.save()?;
    events.extend(outcome?);
    ctx.emit(&mut announcer, &events)?;

    let snapshot = board.snapshot()?;
    match action {
        QuestAction::List => ctx.print(&snapshot.quests, || checklist(&snapshot)),
        QuestAction::Status => ctx.print(&snapshot, || {
            format!("{}\n{}", status_line(&snapshot), checklist(&snapshot))
        }),
        _ if ctx.json => Ok(()),
        _ => {
            println!("{}", checklist(&snapshot));
            Ok(())
        }
    }
}

const WATCH_USAGE: &str = "commands: add | done N | quit";

enum Step {
    Events(Vec<Event>),
    Quit,
}

/// Board state for `quest watch`. Owns the rest ticker, which runs only
/// while the rest timer does.
struct Watch<'a, C: Clock> {
    board: QuestBoard<'a, C>,
    rest: Option<Ticker>,
    period: Duration,
    tx: mpsc::UnboundedSender<TickSource>,
}

impl<'a, C: Clock> Watch<'a, C> {
    fn new(board: QuestBoard<'a, C>, period: Duration, tx: mpsc::UnboundedSender<TickSource>) -> Self {
        let mut watch = Self {
            board,
            rest: None,
            period,
            tx,
        };
        watch.sync_rest();
        watch
    }

    fn sync_rest(&mut self) {
        let resting = self.board.state().rest.is_active();
        if resting && self.rest.is_none() {
            self.rest = Some(Ticker::start(self.period, TickSource::Rest, self.tx.clone()));
        } else if !resting {
            self.rest = None;
        }
    }

    fn on_tick(&mut self, source: TickSource) -> Result<Vec<Event>> {
        let events = match source {
            TickSource::Countdown => self.board.tick_countdown()?,
            TickSource::Rest => self.board.tick_rest().into_iter().collect(),
        };
        self.sync_rest();
        Ok(events)
    }

    fn on_command(&mut self, line: &str) -> Result<Step> {
        let mut words = line.split_whitespace();
        let result = match (words.next(), words.next()) {
            (Some("add"), _) => self.board.add_quest(),
            (Some("done"), Some(selector)) => self
                .board
                .resolve(selector)
                .and_then(|id| self.board.complete(&id)),
            (Some("quit" | "q"), _) => return Ok(Step::Quit),
            (None, _) => Ok(Vec::new()),
            _ => {
                eprintln!("{WATCH_USAGE}");
                Ok(Vec::new())
            }
        };
        self.sync_rest();
        result.map(Step::Events)
    }
}

async fn watch(ctx: &Context) -> CmdResult {
    let board = QuestBoard::load(&ctx.db, &ctx.session, SystemClock, &ctx.config.quest)?;
    let mut announcer = ctx.announcer();
    let period = Duration::from_millis(ctx.config.quest.tick_ms);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _countdown = Ticker::start(period, TickSource::Countdown, tx.clone());
    let mut watch = Watch::new(board, period, tx);

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    if !ctx.json {
        println!("{}", checklist(&watch.board.snapshot()?));
        println!("{WATCH_USAGE}");
    }

    loop {
        let events = tokio::select! {
            Some(source) = rx.recv() => match watch.on_tick(source) {
                Ok(events) => events,
                Err(e) => {
                    tracing::warn!("tick failed, retrying next second: {e}");
                    continue;
                }
            },
            line = stdin.next_line() => {
                let Some(line) = line? else { break };
                announcer.unlock();
                match watch.on_command(&line) {
                    Ok(Step::Quit) => break,
                    Ok(Step::Events(events)) => {
                        if !ctx.json && !events.is_empty() {
                            println!();
                            println!("{}", checklist(&watch.board.snapshot()?));
                        }
                        events
                    }
                    Err(e) => {
                        eprintln!("error: {e}");
                        Vec::new()
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        };

        if !events.is_empty() && !ctx.json {
            println!();
        }
        ctx.emit(&mut announcer, &events)?;
        if !ctx.json {
            print!("\r{:<72}", status_line(&watch.board.snapshot()?));
            std::io::stdout().flush()?;
        }
        watch.board.save()?;
    }

    watch.rest = None;
    watch.board.save()?;
    if !ctx.json {
        println!();
    }
    Ok(())
}
