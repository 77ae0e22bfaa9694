// Terminal renderer: reads user lines, talks to the gateway, shows idea cards.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{error, info};

use crate::client::GatewayClient;
use crate::constants::{PLACEHOLDER_MESSAGE, SUGGESTED_TOPICS};
use crate::ideas::split_idea_cards;
use crate::model::{Role, Turn};
use crate::session::{is_saveable, ChatSession, HistoryMode};
use crate::store::{JsonFileStore, SessionStore};

#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub server: String,
    pub data_dir: PathBuf,
    pub history_mode: HistoryMode,
}

pub async fn run_chat(options: ChatOptions) -> Result<()> {
    info!(server = %options.server, data_dir = %options.data_dir.display(), "Starting chat session");
    let store = JsonFileStore::new(&options.data_dir);
    let mut session = ChatSession::open(store, options.history_mode)?;
    let client = GatewayClient::new(&options.server);

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    chat_loop(&mut session, &client, stdin, &mut stdout).await
}

/// Drive one chat until `/quit` or end of input.
///
/// Each submission is awaited before the next line is read.
pub async fn chat_loop<S, R, W>(
    session: &mut ChatSession<S>,
    client: &GatewayClient,
    input: R,
    out: &mut W,
) -> Result<()>
where
    S: SessionStore,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "Idea Generator ChatBot")?;
    writeln!(
        out,
        "Type to generate ideas. Commands: /topic N, /save N, /saved, /history, /reset, /quit"
    )?;
    if session.history().is_empty() {
        print_topics(out)?;
    } else {
        print_history(session, out)?;
    }
    out.flush()?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        let line = line.trim();
        match parse_command(line) {
            Command::Quit => break,
            Command::Empty => continue,
            Command::Saved => print_saved(session, out)?,
            Command::History => print_history(session, out)?,
            Command::Reset => {
                session.reset();
                writeln!(out, "Cleared chat history and saved ideas.")?;
                print_topics(out)?;
            }
            Command::Toggle(index) => toggle_idea(session, index, out)?,
            Command::Unknown(cmd) => writeln!(out, "Unknown command: {}", cmd)?,
            Command::Topic(index) => match SUGGESTED_TOPICS.get(index - 1) {
                Some(topic) => {
                    writeln!(out, "> {}", topic)?;
                    submit(session, client, topic, out).await?;
                }
                None => writeln!(out, "No topic #{}.", index)?,
            },
            Command::Submit(text) => submit(session, client, text, out).await?,
        }
        out.flush()?;
    }
    info!("Chat session finished.");
    Ok(())
}

async fn submit<S: SessionStore, W: Write>(
    session: &mut ChatSession<S>,
    client: &GatewayClient,
    text: &str,
    out: &mut W,
) -> Result<()> {
    let Some(outbound) = session.submit_text(text) else {
        return Ok(());
    };
    match client.submit(&outbound).await {
        Ok(response) => session.apply_response(response),
        Err(e) => {
            error!("Chat request failed: {:#}", e);
            session.apply_failure();
        }
    }
    if let Some(turn) = session.history().last() {
        print_turn(session, turn, out)?;
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Empty,
    Quit,
    Saved,
    History,
    Reset,
    Toggle(usize),
    Topic(usize),
    Unknown(&'a str),
    Submit(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    if line.is_empty() {
        return Command::Empty;
    }
    if !line.starts_with('/') {
        return Command::Submit(line);
    }
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("/quit" | "/exit"), None) => Command::Quit,
        (Some("/saved"), None) => Command::Saved,
        (Some("/history"), None) => Command::History,
        (Some("/reset"), None) => Command::Reset,
        (Some("/save"), Some(n)) => match parse_index(n) {
            Some(index) => Command::Toggle(index),
            None => Command::Unknown(line),
        },
        (Some("/topic"), Some(n)) => match parse_index(n) {
            Some(index) => Command::Topic(index),
            None => Command::Unknown(line),
        },
        _ => Command::Unknown(line),
    }
}

// 1-based, as printed next to ideas and topics.
fn parse_index(n: &str) -> Option<usize> {
    n.parse::<usize>().ok().filter(|&index| index > 0)
}

fn toggle_idea<S: SessionStore, W: Write>(
    session: &mut ChatSession<S>,
    index: usize,
    out: &mut W,
) -> Result<()> {
    let Some(idea) = session.latest_ideas().get(index - 1).map(|s| s.to_string()) else {
        writeln!(out, "No idea #{} in the last reply.", index)?;
        return Ok(());
    };
    if !is_saveable(&idea) {
        writeln!(out, "Idea #{} cannot be saved.", index)?;
    } else if session.toggle_saved(&idea) {
        writeln!(out, "Saved idea #{}.", index)?;
    } else {
        writeln!(out, "Removed idea #{} from saved ideas.", index)?;
    }
    Ok(())
}

fn print_turn<S: SessionStore, W: Write>(
    session: &ChatSession<S>,
    turn: &Turn,
    out: &mut W,
) -> Result<()> {
    match turn.role {
        Role::User => writeln!(out, "> {}", turn.content)?,
        Role::System => {}
        Role::Assistant => {
            for (i, idea) in split_idea_cards(&turn.content).iter().enumerate() {
                let marker = if session.is_saved(idea) { "♥" } else { " " };
                writeln!(out, "{} [{}] {}", marker, i + 1, idea)?;
            }
        }
    }
    Ok(())
}

fn print_history<S: SessionStore, W: Write>(session: &ChatSession<S>, out: &mut W) -> Result<()> {
    for turn in session.history() {
        print_turn(session, turn, out)?;
    }
    Ok(())
}

fn print_topics<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out, "{}", PLACEHOLDER_MESSAGE)?;
    writeln!(out, "Suggested topics:")?;
    for (i, topic) in SUGGESTED_TOPICS.iter().enumerate() {
        writeln!(out, "  {}. {}", i + 1, topic)?;
    }
    Ok(())
}

fn print_saved<S: SessionStore, W: Write>(session: &ChatSession<S>, out: &mut W) -> Result<()> {
    if session.saved_ideas().is_empty() {
        writeln!(out, "No saved ideas yet.")?;
        return Ok(());
    }
    writeln!(out, "Saved Ideas ({})", session.saved_ideas().len())?;
    for idea in session.saved_ideas() {
        writeln!(out, "- {}", idea)?;
    }
    Ok(())
}
