use anyhow::{Context, Result};
use reqwest::Client;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::warn;

use crate::app::App;
use crate::downloader::Downloader;
use crate::models::Quality;
use crate::view::{DraftField, Message, State, render};

const DEFAULT_DOWNLOAD_DIR: &str = "./downloads";

const HELP: &str = "\
commands:
  search <text>        filter by title or description (empty clears)
  open <n> | close     show or hide the downloads of item n
  get <link#> [dir]    save a download link of the open item
  admin                show or hide the admin panel
  login [email pass]   sign in (or set with: email <e>, password <p>)
  logout
  title|thumb|desc <text>
  quality <4K|1080p|720p|480p|360p>, size <s>, url <u>, add-link
  publish
  delete <n>           then answer y or n
  refresh, help, quit";

/// A parsed line of shell input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Dispatch(Vec<Message>),
    Download { link: usize, dir: Option<PathBuf> },
    Help,
    Quit,
    Nothing,
}

fn nth_item(state: &State, arg: &str) -> Result<Message, String> {
    let n: usize = arg
        .trim()
        .parse()
        .map_err(|_| format!("expected an item number, got '{}'", arg.trim()))?;
    let items = state.filtered();
    n.checked_sub(1)
        .and_then(|idx| items.get(idx))
        .map(|item| Message::Select(item.id.clone()))
        .ok_or_else(|| format!("no item {} in the current list", n))
}

/// Turn one line into the messages it stands for. Item numbers refer to the
/// filtered list as currently rendered.
pub fn parse(line: &str, state: &State) -> Result<Input, String> {
    let line = line.trim();
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();
    let one = |message: Message| Ok(Input::Dispatch(vec![message]));

    if state.pending_delete.is_some() {
        match command.to_lowercase().as_str() {
            "y" | "yes" => return one(Message::ConfirmDelete(true)),
            "n" | "no" => return one(Message::ConfirmDelete(false)),
            _ => {}
        }
    }

    match command {
        "" => Ok(Input::Nothing),
        "search" => one(Message::SearchChanged(rest.to_string())),
        "open" => nth_item(state, rest).map(|m| Input::Dispatch(vec![m])),
        "close" => one(Message::CloseDetail),
        "admin" => one(Message::ToggleAdmin),
        "email" => one(Message::EmailChanged(rest.to_string())),
        "password" => one(Message::PasswordChanged(rest.to_string())),
        "login" => match rest.split_once(' ') {
            Some((email, password)) => Ok(Input::Dispatch(vec![
                Message::EmailChanged(email.to_string()),
                Message::PasswordChanged(password.trim().to_string()),
                Message::SubmitLogin,
            ])),
            None => one(Message::SubmitLogin),
        },
        "logout" => one(Message::SignOut),
        "title" => one(Message::DraftChanged(DraftField::Title, rest.to_string())),
        "thumb" | "thumbnail" => one(Message::DraftChanged(DraftField::Thumbnail, rest.to_string())),
        "desc" | "description" => {
            one(Message::DraftChanged(DraftField::Description, rest.to_string()))
        }
        "quality" => rest
            .parse::<Quality>()
            .map(|q| Input::Dispatch(vec![Message::LinkQualityChanged(q)]))
            .map_err(|e| e.to_string()),
        "size" => one(Message::DraftChanged(DraftField::LinkSize, rest.to_string())),
        "url" => one(Message::DraftChanged(DraftField::LinkUrl, rest.to_string())),
        "add-link" => one(Message::AddLink),
        "publish" => one(Message::Publish),
        "delete" => match nth_item(state, rest)? {
            Message::Select(id) => one(Message::RequestDelete(id)),
            _ => Ok(Input::Nothing),
        },
        "refresh" => one(Message::Refresh),
        "get" => {
            let (link, dir) = rest.split_once(' ').unwrap_or((rest, ""));
            let link: usize = link
                .parse()
                .map_err(|_| format!("expected a link number, got '{}'", link))?;
            let dir = dir.trim();
            Ok(Input::Download {
                link,
                dir: (!dir.is_empty()).then(|| PathBuf::from(dir)),
            })
        }
        "help" | "?" => Ok(Input::Help),
        "quit" | "exit" | "q" => Ok(Input::Quit),
        other => Err(format!("unknown command '{}', try help", other)),
    }
}

async fn download(app: &App, client: &Client, link: usize, dir: Option<PathBuf>) -> Result<()> {
    let Some(item) = app.state().selected_item() else {
        println!("Open an item first.");
        return Ok(());
    };
    let Some(chosen) = link.checked_sub(1).and_then(|idx| item.links.get(idx)) else {
        println!("{} has no link {}.", item.title, link);
        return Ok(());
    };
    let dir = dir.unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOAD_DIR));
    let downloader = Downloader::new(client.clone(), dir)?;
    let path = downloader.download(item, chosen).await?;
    println!("Saved {}", path.display());
    Ok(())
}

enum Next {
    Line(Option<String>),
    Event(Message),
}

/// Interactive loop: one line of input, one render.
pub async fn run(mut app: App, client: Client) -> Result<()> {
    app.start().await;
    println!("{}", render(app.state()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let next = tokio::select! {
            line = lines.next_line() => Next::Line(line.context("Failed to read input")?),
            Some(event) = app.next_event() => Next::Event(event),
        };
        let line = match next {
            Next::Line(Some(line)) => line,
            Next::Line(None) => break,
            Next::Event(event) => {
                app.dispatch(event).await;
                println!();
                println!("{}", render(app.state()));
                continue;
            }
        };

        match parse(&line, app.state()) {
            Ok(Input::Dispatch(messages)) => {
                app.dispatch(Message::DismissNotice).await;
                for message in messages {
                    app.dispatch(message).await;
                }
                println!("{}", render(app.state()));
            }
            Ok(Input::Download { link, dir }) => {
                if let Err(e) = download(&app, &client, link, dir).await {
                    warn!(error = %e, "Download failed");
                    println!("Download failed: {:#}", e);
                }
            }
            Ok(Input::Help) => println!("{}", HELP),
            Ok(Input::Quit) => break,
            Ok(Input::Nothing) => {}
            Err(reason) => println!("{}", reason),
        }
    }

    Ok(())
}
