use anyhow::{Context, Result, anyhow};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use filmshub::App;
use filmshub::auth::{FirebaseAuth, MemoryAuth, SessionProvider};
use filmshub::cli::{Args, Backend, Command};
use filmshub::config::Config;
use filmshub::downloader::Downloader;
use filmshub::models::{DownloadLink, ItemId};
use filmshub::shell;
use filmshub::store::{CatalogStore, FirestoreStore, MemoryStore};
use filmshub::view::{self, DraftField, Message, NoticeLevel, State};

const MEMORY_ADMIN_EMAIL: &str = "admin@localhost";
const MEMORY_ADMIN_PASSWORD: &str = "admin";

fn http_client() -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("Failed to build HTTP client")
}

async fn connect(
    config: &Config,
    client: &Client,
) -> (Arc<dyn CatalogStore>, Arc<dyn SessionProvider>) {
    match config.backend {
        Backend::Firebase => {
            let auth = Arc::new(FirebaseAuth::new(client.clone(), config));
            auth.restore().await;
            let auth: Arc<dyn SessionProvider> = auth;
            let store = FirestoreStore::new(client.clone(), config, auth.clone());
            (Arc::new(store), auth)
        }
        Backend::Memory => {
            info!(
                email = MEMORY_ADMIN_EMAIL,
                password = MEMORY_ADMIN_PASSWORD,
                "Using in-memory backend"
            );
            let auth = MemoryAuth::new().with_account(MEMORY_ADMIN_EMAIL, MEMORY_ADMIN_PASSWORD);
            (Arc::new(MemoryStore::new()), Arc::new(auth))
        }
    }
}

/// Load the catalog behind a spinner.
async fn load(app: &mut App) {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Loading library...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    app.start().await;
    spinner.finish_and_clear();
}

/// Print the current notice; an error notice fails the command.
fn report(state: &State) -> Result<()> {
    match &state.notice {
        Some(notice) if notice.level == NoticeLevel::Error => Err(anyhow!("{}", notice.text)),
        Some(notice) => {
            println!("{}", notice.text);
            Ok(())
        }
        None => Ok(()),
    }
}

fn require_session(state: &State) -> Result<()> {
    if !state.is_signed_in() {
        return Err(anyhow!("Not signed in (run `filmshub login` first)"));
    }
    Ok(())
}

async fn dispatch_all(app: &mut App, messages: impl IntoIterator<Item = Message>) {
    for message in messages {
        app.dispatch(message).await;
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

async fn publish(
    app: &mut App,
    title: String,
    thumbnail: String,
    description: String,
    links: Vec<DownloadLink>,
) -> Result<()> {
    require_session(app.state())?;
    dispatch_all(
        app,
        [
            Message::ToggleAdmin,
            Message::DraftChanged(DraftField::Title, title),
            Message::DraftChanged(DraftField::Thumbnail, thumbnail),
            Message::DraftChanged(DraftField::Description, description),
        ],
    )
    .await;
    for link in links {
        dispatch_all(
            app,
            [
                Message::LinkQualityChanged(link.quality),
                Message::DraftChanged(DraftField::LinkSize, link.size),
                Message::DraftChanged(DraftField::LinkUrl, link.url),
                Message::AddLink,
            ],
        )
        .await;
    }
    app.dispatch(Message::Publish).await;
    report(app.state())
}

async fn delete(app: &mut App, id: ItemId, yes: bool) -> Result<()> {
    require_session(app.state())?;
    app.dispatch(Message::RequestDelete(id.clone())).await;
    let Some(title) = app.state().item(&id).map(|item| item.title.clone()) else {
        return Err(anyhow!("No catalog item with id {}", id));
    };

    let confirmed = yes || confirm(&format!("Delete \"{}\"?", title))?;
    app.dispatch(Message::ConfirmDelete(confirmed)).await;
    if !confirmed {
        println!("Cancelled");
        return Ok(());
    }

    report(app.state())?;
    if app.state().item(&id).is_none() {
        println!("Deleted {}", title);
    }
    Ok(())
}

async fn download(
    app: &App,
    client: Client,
    id: ItemId,
    link: usize,
    output: PathBuf,
) -> Result<()> {
    let item = app
        .state()
        .item(&id)
        .ok_or_else(|| anyhow!("No catalog item with id {}", id))?;
    let chosen = link
        .checked_sub(1)
        .and_then(|idx| item.links.get(idx))
        .ok_or_else(|| anyhow!("{} has no link {}", item.title, link))?;

    let downloader = Downloader::new(client, output)?;
    let path = downloader.download(item, chosen).await?;
    println!("Saved {}", path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "filmshub=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();
    let config = Config::from_args(args.connection)?;
    let client = http_client()?;

    let (store, auth) = connect(&config, &client).await;
    let mut app = App::new(store, auth);

    match args.command {
        Command::Browse => {
            shell::run(app, client).await?;
        }
        Command::List { search } => {
            load(&mut app).await;
            app.dispatch(Message::SearchChanged(search)).await;
            print!("{}", view::render(app.state()));
        }
        Command::Show { id } => {
            load(&mut app).await;
            let id = ItemId::new(id);
            app.dispatch(Message::Select(id.clone())).await;
            let item = app
                .state()
                .selected_item()
                .ok_or_else(|| anyhow!("No catalog item with id {}", id))?;
            print!("{}", view::detail(item));
        }
        Command::Login { email, password } => {
            app.pump().await;
            if let Some(session) = &app.state().session {
                println!("Already signed in as {}", session.email);
                return Ok(());
            }
            dispatch_all(
                &mut app,
                [
                    Message::ToggleAdmin,
                    Message::EmailChanged(email),
                    Message::PasswordChanged(password),
                    Message::SubmitLogin,
                ],
            )
            .await;
            report(app.state())?;
        }
        Command::Logout => {
            app.pump().await;
            if app.state().is_signed_in() {
                app.dispatch(Message::SignOut).await;
                println!("Signed out");
            } else {
                println!("Not signed in");
            }
        }
        Command::Publish {
            title,
            thumbnail,
            description,
            links,
        } => {
            load(&mut app).await;
            publish(&mut app, title, thumbnail, description, links).await?;
        }
        Command::Delete { id, yes } => {
            load(&mut app).await;
            delete(&mut app, ItemId::new(id), yes).await?;
        }
        Command::Download { id, link, output } => {
            load(&mut app).await;
            download(&app, client, ItemId::new(id), link, output).await?;
        }
    }

    Ok(())
}
