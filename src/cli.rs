use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::models::{DownloadLink, Quality};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Cloud Firestore + Firebase Auth over REST
    Firebase,
    /// In-process store and auth, nothing leaves the machine
    Memory,
}

#[derive(Parser, Debug)]
#[command(name = "filmshub")]
#[command(author, version, about = "Browse and manage the films catalog", long_about = None)]
pub struct Args {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ConnectionArgs {
    /// Catalog backend
    #[arg(long, value_enum, default_value = "firebase", global = true)]
    pub backend: Backend,

    /// Firebase project identifier
    #[arg(long, env = "FILMSHUB_PROJECT_ID", global = true)]
    pub project_id: Option<String>,

    /// Firebase web API key
    #[arg(long, env = "FILMSHUB_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Firestore collection holding the catalog
    #[arg(long, env = "FILMSHUB_COLLECTION", default_value = "videos", global = true)]
    pub collection: String,

    /// Where the signed-in session is kept between runs
    #[arg(long, env = "FILMSHUB_SESSION_FILE", global = true)]
    pub session_file: Option<PathBuf>,

    /// Firestore REST endpoint
    #[arg(
        long,
        env = "FILMSHUB_FIRESTORE_URL",
        default_value = "https://firestore.googleapis.com/v1",
        global = true
    )]
    pub firestore_url: String,

    /// Identity Toolkit REST endpoint
    #[arg(
        long,
        env = "FILMSHUB_IDENTITY_URL",
        default_value = "https://identitytoolkit.googleapis.com/v1",
        global = true
    )]
    pub identity_url: String,

    /// Secure Token REST endpoint
    #[arg(
        long,
        env = "FILMSHUB_SECURETOKEN_URL",
        default_value = "https://securetoken.googleapis.com/v1",
        global = true
    )]
    pub securetoken_url: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactive catalog shell
    Browse,

    /// Print the catalog, newest first
    List {
        /// Only items whose title or description contain this text
        #[arg(short, long, default_value = "")]
        search: String,
    },

    /// Show one item with its download links
    Show { id: String },

    /// Sign in as admin
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },

    /// Sign out and forget the saved session
    Logout,

    /// Publish a new item (requires a signed-in session)
    Publish {
        #[arg(short, long)]
        title: String,

        /// Thumbnail URL
        #[arg(long)]
        thumbnail: String,

        #[arg(short, long, default_value = "")]
        description: String,

        /// Download link as QUALITY,SIZE,URL (repeatable, order is kept)
        #[arg(short, long = "link", value_parser = parse_link)]
        links: Vec<DownloadLink>,
    },

    /// Delete an item (requires a signed-in session)
    Delete {
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Save one of an item's download links locally
    Download {
        id: String,

        /// Link number as shown by `show` (starting at 1)
        link: usize,

        /// Output directory
        #[arg(short, long, default_value = "./downloads")]
        output: PathBuf,
    },
}

pub fn parse_link(raw: &str) -> Result<DownloadLink, String> {
    let mut parts = raw.splitn(3, ',');
    let (Some(quality), Some(size), Some(url)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("expected QUALITY,SIZE,URL but got '{}'", raw));
    };
    let quality: Quality = quality.parse().map_err(|e| format!("{}", e))?;
    let size = size.trim();
    let url = url.trim();
    if size.is_empty() || url.is_empty() {
        return Err("link size and url must not be empty".to_string());
    }
    Ok(DownloadLink {
        quality,
        size: size.to_string(),
        url: url.to_string(),
    })
}
