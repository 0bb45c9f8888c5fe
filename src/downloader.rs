use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Client, StatusCode};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::models::{CatalogItem, DownloadLink};

/// Saves download links to a local directory, resuming `.part` files.
pub struct Downloader {
    client: Client,
    output_dir: PathBuf,
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{msg:30} {bar:40} {bytes}/{total_bytes} ({bytes_per_sec})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-")
}

fn partial_path(output_path: &Path) -> PathBuf {
    let mut name = output_path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

impl Downloader {
    pub fn new(client: Client, output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        if !output_dir.exists() {
            fs::create_dir_all(&output_dir).context("Failed to create output directory")?;
        }
        Ok(Self { client, output_dir })
    }

    /// Fetch one link of `item`. Returns the path of the finished file.
    pub async fn download(&self, item: &CatalogItem, link: &DownloadLink) -> Result<PathBuf> {
        let output_path = self.output_dir.join(link.file_name(&item.title));
        let partial_path = partial_path(&output_path);

        if output_path.exists() {
            info!(path = %output_path.display(), "Already downloaded");
            return Ok(output_path);
        }

        let mut current_pos = 0u64;
        if partial_path.exists() {
            current_pos = fs::metadata(&partial_path)?.len();
        }

        let mut request = self.client.get(&link.url);
        if current_pos > 0 {
            request = request.header("Range", format!("bytes={}-", current_pos));
        }

        let mut response = request.send().await.context("GET request failed")?;
        let status = response.status();

        if status == StatusCode::RANGE_NOT_SATISFIABLE && current_pos > 0 {
            // The partial file already holds everything the server has.
            fs::rename(&partial_path, &output_path).context("Failed to rename completed file")?;
            return Ok(output_path);
        }
        if !status.is_success() {
            return Err(anyhow!("HTTP request failed: {}", status));
        }
        if current_pos > 0 && status != StatusCode::PARTIAL_CONTENT {
            debug!("Server ignored range request, starting over");
            current_pos = 0;
        }

        let total_bytes = response.content_length().map(|len| len + current_pos);

        let pb = ProgressBar::new(total_bytes.unwrap_or(0));
        pb.set_style(bar_style());
        pb.set_message(format!("{} [{}]", item.title, link.quality));
        pb.set_position(current_pos);

        let mut file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .append(current_pos > 0)
            .truncate(current_pos == 0)
            .open(&partial_path)
            .context("Failed to open output file")?;

        let mut downloaded = current_pos;
        while let Some(chunk) = response.chunk().await? {
            if chunk.is_empty() {
                break;
            }
            file.write_all(&chunk)?;
            downloaded += chunk.len() as u64;
            pb.set_position(downloaded);
        }
        file.flush()?;
        drop(file);

        if let Some(expected) = total_bytes {
            if downloaded != expected {
                pb.abandon_with_message("Size mismatch!");
                return Err(anyhow!(
                    "File size mismatch for {}: expected {} bytes, got {} bytes",
                    output_path.display(),
                    expected,
                    downloaded
                ));
            }
        }

        fs::rename(&partial_path, &output_path).context("Failed to rename completed file")?;
        pb.finish_with_message("Done");
        info!(path = %output_path.display(), bytes = downloaded, "Download complete");

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_sits_next_to_target() {
        let path = partial_path(Path::new("/tmp/films/a.mp4"));
        assert_eq!(path, PathBuf::from("/tmp/films/a.mp4.part"));
    }

    #[tokio::test]
    async fn existing_file_is_not_fetched_again() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.mp4"), b"done").unwrap();
        let downloader = Downloader::new(Client::new(), dir.path()).unwrap();

        let item = CatalogItem {
            id: crate::models::ItemId::new("a"),
            title: "Movie A".to_string(),
            description: String::new(),
            thumbnail: String::new(),
            created_at: None,
            links: Vec::new(),
        };
        let link = DownloadLink {
            quality: crate::models::Quality::FullHd,
            size: "1GB".to_string(),
            // Unroutable: the test fails if a request is attempted.
            url: "http://127.0.0.1:9/a.mp4".to_string(),
        };
        let path = downloader.download(&item, &link).await.unwrap();
        assert_eq!(path, dir.path().join("a.mp4"));
    }
}
