//! Artwork download and on-disk cache.
//!
//! Each artwork URL is fetched once, resized to a square of the screen's
//! artwork size and stored as PNG under the cache directory. Later requests
//! for the same URL are served from disk.

use crate::config::DisplayConfig;
use crate::error::{CoreError, Result};
use crate::paths::artwork_cache_dir;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::ImageEncoder;
use sha1::{Digest, Sha1};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Artwork hosts can be slow; this is independent of the poll timeout
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ArtworkCache {
    client: reqwest::Client,
    dir: PathBuf,
    size: u32,
}

impl ArtworkCache {
    /// Create a cache storing `size`x`size` images in `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(dir: impl Into<PathBuf>, size: u32) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .user_agent(concat!("smart-mini-crt/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            dir: dir.into(),
            size,
        })
    }

    /// Create a cache in the default location, sized for `display`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn from_config(display: &DisplayConfig) -> Result<Self> {
        Self::new(artwork_cache_dir(), display.artwork_size())
    }

    /// Cache file for `url` at this cache's size
    #[must_use]
    pub fn path_for(&self, url: &str) -> PathBuf {
        let digest = Sha1::digest(url.as_bytes());
        self.dir.join(format!("{:x}-{}.png", digest, self.size))
    }

    /// Return the cached image for `url`, downloading and resizing it first if
    /// it is not on disk yet.
    ///
    /// `url` may also be a local path or a `file://` URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be fetched, decoded or written.
    pub async fn resolve(&self, url: &str) -> Result<PathBuf> {
        let path = self.path_for(url);
        if tokio::fs::try_exists(&path).await? {
            debug!("Artwork cache hit for {}", url);
            return Ok(path);
        }

        let bytes = self.fetch(url).await?;
        let size = self.size;
        let png = tokio::task::spawn_blocking(move || resize_to_png(&bytes, size)).await??;

        tokio::fs::create_dir_all(&self.dir).await?;
        // Readers never see a half-written file
        let partial = path.with_extension("part");
        tokio::fs::write(&partial, &png).await?;
        tokio::fs::rename(&partial, &path).await?;

        info!("New artwork saved at {}", path.display());
        Ok(path)
    }

    /// Resolve `url` and return the cached PNG as a `data:` URL for the webview.
    ///
    /// # Errors
    ///
    /// Same as [`ArtworkCache::resolve`], plus failure to read the cached file.
    pub async fn data_url(&self, url: &str) -> Result<String> {
        let path = self.resolve(url).await?;
        let png = tokio::fs::read(&path).await?;
        Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        if let Some(path) = local_path(url) {
            debug!("Opening local artwork: {}", path.display());
            return Ok(tokio::fs::read(&path).await?);
        }

        debug!("Downloading artwork from {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::ArtworkStatus {
                status: status.as_u16(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

fn local_path(url: &str) -> Option<PathBuf> {
    match Url::parse(url) {
        Ok(parsed) if parsed.scheme() == "file" => parsed.to_file_path().ok(),
        Ok(_) => None,
        Err(_) => {
            let path = PathBuf::from(url);
            path.is_absolute().then_some(path)
        }
    }
}

fn resize_to_png(bytes: &[u8], size: u32) -> Result<Vec<u8>> {
    let resized = image::load_from_memory(bytes)?
        .resize_exact(size, size, FilterType::Lanczos3)
        .to_rgba8();

    let mut buffer = Vec::new();
    PngEncoder::new(&mut buffer).write_image(
        resized.as_raw(),
        resized.width(),
        resized.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(buffer)
}
