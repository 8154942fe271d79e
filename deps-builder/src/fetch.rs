//! Archive download and extraction
//!
//! ## Flow
//! ```text
//! [ArchiveSpec] → download (reqwest, no retry) → deps/<file_name>
//!               → extract (zip | tar.gz | tar.bz2) → deps/
//! ```
//! `Raw` archives (NuGet packages) are downloaded and left as they are.

use crate::catalog::ArchiveKind;
use crate::error::{BuildError, Result};
use async_trait::async_trait;
use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::info;

/// Fetches and unpacks dependency archives.
#[async_trait]
pub trait Acquire: Send + Sync {
    /// Download `url` to `dest`, overwriting any previous file.
    async fn download(&self, url: &str, dest: &Path) -> Result<()>;

    /// Unpack `archive` into `into`.
    async fn extract(&self, archive: &Path, kind: ArchiveKind, into: &Path) -> Result<()>;
}

/// HTTP downloads through a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpAcquirer {
    client: reqwest::Client,
}

impl HttpAcquirer {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("fm-deps/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| BuildError::Download {
                url: String::new(),
                source,
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Acquire for HttpAcquirer {
    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        info!("Downloading {} -> {}", url, dest.display());

        let wrap = |source: reqwest::Error| BuildError::Download {
            url: url.to_string(),
            source,
        };
        let mut resp = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(wrap)?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written: u64 = 0;
        while let Some(chunk) = resp.chunk().await.map_err(wrap)? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        info!("Downloaded {} ({} bytes)", dest.display(), written);
        Ok(())
    }

    async fn extract(&self, archive: &Path, kind: ArchiveKind, into: &Path) -> Result<()> {
        let archive = archive.to_path_buf();
        let into = into.to_path_buf();
        let label = archive.clone();
        tokio::task::spawn_blocking(move || extract_archive(&archive, kind, &into))
            .await
            .map_err(|e| BuildError::Extract {
                archive: label,
                message: e.to_string(),
            })?
    }
}

/// Synchronous extraction, selected by archive kind.
pub fn extract_archive(archive: &Path, kind: ArchiveKind, into: &Path) -> Result<()> {
    info!("extracting {}...", archive.display());

    let extract_err = |message: String| BuildError::Extract {
        archive: archive.to_path_buf(),
        message,
    };
    std::fs::create_dir_all(into)?;

    match kind {
        ArchiveKind::Zip => {
            let file = File::open(archive)?;
            let mut zip = zip::ZipArchive::new(BufReader::new(file))
                .map_err(|e| extract_err(e.to_string()))?;
            zip.extract(into).map_err(|e| extract_err(e.to_string()))?;
        }
        ArchiveKind::TarGz => {
            let file = File::open(archive)?;
            tar::Archive::new(GzDecoder::new(BufReader::new(file)))
                .unpack(into)
                .map_err(|e| extract_err(e.to_string()))?;
        }
        ArchiveKind::TarBz2 => {
            let file = File::open(archive)?;
            tar::Archive::new(BzDecoder::new(BufReader::new(file)))
                .unpack(into)
                .map_err(|e| extract_err(e.to_string()))?;
        }
        ArchiveKind::Raw => {}
    }
    Ok(())
}

/// Where a downloaded archive lands.
pub fn archive_path(deps_dir: &Path, file_name: &str) -> PathBuf {
    deps_dir.join(file_name)
}
