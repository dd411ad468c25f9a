use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModgetError {
    #[error("No mods found for {0:?}. Check for spelling errors or wrong version.")]
    NoSearchResults(String),
    #[error("No mod manifest at {0:?}")]
    MissingManifest(PathBuf),
    #[error(transparent)]
    IoError(#[from] io::Error),
    #[error("{0}")]
    MiscError(String),
    #[error("Error downloading {url}: {source}")]
    DownloadError {
        url: String,
        #[source]
        source: Box<ModgetError>,
    },
    #[error("Error resolving dependencies of {file}: {source}")]
    DepError {
        file: String,
        #[source]
        source: Box<ModgetError>,
    },
    #[error("Error requesting data from CurseForge: {0}")]
    RequestError(#[from] ureq::Error),
    #[error("Error parsing JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ModgetError {
    /// Tag an underlying failure with the URL the download was for
    pub fn download(url: impl Into<String>, source: ModgetError) -> Self {
        Self::DownloadError {
            url: url.into(),
            source: Box::new(source),
        }
    }

    /// Tag an underlying failure with the file whose dependencies were being resolved
    pub fn dep(file: impl Into<String>, source: ModgetError) -> Self {
        Self::DepError {
            file: file.into(),
            source: Box::new(source),
        }
    }
}
