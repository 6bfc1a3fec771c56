// src/error.rs
use std::fmt;

use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure categories, kept distinct so a run can be diagnosed from its logs
/// even though the user only sees one generic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    Acquisition,
    DataFormat,
    Render,
    Geocoding,
    InvalidInput,
    Io,
    /// The job worker died or shut down before answering.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Acquisition => "acquisition",
            ErrorKind::DataFormat => "data-format",
            ErrorKind::Render => "render",
            ErrorKind::Geocoding => "geocoding",
            ErrorKind::InvalidInput => "invalid-input",
            ErrorKind::Io => "io",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum GeocodingError {
    #[error("place naming service timed out")]
    Timeout,
    #[error("place naming service error: {0}")]
    Service(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("acquisition failed: {0}")]
    Acquisition(String),

    #[error("unexpected product layout: {0}")]
    DataFormat(String),

    #[error("render failed: {0}")]
    Render(String),

    #[error(transparent)]
    Geocoding(#[from] GeocodingError),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Gdal(#[from] gdal::errors::GdalError),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Pdf(#[from] printpdf::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("job worker failed: {0}")]
    Worker(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Acquisition(_) | Error::Http(_) => ErrorKind::Acquisition,
            Error::DataFormat(_) | Error::Gdal(_) => ErrorKind::DataFormat,
            Error::Render(_) | Error::Image(_) | Error::Pdf(_) => ErrorKind::Render,
            Error::Geocoding(_) => ErrorKind::Geocoding,
            Error::InvalidInput(_) | Error::Json(_) => ErrorKind::InvalidInput,
            Error::Io(_) => ErrorKind::Io,
            Error::Worker(_) => ErrorKind::Internal,
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    pub fn data_format(msg: impl Into<String>) -> Self {
        Error::DataFormat(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Error::Render(msg.into())
    }
}
