use thiserror::Error;

/// Rendering the page or its snapshot failed before the server started.
#[derive(Debug, Error)]
#[error("failed to render dashboard: {message}")]
pub struct AppError {
    pub message: String,
}

impl AppError {
    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(err)
    }
}

/// Why a request against the statistics API produced no usable body.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} returned {status}: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("response from {url} is not valid JSON: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    pub fn from_transport(url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { url: url.to_string() }
        } else {
            Self::Transport {
                url: url.to_string(),
                source,
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("failed to read boundary file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse boundary file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: geojson::Error,
    },

    #[error("boundary file {path} is not a FeatureCollection")]
    NotFeatureCollection { path: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SmoothingError {
    #[error("window length must be odd, got {0}")]
    EvenWindow(usize),

    #[error("polynomial order {order} must be less than window length {window}")]
    OrderTooHigh { order: usize, window: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}
