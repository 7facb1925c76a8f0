use std::path::PathBuf;

pub(crate) type DatasetResult<T> = Result<T, DatasetError>;

macro_rules! bail {
    ($($arg:tt)*) => {{
        return Err(DatasetError::Other(format!($($arg)*)));
    }};
}

pub(crate) use bail;

#[derive(Debug, thiserror::Error)]
pub(crate) enum DatasetError {
    #[error(
        "dataset directory not found: {} (expected a directory \
            containing *.jsonl files)",
        path.display()
    )]
    DirectoryNotFound { path: PathBuf },

    #[error("malformed record in {}, line {line}: {reason}", path.display())]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(
        "dataset is empty: no records found in {} (expected at least \
            one non-empty *.jsonl file)",
        path.display()
    )]
    EmptyDataset { path: PathBuf },

    #[error("hub request failed with status {status}: {body}")]
    Hub { status: u16, body: String },

    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    Fmt(#[from] std::fmt::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Polars(#[from] polars::error::PolarsError),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),

    #[error("{0}")]
    Other(String),
}

impl DatasetError {
    #[inline]
    pub(crate) fn other<T: ToString>(s: T) -> Self {
        Self::Other(s.to_string())
    }

    #[inline]
    pub(crate) fn config<T: ToString>(s: T) -> Self {
        Self::Configuration(s.to_string())
    }
}
