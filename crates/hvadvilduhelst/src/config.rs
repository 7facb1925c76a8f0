use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;
use semver::Version;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::DatasetResult;
use crate::loader::ValidationPolicy;
use crate::quality::Thresholds;
use crate::utils::{config_dir, resolve};

/// Project config (`hvadvilduhelst.toml`).
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct Config {
    /// The path of the config. Unset, if the config wasn't loaded
    /// from a file.
    #[serde(skip)]
    path: Option<PathBuf>,

    /// Dataset metadata.
    #[serde(default)]
    pub(crate) metadata: Metadata,

    /// Location and validation of the category files.
    #[serde(default)]
    pub(crate) data: DataConfig,

    /// Quality thresholds.
    #[serde(default)]
    pub(crate) quality: Thresholds,

    /// Hub (re-)publishing options.
    #[serde(default)]
    pub(crate) hub: HubConfig,

    /// Runtime options.
    pub(crate) runtime: Option<Runtime>,

    /// This structure should always be constructed using a public
    /// constructor or using the update syntax:
    ///
    /// ```ignore
    /// use crate::config::Config;
    ///
    /// let config = Config {
    ///     ..Default::default()
    /// };
    /// ```
    #[doc(hidden)]
    #[serde(skip)]
    __non_exhaustive: (),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Metadata {
    /// The name of the dataset.
    pub(crate) name: String,

    /// The version of the dataset.
    pub(crate) version: Version,

    /// A short blurb about the dataset.
    pub(crate) description: Option<String>,

    /// A list of people or organizations, which are considered as the
    /// authors of the dataset.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) authors: Vec<String>,

    /// The license identifier of the dataset (e.g. `cc-by-4.0`).
    pub(crate) license: Option<String>,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            name: "hvadvilduhelst".into(),
            version: Version::new(0, 1, 0),
            description: None,
            authors: vec![],
            license: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub(crate) struct DataConfig {
    /// Candidate directories, which are tried in order. Relative paths
    /// are resolved against the directory of the config file.
    pub(crate) paths: Vec<PathBuf>,

    /// What to do with malformed lines.
    pub(crate) policy: ValidationPolicy,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            paths: vec!["data/hygdk".into(), "../data/hygdk".into()],
            policy: ValidationPolicy::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub(crate) struct HubConfig {
    /// Base URL of the hub.
    pub(crate) endpoint: Url,

    /// The dataset repository (`namespace/name`). The environment
    /// variable `HUGGINGFACE_REPO_ID` takes precedence.
    pub(crate) repo_id: Option<String>,

    /// The split label of the uploaded records.
    pub(crate) split: String,

    /// The branch to commit to.
    pub(crate) revision: String,

    /// Whether a newly created repository is private.
    pub(crate) private: bool,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            endpoint: Url::parse("https://huggingface.co")
                .expect("valid url"),
            repo_id: None,
            split: "train".into(),
            revision: "main".into(),
            private: false,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct Runtime {
    /// Number of threads to use. If this options isn't set or a value
    /// of "0" is chosen, the maximum number of available threads
    /// is used.
    pub(crate) num_jobs: Option<usize>,
}

impl Config {
    pub(crate) const FILENAME: &'static str = "hvadvilduhelst.toml";

    /// Creates a new default config and sets the file location.
    pub(crate) fn create<P>(path: P) -> DatasetResult<Self>
    where
        P: AsRef<Path>,
    {
        Ok(Self {
            path: Some(path.as_ref().into()),
            ..Default::default()
        })
    }

    /// Loads an existing config from a path.
    pub(crate) fn from_path<P>(path: P) -> DatasetResult<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref().to_path_buf();
        let content = fs::read_to_string(&path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.path = Some(path);

        Ok(config)
    }

    /// Discovers the config of the current project.
    ///
    /// The current directory and all its parents are searched for a
    /// `hvadvilduhelst.toml`. If there is none, the user config
    /// (`config.toml` in the user's config directory) is used, and
    /// otherwise the built-in defaults.
    pub(crate) fn discover() -> DatasetResult<Self> {
        let mut dir = env::current_dir()?;

        loop {
            let path = dir.join(Self::FILENAME);
            if path.is_file() {
                debug!("using config {}", path.display());
                return Self::from_path(path);
            }

            if !dir.pop() {
                break;
            }
        }

        let user_config = config_dir().map(|dir| dir.join("config.toml"));
        if let Some(path) = user_config {
            if path.is_file() {
                debug!("using user config {}", path.display());
                return Self::from_path(path);
            }
        }

        debug!("no config found, using defaults");
        Ok(Self::default())
    }

    /// Returns the path of the config file, if any.
    #[inline]
    pub(crate) fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the directory relative paths are resolved against: the
    /// directory of the config file or the current directory.
    pub(crate) fn base_dir(&self) -> PathBuf {
        self.path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Returns the resolved candidate directories of the dataset.
    pub(crate) fn data_candidates(&self) -> Vec<PathBuf> {
        let base_dir = self.base_dir();
        self.data
            .paths
            .iter()
            .map(|path| resolve(path, &base_dir))
            .collect()
    }

    /// Saves the config. If the config wasn't loaded from a file, it's
    /// written to `hvadvilduhelst.toml` in the current directory.
    pub(crate) fn save(&self) -> DatasetResult<()> {
        let path = self
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from(Self::FILENAME));

        let content = toml::to_string(self)?;
        let mut out = File::create(path)?;
        out.write_all(content.as_bytes())?;
        Ok(())
    }
}
