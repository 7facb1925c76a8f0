//! Publishing a dataset to a hosted dataset repository (Hugging Face
//! Hub).
//!
//! An upload consists of two requests: the dataset repository is
//! created (an existing repository is accepted) and then the records
//! and a generated dataset card are committed in a single commit.

use std::fmt::{self, Display, Write};
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::{debug, info};
use reqwest::{Client, Response, StatusCode};
use serde_json::json;
use url::Url;

use crate::config::Metadata;
use crate::dataset::Dataset;
use crate::error::{DatasetError, DatasetResult};

pub(crate) const TOKEN_VAR: &str = "HUGGINGFACE_TOKEN";
pub(crate) const REPO_ID_VAR: &str = "HUGGINGFACE_REPO_ID";

const USER_AGENT: &str =
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// The identifier of a dataset repository (`namespace/name`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RepoId {
    namespace: Option<String>,
    name: String,
}

impl RepoId {
    #[inline]
    pub(crate) fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    #[inline]
    pub(crate) fn name(&self) -> &str {
        &self.name
    }
}

fn is_valid_part(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with(['-', '.'])
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_.".contains(c))
}

impl FromStr for RepoId {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (namespace, name) = match s.split_once('/') {
            Some((namespace, name)) => (Some(namespace), name),
            None => (None, s),
        };

        if !is_valid_part(name)
            || !namespace.map(is_valid_part).unwrap_or(true)
        {
            return Err(DatasetError::config(format!(
                "invalid repository id '{s}' (expected \
                    'namespace/name' or 'name')"
            )));
        }

        Ok(Self {
            namespace: namespace.map(ToString::to_string),
            name: name.to_string(),
        })
    }
}

impl Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.namespace {
            Some(ref namespace) => write!(f, "{namespace}/{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Access token and target repository of an upload.
#[derive(Clone)]
pub(crate) struct Credentials {
    token: String,
    repo_id: RepoId,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"***")
            .field("repo_id", &self.repo_id)
            .finish()
    }
}

impl Credentials {
    /// Validates that both the token and the repository id are present
    /// (and not blank). No network access takes place.
    pub(crate) fn resolve(
        token: Option<String>,
        repo_id: Option<String>,
    ) -> DatasetResult<Self> {
        let present = |value: Option<String>| {
            value.filter(|value| !value.trim().is_empty())
        };

        let token = present(token).ok_or_else(|| {
            DatasetError::config(format!(
                "{TOKEN_VAR} is not set (expected a hub access token)"
            ))
        })?;

        let repo_id = present(repo_id)
            .ok_or_else(|| {
                DatasetError::config(format!(
                    "{REPO_ID_VAR} is not set (expected a repository \
                        id like 'namespace/name')"
                ))
            })?
            .parse::<RepoId>()?;

        Ok(Self { token, repo_id })
    }

    #[inline]
    pub(crate) fn repo_id(&self) -> &RepoId {
        &self.repo_id
    }
}

/// Returns the path of the data file of a split in the repository.
#[inline]
pub(crate) fn data_path(split: &str) -> String {
    format!("data/{split}.jsonl")
}

fn size_category(n: usize) -> &'static str {
    match n {
        0..=999 => "n<1K",
        1_000..=9_999 => "1K<n<10K",
        10_000..=99_999 => "10K<n<100K",
        100_000..=999_999 => "100K<n<1M",
        _ => "1M<n<10M",
    }
}

/// Generates the dataset card (`README.md`).
pub(crate) fn dataset_card(
    dataset: &Dataset,
    metadata: &Metadata,
    split: &str,
) -> DatasetResult<String> {
    let mut card = String::new();
    let name = serde_json::to_string(&metadata.name)?;

    // The front matter is YAML; JSON strings are valid YAML scalars.
    writeln!(card, "---")?;
    writeln!(card, "pretty_name: {name}")?;
    writeln!(card, "language:\n- da")?;
    if let Some(ref license) = metadata.license {
        writeln!(card, "license: {}", serde_json::to_string(license)?)?;
    }
    writeln!(
        card,
        "size_categories:\n- {}",
        size_category(dataset.len())
    )?;
    writeln!(card, "configs:\n- config_name: default")?;
    writeln!(card, "  data_files:")?;
    writeln!(card, "  - split: {split}")?;
    writeln!(card, "    path: {}", data_path(split))?;
    writeln!(card, "---\n")?;

    writeln!(card, "# {}\n", metadata.name)?;
    if let Some(ref description) = metadata.description {
        writeln!(card, "{description}\n")?;
    }

    writeln!(
        card,
        "Danish binary-preference questions (\"hvad vil du helst\"). \
            Each record has the fields `question`, `answer_A`, \
            `answer_B` and `category`.\n"
    )?;

    writeln!(card, "## Categories\n")?;
    writeln!(card, "| category | questions |")?;
    writeln!(card, "|----------|-----------|")?;
    for (category, records) in dataset.by_category() {
        writeln!(card, "| {category} | {} |", records.len())?;
    }

    writeln!(card, "\nTotal: {} questions.\n", dataset.len())?;
    writeln!(card, "Version: {}", metadata.version)?;
    if !metadata.authors.is_empty() {
        let authors = metadata.authors.join(", ");
        writeln!(card, "\nAuthors: {authors}")?;
    }

    Ok(card)
}

/// The files of an upload.
#[derive(Debug)]
pub(crate) struct Payload {
    summary: String,
    files: Vec<(String, Vec<u8>)>,
}

impl Payload {
    pub(crate) fn new(
        dataset: &Dataset,
        metadata: &Metadata,
        split: &str,
    ) -> DatasetResult<Self> {
        if !is_valid_part(split) {
            return Err(DatasetError::config(format!(
                "invalid split label '{split}'"
            )));
        }

        let card = dataset_card(dataset, metadata, split)?;

        Ok(Self {
            summary: format!(
                "Upload {} questions ({split}, version {})",
                dataset.len(),
                metadata.version
            ),
            files: vec![
                (data_path(split), dataset.to_jsonl()?),
                ("README.md".into(), card.into_bytes()),
            ],
        })
    }

    #[inline]
    pub(crate) fn summary(&self) -> &str {
        &self.summary
    }

    /// Returns the paths and sizes (in bytes) of the files.
    pub(crate) fn files(&self) -> impl Iterator<Item = (&str, usize)> {
        self.files
            .iter()
            .map(|(path, content)| (path.as_str(), content.len()))
    }

    /// Returns the total size of all files in bytes.
    pub(crate) fn size(&self) -> usize {
        self.files.iter().map(|(_, content)| content.len()).sum()
    }

    /// Returns the body of a commit request: a header entry followed
    /// by one entry per file, one JSON object per line.
    pub(crate) fn to_ndjson(&self) -> DatasetResult<Vec<u8>> {
        let mut lines = vec![json!({
            "key": "header",
            "value": {
                "summary": self.summary,
                "description": "",
            }
        })];

        for (path, content) in self.files.iter() {
            lines.push(json!({
                "key": "file",
                "value": {
                    "content": STANDARD.encode(content),
                    "path": path,
                    "encoding": "base64",
                }
            }));
        }

        let mut body = Vec::new();
        for line in lines.iter() {
            serde_json::to_writer(&mut body, line)?;
            body.push(b'\n');
        }

        Ok(body)
    }
}

/// A minimal client for the hub's repository and commit API.
#[derive(Debug)]
pub(crate) struct HubClient {
    client: Client,
    endpoint: Url,
    credentials: Credentials,
}

impl HubClient {
    pub(crate) fn new(
        endpoint: Url,
        credentials: Credentials,
    ) -> DatasetResult<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Self::with_client(client, endpoint, credentials)
    }

    /// Creates a hub client on top of an existing HTTP client.
    pub(crate) fn with_client(
        client: Client,
        endpoint: Url,
        credentials: Credentials,
    ) -> DatasetResult<Self> {
        let scheme = endpoint.scheme();
        if scheme != "https" && scheme != "http" {
            return Err(DatasetError::config(format!(
                "unsupported hub endpoint scheme {scheme}"
            )));
        }

        Ok(Self {
            client,
            endpoint,
            credentials,
        })
    }

    /// Appends the segments to the path of the endpoint. Each segment
    /// is percent-encoded, and a path prefix of the endpoint (e.g. of a
    /// mirror behind a reverse proxy) is kept.
    fn url<'a, I>(&self, segments: I) -> DatasetResult<Url>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| {
                DatasetError::config(format!(
                    "invalid hub endpoint {}",
                    self.endpoint
                ))
            })?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    pub(crate) fn create_url(&self) -> DatasetResult<Url> {
        self.url(["api", "repos", "create"])
    }

    pub(crate) fn commit_url(&self, revision: &str) -> DatasetResult<Url> {
        let repo_id = &self.credentials.repo_id;
        let mut segments = vec!["api", "datasets"];
        segments.extend(repo_id.namespace());
        segments.extend([repo_id.name(), "commit", revision]);
        self.url(segments)
    }

    /// Creates the dataset repository. Returns `false`, if the
    /// repository already exists.
    pub(crate) async fn create_repo(
        &self,
        private: bool,
    ) -> DatasetResult<bool> {
        let repo_id = &self.credentials.repo_id;
        let response = self
            .client
            .post(self.create_url()?)
            .bearer_auth(&self.credentials.token)
            .json(&json!({
                "type": "dataset",
                "name": repo_id.name(),
                "organization": repo_id.namespace(),
                "private": private,
            }))
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            debug!("repository {repo_id} already exists");
            return Ok(false);
        }

        check(response).await?;
        info!("created dataset repository {repo_id}");
        Ok(true)
    }

    /// Commits the payload to `revision`. Returns the URL of the
    /// commit, if the hub reports one.
    pub(crate) async fn commit(
        &self,
        payload: &Payload,
        revision: &str,
    ) -> DatasetResult<Option<String>> {
        let response = self
            .client
            .post(self.commit_url(revision)?)
            .bearer_auth(&self.credentials.token)
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(payload.to_ndjson()?)
            .send()
            .await?;

        let response = check(response).await?;
        let body: serde_json::Value = response.json().await?;

        Ok(body
            .get("commitUrl")
            .and_then(|url| url.as_str())
            .map(ToString::to_string))
    }
}

/// Turns a non-success response into [DatasetError::Hub].
async fn check(response: Response) -> DatasetResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(DatasetError::Hub {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use base64::Engine as _;

    use super::*;
    use crate::record::QuestionRecord;

    type TestResult = anyhow::Result<()>;

    fn dataset() -> Dataset {
        let record = |question: &str, category: &str| QuestionRecord {
            question: question.into(),
            answer_a: "Varm mad".into(),
            answer_b: "Kold mad".into(),
            category: category.into(),
        };

        Dataset::new(
            "data",
            vec![
                record("Varm eller kold mad?", "mad"),
                record("Chef eller ansat?", "arbejde"),
                record("Kaffe eller te?", "mad"),
            ],
            vec![],
        )
    }

    #[test]
    fn repo_id_from_str() -> TestResult {
        let repo_id: RepoId = "kasperjunge/hvadvilduhelst".parse()?;
        assert_eq!(repo_id.namespace(), Some("kasperjunge"));
        assert_eq!(repo_id.name(), "hvadvilduhelst");
        assert_eq!(repo_id.to_string(), "kasperjunge/hvadvilduhelst");

        let repo_id: RepoId = "hygdk".parse()?;
        assert_eq!(repo_id.namespace(), None);
        assert_eq!(repo_id.to_string(), "hygdk");
        Ok(())
    }

    #[test]
    fn repo_id_invalid() {
        for s in ["", "/", "a/", "/b", "a/b/c", "a b", "-a/b", "a/.b"] {
            assert!(
                matches!(
                    s.parse::<RepoId>(),
                    Err(DatasetError::Configuration(_))
                ),
                "{s}"
            );
        }
    }

    #[test]
    fn credentials_resolve() -> TestResult {
        let credentials = Credentials::resolve(
            Some("hf_secret".into()),
            Some("foo/bar".into()),
        )?;

        assert_eq!(credentials.repo_id().to_string(), "foo/bar");
        assert!(!format!("{credentials:?}").contains("hf_secret"));
        Ok(())
    }

    #[test]
    fn credentials_missing() {
        let err = Credentials::resolve(None, Some("foo/bar".into()))
            .unwrap_err();
        assert!(matches!(err, DatasetError::Configuration(_)));
        assert!(err.to_string().contains(TOKEN_VAR));

        let err = Credentials::resolve(Some("hf".into()), Some("  ".into()))
            .unwrap_err();
        assert!(err.to_string().contains(REPO_ID_VAR));
    }

    #[test]
    fn dataset_card_ok() -> TestResult {
        let metadata = Metadata {
            license: Some("cc-by-4.0".into()),
            authors: vec!["Jane Doe".into()],
            ..Default::default()
        };

        let card = dataset_card(&dataset(), &metadata, "train")?;
        assert!(card
            .starts_with("---\npretty_name: \"hvadvilduhelst\"\n"));
        assert!(card.contains("license: \"cc-by-4.0\"\n"));
        assert!(card.contains("- n<1K\n"));
        assert!(card.contains(
            "  - split: train\n    path: data/train.jsonl\n"
        ));
        assert!(card.contains("| arbejde | 1 |\n| mad | 2 |\n"));
        assert!(card.contains("Authors: Jane Doe"));
        Ok(())
    }

    #[test]
    fn payload_to_ndjson() -> TestResult {
        let payload =
            Payload::new(&dataset(), &Metadata::default(), "test")?;
        let files: Vec<_> = payload.files().map(|(p, _)| p).collect();
        assert_eq!(files, vec!["data/test.jsonl", "README.md"]);
        assert!(payload.summary().contains("3 questions"));

        let body = String::from_utf8(payload.to_ndjson()?)?;
        let lines = body
            .lines()
            .map(serde_json::from_str)
            .collect::<Result<Vec<serde_json::Value>, _>>()?;

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["key"], "header");
        assert_eq!(lines[1]["value"]["path"], "data/test.jsonl");
        assert_eq!(lines[1]["value"]["encoding"], "base64");

        let content = STANDARD
            .decode(lines[1]["value"]["content"].as_str().unwrap())?;
        let content = String::from_utf8(content)?;
        assert_eq!(content.lines().count(), 3);
        assert!(content.starts_with(
            r#"{"question":"Varm eller kold mad?","answer_A":"Varm mad""#
        ));

        assert_eq!(
            payload.size(),
            payload.files().map(|(_, size)| size).sum::<usize>()
        );
        Ok(())
    }

    #[test]
    fn payload_invalid_split() {
        let result =
            Payload::new(&dataset(), &Metadata::default(), "../train");
        assert!(matches!(result, Err(DatasetError::Configuration(_))));
    }

    fn client(endpoint: &str) -> anyhow::Result<HubClient> {
        let credentials =
            Credentials::resolve(Some("hf".into()), Some("foo/bar".into()))?;
        let http = Client::builder().no_proxy().build()?;
        Ok(HubClient::with_client(http, Url::parse(endpoint)?, credentials)?)
    }

    #[test]
    fn client_urls() -> TestResult {
        let client = client("https://huggingface.co")?;
        assert_eq!(
            client.create_url()?.as_str(),
            "https://huggingface.co/api/repos/create"
        );
        assert_eq!(
            client.commit_url("main")?.as_str(),
            "https://huggingface.co/api/datasets/foo/bar/commit/main"
        );
        Ok(())
    }

    #[test]
    fn client_urls_keep_endpoint_prefix() -> TestResult {
        for endpoint in ["https://mirror.local/hf", "https://mirror.local/hf/"]
        {
            let client = client(endpoint)?;
            assert_eq!(
                client.create_url()?.as_str(),
                "https://mirror.local/hf/api/repos/create"
            );
        }

        Ok(())
    }

    #[test]
    fn client_urls_encode_revision() -> TestResult {
        let client = client("https://huggingface.co")?;
        assert_eq!(
            client.commit_url("refs/pr/1")?.as_str(),
            "https://huggingface.co/api/datasets/foo/bar/commit/refs%2Fpr%2F1"
        );
        Ok(())
    }

    /// Serves a single request with a canned response and returns the
    /// raw request (head and body).
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> anyhow::Result<(String, tokio::task::JoinHandle<String>)> {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let endpoint = format!("http://{}/", listener.local_addr()?);

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];

            loop {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }

                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(pos) = text.find("\r\n\r\n") {
                    let len = text[..pos]
                        .lines()
                        .find_map(|line| {
                            let (key, value) = line.split_once(':')?;
                            key.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);

                    if request.len() >= pos + 4 + len {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );

            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).to_string()
        });

        Ok((endpoint, handle))
    }

    #[tokio::test]
    async fn create_repo_accepts_conflict() -> TestResult {
        let (endpoint, handle) =
            serve_once("409 Conflict", r#"{"error":"exists"}"#).await?;

        let created = client(&endpoint)?.create_repo(false).await?;
        assert!(!created);

        let request = handle.await?;
        assert!(request.starts_with("POST /api/repos/create "));
        assert!(request.to_lowercase().contains("authorization: bearer hf"));
        assert!(request.contains(r#""name":"bar""#));
        assert!(request.contains(r#""organization":"foo""#));
        Ok(())
    }

    #[tokio::test]
    async fn create_repo_created() -> TestResult {
        let (endpoint, handle) =
            serve_once("200 OK", r#"{"url":"https://hf.co/foo/bar"}"#)
                .await?;

        assert!(client(&endpoint)?.create_repo(true).await?);
        assert!(handle.await?.contains(r#""private":true"#));
        Ok(())
    }

    #[tokio::test]
    async fn create_repo_error_is_verbatim() -> TestResult {
        let (endpoint, handle) =
            serve_once("500 Internal Server Error", "boom").await?;

        let result = client(&endpoint)?.create_repo(false).await;
        assert!(matches!(
            result,
            Err(DatasetError::Hub { status: 500, ref body }) if body == "boom"
        ));

        handle.await?;
        Ok(())
    }

    #[tokio::test]
    async fn commit_returns_commit_url() -> TestResult {
        let (endpoint, handle) = serve_once(
            "200 OK",
            r#"{"commitUrl":"https://hf.co/datasets/foo/bar/commit/abc"}"#,
        )
        .await?;

        let payload =
            Payload::new(&dataset(), &Metadata::default(), "train")?;
        let url = client(&endpoint)?.commit(&payload, "main").await?;
        assert_eq!(
            url.as_deref(),
            Some("https://hf.co/datasets/foo/bar/commit/abc")
        );

        let request = handle.await?;
        assert!(
            request.starts_with("POST /api/datasets/foo/bar/commit/main ")
        );
        assert!(request.contains("application/x-ndjson"));
        assert!(request.contains(r#""path":"data/train.jsonl""#));
        Ok(())
    }

    #[tokio::test]
    async fn commit_error_is_verbatim() -> TestResult {
        let (endpoint, handle) =
            serve_once("403 Forbidden", r#"{"error":"no access"}"#).await?;

        let payload =
            Payload::new(&dataset(), &Metadata::default(), "train")?;
        let result = client(&endpoint)?.commit(&payload, "main").await;
        assert!(matches!(
            result,
            Err(DatasetError::Hub { status: 403, ref body })
                if body == r#"{"error":"no access"}"#
        ));

        handle.await?;
        Ok(())
    }

    #[test]
    fn client_rejects_scheme() -> TestResult {
        let credentials =
            Credentials::resolve(Some("hf".into()), Some("foo/bar".into()))?;
        let result =
            HubClient::new(Url::parse("ftp://example.org")?, credentials);

        assert!(matches!(result, Err(DatasetError::Configuration(_))));
        Ok(())
    }
}
