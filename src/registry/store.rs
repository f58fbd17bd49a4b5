//! CSV-backed registry store.
//!
//! Every mutation runs as one transaction under a writer lock: read the whole
//! file, change an in-memory copy, rewrite the whole file through a temp file
//! and rename. `add` is the exception and appends a single row, so rows the
//! reader cannot parse survive until [`RegistryStore::repair`] runs. A file
//! whose header cannot be recognised is never rewritten by the other
//! mutations either; they fail with [`DeckError::Corrupt`] instead.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{normalize_endpoint, Mutation, Prober, Record, Status, HEADER};
use crate::config::RegistryConfig;
use crate::error::{DeckError, Result};

/// Seed record written when the store is first created.
const DEFAULT_SEED_NAME: &str = "homepage";
const DEFAULT_SEED_URL: &str = "https://torinwolff.com";

/// Durable ordered collection of [`Record`]s.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use async_trait::async_trait;
/// use opsdeck::registry::{Prober, RegistryStore, Status};
///
/// struct AlwaysUp;
///
/// #[async_trait]
/// impl Prober for AlwaysUp {
///     async fn probe(&self, _endpoint: &str) -> bool {
///         true
///     }
/// }
///
/// # tokio_test::block_on(async {
/// let dir = tempfile::tempdir().unwrap();
/// let store = RegistryStore::new(dir.path().join("websites.csv"), Arc::new(AlwaysUp));
/// let record = store.add("docs", "https://docs.example.com/").await.unwrap();
/// assert_eq!(record.endpoint, "https://docs.example.com");
/// assert_eq!(record.status, Status::Active);
/// // Seed record plus the one just added.
/// assert_eq!(store.list().await.unwrap().len(), 2);
/// # });
/// ```
pub struct RegistryStore {
    path: PathBuf,
    seed: Record,
    prober: Arc<dyn Prober>,
    lock: Mutex<()>,
}

impl RegistryStore {
    /// Create a store at `path` with the default seed record.
    pub fn new(path: impl Into<PathBuf>, prober: Arc<dyn Prober>) -> Self {
        Self {
            path: path.into(),
            seed: Record::new(DEFAULT_SEED_NAME, DEFAULT_SEED_URL, Status::Active),
            prober,
            lock: Mutex::new(()),
        }
    }

    /// Create a store from the `registry` config section.
    pub fn from_config(config: &RegistryConfig, prober: Arc<dyn Prober>) -> Self {
        Self::new(config.path(), prober).with_seed(&config.seed_name, &config.seed_url)
    }

    /// Replace the record written when the store is first created.
    pub fn with_seed(mut self, name: &str, endpoint: &str) -> Self {
        self.seed = Record::new(name, endpoint, Status::Active);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// Read every well-formed record, creating the seeded store first if the
    /// file does not exist.
    pub async fn list(&self) -> Result<Vec<Record>> {
        let _guard = self.lock.lock().await;
        self.ensure_exists()?;
        Ok(self.load())
    }

    /// Read every well-formed record without creating the store.
    ///
    /// Read failures are logged and yield an empty collection.
    pub fn load(&self) -> Vec<Record> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let records = parse_records(&content).unwrap_or_default();
                debug!(path = %self.path.display(), count = records.len(), "Loaded registry");
                records
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Registry file does not exist");
                Vec::new()
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read registry");
                Vec::new()
            }
        }
    }

    /// Canonical name of the first record whose name equals `id` ignoring case.
    pub fn find_by_name_ci(&self, id: &str) -> Option<String> {
        let wanted = id.to_lowercase();
        self.load()
            .into_iter()
            .find(|r| r.name.to_lowercase() == wanted)
            .map(|r| r.name)
    }

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    /// Probe `endpoint` and append a new record.
    ///
    /// Name and endpoint are trimmed and the endpoint normalised before
    /// storage. Duplicates are allowed.
    pub async fn add(&self, name: &str, endpoint: &str) -> Result<Record> {
        let name = required("name", name)?;
        let endpoint = normalize_endpoint(required("url", endpoint)?).to_string();

        let _guard = self.lock.lock().await;
        self.ensure_exists()?;

        let status = Status::from_reachable(self.prober.probe(&endpoint).await);
        let record = Record::new(name, endpoint, status);
        self.append(&record)?;
        info!(name = %record.name, endpoint = %record.endpoint, status = %record.status, "Added endpoint");

        let stored = self
            .load()
            .into_iter()
            .find(|r| r.name == record.name && r.endpoint == record.endpoint);
        match stored {
            Some(stored) => Ok(stored),
            None => {
                warn!(name = %record.name, "Added endpoint not found on re-read");
                Ok(record)
            }
        }
    }

    /// Re-probe the first record matching `(name, endpoint)`.
    pub async fn update_status(&self, name: &str, endpoint: &str) -> Result<Mutation> {
        let _guard = self.lock.lock().await;
        self.ensure_exists()?;
        let mut records = self.read_for_rewrite()?;

        let Some(record) = records.iter_mut().find(|r| r.matches(name, endpoint)) else {
            debug!(name = %name, endpoint = %endpoint, "No endpoint to update");
            return Ok(Mutation::NotFound(records));
        };

        let previous = record.status;
        // Probe the caller's form of the endpoint.
        record.status = Status::from_reachable(self.prober.probe(endpoint).await);
        info!(
            name = %name,
            endpoint = %endpoint,
            from = %previous,
            to = %record.status,
            "Updated endpoint status"
        );

        self.write_all(&records)?;
        Ok(Mutation::Applied(records))
    }

    /// Remove every record matching `(name, endpoint)`.
    pub async fn delete(&self, name: &str, endpoint: &str) -> Result<Mutation> {
        let _guard = self.lock.lock().await;
        self.ensure_exists()?;
        let mut records = self.read_for_rewrite()?;

        let before = records.len();
        records.retain(|r| !r.matches(name, endpoint));
        let removed = before - records.len();
        if removed == 0 {
            debug!(name = %name, endpoint = %endpoint, "No endpoint to delete");
            return Ok(Mutation::NotFound(records));
        }

        self.write_all(&records)?;
        info!(name = %name, endpoint = %endpoint, removed, "Deleted endpoint");
        Ok(Mutation::Applied(records))
    }

    /// Rename and re-point the first record matching `(old_name, old_endpoint)`,
    /// then re-probe it.
    pub async fn edit(
        &self,
        old_name: &str,
        old_endpoint: &str,
        new_name: &str,
        new_endpoint: &str,
    ) -> Result<Mutation> {
        let new_name = required("name", new_name)?;
        let new_endpoint = normalize_endpoint(required("url", new_endpoint)?).to_string();

        let _guard = self.lock.lock().await;
        self.ensure_exists()?;
        let mut records = self.read_for_rewrite()?;

        let Some(record) = records
            .iter_mut()
            .find(|r| r.matches(old_name, old_endpoint))
        else {
            debug!(name = %old_name, endpoint = %old_endpoint, "No endpoint to edit");
            return Ok(Mutation::NotFound(records));
        };

        record.status = Status::from_reachable(self.prober.probe(&new_endpoint).await);
        record.name = new_name.to_string();
        record.endpoint = new_endpoint;
        info!(
            from = %old_name,
            to = %record.name,
            endpoint = %record.endpoint,
            status = %record.status,
            "Edited endpoint"
        );

        self.write_all(&records)?;
        Ok(Mutation::Applied(records))
    }

    /// Re-probe every record and rewrite all statuses in one transaction.
    pub async fn refresh_all(&self) -> Result<Vec<Record>> {
        let _guard = self.lock.lock().await;
        self.ensure_exists()?;
        let mut records = self.read_for_rewrite()?;

        let mut changed = 0usize;
        for record in records.iter_mut() {
            let status = Status::from_reachable(self.prober.probe(&record.endpoint).await);
            if status != record.status {
                info!(name = %record.name, from = %record.status, to = %status, "Endpoint status changed");
                changed += 1;
            }
            record.status = status;
        }

        self.write_all(&records)?;
        debug!(count = records.len(), changed, "Refreshed endpoint statuses");
        Ok(records)
    }

    /// Best-effort rebuild of a corrupted registry file.
    ///
    /// Every non-blank, non-header line with at least three comma-separated
    /// fields becomes a record: first field is the name, last the status, and
    /// the fields between are re-joined with commas as the endpoint. Lines
    /// that do not yield three non-empty values are dropped. One layer of CSV
    /// quoting is removed from each value, so repairing a file this store
    /// wrote leaves it unchanged. Invalid UTF-8 is replaced rather than
    /// rejected. An endpoint containing commas is only recovered when the
    /// status column is intact.
    ///
    /// Returns the number of recovered records. When nothing is recovered the
    /// store is left empty (header only) rather than re-seeded. A missing file
    /// is a no-op.
    pub async fn repair(&self) -> Result<usize> {
        let _guard = self.lock.lock().await;
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let records = recover_records(&String::from_utf8_lossy(&bytes));
        self.write_all(&records)?;
        info!(path = %self.path.display(), count = records.len(), "Repaired registry");
        Ok(records.len())
    }

    // ------------------------------------------------------------------------
    // File plumbing
    // ------------------------------------------------------------------------

    /// Create the parent directory and a seeded file if the store is absent.
    fn ensure_exists(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.write_all(std::slice::from_ref(&self.seed))?;
        crate::log_component!(info, "registry", "Created registry", seed = self.seed.name.as_str());
        Ok(())
    }

    /// Read the records a rewrite starts from.
    ///
    /// Unlike [`load`](Self::load), content without a recognisable header or
    /// with invalid UTF-8 is an error, so the rewrite cannot replace rows that
    /// [`repair`](Self::repair) could still recover.
    fn read_for_rewrite(&self) -> Result<Vec<Record>> {
        let bytes = std::fs::read(&self.path)?;
        let content = String::from_utf8(bytes).map_err(|_| {
            DeckError::Corrupt(format!("{} is not valid UTF-8", self.path.display()))
        })?;
        parse_records(&content).ok_or_else(|| {
            crate::log_component!(warn, "registry", "Refusing to rewrite unreadable registry");
            DeckError::Corrupt(format!("{} has no usable header", self.path.display()))
        })
    }

    /// Atomically replace the file with a header plus `records`.
    ///
    /// An existing file keeps its permissions. A new one is created with the
    /// usual `0o666` less umask rather than the temp file's owner-only mode.
    fn write_all(&self, records: &[Record]) -> Result<()> {
        let bytes = encode_rows(true, records)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut builder = tempfile::Builder::new();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(std::fs::Permissions::from_mode(0o666));
        }
        let mut tmp = builder.tempfile_in(&dir)?;
        if let Ok(meta) = std::fs::metadata(&self.path) {
            tmp.as_file().set_permissions(meta.permissions())?;
        }
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| DeckError::Io(e.error))?;
        Ok(())
    }

    /// Append one row, first terminating a final line that lacks a newline.
    ///
    /// A blank file has no header to append to and is rewritten instead.
    fn append(&self, record: &Record) -> Result<()> {
        let existing = std::fs::read(&self.path)?;
        if existing.iter().all(u8::is_ascii_whitespace) {
            return self.write_all(std::slice::from_ref(record));
        }
        let mut file = std::fs::OpenOptions::new().append(true).open(&self.path)?;
        if !existing.is_empty() && !existing.ends_with(b"\n") {
            file.write_all(b"\n")?;
        }
        file.write_all(&encode_rows(false, std::slice::from_ref(record))?)?;
        file.sync_all()?;
        Ok(())
    }
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DeckError::Validation(format!("{} cannot be empty", field)));
    }
    Ok(value)
}

/// Encode records as `\n`-terminated CSV rows, optionally preceded by the header.
fn encode_rows(header: bool, records: &[Record]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    if header {
        writer.write_record(HEADER)?;
    }
    for record in records {
        writer.write_record([
            record.name.as_str(),
            record.endpoint.as_str(),
            record.status.as_str(),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| DeckError::Io(e.into_error()))
}

/// Parse file content into records, skipping rows without all three fields.
///
/// Columns are located by header name, so reordered headers still parse.
/// Returns `None` when non-blank content has no usable header.
fn parse_records(content: &str) -> Option<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let columns = match reader.headers() {
        Ok(headers) => {
            let position = |name: &str| headers.iter().position(|h| h == name);
            match (position(HEADER[0]), position(HEADER[1]), position(HEADER[2])) {
                (Some(n), Some(u), Some(s)) => Some((n, u, s)),
                _ => None,
            }
        }
        Err(e) => {
            warn!(error = %e, "Unreadable registry header");
            None
        }
    };
    let Some((name_col, url_col, status_col)) = columns else {
        if content.trim().is_empty() {
            return Some(Vec::new());
        }
        warn!("Registry header is missing a required column");
        return None;
    };

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!(row = index + 1, error = %e, "Skipping unreadable row");
                continue;
            }
        };
        let field = |col: usize| row.get(col).filter(|v| !v.is_empty());
        match (field(name_col), field(url_col), field(status_col)) {
            (Some(name), Some(url), Some(status)) => {
                if Status::parse(status).is_none() {
                    debug!(name = %name, status = %status, "Unknown status read as inactive");
                }
                records.push(Record::new(name, url, Status::normalize(status)));
            }
            _ => warn!(row = index + 1, fields = ?row, "Skipping malformed row"),
        }
    }
    Some(records)
}

/// Line-based first/last-field recovery used by [`RegistryStore::repair`].
fn recover_records(content: &str) -> Vec<Record> {
    let header = HEADER.join(",");
    let normalized = content.replace("\r\n", "\n").replace('\r', "\n");

    normalized
        .split('\n')
        .filter(|line| !line.trim().is_empty() && !line.contains(&header))
        .filter_map(|line| {
            let parts: Vec<&str> = line.split(',').collect();
            if parts.len() < 3 {
                return None;
            }
            let name = unquote(parts[0]);
            let status = unquote(parts[parts.len() - 1]);
            let joined = unquote(&parts[1..parts.len() - 1].join(","));
            let endpoint = normalize_endpoint(&joined);
            if name.is_empty() || endpoint.is_empty() || status.is_empty() {
                return None;
            }
            Some(Record::new(name, endpoint, Status::normalize(&status)))
        })
        .collect()
}

/// Trim a recovered value and strip one layer of CSV quoting.
fn unquote(value: &str) -> String {
    let value = value.trim();
    match value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
    {
        Some(inner) => inner.replace("\"\"", "\"").trim().to_string(),
        None => value.to_string(),
    }
}
