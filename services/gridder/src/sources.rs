//! Granule sources: the LAADS archive (listing + S3) or a local directory tree.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{Duration, Utc};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use aerosol_common::ProcessingDay;
use storage::ObjectStorage;

use crate::archive::ArchiveClient;
use crate::credentials::{CredentialClient, EarthdataLogin, S3Credentials};

/// Raw granule contents handed to the reader.
#[derive(Debug, Clone)]
pub enum GranuleData {
    Bytes(Bytes),
    File(PathBuf),
}

/// Trait for sources that can list and fetch daily granules.
#[async_trait]
pub trait GranuleSource: Send + Sync {
    /// Granule names for a collection on one day, sorted and unique.
    async fn list_granules(&self, collection: &str, day: ProcessingDay) -> Result<Vec<String>>;

    /// Fetch one granule by name.
    async fn fetch_granule(
        &self,
        collection: &str,
        day: ProcessingDay,
        name: &str,
    ) -> Result<GranuleData>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// Refresh credentials this long before they lapse.
const REFRESH_MARGIN_MINUTES: i64 = 5;

struct Session {
    storage: Arc<ObjectStorage>,
    credentials: Option<S3Credentials>,
}

impl Session {
    fn needs_refresh(&self) -> bool {
        self.credentials.as_ref().is_some_and(|c| {
            c.expires_within(Utc::now(), Duration::minutes(REFRESH_MARGIN_MINUTES))
        })
    }
}

struct Refresher {
    client: CredentialClient,
    login: EarthdataLogin,
}

impl Refresher {
    async fn open_session(&self) -> Result<Session> {
        let credentials = self.client.fetch(&self.login).await?;
        let storage = ObjectStorage::new(&credentials.storage_config())
            .context("Failed to create S3 client")?;

        Ok(Session {
            storage: Arc::new(storage),
            credentials: Some(credentials),
        })
    }
}

/// Lists granules from the archive pages and reads them from `prod-lads`.
pub struct ArchiveSource {
    archive: ArchiveClient,
    session: RwLock<Session>,
    refresher: Option<Refresher>,
}

impl ArchiveSource {
    /// Use a fixed storage client; credentials are never refreshed.
    pub fn new(archive: ArchiveClient, storage: ObjectStorage) -> Self {
        Self {
            archive,
            session: RwLock::new(Session {
                storage: Arc::new(storage),
                credentials: None,
            }),
            refresher: None,
        }
    }

    /// Obtain temporary S3 credentials and renew them as they expire.
    pub async fn connect(
        archive: ArchiveClient,
        credentials: CredentialClient,
        login: EarthdataLogin,
    ) -> Result<Self> {
        let refresher = Refresher {
            client: credentials,
            login,
        };
        let session = refresher
            .open_session()
            .await
            .context("Failed to obtain archive credentials")?;

        Ok(Self {
            archive,
            session: RwLock::new(session),
            refresher: Some(refresher),
        })
    }

    async fn storage(&self) -> Result<Arc<ObjectStorage>> {
        {
            let session = self.session.read().await;
            if self.refresher.is_none() || !session.needs_refresh() {
                return Ok(Arc::clone(&session.storage));
            }
        }

        let mut session = self.session.write().await;
        if session.needs_refresh() {
            if let Some(refresher) = &self.refresher {
                info!("Refreshing S3 credentials");
                *session = refresher.open_session().await?;
            }
        }
        Ok(Arc::clone(&session.storage))
    }
}

#[async_trait]
impl GranuleSource for ArchiveSource {
    async fn list_granules(&self, collection: &str, day: ProcessingDay) -> Result<Vec<String>> {
        self.archive.list_granules(collection, day).await
    }

    #[instrument(skip(self), fields(collection = %collection))]
    async fn fetch_granule(
        &self,
        collection: &str,
        _day: ProcessingDay,
        name: &str,
    ) -> Result<GranuleData> {
        let storage = self.storage().await?;
        let path = format!("{}/{}", collection, name);
        let bytes = storage
            .get(&path)
            .await
            .with_context(|| format!("Failed to fetch s3://{}/{}", storage.bucket(), path))?;

        Ok(GranuleData::Bytes(bytes))
    }

    fn describe(&self) -> String {
        "LAADS archive".to_string()
    }
}

/// Reads granules from `{root}/{collection}/{year}/{doy}/*.nc`.
pub struct LocalSource {
    root: PathBuf,
}

impl LocalSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn day_dir(&self, collection: &str, day: ProcessingDay) -> PathBuf {
        self.root
            .join(collection)
            .join(day.year().to_string())
            .join(format!("{:03}", day.day_of_year()))
    }
}

fn scan_day_dir(dir: &Path) -> Vec<String> {
    let files: BTreeSet<String> = walkdir::WalkDir::new(dir)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .filter(|name| name.ends_with(".nc"))
        .collect();

    files.into_iter().collect()
}

#[async_trait]
impl GranuleSource for LocalSource {
    async fn list_granules(&self, collection: &str, day: ProcessingDay) -> Result<Vec<String>> {
        let dir = self.day_dir(collection, day);
        if !dir.is_dir() {
            debug!(dir = %dir.display(), "No local granule directory");
            return Ok(Vec::new());
        }

        let files = tokio::task::spawn_blocking(move || scan_day_dir(&dir))
            .await
            .context("Directory scan task failed")?;

        info!(collection = %collection, day = %day, count = files.len(), "Listed local granules");
        Ok(files)
    }

    async fn fetch_granule(
        &self,
        collection: &str,
        day: ProcessingDay,
        name: &str,
    ) -> Result<GranuleData> {
        let path = self.day_dir(collection, day).join(name);
        if !path.is_file() {
            bail!("Granule not found: {}", path.display());
        }
        Ok(GranuleData::File(path))
    }

    fn describe(&self) -> String {
        format!("local directory {}", self.root.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::{memory::InMemory, path::Path as ObjectPath, ObjectStore};

    async fn seeded_storage(files: &[&str]) -> ObjectStorage {
        let store = InMemory::new();
        for file in files {
            store
                .put(&ObjectPath::from(*file), Bytes::from_static(b"CDF").into())
                .await
                .unwrap();
        }
        ObjectStorage::from_store(Arc::new(store), "prod-lads")
    }

    fn day() -> ProcessingDay {
        ProcessingDay::parse("2024001").unwrap()
    }

    #[tokio::test]
    async fn test_local_source_lists_sorted_nc_files() {
        let dir = tempfile::tempdir().unwrap();
        let source = LocalSource::new(dir.path());
        let day_dir = source.day_dir("AERDB_L2_VIIRS_SNPP", day());
        std::fs::create_dir_all(day_dir.join("nested")).unwrap();
        for name in ["b.nc", "a.nc", "notes.txt", "nested/c.nc"] {
            std::fs::write(day_dir.join(name), b"x").unwrap();
        }

        let files = source.list_granules("AERDB_L2_VIIRS_SNPP", day()).await.unwrap();
        assert_eq!(files, vec!["a.nc", "b.nc"]);

        let data = source
            .fetch_granule("AERDB_L2_VIIRS_SNPP", day(), "a.nc")
            .await
            .unwrap();
        assert!(matches!(data, GranuleData::File(p) if p.ends_with("2024/001/a.nc")));
        assert!(source
            .fetch_granule("AERDB_L2_VIIRS_SNPP", day(), "zzz.nc")
            .await
            .is_err());
    }

    #[test]
    fn test_local_source_missing_day_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let source = LocalSource::new(dir.path());
        let files =
            tokio_test::block_on(source.list_granules("AERDT_L2_VIIRS_SNPP", day())).unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn test_archive_source_reads_collection_path() {
        let storage = seeded_storage(&["AERDB_L2_VIIRS_SNPP/g1.nc"]).await;
        let archive = ArchiveClient::new("https://example.test").unwrap();
        let source = ArchiveSource::new(archive, storage);

        let data = source
            .fetch_granule("AERDB_L2_VIIRS_SNPP", day(), "g1.nc")
            .await
            .unwrap();
        assert!(matches!(data, GranuleData::Bytes(b) if &b[..] == b"CDF"));
        assert!(source
            .fetch_granule("AERDT_L2_VIIRS_SNPP", day(), "g1.nc")
            .await
            .is_err());
    }
}
