//! Stream local files to an object store with ordered progress reports.

mod bucket;

pub use bucket::*;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Upload chunk size in bytes.
pub const CHUNK_SIZE: usize = 256 * 1024;

/// Errors returned by an object store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("store rejected the request with status {0}")]
    Rejected(u16),
    #[error("store did not return an upload session")]
    NoSession,
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Everything that can break an upload.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A destination accepting chunked uploads.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Open an upload session for `key` expecting `total` bytes.
    async fn create(
        &self,
        key: &str,
        total: u64,
    ) -> Result<Box<dyn UploadSession>, StoreError>;
}

/// A single in-flight upload. Chunks arrive in file order.
#[async_trait]
pub trait UploadSession: Send {
    async fn append(&mut self, chunk: &[u8]) -> Result<(), StoreError>;

    /// Finish the upload and return the durable object URL.
    async fn complete(self: Box<Self>) -> Result<String, StoreError>;
}

/// Progress report for one upload.
#[derive(Debug)]
pub enum UploadEvent {
    /// Percentage of bytes transferred so far.
    Progress(u8),
    /// Upload finished. Holds the durable object URL.
    Complete(String),
    /// Upload failed. No further event follows.
    Failed(UploadError),
}

/// Stream local files to an [`ObjectStore`].
#[derive(Clone)]
pub struct Uploader {
    store: Arc<dyn ObjectStore>,
}

impl Uploader {
    /// Create a new [`Uploader`].
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Start uploading `path` in the background.
    pub fn upload(&self, path: impl Into<PathBuf>) -> UploadTask {
        let (events, receiver) = mpsc::channel(16);
        let store = Arc::clone(&self.store);
        let path = path.into();

        let handle = tokio::spawn(async move {
            if let Err(err) = run(store, &path, &events).await {
                let _ = events.send(UploadEvent::Failed(err)).await;
            }
        });

        UploadTask {
            events: receiver,
            handle,
        }
    }
}

/// Handle on a background upload. Dropping it abandons the transfer.
pub struct UploadTask {
    events: mpsc::Receiver<UploadEvent>,
    handle: JoinHandle<()>,
}

impl UploadTask {
    /// Next event, `None` once the upload is over.
    pub async fn next_event(&mut self) -> Option<UploadEvent> {
        self.events.recv().await
    }

    /// Abandon the transfer. No further event is emitted.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

impl Drop for UploadTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Build the object key for a local file: upload time in
/// milliseconds followed by the file name.
pub fn storage_key(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    format!("{}{}", chrono::Utc::now().timestamp_millis(), name)
}

async fn run(
    store: Arc<dyn ObjectStore>,
    path: &Path,
    events: &mpsc::Sender<UploadEvent>,
) -> Result<(), UploadError> {
    let mut file = File::open(path).await?;
    let total = file.metadata().await?.len();
    let mut session = store.create(&storage_key(path), total).await?;

    // An empty file has nothing to transfer but still lands in the store.
    if total == 0 {
        let _ = events.send(UploadEvent::Progress(100)).await;
        let url = session.complete().await?;
        let _ = events.send(UploadEvent::Complete(url)).await;
        return Ok(());
    }

    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut transferred: u64 = 0;

    loop {
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            break;
        }

        session.append(&buffer[..read]).await?;
        transferred += read as u64;
        let _ = events
            .send(UploadEvent::Progress(percent(transferred, total)))
            .await;
    }

    let url = session.complete().await?;
    let _ = events.send(UploadEvent::Complete(url)).await;

    Ok(())
}

fn percent(transferred: u64, total: u64) -> u8 {
    (((transferred as f64 / total as f64) * 100.0).round() as u64).min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::io::Write;
    use std::sync::Mutex;

    struct MemoryStore {
        objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
        fail_after: Option<usize>,
    }

    #[async_trait]
    impl ObjectStore for MemoryStore {
        async fn create(
            &self,
            key: &str,
            _total: u64,
        ) -> Result<Box<dyn UploadSession>, StoreError> {
            Ok(Box::new(MemorySession {
                objects: Arc::clone(&self.objects),
                key: key.to_owned(),
                buffer: Vec::new(),
                appended_chunks: 0,
                fail_after: self.fail_after,
            }))
        }
    }

    struct MemorySession {
        objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
        key: String,
        buffer: Vec<u8>,
        appended_chunks: usize,
        fail_after: Option<usize>,
    }

    #[async_trait]
    impl UploadSession for MemorySession {
        async fn append(&mut self, chunk: &[u8]) -> Result<(), StoreError> {
            if let Some(limit) = self.fail_after {
                if self.appended_chunks >= limit {
                    return Err(StoreError::Rejected(502));
                }
            }

            self.appended_chunks += 1;
            self.buffer.extend_from_slice(chunk);
            Ok(())
        }

        async fn complete(self: Box<Self>) -> Result<String, StoreError> {
            let MemorySession {
                objects,
                key,
                buffer,
                ..
            } = *self;

            let url = format!("https://bucket.test/{key}");
            objects.lock().unwrap().insert(key, buffer);
            Ok(url)
        }
    }

    /// Store whose sessions never answer, to exercise abortion.
    struct BlockedStore;

    #[async_trait]
    impl ObjectStore for BlockedStore {
        async fn create(
            &self,
            _key: &str,
            _total: u64,
        ) -> Result<Box<dyn UploadSession>, StoreError> {
            Ok(Box::new(BlockedSession))
        }
    }

    struct BlockedSession;

    #[async_trait]
    impl UploadSession for BlockedSession {
        async fn append(&mut self, _chunk: &[u8]) -> Result<(), StoreError> {
            std::future::pending::<()>().await;
            Ok(())
        }

        async fn complete(self: Box<Self>) -> Result<String, StoreError> {
            Ok(String::new())
        }
    }

    fn temp_file(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn test_progress_reaches_100_before_completion() {
        let objects = Arc::new(Mutex::new(HashMap::new()));
        let store = MemoryStore {
            objects: Arc::clone(&objects),
            fail_after: None,
        };
        let uploader = Uploader::new(Arc::new(store));

        // Two full chunks and a half one.
        let file = temp_file(&vec![7u8; CHUNK_SIZE * 2 + CHUNK_SIZE / 2]);
        let mut task = uploader.upload(file.path());

        let mut progress = Vec::new();
        let mut url = None;
        while let Some(event) = task.next_event().await {
            match event {
                UploadEvent::Progress(value) => progress.push(value),
                UploadEvent::Complete(object_url) => url = Some(object_url),
                UploadEvent::Failed(err) => panic!("upload failed: {err}"),
            }
        }

        assert_eq!(progress, vec![40, 80, 100]);
        assert!(
            url.expect("missing completion event")
                .starts_with("https://bucket.test/")
        );

        let objects = objects.lock().unwrap();
        let stored = objects.values().next().expect("missing stored object");
        assert_eq!(stored.len(), CHUNK_SIZE * 2 + CHUNK_SIZE / 2);
    }

    #[tokio::test]
    async fn test_empty_file_completes_at_100() {
        let objects = Arc::new(Mutex::new(HashMap::new()));
        let store = MemoryStore {
            objects: Arc::clone(&objects),
            fail_after: None,
        };
        let uploader = Uploader::new(Arc::new(store));

        let file = temp_file(&[]);
        let mut task = uploader.upload(file.path());

        let mut progress = Vec::new();
        let mut url = None;
        while let Some(event) = task.next_event().await {
            match event {
                UploadEvent::Progress(value) => progress.push(value),
                UploadEvent::Complete(object_url) => url = Some(object_url),
                UploadEvent::Failed(err) => panic!("upload failed: {err}"),
            }
        }

        assert_eq!(progress, vec![100]);
        assert!(url.is_some());
    }

    #[tokio::test]
    async fn test_failed_chunk_abandons_the_transfer() {
        let objects = Arc::new(Mutex::new(HashMap::new()));
        let store = MemoryStore {
            objects: Arc::clone(&objects),
            fail_after: Some(1),
        };
        let uploader = Uploader::new(Arc::new(store));

        let file = temp_file(&vec![7u8; CHUNK_SIZE * 2 + CHUNK_SIZE / 2]);
        let mut task = uploader.upload(file.path());

        let mut progress = Vec::new();
        let mut failure = None;
        while let Some(event) = task.next_event().await {
            match event {
                UploadEvent::Progress(value) => progress.push(value),
                UploadEvent::Complete(_) => panic!("upload must not complete"),
                UploadEvent::Failed(err) => failure = Some(err),
            }
        }

        assert_eq!(progress, vec![40]);
        assert!(matches!(
            failure,
            Some(UploadError::Store(StoreError::Rejected(502)))
        ));
        assert!(objects.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_fails() {
        let uploader = Uploader::new(Arc::new(MemoryStore {
            objects: Arc::new(Mutex::new(HashMap::new())),
            fail_after: None,
        }));

        let mut task = uploader.upload("/missing/dish.png");

        let Some(UploadEvent::Failed(err)) = task.next_event().await else {
            panic!("expected a failure event");
        };
        assert!(matches!(err, UploadError::Io(_)));
        assert!(task.next_event().await.is_none());
    }

    #[tokio::test]
    async fn test_abort_stops_events() {
        let uploader = Uploader::new(Arc::new(BlockedStore));
        let file = temp_file(&[7u8; 16]);

        let mut task = uploader.upload(file.path());
        task.abort();

        assert!(task.next_event().await.is_none());
    }

    #[test]
    fn test_storage_key_shape() {
        let key = storage_key(Path::new("/tmp/menu/margherita.png"));

        assert!(key.ends_with("margherita.png"));
        let millis = &key[..key.len() - "margherita.png".len()];
        assert!(millis.len() >= 13);
        assert!(millis.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_percent_rounds() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(3, 3), 100);
    }
}
