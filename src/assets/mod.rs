//! Fetching scene documents.
//!
//! Requests run on short-lived worker threads and report back over a
//! channel; [`SceneLoader::poll`] hands finished loads to the owning thread.
//! Each request bumps a generation counter and only the newest request's
//! result is ever returned, so a slow response for a scene the user already
//! left cannot overwrite the current one.

use crate::scene::serialization::{self, SerializationError};
use crate::scene::{DocumentError, SceneDocument};
use std::io::Read;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to fetch {url}: {message}")]
    Transport { url: String, message: String },
    #[error("failed to load {url}: HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("failed to decode {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid scene document {url}: {source}")]
    Invalid {
        url: String,
        #[source]
        source: DocumentError,
    },
    #[error("failed to start fetch for {url}: {source}")]
    Spawn {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

/// Where scene documents come from.
pub trait SceneSource: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError>;
}

/// Reads documents from disk, relative to `root`.
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SceneSource for FileSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        let path = self.root.join(url);
        std::fs::read(&path).map_err(|source| LoadError::Read {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Blocking HTTP GET against `base_url`.
#[derive(Debug, Clone)]
pub struct HttpSource {
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            return url.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            url.trim_start_matches('/')
        )
    }
}

impl SceneSource for HttpSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        let full_url = self.resolve(url);
        match ureq::get(&full_url).call() {
            Ok(response) => {
                let mut bytes = Vec::new();
                response
                    .into_reader()
                    .read_to_end(&mut bytes)
                    .map_err(|source| LoadError::Read {
                        path: full_url.clone(),
                        source,
                    })?;
                Ok(bytes)
            }
            Err(ureq::Error::Status(status, _)) => Err(LoadError::Status {
                url: full_url,
                status,
            }),
            Err(ureq::Error::Transport(transport)) => Err(LoadError::Transport {
                url: full_url,
                message: transport.to_string(),
            }),
        }
    }
}

/// Picks [`HttpSource`] for URLs and [`FileSource`] for everything else.
pub fn source_for_root(data_root: &str) -> Arc<dyn SceneSource> {
    if data_root.starts_with("http://") || data_root.starts_with("https://") {
        Arc::new(HttpSource::new(data_root))
    } else {
        Arc::new(FileSource::new(data_root))
    }
}

/// Fetch, decode and validate one document.
pub fn load_document(source: &dyn SceneSource, url: &str) -> Result<SceneDocument, LoadError> {
    let bytes = source.fetch(url)?;
    serialization::parse_document(&bytes).map_err(|err| match err {
        SerializationError::Json(source) => LoadError::Decode {
            url: url.to_string(),
            source,
        },
        SerializationError::Invalid(source) => LoadError::Invalid {
            url: url.to_string(),
            source,
        },
        SerializationError::Io(source) => LoadError::Read {
            path: url.to_string(),
            source,
        },
    })
}

/// Result of the most recent request.
#[derive(Debug)]
pub struct LoadOutcome {
    pub url: String,
    pub result: Result<SceneDocument, LoadError>,
}

struct Completion {
    generation: u64,
    outcome: LoadOutcome,
}

pub struct SceneLoader {
    source: Arc<dyn SceneSource>,
    sender: Sender<Completion>,
    receiver: Receiver<Completion>,
    generation: u64,
    pending: Option<u64>,
}

impl SceneLoader {
    pub fn new(source: Arc<dyn SceneSource>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            source,
            sender,
            receiver,
            generation: 0,
            pending: None,
        }
    }

    /// Starts loading `url` in the background, superseding any earlier request.
    pub fn request(&mut self, url: &str) -> u64 {
        self.generation += 1;
        let generation = self.generation;
        self.pending = Some(generation);

        let source = Arc::clone(&self.source);
        let sender = self.sender.clone();
        let worker_url = url.to_string();
        let spawned = thread::Builder::new()
            .name(format!("scene-fetch-{generation}"))
            .spawn(move || {
                let result = load_document(source.as_ref(), &worker_url);
                // The loader may be gone by now; nothing left to report to.
                let _ = sender.send(Completion {
                    generation,
                    outcome: LoadOutcome {
                        url: worker_url,
                        result,
                    },
                });
            });

        if let Err(source) = spawned {
            let _ = self.sender.send(Completion {
                generation,
                outcome: LoadOutcome {
                    url: url.to_string(),
                    result: Err(LoadError::Spawn {
                        url: url.to_string(),
                        source,
                    }),
                },
            });
        }
        log::debug!("Requested scene document {} (generation {})", url, generation);
        generation
    }

    /// Forgets the in-flight request; its result will be discarded.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Non-blocking: returns the outcome of the current request once it lands.
    pub fn poll(&mut self) -> Option<LoadOutcome> {
        while let Ok(completion) = self.receiver.try_recv() {
            if let Some(outcome) = self.accept(completion) {
                return Some(outcome);
            }
        }
        None
    }

    /// Blocks up to `timeout` for the current request.
    pub fn wait(&mut self, timeout: Duration) -> Option<LoadOutcome> {
        let deadline = Instant::now() + timeout;
        while self.pending.is_some() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.receiver.recv_timeout(remaining) {
                Ok(completion) => {
                    if let Some(outcome) = self.accept(completion) {
                        return Some(outcome);
                    }
                }
                Err(_) => break,
            }
        }
        None
    }

    fn accept(&mut self, completion: Completion) -> Option<LoadOutcome> {
        if self.pending != Some(completion.generation) {
            log::debug!(
                "Discarding stale scene document {} (generation {})",
                completion.outcome.url,
                completion.generation
            );
            return None;
        }
        self.pending = None;
        Some(completion.outcome)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    pub(crate) const DOC_A: &str = r#"{"boundingBoxes": [
        {"id": "a1", "label": "sofa", "position": [0, 0, 0], "size": [1, 1, 1], "confidence": 0.9},
        {"id": "a2", "label": "lamp", "position": [3, 0, 0], "size": [1, 1, 1], "confidence": 0.4}
    ]}"#;
    pub(crate) const DOC_B: &str = r#"{"boundingBoxes": [
        {"id": "b1", "label": "desk", "position": [0, 0, -3], "size": [1, 1, 1], "confidence": 0.8}
    ]}"#;

    /// In-memory source; entries listed in `gates` block until released.
    #[derive(Default)]
    pub(crate) struct MemorySource {
        pub(crate) documents: HashMap<String, String>,
        pub(crate) gates: Mutex<HashMap<String, Receiver<()>>>,
    }

    impl MemorySource {
        pub(crate) fn with(documents: &[(&str, &str)]) -> Self {
            Self {
                documents: documents
                    .iter()
                    .map(|(url, body)| (url.to_string(), body.to_string()))
                    .collect(),
                gates: Mutex::new(HashMap::new()),
            }
        }

        pub(crate) fn gate(&self, url: &str) -> Sender<()> {
            let (release, gate) = mpsc::channel();
            self.gates.lock().unwrap().insert(url.to_string(), gate);
            release
        }
    }

    impl SceneSource for MemorySource {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError> {
            let gate = self.gates.lock().unwrap().remove(url);
            if let Some(gate) = gate {
                let _ = gate.recv();
            }
            self.documents
                .get(url)
                .map(|body| body.clone().into_bytes())
                .ok_or_else(|| LoadError::Status {
                    url: url.to_string(),
                    status: 404,
                })
        }
    }

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn loads_and_decodes() {
        let source = Arc::new(MemorySource::with(&[("a.json", DOC_A)]));
        let mut loader = SceneLoader::new(source);
        loader.request("a.json");
        let outcome = loader.wait(WAIT).unwrap();
        assert_eq!(outcome.url, "a.json");
        assert_eq!(outcome.result.unwrap().bounding_boxes.len(), 2);
        assert!(!loader.is_pending());
    }

    #[test]
    fn missing_document_reports_status() {
        let source = Arc::new(MemorySource::default());
        let mut loader = SceneLoader::new(source);
        loader.request("nope.json");
        let outcome = loader.wait(WAIT).unwrap();
        assert!(matches!(
            outcome.result,
            Err(LoadError::Status { status: 404, .. })
        ));
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        let source = Arc::new(MemorySource::with(&[("bad.json", "{not json")]));
        let mut loader = SceneLoader::new(source);
        loader.request("bad.json");
        let outcome = loader.wait(WAIT).unwrap();
        assert!(matches!(outcome.result, Err(LoadError::Decode { .. })));
    }

    #[test]
    fn newest_request_wins_even_if_older_lands_last() {
        let source = Arc::new(MemorySource::with(&[("a.json", DOC_A), ("b.json", DOC_B)]));
        let release_a = source.gate("a.json");
        let mut loader = SceneLoader::new(source);

        loader.request("a.json");
        loader.request("b.json");
        let outcome = loader.wait(WAIT).unwrap();
        assert_eq!(outcome.url, "b.json");

        release_a.send(()).unwrap();
        // Give the stale worker time to report, then make sure it is dropped.
        thread::sleep(Duration::from_millis(50));
        assert!(loader.poll().is_none());
    }

    #[test]
    fn cancelled_request_is_discarded() {
        let source = Arc::new(MemorySource::with(&[("a.json", DOC_A)]));
        let mut loader = SceneLoader::new(source);
        loader.request("a.json");
        loader.cancel();
        assert!(loader.wait(Duration::from_millis(200)).is_none());
        thread::sleep(Duration::from_millis(50));
        assert!(loader.poll().is_none());
    }

    #[test]
    fn file_source_reads_relative_paths() {
        let mut root = std::env::temp_dir();
        root.push(format!("bbox_inspect_root_{}", std::process::id()));
        std::fs::create_dir_all(root.join("box_data")).unwrap();
        std::fs::write(root.join("box_data/a.json"), DOC_A).unwrap();

        let source = FileSource::new(&root);
        let document = load_document(&source, "box_data/a.json").unwrap();
        assert_eq!(document.unique_labels(), vec!["lamp", "sofa"]);
        assert!(matches!(
            load_document(&source, "box_data/missing.json"),
            Err(LoadError::Read { .. })
        ));

        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn http_source_resolves_relative_urls() {
        let source = HttpSource::new("https://example.com/viewer/");
        assert_eq!(
            source.resolve("/assets/box_data/a.json"),
            "https://example.com/viewer/assets/box_data/a.json"
        );
        assert_eq!(source.resolve("http://other/x.json"), "http://other/x.json");
    }
}
