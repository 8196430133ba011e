use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::quiz::Corpus;

/// A cached corpus is kept for this long before the next load re-reads the
/// file, so content edits show up without restarting the bot.
pub const CORPUS_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Error)]
pub enum CorpusLoadError {
    #[error("failed to read corpus file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("corpus file {path} is malformed: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("corpus '{subject}' failed validation: {reason}")]
    Invalid { subject: String, reason: String },
}

struct CacheEntry {
    corpus: Arc<Corpus>,
    loaded_at: Instant,
}

/// Loads `<dir>/<SUBJECT>.json` files and keeps them cached per subject.
/// Shared across all chats; entries are immutable once loaded. Two chats
/// racing past an expired entry both reload, the later insert wins.
pub struct CorpusStore {
    dir: PathBuf,
    ttl: Duration,
    cache: Mutex<HashMap<String, CacheEntry>>,
}

impl CorpusStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_ttl(dir, CORPUS_TTL)
    }

    pub fn with_ttl(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the corpus for `subject`, reading it from disk if it is not
    /// cached yet or the cached copy has expired. All-or-nothing: an invalid
    /// file never replaces a cached corpus and never reaches rendering.
    pub fn load(&self, subject: &str) -> Result<Arc<Corpus>, CorpusLoadError> {
        {
            let cache = self.cache.lock().expect("corpus cache poisoned");
            if let Some(entry) = cache.get(subject) {
                if entry.loaded_at.elapsed() < self.ttl {
                    return Ok(entry.corpus.clone());
                }
            }
        }

        let corpus = Arc::new(self.read_corpus(subject)?);

        let mut cache = self.cache.lock().expect("corpus cache poisoned");
        cache.insert(
            subject.to_string(),
            CacheEntry {
                corpus: corpus.clone(),
                loaded_at: Instant::now(),
            },
        );
        return Ok(corpus);
    }

    fn read_corpus(&self, subject: &str) -> Result<Corpus, CorpusLoadError> {
        let path = self.dir.join(format!("{}.json", subject));
        log::debug!("loading corpus '{}' from {}", subject, path.display());

        let file = File::open(&path).map_err(|source| CorpusLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let corpus: Corpus =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| {
                CorpusLoadError::Malformed {
                    path: path.display().to_string(),
                    source,
                }
            })?;
        corpus.validate().map_err(|reason| CorpusLoadError::Invalid {
            subject: subject.to_string(),
            reason,
        })?;
        return Ok(corpus);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::test_fixtures::rivers_corpus;

    fn write_corpus(dir: &std::path::Path, subject: &str, corpus: &Corpus) {
        let json = serde_json::to_string(corpus).unwrap();
        std::fs::write(dir.join(format!("{}.json", subject)), json).unwrap();
    }

    #[test]
    fn loads_a_well_formed_corpus() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path(), "RIVERS", &rivers_corpus());

        let store = CorpusStore::new(dir.path());
        let corpus = store.load("RIVERS").unwrap();
        assert_eq!(corpus.chunks.len(), 1);
        assert_eq!(corpus.chunks[0].title, "Rivers");
        assert_eq!(corpus.chunks[0].questions[0].answers.len(), 4);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = CorpusStore::new(dir.path());
        match store.load("NOPE") {
            Err(CorpusLoadError::Io { path, .. }) => assert!(path.contains("NOPE.json")),
            other => panic!("expected Io error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn garbage_json_is_a_malformed_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("BAD.json"), "{not json").unwrap();
        let store = CorpusStore::new(dir.path());
        assert!(matches!(
            store.load("BAD"),
            Err(CorpusLoadError::Malformed { .. })
        ));
    }

    #[test]
    fn structural_violations_are_rejected_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut corpus = rivers_corpus();
        corpus.chunks[0].questions[0].answers.pop();
        write_corpus(dir.path(), "SHORT", &corpus);

        let store = CorpusStore::new(dir.path());
        match store.load("SHORT") {
            Err(CorpusLoadError::Invalid { subject, reason }) => {
                assert_eq!(subject, "SHORT");
                assert!(reason.contains("expected 4 answers"));
            }
            other => panic!("expected Invalid error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn cache_hit_returns_the_same_corpus() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path(), "RIVERS", &rivers_corpus());

        let store = CorpusStore::new(dir.path());
        let first = store.load("RIVERS").unwrap();
        let second = store.load("RIVERS").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn expired_entry_is_reloaded_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path(), "RIVERS", &rivers_corpus());

        let store = CorpusStore::with_ttl(dir.path(), Duration::ZERO);
        let first = store.load("RIVERS").unwrap();

        let mut edited = rivers_corpus();
        edited.chunks[0].title = "Great Rivers".to_string();
        write_corpus(dir.path(), "RIVERS", &edited);

        let second = store.load("RIVERS").unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.chunks[0].title, "Great Rivers");
    }

    #[test]
    fn invalid_reload_does_not_produce_a_partial_corpus() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path(), "RIVERS", &rivers_corpus());

        let store = CorpusStore::with_ttl(dir.path(), Duration::ZERO);
        store.load("RIVERS").unwrap();

        std::fs::write(dir.path().join("RIVERS.json"), "[]").unwrap();
        assert!(store.load("RIVERS").is_err());
    }
}
