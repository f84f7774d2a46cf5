//! Persisted index artifacts.
//!
//! The corpus table, the feature matrix and the optional similarity matrix
//! are written as separate CBOR files. Each carries the snapshot id of the
//! corpus it was built from, and loading refuses any combination whose ids
//! or row counts disagree.

pub mod fetch;

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use rayon::prelude::*;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::{
    cleaner,
    engine::matrix::SimilarityMatrix,
    error::{RecommendError, Result},
    ingest::RawSong,
    vectorizer::FeatureMatrix,
};

/// One cleaned corpus row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub artist: String,
    pub song: String,
    pub cleaned_text: String,
}

/// Ordered, immutable corpus table. Row order is the index shared with the
/// feature and similarity matrices.
#[derive(Debug, Clone)]
pub struct CorpusTable {
    entries: Vec<CorpusEntry>,
    lower_titles: Vec<String>,
    snapshot: String,
}

impl CorpusTable {
    pub fn new(entries: Vec<CorpusEntry>) -> Self {
        let snapshot = snapshot_id(&entries);
        let lower_titles = entries.iter().map(|e| e.song.to_lowercase()).collect();
        Self { entries, lower_titles, snapshot }
    }

    /// Clean every raw song, keeping input order
    pub fn from_raw(raw: &[RawSong]) -> Self {
        let entries: Vec<CorpusEntry> = raw
            .par_iter()
            .map(|s| CorpusEntry {
                artist: s.artist.clone(),
                song: s.song.clone(),
                cleaned_text: cleaner::clean(&s.text),
            })
            .collect();
        info!(rows = entries.len(), "lyrics cleaned");
        Self::new(entries)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&CorpusEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    /// Hex SHA-256 over all rows, in order
    pub fn snapshot(&self) -> &str {
        &self.snapshot
    }

    pub fn cleaned_texts(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.cleaned_text.as_str()).collect()
    }

    /// First row whose title equals `title` ignoring case
    pub fn find_title(&self, title: &str) -> Option<usize> {
        let wanted = title.to_lowercase();
        self.lower_titles.iter().position(|t| *t == wanted)
    }
}

fn snapshot_id(entries: &[CorpusEntry]) -> String {
    let mut hasher = Sha256::new();
    for e in entries {
        for field in [&e.artist, &e.song, &e.cleaned_text] {
            hasher.update((field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Identifies one of the persisted files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactId {
    Corpus,
    Features,
    Similarity,
}

impl ArtifactId {
    pub const ALL: [ArtifactId; 3] = [ArtifactId::Corpus, ArtifactId::Features, ArtifactId::Similarity];

    pub fn name(self) -> &'static str {
        match self {
            ArtifactId::Corpus => "corpus",
            ArtifactId::Features => "features",
            ArtifactId::Similarity => "similarity",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            ArtifactId::Corpus => "corpus.cbor",
            ArtifactId::Features => "features.cbor",
            ArtifactId::Similarity => "similarity.cbor",
        }
    }
}

/// On-disk envelope
#[derive(Serialize, Deserialize)]
struct Artifact<T> {
    snapshot: String,
    rows: usize,
    payload: T,
}

/// Reads and writes the artifacts of one index directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, id: ArtifactId) -> PathBuf {
        self.dir.join(id.file_name())
    }

    pub fn exists(&self, id: ArtifactId) -> bool {
        self.path(id).is_file()
    }

    /// Write corpus and features, and the similarity matrix when given.
    /// A stale similarity file from an earlier build is removed.
    pub fn save(
        &self,
        corpus: &CorpusTable,
        features: &FeatureMatrix,
        similarity: Option<&SimilarityMatrix>,
    ) -> Result<()> {
        if features.row_count() != corpus.len() {
            return Err(RecommendError::Misaligned {
                what: "feature matrix",
                corpus_rows: corpus.len(),
                other_rows: features.row_count(),
            });
        }
        std::fs::create_dir_all(&self.dir).map_err(|e| RecommendError::io(&self.dir, e))?;
        self.write(ArtifactId::Corpus, corpus, corpus.entries())?;
        self.write(ArtifactId::Features, corpus, features)?;
        match similarity {
            Some(matrix) => self.write(ArtifactId::Similarity, corpus, matrix)?,
            None => {
                let path = self.path(ArtifactId::Similarity);
                if path.exists() {
                    std::fs::remove_file(&path).map_err(|e| RecommendError::io(&path, e))?;
                }
            }
        }
        info!(dir = %self.dir.display(), snapshot = corpus.snapshot(), "artifacts saved");
        Ok(())
    }

    pub fn load_corpus(&self) -> Result<CorpusTable> {
        let artifact: Artifact<Vec<CorpusEntry>> = self.read(ArtifactId::Corpus)?;
        let table = CorpusTable::new(artifact.payload);
        if table.snapshot() != artifact.snapshot {
            return Err(RecommendError::Corrupt {
                what: "corpus",
                reason: "content does not match its recorded snapshot id".to_string(),
            });
        }
        debug!(rows = table.len(), "corpus table loaded");
        Ok(table)
    }

    pub fn load_features(&self, corpus: &CorpusTable) -> Result<FeatureMatrix> {
        let artifact: Artifact<FeatureMatrix> = self.read(ArtifactId::Features)?;
        let features = check_aligned(artifact, corpus, "feature matrix", |m| m.row_count())?;
        features
            .validate()
            .map_err(|reason| RecommendError::Corrupt { what: "features", reason })?;
        debug!(rows = features.row_count(), features = features.n_features(), "feature matrix loaded");
        Ok(features)
    }

    /// `Ok(None)` when no similarity matrix was persisted
    pub fn load_similarity(&self, corpus: &CorpusTable) -> Result<Option<SimilarityMatrix>> {
        if !self.exists(ArtifactId::Similarity) {
            return Ok(None);
        }
        let artifact: Artifact<SimilarityMatrix> = self.read(ArtifactId::Similarity)?;
        let matrix = check_aligned(artifact, corpus, "similarity matrix", |m| m.size())?;
        matrix
            .validate()
            .map_err(|reason| RecommendError::Corrupt { what: "similarity", reason })?;
        Ok(Some(matrix))
    }

    fn write<T: Serialize + ?Sized>(&self, id: ArtifactId, corpus: &CorpusTable, payload: &T) -> Result<()> {
        let path = self.path(id);
        let artifact = Artifact {
            snapshot: corpus.snapshot().to_string(),
            rows: corpus.len(),
            payload,
        };
        let tmp = tempfile::NamedTempFile::new_in(&self.dir).map_err(|e| RecommendError::io(&self.dir, e))?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_cbor::to_writer(&mut writer, &artifact).map_err(|e| RecommendError::cbor(&path, e))?;
            writer.flush().map_err(|e| RecommendError::io(&path, e))?;
        }
        tmp.persist(&path).map_err(|e| RecommendError::io(&path, e.error))?;
        debug!(artifact = id.name(), path = %path.display(), "artifact written");
        Ok(())
    }

    fn read<T: DeserializeOwned>(&self, id: ArtifactId) -> Result<Artifact<T>> {
        let path = self.path(id);
        let file = File::open(&path).map_err(|e| RecommendError::io(&path, e))?;
        serde_cbor::from_reader(BufReader::new(file)).map_err(|e| RecommendError::cbor(&path, e))
    }
}

fn check_aligned<T>(
    artifact: Artifact<T>,
    corpus: &CorpusTable,
    what: &'static str,
    rows_of: impl Fn(&T) -> usize,
) -> Result<T> {
    if artifact.snapshot != corpus.snapshot() {
        return Err(RecommendError::SnapshotMismatch {
            what,
            expected: corpus.snapshot().to_string(),
            found: artifact.snapshot,
        });
    }
    let rows = rows_of(&artifact.payload);
    if rows != corpus.len() || artifact.rows != corpus.len() {
        return Err(RecommendError::Misaligned {
            what,
            corpus_rows: corpus.len(),
            other_rows: rows,
        });
    }
    Ok(artifact.payload)
}
