//! Streaming content hasher with a selectable digest.
//!
//! # Overview
//!
//! The [`Hasher`] reads a file in fixed-size chunks and feeds each chunk into
//! the digest chosen for the run ([`HashAlgorithm`]). Only one chunk buffer is
//! alive per file, so arbitrarily large files can be fingerprinted.
//!
//! The hasher is shared across the hashing pool behind an `Arc`; its only
//! mutable state is an atomic invocation counter.
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::scanner::{HashAlgorithm, Hasher};
//! use std::path::Path;
//!
//! let hasher = Hasher::new(HashAlgorithm::Sha256);
//! let fingerprint = hasher.fingerprint_path(Path::new("Cargo.toml")).unwrap();
//! println!("{}", fingerprint.to_hex());
//! ```

use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize, Serializer};
use sha2::Digest;

use super::{FileRecord, HashError};
use crate::error::{suggest, ConfigError};

/// Default read chunk size (64 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Smallest accepted chunk size.
const MIN_CHUNK_SIZE: usize = 4 * 1024;

/// Digest used to fingerprint file contents. One algorithm per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// MD5 (16-byte digest)
    Md5,
    /// SHA-1 (20-byte digest)
    Sha1,
    /// SHA-256 (32-byte digest)
    #[default]
    Sha256,
    /// SHA-512 (64-byte digest)
    Sha512,
}

impl HashAlgorithm {
    /// Every supported algorithm, in display order.
    pub const ALL: [HashAlgorithm; 4] = [Self::Md5, Self::Sha1, Self::Sha256, Self::Sha512];

    /// Canonical lowercase name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }

    /// Digest length in bytes.
    #[must_use]
    pub fn digest_len(self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Sha512 => 64,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|alg| alg.name() == lowered)
            .ok_or_else(|| ConfigError::UnknownAlgorithm {
                name: s.to_string(),
                suggestion: suggest(&lowered, Self::ALL.iter().map(|a| a.name())),
            })
    }
}

/// Content fingerprint: digest bytes tagged with the producing algorithm.
///
/// Fingerprints from different algorithms never compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    algorithm: HashAlgorithm,
    bytes: Vec<u8>,
}

impl Fingerprint {
    /// Wrap raw digest bytes.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm, bytes: Vec<u8>) -> Self {
        debug_assert_eq!(bytes.len(), algorithm.digest_len());
        Self { algorithm, bytes }
    }

    /// Algorithm that produced this fingerprint.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lowercase hexadecimal rendering.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Running digest state for one file.
enum DigestState {
    Md5(md5::Context),
    Sha1(sha1::Sha1),
    Sha256(sha2::Sha256),
    Sha512(sha2::Sha512),
}

impl DigestState {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Md5 => Self::Md5(md5::Context::new()),
            HashAlgorithm::Sha1 => Self::Sha1(sha1::Sha1::new()),
            HashAlgorithm::Sha256 => Self::Sha256(sha2::Sha256::new()),
            HashAlgorithm::Sha512 => Self::Sha512(sha2::Sha512::new()),
        }
    }

    fn update(&mut self, chunk: &[u8]) {
        match self {
            Self::Md5(ctx) => ctx.consume(chunk),
            Self::Sha1(h) => h.update(chunk),
            Self::Sha256(h) => h.update(chunk),
            Self::Sha512(h) => h.update(chunk),
        }
    }

    fn finalize(self) -> Vec<u8> {
        match self {
            Self::Md5(ctx) => ctx.compute().0.to_vec(),
            Self::Sha1(h) => h.finalize().to_vec(),
            Self::Sha256(h) => h.finalize().to_vec(),
            Self::Sha512(h) => h.finalize().to_vec(),
        }
    }
}

/// Chunked file hasher.
#[derive(Debug)]
pub struct Hasher {
    algorithm: HashAlgorithm,
    chunk_size: usize,
    shutdown_flag: Option<Arc<AtomicBool>>,
    invocations: AtomicUsize,
}

impl Hasher {
    /// Create a hasher for the given algorithm with the default chunk size.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            chunk_size: DEFAULT_CHUNK_SIZE,
            shutdown_flag: None,
            invocations: AtomicUsize::new(0),
        }
    }

    /// Set the read chunk size. Values below 4 KiB are raised to 4 KiB.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(MIN_CHUNK_SIZE);
        self
    }

    /// Set the shutdown flag, checked between chunks.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Algorithm used by this hasher.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Configured chunk size in bytes.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of files this hasher has been asked to fingerprint.
    #[must_use]
    pub fn invocation_count(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Fingerprint a discovered record.
    ///
    /// Fails if the number of bytes read differs from the size recorded by
    /// the walker, so a file truncated or grown mid-scan never matches.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] if the file cannot be opened or read, if it
    /// changed size, or if shutdown was requested.
    pub fn fingerprint(&self, record: &FileRecord) -> Result<Fingerprint, HashError> {
        self.hash_file(&record.path, Some(record.size))
    }

    /// Fingerprint an arbitrary path without a size check.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] if the file cannot be opened or read.
    pub fn fingerprint_path(&self, path: &Path) -> Result<Fingerprint, HashError> {
        self.hash_file(path, None)
    }

    /// Fingerprint an in-memory buffer.
    #[must_use]
    pub fn fingerprint_bytes(&self, data: &[u8]) -> Fingerprint {
        let mut state = DigestState::new(self.algorithm);
        for chunk in data.chunks(self.chunk_size) {
            state.update(chunk);
        }
        Fingerprint::new(self.algorithm, state.finalize())
    }

    fn hash_file(&self, path: &Path, expected: Option<u64>) -> Result<Fingerprint, HashError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);

        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let (fingerprint, read) = self.hash_reader(path, file)?;

        if let Some(expected) = expected {
            if read != expected {
                log::warn!(
                    "{} changed size during hashing ({} -> {} bytes)",
                    path.display(),
                    expected,
                    read
                );
                return Err(HashError::SizeChanged {
                    path: path.to_path_buf(),
                    expected,
                    actual: read,
                });
            }
        }

        log::trace!("{} {}: {}", self.algorithm, path.display(), fingerprint);
        Ok(fingerprint)
    }

    /// Stream a reader through the digest. Returns the fingerprint and the
    /// number of bytes consumed.
    fn hash_reader<R: Read>(&self, path: &Path, mut reader: R) -> Result<(Fingerprint, u64), HashError> {
        let mut state = DigestState::new(self.algorithm);
        let mut buffer = vec![0u8; self.chunk_size];
        let mut total = 0u64;

        loop {
            if self.is_shutdown_requested() {
                return Err(HashError::Interrupted(path.to_path_buf()));
            }

            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path, e)),
            };

            state.update(&buffer[..n]);
            total += n as u64;
        }

        Ok((Fingerprint::new(self.algorithm, state.finalize()), total))
    }
}
