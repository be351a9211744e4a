//! Artifact file framing and loading.
//!
//! Every dumped file (the root file and each auxiliary component file) is
//! framed as: 4-byte little-endian header length, a bincode-encoded header
//! carrying magic bytes, format version, and a payload checksum, then the
//! payload itself. Any validation failure on read is a cache miss.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use ignition_common::ContentHash;
use ignition_container::Definition;

use crate::error::CacheError;

/// Magic bytes identifying an Ignition artifact file.
const ARTIFACT_MAGIC: [u8; 4] = *b"IGNA";

/// Current artifact format version. Increment on breaking changes to
/// the header or payload format.
const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Header prepended to every artifact file for validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FrameHeader {
    /// Magic bytes: must be `b"IGNA"`.
    magic: [u8; 4],

    /// Artifact format version.
    format_version: u32,

    /// Content hash of the payload (for corruption detection).
    checksum: ContentHash,
}

/// Writes a framed artifact file at the given path.
///
/// The bytes go to a process-unique sibling first and are renamed into
/// place, so a concurrent reader sees either the previous file or the
/// complete new one, never a truncated in-place rewrite.
pub(crate) fn write_framed(path: &Path, payload: &[u8]) -> Result<(), CacheError> {
    let header = FrameHeader {
        magic: ARTIFACT_MAGIC,
        format_version: ARTIFACT_FORMAT_VERSION,
        checksum: ContentHash::from_bytes(payload),
    };

    let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
        .map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;

    let header_len = header_bytes.len() as u32;
    let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
    output.extend_from_slice(&header_len.to_le_bytes());
    output.extend_from_slice(&header_bytes);
    output.extend_from_slice(payload);

    let tmp = tmp_sibling(path);
    std::fs::write(&tmp, &output).map_err(|e| CacheError::Io {
        path: tmp.clone(),
        source: e,
    })?;
    std::fs::rename(&tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        CacheError::Io {
            path: path.to_path_buf(),
            source: e,
        }
    })
}

/// A process-unique temporary name next to `path`.
pub(crate) fn tmp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string());
    path.with_file_name(format!("{name}.tmp{}", std::process::id()))
}

/// Reads and validates a framed artifact file.
///
/// Returns `None` if the file doesn't exist, the header is invalid, the
/// format version doesn't match, or the checksum doesn't verify.
pub(crate) fn read_framed(path: &Path) -> Option<Vec<u8>> {
    let raw = std::fs::read(path).ok()?;

    // Need at least 4 bytes for the header length
    if raw.len() < 4 {
        return None;
    }

    let header_len = u32::from_le_bytes(raw[..4].try_into().ok()?) as usize;
    if raw.len() < 4 + header_len {
        return None;
    }

    let header: FrameHeader =
        bincode::serde::decode_from_slice(&raw[4..4 + header_len], bincode::config::standard())
            .ok()?
            .0;

    if header.magic != ARTIFACT_MAGIC {
        return None;
    }
    if header.format_version != ARTIFACT_FORMAT_VERSION {
        return None;
    }

    let payload = &raw[4 + header_len..];
    if ContentHash::from_bytes(payload) != header.checksum {
        return None;
    }

    Some(payload.to_vec())
}

/// The payload of an artifact's root file.
///
/// The root file is written last: a reader that can load it is guaranteed
/// that every auxiliary file named in `components` already exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootManifest {
    /// The stable container class name the artifact was published under.
    pub container_class: String,

    /// The generation directory name (class name + content hash suffix).
    pub generation: String,

    /// Graph parameters, loaded eagerly with the root file.
    pub parameters: BTreeMap<String, ignition_container::Value>,

    /// Flattened aliases.
    pub aliases: BTreeMap<String, String>,

    /// Component identifier to auxiliary file name within the generation
    /// directory. Definitions are loaded lazily from these files.
    pub components: BTreeMap<String, String>,
}

/// A persisted artifact, as returned by the dumper.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub(crate) class_name: String,
    pub(crate) generation: String,
    pub(crate) root_path: PathBuf,
    pub(crate) meta_path: PathBuf,
    pub(crate) generation_dir: PathBuf,
}

impl Artifact {
    /// The stable container class name.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// The generation name this artifact was published under.
    pub fn generation(&self) -> &str {
        &self.generation
    }

    /// Path of the root file.
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Path of the sibling resource-metadata file.
    pub fn meta_path(&self) -> &Path {
        &self.meta_path
    }

    /// Path of the generation directory holding auxiliary files.
    pub fn generation_dir(&self) -> &Path {
        &self.generation_dir
    }
}

/// An artifact loaded back from disk.
///
/// Holds the eagerly-loaded root manifest; component definitions are read
/// from auxiliary files on demand.
#[derive(Debug)]
pub struct LoadedArtifact {
    manifest: RootManifest,
    generation_dir: PathBuf,
}

impl LoadedArtifact {
    /// Loads and validates an artifact from its root file.
    ///
    /// Returns `None` if the root file is missing, corrupt, or from an
    /// incompatible format version. Callers treat `None` as stale and
    /// recompile; a corrupt artifact never aborts a boot.
    pub fn load(root_path: &Path) -> Option<Self> {
        let payload = read_framed(root_path)?;
        let manifest: RootManifest =
            bincode::serde::decode_from_slice(&payload, bincode::config::standard())
                .ok()?
                .0;
        let generation_dir = root_path.parent()?.join(&manifest.generation);
        Some(Self {
            manifest,
            generation_dir,
        })
    }

    /// The root manifest.
    pub fn manifest(&self) -> &RootManifest {
        &self.manifest
    }

    /// The generation directory auxiliary files are read from.
    pub fn generation_dir(&self) -> &Path {
        &self.generation_dir
    }

    /// Loads one component definition from its auxiliary file.
    ///
    /// Returns `None` if the component is unknown or its file is missing
    /// or corrupt. This is fail-safe like every other read.
    pub fn load_definition(&self, id: &str) -> Option<Definition> {
        let file = self.manifest.components.get(id)?;
        let payload = read_framed(&self.generation_dir.join(file))?;
        bincode::serde::decode_from_slice(&payload, bincode::config::standard())
            .ok()
            .map(|(def, _)| def)
    }
}
