//! Mark-then-sweep reclamation of superseded generations.

use std::path::{Path, PathBuf};

/// File extension of legacy sentinel files. A sentinel's file name is the
/// generation directory's base name plus this suffix, never a character
/// offset into a longer path.
const LEGACY_EXT: &str = "legacy";

/// Publishes generations and reclaims superseded ones.
///
/// Because concurrent requests might still be reading a generation that
/// was just superseded, directories are not removed immediately. A publish
/// that supersedes a generation only *marks* it with a `.legacy` sentinel;
/// the directory is deleted on a later publish cycle, once it is no longer
/// the one that just went legacy. Every deletion failure is logged and
/// ignored: an undeleted generation is a disk-space leak, not a
/// correctness problem, and is retried on the next cycle.
pub struct GenerationManager {
    cache_dir: PathBuf,
}

impl GenerationManager {
    /// Creates a manager for the given cache directory.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Records that `current` is now the active generation.
    ///
    /// If `previous` names a different generation, its directory is marked
    /// legacy, and any generation marked in an *earlier* cycle is swept.
    /// Returns the number of generation directories removed.
    pub fn publish(&self, current: &str, previous: Option<&str>) -> usize {
        let Some(previous) = previous else {
            return 0;
        };
        if previous == current {
            return 0;
        }

        let marked = self.cache_dir.join(format!("{previous}.{LEGACY_EXT}"));
        let removed = self.sweep(&marked, current);

        // Mark the superseded generation last, so it gets a full cycle of
        // grace before the next publish sweeps it.
        if let Err(e) = std::fs::File::create(&marked) {
            tracing::warn!(path = %marked.display(), error = %e, "failed to write legacy sentinel");
        }

        removed
    }

    /// Deletes generations whose sentinels were written in earlier cycles.
    fn sweep(&self, marked_this_cycle: &Path, current: &str) -> usize {
        let entries = match std::fs::read_dir(&self.cache_dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %self.cache_dir.display(), error = %e, "failed to scan cache directory");
                return 0;
            }
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(LEGACY_EXT) {
                continue;
            }
            if path == marked_this_cycle {
                continue;
            }
            let Some(generation) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if generation == current {
                // A sentinel for the active generation is stale; the
                // dumper clears these, but never delete the live one.
                continue;
            }

            // Unlink the sentinel first. Losing the race to another
            // process (NotFound) means it owns the removal.
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to remove legacy sentinel");
                    continue;
                }
            }

            let dir = self.cache_dir.join(generation);
            match std::fs::remove_dir_all(&dir) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %dir.display(), error = %e, "failed to remove legacy generation");
                }
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_generation(dir: &Path, name: &str) {
        let gen_dir = dir.join(name);
        std::fs::create_dir_all(&gen_dir).unwrap();
        std::fs::write(gen_dir.join("component.def"), b"payload").unwrap();
    }

    #[test]
    fn first_publish_has_nothing_to_do() {
        let dir = tempfile::tempdir().unwrap();
        let manager = GenerationManager::new(dir.path());
        assert_eq!(manager.publish("Gen_a", None), 0);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn republish_same_generation_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        make_generation(dir.path(), "Gen_a");
        let manager = GenerationManager::new(dir.path());

        assert_eq!(manager.publish("Gen_a", Some("Gen_a")), 0);
        assert!(dir.path().join("Gen_a").exists());
        assert!(!dir.path().join("Gen_a.legacy").exists());
    }

    #[test]
    fn superseded_generation_is_marked_not_deleted() {
        let dir = tempfile::tempdir().unwrap();
        make_generation(dir.path(), "Gen_a");
        make_generation(dir.path(), "Gen_b");
        let manager = GenerationManager::new(dir.path());

        let removed = manager.publish("Gen_b", Some("Gen_a"));

        assert_eq!(removed, 0);
        assert!(dir.path().join("Gen_a").exists(), "grace window");
        assert!(dir.path().join("Gen_a.legacy").exists());
    }

    #[test]
    fn marked_generation_deleted_on_next_cycle() {
        let dir = tempfile::tempdir().unwrap();
        make_generation(dir.path(), "Gen_a");
        make_generation(dir.path(), "Gen_b");
        make_generation(dir.path(), "Gen_c");
        let manager = GenerationManager::new(dir.path());

        manager.publish("Gen_b", Some("Gen_a"));
        let removed = manager.publish("Gen_c", Some("Gen_b"));

        assert_eq!(removed, 1);
        assert!(!dir.path().join("Gen_a").exists());
        assert!(!dir.path().join("Gen_a.legacy").exists());
        assert!(dir.path().join("Gen_b").exists(), "grace window");
        assert!(dir.path().join("Gen_b.legacy").exists());
        assert!(dir.path().join("Gen_c").exists());
    }

    #[test]
    fn sentinel_for_current_generation_is_never_swept() {
        let dir = tempfile::tempdir().unwrap();
        make_generation(dir.path(), "Gen_a");
        make_generation(dir.path(), "Gen_b");
        // A stale sentinel pointing at what is now the current generation.
        std::fs::write(dir.path().join("Gen_b.legacy"), b"").unwrap();
        let manager = GenerationManager::new(dir.path());

        manager.publish("Gen_b", Some("Gen_a"));
        assert!(dir.path().join("Gen_b").exists());
    }

    #[test]
    fn missing_generation_dir_is_harmless() {
        let dir = tempfile::tempdir().unwrap();
        // Sentinel without a directory, as if another process already
        // removed it.
        std::fs::write(dir.path().join("Gen_x.legacy"), b"").unwrap();
        make_generation(dir.path(), "Gen_b");
        let manager = GenerationManager::new(dir.path());

        let removed = manager.publish("Gen_c", Some("Gen_b"));
        assert_eq!(removed, 0);
        assert!(!dir.path().join("Gen_x.legacy").exists());
    }

    #[test]
    fn non_sentinel_files_are_untouched() {
        let dir = tempfile::tempdir().unwrap();
        make_generation(dir.path(), "Gen_a");
        std::fs::write(dir.path().join("App.root"), b"root").unwrap();
        std::fs::write(dir.path().join("App.meta.json"), b"{}").unwrap();
        let manager = GenerationManager::new(dir.path());

        manager.publish("Gen_b", Some("Gen_a"));
        assert!(dir.path().join("App.root").exists());
        assert!(dir.path().join("App.meta.json").exists());
    }
}
