use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::TtsError;

const INDEX_FILE: &str = "history.json";
const PAYLOAD_EXT: &str = "wav";

/// One completed synthesis: metadata plus a reference to the payload file
/// (`<id>.wav` under the storage root). Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub text: String,
    pub text_preview: String,
    pub voice_id: String,
    pub engine_id: String,
    /// RFC 3339. Kept as a string so a corrupt timestamp degrades to
    /// "never evicted" instead of poisoning the whole index.
    pub created_at: String,
    pub byte_size: u64,
    pub filename: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StorageStats {
    pub total_files: usize,
    pub total_bytes: u64,
    pub total_megabytes: f64,
    pub storage_root: String,
    pub max_age_days: i64,
}

/// Durable, bounded archive of generated audio.
///
/// The in-memory sequence (newest first) and the on-disk `history.json`
/// index are kept in lockstep: every mutation rewrites the index before
/// returning, under the one store lock. Payload files are written before the
/// index commits, so a crash can orphan a payload but never leave an index
/// entry pointing at a file that was never written.
pub struct HistoryStore {
    root: PathBuf,
    max_entries: usize,
    max_age_days: i64,
    preview_chars: usize,
    entries: Mutex<Vec<HistoryEntry>>,
}

impl HistoryStore {
    pub fn open(
        root: impl Into<PathBuf>,
        max_entries: usize,
        max_age_days: i64,
        preview_chars: usize,
    ) -> std::io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;

        let entries = load_index(&root.join(INDEX_FILE));
        info!(
            "History store opened at {} ({} entries, max {}, keep {} days)",
            root.display(),
            entries.len(),
            max_entries,
            max_age_days
        );

        Ok(Self {
            root,
            max_entries,
            max_age_days,
            preview_chars,
            entries: Mutex::new(entries),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Archive one synthesis. Payload write failures surface as `Storage`
    /// and leave no index entry behind; overflowing `max_entries` evicts
    /// from the tail (oldest) before the index is persisted.
    pub fn add(
        &self,
        text: &str,
        voice_id: &str,
        engine_id: &str,
        payload: &[u8],
    ) -> Result<HistoryEntry, TtsError> {
        let mut entries = self.entries.lock().unwrap();

        let id = Uuid::new_v4().to_string();
        let filename = format!("{}.{}", id, PAYLOAD_EXT);
        fs::write(self.root.join(&filename), payload)?;

        let entry = HistoryEntry {
            id,
            text: text.to_string(),
            text_preview: text.chars().take(self.preview_chars).collect(),
            voice_id: voice_id.to_string(),
            engine_id: engine_id.to_string(),
            created_at: Utc::now().to_rfc3339(),
            byte_size: payload.len() as u64,
            filename,
        };

        entries.insert(0, entry.clone());

        while entries.len() > self.max_entries {
            if let Some(evicted) = entries.pop() {
                self.delete_payload_file(&evicted);
            }
        }

        self.persist(&entries);
        info!("Added audio to history: {}", entry.id);
        Ok(entry)
    }

    /// Newest-first snapshot, optionally truncated. Pure read.
    pub fn list(&self, limit: Option<usize>) -> Vec<HistoryEntry> {
        let entries = self.entries.lock().unwrap();
        match limit {
            Some(n) => entries.iter().take(n).cloned().collect(),
            None => entries.clone(),
        }
    }

    /// Path to the payload iff both the index entry and the file exist.
    /// A dangling entry (file deleted out-of-band) is self-healed: removed
    /// from the index, persisted, and reported as not found.
    pub fn payload_path(&self, id: &str) -> Option<PathBuf> {
        let mut entries = self.entries.lock().unwrap();
        let pos = entries.iter().position(|e| e.id == id)?;

        let path = self.root.join(&entries[pos].filename);
        if path.exists() {
            return Some(path);
        }

        warn!("Payload file missing for {}, removing stale entry", id);
        entries.remove(pos);
        self.persist(&entries);
        None
    }

    /// Remove one entry and its payload. False when the id is unknown;
    /// a second delete of the same id is therefore false, not an error.
    pub fn delete(&self, id: &str) -> bool {
        let mut entries = self.entries.lock().unwrap();
        let Some(pos) = entries.iter().position(|e| e.id == id) else {
            return false;
        };

        let entry = entries.remove(pos);
        self.delete_payload_file(&entry);
        self.persist(&entries);
        info!("Deleted audio: {}", id);
        true
    }

    /// Drop everything. Returns how many payload files were actually
    /// deleted; files already missing are skipped, not errors.
    pub fn clear_all(&self) -> usize {
        let mut entries = self.entries.lock().unwrap();

        let mut deleted = 0;
        for entry in entries.iter() {
            if self.delete_payload_file(entry) {
                deleted += 1;
            }
        }

        entries.clear();
        self.persist(&entries);
        info!("Cleared {} audio files", deleted);
        deleted
    }

    /// Evict entries strictly older than `max_age_days` before `now`.
    /// An entry aged exactly at the boundary is kept, as is any entry whose
    /// timestamp fails to parse. No-op when the policy is disabled.
    pub fn evict_expired(&self, now: DateTime<Utc>) -> usize {
        if self.max_age_days <= 0 {
            return 0;
        }

        let cutoff = now - Duration::days(self.max_age_days);
        let mut entries = self.entries.lock().unwrap();

        let mut removed = 0;
        entries.retain(|entry| match DateTime::parse_from_rfc3339(&entry.created_at) {
            Ok(created) if created.with_timezone(&Utc) < cutoff => {
                self.delete_payload_file(entry);
                removed += 1;
                false
            }
            Ok(_) => true,
            Err(e) => {
                // Never evict on a parse failure; losing data over corrupt
                // metadata is worse than keeping one stale file.
                warn!("Unparseable timestamp on {} ({}), keeping entry", entry.id, e);
                true
            }
        });

        if removed > 0 {
            self.persist(&entries);
            info!("Cleaned up {} old audio files", removed);
        }

        removed
    }

    /// Aggregates over the current index. Pure read.
    pub fn stats(&self) -> StorageStats {
        let entries = self.entries.lock().unwrap();
        let total_bytes: u64 = entries.iter().map(|e| e.byte_size).sum();

        StorageStats {
            total_files: entries.len(),
            total_bytes,
            total_megabytes: (total_bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0,
            storage_root: self.root.display().to_string(),
            max_age_days: self.max_age_days,
        }
    }

    fn delete_payload_file(&self, entry: &HistoryEntry) -> bool {
        let path = self.root.join(&entry.filename);
        if !path.exists() {
            return false;
        }
        match fs::remove_file(&path) {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to delete file {}: {}", path.display(), e);
                false
            }
        }
    }

    /// Rewrite the whole index, via a temp file + rename so readers never
    /// observe a half-written index across a crash.
    fn persist(&self, entries: &[HistoryEntry]) {
        let path = self.root.join(INDEX_FILE);
        let tmp = self.root.join(format!("{}.tmp", INDEX_FILE));

        let result = serde_json::to_vec_pretty(entries)
            .map_err(std::io::Error::other)
            .and_then(|json| fs::write(&tmp, json))
            .and_then(|()| fs::rename(&tmp, &path));

        if let Err(e) = result {
            error!("Failed to save history index: {}", e);
        }
    }
}

fn load_index(path: &Path) -> Vec<HistoryEntry> {
    if !path.exists() {
        return Vec::new();
    }
    match fs::read_to_string(path).map_err(|e| e.to_string()).and_then(|json| {
        serde_json::from_str::<Vec<HistoryEntry>>(&json).map_err(|e| e.to_string())
    }) {
        Ok(entries) => entries,
        Err(e) => {
            error!("Failed to load history index, starting empty: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn preview_is_char_safe_truncation() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::open(dir.path(), 10, 7, 5).unwrap();
        let entry = store.add("héllo wörld", "v1", "kitten", b"xx").unwrap();
        assert_eq!(entry.text_preview, "héllo");
        assert_eq!(entry.text, "héllo wörld");
    }

    #[test]
    fn created_at_is_rfc3339_and_non_decreasing() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::open(dir.path(), 10, 7, 200).unwrap();
        let a = store.add("one", "v1", "kitten", b"a").unwrap();
        let b = store.add("two", "v1", "kitten", b"b").unwrap();
        let ta = DateTime::parse_from_rfc3339(&a.created_at).unwrap();
        let tb = DateTime::parse_from_rfc3339(&b.created_at).unwrap();
        assert!(tb >= ta);
    }
}
