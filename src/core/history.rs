//! Translation history
//!
//! Append-only log of translations split into size-capped CSV segments.
//! Concatenating the segments in sequence order yields the full history,
//! oldest first. Only the newest segment is ever appended to.
//!
//! Edits, deletes and clears rewrite the whole log into a single segment.
//! The rewrite is staged in a side file and committed by rename before the
//! old segments are removed, so an interrupted rewrite is finished on the
//! next `open` instead of losing history.

pub mod codec;
pub mod segment;

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::shared::error::{AppError, AppResult};
use crate::shared::types::TranslationRecord;
use segment::{list_segments, segment_path, REWRITE_PENDING, REWRITE_TMP};

/// Default number of records per segment
pub const DEFAULT_SEGMENT_CAP: usize = 500;

#[derive(Debug, Clone)]
struct OpenSegment {
    seq: u64,
    /// Actual file on disk; legacy segments keep their unpadded name.
    path: PathBuf,
    rows: usize,
}

impl OpenSegment {
    fn fresh(dir: &Path, seq: u64) -> Self {
        Self {
            seq,
            path: segment_path(dir, seq),
            rows: 0,
        }
    }
}

#[derive(Debug, Default)]
struct StoreState {
    /// Lazily discovered; `None` means "look at the directory again".
    open: Option<OpenSegment>,
}

pub struct HistoryStore {
    dir: PathBuf,
    cap: usize,
    state: Mutex<StoreState>,
}

fn storage_err(action: &str, path: &Path, err: std::io::Error) -> AppError {
    AppError::Storage(format!("Failed to {} {}: {}", action, path.display(), err))
}

impl HistoryStore {
    /// Open (or create) the history directory and finish any interrupted rewrite.
    pub fn open(dir: impl Into<PathBuf>, cap: usize) -> AppResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| storage_err("create", &dir, e))?;

        let store = Self {
            dir,
            cap: cap.max(1),
            state: Mutex::new(StoreState::default()),
        };
        store.recover()?;

        {
            let mut state = store.lock();
            let open = store.discover_open_segment()?;
            log::info!(
                "[HistoryStore] Opened {} (open segment #{}, {} rows)",
                store.dir.display(),
                open.seq,
                open.rows
            );
            state.open = Some(open);
        }
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::error!("[HistoryStore] Mutex poisoned, recovering...");
                poisoned.into_inner()
            }
        }
    }

    fn recover(&self) -> AppResult<()> {
        let tmp = self.dir.join(REWRITE_TMP);
        if tmp.exists() {
            log::warn!("[HistoryStore] Discarding uncommitted rewrite {}", tmp.display());
            fs::remove_file(&tmp).map_err(|e| storage_err("remove", &tmp, e))?;
        }

        let pending = self.dir.join(REWRITE_PENDING);
        if pending.exists() {
            log::warn!("[HistoryStore] Completing interrupted rewrite from {}", pending.display());
            self.commit_rewrite(&pending)?;
        }
        Ok(())
    }

    /// Newest segment and its physical row count, or a fresh segment #1.
    /// A segment ending in a torn row is left as is and appends move on to
    /// the next sequence number, so the torn row cannot swallow later rows.
    fn discover_open_segment(&self) -> AppResult<OpenSegment> {
        let Some(last) = list_segments(&self.dir)?.pop() else {
            return Ok(OpenSegment::fresh(&self.dir, 1));
        };

        let bytes = fs::read(&last.path).map_err(|e| storage_err("read", &last.path, e))?;
        if !codec::ends_on_row_boundary(&bytes) {
            log::warn!(
                "[HistoryStore] {} ends with an incomplete row, continuing in #{}",
                last.path.display(),
                last.seq + 1
            );
            return Ok(OpenSegment::fresh(&self.dir, last.seq + 1));
        }

        Ok(OpenSegment {
            seq: last.seq,
            rows: codec::read_rows(bytes.as_slice()).len(),
            path: last.path,
        })
    }

    /// Append one record, rolling over to a new segment once the open one is full.
    pub fn append(&self, record: &TranslationRecord) -> AppResult<()> {
        let mut state = self.lock();

        // Left as `None` on any early return so the next append rediscovers.
        let mut open = match state.open.take() {
            Some(open) => open,
            None => self.discover_open_segment()?,
        };
        if open.rows >= self.cap {
            open = OpenSegment::fresh(&self.dir, open.seq + 1);
            log::info!("[HistoryStore] Segment full, rotating to #{}", open.seq);
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&open.path)
            .map_err(|e| storage_err("open", &open.path, e))?;
        let before = file
            .metadata()
            .map_err(|e| storage_err("inspect", &open.path, e))?
            .len();

        if let Err(e) = codec::write_records(BufWriter::new(&file), std::slice::from_ref(record)) {
            // Drop whatever part of the row reached the file.
            match file.set_len(before) {
                Ok(()) => state.open = Some(open),
                Err(trunc) => log::error!(
                    "[HistoryStore] Failed to roll back partial row in {}: {}",
                    open.path.display(),
                    trunc
                ),
            }
            return Err(e);
        }

        open.rows += 1;
        state.open = Some(open);
        Ok(())
    }

    /// Records of one segment; an unreadable segment is skipped, not fatal.
    fn read_segment(path: &Path) -> Option<Vec<TranslationRecord>> {
        match File::open(path) {
            Ok(file) => Some(codec::read_records(BufReader::new(file))),
            Err(e) => {
                log::warn!("[HistoryStore] Skipping unreadable segment {}: {}", path.display(), e);
                None
            }
        }
    }

    fn load_all_locked(&self) -> AppResult<Vec<TranslationRecord>> {
        Ok(list_segments(&self.dir)?
            .iter()
            .filter_map(|segment| Self::read_segment(&segment.path))
            .flatten()
            .collect())
    }

    /// Full history, oldest first.
    pub fn load_all(&self) -> AppResult<Vec<TranslationRecord>> {
        let _state = self.lock();
        self.load_all_locked()
    }

    /// The last `n` records, oldest first. Reads only the newest segments.
    pub fn load_recent(&self, n: usize) -> AppResult<Vec<TranslationRecord>> {
        let _state = self.lock();

        let mut chunks = Vec::new();
        let mut collected = 0;
        for segment in list_segments(&self.dir)?.iter().rev() {
            if collected >= n {
                break;
            }
            if let Some(records) = Self::read_segment(&segment.path) {
                collected += records.len();
                chunks.push(records);
            }
        }

        let mut records: Vec<TranslationRecord> = chunks.into_iter().rev().flatten().collect();
        let skip = records.len().saturating_sub(n);
        records.drain(..skip);
        Ok(records)
    }

    /// The last `n` records together with the position of the first one in
    /// `load_all` order, read under one lock.
    pub fn load_tail(&self, n: usize) -> AppResult<(usize, Vec<TranslationRecord>)> {
        let _state = self.lock();
        let mut records = self.load_all_locked()?;
        let first = records.len().saturating_sub(n);
        records.drain(..first);
        Ok((first, records))
    }

    pub fn len(&self) -> AppResult<usize> {
        Ok(self.load_all()?.len())
    }

    pub fn is_empty(&self) -> AppResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Sequence numbers of the segments on disk, oldest first.
    pub fn list_segment_ids(&self) -> AppResult<Vec<u64>> {
        let _state = self.lock();
        Ok(list_segments(&self.dir)?.into_iter().map(|s| s.seq).collect())
    }

    /// Replace the whole history with `records`, written as one fresh segment.
    pub fn rewrite_all(&self, records: &[TranslationRecord]) -> AppResult<()> {
        let mut state = self.lock();
        self.rewrite_locked(&mut state, records)
    }

    fn rewrite_locked(&self, state: &mut StoreState, records: &[TranslationRecord]) -> AppResult<()> {
        // Anything cached is stale from here on, even if we fail midway.
        state.open = None;

        let tmp = self.dir.join(REWRITE_TMP);
        let pending = self.dir.join(REWRITE_PENDING);

        let file = File::create(&tmp).map_err(|e| storage_err("create", &tmp, e))?;
        let mut writer = BufWriter::new(file);
        codec::write_records(&mut writer, records)?;
        writer.flush().map_err(|e| storage_err("write", &tmp, e))?;
        let file = writer
            .into_inner()
            .map_err(|e| storage_err("write", &tmp, e.into_error()))?;
        file.sync_all().map_err(|e| storage_err("sync", &tmp, e))?;
        drop(file);

        fs::rename(&tmp, &pending).map_err(|e| storage_err("commit", &pending, e))?;
        self.commit_rewrite(&pending)?;

        state.open = Some(OpenSegment {
            rows: records.len(),
            ..OpenSegment::fresh(&self.dir, 1)
        });
        log::info!("[HistoryStore] Rewrote history with {} records", records.len());
        Ok(())
    }

    /// Replace every segment with the committed rewrite content.
    fn commit_rewrite(&self, pending: &Path) -> AppResult<()> {
        for segment in list_segments(&self.dir)? {
            fs::remove_file(&segment.path).map_err(|e| storage_err("remove", &segment.path, e))?;
        }

        let is_empty = fs::metadata(pending)
            .map_err(|e| storage_err("inspect", pending, e))?
            .len()
            == 0;
        if is_empty {
            fs::remove_file(pending).map_err(|e| storage_err("remove", pending, e))?;
        } else {
            let target = segment_path(&self.dir, 1);
            fs::rename(pending, &target).map_err(|e| storage_err("rename", &target, e))?;
        }
        Ok(())
    }

    /// Replace the record at `index` (position in `load_all` order).
    pub fn update(&self, index: usize, record: TranslationRecord) -> AppResult<TranslationRecord> {
        let mut state = self.lock();
        let mut records = self.load_all_locked()?;
        let slot = records.get_mut(index).ok_or_else(|| out_of_range(index))?;
        let previous = std::mem::replace(slot, record);
        self.rewrite_locked(&mut state, &records)?;
        Ok(previous)
    }

    /// Replace only the translated text at `index`, keeping the original.
    /// Returns the updated record.
    pub fn update_translation(&self, index: usize, translated: &str) -> AppResult<TranslationRecord> {
        let mut state = self.lock();
        let mut records = self.load_all_locked()?;
        let slot = records.get_mut(index).ok_or_else(|| out_of_range(index))?;
        slot.translated = translated.to_string();
        let updated = slot.clone();
        self.rewrite_locked(&mut state, &records)?;
        Ok(updated)
    }

    /// Remove the record at `index` (position in `load_all` order).
    pub fn delete(&self, index: usize) -> AppResult<TranslationRecord> {
        let mut state = self.lock();
        let mut records = self.load_all_locked()?;
        if index >= records.len() {
            return Err(out_of_range(index));
        }
        let removed = records.remove(index);
        self.rewrite_locked(&mut state, &records)?;
        Ok(removed)
    }

    pub fn clear(&self) -> AppResult<()> {
        self.rewrite_all(&[])
    }
}

fn out_of_range(index: usize) -> AppError {
    AppError::Validation(format!("No history entry at position {}", index + 1))
}
