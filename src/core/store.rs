// Durable workout collection: one JSON array file, seeded on first open,
// rewritten in full after every mutation. The largest id ever assigned is kept
// in a `<store>.meta` sidecar so ids are never reused across processes.
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use libc::{EACCES, EPERM};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::error::{Error, ErrorKind};
use crate::core::paging::{Page, PageRequest, paginate};
use crate::core::record::{WorkoutDraft, WorkoutRecord};
use crate::core::seed::seed_records;
use crate::core::stats::Stats;
use crate::core::validate::validate_workout;

pub struct WorkoutStore {
    path: PathBuf,
    records: Vec<WorkoutRecord>,
    high_water: u64,
    seeded: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreMeta {
    high_water: u64,
}

impl WorkoutStore {
    /// Opens the store at `path`, seeding it when the file does not exist yet.
    /// An existing file holding `[]` stays empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let _lock = StoreLock::acquire(&path)?;
        let (records, seeded) = match read_records(&path)? {
            Some(records) => (records, false),
            None => {
                let records = seed_records();
                write_records(&path, &records)?;
                debug!(path = %path.display(), count = records.len(), "seeded workout store");
                (records, true)
            }
        };
        let persisted = read_high_water(&path)?;
        let high_water = persisted.max(max_id(&records));
        if high_water > persisted {
            write_high_water(&path, high_water)?;
        }
        Ok(Self {
            path,
            records,
            high_water,
            seeded,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when this open created the seed data.
    pub fn was_seeded(&self) -> bool {
        self.seeded
    }

    pub fn records(&self) -> &[WorkoutRecord] {
        &self.records
    }

    /// Largest id ever assigned to this store, including deleted ones.
    pub fn high_water(&self) -> u64 {
        self.high_water
    }

    /// Re-reads the collection from disk. A store file removed since `open`
    /// is `NotFound`, not an empty collection.
    pub fn load(&mut self) -> Result<&[WorkoutRecord], Error> {
        let records = read_existing_records(&self.path)?;
        let persisted = read_high_water(&self.path)?;
        self.high_water = self.high_water.max(persisted).max(max_id(&records));
        self.records = records;
        Ok(&self.records)
    }

    /// Replaces the whole collection and writes it out. The id high-water mark
    /// only moves up, so saving `[]` does not make old ids reusable.
    pub fn save_all(&mut self, records: &[WorkoutRecord]) -> Result<(), Error> {
        let _lock = StoreLock::acquire(&self.path)?;
        let persisted = read_high_water(&self.path)?;
        write_records(&self.path, records)?;
        let high_water = self.high_water.max(persisted).max(max_id(records));
        if high_water > persisted {
            write_high_water(&self.path, high_water)?;
        }
        self.records = records.to_vec();
        self.high_water = high_water;
        Ok(())
    }

    pub fn list(&self, request: PageRequest) -> Page {
        paginate(&self.records, request)
    }

    pub fn stats(&self) -> Stats {
        Stats::from_records(&self.records)
    }

    pub fn create(&mut self, draft: WorkoutDraft) -> Result<WorkoutRecord, Error> {
        let draft = draft.normalized();
        validate_workout(&draft)?;
        self.mutate(|records, high_water| {
            let id = high_water.max(max_id(records)) + 1;
            let record = WorkoutRecord::from_draft(id, draft);
            records.push(record.clone());
            Ok(record)
        })
    }

    pub fn update(&mut self, id: u64, draft: WorkoutDraft) -> Result<WorkoutRecord, Error> {
        let draft = draft.normalized();
        validate_workout(&draft)?;
        self.mutate(|records, _| {
            let record = records
                .iter_mut()
                .find(|record| record.id == id)
                .ok_or_else(|| not_found(id))?;
            record.apply(draft);
            Ok(record.clone())
        })
    }

    pub fn delete(&mut self, id: u64) -> Result<(), Error> {
        self.mutate(|records, _| {
            let before = records.len();
            records.retain(|record| record.id != id);
            if records.len() == before {
                return Err(not_found(id));
            }
            Ok(())
        })
    }

    // Re-reads records and mark under the lock so another process's writes are
    // not lost; memory is only updated after the write succeeds.
    fn mutate<T>(
        &mut self,
        change: impl FnOnce(&mut Vec<WorkoutRecord>, u64) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let _lock = StoreLock::acquire(&self.path)?;
        let mut records = read_existing_records(&self.path)?;
        let persisted = read_high_water(&self.path)?;
        let out = change(&mut records, self.high_water.max(persisted))?;
        write_records(&self.path, &records)?;
        let high_water = self.high_water.max(persisted).max(max_id(&records));
        if high_water > persisted {
            write_high_water(&self.path, high_water)?;
        }
        self.high_water = high_water;
        self.records = records;
        Ok(out)
    }
}

fn not_found(id: u64) -> Error {
    Error::new(ErrorKind::NotFound)
        .with_message("not found")
        .with_id(id)
}

fn max_id(records: &[WorkoutRecord]) -> u64 {
    records.iter().map(|record| record.id).max().unwrap_or(0)
}

fn read_existing_records(path: &Path) -> Result<Vec<WorkoutRecord>, Error> {
    read_records(path)?.ok_or_else(|| {
        Error::new(ErrorKind::NotFound)
            .with_message("workout store file is missing")
            .with_path(path)
            .with_hint("Restore the file, or re-run the command to start from seed data.")
    })
}

fn read_records(path: &Path) -> Result<Option<Vec<WorkoutRecord>>, Error> {
    let Some(bytes) = read_optional(path, "failed to read workout store")? else {
        return Ok(None);
    };
    let records: Vec<WorkoutRecord> = serde_json::from_slice(&bytes).map_err(|err| {
        Error::new(ErrorKind::Corrupt)
            .with_message("workout store is not a valid JSON array of records")
            .with_path(path)
            .with_hint("Fix or remove the file; removing it reseeds the starter data.")
            .with_source(err)
    })?;
    debug!(path = %path.display(), count = records.len(), "loaded workout store");
    Ok(Some(records))
}

fn write_records(path: &Path, records: &[WorkoutRecord]) -> Result<(), Error> {
    write_json_atomic(path, records, "workout store")?;
    debug!(path = %path.display(), count = records.len(), "wrote workout store");
    Ok(())
}

fn read_high_water(path: &Path) -> Result<u64, Error> {
    let meta_path = sidecar(path, "meta");
    let Some(bytes) = read_optional(&meta_path, "failed to read store metadata")? else {
        return Ok(0);
    };
    let meta: StoreMeta = serde_json::from_slice(&bytes).map_err(|err| {
        Error::new(ErrorKind::Corrupt)
            .with_message("store metadata is not valid JSON")
            .with_path(&meta_path)
            .with_hint("Remove the file; it is rebuilt from the largest stored id.")
            .with_source(err)
    })?;
    Ok(meta.high_water)
}

fn write_high_water(path: &Path, high_water: u64) -> Result<(), Error> {
    write_json_atomic(&sidecar(path, "meta"), &StoreMeta { high_water }, "store metadata")?;
    debug!(path = %path.display(), high_water, "wrote store metadata");
    Ok(())
}

fn read_optional(path: &Path, message: &str) -> Result<Option<Vec<u8>>, Error> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(Error::new(io_error_kind(&err))
            .with_message(message)
            .with_path(path)
            .with_source(err)),
    }
}

// Temp file plus rename so readers never observe a partial write.
fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
    what: &str,
) -> Result<(), Error> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| {
            Error::new(io_error_kind(&err))
                .with_message("failed to create store directory")
                .with_path(parent)
                .with_source(err)
        })?;
    }
    let mut json = serde_json::to_vec_pretty(value).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message(format!("failed to encode {what}"))
            .with_source(err)
    })?;
    json.push(b'\n');

    let tmp = sidecar(path, "tmp");
    let io_err = |err: io::Error| {
        Error::new(io_error_kind(&err))
            .with_message(format!("failed to write {what}"))
            .with_path(path)
            .with_source(err)
    };
    let mut file = File::create(&tmp).map_err(io_err)?;
    file.write_all(&json).map_err(io_err)?;
    file.sync_all().map_err(io_err)?;
    drop(file);
    fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}

fn sidecar(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

/// Exclusive advisory lock on `<store>.lock`, held for one read-modify-write.
struct StoreLock {
    file: File,
}

impl StoreLock {
    fn acquire(path: &Path) -> Result<Self, Error> {
        let lock_path = sidecar(path, "lock");
        if let Some(parent) = lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| {
                Error::new(io_error_kind(&err))
                    .with_message("failed to create store directory")
                    .with_path(parent)
                    .with_source(err)
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&lock_path)
            .map_err(|err| {
                Error::new(io_error_kind(&err))
                    .with_path(&lock_path)
                    .with_source(err)
            })?;
        file.lock_exclusive().map_err(|err| {
            Error::new(lock_error_kind(&err))
                .with_message("failed to lock workout store")
                .with_path(&lock_path)
                .with_source(err)
        })?;
        Ok(Self { file })
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

fn io_error_kind(err: &io::Error) -> ErrorKind {
    match err.kind() {
        io::ErrorKind::NotFound => ErrorKind::NotFound,
        io::ErrorKind::PermissionDenied => ErrorKind::Permission,
        _ => ErrorKind::Io,
    }
}

fn lock_error_kind(err: &io::Error) -> ErrorKind {
    let errno = err.raw_os_error().unwrap_or_default();
    if errno == EACCES || errno == EPERM {
        return ErrorKind::Permission;
    }
    match err.kind() {
        io::ErrorKind::WouldBlock => ErrorKind::Busy,
        io::ErrorKind::PermissionDenied => ErrorKind::Permission,
        _ => ErrorKind::Io,
    }
}
