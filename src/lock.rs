//! File-based advisory locking for dictionary writers.
//!
//! Writer не пишет в сам словарь: он собирает `<file>.tmp` и переименовывает
//! его поверх целевого пути. Читатели видят либо старый, либо новый файл
//! целиком, поэтому блокируются только writers: exclusive fs2-lock на
//! sidecar-файле `<file>.lock` на всё время записи и rename.
//!
//! Lock is released on Drop. Sidecar не удаляется (как LOCK в каталоге БД).

use anyhow::{Context, Result};
use fs2::FileExt;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct LockGuard {
    file: File,
    path: PathBuf,
}

impl LockGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        // ошибки unlock на drop игнорируем
        let _ = self.file.unlock();
    }
}

/// `<file>` + suffix рядом с целевым файлом.
pub fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// Путь sidecar-lock'а для словаря.
pub fn lock_path(path: &Path) -> PathBuf {
    sibling_path(path, ".lock")
}

fn open_sidecar(path: &Path) -> Result<(File, PathBuf)> {
    let lp = lock_path(path);
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lp)
        .with_context(|| format!("open lock file {}", lp.display()))?;
    Ok((file, lp))
}

/// Exclusive writer lock for `path`. Blocks while another writer holds it.
pub fn acquire_exclusive(path: &Path) -> Result<LockGuard> {
    let (file, lp) = open_sidecar(path)?;
    file.lock_exclusive()
        .with_context(|| format!("lock_exclusive {}", lp.display()))?;
    Ok(LockGuard { file, path: lp })
}

/// Try to take the writer lock; Err if another writer currently holds it.
pub fn try_acquire_exclusive(path: &Path) -> Result<LockGuard> {
    let (file, lp) = open_sidecar(path)?;
    file.try_lock_exclusive()
        .with_context(|| format!("try_lock_exclusive failed: {}", lp.display()))?;
    Ok(LockGuard { file, path: lp })
}
