// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Write-to-temp-then-rename, shared by both JSON-backed repositories,
//! plus a rolling set of the last ten backups kept alongside the target
//! file. Grounded on the same pattern every downloader-style tool in the
//! pack uses to avoid a reader ever observing a half-written file:
//! write the bytes to a sibling `.tmp` path, `fsync`/flush, then
//! `rename` over the target, which is atomic on the same filesystem.

use rapidcopy_domain::RapidCopyError;
use std::fs;
use std::io::Write;
use std::path::Path;

const MAX_BACKUPS: usize = 10;

fn io_err(context: &str, err: std::io::Error) -> RapidCopyError {
    RapidCopyError::Io(std::io::Error::new(err.kind(), format!("{context}: {err}")))
}

/// Rotates `path.bak.0 .. path.bak.8` up to `path.bak.1 .. path.bak.9`,
/// dropping anything already at `path.bak.9`, then copies the current
/// file (if any) into `path.bak.0`.
fn rotate_backups(path: &Path) -> Result<(), RapidCopyError> {
    if !path.exists() {
        return Ok(());
    }
    let backup_path = |n: usize| {
        let mut name = path.as_os_str().to_owned();
        name.push(format!(".bak.{n}"));
        std::path::PathBuf::from(name)
    };
    for n in (0..MAX_BACKUPS - 1).rev() {
        let from = backup_path(n);
        if from.exists() {
            fs::rename(&from, backup_path(n + 1)).map_err(|e| io_err("rotating backup", e))?;
        }
    }
    fs::copy(path, backup_path(0)).map_err(|e| io_err("copying backup", e))?;
    Ok(())
}

/// Serializes `value` to pretty JSON, rotates backups of whatever is
/// currently at `path`, then writes the new contents to a sibling temp
/// file and renames it over `path`.
pub fn write_json_atomically<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), RapidCopyError> {
    rotate_backups(path)?;
    let mut tmp_path = path.as_os_str().to_owned();
    tmp_path.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_path);

    let json = serde_json::to_string_pretty(value).map_err(|e| RapidCopyError::Json(e.to_string()))?;
    let mut file = fs::File::create(&tmp_path).map_err(|e| io_err("creating temp file", e))?;
    file.write_all(json.as_bytes())
        .map_err(|e| io_err("writing temp file", e))?;
    file.flush().map_err(|e| io_err("flushing temp file", e))?;
    fs::rename(&tmp_path, path).map_err(|e| io_err("renaming temp file into place", e))?;
    Ok(())
}

/// Reads and parses `path`, or `default` if it does not exist yet (first
/// run).
pub fn read_json_or_default<T: serde::de::DeserializeOwned + Default>(path: &Path) -> Result<T, RapidCopyError> {
    match fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str(&contents).map_err(|e| RapidCopyError::Json(e.to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(io_err("reading", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, Default, PartialEq)]
    struct Doc {
        value: u32,
    }

    #[test]
    fn round_trips_through_a_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        write_json_atomically(&path, &Doc { value: 42 }).unwrap();
        let loaded: Doc = read_json_or_default(&path).unwrap();
        assert_eq!(loaded, Doc { value: 42 });
    }

    #[test]
    fn missing_file_reads_as_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let loaded: Doc = read_json_or_default(&path).unwrap();
        assert_eq!(loaded, Doc::default());
    }

    #[test]
    fn a_second_write_creates_a_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        write_json_atomically(&path, &Doc { value: 1 }).unwrap();
        write_json_atomically(&path, &Doc { value: 2 }).unwrap();
        let mut backup_path = path.as_os_str().to_owned();
        backup_path.push(".bak.0");
        assert!(std::path::Path::new(&backup_path).exists());
    }
}
