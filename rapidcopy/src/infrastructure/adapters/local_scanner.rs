// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! System Scanner: walks a local directory tree into the [`SystemFile`]
//! shape the reconciler's model builder consumes. Runs synchronously
//! inside the [`ScannerSupervisor`](crate::application::services::scanner_supervisor::ScannerSupervisor)'s
//! `spawn_blocking`, so plain `std::fs` is the right tool — no sense
//! pulling the async filesystem layer in only to block on it anyway.

use crate::application::services::scanner_supervisor::{ScanOutcome, Scanner};
use rapidcopy_domain::entities::SystemFile;
use rapidcopy_domain::RapidCopyError;
use std::fs::{self, DirEntry, Metadata};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub struct LocalScanner {
    root: PathBuf,
    pair_id: Option<String>,
    pair_name: Option<String>,
    exclude_prefixes: Vec<String>,
    exclude_suffixes: Vec<String>,
    temp_file_suffix: Option<String>,
}

impl LocalScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalScanner {
            root: root.into(),
            pair_id: None,
            pair_name: None,
            exclude_prefixes: Vec::new(),
            exclude_suffixes: Vec::new(),
            temp_file_suffix: None,
        }
    }

    pub fn with_pair(mut self, pair_id: impl Into<String>, pair_name: impl Into<String>) -> Self {
        self.pair_id = Some(pair_id.into());
        self.pair_name = Some(pair_name.into());
        self
    }

    /// Entries whose name starts with one of `prefixes` or ends with one
    /// of `suffixes` are skipped entirely (`spec.md` §4.2).
    pub fn with_excludes(mut self, prefixes: Vec<String>, suffixes: Vec<String>) -> Self {
        self.exclude_prefixes = prefixes;
        self.exclude_suffixes = suffixes;
        self
    }

    /// The in-progress download sidecar suffix (e.g. `.partial-status`):
    /// a `<name><suffix>` sibling is read for byte accounting, and a name
    /// itself ending in the suffix has it stripped before being reported.
    pub fn with_temp_file_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.temp_file_suffix = Some(suffix.into());
        self
    }

    fn to_timestamp(time: std::io::Result<SystemTime>) -> Option<chrono::DateTime<chrono::Utc>> {
        time.ok().map(chrono::DateTime::<chrono::Utc>::from)
    }

    fn is_excluded(&self, name: &str) -> bool {
        if self.exclude_prefixes.iter().any(|p| name.starts_with(p.as_str())) {
            return true;
        }
        if self.exclude_suffixes.iter().any(|s| name.ends_with(s.as_str())) {
            return true;
        }
        if let Some(suffix) = &self.temp_file_suffix {
            if name.ends_with(suffix.as_str()) {
                return true;
            }
        }
        false
    }

    /// Parses an lftp-style status sidecar: a `size=<n>` header followed
    /// by `<i>.pos=<n>`/`<i>.limit=<n>` pairs for each unfinished range.
    /// The file's real size is the declared total minus the sum of
    /// `limit - pos` across those ranges; any unexpected line shape falls
    /// back to `0`, matching the sidecar format's own convention for "not
    /// parseable yet".
    fn status_file_size(contents: &str) -> u64 {
        let mut lines = contents.lines().map(str::trim).filter(|l| !l.is_empty());
        let Some(total) = lines.next().and_then(|l| l.strip_prefix("size=")).and_then(|n| n.parse::<u64>().ok()) else {
            return 0;
        };
        let mut empty = 0u64;
        loop {
            let Some(pos_line) = lines.next() else { break };
            let Some(limit_line) = lines.next() else { return 0 };
            let Some(pos) = pos_line.split_once(".pos=").and_then(|(_, n)| n.parse::<u64>().ok()) else {
                return 0;
            };
            let Some(limit) = limit_line.split_once(".limit=").and_then(|(_, n)| n.parse::<u64>().ok()) else {
                return 0;
            };
            empty += limit.saturating_sub(pos);
        }
        total.saturating_sub(empty)
    }

    fn file_entry(&self, path: &Path, name: String, metadata: &Metadata) -> SystemFile {
        let mut size = metadata.len();
        let mut name = name;
        if let Some(suffix) = &self.temp_file_suffix {
            let status_path = path.with_file_name(format!("{name}{suffix}"));
            if let Ok(contents) = fs::read_to_string(&status_path) {
                size = Self::status_file_size(&contents);
            }
            if name != *suffix && name.ends_with(suffix.as_str()) {
                name.truncate(name.len() - suffix.len());
            }
        }
        SystemFile::new_file(name, size)
    }

    fn walk(&self, path: &Path) -> Result<SystemFile, RapidCopyError> {
        let metadata = fs::symlink_metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());

        let mut file = if metadata.is_dir() {
            let mut children = Vec::new();
            for entry in fs::read_dir(path)? {
                let entry: DirEntry = entry?;
                let child_name = entry.file_name().to_string_lossy().to_string();
                if self.is_excluded(&child_name) {
                    continue;
                }
                match self.walk(&entry.path()) {
                    Ok(child) => children.push(child),
                    Err(RapidCopyError::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => continue,
                    Err(e) => return Err(e),
                }
            }
            children.sort_by(|a, b| a.name.cmp(&b.name));
            SystemFile::new_dir(name, children)
        } else {
            self.file_entry(path, name, &metadata)
        };

        file.time_created = Self::to_timestamp(metadata.created());
        file.time_modified = Self::to_timestamp(metadata.modified());
        if let (Some(id), Some(n)) = (&self.pair_id, &self.pair_name) {
            file = file.with_pair(id.clone(), n.clone());
        }
        Ok(file)
    }

    fn metadata_or_missing(&self) -> Result<Metadata, RapidCopyError> {
        fs::metadata(&self.root).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RapidCopyError::ScanNonRecoverable(format!("local root does not exist: {}", self.root.display()))
            } else {
                RapidCopyError::ScanTransient(format!("stat {}: {e}", self.root.display()))
            }
        })
    }
}

impl Scanner for LocalScanner {
    fn scan(&self) -> ScanOutcome {
        self.metadata_or_missing()?;
        let root = self.walk(&self.root).map_err(|e| match e {
            RapidCopyError::Io(io_err) => RapidCopyError::ScanTransient(format!("scanning {}: {io_err}", self.root.display())),
            other => other,
        })?;
        Ok(root.children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn scans_files_and_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.bin"), b"hello").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/b.bin"), b"world!!").unwrap();

        let scanner = LocalScanner::new(dir.path());
        let files = scanner.scan().unwrap();
        assert_eq!(files.len(), 2);

        let a = files.iter().find(|f| f.name == "a.bin").unwrap();
        assert_eq!(a.size, 5);
        assert!(!a.is_dir);

        let sub = files.iter().find(|f| f.name == "sub").unwrap();
        assert!(sub.is_dir);
        assert_eq!(sub.size, 7);
        assert_eq!(sub.children.len(), 1);
    }

    #[test]
    fn missing_root_is_non_recoverable() {
        let scanner = LocalScanner::new("/no/such/path/rapidcopy-test");
        let result = scanner.scan();
        assert!(matches!(result, Err(RapidCopyError::ScanNonRecoverable(_))));
    }

    #[test]
    fn with_pair_tags_every_entry() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = std::fs::File::create(dir.path().join("a.bin")).unwrap();
        f.write_all(b"x").unwrap();

        let scanner = LocalScanner::new(dir.path()).with_pair("p1", "movies");
        let files = scanner.scan().unwrap();
        assert_eq!(files[0].pair_id.as_deref(), Some("p1"));
        assert_eq!(files[0].pair_name.as_deref(), Some("movies"));
    }

    #[test]
    fn excluded_prefixes_and_suffixes_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.bin"), b"hello").unwrap();
        std::fs::write(dir.path().join(".hidden"), b"x").unwrap();
        std::fs::write(dir.path().join("a.bin.lftp-pget-status"), b"y").unwrap();

        let scanner = LocalScanner::new(dir.path()).with_excludes(vec![".".to_string()], vec![".lftp-pget-status".to_string()]);
        let files = scanner.scan().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "a.bin");
    }

    #[test]
    fn temp_suffix_sidecar_overrides_size_and_strips_name() {
        let dir = tempfile::tempdir().unwrap();
        // An in-progress download: the partial bytes on disk understate
        // the real size, which the sidecar status file declares instead.
        std::fs::write(dir.path().join("movie.mkv"), vec![0u8; 4]).unwrap();
        std::fs::write(dir.path().join("movie.mkv.partial-status"), "size=100\n0.pos=4\n0.limit=100\n").unwrap();

        let scanner = LocalScanner::new(dir.path()).with_temp_file_suffix(".partial-status");
        let files = scanner.scan().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "movie.mkv");
        assert_eq!(files[0].size, 4);
    }

    #[test]
    fn children_are_sorted_alphabetically() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("zeta.bin"), b"z").unwrap();
        std::fs::write(dir.path().join("alpha.bin"), b"a").unwrap();
        std::fs::write(dir.path().join("mid.bin"), b"m").unwrap();

        let scanner = LocalScanner::new(dir.path());
        let files = scanner.scan().unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["alpha.bin", "mid.bin", "zeta.bin"]);
    }
}
