// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Remote Scanner: installs a small Python scan program on the remote
//! host (by digest, so a re-run that hasn't changed the script is a
//! no-op) and decodes its JSON output into [`SystemFile`] trees. The
//! wire format is a hard requirement, not a convenience — a
//! native-pickling format would let a compromised remote execute code
//! on decode, so only a structured, self-describing encoding is ever
//! accepted.

use super::shell::shell_quote;
use crate::application::services::scanner_supervisor::{ScanOutcome, Scanner};
use crate::infrastructure::adapters::checksum::RemoteExecutor;
use base64::Engine;
use rapidcopy_domain::entities::SystemFile;
use rapidcopy_domain::RapidCopyError;
use serde::Deserialize;
use sha2::{Digest, Sha256};

/// The scan program's own source. Kept tiny and dependency-free on the
/// remote side: stdlib `os`/`json`/`re` only. `__EXCLUDE_PREFIXES__`,
/// `__EXCLUDE_SUFFIXES__`, and `__TEMP_SUFFIX__` are substituted with
/// Python literals before the program is installed, so two scanners
/// configured differently install (and re-hash to) distinct programs.
const SCAN_PROGRAM_TEMPLATE: &str = r#"#!/usr/bin/env python3
import json, os, sys, re

EXCLUDE_PREFIXES = __EXCLUDE_PREFIXES__
TEMP_SUFFIX = __TEMP_SUFFIX__
EXCLUDE_SUFFIXES = __EXCLUDE_SUFFIXES__ + ([TEMP_SUFFIX] if TEMP_SUFFIX is not None else [])

SIZE_RE = re.compile(r"^size=(\d+)$")
POS_RE = re.compile(r"^\d+\.pos=(\d+)$")
LIMIT_RE = re.compile(r"^\d+\.limit=(\d+)$")

def status_file_size(text):
    lines = [s.strip() for s in text.splitlines()]
    lines = [s for s in lines if s]
    if not lines:
        return 0
    m = SIZE_RE.match(lines[0])
    if not m:
        return 0
    total = int(m.group(1))
    lines.pop(0)
    empty = 0
    while lines:
        if len(lines) < 2:
            return 0
        mp = POS_RE.match(lines[0])
        ml = LIMIT_RE.match(lines[1])
        if not mp or not ml:
            return 0
        empty += int(ml.group(1)) - int(mp.group(1))
        lines.pop(0)
        lines.pop(0)
    return total - empty

def excluded(name):
    for p in EXCLUDE_PREFIXES:
        if name.startswith(p):
            return True
    for s in EXCLUDE_SUFFIXES:
        if name.endswith(s):
            return True
    return False

def make_children(path):
    children = []
    for c in os.listdir(path):
        if excluded(c):
            continue
        try:
            children.append(entry(os.path.join(path, c), c))
        except FileNotFoundError:
            continue
    children.sort(key=lambda c: c["name"])
    return children

def entry(path, name):
    st = os.lstat(path)
    if os.path.isdir(path) and not os.path.islink(path):
        children = make_children(path)
        size = sum(c["size"] for c in children)
        return {"name": name, "size": size, "is_dir": True, "children": children,
                "timestamp_modified": st.st_mtime}
    size = st.st_size
    if TEMP_SUFFIX is not None:
        status_path = path + TEMP_SUFFIX
        if os.path.isfile(status_path):
            with open(status_path, "r") as f:
                size = status_file_size(f.read())
        if name != TEMP_SUFFIX and name.endswith(TEMP_SUFFIX):
            name = name[:-len(TEMP_SUFFIX)]
    return {"name": name, "size": size, "is_dir": False,
            "timestamp_created": st.st_ctime, "timestamp_modified": st.st_mtime}

def main():
    root = sys.argv[1]
    if not os.path.isdir(root):
        print(json.dumps({"error": f"root does not exist or is not a directory: {root}"}))
        return
    print(json.dumps(make_children(root)))

if __name__ == "__main__":
    main()
"#;

const REMOTE_INSTALL_PATH: &str = "/tmp/.rapidcopy_scan.py";

fn python_str_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| format!("{s:?}")).collect();
    format!("[{}]", quoted.join(", "))
}

fn python_optional_str(value: &Option<String>) -> String {
    match value {
        Some(s) => format!("{s:?}"),
        None => "None".to_string(),
    }
}

fn program_digest(program: &str) -> String {
    let digest = Sha256::digest(program.as_bytes());
    hex::encode(digest)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScanOutput {
    Error { error: String },
    Entries(Vec<RemoteEntry>),
}

#[derive(Debug, Deserialize)]
struct RemoteEntry {
    name: String,
    size: u64,
    is_dir: bool,
    timestamp_created: Option<f64>,
    timestamp_modified: Option<f64>,
    #[serde(default)]
    children: Vec<RemoteEntry>,
}

fn from_unix_float(seconds: Option<f64>) -> Option<chrono::DateTime<chrono::Utc>> {
    let seconds = seconds?;
    chrono::DateTime::from_timestamp(seconds.trunc() as i64, (seconds.fract() * 1e9) as u32)
}

fn into_system_file(entry: RemoteEntry, pair: Option<(&str, &str)>) -> SystemFile {
    let mut file = if entry.is_dir {
        SystemFile::new_dir(entry.name, entry.children.into_iter().map(|c| into_system_file(c, pair)).collect())
    } else {
        SystemFile::new_file(entry.name, entry.size)
    };
    file.time_created = from_unix_float(entry.timestamp_created);
    file.time_modified = from_unix_float(entry.timestamp_modified);
    if let Some((id, name)) = pair {
        file = file.with_pair(id, name);
    }
    file
}

pub struct RemoteScanner<E: RemoteExecutor> {
    executor: E,
    root: String,
    pair_id: Option<String>,
    pair_name: Option<String>,
    exclude_prefixes: Vec<String>,
    exclude_suffixes: Vec<String>,
    temp_file_suffix: Option<String>,
}

impl<E: RemoteExecutor> RemoteScanner<E> {
    pub fn new(executor: E, root: impl Into<String>) -> Self {
        RemoteScanner {
            executor,
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

    /// The in-progress download sidecar suffix: a `<name><suffix>`
    /// sibling is read for byte accounting, and a name itself ending in
    /// the suffix has it stripped before being reported.
    pub fn with_temp_file_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.temp_file_suffix = Some(suffix.into());
        self
    }

    fn render_program(&self) -> String {
        SCAN_PROGRAM_TEMPLATE
            .replace("__EXCLUDE_PREFIXES__", &python_str_list(&self.exclude_prefixes))
            .replace("__EXCLUDE_SUFFIXES__", &python_str_list(&self.exclude_suffixes))
            .replace("__TEMP_SUFFIX__", &python_optional_str(&self.temp_file_suffix))
    }

    fn ensure_installed(&self) -> Result<(), RapidCopyError> {
        let program = self.render_program();
        let encoded = base64::engine::general_purpose::STANDARD.encode(program.as_bytes());
        let digest = program_digest(&program);
        let path = shell_quote(REMOTE_INSTALL_PATH);
        let command = format!(
            "([ -f {path} ] && [ \"$(sha256sum {path} 2>/dev/null | cut -d' ' -f1)\" = \"{digest}\" ]) || \
             (echo {encoded} | base64 -d > {path} && chmod +x {path})"
        );
        self.executor.exec(&command).map(|_| ())
    }

    fn run(&self) -> Result<String, RapidCopyError> {
        let command = format!("python3 {} {}", shell_quote(REMOTE_INSTALL_PATH), shell_quote(&self.root));
        self.executor.exec(&command)
    }
}

impl<E: RemoteExecutor> Scanner for RemoteScanner<E> {
    fn scan(&self) -> ScanOutcome {
        self.ensure_installed()?;
        let output = self.run()?;
        let parsed: ScanOutput = serde_json::from_str(output.trim())
            .map_err(|e| RapidCopyError::ScanNonRecoverable(format!("remote scanner output was not valid JSON: {e}")))?;

        match parsed {
            ScanOutput::Error { error } => Err(RapidCopyError::ScanNonRecoverable(format!("remote scanner reported: {error}"))),
            ScanOutput::Entries(entries) => {
                let pair = match (&self.pair_id, &self.pair_name) {
                    (Some(id), Some(name)) => Some((id.as_str(), name.as_str())),
                    _ => None,
                };
                Ok(entries.into_iter().map(|e| into_system_file(e, pair)).collect())
            }
        }
    }
}
