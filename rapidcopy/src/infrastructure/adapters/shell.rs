// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Single-quote escaping shared by the remote adapters that build shell
//! command strings to run over an SSH session.

/// Wraps `s` in single quotes, escaping any single quote it contains as
/// `'\''` — the standard POSIX-shell trick for embedding one literal
/// quote inside a single-quoted string.
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_plain_paths() {
        assert_eq!(shell_quote("/data/a.bin"), "'/data/a.bin'");
    }

    #[test]
    fn escapes_embedded_quotes() {
        assert_eq!(shell_quote("it's.bin"), "'it'\\''s.bin'");
    }
}
