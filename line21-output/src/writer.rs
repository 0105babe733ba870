// Line21
// Copyright (c) 2026 The Project Line21 Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lazily opened per-track output writers.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use log::debug;

use line21_core::errors::Result;

/// Where a sink writes its output.
#[derive(Clone, Debug)]
pub enum OutputTarget {
    /// Files named `<base>.<extension>` next to each other.
    File(PathBuf),
    /// Everything to standard output.
    Stdout,
}

/// A lazily created line-oriented writer for one output file.
///
/// Channels that never produce output never create their file: the file is only opened on the
/// first written line.
pub struct TrackWriter {
    target: OutputTarget,
    extension: String,
    out: Option<Box<dyn Write + Send>>,
}

impl TrackWriter {
    pub fn new(target: &OutputTarget, extension: impl Into<String>) -> TrackWriter {
        TrackWriter { target: target.clone(), extension: extension.into(), out: None }
    }

    /// True once the underlying file has been created.
    pub fn is_open(&self) -> bool {
        self.out.is_some()
    }

    fn ensure_open(&mut self) -> Result<&mut (dyn Write + Send)> {
        if self.out.is_none() {
            let out: Box<dyn Write + Send> = match self.target {
                OutputTarget::File(ref base) => {
                    let mut path = base.clone().into_os_string();
                    path.push(".");
                    path.push(&self.extension);

                    debug!("creating output file {:?}", path);
                    Box::new(BufWriter::new(File::create(PathBuf::from(path))?))
                }
                OutputTarget::Stdout => Box::new(io::stdout()),
            };
            self.out = Some(out);
        }

        Ok(self.out.as_mut().unwrap().as_mut())
    }

    /// Writes one line, appending the line terminator.
    pub fn write_line(&mut self, line: &str) -> Result<()> {
        let out = self.ensure_open()?;
        out.write_all(line.as_bytes())?;
        out.write_all(b"\n")?;
        Ok(())
    }

    /// Flushes any buffered output.
    pub fn flush(&mut self) -> Result<()> {
        if let Some(out) = self.out.as_mut() {
            out.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{OutputTarget, TrackWriter};

    #[test]
    fn verify_lazy_creation() {
        let dir = std::env::temp_dir().join("line21-writer-test");
        std::fs::create_dir_all(&dir).unwrap();

        let base: PathBuf = dir.join("out");
        let target = OutputTarget::File(base.clone());

        let mut writer = TrackWriter::new(&target, "CC1.srt");
        let path = dir.join("out.CC1.srt");
        let _ = std::fs::remove_file(&path);

        assert!(!writer.is_open());
        assert!(!path.exists());

        writer.write_line("1").unwrap();
        writer.flush().unwrap();

        assert!(writer.is_open());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1\n");

        let _ = std::fs::remove_file(&path);
    }
}
