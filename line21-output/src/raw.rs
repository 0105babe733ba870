// Line21
// Copyright (c) 2026 The Project Line21 Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The raw sink: undemultiplexed text runs and control codes with frame and scanline indices.

use line21_cea608::classify::{FrameRows, RowContent};
use line21_core::errors::Result;

use crate::writer::{OutputTarget, TrackWriter};
use crate::Sink;

pub struct RawSink {
    out: TrackWriter,
    buffer: String,
}

impl RawSink {
    pub fn new(target: &OutputTarget) -> RawSink {
        RawSink { out: TrackWriter::new(target, "captions.raw"), buffer: String::new() }
    }
}

impl Sink for RawSink {
    fn process(&mut self, rows: &FrameRows) -> Result<()> {
        for row in &rows.rows {
            match row.content {
                RowContent::Text(ref text) if !text.is_empty() => {
                    self.buffer.push_str(text);
                }
                _ => {
                    if !self.buffer.is_empty() {
                        self.out.write_line(&format!(
                            "{} {} - [{:02x}, {:02x}] - Text:{}",
                            rows.frame, row.row_index, row.byte1, row.byte2, self.buffer
                        ))?;
                        self.buffer.clear();
                    }
                }
            }

            if let RowContent::Control(ref code) = row.content {
                self.out.write_line(&format!(
                    "{} {} - [{:02x}, {:02x}] - {}",
                    rows.frame, row.row_index, row.byte1, row.byte2, code
                ))?;
            }
        }

        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;

    use line21_cea608::classify::{classify_row, ClassifiedRow, FrameRows};
    use line21_core::row::DecodedRow;

    use crate::writer::OutputTarget;
    use crate::Sink;

    use super::RawSink;

    fn row(byte1: u8, byte2: u8) -> ClassifiedRow {
        classify_row(DecodedRow {
            row_index: 21,
            byte1,
            byte1_parity_ok: true,
            byte2,
            byte2_parity_ok: true,
        })
        .unwrap()
    }

    #[test]
    fn verify_text_runs_and_controls() {
        let dir = std::env::temp_dir().join("line21-raw-test");
        std::fs::create_dir_all(&dir).unwrap();
        let base = dir.join("raw");
        let path = dir.join("raw.captions.raw");
        let _ = std::fs::remove_file(&path);

        let mut sink = RawSink::new(&OutputTarget::File(base));

        for (frame, b1, b2) in [(0u64, 0x48, 0x69), (1, 0x21, 0x21), (2, 0x14, 0x2c)] {
            let rows = FrameRows { frame, rows: smallvec![row(b1, b2)] };
            sink.process(&rows).unwrap();
        }
        sink.finish().unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = written.lines().collect();

        // The text run flushes when the control row arrives, then the control is logged.
        assert_eq!(lines, [
            "2 21 - [14, 2c] - Text:Hi!!",
            "2 21 - [14, 2c] - CC1 Erase Displayed Memory",
        ]);

        let _ = std::fs::remove_file(&path);
    }
}
