// Line21
// Copyright (c) 2026 The Project Line21 Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The XDS sink: one human-readable line per reassembled packet.

use line21_cea608::classify::FrameRows;
use line21_cea608::xds::XdsDecoder;
use line21_core::errors::Result;

use crate::writer::{OutputTarget, TrackWriter};
use crate::Sink;

pub struct XdsSink {
    decoder: XdsDecoder,
    out: TrackWriter,
}

impl XdsSink {
    pub fn new(target: &OutputTarget) -> XdsSink {
        XdsSink { decoder: XdsDecoder::new(), out: TrackWriter::new(target, "xds") }
    }
}

impl Sink for XdsSink {
    fn process(&mut self, rows: &FrameRows) -> Result<()> {
        if let Some(description) = self.decoder.push_frame(rows) {
            // Frame numbers in the XDS log are 1-based.
            self.out.write_line(&format!("{}: {}", rows.frame + 1, description))?;
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

    use super::XdsSink;

    fn row(byte1: u8, byte2: u8) -> ClassifiedRow {
        classify_row(DecodedRow {
            row_index: 284,
            byte1,
            byte1_parity_ok: true,
            byte2,
            byte2_parity_ok: true,
        })
        .unwrap()
    }

    #[test]
    fn verify_packet_lines() {
        let dir = std::env::temp_dir().join("line21-xds-test");
        std::fs::create_dir_all(&dir).unwrap();
        let base = dir.join("xds");
        let path = dir.join("xds.xds");
        let _ = std::fs::remove_file(&path);

        let mut sink = XdsSink::new(&OutputTarget::File(base));

        // "NEWS" program name, one pair per frame.
        let pairs = [(0x01, 0x03), (0x4e, 0x45), (0x57, 0x53), (0x0f, 0x30)];
        for (frame, &(b1, b2)) in pairs.iter().enumerate() {
            let rows = FrameRows { frame: frame as u64, rows: smallvec![row(b1, b2)] };
            sink.process(&rows).unwrap();
        }
        sink.finish().unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "4: XDS Current Program Name: NEWS\n"
        );

        let _ = std::fs::remove_file(&path);
    }
}
