// Line21
// Copyright (c) 2026 The Project Line21 Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The debug sink: one line per recovered row with bytes, parity flags, and interpretation.

use line21_cea608::classify::FrameRows;
use line21_core::errors::Result;

use crate::writer::{OutputTarget, TrackWriter};
use crate::Sink;

pub struct DebugSink {
    out: TrackWriter,
}

impl DebugSink {
    pub fn new(target: &OutputTarget) -> DebugSink {
        DebugSink { out: TrackWriter::new(target, "captions.debug") }
    }
}

impl Sink for DebugSink {
    fn process(&mut self, rows: &FrameRows) -> Result<()> {
        for row in &rows.rows {
            self.out.write_line(&format!(
                "{} {} - bytes: {:#04x} {:#04x} - parity: {} {}: {}",
                rows.frame,
                row.row_index,
                row.byte1,
                row.byte2,
                if row.byte1_parity_ok { "T" } else { "F" },
                if row.byte2_parity_ok { "T" } else { "F" },
                row.content
            ))?;
        }

        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()
    }
}
