// Line21
// Copyright (c) 2026 The Project Line21 Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decode progress reporting on standard error.

use std::io::Write;
use std::time::Instant;

use line21_cea608::classify::FrameRows;
use line21_core::units::NTSC_FRAME_RATE;

/// Renders a single updating status line: frame number, cumulative code count, decode rate
/// relative to realtime, and the bytes of the latest recovered rows.
pub struct StatusReporter {
    last_len: usize,
    code_count: u64,
    rate: f64,
    rate_mark: Instant,
    rate_frame: u64,
}

impl StatusReporter {
    pub fn new() -> StatusReporter {
        StatusReporter {
            last_len: 0,
            code_count: 0,
            rate: 0.0,
            rate_mark: Instant::now(),
            rate_frame: 0,
        }
    }

    pub fn update(&mut self, rows: &FrameRows) {
        let elapsed = self.rate_mark.elapsed().as_secs_f64();
        if elapsed >= 1.0 {
            self.rate =
                (rows.frame - self.rate_frame) as f64 / NTSC_FRAME_RATE / elapsed;
            self.rate_frame = rows.frame;
            self.rate_mark = Instant::now();
        }

        let mut message = format!(
            "Frame: {} | Code Count: {} | Rate: {:.2}x",
            rows.frame, self.code_count, self.rate
        );

        for row in &rows.rows {
            message.push_str(&format!(
                " | Line: {} | Control: {} | Byte1: {:#04x} | Byte2: {:#04x} | {}",
                row.row_index,
                if row.is_control() { "True " } else { "False" },
                row.byte1,
                row.byte2,
                row.content
            ));
            self.code_count += 1;
        }

        // Blank out the previous line before redrawing a shorter one.
        let stderr = std::io::stderr();
        let mut out = stderr.lock();
        let _ = write!(out, "\r{:width$}\r{}", "", message, width = self.last_len);
        let _ = out.flush();

        self.last_len = message.len();
    }

    pub fn done(&mut self) {
        eprintln!();
    }
}

impl Default for StatusReporter {
    fn default() -> Self {
        StatusReporter::new()
    }
}
