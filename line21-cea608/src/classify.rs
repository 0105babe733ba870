// Line21
// Copyright (c) 2026 The Project Line21 Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Row classification.
//!
//! Classification decides whether a recovered byte pair is a control code or printable text,
//! and applies the parity policy of 47 CFR 79.101: a control code with a corrupt second byte is
//! dropped outright, while corrupt printable bytes are replaced with the solid-block error
//! glyph so the viewer sees that something was there.

use std::fmt;

use smallvec::SmallVec;

use line21_core::row::DecodedRow;
use line21_core::units::FrameIndex;

use crate::charset;
use crate::code::{self, ChannelCode};

/// The decoded interpretation of a byte pair.
#[derive(Clone, Debug, PartialEq)]
pub enum RowContent {
    /// A control code.
    Control(ChannelCode),
    /// Printable characters (possibly empty for null pairs).
    Text(String),
}

impl fmt::Display for RowContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RowContent::Control(ref code) => write!(f, "{}", code),
            RowContent::Text(ref text) => f.write_str(text),
        }
    }
}

/// A decoded row together with its classification.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassifiedRow {
    pub row_index: u16,
    pub byte1: u8,
    pub byte1_parity_ok: bool,
    pub byte2: u8,
    pub byte2_parity_ok: bool,
    pub content: RowContent,
}

impl ClassifiedRow {
    pub fn is_control(&self) -> bool {
        matches!(self.content, RowContent::Control(_))
    }

    pub fn channel_code(&self) -> Option<&ChannelCode> {
        match self.content {
            RowContent::Control(ref code) => Some(code),
            RowContent::Text(_) => None,
        }
    }

    pub fn is_carriage_return(&self) -> bool {
        self.channel_code().map_or(false, |code| code.is_carriage_return())
    }

    pub fn parity_ok(&self) -> bool {
        self.byte1_parity_ok && self.byte2_parity_ok
    }

    pub fn is_stuffing(&self) -> bool {
        self.byte1 == 0 && self.byte2 == 0
    }
}

/// Classifies a decoded row, applying the parity policy.
///
/// Returns `None` when the row must be dropped (a control code whose second byte failed
/// parity).
pub fn classify_row(row: DecodedRow) -> Option<ClassifiedRow> {
    let mut byte1 = row.byte1;
    let mut byte2 = row.byte2;

    let mut control = code::parse(byte1, byte2);

    if !row.byte2_parity_ok {
        if control.is_some() {
            return None;
        }
        byte2 = 0x7f;
    }

    if !row.byte1_parity_ok {
        // A corrupt first byte cannot be trusted to address a channel; demote to text.
        control = None;
        byte1 = 0x7f;
    }

    let content = match control {
        Some(code) => RowContent::Control(code),
        None => RowContent::Text(charset::decode_pair(byte1, byte2, true)),
    };

    Some(ClassifiedRow {
        row_index: row.row_index,
        byte1,
        byte1_parity_ok: row.byte1_parity_ok,
        byte2,
        byte2_parity_ok: row.byte2_parity_ok,
        content,
    })
}

/// The classified rows of one frame; at most two in normal operation, one per field.
#[derive(Clone, Debug)]
pub struct FrameRows {
    pub frame: FrameIndex,
    pub rows: SmallVec<[ClassifiedRow; 2]>,
}

impl FrameRows {
    pub fn new(frame: FrameIndex) -> FrameRows {
        FrameRows { frame, rows: SmallVec::new() }
    }
}

#[cfg(test)]
mod tests {
    use line21_core::row::DecodedRow;

    use super::{classify_row, RowContent};

    fn row(byte1: u8, byte2: u8, p1: bool, p2: bool) -> DecodedRow {
        DecodedRow { row_index: 21, byte1, byte1_parity_ok: p1, byte2, byte2_parity_ok: p2 }
    }

    #[test]
    fn verify_control_classification() {
        let classified = classify_row(row(0x14, 0x20, true, true)).unwrap();
        assert!(classified.is_control());
        assert_eq!(classified.content.to_string(), "CC1 Resume Caption Loading");
    }

    #[test]
    fn verify_text_classification() {
        let classified = classify_row(row(0x48, 0x69, true, true)).unwrap();
        assert!(!classified.is_control());
        assert_eq!(classified.content, RowContent::Text("Hi".to_string()));
    }

    #[test]
    fn verify_control_with_bad_second_byte_is_dropped() {
        assert!(classify_row(row(0x14, 0x20, true, false)).is_none());
    }

    #[test]
    fn verify_text_with_bad_second_byte_gets_error_glyph() {
        let classified = classify_row(row(0x48, 0x69, true, false)).unwrap();
        assert_eq!(classified.byte2, 0x7f);
        assert_eq!(classified.content, RowContent::Text("H■".to_string()));
    }

    #[test]
    fn verify_bad_first_byte_demotes_control_to_text() {
        // Without trustworthy channel addressing the pair must not act as a control code.
        let classified = classify_row(row(0x14, 0x20, false, true)).unwrap();
        assert!(!classified.is_control());
        assert_eq!(classified.byte1, 0x7f);
        assert_eq!(classified.content, RowContent::Text("■ ".to_string()));
    }
}
