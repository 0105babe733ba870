// Line21
// Copyright (c) 2026 The Project Line21 Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Caption buffer rendering.
//!
//! Turns a buffered sequence of rows into displayable text: preamble addresses and carriage
//! returns become line breaks, tab offsets and indents become spaces, and style codes are
//! routed to a [`CaptionStyler`] so markup-producing outputs can emit transitions while plain
//! text drops them.

use bitflags::bitflags;
use log::debug;

use crate::charset;
use crate::classify::{ClassifiedRow, RowContent};
use crate::code::{ChannelCode, ControlCode, PacKind};
use crate::track::TEXT_COLUMNS;

bitflags! {
    /// Character style attributes carried by mid-row and preamble codes.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
    pub struct Styles: u8 {
        const UNDERLINE = 0x01;
        const ITALICS = 0x02;
    }
}

/// Receives the non-character parts of a caption during rendering.
pub trait CaptionStyler {
    /// The token emitted for a line break.
    fn line_break(&self) -> &'static str {
        "\n"
    }

    /// The token emitted for a padding space.
    fn space(&self) -> &'static str {
        " "
    }

    /// Appends one displayed character, escaping it if the output requires.
    fn push_char(&mut self, ch: char, out: &mut String) {
        out.push(ch);
    }

    /// Applies a style-bearing control code. Plain outputs ignore these.
    fn apply_style(&mut self, _code: &ChannelCode, _out: &mut String) {}
}

/// The styler for plain text outputs: no styling, no escaping.
#[derive(Default)]
pub struct PlainStyler;

impl CaptionStyler for PlainStyler {}

/// A rendered caption.
pub struct Rendered {
    pub text: String,
    /// True when the caption contains at least one non-space character.
    pub has_writable: bool,
}

/// Renders a buffered caption to text.
pub fn render_caption<S: CaptionStyler>(rows: &[ClassifiedRow], styler: &mut S) -> Rendered {
    let mut out = String::new();
    let mut has_writable = false;

    // Current cursor row and column, for line-break and tab-cap decisions.
    let mut current_row: Option<u8> = None;
    let mut column = 0usize;

    let mut prev_char: Option<char> = None;
    let mut padded = false;

    for row in rows {
        match row.content {
            RowContent::Control(ref code) => {
                // Style and positioning codes with corrupted parity are ignored outright.
                if !row.parity_ok() {
                    continue;
                }

                match code.code {
                    ControlCode::Preamble(pac) => {
                        // A preamble advancing the cursor row starts a new line.
                        if current_row.map_or(false, |cur| cur < pac.row) {
                            out.push_str(styler.line_break());
                            column = 0;
                        }
                        current_row = Some(pac.row);

                        if let PacKind::Indent(indent) = pac.kind {
                            for _ in 0..indent {
                                out.push_str(styler.space());
                            }
                            column += usize::from(indent);
                        }

                        styler.apply_style(code, &mut out);
                        padded = false;
                    }
                    ControlCode::Command(cmd) => {
                        use crate::code::Command;

                        match cmd {
                            Command::CarriageReturn => {
                                out.push_str(styler.line_break());
                                column = 0;
                                padded = false;
                            }
                            Command::Backspace => {
                                if out.pop().is_some() {
                                    column = column.saturating_sub(1);
                                }
                            }
                            _ => (),
                        }
                    }
                    ControlCode::TabOffset(offset) => {
                        // Tab offsets shall not move the cursor beyond the last column.
                        let offset =
                            usize::from(offset).min(TEXT_COLUMNS.saturating_sub(column));
                        for _ in 0..offset {
                            out.push_str(styler.space());
                        }
                        column += offset;
                    }
                    _ => {
                        styler.apply_style(code, &mut out);
                        padded = false;
                    }
                }
            }
            RowContent::Text(_) => {
                let decoded = charset::decode_pair(row.byte1, row.byte2, false);

                if decoded.is_empty() && (0x10..=0x1f).contains(&row.byte1) {
                    // An unassigned control-range pair: render one collapsed space.
                    debug!("unknown control code [{:02x} {:02x}]", row.byte1, row.byte2);
                    if !padded {
                        out.push_str(styler.space());
                        column += 1;
                        padded = true;
                    }
                    continue;
                }

                for ch in decoded.chars() {
                    // Runs of the error glyph collapse to a single glyph.
                    if ch == charset::ERROR_GLYPH && prev_char == Some(charset::ERROR_GLYPH) {
                        continue;
                    }
                    prev_char = Some(ch);

                    if ch != ' ' {
                        has_writable = true;
                    }

                    styler.push_char(ch, &mut out);
                    column += 1;
                    padded = false;
                }
            }
        }
    }

    Rendered { text: out, has_writable }
}

#[cfg(test)]
mod tests {
    use line21_core::row::DecodedRow;

    use crate::classify::{classify_row, ClassifiedRow};

    use super::{render_caption, PlainStyler};

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

    fn render(rows: &[ClassifiedRow]) -> String {
        render_caption(rows, &mut PlainStyler).text
    }

    #[test]
    fn verify_rows_break_lines() {
        // White row 3, "Hi", white row 4, "Yo".
        let rows =
            [row(0x12, 0x40), row(0x48, 0x69), row(0x12, 0x60), row(0x59, 0x6f)];
        assert_eq!(render(&rows), "Hi\nYo");

        // A repeated preamble for the same row does not break.
        let rows = [row(0x12, 0x40), row(0x12, 0x40), row(0x48, 0x69)];
        assert_eq!(render(&rows), "Hi");

        // A preamble moving up does not break either.
        let rows = [row(0x12, 0x60), row(0x48, 0x69), row(0x12, 0x40), row(0x59, 0x6f)];
        assert_eq!(render(&rows), "HiYo");
    }

    #[test]
    fn verify_carriage_return_and_backspace() {
        let cr = row(0x14, 0x2d);
        let bs = row(0x14, 0x21);

        let rows = [row(0x48, 0x69), cr, row(0x59, 0x6f), bs];
        assert_eq!(render(&rows), "Hi\nY");
    }

    #[test]
    fn verify_indent_and_tab() {
        // Indent 4 row 14, tab offset 2, "Hi".
        let rows = [row(0x14, 0x52), row(0x17, 0x22), row(0x48, 0x69)];
        let rendered = render_caption(&rows, &mut PlainStyler);
        assert_eq!(rendered.text, "      Hi");
        assert!(rendered.has_writable);
    }

    #[test]
    fn verify_error_glyphs_collapse() {
        let rows = [row(0x7f, 0x7f), row(0x7f, 0x48)];
        assert_eq!(render(&rows), "■H");
    }

    #[test]
    fn verify_unknown_control_pairs_collapse_to_one_space() {
        // (0x16, 0x0e) twice decodes to nothing printable; a single pad space is emitted.
        let rows = [row(0x48, 0x69), row(0x16, 0x0e), row(0x16, 0x0e), row(0x59, 0x6f)];
        assert_eq!(render(&rows), "Hi Yo");
    }

    #[test]
    fn verify_style_codes_render_nothing_in_plain_text() {
        let rows = [row(0x11, 0x2e), row(0x48, 0x69), row(0x10, 0x2c)];
        let rendered = render_caption(&rows, &mut PlainStyler);
        assert_eq!(rendered.text, "Hi");
        assert!(rendered.has_writable);
    }
}
