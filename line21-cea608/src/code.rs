// Line21
// Copyright (c) 2026 The Project Line21 Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The symbolic CEA-608 control-code model.
//!
//! Control codes occupy byte pairs with byte 1 in `0x10..=0x1F`. The lower bank
//! (`0x10..=0x17`) carries the field-one channels CC1/CC2, the upper bank (`0x18..=0x1F`) the
//! field-two channels CC3/CC4; within a bank the two command prefixes select the primary or
//! secondary channel. Codes are parsed into symbolic values; the human-readable labels used by
//! the raw and debug outputs are produced by the `Display` implementations.

use std::fmt;

/// One of the two interlaced fields of a frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    One,
    Two,
}

impl Field {
    pub fn index(&self) -> usize {
        match *self {
            Field::One => 0,
            Field::Two => 1,
        }
    }
}

/// A logical caption channel.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChannelId {
    Cc1,
    Cc2,
    Cc3,
    Cc4,
}

impl ChannelId {
    /// The field this channel is multiplexed onto.
    pub fn field(&self) -> Field {
        match *self {
            ChannelId::Cc1 | ChannelId::Cc2 => Field::One,
            ChannelId::Cc3 | ChannelId::Cc4 => Field::Two,
        }
    }

    /// The caption-mode name of this channel.
    pub fn caption_name(&self) -> &'static str {
        match *self {
            ChannelId::Cc1 => "CC1",
            ChannelId::Cc2 => "CC2",
            ChannelId::Cc3 => "CC3",
            ChannelId::Cc4 => "CC4",
        }
    }

    /// The text-mode name of this channel.
    pub fn text_name(&self) -> &'static str {
        match *self {
            ChannelId::Cc1 => "T1",
            ChannelId::Cc2 => "T2",
            ChannelId::Cc3 => "T3",
            ChannelId::Cc4 => "T4",
        }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.caption_name())
    }
}

/// A caption color.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Color {
    White,
    Green,
    Blue,
    Cyan,
    Red,
    Yellow,
    Magenta,
    Black,
}

impl Color {
    pub fn name(&self) -> &'static str {
        match *self {
            Color::White => "White",
            Color::Green => "Green",
            Color::Blue => "Blue",
            Color::Cyan => "Cyan",
            Color::Red => "Red",
            Color::Yellow => "Yellow",
            Color::Magenta => "Magenta",
            Color::Black => "Black",
        }
    }

    /// The lowercase name used for style-sheet classes.
    pub fn css_name(&self) -> &'static str {
        match *self {
            Color::White => "white",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Cyan => "cyan",
            Color::Red => "red",
            Color::Yellow => "yellow",
            Color::Magenta => "magenta",
            Color::Black => "black",
        }
    }
}

const COLORS: [Color; 8] = [
    Color::White,
    Color::Green,
    Color::Blue,
    Color::Cyan,
    Color::Red,
    Color::Yellow,
    Color::Magenta,
    Color::Black,
];

/// A miscellaneous control command.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    ResumeCaptionLoading,
    Backspace,
    AlarmOff,
    AlarmOn,
    DeleteToEndOfRow,
    /// Starts roll-up captioning with the given number of rows (2, 3, or 4).
    RollUp(u8),
    FlashOn,
    ResumeDirectCaptioning,
    TextRestart,
    ResumeTextDisplay,
    EraseDisplayedMemory,
    CarriageReturn,
    EraseNonDisplayedMemory,
    EndOfCaption,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match *self {
            Command::ResumeCaptionLoading => "Resume Caption Loading",
            Command::Backspace => "Backspace",
            Command::AlarmOff => "Reserved (Alarm Off)",
            Command::AlarmOn => "Reserved (Alarm On)",
            Command::DeleteToEndOfRow => "Delete to End Of Row",
            Command::RollUp(rows) => {
                return write!(f, "Roll-Up Captions-{} Rows", rows);
            }
            Command::FlashOn => "Flash On",
            Command::ResumeDirectCaptioning => "Resume Direct Captioning",
            Command::TextRestart => "Text Restart",
            Command::ResumeTextDisplay => "Resume Text Display",
            Command::EraseDisplayedMemory => "Erase Displayed Memory",
            Command::CarriageReturn => "Carriage Return",
            Command::EraseNonDisplayedMemory => "Erase Non-Displayed Memory",
            Command::EndOfCaption => "End of Caption (flip memory)",
        };
        f.write_str(label)
    }
}

/// A mid-row style change.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MidRowStyle {
    Color(Color),
    Italics,
}

/// The styling or positioning part of a preamble address code.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PacKind {
    Color(Color),
    WhiteItalics,
    /// Indent to the given column (0, 4, 8, ... 28).
    Indent(u8),
}

/// A preamble address code: cursor row plus styling or indent.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PreambleAddress {
    /// The caption row, 1 to 15.
    pub row: u8,
    pub kind: PacKind,
    pub underline: bool,
}

/// A parsed control code.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ControlCode {
    Command(Command),
    /// Tab offset of 1 to 3 columns.
    TabOffset(u8),
    MidRow { style: MidRowStyle, underline: bool },
    Preamble(PreambleAddress),
    Background { color: Color, semi_transparent: bool },
    BackgroundTransparent,
    ForegroundBlack { underline: bool },
}

/// A control code together with the channel it addresses.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChannelCode {
    pub channel: ChannelId,
    pub code: ControlCode,
}

impl ChannelCode {
    pub fn command(&self) -> Option<Command> {
        match self.code {
            ControlCode::Command(cmd) => Some(cmd),
            _ => None,
        }
    }

    pub fn is_carriage_return(&self) -> bool {
        self.command() == Some(Command::CarriageReturn)
    }
}

/// Parses a byte pair as a control code.
///
/// Returns `None` for printable pairs and for the `0x2x`/`0x3x` ranges claimed by the special
/// and extended character sets.
pub fn parse(byte1: u8, byte2: u8) -> Option<ChannelCode> {
    if byte1 < 0x10 || byte1 > 0x1f || byte2 < 0x20 {
        return None;
    }

    // Fold the upper bank onto the lower; the bank selects the field.
    let upper_bank = byte1 >= 0x18;
    let base1 = if upper_bank { byte1 - 8 } else { byte1 };

    // Bank-only codes are attributed to the bank's primary channel.
    let primary = if upper_bank { ChannelId::Cc3 } else { ChannelId::Cc1 };

    let code = match (base1, byte2) {
        (0x14 | 0x15, 0x20..=0x2f) => {
            let channel = match (base1, upper_bank) {
                (0x14, false) => ChannelId::Cc1,
                (0x15, false) => ChannelId::Cc2,
                (0x14, true) => ChannelId::Cc3,
                _ => ChannelId::Cc4,
            };

            const COMMANDS: [Command; 16] = [
                Command::ResumeCaptionLoading,
                Command::Backspace,
                Command::AlarmOff,
                Command::AlarmOn,
                Command::DeleteToEndOfRow,
                Command::RollUp(2),
                Command::RollUp(3),
                Command::RollUp(4),
                Command::FlashOn,
                Command::ResumeDirectCaptioning,
                Command::TextRestart,
                Command::ResumeTextDisplay,
                Command::EraseDisplayedMemory,
                Command::CarriageReturn,
                Command::EraseNonDisplayedMemory,
                Command::EndOfCaption,
            ];

            let command = COMMANDS[usize::from(byte2 - 0x20)];

            return Some(ChannelCode { channel, code: ControlCode::Command(command) });
        }
        (0x17, 0x21..=0x23) => ControlCode::TabOffset(byte2 - 0x20),
        (0x17, 0x2d) => ControlCode::BackgroundTransparent,
        (0x17, 0x2e) => ControlCode::ForegroundBlack { underline: false },
        (0x17, 0x2f) => ControlCode::ForegroundBlack { underline: true },
        (0x10, 0x20..=0x2f) => {
            // 0x23 repeats semi-transparent white rather than pairing with green.
            let color = if byte2 == 0x23 { Color::White } else { COLORS[usize::from(byte2 - 0x20) >> 1] };
            ControlCode::Background { color, semi_transparent: byte2 & 1 == 1 }
        }
        (0x11, 0x20..=0x2f) => {
            let style = match (byte2 - 0x20) >> 1 {
                7 => MidRowStyle::Italics,
                n => MidRowStyle::Color(COLORS[usize::from(n)]),
            };
            ControlCode::MidRow { style, underline: byte2 & 1 == 1 }
        }
        (_, 0x40..=0x7f) => ControlCode::Preamble(parse_preamble(base1, byte2)?),
        _ => return None,
    };

    Some(ChannelCode { channel: primary, code })
}

fn parse_preamble(base1: u8, byte2: u8) -> Option<PreambleAddress> {
    // Each prefix byte addresses a pair of rows; the lower half of the byte-2 range selects the
    // first row of the pair, the upper half the second. The cadence changes at row 11, which
    // only has a lower half.
    let second = byte2 >= 0x60;

    let row = match (base1, second) {
        (0x11, false) => 1,
        (0x11, true) => 2,
        (0x12, false) => 3,
        (0x12, true) => 4,
        (0x15, false) => 5,
        (0x15, true) => 6,
        (0x16, false) => 7,
        (0x16, true) => 8,
        (0x17, false) => 9,
        (0x17, true) => 10,
        (0x10, false) => 11,
        (0x13, false) => 12,
        (0x13, true) => 13,
        (0x14, false) => 14,
        (0x14, true) => 15,
        _ => return None,
    };

    let base = if second { byte2 - 0x60 } else { byte2 - 0x40 };

    let kind = match base >> 1 {
        n @ 0..=6 => PacKind::Color(COLORS[usize::from(n)]),
        7 => PacKind::WhiteItalics,
        n => PacKind::Indent((n - 8) * 4),
    };

    Some(PreambleAddress { row, kind, underline: base & 1 == 1 })
}

impl fmt::Display for ControlCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ControlCode::Command(cmd) => write!(f, "{}", cmd),
            ControlCode::TabOffset(n) => write!(f, "Tab Offset {}", n),
            ControlCode::MidRow { style, underline } => {
                match style {
                    MidRowStyle::Color(color) => write!(f, "Mid-row: {}", color.name())?,
                    MidRowStyle::Italics => write!(f, "Mid-row: Italics")?,
                }
                if underline {
                    write!(f, " Underline")?;
                }
                Ok(())
            }
            ControlCode::Preamble(pac) => {
                match pac.kind {
                    PacKind::Color(color) => write!(f, "Pre: {}", color.name())?,
                    PacKind::WhiteItalics => write!(f, "Pre: White Italics")?,
                    PacKind::Indent(n) => write!(f, "Pre: Indent {}", n)?,
                }
                if pac.underline {
                    write!(f, " Underline")?;
                }
                write!(f, " row {}", pac.row)
            }
            ControlCode::Background { color, semi_transparent } => {
                if semi_transparent {
                    write!(f, "Background Semi-Transparent {}", color.name())
                }
                else {
                    write!(f, "Background {}", color.name())
                }
            }
            ControlCode::BackgroundTransparent => write!(f, "Background Transparent"),
            ControlCode::ForegroundBlack { underline } => {
                if underline {
                    write!(f, "Foreground Black Underline")
                }
                else {
                    write!(f, "Foreground Black")
                }
            }
        }
    }
}

impl fmt::Display for ChannelCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.channel, self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_command_parsing() {
        let code = parse(0x14, 0x20).unwrap();
        assert_eq!(code.channel, ChannelId::Cc1);
        assert_eq!(code.command(), Some(Command::ResumeCaptionLoading));
        assert_eq!(code.to_string(), "CC1 Resume Caption Loading");

        // The secondary command prefix of the lower bank is CC2.
        let code = parse(0x15, 0x2d).unwrap();
        assert_eq!(code.channel, ChannelId::Cc2);
        assert!(code.is_carriage_return());

        // The upper bank maps onto CC3/CC4 and field two.
        let code = parse(0x1c, 0x20).unwrap();
        assert_eq!(code.channel, ChannelId::Cc3);
        assert_eq!(code.channel.field(), Field::Two);
        assert_eq!(code.to_string(), "CC3 Resume Caption Loading");

        let code = parse(0x1d, 0x2f).unwrap();
        assert_eq!(code.channel, ChannelId::Cc4);
        assert_eq!(code.command(), Some(Command::EndOfCaption));
    }

    #[test]
    fn verify_preamble_parsing() {
        // White, row 3.
        let code = parse(0x12, 0x40).unwrap();
        assert_eq!(code.to_string(), "CC1 Pre: White row 3");

        // Indent 4, row 14.
        let code = parse(0x14, 0x52).unwrap();
        assert_eq!(
            code.code,
            ControlCode::Preamble(PreambleAddress {
                row: 14,
                kind: PacKind::Indent(4),
                underline: false
            })
        );

        // Row 11 only has a lower half.
        assert_eq!(parse(0x10, 0x40).unwrap().to_string(), "CC1 Pre: White row 11");
        assert!(parse(0x10, 0x60).is_none());

        // Upper-bank preambles carry the CC3 prefix.
        assert_eq!(parse(0x19, 0x6e).unwrap().to_string(), "CC3 Pre: White Italics row 2");
        assert_eq!(parse(0x1f, 0x7f).unwrap().to_string(), "CC3 Pre: Indent 28 Underline row 10");
    }

    #[test]
    fn verify_style_code_parsing() {
        assert_eq!(parse(0x11, 0x2e).unwrap().to_string(), "CC1 Mid-row: Italics");
        assert_eq!(parse(0x19, 0x21).unwrap().to_string(), "CC3 Mid-row: White Underline");
        assert_eq!(parse(0x10, 0x2c).unwrap().to_string(), "CC1 Background Magenta");
        assert_eq!(parse(0x17, 0x2d).unwrap().to_string(), "CC1 Background Transparent");
        assert_eq!(parse(0x17, 0x21).unwrap().to_string(), "CC1 Tab Offset 1");

        // Both 0x21 and 0x23 mean semi-transparent white.
        assert_eq!(parse(0x10, 0x21).unwrap().code, parse(0x10, 0x23).unwrap().code);
    }

    #[test]
    fn verify_printable_pairs_are_not_control() {
        assert!(parse(0x48, 0x69).is_none());
        // Special and extended character ranges.
        assert!(parse(0x11, 0x30).is_none());
        assert!(parse(0x12, 0x20).is_none());
        assert!(parse(0x13, 0x3f).is_none());
        // Unassigned control-range pairs.
        assert!(parse(0x16, 0x20).is_none());
    }
}
