// Line21
// Copyright (c) 2026 The Project Line21 Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The Scenarist Closed Caption (SCC) sink.
//!
//! SCC replays the raw byte pairs: one line per control event, each pair re-encoded with odd
//! parity and stamped with a drop-frame timecode. Pop-on captions accumulate off-screen and are
//! emitted in full on the buffer flip; roll-up and paint-on data is emitted as it arrives.

use std::fmt::Write;

use line21_cea608::classify::{ClassifiedRow, FrameRows};
use line21_cea608::code::ChannelId;
use line21_cea608::demux::{CaptionTrack, TrackDemux};
use line21_cea608::parity::with_odd_parity;
use line21_cea608::track::{CaptionMode, GlobalAction, TrackState};
use line21_core::errors::Result;
use line21_core::units::{DropFrameTimecode, FrameIndex};

use crate::writer::{OutputTarget, TrackWriter};
use crate::Sink;

const SCC_HEADER: &str = "Scenarist_SCC V1.0\n";

/// Formats a frame index as a drop-frame SCC timecode.
pub fn scc_timecode(frame: FrameIndex) -> String {
    let t = DropFrameTimecode::from_frame(frame);
    format!("{:02}:{:02}:{:02};{:02}", t.hours, t.minutes, t.seconds, t.frames)
}

/// Formats rows as odd-parity hex pairs, one trailing space per pair.
fn hex_pairs(rows: &[ClassifiedRow]) -> String {
    let mut out = String::new();
    for row in rows {
        let _ = write!(out, "{:02x}{:02x} ", with_odd_parity(row.byte1), with_odd_parity(row.byte2));
    }
    out
}

pub struct SccSink {
    demux: TrackDemux<SccTrack>,
}

impl SccSink {
    pub fn new(target: &OutputTarget) -> SccSink {
        let target = target.clone();
        SccSink { demux: TrackDemux::new(move |channel| Ok(SccTrack::new(channel, &target))) }
    }
}

impl Sink for SccSink {
    fn process(&mut self, rows: &FrameRows) -> Result<()> {
        self.demux.push_frame(rows)
    }

    fn finish(&mut self) -> Result<()> {
        self.demux.finish()
    }
}

struct SccTrack {
    state: TrackState,
    caption_out: TrackWriter,
    text_out: TrackWriter,
    header_written: bool,
}

impl SccTrack {
    fn new(channel: ChannelId, target: &OutputTarget) -> SccTrack {
        SccTrack {
            state: TrackState::new(channel),
            caption_out: TrackWriter::new(target, format!("{}.scc", channel.caption_name())),
            text_out: TrackWriter::new(target, format!("{}.scc", channel.text_name())),
            header_written: false,
        }
    }

    fn write_caption(&mut self, rows: &[ClassifiedRow], frame: FrameIndex) -> Result<()> {
        if !self.header_written {
            self.caption_out.write_line(SCC_HEADER)?;
            self.header_written = true;
        }

        self.caption_out.write_line(&format!("{}\t{}", scc_timecode(frame), hex_pairs(rows)))
    }

    fn write_text(&mut self, rows: &[ClassifiedRow], frame: FrameIndex) -> Result<()> {
        self.text_out.write_line(&format!("{}\t{}", scc_timecode(frame), hex_pairs(rows)))
    }

    fn write_displayed(&mut self, frame: FrameIndex) -> Result<()> {
        let displayed = self.state.displayed.clone();
        self.write_caption(&displayed, frame)
    }
}

impl CaptionTrack for SccTrack {
    fn push(&mut self, row: &ClassifiedRow, frame: FrameIndex) -> Result<()> {
        match self.state.process(row) {
            GlobalAction::Skip | GlobalAction::Duplicate | GlobalAction::EraseNonDisplayed => (),
            GlobalAction::ResumeCaptionLoading => {
                // The loading command itself is replayed ahead of the caption bytes.
                self.state.push_non_displayed(row);
            }
            GlobalAction::ResumeDirectCaptioning => {
                self.state.push_displayed(row);
                self.write_displayed(frame)?;
            }
            GlobalAction::StartRollUp { .. } => {
                self.write_caption(&[row.clone()], frame)?;
            }
            GlobalAction::ResumeTextDisplay => {
                self.write_text(&[row.clone()], frame)?;
            }
            GlobalAction::TextRestart => {
                self.state.text_insert(row);
                self.state.clear_text();
            }
            GlobalAction::FlipBuffers => {
                self.state.push_displayed(row);
                self.write_displayed(frame)?;
            }
            GlobalAction::EraseDisplayed { .. } => {
                // Replay the clear-screen command.
                self.write_caption(&[row.clone()], frame)?;
            }
            GlobalAction::NotGlobal { .. } => match self.state.mode {
                CaptionMode::PopOn => self.state.push_non_displayed(row),
                CaptionMode::PaintOn => {
                    self.state.push_displayed(row);
                    self.write_displayed(frame)?;
                }
                CaptionMode::RollUp => {
                    self.write_caption(&[row.clone()], frame)?;
                }
                CaptionMode::Text => {
                    self.state.text_insert(row);
                    if row.is_carriage_return() {
                        let flushed = self.state.take_text();
                        self.write_text(&flushed, frame)?;
                    }
                }
            },
        }

        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.caption_out.flush()?;
        self.text_out.flush()
    }
}

#[cfg(test)]
mod tests {
    use line21_cea608::classify::{classify_row, ClassifiedRow, RowContent};
    use line21_cea608::code::ChannelId;
    use line21_cea608::demux::CaptionTrack;
    use line21_core::row::DecodedRow;

    use crate::writer::OutputTarget;

    use super::{scc_timecode, SccTrack};

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
    fn verify_timecode_format() {
        assert_eq!(scc_timecode(0), "00:00:00;00");
        assert_eq!(scc_timecode(1800), "00:01:00;02");
        assert_eq!(scc_timecode(17982), "00:10:00;00");
    }

    #[test]
    fn verify_pop_on_event_lines() {
        let dir = std::env::temp_dir().join("line21-scc-test");
        std::fs::create_dir_all(&dir).unwrap();
        let base = dir.join("popon");
        let path = dir.join("popon.CC1.scc");
        let _ = std::fs::remove_file(&path);

        let target = OutputTarget::File(base);
        let mut track = SccTrack::new(ChannelId::Cc1, &target);

        track.push(&row(0x14, 0x20), 100).unwrap();
        track.push(&row(0x48, 0x69), 101).unwrap();
        track.push(&row(0x14, 0x2f), 102).unwrap();
        track.finish().unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let mut lines = written.lines();

        assert_eq!(lines.next(), Some("Scenarist_SCC V1.0"));
        assert_eq!(lines.next(), Some(""));

        // The flip replays the loading command, the text, and the flip itself with odd parity
        // restored: 0x14 -> 0x94, 0x48 -> 0xc8, 0x69 -> 0xe9, 0x20 and 0x2f are odd already.
        let event = lines.next().unwrap();
        assert!(event.starts_with("00:00:03;12\t"), "{}", event);
        assert_eq!(event.split('\t').nth(1), Some("9420 c8e9 942f "));

        let _ = std::fs::remove_file(&path);
    }

    /// Parsing an SCC event line back through the classifier reproduces the original
    /// semantics.
    #[test]
    fn verify_hex_round_trip() {
        let rows = [row(0x14, 0x20), row(0x48, 0x69)];
        let hex = super::hex_pairs(&rows);

        for (pair, original) in hex.split_whitespace().zip(&rows) {
            let b1 = u8::from_str_radix(&pair[0..2], 16).unwrap() & 0x7f;
            let b2 = u8::from_str_radix(&pair[2..4], 16).unwrap() & 0x7f;

            let reparsed = classify_row(DecodedRow {
                row_index: 21,
                byte1: b1,
                byte1_parity_ok: true,
                byte2: b2,
                byte2_parity_ok: true,
            })
            .unwrap();

            match (&reparsed.content, &original.content) {
                (RowContent::Control(a), RowContent::Control(b)) => assert_eq!(a, b),
                (RowContent::Text(a), RowContent::Text(b)) => assert_eq!(a, b),
                _ => panic!("classification changed across the hex round trip"),
            }
        }
    }
}
