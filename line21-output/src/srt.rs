// Line21
// Copyright (c) 2026 The Project Line21 Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The SubRip (SRT) sink.
//!
//! Captions become numbered entries spanning from the control code that started the caption
//! (Resume Direct Captioning, End of Caption, or a roll-up start) to the erase that removed it.
//! Text-mode channels are written to their own `.T<n>.srt` files, flushed per line.

use line21_cea608::classify::{ClassifiedRow, FrameRows};
use line21_cea608::code::ChannelId;
use line21_cea608::demux::{CaptionTrack, TrackDemux};
use line21_cea608::render::{render_caption, PlainStyler};
use line21_cea608::track::{CaptionMode, GlobalAction, TrackState};
use line21_core::errors::Result;
use line21_core::units::{FrameIndex, WallTime};

use crate::writer::{OutputTarget, TrackWriter};
use crate::Sink;

/// Formats a frame index as an SRT timestamp.
pub fn srt_timecode(frame: FrameIndex) -> String {
    let t = WallTime::from_frame(frame);
    format!("{:02}:{:02}:{:02},{:03}", t.hours, t.minutes, t.seconds, t.milliseconds)
}

pub struct SrtSink {
    demux: TrackDemux<SrtTrack>,
}

impl SrtSink {
    pub fn new(target: &OutputTarget) -> SrtSink {
        let target = target.clone();
        SrtSink { demux: TrackDemux::new(move |channel| Ok(SrtTrack::new(channel, &target))) }
    }
}

impl Sink for SrtSink {
    fn process(&mut self, rows: &FrameRows) -> Result<()> {
        self.demux.push_frame(rows)
    }

    fn finish(&mut self) -> Result<()> {
        self.demux.finish()
    }
}

struct SrtTrack {
    state: TrackState,
    caption_out: TrackWriter,
    text_out: TrackWriter,
    subtitle_count: u64,
    subtitle_start: FrameIndex,
    text_count: u64,
    text_start: FrameIndex,
    text_seen: bool,
}

impl SrtTrack {
    fn new(channel: ChannelId, target: &OutputTarget) -> SrtTrack {
        SrtTrack {
            state: TrackState::new(channel),
            caption_out: TrackWriter::new(target, format!("{}.srt", channel.caption_name())),
            text_out: TrackWriter::new(target, format!("{}.srt", channel.text_name())),
            subtitle_count: 1,
            subtitle_start: 0,
            text_count: 1,
            text_start: 0,
            text_seen: false,
        }
    }

    fn write_caption(&mut self, rows: &[ClassifiedRow], end: FrameIndex) -> Result<()> {
        let rendered = render_caption(rows, &mut PlainStyler);

        self.caption_out.write_line(&format!(
            "{}\n{} --> {}\n{}\n",
            self.subtitle_count,
            srt_timecode(self.subtitle_start),
            srt_timecode(end),
            rendered.text
        ))?;
        self.subtitle_count += 1;

        Ok(())
    }

    fn write_text(&mut self, rows: &[ClassifiedRow], end: FrameIndex) -> Result<()> {
        let rendered = render_caption(rows, &mut PlainStyler);

        if rendered.has_writable {
            self.text_out.write_line(&format!(
                "{}\n{} --> {}\n{}\n",
                self.text_count,
                srt_timecode(self.text_start),
                srt_timecode(end),
                rendered.text.trim_end_matches('\n')
            ))?;
            self.text_count += 1;
            self.text_start = end;
        }

        Ok(())
    }
}

impl CaptionTrack for SrtTrack {
    fn push(&mut self, row: &ClassifiedRow, frame: FrameIndex) -> Result<()> {
        match self.state.process(row) {
            GlobalAction::Skip | GlobalAction::Duplicate => (),
            GlobalAction::ResumeCaptionLoading | GlobalAction::EraseNonDisplayed => (),
            GlobalAction::ResumeDirectCaptioning => {
                // A new direct caption starts here; any stale roll-up remainder is dropped.
                self.subtitle_start = frame;
                self.state.roll_up.clear();
            }
            GlobalAction::StartRollUp { cleared } => {
                if !cleared.is_empty() {
                    self.write_caption(&cleared, frame)?;
                }
                self.subtitle_start = frame;
            }
            GlobalAction::ResumeTextDisplay => {
                if !self.text_seen {
                    self.text_start = frame;
                    self.text_seen = true;
                }
            }
            GlobalAction::TextRestart => self.state.clear_text(),
            GlobalAction::FlipBuffers => self.subtitle_start = frame,
            GlobalAction::EraseDisplayed { cleared } => {
                if !cleared.is_empty() {
                    self.write_caption(&cleared, frame)?;
                }
            }
            GlobalAction::NotGlobal { repeated_carriage_return } => match self.state.mode {
                CaptionMode::PopOn => self.state.push_non_displayed(row),
                CaptionMode::PaintOn => {
                    self.state.push_displayed(row);
                    let displayed = self.state.displayed.clone();
                    self.write_caption(&displayed, frame)?;
                }
                CaptionMode::RollUp => self.state.push_roll_up(row),
                CaptionMode::Text => {
                    if let Some(flushed) = self.state.text_apply(row, repeated_carriage_return) {
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
    use line21_cea608::classify::{classify_row, ClassifiedRow};
    use line21_cea608::code::ChannelId;
    use line21_cea608::demux::CaptionTrack;
    use line21_core::row::DecodedRow;

    use crate::writer::OutputTarget;

    use super::{srt_timecode, SrtTrack};

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
        assert_eq!(srt_timecode(0), "00:00:00,000");
        assert_eq!(srt_timecode(100), "00:00:03,337");
        assert_eq!(srt_timecode(200), "00:00:06,673");
    }

    #[test]
    fn verify_pop_on_caption_entry() {
        let dir = std::env::temp_dir().join("line21-srt-test");
        std::fs::create_dir_all(&dir).unwrap();
        let base = dir.join("popon");
        let path = dir.join("popon.CC1.srt");
        let _ = std::fs::remove_file(&path);

        let target = OutputTarget::File(base);
        let mut track = SrtTrack::new(ChannelId::Cc1, &target);

        // Resume Caption Loading, Erase Non-Displayed, "Hi", End of Caption at frame 100,
        // Erase Displayed at frame 200.
        track.push(&row(0x14, 0x20), 100).unwrap();
        track.push(&row(0x14, 0x2e), 100).unwrap();
        track.push(&row(0x48, 0x69), 100).unwrap();
        track.push(&row(0x14, 0x2f), 100).unwrap();
        track.push(&row(0x14, 0x2c), 200).unwrap();
        track.finish().unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "1\n00:00:03,337 --> 00:00:06,673\nHi\n\n");

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn verify_doubled_controls_write_once() {
        let dir = std::env::temp_dir().join("line21-srt-test");
        std::fs::create_dir_all(&dir).unwrap();
        let base = dir.join("doubled");
        let path = dir.join("doubled.CC1.srt");
        let _ = std::fs::remove_file(&path);

        let target = OutputTarget::File(base);
        let mut track = SrtTrack::new(ChannelId::Cc1, &target);

        // Every control code transmitted twice, as on a real line.
        for (b1, b2, frame) in [
            (0x14, 0x20, 10),
            (0x14, 0x20, 11),
            (0x48, 0x69, 12),
            (0x14, 0x2f, 13),
            (0x14, 0x2f, 14),
            (0x14, 0x2c, 50),
            (0x14, 0x2c, 51),
        ] {
            track.push(&row(b1, b2), frame).unwrap();
        }
        track.finish().unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.matches("-->").count(), 1);
        assert!(written.starts_with("1\n"));
        assert!(written.contains("\nHi\n"));

        let _ = std::fs::remove_file(&path);
    }
}
