// Line21
// Copyright (c) 2026 The Project Line21 Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The plain text sink.
//!
//! Transcribes text-mode (T1-T4) channels, one line per flushed text row. Caption modes carry
//! no plain-text transcript and are consumed silently.

use line21_cea608::classify::{ClassifiedRow, FrameRows};
use line21_cea608::code::ChannelId;
use line21_cea608::demux::{CaptionTrack, TrackDemux};
use line21_cea608::render::{render_caption, PlainStyler};
use line21_cea608::track::{CaptionMode, GlobalAction, TrackState};
use line21_core::errors::Result;
use line21_core::units::FrameIndex;

use crate::writer::{OutputTarget, TrackWriter};
use crate::Sink;

pub struct TxtSink {
    demux: TrackDemux<TxtTrack>,
}

impl TxtSink {
    pub fn new(target: &OutputTarget) -> TxtSink {
        let target = target.clone();
        TxtSink { demux: TrackDemux::new(move |channel| Ok(TxtTrack::new(channel, &target))) }
    }
}

impl Sink for TxtSink {
    fn process(&mut self, rows: &FrameRows) -> Result<()> {
        self.demux.push_frame(rows)
    }

    fn finish(&mut self) -> Result<()> {
        self.demux.finish()
    }
}

struct TxtTrack {
    state: TrackState,
    text_out: TrackWriter,
}

impl TxtTrack {
    fn new(channel: ChannelId, target: &OutputTarget) -> TxtTrack {
        TxtTrack {
            state: TrackState::new(channel),
            text_out: TrackWriter::new(target, format!("{}.txt", channel.text_name())),
        }
    }

    fn write_text(&mut self, rows: &[ClassifiedRow]) -> Result<()> {
        let rendered = render_caption(rows, &mut PlainStyler);

        if rendered.has_writable {
            self.text_out.write_line(rendered.text.trim_end_matches('\n'))?;
        }

        Ok(())
    }
}

impl CaptionTrack for TxtTrack {
    fn push(&mut self, row: &ClassifiedRow, _frame: FrameIndex) -> Result<()> {
        match self.state.process(row) {
            GlobalAction::TextRestart => self.state.clear_text(),
            GlobalAction::NotGlobal { repeated_carriage_return }
                if self.state.mode == CaptionMode::Text =>
            {
                if let Some(flushed) = self.state.text_apply(row, repeated_carriage_return) {
                    self.write_text(&flushed)?;
                }
            }
            // Caption modes have no plain-text transcript.
            _ => (),
        }

        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.text_out.flush()
    }
}
