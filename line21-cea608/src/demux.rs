// Line21
// Copyright (c) 2026 The Project Line21 Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Field and channel demultiplexing.
//!
//! Scanlines are not labelled with the field they came from; the demultiplexer learns the
//! mapping from the channel identity of the control codes it sees on each scanline, then routes
//! rows to the active channel of their field. Rows on scanlines with no learned field yet are
//! dropped from channel routing.

use std::collections::HashMap;

use line21_core::errors::Result;
use line21_core::units::FrameIndex;

use crate::classify::{ClassifiedRow, FrameRows};
use crate::code::ChannelId;

/// One caption track fed by the demultiplexer, owned by an output sink.
pub trait CaptionTrack {
    /// Consumes one row routed to this track.
    fn push(&mut self, row: &ClassifiedRow, frame: FrameIndex) -> Result<()>;

    /// Called once at the end of the stream.
    fn finish(&mut self) -> Result<()>;
}

/// Routes rows to per-channel tracks, creating tracks lazily on first sight of their channel.
pub struct TrackDemux<T> {
    make: Box<dyn FnMut(ChannelId) -> Result<T> + Send>,
    row_to_field: HashMap<u16, usize>,
    active: [Option<ChannelId>; 2],
    tracks: HashMap<ChannelId, T>,
}

impl<T: CaptionTrack> TrackDemux<T> {
    pub fn new(make: impl FnMut(ChannelId) -> Result<T> + Send + 'static) -> TrackDemux<T> {
        TrackDemux {
            make: Box::new(make),
            row_to_field: HashMap::new(),
            active: [None, None],
            tracks: HashMap::new(),
        }
    }

    /// Routes all rows of one frame.
    pub fn push_frame(&mut self, rows: &FrameRows) -> Result<()> {
        for row in &rows.rows {
            // Learn the scanline-to-field binding from cleanly received control codes.
            if row.parity_ok() {
                if let Some(code) = row.channel_code() {
                    let channel = code.channel;
                    let field = channel.field().index();

                    self.row_to_field.insert(row.row_index, field);

                    if !self.tracks.contains_key(&channel) {
                        let track = (self.make)(channel)?;
                        self.tracks.insert(channel, track);
                    }

                    self.active[field] = Some(channel);
                }
            }

            if let Some(&field) = self.row_to_field.get(&row.row_index) {
                if let Some(channel) = self.active[field] {
                    if let Some(track) = self.tracks.get_mut(&channel) {
                        track.push(row, rows.frame)?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Finishes all tracks.
    pub fn finish(&mut self) -> Result<()> {
        for track in self.tracks.values_mut() {
            track.finish()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use line21_core::errors::Result;
    use line21_core::row::DecodedRow;
    use line21_core::units::FrameIndex;

    use crate::classify::{classify_row, ClassifiedRow, FrameRows};
    use crate::code::ChannelId;

    use super::{CaptionTrack, TrackDemux};

    struct Recorder {
        channel: ChannelId,
        rows: Vec<(u16, FrameIndex)>,
    }

    impl CaptionTrack for Recorder {
        fn push(&mut self, row: &ClassifiedRow, frame: FrameIndex) -> Result<()> {
            self.rows.push((row.row_index, frame));
            Ok(())
        }

        fn finish(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn row(row_index: u16, byte1: u8, byte2: u8) -> ClassifiedRow {
        classify_row(DecodedRow {
            row_index,
            byte1,
            byte1_parity_ok: true,
            byte2,
            byte2_parity_ok: true,
        })
        .unwrap()
    }

    #[test]
    fn verify_channel_demultiplexing() {
        let mut demux =
            TrackDemux::new(|channel| Ok(Recorder { channel, rows: Vec::new() }));

        // Frame 0: CC1 Resume Caption Loading on scanline 21, the CC3 equivalent on 284.
        let mut frame = FrameRows::new(0);
        frame.rows.push(row(21, 0x14, 0x20));
        frame.rows.push(row(284, 0x1c, 0x20));
        demux.push_frame(&frame).unwrap();

        // Frame 1: data on both scanlines routes to the learned channels.
        let mut frame = FrameRows::new(1);
        frame.rows.push(row(21, 0x48, 0x69));
        frame.rows.push(row(284, 0x59, 0x6f));
        demux.push_frame(&frame).unwrap();

        let cc1 = &demux.tracks[&ChannelId::Cc1];
        assert_eq!(cc1.channel, ChannelId::Cc1);
        assert_eq!(cc1.rows, vec![(21, 0), (21, 1)]);

        let cc3 = &demux.tracks[&ChannelId::Cc3];
        assert_eq!(cc3.rows, vec![(284, 0), (284, 1)]);
    }

    #[test]
    fn verify_unmapped_rows_are_dropped() {
        let mut demux =
            TrackDemux::new(|channel| Ok(Recorder { channel, rows: Vec::new() }));

        // Text on a scanline that has never carried a control code goes nowhere.
        let mut frame = FrameRows::new(0);
        frame.rows.push(row(30, 0x48, 0x69));
        demux.push_frame(&frame).unwrap();

        assert!(demux.tracks.is_empty());
    }
}
