// Line21
// Copyright (c) 2026 The Project Line21 Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `units` module provides definitions for common units.

/// A `FrameIndex` counts video frames since the start of a stream.
pub type FrameIndex = u64;

/// The NTSC frame rate, in frames per second.
pub const NTSC_FRAME_RATE: f64 = 29.97;

/// A wall-clock instant derived from a frame index, split into display fields.
///
/// Milliseconds are rounded to the nearest unit; hours, minutes, and seconds truncate.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct WallTime {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub milliseconds: u64,
}

impl WallTime {
    /// Calculates the wall-clock time of the given frame at the NTSC frame rate.
    pub fn from_frame(frame: FrameIndex) -> WallTime {
        let total_ms = ((frame as f64 / NTSC_FRAME_RATE) * 1000.0).round() as u64;

        WallTime {
            hours: total_ms / 3_600_000,
            minutes: (total_ms / 60_000) % 60,
            seconds: (total_ms / 1000) % 60,
            milliseconds: total_ms % 1000,
        }
    }
}

/// An NTSC drop-frame timecode.
///
/// Drop-frame timecode counts at a nominal 30 fps but periodically skips frame numbers so that
/// the displayed time tracks the true 29.97 fps wall-clock: frame numbers 0 and 1 are dropped
/// each minute, except every tenth minute.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DropFrameTimecode {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub frames: u64,
}

impl DropFrameTimecode {
    /// Calculates the drop-frame timecode of the given frame index.
    pub fn from_frame(frame: FrameIndex) -> DropFrameTimecode {
        // 17982 frames make up one full ten-minute drop cycle, 1798 frames one dropped minute.
        let n = frame + 18 * (frame / 17982) + 2 * ((frame % 17982).saturating_sub(2) / 1798);

        DropFrameTimecode {
            hours: (n / 108_000) % 24,
            minutes: (n / 1800) % 60,
            seconds: (n / 30) % 60,
            frames: n % 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DropFrameTimecode, WallTime};

    #[test]
    fn verify_wall_time() {
        assert_eq!(
            WallTime::from_frame(0),
            WallTime { hours: 0, minutes: 0, seconds: 0, milliseconds: 0 }
        );

        // 100 / 29.97 = 3.33667 s. The millisecond field rounds.
        assert_eq!(
            WallTime::from_frame(100),
            WallTime { hours: 0, minutes: 0, seconds: 3, milliseconds: 337 }
        );

        // 200 / 29.97 = 6.67334 s.
        assert_eq!(
            WallTime::from_frame(200),
            WallTime { hours: 0, minutes: 0, seconds: 6, milliseconds: 673 }
        );

        // One hour of NTSC video is 107892 frames (3600 * 29.97).
        assert_eq!(
            WallTime::from_frame(107_892),
            WallTime { hours: 1, minutes: 0, seconds: 0, milliseconds: 0 }
        );
    }

    #[test]
    fn verify_drop_frame_rollover() {
        assert_eq!(
            DropFrameTimecode::from_frame(0),
            DropFrameTimecode { hours: 0, minutes: 0, seconds: 0, frames: 0 }
        );

        // The first minute boundary: frames 00:59:29 -> 01:00:02 (frames 0 and 1 dropped).
        assert_eq!(
            DropFrameTimecode::from_frame(1799),
            DropFrameTimecode { hours: 0, minutes: 0, seconds: 59, frames: 29 }
        );
        assert_eq!(
            DropFrameTimecode::from_frame(1800),
            DropFrameTimecode { hours: 0, minutes: 1, seconds: 0, frames: 2 }
        );

        // The tenth minute does not drop: 09:59:29 -> 10:00:00.
        assert_eq!(
            DropFrameTimecode::from_frame(17_981),
            DropFrameTimecode { hours: 0, minutes: 9, seconds: 59, frames: 29 }
        );
        assert_eq!(
            DropFrameTimecode::from_frame(17_982),
            DropFrameTimecode { hours: 0, minutes: 10, seconds: 0, frames: 0 }
        );
    }

    #[test]
    fn verify_drop_frame_tracks_wall_clock() {
        // After one hour of frames the timecode reads within one second of 01:00:00.
        let tc = DropFrameTimecode::from_frame(107_892);
        assert_eq!(tc.hours, 1);
        assert_eq!(tc.minutes, 0);
        assert_eq!(tc.seconds, 0);
    }
}
