// Line21
// Copyright (c) 2026 The Project Line21 Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bit-cell slicing.
//!
//! With the clock phase and cell width recovered, each bit cell is read by averaging its
//! samples (edges trimmed) against a threshold taken from the run-in itself. Cells whose
//! samples disagree strongly are marked suspect; a single suspect bit per byte can be corrected
//! using the received parity bit.

use crate::sync::{PreambleMatch, START_BIT_COUNT};

/// Fraction of a bit cell trimmed from each edge before averaging.
const CELL_EDGE_TRIM: f32 = 0.1;

/// Cells with a sample standard deviation above this are suspect.
const MAX_TRUSTED_DEVIATION: f32 = 0.3;

/// Two sliced payload bytes with their parity status. Parity bits are stripped.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SlicedBytes {
    pub byte1: u8,
    pub byte1_parity_ok: bool,
    pub byte2: u8,
    pub byte2_parity_ok: bool,
}

/// Reads one bit cell, returning its value and the standard deviation of its samples.
fn read_cell(m: &PreambleMatch, threshold: f32, padding: usize, bit_index: usize) -> (u8, f32) {
    let start = m.preamble_end + bit_index as f32 * m.bit_width;

    let s = (start.round() as usize + padding).min(m.norm.len());
    let e = ((start + m.bit_width).round() as usize).saturating_sub(padding).min(m.norm.len());

    let seg = &m.norm[s.min(e)..e];

    let mean = seg.iter().sum::<f32>() / seg.len() as f32;
    let var = seg.iter().map(|&v| (v - mean) * (v - mean)).sum::<f32>() / seg.len() as f32;

    (u8::from(mean > threshold), var.sqrt())
}

/// Slices the three start bits and two bytes out of a matched scanline.
///
/// Returns `None` when the start-bit pattern `0 0 1` does not verify; such rows are dropped.
pub fn slice_bytes(m: &PreambleMatch) -> Option<SlicedBytes> {
    // The slicing threshold is the mean level of the run-in.
    let lo = m.preamble_start.round() as usize;
    let hi = (m.preamble_end.round() as usize).min(m.norm.len());
    let run_in = &m.norm[lo..hi];
    let threshold = run_in.iter().sum::<f32>() / run_in.len() as f32;

    let padding = (CELL_EDGE_TRIM * m.bit_width).ceil() as usize;

    let cell = |bit_index: usize| read_cell(m, threshold, padding, bit_index);

    // Start bits must read 0, 0, 1.
    if cell(0).0 != 0 || cell(1).0 != 0 || cell(2).0 != 1 {
        return None;
    }

    let mut bytes = [0u8; 2];
    let mut parity_ok = [false; 2];

    for (i, (byte, ok)) in bytes.iter_mut().zip(parity_ok.iter_mut()).enumerate() {
        let data_start = START_BIT_COUNT + i * 8;

        let mut bits = [0u8; 7];
        let mut suspect_count = 0;
        let mut worst_idx = 0;
        let mut worst_dev = 0.0f32;
        let mut computed_parity = 1u8;

        for (b_idx, bit) in bits.iter_mut().enumerate() {
            let (value, dev) = cell(b_idx + data_start);
            *bit = value;
            computed_parity += value;

            if dev > MAX_TRUSTED_DEVIATION {
                suspect_count += 1;
                if dev > worst_dev {
                    worst_idx = b_idx;
                    worst_dev = dev;
                }
            }
        }

        computed_parity %= 2;
        let (parity_bit, parity_dev) = cell(data_start + 7);

        // Correct a single-bit error: exactly one suspect data cell, a trustworthy parity cell,
        // and a parity mismatch. Flip the worst cell and accept the received parity.
        if suspect_count == 1
            && parity_bit != computed_parity
            && parity_dev < MAX_TRUSTED_DEVIATION
        {
            bits[worst_idx] ^= 1;
            computed_parity = parity_bit;
        }

        // LSB first.
        *byte = bits.iter().rev().fold(0, |acc, &b| (acc << 1) | b);
        *ok = parity_bit == computed_parity;
    }

    Some(SlicedBytes {
        byte1: bytes[0],
        byte1_parity_ok: parity_ok[0],
        byte2: bytes[1],
        byte2_parity_ok: parity_ok[1],
    })
}

#[cfg(test)]
mod tests {
    use super::slice_bytes;
    use crate::sync::{sync_to_preamble, TemplateBank};
    use crate::tests::{synthesize_line, BitError};

    #[test]
    fn verify_slice_round_trip() {
        let bank = TemplateBank::new(720).unwrap();

        for &(b1, b2) in &[(0x14u8, 0x20u8), (0x48, 0x69), (0x00, 0x00), (0x7f, 0x7f)] {
            let line = synthesize_line(27.0, 12, b1, b2, &[]);
            let m = sync_to_preamble(&line, &bank).unwrap();
            let sliced = slice_bytes(&m).expect("start bits did not verify");

            assert_eq!(sliced.byte1, b1);
            assert_eq!(sliced.byte2, b2);
            assert!(sliced.byte1_parity_ok);
            assert!(sliced.byte2_parity_ok);
        }
    }

    #[test]
    fn verify_start_bit_violation_drops_row() {
        // Invert the third start bit: the pattern reads 0 0 0.
        let line = synthesize_line(27.0, 12, 0x48, 0x69, &[BitError::ForceZero(2)]);

        let bank = TemplateBank::new(720).unwrap();
        let m = sync_to_preamble(&line, &bank).unwrap();

        assert!(slice_bytes(&m).is_none());
    }

    #[test]
    fn verify_single_bit_correction() {
        // Flip data bit 3 of byte 1, but leave the cell averaging near the threshold so its
        // deviation marks it suspect. The parity bit is clean and disagrees, so the slicer must
        // flip the bit back and report parity as good.
        let line = synthesize_line(27.0, 12, 0x48, 0x69, &[BitError::Smear(3 + 3)]);

        let bank = TemplateBank::new(720).unwrap();
        let m = sync_to_preamble(&line, &bank).unwrap();
        let sliced = slice_bytes(&m).unwrap();

        assert_eq!(sliced.byte1, 0x48);
        assert!(sliced.byte1_parity_ok);
        assert_eq!(sliced.byte2, 0x69);
    }

    #[test]
    fn verify_uncorrectable_error_reports_bad_parity() {
        // A cleanly flipped bit (no deviation) cannot be corrected; parity must report bad.
        let line = synthesize_line(27.0, 12, 0x48, 0x69, &[BitError::Flip(3 + 3)]);

        let bank = TemplateBank::new(720).unwrap();
        let m = sync_to_preamble(&line, &bank).unwrap();
        let sliced = slice_bytes(&m).unwrap();

        assert!(!sliced.byte1_parity_ok);
        assert!(sliced.byte2_parity_ok);
    }
}
