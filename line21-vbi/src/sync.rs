// Line21
// Copyright (c) 2026 The Project Line21 Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Clock run-in detection.
//!
//! A line-21 data burst is preceded by seven cycles of a sine wave (the clock run-in). The
//! synchronizer locates the run-in by normalized cross-correlation against a bank of sine
//! templates spanning the plausible range of bit-cell widths, recovering the burst phase and the
//! width of one bit cell.

use std::f32::consts::PI;

use line21_core::errors::{unsupported_error, Result};

/// Cycles in the clock run-in.
pub const CLOCK_RUN_IN_COUNT: usize = 7;
/// Start bits following the run-in.
pub const START_BIT_COUNT: usize = 3;
/// Data bits following the start bits (two bytes of 7 data bits + 1 parity bit).
pub const DATA_BIT_COUNT: usize = 16;

/// Guards against division by zero in the correlation score.
const SCORE_EPSILON: f64 = 1e-12;

/// A precomputed sine template for one candidate bit-cell width.
struct SineTemplate {
    /// Candidate width, in pixels per cycle.
    pixels_per_cycle: f32,
    /// Total burst length (run-in + start bits + data bits) at this width, in pixels.
    max_width: usize,
    /// Run-in length at this width, in pixels.
    run_len: usize,
    /// Mean-subtracted sine wave, one run-in long.
    template: Vec<f32>,
    /// Template energy: sum of squared samples.
    energy: f64,
}

impl SineTemplate {
    fn new(pixels_per_cycle: f32) -> SineTemplate {
        let run_len = (CLOCK_RUN_IN_COUNT as f32 * pixels_per_cycle).round() as usize;

        let total_cycles = (CLOCK_RUN_IN_COUNT + START_BIT_COUNT + DATA_BIT_COUNT) as f32;
        let max_width = (total_cycles * pixels_per_cycle).round() as usize;

        let mut template: Vec<f32> =
            (0..run_len).map(|t| (2.0 * PI * t as f32 / pixels_per_cycle).sin()).collect();

        let mean = template.iter().sum::<f32>() / run_len as f32;
        for s in template.iter_mut() {
            *s -= mean;
        }

        let energy = template.iter().map(|&s| f64::from(s) * f64::from(s)).sum();

        SineTemplate { pixels_per_cycle, max_width, run_len, template, energy }
    }
}

/// A bank of sine templates for one scanline width, computed once at startup and shared
/// read-only for the rest of the decoding session.
pub struct TemplateBank {
    width: usize,
    templates: Vec<SineTemplate>,
}

impl TemplateBank {
    /// Fractional sub-steps searched per integer pixel of cell width.
    const WIDTH_SUB_STEPS: usize = 5;

    /// Builds the template bank for scanlines of the given width.
    ///
    /// Candidate cell widths are linearly spaced over [0.035, 0.041] of the scanline width,
    /// covering the nominal 27-pixel cell (at 720 pixels) within roughly +/-12%.
    pub fn new(width: usize) -> Result<TemplateBank> {
        let min_clock_len = (0.035 * width as f32).round();
        let max_clock_len = (0.041 * width as f32).round();

        let steps = ((max_clock_len - min_clock_len) as usize) * Self::WIDTH_SUB_STEPS;
        if steps < 2 {
            return unsupported_error("vbi: scanline too narrow for clock run-in search");
        }

        let step = (max_clock_len - min_clock_len) / (steps - 1) as f32;

        let mut templates = Vec::with_capacity(steps);

        for i in 0..steps {
            let template = SineTemplate::new(min_clock_len + step * i as f32);

            if template.max_width >= width {
                // Any match at this and all wider widths would overrun the line.
                break;
            }

            templates.push(template);
        }

        if templates.is_empty() {
            return unsupported_error("vbi: no candidate cell width fits the scanline");
        }

        Ok(TemplateBank { width, templates })
    }

    /// The scanline width this bank was built for.
    pub fn width(&self) -> usize {
        self.width
    }
}

/// The result of a successful clock run-in search on one scanline.
///
/// Positions are fractional pixel offsets into `norm`. `preamble_end` is placed half a cell
/// before the end of the seventh cycle so that subsequent bit cells align to cycle centres.
pub struct PreambleMatch {
    /// The scanline, min-max normalized to [0, 1].
    pub norm: Vec<f32>,
    pub preamble_start: f32,
    pub preamble_end: f32,
    /// Recovered bit-cell width, in pixels.
    pub bit_width: f32,
    /// Normalized correlation score of the best match, in [0, 1].
    pub score: f32,
}

/// Searches one scanline for the clock run-in.
///
/// Returns `None` when the line is flat or no candidate match fits within the line. The caller
/// is responsible for rejecting weak matches by score.
pub fn sync_to_preamble(line: &[u8], bank: &TemplateBank) -> Option<PreambleMatch> {
    debug_assert_eq!(line.len(), bank.width);

    // Min-max normalize the scanline.
    let mut lo = u8::MAX;
    let mut hi = u8::MIN;
    for &s in line {
        lo = lo.min(s);
        hi = hi.max(s);
    }

    if lo == hi {
        return None;
    }

    let scale = 1.0 / f32::from(hi - lo);
    let norm: Vec<f32> = line.iter().map(|&s| f32::from(s - lo) * scale).collect();

    // Cumulative sums of the normalized line and its square, for O(1) windowed variance.
    let mut cumsum = vec![0.0f64; norm.len() + 1];
    let mut cumsum2 = vec![0.0f64; norm.len() + 1];
    for (i, &s) in norm.iter().enumerate() {
        let s = f64::from(s);
        cumsum[i + 1] = cumsum[i] + s;
        cumsum2[i + 1] = cumsum2[i] + s * s;
    }

    let mut best_score = f64::NEG_INFINITY;
    let mut best: Option<(usize, &SineTemplate)> = None;

    for template in &bank.templates {
        if let Some((idx, score)) = correlate(&norm, &cumsum, &cumsum2, template) {
            // The best offset for this template must leave room for the whole burst.
            if idx + template.max_width >= norm.len() {
                continue;
            }

            if score > best_score {
                best_score = score;
                best = Some((idx, template));
            }
        }
    }

    let (mut preamble_start, template) = match best {
        Some((idx, template)) => (idx as f32, template),
        None => return None,
    };

    let bit_width = template.pixels_per_cycle;

    // Phase correction: a sine run-in correlates equally well half a cycle out of phase. Check
    // the sign of the match against the template and advance half a cell on inversion.
    let seg_start = preamble_start.round() as usize;
    let seg = &norm[seg_start..seg_start + template.run_len];
    let seg_mean = seg.iter().sum::<f32>() / seg.len() as f32;

    let dot: f32 = seg.iter().zip(&template.template).map(|(&s, &t)| (s - seg_mean) * t).sum();
    if dot < 0.0 {
        preamble_start += bit_width / 2.0;
    }

    let preamble_end = preamble_start + (CLOCK_RUN_IN_COUNT as f32 - 0.5) * bit_width;

    Some(PreambleMatch { norm, preamble_start, preamble_end, bit_width, score: best_score as f32 })
}

/// Correlates the template against every valid offset of the line, returning the offset with
/// the highest normalized score and the score itself.
fn correlate(
    norm: &[f32],
    cumsum: &[f64],
    cumsum2: &[f64],
    template: &SineTemplate,
) -> Option<(usize, f64)> {
    let run_len = template.run_len;

    if norm.len() < run_len {
        return None;
    }

    let mut best_idx = 0;
    let mut best_score = f64::NEG_INFINITY;

    for i in 0..=(norm.len() - run_len) {
        // The hot loop: a dense dot product over contiguous f32 buffers.
        let conv: f32 =
            norm[i..i + run_len].iter().zip(&template.template).map(|(&x, &t)| x * t).sum();

        let sum_x = cumsum[i + run_len] - cumsum[i];
        let sum_x2 = cumsum2[i + run_len] - cumsum2[i];
        let var_x = sum_x2 - sum_x * sum_x / run_len as f64;

        let conv = f64::from(conv);
        let score = (conv * conv) / (template.energy * var_x + SCORE_EPSILON);

        if score > best_score {
            best_score = score;
            best_idx = i;
        }
    }

    Some((best_idx, best_score))
}

#[cfg(test)]
mod tests {
    use super::{sync_to_preamble, TemplateBank};
    use crate::tests::synthesize_line;

    #[test]
    fn verify_template_bank() {
        let bank = TemplateBank::new(720).unwrap();

        // All candidate widths lie in [round(0.035 W), round(0.041 W)] and fit a whole burst
        // in the line.
        for template in &bank.templates {
            assert!(template.pixels_per_cycle >= (0.035f32 * 720.0).round());
            assert!(template.pixels_per_cycle <= (0.041f32 * 720.0).round());
            assert!(template.max_width < 720);
        }
    }

    #[test]
    fn verify_bank_rejects_narrow_lines() {
        assert!(TemplateBank::new(16).is_err());
    }

    #[test]
    fn verify_sync_finds_preamble() {
        let bank = TemplateBank::new(720).unwrap();
        let line = synthesize_line(27.0, 12, 0x48, 0x69, &[]);

        let m = sync_to_preamble(&line, &bank).expect("preamble not found");

        assert!(m.score > 0.7, "weak match: {}", m.score);
        assert!(m.bit_width >= (0.035f32 * 720.0).round() && m.bit_width <= (0.041f32 * 720.0).round());

        // The recovered start is within a couple of pixels of where the burst was written.
        assert!((m.preamble_start - 12.0).abs() < 3.0, "start {}", m.preamble_start);
    }

    #[test]
    fn verify_sync_rejects_flat_line() {
        let bank = TemplateBank::new(720).unwrap();
        assert!(sync_to_preamble(&[0x80; 720], &bank).is_none());
    }
}
