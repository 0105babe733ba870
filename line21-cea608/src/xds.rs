// Line21
// Copyright (c) 2026 The Project Line21 Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extended Data Services (XDS) decoding.
//!
//! XDS packets ride the second field alongside the captions: a start pair with a class byte in
//! `0x01..=0x0E`, content pairs, then a terminator pair whose first byte is `0x0F` and whose
//! second byte makes the packet sum to zero in 7-bit two's complement. The decoder reassembles
//! packets across frames and renders each one as a human-readable description.

use std::collections::HashMap;
use std::fmt::Write;

use lazy_static::lazy_static;
use log::warn;

use crate::charset;
use crate::classify::FrameRows;
use crate::code;

/// Program genre names, indexed by `code - 0x20`.
#[rustfmt::skip]
const XDS_GENRES: [&str; 96] = [
    "Education", "Entertainment", "Movie", "News", "Religious", "Sports", "Other", "Action",
    "Advertisement", "Animated", "Anthology", "Automobile", "Awards", "Baseball", "Basketball",
    "Bulletin", "Business", "Classical", "College", "Combat", "Comedy", "Commentary", "Concert",
    "Consumer", "Contemporary", "Crime", "Dance", "Documentary", "Drama", "Elementary",
    "Erotica", "Exercise", "Fantasy", "Farm", "Fashion", "Fiction", "Food", "Football",
    "Foreign", "Fund Raiser", "Game/Quiz", "Garden", "Golf", "Government", "Health",
    "High School", "History", "Hobby", "Hockey", "Home", "Horror", "Information",
    "Instruction", "International", "Interview", "Language", "Legal", "Live", "Local", "Math",
    "Medical", "Meeting", "Military", "Miniseries", "Music", "Mystery", "National", "Nature",
    "Police", "Politics", "Premier", "Prerecorded", "Product", "Professional", "Public",
    "Racing", "Reading", "Repair", "Repeat", "Review", "Romance", "Science", "Series",
    "Service", "Shopping", "Soap", "Special", "Suspense", "Talk", "Technical", "Tennis",
    "Travel", "Variety", "Video", "Weather", "Western",
];

fn genre_name(code: u8) -> &'static str {
    match code {
        0x20..=0x7f => XDS_GENRES[usize::from(code) - 0x20],
        _ => "",
    }
}

const US_TV_PARENTAL_GUIDELINE_RATINGS: [&str; 8] =
    ["Not rated", "TV-Y", "TV-Y7", "TV-G", "TV-PG", "TV-14", "TV-MA", "Not rated"];

const MPA_RATINGS: [&str; 8] = ["N/A", "G", "PG", "PG-13", "R", "NC-17", "X", "Not Rated"];

const CANADIAN_ENGLISH_RATINGS: [&str; 8] =
    ["E", "C", "C8+", "G", "PG", "14+", "18+", "Invalid"];

const CANADIAN_FRENCH_RATINGS: [&str; 8] =
    ["E", "G", "8 ans +", "13 ans +", "16 ans +", "18 ans +", "Invalid", "Invalid"];

const AUDIO_LANGUAGES: [&str; 8] =
    ["Unknown", "English", "Spanish", "French", "German", "Italian", "Other", "None"];

const AUDIO_TYPES_MAIN: [&str; 8] = [
    "Unknown", "Mono", "Simulated Stereo", "Stereo", "Stereo Surround", "Data Service", "Other",
    "None",
];

const AUDIO_TYPES_SECONDARY: [&str; 8] = [
    "Unknown", "Mono", "Video Descriptions", "Non-program Audio", "Special Effects",
    "Data Service", "Other", "None",
];

const CGMS_COPY: [&str; 4] = [
    "Copying is permitted without restriction",
    "Condition not to be used",
    "One generation of copies may be made",
    "No copying is permitted",
];

const CGMS_APS: [&str; 4] = [
    "No Analogue protection",
    "Analogue protection: PSP On; Split Burst Off",
    "Analogue protection: PSP On; 2 line Split Burst On",
    "Analogue protection: PSP On; 4 line Split Burst On",
];

const MONTHS: [&str; 12] =
    ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];

const DAYS_OF_WEEK: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

lazy_static! {
    /// NWS SAME event codes carried by public-service advisory packets.
    static ref SAME_EVENT_CODES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("EAN", "Emergency Action Notification (National only)");
        m.insert("EAT", "Emergency Action Termination (National only)");
        m.insert("NIC", "National Information Center");
        m.insert("NPT", "National Periodic Test");
        m.insert("RMT", "Required Monthly Test");
        m.insert("RWT", "Required Weekly Test");
        m.insert("ADR", "Administrative Message");
        m.insert("AVW", "Avalanche Warning");
        m.insert("AVA", "Avalanche Watch");
        m.insert("BZW", "Blizzard Warning");
        m.insert("CAE", "Child Abduction Emergency");
        m.insert("CDW", "Civil Danger Warning");
        m.insert("CEM", "Civil Emergency Message");
        m.insert("CFW", "Coastal Flood Warning");
        m.insert("CFA", "Coastal Flood Watch");
        m.insert("DFW", "Dust Storm Warning");
        m.insert("DMO", "Practice/Demo Warning");
        m.insert("EQW", "Earthquake Warning");
        m.insert("EVI", "Evacuation Immediate");
        m.insert("FFA", "Flash Flood Watch");
        m.insert("FFS", "Flash Flood Statement");
        m.insert("FFW", "Flash Flood Warning");
        m.insert("FLA", "Flood Watch");
        m.insert("FLS", "Flood Statement");
        m.insert("FLW", "Flood Warning");
        m.insert("FRW", "Fire Warning");
        m.insert("HLS", "Hurricane Statement");
        m.insert("HMW", "Hazardous Materials Warning");
        m.insert("HWA", "High Wind Watch");
        m.insert("HWW", "High Wind Warning");
        m.insert("HUA", "Hurricane Watch");
        m.insert("HUW", "Hurricane Warning");
        m.insert("LAE", "Local Area Emergency");
        m.insert("LEW", "Law Enforcement Warning");
        m.insert("NMN", "Network Message Notification");
        m.insert("NUW", "Nuclear Power Plant Warning");
        m.insert("RHW", "Radiological Hazard Warning");
        m.insert("SMW", "Special Marine Warning");
        m.insert("SPS", "Special Weather Statement");
        m.insert("SPW", "Shelter in Place Warning");
        m.insert("SVA", "Severe Thunderstorm Watch");
        m.insert("SVR", "Severe Thunderstorm Warning");
        m.insert("SVS", "Severe Weather Statement");
        m.insert("TOA", "Tornado Watch");
        m.insert("TOE", "911 Telephone Outage Emergency");
        m.insert("TOR", "Tornado Warning");
        m.insert("TRA", "Tropical Storm Watch");
        m.insert("TRW", "Tropical Storm Warning");
        m.insert("TSA", "Tsunami Watch");
        m.insert("TSW", "Tsunami Warning");
        m.insert("VOW", "Volcano Warning");
        m.insert("WSA", "Winter Storm Watch");
        m.insert("WSW", "Winter Storm Warning");
        m.insert("LFP", "Service Area Forecast");
        m.insert("BRT", "Composite Broadcast Statement");
        m
    };
}

/// Maps a byte to its 7-bit two's-complement value for the checksum sum.
fn twos_complement(byte: u8) -> u32 {
    if byte & 0x7f != 0 {
        128 - u32::from(byte)
    }
    else {
        u32::from(byte)
    }
}

/// Verifies the packet checksum: the two's-complement sum of every byte, terminator and
/// checksum included, must be zero modulo 128.
pub fn checksum_ok(packet: &[(u8, u8)]) -> bool {
    if packet.is_empty() {
        return false;
    }

    let sum: u32 = packet.iter().map(|&(b1, b2)| twos_complement(b1) + twos_complement(b2)).sum();

    sum & 0x7f == 0
}

/// A forward-only reader over the content pairs of a packet.
struct Pairs<'a> {
    pairs: &'a [(u8, u8)],
    pos: usize,
}

impl<'a> Pairs<'a> {
    fn new(pairs: &'a [(u8, u8)]) -> Pairs<'a> {
        Pairs { pairs, pos: 0 }
    }

    fn next(&mut self) -> Option<(u8, u8)> {
        let pair = self.pairs.get(self.pos).copied();
        self.pos += usize::from(pair.is_some());
        pair
    }

    fn remaining(&self) -> usize {
        self.pairs.len() - self.pos
    }

    /// Requires at least `minimum` bytes of content ahead.
    fn need(&self, minimum: usize) -> Option<()> {
        if self.remaining() * 2 < minimum {
            None
        }
        else {
            Some(())
        }
    }

    /// Decodes content pairs as displayable text until the terminator.
    fn string(&mut self) -> String {
        let mut out = String::new();
        while let Some((b1, b2)) = self.next() {
            if b1 == 0x0f {
                break;
            }
            match code::parse(b1, b2) {
                Some(code) => {
                    let _ = write!(out, "{}", code.code);
                }
                None => out.push_str(&charset::decode_pair(b1, b2, true)),
            }
        }
        out
    }

    /// Reads a minutes/hours pair. Hour fields in start-time packets only span 5 bits.
    fn minutes_hours(&mut self, short: bool) -> Option<(u8, u8)> {
        self.need(2)?;
        let (min_byte, hour_byte) = self.next()?;
        Some((min_byte & 63, if short { hour_byte & 31 } else { hour_byte & 63 }))
    }
}

/// Renders a reassembled packet as a human-readable description.
pub fn describe_packet(packet: &[(u8, u8)]) -> String {
    if packet.is_empty() {
        return "XDS - Empty Packet".to_string();
    }

    if !checksum_ok(packet) {
        return "XDS Rejected Packet - Incorrect Checksum".to_string();
    }

    let mut pairs = Pairs::new(&packet[1..]);
    let (class, kind) = packet[0];

    match describe_classified(class, kind, &mut pairs) {
        Some(description) => description,
        None => {
            warn!("malformed xds packet for class {:#04x} type {:#04x}", class, kind);
            "XDS Malformed Packet".to_string()
        }
    }
}

fn describe_classified(class: u8, kind: u8, pairs: &mut Pairs<'_>) -> Option<String> {
    // Current and future program classes share their type codes.
    if class <= 0x02 && kind <= 0x03 {
        let pref = if class == 0x01 { "Current" } else { "Next Program" };

        match kind {
            0x01 => {
                pairs.need(4)?;
                let (minutes, hours) = pairs.minutes_hours(true)?;
                let (date, month) = pairs.next()?;
                let tape_delay = if month & 16 != 0 { "(Tape Delayed)" } else { "" };
                return Some(format!(
                    "XDS {} Scheduled Start Time: {:02}:{:02} on Day {:02} of Month {:02} {}",
                    pref,
                    hours,
                    minutes,
                    date & 31,
                    month & 15,
                    tape_delay
                ));
            }
            0x02 => {
                let (minutes, hours) = pairs.minutes_hours(false)?;
                let mut msg =
                    format!("XDS {} Length of Show: {:02}:{:02}", pref, hours, minutes);
                if pairs.remaining() > 0 {
                    let (minutes, hours) = pairs.minutes_hours(false)?;
                    let mut seconds = 0;
                    if pairs.remaining() > 0 {
                        seconds = pairs.next()?.0 & 63;
                    }
                    let _ = write!(
                        msg,
                        " XDS {} Elapsed time: {:02}:{:02}:{:02}",
                        pref, hours, minutes, seconds
                    );
                }
                return Some(msg);
            }
            0x03 => {
                return Some(format!("XDS {} Program Name: {}", pref, pairs.string()));
            }
            _ => (),
        }
    }

    if class == 0x01 {
        match kind {
            0x04 => {
                let mut genres = String::new();
                while let Some((g1, g2)) = pairs.next() {
                    if g1 == 0x0f {
                        break;
                    }
                    let _ = write!(genres, "{} {} ", genre_name(g1), genre_name(g2));
                }
                return Some(format!("XDS Program Genre: {}", genres));
            }
            0x05 => return describe_content_advisory(pairs),
            0x06 => {
                let (main, sap) = pairs.next()?;
                return Some(format!(
                    "XDS Audio Services: Main:{}({}) Sap:{}({})",
                    AUDIO_LANGUAGES[usize::from((main & 0x38) >> 3)],
                    AUDIO_TYPES_MAIN[usize::from(main & 7)],
                    AUDIO_LANGUAGES[usize::from((sap & 0x38) >> 3)],
                    AUDIO_TYPES_SECONDARY[usize::from(sap & 7)],
                ));
            }
            0x07 => return Some("XDS Caption Services".to_string()),
            0x08 => {
                pairs.need(2)?;
                let (c1, _) = pairs.next()?;
                return Some(format!(
                    "XDS Copy protection: {} {}",
                    CGMS_COPY[usize::from((c1 & 0x18) >> 3)],
                    CGMS_APS[usize::from(c1 & 3)],
                ));
            }
            0x09 => {
                pairs.need(2)?;
                let (start, end) = pairs.next()?;
                let anamorphic = match pairs.next() {
                    Some((a, _)) if a & 1 != 0 => "Anamorphic",
                    _ => "",
                };
                return Some(format!(
                    "XDS Aspect Ratio: start line: {} end line: {} {}",
                    22 + u32::from(start & 63),
                    262 - u32::from(end & 63),
                    anamorphic
                ));
            }
            0x0c => return Some(format!("Composite packet 1 {}", pairs.remaining())),
            0x0d => return Some(format!("Composite packet 2 {}", pairs.remaining())),
            0x10..=0x17 => {
                return Some(format!(
                    "XDS Program description line: {} :{} ",
                    kind - 0x0f,
                    pairs.string()
                ));
            }
            _ => (),
        }
    }

    if class == 0x05 {
        match kind {
            0x01 => return Some(format!("XDS Channel Name: {}", pairs.string())),
            0x02 => {
                return Some(format!("XDS Channel Station Call-Sign: {}", pairs.string()));
            }
            0x03 => {
                let (minutes, hours) = pairs.minutes_hours(true)?;
                return Some(format!("XDS Channel Tape Delay: {:02}:{:02}", hours, minutes));
            }
            0x04 => return Some("XDS Transmission Signal Identifier (TSID)".to_string()),
            _ => (),
        }
    }

    if class == 0x07 {
        match kind {
            0x01 => {
                return Some(format!("XDS Time of day (UTC): {}", describe_time_of_day(pairs)?));
            }
            0x02 => return Some("XDS Impulse Capture ID".to_string()),
            0x03 => return Some("XDS Supplemental Data Location".to_string()),
            0x04 => {
                pairs.need(2)?;
                let (data, _) = pairs.next()?;

                // Offsets past UTC-12 wrap around to the eastern hemisphere.
                let mut zone = -i32::from(data & 0x1f);
                if zone < -12 {
                    zone += 24;
                }
                let dst = if data & 0x20 != 0 { "DST" } else { "ST" };

                return Some(format!("XDS Local Time Zone: {} {}", zone, dst));
            }
            0x40 => return Some("XDS Out-of-Band Channel Number".to_string()),
            0x41 => return Some("XDS Channel Map Pointer".to_string()),
            0x42 => return Some("XDS Channel Map Header Packet".to_string()),
            0x43 => return Some("XDS Channel Map Packet".to_string()),
            _ => (),
        }
    }

    if class == 0x09 {
        match kind {
            0x01 => {
                let message = pairs.string();
                let category = message
                    .get(0..3)
                    .and_then(|code| SAME_EVENT_CODES.get(code))
                    .map(|desc| format!(" ({})", desc))
                    .unwrap_or_default();
                return Some(format!(
                    "XDS Public Service - WRSAME message: {}{}",
                    message, category
                ));
            }
            0x02 => {
                return Some(format!("XDS Public Service - Weather: {}", pairs.string()));
            }
            _ => (),
        }
    }

    Some(format!("Could not decode ---> XDS describes: {:02x} {:02x}", class, kind))
}

fn describe_content_advisory(pairs: &mut Pairs<'_>) -> Option<String> {
    pairs.need(2)?;
    let (ca1, ca2) = pairs.next()?;

    let rating = match (ca1 & 0x18) >> 3 {
        0 | 2 => MPA_RATINGS[usize::from(ca1 & 7)].to_string(),
        1 => {
            let code = ca1 & 7;
            let mut rating = US_TV_PARENTAL_GUIDELINE_RATINGS[usize::from(code)].to_string();
            if code == 2 {
                if ca2 & 32 != 0 {
                    rating.push_str(" Fantasy Violence");
                }
            }
            else if code >= 4 && code <= 6 {
                if ca2 & 32 != 0 {
                    rating.push_str(" Violence");
                }
                if ca2 & 16 != 0 {
                    rating.push_str(" Sexual Situations");
                }
                if ca2 & 8 != 0 {
                    rating.push_str(" Adult Language");
                }
                if ca1 & 32 != 0 {
                    rating.push_str(" Sexually Suggestive Dialogue");
                }
            }
            rating
        }
        _ => {
            // International systems: Canadian English and French, or reserved.
            match ((ca1 & 0x20) >> 5) | ((ca2 & 0x08) >> 2) {
                1 => CANADIAN_ENGLISH_RATINGS[usize::from(ca2 & 7)].to_string(),
                2 => CANADIAN_FRENCH_RATINGS[usize::from(ca2 & 7)].to_string(),
                _ => format!("International reserved code ({}, {})", ca1, ca2),
            }
        }
    };

    Some(format!("XDS Rating: {}", rating))
}

fn describe_time_of_day(pairs: &mut Pairs<'_>) -> Option<String> {
    pairs.need(6)?;

    let mut bytes = [0u8; 6];
    for chunk in bytes.chunks_mut(2) {
        let (b1, b2) = pairs.next()?;
        chunk[0] = b1;
        chunk[1] = b2;
    }

    let minutes = i32::from(bytes[0]) - 0x40;
    let hours = bytes[1] & 0x1f;
    let dst = if bytes[1] & 0x20 != 0 { 'D' } else { 'S' };
    let leap_day = if bytes[2] & 0x20 != 0 { 'L' } else { 'A' };
    let day_of_month = i32::from(bytes[2]) - 0x40;
    let zero_seconds = if bytes[3] & 0x20 != 0 { 'Z' } else { '_' };
    let tape_delayed = if bytes[3] & 0x10 != 0 { 'T' } else { 'S' };

    let month = match bytes[3] & 0x0f {
        m @ 1..=12 => MONTHS[usize::from(m) - 1],
        _ => "--",
    };

    let day_of_week = match bytes[4] {
        d @ 0x41..=0x47 => DAYS_OF_WEEK[usize::from(d) - 0x41],
        _ => "--",
    };

    let year = 1990 + i32::from(bytes[5]) - 0x40;

    Some(format!(
        "TM {:02}:{:02}{} {}{}{} {} {:02} {} {}",
        hours, minutes, dst, zero_seconds, tape_delayed, leap_day, month, day_of_month, year,
        day_of_week
    ))
}

/// Reassembles XDS packets from the rows of successive frames.
///
/// The scanline carrying XDS data is latched from any row whose first byte is a class code with
/// clean parity; packets then accumulate from that scanline until a terminator arrives.
pub struct XdsDecoder {
    packet: Vec<(u8, u8)>,
    gathering: bool,
    xds_row: Option<u16>,
}

impl XdsDecoder {
    pub fn new() -> XdsDecoder {
        XdsDecoder { packet: Vec::new(), gathering: false, xds_row: None }
    }

    /// Consumes one frame of rows; returns the description of a packet completed by it.
    pub fn push_frame(&mut self, rows: &FrameRows) -> Option<String> {
        for row in &rows.rows {
            if row.byte1 > 0 && row.byte1 <= 0x0f && row.parity_ok() {
                self.xds_row = Some(row.row_index);
            }
        }

        let xds_row = self.xds_row?;

        for row in &rows.rows {
            if row.row_index != xds_row {
                continue;
            }

            if !row.is_stuffing() {
                if row.byte1 <= 0x0e {
                    self.gathering = true;
                }

                if self.gathering {
                    self.packet.push((row.byte1, row.byte2));
                }

                if row.byte1 == 0x0f {
                    self.gathering = false;
                    let description = describe_packet(&self.packet);
                    self.packet.clear();
                    return Some(description);
                }
            }

            break;
        }

        None
    }
}

impl Default for XdsDecoder {
    fn default() -> Self {
        XdsDecoder::new()
    }
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;

    use line21_core::row::DecodedRow;

    use crate::classify::{classify_row, ClassifiedRow, FrameRows};

    use super::{checksum_ok, describe_packet, XdsDecoder};

    fn row(byte1: u8, byte2: u8) -> ClassifiedRow {
        classify_row(DecodedRow {
            row_index: 284,
            byte1,
            byte1_parity_ok: true,
            byte2,
            byte2_parity_ok: true,
        })
        .unwrap()
    }

    /// Computes the checksum byte completing the packet.
    fn checksum_for(pairs: &[(u8, u8)]) -> u8 {
        for checksum in 0u8..0x80 {
            let mut packet = pairs.to_vec();
            packet.push((0x0f, checksum));
            if checksum_ok(&packet) {
                return checksum;
            }
        }
        panic!("no checksum satisfies the packet");
    }

    #[test]
    fn verify_checksum_rejection() {
        let packet = [(0x01, 0x03), (0x54, 0x56), (0x0f, 0x00)];
        assert!(!checksum_ok(&packet));
        assert_eq!(describe_packet(&packet), "XDS Rejected Packet - Incorrect Checksum");
    }

    #[test]
    fn verify_program_name() {
        // "NEWS" with a checksum that sums the packet to zero.
        let body = [(0x01, 0x03), (0x4e, 0x45), (0x57, 0x53)];
        let checksum = checksum_for(&body);
        assert_eq!(checksum, 0x30);

        let mut packet = body.to_vec();
        packet.push((0x0f, checksum));

        let description = describe_packet(&packet);
        assert!(description.contains("Program Name: NEWS"), "{}", description);
        assert_eq!(description, "XDS Current Program Name: NEWS");
    }

    #[test]
    fn verify_program_genre() {
        let body = [(0x01, 0x04), (0x23, 0x25)];
        let mut packet = body.to_vec();
        packet.push((0x0f, checksum_for(&body)));

        assert_eq!(describe_packet(&packet), "XDS Program Genre: News Sports ");
    }

    #[test]
    fn verify_malformed_packet() {
        // Scheduled start time requires two content pairs; an immediate terminator is too
        // short.
        let body = [(0x01, 0x01)];
        let mut packet = body.to_vec();
        packet.push((0x0f, checksum_for(&body)));

        assert_eq!(describe_packet(&packet), "XDS Malformed Packet");
    }

    #[test]
    fn verify_unknown_type() {
        let body = [(0x0b, 0x55)];
        let mut packet = body.to_vec();
        packet.push((0x0f, checksum_for(&body)));

        assert_eq!(describe_packet(&packet), "Could not decode ---> XDS describes: 0b 55");
    }

    #[test]
    fn verify_decoder_reassembles_across_frames() {
        let mut decoder = XdsDecoder::new();

        let body = [(0x01, 0x03), (0x4e, 0x45), (0x57, 0x53)];
        let checksum = checksum_for(&body);

        let mut stream: Vec<ClassifiedRow> = body.iter().map(|&(a, b)| row(a, b)).collect();
        // Stuffing inside a packet is ignored without disturbing reassembly.
        stream.insert(1, row(0x00, 0x00));
        stream.push(row(0x0f, checksum));

        let mut result = None;
        for (frame, data) in stream.into_iter().enumerate() {
            let rows = FrameRows { frame: frame as u64, rows: smallvec![data] };
            if let Some(description) = decoder.push_frame(&rows) {
                result = Some(description);
            }
        }

        assert_eq!(result.unwrap(), "XDS Current Program Name: NEWS");
    }
}
