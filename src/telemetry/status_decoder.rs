// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoder for the controller's compact status line.
//!
//! A zone segment follows the grammar
//!
//! ```text
//! segment ::= "S" index "=" soil "(" "M" min ".." "X" max ")" "Z" index "=" mode
//! mode    ::= AUTO | ON | OFF        (case-insensitive)
//! ```
//!
//! Whitespace between tokens is ignored. The status line is scanned for every
//! non-overlapping segment; text between segments (pipes, pump and light
//! flags, firmware chatter) is skipped.

use chrono::{DateTime, Utc};

use crate::error::DecodeRejection;
use crate::types::{ZoneIndex, ZoneMode};

use super::ZoneReading;

/// Decodes every zone segment in `text`.
///
/// Segments that do not match the grammar, including those whose `S<k>` and
/// `Z<k>` indices differ, are skipped. An empty result is not an error.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use farmlink::telemetry::decode;
/// use farmlink::types::ZoneMode;
///
/// let line = "S1=1830(M1200..X2000) Z1=OFF | S2=1950(M1200..X2000) Z2=ON";
/// let readings = decode(line, Utc::now());
///
/// assert_eq!(readings.len(), 2);
/// assert_eq!(readings[0].soil(), 1830);
/// assert_eq!(readings[1].mode(), ZoneMode::On);
/// ```
#[must_use]
pub fn decode(text: &str, received_at: DateTime<Utc>) -> Vec<ZoneReading> {
    scan(text, received_at)
        .filter_map(|result| match result {
            Ok(reading) => Some(reading),
            Err(rejection) => {
                tracing::trace!(%rejection, "Skipping status segment");
                None
            }
        })
        .collect()
}

/// Scans `text` and yields one result per zone-like segment.
///
/// A segment counts as zone-like once `S<k>=` has been read; anything shorter
/// is plain text and produces no item. Successful segments are consumed whole,
/// so matches never overlap.
#[must_use]
pub fn scan(text: &str, received_at: DateTime<Utc>) -> Scan<'_> {
    Scan {
        text,
        pos: 0,
        received_at,
    }
}

/// Iterator returned by [`scan`].
#[derive(Debug, Clone)]
pub struct Scan<'a> {
    text: &'a str,
    pos: usize,
    received_at: DateTime<Utc>,
}

impl Iterator for Scan<'_> {
    type Item = Result<ZoneReading, DecodeRejection>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let offset = self.text.get(self.pos..)?.find('S')?;
            let start = self.pos + offset;

            let mut cursor = Cursor::at(self.text, start);
            if !cursor.opens_segment() {
                self.pos = start + 1;
                continue;
            }

            let mut cursor = Cursor::at(self.text, start);
            return match parse_segment(&mut cursor, self.received_at) {
                Ok(reading) => {
                    self.pos = cursor.pos;
                    Some(Ok(reading))
                }
                Err(rejection) => {
                    self.pos = start + 1;
                    Some(Err(rejection))
                }
            };
        }
    }
}

fn parse_segment(
    cursor: &mut Cursor<'_>,
    received_at: DateTime<Utc>,
) -> Result<ZoneReading, DecodeRejection> {
    cursor.expect("S")?;
    let soil_zone = cursor.number("zone")?;
    cursor.expect("=")?;
    let soil = cursor.number("soil")?;
    cursor.expect("(")?;
    cursor.expect("M")?;
    let min = cursor.number("min")?;
    cursor.expect("..")?;
    cursor.expect("X")?;
    let max = cursor.number("max")?;
    cursor.expect(")")?;
    cursor.expect("Z")?;
    let mode_zone = cursor.number("zone")?;
    cursor.expect("=")?;
    let word = cursor.word();

    if soil_zone != mode_zone {
        return Err(DecodeRejection::ZoneMismatch {
            soil: soil_zone,
            mode: mode_zone,
        });
    }
    let zone = ZoneIndex::new(soil_zone).map_err(|_| DecodeRejection::ZeroZone)?;
    let mode: ZoneMode = word
        .parse()
        .map_err(|_| DecodeRejection::UnknownMode(word.to_string()))?;

    Ok(ZoneReading::new(zone, soil, min, max, mode, received_at))
}

/// Byte cursor over the status text.
///
/// Every token this grammar knows is ASCII, so advancing by token length
/// always lands on a char boundary.
struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn at(text: &'a str, pos: usize) -> Self {
        Self { text, pos }
    }

    fn rest(&self) -> &'a str {
        self.text.get(self.pos..).unwrap_or("")
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    /// Returns `true` if the text here reads `S<k>=`.
    fn opens_segment(&mut self) -> bool {
        self.expect("S").is_ok() && self.number("zone").is_ok() && self.expect("=").is_ok()
    }

    fn expect(&mut self, literal: &'static str) -> Result<(), DecodeRejection> {
        self.skip_whitespace();
        if self.rest().starts_with(literal) {
            self.pos += literal.len();
            Ok(())
        } else {
            Err(DecodeRejection::Expected {
                expected: literal,
                offset: self.pos,
            })
        }
    }

    fn number(&mut self, field: &'static str) -> Result<u32, DecodeRejection> {
        self.skip_whitespace();
        let rest = self.rest();
        let len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let invalid = DecodeRejection::InvalidNumber {
            field,
            offset: self.pos,
        };
        if len == 0 {
            return Err(invalid);
        }
        let value = rest[..len].parse().map_err(|_| invalid)?;
        self.pos += len;
        Ok(value)
    }

    fn word(&mut self) -> &'a str {
        self.skip_whitespace();
        let rest = self.rest();
        let len = rest.bytes().take_while(u8::is_ascii_alphabetic).count();
        self.pos += len;
        &rest[..len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap()
    }

    fn zone(n: u32) -> ZoneIndex {
        ZoneIndex::new(n).unwrap()
    }

    #[test]
    fn decodes_two_zones_in_order() {
        let readings = decode(
            "S1=1830(M1200..X2000) Z1=OFF | S2=1950(M1200..X2000) Z2=ON",
            at(),
        );

        assert_eq!(readings.len(), 2);

        assert_eq!(readings[0].zone(), zone(1));
        assert_eq!(readings[0].soil(), 1830);
        assert_eq!(readings[0].min_threshold(), 1200);
        assert_eq!(readings[0].max_threshold(), 2000);
        assert_eq!(readings[0].mode(), ZoneMode::Off);
        assert_eq!(readings[0].timestamp(), at());

        assert_eq!(readings[1].zone(), zone(2));
        assert_eq!(readings[1].soil(), 1950);
        assert_eq!(readings[1].mode(), ZoneMode::On);
    }

    #[test]
    fn mismatched_indices_yield_nothing() {
        assert!(decode("S1=100(M0..X10) Z2=ON", at()).is_empty());
    }

    #[test]
    fn mismatch_is_reported_by_scan() {
        let results: Vec<_> = scan("S1=100(M0..X10) Z2=ON", at()).collect();
        assert_eq!(
            results,
            vec![Err(DecodeRejection::ZoneMismatch { soil: 1, mode: 2 })]
        );
    }

    #[test]
    fn mode_is_case_insensitive() {
        let readings = decode("S3=5(M1..X9) Z3=auto", at());
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].mode(), ZoneMode::Auto);
    }

    #[test]
    fn whitespace_between_tokens_is_ignored() {
        let readings = decode("S1 = 42 ( M 10 .. X 90 )   Z1 = On", at());
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].soil(), 42);
        assert_eq!(readings[0].min_threshold(), 10);
        assert_eq!(readings[0].max_threshold(), 90);
    }

    #[test]
    fn device_flags_are_ignored() {
        let line = "PUMP=AUTO(OFF) | LIGHT=ON | S1=1830(M1200..X2000) Z1=AUTO | SHOW ok";
        let readings = decode(line, at());
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].zone(), zone(1));
    }

    #[test]
    fn plain_text_produces_no_scan_items() {
        assert_eq!(scan("STATUS: SHOW SOON", at()).count(), 0);
        assert!(decode("", at()).is_empty());
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let results: Vec<_> = scan("S1=1(M1..X2) Z1=TOGGLE", at()).collect();
        assert_eq!(
            results,
            vec![Err(DecodeRejection::UnknownMode("TOGGLE".to_string()))]
        );
    }

    #[test]
    fn mode_must_be_a_whole_word() {
        assert!(decode("S1=1(M1..X2) Z1=ONLINE", at()).is_empty());
    }

    #[test]
    fn zone_zero_is_rejected() {
        let results: Vec<_> = scan("S0=1(M1..X2) Z0=ON", at()).collect();
        assert_eq!(results, vec![Err(DecodeRejection::ZeroZone)]);
    }

    #[test]
    fn negative_numbers_do_not_match() {
        assert!(decode("S1=-5(M1..X2) Z1=ON", at()).is_empty());
    }

    #[test]
    fn overflowing_numbers_are_rejected() {
        assert!(decode("S1=99999999999(M1..X2) Z1=ON", at()).is_empty());
    }

    #[test]
    fn broken_segment_does_not_hide_following_one() {
        let line = "S1=5 S2=100(M0..X10) Z2=ON";
        let results: Vec<_> = scan(line, at()).collect();

        assert_eq!(results.len(), 2);
        assert!(results[0].is_err());
        let reading = results[1].as_ref().unwrap();
        assert_eq!(reading.zone(), zone(2));
    }

    #[test]
    fn segments_need_no_whitespace() {
        let readings = decode("S1=1(M0..X5)Z1=ON|S2=2(M0..X5)Z2=OFF", at());
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].mode(), ZoneMode::On);
        assert_eq!(readings[1].mode(), ZoneMode::Off);
    }

    #[test]
    fn non_ascii_text_is_skipped() {
        let readings = decode("Статус ✓ S1=7(M1..X9) Z1=OFF ✓", at());
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].soil(), 7);
    }
}
