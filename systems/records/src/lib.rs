#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure decoder for the semicolon/comma level record format.
//!
//! Level text is a list of `;`-terminated segments. The first segment is the
//! level header, every following segment describes one object as an
//! alternating `key,value` list. Decoding never aborts on a single bad
//! object: malformed segments are reported as [`Diagnostic`] values and
//! skipped.

mod header;
mod object;

use std::str::FromStr;

use level_scene_core::{Diagnostic, LoadError};
use log::warn;

pub use header::{ColorEntry, HeaderField, LevelHeader};
pub use object::{
    classify, placed_object, speed_portal_tier, ColorTriggerRecord, ObjectKey, ObjectRecordKind,
    COLOR_TRIGGER_TYPE,
};

const SEGMENT_DELIMITER: char = ';';
const FIELD_DELIMITER: char = ',';

/// Ordered key/value pairs decoded from one level segment.
///
/// Values remain strings until consumed through a typed accessor. When a key
/// repeats, the last occurrence wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    /// Splits `segment` on `separator` into alternating keys and values.
    ///
    /// An empty segment yields an empty record. Returns `None` when the
    /// number of fields is odd.
    #[must_use]
    pub fn parse(segment: &str, separator: char) -> Option<Self> {
        if segment.is_empty() {
            return Some(Self::default());
        }

        let parts: Vec<&str> = segment.split(separator).collect();
        if parts.len() % 2 != 0 {
            return None;
        }

        let fields = parts
            .chunks_exact(2)
            .map(|pair| (pair[0].to_owned(), pair[1].to_owned()))
            .collect();
        Some(Self { fields })
    }

    /// Raw value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, value)| value.as_str())
    }

    /// Parses the value stored under `key`.
    ///
    /// Returns `Ok(None)` when the key is absent or empty and `Err` with the
    /// raw text when it cannot be parsed.
    pub fn parse_field<T: FromStr>(&self, key: &str) -> Result<Option<T>, String> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|_| format!("field `{key}` has unparsable value `{raw}`")),
        }
    }

    /// Interprets the value stored under `key` as a `0`/`1` flag.
    ///
    /// Missing keys and any value other than a non-zero number read as `false`.
    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        self.get(key)
            .and_then(|raw| raw.trim().parse::<f32>().ok())
            .is_some_and(|value| value != 0.0)
    }

    /// Iterates over the key/value pairs in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Number of key/value pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Reports whether the record holds no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Object record tagged with the index of the segment it was decoded from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectSegment {
    /// Zero-based segment index within the level text (the header is segment 0).
    pub segment: usize,
    /// Decoded key/value pairs.
    pub record: Record,
}

/// Result of decoding a complete level text.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedLevel {
    /// Interpreted header segment.
    pub header: LevelHeader,
    /// Object records in file order.
    pub objects: Vec<ObjectSegment>,
    /// Problems encountered while decoding.
    pub diagnostics: Vec<Diagnostic>,
}

/// Decodes raw level text into a header and ordered object records.
///
/// Fails when the text is empty, lacks the trailing `;` terminator, or the
/// header declares a base speed outside the supported tiers.
pub fn decode_level(text: &str) -> Result<DecodedLevel, LoadError> {
    let text = text.trim_end();
    if text.is_empty() {
        return Err(LoadError::MissingHeader);
    }

    let mut segments: Vec<&str> = text.split(SEGMENT_DELIMITER).collect();
    match segments.pop() {
        Some("") => {}
        _ => return Err(LoadError::Unterminated),
    }
    if segments.is_empty() {
        return Err(LoadError::MissingHeader);
    }

    let mut diagnostics = Vec::new();
    let header_segment = segments.remove(0);
    let header = match Record::parse(header_segment, FIELD_DELIMITER) {
        Some(record) => LevelHeader::from_record(&record, &mut diagnostics)?,
        None => {
            report(
                &mut diagnostics,
                Diagnostic::MalformedRecord {
                    segment: 0,
                    reason: "header has an odd number of fields".to_owned(),
                },
            );
            LevelHeader::default()
        }
    };

    let mut objects = Vec::with_capacity(segments.len());
    for (offset, segment) in segments.into_iter().enumerate() {
        let index = offset + 1;
        match Record::parse(segment, FIELD_DELIMITER) {
            Some(record) => objects.push(ObjectSegment {
                segment: index,
                record,
            }),
            None => report(
                &mut diagnostics,
                Diagnostic::MalformedRecord {
                    segment: index,
                    reason: "odd number of fields".to_owned(),
                },
            ),
        }
    }

    Ok(DecodedLevel {
        header,
        objects,
        diagnostics,
    })
}

pub(crate) fn report(diagnostics: &mut Vec<Diagnostic>, diagnostic: Diagnostic) {
    warn!("{diagnostic}");
    diagnostics.push(diagnostic);
}
