//! Interpretation of the level header segment.

use level_scene_core::{ChannelId, Diagnostic, LoadError, Rgba, SpeedTier};
use log::debug;

use crate::{report, Record};

const COLOR_ENTRY_DELIMITER: char = '|';
const COLOR_FIELD_DELIMITER: char = '_';

const COLOR_KEY_RED: &str = "1";
const COLOR_KEY_GREEN: &str = "2";
const COLOR_KEY_BLUE: &str = "3";
const COLOR_KEY_CHANNEL: &str = "6";
const COLOR_KEY_OPACITY: &str = "7";

/// Component value assumed when a color entry omits red, green or blue.
const DEFAULT_COMPONENT: f32 = 255.0;
/// Channel assumed when a color entry omits its target.
const DEFAULT_CHANNEL: i64 = 0;
/// Opacity flag assumed when a color entry omits it.
const DEFAULT_OPACITY: i64 = 1;

/// Header keys understood by the decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HeaderField {
    /// `kS38`: initial color channel table.
    ColorChannels,
    /// `kA4`: starting speed index.
    BaseSpeed,
    /// `kA2`: starting game mode.
    GameMode,
    /// `kA6`: background texture id.
    Background,
    /// `kA7`: ground texture id.
    Ground,
    /// `kA13`: song offset in seconds.
    SongOffset,
}

impl HeaderField {
    /// Every header field in declaration order.
    pub const ALL: [Self; 6] = [
        Self::ColorChannels,
        Self::BaseSpeed,
        Self::GameMode,
        Self::Background,
        Self::Ground,
        Self::SongOffset,
    ];

    /// Key used for the field inside the header segment.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::ColorChannels => "kS38",
            Self::BaseSpeed => "kA4",
            Self::GameMode => "kA2",
            Self::Background => "kA6",
            Self::Ground => "kA7",
            Self::SongOffset => "kA13",
        }
    }

    /// Looks up the field associated with a raw header key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }
}

/// Color assigned to a channel by the header.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorEntry {
    /// Channel receiving the color.
    pub channel: ChannelId,
    /// Initial color of the channel.
    pub color: Rgba,
}

impl ColorEntry {
    /// Parses a single `_`-delimited header color entry.
    ///
    /// Entries with an odd number of fields, unparsable components or a
    /// channel outside the table are rejected. Opacity must be a `0`/`1`
    /// flag; any other value is clamped and reported.
    pub fn parse(entry: &str, diagnostics: &mut Vec<Diagnostic>) -> Option<Self> {
        let Some(record) = Record::parse(entry, COLOR_FIELD_DELIMITER) else {
            report(
                diagnostics,
                Diagnostic::MalformedColor {
                    entry: entry.to_owned(),
                    reason: "odd number of fields".to_owned(),
                },
            );
            return None;
        };

        let malformed = |reason: String| Diagnostic::MalformedColor {
            entry: entry.to_owned(),
            reason,
        };

        let mut components = [0.0_f32; 3];
        for (slot, key) in components
            .iter_mut()
            .zip([COLOR_KEY_RED, COLOR_KEY_GREEN, COLOR_KEY_BLUE])
        {
            match record.parse_field::<f32>(key) {
                Ok(value) => {
                    *slot = value.unwrap_or(DEFAULT_COMPONENT).clamp(0.0, 255.0) / 255.0;
                }
                Err(reason) => {
                    report(diagnostics, malformed(reason));
                    return None;
                }
            }
        }

        let channel = match record.parse_field::<i64>(COLOR_KEY_CHANNEL) {
            Ok(value) => value.unwrap_or(DEFAULT_CHANNEL),
            Err(reason) => {
                report(diagnostics, malformed(reason));
                return None;
            }
        };
        let Some(channel) = u16::try_from(channel).ok().and_then(ChannelId::new) else {
            report(
                diagnostics,
                Diagnostic::InvalidChannel {
                    segment: 0,
                    channel,
                },
            );
            return None;
        };

        let opacity = match record.parse_field::<f32>(COLOR_KEY_OPACITY) {
            Ok(value) => value.map_or(DEFAULT_OPACITY, |value| value.trunc() as i64),
            Err(reason) => {
                report(diagnostics, malformed(reason));
                return None;
            }
        };
        if !(0..=1).contains(&opacity) {
            report(
                diagnostics,
                malformed(format!("opacity flag must be 0 or 1, found {opacity}")),
            );
        }
        let alpha = opacity.clamp(0, 1) as f32;

        Some(Self {
            channel,
            color: Rgba::new(components[0], components[1], components[2], alpha),
        })
    }
}

/// Level-wide settings decoded from the header segment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LevelHeader {
    /// Initial channel colors in header order.
    pub colors: Vec<ColorEntry>,
    /// Speed used before the first speed portal.
    pub base_speed: SpeedTier,
    /// Starting game mode index, if declared.
    pub game_mode: Option<i64>,
    /// Background texture id, if declared.
    pub background: Option<u32>,
    /// Ground texture id, if declared.
    pub ground: Option<u32>,
    /// Song offset in seconds, if declared.
    pub song_offset: Option<f32>,
}

impl LevelHeader {
    /// Interprets a decoded header record.
    ///
    /// The base speed tier is `1 + kA4`; a tier outside `0..=4` is fatal.
    pub fn from_record(
        record: &Record,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Self, LoadError> {
        let mut header = Self::default();

        for (key, value) in record.iter() {
            let Some(field) = HeaderField::from_key(key) else {
                debug!("ignoring header key `{key}`");
                continue;
            };

            match field {
                HeaderField::ColorChannels => {
                    header.colors = parse_color_table(value, diagnostics);
                }
                HeaderField::BaseSpeed => match value.trim().parse::<i64>() {
                    Ok(index) => {
                        header.base_speed = SpeedTier::from_index(index.saturating_add(1))?;
                    }
                    Err(_) => report(diagnostics, malformed_header(field, value)),
                },
                HeaderField::GameMode => {
                    header.game_mode = parse_optional(field, value, diagnostics);
                }
                HeaderField::Background => {
                    header.background = parse_optional(field, value, diagnostics);
                }
                HeaderField::Ground => {
                    header.ground = parse_optional(field, value, diagnostics);
                }
                HeaderField::SongOffset => {
                    header.song_offset = parse_optional(field, value, diagnostics);
                }
            }
        }

        Ok(header)
    }
}

fn parse_color_table(value: &str, diagnostics: &mut Vec<Diagnostic>) -> Vec<ColorEntry> {
    let mut entries: Vec<&str> = value.split(COLOR_ENTRY_DELIMITER).collect();
    if entries.last() == Some(&"") {
        let _ = entries.pop();
    }

    entries
        .into_iter()
        .filter_map(|entry| ColorEntry::parse(entry, diagnostics))
        .collect()
}

fn parse_optional<T: std::str::FromStr>(
    field: HeaderField,
    value: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<T> {
    match value.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            report(diagnostics, malformed_header(field, value));
            None
        }
    }
}

fn malformed_header(field: HeaderField, value: &str) -> Diagnostic {
    Diagnostic::MalformedRecord {
        segment: 0,
        reason: format!("header field `{}` has unparsable value `{value}`", field.key()),
    }
}
