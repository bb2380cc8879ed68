#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the level scene engine.
//!
//! This crate defines the vocabulary that connects the record decoder, the
//! atlas catalog, the geometry factory, the color channel engine and the
//! rendering adapters. Systems decode level text into [`PlacedObject`]
//! values, resolve sprites and colors against [`ChannelId`] slots, and
//! report recoverable problems as [`Diagnostic`] values while fatal ones
//! surface as [`LoadError`].

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Width of a spatial section measured in world units along the X axis.
pub const SECTION_WIDTH: f32 = 100.0;

/// Number of addressable color channel slots.
pub const CHANNEL_COUNT: usize = 1012;

/// Object type identifier used for text objects, which are never rasterised.
pub const TEXT_OBJECT_TYPE: ObjectTypeId = ObjectTypeId::new(914);

/// RGBA color with every component in the range `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    /// Red intensity.
    pub r: f32,
    /// Green intensity.
    pub g: f32,
    /// Blue intensity.
    pub b: f32,
    /// Alpha intensity.
    pub a: f32,
}

impl Rgba {
    /// Opaque white, the value of every channel before a level is applied.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    /// Opaque black, the permanent value of [`ChannelId::BLACK`].
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates a color from byte RGB values and a floating point alpha.
    #[must_use]
    pub fn from_rgb_u8(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self {
            r: f32::from(r) / 255.0,
            g: f32::from(g) / 255.0,
            b: f32::from(b) / 255.0,
            a,
        }
    }

    /// Linearly interpolates every component towards `target`.
    ///
    /// `t` is clamped to `0.0..=1.0`; `t == 1.0` yields `target` exactly.
    #[must_use]
    pub fn lerp(self, target: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        if t >= 1.0 {
            return target;
        }

        Self {
            r: lerp_component(self.r, target.r, t),
            g: lerp_component(self.g, target.g, t),
            b: lerp_component(self.b, target.b, t),
            a: lerp_component(self.a, target.a, t),
        }
    }

    /// Components in `[r, g, b, a]` order.
    #[must_use]
    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}

fn lerp_component(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Index of a color channel slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(u16);

impl ChannelId {
    /// Level background.
    pub const BACKGROUND: Self = Self(1000);
    /// First ground layer.
    pub const GROUND_1: Self = Self(1001);
    /// Ground guide line.
    pub const LINE: Self = Self(1002);
    /// 3D line.
    pub const LINE_3D: Self = Self(1003);
    /// Default object color.
    pub const OBJECT: Self = Self(1004);
    /// Primary player color.
    pub const PLAYER_1: Self = Self(1005);
    /// Secondary player color.
    pub const PLAYER_2: Self = Self(1006);
    /// Light background.
    pub const LIGHT_BACKGROUND: Self = Self(1007);
    /// Fallback channel used when neither the object nor its definition names one.
    pub const FALLBACK: Self = Self(1008);
    /// Second ground layer.
    pub const GROUND_2: Self = Self(1009);
    /// Permanently opaque black.
    pub const BLACK: Self = Self(1010);
    /// Synthetic editor grid alpha, owned by the viewport rather than the level.
    pub const GRID_FADE: Self = Self(1011);

    /// Creates a channel identifier when `value` addresses an existing slot.
    #[must_use]
    pub const fn new(value: u16) -> Option<Self> {
        if (value as usize) < CHANNEL_COUNT {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Retrieves the numeric slot index.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }

    /// Slot index usable for table addressing.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// Reports whether the channel is driven by something other than level content.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.0 == Self::BLACK.0 || self.0 == Self::GRID_FADE.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an object type as written in level records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectTypeId(u32);

impl ObjectTypeId {
    /// Creates a new object type identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ObjectTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Signed index of a fixed-width spatial bucket along the X axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectionId(i32);

impl SectionId {
    /// Creates a section identifier from its raw index.
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Section containing the provided X coordinate (`floor(x / 100)`).
    ///
    /// Negative coordinates land in negative sections. Non-finite inputs
    /// saturate to the extreme sections.
    #[must_use]
    pub fn containing(x: f32) -> Self {
        Self((x / SECTION_WIDTH).floor() as i32)
    }

    /// Retrieves the raw section index.
    #[must_use]
    pub const fn get(&self) -> i32 {
        self.0
    }
}

/// Horizontal travel speed selected by the level header or a speed portal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SpeedTier {
    /// Tier 0.
    Slow,
    /// Tier 1, the default starting speed.
    Normal,
    /// Tier 2.
    Fast,
    /// Tier 3.
    Faster,
    /// Tier 4.
    Fastest,
}

impl SpeedTier {
    const UNITS_PER_SECOND: [f32; 5] = [258.0, 312.0, 388.8, 468.0, 578.1];

    /// Resolves a numeric tier, failing for anything outside `0..=4`.
    pub fn from_index(index: i64) -> Result<Self, LoadError> {
        match index {
            0 => Ok(Self::Slow),
            1 => Ok(Self::Normal),
            2 => Ok(Self::Fast),
            3 => Ok(Self::Faster),
            4 => Ok(Self::Fastest),
            _ => Err(LoadError::InvalidSpeedTier { tier: index }),
        }
    }

    /// Numeric tier in `0..=4`.
    #[must_use]
    pub const fn index(&self) -> usize {
        match self {
            Self::Slow => 0,
            Self::Normal => 1,
            Self::Fast => 2,
            Self::Faster => 3,
            Self::Fastest => 4,
        }
    }

    /// Horizontal travel speed in world units per second.
    #[must_use]
    pub const fn units_per_second(&self) -> f32 {
        Self::UNITS_PER_SECOND[self.index()]
    }
}

impl Default for SpeedTier {
    fn default() -> Self {
        Self::Normal
    }
}

/// Object placed in a level, positioned in engine space (Y grows downwards).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlacedObject {
    /// Type of object, used to look up its sprite definition.
    pub object_type: ObjectTypeId,
    /// Horizontal position in world units.
    pub x: f32,
    /// Vertical position in world units, already negated from the record's Y-up value.
    pub y: f32,
    /// Whether the object is mirrored horizontally.
    pub flip_x: bool,
    /// Whether the object is mirrored vertically.
    pub flip_y: bool,
    /// Clockwise rotation in degrees.
    pub rotation_degrees: f32,
    /// Channel assigned to the object's base sprites, if the record names one.
    pub main_channel: Option<ChannelId>,
    /// Channel assigned to the object's detail sprites, if the record names one.
    pub secondary_channel: Option<ChannelId>,
    /// Section the object is bucketed into.
    pub section: SectionId,
}

/// Recoverable problem recorded while loading a level.
///
/// Diagnostics never abort a load; the affected segment, color entry or
/// sprite node is skipped and the rest of the level continues.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Diagnostic {
    /// A level segment could not be decoded into a record.
    #[error("record {segment} is malformed: {reason}")]
    MalformedRecord {
        /// Zero-based segment index within the level text, header included.
        segment: usize,
        /// Human readable description of the defect.
        reason: String,
    },
    /// A header color entry was rejected or clamped.
    #[error("color entry `{entry}` is malformed: {reason}")]
    MalformedColor {
        /// Raw text of the offending entry.
        entry: String,
        /// Human readable description of the defect.
        reason: String,
    },
    /// A record referenced a channel outside the color table.
    #[error("record {segment} references channel {channel} outside the color table")]
    InvalidChannel {
        /// Zero-based segment index within the level text.
        segment: usize,
        /// Channel index requested by the record.
        channel: i64,
    },
    /// An object's definition referenced a sprite absent from the atlas catalog.
    #[error("object type {object_type} references missing sprite `{sprite}`")]
    MissingAsset {
        /// Type of the object being built.
        object_type: ObjectTypeId,
        /// Sprite file name that could not be found.
        sprite: String,
    },
    /// An object type has no sprite definition.
    #[error("object type {object_type} has no sprite definition")]
    MissingDefinition {
        /// Type of the object being built.
        object_type: ObjectTypeId,
    },
}

/// Fatal error that prevents a level or asset from being used.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum LoadError {
    /// The level text contained no header segment.
    #[error("level text is empty")]
    MissingHeader,
    /// The level text did not end with the `;` terminator.
    #[error("level text is missing its trailing `;` terminator")]
    Unterminated,
    /// An atlas uses a pixel density the geometry factory cannot scale.
    #[error("atlas `{atlas}` uses unsupported pixel density `{density}`")]
    UnsupportedDensity {
        /// Name of the atlas being registered.
        atlas: String,
        /// Density suffix detected on the texture file name.
        density: String,
    },
    /// A speed tier outside `0..=4` was requested.
    #[error("speed tier {tier} is outside the supported range 0..=4")]
    InvalidSpeedTier {
        /// Tier that failed validation.
        tier: i64,
    },
    /// An atlas metadata document could not be parsed.
    #[error("atlas `{atlas}` metadata is malformed: {reason}")]
    MalformedAtlas {
        /// Name of the atlas being registered.
        atlas: String,
        /// Human readable description of the defect.
        reason: String,
    },
    /// The object definition table could not be parsed.
    #[error("object definitions are malformed: {reason}")]
    MalformedDefinitions {
        /// Human readable description of the defect.
        reason: String,
    },
}
