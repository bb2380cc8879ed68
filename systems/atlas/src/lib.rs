#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Sprite atlas catalog and object sprite definitions.
//!
//! The catalog is an explicitly constructed value: every packed sheet is
//! registered with its metadata document and texture unit, and the frames it
//! declares become addressable by sprite file name. Object definitions
//! describe which frames compose each object type and are resolved into
//! [`FrameNode`] trees once, at load time.

mod definitions;
pub mod plist;

use std::collections::HashMap;

use glam::Vec2;
use level_scene_core::LoadError;
use log::{info, warn};
use serde::de::DeserializeOwned;

pub use definitions::{ColorRole, FrameNode, ObjectDefinition, ObjectDefinitions};
use plist::PlistValue;

const ULTRA_DENSITY_SUFFIX: &str = "-uhd";
const HIGH_DENSITY_SUFFIX: &str = "-hd";

/// Index of a registered atlas page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtlasId(u16);

impl AtlasId {
    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

/// Pixel density a sheet was exported at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Density {
    /// Base resolution, one pixel per world unit.
    Standard,
    /// Double resolution (`-hd`).
    High,
    /// Quadruple resolution (`-uhd`).
    Ultra,
}

impl Density {
    /// Detects the density from a texture file name such as `GJ_GameSheet-uhd.png`.
    #[must_use]
    pub fn from_file_name(name: &str) -> Self {
        let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
        if stem.ends_with(ULTRA_DENSITY_SUFFIX) {
            Self::Ultra
        } else if stem.ends_with(HIGH_DENSITY_SUFFIX) {
            Self::High
        } else {
            Self::Standard
        }
    }

    /// Number of sheet pixels covering one world unit.
    #[must_use]
    pub const fn divisor(&self) -> f32 {
        match self {
            Self::Standard => 1.0,
            Self::High => 2.0,
            Self::Ultra => 4.0,
        }
    }

    /// Short label used in diagnostics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Standard => "sd",
            Self::High => "hd",
            Self::Ultra => "uhd",
        }
    }

    /// Reports whether the geometry factory can scale frames of this density.
    #[must_use]
    pub const fn is_supported(&self) -> bool {
        matches!(self, Self::Ultra)
    }
}

/// Axis-aligned rectangle in sheet pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Horizontal extent.
    pub w: f32,
    /// Vertical extent.
    pub h: f32,
}

/// Packed sheet registered with the catalog.
#[derive(Clone, Debug, PartialEq)]
pub struct AtlasPage {
    /// Name the sheet was registered under.
    pub name: String,
    /// Texture file declared by the metadata.
    pub texture_file: String,
    /// Sheet size in pixels.
    pub size: Vec2,
    /// Pixel density of the sheet.
    pub density: Density,
    /// Texture unit the rendering backend binds the sheet to.
    pub texture_unit: u32,
}

/// Named sub-rectangle of a packed sheet.
///
/// For frames stored rotated on the sheet, `sprite_size`, `source_size` and
/// the size of `source_rect` are already swapped into sheet orientation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AtlasFrame {
    /// Sheet containing the frame.
    pub atlas: AtlasId,
    /// Region of the sheet covered by the frame.
    pub source_rect: Rect,
    /// Untrimmed size of the original image.
    pub source_size: Vec2,
    /// Trimmed size of the packed image.
    pub sprite_size: Vec2,
    /// Offset of the trimmed image from the untrimmed centre, in pixels (Y-up).
    pub sprite_offset: Vec2,
    /// Whether the frame was packed rotated by 90 degrees.
    pub rotated_on_sheet: bool,
}

/// Summary of a successful atlas registration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterReport {
    /// Identifier assigned to the sheet.
    pub atlas: AtlasId,
    /// Number of frames the sheet declared.
    pub frames: usize,
    /// Frame names that previously belonged to a different sheet.
    pub replaced: Vec<String>,
}

/// Registry of packed sheets and the frames they contain.
#[derive(Clone, Debug, Default)]
pub struct AtlasCatalog {
    pages: Vec<AtlasPage>,
    frames: HashMap<String, AtlasFrame>,
}

impl AtlasCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a sheet from its metadata document.
    ///
    /// Registering a name twice replaces the earlier page in place. A frame
    /// name already provided by another sheet is overwritten and reported.
    /// Sheets with a density other than `-uhd` are rejected.
    pub fn register(
        &mut self,
        name: &str,
        texture_unit: u32,
        document: &str,
    ) -> Result<RegisterReport, LoadError> {
        let malformed = |reason: String| LoadError::MalformedAtlas {
            atlas: name.to_owned(),
            reason,
        };

        let root = plist::parse(document).map_err(|error| malformed(error.to_string()))?;
        let metadata = root
            .get("metadata")
            .ok_or_else(|| malformed("missing `metadata` dictionary".to_owned()))?;
        let texture_file = metadata
            .get("realTextureFileName")
            .or_else(|| metadata.get("textureFileName"))
            .and_then(PlistValue::as_str)
            .unwrap_or(name)
            .to_owned();

        let density = Density::from_file_name(&texture_file);
        if !density.is_supported() {
            return Err(LoadError::UnsupportedDensity {
                atlas: name.to_owned(),
                density: density.label().to_owned(),
            });
        }

        let size = metadata
            .get("size")
            .and_then(PlistValue::as_str)
            .ok_or_else(|| malformed("missing metadata `size`".to_owned()))?;
        let [width, height] = parse_literal::<[f32; 2]>(size).map_err(&malformed)?;

        let existing = self.pages.iter().position(|page| page.name == name);
        let atlas = atlas_id(existing.unwrap_or(self.pages.len()), name)?;

        let frames = root
            .get("frames")
            .and_then(PlistValue::as_dict)
            .ok_or_else(|| malformed("missing `frames` dictionary".to_owned()))?;

        let mut parsed = Vec::with_capacity(frames.len());
        for (frame_name, value) in frames {
            let frame = parse_frame(atlas, value)
                .map_err(|reason| malformed(format!("frame `{frame_name}`: {reason}")))?;
            parsed.push((frame_name.clone(), frame));
        }

        let page = AtlasPage {
            name: name.to_owned(),
            texture_file,
            size: Vec2::new(width, height),
            density,
            texture_unit,
        };
        match existing {
            Some(index) => self.pages[index] = page,
            None => self.pages.push(page),
        }

        let mut replaced = Vec::new();
        for (frame_name, frame) in parsed {
            if let Some(previous) = self.frames.insert(frame_name.clone(), frame) {
                if previous.atlas != atlas {
                    warn!("sprite `{frame_name}` from atlas {name} replaces an earlier definition");
                    replaced.push(frame_name);
                }
            }
        }

        info!("registered atlas {name} with {} frames", frames.len());
        Ok(RegisterReport {
            atlas,
            frames: frames.len(),
            replaced,
        })
    }

    /// Frame registered under a sprite file name.
    #[must_use]
    pub fn frame(&self, sprite: &str) -> Option<&AtlasFrame> {
        self.frames.get(sprite)
    }

    /// Page registered under an identifier.
    #[must_use]
    pub fn page(&self, atlas: AtlasId) -> Option<&AtlasPage> {
        self.pages.get(usize::from(atlas.0))
    }

    /// Registered pages in registration order.
    #[must_use]
    pub fn pages(&self) -> &[AtlasPage] {
        &self.pages
    }

    /// Number of addressable frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Reports whether no frame is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

fn atlas_id(index: usize, name: &str) -> Result<AtlasId, LoadError> {
    u16::try_from(index)
        .map(AtlasId)
        .map_err(|_| LoadError::MalformedAtlas {
            atlas: name.to_owned(),
            reason: "too many atlases registered".to_owned(),
        })
}

fn first_of<'v>(value: &'v PlistValue, names: &[&str]) -> Option<&'v PlistValue> {
    names.iter().find_map(|name| value.get(name))
}

fn parse_frame(atlas: AtlasId, value: &PlistValue) -> Result<AtlasFrame, String> {
    let rect = first_of(value, &["textureRect", "frame"])
        .and_then(PlistValue::as_str)
        .ok_or("missing `textureRect`")?;
    let [[x, y], [w, h]] = parse_literal::<[[f32; 2]; 2]>(rect)?;

    let pair = |names: &[&str], fallback: [f32; 2]| -> Result<[f32; 2], String> {
        match first_of(value, names).and_then(PlistValue::as_str) {
            Some(raw) => parse_literal(raw),
            None => Ok(fallback),
        }
    };
    let sprite_size = pair(&["spriteSize"], [w, h])?;
    let source_size = pair(&["spriteSourceSize", "sourceSize"], sprite_size)?;
    let sprite_offset = pair(&["spriteOffset", "offset"], [0.0, 0.0])?;
    let rotated_on_sheet = first_of(value, &["textureRotated", "rotated"])
        .and_then(PlistValue::as_bool)
        .unwrap_or(false);

    let oriented = |[w, h]: [f32; 2]| {
        if rotated_on_sheet {
            Vec2::new(h, w)
        } else {
            Vec2::new(w, h)
        }
    };
    let rect_size = oriented([w, h]);

    Ok(AtlasFrame {
        atlas,
        source_rect: Rect {
            x,
            y,
            w: rect_size.x,
            h: rect_size.y,
        },
        source_size: oriented(source_size),
        sprite_size: oriented(sprite_size),
        sprite_offset: Vec2::new(sprite_offset[0], sprite_offset[1]),
        rotated_on_sheet,
    })
}

/// Parses a brace literal such as `{{1,2},{3,4}}` by rewriting it as JSON.
fn parse_literal<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    let normalised = raw.replace('{', "[").replace('}', "]");
    serde_json::from_str(&normalised)
        .map_err(|error| format!("`{raw}` is not a valid literal: {error}"))
}
