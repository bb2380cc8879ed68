#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative level state assembled from level text.
//!
//! [`Level::from_text`] runs the whole load pipeline: the record decoder
//! splits the text, header colors seed the color table, speed portals and
//! color triggers feed the color channel engine, and every drawable object
//! gets its sprite geometry built once and is bucketed into the spatial
//! index. The resulting level is immutable apart from its annotations.
//! Read access goes through the [`query`] module.

mod sections;

use level_scene_core::{Diagnostic, LoadError, PlacedObject};
use level_scene_system_atlas::{AtlasCatalog, ObjectDefinitions};
use level_scene_system_color_channels::{
    ColorChannelEngine, ColorTable, ColorTrigger, SpeedPortal, SpeedProfile,
};
use level_scene_system_geometry::{build_object_geometry, ChannelDefaults, SpriteGeometry};
use level_scene_system_records::{
    classify, decode_level, placed_object, LevelHeader, ObjectRecordKind,
};
use log::info;

pub use sections::SpatialIndex;

/// Options applied while loading a level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Channels coloring sprites whose object and definition name none.
    pub channel_defaults: ChannelDefaults,
}

/// Placed object together with its cached sprite geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelObject {
    /// Decoded placement of the object.
    pub placed: PlacedObject,
    /// Quads drawn for the object, in definition order.
    pub geometry: Vec<SpriteGeometry>,
}

/// Opaque payload pinned to a world position for overlays.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    /// Horizontal world position.
    pub x: f32,
    /// Vertical world position.
    pub y: f32,
    /// Payload interpreted only by the overlay.
    pub payload: String,
}

/// Loaded level ready to be queried by rendering adapters.
#[derive(Clone, Debug)]
pub struct Level {
    header: LevelHeader,
    objects: Vec<LevelObject>,
    sections: SpatialIndex,
    colors: ColorChannelEngine,
    annotations: Vec<Annotation>,
    diagnostics: Vec<Diagnostic>,
}

impl Level {
    /// Loads a level from its text against the provided sprite assets.
    ///
    /// Recoverable problems are collected on the level and available through
    /// [`query::diagnostics`]. Color triggers drive the color engine and are
    /// not placed in the scene.
    pub fn from_text(
        text: &str,
        catalog: &AtlasCatalog,
        definitions: &ObjectDefinitions,
        options: LoadOptions,
    ) -> Result<Self, LoadError> {
        let decoded = decode_level(text)?;
        let mut diagnostics = decoded.diagnostics;

        let mut table = ColorTable::new();
        for entry in &decoded.header.colors {
            table.set(entry.channel, entry.color);
        }

        let mut portals = Vec::new();
        let mut triggers = Vec::new();
        let mut objects = Vec::with_capacity(decoded.objects.len());
        let mut sections = SpatialIndex::new();

        for segment in &decoded.objects {
            let Some(placed) = placed_object(segment, &mut diagnostics) else {
                continue;
            };

            match classify(segment, &placed, &mut diagnostics) {
                ObjectRecordKind::ColorTrigger(record) => {
                    triggers.push(ColorTrigger {
                        x: record.x,
                        channel: record.channel,
                        target: record.target,
                        duration_seconds: record.duration_seconds,
                    });
                    continue;
                }
                ObjectRecordKind::SpeedPortal(tier) => portals.push(SpeedPortal {
                    x: placed.x,
                    tier,
                }),
                ObjectRecordKind::Decoration => {}
            }

            let geometry = build_object_geometry(
                &placed,
                definitions,
                catalog,
                options.channel_defaults,
                &mut diagnostics,
            );
            sections.insert(placed.section, objects.len());
            objects.push(LevelObject { placed, geometry });
        }

        let mut colors =
            ColorChannelEngine::new(table, SpeedProfile::new(decoded.header.base_speed, portals));
        for trigger in triggers {
            colors.add_trigger(trigger);
        }
        colors.load_colors();

        info!(
            "loaded level with {} objects in {} sections, {} color triggers and {} diagnostics",
            objects.len(),
            sections.section_count(),
            colors.trigger_count(),
            diagnostics.len()
        );

        Ok(Self {
            header: decoded.header,
            objects,
            sections,
            colors,
            annotations: Vec::new(),
            diagnostics,
        })
    }

    /// Pins an overlay payload to a world position.
    pub fn annotate(&mut self, x: f32, y: f32, payload: impl Into<String>) {
        self.annotations.push(Annotation {
            x,
            y,
            payload: payload.into(),
        });
    }
}

/// Query functions that expose read-only views of the level.
pub mod query {
    use level_scene_core::Diagnostic;
    use level_scene_system_color_channels::{ColorChannelEngine, ColorTable};
    use level_scene_system_records::LevelHeader;

    use super::{Annotation, Level, LevelObject, SpatialIndex};

    /// Interpreted header of the level.
    #[must_use]
    pub fn header(level: &Level) -> &LevelHeader {
        &level.header
    }

    /// Every placed object in file order.
    #[must_use]
    pub fn objects(level: &Level) -> &[LevelObject] {
        &level.objects
    }

    /// Number of placed objects.
    #[must_use]
    pub fn object_count(level: &Level) -> usize {
        level.objects.len()
    }

    /// Spatial index over the placed objects.
    #[must_use]
    pub fn sections(level: &Level) -> &SpatialIndex {
        &level.sections
    }

    /// Objects whose section overlaps `[min_x, max_x)`, bucket by bucket.
    pub fn range_query(
        level: &Level,
        min_x: f32,
        max_x: f32,
    ) -> impl Iterator<Item = &LevelObject> + '_ {
        level
            .sections
            .range_query(min_x, max_x)
            .into_iter()
            .filter_map(move |index| level.objects.get(index))
    }

    /// Color channel engine of the level.
    #[must_use]
    pub fn colors(level: &Level) -> &ColorChannelEngine {
        &level.colors
    }

    /// Full color table as seen at position `x`.
    #[must_use]
    pub fn colors_at(level: &Level, x: f32) -> ColorTable {
        level.colors.snapshot_at(x)
    }

    /// Annotations in insertion order.
    #[must_use]
    pub fn annotations(level: &Level) -> &[Annotation] {
        &level.annotations
    }

    /// Problems recorded while the level was loaded.
    #[must_use]
    pub fn diagnostics(level: &Level) -> &[Diagnostic] {
        &level.diagnostics
    }
}
