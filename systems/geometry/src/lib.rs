#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Geometry factory that turns placed objects into textured sprite quads.
//!
//! Every object's definition is walked depth-first, root first. Each node
//! that names a sprite contributes one [`SpriteGeometry`]: six triangle-list
//! vertices positioned around the object, texture coordinates normalised
//! against the node's atlas page, and the color channel selected by the
//! node's [`ColorRole`]. Nodes whose sprite is missing from the catalog are
//! skipped and reported; their children are still attempted.

use glam::{Vec2, Vec3};
use level_scene_core::{ChannelId, Diagnostic, PlacedObject};
use level_scene_system_atlas::{AtlasCatalog, ColorRole, FrameNode, ObjectDefinitions};
use log::warn;

/// Unit quad corners in triangle-list order.
const QUAD_CORNERS: [Vec2; 6] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(0.0, 1.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(0.0, 0.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(1.0, 1.0),
];

/// Channels used when neither the object nor its definition names one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelDefaults {
    /// Fallback for base-colored sprites.
    pub base: ChannelId,
    /// Fallback for detail-colored sprites.
    pub detail: ChannelId,
}

impl Default for ChannelDefaults {
    fn default() -> Self {
        Self {
            base: ChannelId::FALLBACK,
            detail: ChannelId::FALLBACK,
        }
    }
}

/// Textured quad contributed by one sprite node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteGeometry {
    /// Triangle-list vertex positions in world units.
    pub vertices: [Vec2; 6],
    /// Normalised texture coordinates with the texture unit in `z`.
    pub texcoords: [Vec3; 6],
    /// Channel coloring the quad.
    pub channel: ChannelId,
}

impl SpriteGeometry {
    /// Mirrors every vertex about the vertical line `x = axis`.
    pub fn mirror_x(&mut self, axis: f32) {
        for vertex in &mut self.vertices {
            vertex.x = 2.0 * axis - vertex.x;
        }
    }

    /// Mirrors every vertex about the horizontal line `y = axis`.
    pub fn mirror_y(&mut self, axis: f32) {
        for vertex in &mut self.vertices {
            vertex.y = 2.0 * axis - vertex.y;
        }
    }

    /// Rotates every vertex about `pivot` by `radians`.
    pub fn rotate_about(&mut self, pivot: Vec2, radians: f32) {
        if radians == 0.0 {
            return;
        }

        let rotation = Vec2::from_angle(radians);
        for vertex in &mut self.vertices {
            *vertex = rotation.rotate(*vertex - pivot) + pivot;
        }
    }
}

/// Builds every sprite quad of a placed object.
///
/// Objects without a definition produce no geometry and a
/// [`Diagnostic::MissingDefinition`]. Sprites absent from the catalog produce
/// a [`Diagnostic::MissingAsset`] and are skipped individually.
pub fn build_object_geometry(
    object: &PlacedObject,
    definitions: &ObjectDefinitions,
    catalog: &AtlasCatalog,
    defaults: ChannelDefaults,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<SpriteGeometry> {
    let Some(definition) = definitions.get(object.object_type) else {
        let diagnostic = Diagnostic::MissingDefinition {
            object_type: object.object_type,
        };
        warn!("{diagnostic}");
        diagnostics.push(diagnostic);
        return Vec::new();
    };

    let channels = ResolvedChannels {
        base: object
            .main_channel
            .or(definition.default_base_channel)
            .unwrap_or(defaults.base),
        detail: object
            .secondary_channel
            .or(definition.default_detail_channel)
            .unwrap_or(defaults.detail),
    };

    let mut builder = Builder {
        object,
        catalog,
        channels,
        diagnostics,
        output: Vec::with_capacity(definition.root.node_count()),
    };
    builder.visit(&definition.root, Vec2::ZERO);
    builder.output
}

#[derive(Clone, Copy, Debug)]
struct ResolvedChannels {
    base: ChannelId,
    detail: ChannelId,
}

impl ResolvedChannels {
    fn for_role(self, role: ColorRole) -> ChannelId {
        match role {
            ColorRole::Base => self.base,
            ColorRole::Detail => self.detail,
            ColorRole::Black => ChannelId::BLACK,
        }
    }
}

struct Builder<'a> {
    object: &'a PlacedObject,
    catalog: &'a AtlasCatalog,
    channels: ResolvedChannels,
    diagnostics: &'a mut Vec<Diagnostic>,
    output: Vec<SpriteGeometry>,
}

impl Builder<'_> {
    fn visit(&mut self, node: &FrameNode, parent_offset: Vec2) {
        let offset = parent_offset + Vec2::new(node.offset.x, -node.offset.y);

        if let Some(sprite) = node.sprite.as_deref() {
            match self.quad(node, sprite, offset) {
                Some(geometry) => self.output.push(geometry),
                None => {
                    let diagnostic = Diagnostic::MissingAsset {
                        object_type: self.object.object_type,
                        sprite: sprite.to_owned(),
                    };
                    warn!("{diagnostic}");
                    self.diagnostics.push(diagnostic);
                }
            }
        }

        for child in &node.children {
            self.visit(child, offset);
        }
    }

    fn quad(&self, node: &FrameNode, sprite: &str, offset: Vec2) -> Option<SpriteGeometry> {
        let frame = self.catalog.frame(sprite)?;
        let page = self.catalog.page(frame.atlas)?;
        let object = self.object;

        let divisor = page.density.divisor();
        let sheet_extent = frame.sprite_size / divisor;
        let extent = if frame.rotated_on_sheet {
            Vec2::new(sheet_extent.y, sheet_extent.x)
        } else {
            sheet_extent
        };
        let trim = Vec2::new(frame.sprite_offset.x, -frame.sprite_offset.y) / divisor;
        let anchor = Vec2::new(node.anchor.x * extent.x, -node.anchor.y * extent.y);

        let pivot = Vec2::new(object.x, object.y);
        let center = pivot + offset + anchor + trim;

        let rect = frame.source_rect;
        let texture_unit = page.texture_unit as f32;
        let mut geometry = SpriteGeometry {
            vertices: QUAD_CORNERS.map(|corner| {
                let local = (corner - 0.5) * sheet_extent;
                let upright = if frame.rotated_on_sheet {
                    turn_upright(local)
                } else {
                    local
                };
                center + upright
            }),
            texcoords: QUAD_CORNERS.map(|corner| {
                Vec3::new(
                    (rect.x + corner.x * rect.w) / page.size.x,
                    (rect.y + corner.y * rect.h) / page.size.y,
                    texture_unit,
                )
            }),
            channel: self.channels.for_role(node.color_role),
        };

        if node.flip_x {
            geometry.mirror_x(center.x);
        } else if object.flip_x {
            geometry.mirror_x(pivot.x);
        }
        if node.flip_y {
            geometry.mirror_y(center.y);
        } else if object.flip_y {
            geometry.mirror_y(pivot.y);
        }

        let degrees = object.rotation_degrees + node.rotation_degrees;
        geometry.rotate_about(pivot, degrees.to_radians());

        Some(geometry)
    }
}

/// Turns an offset from a frame's centre out of sheet orientation.
///
/// Packers store such frames turned 90 degrees clockwise, so the quad is
/// turned 90 degrees counter-clockwise on screen (Y down) about its own centre.
fn turn_upright(local: Vec2) -> Vec2 {
    Vec2::new(local.y, -local.x)
}
