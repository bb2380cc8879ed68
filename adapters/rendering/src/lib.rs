#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for level scene adapters.
//!
//! Adapters own a [`Camera`] and a [`SceneQuery`]. Each frame they ask the
//! query for the [`SceneBuffers`] visible from the camera and hand them to a
//! [`RenderingBackend`]. Buffers are rebuilt only while the camera is dirty;
//! the adapter calls [`Camera::acknowledge`] once the frame has been consumed.

use anyhow::Result as AnyResult;
use glam::{Affine2, Vec2};
use level_scene_core::TEXT_OBJECT_TYPE;
use level_scene_world::{query, Level};
use serde::Serialize;

/// Smallest zoom factor a camera accepts.
pub const MIN_ZOOM: f32 = 0.01;
/// Largest zoom factor a camera accepts.
pub const MAX_ZOOM: f32 = 5.0;

/// Viewer position and magnification over a level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    position: Vec2,
    zoom: f32,
    dirty: bool,
}

impl Camera {
    /// Creates a dirty camera centred on `(x, y)`.
    #[must_use]
    pub fn new(x: f32, y: f32, zoom: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            zoom: clamp_zoom(zoom),
            dirty: true,
        }
    }

    /// Horizontal position of the view centre.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.position.x
    }

    /// Vertical position of the view centre.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.position.y
    }

    /// Position of the view centre.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Current zoom factor.
    #[must_use]
    pub const fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Reports whether the camera changed since the last acknowledged frame.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Moves the view centre.
    pub fn set_position(&mut self, x: f32, y: f32) {
        self.position = Vec2::new(x, y);
        self.dirty = true;
    }

    /// Moves the view centre by an offset.
    pub fn pan(&mut self, delta: Vec2) {
        self.position += delta;
        self.dirty = true;
    }

    /// Changes the zoom factor, clamped to [`MIN_ZOOM`]..=[`MAX_ZOOM`].
    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = clamp_zoom(zoom);
        self.dirty = true;
    }

    /// Marks the current state as consumed by the renderer.
    pub fn acknowledge(&mut self) {
        self.dirty = false;
    }

    /// Transform from world space to screen pixels for a viewport size.
    ///
    /// The camera position maps to the viewport centre.
    #[must_use]
    pub fn view_transform(&self, viewport: Vec2) -> Affine2 {
        Affine2::from_translation(viewport * 0.5)
            * Affine2::from_scale(Vec2::splat(self.zoom))
            * Affine2::from_translation(-self.position)
    }

    /// Projects a world position onto the screen.
    #[must_use]
    pub fn world_to_screen(&self, world: Vec2, viewport: Vec2) -> Vec2 {
        self.view_transform(viewport).transform_point2(world)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }
}

fn clamp_zoom(zoom: f32) -> f32 {
    if zoom.is_nan() {
        1.0
    } else {
        zoom.clamp(MIN_ZOOM, MAX_ZOOM)
    }
}

/// Settings shaping which part of a level a scene query gathers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneConfig {
    /// Viewport size in pixels.
    pub viewport: Vec2,
    /// Multiplier applied to the visible half width when culling.
    pub cull_distance: f32,
    /// Alpha written into the grid fade channel.
    pub grid_fade: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            viewport: Vec2::new(1280.0, 720.0),
            cull_distance: 1.0,
            grid_fade: 0.0,
        }
    }
}

/// Flat buffers submitted to a backend for one frame.
///
/// Vertex data is a triangle list with six vertices per quad.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SceneBuffers {
    /// Vertex positions as `[x, y]` pairs.
    pub vertices: Vec<f32>,
    /// Texture coordinates as `[u, v, unit]` triples.
    pub texcoords: Vec<f32>,
    /// Color channel of every vertex.
    pub channel_ids: Vec<u32>,
    /// Color table as `[r, g, b, a]` quadruples in channel order.
    pub colors: Vec<f32>,
    /// Horizontal range that was queried, `[min_x, max_x]`.
    pub visible_range: [f32; 2],
}

impl SceneBuffers {
    /// Number of quads held by the buffers.
    #[must_use]
    pub fn quad_count(&self) -> usize {
        self.channel_ids.len() / 6
    }

    fn clear(&mut self) {
        self.vertices.clear();
        self.texcoords.clear();
        self.channel_ids.clear();
        self.colors.clear();
    }
}

/// Builds and caches the buffers visible from a camera.
#[derive(Clone, Debug, Default)]
pub struct SceneQuery {
    config: SceneConfig,
    buffers: SceneBuffers,
    built: bool,
}

impl SceneQuery {
    /// Creates a query with the provided settings.
    #[must_use]
    pub fn new(config: SceneConfig) -> Self {
        Self {
            config,
            buffers: SceneBuffers::default(),
            built: false,
        }
    }

    /// Settings used by the query.
    #[must_use]
    pub const fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Forces the next [`SceneQuery::build`] to recompute, for example after
    /// switching levels.
    pub fn invalidate(&mut self) {
        self.built = false;
    }

    /// Buffers visible from `camera`.
    ///
    /// Returns the cached buffers untouched while the camera is clean.
    /// Text objects are not rasterised and are left out.
    pub fn build(&mut self, camera: &Camera, level: &Level) -> &SceneBuffers {
        if self.built && !camera.is_dirty() {
            return &self.buffers;
        }

        let half_width =
            self.config.viewport.x / (2.0 * camera.zoom()) * self.config.cull_distance;
        let min_x = camera.x() - half_width;
        let max_x = camera.x() + half_width;

        let buffers = &mut self.buffers;
        buffers.clear();
        buffers.visible_range = [min_x, max_x];

        for object in query::range_query(level, min_x, max_x) {
            if object.placed.object_type == TEXT_OBJECT_TYPE {
                continue;
            }
            for quad in &object.geometry {
                for (vertex, texcoord) in quad.vertices.iter().zip(&quad.texcoords) {
                    buffers.vertices.extend_from_slice(&vertex.to_array());
                    buffers.texcoords.extend_from_slice(&texcoord.to_array());
                    buffers.channel_ids.push(u32::from(quad.channel.get()));
                }
            }
        }

        let mut colors = query::colors_at(level, camera.x());
        colors.set_grid_fade(self.config.grid_fade);
        buffers.colors = colors.flatten();

        self.built = true;
        &self.buffers
    }
}

/// Annotation payload projected onto the screen.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScreenAnnotation {
    /// Screen position in pixels.
    pub position: [f32; 2],
    /// Payload attached to the annotation.
    pub payload: String,
}

/// Projects every annotation of `level` through the camera.
#[must_use]
pub fn project_annotations(camera: &Camera, level: &Level, viewport: Vec2) -> Vec<ScreenAnnotation> {
    let transform = camera.view_transform(viewport);
    query::annotations(level)
        .iter()
        .map(|annotation| ScreenAnnotation {
            position: transform
                .transform_point2(Vec2::new(annotation.x, annotation.y))
                .to_array(),
            payload: annotation.payload.clone(),
        })
        .collect()
}

/// Rendering backend capable of presenting scene buffers.
pub trait RenderingBackend {
    /// Presents one frame of buffers along with projected annotations.
    fn present(&mut self, buffers: &SceneBuffers, annotations: &[ScreenAnnotation])
        -> AnyResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_is_clamped() {
        let mut camera = Camera::new(0.0, 0.0, 100.0);
        assert_eq!(camera.zoom(), MAX_ZOOM);
        camera.set_zoom(0.0);
        assert_eq!(camera.zoom(), MIN_ZOOM);
        camera.set_zoom(f32::NAN);
        assert_eq!(camera.zoom(), 1.0);
    }

    #[test]
    fn mutations_mark_the_camera_dirty() {
        let mut camera = Camera::default();
        assert!(camera.is_dirty());
        camera.acknowledge();
        assert!(!camera.is_dirty());

        camera.pan(Vec2::new(10.0, 0.0));
        assert!(camera.is_dirty());
        camera.acknowledge();
        camera.set_zoom(2.0);
        assert!(camera.is_dirty());
        camera.acknowledge();
        camera.set_position(1.0, 2.0);
        assert!(camera.is_dirty());
    }

    #[test]
    fn camera_position_maps_to_the_viewport_centre() {
        let camera = Camera::new(500.0, -40.0, 2.0);
        let viewport = Vec2::new(800.0, 600.0);

        let centre = camera.world_to_screen(Vec2::new(500.0, -40.0), viewport);
        assert!(centre.abs_diff_eq(Vec2::new(400.0, 300.0), 1e-4));

        let right = camera.world_to_screen(Vec2::new(550.0, -40.0), viewport);
        assert!(right.abs_diff_eq(Vec2::new(500.0, 300.0), 1e-4));
    }
}
