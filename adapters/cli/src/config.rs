use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use glam::Vec2;
use level_scene_core::ChannelId;
use level_scene_rendering::SceneConfig;
use level_scene_system_atlas::{AtlasCatalog, ObjectDefinitions};
use level_scene_system_geometry::ChannelDefaults;
use level_scene_world::LoadOptions;
use log::debug;
use serde::Deserialize;

const SUPPORTED_SCENE_VERSION: u32 = 1;

/// Scene configuration with every path resolved against its file.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SceneManifest {
    pub(crate) level: PathBuf,
    pub(crate) objects: PathBuf,
    pub(crate) atlases: Vec<AtlasEntry>,
    pub(crate) scene: SceneConfig,
    pub(crate) load_options: LoadOptions,
    pub(crate) annotations: Vec<AnnotationEntry>,
}

/// Sprite sheet registered with the catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct AtlasEntry {
    pub(crate) name: String,
    pub(crate) plist: PathBuf,
    pub(crate) texture_unit: u32,
}

/// Overlay payload pinned to a world position.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct AnnotationEntry {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) text: String,
}

/// Assets read from disk and ready for level construction.
#[derive(Debug)]
pub(crate) struct SceneAssets {
    pub(crate) level_text: String,
    pub(crate) catalog: AtlasCatalog,
    pub(crate) definitions: ObjectDefinitions,
}

impl SceneManifest {
    /// Loads the configuration stored at `path`.
    pub(crate) fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scene configuration at {}", path.display()))?;
        let base = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::parse(&contents, &base)
    }

    /// Parses configuration text, resolving relative paths against `base`.
    pub(crate) fn parse(contents: &str, base: &Path) -> Result<Self> {
        let raw: RawScene =
            toml::from_str(contents).context("failed to parse scene configuration toml")?;
        if raw.version != SUPPORTED_SCENE_VERSION {
            bail!(
                "unsupported scene configuration version {} (expected {SUPPORTED_SCENE_VERSION})",
                raw.version
            );
        }
        if raw.atlas.is_empty() {
            bail!("scene configuration lists no [[atlas]] entries");
        }

        let channel_defaults = ChannelDefaults {
            base: channel(raw.channels.base, "base")?,
            detail: channel(raw.channels.detail, "detail")?,
        };

        Ok(Self {
            level: base.join(raw.level),
            objects: base.join(raw.objects),
            atlases: raw
                .atlas
                .into_iter()
                .map(|atlas| AtlasEntry {
                    name: atlas.name,
                    plist: base.join(atlas.plist),
                    texture_unit: atlas.texture_unit,
                })
                .collect(),
            scene: SceneConfig {
                viewport: Vec2::new(raw.viewport.width, raw.viewport.height),
                cull_distance: raw.viewport.cull_distance,
                grid_fade: raw.grid_fade,
            },
            load_options: LoadOptions { channel_defaults },
            annotations: raw.annotations,
        })
    }

    /// Reads the level, the sprite sheets and the object definitions.
    pub(crate) fn load_assets(&self) -> Result<SceneAssets> {
        let level_text = read(&self.level, "level")?;

        let mut catalog = AtlasCatalog::new();
        for atlas in &self.atlases {
            let document = read(&atlas.plist, "atlas metadata")?;
            let report = catalog
                .register(&atlas.name, atlas.texture_unit, &document)
                .with_context(|| format!("failed to register atlas {}", atlas.name))?;
            debug!(
                "atlas {} contributed {} frames on texture unit {}",
                atlas.name,
                report.frames,
                atlas.texture_unit
            );
        }

        let definitions = ObjectDefinitions::from_json(&read(&self.objects, "object definitions")?)
            .with_context(|| format!("failed to load {}", self.objects.display()))?;

        Ok(SceneAssets {
            level_text,
            catalog,
            definitions,
        })
    }
}

fn read(path: &Path, what: &str) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {what} at {}", path.display()))
}

fn channel(value: u16, role: &str) -> Result<ChannelId> {
    ChannelId::new(value)
        .with_context(|| format!("default {role} channel {value} is outside the color table"))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawScene {
    version: u32,
    level: PathBuf,
    objects: PathBuf,
    #[serde(default)]
    atlas: Vec<RawAtlas>,
    #[serde(default)]
    viewport: RawViewport,
    #[serde(default)]
    grid_fade: f32,
    #[serde(default)]
    channels: RawChannels,
    #[serde(default)]
    annotations: Vec<AnnotationEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAtlas {
    name: String,
    plist: PathBuf,
    #[serde(default)]
    texture_unit: u32,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawViewport {
    width: f32,
    height: f32,
    cull_distance: f32,
}

impl Default for RawViewport {
    fn default() -> Self {
        let defaults = SceneConfig::default();
        Self {
            width: defaults.viewport.x,
            height: defaults.viewport.y,
            cull_distance: defaults.cull_distance,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawChannels {
    base: u16,
    detail: u16,
}

impl Default for RawChannels {
    fn default() -> Self {
        let defaults = ChannelDefaults::default();
        Self {
            base: defaults.base.get(),
            detail: defaults.detail.get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
version = 1
level = "levels/demo.txt"
objects = "objects.json"

[[atlas]]
name = "GJ_GameSheet-uhd.png"
plist = "sheets/GJ_GameSheet-uhd.plist"
"#;

    #[test]
    fn paths_resolve_relative_to_the_configuration() {
        let manifest = SceneManifest::parse(MINIMAL, Path::new("/scenes")).expect("valid config");

        assert_eq!(manifest.level, PathBuf::from("/scenes/levels/demo.txt"));
        assert_eq!(manifest.objects, PathBuf::from("/scenes/objects.json"));
        assert_eq!(
            manifest.atlases,
            vec![AtlasEntry {
                name: "GJ_GameSheet-uhd.png".to_owned(),
                plist: PathBuf::from("/scenes/sheets/GJ_GameSheet-uhd.plist"),
                texture_unit: 0,
            }]
        );
    }

    #[test]
    fn omitted_sections_use_defaults() {
        let manifest = SceneManifest::parse(MINIMAL, Path::new(".")).expect("valid config");

        assert_eq!(manifest.scene, SceneConfig::default());
        assert_eq!(manifest.load_options, LoadOptions::default());
        assert!(manifest.annotations.is_empty());
    }

    #[test]
    fn viewport_channels_and_annotations_are_read() {
        let contents = r#"
version = 1
level = "level.txt"
objects = "objects.json"
grid_fade = 0.4

[[atlas]]
name = "sheet-uhd.png"
plist = "sheet-uhd.plist"
texture_unit = 1

[viewport]
width = 800.0
height = 600.0
cull_distance = 1.5

[channels]
base = 1004
detail = 1

[[annotations]]
x = 120.0
y = -30.0
text = "jump"
"#;
        let manifest = SceneManifest::parse(contents, Path::new(".")).expect("valid config");

        assert_eq!(manifest.atlases[0].texture_unit, 1);
        assert_eq!(manifest.scene.viewport, Vec2::new(800.0, 600.0));
        assert_eq!(manifest.scene.cull_distance, 1.5);
        assert_eq!(manifest.scene.grid_fade, 0.4);
        assert_eq!(
            manifest.load_options.channel_defaults.base,
            ChannelId::OBJECT
        );
        assert_eq!(manifest.annotations[0].text, "jump");
    }

    #[test]
    fn unsupported_versions_are_rejected() {
        let contents = MINIMAL.replace("version = 1", "version = 2");
        let error = SceneManifest::parse(&contents, Path::new(".")).expect_err("version 2");
        assert!(error.to_string().contains("unsupported"));
    }

    #[test]
    fn out_of_range_default_channels_are_rejected() {
        let contents = format!("{MINIMAL}\n[channels]\nbase = 5000\n");
        assert!(SceneManifest::parse(&contents, Path::new(".")).is_err());
    }
}
