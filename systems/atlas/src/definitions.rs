//! Object sprite definitions resolved into frame trees.
//!
//! Definitions are supplied as a JSON table keyed by object type id:
//!
//! ```json
//! {
//!   "1": {
//!     "texture": "square_01_001.png",
//!     "default_base_color_channel": 1004,
//!     "children": [
//!       { "texture": "square_01_glow.png", "x": 0, "y": 2, "color_type": "Detail" }
//!     ]
//!   }
//! }
//! ```

use std::collections::{BTreeMap, HashMap};

use glam::Vec2;
use level_scene_core::{ChannelId, LoadError, ObjectTypeId};
use serde::Deserialize;

/// Which of an object's channels colors a sprite.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
pub enum ColorRole {
    /// The object's main channel.
    #[default]
    Base,
    /// The object's secondary channel.
    Detail,
    /// Always the reserved black channel.
    Black,
}

/// Node of a composite sprite tree.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameNode {
    /// Sprite file name drawn by the node; `None` for pure grouping nodes.
    pub sprite: Option<String>,
    /// Offset from the parent node in world units (Y-up).
    pub offset: Vec2,
    /// Anchor as a fraction of the node's extent.
    pub anchor: Vec2,
    /// Rotation added to the object's rotation, in degrees.
    pub rotation_degrees: f32,
    /// Whether the node's quad is already mirrored horizontally.
    pub flip_x: bool,
    /// Whether the node's quad is already mirrored vertically.
    pub flip_y: bool,
    /// Channel role the node's sprite is colored with.
    pub color_role: ColorRole,
    /// Child nodes, drawn after this node.
    pub children: Vec<FrameNode>,
}

impl FrameNode {
    /// Number of nodes in the tree rooted at this node.
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Self::node_count).sum::<usize>()
    }
}

/// Sprite definition of one object type.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectDefinition {
    /// Root of the composite sprite tree.
    pub root: FrameNode,
    /// Channel used for base sprites when the object names none.
    pub default_base_channel: Option<ChannelId>,
    /// Channel used for detail sprites when the object names none.
    pub default_detail_channel: Option<ChannelId>,
}

/// Table of object definitions keyed by object type.
#[derive(Clone, Debug, Default)]
pub struct ObjectDefinitions {
    definitions: HashMap<ObjectTypeId, ObjectDefinition>,
}

impl ObjectDefinitions {
    /// Parses the JSON definition table.
    pub fn from_json(document: &str) -> Result<Self, LoadError> {
        let raw: BTreeMap<String, RawDefinition> =
            serde_json::from_str(document).map_err(|error| malformed(error.to_string()))?;

        let mut definitions = HashMap::with_capacity(raw.len());
        for (key, definition) in raw {
            let id = key
                .trim()
                .parse::<u32>()
                .map_err(|_| malformed(format!("`{key}` is not an object type id")))?;
            let _ = definitions.insert(ObjectTypeId::new(id), definition.resolve(&key)?);
        }

        Ok(Self { definitions })
    }

    /// Inserts or replaces a definition.
    pub fn insert(&mut self, object_type: ObjectTypeId, definition: ObjectDefinition) {
        let _ = self.definitions.insert(object_type, definition);
    }

    /// Definition registered for an object type.
    #[must_use]
    pub fn get(&self, object_type: ObjectTypeId) -> Option<&ObjectDefinition> {
        self.definitions.get(&object_type)
    }

    /// Number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Reports whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct RawDefinition {
    #[serde(flatten)]
    node: RawNode,
    #[serde(default)]
    default_base_color_channel: Option<u16>,
    #[serde(default)]
    default_detail_color_channel: Option<u16>,
}

impl RawDefinition {
    fn resolve(self, key: &str) -> Result<ObjectDefinition, LoadError> {
        let channel = |value: Option<u16>| -> Result<Option<ChannelId>, LoadError> {
            match value {
                None | Some(0) => Ok(None),
                Some(value) => ChannelId::new(value).map(Some).ok_or_else(|| {
                    malformed(format!(
                        "object {key} defaults to channel {value} outside the color table"
                    ))
                }),
            }
        };

        Ok(ObjectDefinition {
            default_base_channel: channel(self.default_base_color_channel)?,
            default_detail_channel: channel(self.default_detail_color_channel)?,
            root: self.node.resolve(ColorRole::Base),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawNode {
    #[serde(default)]
    texture: Option<String>,
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
    #[serde(default)]
    anchor_x: f32,
    #[serde(default)]
    anchor_y: f32,
    #[serde(default)]
    rot: f32,
    #[serde(default)]
    flip_x: bool,
    #[serde(default)]
    flip_y: bool,
    #[serde(default)]
    color_type: Option<ColorRole>,
    #[serde(default)]
    children: Vec<RawNode>,
}

impl RawNode {
    fn resolve(self, inherited: ColorRole) -> FrameNode {
        let color_role = self.color_type.unwrap_or(inherited);
        FrameNode {
            sprite: self.texture.filter(|texture| !texture.is_empty()),
            offset: Vec2::new(self.x, self.y),
            anchor: Vec2::new(self.anchor_x, self.anchor_y),
            rotation_degrees: self.rot,
            flip_x: self.flip_x,
            flip_y: self.flip_y,
            color_role,
            children: self
                .children
                .into_iter()
                .map(|child| child.resolve(color_role))
                .collect(),
        }
    }
}

fn malformed(reason: String) -> LoadError {
    LoadError::MalformedDefinitions { reason }
}
