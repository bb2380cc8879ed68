use glam::Vec2;
use level_scene_core::{ChannelId, CHANNEL_COUNT};
use level_scene_rendering::{project_annotations, Camera, SceneConfig, SceneQuery};
use level_scene_system_atlas::{AtlasCatalog, ObjectDefinitions};
use level_scene_world::{Level, LoadOptions};

const SHEET: &str = r#"<plist version="1.0">
<dict>
    <key>frames</key>
    <dict>
        <key>block.png</key>
        <dict>
            <key>spriteOffset</key>
            <string>{0,0}</string>
            <key>spriteSize</key>
            <string>{120,120}</string>
            <key>spriteSourceSize</key>
            <string>{120,120}</string>
            <key>textureRect</key>
            <string>{{0,0},{120,120}}</string>
            <key>textureRotated</key>
            <false/>
        </dict>
    </dict>
    <key>metadata</key>
    <dict>
        <key>size</key>
        <string>{512,512}</string>
        <key>textureFileName</key>
        <string>blocks-uhd.png</string>
    </dict>
</dict>
</plist>"#;

const DEFINITIONS: &str = r#"{
    "1": { "texture": "block.png", "default_base_color_channel": 1004 },
    "914": { "texture": "block.png" }
}"#;

fn level(text: &str) -> Level {
    let mut catalog = AtlasCatalog::new();
    let _ = catalog.register("blocks-uhd.png", 2, SHEET).expect("sheet");
    let definitions = ObjectDefinitions::from_json(DEFINITIONS).expect("definitions");
    Level::from_text(text, &catalog, &definitions, LoadOptions::default()).expect("level")
}

fn config(width: f32) -> SceneConfig {
    SceneConfig {
        viewport: Vec2::new(width, 400.0),
        cull_distance: 1.0,
        grid_fade: 0.5,
    }
}

#[test]
fn buffers_hold_visible_quads_and_the_color_table() {
    let level = level(";1,1,2,100;1,1,2,300;1,1,2,450;");
    let camera = Camera::new(200.0, 0.0, 1.0);
    let mut scene = SceneQuery::new(config(400.0));

    let buffers = scene.build(&camera, &level);
    assert_eq!(buffers.visible_range, [0.0, 400.0]);
    assert_eq!(buffers.quad_count(), 2);
    assert_eq!(buffers.vertices.len(), 2 * 6 * 2);
    assert_eq!(buffers.texcoords.len(), 2 * 6 * 3);
    assert_eq!(buffers.texcoords[2], 2.0);
    assert!(buffers
        .channel_ids
        .iter()
        .all(|channel| *channel == u32::from(ChannelId::OBJECT.get())));

    assert_eq!(buffers.colors.len(), CHANNEL_COUNT * 4);
    let fade = ChannelId::GRID_FADE.index() * 4 + 3;
    assert_eq!(buffers.colors[fade], 0.5);
}

#[test]
fn zooming_in_narrows_the_visible_range() {
    let level = level(";1,1,2,100;1,1,2,300;1,1,2,450;");
    let camera = Camera::new(200.0, 0.0, 4.0);
    let mut scene = SceneQuery::new(config(400.0));

    let buffers = scene.build(&camera, &level);
    assert_eq!(buffers.visible_range, [150.0, 250.0]);
    assert_eq!(buffers.quad_count(), 1);
}

#[test]
fn text_objects_are_skipped() {
    let level = level(";1,914,2,100;1,1,2,120;");
    let camera = Camera::new(100.0, 0.0, 1.0);
    let mut scene = SceneQuery::new(config(400.0));

    assert_eq!(scene.build(&camera, &level).quad_count(), 1);
}

#[test]
fn clean_cameras_reuse_cached_buffers() {
    let level = level(";1,1,2,100;1,1,2,900;");
    let mut camera = Camera::new(100.0, 0.0, 1.0);
    let mut scene = SceneQuery::new(config(400.0));

    let first = scene.build(&camera, &level).clone();
    camera.acknowledge();

    let other_level = level_with_nothing();
    assert_eq!(scene.build(&camera, &other_level), &first);

    scene.invalidate();
    assert_eq!(scene.build(&camera, &other_level).quad_count(), 0);

    camera.set_position(900.0, 0.0);
    assert_eq!(scene.build(&camera, &level).quad_count(), 1);
    assert_eq!(scene.build(&camera, &level).visible_range, [700.0, 1100.0]);
}

fn level_with_nothing() -> Level {
    level(";")
}

#[test]
fn annotations_project_through_the_camera() {
    let mut level = level(";");
    level.annotate(250.0, -10.0, "checkpoint");
    let camera = Camera::new(200.0, 0.0, 2.0);

    let projected = project_annotations(&camera, &level, Vec2::new(400.0, 400.0));
    assert_eq!(projected.len(), 1);
    assert_eq!(projected[0].position, [300.0, 180.0]);
    assert_eq!(projected[0].payload, "checkpoint");
}
