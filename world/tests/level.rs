use level_scene_core::{
    ChannelId, Diagnostic, LoadError, ObjectTypeId, Rgba, SectionId, SpeedTier,
};
use level_scene_system_atlas::{AtlasCatalog, ObjectDefinitions};
use level_scene_world::{query, Level, LoadOptions};

const SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
    <key>frames</key>
    <dict>
        <key>square_01_001.png</key>
        <dict>
            <key>spriteOffset</key>
            <string>{0,0}</string>
            <key>spriteSize</key>
            <string>{120,120}</string>
            <key>spriteSourceSize</key>
            <string>{120,120}</string>
            <key>textureRect</key>
            <string>{{2,4},{120,120}}</string>
            <key>textureRotated</key>
            <false/>
        </dict>
    </dict>
    <key>metadata</key>
    <dict>
        <key>size</key>
        <string>{1024,512}</string>
        <key>textureFileName</key>
        <string>GJ_GameSheet-uhd.png</string>
    </dict>
</dict>
</plist>"#;

const DEFINITIONS: &str = r#"{
    "1": { "texture": "square_01_001.png", "default_base_color_channel": 1004 },
    "2": { "texture": "square_01_001.png" },
    "3": { "texture": "square_01_001.png" },
    "201": { "texture": "square_01_001.png" },
    "203": { "texture": "square_01_001.png" }
}"#;

fn load(text: &str) -> Result<Level, LoadError> {
    let mut catalog = AtlasCatalog::new();
    let _ = catalog
        .register("GJ_GameSheet-uhd.png", 0, SHEET)
        .expect("valid sheet");
    let definitions = ObjectDefinitions::from_json(DEFINITIONS).expect("valid definitions");
    Level::from_text(text, &catalog, &definitions, LoadOptions::default())
}

#[test]
fn range_query_returns_objects_from_overlapping_sections() {
    let level = load("kA4,0;1,1,2,100,3,15;1,2,2,300,3,15;1,3,2,450,3,15;").expect("level");

    assert_eq!(query::object_count(&level), 3);
    let visible: Vec<f32> = query::range_query(&level, 0.0, 400.0)
        .map(|object| object.placed.x)
        .collect();
    assert_eq!(visible, vec![100.0, 300.0]);

    let sections: Vec<SectionId> = query::objects(&level)
        .iter()
        .map(|object| object.placed.section)
        .collect();
    assert_eq!(
        sections,
        vec![SectionId::new(1), SectionId::new(3), SectionId::new(4)]
    );
    assert!(query::diagnostics(&level).is_empty());
}

#[test]
fn objects_carry_their_geometry_and_negated_y() {
    let level = load(";1,1,2,30,3,15,21,0;").expect("level");

    let object = &query::objects(&level)[0];
    assert_eq!(object.placed.y, -15.0);
    assert_eq!(object.geometry.len(), 1);
    assert_eq!(object.geometry[0].channel, ChannelId::OBJECT);
}

#[test]
fn missing_assets_keep_the_object_indexed() {
    let level = load(";1,77,2,250;").expect("level");

    assert_eq!(query::object_count(&level), 1);
    assert!(query::objects(&level)[0].geometry.is_empty());
    assert_eq!(query::sections(&level).section(SectionId::new(2)), &[0]);
    assert_eq!(
        query::diagnostics(&level),
        &[Diagnostic::MissingDefinition {
            object_type: ObjectTypeId::new(77),
        }]
    );
}

#[test]
fn malformed_segments_are_skipped_without_failing_the_level() {
    let level = load(";1,1,2,10;1,2,2;1,3,2,x;1,2,2,20;").expect("level");

    let xs: Vec<f32> = query::objects(&level)
        .iter()
        .map(|object| object.placed.x)
        .collect();
    assert_eq!(xs, vec![10.0, 20.0]);
    assert_eq!(query::diagnostics(&level).len(), 2);
}

#[test]
fn fatal_errors_abort_loading() {
    assert_eq!(load("").err(), Some(LoadError::MissingHeader));
    assert_eq!(load("kA4,0;1,1,2,10").err(), Some(LoadError::Unterminated));
    assert_eq!(
        load("kA4,9;").err(),
        Some(LoadError::InvalidSpeedTier { tier: 10 })
    );
}

#[test]
fn speed_portals_are_drawn_and_shape_trigger_timing() {
    let level = load("kA4,0;1,203,2,0;1,1,2,50;1,29,2,0,7,0,8,0,9,0,10,1;").expect("level");

    assert_eq!(query::object_count(&level), 2);
    let colors = query::colors(&level);
    assert_eq!(colors.profile().base(), SpeedTier::Normal);
    assert_eq!(colors.profile().portals()[0].tier, SpeedTier::Faster);

    let halfway = query::colors_at(&level, 234.0).get(ChannelId::BACKGROUND);
    assert!((halfway.r - 0.5).abs() < 1e-3);
    assert_eq!(
        query::colors_at(&level, 468.0).get(ChannelId::BACKGROUND),
        Rgba::BLACK
    );
}

#[test]
fn header_fields_are_exposed() {
    let level = load("kA4,2,kA13,1.5;").expect("level");

    let header = query::header(&level);
    assert_eq!(header.base_speed, SpeedTier::Faster);
    assert_eq!(header.song_offset, Some(1.5));
}
