use glam::Vec2;
use level_scene_core::LoadError;
use level_scene_system_atlas::{AtlasCatalog, Density, Rect};

fn sheet(texture: &str, frames: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
    <key>frames</key>
    <dict>{frames}</dict>
    <key>metadata</key>
    <dict>
        <key>format</key>
        <integer>3</integer>
        <key>size</key>
        <string>{{1024,512}}</string>
        <key>textureFileName</key>
        <string>{texture}</string>
    </dict>
</dict>
</plist>"#
    )
}

const SQUARE: &str = r#"
        <key>square_01_001.png</key>
        <dict>
            <key>aliases</key>
            <array/>
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
        </dict>"#;

const PLANK: &str = r#"
        <key>plank_01_001.png</key>
        <dict>
            <key>spriteOffset</key>
            <string>{0,-2}</string>
            <key>spriteSize</key>
            <string>{120,60}</string>
            <key>spriteSourceSize</key>
            <string>{120,64}</string>
            <key>textureRect</key>
            <string>{{200,0},{120,60}}</string>
            <key>textureRotated</key>
            <true/>
        </dict>"#;

#[test]
fn registration_indexes_frames_by_file_name() {
    let mut catalog = AtlasCatalog::new();
    let report = catalog
        .register(
            "GJ_GameSheet-uhd.png",
            0,
            &sheet("GJ_GameSheet-uhd.png", &format!("{SQUARE}{PLANK}")),
        )
        .expect("valid sheet");

    assert_eq!(report.frames, 2);
    assert!(report.replaced.is_empty());
    assert_eq!(catalog.len(), 2);

    let page = catalog.page(report.atlas).expect("registered page");
    assert_eq!(page.size, Vec2::new(1024.0, 512.0));
    assert_eq!(page.density, Density::Ultra);

    let square = catalog.frame("square_01_001.png").expect("square frame");
    assert_eq!(square.atlas, report.atlas);
    assert_eq!(
        square.source_rect,
        Rect {
            x: 2.0,
            y: 4.0,
            w: 120.0,
            h: 120.0
        }
    );
    assert!(!square.rotated_on_sheet);

    let plank = catalog.frame("plank_01_001.png").expect("plank frame");
    assert!(plank.rotated_on_sheet);
    assert_eq!(plank.sprite_size, Vec2::new(60.0, 120.0));
    assert_eq!(plank.source_size, Vec2::new(64.0, 120.0));
    assert_eq!(plank.source_rect.w, 60.0);
    assert_eq!(plank.source_rect.h, 120.0);
    assert_eq!(plank.sprite_offset, Vec2::new(0.0, -2.0));
}

#[test]
fn catalogs_are_additive_and_last_registration_wins() {
    let mut catalog = AtlasCatalog::new();
    let first = catalog
        .register("first-uhd.png", 0, &sheet("first-uhd.png", SQUARE))
        .expect("first sheet");
    let second = catalog
        .register(
            "second-uhd.png",
            1,
            &sheet("second-uhd.png", &format!("{SQUARE}{PLANK}")),
        )
        .expect("second sheet");

    assert_ne!(first.atlas, second.atlas);
    assert_eq!(second.replaced, vec!["square_01_001.png".to_owned()]);
    assert_eq!(catalog.len(), 2);
    assert_eq!(
        catalog.frame("square_01_001.png").map(|frame| frame.atlas),
        Some(second.atlas)
    );
    assert_eq!(catalog.pages().len(), 2);
}

#[test]
fn reregistering_an_atlas_replaces_its_page() {
    let mut catalog = AtlasCatalog::new();
    let first = catalog
        .register("sheet-uhd.png", 0, &sheet("sheet-uhd.png", SQUARE))
        .expect("first registration");
    let again = catalog
        .register("sheet-uhd.png", 3, &sheet("sheet-uhd.png", SQUARE))
        .expect("reload");

    assert_eq!(first.atlas, again.atlas);
    assert!(again.replaced.is_empty());
    assert_eq!(catalog.pages().len(), 1);
    assert_eq!(catalog.pages()[0].texture_unit, 3);
}

#[test]
fn non_uhd_sheets_are_rejected() {
    let mut catalog = AtlasCatalog::new();
    let error = catalog
        .register("GJ_GameSheet-hd.png", 0, &sheet("GJ_GameSheet-hd.png", SQUARE))
        .expect_err("hd density is unsupported");

    assert_eq!(
        error,
        LoadError::UnsupportedDensity {
            atlas: "GJ_GameSheet-hd.png".to_owned(),
            density: "hd".to_owned(),
        }
    );
    assert!(catalog.is_empty());
}

#[test]
fn malformed_frames_leave_the_catalog_untouched() {
    let mut catalog = AtlasCatalog::new();
    let broken = r#"
        <key>broken.png</key>
        <dict>
            <key>textureRect</key>
            <string>{{0,0},{oops}}</string>
        </dict>"#;

    let error = catalog
        .register("sheet-uhd.png", 0, &sheet("sheet-uhd.png", broken))
        .expect_err("rect literal is invalid");

    assert!(matches!(error, LoadError::MalformedAtlas { .. }));
    assert!(catalog.is_empty());
    assert!(catalog.pages().is_empty());
}
