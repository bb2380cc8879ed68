//! Typed interpretation of object records.

use level_scene_core::{
    ChannelId, Diagnostic, ObjectTypeId, PlacedObject, Rgba, SectionId, SpeedTier,
};

use crate::{report, ObjectSegment, Record};

/// Object type of the generic color trigger, which names its channel explicitly.
pub const COLOR_TRIGGER_TYPE: ObjectTypeId = ObjectTypeId::new(899);

/// Duration applied when a color trigger omits one, in seconds.
const DEFAULT_TRIGGER_DURATION: f32 = 0.5;
/// Opacity applied when a color trigger omits one.
const DEFAULT_TRIGGER_OPACITY: f32 = 1.0;
/// Component value applied when a color trigger omits red, green or blue.
const DEFAULT_TRIGGER_COMPONENT: f32 = 255.0;

const SPEED_PORTALS: [(u32, SpeedTier); 5] = [
    (200, SpeedTier::Slow),
    (201, SpeedTier::Normal),
    (202, SpeedTier::Fast),
    (203, SpeedTier::Faster),
    (1334, SpeedTier::Fastest),
];

const LEGACY_COLOR_TRIGGERS: [(u32, u16); 11] = [
    (29, 1000),
    (30, 1001),
    (104, 1002),
    (105, 1004),
    (221, 1),
    (717, 2),
    (718, 3),
    (743, 4),
    (744, 1003),
    (900, 1009),
    (915, 1002),
];

/// Object record keys understood by the decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKey {
    /// Object type id.
    ObjectType,
    /// Horizontal position.
    X,
    /// Vertical position, Y-up.
    Y,
    /// Horizontal mirror flag.
    FlipX,
    /// Vertical mirror flag.
    FlipY,
    /// Clockwise rotation in degrees.
    Rotation,
    /// Trigger target red component, 0..=255.
    Red,
    /// Trigger target green component, 0..=255.
    Green,
    /// Trigger target blue component, 0..=255.
    Blue,
    /// Trigger blend duration in seconds.
    Duration,
    /// Main color channel.
    MainChannel,
    /// Secondary color channel.
    SecondaryChannel,
    /// Channel targeted by a generic color trigger.
    TargetChannel,
    /// Trigger target opacity, 0..=1.
    Opacity,
}

impl ObjectKey {
    /// Key used for the field inside an object record.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::ObjectType => "1",
            Self::X => "2",
            Self::Y => "3",
            Self::FlipX => "4",
            Self::FlipY => "5",
            Self::Rotation => "6",
            Self::Red => "7",
            Self::Green => "8",
            Self::Blue => "9",
            Self::Duration => "10",
            Self::MainChannel => "21",
            Self::SecondaryChannel => "22",
            Self::TargetChannel => "23",
            Self::Opacity => "35",
        }
    }
}

/// Color trigger decoded from an object record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorTriggerRecord {
    /// Horizontal position at which the trigger fires.
    pub x: f32,
    /// Channel blended by the trigger.
    pub channel: ChannelId,
    /// Color reached once the blend completes.
    pub target: Rgba,
    /// Blend duration in seconds.
    pub duration_seconds: f32,
}

/// Role an object record plays beyond being drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ObjectRecordKind {
    /// Plain scenery.
    Decoration,
    /// Changes travel speed from its X position onwards.
    SpeedPortal(SpeedTier),
    /// Blends a color channel towards a target.
    ColorTrigger(ColorTriggerRecord),
}

/// Speed tier selected by a speed portal object type.
#[must_use]
pub fn speed_portal_tier(object_type: ObjectTypeId) -> Option<SpeedTier> {
    SPEED_PORTALS
        .iter()
        .find(|(id, _)| *id == object_type.get())
        .map(|(_, tier)| *tier)
}

/// Builds the placed object described by a record.
///
/// Returns `None` and records a diagnostic when the type id is missing or a
/// numeric field cannot be parsed. Invalid channels are reported and
/// dropped without discarding the object.
pub fn placed_object(
    segment: &ObjectSegment,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<PlacedObject> {
    let record = &segment.record;
    let malformed = |reason: String| Diagnostic::MalformedRecord {
        segment: segment.segment,
        reason,
    };

    let object_type = match record.parse_field::<u32>(ObjectKey::ObjectType.key()) {
        Ok(Some(id)) => ObjectTypeId::new(id),
        Ok(None) => {
            report(diagnostics, malformed("missing object type id".to_owned()));
            return None;
        }
        Err(reason) => {
            report(diagnostics, malformed(reason));
            return None;
        }
    };

    let mut numbers = [0.0_f32; 3];
    for (slot, key) in numbers
        .iter_mut()
        .zip([ObjectKey::X, ObjectKey::Y, ObjectKey::Rotation])
    {
        match record.parse_field::<f32>(key.key()) {
            Ok(value) => *slot = value.unwrap_or(0.0),
            Err(reason) => {
                report(diagnostics, malformed(reason));
                return None;
            }
        }
    }
    let [x, y, rotation_degrees] = numbers;

    Some(PlacedObject {
        object_type,
        x,
        y: -y,
        flip_x: record.flag(ObjectKey::FlipX.key()),
        flip_y: record.flag(ObjectKey::FlipY.key()),
        rotation_degrees,
        main_channel: optional_channel(segment, ObjectKey::MainChannel, diagnostics),
        secondary_channel: optional_channel(segment, ObjectKey::SecondaryChannel, diagnostics),
        section: SectionId::containing(x),
    })
}

/// Determines whether a placed object also drives speed or color state.
pub fn classify(
    segment: &ObjectSegment,
    object: &PlacedObject,
    diagnostics: &mut Vec<Diagnostic>,
) -> ObjectRecordKind {
    if let Some(tier) = speed_portal_tier(object.object_type) {
        return ObjectRecordKind::SpeedPortal(tier);
    }

    let channel = if object.object_type == COLOR_TRIGGER_TYPE {
        match optional_channel(segment, ObjectKey::TargetChannel, diagnostics) {
            Some(channel) => channel,
            None => return ObjectRecordKind::Decoration,
        }
    } else {
        match LEGACY_COLOR_TRIGGERS
            .iter()
            .find(|(id, _)| *id == object.object_type.get())
            .and_then(|(_, channel)| ChannelId::new(*channel))
        {
            Some(channel) => channel,
            None => return ObjectRecordKind::Decoration,
        }
    };

    match trigger_fields(&segment.record) {
        Ok((target, duration_seconds)) => ObjectRecordKind::ColorTrigger(ColorTriggerRecord {
            x: object.x,
            channel,
            target,
            duration_seconds,
        }),
        Err(reason) => {
            report(
                diagnostics,
                Diagnostic::MalformedRecord {
                    segment: segment.segment,
                    reason,
                },
            );
            ObjectRecordKind::Decoration
        }
    }
}

fn trigger_fields(record: &Record) -> Result<(Rgba, f32), String> {
    let component = |key: ObjectKey| -> Result<f32, String> {
        Ok(record
            .parse_field::<f32>(key.key())?
            .unwrap_or(DEFAULT_TRIGGER_COMPONENT)
            .clamp(0.0, 255.0)
            / 255.0)
    };

    let red = component(ObjectKey::Red)?;
    let green = component(ObjectKey::Green)?;
    let blue = component(ObjectKey::Blue)?;
    let alpha = record
        .parse_field::<f32>(ObjectKey::Opacity.key())?
        .unwrap_or(DEFAULT_TRIGGER_OPACITY)
        .clamp(0.0, 1.0);
    let duration = record
        .parse_field::<f32>(ObjectKey::Duration.key())?
        .unwrap_or(DEFAULT_TRIGGER_DURATION)
        .max(0.0);

    Ok((Rgba::new(red, green, blue, alpha), duration))
}

fn optional_channel(
    segment: &ObjectSegment,
    key: ObjectKey,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<ChannelId> {
    let value = match segment.record.parse_field::<i64>(key.key()) {
        Ok(Some(0)) | Ok(None) => return None,
        Ok(Some(value)) => value,
        Err(reason) => {
            report(
                diagnostics,
                Diagnostic::MalformedRecord {
                    segment: segment.segment,
                    reason,
                },
            );
            return None;
        }
    };

    let channel = u16::try_from(value).ok().and_then(ChannelId::new);
    if channel.is_none() {
        report(
            diagnostics,
            Diagnostic::InvalidChannel {
                segment: segment.segment,
                channel: value,
            },
        );
    }
    channel
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(text: &str) -> ObjectSegment {
        ObjectSegment {
            segment: 1,
            record: Record::parse(text, ',').expect("even record"),
        }
    }

    #[test]
    fn placed_objects_negate_record_y() {
        let mut diagnostics = Vec::new();
        let object = placed_object(
            &segment("1,8,2,250,3,45,4,1,6,90,21,3"),
            &mut diagnostics,
        )
        .expect("valid object");

        assert!(diagnostics.is_empty());
        assert_eq!(object.object_type, ObjectTypeId::new(8));
        assert_eq!(object.x, 250.0);
        assert_eq!(object.y, -45.0);
        assert!(object.flip_x);
        assert!(!object.flip_y);
        assert_eq!(object.rotation_degrees, 90.0);
        assert_eq!(object.main_channel, ChannelId::new(3));
        assert_eq!(object.secondary_channel, None);
        assert_eq!(object.section, SectionId::new(2));
    }

    #[test]
    fn objects_without_type_are_rejected() {
        let mut diagnostics = Vec::new();
        assert!(placed_object(&segment("2,10,3,10"), &mut diagnostics).is_none());
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn invalid_channels_keep_the_object() {
        let mut diagnostics = Vec::new();
        let object = placed_object(&segment("1,1,21,4000"), &mut diagnostics)
            .expect("object survives an invalid channel");
        assert_eq!(object.main_channel, None);
        assert_eq!(
            diagnostics,
            vec![Diagnostic::InvalidChannel {
                segment: 1,
                channel: 4000
            }]
        );
    }

    #[test]
    fn speed_portals_map_to_tiers() {
        let mut diagnostics = Vec::new();
        let portal = segment("1,203,2,600");
        let object = placed_object(&portal, &mut diagnostics).expect("valid");
        assert_eq!(
            classify(&portal, &object, &mut diagnostics),
            ObjectRecordKind::SpeedPortal(SpeedTier::Faster)
        );
        assert_eq!(
            speed_portal_tier(ObjectTypeId::new(1334)),
            Some(SpeedTier::Fastest)
        );
        assert_eq!(speed_portal_tier(ObjectTypeId::new(1)), None);
    }

    #[test]
    fn generic_color_triggers_read_their_channel() {
        let mut diagnostics = Vec::new();
        let trigger = segment("1,899,2,300,7,255,8,0,9,0,10,2,23,7,35,0.5");
        let object = placed_object(&trigger, &mut diagnostics).expect("valid");

        assert_eq!(
            classify(&trigger, &object, &mut diagnostics),
            ObjectRecordKind::ColorTrigger(ColorTriggerRecord {
                x: 300.0,
                channel: ChannelId::new(7).expect("in range"),
                target: Rgba::new(1.0, 0.0, 0.0, 0.5),
                duration_seconds: 2.0,
            })
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn legacy_color_triggers_use_fixed_channels() {
        let mut diagnostics = Vec::new();
        let trigger = segment("1,29,2,0,7,0,8,0,9,0");
        let object = placed_object(&trigger, &mut diagnostics).expect("valid");

        let ObjectRecordKind::ColorTrigger(record) = classify(&trigger, &object, &mut diagnostics)
        else {
            panic!("background trigger must classify as a color trigger");
        };
        assert_eq!(record.channel, ChannelId::BACKGROUND);
        assert_eq!(record.duration_seconds, DEFAULT_TRIGGER_DURATION);
        assert_eq!(record.target, Rgba::BLACK);
    }

    #[test]
    fn generic_trigger_without_channel_is_scenery() {
        let mut diagnostics = Vec::new();
        let trigger = segment("1,899,2,0");
        let object = placed_object(&trigger, &mut diagnostics).expect("valid");
        assert_eq!(
            classify(&trigger, &object, &mut diagnostics),
            ObjectRecordKind::Decoration
        );
    }
}
