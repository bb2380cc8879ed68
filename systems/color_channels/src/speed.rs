use level_scene_core::SpeedTier;

/// Speed change placed along the level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeedPortal {
    /// Horizontal position of the portal.
    pub x: f32,
    /// Tier the player switches to when crossing the portal.
    pub tier: SpeedTier,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Segment {
    x: f32,
    seconds: f32,
    units_per_second: f32,
}

/// Piecewise linear mapping between horizontal position and elapsed time.
///
/// Time is measured from `x = 0`. Portals at or before the origin choose the
/// initial speed; positions left of the origin map to negative time at that
/// speed.
#[derive(Clone, Debug, PartialEq)]
pub struct SpeedProfile {
    base: SpeedTier,
    portals: Vec<SpeedPortal>,
    segments: Vec<Segment>,
}

impl SpeedProfile {
    /// Builds a profile from the level's base tier and its portals.
    ///
    /// Portals are sorted by position; portals with a non-finite position are
    /// dropped.
    #[must_use]
    pub fn new(base: SpeedTier, portals: impl IntoIterator<Item = SpeedPortal>) -> Self {
        let mut portals: Vec<SpeedPortal> = portals
            .into_iter()
            .filter(|portal| portal.x.is_finite())
            .collect();
        portals.sort_by(|left, right| left.x.total_cmp(&right.x));

        let initial = portals
            .iter()
            .take_while(|portal| portal.x <= 0.0)
            .last()
            .map_or(base, |portal| portal.tier);

        let mut segments = vec![Segment {
            x: 0.0,
            seconds: 0.0,
            units_per_second: initial.units_per_second(),
        }];
        for portal in portals.iter().filter(|portal| portal.x > 0.0) {
            let previous = segments[segments.len() - 1];
            segments.push(Segment {
                x: portal.x,
                seconds: previous.seconds + (portal.x - previous.x) / previous.units_per_second,
                units_per_second: portal.tier.units_per_second(),
            });
        }

        Self {
            base,
            portals,
            segments,
        }
    }

    /// Tier used before any portal.
    #[must_use]
    pub const fn base(&self) -> SpeedTier {
        self.base
    }

    /// Portals in ascending position order.
    #[must_use]
    pub fn portals(&self) -> &[SpeedPortal] {
        &self.portals
    }

    /// Seconds needed to travel from the origin to `x`.
    #[must_use]
    pub fn elapsed_seconds(&self, x: f32) -> f32 {
        let index = self
            .segments
            .partition_point(|segment| segment.x <= x)
            .saturating_sub(1);
        let segment = self.segments[index];
        segment.seconds + (x - segment.x) / segment.units_per_second
    }

    /// Position reached after travelling from the origin for `seconds`.
    #[must_use]
    pub fn position_at(&self, seconds: f32) -> f32 {
        let index = self
            .segments
            .partition_point(|segment| segment.seconds <= seconds)
            .saturating_sub(1);
        let segment = self.segments[index];
        segment.x + (seconds - segment.seconds) * segment.units_per_second
    }
}

impl Default for SpeedProfile {
    fn default() -> Self {
        Self::new(SpeedTier::default(), Vec::new())
    }
}
