use level_scene_core::{ChannelId, Rgba, CHANNEL_COUNT};

/// Flat table holding the current color of every channel slot.
///
/// Every slot starts white. The black channel is pinned to opaque black and
/// cannot be overwritten.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorTable {
    slots: Vec<Rgba>,
}

impl ColorTable {
    /// Creates a table with every channel white except the black channel.
    #[must_use]
    pub fn new() -> Self {
        let mut slots = vec![Rgba::WHITE; CHANNEL_COUNT];
        slots[ChannelId::BLACK.index()] = Rgba::BLACK;
        Self { slots }
    }

    /// Stores `color` in `channel`. Writes to the black channel are ignored.
    pub fn set(&mut self, channel: ChannelId, color: Rgba) {
        if channel == ChannelId::BLACK {
            return;
        }
        self.slots[channel.index()] = color;
    }

    /// Current color of `channel`.
    #[must_use]
    pub fn get(&self, channel: ChannelId) -> Rgba {
        self.slots[channel.index()]
    }

    /// Updates the alpha of the grid fade slot, clamped to `[0, 1]`.
    pub fn set_grid_fade(&mut self, alpha: f32) {
        let alpha = if alpha.is_nan() {
            0.0
        } else {
            alpha.clamp(0.0, 1.0)
        };
        self.slots[ChannelId::GRID_FADE.index()].a = alpha;
    }

    /// Flattens the table into `[r, g, b, a]` quadruples in channel order.
    #[must_use]
    pub fn flatten(&self) -> Vec<f32> {
        self.slots.iter().flat_map(|color| color.to_array()).collect()
    }
}

impl Default for ColorTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(value: u16) -> ChannelId {
        ChannelId::new(value).expect("channel in range")
    }

    #[test]
    fn channels_default_to_white_except_black() {
        let table = ColorTable::new();
        assert_eq!(table.get(channel(0)), Rgba::WHITE);
        assert_eq!(table.get(ChannelId::BACKGROUND), Rgba::WHITE);
        assert_eq!(table.get(ChannelId::BLACK), Rgba::BLACK);
    }

    #[test]
    fn black_channel_cannot_be_overwritten() {
        let mut table = ColorTable::new();
        table.set(ChannelId::BLACK, Rgba::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(table.get(ChannelId::BLACK), Rgba::BLACK);
    }

    #[test]
    fn grid_fade_only_touches_alpha() {
        let mut table = ColorTable::new();
        table.set_grid_fade(0.25);
        assert_eq!(table.get(ChannelId::GRID_FADE), Rgba::new(1.0, 1.0, 1.0, 0.25));
        table.set_grid_fade(7.0);
        assert_eq!(table.get(ChannelId::GRID_FADE).a, 1.0);
    }

    #[test]
    fn flatten_emits_four_components_per_channel() {
        let mut table = ColorTable::new();
        table.set(channel(3), Rgba::new(0.5, 0.25, 0.0, 1.0));

        let flat = table.flatten();
        assert_eq!(flat.len(), CHANNEL_COUNT * 4);
        assert_eq!(&flat[12..16], &[0.5, 0.25, 0.0, 1.0]);
        let black = ChannelId::BLACK.index() * 4;
        assert_eq!(&flat[black..black + 4], &[0.0, 0.0, 0.0, 1.0]);
    }
}
