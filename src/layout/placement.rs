//! Where a freshly inserted node should appear, per layout mode.
//!
//! Every function here is pure: the same reference position and sibling count
//! always yield the same target.

use super::*;

/// Target for the `sibling_count`-th child (zero based) of `parent`.
pub fn child_position(
    parent: Position,
    sibling_count: usize,
    mode: LayoutMode,
    config: &PlacementConfig,
) -> Position {
    match mode {
        LayoutMode::Mindmap => radial_child(parent, sibling_count, &config.radial),
        LayoutMode::Orgchart => tiered_child(parent, sibling_count, &config.tiered),
        LayoutMode::Logic => stacked_child(parent, sibling_count, &config.stacked),
    }
}

fn radial_child(parent: Position, sibling_count: usize, radial: &RadialConfig) -> Position {
    let slots = (sibling_count + 1).max(radial.min_slots.max(1));
    let step = std::f32::consts::TAU / slots as f32;
    let angle = radial.start_angle_deg.to_radians() + step * sibling_count as f32;
    Position::new(
        parent.x + radial.radius * angle.cos(),
        parent.y + radial.radius * angle.sin(),
    )
}

fn tiered_child(parent: Position, sibling_count: usize, tiered: &TieredConfig) -> Position {
    let span = sibling_count as f32 * tiered.horizontal_gap;
    let start_x = parent.x - span / 2.0;
    Position::new(
        start_x + sibling_count as f32 * tiered.horizontal_gap,
        parent.y + tiered.vertical_offset,
    )
}

fn stacked_child(parent: Position, sibling_count: usize, stacked: &StackedConfig) -> Position {
    let span = sibling_count as f32 * stacked.vertical_gap;
    let start_y = parent.y - span / 2.0;
    Position::new(
        parent.x + stacked.horizontal_offset,
        start_y + sibling_count as f32 * stacked.vertical_gap,
    )
}

/// Target for a node spliced in above/before `child`.
pub fn parent_position(child: Position, mode: LayoutMode, config: &PlacementConfig) -> Position {
    match mode {
        LayoutMode::Mindmap => child.offset(0.0, -config.radial.radius),
        LayoutMode::Orgchart => child.offset(0.0, -config.tiered.vertical_offset),
        LayoutMode::Logic => child.offset(-config.stacked.horizontal_offset, 0.0),
    }
}

/// Target for a sibling of `selected`. With a known parent the sibling is
/// placed as that parent's next child; otherwise it lands at a fixed offset.
pub fn sibling_position(
    selected: Position,
    parent: Option<(Position, usize)>,
    mode: LayoutMode,
    config: &PlacementConfig,
) -> Position {
    match parent {
        Some((parent_pos, sibling_count)) => {
            child_position(parent_pos, sibling_count, mode, config)
        }
        None => selected.offset(config.sibling_offset_x, config.sibling_offset_y),
    }
}

pub fn duplicate_position(original: Position, config: &PlacementConfig) -> Position {
    original.offset(config.duplicate_offset_x, config.duplicate_offset_y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Position, b: Position) -> bool {
        (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3
    }

    #[test]
    fn first_radial_child_sits_directly_above() {
        let config = PlacementConfig::default();
        let pos = child_position(Position::new(10.0, 20.0), 0, LayoutMode::Mindmap, &config);
        assert!(approx(pos, Position::new(10.0, -180.0)), "{pos:?}");
    }

    #[test]
    fn radial_children_step_clockwise_in_sixths() {
        let config = PlacementConfig::default();
        let pos = child_position(Position::default(), 1, LayoutMode::Mindmap, &config);
        // -90° + 60° = -30°
        let expected = Position::new(200.0 * 0.866_025_4, -100.0);
        assert!(approx(pos, expected), "{pos:?}");
    }

    #[test]
    fn dense_radial_children_compress_the_step() {
        let config = PlacementConfig::default();
        // Ten existing siblings: 11 slots, so the step shrinks below 60°.
        let pos = child_position(Position::default(), 10, LayoutMode::Mindmap, &config);
        let angle = pos.y.atan2(pos.x).to_degrees();
        let expected = -90.0 + 10.0 * 360.0 / 11.0 - 360.0;
        assert!((angle - expected).abs() < 1e-2, "{angle} vs {expected}");
    }

    #[test]
    fn tiered_children_sit_below_and_spread_right() {
        let config = PlacementConfig::default();
        let parent = Position::new(0.0, 0.0);
        let first = child_position(parent, 0, LayoutMode::Orgchart, &config);
        let third = child_position(parent, 2, LayoutMode::Orgchart, &config);
        assert!(approx(first, Position::new(0.0, 150.0)));
        assert!(approx(third, Position::new(200.0, 150.0)));
    }

    #[test]
    fn stacked_children_sit_right_of_parent() {
        let config = PlacementConfig::default();
        let pos = child_position(Position::new(0.0, 0.0), 1, LayoutMode::Logic, &config);
        assert!(approx(pos, Position::new(250.0, 40.0)));
    }

    #[test]
    fn placement_is_deterministic() {
        let config = PlacementConfig::default();
        for mode in [LayoutMode::Mindmap, LayoutMode::Orgchart, LayoutMode::Logic] {
            let a = child_position(Position::new(3.0, 4.0), 4, mode, &config);
            let b = child_position(Position::new(3.0, 4.0), 4, mode, &config);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn sibling_without_parent_uses_fixed_offset() {
        let config = PlacementConfig::default();
        let pos = sibling_position(Position::new(5.0, 5.0), None, LayoutMode::Logic, &config);
        assert!(approx(pos, Position::new(5.0, 105.0)));
    }

    #[test]
    fn parent_goes_before_child() {
        let config = PlacementConfig::default();
        let pos = parent_position(Position::new(0.0, 0.0), LayoutMode::Logic, &config);
        assert!(pos.x < 0.0);
        let pos = parent_position(Position::new(0.0, 0.0), LayoutMode::Orgchart, &config);
        assert!(pos.y < 0.0);
    }
}
