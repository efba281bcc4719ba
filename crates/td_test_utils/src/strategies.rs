//! Property-based testing strategies using proptest.

use proptest::prelude::*;
use td_core::math::{Fixed, Vec2Fixed};

/// Generate an integer-valued map coordinate.
pub fn arb_coordinate() -> impl Strategy<Value = i32> {
    0i32..2000
}

/// Generate a map position with integer coordinates.
pub fn arb_position() -> impl Strategy<Value = Vec2Fixed> {
    (arb_coordinate(), arb_coordinate()).prop_map(|(x, y)| Vec2Fixed::from_ints(x, y))
}

/// Generate a route polyline of 2 to `max_points` points with no
/// repeated consecutive points.
pub fn arb_route(max_points: usize) -> impl Strategy<Value = Vec<Vec2Fixed>> {
    prop::collection::vec((arb_coordinate(), arb_coordinate()), 2..=max_points.max(2))
        .prop_map(|raw| {
            let mut points: Vec<Vec2Fixed> = Vec::with_capacity(raw.len());
            for (x, y) in raw {
                let point = Vec2Fixed::from_ints(x, y);
                if points.last() != Some(&point) {
                    points.push(point);
                }
            }
            points
        })
        .prop_filter("route needs two distinct points", |points| points.len() >= 2)
}

/// Generate a distance along a route, in whole units.
pub fn arb_distance() -> impl Strategy<Value = Fixed> {
    (-100i32..10_000).prop_map(Fixed::from_num)
}

/// Generate a slow fraction in `[0, 1]` in hundredths.
pub fn arb_slow_fraction() -> impl Strategy<Value = Fixed> {
    (0i32..=100).prop_map(|n| Fixed::from_num(n) / Fixed::from_num(100))
}

/// Generate a slow duration in `[0, 10]` seconds in tenths.
pub fn arb_slow_duration() -> impl Strategy<Value = Fixed> {
    (0i32..=100).prop_map(|n| Fixed::from_num(n) / Fixed::from_num(10))
}

/// Generate a tick step between zero and twice the standard step.
pub fn arb_tick_dt() -> impl Strategy<Value = Fixed> {
    (0i32..=100).prop_map(|n| Fixed::from_num(n) / Fixed::from_num(1000))
}

/// Generate a damage amount.
pub fn arb_damage() -> impl Strategy<Value = u32> {
    1u32..500
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn prop_routes_have_distinct_neighbours(route in arb_route(8)) {
            prop_assert!(route.len() >= 2);
            for pair in route.windows(2) {
                prop_assert_ne!(pair[0], pair[1]);
            }
        }

        #[test]
        fn prop_slow_fraction_is_unit_interval(fraction in arb_slow_fraction()) {
            prop_assert!(fraction >= Fixed::ZERO);
            prop_assert!(fraction <= Fixed::ONE);
        }
    }
}
