//! Position-zone calibration math.
//!
//! The interactive part of calibration (camera, sampling UI) lives with
//! the host application; this module holds the pure step: turning three
//! sets of sampled thumb heights into contiguous, non-overlapping zones
//! for [`GestureConfig::position_zones`](crate::GestureConfig).

use crate::recognizer::Zone;

/// Derive the three position zones from calibration samples.
///
/// The three sample sets are ordered by their mean (so callers may pass
/// them in any order), then each zone runs from the previous boundary to
/// that set's maximum; the last zone always extends to 1.0. Returns
/// `None` if any set is empty.
pub fn compute_zones(samples: [&[f32]; 3]) -> Option<[Zone; 3]> {
    if samples.iter().any(|s| s.is_empty()) {
        return None;
    }

    let mut sets: Vec<(f32, f32)> = samples
        .iter()
        .map(|s| {
            let mean = s.iter().sum::<f32>() / s.len() as f32;
            let max = s.iter().fold(f32::MIN, |m, v| m.max(*v));
            (mean, max.clamp(0.0, 1.0))
        })
        .collect();
    sets.sort_by(|a, b| a.0.total_cmp(&b.0));

    let first = Zone::new(0.0, sets[0].1);
    let second = Zone::new(sets[0].1, sets[1].1.max(sets[0].1));
    let third = Zone::new(second.max, 1.0);
    Some([first, second, third])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zones_are_contiguous_and_cover_the_screen() {
        let zones = compute_zones([
            &[0.10, 0.15, 0.20],
            &[0.40, 0.45, 0.50],
            &[0.70, 0.80, 0.90],
        ])
        .unwrap();

        assert_eq!(zones[0].min, 0.0);
        assert_eq!(zones[0].max, 0.20);
        assert_eq!(zones[1].min, 0.20);
        assert_eq!(zones[1].max, 0.50);
        assert_eq!(zones[2].min, 0.50);
        assert_eq!(zones[2].max, 1.0);
    }

    #[test]
    fn sample_order_does_not_matter() {
        let sorted = compute_zones([&[0.1], &[0.5], &[0.8]]).unwrap();
        let shuffled = compute_zones([&[0.8], &[0.1], &[0.5]]).unwrap();
        assert_eq!(sorted, shuffled);
    }

    #[test]
    fn overlapping_sets_still_produce_ordered_zones() {
        // The "middle" set's max dips below the low set's max
        let zones = compute_zones([&[0.1, 0.4], &[0.30, 0.35], &[0.9]]).unwrap();
        assert!(zones[1].max >= zones[1].min);
        assert!(zones[2].min >= zones[1].min);
    }

    #[test]
    fn empty_set_yields_none() {
        assert_eq!(compute_zones([&[0.1], &[], &[0.9]]), None);
    }

    #[test]
    fn out_of_range_samples_are_clamped() {
        let zones = compute_zones([&[0.1], &[0.5], &[1.4]]).unwrap();
        assert_eq!(zones[2].max, 1.0);
        assert!(zones[1].max <= 1.0);
    }
}
