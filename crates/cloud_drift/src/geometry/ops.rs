//! Stateless transforms over lists of [`CloudShape`]s.
use glam::Vec2;
use rand::RngCore;

use crate::geometry::{shape_extents, CloudShape, DIAMETER_M_PER_RADIUS_KM};
use crate::preset::CloudTypePreset;
use crate::sampling::rand_range;

/// A named pass over a shape list, for callers that pick the transform at runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapePass {
    /// Keep shapes with opacity strictly above the threshold.
    FilterVisible(f32),
    /// Largest first.
    SortByArea,
    /// Highest first.
    SortByAltitude,
}

impl ShapePass {
    pub fn apply(&self, shapes: Vec<CloudShape>) -> Vec<CloudShape> {
        match *self {
            Self::FilterVisible(threshold) => filter_visible(shapes, threshold),
            Self::SortByArea => sort_by_area(shapes),
            Self::SortByAltitude => sort_by_altitude(shapes),
        }
    }
}

pub fn filter_visible(shapes: Vec<CloudShape>, threshold: f32) -> Vec<CloudShape> {
    shapes.into_iter().filter(|s| s.opacity > threshold).collect()
}

/// Sorts by bounding-box area, largest first. The sort is stable.
pub fn sort_by_area(mut shapes: Vec<CloudShape>) -> Vec<CloudShape> {
    shapes.sort_by(|a, b| b.area().total_cmp(&a.area()));
    shapes
}

/// Sorts by altitude, highest first. The sort is stable.
pub fn sort_by_altitude(mut shapes: Vec<CloudShape>) -> Vec<CloudShape> {
    shapes.sort_by(|a, b| b.altitude_km.total_cmp(&a.altitude_km));
    shapes
}

/// Blends two frames of shapes by `t` in [0, 1].
///
/// Shapes are matched by index. When one list is longer, its unmatched tail is kept and
/// faded: shapes only in `from` fade out with `1 - t`, shapes only in `to` fade in with `t`.
/// Matched pairs keep the type tag of `from`.
pub fn interpolate(from: &[CloudShape], to: &[CloudShape], t: f32) -> Vec<CloudShape> {
    let len = from.len().max(to.len());
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        let shape = match (from.get(i), to.get(i)) {
            (Some(a), Some(b)) => CloudShape {
                position: a.position.lerp(b.position, t),
                width: lerp(a.width, b.width, t),
                height: lerp(a.height, b.height, t),
                rotation: lerp(a.rotation, b.rotation, t),
                opacity: lerp(a.opacity, b.opacity, t),
                altitude_km: lerp(a.altitude_km, b.altitude_km, t),
                cloud_type: a.cloud_type.clone(),
            },
            (Some(a), None) => CloudShape {
                opacity: a.opacity * (1.0 - t),
                ..a.clone()
            },
            (None, Some(b)) => CloudShape {
                opacity: b.opacity * t,
                ..b.clone()
            },
            (None, None) => unreachable!("index below the longer length"),
        };
        out.push(shape);
    }
    out
}

/// Scatters `count` decorative shapes of one type around `center`.
///
/// Each shape gets a diameter drawn from `size_range_m`, and is offset by up to a quarter of
/// the range bounds on each axis. Shapes are drawn fully grown at the preset's opacity ceiling.
pub fn scatter_shapes_for_type(
    preset: &CloudTypePreset,
    count: usize,
    center: Vec2,
    size_range_m: (f32, f32),
    rng: &mut dyn RngCore,
) -> Vec<CloudShape> {
    let (lo, hi) = size_range_m;
    (0..count)
        .map(|_| {
            let x = center.x + rand_range(rng, -lo / 4.0, lo / 4.0);
            let y = center.y + rand_range(rng, -hi / 4.0, hi / 4.0);
            let diameter_m = rand_range(rng, lo, hi);
            let (width, height) = shape_extents(
                diameter_m / DIAMETER_M_PER_RADIUS_KM,
                preset.elongation,
                1.0,
            );
            CloudShape {
                position: Vec2::new(x, y),
                width,
                height,
                rotation: 0.0,
                opacity: preset.max_opacity,
                altitude_km: preset.altitude_km,
                cloud_type: preset.id.clone(),
            }
        })
        .collect()
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::preset::CloudTypeDef;

    fn shape(id: &str, size: f32, altitude_km: f32, opacity: f32) -> CloudShape {
        CloudShape {
            position: Vec2::new(size, size),
            width: size,
            height: size,
            rotation: 0.0,
            opacity,
            altitude_km,
            cloud_type: id.into(),
        }
    }

    #[test]
    fn filter_drops_faint_shapes() {
        let shapes = vec![shape("a", 1.0, 1.0, 0.005), shape("b", 1.0, 1.0, 0.5)];
        let kept = filter_visible(shapes, 0.01);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].cloud_type, "b");
    }

    #[test]
    fn sorts_by_area_and_altitude_descending() {
        let shapes = vec![
            shape("small", 1.0, 9.0, 1.0),
            shape("large", 3.0, 2.0, 1.0),
            shape("mid", 2.0, 5.0, 1.0),
        ];
        let by_area: Vec<_> = ShapePass::SortByArea
            .apply(shapes.clone())
            .into_iter()
            .map(|s| s.cloud_type)
            .collect();
        assert_eq!(by_area, vec!["large", "mid", "small"]);

        let by_alt: Vec<_> = sort_by_altitude(shapes)
            .into_iter()
            .map(|s| s.cloud_type)
            .collect();
        assert_eq!(by_alt, vec!["small", "mid", "large"]);
    }

    #[test]
    fn interpolate_blends_matched_pairs() {
        let a = vec![shape("a", 0.0, 2.0, 0.0)];
        let b = vec![shape("b", 10.0, 4.0, 1.0)];
        let mid = interpolate(&a, &b, 0.5);
        assert_eq!(mid.len(), 1);
        assert_eq!(mid[0].width, 5.0);
        assert_eq!(mid[0].position, Vec2::splat(5.0));
        assert_eq!(mid[0].altitude_km, 3.0);
        assert_eq!(mid[0].opacity, 0.5);
        assert_eq!(mid[0].cloud_type, "a");
    }

    #[test]
    fn interpolate_fades_unmatched_tails() {
        let a = vec![shape("a", 1.0, 1.0, 1.0), shape("gone", 1.0, 1.0, 0.8)];
        let b = vec![shape("b", 1.0, 1.0, 1.0)];
        let out = interpolate(&a, &b, 0.25);
        assert_eq!(out.len(), 2);
        assert!((out[1].opacity - 0.6).abs() < 1e-6);
        assert_eq!(out[1].cloud_type, "gone");

        let fade_in = interpolate(&[], &a, 0.25);
        assert_eq!(fade_in.len(), 2);
        assert!((fade_in[0].opacity - 0.25).abs() < 1e-6);

        assert!(interpolate(&[], &[], 0.5).is_empty());
    }

    #[test]
    fn scattered_shapes_use_preset_and_stay_near_center() {
        let preset = CloudTypePreset::from(&CloudTypeDef::cirrus());
        let mut rng = StdRng::seed_from_u64(4);
        let center = Vec2::new(1000.0, 1000.0);
        let shapes = scatter_shapes_for_type(&preset, 8, center, (400.0, 800.0), &mut rng);
        assert_eq!(shapes.len(), 8);
        for s in &shapes {
            assert!((s.position.x - center.x).abs() <= 100.0);
            assert!((s.position.y - center.y).abs() <= 200.0);
            assert!(s.width >= 400.0 * 2.5 - 1e-2 && s.width <= 800.0 * 2.5 + 1e-2);
            assert_eq!(s.opacity, 0.5);
            assert_eq!(s.cloud_type, "cirrus");
        }
    }
}
