//! Edge handling for clouds drifting across the square domain.
//!
//! Clouds enter in one corner and leave through the opposite one, so the policy has to tell a
//! cloud that is still mostly on screen apart from one that has left for good. Wrapping is
//! conditional on where the cloud was on the previous frame: a cloud only reappears on the far
//! side if it was already close to that side, which rules out single-frame jumps across the
//! whole domain.
use glam::Vec2;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BoundaryPolicy {
    /// Clouds drift freely and are retired once they are more than
    /// `margin_fraction * domain` outside any edge.
    Drift { margin_fraction: f32 },
    /// Toroidal domain with direction-aware wrapping.
    Wrap {
        /// How far past an edge (as a fraction of the domain) a cloud must be before it wraps.
        edge_margin_fraction: f32,
        /// A cloud wraps only if its previous position was within this fraction of the
        /// opposite edge.
        near_edge_fraction: f32,
        /// Clouds this far outside both the west and the south edge are retired.
        exit_margin_fraction: f32,
    },
}

impl Default for BoundaryPolicy {
    fn default() -> Self {
        Self::wrap()
    }
}

/// What the boundary policy did to a cloud this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryOutcome {
    Kept,
    Wrapped,
    Exited,
}

impl BoundaryPolicy {
    pub fn drift() -> Self {
        Self::Drift {
            margin_fraction: 0.5,
        }
    }

    pub fn wrap() -> Self {
        Self::Wrap {
            edge_margin_fraction: 0.1,
            near_edge_fraction: 0.2,
            exit_margin_fraction: 0.3,
        }
    }

    /// Applies the policy to `position`, which may be translated in place.
    pub fn apply(&self, position: &mut Vec2, previous: Vec2, domain_size: f32) -> BoundaryOutcome {
        let d = domain_size;
        match *self {
            Self::Drift { margin_fraction } => {
                let margin = margin_fraction * d;
                let outside = position.x < -margin
                    || position.x > d + margin
                    || position.y < -margin
                    || position.y > d + margin;
                if outside {
                    BoundaryOutcome::Exited
                } else {
                    BoundaryOutcome::Kept
                }
            }
            Self::Wrap {
                edge_margin_fraction,
                near_edge_fraction,
                exit_margin_fraction,
            } => {
                let edge = edge_margin_fraction * d;
                let near = near_edge_fraction * d;
                let wrapped_x = wrap_axis(&mut position.x, previous.x, d, edge, near);
                let wrapped_y = wrap_axis(&mut position.y, previous.y, d, edge, near);

                // Drift heads south-west, so that corner is where clouds leave the sky.
                let exit = exit_margin_fraction * d;
                if position.x < -exit && position.y > d + exit {
                    BoundaryOutcome::Exited
                } else if wrapped_x || wrapped_y {
                    BoundaryOutcome::Wrapped
                } else {
                    BoundaryOutcome::Kept
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let fraction_ok = |f: f32| f.is_finite() && f >= 0.0;
        let ok = match *self {
            Self::Drift { margin_fraction } => fraction_ok(margin_fraction),
            Self::Wrap {
                edge_margin_fraction,
                near_edge_fraction,
                exit_margin_fraction,
            } => {
                fraction_ok(edge_margin_fraction)
                    && fraction_ok(exit_margin_fraction)
                    && (0.0..=1.0).contains(&near_edge_fraction)
            }
        };
        if ok {
            Ok(())
        } else {
            Err(Error::InvalidConfig(
                "boundary margins must be finite and >= 0, near_edge_fraction in [0, 1]".into(),
            ))
        }
    }
}

fn wrap_axis(value: &mut f32, previous: f32, d: f32, edge: f32, near: f32) -> bool {
    if *value < -edge {
        if previous > d - near {
            *value = d + edge;
            return true;
        }
    } else if *value > d + edge && previous < near {
        *value = -edge;
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    const D: f32 = 50_000.0;

    #[test]
    fn drift_keeps_clouds_within_generous_margin() {
        let policy = BoundaryPolicy::drift();
        let mut p = Vec2::new(-0.4 * D, 0.5 * D);
        let prev = p;
        assert_eq!(policy.apply(&mut p, prev, D), BoundaryOutcome::Kept);
        assert_eq!(p, Vec2::new(-0.4 * D, 0.5 * D));

        let mut gone = Vec2::new(0.5 * D, 1.6 * D);
        let prev = gone;
        assert_eq!(policy.apply(&mut gone, prev, D), BoundaryOutcome::Exited);
    }

    #[test]
    fn wrap_requires_previous_position_near_opposite_edge() {
        let policy = BoundaryPolicy::wrap();

        // Overshoot past the west edge from the middle of the domain: no teleport.
        let mut p = Vec2::new(-0.15 * D, 0.5 * D);
        let prev = Vec2::new(0.5 * D, 0.5 * D);
        assert_eq!(policy.apply(&mut p, prev, D), BoundaryOutcome::Kept);
        assert_eq!(p.x, -0.15 * D);

        // Same overshoot, but the cloud was hugging the east edge last frame.
        let mut q = Vec2::new(-0.15 * D, 0.5 * D);
        let prev_east = Vec2::new(0.9 * D, 0.5 * D);
        assert_eq!(policy.apply(&mut q, prev_east, D), BoundaryOutcome::Wrapped);
        assert_eq!(q.x, 1.1 * D);
    }

    #[test]
    fn wrap_handles_each_edge() {
        let policy = BoundaryPolicy::wrap();

        let mut east = Vec2::new(1.2 * D, 0.5 * D);
        policy.apply(&mut east, Vec2::new(0.1 * D, 0.5 * D), D);
        assert_eq!(east.x, -0.1 * D);

        let mut north = Vec2::new(0.5 * D, -0.2 * D);
        policy.apply(&mut north, Vec2::new(0.5 * D, 0.95 * D), D);
        assert_eq!(north.y, 1.1 * D);

        let mut south = Vec2::new(0.5 * D, 1.2 * D);
        policy.apply(&mut south, Vec2::new(0.5 * D, 0.05 * D), D);
        assert_eq!(south.y, -0.1 * D);
    }

    #[test]
    fn wrap_retires_only_in_south_west_exit_corner() {
        let policy = BoundaryPolicy::wrap();
        let mut sw = Vec2::new(-0.35 * D, 1.35 * D);
        let prev = sw;
        assert_eq!(policy.apply(&mut sw, prev, D), BoundaryOutcome::Exited);

        let mut west_only = Vec2::new(-0.35 * D, 0.5 * D);
        let prev = west_only;
        assert_eq!(
            policy.apply(&mut west_only, prev, D),
            BoundaryOutcome::Kept
        );
    }

    #[test]
    fn centre_start_never_jumps_more_than_a_diagonal() {
        let policy = BoundaryPolicy::wrap();
        let diagonal = D * std::f32::consts::SQRT_2;
        let prev = Vec2::splat(0.5 * D);
        for step in [
            Vec2::new(-0.7 * D, 0.0),
            Vec2::new(0.7 * D, 0.0),
            Vec2::new(0.0, -0.7 * D),
            Vec2::new(0.0, 0.7 * D),
            Vec2::new(-0.7 * D, 0.7 * D),
        ] {
            let mut p = prev + step;
            let before = p;
            policy.apply(&mut p, prev, D);
            assert_eq!(p, before);
            assert!(p.distance(prev) <= diagonal);
        }
    }

    #[test]
    fn validate_rejects_negative_margins() {
        assert!(BoundaryPolicy::Drift {
            margin_fraction: -1.0
        }
        .validate()
        .is_err());
        assert!(BoundaryPolicy::Wrap {
            edge_margin_fraction: 0.1,
            near_edge_fraction: 1.5,
            exit_margin_fraction: 0.3,
        }
        .validate()
        .is_err());
        assert!(BoundaryPolicy::default().validate().is_ok());
    }
}
