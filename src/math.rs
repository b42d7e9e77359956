use std::f32::consts::{PI, TAU};

use bevy::prelude::*;
use rand::Rng;

/// Lengths below this are treated as zero.
pub const EPSILON: f32 = 1e-4;

pub fn truncate_vec2(vec2: Vec2, max: f32) -> Vec2 {
    if vec2.length() > max {
        let vec2 = vec2.normalize_or_zero();
        return vec2 * max;
    }

    vec2
}

/// Wraps an angle in radians into the range `(-PI, PI]`.
pub fn wrap_angle(mut angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }

    if angle.abs() > 8.0 * TAU {
        angle %= TAU;
    }

    while angle > PI {
        angle -= TAU;
    }
    while angle <= -PI {
        angle += TAU;
    }

    angle
}

/// Unit vector pointing along `angle` (radians, counter-clockwise from +X).
pub fn heading(angle: f32) -> Vec2 {
    Vec2::from_angle(angle)
}

/// Direction from `from` to `to`, or zero if both points coincide.
pub fn direction(from: Vec2, to: Vec2) -> Vec2 {
    let dv = to - from;
    if dv.length() < EPSILON {
        return Vec2::ZERO;
    }

    dv.normalize_or_zero()
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

pub fn rng_f32(rng: &mut impl Rng, min: f32, max: f32) -> f32 {
    if min >= max {
        return min;
    }

    rng.gen_range(min..=max)
}
