//! Primitive distance fields and the combinators that compose them.
//!
//! Every function returns a plain closure, so compositions are just closures over
//! closures. All of them are total: any finite input yields a finite distance.

use nalgebra::UnitQuaternion;

use crate::{
    snap::{SnapConfig, snap_to_surface},
    types::{Point, SharedDistance, Value, Vector},
};

/// Sphere of `radius` centered on the origin.
pub fn sphere(radius: Value) -> impl Fn(Point) -> Value + Send + Sync + Clone {
    move |p| p.coords.norm() - radius
}

/// Axis-aligned box centered on the origin with full edge lengths `bounds`.
pub fn cube(bounds: Vector) -> impl Fn(Point) -> Value + Send + Sync + Clone {
    let half_bounds = bounds / 2.0;
    move |p| {
        let q = p.coords.abs() - half_bounds;
        q.sup(&Vector::zeros()).norm() + q.max().min(0.0)
    }
}

/// Capsule along the Y axis: a segment of `height` swept by `radius`.
pub fn capsule(radius: Value, height: Value) -> impl Fn(Point) -> Value + Send + Sync + Clone {
    let half_height = height / 2.0;
    move |p| {
        let y = p.y.clamp(-half_height, half_height);
        (p - Point::new(0.0, y, 0.0)).norm() - radius
    }
}

/// Capped cylinder along the Y axis.
pub fn cylinder(radius: Value, height: Value) -> impl Fn(Point) -> Value + Send + Sync + Clone {
    let half_height = height / 2.0;
    move |p| {
        let dx = p.x.hypot(p.z) - radius;
        let dy = p.y.abs() - half_height;
        dx.max(dy).min(0.0) + dx.max(0.0).hypot(dy.max(0.0))
    }
}

/// Moves `field` by `offset`.
pub fn translate<F>(offset: Vector, field: F) -> impl Fn(Point) -> Value + Send + Sync + Clone
where
    F: Fn(Point) -> Value + Send + Sync + Clone,
{
    move |p| field(p - offset)
}

/// Rotates `field` by `rotation`.
pub fn rotate<F>(rotation: UnitQuaternion<Value>, field: F) -> impl Fn(Point) -> Value + Send + Sync + Clone
where
    F: Fn(Point) -> Value + Send + Sync + Clone,
{
    let inverse = rotation.inverse();
    move |p| field(inverse * p)
}

/// Multiplies the distances of `field` by `constant`.
pub fn scale<F>(constant: Value, field: F) -> impl Fn(Point) -> Value + Send + Sync + Clone
where
    F: Fn(Point) -> Value + Send + Sync + Clone,
{
    move |p| field(p) * constant
}

/// Union of `fields`: the closest surface wins. An empty union is empty space.
pub fn union(fields: Vec<SharedDistance>) -> impl Fn(Point) -> Value + Send + Sync + Clone {
    move |p| fields.iter().map(|f| f(p)).fold(Value::INFINITY, Value::min)
}

/// Carves `second` out of `first`.
pub fn subtract<A, B>(first: A, second: B) -> impl Fn(Point) -> Value + Send + Sync + Clone
where
    A: Fn(Point) -> Value + Send + Sync + Clone,
    B: Fn(Point) -> Value + Send + Sync + Clone,
{
    move |p| first(p).max(-second(p))
}

/// Region shared by all of `fields`. An empty intersection is all of space.
pub fn intersect(fields: Vec<SharedDistance>) -> impl Fn(Point) -> Value + Send + Sync + Clone {
    move |p| fields.iter().map(|f| f(p)).fold(Value::NEG_INFINITY, Value::max)
}

/// Displaces the surface of `base` by `perturbation`.
///
/// The perturbation is sampled where `p` projects onto the base surface, so the
/// displacement sticks to the surface instead of varying through the volume.
pub fn deform<F, D>(base: F, perturbation: D) -> impl Fn(Point) -> Value + Send + Sync + Clone
where
    F: Fn(Point) -> Value + Send + Sync + Clone + 'static,
    D: Fn(Point) -> Value + Send + Sync + Clone,
{
    let config = SnapConfig::default();
    move |p| {
        let snapped = snap_to_surface(&base, p, &config);
        base(p) + perturbation(snapped.location)
    }
}

#[cfg(test)]
mod tests {
    use std::{f32::consts::FRAC_PI_2, sync::Arc};

    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn sphere_sign_follows_radius() {
        let f = sphere(2.0);
        assert_abs_diff_eq!(f(Point::new(2.0, 0.0, 0.0)), 0.0);
        assert_abs_diff_eq!(f(Point::new(0.0, -1.2, 1.6)), 0.0, epsilon = 1e-6);
        assert!(f(Point::new(0.5, 0.5, 0.5)) < 0.0);
        assert!(f(Point::new(3.0, 0.0, 1.0)) > 0.0);
    }

    #[test]
    fn cube_distances() {
        let f = cube(Vector::new(2.0, 2.0, 2.0));
        assert_eq!(f(Point::origin()), -1.0);
        assert_eq!(f(Point::new(2.0, 0.0, 0.0)), 1.0);
        assert_abs_diff_eq!(f(Point::new(2.0, 2.0, 1.0)), Value::sqrt(2.0), epsilon = 1e-6);
        assert_abs_diff_eq!(f(Point::new(0.0, 0.75, 0.0)), -0.25, epsilon = 1e-6);
    }

    #[test]
    fn translate_is_pure_substitution() {
        let offset = Vector::new(1.0, -2.0, 0.5);
        let base = cube(Vector::new(1.0, 2.0, 3.0));
        let moved = translate(offset, base.clone());
        for p in [Point::origin(), Point::new(0.3, 4.0, -1.0), Point::new(-7.0, 1.0, 2.0)] {
            assert_eq!(moved(p), base(p - offset));
        }
    }

    #[test]
    fn rotate_turns_box_onto_other_axis() {
        let slab = cube(Vector::new(4.0, 1.0, 1.0));
        let turned = rotate(UnitQuaternion::from_axis_angle(&Vector::z_axis(), FRAC_PI_2), slab);
        assert_abs_diff_eq!(turned(Point::new(0.0, 2.0, 0.0)), 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(turned(Point::new(2.0, 0.0, 0.0)), 1.5, epsilon = 1e-5);
    }

    #[test]
    fn capsule_and_cylinder_surfaces() {
        let c = capsule(0.5, 2.0);
        assert_abs_diff_eq!(c(Point::new(0.0, 1.5, 0.0)), 0.0);
        assert_abs_diff_eq!(c(Point::new(0.5, 0.3, 0.0)), 0.0);

        let y = cylinder(0.5, 2.0);
        assert_abs_diff_eq!(y(Point::new(0.0, 1.0, 0.0)), 0.0);
        assert_abs_diff_eq!(y(Point::new(0.0, 0.0, 0.5)), 0.0);
        assert_abs_diff_eq!(y(Point::origin()), -0.5);
        assert_abs_diff_eq!(y(Point::new(1.5, 2.0, 0.0)), Value::sqrt(2.0), epsilon = 1e-6);
    }

    #[test]
    fn boolean_combinators() {
        let a: SharedDistance = Arc::new(sphere(1.0));
        let b: SharedDistance = Arc::new(translate(Vector::new(1.5, 0.0, 0.0), sphere(1.0)));
        let p = Point::new(2.2, 0.0, 0.0);

        assert_eq!(union(vec![a.clone(), b.clone()])(p), a(p).min(b(p)));
        assert_eq!(intersect(vec![a.clone(), b.clone()])(p), a(p).max(b(p)));
        assert_eq!(subtract(sphere(1.0), sphere(0.5))(Point::origin()), 0.5);
        assert_eq!(union(Vec::new())(p), Value::INFINITY);
    }

    #[test]
    fn scale_multiplies_distance() {
        let f = scale(3.0, sphere(1.0));
        assert_abs_diff_eq!(f(Point::new(2.0, 0.0, 0.0)), 3.0);
    }

    #[test]
    fn deform_offsets_surface_by_perturbation() {
        let bumped = deform(sphere(1.0), |_: Point| -> Value { -0.25 });
        assert_abs_diff_eq!(bumped(Point::new(1.25, 0.0, 0.0)), 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(bumped(Point::origin()), -1.25, epsilon = 1e-4);
    }

    #[test]
    fn combinators_stay_finite_everywhere() {
        let field = deform(
            subtract(cube(Vector::new(2.0, 2.0, 2.0)), sphere(1.2)),
            |p: Point| -> Value { (p.x * 3.0).sin() * 0.1 },
        );
        for p in [
            Point::origin(),
            Point::new(1e4, -1e4, 3.0),
            Point::new(1.0, 1.0, 1.0),
            Point::new(-0.2, 0.0, 0.9),
        ] {
            assert!(field(p).is_finite());
        }
    }
}
