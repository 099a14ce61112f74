//! Pure shape rasterizers for the lifepad canvas.
//!
//! Both rasterizers are deterministic: identical inputs always produce the
//! identical ordered point sequence. Preview guides are erased by repainting
//! the previous point set, so any instability here would leave residue on
//! the canvas.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of sample points emitted for every circle rasterization.
pub const CIRCLE_SAMPLES: usize = 360;

/// Errors emitted when validating shape parameters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    /// Indicates a circle radius below zero.
    #[error("circle radius must be non-negative, got {radius}")]
    NegativeRadius { radius: i32 },
}

/// A cell coordinate in `(y, x)` order, matching the row-major canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub y: i32,
    pub x: i32,
}

impl Point {
    #[must_use]
    pub const fn new(y: i32, x: i32) -> Self {
        Self { y, x }
    }
}

/// Circle descriptor: centre plus vertical radius in cells.
///
/// The horizontal extent is twice the radius; see [`circle_points`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Circle {
    pub centre: Point,
    pub radius: i32,
}

impl Circle {
    /// Build a circle, rejecting negative radii.
    pub fn new(centre: Point, radius: i32) -> Result<Self, ShapeError> {
        if radius < 0 {
            return Err(ShapeError::NegativeRadius { radius });
        }
        Ok(Self { centre, radius })
    }
}

/// Line descriptor: both endpoints inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    pub start: Point,
    pub end: Point,
}

/// Rasterize a circle into its 360 per-degree sample points.
///
/// The vertical semi-axis is `radius` and the horizontal semi-axis is
/// `2 * radius`: terminal character cells are roughly twice as tall as they
/// are wide, so the stretched ellipse reads visually round on screen.
/// Adjacent degrees frequently land on the same cell; callers treat the
/// points as an idempotent set.
#[must_use]
pub fn circle_points(circle: Circle) -> Vec<Point> {
    let Circle { centre, radius } = circle;
    if radius <= 0 {
        // Degenerate fast path: only the centre cell, no trigonometry.
        return vec![centre; CIRCLE_SAMPLES];
    }
    let vertical = f64::from(radius);
    let horizontal = f64::from(2 * radius);
    (0..CIRCLE_SAMPLES)
        .map(|deg| {
            let theta = (deg as f64).to_radians();
            Point::new(
                centre.y + (vertical * theta.sin()).round() as i32,
                centre.x + (horizontal * theta.cos()).round() as i32,
            )
        })
        .collect()
}

/// Rasterize a line as evenly spaced integer samples.
///
/// `len` is the rounded euclidean distance between the endpoints and the
/// samples are taken inclusively (`0..=len`), so both endpoints are always
/// part of the output. A zero-length line yields the start point alone.
#[must_use]
pub fn line_points(line: Line) -> Vec<Point> {
    let Line { start, end } = line;
    let dy = f64::from(end.y - start.y);
    let dx = f64::from(end.x - start.x);
    let len = dy.hypot(dx).round() as i32;
    if len == 0 {
        return vec![start];
    }
    (0..=len)
        .map(|i| {
            let t = f64::from(i) / f64::from(len);
            Point::new(
                start.y + (dy * t).round() as i32,
                start.x + (dx * t).round() as i32,
            )
        })
        .collect()
}

/// Recover a circle radius from a drag offset.
///
/// Inverts the 2:1 horizontal stretch applied by [`circle_points`]: a
/// horizontal drag of `2r` cells and a vertical drag of `r` cells both
/// commit the same radius-`r` circle.
#[must_use]
pub fn drag_radius(centre: Point, cursor: Point) -> i32 {
    let dy = f64::from(cursor.y - centre.y);
    let dx = f64::from(cursor.x - centre.x) / 2.0;
    dy.hypot(dx).round() as i32
}
