//! Point and point set types.

use std::fmt;
use std::ops::Deref;

/// A single colored point.
///
/// Position is stored as `f64`; the color channels are 8-bit values in
/// the 0-255 domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Point {
    /// Color assigned when a record carries no color.
    pub const WHITE_RGB: (u8, u8, u8) = (255, 255, 255);

    #[inline]
    pub const fn new(x: f64, y: f64, z: f64, r: u8, g: u8, b: u8) -> Self {
        Self { x, y, z, r, g, b }
    }

    /// Create a white point.
    #[inline]
    pub const fn white(x: f64, y: f64, z: f64) -> Self {
        Self::new(x, y, z, 255, 255, 255)
    }

    #[inline]
    pub fn position(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    #[inline]
    pub fn rgb(&self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }

    /// Color channels mapped to the [0, 1] range used by renderers.
    #[inline]
    pub fn normalized_rgb(&self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {}",
            self.x, self.y, self.z, self.r, self.g, self.b
        )
    }
}

/// Axis-aligned bounding box of a point set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Bounds {
    /// Extent along each axis.
    pub fn size(&self) -> [f64; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }
}

/// Ordered collection of decoded points.
///
/// Index order is input line order. The set is built by a single load and
/// handed to the caller by value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointSet {
    points: Vec<Point>,
}

impl PointSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reserve(&mut self, additional: usize) {
        self.points.reserve(additional);
    }

    #[inline]
    pub(crate) fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn into_vec(self) -> Vec<Point> {
        self.points
    }

    /// Arithmetic mean of all positions, or `None` for an empty set.
    pub fn centroid(&self) -> Option<[f64; 3]> {
        if self.points.is_empty() {
            return None;
        }
        let mut sum = [0.0f64; 3];
        for p in &self.points {
            sum[0] += p.x;
            sum[1] += p.y;
            sum[2] += p.z;
        }
        let n = self.points.len() as f64;
        Some([sum[0] / n, sum[1] / n, sum[2] / n])
    }

    /// Bounding box of all positions, or `None` for an empty set.
    pub fn bounds(&self) -> Option<Bounds> {
        let first = self.points.first()?;
        let mut bounds = Bounds {
            min: first.position(),
            max: first.position(),
        };
        for p in &self.points[1..] {
            for (axis, v) in p.position().into_iter().enumerate() {
                bounds.min[axis] = bounds.min[axis].min(v);
                bounds.max[axis] = bounds.max[axis].max(v);
            }
        }
        Some(bounds)
    }
}

impl Deref for PointSet {
    type Target = [Point];

    fn deref(&self) -> &[Point] {
        &self.points
    }
}

impl From<Vec<Point>> for PointSet {
    fn from(points: Vec<Point>) -> Self {
        Self { points }
    }
}

impl IntoIterator for PointSet {
    type Item = Point;
    type IntoIter = std::vec::IntoIter<Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}

impl<'a> IntoIterator for &'a PointSet {
    type Item = &'a Point;
    type IntoIter = std::slice::Iter<'a, Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
