use serde::{Deserialize, Serialize};

/// A 2D landmark coordinate, in the provider's pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// Arithmetic mean of two points.
pub fn midpoint(p1: Point, p2: Point) -> Point {
    Point::new((p1.x + p2.x) / 2.0, (p1.y + p2.y) / 2.0)
}

/// The six landmarks outlining one eye.
///
/// Order: `[outer_corner, upper_lid_1, upper_lid_2, inner_corner, lower_lid_1, lower_lid_2]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyeLandmarks(pub [Point; 6]);

impl EyeLandmarks {
    pub const fn new(points: [Point; 6]) -> Self {
        Self(points)
    }

    pub fn outer_corner(&self) -> Point {
        self.0[0]
    }

    pub fn inner_corner(&self) -> Point {
        self.0[3]
    }

    /// Midpoint of the two upper-lid landmarks.
    pub fn upper_lid_center(&self) -> Point {
        midpoint(self.0[1], self.0[2])
    }

    /// Midpoint of the two lower-lid landmarks.
    pub fn lower_lid_center(&self) -> Point {
        midpoint(self.0[4], self.0[5])
    }
}

/// Eye landmarks of a single face. Either eye may be missing when the
/// provider's shape is truncated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceEyes {
    pub left: Option<EyeLandmarks>,
    pub right: Option<EyeLandmarks>,
}

/// What the landmark provider saw in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameObservation {
    pub sequence: u64,
    /// Number of faces the provider reported. Only the first is processed.
    pub faces_detected: usize,
    /// Eyes of the first face, if any face was present.
    pub face: Option<FaceEyes>,
}

impl FrameObservation {
    /// A frame in which no face was detected.
    pub fn empty(sequence: u64) -> Self {
        Self {
            sequence,
            faces_detected: 0,
            face: None,
        }
    }
}
