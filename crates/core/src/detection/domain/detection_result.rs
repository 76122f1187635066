//! Per-frame detector output. Nothing here outlives the tick that produced it.

/// Axis-aligned box in frame pixels, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub origin_x: f32,
    pub origin_y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(origin_x: f32, origin_y: f32, width: f32, height: f32) -> Self {
        Self {
            origin_x,
            origin_y,
            width,
            height,
        }
    }

    /// Builds a box from corner coordinates `[x1, y1, x2, y2]`.
    pub fn from_corners(corners: [f64; 4]) -> Self {
        Self::new(
            corners[0] as f32,
            corners[1] as f32,
            (corners[2] - corners[0]) as f32,
            (corners[3] - corners[1]) as f32,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub index: i32,
    pub score: f32,
    pub category_name: String,
    pub display_name: String,
}

impl Category {
    pub fn new(index: i32, score: f32, name: impl Into<String>) -> Self {
        let category_name = name.into();
        Self {
            index,
            score,
            display_name: category_name.clone(),
            category_name,
        }
    }

    /// Highest-scoring category; ties keep the earlier one.
    pub fn best(categories: &[Category]) -> Option<&Category> {
        categories
            .iter()
            .fold(None, |best: Option<&Category>, current| match best {
                Some(b) if b.score >= current.score => Some(b),
                _ => Some(current),
            })
    }
}

/// A point in normalized `[0, 1]` image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormalizedLandmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl NormalizedLandmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub bounding_box: Option<BoundingBox>,
    pub categories: Vec<Category>,
    pub keypoints: Vec<NormalizedLandmark>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GestureRecognizerResult {
    /// Ranked gesture categories per hand.
    pub gestures: Vec<Vec<Category>>,
    pub handedness: Vec<Vec<Category>>,
    pub landmarks: Vec<Vec<NormalizedLandmark>>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FaceLandmarkerResult {
    pub face_landmarks: Vec<Vec<NormalizedLandmark>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetectionResult {
    Objects(Vec<Detection>),
    Faces(Vec<Detection>),
    Gestures(GestureRecognizerResult),
    FaceLandmarks(FaceLandmarkerResult),
}

impl DetectionResult {
    /// Number of detected items (boxes, hands or faces).
    pub fn item_count(&self) -> usize {
        match self {
            DetectionResult::Objects(d) | DetectionResult::Faces(d) => d.len(),
            DetectionResult::Gestures(g) => g.landmarks.len(),
            DetectionResult::FaceLandmarks(f) => f.face_landmarks.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_best_category_picks_highest_score() {
        let cats = vec![
            Category::new(0, 0.3, "cat"),
            Category::new(1, 0.8, "dog"),
            Category::new(2, 0.5, "bird"),
        ];
        assert_eq!(Category::best(&cats).unwrap().category_name, "dog");
    }

    #[test]
    fn test_best_category_keeps_first_on_tie() {
        let cats = vec![Category::new(0, 0.5, "a"), Category::new(1, 0.5, "b")];
        assert_eq!(Category::best(&cats).unwrap().category_name, "a");
    }

    #[test]
    fn test_best_category_empty() {
        assert!(Category::best(&[]).is_none());
    }

    #[test]
    fn test_box_from_corners() {
        let b = BoundingBox::from_corners([10.0, 20.0, 40.0, 70.0]);
        assert_relative_eq!(b.origin_x, 10.0);
        assert_relative_eq!(b.origin_y, 20.0);
        assert_relative_eq!(b.width, 30.0);
        assert_relative_eq!(b.height, 50.0);
    }

    #[test]
    fn test_item_count() {
        let gestures = GestureRecognizerResult {
            landmarks: vec![vec![NormalizedLandmark::default(); 21]; 2],
            ..Default::default()
        };
        assert_eq!(DetectionResult::Gestures(gestures).item_count(), 2);
        assert_eq!(DetectionResult::Objects(vec![]).item_count(), 0);
    }
}
