//! Rule-based gesture classification from the 21 hand landmarks.
//!
//! Landmark layout: 0 wrist, then four points per digit from base to tip
//! (thumb 1-4, index 5-8, middle 9-12, ring 13-16, pinky 17-20). Image
//! coordinates, y grows downwards.

use super::detection_result::{Category, NormalizedLandmark};

pub const HAND_LANDMARK_COUNT: usize = 21;

const WRIST: usize = 0;
const THUMB_IP: usize = 3;
const THUMB_TIP: usize = 4;
const INDEX_MCP: usize = 5;
const MIDDLE_MCP: usize = 9;

/// `(pip, tip)` per non-thumb finger.
const FINGERS: [(usize, usize); 4] = [(6, 8), (10, 12), (14, 16), (18, 20)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    None,
    ClosedFist,
    OpenPalm,
    PointingUp,
    ThumbDown,
    ThumbUp,
    Victory,
    ILoveYou,
}

impl Gesture {
    pub fn name(self) -> &'static str {
        match self {
            Gesture::None => "None",
            Gesture::ClosedFist => "Closed_Fist",
            Gesture::OpenPalm => "Open_Palm",
            Gesture::PointingUp => "Pointing_Up",
            Gesture::ThumbDown => "Thumb_Down",
            Gesture::ThumbUp => "Thumb_Up",
            Gesture::Victory => "Victory",
            Gesture::ILoveYou => "ILoveYou",
        }
    }

    pub fn index(self) -> i32 {
        self as i32
    }

    pub fn to_category(self, score: f32) -> Category {
        Category::new(self.index(), score, self.name())
    }
}

fn dist(a: &NormalizedLandmark, b: &NormalizedLandmark) -> f32 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

/// Tip farther from the wrist than the middle joint.
fn finger_extended(lm: &[NormalizedLandmark], pip: usize, tip: usize) -> bool {
    dist(&lm[WRIST], &lm[tip]) > dist(&lm[WRIST], &lm[pip])
}

/// Thumb tip farther from the palm centre than the thumb's last joint.
fn thumb_extended(lm: &[NormalizedLandmark]) -> bool {
    dist(&lm[THUMB_TIP], &lm[MIDDLE_MCP]) > dist(&lm[THUMB_IP], &lm[MIDDLE_MCP])
}

pub fn classify(landmarks: &[NormalizedLandmark]) -> Gesture {
    if landmarks.len() < HAND_LANDMARK_COUNT {
        return Gesture::None;
    }
    let lm = landmarks;
    let [index, middle, ring, pinky] = FINGERS.map(|(pip, tip)| finger_extended(lm, pip, tip));
    let thumb = thumb_extended(lm);

    match (thumb, index, middle, ring, pinky) {
        (true, true, true, true, true) => Gesture::OpenPalm,
        (true, true, false, false, true) => Gesture::ILoveYou,
        (_, true, true, false, false) => Gesture::Victory,
        (false, true, false, false, false) if lm[8].y < lm[INDEX_MCP].y => Gesture::PointingUp,
        (true, false, false, false, false) => {
            let tip = lm[THUMB_TIP].y;
            if tip < lm[INDEX_MCP].y && tip < lm[WRIST].y {
                Gesture::ThumbUp
            } else if tip > lm[WRIST].y {
                Gesture::ThumbDown
            } else {
                Gesture::ClosedFist
            }
        }
        (false, false, false, false, false) => Gesture::ClosedFist,
        _ => Gesture::None,
    }
}
