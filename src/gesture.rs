use crate::{
    geometry::{HandLandmarks, distance, is_finger_extended, is_thumb_extended},
    landmarks::{
        INDEX_PIP, INDEX_TIP, MIDDLE_MCP, MIDDLE_PIP, MIDDLE_TIP, PINKY_PIP, PINKY_TIP, RING_PIP,
        RING_TIP, THUMB_TIP, WRIST,
    },
    types::{Classification, GestureKind, LandmarkPoint, NUM_LANDMARKS},
};

const PINCH_RATIO: f32 = 0.25;
const OK_SIGN_RATIO: f32 = 0.3;

const PINCH_CONFIDENCE: f32 = 0.85;
const THUMB_VERTICAL_CONFIDENCE: f32 = 0.88;
const PEACE_CONFIDENCE: f32 = 0.85;
const POINTING_CONFIDENCE: f32 = 0.9;
const OPEN_PALM_CONFIDENCE: f32 = 0.9;
const FIST_CONFIDENCE: f32 = 0.88;
const OK_SIGN_CONFIDENCE: f32 = 0.82;
const FALLBACK_CONFIDENCE: f32 = 0.5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FingerStates {
    pub thumb: bool,
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
}

impl FingerStates {
    pub fn measure(points: &HandLandmarks) -> Self {
        Self {
            thumb: is_thumb_extended(points),
            index: is_finger_extended(points, INDEX_TIP, INDEX_PIP, WRIST),
            middle: is_finger_extended(points, MIDDLE_TIP, MIDDLE_PIP, WRIST),
            ring: is_finger_extended(points, RING_TIP, RING_PIP, WRIST),
            pinky: is_finger_extended(points, PINKY_TIP, PINKY_PIP, WRIST),
        }
    }

    pub fn as_array(&self) -> [bool; 5] {
        [self.thumb, self.index, self.middle, self.ring, self.pinky]
    }

    pub fn extended_count(&self) -> usize {
        self.as_array().iter().filter(|&&extended| extended).count()
    }
}

/// Classifies one hand. Malformed input (fewer than 21 points) yields
/// `unknown` with zero confidence.
pub fn classify_gesture(landmarks: &[LandmarkPoint]) -> Classification {
    match hand_landmarks(landmarks) {
        Some(points) => classify_hand(points, &FingerStates::measure(points)),
        None => Classification::unknown(),
    }
}

pub fn hand_landmarks(landmarks: &[LandmarkPoint]) -> Option<&HandLandmarks> {
    landmarks.get(..NUM_LANDMARKS)?.try_into().ok()
}

/// Rule cascade; the first rule that matches wins. Distances are taken
/// relative to the wrist/middle-knuckle span so the result does not depend
/// on how far the hand is from the camera.
pub fn classify_hand(points: &HandLandmarks, fingers: &FingerStates) -> Classification {
    let thumb_tip = points[THUMB_TIP];
    let wrist = points[WRIST];
    let hand_size = distance(wrist, points[MIDDLE_MCP]);
    let pinch_distance = distance(thumb_tip, points[INDEX_TIP]);
    let others_folded = !fingers.middle && !fingers.ring && !fingers.pinky;

    if pinch_distance < hand_size * PINCH_RATIO && others_folded {
        return Classification::new(GestureKind::Pinch, PINCH_CONFIDENCE);
    }

    if fingers.thumb && !fingers.index && others_folded {
        // Image y grows downwards.
        let kind = if thumb_tip.y < wrist.y {
            GestureKind::ThumbsUp
        } else {
            GestureKind::ThumbsDown
        };
        return Classification::new(kind, THUMB_VERTICAL_CONFIDENCE);
    }

    if fingers.index && fingers.middle && !fingers.ring && !fingers.pinky {
        return Classification::new(GestureKind::Peace, PEACE_CONFIDENCE);
    }

    if fingers.index && others_folded {
        return Classification::new(GestureKind::Pointing, POINTING_CONFIDENCE);
    }

    let extended = fingers.extended_count();
    if extended >= 4 {
        return Classification::new(GestureKind::OpenPalm, OPEN_PALM_CONFIDENCE);
    }

    if extended <= 1 && !fingers.thumb {
        return Classification::new(GestureKind::Fist, FIST_CONFIDENCE);
    }

    if pinch_distance < hand_size * OK_SIGN_RATIO && fingers.middle && fingers.ring {
        return Classification::new(GestureKind::OkSign, OK_SIGN_CONFIDENCE);
    }

    Classification::new(GestureKind::Unknown, FALLBACK_CONFIDENCE)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::{
        landmarks::*,
        types::{LandmarkPoint, NUM_LANDMARKS},
    };

    #[derive(Clone, Copy)]
    pub enum Thumb {
        Folded,
        Up,
        Down,
        Touching,
    }

    /// Synthetic right hand, palm facing the camera, fingers pointing up.
    pub fn hand(thumb: Thumb, fingers: [bool; 4]) -> Vec<LandmarkPoint> {
        let p = LandmarkPoint::new;
        let mut points = vec![LandmarkPoint::default(); NUM_LANDMARKS];
        points[WRIST] = p(0.5, 0.9, 0.0);

        let chains = [
            (INDEX_MCP, 0.42, 0.60),
            (MIDDLE_MCP, 0.50, 0.58),
            (RING_MCP, 0.57, 0.60),
            (PINKY_MCP, 0.63, 0.63),
        ];
        for (&(mcp, x, y), extended) in chains.iter().zip(fingers) {
            points[mcp] = p(x, y, 0.0);
            if extended {
                points[mcp + 1] = p(x, y - 0.08, 0.0);
                points[mcp + 2] = p(x, y - 0.15, 0.0);
                points[mcp + 3] = p(x, y - 0.22, 0.0);
            } else {
                points[mcp + 1] = p(x, y - 0.06, 0.0);
                points[mcp + 2] = p(x, y - 0.01, 0.0);
                points[mcp + 3] = p(x, y + 0.08, 0.0);
            }
        }

        points[THUMB_CMC] = p(0.42, 0.83, 0.0);
        points[THUMB_MCP] = p(0.36, 0.75, 0.0);
        points[THUMB_IP] = p(0.30, 0.68, 0.0);
        points[THUMB_TIP] = match thumb {
            Thumb::Folded => p(0.50, 0.60, 0.0),
            Thumb::Up => p(0.22, 0.62, 0.0),
            Thumb::Down => p(0.30, 0.98, 0.0),
            Thumb::Touching => {
                let tip = points[INDEX_TIP];
                p(tip.x + 0.01, tip.y + 0.01, 0.0)
            }
        };
        points
    }

    pub fn fist() -> Vec<LandmarkPoint> {
        hand(Thumb::Folded, [false, false, false, false])
    }

    pub fn open_palm() -> Vec<LandmarkPoint> {
        hand(Thumb::Up, [true, true, true, true])
    }

    pub fn pointing() -> Vec<LandmarkPoint> {
        hand(Thumb::Folded, [true, false, false, false])
    }

    pub fn peace() -> Vec<LandmarkPoint> {
        hand(Thumb::Folded, [true, true, false, false])
    }

    pub fn thumbs_up() -> Vec<LandmarkPoint> {
        hand(Thumb::Up, [false, false, false, false])
    }

    pub fn thumbs_down() -> Vec<LandmarkPoint> {
        hand(Thumb::Down, [false, false, false, false])
    }

    pub fn pinch() -> Vec<LandmarkPoint> {
        hand(Thumb::Touching, [false, false, false, false])
    }

    pub fn ok_sign() -> Vec<LandmarkPoint> {
        let mut points = hand(Thumb::Folded, [false, true, true, true]);
        // Curl the index towards the thumb.
        points[INDEX_PIP] = LandmarkPoint::new(0.42, 0.54, 0.0);
        points[INDEX_DIP] = LandmarkPoint::new(0.40, 0.53, 0.0);
        points[INDEX_TIP] = LandmarkPoint::new(0.38, 0.56, 0.0);
        points[THUMB_TIP] = LandmarkPoint::new(0.39, 0.57, 0.0);
        points
    }
}
