use crate::{
    landmarks::{INDEX_MCP, THUMB_MCP, THUMB_TIP},
    types::{LandmarkPoint, NUM_LANDMARKS},
};

pub type HandLandmarks = [LandmarkPoint; NUM_LANDMARKS];

/// Noise margin a fingertip must clear over its PIP joint, measured from the wrist.
pub const FINGER_EXTENSION_FACTOR: f32 = 1.1;
/// Fraction of the thumb MCP's distance to the index MCP the thumb tip must exceed.
pub const THUMB_EXTENSION_FACTOR: f32 = 0.8;

pub fn distance(a: LandmarkPoint, b: LandmarkPoint) -> f32 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2) + (a.z - b.z).powi(2)).sqrt()
}

pub fn is_finger_extended(points: &HandLandmarks, tip: usize, pip: usize, wrist: usize) -> bool {
    let tip_to_wrist = distance(points[tip], points[wrist]);
    let pip_to_wrist = distance(points[pip], points[wrist]);
    tip_to_wrist > pip_to_wrist * FINGER_EXTENSION_FACTOR
}

// The thumb folds across the palm rather than towards the wrist, so it is
// measured against the index knuckle instead.
pub fn is_thumb_extended(points: &HandLandmarks) -> bool {
    let index_mcp = points[INDEX_MCP];
    let tip_to_index = distance(points[THUMB_TIP], index_mcp);
    let mcp_to_index = distance(points[THUMB_MCP], index_mcp);
    tip_to_index > mcp_to_index * THUMB_EXTENSION_FACTOR
}
