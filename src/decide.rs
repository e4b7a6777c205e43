//! Decision engine.
//!
//! A pure mapping from a detection list to a medical / non-medical outcome.
//! Detections below the confidence threshold are dropped before the category
//! check and never influence the outcome. The engine validates nothing:
//! out-of-range confidences are compared as-is.

use std::collections::HashSet;

use crate::infer::Detection;

/// Classification outcome for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Medical,
    NonMedical,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Medical => "MEDICAL",
            Outcome::NonMedical => "NON_MEDICAL",
        }
    }
}

/// Outcome plus the detections that survived the confidence filter, in their
/// original relative order and with lower-cased categories.
#[derive(Clone, Debug)]
pub struct Classification {
    pub outcome: Outcome,
    pub hits: Vec<Detection>,
}

/// Classify a detection list against a medical category set.
///
/// The outcome is `Medical` exactly when at least one retained detection's
/// lower-cased category is a member of `medical_set`. An empty detection
/// list is valid input and yields `NonMedical` with no hits.
pub fn classify(
    detections: &[Detection],
    threshold: f32,
    medical_set: &HashSet<String>,
) -> Classification {
    let mut hits = Vec::new();
    let mut medical_hit = false;
    for detection in detections {
        if detection.confidence < threshold {
            continue;
        }
        let category = detection.category.to_lowercase();
        if medical_set.contains(&category) {
            medical_hit = true;
        }
        hits.push(Detection {
            category,
            confidence: detection.confidence,
        });
    }
    let outcome = if medical_hit {
        Outcome::Medical
    } else {
        Outcome::NonMedical
    };
    Classification { outcome, hits }
}
