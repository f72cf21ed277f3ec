use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::Mutex;

use crate::domain::{ContentAnalysis, Dataset, TrajectoryClassification};

/// Number of tags handed back per dataset.
pub const TAGS_PER_DATASET: usize = 5;

/// Domain tags and the keywords that make them relevant.
const TAG_VOCABULARY: &[(&str, &[&str])] = &[
    ("warehouse", &["warehouse", "logistics"]),
    ("pick-and-place", &["pick-and-place", "pick and place", "picking"]),
    ("industrial", &["industrial", "factory"]),
    ("gripper", &["gripper", "grasp"]),
    ("conveyor", &["conveyor"]),
    ("assembly", &["assembly", "assemble"]),
    ("kitchen", &["kitchen", "cooking"]),
    ("manipulation", &["manipulat", "cutting", "stirring"]),
    ("navigation", &["navigat", "mapping", "slam"]),
    ("autonomous", &["autonomous", "self-driving"]),
    ("vehicle", &["vehicle", "car ", "cars", "driving"]),
    ("outdoor", &["outdoor", "urban", "street"]),
    ("monitoring", &["monitor", "inspection"]),
    ("lidar", &["lidar", "laser", "point cloud"]),
    ("camera", &["camera", "vision", "image", "rgb"]),
    ("imu", &["imu", "inertial"]),
    ("force", &["force", "torque"]),
    ("trajectory", &["trajectory", "trajectories", "motion"]),
];

/// Padding used when the description matches fewer than five domain tags.
const GENERIC_TAGS: &[&str] = &["robotics", "dataset", "sensor-data", "automation", "research"];

/// Keyword → trajectory type, checked in order.
const TRAJECTORY_RULES: &[(&[&str], &str, f64)] = &[
    (&["pick-and-place", "pick and place"], "Pick and Place", 0.94),
    (&["navigat", "autonomous"], "Navigation", 0.91),
    (&["manipulat", "cutting", "stirring"], "Complex Manipulation", 0.89),
    (&["monitor", "inspection"], "Monitoring", 0.87),
];

/// Picks content tags from a deterministic candidate pool.
///
/// The pool depends only on the dataset; which five are returned, and in
/// what order, is random.
pub struct ContentTagger {
    rng: Mutex<StdRng>,
}

impl ContentTagger {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng: Mutex::new(rng),
        }
    }

    pub fn tag(&self, dataset: &Dataset) -> ContentAnalysis {
        let mut pool = candidate_pool(dataset);
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        pool.shuffle(&mut *rng);
        pool.truncate(TAGS_PER_DATASET);

        ContentAnalysis {
            content_tags: pool,
            trajectory_classification: Some(classify_trajectory(dataset)),
        }
    }
}

fn searchable_text(dataset: &Dataset) -> String {
    let info = &dataset.info;
    format!(
        "{} {} {} {}",
        info.title, info.description, info.robot_model, info.sensors
    )
    .to_lowercase()
}

/// Matching domain tags in vocabulary order, padded with generic tags up to
/// five entries. Deterministic for a given dataset.
pub fn candidate_pool(dataset: &Dataset) -> Vec<String> {
    let text = searchable_text(dataset);
    let mut pool: Vec<String> = TAG_VOCABULARY
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(tag, _)| tag.to_string())
        .collect();

    for generic in GENERIC_TAGS {
        if pool.len() >= TAGS_PER_DATASET {
            break;
        }
        if !pool.iter().any(|t| t == generic) {
            pool.push(generic.to_string());
        }
    }
    pool
}

pub fn classify_trajectory(dataset: &Dataset) -> TrajectoryClassification {
    let text = searchable_text(dataset);
    TRAJECTORY_RULES
        .iter()
        .find(|(keywords, _, _)| keywords.iter().any(|k| text.contains(k)))
        .map(|(_, kind, confidence)| TrajectoryClassification {
            kind: kind.to_string(),
            confidence: *confidence,
        })
        .unwrap_or_else(|| TrajectoryClassification {
            kind: "General Motion".to_string(),
            confidence: 0.5,
        })
}
