use crate::constants::{ROBOT_MODEL_ALIASES, SENSOR_RULES};
use crate::domain::{DetectionResult, FileRecord};

/// Derives the robot model and sensor list from a description and file names.
///
/// Pure: the same inputs always give the same output. The robot model is the
/// first alias group found in the description; sensors are collected from the
/// description first, then from each file name in order, without duplicates.
pub fn detect(description: &str, files: &[FileRecord]) -> DetectionResult {
    let description = description.to_lowercase();

    let robot_model = ROBOT_MODEL_ALIASES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| description.contains(k)))
        .map(|(_, model)| model.to_string())
        .unwrap_or_default();

    let mut sensors: Vec<&'static str> = SENSOR_RULES
        .iter()
        .filter(|rule| rule.description_keywords.iter().any(|k| description.contains(k)))
        .map(|rule| rule.label)
        .collect();

    for file in files {
        let name = file.name.to_lowercase();
        for rule in SENSOR_RULES {
            let hit = rule.file_keywords.iter().any(|k| name.contains(k))
                || rule
                    .file_extensions
                    .iter()
                    .any(|ext| name.ends_with(&format!(".{ext}")));
            if hit && !sensors.contains(&rule.label) {
                sensors.push(rule.label);
            }
        }
    }

    DetectionResult {
        robot_model,
        sensors: sensors.join(", "),
    }
}
