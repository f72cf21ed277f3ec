use serde_json::json;

use crate::domain::{Dataset, FileRecord};

const JSON_ONLY: &str = "Respond with a single JSON object and nothing else.";

fn file_summary(files: &[FileRecord]) -> serde_json::Value {
    files
        .iter()
        .map(|f| json!({"name": f.name, "size": f.size, "type": f.mime_type}))
        .collect()
}

fn dataset_summary(dataset: &Dataset) -> serde_json::Value {
    json!({
        "id": dataset.id,
        "title": dataset.info.title,
        "robotModel": dataset.info.robot_model,
        "sensors": dataset.info.sensors,
        "description": dataset.info.description,
        "fileTypes": dataset.standardized_data.as_ref().map(|d| &d.file_types),
        "totalFiles": dataset.files().len(),
    })
}

pub fn detect_prompt(description: &str, files: &[FileRecord]) -> String {
    format!(
        "Identify the robot model and sensors used in this robotics dataset.\n\
         Description: {description}\n\
         Files: {files}\n\
         {JSON_ONLY} Shape: {{\"robotModel\": string, \"sensors\": string (comma-separated)}}",
        files = file_summary(files),
    )
}

pub fn validate_prompt(dataset: &Dataset) -> String {
    format!(
        "Assess the quality of this robotics dataset: file completeness, annotation integrity, \
         sensor data quality and consistency.\n\
         Dataset: {dataset}\n\
         {JSON_ONLY} Shape: {{\"overallScore\": 0-100, \"passedChecks\": int, \"totalChecks\": int, \
         \"checks\": [{{\"name\": string, \"passed\": bool, \"reason\": string, \"metric\": string}}], \
         \"completenessData\": {{\"complete\": int, \"missing\": int, \"corrupted\": int}}}}",
        dataset = dataset_summary(dataset),
    )
}

pub fn tag_prompt(dataset: &Dataset) -> String {
    format!(
        "Generate five short content tags and a trajectory classification for this robotics dataset.\n\
         Dataset: {dataset}\n\
         {JSON_ONLY} Shape: {{\"contentTags\": [string], \
         \"trajectoryClassification\": {{\"type\": string, \"confidence\": 0-1}}}}",
        dataset = dataset_summary(dataset),
    )
}

pub fn publish_prompt(dataset: &Dataset) -> String {
    format!(
        "Create a DOI and a BibTeX @dataset citation for this robotics dataset.\n\
         Dataset: {dataset}\n\
         {JSON_ONLY} Shape: {{\"doi\": string, \"citation\": string}}",
        dataset = dataset_summary(dataset),
    )
}
