use chrono::{Duration, Utc};

use crate::domain::{
    CompletenessData, ContentAnalysis, Dataset, DatasetInfo, TimestampData,
    TrajectoryClassification, ValidationResult,
};

struct Sample {
    id: &'static str,
    title: &'static str,
    robot_model: &'static str,
    sensors: &'static str,
    description: &'static str,
    price: f64,
    score: (u32, u32),
    tags: &'static [&'static str],
    trajectory: (&'static str, f64),
    doi: &'static str,
    citation: &'static str,
    views: u64,
    downloads: u64,
}

const SAMPLES: &[Sample] = &[
    Sample {
        id: "sample1",
        title: "Warehouse Pick-and-Place Operations",
        robot_model: "Universal Robots UR5",
        sensors: "camera, force-torque, joint-encoders",
        description: "Dataset containing pick-and-place operations in a warehouse environment with various objects.",
        price: 15.0,
        score: (92, 15),
        tags: &["warehouse", "pick-and-place", "industrial", "gripper", "conveyor"],
        trajectory: ("Pick and Place", 0.94),
        doi: "10.1000/182",
        citation: "@dataset{warehouse_pick_place_2024, title={Warehouse Pick-and-Place Operations}, author={RoboData Team}, year={2024}, doi={10.1000/182}}",
        views: 320,
        downloads: 80,
    },
    Sample {
        id: "sample2",
        title: "Kitchen Manipulation Tasks",
        robot_model: "Franka Panda",
        sensors: "camera, imu, joint-encoders",
        description: "Robotic manipulation tasks in a kitchen environment including cutting, stirring, and serving.",
        price: 12.5,
        score: (87, 14),
        tags: &["kitchen", "manipulation", "cutting", "stirring", "food"],
        trajectory: ("Complex Manipulation", 0.89),
        doi: "10.1000/183",
        citation: "@dataset{kitchen_manipulation_2024, title={Kitchen Manipulation Tasks}, author={RoboData Team}, year={2024}, doi={10.1000/183}}",
        views: 210,
        downloads: 60,
    },
    Sample {
        id: "sample3",
        title: "Outdoor Autonomous Vehicle Navigation",
        robot_model: "Custom Autonomous Vehicle",
        sensors: "lidar, camera, gps, imu",
        description: "Navigation dataset for autonomous vehicles in urban outdoor environments.",
        price: 20.0,
        score: (90, 16),
        tags: &["autonomous", "vehicle", "outdoor", "navigation", "lidar", "camera"],
        trajectory: ("Navigation", 0.91),
        doi: "10.1000/184",
        citation: "@dataset{autonomous_vehicle_nav_2024, title={Outdoor Autonomous Vehicle Navigation}, author={OpenRobotics}, year={2024}, doi={10.1000/184}}",
        views: 410,
        downloads: 120,
    },
    Sample {
        id: "sample4",
        title: "Factory Assembly Line Monitoring",
        robot_model: "ABB IRB 120",
        sensors: "camera, force, temperature",
        description: "Dataset for monitoring and analyzing factory assembly line operations.",
        price: 18.75,
        score: (85, 13),
        tags: &["factory", "assembly", "monitoring", "temperature", "force"],
        trajectory: ("Monitoring", 0.87),
        doi: "10.1000/185",
        citation: "@dataset{factory_assembly_monitor_2024, title={Factory Assembly Line Monitoring}, author={IndustrialAI}, year={2024}, doi={10.1000/185}}",
        views: 300,
        downloads: 60,
    },
];

/// The bundled demo datasets, most recent first, one day apart.
pub fn sample_datasets() -> Vec<Dataset> {
    let now = Utc::now();
    SAMPLES
        .iter()
        .enumerate()
        .map(|(age_days, sample)| Dataset {
            id: sample.id.to_string(),
            info: DatasetInfo {
                title: sample.title.to_string(),
                robot_model: sample.robot_model.to_string(),
                sensors: sample.sensors.to_string(),
                description: sample.description.to_string(),
                price: sample.price,
            },
            timestamp: now - Duration::days(age_days as i64),
            standardized_data: None,
            quality_report: Some(ValidationResult {
                overall_score: sample.score.0,
                passed_checks: sample.score.1,
                total_checks: 16,
                scenario: String::new(),
                checks: Vec::new(),
                completeness_data: CompletenessData::default(),
                timestamp_data: TimestampData::default(),
            }),
            ai_analysis: Some(ContentAnalysis {
                content_tags: sample.tags.iter().map(|t| t.to_string()).collect(),
                trajectory_classification: Some(TrajectoryClassification {
                    kind: sample.trajectory.0.to_string(),
                    confidence: sample.trajectory.1,
                }),
            }),
            doi: Some(sample.doi.to_string()),
            citation: Some(sample.citation.to_string()),
            published: true,
            views: sample.views,
            downloads: sample.downloads,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_published_samples_newest_first() {
        let samples = sample_datasets();
        assert_eq!(samples.len(), 4);
        assert!(samples.iter().all(|d| d.published));
        assert!(samples.windows(2).all(|w| w[0].timestamp > w[1].timestamp));
        assert_eq!(samples[0].id, "sample1");
    }

    #[test]
    fn sample_reports_are_well_formed() {
        for dataset in sample_datasets() {
            let report = dataset.quality_report.unwrap();
            assert!(report.overall_score <= 100);
            assert!(report.passed_checks <= report.total_checks);
        }
    }
}
