/// Shared identifiers and lookup tables used across the pipeline stages.

/// Prefix of every synthetic DOI handed out by the local publisher.
pub const DOI_PREFIX: &str = "10.1000";

/// Author written into locally synthesized citations.
pub const CITATION_AUTHOR: &str = "RoboData User";

/// Owner recorded on catalog entries produced by this pipeline.
pub const DEFAULT_OWNER: &str = "User";

/// Name given to pasted free-text data when it is turned into a file record.
pub const TEXT_DATA_FILE_NAME: &str = "text_data.txt";

/// Descriptions shorter than this are not worth running detection on.
pub const AUTOFILL_MIN_DESCRIPTION_LEN: usize = 20;

pub const DEFAULT_CONFIG_PATH: &str = "robodata.toml";
pub const DEFAULT_CATALOG_PATH: &str = "data/catalog.ndjson";
pub const DEFAULT_INFERENCE_MODEL: &str = "default";
pub const DEFAULT_INFERENCE_TIMEOUT_SECS: u64 = 30;

/// Robot-model aliases in match precedence order: the first entry whose
/// keywords appear in the description wins.
pub const ROBOT_MODEL_ALIASES: &[(&[&str], &str)] = &[
    (&["ur5", "universal robots"], "Universal Robots UR5"),
    (&["kuka", "kr6"], "KUKA KR6 R700"),
    (&["franka", "panda"], "Franka Panda"),
    (&["abb", "irb"], "ABB IRB 120"),
    (&["warehouse", "industrial"], "Industrial Robot Arm"),
];

/// A sensor and the keywords that reveal it in free text or in file names.
pub struct SensorRule {
    pub label: &'static str,
    pub description_keywords: &'static [&'static str],
    pub file_keywords: &'static [&'static str],
    pub file_extensions: &'static [&'static str],
}

pub const SENSOR_RULES: &[SensorRule] = &[
    SensorRule {
        label: "Camera",
        description_keywords: &["camera", "vision", "image"],
        file_keywords: &["camera", "image"],
        file_extensions: &["png", "jpg"],
    },
    SensorRule {
        label: "LiDAR",
        description_keywords: &["lidar", "laser"],
        file_keywords: &["lidar", "laser"],
        file_extensions: &[],
    },
    SensorRule {
        label: "IMU",
        description_keywords: &["imu", "inertial"],
        file_keywords: &["imu", "gyro"],
        file_extensions: &[],
    },
    SensorRule {
        label: "Force/Torque",
        description_keywords: &["force", "torque"],
        file_keywords: &["force", "torque"],
        file_extensions: &[],
    },
    SensorRule {
        label: "Joint Encoders",
        description_keywords: &["joint", "encoder"],
        file_keywords: &["joint", "encoder"],
        file_extensions: &[],
    },
];

/// Target formats each data family is converted to during ingestion.
pub const STANDARDIZED_FORMATS: &[(&str, &str)] = &[
    ("images", "PNG"),
    ("sensorData", "Parquet"),
    ("annotations", "JSON"),
    ("logs", "TXT"),
    ("configs", "JSON"),
];

/// Best-effort MIME type for a lower-cased file extension.
pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext {
        "csv" => "text/csv",
        "txt" | "log" => "text/plain",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}
