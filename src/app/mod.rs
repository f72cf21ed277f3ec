pub mod ports;
pub mod pipeline_use_case;
pub mod search_use_case;
