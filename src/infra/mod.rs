pub mod archive_adapter;
pub mod catalog_store_adapter;
pub mod completion_client;
pub mod inference_gateway;
pub mod json_extract;
pub mod prompts;
pub mod status_reporter;
