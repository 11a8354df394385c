pub mod async_type;
pub mod context_params;
pub mod dependency;
pub mod export_names;
pub mod module_id;
pub mod output_artifact;
pub mod source_location;
