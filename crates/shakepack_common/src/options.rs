pub mod dynamic_requires;
pub mod normalized_serializer_options;
pub mod output_mode;
pub mod serializer_options;
pub mod transform_options;
