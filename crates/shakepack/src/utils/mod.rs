pub mod build_scoping;
pub mod normalize_options;
