pub mod arena_vec_ext;
pub mod binding_pattern_ext;
pub mod expression_ext;
pub mod statement_ext;
