pub use rayon::iter::{IntoParallelIterator, IntoParallelRefIterator, ParallelIterator};
