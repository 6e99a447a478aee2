pub mod bucket;
pub mod classify;

pub use classify::{classify, Classification, Thresholds};
