pub mod artifact;
pub mod matrix;
pub mod serving;
pub mod similarity;
pub mod trainer;
