pub mod config;
pub mod error;
pub mod layers;
pub mod math;
pub mod tensor;
pub mod util;
