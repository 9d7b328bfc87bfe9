pub mod grader;
pub mod sm2;

pub use grader::grade_attempt;
pub use sm2::{Sm2Result, calculate_sm2};
