pub mod attempt;
pub mod fact;

pub use attempt::AttemptRecord;
pub use fact::{FactState, Mastery};
