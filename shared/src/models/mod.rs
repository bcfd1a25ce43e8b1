//! Domain models for the Pharma QC Records platform

mod coa;
mod material;
mod sample;
mod specification;
mod test_result;
mod user;

pub use coa::*;
pub use material::*;
pub use sample::*;
pub use specification::*;
pub use test_result::*;
pub use user::*;
