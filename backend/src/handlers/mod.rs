//! HTTP handlers for the Pharma QC Records API

pub mod accession;
pub mod audit;
pub mod body;
pub mod coa;
pub mod health;
pub mod material;
pub mod reporting;
pub mod result;
pub mod sample;
pub mod specification;

pub use accession::*;
pub use audit::*;
pub use body::OptionalJson;
pub use coa::*;
pub use health::*;
pub use material::*;
pub use reporting::*;
pub use result::*;
pub use sample::*;
pub use specification::*;
