//! Business logic services for the Pharma QC Records platform

pub mod audit;
pub mod coa;
pub mod material;
pub mod reporting;
pub mod result;
pub mod sample;
pub mod specification;

pub use audit::AuditService;
pub use coa::CoaService;
pub use material::MaterialService;
pub use reporting::ReportingService;
pub use result::ResultService;
pub use sample::SampleService;
pub use specification::SpecificationService;

/// The user on whose behalf an operation runs.
///
/// Recorded verbatim as sampler, tester and audit identity; never validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
}

impl Actor {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}
