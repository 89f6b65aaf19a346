pub mod policy;
pub mod resilient_service;

pub use policy::ErrorPolicy;
pub use resilient_service::ResilientService;
