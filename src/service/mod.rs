pub mod eligibility;
pub mod error;
pub mod swapper;
pub mod token_registry;
pub mod types;
pub mod utils;


pub use eligibility::EligibilityFilter;
pub use error::ServiceError;
pub use swapper::TokenSwapper;
pub use token_registry::TokenRegistry;
pub use types::*;

pub(crate) type ServiceResult<T> = std::result::Result<T, ServiceError>;
