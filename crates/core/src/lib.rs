pub mod config;
pub mod domain;
pub mod errors;
pub mod validation;

pub use domain::product::{CreateProductInput, Product, ProductId, UpdateProductInput};
pub use errors::{ApplicationError, InterfaceError};
pub use validation::{ProductCandidate, ValidationErrors, Violation, ViolationRule};
