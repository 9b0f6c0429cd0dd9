//! v1 API Data Transfer Objects.
//!
//! These types define the wire format for the v1 REST API. They are separate
//! from the domain models in `src/models/` and handle the camelCase wire
//! naming plus conversion from domain results.

pub mod consignees;
pub mod documents;
pub mod recovery;
pub mod translations;

pub use consignees::*;
pub use documents::*;
pub use recovery::*;
pub use translations::*;
