pub mod consignees;
pub mod documents;
pub(crate) mod health;
pub mod recovery;
pub mod translations;

pub use health::health_check;
