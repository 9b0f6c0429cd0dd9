mod consignee;
mod extraction;
mod translation;

pub use consignee::{generate_iin, generate_phone, ConsigneeService};
pub use extraction::ExtractionService;
pub use translation::TranslationService;
