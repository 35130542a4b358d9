pub mod doi;
pub mod extract;

pub use doi::Doi;
pub use extract::extract_doi;
