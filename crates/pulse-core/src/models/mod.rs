pub mod record;
pub mod shape;
pub mod stub;
pub mod summary;

pub use record::*;
pub use shape::*;
pub use stub::*;
pub use summary::*;
