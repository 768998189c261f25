mod identity;
mod pagination;
mod source;

pub use identity::*;
pub use pagination::*;
pub use source::*;
