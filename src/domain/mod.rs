pub mod access;
pub mod info;
pub mod root;
pub mod value;

pub use access::*;
pub use info::*;
pub use root::*;
pub use value::*;
