pub mod diagnostics;
pub mod module_name;
pub mod strings;

pub use diagnostics::*;
pub use module_name::*;
pub use strings::*;
