pub mod analysis;
pub mod inference;
pub mod system;

pub use analysis::*;
pub use inference::*;
pub use system::*;
