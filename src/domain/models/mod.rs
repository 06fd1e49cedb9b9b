mod features;
mod policy;

pub use features::*;
pub use policy::*;
