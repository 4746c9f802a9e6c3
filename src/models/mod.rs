pub mod backup;
pub mod state;

pub use backup::*;
pub use state::*;
