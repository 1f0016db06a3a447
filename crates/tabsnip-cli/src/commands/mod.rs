pub mod crop;
pub mod session;
pub mod slot;
pub mod utils;
