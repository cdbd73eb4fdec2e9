pub mod dispatch;
pub mod eval;
pub mod sign_off;

pub use dispatch::dispatch;
