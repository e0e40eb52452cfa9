pub mod error;
pub mod wg;
