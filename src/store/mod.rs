pub mod held;

pub use held::{HeldRecord, HeldStore};
