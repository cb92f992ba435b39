pub mod lsm6dso;
pub mod serial_console;

pub use lsm6dso::{Identity, Lsm6dso, RawAxes, Vec3};
pub use serial_console::{Console, Milli};
