// Domain models shared by the detection core and the control layer

pub mod exercise;
pub mod session;
pub mod skeleton;

pub use exercise::*;
pub use session::*;
pub use skeleton::*;
