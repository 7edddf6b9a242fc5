pub mod buffer3;
pub mod float_ext;
pub mod log_setup;

pub use buffer3::Buffer3;
pub use float_ext::FloatExt;
pub use log_setup::setup_logging;
