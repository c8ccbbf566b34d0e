pub mod authorize;
pub mod copy;
pub mod poll;
pub mod version_check;

pub use authorize::authorize_with_recovery;
pub use copy::initiate_copy;
pub use poll::poll_to_completion;
pub use version_check::check_version;
