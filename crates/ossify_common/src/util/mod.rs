pub mod instance_queue;
pub mod intern;
pub mod progress_logger;
