pub mod dispatcher;
pub mod message;

pub use dispatcher::ReportDispatcher;
pub use message::{Attachment, EmailReport};
