mod backend;
mod error;
mod message;
mod provider;
mod session;

pub use backend::*;
pub use error::*;
pub use message::*;
pub use provider::*;
pub use session::*;
