mod api;
mod backend;
mod error;
mod message;
mod role;
mod slash_commands;
mod transport;
mod turn;

pub use api::*;
pub use backend::*;
pub use error::*;
pub use message::*;
pub use role::*;
pub use slash_commands::*;
pub use transport::*;
pub use turn::*;
