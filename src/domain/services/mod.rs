mod controller;
mod gateway;
mod speech;
mod throttle;
mod transcript;

pub use controller::*;
pub use gateway::*;
pub use speech::*;
pub use throttle::*;
pub use transcript::*;
