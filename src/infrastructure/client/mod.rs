pub mod http_transport;
pub mod narrator;
