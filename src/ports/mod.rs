//! Port traits at the boundary between the domain and the outside world.

pub mod config_port;
pub mod report_port;
pub mod table_port;
