pub mod campaign;
pub mod contribution;
pub mod money;
pub mod ports;
pub mod recipient;
