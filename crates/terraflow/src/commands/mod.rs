pub mod deploy;
pub mod render;
pub mod terraform;
