// File: src/platforms/mod.rs

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

pub mod discord;
pub mod roblox;
