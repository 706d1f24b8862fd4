// Adapters layer: concrete implementations of the domain ports (storage, listings site, Telegram).

pub mod imoova;
pub mod storage;
pub mod telegram;
