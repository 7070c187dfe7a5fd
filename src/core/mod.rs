pub mod proxy;
pub mod translation;
