//! The AITBC chain node: process wiring, environment-driven
//! config, and the `RpcService` facade over storage, mempool, gossip,
//! chain sync, and the PoA proposer.

pub mod config;
pub mod health;
pub mod node;
pub mod rpc;

pub use config::Config;
pub use node::Node;
pub use rpc::RpcService;
