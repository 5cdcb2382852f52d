//! # 七点半核心逻辑库
//!
//! 这个 `core` crate 包含七点半的牌、牌堆、手牌、结算逻辑，
//! 以及客户端与服务器之间的线上协议。
//! 它与具体的网络服务器、客户端界面解耦，两端都复用它。

mod card;
mod logic;
mod message;
mod state;

pub use card::*;

pub use logic::*;

pub use message::*;

pub use state::*;
