//! # 七点半牌桌服务器
//!
//! 接受固定人数的玩家连接，为每个连接启动一个会话任务，
//! 由协调者推进"开始 → 出牌 → 结算 → 是否重开"的回合循环。

pub mod cli;
mod coordinator;
mod error;
mod session;
mod table;

pub use coordinator::{bind, Coordinator, TableReport};
pub use error::{Error, Result};
pub use session::{PlayerSession, SessionSummary};
pub use table::{Seat, Table, TableState};
