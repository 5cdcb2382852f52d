use snafu::Snafu;

/// 牌桌启动阶段的致命错误；会话中途的连接错误不在这里，而是让会话进入 Broken
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("could not listen on port {port}: {source}"))]
    Bind { port: u16, source: std::io::Error },

    #[snafu(display("failed to accept player {player}: {source}"))]
    Accept { player: usize, source: std::io::Error },

    #[snafu(display("a table needs at least one player"))]
    NoPlayers,

    #[snafu(display("the table only has {capacity} seats"))]
    TableFull { capacity: usize },

    #[snafu(display("only {seated} of {capacity} seats are taken"))]
    TableIncomplete { seated: usize, capacity: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
