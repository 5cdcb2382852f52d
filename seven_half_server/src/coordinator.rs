use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::future::join_all;
use snafu::{ensure, ResultExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use seven_half_core::{Election, PlayerId};

use crate::error::{
    AcceptSnafu, BindSnafu, NoPlayersSnafu, Result, TableFullSnafu, TableIncompleteSnafu,
};
use crate::session::{PlayerSession, SessionSummary};
use crate::table::Table;

/// 打开牌桌的监听端口，失败则整个牌桌无法启动
pub async fn bind(port: u16) -> Result<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    TcpListener::bind(addr).await.context(BindSnafu { port })
}

/// 一张牌桌打完之后的汇总
#[derive(Debug, Clone, PartialEq)]
pub struct TableReport {
    pub rounds: u32,
    /// 是否因为有玩家连接出错而没有重开
    pub vetoed_by_broken: bool,
    pub players: Vec<SessionSummary>,
}

/// 回合协调者
///
/// 每个连接对应一个会话任务；协调者自己在调用 `run_rounds` 的任务里，
/// 依次推进开始屏障、等待出牌结束、结算和重开屏障。
pub struct Coordinator {
    table: Arc<Table>,
    sessions: Vec<JoinHandle<SessionSummary>>,
}

impl Coordinator {
    pub fn new(players: usize) -> Coordinator {
        Coordinator {
            table: Arc::new(Table::new(players)),
            sessions: Vec::with_capacity(players),
        }
    }

    /// 依次接受恰好 `players` 个连接，每个连接立即启动自己的会话
    pub async fn accept_sessions(listener: &TcpListener, players: usize) -> Result<Coordinator> {
        ensure!(players > 0, NoPlayersSnafu);
        let mut coordinator = Coordinator::new(players);
        for player in 1..=players {
            let (stream, addr) = listener.accept().await.context(AcceptSnafu { player })?;
            // 每次只发一两个字节，关掉 Nagle 避免小包被延迟
            if let Err(e) = stream.set_nodelay(true) {
                warn!(player, "设置 TCP_NODELAY 失败: {}", e);
            }
            info!(player, %addr, "玩家已加入");
            coordinator.seat(stream)?;
        }
        Ok(coordinator)
    }

    /// 为一个连接分配座位并启动会话任务
    pub fn seat<S>(&mut self, stream: S) -> Result<PlayerId>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let capacity = self.table.capacity();
        ensure!(self.sessions.len() < capacity, TableFullSnafu { capacity });

        let id = self.sessions.len() + 1;
        let session = PlayerSession::new(id, stream, self.table.clone());
        self.sessions.push(tokio::spawn(session.run()));
        Ok(id)
    }

    /// 一局接一局地打，直到重开屏障裁决为不再继续，然后等所有会话关闭连接
    pub async fn run_rounds(self) -> Result<TableReport> {
        let capacity = self.table.capacity();
        // 空座位表上每个屏障都立即成立，循环永远不会挂起
        ensure!(capacity > 0, NoPlayersSnafu);
        let seated = self.sessions.len();
        ensure!(seated == capacity, TableIncompleteSnafu { seated, capacity });

        let rounds = loop {
            // 1. 开始屏障：上一局裁决时开始选举已重置为 Undecided
            info!("等待所有玩家准备…");
            let round = self.table.start_barrier().await;
            info!(round, "第 {} 局开始", round);

            // 2. 各会话独立出牌
            self.table.wait_round_over().await;
            info!(round, "所有玩家都已停牌");

            // 3. 结算
            let outcomes = self.table.publish_outcomes();
            info!(round, ?outcomes, "结果已公布");

            // 4. 重开屏障
            if self.table.retry_barrier().await != Election::Yes {
                break round;
            }
            info!("所有玩家同意再来一局");
        };

        let vetoed_by_broken = self.table.snapshot().any_broken;
        if vetoed_by_broken {
            warn!("有玩家连接出错，取消重开");
        }

        // 5. 等所有会话发完 FINISH 并关闭连接
        let mut players = Vec::with_capacity(seated);
        for joined in join_all(self.sessions).await {
            match joined {
                Ok(summary) => players.push(summary),
                Err(e) => error!("会话任务异常退出: {}", e),
            }
        }
        info!(rounds, "游戏结束");

        Ok(TableReport { rounds, vetoed_by_broken, players })
    }
}
