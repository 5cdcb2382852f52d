//! 牌桌共享状态与回合屏障
//!
//! 所有跨任务读写的字段都放在一把 `parking_lot::Mutex` 后面。每次修改后通过
//! `Notify::notify_waiters` 唤醒所有等待者，等待者醒来后重新检查自己的条件，
//! 条件不满足就继续挂起，不做定时轮询。

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{debug, warn};

use seven_half_core::{
    classify_outcome, resolve_retry, Election, FinalScore, Outcome, PlayerId,
};

/// 每名玩家在牌桌上的公开状态，由会话写入、协调者读取（结果则反过来）
#[derive(Debug, Clone, Default)]
pub struct Seat {
    /// 准备开始；协调者放行后改回 `No`，表示这次准备已被消费
    pub ready: Election,
    pub round_over: bool,
    pub score: f32,
    pub broken: bool,
    pub retry: Election,
    pub outcome: Option<Outcome>,
}

/// 整张牌桌的状态
#[derive(Debug, Clone, Default)]
pub struct TableState {
    /// 已开始的局数
    pub round: u32,
    pub start: Election,
    pub retry: Election,
    /// 一旦置位永不清除，之后的所有重开都被否决
    pub any_broken: bool,
    pub seats: Vec<Seat>,
}

impl TableState {
    fn seat_mut(&mut self, id: PlayerId) -> &mut Seat {
        &mut self.seats[id - 1]
    }

    pub fn seat(&self, id: PlayerId) -> &Seat {
        &self.seats[id - 1]
    }

    pub fn all_ready(&self) -> bool {
        self.seats.iter().all(|s| s.ready == Election::Yes)
    }

    pub fn all_round_over(&self) -> bool {
        self.seats.iter().all(|s| s.round_over)
    }

    pub fn final_scores(&self) -> Vec<FinalScore> {
        self.seats.iter().map(|s| FinalScore::new(s.score, s.broken)).collect()
    }

    pub fn retry_votes(&self) -> Vec<Election> {
        self.seats.iter().map(|s| s.retry).collect()
    }
}

pub struct Table {
    state: Mutex<TableState>,
    changed: Notify,
}

impl Table {
    pub fn new(players: usize) -> Table {
        Table {
            state: Mutex::new(TableState {
                seats: vec![Seat::default(); players],
                ..TableState::default()
            }),
            changed: Notify::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.state.lock().seats.len()
    }

    /// 读取当前状态的一份拷贝
    pub fn snapshot(&self) -> TableState {
        self.state.lock().clone()
    }

    /// 修改状态并唤醒所有等待者
    fn update<R>(&self, f: impl FnOnce(&mut TableState) -> R) -> R {
        let result = {
            let mut state = self.state.lock();
            f(&mut *state)
        };
        self.changed.notify_waiters();
        result
    }

    /// 挂起直到 `ready` 返回 `Some`
    ///
    /// 先登记 `Notified` 再检查条件，所以检查之后、挂起之前发生的修改不会丢失。
    async fn wait_for<R>(&self, mut ready: impl FnMut(&TableState) -> Option<R>) -> R {
        loop {
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let result = {
                let state = self.state.lock();
                ready(&*state)
            };
            if let Some(result) = result {
                return result;
            }
            notified.await;
        }
    }

    // --- 会话一侧 ---

    /// 新一局开始前重置座位，并立即表示准备好了
    pub fn seat_ready(&self, id: PlayerId) {
        self.update(|s| {
            let seat = s.seat_mut(id);
            seat.round_over = false;
            seat.score = 0.0;
            seat.retry = Election::Undecided;
            seat.outcome = None;
            seat.ready = Election::Yes;
        });
    }

    /// 等待开始屏障放行，返回本局的局号
    pub async fn wait_start(&self) -> u32 {
        self.wait_for(|s| (s.start == Election::Yes).then_some(s.round)).await
    }

    pub fn finish_round(&self, id: PlayerId, score: f32) {
        self.update(|s| {
            let seat = s.seat_mut(id);
            seat.score = score;
            seat.round_over = true;
        });
    }

    pub async fn wait_outcome(&self, id: PlayerId) -> Outcome {
        self.wait_for(|s| s.seat(id).outcome).await
    }

    pub fn cast_retry(&self, id: PlayerId, vote: Election) {
        self.update(|s| s.seat_mut(id).retry = vote);
    }

    pub async fn wait_retry(&self) -> Election {
        self.wait_for(|s| s.retry.is_decided().then_some(s.retry)).await
    }

    /// 会话的连接出错：该座位永久出错，整桌的重开被否决
    pub fn mark_broken(&self, id: PlayerId) {
        self.update(|s| {
            if !s.any_broken {
                warn!(player = id, "有玩家连接出错，本桌不会再重开");
            }
            s.seat_mut(id).broken = true;
            s.any_broken = true;
        });
    }

    // --- 协调者一侧 ---

    /// 开始屏障：等所有座位都准备好，再一起放行
    pub async fn start_barrier(&self) -> u32 {
        self.wait_for(|s| s.all_ready().then_some(())).await;
        self.update(|s| {
            for seat in s.seats.iter_mut() {
                seat.ready = Election::No;
            }
            s.round += 1;
            s.retry = Election::Undecided;
            s.start = Election::Yes;
            s.round
        })
    }

    pub async fn wait_round_over(&self) {
        self.wait_for(|s| s.all_round_over().then_some(())).await
    }

    /// 结算并把结果写给每个座位，这是 `wait_outcome` 唯一的生产者
    pub fn publish_outcomes(&self) -> Vec<Outcome> {
        self.update(|s| {
            let outcomes = classify_outcome(&s.final_scores());
            for (seat, outcome) in s.seats.iter_mut().zip(&outcomes) {
                seat.outcome = Some(*outcome);
            }
            debug!(round = s.round, ?outcomes, "本局结算完成");
            outcomes
        })
    }

    /// 重开屏障：等所有人表态（或有人出错），裁决并广播
    ///
    /// 裁决与把开始选举重置为 `Undecided` 在同一次修改里完成，
    /// 准备下一局的会话不会看到上一局遗留的放行信号。
    pub async fn retry_barrier(&self) -> Election {
        let retry = self
            .wait_for(|s| {
                let retry = resolve_retry(&s.retry_votes(), s.any_broken);
                retry.is_decided().then_some(retry)
            })
            .await;
        self.update(|s| {
            s.start = Election::Undecided;
            s.retry = retry;
        });
        retry
    }
}
