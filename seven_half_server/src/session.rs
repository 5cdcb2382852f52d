use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use seven_half_core::{
    read_reply, write_card, write_text, Card, Deck, Election, Hand, Outcome, PlayerId, Reply,
    RoundSignal, SessionPhase, WireError,
};

use crate::table::Table;

/// 会话结束时交给协调者的摘要
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSummary {
    pub id: PlayerId,
    pub rounds: u32,
    pub broken: bool,
}

/// 单个玩家的服务端会话
///
/// 持有该玩家的连接、私有牌堆和本局手牌，在自己的任务里跑协议状态机。
/// 除了牌桌上的几个屏障，它和其他会话互不阻塞。
pub struct PlayerSession<S> {
    id: PlayerId,
    stream: S,
    table: Arc<Table>,
    deck: Deck,
    hand: Hand,
    phase: SessionPhase,
    rounds: u32,
}

impl<S> PlayerSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(id: PlayerId, stream: S, table: Arc<Table>) -> Self {
        PlayerSession {
            id,
            stream,
            table,
            deck: Deck::new(),
            hand: Hand::new(),
            phase: SessionPhase::Connected,
            rounds: 0,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_broken(&self) -> bool {
        self.phase == SessionPhase::Broken
    }

    /// 驱动这名玩家的完整生命周期，直到牌桌决定不再重开
    pub async fn run(mut self) -> SessionSummary {
        loop {
            self.reset_round();
            self.await_start().await;
            self.play_round().await;
            self.await_result().await;
            self.ask_retry().await;
            if self.await_retry_outcome().await != Election::Yes {
                break;
            }
        }
        self.close().await;
        SessionSummary { id: self.id, rounds: self.rounds, broken: self.is_broken() }
    }

    /// 新牌堆、清零分数，然后立即表示准备好了
    fn reset_round(&mut self) {
        self.deck = Deck::new();
        self.hand.clear();
        self.enter(SessionPhase::AwaitingStart);
        self.table.seat_ready(self.id);
    }

    async fn await_start(&mut self) {
        let round = self.table.wait_start().await;
        self.rounds += 1;
        debug!(player = self.id, round, "开始发牌");
        self.enter(SessionPhase::Dealing);
    }

    /// 从私有牌堆取一张牌，计入分数并发给玩家
    ///
    /// 牌堆取空时返回 `Ok(None)`；一局最多七八张牌就会结束，正常情况下不会发生。
    pub async fn deal_one_card(&mut self) -> Result<Option<Card>, WireError> {
        let Some(card) = self.deck.next() else {
            return Ok(None);
        };
        self.hand.push(card);
        write_card(&mut self.stream, card).await?;
        Ok(Some(card))
    }

    /// 不断发牌并询问是否还要，直到爆牌、达到 7.5 或玩家不要了
    ///
    /// 分数达到 7.5 时不再询问，直接结束。出错的会话跳过整个交换。
    pub async fn play_round(&mut self) {
        while !self.is_broken() {
            match self.deal_one_card().await {
                Ok(Some(card)) => {
                    debug!(player = self.id, %card, score = self.hand.score(), "发牌");
                }
                Ok(None) => break,
                Err(e) => {
                    self.fail(e, "向玩家发牌失败");
                    break;
                }
            }
            if self.hand.is_over() {
                break;
            }

            self.enter(SessionPhase::AwaitingMoreCardsDecision);
            match read_reply(&mut self.stream).await {
                Ok(Reply::Yes) => self.enter(SessionPhase::Dealing),
                Ok(Reply::No) => break,
                Err(e) => self.fail(e, "读取是否要牌失败"),
            }
        }
        info!(player = self.id, score = self.hand.score(), "本局结束");
        self.table.finish_round(self.id, self.hand.score());
        self.enter(SessionPhase::AwaitingResult);
    }

    /// 等待协调者结算出本会话的结果，再发给玩家
    pub async fn await_result(&mut self) -> Outcome {
        let outcome = self.table.wait_outcome(self.id).await;
        debug!(player = self.id, %outcome, "本局结果");
        if !self.is_broken() {
            if let Err(e) = write_text(&mut self.stream, outcome.as_str()).await {
                self.fail(e, "发送本局结果失败");
            }
        }
        self.enter(SessionPhase::AwaitingRetryDecision);
        outcome
    }

    /// 读取玩家是否再来一局，记为本座位的重开选票；出错的会话投 No
    pub async fn ask_retry(&mut self) -> Election {
        let vote = if self.is_broken() {
            Election::No
        } else {
            match read_reply(&mut self.stream).await {
                Ok(reply) => reply.into(),
                Err(e) => {
                    self.fail(e, "读取是否重开失败");
                    Election::No
                }
            }
        };
        debug!(player = self.id, ?vote, "重开投票");
        self.table.cast_retry(self.id, vote);
        self.enter(SessionPhase::AwaitingRetryOutcome);
        vote
    }

    /// 等待整桌的重开裁决，并告知玩家 RETRY 或 FINISH
    pub async fn await_retry_outcome(&mut self) -> Election {
        let retry = self.table.wait_retry().await;
        if !self.is_broken() {
            let signal = RoundSignal::from(retry);
            if let Err(e) = write_text(&mut self.stream, signal.as_str()).await {
                self.fail(e, "发送重开结果失败");
            }
        }
        retry
    }

    async fn close(&mut self) {
        // 对端可能已经断开，关闭失败无需处理
        let _ = self.stream.shutdown().await;
        self.enter(SessionPhase::Closed);
        info!(player = self.id, "离开牌桌");
    }

    /// 协议状态迁移；Broken 是终态
    fn enter(&mut self, phase: SessionPhase) {
        if self.is_broken() {
            return;
        }
        debug!(player = self.id, from = ?self.phase, to = ?phase, "状态迁移");
        self.phase = phase;
    }

    fn fail(&mut self, error: WireError, context: &str) {
        warn!(player = self.id, %error, "{}", context);
        self.phase = SessionPhase::Broken;
        self.table.mark_broken(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seven_half_core::{
        read_card, read_outcome, read_signal, write_reply, BUST_LIMIT, DECK_SIZE,
    };
    use tokio::io::DuplexStream;

    fn session(table: &Arc<Table>, id: PlayerId) -> (PlayerSession<DuplexStream>, DuplexStream) {
        let (server, client) = tokio::io::duplex(256);
        (PlayerSession::new(id, server, table.clone()), client)
    }

    #[tokio::test]
    async fn test_deal_one_card_adds_to_score() {
        let table = Arc::new(Table::new(1));
        let (mut session, mut client) = session(&table, 1);

        let dealt = session.deal_one_card().await.unwrap().unwrap();
        let received = read_card(&mut client).await.unwrap();
        assert_eq!(dealt, received);
        assert_eq!(session.hand.score(), dealt.value());
        assert_eq!(session.deck.remaining(), 39);
    }

    #[tokio::test]
    async fn test_new_round_gets_a_fresh_deck() {
        let table = Arc::new(Table::new(1));
        let (mut session, mut client) = session(&table, 1);

        for _ in 0..3 {
            session.deal_one_card().await.unwrap();
            read_card(&mut client).await.unwrap();
        }
        assert_eq!(session.deck.remaining(), DECK_SIZE - 3);
        assert!(session.hand.score() > 0.0);

        session.reset_round();
        assert_eq!(session.deck.remaining(), DECK_SIZE);
        assert_eq!(session.hand.score(), 0.0);
        assert!(session.hand.cards().is_empty());
        assert_eq!(session.phase(), SessionPhase::AwaitingStart);
        assert_eq!(table.snapshot().seats[0].ready, Election::Yes);
    }

    #[tokio::test]
    async fn test_play_round_stops_when_player_declines() {
        let table = Arc::new(Table::new(1));
        let (mut session, mut client) = session(&table, 1);

        let peer = tokio::spawn(async move {
            let card = read_card(&mut client).await.unwrap();
            if card.value() < BUST_LIMIT {
                write_reply(&mut client, Reply::No).await.unwrap();
            }
            card
        });
        session.play_round().await;

        let card = peer.await.unwrap();
        assert_eq!(session.hand.cards(), &[card]);
        assert_eq!(session.phase(), SessionPhase::AwaitingResult);
        let seat = table.snapshot().seats[0].clone();
        assert!(seat.round_over);
        assert_eq!(seat.score, card.value());
    }

    #[tokio::test]
    async fn test_play_round_never_asks_after_reaching_the_limit() {
        let table = Arc::new(Table::new(1));
        let (mut session, mut client) = session(&table, 1);

        // 一直要牌，直到服务器不再询问
        let peer = tokio::spawn(async move {
            let mut hand = Hand::new();
            loop {
                hand.push(read_card(&mut client).await.unwrap());
                if hand.is_over() {
                    return hand;
                }
                write_reply(&mut client, Reply::Yes).await.unwrap();
            }
        });
        session.play_round().await;

        let hand = peer.await.unwrap();
        assert!(hand.score() >= BUST_LIMIT);
        assert_eq!(session.hand, hand);
        assert!(!session.is_broken());
    }

    #[tokio::test]
    async fn test_protocol_violation_breaks_the_session() {
        let table = Arc::new(Table::new(1));
        let (mut session, mut client) = session(&table, 1);

        let peer = tokio::spawn(async move {
            let card = read_card(&mut client).await.unwrap();
            if card.value() < BUST_LIMIT {
                write_text(&mut client, "GIMME").await.unwrap();
            }
            client
        });
        session.play_round().await;
        let _client = peer.await.unwrap();

        // 第一张牌不可能达到 7.5，所以一定读到了非法回答
        assert!(session.is_broken());
        assert_eq!(session.phase(), SessionPhase::Broken);
        let state = table.snapshot();
        assert!(state.any_broken);
        assert!(state.seats[0].broken);
        assert!(state.seats[0].round_over);
    }

    #[tokio::test]
    async fn test_dropped_connection_breaks_and_votes_no() {
        let table = Arc::new(Table::new(1));
        let (mut session, client) = session(&table, 1);
        drop(client);

        session.play_round().await;
        assert!(session.is_broken());

        table.publish_outcomes();
        assert_eq!(session.await_result().await, Outcome::Lose);
        assert_eq!(session.ask_retry().await, Election::No);
        assert_eq!(table.retry_barrier().await, Election::No);
        assert_eq!(session.await_retry_outcome().await, Election::No);
        assert_eq!(session.phase(), SessionPhase::Broken);
    }

    #[tokio::test]
    async fn test_single_session_full_lifecycle() {
        let table = Arc::new(Table::new(1));
        let (session, mut client) = session(&table, 1);
        let handle = tokio::spawn(session.run());

        let coordinator = {
            let table = table.clone();
            tokio::spawn(async move {
                table.start_barrier().await;
                table.wait_round_over().await;
                table.publish_outcomes();
                table.retry_barrier().await
            })
        };

        let card = read_card(&mut client).await.unwrap();
        write_reply(&mut client, Reply::No).await.unwrap();
        let outcome = read_outcome(&mut client).await.unwrap();
        // 只有一名玩家，一张牌不可能爆牌
        assert!(card.value() < BUST_LIMIT);
        assert_eq!(outcome, Outcome::Win);

        write_reply(&mut client, Reply::No).await.unwrap();
        assert_eq!(read_signal(&mut client).await.unwrap(), RoundSignal::Finish);
        assert_eq!(coordinator.await.unwrap(), Election::No);

        let summary = handle.await.unwrap();
        assert_eq!(summary, SessionSummary { id: 1, rounds: 1, broken: false });
    }
}
