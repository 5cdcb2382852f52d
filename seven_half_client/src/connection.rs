use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tracing::debug;

use seven_half_core::{
    read_card, read_outcome, read_signal, write_reply, Card, Hand, Outcome, Reply, RoundSignal,
    WireError,
};

/// 连接任务 -> 界面 的事件
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// 收到一张牌，附带本局累计分数
    CardDealt { card: Card, score: f32 },
    /// 询问是否还要牌，界面需要回一个 `Reply`
    MoreCards,
    Outcome(Outcome),
    /// 询问是否再来一局，界面需要回一个 `Reply`
    RetryPrompt,
    Signal(RoundSignal),
    Disconnected(String),
}

/// 客户端一侧的协议状态机
///
/// 这个任务独占连接，只通过两个通道和界面交流：事件发给界面，回答从界面收回来。
/// 界面关闭任一通道时直接结束，不再读写连接。
pub async fn play<S>(
    mut stream: S,
    events: &mpsc::Sender<Event>,
    replies: &mut mpsc::Receiver<Reply>,
) -> Result<(), WireError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let mut hand = Hand::new();
        loop {
            let card = read_card(&mut stream).await?;
            hand.push(card);
            if events.send(Event::CardDealt { card, score: hand.score() }).await.is_err() {
                return Ok(());
            }
            // 和服务器同样的规则：达到 7.5 不再询问
            if hand.is_over() {
                break;
            }

            if events.send(Event::MoreCards).await.is_err() {
                return Ok(());
            }
            let Some(reply) = replies.recv().await else {
                return Ok(());
            };
            write_reply(&mut stream, reply).await?;
            if reply == Reply::No {
                break;
            }
        }

        let outcome = read_outcome(&mut stream).await?;
        debug!(%outcome, score = hand.score(), "本局结束");
        if events.send(Event::Outcome(outcome)).await.is_err() {
            return Ok(());
        }

        if events.send(Event::RetryPrompt).await.is_err() {
            return Ok(());
        }
        let Some(reply) = replies.recv().await else {
            return Ok(());
        };
        write_reply(&mut stream, reply).await?;

        let signal = read_signal(&mut stream).await?;
        if events.send(Event::Signal(signal)).await.is_err() {
            return Ok(());
        }
        if signal == RoundSignal::Finish {
            return Ok(());
        }
    }
}
