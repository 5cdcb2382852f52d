use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::message::WireError;

/// 监听端口，客户端端口输入无效时也回退到它
pub const DEFAULT_PORT: u16 = 7000;

/// 玩家人数输入无效时的默认值
pub const DEFAULT_PLAYERS: usize = 2;

/// 玩家在牌桌上的序号，从 1 开始
pub type PlayerId = usize;

/// 三态选择，用于"准备开始"和"是否再来一局"
/// `Undecided` 本身是可观察的状态，屏障靠它判断是否所有人都已表态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Election {
    #[default]
    Undecided,
    Yes,
    No,
}

impl Election {
    pub fn is_decided(self) -> bool {
        self != Election::Undecided
    }
}

impl From<Reply> for Election {
    fn from(reply: Reply) -> Self {
        match reply {
            Reply::Yes => Election::Yes,
            Reply::No => Election::No,
        }
    }
}

/// 客户端 -> 服务器 的回答："还要牌吗？" / "再来一局吗？"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reply {
    Yes,
    No,
}

impl Reply {
    pub fn as_str(self) -> &'static str {
        match self {
            Reply::Yes => "YES",
            Reply::No => "NO",
        }
    }
}

impl From<bool> for Reply {
    fn from(yes: bool) -> Self {
        if yes { Reply::Yes } else { Reply::No }
    }
}

/// 一局结束后每名玩家收到的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Lose,
    Tie,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Win => "YOU WIN!",
            Outcome::Lose => "YOU LOSE!",
            Outcome::Tie => "TIE!",
        }
    }
}

/// 再来一局的投票结束后，服务器告知每名玩家是否继续
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundSignal {
    Retry,
    Finish,
}

impl RoundSignal {
    pub fn as_str(self) -> &'static str {
        match self {
            RoundSignal::Retry => "RETRY",
            RoundSignal::Finish => "FINISH",
        }
    }
}

impl From<Election> for RoundSignal {
    fn from(retry: Election) -> Self {
        match retry {
            Election::Yes => RoundSignal::Retry,
            _ => RoundSignal::Finish,
        }
    }
}

/// 服务端每个会话的协议状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Connected,
    AwaitingStart,
    Dealing,
    AwaitingMoreCardsDecision,
    AwaitingResult,
    AwaitingRetryDecision,
    AwaitingRetryOutcome,
    Closed,
    /// 连接出错后进入，永远不会离开
    Broken,
}

// --- 线上文本的解析与显示 ---

macro_rules! wire_text {
    ($ty:ident { $($variant:ident),+ }) => {
        impl FromStr for $ty {
            type Err = WireError;

            fn from_str(text: &str) -> Result<Self, Self::Err> {
                $(
                    if text == $ty::$variant.as_str() {
                        return Ok($ty::$variant);
                    }
                )+
                Err(WireError::UnexpectedText { text: text.to_string() })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_text!(Reply { Yes, No });
wire_text!(Outcome { Win, Lose, Tie });
wire_text!(RoundSignal { Retry, Finish });
