use crossterm::style::{Color, StyledContent, Stylize};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;

use seven_half_core::{Card, Outcome, Reply, RoundSignal, Suit, BUST_LIMIT};

use crate::connection::Event;

// --- 颜色 ---

fn suit_color(suit: Suit) -> Color {
    match suit {
        Suit::Golds => Color::Yellow,
        Suit::Cups => Color::Red,
        Suit::Swords => Color::Cyan,
        Suit::Clubs => Color::Green,
    }
}

fn styled_card(card: Card) -> StyledContent<String> {
    card.to_string().with(suit_color(card.suit))
}

fn styled_score(score: f32) -> StyledContent<String> {
    let color = if score <= BUST_LIMIT { Color::Blue } else { Color::Red };
    score.to_string().with(color)
}

fn styled_outcome(outcome: Outcome) -> StyledContent<&'static str> {
    let color = match outcome {
        Outcome::Win => Color::Green,
        Outcome::Tie => Color::DarkYellow,
        Outcome::Lose => Color::Red,
    };
    outcome.as_str().with(color).bold()
}

/// 把用户的一行输入解析成回答，无法识别时返回 `None`
pub fn parse_answer(line: &str) -> Option<Reply> {
    match line.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(Reply::Yes),
        "n" | "no" => Some(Reply::No),
        _ => None,
    }
}

/// 终端界面
///
/// 只负责展示连接任务发来的事件，并把用户的回答送回去；不直接接触网络连接。
pub struct Terminal {
    stdin: Lines<BufReader<Stdin>>,
    last_vote: Option<Reply>,
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal {
    pub fn new() -> Terminal {
        Terminal { stdin: BufReader::new(tokio::io::stdin()).lines(), last_vote: None }
    }

    /// 处理事件直到连接任务结束；标准输入关闭时放弃回答，连接任务随之结束
    pub async fn run(mut self, mut events: mpsc::Receiver<Event>, replies: mpsc::Sender<Reply>) {
        println!("--- 七点半 ---");
        while let Some(event) = events.recv().await {
            match event {
                Event::CardDealt { card, score } => {
                    println!("发牌: {}    分数: {}", styled_card(card), styled_score(score));
                }
                Event::MoreCards => {
                    let Some(reply) = self.ask("还要牌吗? [y/n] ").await else { break };
                    let _ = replies.send(reply).await;
                }
                Event::Outcome(outcome) => println!("{}", styled_outcome(outcome)),
                Event::RetryPrompt => {
                    let Some(reply) = self.ask("再来一局? [y/n] ").await else { break };
                    self.last_vote = Some(reply);
                    let _ = replies.send(reply).await;
                }
                Event::Signal(RoundSignal::Retry) => println!("\n--- 新的一局 ---"),
                Event::Signal(RoundSignal::Finish) => {
                    if self.last_vote == Some(Reply::Yes) {
                        println!("游戏结束! 有玩家无法或不愿再来一局。");
                    } else {
                        println!("游戏结束!");
                    }
                }
                Event::Disconnected(reason) => {
                    eprintln!("{} {}", "服务器没有响应!".red().bold(), reason);
                }
            }
        }
    }

    /// 反复提示直到得到有效回答；标准输入关闭时返回 `None`
    async fn ask(&mut self, prompt: &str) -> Option<Reply> {
        loop {
            print!("{}", prompt);
            let _ = std::io::stdout().flush();
            let line = self.stdin.next_line().await.ok().flatten()?;
            if let Some(reply) = parse_answer(&line) {
                return Some(reply);
            }
            println!("请输入 y 或 n");
        }
    }
}
