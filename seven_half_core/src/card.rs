use rand::Rng;
use rand::prelude::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::message::WireError;

/// 爆牌界限：总分超过 7.5 即爆牌，达到 7.5 则本局自动结束
pub const BUST_LIMIT: f32 = 7.5;

/// 一副西班牙纸牌的张数 (10 种点数 × 4 种花色)
pub const DECK_SIZE: usize = 40;

// --- 核心数据结构定义 ---

/// 花色 (Suit)，西班牙纸牌的四种花色，只影响显示
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum Suit {
    Golds,  // 金币
    Cups,   // 圣杯
    Swords, // 宝剑
    Clubs,  // 权杖
}

/// 点数符号 (Symbol)
/// 变体顺序即线上传输的序号，不能随意调整
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum Symbol {
    Ace,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Jack,
    Queen,
    King,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Golds, Suit::Cups, Suit::Swords, Suit::Clubs];

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Suit> {
        Suit::ALL.get(ordinal as usize).copied()
    }
}

impl Symbol {
    pub const ALL: [Symbol; 10] = [
        Symbol::Ace, Symbol::Two, Symbol::Three, Symbol::Four, Symbol::Five,
        Symbol::Six, Symbol::Seven, Symbol::Jack, Symbol::Queen, Symbol::King,
    ];

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Symbol> {
        Symbol::ALL.get(ordinal as usize).copied()
    }

    /// 七点半中的分值：A 为 1，2-7 为面值，人头牌各 0.5
    pub fn value(self) -> f32 {
        match self {
            Symbol::Ace => 1.0,
            Symbol::Two => 2.0,
            Symbol::Three => 3.0,
            Symbol::Four => 4.0,
            Symbol::Five => 5.0,
            Symbol::Six => 6.0,
            Symbol::Seven => 7.0,
            Symbol::Jack | Symbol::Queen | Symbol::King => 0.5,
        }
    }
}

/// 单张纸牌 (Card)
///
/// 线上格式是两个字节的 `{symbol, suit}` 序号记录，见 [`CardRecord`]。
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(into = "CardRecord", try_from = "CardRecord")]
pub struct Card {
    pub symbol: Symbol,
    pub suit: Suit,
}

impl Card {
    pub fn new(symbol: Symbol, suit: Suit) -> Card {
        Card { symbol, suit }
    }

    pub fn value(&self) -> f32 {
        self.symbol.value()
    }
}

/// 每次发牌时写入连接的记录
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct CardRecord {
    pub symbol: u8,
    pub suit: u8,
}

impl From<Card> for CardRecord {
    fn from(card: Card) -> Self {
        CardRecord { symbol: card.symbol.ordinal(), suit: card.suit.ordinal() }
    }
}

impl TryFrom<CardRecord> for Card {
    type Error = WireError;

    fn try_from(record: CardRecord) -> Result<Self, Self::Error> {
        match (Symbol::from_ordinal(record.symbol), Suit::from_ordinal(record.suit)) {
            (Some(symbol), Some(suit)) => Ok(Card { symbol, suit }),
            _ => Err(WireError::UnknownCard { symbol: record.symbol, suit: record.suit }),
        }
    }
}

// --- 实现辅助功能 ---

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Suit::Golds => "GOLDS",
            Suit::Cups => "CUPS",
            Suit::Swords => "SWORDS",
            Suit::Clubs => "CLUBS",
        })
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Symbol::Ace => "A",
            Symbol::Two => "2",
            Symbol::Three => "3",
            Symbol::Four => "4",
            Symbol::Five => "5",
            Symbol::Six => "6",
            Symbol::Seven => "7",
            Symbol::Jack => "J",
            Symbol::Queen => "Q",
            Symbol::King => "K",
        })
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.symbol, self.suit)
    }
}

// --- 牌堆 ---

/// 创建一副完整的 40 张纸牌，未洗牌
fn create_cards() -> Vec<Card> {
    let mut cards = Vec::with_capacity(DECK_SIZE);
    for &suit in &Suit::ALL {
        for &symbol in &Symbol::ALL {
            cards.push(Card { symbol, suit });
        }
    }
    cards
}

/// 每局洗一次的牌堆，不放回地逐张取出
///
/// 作为迭代器使用：取完 40 张后 `next()` 返回 `None`。
#[derive(Debug, Clone)]
pub struct Deck {
    // 从尾部取牌，所以顶牌在末尾
    cards: Vec<Card>,
}

impl Deck {
    pub fn new() -> Deck {
        Deck::shuffled_with(&mut rand::rng())
    }

    /// 用调用方提供的随机数发生器洗牌，测试里可以用固定种子
    pub fn shuffled_with<R: Rng + ?Sized>(rng: &mut R) -> Deck {
        let mut cards = create_cards();
        cards.shuffle(rng);
        Deck { cards }
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }
}

impl Default for Deck {
    fn default() -> Self {
        Deck::new()
    }
}

impl Iterator for Deck {
    type Item = Card;

    fn next(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.cards.len(), Some(self.cards.len()))
    }
}

impl ExactSizeIterator for Deck {}

// --- 手牌 ---

/// 一名玩家本局拿到的牌和累计分数
///
/// 服务端会话和客户端连接任务共用它，保证双方对"本局结束"的判断一致。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hand {
    cards: Vec<Card>,
    score: f32,
}

impl Hand {
    pub fn new() -> Hand {
        Hand::default()
    }

    pub fn push(&mut self, card: Card) {
        self.score += card.value();
        self.cards.push(card);
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    /// 分数达到或超过 7.5 时不再要牌
    pub fn is_over(&self) -> bool {
        self.score >= BUST_LIMIT
    }

    pub fn is_bust(&self) -> bool {
        self.score > BUST_LIMIT
    }

    pub fn clear(&mut self) {
        self.cards.clear();
        self.score = 0.0;
    }
}

// --- 单元测试 ---
