//! 线上协议
//!
//! 同一条 TCP 连接上有两种帧，都不带类型标签，双方根据各自的协议状态知道下一帧是什么：
//!
//! - 牌记录：固定两个字节 `{symbol, suit}`，由 serde + bincode 编码；
//! - 文本帧：大端 `u16` 字节长度，后跟 UTF-8 内容。
//!   客户端发送 `"YES"`/`"NO"`，服务器发送本局结果和 `"RETRY"`/`"FINISH"`。

use snafu::{ResultExt, Snafu};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::card::{Card, CardRecord};
use crate::state::{Outcome, Reply, RoundSignal};

/// 一条牌记录在线上的字节数
pub const CARD_RECORD_LEN: usize = 2;

/// 读写连接时可能出现的错误
///
/// 连接断开和收到非法内容在服务端同样处理：该会话进入 Broken。
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum WireError {
    #[snafu(display("connection i/o failed: {source}"))]
    Io { source: std::io::Error },

    #[snafu(display("card record could not be encoded: {source}"))]
    Encode { source: bincode::Error },

    #[snafu(display("card record could not be decoded: {source}"))]
    Decode { source: bincode::Error },

    #[snafu(display("unknown card record {{symbol: {symbol}, suit: {suit}}}"))]
    UnknownCard { symbol: u8, suit: u8 },

    #[snafu(display("text frame is not valid utf-8: {source}"))]
    Utf8 { source: std::string::FromUtf8Error },

    #[snafu(display("text frame of {len} bytes exceeds the u16 length prefix"))]
    TooLong { len: usize },

    #[snafu(display("unexpected message {text:?}"))]
    UnexpectedText { text: String },
}

pub type WireResult<T> = Result<T, WireError>;

// --- 牌记录 ---

pub async fn write_card<W>(writer: &mut W, card: Card) -> WireResult<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let bytes = bincode::serialize(&card).context(EncodeSnafu)?;
    debug_assert_eq!(bytes.len(), CARD_RECORD_LEN);
    writer.write_all(&bytes).await.context(IoSnafu)?;
    writer.flush().await.context(IoSnafu)
}

pub async fn read_card<R>(reader: &mut R) -> WireResult<Card>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = [0u8; CARD_RECORD_LEN];
    reader.read_exact(&mut buf).await.context(IoSnafu)?;
    let record: CardRecord = bincode::deserialize(&buf).context(DecodeSnafu)?;
    Card::try_from(record)
}

// --- 文本帧 ---

pub async fn write_text<W>(writer: &mut W, text: &str) -> WireResult<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let len = u16::try_from(text.len()).map_err(|_| WireError::TooLong { len: text.len() })?;
    writer.write_u16(len).await.context(IoSnafu)?;
    writer.write_all(text.as_bytes()).await.context(IoSnafu)?;
    writer.flush().await.context(IoSnafu)
}

pub async fn read_text<R>(reader: &mut R) -> WireResult<String>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let len = reader.read_u16().await.context(IoSnafu)?;
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf).await.context(IoSnafu)?;
    String::from_utf8(buf).context(Utf8Snafu)
}

// --- 按协议含义读写 ---

pub async fn write_reply<W>(writer: &mut W, reply: Reply) -> WireResult<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    write_text(writer, reply.as_str()).await
}

/// 读取客户端的 YES/NO，其它任何内容都算协议错误
pub async fn read_reply<R>(reader: &mut R) -> WireResult<Reply>
where
    R: AsyncRead + Unpin + ?Sized,
{
    read_text(reader).await?.parse()
}

pub async fn read_outcome<R>(reader: &mut R) -> WireResult<Outcome>
where
    R: AsyncRead + Unpin + ?Sized,
{
    read_text(reader).await?.parse()
}

pub async fn read_signal<R>(reader: &mut R) -> WireResult<RoundSignal>
where
    R: AsyncRead + Unpin + ?Sized,
{
    read_text(reader).await?.parse()
}
