use clap::Parser;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use seven_half_core::DEFAULT_PLAYERS;

/// 七点半牌桌服务器：等满指定人数后开始发牌
#[derive(Parser, Debug)]
#[command(name = "seven_half_server", version)]
pub struct Args {
    /// 玩家人数；省略时从标准输入询问，无效时为 2
    pub players: Option<String>,
}

/// 确定玩家人数：优先用命令行参数，没有则在标准输入上询问
pub async fn player_count(args: &Args) -> usize {
    match &args.players {
        Some(text) => parse_player_count(text),
        None => {
            print!("Amount of players: ");
            let _ = std::io::stdout().flush();
            let mut stdin = BufReader::new(tokio::io::stdin()).lines();
            let line = stdin.next_line().await.ok().flatten().unwrap_or_default();
            parse_player_count(&line)
        }
    }
}

/// 解析正整数人数，其它输入一律回退到默认的 2 人
pub fn parse_player_count(text: &str) -> usize {
    match text.trim().parse::<usize>() {
        Ok(players) if players > 0 => {
            info!(players, "牌桌人数");
            players
        }
        _ => {
            info!(players = DEFAULT_PLAYERS, input = text, "人数无效，使用默认值");
            DEFAULT_PLAYERS
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_count_is_kept() {
        assert_eq!(parse_player_count("3"), 3);
        assert_eq!(parse_player_count(" 5\n"), 5);
        assert_eq!(parse_player_count("1"), 1);
    }

    #[test]
    fn test_invalid_count_falls_back_to_two() {
        assert_eq!(parse_player_count("0"), 2);
        assert_eq!(parse_player_count("-4"), 2);
        assert_eq!(parse_player_count("three"), 2);
        assert_eq!(parse_player_count(""), 2);
    }

    #[test]
    fn test_players_argument_is_optional() {
        let args = Args::parse_from(["seven_half_server"]);
        assert!(args.players.is_none());
        let args = Args::parse_from(["seven_half_server", "4"]);
        assert_eq!(args.players.as_deref(), Some("4"));
    }
}
