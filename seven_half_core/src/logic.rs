use crate::card::BUST_LIMIT;
use crate::state::{Election, Outcome};

// --- 结算逻辑 ---

/// 结算时一名玩家的最终状态
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinalScore {
    pub score: f32,
    /// 连接出错的玩家不参与争夺胜利
    pub broken: bool,
}

impl FinalScore {
    pub fn new(score: f32, broken: bool) -> FinalScore {
        FinalScore { score, broken }
    }

    /// 未爆牌且连接正常的分数才有资格成为本局最高分
    pub fn qualifies(&self) -> bool {
        !self.broken && self.score <= BUST_LIMIT
    }
}

/// 计算本局每名玩家的结果，返回值与输入一一对应
///
/// - 有资格的分数中取最大值作为胜出分数；没有任何人有资格时，没有胜出分数，
///   所有人都判负 (不会发出单独的"无人胜出"消息)。
/// - 分数不等于胜出分数的判负。
/// - 分数等于胜出分数的判胜；两人及以上同分则都判平局。
/// - 出错的玩家即使分数恰好相同也判负。
///
/// 结果与输入顺序无关。
pub fn classify_outcome(scores: &[FinalScore]) -> Vec<Outcome> {
    let winning = scores
        .iter()
        .filter(|s| s.qualifies())
        .map(|s| s.score)
        .max_by(f32::total_cmp);

    let is_winner = |s: &FinalScore| s.qualifies() && Some(s.score) == winning;
    let winners = scores.iter().filter(|s| is_winner(s)).count();

    scores
        .iter()
        .map(|s| match is_winner(s) {
            false => Outcome::Lose,
            true if winners > 1 => Outcome::Tie,
            true => Outcome::Win,
        })
        .collect()
}

/// 牌桌级别的"再来一局"裁决
///
/// 只要有玩家出过错，立刻否决，不必等待投票；否则只有在所有人都投了 Yes 时才继续，
/// 有任何人尚未表态则仍是 `Undecided`。
pub fn resolve_retry(votes: &[Election], any_broken: bool) -> Election {
    if any_broken {
        return Election::No;
    }
    if votes.iter().any(|v| !v.is_decided()) {
        return Election::Undecided;
    }
    if votes.iter().all(|v| *v == Election::Yes) {
        Election::Yes
    } else {
        Election::No
    }
}

// --- 单元测试 ---

#[cfg(test)]
mod tests {
    use super::*;
    use Election::*;
    use Outcome::*;

    fn ok(score: f32) -> FinalScore {
        FinalScore::new(score, false)
    }

    #[test]
    fn test_exact_limit_beats_bust() {
        assert_eq!(classify_outcome(&[ok(7.5), ok(8.2)]), vec![Win, Lose]);
    }

    #[test]
    fn test_shared_best_score_is_a_tie() {
        assert_eq!(classify_outcome(&[ok(7.0), ok(7.0), ok(9.0)]), vec![Tie, Tie, Lose]);
    }

    #[test]
    fn test_everyone_loses_when_all_bust() {
        assert_eq!(classify_outcome(&[ok(8.0), ok(9.5), ok(8.0)]), vec![Lose, Lose, Lose]);
    }

    #[test]
    fn test_lower_scores_lose() {
        assert_eq!(classify_outcome(&[ok(3.0), ok(6.5), ok(5.0)]), vec![Lose, Win, Lose]);
    }

    #[test]
    fn test_single_player_table() {
        assert_eq!(classify_outcome(&[ok(2.0)]), vec![Win]);
        assert_eq!(classify_outcome(&[ok(10.0)]), vec![Lose]);
        assert!(classify_outcome(&[]).is_empty());
    }

    #[test]
    fn test_broken_player_never_wins() {
        // 出错玩家的分数最高也不算
        let scores = [FinalScore::new(7.5, true), ok(4.0)];
        assert_eq!(classify_outcome(&scores), vec![Lose, Win]);

        // 与胜出分数相同的出错玩家不会把胜利变成平局
        let scores = [FinalScore::new(4.0, true), ok(4.0)];
        assert_eq!(classify_outcome(&scores), vec![Lose, Win]);
    }

    #[test]
    fn test_bust_never_wins_or_ties() {
        let scores = [ok(8.5), ok(1.0), ok(7.5), ok(12.0), ok(7.5)];
        let outcomes = classify_outcome(&scores);
        for (s, o) in scores.iter().zip(&outcomes) {
            if s.score > BUST_LIMIT {
                assert_eq!(*o, Lose);
            }
        }
        assert_eq!(outcomes, vec![Lose, Lose, Tie, Lose, Tie]);
    }

    #[test]
    fn test_order_independent() {
        let scores = [ok(5.5), ok(7.0), FinalScore::new(7.0, true), ok(8.0), ok(7.0)];
        let expected = classify_outcome(&scores);
        let mut reversed = scores;
        reversed.reverse();
        let mut outcomes = classify_outcome(&reversed);
        outcomes.reverse();
        assert_eq!(outcomes, expected);
        assert_eq!(expected, vec![Lose, Tie, Lose, Lose, Tie]);
    }

    #[test]
    fn test_unanimous_yes_retries() {
        assert_eq!(resolve_retry(&[Yes, Yes, Yes], false), Yes);
    }

    #[test]
    fn test_single_no_stops() {
        assert_eq!(resolve_retry(&[Yes, Yes, No], false), No);
        assert_eq!(resolve_retry(&[Yes, Yes, No], true), No);
    }

    #[test]
    fn test_broken_player_vetoes_retry() {
        assert_eq!(resolve_retry(&[Yes, Yes], true), No);
        // 出错时不用等其他人表态
        assert_eq!(resolve_retry(&[Undecided, Yes], true), No);
    }

    #[test]
    fn test_pending_votes_stay_undecided() {
        assert_eq!(resolve_retry(&[Yes, Undecided], false), Undecided);
    }
}
