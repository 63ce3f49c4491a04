use indexmap::IndexMap;

use crate::state::game::{DEFAULT_POINTS, PASS_ON_POINTS, Question, TeamName};

/// Standing of one team in the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    /// Team name.
    pub team: TeamName,
    /// Cumulative score.
    pub score: u32,
}

/// Points for a correct answer: the pass-on value once the question was passed, the question
/// value otherwise.
pub fn award_points(question: Option<&Question>, passed_on: bool) -> u32 {
    if passed_on {
        PASS_ON_POINTS
    } else {
        question.map_or(DEFAULT_POINTS, Question::points)
    }
}

/// Teams ordered by score descending, ties keeping roster order.
pub fn leaderboard(roster: &[TeamName], scores: &IndexMap<TeamName, u32>) -> Vec<Standing> {
    let mut standings: Vec<Standing> = roster
        .iter()
        .map(|team| Standing {
            team: team.clone(),
            score: scores.get(team).copied().unwrap_or(0),
        })
        .collect();
    standings.sort_by(|a, b| b.score.cmp(&a.score));
    standings
}

/// Teams of `roster` sharing the highest score, in roster order.
pub fn tied_leaders(roster: &[TeamName], scores: &IndexMap<TeamName, u32>) -> Vec<TeamName> {
    let score = |team: &TeamName| scores.get(team).copied().unwrap_or(0);
    let Some(best) = roster.iter().map(score).max() else {
        return Vec::new();
    };
    roster
        .iter()
        .filter(|team| score(*team) == best)
        .cloned()
        .collect()
}

/// Teams of `roster` with the largest gain over `base`; several means a shared win.
pub fn gain_winners(
    roster: &[TeamName],
    scores: &IndexMap<TeamName, u32>,
    base: &IndexMap<TeamName, u32>,
) -> Vec<TeamName> {
    let gains: IndexMap<TeamName, u32> = roster
        .iter()
        .map(|team| {
            let now = scores.get(team).copied().unwrap_or(0);
            let before = base.get(team).copied().unwrap_or(0);
            (team.clone(), now.saturating_sub(before))
        })
        .collect();
    tied_leaders(roster, &gains)
}

/// Scores of `teams` captured as a tie-breaker baseline.
pub fn baseline(teams: &[TeamName], scores: &IndexMap<TeamName, u32>) -> IndexMap<TeamName, u32> {
    teams
        .iter()
        .map(|team| (team.clone(), scores.get(team).copied().unwrap_or(0)))
        .collect()
}
