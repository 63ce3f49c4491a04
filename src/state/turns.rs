//! Turn rotation within a round roster.

/// Result of a team passing the active question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// The question moves on to the team at `turn`.
    NextTeam {
        /// Roster index of the team now answering.
        turn: usize,
    },
    /// Every team has had its chance; the answer must be revealed.
    Exhausted,
}

/// Record a pass by the team at `turn` and pick who answers next.
///
/// `passed` accumulates the roster indices that have passed on this question. The question
/// goes to the next team in seating order that is neither the original team nor a team that
/// already passed; once every other team has passed the question is exhausted.
pub fn pass(
    turn: usize,
    original_turn: usize,
    passed: &mut Vec<usize>,
    roster_size: usize,
) -> PassOutcome {
    if !passed.contains(&turn) {
        passed.push(turn);
    }
    if roster_size <= 1 {
        return PassOutcome::Exhausted;
    }

    let others_passed = passed.iter().filter(|&&idx| idx != original_turn).count();
    if others_passed >= roster_size - 1 {
        return PassOutcome::Exhausted;
    }

    (1..=roster_size)
        .map(|step| (turn + step) % roster_size)
        .find(|candidate| *candidate != original_turn && !passed.contains(candidate))
        .map_or(PassOutcome::Exhausted, |turn| PassOutcome::NextTeam { turn })
}

/// Turn of the next question: the team seated after the one that started the current question.
pub fn next_turn(original_turn: usize, roster_size: usize) -> usize {
    if roster_size == 0 {
        0
    } else {
        (original_turn + 1) % roster_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_hands_question_to_following_team() {
        let mut passed = Vec::new();
        assert_eq!(pass(0, 0, &mut passed, 3), PassOutcome::NextTeam { turn: 1 });
        assert_eq!(passed, vec![0]);
        assert_eq!(pass(1, 0, &mut passed, 3), PassOutcome::NextTeam { turn: 2 });
        assert_eq!(pass(2, 0, &mut passed, 3), PassOutcome::Exhausted);
    }

    #[test]
    fn pass_wraps_around_the_roster() {
        let mut passed = Vec::new();
        assert_eq!(pass(2, 2, &mut passed, 3), PassOutcome::NextTeam { turn: 0 });
        assert_eq!(pass(0, 2, &mut passed, 3), PassOutcome::NextTeam { turn: 1 });
        assert_eq!(pass(1, 2, &mut passed, 3), PassOutcome::Exhausted);
    }

    #[test]
    fn single_team_roster_is_exhausted_immediately() {
        let mut passed = Vec::new();
        assert_eq!(pass(0, 0, &mut passed, 1), PassOutcome::Exhausted);
    }

    #[test]
    fn next_turn_follows_original_team() {
        assert_eq!(next_turn(0, 3), 1);
        assert_eq!(next_turn(2, 3), 0);
        assert_eq!(next_turn(0, 0), 0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn every_team_answers_once_before_exhaustion(size in 2usize..10, start in 0usize..10) {
                let original = start % size;
                let mut passed = Vec::new();
                let mut turn = original;
                let mut answered = vec![original];
                loop {
                    match pass(turn, original, &mut passed, size) {
                        PassOutcome::NextTeam { turn: next } => {
                            prop_assert!(!answered.contains(&next));
                            answered.push(next);
                            turn = next;
                        }
                        PassOutcome::Exhausted => break,
                    }
                }
                prop_assert_eq!(answered.len(), size);
                prop_assert_eq!(passed.len(), size);
            }

            #[test]
            fn rotation_anchors_on_original_team(size in 1usize..10, start in 0usize..10) {
                let original = start % size;
                prop_assert_eq!(next_turn(original, size), (original + 1) % size);
                prop_assert!(next_turn(original, size) < size);
            }
        }
    }
}
