//! Near-miss ranking for unmatched command paths.

use std::collections::VecDeque;

use super::CommandTree;

impl CommandTree {
    /// Ranks registered command paths close to an unmatched `path`.
    ///
    /// The universe is every path reachable from the root, enumerated
    /// breadth-first. A candidate qualifies when it has no more segments
    /// than the input and its paired segments drift by at most one
    /// character in total; a candidate at the input's own depth must match
    /// exactly. Qualifying candidates are ordered by ascending whole-string
    /// edit distance, ties kept in enumeration order.
    #[must_use]
    pub fn suggestions(&self, path: &str) -> Vec<String> {
        let mut ranked: Vec<(usize, String)> = Vec::new();
        let mut queue = VecDeque::from([self.root()]);
        while let Some(id) = queue.pop_front() {
            for &child in self.children(id) {
                let candidate = self.path(child);
                if let Some(distance) = near_match(path, &candidate) {
                    ranked.push((distance, candidate));
                }
                queue.push_back(child);
            }
        }
        ranked.sort_by_key(|&(distance, _)| distance);
        ranked.into_iter().map(|(_, candidate)| candidate).collect()
    }
}

fn near_match(input: &str, candidate: &str) -> Option<usize> {
    let input_segments: Vec<&str> = input.split(' ').collect();
    let candidate_segments: Vec<&str> = candidate.split(' ').collect();
    if candidate_segments.len() > input_segments.len() {
        return None;
    }

    let drift: usize = candidate_segments
        .iter()
        .zip(&input_segments)
        .map(|(c, i)| strsim::levenshtein(c, i))
        .sum();

    if candidate_segments.len() == input_segments.len() {
        (drift == 0).then_some(0)
    } else if drift <= 1 {
        Some(strsim::levenshtein(input, candidate))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::command::{Command, CommandTree};
    use crate::error::CliError;

    fn tree() -> CommandTree {
        let mut tree = CommandTree::new(Command::new("app"));
        let handler = |_: &mut crate::Context<'_>| Ok::<(), CliError>(());
        let abc = tree
            .register(tree.root(), Command::new("abc").handler(handler))
            .unwrap_or_else(|e| panic!("register: {e}"));
        tree.register(abc, Command::new("def").handler(handler))
            .unwrap_or_else(|e| panic!("register: {e}"));
        tree.register(abc, Command::new("deg").handler(handler))
            .unwrap_or_else(|e| panic!("register: {e}"));
        tree.register(tree.root(), Command::new("abd").handler(handler))
            .unwrap_or_else(|e| panic!("register: {e}"));
        tree
    }

    #[test]
    fn ranks_near_misses_by_distance() {
        let suggestions = tree().suggestions("abc def");
        assert_eq!(suggestions, vec!["abc def", "abc", "abd"]);
    }

    #[rstest]
    #[case("abc", vec!["abc"])]
    #[case("abe", Vec::<&str>::new())]
    fn same_depth_candidates_require_an_exact_match(
        #[case] input: &str,
        #[case] want: Vec<&str>,
    ) {
        assert_eq!(tree().suggestions(input), want);
    }

    #[test]
    fn identical_inputs_rank_deterministically() {
        let t = tree();
        assert_eq!(t.suggestions("abc def"), t.suggestions("abc def"));
    }
}
