//! "Did you mean" hints for unrecognized commands and options.

use std::cmp;

use strsim::osa_distance;

/// Closest candidate to `unknown`, if any is close enough.
///
/// Leading dashes are ignored and the comparison is case-insensitive. A
/// candidate qualifies when its edit distance is at most
/// `max(1, len * 2 / 5)` where `len` is the length of the unknown name; on
/// ties the earliest candidate wins.
pub fn suggest(unknown: &str, candidates: &[String]) -> Option<String> {
    let unknown = normalize(unknown);
    let threshold = cmp::max(1, unknown.chars().count() * 2 / 5);

    let mut best: Option<(&String, usize)> = None;
    for candidate in candidates {
        let distance = osa_distance(&unknown, &normalize(candidate));
        if distance > threshold {
            continue;
        }
        match best {
            Some((_, best_distance)) if best_distance <= distance => (),
            _ => best = Some((candidate, distance)),
        }
    }
    best.map(|(it, _)| it.clone())
}

fn normalize(name: &str) -> String {
    name.trim_start_matches('-').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|it| it.to_string()).collect()
    }

    #[test]
    fn one_edit_away() {
        let commands = names(&["build", "bench", "test"]);
        assert_eq!(suggest("buld", &commands), Some("build".to_string()));
        assert_eq!(suggest("tset", &commands), Some("test".to_string()));
        assert_eq!(suggest("tests", &commands), Some("test".to_string()));
        assert_eq!(suggest("BUILD", &commands), Some("build".to_string()));
    }

    #[test]
    fn options_keep_their_dashes() {
        let options = names(&["-n", "--name", "-?", "-h", "--help"]);
        assert_eq!(suggest("--nmae", &options), Some("--name".to_string()));
        assert_eq!(suggest("--hlep", &options), Some("--help".to_string()));
    }

    #[test]
    fn too_far_away() {
        let commands = names(&["build", "bench", "test"]);
        assert_eq!(suggest("deploy", &commands), None);
        assert_eq!(suggest("xyz", &commands), None);
        assert_eq!(suggest("bu", &[]), None);
    }

    #[test]
    fn ties_go_to_the_first_declared() {
        let commands = names(&["bat", "cat", "rat"]);
        assert_eq!(suggest("hat", &commands), Some("bat".to_string()));
        let commands = names(&["rat", "cat", "bat"]);
        assert_eq!(suggest("hat", &commands), Some("rat".to_string()));
    }
}
