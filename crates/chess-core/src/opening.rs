//! Opening signatures — grouping keys built from a game's earliest moves.

/// Default number of plies that identify an opening line.
pub const DEFAULT_SIGNATURE_PLIES: usize = 10;

/// Build an opening signature: the first `plies` SAN moves joined by
/// spaces. Games shorter than `plies` use every move they have, so two
/// short games with identical play share a signature.
pub fn opening_signature(moves: &[String], plies: usize) -> String {
    moves
        .iter()
        .take(plies)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}
