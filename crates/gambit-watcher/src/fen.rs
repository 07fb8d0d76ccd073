//! Board reconstruction from piece element classes.
//!
//! Each piece element carries a piece token (`wp` .. `bk`) and a square
//! token `square-FR` where `F` is the file (1 = a) and `R` the rank, both
//! 1-8. Square `FR` lands at index `(8 - R) * 8 + (F - 1)`, so index 0 is
//! a8 and rows come out in placement order.
//!
//! Only occupancy is visible in the markup. Side to move, castling rights,
//! en passant and the move counters are filled with [`PLACEHOLDER_SUFFIX`].

/// Metadata appended to every reconstructed placement.
pub const PLACEHOLDER_SUFFIX: &str = "w KQkq - 0 1";

const BOARD_SQUARES: usize = 64;
const FILES: usize = 8;

/// Piece class token to placement letter.
const PIECES: [(&str, char); 12] = [
    ("wp", 'P'),
    ("wr", 'R'),
    ("wn", 'N'),
    ("wb", 'B'),
    ("wq", 'Q'),
    ("wk", 'K'),
    ("bp", 'p'),
    ("br", 'r'),
    ("bn", 'n'),
    ("bb", 'b'),
    ("bq", 'q'),
    ("bk", 'k'),
];

fn piece_letter(token: &str) -> Option<char> {
    PIECES
        .iter()
        .find(|(class, _)| *class == token)
        .map(|(_, letter)| *letter)
}

/// Board index for a `square-FR` token.
fn square_index(token: &str) -> Option<usize> {
    let digits = token.strip_prefix("square-")?;
    let mut chars = digits.chars();
    let file = chars.next()?.to_digit(10)?;
    let rank = chars.next()?.to_digit(10)?;
    if chars.next().is_some() || !(1..=8).contains(&file) || !(1..=8).contains(&rank) {
        return None;
    }
    let index = 8_u32
        .checked_sub(rank)?
        .checked_mul(8)?
        .checked_add(file.checked_sub(1)?)?;
    usize::try_from(index).ok()
}

/// Rebuild a position from the class lists of the board's piece elements.
///
/// Elements without both a piece token and a square token are skipped.
/// Returns `None` when no piece could be placed.
pub fn reconstruct<S: AsRef<str>>(class_lists: &[S]) -> Option<String> {
    let mut board: [Option<char>; BOARD_SQUARES] = [None; BOARD_SQUARES];
    let mut placed = false;

    for classes in class_lists {
        let tokens = classes.as_ref().split_whitespace();
        let mut letter = None;
        let mut index = None;
        for token in tokens {
            letter = letter.or_else(|| piece_letter(token));
            index = index.or_else(|| square_index(token));
        }
        if let (Some(letter), Some(square)) = (letter, index.and_then(|i| board.get_mut(i))) {
            *square = Some(letter);
            placed = true;
        }
    }

    if !placed {
        return None;
    }

    let rows: Vec<String> = board.chunks(FILES).map(encode_row).collect();
    Some(format!("{} {PLACEHOLDER_SUFFIX}", rows.join("/")))
}

/// One rank in placement notation: letters with runs of empties as digits.
fn encode_row(row: &[Option<char>]) -> String {
    let mut out = String::with_capacity(FILES);
    let mut empty: u32 = 0;
    for square in row {
        match square {
            Some(letter) => {
                if let Some(digit) = char::from_digit(empty, 10).filter(|_| empty > 0) {
                    out.push(digit);
                }
                empty = 0;
                out.push(*letter);
            }
            None => empty = empty.saturating_add(1),
        }
    }
    if let Some(digit) = char::from_digit(empty, 10).filter(|_| empty > 0) {
        out.push(digit);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start_position_classes() -> Vec<String> {
        let back = ["r", "n", "b", "q", "k", "b", "n", "r"];
        let mut classes = Vec::new();
        for (file, piece) in (1..=8).zip(back) {
            classes.push(format!("piece w{piece} square-{file}1"));
            classes.push(format!("piece wp square-{file}2"));
            classes.push(format!("piece bp square-{file}7"));
            classes.push(format!("piece b{piece} square-{file}8"));
        }
        classes
    }

    #[test]
    fn start_position_round_trips() {
        let fen = reconstruct(&start_position_classes());
        assert_eq!(
            fen.as_deref(),
            Some("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1")
        );
    }

    #[test]
    fn empty_runs_are_counted() {
        let fen = reconstruct(&["piece wk square-51", "piece bk square-58", "piece wp square-44"]);
        assert_eq!(fen.as_deref(), Some("4k3/8/8/8/3P4/8/8/4K3 w KQkq - 0 1"));
    }

    #[test]
    fn token_order_does_not_matter() {
        let fen = reconstruct(&["square-11 highlight wr piece"]);
        assert_eq!(fen.as_deref(), Some("8/8/8/8/8/8/8/R7 w KQkq - 0 1"));
    }

    #[test]
    fn nothing_placeable_is_none() {
        let empty: [&str; 0] = [];
        assert_eq!(reconstruct(&empty), None);
        let unplaceable = ["piece square-11", "piece wp", "piece wp square-09", "piece wp square-123"];
        assert_eq!(reconstruct(&unplaceable), None);
    }

    #[test]
    fn square_tokens_are_bounded() {
        assert_eq!(square_index("square-18"), Some(0));
        assert_eq!(square_index("square-81"), Some(63));
        assert_eq!(square_index("square-90"), None);
        assert_eq!(square_index("square-1"), None);
        assert_eq!(square_index("sq-11"), None);
    }
}
