//! FEN parsing into a ready-to-play [`Setup`].
//!
//! Piece ids follow the standard layout as closely as a position allows:
//! per color, pawns take the first eight ids in board order and the other
//! pieces the next eight, spilling into unused pawn ids when there are more
//! than eight of them.

use crate::engine::augmented::AugmentedBoard;
use crate::engine::control::ControlMap;
use crate::engine::piece::Piece;
use crate::engine::types::{CastlingRights, ChessError, Color, Coords, PieceId, PieceType};

/// A validated position a game can start from.
#[derive(Clone, Debug)]
pub struct Setup {
    pub board: AugmentedBoard,
    pub side_to_move: Color,
    pub castling: CastlingRights,
    pub halfmove_clock: u32,
}

fn invalid(msg: impl Into<String>) -> ChessError {
    ChessError::InvalidFen(msg.into())
}

/// Parse a six-field FEN string. The resulting board is in test mode.
pub fn parse(fen: &str) -> Result<Setup, ChessError> {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    if fields.len() != 6 {
        return Err(invalid(format!("expected 6 fields, got {}", fields.len())));
    }

    // ----- Field 1: Piece placement -----
    let placed = parse_placement(fields[0])?;

    for color in [Color::White, Color::Black] {
        let kings = placed
            .iter()
            .filter(|(_, c, k)| *c == color && *k == PieceType::King)
            .count();
        if kings != 1 {
            return Err(invalid(format!("{color} has {kings} kings (expected 1)")));
        }
        let total = placed.iter().filter(|(_, c, _)| *c == color).count();
        if total > 16 {
            return Err(invalid(format!("{color} has {total} pieces (at most 16)")));
        }
        let pawns = placed
            .iter()
            .filter(|(_, c, k)| *c == color && *k == PieceType::Pawn)
            .count();
        if pawns > 8 {
            return Err(invalid(format!("{color} has {pawns} pawns (at most 8)")));
        }
    }
    if let Some((c, _, _)) = placed
        .iter()
        .find(|(c, _, k)| *k == PieceType::Pawn && (c.rank == 0 || c.rank == 7))
    {
        return Err(invalid(format!("pawn on back rank at {}", c.to_algebraic())));
    }

    let mut board = AugmentedBoard::empty(true);
    for color in [Color::White, Color::Black] {
        place_color(&mut board, &placed, color);
    }

    // ----- Field 2: Side to move -----
    let side_to_move = match fields[1] {
        "w" => Color::White,
        "b" => Color::Black,
        other => return Err(invalid(format!("invalid side to move: '{other}'"))),
    };

    // ----- Field 3: Castling availability -----
    let mut castling = CastlingRights::from_fen(fields[2])
        .ok_or_else(|| invalid(format!("invalid castling string: '{}'", fields[2])))?;
    normalize_castling(&board, &mut castling);

    // ----- Field 4: En passant target square -----
    if fields[3] != "-" {
        let target = Coords::from_algebraic(fields[3])
            .ok_or_else(|| invalid(format!("invalid en passant square: '{}'", fields[3])))?;
        let mover = !side_to_move;
        let expected_rank = (mover.home_rank() as i8 + 2 * mover.forward()) as u8;
        if target.rank != expected_rank {
            return Err(invalid(format!(
                "en passant square {} does not match side to move",
                fields[3]
            )));
        }
        let pawn_at = Coords::new((target.rank as i8 + mover.forward()) as u8, target.file);
        let is_pawn = board
            .piece_at(pawn_at)
            .is_some_and(|p| p.kind == PieceType::Pawn && p.color() == mover);
        if !is_pawn {
            return Err(invalid(format!(
                "no double-stepped pawn behind en passant square {}",
                fields[3]
            )));
        }
        board.mark_en_passant(pawn_at);
    }

    // ----- Field 5: Halfmove clock -----
    let halfmove_clock = fields[4]
        .parse::<u32>()
        .map_err(|_| invalid(format!("invalid halfmove clock: '{}'", fields[4])))?;

    // ----- Field 6: Fullmove number -----
    let fullmove = fields[5]
        .parse::<u32>()
        .map_err(|_| invalid(format!("invalid fullmove number: '{}'", fields[5])))?;
    if fullmove == 0 {
        return Err(invalid("fullmove number must be >= 1"));
    }

    // The side that just moved may not be in check, and the side to move
    // may face at most a double check.
    let by_mover = ControlMap::try_build(&board, side_to_move)?;
    if by_mover.gives_check() {
        return Err(invalid(format!("{} is in check but not to move", !side_to_move)));
    }
    ControlMap::try_build(&board, !side_to_move)?;

    Ok(Setup {
        board,
        side_to_move,
        castling,
        halfmove_clock,
    })
}

fn parse_placement(field: &str) -> Result<Vec<(Coords, Color, PieceType)>, ChessError> {
    let ranks: Vec<&str> = field.split('/').collect();
    if ranks.len() != 8 {
        return Err(invalid(format!("expected 8 ranks, got {}", ranks.len())));
    }

    let mut placed = Vec::new();
    for (rank_idx, rank_str) in ranks.iter().enumerate() {
        let rank = 7 - rank_idx as u8; // FEN starts from rank 8
        let mut file: u8 = 0;
        for ch in rank_str.chars() {
            if file > 7 {
                return Err(invalid(format!("too many squares in rank {}", rank + 1)));
            }
            if let Some(digit) = ch.to_digit(10) {
                if !(1..=8).contains(&digit) {
                    return Err(invalid(format!(
                        "invalid empty count '{ch}' in rank {}",
                        rank + 1
                    )));
                }
                file += digit as u8;
            } else if let Some((color, kind)) = PieceType::from_char(ch) {
                placed.push((Coords::new(rank, file), color, kind));
                file += 1;
            } else {
                return Err(invalid(format!(
                    "invalid character '{ch}' in piece placement"
                )));
            }
        }
        if file != 8 {
            return Err(invalid(format!(
                "rank {} has {file} squares instead of 8",
                rank + 1
            )));
        }
    }
    placed.sort_by_key(|(c, _, _)| *c);
    Ok(placed)
}

fn place_color(board: &mut AugmentedBoard, placed: &[(Coords, Color, PieceType)], color: Color) {
    let base = PieceId::first_of(color);
    let start_rank = (color.home_rank() as i8 + color.forward()) as u8;

    let pawns: Vec<Coords> = placed
        .iter()
        .filter(|(_, c, k)| *c == color && *k == PieceType::Pawn)
        .map(|(at, _, _)| *at)
        .collect();
    for (i, &at) in pawns.iter().enumerate() {
        let mut pawn = Piece::new(PieceId(base + i as u8), PieceType::Pawn);
        if at.rank != start_rank {
            pawn.move_count = 1;
        }
        board.add_piece(at, pawn);
    }

    let mut free_ids = (base + 8..base + 16).chain(base + pawns.len() as u8..base + 8);
    for &(at, _, kind) in placed
        .iter()
        .filter(|(_, c, k)| *c == color && *k != PieceType::Pawn)
    {
        // Piece counts were checked against the 16 available ids.
        let Some(id) = free_ids.next() else { break };
        board.add_piece(at, Piece::new(PieceId(id), kind));
    }
}

/// Drop rights whose king or rook is not on its home square.
fn normalize_castling(board: &AugmentedBoard, rights: &mut CastlingRights) {
    for color in [Color::White, Color::Black] {
        let home = color.home_rank();
        let is = |file: u8, kind: PieceType| {
            board
                .piece_at(Coords::new(home, file))
                .is_some_and(|p| p.kind == kind && p.color() == color)
        };
        if !is(4, PieceType::King) {
            rights.revoke_both(color);
            continue;
        }
        if !is(7, PieceType::Rook) {
            rights.revoke_corner(Coords::new(home, 7));
        }
        if !is(0, PieceType::Rook) {
            rights.revoke_corner(Coords::new(home, 0));
        }
    }
}
