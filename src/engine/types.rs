use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// The two sides in a chess game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Index for array lookups: White=0, Black=1.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Rank the side's non-pawn pieces start on.
    #[inline]
    pub const fn home_rank(self) -> u8 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }

    /// Rank a pawn of this side promotes on.
    #[inline]
    pub const fn back_rank(self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }

    /// Rank step of a forward pawn move.
    #[inline]
    pub const fn forward(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }
}

impl std::ops::Not for Color {
    type Output = Self;
    fn not(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

// ---------------------------------------------------------------------------
// PieceType
// ---------------------------------------------------------------------------

/// The six piece kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceType {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceType {
    /// Piece types a pawn may promote to.
    pub const PROMOTIONS: [PieceType; 4] = [
        PieceType::Queen,
        PieceType::Rook,
        PieceType::Bishop,
        PieceType::Knight,
    ];

    #[inline]
    pub fn is_promotion_target(self) -> bool {
        Self::PROMOTIONS.contains(&self)
    }

    #[inline]
    pub fn is_minor(self) -> bool {
        matches!(self, PieceType::Knight | PieceType::Bishop)
    }

    /// Sliders walk move lines; everything else leaps to fixed offsets.
    #[inline]
    pub fn is_slider(self) -> bool {
        matches!(self, PieceType::Bishop | PieceType::Rook | PieceType::Queen)
    }

    /// Parse a FEN piece character; uppercase is white.
    pub fn from_char(c: char) -> Option<(Color, PieceType)> {
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        let piece = match c.to_ascii_lowercase() {
            'p' => PieceType::Pawn,
            'n' => PieceType::Knight,
            'b' => PieceType::Bishop,
            'r' => PieceType::Rook,
            'q' => PieceType::Queen,
            'k' => PieceType::King,
            _ => return None,
        };
        Some((color, piece))
    }

    /// Parse a lowercase type name such as `"queen"`.
    pub fn from_name(s: &str) -> Result<Self, ChessError> {
        match s {
            "pawn" => Ok(PieceType::Pawn),
            "knight" => Ok(PieceType::Knight),
            "bishop" => Ok(PieceType::Bishop),
            "rook" => Ok(PieceType::Rook),
            "queen" => Ok(PieceType::Queen),
            "king" => Ok(PieceType::King),
            other => Err(ChessError::InvalidPieceType(other.to_string())),
        }
    }
}

impl fmt::Display for PieceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PieceType::Pawn => write!(f, "pawn"),
            PieceType::Knight => write!(f, "knight"),
            PieceType::Bishop => write!(f, "bishop"),
            PieceType::Rook => write!(f, "rook"),
            PieceType::Queen => write!(f, "queen"),
            PieceType::King => write!(f, "king"),
        }
    }
}

// ---------------------------------------------------------------------------
// Coords
// ---------------------------------------------------------------------------

/// A board cell as `(rank, file)`, both in `0..=7`.
///
/// Rank 0 is white's home rank, file 0 is the a-file. Ordering is by rank,
/// then file, which is the order piece lists are kept in. Serializes as the
/// pair `[rank, file]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coords {
    pub rank: u8,
    pub file: u8,
}

impl Coords {
    /// Panics if either component is outside `0..=7`.
    #[inline]
    pub fn new(rank: u8, file: u8) -> Self {
        assert!(
            rank < 8 && file < 8,
            "coordinates out of range: [{rank}, {file}]"
        );
        Coords { rank, file }
    }

    /// Validate an untrusted `[rank, file]` pair.
    pub fn from_pair(pair: [i32; 2]) -> Option<Self> {
        let [rank, file] = pair;
        if (0..8).contains(&rank) && (0..8).contains(&file) {
            Some(Coords {
                rank: rank as u8,
                file: file as u8,
            })
        } else {
            None
        }
    }

    /// The cell `(d_rank, d_file)` away, if it is on the board.
    #[inline]
    pub fn offset(self, d_rank: i8, d_file: i8) -> Option<Self> {
        let rank = self.rank as i8 + d_rank;
        let file = self.file as i8 + d_file;
        if (0..8).contains(&rank) && (0..8).contains(&file) {
            Some(Coords {
                rank: rank as u8,
                file: file as u8,
            })
        } else {
            None
        }
    }

    /// Unit step from `self` towards `other` when both lie on one rank, file
    /// or diagonal.
    pub fn direction_to(self, other: Coords) -> Option<(i8, i8)> {
        let dr = other.rank as i8 - self.rank as i8;
        let df = other.file as i8 - self.file as i8;
        if (dr, df) == (0, 0) {
            return None;
        }
        if dr == 0 || df == 0 || dr.abs() == df.abs() {
            Some((dr.signum(), df.signum()))
        } else {
            None
        }
    }

    /// Algebraic name such as `"e4"`, for logs and debugging.
    pub fn to_algebraic(self) -> String {
        let file = (b'a' + self.file) as char;
        let rank = (b'1' + self.rank) as char;
        format!("{file}{rank}")
    }

    /// Parse algebraic notation like `"e3"`.
    pub fn from_algebraic(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let file = bytes[0].wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        if file < 8 && rank < 8 {
            Some(Coords { rank, file })
        } else {
            None
        }
    }
}

impl Serialize for Coords {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [self.rank, self.file].serialize(serializer)
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.rank, self.file)
    }
}

// ---------------------------------------------------------------------------
// PieceId
// ---------------------------------------------------------------------------

/// Stable piece identity; `0..=15` are white, `16..=31` black.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PieceId(pub u8);

impl PieceId {
    pub const MAX: u8 = 31;

    /// First id in a color's range.
    #[inline]
    pub const fn first_of(color: Color) -> u8 {
        match color {
            Color::White => 0,
            Color::Black => 16,
        }
    }

    #[inline]
    pub fn color(self) -> Color {
        if self.0 <= 15 {
            Color::White
        } else {
            Color::Black
        }
    }
}

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// CastlingRights
// ---------------------------------------------------------------------------

/// The four castling-rights flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CastlingRights {
    pub white_kingside: bool,
    pub white_queenside: bool,
    pub black_kingside: bool,
    pub black_queenside: bool,
}

impl CastlingRights {
    pub const ALL: CastlingRights = CastlingRights {
        white_kingside: true,
        white_queenside: true,
        black_kingside: true,
        black_queenside: true,
    };

    pub const NONE: CastlingRights = CastlingRights {
        white_kingside: false,
        white_queenside: false,
        black_kingside: false,
        black_queenside: false,
    };

    #[inline]
    pub fn kingside(self, color: Color) -> bool {
        match color {
            Color::White => self.white_kingside,
            Color::Black => self.black_kingside,
        }
    }

    #[inline]
    pub fn queenside(self, color: Color) -> bool {
        match color {
            Color::White => self.white_queenside,
            Color::Black => self.black_queenside,
        }
    }

    /// Drop the right tied to a rook corner, if `coords` is one.
    pub fn revoke_corner(&mut self, coords: Coords) {
        match (coords.rank, coords.file) {
            (0, 0) => self.white_queenside = false,
            (0, 7) => self.white_kingside = false,
            (7, 0) => self.black_queenside = false,
            (7, 7) => self.black_kingside = false,
            _ => {}
        }
    }

    pub fn revoke_both(&mut self, color: Color) {
        match color {
            Color::White => {
                self.white_kingside = false;
                self.white_queenside = false;
            }
            Color::Black => {
                self.black_kingside = false;
                self.black_queenside = false;
            }
        }
    }

    /// Parse the FEN castling field (`"KQkq"`, `"-"`, `"Kq"`, ...).
    pub fn from_fen(s: &str) -> Option<Self> {
        if s == "-" {
            return Some(CastlingRights::NONE);
        }
        let mut rights = CastlingRights::NONE;
        for c in s.chars() {
            match c {
                'K' => rights.white_kingside = true,
                'Q' => rights.white_queenside = true,
                'k' => rights.black_kingside = true,
                'q' => rights.black_queenside = true,
                _ => return None,
            }
        }
        Some(rights)
    }
}

impl Default for CastlingRights {
    fn default() -> Self {
        CastlingRights::ALL
    }
}

// ---------------------------------------------------------------------------
// GameStatus
// ---------------------------------------------------------------------------

/// Game status, serialized as its stable numeric code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GameStatus {
    WhiteToMove = 0,
    BlackToMove = 1,
    WhiteMoveRejected = 2,
    BlackMoveRejected = 3,
    WhiteWinsByCheckmate = 4,
    BlackWinsByCheckmate = 5,
    WhiteWinsByResignation = 6,
    BlackWinsByResignation = 7,
    WhiteWinsByTimeout = 8,
    BlackWinsByTimeout = 9,
    WhiteWinsByAbandonment = 10,
    BlackWinsByAbandonment = 11,
    DrawByAgreement = 12,
    DrawByStalemate = 13,
    DrawByFiftyMoveRule = 14,
    DrawByThreefoldRepetition = 15,
    DrawByInsufficientMaterial = 16,
    DrawByTimeoutVsInsufficientMaterial = 17,
}

impl GameStatus {
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Codes 0..=3; every other status is terminal and absorbing.
    #[inline]
    pub fn is_active(self) -> bool {
        self.code() <= 3
    }

    /// Ordinary to-play status for `color`.
    pub fn to_move(color: Color) -> Self {
        match color {
            Color::White => GameStatus::WhiteToMove,
            Color::Black => GameStatus::BlackToMove,
        }
    }

    pub fn rejected(color: Color) -> Self {
        match color {
            Color::White => GameStatus::WhiteMoveRejected,
            Color::Black => GameStatus::BlackMoveRejected,
        }
    }

    /// Checkmate delivered by `winner`.
    pub fn checkmate_by(winner: Color) -> Self {
        match winner {
            Color::White => GameStatus::WhiteWinsByCheckmate,
            Color::Black => GameStatus::BlackWinsByCheckmate,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GameStatus::WhiteToMove => "white_to_move",
            GameStatus::BlackToMove => "black_to_move",
            GameStatus::WhiteMoveRejected => "white_move_rejected",
            GameStatus::BlackMoveRejected => "black_move_rejected",
            GameStatus::WhiteWinsByCheckmate => "white_wins_by_checkmate",
            GameStatus::BlackWinsByCheckmate => "black_wins_by_checkmate",
            GameStatus::WhiteWinsByResignation => "white_wins_by_resignation",
            GameStatus::BlackWinsByResignation => "black_wins_by_resignation",
            GameStatus::WhiteWinsByTimeout => "white_wins_by_timeout",
            GameStatus::BlackWinsByTimeout => "black_wins_by_timeout",
            GameStatus::WhiteWinsByAbandonment => "white_wins_by_abandonment",
            GameStatus::BlackWinsByAbandonment => "black_wins_by_abandonment",
            GameStatus::DrawByAgreement => "draw_by_agreement",
            GameStatus::DrawByStalemate => "draw_by_stalemate",
            GameStatus::DrawByFiftyMoveRule => "draw_by_fifty_move_rule",
            GameStatus::DrawByThreefoldRepetition => "draw_by_threefold_repetition",
            GameStatus::DrawByInsufficientMaterial => "draw_by_insufficient_material",
            GameStatus::DrawByTimeoutVsInsufficientMaterial => {
                "draw_by_timeout_vs_insufficient_material"
            }
        }
    }
}

impl Serialize for GameStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ChessError
// ---------------------------------------------------------------------------

/// Recoverable engine errors (setup input). Rule outcomes are statuses, and
/// contract violations panic.
#[derive(Debug, thiserror::Error)]
pub enum ChessError {
    #[error("invalid FEN string: {0}")]
    InvalidFen(String),

    #[error("invalid piece type: {0}")]
    InvalidPieceType(String),

    #[error("impossible position: {0}")]
    InvalidPosition(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
