use super::attack_tables::{
    bishop_attacks, king_attacks, knight_attacks, pawn_attacks, rook_attacks,
};
use super::types::{
    Color, Piece, Square, SquareSet, ALL_PIECES, CASTLE_BLACK_K, CASTLE_BLACK_Q, CASTLE_WHITE_K,
    CASTLE_WHITE_Q,
};
use super::zobrist::ZOBRIST;

/// A chess position.
///
/// `Board` is `Copy`; `apply` produces the successor position by value.
/// Two cached Zobrist hashes ride along: the full position hash, and a
/// pawn/king-only sub-hash that keys the evaluator's refresh cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Board {
    pub(crate) pieces: [[SquareSet; 6]; 2],
    pub(crate) occupied: [SquareSet; 2],
    pub(crate) all_occupied: SquareSet,
    pub(crate) stm: Color,
    pub(crate) castling: u8,
    pub(crate) en_passant: Option<Square>,
    pub(crate) halfmove_clock: u32,
    pub(crate) fullmove: u32,
    pub(crate) hash: u64,
    pub(crate) pawn_king_hash: u64,
}

impl Board {
    /// The standard starting position.
    #[must_use]
    pub fn startpos() -> Self {
        let mut board = Board::empty();
        let back_rank = [
            Piece::Rook,
            Piece::Knight,
            Piece::Bishop,
            Piece::Queen,
            Piece::King,
            Piece::Bishop,
            Piece::Knight,
            Piece::Rook,
        ];
        for (file, piece) in back_rank.iter().enumerate() {
            board.set_piece(Square::new(0, file), Color::White, *piece);
            board.set_piece(Square::new(7, file), Color::Black, *piece);
            board.set_piece(Square::new(1, file), Color::White, Piece::Pawn);
            board.set_piece(Square::new(6, file), Color::Black, Piece::Pawn);
        }
        board.castling = CASTLE_WHITE_K | CASTLE_WHITE_Q | CASTLE_BLACK_K | CASTLE_BLACK_Q;
        board.recompute_hashes();
        board
    }

    pub(crate) fn empty() -> Self {
        Board {
            pieces: [[SquareSet::EMPTY; 6]; 2],
            occupied: [SquareSet::EMPTY; 2],
            all_occupied: SquareSet::EMPTY,
            stm: Color::White,
            castling: 0,
            en_passant: None,
            halfmove_clock: 0,
            fullmove: 1,
            hash: 0,
            pawn_king_hash: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn side_to_move(&self) -> Color {
        self.stm
    }

    #[inline]
    #[must_use]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Hash of the pawn and king placement only; the refresh-cache key.
    #[inline]
    #[must_use]
    pub fn pawn_king_hash(&self) -> u64 {
        self.pawn_king_hash
    }

    #[inline]
    #[must_use]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    #[inline]
    #[must_use]
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    #[inline]
    #[must_use]
    pub fn pieces_of(&self, color: Color, piece: Piece) -> SquareSet {
        self.pieces[color.index()][piece.index()]
    }

    #[inline]
    #[must_use]
    pub fn occupied_by(&self, color: Color) -> SquareSet {
        self.occupied[color.index()]
    }

    #[inline]
    #[must_use]
    pub fn occupied(&self) -> SquareSet {
        self.all_occupied
    }

    #[inline]
    #[must_use]
    pub fn king_square(&self, color: Color) -> Square {
        self.pieces_of(color, Piece::King)
            .first()
            .expect("position without a king")
    }

    #[must_use]
    pub fn piece_at(&self, sq: Square) -> Option<(Color, Piece)> {
        if !self.all_occupied.contains(sq) {
            return None;
        }
        let color = if self.occupied[0].contains(sq) {
            Color::White
        } else {
            Color::Black
        };
        for piece in ALL_PIECES {
            if self.pieces_of(color, piece).contains(sq) {
                return Some((color, piece));
            }
        }
        None
    }

    #[inline]
    #[must_use]
    pub fn piece_on(&self, sq: Square) -> Option<Piece> {
        self.piece_at(sq).map(|(_, piece)| piece)
    }

    pub(crate) fn set_piece(&mut self, sq: Square, color: Color, piece: Piece) {
        let bit = SquareSet::of(sq);
        self.pieces[color.index()][piece.index()] |= bit;
        self.occupied[color.index()] |= bit;
        self.all_occupied |= bit;

        let key = ZOBRIST.piece_keys[color.index()][piece.index()][sq.index()];
        self.hash ^= key;
        if matches!(piece, Piece::Pawn | Piece::King) {
            self.pawn_king_hash ^= key;
        }
    }

    pub(crate) fn remove_piece(&mut self, sq: Square, color: Color, piece: Piece) {
        let bit = SquareSet::of(sq);
        self.pieces[color.index()][piece.index()] &= !bit;
        self.occupied[color.index()] &= !bit;
        self.all_occupied &= !bit;

        let key = ZOBRIST.piece_keys[color.index()][piece.index()][sq.index()];
        self.hash ^= key;
        if matches!(piece, Piece::Pawn | Piece::King) {
            self.pawn_king_hash ^= key;
        }
    }

    /// Recompute both cached hashes from the piece placement and state
    /// fields. Used after FEN parsing and mirroring; `apply` maintains
    /// the hashes incrementally.
    pub(crate) fn recompute_hashes(&mut self) {
        let mut hash = 0u64;
        let mut pawn_king = 0u64;
        for color in [Color::White, Color::Black] {
            for piece in ALL_PIECES {
                for sq in self.pieces_of(color, piece) {
                    let key = ZOBRIST.piece_keys[color.index()][piece.index()][sq.index()];
                    hash ^= key;
                    if matches!(piece, Piece::Pawn | Piece::King) {
                        pawn_king ^= key;
                    }
                }
            }
        }
        if self.stm == Color::Black {
            hash ^= ZOBRIST.side_key;
        }
        hash ^= ZOBRIST.castling_hash(self.castling);
        if let Some(ep) = self.en_passant {
            hash ^= ZOBRIST.en_passant_keys[ep.file()];
        }
        self.hash = hash;
        self.pawn_king_hash = pawn_king;
    }

    /// All pieces of either color attacking `sq`, given an occupancy
    /// (which may differ from the board's, as in exchange evaluation).
    #[must_use]
    pub fn attackers_of(&self, sq: Square, occupancy: SquareSet) -> SquareSet {
        let knights = self.pieces_of(Color::White, Piece::Knight)
            | self.pieces_of(Color::Black, Piece::Knight);
        let kings =
            self.pieces_of(Color::White, Piece::King) | self.pieces_of(Color::Black, Piece::King);
        let diag = self.diagonal_sliders();
        let straight = self.straight_sliders();

        let mut attackers = SquareSet::EMPTY;
        attackers |= pawn_attacks(Color::Black, sq) & self.pieces_of(Color::White, Piece::Pawn);
        attackers |= pawn_attacks(Color::White, sq) & self.pieces_of(Color::Black, Piece::Pawn);
        attackers |= knight_attacks(sq) & knights;
        attackers |= king_attacks(sq) & kings;
        attackers |= bishop_attacks(sq, occupancy) & diag;
        attackers |= rook_attacks(sq, occupancy) & straight;
        attackers
    }

    /// Is `sq` attacked by any piece of `by`?
    #[must_use]
    pub fn is_attacked(&self, sq: Square, by: Color) -> bool {
        if (pawn_attacks(by.them(), sq) & self.pieces_of(by, Piece::Pawn)).any() {
            return true;
        }
        if (knight_attacks(sq) & self.pieces_of(by, Piece::Knight)).any() {
            return true;
        }
        if (king_attacks(sq) & self.pieces_of(by, Piece::King)).any() {
            return true;
        }
        let diag = self.pieces_of(by, Piece::Bishop) | self.pieces_of(by, Piece::Queen);
        if (bishop_attacks(sq, self.all_occupied) & diag).any() {
            return true;
        }
        let straight = self.pieces_of(by, Piece::Rook) | self.pieces_of(by, Piece::Queen);
        (rook_attacks(sq, self.all_occupied) & straight).any()
    }

    /// Is the side to move in check?
    #[inline]
    #[must_use]
    pub fn in_check(&self) -> bool {
        self.is_attacked(self.king_square(self.stm), self.stm.them())
    }

    #[inline]
    pub(crate) fn diagonal_sliders(&self) -> SquareSet {
        self.pieces_of(Color::White, Piece::Bishop)
            | self.pieces_of(Color::White, Piece::Queen)
            | self.pieces_of(Color::Black, Piece::Bishop)
            | self.pieces_of(Color::Black, Piece::Queen)
    }

    #[inline]
    pub(crate) fn straight_sliders(&self) -> SquareSet {
        self.pieces_of(Color::White, Piece::Rook)
            | self.pieces_of(Color::White, Piece::Queen)
            | self.pieces_of(Color::Black, Piece::Rook)
            | self.pieces_of(Color::Black, Piece::Queen)
    }

    /// Does `color` have anything besides pawns and the king? Gates
    /// null-move pruning, which is unsound in pawn endgames.
    #[must_use]
    pub fn has_non_pawn_material(&self, color: Color) -> bool {
        (self.pieces_of(color, Piece::Knight)
            | self.pieces_of(color, Piece::Bishop)
            | self.pieces_of(color, Piece::Rook)
            | self.pieces_of(color, Piece::Queen))
        .any()
    }

    /// Fifty-move rule.
    #[inline]
    #[must_use]
    pub fn is_halfmove_draw(&self) -> bool {
        self.halfmove_clock >= 100
    }

    #[must_use]
    pub fn is_insufficient_material(&self) -> bool {
        let majors_or_pawns = self.pieces_of(Color::White, Piece::Pawn)
            | self.pieces_of(Color::Black, Piece::Pawn)
            | self.pieces_of(Color::White, Piece::Rook)
            | self.pieces_of(Color::Black, Piece::Rook)
            | self.pieces_of(Color::White, Piece::Queen)
            | self.pieces_of(Color::Black, Piece::Queen);
        if majors_or_pawns.any() {
            return false;
        }

        let bishops = self.pieces_of(Color::White, Piece::Bishop)
            | self.pieces_of(Color::Black, Piece::Bishop);
        let knights = self.pieces_of(Color::White, Piece::Knight)
            | self.pieces_of(Color::Black, Piece::Knight);
        let minors = (bishops | knights).count();

        if minors <= 1 {
            return true;
        }
        // Two bishops on the same square color cannot mate either
        if knights.is_empty() && minors == 2 {
            const LIGHT: u64 = 0x55AA_55AA_55AA_55AA;
            let raw = bishops.raw();
            return raw & LIGHT == 0 || raw & !LIGHT == 0;
        }
        false
    }

    /// The position with colors swapped and the board flipped
    /// vertically. An involution; evaluation must be symmetric under it.
    #[must_use]
    pub fn mirrored(&self) -> Board {
        let mut out = Board::empty();
        for color in [Color::White, Color::Black] {
            for piece in ALL_PIECES {
                out.pieces[color.them().index()][piece.index()] =
                    self.pieces_of(color, piece).mirrored();
            }
        }
        out.occupied = [self.occupied[1].mirrored(), self.occupied[0].mirrored()];
        out.all_occupied = self.all_occupied.mirrored();
        out.stm = self.stm.them();
        out.castling = ((self.castling & 0b0011) << 2) | ((self.castling & 0b1100) >> 2);
        out.en_passant = self.en_passant.map(Square::mirrored);
        out.halfmove_clock = self.halfmove_clock;
        out.fullmove = self.fullmove;
        out.recompute_hashes();
        out
    }

    /// Count leaf positions of the legal move tree to `depth`.
    #[must_use]
    pub fn perft(&self, depth: usize) -> u64 {
        if depth == 0 {
            return 1;
        }
        let moves = self.generate_moves();
        if depth == 1 {
            return moves.len() as u64;
        }
        let mut nodes = 0;
        for &mv in &moves {
            nodes += self.apply(mv).perft(depth - 1);
        }
        nodes
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::startpos()
    }
}
