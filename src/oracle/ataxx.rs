//! Ataxx rules: a 7x7 board of expanding/jumping stones where every move
//! flips adjacent enemy stones. Positions are exchanged as ataxx FEN
//! (`x5o/7/7/7/7/7/o5x x 0 1`), moves as `a1` (clone), `a1c3` (jump) or
//! `0000` (pass).

use anyhow::{bail, Result};

use super::{Color, GameStatus, Oracle};

// 49 board squares, square = rank * 7 + file
const ALL: u64 = 0x1_FFFF_FFFF_FFFF;
const NOT_FILE_A: u64 = 0x1_FBF7_EFDF_BF7E;
const NOT_FILE_B: u64 = 0x1_F7EF_DFBF_7EFD;
const NOT_FILE_F: u64 = 0x1_7EFD_FBF7_EFDF;
const NOT_FILE_G: u64 = 0x0_FDFB_F7EF_DFBF;
const NOT_FILE_AB: u64 = NOT_FILE_A & NOT_FILE_B;
const NOT_FILE_FG: u64 = NOT_FILE_F & NOT_FILE_G;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Bitboard(u64);

impl Bitboard {
    fn get(self, sq: u8) -> bool {
        self.0 & (1 << sq) != 0
    }

    fn set(&mut self, sq: u8) {
        self.0 |= 1 << sq;
    }

    fn unset(&mut self, sq: u8) {
        self.0 &= !(1 << sq);
    }

    fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// All squares one king-step away.
    fn singles(self) -> Bitboard {
        let b = self.0;
        let mut moves = 0;
        moves |= (b << 7) & ALL; // north
        moves |= b >> 7; // south
        moves |= (b << 1) & NOT_FILE_A; // east
        moves |= (b >> 1) & NOT_FILE_G; // west
        moves |= (b << 8) & NOT_FILE_A; // north east
        moves |= (b << 6) & NOT_FILE_G; // north west
        moves |= (b >> 6) & NOT_FILE_A; // south east
        moves |= (b >> 8) & NOT_FILE_G; // south west
        Bitboard(moves)
    }

    /// All squares exactly two steps away (jump destinations).
    fn doubles(self) -> Bitboard {
        let b = self.0;
        let mut moves = 0;
        moves |= (b << 12) & NOT_FILE_FG;
        moves |= (b << 13) & NOT_FILE_G;
        moves |= b << 14;
        moves |= (b << 15) & NOT_FILE_A;
        moves |= (b << 16) & NOT_FILE_AB;

        moves |= (b >> 16) & NOT_FILE_FG;
        moves |= (b >> 15) & NOT_FILE_G;
        moves |= b >> 14;
        moves |= (b >> 13) & NOT_FILE_A;
        moves |= (b >> 12) & NOT_FILE_AB;

        moves |= (b << 9) & NOT_FILE_AB;
        moves |= (b << 2) & NOT_FILE_AB;
        moves |= (b >> 5) & NOT_FILE_AB;

        moves |= (b << 5) & NOT_FILE_FG;
        moves |= (b >> 2) & NOT_FILE_FG;
        moves |= (b >> 9) & NOT_FILE_FG;

        Bitboard(moves & ALL)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Move {
    from: u8,
    to: u8,
}

/// The pass move, kept off the board.
const NULL_MOVE: Move = Move { from: 49, to: 49 };

impl Move {
    fn parse(s: &str) -> Result<Move> {
        if s == "0000" {
            return Ok(NULL_MOVE);
        }

        let bytes = s.as_bytes();
        match bytes.len() {
            2 => {
                let to = square(bytes[0], bytes[1])?;
                Ok(Move { from: to, to })
            }
            4 => {
                let from = square(bytes[0], bytes[1])?;
                let to = square(bytes[2], bytes[3])?;
                Ok(Move { from, to })
            }
            _ => bail!("bad ataxx move {s:?}"),
        }
    }

    fn is_single(self) -> bool {
        self.from == self.to
    }
}

fn square(file: u8, rank: u8) -> Result<u8> {
    if !(b'a'..=b'g').contains(&file) || !(b'1'..=b'7').contains(&rank) {
        bail!("square out of board");
    }
    Ok((rank - b'1') * 7 + (file - b'a'))
}

#[derive(Debug, Clone, Default)]
struct Position {
    pieces: [Bitboard; 2],
    gaps: Bitboard,
    turn: usize,
    halfmoves: u32,
    fullmoves: u32,
}

impl Position {
    fn set(&mut self, sq: u8, piece: usize) {
        self.pieces[0].unset(sq);
        self.pieces[1].unset(sq);
        self.gaps.unset(sq);
        match piece {
            0 => self.pieces[0].set(sq),
            1 => self.pieces[1].set(sq),
            2 => self.gaps.set(sq),
            _ => {}
        }
    }

    fn get(&self, sq: u8) -> usize {
        if self.pieces[0].get(sq) {
            0
        } else if self.pieces[1].get(sq) {
            1
        } else if self.gaps.get(sq) {
            2
        } else {
            3
        }
    }

    fn set_fen(&mut self, fen: &str) {
        *self = Position {
            fullmoves: 1,
            ..Position::default()
        };

        let mut fields = fen.split_whitespace();

        if let Some(board) = fields.next() {
            // top rank first
            let mut sq: i32 = 42;
            for c in board.chars() {
                match c {
                    'x' => {
                        self.set(sq as u8, 0);
                        sq += 1;
                    }
                    'o' => {
                        self.set(sq as u8, 1);
                        sq += 1;
                    }
                    '-' => {
                        self.set(sq as u8, 2);
                        sq += 1;
                    }
                    '1'..='7' => sq += c as i32 - '0' as i32,
                    '/' => sq -= 14,
                    _ => {}
                }
            }
        }

        if let Some(turn) = fields.next() {
            self.turn = usize::from(turn != "x");
        }

        if let Some(halfmoves) = fields.next() {
            self.halfmoves = halfmoves.parse().unwrap_or(0);
        }

        if let Some(fullmoves) = fields.next() {
            self.fullmoves = fullmoves.parse().unwrap_or(1);
        }
    }

    fn fen(&self) -> String {
        let mut fen = String::new();

        for rank in (0u8..7).rev() {
            let mut empty = 0;
            for file in 0u8..7 {
                let sq = rank * 7 + file;
                let c = match self.get(sq) {
                    0 => 'x',
                    1 => 'o',
                    2 => '-',
                    _ => {
                        empty += 1;
                        continue;
                    }
                };
                if empty > 0 {
                    fen.push(char::from_digit(empty, 10).unwrap_or('7'));
                    empty = 0;
                }
                fen.push(c);
            }
            if empty > 0 {
                fen.push(char::from_digit(empty, 10).unwrap_or('7'));
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(if self.turn == 0 { 'x' } else { 'o' });
        fen.push_str(&format!(" {} {}", self.halfmoves, self.fullmoves));
        fen
    }

    fn make_move(&mut self, mov: Move) {
        if mov == NULL_MOVE {
            // a pass still ticks the irreversible-move clock
            self.halfmoves += 1;
            self.turn = 1 - self.turn;
            if self.turn == 0 {
                self.fullmoves += 1;
            }
            return;
        }

        let to = Bitboard(1 << mov.to);
        let from = Bitboard(1 << mov.from);
        let neighbours = to.singles().0;

        // move our piece
        self.pieces[self.turn].0 ^= to.0 | from.0;

        // flip captured pieces
        let captured = self.pieces[1 - self.turn].0 & neighbours;
        self.pieces[self.turn].0 ^= captured;
        self.pieces[1 - self.turn].0 ^= captured;

        self.halfmoves += 1;
        if captured != 0 || mov.is_single() {
            self.halfmoves = 0;
        }

        self.turn = 1 - self.turn;
        if self.turn == 0 {
            self.fullmoves += 1;
        }
    }
}

/// Built-in ataxx adjudicator.
#[derive(Debug, Default)]
pub struct AtaxxOracle {
    position: Position,
}

impl Oracle for AtaxxOracle {
    fn initialize(&mut self, fen: &str) {
        self.position.set_fen(fen);
    }

    fn make_move(&mut self, mov: &str) -> Result<()> {
        let mov = Move::parse(mov)?;
        self.position.make_move(mov);
        Ok(())
    }

    fn fen(&self) -> String {
        self.position.fen()
    }

    fn side_to_move(&self) -> Color {
        if self.position.turn == 0 {
            Color::First
        } else {
            Color::Second
        }
    }

    fn result(&self) -> (GameStatus, &'static str) {
        let stm = self.position.turn;
        let xtm = stm ^ 1;

        if self.position.halfmoves >= 100 {
            return (GameStatus::Draw, "50-move Rule");
        }

        if self.position.pieces[stm].0 == 0 {
            return (GameStatus::XtmWins, "Eradication");
        } else if self.position.pieces[xtm].0 == 0 {
            return (GameStatus::StmWins, "Eradication");
        }

        // board full or blocked: most stones wins
        let empty = ALL ^ self.position.pieces[0].0 ^ self.position.pieces[1].0 ^ self.position.gaps.0;
        let both = Bitboard(self.position.pieces[0].0 | self.position.pieces[1].0);
        if (both.singles().0 | both.doubles().0) & empty == 0 {
            let stm_n = self.position.pieces[stm].count();
            let xtm_n = self.position.pieces[xtm].count();

            return match stm_n.cmp(&xtm_n) {
                std::cmp::Ordering::Greater => (GameStatus::StmWins, "Population Count"),
                std::cmp::Ordering::Less => (GameStatus::XtmWins, "Population Count"),
                std::cmp::Ordering::Equal => (GameStatus::Draw, "Population Count"),
            };
        }

        (GameStatus::Ongoing, "")
    }

    fn zero_moves(&self) -> bool {
        self.position.halfmoves == 0
    }
}
