//! Backgammon board representation.

use crate::{Leg, Location, Roll};
use serde::{Deserialize, Serialize};
use strictly_rules::Color;

/// Checkers each side owns.
pub const CHECKERS_PER_SIDE: u8 = 15;

/// Occupancy of one point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Color of the checkers on the point, `None` when empty.
    pub owner: Option<Color>,
    /// Number of checkers on the point.
    pub count: u8,
}

impl Point {
    /// A point holding `count` checkers of `owner`.
    pub fn occupied(owner: Color, count: u8) -> Self {
        Self {
            owner: Some(owner),
            count,
        }
    }

    /// Returns true if `color` has checkers here.
    pub fn is_held_by(&self, color: Color) -> bool {
        self.owner == Some(color) && self.count > 0
    }
}

/// Immutable-per-turn backgammon position.
///
/// Besides checker placement the board carries the side to move, the roll
/// being played (`None` between turns) and the number of completed turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgammonBoard {
    points: [Point; 24],
    bar: [u8; 2],
    off: [u8; 2],
    side_to_move: Color,
    dice: Option<Roll>,
    turn: u32,
}

impl BackgammonBoard {
    /// The standard starting position, before the opening roll.
    pub fn standard() -> Self {
        let mut board = Self::empty();
        for (point, count) in [(24, 2), (13, 5), (8, 3), (6, 5)] {
            board.place(Color::White, point, count);
            board.place(Color::Black, 25 - point, count);
        }
        board
    }

    /// A board with no checkers, White to move. Used to build test positions.
    pub fn empty() -> Self {
        Self {
            points: [Point::default(); 24],
            bar: [0; 2],
            off: [0; 2],
            side_to_move: Color::White,
            dice: None,
            turn: 0,
        }
    }

    /// Puts `count` checkers of `color` on `point`, replacing its contents.
    /// Out-of-range points are ignored.
    pub fn place(&mut self, color: Color, point: u8, count: u8) {
        if let Some(slot) = self.slot_mut(point) {
            *slot = if count == 0 {
                Point::default()
            } else {
                Point::occupied(color, count)
            };
        }
    }

    /// Sets the number of `color` checkers on the bar.
    pub fn set_bar(&mut self, color: Color, count: u8) {
        self.bar[color.index()] = count;
    }

    /// Sets the number of `color` checkers borne off.
    pub fn set_off(&mut self, color: Color, count: u8) {
        self.off[color.index()] = count;
    }

    /// Returns this board with `color` to move and `roll` to play.
    pub fn with_roll(mut self, color: Color, roll: Roll) -> Self {
        self.side_to_move = color;
        self.dice = Some(roll);
        self
    }

    /// Point `point` (1..=24); empty for out-of-range numbers.
    pub fn point(&self, point: u8) -> Point {
        self.slot(point).copied().unwrap_or_default()
    }

    /// All points, index 0 holding point 1.
    pub fn points(&self) -> &[Point; 24] {
        &self.points
    }

    /// Checkers of `color` on the bar.
    pub fn bar(&self, color: Color) -> u8 {
        self.bar[color.index()]
    }

    /// Checkers of `color` borne off.
    pub fn off(&self, color: Color) -> u8 {
        self.off[color.index()]
    }

    /// Side to move.
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    /// Roll being played, if any.
    pub fn dice(&self) -> Option<Roll> {
        self.dice
    }

    /// Completed turns. Zero until the opening roll has been played.
    pub fn turn(&self) -> u32 {
        self.turn
    }

    fn slot(&self, point: u8) -> Option<&Point> {
        usize::from(point)
            .checked_sub(1)
            .and_then(|i| self.points.get(i))
    }

    fn slot_mut(&mut self, point: u8) -> Option<&mut Point> {
        usize::from(point)
            .checked_sub(1)
            .and_then(|i| self.points.get_mut(i))
    }

    /// Checkers of `color` on the points.
    pub fn on_points(&self, color: Color) -> u8 {
        self.points
            .iter()
            .filter(|p| p.is_held_by(color))
            .map(|p| p.count)
            .sum()
    }

    /// Pips `color` needs to bear off every checker.
    pub fn pip_count(&self, color: Color) -> u32 {
        let on_points: u32 = (1..=24u8)
            .map(|n| {
                let p = self.point(n);
                if p.is_held_by(color) {
                    u32::from(p.count) * u32::from(relative(color, n))
                } else {
                    0
                }
            })
            .sum();
        on_points + 25 * u32::from(self.bar(color))
    }

    /// Returns true when every checker of `color` still in play is in its
    /// home board, which allows bearing off.
    pub fn all_home(&self, color: Color) -> bool {
        self.bar(color) == 0
            && (1..=24u8)
                .filter(|&n| self.point(n).is_held_by(color))
                .all(|n| relative(color, n) <= 6)
    }

    /// Returns true if `color` may land on `point`: empty, own, or a single
    /// opposing checker.
    pub fn is_open(&self, color: Color, point: u8) -> bool {
        let p = self.point(point);
        p.owner != Some(color.opponent()) || p.count < 2
    }

    /// Returns true if `color` has a checker on a point farther from home
    /// than `point`.
    pub(crate) fn has_checker_behind(&self, color: Color, point: u8) -> bool {
        let distance = relative(color, point);
        (1..=24u8).any(|n| self.point(n).is_held_by(color) && relative(color, n) > distance)
    }

    /// Moves one checker of `color` along `leg`, hitting a lone opposing
    /// checker on the destination. Returns the leg with hit metadata filled in.
    pub(crate) fn apply_leg(&mut self, color: Color, leg: &Leg) -> Leg {
        match leg.from {
            Location::Bar => self.bar[color.index()] = self.bar[color.index()].saturating_sub(1),
            Location::Point(n) => {
                if let Some(slot) = self.slot_mut(n) {
                    slot.count = slot.count.saturating_sub(1);
                    if slot.count == 0 {
                        slot.owner = None;
                    }
                }
            }
            Location::Off => {}
        }

        let mut played = *leg;
        match leg.to {
            Location::Point(n) => {
                let opponent = color.opponent();
                if let Some(slot) = self.slot_mut(n) {
                    played.hit = slot.is_held_by(opponent);
                    if played.hit {
                        *slot = Point::default();
                    }
                    slot.owner = Some(color);
                    slot.count += 1;
                }
                if played.hit {
                    self.bar[opponent.index()] += 1;
                }
            }
            Location::Off => self.off[color.index()] += 1,
            Location::Bar => {}
        }
        played
    }

    /// Clears the roll, hands the move to the opponent and counts the turn.
    pub(crate) fn end_turn(&mut self) {
        self.dice = None;
        self.side_to_move = self.side_to_move.opponent();
        self.turn += 1;
    }

    /// Starts a turn for `color` with `roll`.
    pub(crate) fn start_turn(&mut self, color: Color, roll: Roll) {
        self.side_to_move = color;
        self.dice = Some(roll);
    }

    /// Renders the board as text, point 24 top-left above point 1.
    pub fn display(&self) -> String {
        let cell = |n: u8| {
            let p = self.point(n);
            match p.owner {
                Some(Color::White) if p.count > 0 => format!("{:>3}", format!("W{}", p.count)),
                Some(Color::Black) if p.count > 0 => format!("{:>3}", format!("B{}", p.count)),
                _ => "  .".to_string(),
            }
        };
        let top: String = (13..=24u8).rev().map(cell).collect();
        let bottom: String = (1..=12u8).map(cell).collect();
        format!(
            "{}\n{}\nbar W{} B{}  off W{} B{}  {} to move{}",
            top,
            bottom,
            self.bar(Color::White),
            self.bar(Color::Black),
            self.off(Color::White),
            self.off(Color::Black),
            self.side_to_move,
            self.dice.map(|r| format!(" ({})", r)).unwrap_or_default(),
        )
    }
}

impl Default for BackgammonBoard {
    fn default() -> Self {
        Self::standard()
    }
}

/// Distance of `point` from `color`'s bear-off edge (1 = last point).
pub(crate) fn relative(color: Color, point: u8) -> u8 {
    match color {
        Color::White => point,
        Color::Black => 25 - point,
    }
}

/// Absolute point number for `color`'s relative distance.
pub(crate) fn absolute(color: Color, distance: u8) -> u8 {
    match color {
        Color::White => distance,
        Color::Black => 25 - distance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_setup_counts() {
        let board = BackgammonBoard::standard();
        assert_eq!(board.on_points(Color::White), CHECKERS_PER_SIDE);
        assert_eq!(board.on_points(Color::Black), CHECKERS_PER_SIDE);
        assert_eq!(board.point(24), Point::occupied(Color::White, 2));
        assert_eq!(board.point(1), Point::occupied(Color::Black, 2));
        assert_eq!(board.point(19), Point::occupied(Color::Black, 5));
    }

    #[test]
    fn test_starting_pip_count() {
        let board = BackgammonBoard::standard();
        assert_eq!(board.pip_count(Color::White), 167);
        assert_eq!(board.pip_count(Color::Black), 167);
    }

    #[test]
    fn test_hit_sends_checker_to_bar() {
        let mut board = BackgammonBoard::empty();
        board.place(Color::White, 13, 1);
        board.place(Color::Black, 8, 1);
        let played = board.apply_leg(
            Color::White,
            &Leg::new(Location::Point(13), Location::Point(8), 5),
        );
        assert!(played.hit);
        assert_eq!(board.point(8), Point::occupied(Color::White, 1));
        assert_eq!(board.bar(Color::Black), 1);
        assert_eq!(board.point(13), Point::default());
    }

    #[test]
    fn test_not_home_with_checker_on_bar() {
        let mut board = BackgammonBoard::empty();
        board.place(Color::Black, 20, 14);
        board.set_bar(Color::Black, 1);
        assert!(!board.all_home(Color::Black));
        board.set_bar(Color::Black, 0);
        assert!(board.all_home(Color::Black));
    }
}
