//! Single-leg generation: which checkers can move by one die.

use crate::board::{absolute, relative};
use crate::{BackgammonBoard, Leg, Location};
use strictly_rules::Color;

/// Every leg `color` can play with `die` on `board`.
///
/// While `color` has checkers on the bar only entry legs are produced. Hit
/// metadata is filled in.
pub(crate) fn legs_for_die(board: &BackgammonBoard, color: Color, die: u8) -> Vec<Leg> {
    if board.bar(color) > 0 {
        let entry = absolute(color, 25 - die);
        return if board.is_open(color, entry) {
            vec![mark_hit(board, color, Leg::new(Location::Bar, Location::Point(entry), die))]
        } else {
            Vec::new()
        };
    }

    let bearing_off = board.all_home(color);
    let mut legs = Vec::new();
    for point in 1..=24u8 {
        if !board.point(point).is_held_by(color) {
            continue;
        }
        let distance = relative(color, point);
        if distance > die {
            let target = absolute(color, distance - die);
            if board.is_open(color, target) {
                legs.push(mark_hit(
                    board,
                    color,
                    Leg::new(Location::Point(point), Location::Point(target), die),
                ));
            }
        } else if bearing_off
            && (distance == die || !board.has_checker_behind(color, point))
        {
            legs.push(Leg::new(Location::Point(point), Location::Off, die));
        }
    }
    legs
}

fn mark_hit(board: &BackgammonBoard, color: Color, leg: Leg) -> Leg {
    let hit = match leg.to {
        Location::Point(n) => board.point(n).is_held_by(color.opponent()),
        _ => false,
    };
    Leg { hit, ..leg }
}
