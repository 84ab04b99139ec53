//! Authorization policy for boards and pins.
//!
//! Pure decisions over freshly loaded records; nothing here is cached
//! between requests.
//!
//! | Action                 | Owner | Collaborator | Pin creator | Anyone else |
//! |------------------------|-------|--------------|-------------|-------------|
//! | read board / its pins  | yes   | yes          | -           | no          |
//! | add pin to board       | yes   | yes          | -           | no          |
//! | update / delete board  | yes   | no           | -           | no          |
//! | update / delete pin    | only if creator | only if creator | yes | no   |

use uuid::Uuid;

use crate::database::models::{Board, Pin};

pub fn can_read_board(user_id: Uuid, board: &Board) -> bool {
    board.is_owner(user_id) || board.is_collaborator(user_id)
}

/// Covers update and delete
pub fn can_mutate_board(user_id: Uuid, board: &Board) -> bool {
    board.is_owner(user_id)
}

/// `board` is the pin's board, or `None` when it has been deleted. An
/// orphaned pin stays visible to its creator only.
pub fn can_read_pin(user_id: Uuid, pin: &Pin, board: Option<&Board>) -> bool {
    match board {
        Some(board) => {
            debug_assert_eq!(board.id, pin.board_id);
            can_read_board(user_id, board)
        }
        None => pin.creator_id == user_id,
    }
}

pub fn can_create_pin(user_id: Uuid, board: &Board) -> bool {
    can_read_board(user_id, board)
}

/// Creator only. Owning the board does not grant this.
pub fn can_mutate_pin(user_id: Uuid, pin: &Pin) -> bool {
    pin.creator_id == user_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::PinType;

    struct Fixture {
        owner: Uuid,
        collaborator: Uuid,
        stranger: Uuid,
        board: Board,
    }

    fn fixture() -> Fixture {
        let owner = Uuid::new_v4();
        let collaborator = Uuid::new_v4();
        let board = Board::new(owner, "Research".into(), String::new(), vec![collaborator]);
        Fixture {
            owner,
            collaborator,
            stranger: Uuid::new_v4(),
            board,
        }
    }

    fn pin_by(board: &Board, creator: Uuid) -> Pin {
        Pin::new(
            board.id,
            creator,
            PinType::Link,
            "https://example.com".into(),
            "Note".into(),
            vec![],
        )
    }

    #[test]
    fn owner_has_full_board_access() {
        let f = fixture();
        assert!(can_read_board(f.owner, &f.board));
        assert!(can_mutate_board(f.owner, &f.board));
        assert!(can_create_pin(f.owner, &f.board));
    }

    #[test]
    fn owner_needs_no_collaborator_entry() {
        let f = fixture();
        assert!(!f.board.is_collaborator(f.owner));
        assert!(can_read_board(f.owner, &f.board));
    }

    #[test]
    fn collaborator_reads_but_never_mutates() {
        let f = fixture();
        assert!(can_read_board(f.collaborator, &f.board));
        assert!(can_create_pin(f.collaborator, &f.board));
        assert!(!can_mutate_board(f.collaborator, &f.board));
    }

    #[test]
    fn stranger_has_no_access() {
        let f = fixture();
        assert!(!can_read_board(f.stranger, &f.board));
        assert!(!can_mutate_board(f.stranger, &f.board));
        assert!(!can_create_pin(f.stranger, &f.board));
    }

    #[test]
    fn pin_read_follows_board() {
        let f = fixture();
        let pin = pin_by(&f.board, f.collaborator);
        assert!(can_read_pin(f.owner, &pin, Some(&f.board)));
        assert!(can_read_pin(f.collaborator, &pin, Some(&f.board)));
        assert!(!can_read_pin(f.stranger, &pin, Some(&f.board)));
    }

    #[test]
    fn board_owner_cannot_mutate_collaborators_pin() {
        let f = fixture();
        let pin = pin_by(&f.board, f.collaborator);
        assert!(!can_mutate_pin(f.owner, &pin));
        assert!(can_mutate_pin(f.collaborator, &pin));

        let own = pin_by(&f.board, f.owner);
        assert!(can_mutate_pin(f.owner, &own));
        assert!(!can_mutate_pin(f.collaborator, &own));
    }

    #[test]
    fn orphaned_pin_is_visible_to_creator_only() {
        let f = fixture();
        let pin = pin_by(&f.board, f.collaborator);
        assert!(can_read_pin(f.collaborator, &pin, None));
        assert!(!can_read_pin(f.owner, &pin, None));
    }
}
