//! Test helpers for integration tests.
//!
//! Provides a populated host directory and an application over an
//! in-memory database.

#![allow(dead_code)]

use std::sync::Arc;

use taskboard::{
    Block, BlockType, Board, BoardType, BoardsAndBlocks, BoardsApp, BoardsConfig, Database,
    MemoryDirectory,
};

pub const TEAM: &str = "team-1";
pub const CHANNEL: &str = "town-square";

/// Directory with one team, one channel and a handful of users.
///
/// - `owner`, `channel-user`, `team-user`: regular team members
/// - `guest`: guest team member, also in the channel
/// - `outsider`: regular user outside the team
pub fn directory() -> Arc<MemoryDirectory> {
    let directory = MemoryDirectory::new();
    for user in ["owner", "channel-user", "team-user", "outsider"] {
        directory.add_user(user).unwrap();
    }
    directory.add_guest("guest").unwrap();
    for user in ["owner", "channel-user", "team-user", "guest"] {
        directory.add_team_member(TEAM, user).unwrap();
    }
    directory.add_channel(CHANNEL, TEAM).unwrap();
    for user in ["channel-user", "guest"] {
        directory.add_channel_member(CHANNEL, user).unwrap();
    }
    Arc::new(directory)
}

/// Application over a fresh in-memory database.
pub async fn app() -> (BoardsApp, Arc<MemoryDirectory>) {
    let directory = directory();
    let db = Database::open_in_memory().await.unwrap();
    let app = BoardsApp::new(db, directory.clone(), BoardsConfig::default());
    (app, directory)
}

/// A board with a card holding two text blocks, plus a view.
pub fn sample_bundle(board_id: &str) -> BoardsAndBlocks {
    let card = format!("{board_id}-card");
    let text_1 = format!("{board_id}-text-1");
    let text_2 = format!("{board_id}-text-2");
    BoardsAndBlocks::new(
        vec![Board::new(board_id, TEAM, format!("Board {board_id}"))],
        vec![
            Block::new(&card, board_id, BlockType::Card, "Card")
                .with_parent(board_id)
                .with_field("contentOrder", serde_json::json!([text_1, text_2])),
            Block::new(&text_1, board_id, BlockType::Text, "First").with_parent(&card),
            Block::new(&text_2, board_id, BlockType::Text, "Second").with_parent(&card),
            Block::new(format!("{board_id}-view"), board_id, BlockType::View, "Table")
                .with_parent(board_id),
        ],
    )
}

/// Create a board owned by `owner` with the given shape.
pub async fn create_board(app: &BoardsApp, board: Board) -> Board {
    let created = app
        .batch()
        .create_boards_and_blocks_with_admin(BoardsAndBlocks::new(vec![board], vec![]), "owner")
        .await
        .unwrap();
    created.boards.into_iter().next().unwrap()
}

/// An open template in the test team.
pub fn open_template(id: &str) -> Board {
    Board::new(id, TEAM, "Template")
        .with_board_type(BoardType::Open)
        .as_template(true)
}

/// Make every write matching `condition` on `table` fail inside SQLite.
pub async fn fail_writes(db: &Database, name: &str, event: &str, table: &str, condition: &str) {
    let sql = format!(
        "CREATE TRIGGER {name} BEFORE {event} ON {table} WHEN {condition}
         BEGIN SELECT RAISE(ABORT, 'forced failure'); END;"
    );
    sqlx::query(&sql).execute(db.pool()).await.unwrap();
}
