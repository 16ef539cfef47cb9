//! Database schema and migrations for TASKBOARD.
//!
//! Migrations are applied in order; the `schema_version` table records
//! which ones have run. Timestamps are milliseconds since the Unix epoch and
//! a NULL `delete_at` marks an active row.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: Boards and blocks
    r#"
CREATE TABLE boards (
    id                  TEXT PRIMARY KEY,
    team_id             TEXT NOT NULL,
    channel_id          TEXT,
    created_by          TEXT NOT NULL,
    modified_by         TEXT NOT NULL,
    board_type          TEXT NOT NULL DEFAULT 'O',   -- 'O' open, 'P' private
    minimum_role        TEXT NOT NULL DEFAULT '',    -- '', 'viewer', 'commenter', 'editor'
    title               TEXT NOT NULL DEFAULT '',
    description         TEXT NOT NULL DEFAULT '',
    icon                TEXT NOT NULL DEFAULT '',
    show_description    INTEGER NOT NULL DEFAULT 0,
    is_template         INTEGER NOT NULL DEFAULT 0,
    template_version    INTEGER NOT NULL DEFAULT 0,
    properties          TEXT NOT NULL DEFAULT '{}',
    card_properties     TEXT NOT NULL DEFAULT '[]',
    create_at           INTEGER NOT NULL,
    update_at           INTEGER NOT NULL,
    delete_at           INTEGER
);

CREATE INDEX idx_boards_team_id ON boards(team_id, is_template);
CREATE INDEX idx_boards_channel_id ON boards(channel_id);

CREATE TABLE blocks (
    id              TEXT PRIMARY KEY,
    parent_id       TEXT,
    board_id        TEXT NOT NULL REFERENCES boards(id),
    created_by      TEXT NOT NULL,
    modified_by     TEXT NOT NULL,
    schema          INTEGER NOT NULL DEFAULT 1,
    block_type      TEXT NOT NULL,
    title           TEXT NOT NULL DEFAULT '',
    fields          TEXT NOT NULL DEFAULT '{}',
    create_at       INTEGER NOT NULL,
    update_at       INTEGER NOT NULL,
    delete_at       INTEGER
);

CREATE INDEX idx_blocks_board_id ON blocks(board_id, parent_id);
"#,
    // v2: Explicit board membership with the four scheme flags
    r#"
CREATE TABLE board_members (
    board_id            TEXT NOT NULL REFERENCES boards(id),
    user_id             TEXT NOT NULL,
    roles               TEXT NOT NULL DEFAULT '',
    scheme_admin        INTEGER NOT NULL DEFAULT 0,
    scheme_editor       INTEGER NOT NULL DEFAULT 0,
    scheme_commenter    INTEGER NOT NULL DEFAULT 0,
    scheme_viewer       INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (board_id, user_id)
);

CREATE INDEX idx_board_members_user_id ON board_members(user_id);
"#,
    // v3: Sharing tokens and sidebar categories
    r#"
CREATE TABLE sharing (
    board_id        TEXT PRIMARY KEY REFERENCES boards(id),
    enabled         INTEGER NOT NULL DEFAULT 0,
    token           TEXT NOT NULL,
    modified_by     TEXT NOT NULL,
    update_at       INTEGER NOT NULL
);

CREATE TABLE categories (
    id              TEXT PRIMARY KEY,
    name            TEXT NOT NULL,
    user_id         TEXT NOT NULL,
    team_id         TEXT NOT NULL,
    create_at       INTEGER NOT NULL,
    update_at       INTEGER NOT NULL,
    delete_at       INTEGER
);

CREATE INDEX idx_categories_user_team ON categories(user_id, team_id);

CREATE TABLE category_boards (
    user_id         TEXT NOT NULL,
    category_id     TEXT NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
    board_id        TEXT NOT NULL REFERENCES boards(id),
    create_at       INTEGER NOT NULL,
    PRIMARY KEY (user_id, board_id)
);

CREATE INDEX idx_category_boards_category_id ON category_boards(category_id);
"#,
];
