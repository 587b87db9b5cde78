//! Content store database schema.

/// SQL to create the sessions table.
pub const CREATE_SESSIONS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS sessions (
    id           UUID PRIMARY KEY,
    owner        TEXT NOT NULL,
    turn_order   JSONB NOT NULL,
    current_turn TEXT NOT NULL,
    act          BIGINT NOT NULL,
    members      JSONB NOT NULL,
    version      BIGINT NOT NULL
);
";

/// SQL to create the characters table.
pub const CREATE_CHARACTERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS characters (
    session_id  UUID NOT NULL,
    owner       TEXT NOT NULL,
    name        TEXT NOT NULL,
    attributes  JSONB NOT NULL,
    is_narrator BOOLEAN NOT NULL,
    PRIMARY KEY (session_id, owner)
);
";

/// SQL to create the messages table. `seq` is the stable key batch
/// deletion orders by and the tie-break for equal timestamps.
pub const CREATE_MESSAGES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS messages (
    id                   UUID PRIMARY KEY,
    session_id           UUID NOT NULL,
    author               TEXT NOT NULL,
    author_name          TEXT NOT NULL,
    author_role          TEXT NOT NULL,
    body                 TEXT NOT NULL,
    is_turn_announcement BOOLEAN NOT NULL,
    is_adventure_start   BOOLEAN NOT NULL,
    created_at           TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    seq                  BIGSERIAL
);

CREATE INDEX IF NOT EXISTS idx_messages_session_created
    ON messages (session_id, created_at DESC, seq DESC);
";

/// SQL to create the invites table.
pub const CREATE_INVITES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS invites (
    id              UUID PRIMARY KEY,
    session_id      UUID NOT NULL,
    sender          TEXT NOT NULL,
    sender_name     TEXT NOT NULL,
    recipient       TEXT NOT NULL,
    recipient_email TEXT NOT NULL,
    status          TEXT NOT NULL,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_invites_recipient_status
    ON invites (recipient, status);
";

/// SQL to create the global character index: which sessions a participant
/// has a real character in.
pub const CREATE_CHARACTER_INDEX_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS character_index (
    participant_id TEXT NOT NULL,
    session_id     UUID NOT NULL,
    PRIMARY KEY (participant_id, session_id)
);
";

/// All schema statements in creation order.
pub const ALL_TABLES: [&str; 5] = [
    CREATE_SESSIONS_TABLE,
    CREATE_CHARACTERS_TABLE,
    CREATE_MESSAGES_TABLE,
    CREATE_INVITES_TABLE,
    CREATE_CHARACTER_INDEX_TABLE,
];
