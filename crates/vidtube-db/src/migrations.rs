use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                username    TEXT NOT NULL UNIQUE,
                full_name   TEXT NOT NULL,
                avatar      TEXT,
                password    TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE videos (
                id                  TEXT PRIMARY KEY,
                owner_id            TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                title               TEXT NOT NULL,
                description         TEXT NOT NULL,
                video_public_id     TEXT NOT NULL,
                video_url           TEXT NOT NULL,
                thumbnail_public_id TEXT NOT NULL,
                thumbnail_url       TEXT NOT NULL,
                duration            REAL NOT NULL DEFAULT 0,
                views               INTEGER NOT NULL DEFAULT 0,
                is_published        INTEGER NOT NULL DEFAULT 1,
                created_at          TEXT NOT NULL,
                updated_at          TEXT NOT NULL
            );

            CREATE INDEX idx_videos_owner ON videos(owner_id);

            CREATE TABLE playlists (
                id          TEXT PRIMARY KEY,
                owner_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name        TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE INDEX idx_playlists_owner ON playlists(owner_id);

            CREATE TABLE playlist_videos (
                playlist_id TEXT NOT NULL REFERENCES playlists(id) ON DELETE CASCADE,
                video_id    TEXT NOT NULL REFERENCES videos(id) ON DELETE CASCADE,
                position    INTEGER NOT NULL,
                PRIMARY KEY (playlist_id, video_id)
            );

            CREATE TABLE tweets (
                id          TEXT PRIMARY KEY,
                owner_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE INDEX idx_tweets_owner ON tweets(owner_id);

            CREATE TABLE comments (
                id          TEXT PRIMARY KEY,
                owner_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                video_id    TEXT NOT NULL REFERENCES videos(id) ON DELETE CASCADE,
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE INDEX idx_comments_video ON comments(video_id, created_at);

            -- Like and subscription edges. target_id is polymorphic over target_kind,
            -- so it carries no foreign key; the set invariant is the UNIQUE tuple.
            CREATE TABLE relations (
                id          TEXT PRIMARY KEY,
                subject_id  TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                target_id   TEXT NOT NULL,
                target_kind TEXT NOT NULL
                    CHECK (target_kind IN ('video', 'comment', 'tweet', 'channel')),
                created_at  TEXT NOT NULL,
                UNIQUE (subject_id, target_id, target_kind)
            );

            CREATE INDEX idx_relations_target ON relations(target_id, target_kind);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    if version < 2 {
        info!("Running migration v2 (watch history)");
        conn.execute_batch(
            "
            -- One row per (viewer, video); a repeat view moves watched_at forward.
            CREATE TABLE watch_history (
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                video_id    TEXT NOT NULL REFERENCES videos(id) ON DELETE CASCADE,
                watched_at  TEXT NOT NULL,
                PRIMARY KEY (user_id, video_id)
            );

            CREATE INDEX idx_watch_history_user ON watch_history(user_id, watched_at);

            INSERT INTO schema_version (version) VALUES (2);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
