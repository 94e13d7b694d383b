use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              TEXT PRIMARY KEY,
            username        TEXT UNIQUE,
            email           TEXT NOT NULL UNIQUE,
            password        TEXT NOT NULL,
            first_name      TEXT NOT NULL DEFAULT '',
            last_name       TEXT NOT NULL DEFAULT '',
            middle_name     TEXT,
            message         TEXT,
            phone           TEXT UNIQUE,
            is_staff        INTEGER NOT NULL DEFAULT 0,
            is_superuser    INTEGER NOT NULL DEFAULT 0,
            email_verified  INTEGER NOT NULL DEFAULT 0,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS groups (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS permissions (
            id          TEXT PRIMARY KEY,
            codename    TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS user_groups (
            user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            group_id    TEXT NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
            PRIMARY KEY (user_id, group_id)
        );

        CREATE TABLE IF NOT EXISTS user_permissions (
            user_id         TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            permission_id   TEXT NOT NULL REFERENCES permissions(id) ON DELETE CASCADE,
            PRIMARY KEY (user_id, permission_id)
        );

        CREATE TABLE IF NOT EXISTS categories (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            description TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS products (
            id              TEXT PRIMARY KEY,
            name            TEXT NOT NULL,
            description     TEXT NOT NULL,
            image           TEXT,
            category_id     TEXT NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
            price_per_unit  INTEGER NOT NULL,
            created_at      TEXT NOT NULL,
            updated_at      TEXT NOT NULL,
            owner_id        TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            is_published    INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_products_category
            ON products(category_id);
        CREATE INDEX IF NOT EXISTS idx_products_owner
            ON products(owner_id);

        CREATE TABLE IF NOT EXISTS versions (
            id              TEXT PRIMARY KEY,
            version_name    TEXT NOT NULL,
            version_number  TEXT NOT NULL DEFAULT '1.0.0',
            is_current      INTEGER NOT NULL DEFAULT 0,
            product_id      TEXT REFERENCES products(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_versions_product
            ON versions(product_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
