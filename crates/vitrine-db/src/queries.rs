use crate::Database;
use crate::models::{CategoryRow, ProductRow, UserRow, VersionRow};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

impl Database {
    // -- Users --

    pub fn create_user(&self, user: &UserRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, password, first_name, last_name,
                                    middle_name, message, phone, is_staff, is_superuser,
                                    email_verified, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                rusqlite::params![
                    user.id,
                    user.username,
                    user.email,
                    user.password,
                    user.first_name,
                    user.last_name,
                    user.middle_name,
                    user.message,
                    user.phone,
                    user.is_staff,
                    user.is_superuser,
                    user.email_verified,
                    user.created_at,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn set_user_password(&self, id: &str, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET password = ?1 WHERE id = ?2",
                (password_hash, id),
            )?;
            Ok(())
        })
    }

    pub fn mark_email_verified(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("UPDATE users SET email_verified = 1 WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    pub fn update_profile(
        &self,
        id: &str,
        username: Option<&str>,
        first_name: &str,
        last_name: &str,
        middle_name: Option<&str>,
        message: Option<&str>,
        phone: Option<&str>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET username = ?1, first_name = ?2, last_name = ?3,
                                  middle_name = ?4, message = ?5, phone = ?6
                 WHERE id = ?7",
                rusqlite::params![username, first_name, last_name, middle_name, message, phone, id],
            )?;
            Ok(())
        })
    }

    pub fn delete_user(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    // -- Categories --

    pub fn create_category(&self, id: &str, name: &str, description: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO categories (id, name, description) VALUES (?1, ?2, ?3)",
                (id, name, description),
            )?;
            Ok(())
        })
    }

    /// All categories, always ordered by name ascending.
    pub fn list_categories(&self) -> Result<Vec<CategoryRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, name, description FROM categories ORDER BY name ASC")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(CategoryRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_category(&self, id: &str) -> Result<Option<CategoryRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, name, description FROM categories WHERE id = ?1",
                    [id],
                    |row| {
                        Ok(CategoryRow {
                            id: row.get(0)?,
                            name: row.get(1)?,
                            description: row.get(2)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn delete_category(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM categories WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    pub fn delete_all_categories(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM categories", [])?;
            Ok(())
        })
    }

    // -- Products --

    pub fn create_product(&self, product: &ProductRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO products (id, name, description, image, category_id,
                                       price_per_unit, created_at, updated_at, owner_id,
                                       is_published)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                rusqlite::params![
                    product.id,
                    product.name,
                    product.description,
                    product.image,
                    product.category_id,
                    product.price_per_unit,
                    product.created_at,
                    product.updated_at,
                    product.owner_id,
                    product.is_published,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_product(&self, id: &str) -> Result<Option<ProductRow>> {
        self.with_conn(|conn| query_product(conn, id))
    }

    /// All products, ordered by name ascending.
    pub fn list_products(&self) -> Result<Vec<ProductRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name ASC"
            ))?;
            let rows = stmt
                .query_map([], product_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Updates the mutable fields only — created_at/updated_at are stamped once
    /// at creation and never touched again.
    pub fn update_product(
        &self,
        id: &str,
        name: &str,
        description: &str,
        image: Option<&str>,
        category_id: &str,
        price_per_unit: i64,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE products SET name = ?1, description = ?2, image = ?3,
                                     category_id = ?4, price_per_unit = ?5
                 WHERE id = ?6",
                rusqlite::params![name, description, image, category_id, price_per_unit, id],
            )?;
            Ok(())
        })
    }

    pub fn delete_product(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM products WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    pub fn delete_all_products(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM products", [])?;
            Ok(())
        })
    }

    pub fn count_products(&self) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
            Ok(n)
        })
    }

    // -- Versions --

    /// Inserts a version. Marking it current clears the flag on the product's
    /// other versions in the same transaction, so at most one version per
    /// product is ever current.
    pub fn create_version(&self, version: &VersionRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            if version.is_current {
                if let Some(product_id) = &version.product_id {
                    tx.execute(
                        "UPDATE versions SET is_current = 0 WHERE product_id = ?1",
                        [product_id],
                    )?;
                }
            }
            tx.execute(
                "INSERT INTO versions (id, version_name, version_number, is_current, product_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    version.id,
                    version.version_name,
                    version.version_number,
                    version.is_current,
                    version.product_id,
                ],
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    pub fn get_version(&self, id: &str) -> Result<Option<VersionRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, version_name, version_number, is_current, product_id
                     FROM versions WHERE id = ?1",
                    [id],
                    version_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Updates a version with the same single-current enforcement as creation.
    /// Returns false when the version does not exist.
    pub fn update_version(
        &self,
        id: &str,
        version_name: &str,
        version_number: &str,
        is_current: bool,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let product_id: Option<Option<String>> = tx
                .query_row("SELECT product_id FROM versions WHERE id = ?1", [id], |row| {
                    row.get(0)
                })
                .optional()?;
            let Some(product_id) = product_id else {
                return Ok(false);
            };
            if is_current {
                if let Some(product_id) = &product_id {
                    tx.execute(
                        "UPDATE versions SET is_current = 0 WHERE product_id = ?1 AND id != ?2",
                        rusqlite::params![product_id, id],
                    )?;
                }
            }
            tx.execute(
                "UPDATE versions SET version_name = ?1, version_number = ?2, is_current = ?3
                 WHERE id = ?4",
                rusqlite::params![version_name, version_number, is_current, id],
            )?;
            tx.commit()?;
            Ok(true)
        })
    }

    /// The version flagged current for a product, if any.
    pub fn get_active_version(&self, product_id: &str) -> Result<Option<VersionRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, version_name, version_number, is_current, product_id
                     FROM versions WHERE product_id = ?1 AND is_current = 1
                     LIMIT 1",
                    [product_id],
                    version_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Batch-fetch the current versions for a set of product IDs, so listings
    /// resolve active versions in one query instead of one per product.
    pub fn get_active_versions_for_products(
        &self,
        product_ids: &[String],
    ) -> Result<Vec<VersionRow>> {
        if product_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (1..=product_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT id, version_name, version_number, is_current, product_id
                 FROM versions WHERE is_current = 1 AND product_id IN ({})",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = product_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();

            let rows = stmt
                .query_map(params.as_slice(), version_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_versions_for_product(&self, product_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM versions WHERE product_id = ?1",
                [product_id],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }
}

const PRODUCT_COLUMNS: &str = "id, name, description, image, category_id, price_per_unit, \
                               created_at, updated_at, owner_id, is_published";

fn query_product(conn: &Connection, id: &str) -> Result<Option<ProductRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
    ))?;

    let row = stmt.query_row([id], product_from_row).optional()?;
    Ok(row)
}

fn product_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProductRow> {
    Ok(ProductRow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        image: row.get(3)?,
        category_id: row.get(4)?,
        price_per_unit: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
        owner_id: row.get(8)?,
        is_published: row.get(9)?,
    })
}

fn version_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<VersionRow> {
    Ok(VersionRow {
        id: row.get(0)?,
        version_name: row.get(1)?,
        version_number: row.get(2)?,
        is_current: row.get(3)?,
        product_id: row.get(4)?,
    })
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    // `column` is always a literal from this module, never user input.
    let mut stmt = conn.prepare(&format!(
        "SELECT id, username, email, password, first_name, last_name, middle_name,
                message, phone, is_staff, is_superuser, email_verified, created_at
         FROM users WHERE {column} = ?1"
    ))?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
                password: row.get(3)?,
                first_name: row.get(4)?,
                last_name: row.get(5)?,
                middle_name: row.get(6)?,
                message: row.get(7)?,
                phone: row.get(8)?,
                is_staff: row.get(9)?,
                is_superuser: row.get(10)?,
                email_verified: row.get(11)?,
                created_at: row.get(12)?,
            })
        })
        .optional()?;

    Ok(row)
}
