/// Database row types — these map directly to SQLite rows.
/// Distinct from the vitrine-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub username: Option<String>,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub message: Option<String>,
    pub phone: Option<String>,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub email_verified: bool,
    pub created_at: String,
}

pub struct CategoryRow {
    pub id: String,
    pub name: String,
    pub description: String,
}

pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub category_id: String,
    pub price_per_unit: i64,
    pub created_at: String,
    pub updated_at: String,
    pub owner_id: String,
    pub is_published: bool,
}

pub struct VersionRow {
    pub id: String,
    pub version_name: String,
    pub version_number: String,
    pub is_current: bool,
    pub product_id: Option<String>,
}
