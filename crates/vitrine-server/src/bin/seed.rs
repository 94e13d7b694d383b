//! Operator tool that wipes and reloads the catalog from JSON fixtures.
//! No request-path error handling here: malformed JSON, a product pointing at
//! a category pk that was never loaded, or a missing file all abort the run.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, bail};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use vitrine_db::Database;
use vitrine_db::models::{ProductRow, UserRow};

/// Owner stamped onto fixture products. Carries an unusable password hash,
/// so the account can never log in.
const SEED_OWNER_EMAIL: &str = "seed@vitrine.local";

#[derive(Debug, Deserialize)]
struct CategoryFixture {
    pk: i64,
    fields: CategoryFields,
}

#[derive(Debug, Deserialize)]
struct CategoryFields {
    name: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ProductFixture {
    fields: ProductFields,
}

#[derive(Debug, Deserialize)]
struct ProductFields {
    name: String,
    description: String,
    price_per_unit: i64,
    category: i64,
    image: Option<String>,
    #[serde(default)]
    is_published: bool,
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().init();

    let db_path = std::env::var("VITRINE_DB_PATH").unwrap_or_else(|_| "vitrine.db".into());
    let fixtures_dir =
        PathBuf::from(std::env::var("VITRINE_FIXTURES_DIR").unwrap_or_else(|_| "fixtures".into()));

    let db = Database::open(&PathBuf::from(&db_path))?;

    db.delete_all_products()?;
    db.delete_all_categories()?;

    let owner_id = ensure_seed_owner(&db)?;

    // Categories first; products reference them by fixture pk.
    let path = fixtures_dir.join("category.json");
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    let categories: Vec<CategoryFixture> = serde_json::from_str(&raw)?;

    let mut category_ids: HashMap<i64, String> = HashMap::new();
    for category in &categories {
        let id = Uuid::new_v4().to_string();
        db.create_category(&id, &category.fields.name, &category.fields.description)?;
        category_ids.insert(category.pk, id);
    }
    info!("Loaded {} categories", categories.len());

    let path = fixtures_dir.join("product.json");
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    let products: Vec<ProductFixture> = serde_json::from_str(&raw)?;

    for product in &products {
        let Some(category_id) = category_ids.get(&product.fields.category) else {
            bail!(
                "product '{}' references unknown category {}",
                product.fields.name,
                product.fields.category
            );
        };

        let now = chrono::Utc::now().to_rfc3339();
        db.create_product(&ProductRow {
            id: Uuid::new_v4().to_string(),
            name: product.fields.name.clone(),
            description: product.fields.description.clone(),
            image: product.fields.image.clone(),
            category_id: category_id.clone(),
            price_per_unit: product.fields.price_per_unit,
            created_at: now.clone(),
            updated_at: now,
            owner_id: owner_id.clone(),
            is_published: product.fields.is_published,
        })?;
    }
    info!("Loaded {} products", products.len());

    Ok(())
}

fn ensure_seed_owner(db: &Database) -> anyhow::Result<String> {
    if let Some(user) = db.get_user_by_email(SEED_OWNER_EMAIL)? {
        return Ok(user.id);
    }

    let id = Uuid::new_v4().to_string();
    db.create_user(&UserRow {
        id: id.clone(),
        username: Some("seed".to_string()),
        email: SEED_OWNER_EMAIL.to_string(),
        password: "!".to_string(),
        first_name: "Seed".to_string(),
        last_name: "Loader".to_string(),
        middle_name: None,
        message: None,
        phone: None,
        is_staff: true,
        is_superuser: false,
        email_verified: true,
        created_at: chrono::Utc::now().to_rfc3339(),
    })?;
    Ok(id)
}
