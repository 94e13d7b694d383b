use vitrine_db::models::ProductRow;
use vitrine_types::api::Claims;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// The single authorization decision for product mutation: only the recorded
/// owner may update or delete a product. Every mutation entry point goes
/// through here rather than re-checking ownership ad hoc.
pub fn authorize_product_mutation(actor: &Claims, product: &ProductRow) -> Decision {
    if product.owner_id == actor.sub.to_string() {
        Decision::Allow
    } else {
        Decision::Deny
    }
}
