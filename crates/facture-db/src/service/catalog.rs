//! # Catalog Service
//!
//! Categories, products, stock levels and per-product sales figures.
//!
//! Names are unique (case-insensitive) within their table. Deleting a
//! category that still files products, or a product that appears on an
//! order line, is refused.

use std::sync::Arc;

use chrono::Duration;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{new_id, ServiceResult};
use crate::pool::Database;
use crate::repository::product::ProductStats;
use crate::repository::sales::ProductSales;
use facture_core::validation::{
    normalize_optional, validate_category_name, validate_description, validate_non_negative,
    validate_price_cents, validate_price_range, validate_product_name, validate_report_window,
    validate_search_query, REPORT_DAYS_MAX, REPORT_LIMIT_MAX,
};
use facture_core::{Category, Clock, CoreError, Product, ValidationError};

/// Fields accepted when creating or replacing a category.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Fields accepted when creating or replacing a product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    #[serde(default)]
    pub category_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub stock_quantity: i64,
    #[serde(default)]
    pub low_stock_threshold: i64,
    #[serde(default = "available_by_default")]
    pub is_available: bool,
}

fn available_by_default() -> bool {
    true
}

fn duplicate(field: &str, value: &str) -> ValidationError {
    ValidationError::Duplicate {
        field: field.to_string(),
        value: value.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct CatalogService {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl CatalogService {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        CatalogService { db, clock }
    }

    // =========================================================================
    // Categories
    // =========================================================================

    pub async fn list_categories(&self, active_only: bool) -> ServiceResult<Vec<Category>> {
        let repo = self.db.categories();
        let categories = if active_only {
            repo.list_active().await?
        } else {
            repo.list_all().await?
        };
        Ok(categories)
    }

    pub async fn get_category(&self, id: &str) -> ServiceResult<Category> {
        self.db
            .categories()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Category", id).into())
    }

    pub async fn create_category(&self, input: CategoryInput) -> ServiceResult<Category> {
        let name = input.name.trim().to_string();
        let description = normalize_optional(input.description);
        validate_category_name(&name)?;
        validate_description("description", description.as_deref())?;

        let repo = self.db.categories();
        if repo.name_exists(&name, None).await? {
            return Err(duplicate("name", &name).into());
        }

        let now = self.clock.now();
        let category = Category {
            id: new_id(),
            name,
            description,
            is_active: input.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        repo.insert(&category).await?;

        info!(id = %category.id, name = %category.name, "Category created");
        Ok(category)
    }

    pub async fn update_category(&self, id: &str, input: CategoryInput) -> ServiceResult<Category> {
        let mut category = self.get_category(id).await?;

        let name = input.name.trim().to_string();
        let description = normalize_optional(input.description);
        validate_category_name(&name)?;
        validate_description("description", description.as_deref())?;

        let repo = self.db.categories();
        if repo.name_exists(&name, Some(id)).await? {
            return Err(duplicate("name", &name).into());
        }

        category.name = name;
        category.description = description;
        if let Some(active) = input.is_active {
            category.is_active = active;
        }
        category.updated_at = self.clock.now();
        repo.update(&category).await?;

        Ok(category)
    }

    pub async fn delete_category(&self, id: &str) -> ServiceResult<()> {
        let category = self.get_category(id).await?;
        let repo = self.db.categories();

        let products = repo.count_products(id).await?;
        if products > 0 {
            warn!(id = %id, products = products, "Refusing to delete category with products");
            return Err(CoreError::still_referenced("Category", &category.name, "products").into());
        }

        repo.delete(id).await?;
        info!(id = %id, "Category deleted");
        Ok(())
    }

    // =========================================================================
    // Products
    // =========================================================================

    pub async fn list_products(&self) -> ServiceResult<Vec<Product>> {
        Ok(self.db.products().list_all().await?)
    }

    pub async fn list_available_products(&self) -> ServiceResult<Vec<Product>> {
        Ok(self.db.products().list_available().await?)
    }

    pub async fn get_product(&self, id: &str) -> ServiceResult<Product> {
        self.db
            .products()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", id).into())
    }

    pub async fn search_products(&self, query: &str) -> ServiceResult<Vec<Product>> {
        let query = validate_search_query(query)?;
        Ok(self.db.products().search(&query).await?)
    }

    pub async fn products_by_category(&self, category_id: &str) -> ServiceResult<Vec<Product>> {
        self.get_category(category_id).await?;
        Ok(self.db.products().list_by_category(category_id).await?)
    }

    pub async fn products_by_price(
        &self,
        min_cents: Option<i64>,
        max_cents: Option<i64>,
    ) -> ServiceResult<Vec<Product>> {
        validate_price_range(min_cents, max_cents)?;
        Ok(self.db.products().list_by_price_range(min_cents, max_cents).await?)
    }

    /// Orderable products of one category.
    pub async fn available_products_by_category(&self, category_id: &str) -> ServiceResult<Vec<Product>> {
        self.get_category(category_id).await?;
        Ok(self.db.products().list_available_by_category(category_id).await?)
    }

    /// Products added to the catalog during the last `days` days.
    pub async fn recent_products(&self, days: u32) -> ServiceResult<Vec<Product>> {
        validate_report_window("days", days, REPORT_DAYS_MAX)?;
        let since = self.clock.now() - Duration::days(i64::from(days));
        Ok(self.db.products().list_created_since(since).await?)
    }

    pub async fn low_stock_products(&self) -> ServiceResult<Vec<Product>> {
        Ok(self.db.products().list_low_stock().await?)
    }

    pub async fn out_of_stock_products(&self) -> ServiceResult<Vec<Product>> {
        Ok(self.db.products().list_out_of_stock().await?)
    }

    pub async fn product_stats(&self) -> ServiceResult<ProductStats> {
        Ok(self.db.products().stats().await?)
    }

    // =========================================================================
    // Sales Figures
    // =========================================================================

    /// Top `limit` products by units ordered.
    pub async fn best_selling_products(&self, limit: u32) -> ServiceResult<Vec<ProductSales>> {
        validate_report_window("limit", limit, REPORT_LIMIT_MAX)?;
        let ranking = self.db.sales().best_sellers(limit).await?;
        debug!(limit = limit, rows = ranking.len(), "Best sellers ranked");
        Ok(ranking)
    }

    /// Top `limit` products by HT revenue on PAID orders.
    pub async fn products_by_revenue(&self, limit: u32) -> ServiceResult<Vec<ProductSales>> {
        validate_report_window("limit", limit, REPORT_LIMIT_MAX)?;
        Ok(self.db.sales().top_revenue(limit).await?)
    }

    /// Orders, units and HT revenue recorded for one product.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown product
    pub async fn product_sales(&self, product_id: &str) -> ServiceResult<ProductSales> {
        self.db
            .sales()
            .for_product(product_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", product_id).into())
    }

    // =========================================================================
    // Product Writes
    // =========================================================================

    pub async fn create_product(&self, input: ProductInput) -> ServiceResult<Product> {
        let input = self.check_product_input(input, None).await?;

        let now = self.clock.now();
        let product = Product {
            id: new_id(),
            category_id: input.category_id,
            name: input.name,
            description: input.description,
            price_cents: input.price_cents,
            stock_quantity: input.stock_quantity,
            low_stock_threshold: input.low_stock_threshold,
            is_available: input.is_available,
            created_at: now,
            updated_at: now,
        };
        self.db.products().insert(&product).await?;

        info!(id = %product.id, name = %product.name, price_cents = product.price_cents, "Product created");
        Ok(product)
    }

    /// Replaces every editable field. Lines already on orders keep the
    /// name and price they were created with.
    pub async fn update_product(&self, id: &str, input: ProductInput) -> ServiceResult<Product> {
        let mut product = self.get_product(id).await?;
        let input = self.check_product_input(input, Some(id)).await?;

        product.category_id = input.category_id;
        product.name = input.name;
        product.description = input.description;
        product.price_cents = input.price_cents;
        product.stock_quantity = input.stock_quantity;
        product.low_stock_threshold = input.low_stock_threshold;
        product.is_available = input.is_available;
        product.updated_at = self.clock.now();
        self.db.products().update(&product).await?;

        Ok(product)
    }

    pub async fn delete_product(&self, id: &str) -> ServiceResult<()> {
        let product = self.get_product(id).await?;
        let repo = self.db.products();

        if repo.count_order_lines(id).await? > 0 {
            return Err(CoreError::still_referenced("Product", &product.name, "order lines").into());
        }

        repo.delete(id).await?;
        info!(id = %id, "Product deleted");
        Ok(())
    }

    pub async fn set_product_availability(&self, id: &str, available: bool) -> ServiceResult<Product> {
        self.db
            .products()
            .set_availability(id, available, self.clock.now())
            .await?;
        self.get_product(id).await
    }

    // =========================================================================
    // Stock
    // =========================================================================

    pub async fn set_stock(&self, id: &str, quantity: i64) -> ServiceResult<Product> {
        validate_non_negative("stock_quantity", quantity)?;
        self.db.products().set_stock(id, quantity, self.clock.now()).await?;
        self.get_product(id).await
    }

    pub async fn increase_stock(&self, id: &str, quantity: i64) -> ServiceResult<Product> {
        ensure_positive(quantity)?;
        self.db.products().adjust_stock(id, quantity, self.clock.now()).await?;
        self.get_product(id).await
    }

    /// Takes `quantity` units out of stock.
    ///
    /// ## Errors
    /// - `InsufficientStock` when fewer than `quantity` units are left
    pub async fn reduce_stock(&self, id: &str, quantity: i64) -> ServiceResult<Product> {
        ensure_positive(quantity)?;

        let repo = self.db.products();
        if !repo.adjust_stock(id, -quantity, self.clock.now()).await? {
            let product = self.get_product(id).await?;
            return Err(CoreError::InsufficientStock {
                product: product.name,
                available: product.stock_quantity,
                requested: quantity,
            }
            .into());
        }

        self.get_product(id).await
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Normalizes and validates a product payload, including the
    /// uniqueness of its name and the existence of its category.
    async fn check_product_input(
        &self,
        input: ProductInput,
        exclude_id: Option<&str>,
    ) -> ServiceResult<ProductInput> {
        let name = input.name.trim().to_string();
        let description = normalize_optional(input.description);
        let category_id = normalize_optional(input.category_id);

        validate_product_name(&name)?;
        validate_description("description", description.as_deref())?;
        validate_price_cents(input.price_cents)?;
        validate_non_negative("stock_quantity", input.stock_quantity)?;
        validate_non_negative("low_stock_threshold", input.low_stock_threshold)?;

        if let Some(category_id) = &category_id {
            self.get_category(category_id).await?;
        }
        if self.db.products().name_exists(&name, exclude_id).await? {
            return Err(duplicate("name", &name).into());
        }

        Ok(ProductInput {
            category_id,
            name,
            description,
            ..input
        })
    }
}

fn ensure_positive(quantity: i64) -> Result<(), ValidationError> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::fixtures::{client, harness, product};
    use crate::service::{LineRequest, NewOrder, ServiceError};
    use facture_core::OrderStatus;

    fn category_input(name: &str) -> CategoryInput {
        CategoryInput {
            name: name.to_string(),
            description: None,
            is_active: None,
        }
    }

    #[tokio::test]
    async fn test_category_names_are_unique_ignoring_case() {
        let h = harness().await;
        let catalog = &h.services.catalog;

        catalog.create_category(category_input("Bureau")).await.unwrap();
        let err = catalog.create_category(category_input("  bureau ")).await.unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Core(CoreError::Validation(ValidationError::Duplicate { .. }))
        ));
    }

    #[tokio::test]
    async fn test_category_with_products_cannot_be_deleted() {
        let h = harness().await;
        let catalog = &h.services.catalog;

        let category = catalog.create_category(category_input("Chaises")).await.unwrap();
        let chair = catalog
            .create_product(ProductInput {
                category_id: Some(category.id.clone()),
                name: "Chaise pliante".to_string(),
                description: None,
                price_cents: 2500,
                stock_quantity: 4,
                low_stock_threshold: 1,
                is_available: true,
            })
            .await
            .unwrap();

        let err = catalog.delete_category(&category.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::StillReferenced { .. })));

        catalog.delete_product(&chair.id).await.unwrap();
        catalog.delete_category(&category.id).await.unwrap();
        assert!(catalog.list_categories(false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_product_validation() {
        let h = harness().await;
        let catalog = &h.services.catalog;

        let mut input = ProductInput {
            category_id: None,
            name: "Lampe".to_string(),
            description: None,
            price_cents: 0,
            stock_quantity: 0,
            low_stock_threshold: 0,
            is_available: true,
        };
        assert!(catalog.create_product(input.clone()).await.is_err());

        input.price_cents = 1500;
        input.category_id = Some("missing".to_string());
        let err = catalog.create_product(input.clone()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::NotFound { .. })));

        input.category_id = Some("   ".to_string());
        let lamp = catalog.create_product(input).await.unwrap();
        assert_eq!(lamp.category_id, None);
    }

    #[tokio::test]
    async fn test_stock_adjustments() {
        let h = harness().await;
        let catalog = &h.services.catalog;
        let desk = product(&h, "Bureau chêne", 12000).await;

        let desk = catalog.reduce_stock(&desk.id, 8).await.unwrap();
        assert_eq!(desk.stock_quantity, 2);
        assert_eq!(catalog.low_stock_products().await.unwrap().len(), 1);

        let err = catalog.reduce_stock(&desk.id, 3).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::InsufficientStock {
                available: 2,
                requested: 3,
                ..
            })
        ));

        let desk = catalog.reduce_stock(&desk.id, 2).await.unwrap();
        assert_eq!(desk.stock_quantity, 0);
        assert_eq!(catalog.out_of_stock_products().await.unwrap().len(), 1);

        let desk = catalog.increase_stock(&desk.id, 5).await.unwrap();
        assert_eq!(desk.stock_quantity, 5);

        assert!(catalog.increase_stock(&desk.id, 0).await.is_err());
        assert!(catalog.set_stock(&desk.id, -1).await.is_err());
    }

    #[tokio::test]
    async fn test_search_and_price_filters() {
        let h = harness().await;
        let catalog = &h.services.catalog;
        product(&h, "Stylo bleu", 150).await;
        product(&h, "Stylo rouge", 180).await;
        product(&h, "Cahier 100%", 450).await;

        assert_eq!(catalog.search_products("stylo").await.unwrap().len(), 2);
        assert_eq!(catalog.search_products("100%").await.unwrap().len(), 1);
        assert_eq!(catalog.search_products("").await.unwrap().len(), 3);

        let mid = catalog.products_by_price(Some(160), Some(500)).await.unwrap();
        let names: Vec<_> = mid.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Stylo rouge", "Cahier 100%"]);

        assert!(catalog.products_by_price(Some(500), Some(100)).await.is_err());

        let stats = catalog.product_stats().await.unwrap();
        assert_eq!(stats.total_products, 3);
        assert_eq!(stats.average_price_cents, 260);
    }

    #[tokio::test]
    async fn test_recent_and_available_by_category() {
        let h = harness().await;
        let catalog = &h.services.catalog;

        let office = catalog.create_category(category_input("Bureau")).await.unwrap();
        let mut input = ProductInput {
            category_id: Some(office.id.clone()),
            name: "Agrafeuse".to_string(),
            description: None,
            price_cents: 1500,
            stock_quantity: 3,
            low_stock_threshold: 1,
            is_available: true,
        };
        catalog.create_product(input.clone()).await.unwrap();

        h.clock.advance(Duration::days(10));
        input.name = "Perforatrice".to_string();
        let punch = catalog.create_product(input).await.unwrap();
        catalog.set_product_availability(&punch.id, false).await.unwrap();
        product(&h, "Gomme", 80).await;

        let recent = catalog.recent_products(7).await.unwrap();
        let names: Vec<_> = recent.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Gomme", "Perforatrice"]);
        assert_eq!(catalog.recent_products(30).await.unwrap().len(), 3);
        assert!(catalog.recent_products(0).await.is_err());

        let available = catalog.available_products_by_category(&office.id).await.unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].name, "Agrafeuse");
        assert_eq!(catalog.products_by_category(&office.id).await.unwrap().len(), 2);

        let err = catalog.available_products_by_category("missing").await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_sales_figures() {
        let h = harness().await;
        let catalog = &h.services.catalog;
        let orders = &h.services.orders;
        let alice = client(&h, "alice@example.fr").await;
        let pen = product(&h, "Stylo", 500).await;
        let pad = product(&h, "Bloc-notes", 1000).await;
        let lamp = product(&h, "Lampe", 2000).await;

        let order = |lines: Vec<(&str, i64)>| NewOrder {
            client_id: alice.id.clone(),
            tax_rate_bps: None,
            comment: None,
            lines: lines
                .into_iter()
                .map(|(product_id, quantity)| LineRequest {
                    product_id: product_id.to_string(),
                    quantity,
                })
                .collect(),
        };

        let paid = orders
            .create_order_with_lines(order(vec![(pen.id.as_str(), 4), (pad.id.as_str(), 1)]))
            .await
            .unwrap();
        orders.change_status(&paid.order.id, OrderStatus::Paid).await.unwrap();
        orders
            .create_order_with_lines(order(vec![(pen.id.as_str(), 2)]))
            .await
            .unwrap();

        let best = catalog.best_selling_products(10).await.unwrap();
        assert_eq!(best.len(), 2);
        assert_eq!(best[0].product_name, "Stylo");
        assert_eq!(best[0].units_sold, 6);
        assert_eq!(best[0].order_count, 2);
        assert_eq!(best[0].revenue_cents, 3000);
        assert_eq!(best[1].product_name, "Bloc-notes");
        assert_eq!(catalog.best_selling_products(1).await.unwrap().len(), 1);
        assert!(catalog.best_selling_products(0).await.is_err());

        // Only the paid order counts towards revenue.
        let by_revenue = catalog.products_by_revenue(10).await.unwrap();
        let ranked: Vec<_> = by_revenue
            .iter()
            .map(|s| (s.product_name.as_str(), s.revenue_cents))
            .collect();
        assert_eq!(ranked, vec![("Stylo", 2000), ("Bloc-notes", 1000)]);

        let pen_sales = catalog.product_sales(&pen.id).await.unwrap();
        assert_eq!((pen_sales.order_count, pen_sales.units_sold), (2, 6));

        let lamp_sales = catalog.product_sales(&lamp.id).await.unwrap();
        assert_eq!(lamp_sales.order_count, 0);
        assert_eq!(lamp_sales.units_sold, 0);
        assert_eq!(lamp_sales.revenue_cents, 0);

        let err = catalog.product_sales("ghost").await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::NotFound { .. })));
    }
}
