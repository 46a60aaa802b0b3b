use std::sync::Arc;

use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use tracing::{error, instrument};
use uuid::Uuid;

use crate::{db::DbPool, entities::inventory_item, errors::ServiceError};

/// Read access to inventory rows. Mutations happen inside the
/// settlement transaction, not here.
#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DbPool>,
}

impl InventoryService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Gets one inventory record by id
    #[instrument(skip(self))]
    pub async fn get_inventory(
        &self,
        id: Uuid,
    ) -> Result<Option<inventory_item::Model>, ServiceError> {
        let db = &*self.db;
        let inventory = inventory_item::Entity::find_by_id(id).one(db).await?;
        Ok(inventory)
    }

    /// Gets the inventory record tracking a product
    #[instrument(skip(self))]
    pub async fn find_by_product(
        &self,
        product_id: Uuid,
    ) -> Result<Option<inventory_item::Model>, ServiceError> {
        let db = &*self.db;
        let inventory = inventory_item::Entity::find()
            .filter(inventory_item::Column::ProductId.eq(product_id))
            .one(db)
            .await?;
        Ok(inventory)
    }

    /// Lists all inventory items with pagination
    #[instrument(skip(self))]
    pub async fn list_inventory(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<inventory_item::Model>, u64), ServiceError> {
        let db = &*self.db;

        let paginator = inventory_item::Entity::find()
            .order_by_asc(inventory_item::Column::CreatedAt)
            .paginate(db, limit);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Database error when counting inventory items");
            ServiceError::InternalError(format!("Failed to count inventory items: {}", e))
        })?;

        let items = paginator.fetch_page(page.saturating_sub(1)).await.map_err(|e| {
            error!(page = %page, limit = %limit, error = %e, "Database error when fetching inventory items");
            ServiceError::InternalError(format!("Failed to fetch inventory items: {}", e))
        })?;

        Ok((items, total))
    }
}
