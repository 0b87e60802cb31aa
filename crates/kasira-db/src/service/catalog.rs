//! # Catalog Service
//!
//! Master-data management: items, members, and suppliers.
//!
//! Item and member codes are claimed from their sequence counters inside
//! the creation transaction, so an aborted create never burns a visible
//! code gap and two concurrent creates never collide.

use chrono::Utc;
use kasira_core::codes::SequenceScope;
use kasira_core::money::Money;
use kasira_core::types::{Item, Member, Supplier};
use kasira_core::validation;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::item::{ItemFilter, ItemRepository};
use crate::repository::member::MemberRepository;
use crate::repository::sequence::SequenceRepository;
use crate::repository::supplier::SupplierRepository;
use crate::service::{begin_immediate, ServiceError, ServiceResult};

// =============================================================================
// Inputs
// =============================================================================

/// Input for creating an item. The code is generated, never supplied.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    pub description: Option<String>,
    pub sell_price: Money,
    /// Opening stock quantity (e.g. initial stocktake). Usually 0; later
    /// stock only moves through paid documents.
    pub opening_stock: i64,
    pub min_stock: i64,
}

/// Input for updating an item's descriptive fields.
#[derive(Debug, Clone)]
pub struct UpdateItem {
    pub name: String,
    pub description: Option<String>,
    pub sell_price: Money,
    pub min_stock: i64,
}

#[derive(Debug, Clone)]
pub struct NewMember {
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewSupplier {
    pub name: String,
    pub contact: Option<String>,
    pub address: Option<String>,
}

// =============================================================================
// Catalog Service
// =============================================================================

/// Service for master-data operations.
#[derive(Debug, Clone)]
pub struct CatalogService {
    pool: SqlitePool,
}

impl CatalogService {
    pub fn new(pool: SqlitePool) -> Self {
        CatalogService { pool }
    }

    // =========================================================================
    // Items
    // =========================================================================

    /// Creates an item with a freshly generated `ITM#####` code.
    pub async fn create_item(&self, input: NewItem) -> ServiceResult<Item> {
        let name = validation::validate_name("name", &input.name)?;
        let description = validation::validate_text("description", input.description.as_deref())?;
        validation::validate_price("sell_price", input.sell_price)?;
        validation::validate_min_stock(input.min_stock)?;
        if input.opening_stock < 0 {
            return Err(kasira_core::ValidationError::MustBePositive {
                field: "opening_stock".to_string(),
            }
            .into());
        }

        let mut tx = begin_immediate(&self.pool).await?;

        let scope = SequenceScope::item();
        let seq = SequenceRepository::claim_with(&mut *tx, &scope).await?;
        let code = scope.format(seq)?;

        let now = Utc::now();
        let item = Item {
            code: code.clone(),
            name,
            description,
            sell_price: input.sell_price.minor(),
            stock: input.opening_stock,
            min_stock: input.min_stock,
            retired_at: None,
            created_at: now,
            updated_at: now,
        };

        ItemRepository::insert_with(&mut *tx, &item)
            .await
            .map_err(|e| map_duplicate(e, &code))?;

        tx.commit().await.map_err(DbError::from)?;

        info!(code = %item.code, name = %item.name, "Item created");
        Ok(item)
    }

    pub async fn get_item(&self, code: &str) -> ServiceResult<Item> {
        Ok(ItemRepository::new(self.pool.clone()).get(code).await?)
    }

    pub async fn list_items(&self, filter: &ItemFilter) -> ServiceResult<Vec<Item>> {
        Ok(ItemRepository::new(self.pool.clone()).list(filter).await?)
    }

    /// Items at or below their minimum-stock threshold.
    pub async fn low_stock_items(&self) -> ServiceResult<Vec<Item>> {
        self.list_items(&ItemFilter {
            low_stock_only: true,
            ..Default::default()
        })
        .await
    }

    pub async fn update_item(&self, code: &str, input: UpdateItem) -> ServiceResult<Item> {
        let name = validation::validate_name("name", &input.name)?;
        let description = validation::validate_text("description", input.description.as_deref())?;
        validation::validate_price("sell_price", input.sell_price)?;
        validation::validate_min_stock(input.min_stock)?;

        let updated = ItemRepository::update_info_with(
            &self.pool,
            code,
            &name,
            description.as_deref(),
            input.sell_price.minor(),
            input.min_stock,
            Utc::now(),
        )
        .await?;

        if !updated {
            return Err(DbError::not_found("Item", code).into());
        }
        self.get_item(code).await
    }

    /// Retires an item: hidden from default listings and rejected on new
    /// document lines. Stock and history are untouched.
    pub async fn retire_item(&self, code: &str) -> ServiceResult<()> {
        let now = Utc::now();
        let updated = ItemRepository::set_retired_with(&self.pool, code, Some(now), now).await?;
        if !updated {
            return Err(DbError::not_found("Item", code).into());
        }
        info!(code, "Item retired");
        Ok(())
    }

    /// Restores a retired item to active.
    pub async fn restore_item(&self, code: &str) -> ServiceResult<()> {
        let updated = ItemRepository::set_retired_with(&self.pool, code, None, Utc::now()).await?;
        if !updated {
            return Err(DbError::not_found("Item", code).into());
        }
        info!(code, "Item restored");
        Ok(())
    }

    /// Permanently deletes an item.
    ///
    /// Refused while any document line references the item; retire instead
    /// when history must be kept.
    pub async fn hard_delete_item(&self, code: &str) -> ServiceResult<()> {
        let deleted = ItemRepository::delete_with(&self.pool, code)
            .await
            .map_err(|e| map_dependents(e, "Item", code))?;

        if !deleted {
            return Err(DbError::not_found("Item", code).into());
        }
        info!(code, "Item deleted");
        Ok(())
    }

    // =========================================================================
    // Members
    // =========================================================================

    /// Creates a member with a freshly generated `MBR#####` code.
    pub async fn create_member(&self, input: NewMember) -> ServiceResult<Member> {
        let name = validation::validate_name("name", &input.name)?;
        let phone = validation::validate_text("phone", input.phone.as_deref())?;
        let address = validation::validate_text("address", input.address.as_deref())?;

        let mut tx = begin_immediate(&self.pool).await?;

        let scope = SequenceScope::member();
        let seq = SequenceRepository::claim_with(&mut *tx, &scope).await?;
        let code = scope.format(seq)?;

        let now = Utc::now();
        let member = Member {
            code: code.clone(),
            name,
            phone,
            address,
            created_at: now,
            updated_at: now,
        };

        MemberRepository::insert_with(&mut *tx, &member)
            .await
            .map_err(|e| map_duplicate(e, &code))?;

        tx.commit().await.map_err(DbError::from)?;

        info!(code = %member.code, "Member created");
        Ok(member)
    }

    pub async fn get_member(&self, code: &str) -> ServiceResult<Member> {
        Ok(MemberRepository::new(self.pool.clone()).get(code).await?)
    }

    pub async fn list_members(&self, search: Option<&str>) -> ServiceResult<Vec<Member>> {
        Ok(MemberRepository::new(self.pool.clone()).list(search).await?)
    }

    pub async fn update_member(&self, code: &str, input: NewMember) -> ServiceResult<Member> {
        let name = validation::validate_name("name", &input.name)?;
        let phone = validation::validate_text("phone", input.phone.as_deref())?;
        let address = validation::validate_text("address", input.address.as_deref())?;

        let updated = MemberRepository::update_with(
            &self.pool,
            code,
            &name,
            phone.as_deref(),
            address.as_deref(),
            Utc::now(),
        )
        .await?;

        if !updated {
            return Err(DbError::not_found("Member", code).into());
        }
        self.get_member(code).await
    }

    /// Permanently deletes a member. Refused while any sale references it.
    pub async fn delete_member(&self, code: &str) -> ServiceResult<()> {
        let deleted = MemberRepository::delete_with(&self.pool, code)
            .await
            .map_err(|e| map_dependents(e, "Member", code))?;

        if !deleted {
            return Err(DbError::not_found("Member", code).into());
        }
        Ok(())
    }

    // =========================================================================
    // Suppliers
    // =========================================================================

    pub async fn create_supplier(&self, input: NewSupplier) -> ServiceResult<Supplier> {
        let name = validation::validate_name("name", &input.name)?;
        let contact = validation::validate_text("contact", input.contact.as_deref())?;
        let address = validation::validate_text("address", input.address.as_deref())?;

        let now = Utc::now();
        let supplier = Supplier {
            id: Uuid::new_v4().to_string(),
            name,
            contact,
            address,
            created_at: now,
            updated_at: now,
        };

        SupplierRepository::insert_with(&self.pool, &supplier).await?;

        info!(id = %supplier.id, "Supplier created");
        Ok(supplier)
    }

    pub async fn get_supplier(&self, id: &str) -> ServiceResult<Supplier> {
        Ok(SupplierRepository::new(self.pool.clone()).get(id).await?)
    }

    pub async fn list_suppliers(&self) -> ServiceResult<Vec<Supplier>> {
        Ok(SupplierRepository::new(self.pool.clone()).list().await?)
    }

    pub async fn update_supplier(&self, id: &str, input: NewSupplier) -> ServiceResult<Supplier> {
        let name = validation::validate_name("name", &input.name)?;
        let contact = validation::validate_text("contact", input.contact.as_deref())?;
        let address = validation::validate_text("address", input.address.as_deref())?;

        let updated = SupplierRepository::update_with(
            &self.pool,
            id,
            &name,
            contact.as_deref(),
            address.as_deref(),
            Utc::now(),
        )
        .await?;

        if !updated {
            return Err(DbError::not_found("Supplier", id).into());
        }
        self.get_supplier(id).await
    }

    /// Permanently deletes a supplier. Refused while any purchase
    /// references it.
    pub async fn delete_supplier(&self, id: &str) -> ServiceResult<()> {
        let deleted = SupplierRepository::delete_with(&self.pool, id)
            .await
            .map_err(|e| map_dependents(e, "Supplier", id))?;

        if !deleted {
            return Err(DbError::not_found("Supplier", id).into());
        }
        Ok(())
    }
}

// =============================================================================
// Error Mapping
// =============================================================================

fn map_duplicate(err: DbError, code: &str) -> ServiceError {
    match err {
        DbError::UniqueViolation { .. } => ServiceError::DuplicateCode {
            code: code.to_string(),
        },
        other => other.into(),
    }
}

fn map_dependents(err: DbError, entity: &str, key: &str) -> ServiceError {
    match err {
        DbError::ForeignKeyViolation { .. } => ServiceError::HasDependents {
            entity: entity.to_string(),
            key: key.to_string(),
        },
        other => other.into(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
