//! In-memory store (tests, local development).

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use tienda_auth::{NewUser, User};
use tienda_catalog::{NewProduct, Product, ProductPatch};
use tienda_core::{DomainError, LineItemId, OrderId, ProductId, UserId};
use tienda_orders::{
    LineItem, Order, OrderStatus, PlacedOrder, RequestedLine, price_order,
};

use crate::{Store, StoreError};

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<UserId, User>,
    products: BTreeMap<ProductId, Product>,
    orders: Vec<PlacedOrder>,
    next_user_id: i64,
    next_product_id: i64,
    next_order_id: i64,
    next_line_id: i64,
}

impl State {
    fn alloc(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }
}

/// Process-local [`Store`].
///
/// All state sits behind a single mutex, so every operation — order
/// placement in particular — is trivially atomic and serialized: the lock is
/// taken, validation and pricing run against a consistent snapshot, and
/// mutations happen only after everything has passed. The lock is never held
/// across an await point.
#[derive(Debug, Default)]
pub struct MemStore {
    state: Mutex<State>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("in-memory store poisoned")
    }
}

#[async_trait]
impl Store for MemStore {
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let mut state = self.lock();

        if state.users.values().any(|u| u.username == new.username) {
            return Err(DomainError::conflict("username already exists").into());
        }
        if state.users.values().any(|u| u.email == new.email) {
            return Err(DomainError::conflict("email already exists").into());
        }

        let id = UserId::new(State::alloc(&mut state.next_user_id));
        let user = User {
            id,
            username: new.username,
            email: new.email,
            first_name: new.first_name,
            last_name: new.last_name,
            password_hash: new.password_hash,
            role: new.role,
        };
        state.users.insert(id, user.clone());
        Ok(user)
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let state = self.lock();
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn user_by_identifier(&self, identifier: &str) -> Result<Option<User>, StoreError> {
        let state = self.lock();
        Ok(state
            .users
            .values()
            .find(|u| u.username == identifier)
            .or_else(|| state.users.values().find(|u| u.email == identifier))
            .cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.lock().products.values().cloned().collect())
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.lock().products.get(&id).cloned())
    }

    async fn create_product(&self, new: NewProduct) -> Result<Product, StoreError> {
        let mut state = self.lock();
        let id = ProductId::new(State::alloc(&mut state.next_product_id));
        let product = Product {
            id,
            name: new.name,
            description: new.description,
            category: new.category,
            price: new.price,
            stock: new.stock,
            condition: new.condition,
            image: new.image,
        };
        state.products.insert(id, product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product, StoreError> {
        let mut state = self.lock();
        let current = state
            .products
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("product {id} not found")))?;

        let updated = current.apply_patch(patch)?;
        state.products.insert(id, updated.clone());
        Ok(updated)
    }

    async fn place_order(
        &self,
        user_id: UserId,
        requested: &[RequestedLine],
    ) -> Result<PlacedOrder, StoreError> {
        let mut state = self.lock();

        if !state.users.contains_key(&user_id) {
            return Err(DomainError::not_found(format!("user {user_id} not found")).into());
        }

        // Price against a snapshot; nothing is mutated until this succeeds.
        let snapshot: HashMap<ProductId, Product> = requested
            .iter()
            .filter_map(|l| state.products.get(&l.product_id).cloned())
            .map(|p| (p.id, p))
            .collect();
        let priced = price_order(requested, &snapshot)?;

        let order_id = OrderId::new(State::alloc(&mut state.next_order_id));
        let order = Order {
            id: order_id,
            user_id,
            placed_at: Utc::now(),
            status: OrderStatus::Pending,
            total: priced.total,
        };

        let mut items = Vec::with_capacity(priced.lines.len());
        for line in priced.lines {
            let product = state
                .products
                .get_mut(&line.product_id)
                .expect("priced line references a product from the snapshot");
            product.stock -= line.quantity;

            items.push(LineItem {
                id: LineItemId::new(State::alloc(&mut state.next_line_id)),
                order_id,
                product_id: line.product_id,
                product_name: line.product_name,
                quantity: line.quantity,
                unit_price: line.unit_price,
                subtotal: line.subtotal,
            });
        }

        let placed = PlacedOrder { order, items };
        state.orders.push(placed.clone());

        tracing::debug!(order_id = %order_id, user_id = %user_id, "order placed");
        Ok(placed)
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<PlacedOrder>, StoreError> {
        let state = self.lock();
        let mut orders: Vec<PlacedOrder> = state
            .orders
            .iter()
            .filter(|o| o.order.user_id == user_id)
            .cloned()
            .collect();
        // Most recent first; id breaks ties for same-instant placements.
        orders.sort_by(|a, b| {
            b.order
                .placed_at
                .cmp(&a.order.placed_at)
                .then(b.order.id.cmp(&a.order.id))
        });
        Ok(orders)
    }
}
