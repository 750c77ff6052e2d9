use std::sync::Arc;

use bigdecimal::BigDecimal;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::cart::Cart;
use crate::domain::errors::BackendError;
use crate::domain::order::{NewOrder, NewOrderItem, OrderStatus, ShippingForm};
use crate::domain::ports::OrderStore;
use crate::domain::session::SessionUser;

use super::cart_store::CartStore;

/// Which backend write of the sequence failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStep {
    OrderHeader,
    OrderItems,
    StatusTransition,
}

impl std::fmt::Display for WriteStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            WriteStep::OrderHeader => "order header insert",
            WriteStep::OrderItems => "order items insert",
            WriteStep::StatusTransition => "status transition",
        })
    }
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Sign in to complete your purchase")]
    AuthenticationRequired,

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// A backend write failed partway through. `order_id` is set once the
    /// header exists, so the stranded order can be traced.
    #[error("Checkout failed at {step}: {source}")]
    Write {
        step: WriteStep,
        order_id: Option<Uuid>,
        source: BackendError,
    },
}

/// What the caller gets back after a successful submission.
#[derive(Debug, Clone)]
pub struct CheckoutReceipt {
    pub order_id: Uuid,
    pub subtotal: BigDecimal,
    pub shipping_fee: BigDecimal,
    pub total: BigDecimal,
    pub status: OrderStatus,
}

/// Read-only view of what a submission would charge right now.
#[derive(Debug, Clone)]
pub struct OrderSummary {
    pub cart: Cart,
    pub subtotal: BigDecimal,
    pub shipping_fee: BigDecimal,
    pub total: BigDecimal,
}

/// Turns a session's cart into a persisted order.
///
/// The backend writes are an ordered, non-atomic sequence: header, items,
/// status transition. A failure stops the sequence where it is; completed
/// steps are not compensated, and the cart is only cleared after the whole
/// sequence succeeds. Stranded `pending` headers are logged here and listed
/// for review through the back office.
pub struct CheckoutSequence {
    orders: Arc<dyn OrderStore>,
    carts: Arc<CartStore>,
    shipping_fee: BigDecimal,
}

impl CheckoutSequence {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        carts: Arc<CartStore>,
        shipping_fee: BigDecimal,
    ) -> Self {
        Self {
            orders,
            carts,
            shipping_fee,
        }
    }

    pub fn preview(&self, session: &str) -> OrderSummary {
        let cart = self.carts.snapshot(session);
        let subtotal = cart.total();
        let total = subtotal.clone() + self.shipping_fee.clone();
        OrderSummary {
            cart,
            subtotal,
            shipping_fee: self.shipping_fee.clone(),
            total,
        }
    }

    pub async fn submit(
        &self,
        user: Option<&SessionUser>,
        session: &str,
        form: &ShippingForm,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        let user = user.ok_or(CheckoutError::AuthenticationRequired)?;

        let cart = self.carts.snapshot(session);
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        if let Some(field) = form.missing_field() {
            return Err(CheckoutError::MissingField(field));
        }

        // Amounts are fixed here; the cart can change freely afterwards.
        let subtotal = cart.total();
        let total = subtotal.clone() + self.shipping_fee.clone();

        let order = self
            .orders
            .insert_order(NewOrder {
                user_id: user.id,
                status: OrderStatus::Pending,
                subtotal: subtotal.clone(),
                shipping_fee: self.shipping_fee.clone(),
                total: total.clone(),
                shipping_name: form.full_name(),
                shipping_email: form.email.trim().to_string(),
                shipping_address: form.address.trim().to_string(),
                shipping_city: form.city.trim().to_string(),
                shipping_zip: form.zip.trim().to_string(),
                shipping_country: form.country.trim().to_string(),
            })
            .await
            .map_err(|source| CheckoutError::Write {
                step: WriteStep::OrderHeader,
                order_id: None,
                source,
            })?;

        let items: Vec<NewOrderItem> = cart
            .lines
            .iter()
            .map(|line| NewOrderItem {
                order_id: order.id,
                product_id: line.product_id.clone(),
                product_name: line.name.clone(),
                product_image: line.image.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price.clone(),
            })
            .collect();

        if let Err(source) = self.orders.insert_items(items).await {
            log::error!(
                "Checkout for session {} stranded order {} at the items write: {}",
                session,
                order.id,
                source
            );
            return Err(CheckoutError::Write {
                step: WriteStep::OrderItems,
                order_id: Some(order.id),
                source,
            });
        }

        if let Err(source) = self
            .orders
            .update_status(order.id, OrderStatus::Processing)
            .await
        {
            log::error!(
                "Checkout for session {} left order {} pending at the status transition: {}",
                session,
                order.id,
                source
            );
            return Err(CheckoutError::Write {
                step: WriteStep::StatusTransition,
                order_id: Some(order.id),
                source,
            });
        }

        self.carts.clear(session);

        Ok(CheckoutReceipt {
            order_id: order.id,
            subtotal,
            shipping_fee: self.shipping_fee.clone(),
            total,
            status: OrderStatus::Processing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cart::CartProduct;
    use crate::infrastructure::cart_archive::MemoryCartArchive;
    use crate::infrastructure::memory::{FailurePoint, MemoryBackend};

    fn carts() -> Arc<CartStore> {
        Arc::new(CartStore::new(Arc::new(MemoryCartArchive::default())))
    }

    fn sequence(backend: &Arc<MemoryBackend>, carts: Arc<CartStore>) -> CheckoutSequence {
        CheckoutSequence::new(backend.clone(), carts, BigDecimal::from(75))
    }

    fn product(id: &str, price: i32) -> CartProduct {
        CartProduct {
            product_id: id.to_string(),
            name: format!("Specimen {}", id),
            unit_price: BigDecimal::from(price),
            image: format!("https://img.test/{}.jpg", id),
            origin: "Chile".to_string(),
        }
    }

    fn form() -> ShippingForm {
        ShippingForm {
            email: "ada@example.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            address: "1 Analytical Way".to_string(),
            city: "London".to_string(),
            zip: "N1 9GU".to_string(),
            country: "United Kingdom".to_string(),
        }
    }

    fn user() -> SessionUser {
        SessionUser {
            id: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn submission_without_a_user_writes_nothing() {
        let backend = Arc::new(MemoryBackend::new());
        let carts = carts();
        carts.add_item("s1", &product("a", 100), 1);
        let checkout = sequence(&backend, carts);

        let result = checkout.submit(None, "s1", &form()).await;

        assert!(matches!(result, Err(CheckoutError::AuthenticationRequired)));
        assert!(backend.orders().is_empty());
    }

    #[tokio::test]
    async fn empty_cart_writes_nothing() {
        let backend = Arc::new(MemoryBackend::new());
        let checkout = sequence(&backend, carts());

        let result = checkout.submit(Some(&user()), "s1", &form()).await;

        assert!(matches!(result, Err(CheckoutError::EmptyCart)));
        assert!(backend.orders().is_empty());
    }

    #[tokio::test]
    async fn blank_required_field_writes_nothing() {
        let backend = Arc::new(MemoryBackend::new());
        let carts = carts();
        carts.add_item("s1", &product("a", 100), 1);
        let checkout = sequence(&backend, carts);

        let mut form = form();
        form.zip = String::new();
        let result = checkout.submit(Some(&user()), "s1", &form).await;

        assert!(matches!(result, Err(CheckoutError::MissingField("zip"))));
        assert!(backend.orders().is_empty());
    }

    #[tokio::test]
    async fn successful_submission_persists_and_clears_the_cart() {
        let backend = Arc::new(MemoryBackend::new());
        let carts = carts();
        carts.add_item("s1", &product("a", 100), 2);
        carts.add_item("s1", &product("b", 50), 1);
        let checkout = sequence(&backend, carts.clone());

        let receipt = checkout
            .submit(Some(&user()), "s1", &form())
            .await
            .expect("submit failed");

        assert_eq!(receipt.subtotal, BigDecimal::from(250));
        assert_eq!(receipt.total, BigDecimal::from(325));
        assert_eq!(receipt.status, OrderStatus::Processing);
        assert!(carts.snapshot("s1").is_empty());

        let orders = backend.orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].status, OrderStatus::Processing);
        assert_eq!(orders[0].shipping_name, "Ada Lovelace");
        assert_eq!(backend.items_for(orders[0].id).len(), 2);
    }

    #[tokio::test]
    async fn items_failure_leaves_header_pending_and_cart_intact() {
        let backend = Arc::new(MemoryBackend::new());
        backend.fail_at(FailurePoint::InsertItems);
        let carts = carts();
        carts.add_item("s1", &product("a", 100), 1);
        let checkout = sequence(&backend, carts.clone());

        let result = checkout.submit(Some(&user()), "s1", &form()).await;

        let Err(CheckoutError::Write { step, order_id, .. }) = result else {
            panic!("expected a write failure");
        };
        assert_eq!(step, WriteStep::OrderItems);
        let order_id = order_id.expect("header id should be known");

        let orders = backend.orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, order_id);
        assert_eq!(orders[0].status, OrderStatus::Pending);
        assert!(backend.items_for(order_id).is_empty());
        assert_eq!(carts.snapshot("s1").lines.len(), 1);
    }

    #[tokio::test]
    async fn status_failure_leaves_order_pending_with_items() {
        let backend = Arc::new(MemoryBackend::new());
        backend.fail_at(FailurePoint::UpdateStatus);
        let carts = carts();
        carts.add_item("s1", &product("a", 100), 1);
        let checkout = sequence(&backend, carts.clone());

        let result = checkout.submit(Some(&user()), "s1", &form()).await;

        let Err(CheckoutError::Write { step, order_id, .. }) = result else {
            panic!("expected a write failure");
        };
        assert_eq!(step, WriteStep::StatusTransition);
        let order_id = order_id.expect("header id should be known");

        assert_eq!(backend.orders()[0].status, OrderStatus::Pending);
        assert_eq!(backend.items_for(order_id).len(), 1);
        assert!(!carts.snapshot("s1").is_empty());
    }

    #[tokio::test]
    async fn preview_adds_the_flat_fee_without_writing() {
        let backend = Arc::new(MemoryBackend::new());
        let carts = carts();
        carts.add_item("s1", &product("a", 100), 1);
        let checkout = sequence(&backend, carts);

        let summary = checkout.preview("s1");

        assert_eq!(summary.subtotal, BigDecimal::from(100));
        assert_eq!(summary.shipping_fee, BigDecimal::from(75));
        assert_eq!(summary.total, BigDecimal::from(175));
        assert!(backend.orders().is_empty());
    }
}
