//! Checkout: pricing, payment session, order persistence, receipt.
//!
//! The sequence is strict. A payment session is created before anything is
//! persisted; the order write is the commit point; everything after it
//! (receipt mail, cart clear) is best-effort and can never undo the
//! purchase or fail the request.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;

use tangelo_core::{CurrencyCode, Money, OrderId, UserId};

use super::cart::{CartService, ResolvedCartItem};
use super::require_user;
use crate::error::{AppError, Result};
use crate::mail::Mailer;
use crate::models::{Order, OrderLine, User};
use crate::payments::PaymentGateway;
use crate::store::Store;

/// Priced line items and their total, before any side effect.
#[derive(Debug, Clone)]
pub struct CheckoutQuote {
    /// Snapshot line items.
    pub lines: Vec<OrderLine>,
    /// Sum of all line totals.
    pub total: Decimal,
}

/// What the client needs after a completed checkout.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutReceipt {
    /// The persisted order.
    pub order_id: OrderId,
    /// Client-facing secret for confirming the payment session.
    pub client_secret: String,
}

/// Checkout orchestrator.
pub struct CheckoutService<'a> {
    store: &'a dyn Store,
    gateway: &'a dyn PaymentGateway,
    mailer: &'a dyn Mailer,
    currency: CurrencyCode,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(
        store: &'a dyn Store,
        gateway: &'a dyn PaymentGateway,
        mailer: &'a dyn Mailer,
        currency: CurrencyCode,
    ) -> Self {
        Self {
            store,
            gateway,
            mailer,
            currency,
        }
    }

    /// Price the user's cart into snapshot line items and a total.
    ///
    /// Pure over already-loaded data: no side effect, no external call.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if the cart resolves to no items.
    pub async fn quote(&self, user: &User) -> Result<CheckoutQuote> {
        let resolved = CartService::new(self.store).resolve(&user.cart).await?;

        if resolved.items.is_empty() {
            return Err(AppError::InvalidOperation("Cart is empty".to_owned()));
        }

        let lines: Vec<OrderLine> = resolved.items.iter().map(snapshot).collect();
        let total = lines.iter().map(OrderLine::line_total).sum();

        Ok(CheckoutQuote { lines, total })
    }

    /// Run the full checkout sequence for the caller.
    ///
    /// # Errors
    ///
    /// Propagates the empty-cart failure from pricing, surfaces gateway
    /// failures without persisting anything (the cart is untouched so the
    /// user can retry), and fails with a store error only before the order
    /// write succeeds.
    pub async fn checkout(&self, user_id: UserId) -> Result<CheckoutReceipt> {
        let mut user = require_user(self.store, user_id).await?;

        let quote = self.quote(&user).await?;

        // No order may exist without a payment session
        let session = self
            .gateway
            .create_session(&quote.lines, Money::new(quote.total, self.currency))
            .await?;

        let order = Order {
            id: OrderId::generate(),
            user_id: user.id,
            user_email: user.email.clone(),
            lines: quote.lines,
            total: quote.total,
            payment_intent_id: session.id,
            created_at: Utc::now(),
        };
        self.store.save_order(&order).await?;

        // Commit point passed: everything below is best-effort
        if let Err(e) = self.mailer.send_receipt(&user.email, &order).await {
            tracing::warn!(order_id = %order.id, error = %e, "receipt mail failed");
        }

        user.cart.clear();
        if let Err(e) = self.store.save_user(&user).await {
            tracing::error!(order_id = %order.id, error = %e, "cart clear failed after checkout");
        }

        Ok(CheckoutReceipt {
            order_id: order.id,
            client_secret: session.client_secret,
        })
    }

    /// The caller's order history, oldest first.
    pub async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>> {
        let user = require_user(self.store, user_id).await?;
        Ok(self.store.list_orders_for_user(user.id).await?)
    }
}

/// Denormalize one resolved cart item into an order line.
fn snapshot(item: &ResolvedCartItem) -> OrderLine {
    OrderLine {
        product_id: item.product.id,
        name: item.product.name.clone(),
        description: item.product.description.clone(),
        price: item.product.price,
        image_url: item.product.image_url.clone(),
        quantity: item.quantity,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::DateTime;
    use rust_decimal_macros::dec;
    use tangelo_core::Email;

    use crate::mail::MailError;
    use crate::models::Product;
    use crate::payments::{PaymentError, PaymentSession};
    use crate::store::MemoryStore;

    struct FakeGateway {
        fail: bool,
        calls: AtomicUsize,
    }

    impl FakeGateway {
        fn working() -> Self {
            Self {
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PaymentGateway for FakeGateway {
        async fn create_session(
            &self,
            _lines: &[OrderLine],
            _total: Money,
        ) -> std::result::Result<PaymentSession, PaymentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(PaymentError::Api {
                    status: 502,
                    message: "processor down".to_owned(),
                });
            }
            Ok(PaymentSession {
                id: "pi_test".to_owned(),
                client_secret: "pi_test_secret".to_owned(),
            })
        }
    }

    struct NullMailer;

    #[async_trait]
    impl Mailer for NullMailer {
        async fn send_receipt(
            &self,
            _to: &Email,
            _order: &Order,
        ) -> std::result::Result<(), MailError> {
            Ok(())
        }

        async fn send_password_reset(
            &self,
            _to: &Email,
            _token: &str,
            _expires_at: DateTime<Utc>,
        ) -> std::result::Result<(), MailError> {
            Ok(())
        }
    }

    struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send_receipt(
            &self,
            _to: &Email,
            _order: &Order,
        ) -> std::result::Result<(), MailError> {
            Err(MailError::Api {
                status: 500,
                message: "mail down".to_owned(),
            })
        }

        async fn send_password_reset(
            &self,
            _to: &Email,
            _token: &str,
            _expires_at: DateTime<Utc>,
        ) -> std::result::Result<(), MailError> {
            Ok(())
        }
    }

    async fn seed_user(store: &MemoryStore, email: &str) -> User {
        let user = User::new(
            "Test".to_owned(),
            Email::parse(email).unwrap(),
            "hash".to_owned(),
        );
        store.save_user(&user).await.unwrap();
        user
    }

    async fn seed_product(store: &MemoryStore, creator: UserId, name: &str, price: Decimal) -> Product {
        let product = Product::new(
            name.to_owned(),
            format!("{name} description"),
            price,
            None,
            creator,
        );
        store.save_product(&product).await.unwrap();
        product
    }

    /// buyer with cart {P1: price 10 x2, P2: price 5 x1}
    async fn seed_checkout_fixture(store: &MemoryStore) -> (User, Product, Product) {
        let seller = seed_user(store, "seller@x.com").await;
        let mut buyer = seed_user(store, "buyer@x.com").await;
        let p1 = seed_product(store, seller.id, "P1", dec!(10)).await;
        let p2 = seed_product(store, seller.id, "P2", dec!(5)).await;

        buyer.cart.add(p1.id);
        buyer.cart.add(p1.id);
        buyer.cart.add(p2.id);
        store.save_user(&buyer).await.unwrap();

        (buyer, p1, p2)
    }

    #[tokio::test]
    async fn empty_cart_fails_before_the_gateway() {
        let store = MemoryStore::new();
        let buyer = seed_user(&store, "buyer@x.com").await;
        let gateway = FakeGateway::working();
        let service = CheckoutService::new(&store, &gateway, &NullMailer, CurrencyCode::Usd);

        let err = service.checkout(buyer.id).await.unwrap_err();

        assert!(matches!(err, AppError::InvalidOperation(_)));
        assert_eq!(gateway.call_count(), 0);
        assert!(store.list_orders_for_user(buyer.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn checkout_snapshots_cart_and_computes_total() {
        let store = MemoryStore::new();
        let (buyer, p1, p2) = seed_checkout_fixture(&store).await;
        let gateway = FakeGateway::working();
        let service = CheckoutService::new(&store, &gateway, &NullMailer, CurrencyCode::Usd);

        let receipt = service.checkout(buyer.id).await.unwrap();
        assert_eq!(receipt.client_secret, "pi_test_secret");

        let orders = store.list_orders_for_user(buyer.id).await.unwrap();
        assert_eq!(orders.len(), 1);
        let order = &orders[0];

        assert_eq!(order.id, receipt.order_id);
        assert_eq!(order.total, dec!(25));
        assert_eq!(order.payment_intent_id, "pi_test");
        assert_eq!(order.user_email, buyer.email);
        assert_eq!(order.lines.len(), 2);

        let l1 = order.lines.iter().find(|l| l.product_id == p1.id).unwrap();
        assert_eq!((l1.price, l1.quantity), (dec!(10), 2));
        let l2 = order.lines.iter().find(|l| l.product_id == p2.id).unwrap();
        assert_eq!((l2.price, l2.quantity), (dec!(5), 1));

        // cart cleared only after the order is durable
        let stored = store.find_user(buyer.id).await.unwrap().unwrap();
        assert!(stored.cart.is_empty());
    }

    #[tokio::test]
    async fn order_snapshot_survives_later_product_edits() {
        let store = MemoryStore::new();
        let (buyer, p1, _) = seed_checkout_fixture(&store).await;
        let gateway = FakeGateway::working();
        let service = CheckoutService::new(&store, &gateway, &NullMailer, CurrencyCode::Usd);

        service.checkout(buyer.id).await.unwrap();

        let mut edited = store.find_product(p1.id).await.unwrap().unwrap();
        edited.price = dec!(999);
        edited.name = "Renamed".to_owned();
        store.save_product(&edited).await.unwrap();

        let orders = store.list_orders_for_user(buyer.id).await.unwrap();
        let line = orders[0].lines.iter().find(|l| l.product_id == p1.id).unwrap();
        assert_eq!(line.price, dec!(10));
        assert_eq!(line.name, "P1");
    }

    #[tokio::test]
    async fn gateway_failure_leaves_no_order_and_a_full_cart() {
        let store = MemoryStore::new();
        let (buyer, _, _) = seed_checkout_fixture(&store).await;
        let gateway = FakeGateway::failing();
        let service = CheckoutService::new(&store, &gateway, &NullMailer, CurrencyCode::Usd);

        let err = service.checkout(buyer.id).await.unwrap_err();
        assert!(matches!(err, AppError::Gateway(_)));

        assert!(store.list_orders_for_user(buyer.id).await.unwrap().is_empty());
        let stored = store.find_user(buyer.id).await.unwrap().unwrap();
        assert_eq!(stored.cart.items().len(), 2);
    }

    #[tokio::test]
    async fn mail_failure_after_commit_does_not_fail_checkout() {
        let store = MemoryStore::new();
        let (buyer, _, _) = seed_checkout_fixture(&store).await;
        let gateway = FakeGateway::working();
        let service = CheckoutService::new(&store, &gateway, &FailingMailer, CurrencyCode::Usd);

        let receipt = service.checkout(buyer.id).await.unwrap();

        let orders = store.list_orders_for_user(buyer.id).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, receipt.order_id);

        let stored = store.find_user(buyer.id).await.unwrap().unwrap();
        assert!(stored.cart.is_empty());
    }

    #[tokio::test]
    async fn cart_of_only_deleted_products_counts_as_empty() {
        let store = MemoryStore::new();
        let seller = seed_user(&store, "seller@x.com").await;
        let mut buyer = seed_user(&store, "buyer@x.com").await;
        let product = seed_product(&store, seller.id, "Gone", dec!(10)).await;

        buyer.cart.add(product.id);
        store.save_user(&buyer).await.unwrap();
        store.delete_product(product.id).await.unwrap();

        let gateway = FakeGateway::working();
        let service = CheckoutService::new(&store, &gateway, &NullMailer, CurrencyCode::Usd);

        let err = service.checkout(buyer.id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidOperation(_)));
        assert_eq!(gateway.call_count(), 0);
    }
}
