//! Orders Service

use async_trait::async_trait;
use jiff::{Timestamp, tz::TimeZone};
use mockall::automock;
use spareline::{
    cart::{self, Availability, CartLineKey},
    identity::{AuthenticatedUser, Identity, Owner},
    offers::NewOffer,
    orders::{
        self, AssembledOrder, Checkout, ManagerLineSource, ManagerOrderInput, ResolvedManagerLine,
    },
    uuids::{OfferUuid, OrderStatusUuid},
};
use sqlx::{Postgres, Transaction};
use tracing::{Span, debug, info};

use crate::{
    database::Db,
    domain::{
        carts::repositories::{PgCartItemsRepository, PgCartsRepository},
        catalog::repositories::PgProductsRepository,
        identity::repositories::PgUsersRepository,
        offers::repository::{Consumption, PgOffersRepository},
        orders::{
            OrdersServiceError,
            records::{NewOrder, OrderRecord, OrderUuid},
            repositories::{
                PgMethodsRepository, PgOrderNumbersRepository, PgOrderStatusesRepository,
                PgOrdersRepository,
            },
        },
        promo_codes::{evaluation, repository::PgPromoCodesRepository},
    },
};

#[derive(Debug, Clone)]
pub struct PgOrdersService {
    db: Db,
    orders: PgOrdersRepository,
    statuses: PgOrderStatusesRepository,
    methods: PgMethodsRepository,
    numbers: PgOrderNumbersRepository,
    carts: PgCartsRepository,
    cart_items: PgCartItemsRepository,
    products: PgProductsRepository,
    offers: PgOffersRepository,
    promo_codes: PgPromoCodesRepository,
    users: PgUsersRepository,
}

impl PgOrdersService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            orders: PgOrdersRepository::new(),
            statuses: PgOrderStatusesRepository::new(),
            methods: PgMethodsRepository::new(),
            numbers: PgOrderNumbersRepository::new(),
            carts: PgCartsRepository::new(),
            cart_items: PgCartItemsRepository::new(),
            products: PgProductsRepository::new(),
            offers: PgOffersRepository::new(),
            promo_codes: PgPromoCodesRepository::new(),
            users: PgUsersRepository::new(),
        }
    }

    /// Take the initial status and the next number for an order placed at `now`.
    async fn prepare(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        now: Timestamp,
    ) -> Result<(OrderStatusUuid, String), OrdersServiceError> {
        let status = self
            .statuses
            .initial(tx)
            .await?
            .filter(orders::StatusSnapshot::can_start_orders)
            .ok_or(OrdersServiceError::NoInitialStatus)?;

        let day = now.to_zoned(TimeZone::UTC).date();
        let number = self.numbers.next(tx, day).await?;

        Ok((status.uuid, number))
    }

    async fn load(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        self.orders
            .get(tx, uuid)
            .await?
            .ok_or(OrdersServiceError::NotFound)
    }

    /// Look up one manager line's source, locking existing offers.
    async fn resolve_manager_line(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        source: &ManagerLineSource,
        now: Timestamp,
    ) -> Result<(CartLineKey, String, Availability), OrdersServiceError> {
        let resolved = match source {
            ManagerLineSource::Product(uuid) => {
                let key = CartLineKey::Product(*uuid);

                match self.products.get(tx, *uuid).await? {
                    Some(product) => (key, product.name.clone(), product.snapshot().availability()),
                    None => (key, String::new(), Availability::Missing),
                }
            }
            ManagerLineSource::Offer(uuid) => {
                let key = CartLineKey::Offer(*uuid);

                match self.offers.lock(tx, *uuid).await? {
                    Some(offer) => (key, offer.name.clone(), offer.state().availability(now)),
                    None => (key, String::new(), Availability::Missing),
                }
            }
            ManagerLineSource::Inline(inline) => (
                CartLineKey::Offer(OfferUuid::new()),
                inline.name.clone(),
                Availability::Available,
            ),
        };

        Ok(resolved)
    }
}

fn offers_in(order: &AssembledOrder) -> Vec<OfferUuid> {
    order
        .lines
        .iter()
        .filter_map(|line| line.key.offer())
        .collect()
}

#[async_trait]
impl OrdersService for PgOrdersService {
    #[tracing::instrument(
        name = "orders.service.create_order",
        skip(self, identity, checkout),
        fields(
            user_uuid = tracing::field::Empty,
            order_uuid = tracing::field::Empty,
            order_number = tracing::field::Empty,
            total = tracing::field::Empty
        ),
        err
    )]
    async fn create_order(
        &self,
        identity: Identity,
        checkout: Checkout,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let user = identity.user().ok_or(OrdersServiceError::Unauthorized)?;
        let checkout = checkout.validate()?;
        let now = Timestamp::now();

        let span = Span::current();

        span.record("user_uuid", tracing::field::display(user.uuid));

        let mut tx = self.db.begin().await?;

        let Some(cart) = self.carts.lock(&mut tx, Owner::User(user.uuid)).await? else {
            return Err(orders::OrderAssemblyError::EmptyCart.into());
        };

        self.cart_items.lock_offers(&mut tx, cart.uuid).await?;

        let lines = self.cart_items.lines(&mut tx, cart.uuid).await?;
        let priced = cart::price_cart(lines, now)?;

        // A code typed at checkout must apply; one remembered on the cart is dropped
        // once it no longer does.
        let explicit = checkout.promo_code.is_some();

        let promo = match checkout.promo_code.as_ref().or(cart.promo_code.as_ref()) {
            Some(code) => {
                let evaluated = evaluation::evaluate(
                    &self.promo_codes,
                    &mut tx,
                    code,
                    Some(user.uuid),
                    &priced,
                    now,
                    true,
                )
                .await?;

                if explicit || evaluated.info.is_valid() {
                    Some(evaluated)
                } else {
                    debug!(code = %evaluated.info.code, "dropped stale cart promo code");

                    None
                }
            }
            None => None,
        };

        let delivery = self
            .methods
            .delivery(&mut tx, checkout.delivery_method)
            .await?;

        let payment = self
            .methods
            .payment(&mut tx, checkout.payment_method)
            .await?;

        let assembled = orders::assemble(
            &priced,
            delivery.as_ref(),
            payment.as_ref(),
            promo.as_ref().map(|promo| promo.info.clone()),
        )?;

        let (status, number) = self.prepare(&mut tx, now).await?;

        let order = NewOrder {
            uuid: OrderUuid::new(),
            number,
            user: user.uuid,
            status,
            delivery_method: checkout.delivery_method,
            payment_method: checkout.payment_method,
            customer_name: checkout.customer_name,
            customer_phone: checkout.customer_phone,
            customer_email: checkout.customer_email,
            delivery_address: checkout.delivery_address,
            comment: checkout.comment,
            promo_code: assembled.promo_code.as_ref().map(|info| info.code.clone()),
            totals: assembled.totals,
            manager: None,
        };

        span.record("order_uuid", tracing::field::display(order.uuid));
        span.record("order_number", tracing::field::display(&order.number));
        span.record("total", order.totals.total);

        self.orders.create(&mut tx, &order).await?;

        self.orders
            .create_items(&mut tx, order.uuid, &assembled.lines)
            .await?;

        if let Some(applied) = promo.as_ref().and_then(|promo| promo.applied()) {
            self.promo_codes
                .record_usage(
                    &mut tx,
                    applied.uuid,
                    user.uuid,
                    order.uuid,
                    order.totals.discount,
                )
                .await?;
        }

        let offers = offers_in(&assembled);

        if !offers.is_empty() {
            self.offers
                .consume(&mut tx, &offers, order.uuid, now)
                .await?;
        }

        self.cart_items.clear(&mut tx, cart.uuid).await?;
        self.carts.set_promo_code(&mut tx, cart.uuid, None).await?;

        let record = self.load(&mut tx, order.uuid).await?;

        tx.commit().await?;

        info!(
            order_uuid = %record.uuid,
            order_number = %record.number,
            total = record.totals.total,
            discount = record.totals.discount,
            "created order"
        );

        Ok(record)
    }

    #[tracing::instrument(
        name = "orders.service.create_manager_order",
        skip(self, actor, input),
        fields(
            manager_uuid = %actor.uuid,
            order_uuid = tracing::field::Empty,
            order_number = tracing::field::Empty,
            line_count = input.items.len()
        ),
        err
    )]
    async fn create_manager_order(
        &self,
        actor: AuthenticatedUser,
        input: ManagerOrderInput,
    ) -> Result<OrderRecord, OrdersServiceError> {
        if !actor.role.is_staff() {
            return Err(OrdersServiceError::Forbidden);
        }

        let input = input.validate()?;
        let now = Timestamp::now();

        let mut tx = self.db.begin().await?;

        let mut resolved = Vec::with_capacity(input.items.len());
        let mut inline_offers = Vec::new();

        for line in &input.items {
            let (key, name, availability) =
                self.resolve_manager_line(&mut tx, &line.source, now).await?;

            if let (ManagerLineSource::Inline(inline), CartLineKey::Offer(uuid)) =
                (&line.source, key)
            {
                inline_offers.push((uuid, inline.clone(), line.price));
            }

            resolved.push(ResolvedManagerLine {
                key,
                name,
                availability,
                quantity: line.quantity,
                price: line.price,
            });
        }

        let delivery = self
            .methods
            .delivery(&mut tx, input.delivery_method)
            .await?;

        let payment = self
            .methods
            .payment(&mut tx, input.payment_method)
            .await?;

        let assembled = orders::assemble_manager(resolved, delivery.as_ref(), payment.as_ref())?;

        let customer = self
            .users
            .find_or_create(&mut tx, &input.customer_phone, Some(&input.customer_name))
            .await?;

        let (status, number) = self.prepare(&mut tx, now).await?;

        let order = NewOrder {
            uuid: OrderUuid::new(),
            number,
            user: customer.uuid,
            status,
            delivery_method: input.delivery_method,
            payment_method: input.payment_method,
            customer_name: input.customer_name,
            customer_phone: input.customer_phone,
            customer_email: input.customer_email,
            delivery_address: input.delivery_address,
            comment: input.comment,
            promo_code: None,
            totals: assembled.totals,
            manager: Some(actor.uuid),
        };

        let span = Span::current();

        span.record("order_uuid", tracing::field::display(order.uuid));
        span.record("order_number", tracing::field::display(&order.number));

        self.orders.create(&mut tx, &order).await?;

        let consumption = Consumption {
            order: order.uuid,
            at: now,
        };

        for (uuid, inline, price) in inline_offers {
            let offer = NewOffer {
                product: inline.product,
                customer: Some(customer.uuid),
                name: inline.name,
                description: None,
                price,
                old_price: None,
                delivery_days: inline.delivery_days,
                is_original: inline.is_original,
                is_analog: inline.is_analog,
                expires_at: None,
            };

            self.offers
                .create(&mut tx, uuid, actor.uuid, &offer, Some(consumption))
                .await?;
        }

        let offers = offers_in(&assembled);

        if !offers.is_empty() {
            self.offers
                .consume(&mut tx, &offers, order.uuid, now)
                .await?;
        }

        self.orders
            .create_items(&mut tx, order.uuid, &assembled.lines)
            .await?;

        let record = self.load(&mut tx, order.uuid).await?;

        tx.commit().await?;

        info!(
            order_uuid = %record.uuid,
            order_number = %record.number,
            customer_uuid = %record.user_uuid,
            total = record.totals.total,
            "created manager order"
        );

        Ok(record)
    }

    #[tracing::instrument(
        name = "orders.service.update_order_status",
        skip(self, actor),
        fields(manager_uuid = %actor.uuid, order_uuid = %order, status_uuid = %status),
        err
    )]
    async fn update_order_status(
        &self,
        actor: AuthenticatedUser,
        order: OrderUuid,
        status: OrderStatusUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        if !actor.role.is_staff() {
            return Err(OrdersServiceError::Forbidden);
        }

        let mut tx = self.db.begin().await?;

        let snapshot = self
            .statuses
            .get(&mut tx, status)
            .await?
            .ok_or(OrdersServiceError::StatusNotFound)?;

        if !snapshot.is_active {
            return Err(OrdersServiceError::InactiveStatus);
        }

        if !self.orders.set_status(&mut tx, order, status).await? {
            return Err(OrdersServiceError::NotFound);
        }

        let record = self.load(&mut tx, order).await?;

        tx.commit().await?;

        info!(order_uuid = %record.uuid, status = %snapshot.code, "updated order status");

        Ok(record)
    }

    #[tracing::instrument(
        name = "orders.service.get_order",
        skip(self, identity),
        fields(order_uuid = %order),
        err
    )]
    async fn get_order(
        &self,
        identity: Identity,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let user = identity.user().ok_or(OrdersServiceError::Unauthorized)?;

        let mut tx = self.db.begin().await?;

        let record = self.load(&mut tx, order).await?;

        tx.commit().await?;

        // other customers' orders are reported as absent
        if record.user_uuid != user.uuid && !user.role.is_staff() {
            return Err(OrdersServiceError::NotFound);
        }

        Ok(record)
    }

    #[tracing::instrument(
        name = "orders.service.list_orders",
        skip(self, identity),
        fields(order_count = tracing::field::Empty),
        err
    )]
    async fn list_orders(&self, identity: Identity) -> Result<Vec<OrderRecord>, OrdersServiceError> {
        let user = identity.user().ok_or(OrdersServiceError::Unauthorized)?;

        let mut tx = self.db.begin().await?;

        let orders = self.orders.list_for_user(&mut tx, user.uuid).await?;

        tx.commit().await?;

        Span::current().record("order_count", tracing::field::display(orders.len()));

        Ok(orders)
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Turn the signed-in customer's cart into an order.
    async fn create_order(
        &self,
        identity: Identity,
        checkout: Checkout,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Place an order on a customer's behalf at manager prices.
    async fn create_manager_order(
        &self,
        actor: AuthenticatedUser,
        input: ManagerOrderInput,
    ) -> Result<OrderRecord, OrdersServiceError>;

    async fn update_order_status(
        &self,
        actor: AuthenticatedUser,
        order: OrderUuid,
        status: OrderStatusUuid,
    ) -> Result<OrderRecord, OrdersServiceError>;

    async fn get_order(
        &self,
        identity: Identity,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError>;

    async fn list_orders(&self, identity: Identity) -> Result<Vec<OrderRecord>, OrdersServiceError>;
}

#[cfg(test)]
mod tests {
    use jiff::{SignedDuration, Timestamp};
    use spareline::{
        ErrorKind,
        cart::{AddItem, CartLineKey},
        identity::{AnonymousVisitor, AuthenticatedUser, Identity, Owner},
        offers::NewOffer,
        orders::{Checkout, InlineOffer, ManagerLineInput, ManagerOrderInput, OrderAssemblyError},
        promo::{NewPromoCode, PromoDiscount},
        uuids::{AnonymousUuid, OrderStatusUuid},
    };
    use testresult::TestResult;
    use uuid::Uuid;

    use crate::{
        domain::{
            carts::CartsService,
            offers::OffersService,
            orders::{OrdersService, OrdersServiceError},
            promo_codes::PromoCodesService,
        },
        test::{TestContext, fixtures},
    };

    async fn checkout(ctx: &TestContext, promo_code: Option<&str>) -> Checkout {
        Checkout {
            delivery_method: fixtures::delivery_method(ctx, "courier").await,
            payment_method: fixtures::payment_method(ctx, "cash").await,
            customer_name: "Ivan Petrov".to_string(),
            customer_phone: "8 916 000 11 22".to_string(),
            customer_email: None,
            delivery_address: Some("Moscow, Tverskaya 1".to_string()),
            comment: None,
            promo_code: promo_code.map(str::to_string),
        }
    }

    fn add(product: spareline::uuids::ProductUuid, quantity: u32) -> AddItem {
        AddItem {
            product: Some(product),
            offer: None,
            quantity,
        }
    }

    fn signed_in(user: &AuthenticatedUser) -> Identity {
        Identity::Authenticated(user.clone())
    }

    fn status(uuid: &str) -> OrderStatusUuid {
        OrderStatusUuid::from_uuid(Uuid::parse_str(uuid).unwrap_or_default())
    }

    #[tokio::test]
    async fn checkout_freezes_the_cart_into_an_order() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = fixtures::customer(&ctx).await;
        let owner = Owner::User(customer.uuid);
        let pads = fixtures::product(&ctx, "Brake pads", 250_000).await;
        let oil = fixtures::product(&ctx, "Engine oil", 120_000).await;

        ctx.carts.add_item(owner, add(pads, 2)).await?;
        ctx.carts.add_item(owner, add(oil, 1)).await?;

        let order = ctx
            .orders
            .create_order(signed_in(&customer), checkout(&ctx, None).await)
            .await?;

        let today = Timestamp::now().to_zoned(jiff::tz::TimeZone::UTC).date();

        assert_eq!(order.number, spareline::orders::order_number(today, 1));
        assert_eq!(order.status.code, "new");
        assert_eq!(order.customer_phone, "+79160001122");
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.totals.subtotal, 620_000);
        assert_eq!(order.totals.delivery, 50_000);
        assert_eq!(order.totals.total, 670_000);
        assert!(!order.is_manager_created, "customer order");

        assert!(
            ctx.carts.get_cart(owner).await?.cart.lines.is_empty(),
            "cart emptied after checkout"
        );

        // later price changes do not touch the order
        fixtures::set_price(&ctx, pads, 990_000).await;

        let stored = ctx.orders.get_order(signed_in(&customer), order.uuid).await?;

        let pads_line = stored
            .items
            .iter()
            .find(|item| item.key == CartLineKey::Product(pads))
            .ok_or("pads line missing")?;

        assert_eq!(pads_line.unit_price, 250_000);
        assert_eq!(pads_line.line_total, 500_000);

        let second = {
            ctx.carts.add_item(owner, add(oil, 1)).await?;
            ctx.orders
                .create_order(signed_in(&customer), checkout(&ctx, None).await)
                .await?
        };

        assert_eq!(second.number, spareline::orders::order_number(today, 2));
        assert_eq!(ctx.orders.list_orders(signed_in(&customer)).await?.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn promo_code_is_applied_and_used_up() -> TestResult {
        let ctx = TestContext::new().await;
        let manager = fixtures::manager(&ctx).await;
        let customer = fixtures::customer(&ctx).await;
        let owner = Owner::User(customer.uuid);
        let product = fixtures::product(&ctx, "Clutch kit", 1_000).await;

        ctx.promo_codes
            .create_promo_code(
                manager,
                NewPromoCode {
                    code: "SAVE10".to_string(),
                    discount: PromoDiscount::Percentage(rust_decimal::Decimal::TEN),
                    min_order_amount: None,
                    valid_from: Timestamp::now() - SignedDuration::from_hours(1),
                    valid_until: None,
                    is_public: true,
                    first_order_only: false,
                    max_uses_total: None,
                    max_uses_per_user: 1,
                },
            )
            .await?;

        ctx.carts.add_item(owner, add(product, 1)).await?;
        ctx.carts.apply_promo_code(owner, "SAVE10".to_string()).await?;

        let order = ctx
            .orders
            .create_order(signed_in(&customer), checkout(&ctx, None).await)
            .await?;

        assert_eq!(order.promo_code.as_deref(), Some("SAVE10"));
        assert_eq!(order.totals.discount, 100);

        assert_eq!(
            fixtures::count(&ctx, "SELECT count(*) FROM promo_code_usages").await,
            1,
            "usage recorded"
        );

        ctx.carts.add_item(owner, add(product, 1)).await?;

        let again = ctx.carts.apply_promo_code(owner, "SAVE10".to_string()).await?;

        assert_eq!(again.discount_amount, 0, "per-user limit reached");

        Ok(())
    }

    #[tokio::test]
    async fn stale_cart_promo_code_is_dropped_but_typed_code_is_enforced() -> TestResult {
        let ctx = TestContext::new().await;
        let manager = fixtures::manager(&ctx).await;
        let customer = fixtures::customer(&ctx).await;
        let owner = Owner::User(customer.uuid);
        let product = fixtures::product(&ctx, "Radiator", 1_000).await;

        ctx.promo_codes
            .create_promo_code(
                manager,
                NewPromoCode {
                    code: "BIG".to_string(),
                    discount: PromoDiscount::Percentage(rust_decimal::Decimal::TEN),
                    min_order_amount: Some(5_000),
                    valid_from: Timestamp::now() - SignedDuration::from_hours(1),
                    valid_until: None,
                    is_public: true,
                    first_order_only: false,
                    max_uses_total: None,
                    max_uses_per_user: 5,
                },
            )
            .await?;

        ctx.carts.add_item(owner, add(product, 5)).await?;

        let applied = ctx.carts.apply_promo_code(owner, "BIG".to_string()).await?;

        assert_eq!(applied.discount_amount, 500);

        ctx.carts
            .update_item(owner, CartLineKey::Product(product), 1)
            .await?;

        let summary = ctx.carts.get_summary(owner).await?;

        assert!(
            summary.promo_code.is_some_and(|info| info.error.is_some()),
            "summary reports the minimum amount"
        );

        let order = ctx
            .orders
            .create_order(signed_in(&customer), checkout(&ctx, None).await)
            .await?;

        assert_eq!(order.totals.discount, 0);
        assert_eq!(order.totals.subtotal, 1_000);
        assert!(order.promo_code.is_none(), "stale code not recorded");
        assert_eq!(
            fixtures::count(&ctx, "SELECT count(*) FROM promo_code_usages").await,
            0,
            "no usage for a dropped code"
        );

        ctx.carts.add_item(owner, add(product, 1)).await?;

        let typed = ctx
            .orders
            .create_order(signed_in(&customer), checkout(&ctx, Some("BIG")).await)
            .await;

        assert!(
            typed
                .as_ref()
                .is_err_and(|error| error.kind() == ErrorKind::ValidationFailed),
            "unexpected result: {typed:?}"
        );
        assert_eq!(
            fixtures::count(&ctx, "SELECT count(*) FROM orders").await,
            1,
            "rejected checkout wrote nothing"
        );

        Ok(())
    }

    #[tokio::test]
    async fn sold_out_product_blocks_checkout() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = fixtures::customer(&ctx).await;
        let owner = Owner::User(customer.uuid);
        let product = fixtures::product(&ctx, "Starter motor", 1_500_000).await;

        ctx.carts.add_item(owner, add(product, 1)).await?;

        fixtures::set_in_stock(&ctx, product, false).await;

        let result = ctx
            .orders
            .create_order(signed_in(&customer), checkout(&ctx, None).await)
            .await;

        assert!(
            matches!(
                result,
                Err(OrdersServiceError::Assembly(
                    OrderAssemblyError::ItemUnavailable { .. }
                ))
            ),
            "unexpected result: {result:?}"
        );
        assert_eq!(
            fixtures::count(&ctx, "SELECT count(*) FROM orders").await,
            0,
            "no order written"
        );

        Ok(())
    }

    #[tokio::test]
    async fn cancelled_offer_blocks_checkout() -> TestResult {
        let ctx = TestContext::new().await;
        let manager = fixtures::manager(&ctx).await;
        let customer = fixtures::customer(&ctx).await;
        let owner = Owner::User(customer.uuid);

        let offer = ctx
            .offers
            .create_offer(
                manager.clone(),
                NewOffer {
                    product: None,
                    customer: Some(customer.uuid),
                    name: "Contract engine".to_string(),
                    description: None,
                    price: 12_000_000,
                    old_price: None,
                    delivery_days: Some(14),
                    is_original: true,
                    is_analog: false,
                    expires_at: None,
                },
            )
            .await?;

        ctx.carts
            .add_item(
                owner,
                AddItem {
                    product: None,
                    offer: Some(offer.uuid),
                    quantity: 1,
                },
            )
            .await?;

        ctx.offers.cancel_offer(manager, offer.uuid).await?;

        let result = ctx
            .orders
            .create_order(signed_in(&customer), checkout(&ctx, None).await)
            .await;

        let error = result.err().ok_or("checkout should fail")?;

        assert_eq!(error.kind(), ErrorKind::Unavailable);
        assert_eq!(fixtures::count(&ctx, "SELECT count(*) FROM orders").await, 0);

        Ok(())
    }

    #[tokio::test]
    async fn checkout_needs_a_signed_in_user_and_items() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = fixtures::customer(&ctx).await;

        let anonymous = Identity::Anonymous(AnonymousVisitor {
            uuid: AnonymousUuid::new(),
        });

        let result = ctx
            .orders
            .create_order(anonymous, checkout(&ctx, None).await)
            .await;

        assert!(
            matches!(result, Err(OrdersServiceError::Unauthorized)),
            "unexpected result: {result:?}"
        );

        let result = ctx
            .orders
            .create_order(signed_in(&customer), checkout(&ctx, None).await)
            .await;

        assert!(
            matches!(
                result,
                Err(OrdersServiceError::Assembly(OrderAssemblyError::EmptyCart))
            ),
            "unexpected result: {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn manager_order_creates_customer_and_inline_offer() -> TestResult {
        let ctx = TestContext::new().await;
        let manager = fixtures::manager(&ctx).await;
        let product = fixtures::product(&ctx, "Alternator", 1_500_000).await;

        let order = ctx
            .orders
            .create_manager_order(
                manager.clone(),
                ManagerOrderInput {
                    customer_phone: "+7 (926) 555-44-33".to_string(),
                    customer_name: "Anna".to_string(),
                    customer_email: None,
                    delivery_method: fixtures::delivery_method(&ctx, "pickup").await,
                    payment_method: fixtures::payment_method(&ctx, "card").await,
                    delivery_address: None,
                    comment: Some("call before pickup".to_string()),
                    items: vec![
                        ManagerLineInput {
                            product: Some(product),
                            offer: None,
                            inline: None,
                            quantity: 1,
                            price: 1_400_000,
                        },
                        ManagerLineInput {
                            product: None,
                            offer: None,
                            inline: Some(InlineOffer {
                                name: "Belt, aftermarket".to_string(),
                                product: None,
                                delivery_days: Some(2),
                                is_original: false,
                                is_analog: true,
                            }),
                            quantity: 2,
                            price: 30_000,
                        },
                    ],
                },
            )
            .await?;

        assert!(order.is_manager_created, "manager flag set");
        assert_eq!(order.created_by_manager_uuid, Some(manager.uuid));
        assert_eq!(order.customer_phone, "+79265554433");
        assert_eq!(order.totals.subtotal, 1_460_000);
        assert_eq!(order.totals.discount, 0);

        let inline = order
            .items
            .iter()
            .find_map(|item| item.key.offer())
            .ok_or("inline offer line missing")?;

        let offer = ctx.offers.get_offer(inline).await?;

        assert_eq!(offer.consumed_by_order_uuid, Some(order.uuid));
        assert_eq!(offer.customer_uuid, Some(order.user_uuid));

        let customer = fixtures::count(&ctx, "SELECT count(*) FROM users WHERE phone = '+79265554433'")
            .await;

        assert_eq!(customer, 1, "customer created by phone");

        Ok(())
    }

    #[tokio::test]
    async fn status_changes_and_visibility() -> TestResult {
        let ctx = TestContext::new().await;
        let manager = fixtures::manager(&ctx).await;
        let customer = fixtures::customer(&ctx).await;
        let stranger = fixtures::user(&ctx, "+79990000002", spareline::identity::Role::Customer).await;
        let product = fixtures::product(&ctx, "Shock absorber", 400_000).await;

        ctx.carts
            .add_item(Owner::User(customer.uuid), add(product, 1))
            .await?;

        let order = ctx
            .orders
            .create_order(signed_in(&customer), checkout(&ctx, None).await)
            .await?;

        let hidden = ctx.orders.get_order(signed_in(&stranger), order.uuid).await;

        assert!(
            matches!(hidden, Err(OrdersServiceError::NotFound)),
            "unexpected result: {hidden:?}"
        );

        ctx.orders.get_order(signed_in(&manager), order.uuid).await?;

        let processing = status("0195f000-0000-7000-8000-000000000002");

        let forbidden = ctx
            .orders
            .update_order_status(customer.clone(), order.uuid, processing)
            .await;

        assert!(
            matches!(forbidden, Err(OrdersServiceError::Forbidden)),
            "unexpected result: {forbidden:?}"
        );

        let updated = ctx
            .orders
            .update_order_status(manager.clone(), order.uuid, processing)
            .await?;

        assert_eq!(updated.status.code, "processing");

        let unknown = ctx
            .orders
            .update_order_status(manager, order.uuid, OrderStatusUuid::new())
            .await;

        assert!(
            matches!(unknown, Err(OrdersServiceError::StatusNotFound)),
            "unexpected result: {unknown:?}"
        );

        Ok(())
    }
}
