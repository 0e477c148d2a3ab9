//! Promo Codes Service

use async_trait::async_trait;
use mockall::automock;
use spareline::{
    identity::AuthenticatedUser,
    phone,
    promo::{NewPromoCode, PromoCode},
    uuids::PromoCodeUuid,
};
use tracing::{Span, info};

use crate::{
    database::Db,
    domain::{
        identity::repositories::PgUsersRepository,
        promo_codes::{PromoCodesServiceError, repository::PgPromoCodesRepository},
    },
};

#[derive(Debug, Clone)]
pub struct PgPromoCodesService {
    db: Db,
    promo_codes: PgPromoCodesRepository,
    users: PgUsersRepository,
}

impl PgPromoCodesService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            promo_codes: PgPromoCodesRepository::new(),
            users: PgUsersRepository::new(),
        }
    }
}

fn ensure_staff(actor: &AuthenticatedUser) -> Result<(), PromoCodesServiceError> {
    if actor.role.is_staff() {
        Ok(())
    } else {
        Err(PromoCodesServiceError::Forbidden)
    }
}

#[async_trait]
impl PromoCodesService for PgPromoCodesService {
    #[tracing::instrument(
        name = "promo_codes.service.create_promo_code",
        skip(self, actor, promo),
        fields(
            manager_uuid = %actor.uuid,
            promo_code_uuid = tracing::field::Empty,
            discount_type = %promo.discount.discount_type()
        ),
        err
    )]
    async fn create_promo_code(
        &self,
        actor: AuthenticatedUser,
        promo: NewPromoCode,
    ) -> Result<PromoCode, PromoCodesServiceError> {
        ensure_staff(&actor)?;

        let promo = promo.validate()?;
        let uuid = PromoCodeUuid::new();

        Span::current().record("promo_code_uuid", tracing::field::display(uuid));

        let mut tx = self.db.begin().await?;

        let created = self.promo_codes.create(&mut tx, uuid, &promo).await?;

        tx.commit().await?;

        info!(promo_code_uuid = %created.uuid, code = %created.code, "created promo code");

        Ok(created)
    }

    #[tracing::instrument(
        name = "promo_codes.service.grant_promo_code",
        skip(self, actor, phone),
        fields(
            manager_uuid = %actor.uuid,
            promo_code_uuid = %promo,
            user_uuid = tracing::field::Empty
        ),
        err
    )]
    async fn grant_promo_code(
        &self,
        actor: AuthenticatedUser,
        promo: PromoCodeUuid,
        phone: String,
    ) -> Result<(), PromoCodesServiceError> {
        ensure_staff(&actor)?;

        let phone = phone::normalize(&phone)?;

        let mut tx = self.db.begin().await?;

        if !self.promo_codes.exists(&mut tx, promo).await? {
            return Err(PromoCodesServiceError::NotFound);
        }

        let user = self
            .users
            .find_by_phone(&mut tx, &phone)
            .await?
            .ok_or(PromoCodesServiceError::UserNotFound)?;

        Span::current().record("user_uuid", tracing::field::display(user.uuid));

        self.promo_codes.grant(&mut tx, promo, user.uuid).await?;

        tx.commit().await?;

        info!(promo_code_uuid = %promo, user_uuid = %user.uuid, "granted promo code");

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait PromoCodesService: Send + Sync {
    /// Create a promo code. Managers and admins only.
    async fn create_promo_code(
        &self,
        actor: AuthenticatedUser,
        promo: NewPromoCode,
    ) -> Result<PromoCode, PromoCodesServiceError>;

    /// Give the user with `phone` access to a private promo code.
    async fn grant_promo_code(
        &self,
        actor: AuthenticatedUser,
        promo: PromoCodeUuid,
        phone: String,
    ) -> Result<(), PromoCodesServiceError>;
}

#[cfg(test)]
mod tests {
    use jiff::{SignedDuration, Timestamp};
    use spareline::{
        cart::AddItem,
        identity::Owner,
        promo::{NewPromoCode, PromoDiscount},
    };
    use testresult::TestResult;

    use crate::{
        domain::{
            carts::CartsService,
            promo_codes::{PromoCodesService, PromoCodesServiceError},
        },
        test::{TestContext, fixtures},
    };

    fn fixed(code: &str, amount: u64) -> NewPromoCode {
        NewPromoCode {
            code: code.to_string(),
            discount: PromoDiscount::FixedAmount(amount),
            min_order_amount: None,
            valid_from: Timestamp::now() - SignedDuration::from_hours(1),
            valid_until: None,
            is_public: true,
            first_order_only: false,
            max_uses_total: None,
            max_uses_per_user: 1,
        }
    }

    #[tokio::test]
    async fn fixed_discount_is_capped_at_the_subtotal() -> TestResult {
        let ctx = TestContext::new().await;
        let manager = fixtures::manager(&ctx).await;
        let owner = Owner::User(fixtures::customer(&ctx).await.uuid);
        let product = fixtures::product(&ctx, "Fuse", 1_000).await;

        ctx.promo_codes
            .create_promo_code(manager, fixed("MINUS50", 5_000))
            .await?;

        ctx.carts
            .add_item(
                owner,
                AddItem {
                    product: Some(product),
                    offer: None,
                    quantity: 1,
                },
            )
            .await?;

        let info = ctx.carts.apply_promo_code(owner, "minus50".to_string()).await?;

        assert_eq!(info.discount_amount, 1_000);

        Ok(())
    }

    #[tokio::test]
    async fn duplicate_codes_conflict() -> TestResult {
        let ctx = TestContext::new().await;
        let manager = fixtures::manager(&ctx).await;

        ctx.promo_codes
            .create_promo_code(manager.clone(), fixed("SPRING", 10_000))
            .await?;

        let result = ctx
            .promo_codes
            .create_promo_code(manager, fixed("spring", 20_000))
            .await;

        assert!(
            matches!(result, Err(PromoCodesServiceError::AlreadyExists)),
            "unexpected result: {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn private_codes_need_a_grant() -> TestResult {
        let ctx = TestContext::new().await;
        let manager = fixtures::manager(&ctx).await;
        let customer = fixtures::customer(&ctx).await;
        let owner = Owner::User(customer.uuid);
        let product = fixtures::product(&ctx, "Battery", 800_000).await;

        let promo = ctx
            .promo_codes
            .create_promo_code(
                manager.clone(),
                NewPromoCode {
                    is_public: false,
                    ..fixed("VIP", 50_000)
                },
            )
            .await?;

        ctx.carts
            .add_item(
                owner,
                AddItem {
                    product: Some(product),
                    offer: None,
                    quantity: 1,
                },
            )
            .await?;

        let before = ctx.carts.apply_promo_code(owner, "VIP".to_string()).await?;

        assert_eq!(before.discount_amount, 0);
        assert!(before.error.is_some(), "private code rejected");

        let unknown = ctx
            .promo_codes
            .grant_promo_code(manager.clone(), promo.uuid, "+79161110000".to_string())
            .await;

        assert!(
            matches!(unknown, Err(PromoCodesServiceError::UserNotFound)),
            "unexpected result: {unknown:?}"
        );

        ctx.promo_codes
            .grant_promo_code(manager, promo.uuid, customer.phone.clone())
            .await?;

        let after = ctx.carts.apply_promo_code(owner, "VIP".to_string()).await?;

        assert_eq!(after.discount_amount, 50_000);

        Ok(())
    }
}
