//! Offers Service

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use spareline::{
    identity::AuthenticatedUser,
    offers::{self, NewOffer, OfferUpdate},
    uuids::OfferUuid,
};
use sqlx::{Postgres, Transaction};
use tracing::{Span, info};

use crate::{
    database::Db,
    domain::offers::{OffersServiceError, records::OfferRecord, repository::PgOffersRepository},
};

#[derive(Debug, Clone)]
pub struct PgOffersService {
    db: Db,
    offers: PgOffersRepository,
}

impl PgOffersService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            offers: PgOffersRepository::new(),
        }
    }

    /// Lock `uuid` and check that `actor` may change it.
    async fn lock_for_change(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        actor: &AuthenticatedUser,
        uuid: OfferUuid,
    ) -> Result<OfferRecord, OffersServiceError> {
        ensure_staff(actor)?;

        let record = self
            .offers
            .lock(tx, uuid)
            .await?
            .ok_or(OffersServiceError::NotFound)?;

        offers::check_change(actor, record.created_by_uuid, &record.state())?;

        Ok(record)
    }
}

fn ensure_staff(actor: &AuthenticatedUser) -> Result<(), OffersServiceError> {
    if actor.role.is_staff() {
        Ok(())
    } else {
        Err(OffersServiceError::Forbidden)
    }
}

#[async_trait]
impl OffersService for PgOffersService {
    #[tracing::instrument(
        name = "offers.service.create_offer",
        skip(self, actor, offer),
        fields(manager_uuid = %actor.uuid, offer_uuid = tracing::field::Empty),
        err
    )]
    async fn create_offer(
        &self,
        actor: AuthenticatedUser,
        offer: NewOffer,
    ) -> Result<OfferRecord, OffersServiceError> {
        ensure_staff(&actor)?;

        let offer = offer.validate(Timestamp::now())?;
        let uuid = OfferUuid::new();

        Span::current().record("offer_uuid", tracing::field::display(uuid));

        let mut tx = self.db.begin().await?;

        let record = self
            .offers
            .create(&mut tx, uuid, actor.uuid, &offer, None)
            .await?;

        tx.commit().await?;

        info!(offer_uuid = %record.uuid, price = record.price, "created offer");

        Ok(record)
    }

    #[tracing::instrument(
        name = "offers.service.update_offer",
        skip(self, actor, update),
        fields(manager_uuid = %actor.uuid, offer_uuid = %uuid),
        err
    )]
    async fn update_offer(
        &self,
        actor: AuthenticatedUser,
        uuid: OfferUuid,
        update: OfferUpdate,
    ) -> Result<OfferRecord, OffersServiceError> {
        let mut tx = self.db.begin().await?;

        let current = self.lock_for_change(&mut tx, &actor, uuid).await?;

        let offer = update.apply(current.editable(), Timestamp::now())?;

        let record = self.offers.update(&mut tx, uuid, &offer).await?;

        tx.commit().await?;

        info!(offer_uuid = %record.uuid, "updated offer");

        Ok(record)
    }

    #[tracing::instrument(
        name = "offers.service.deactivate_offer",
        skip(self, actor),
        fields(manager_uuid = %actor.uuid, offer_uuid = %uuid),
        err
    )]
    async fn deactivate_offer(
        &self,
        actor: AuthenticatedUser,
        uuid: OfferUuid,
    ) -> Result<OfferRecord, OffersServiceError> {
        let mut tx = self.db.begin().await?;

        self.lock_for_change(&mut tx, &actor, uuid).await?;

        let record = self.offers.deactivate(&mut tx, uuid).await?;

        tx.commit().await?;

        info!(offer_uuid = %record.uuid, "deactivated offer");

        Ok(record)
    }

    #[tracing::instrument(
        name = "offers.service.cancel_offer",
        skip(self, actor),
        fields(manager_uuid = %actor.uuid, offer_uuid = %uuid),
        err
    )]
    async fn cancel_offer(
        &self,
        actor: AuthenticatedUser,
        uuid: OfferUuid,
    ) -> Result<OfferRecord, OffersServiceError> {
        let mut tx = self.db.begin().await?;

        self.lock_for_change(&mut tx, &actor, uuid).await?;

        let record = self.offers.cancel(&mut tx, uuid).await?;

        tx.commit().await?;

        info!(offer_uuid = %record.uuid, "cancelled offer");

        Ok(record)
    }

    #[tracing::instrument(
        name = "offers.service.get_offer",
        skip(self),
        fields(offer_uuid = %uuid),
        err
    )]
    async fn get_offer(&self, uuid: OfferUuid) -> Result<OfferRecord, OffersServiceError> {
        let mut tx = self.db.begin().await?;

        let record = self
            .offers
            .get(&mut tx, uuid)
            .await?
            .ok_or(OffersServiceError::NotFound)?;

        tx.commit().await?;

        Ok(record)
    }
}

#[automock]
#[async_trait]
pub trait OffersService: Send + Sync {
    async fn create_offer(
        &self,
        actor: AuthenticatedUser,
        offer: NewOffer,
    ) -> Result<OfferRecord, OffersServiceError>;

    /// Change an open offer. Managers may only change their own offers.
    async fn update_offer(
        &self,
        actor: AuthenticatedUser,
        uuid: OfferUuid,
        update: OfferUpdate,
    ) -> Result<OfferRecord, OffersServiceError>;

    /// Take an offer off sale. It stays in carts, reported as inactive.
    async fn deactivate_offer(
        &self,
        actor: AuthenticatedUser,
        uuid: OfferUuid,
    ) -> Result<OfferRecord, OffersServiceError>;

    /// Withdraw an offer for good.
    async fn cancel_offer(
        &self,
        actor: AuthenticatedUser,
        uuid: OfferUuid,
    ) -> Result<OfferRecord, OffersServiceError>;

    async fn get_offer(&self, uuid: OfferUuid) -> Result<OfferRecord, OffersServiceError>;
}
