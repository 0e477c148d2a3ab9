//! Test helpers.

use std::sync::Arc;

use salvo::{affix_state::inject, prelude::*};
use spareline::{
    identity::{AnonymousVisitor, AuthenticatedUser, Identity, Role},
    uuids::{AnonymousUuid, UserUuid},
};
use spareline_app::{
    context::AppContext,
    domain::{
        carts::MockCartsService, catalog::MockCatalogService, favorites::MockFavoritesService,
        identity::MockIdentityService, offers::MockOffersService, orders::MockOrdersService,
        promo_codes::MockPromoCodesService,
    },
};
use uuid::Uuid;

use crate::{extensions::*, state::State};

/// One mock per service. Mocks without expectations fail on any call.
#[derive(Default)]
pub(crate) struct Mocks {
    pub identity: MockIdentityService,
    pub carts: MockCartsService,
    pub favorites: MockFavoritesService,
    pub catalog: MockCatalogService,
    pub offers: MockOffersService,
    pub orders: MockOrdersService,
    pub promo_codes: MockPromoCodesService,
}

impl Mocks {
    pub(crate) fn into_state(self) -> Arc<State> {
        State::from_app_context(AppContext {
            identity: Arc::new(self.identity),
            carts: Arc::new(self.carts),
            favorites: Arc::new(self.favorites),
            catalog: Arc::new(self.catalog),
            offers: Arc::new(self.offers),
            orders: Arc::new(self.orders),
            promo_codes: Arc::new(self.promo_codes),
        })
    }
}

pub(crate) fn customer() -> AuthenticatedUser {
    AuthenticatedUser {
        uuid: UserUuid::from_uuid(Uuid::from_u128(1)),
        phone: "+79990000001".to_string(),
        role: Role::Customer,
    }
}

pub(crate) fn manager() -> AuthenticatedUser {
    AuthenticatedUser {
        uuid: UserUuid::from_uuid(Uuid::from_u128(100)),
        phone: "+79990000100".to_string(),
        role: Role::Manager,
    }
}

pub(crate) fn anonymous() -> Identity {
    Identity::Anonymous(AnonymousVisitor {
        uuid: AnonymousUuid::from_uuid(Uuid::from_u128(7)),
    })
}

/// Stands in for the identity middleware.
#[derive(Debug, Clone)]
pub(crate) struct InjectIdentity(pub Identity);

#[handler]
impl InjectIdentity {
    async fn handle(
        &self,
        req: &mut Request,
        depot: &mut Depot,
        res: &mut Response,
        ctrl: &mut FlowCtrl,
    ) {
        depot.insert_identity(self.0.clone());
        ctrl.call_next(req, depot, res).await;
    }
}

/// Serve `route` as `identity`.
pub(crate) fn service_as(mocks: Mocks, identity: Identity, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(mocks.into_state()))
            .hoop(InjectIdentity(identity))
            .push(route),
    )
}
