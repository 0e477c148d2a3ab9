//! API routes

use salvo::Router;

use crate::{cart, catalog, favorites, identity, offers, orders, promo_codes};

/// Every storefront and manager route, behind identity resolution.
pub(crate) fn app_router() -> Router {
    Router::new()
        .hoop(identity::middleware::handler)
        .push(
            Router::with_path("auth/otp")
                .post(identity::send_otp::handler)
                .push(Router::with_path("verify").post(identity::verify_otp::handler)),
        )
        .push(
            Router::with_path("cart")
                .get(cart::get::handler)
                .delete(cart::clear::handler)
                .push(Router::with_path("summary").get(cart::summary::handler))
                .push(
                    Router::with_path("items")
                        .post(cart::items::create::handler)
                        .push(
                            Router::with_path("{kind}/{uuid}")
                                .put(cart::items::update::handler)
                                .delete(cart::items::delete::handler),
                        ),
                )
                .push(
                    Router::with_path("promo-code")
                        .put(cart::apply_promo_code::handler)
                        .delete(cart::remove_promo_code::handler),
                ),
        )
        .push(
            Router::with_path("favorites")
                .get(favorites::index::handler)
                .push(
                    Router::with_path("{product}")
                        .put(favorites::add::handler)
                        .delete(favorites::remove::handler),
                ),
        )
        .push(Router::with_path("catalog/filters").post(catalog::filters::handler))
        .push(
            Router::with_path("orders")
                .get(orders::index::handler)
                .post(orders::create::handler)
                .push(Router::with_path("{order}").get(orders::get::handler)),
        )
        .push(manager_router())
}

fn manager_router() -> Router {
    Router::with_path("manager")
        .push(
            Router::with_path("orders")
                .post(orders::create_manager::handler)
                .push(Router::with_path("{order}/status").put(orders::update_status::handler)),
        )
        .push(
            Router::with_path("offers")
                .post(offers::create::handler)
                .push(
                    Router::with_path("{offer}")
                        .get(offers::get::handler)
                        .put(offers::update::handler)
                        .push(Router::with_path("deactivate").post(offers::deactivate::handler))
                        .push(Router::with_path("cancel").post(offers::cancel::handler)),
                ),
        )
        .push(
            Router::with_path("promo-codes")
                .post(promo_codes::create::handler)
                .push(Router::with_path("{promo_code}/grants").post(promo_codes::grant::handler)),
        )
        .push(
            Router::with_path("products/{product}/pricing")
                .put(catalog::update_pricing::handler),
        )
}
