use axum::Router;

use crate::database::StoreClient;
use crate::handlers::{
    create_handler, delete_handler, find_handler, read_many_handler, read_one_handler,
    update_handler, HandlerConfig,
};
use crate::models::user::{
    USER_INCLUDE, USER_INPUT, USER_ORDER_BY, USER_OUTPUT, USER_PATCH, USER_SELECT, USER_WHERE,
};

/// `/api/user` collection and item routes
pub fn routes(client: &dyn StoreClient) -> Router {
    let base = HandlerConfig::new(client.user());

    let list = read_many_handler(
        base.clone()
            .output(&USER_OUTPUT)
            .where_schema(&USER_WHERE)
            .select(&USER_SELECT)
            .include(&USER_INCLUDE)
            .order_by(&USER_ORDER_BY),
    );
    let create = create_handler(base.clone().input(&USER_INPUT).output(&USER_OUTPUT));
    let find = find_handler(
        base.clone()
            .output(&USER_OUTPUT)
            .where_schema(&USER_WHERE)
            .select(&USER_SELECT)
            .include(&USER_INCLUDE)
            .order_by(&USER_ORDER_BY),
    );
    let read_one = read_one_handler(
        base.clone()
            .output(&USER_OUTPUT)
            .select(&USER_SELECT)
            .include(&USER_INCLUDE),
    );
    let update = update_handler(base.clone().input(&USER_PATCH).output(&USER_OUTPUT));
    let delete = delete_handler(base);

    Router::new()
        .route("/api/user", list.merge(create))
        .route("/api/user/find", find)
        .route("/api/user/:id", read_one.merge(update).merge(delete))
}
