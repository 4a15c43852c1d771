use axum::Router;

use crate::database::StoreClient;
use crate::handlers::{
    create_handler, delete_handler, find_handler, read_many_handler, read_one_handler,
    update_handler, HandlerConfig,
};
use crate::models::post::{
    POST_INCLUDE, POST_INPUT, POST_ORDER_BY, POST_OUTPUT, POST_PATCH, POST_SELECT, POST_WHERE,
};

/// `/api/post` collection and item routes
pub fn routes(client: &dyn StoreClient) -> Router {
    let base = HandlerConfig::new(client.post());

    let list = read_many_handler(
        base.clone()
            .output(&POST_OUTPUT)
            .where_schema(&POST_WHERE)
            .select(&POST_SELECT)
            .include(&POST_INCLUDE)
            .order_by(&POST_ORDER_BY),
    );
    let create = create_handler(base.clone().input(&POST_INPUT).output(&POST_OUTPUT));
    let find = find_handler(
        base.clone()
            .output(&POST_OUTPUT)
            .where_schema(&POST_WHERE)
            .select(&POST_SELECT)
            .include(&POST_INCLUDE)
            .order_by(&POST_ORDER_BY),
    );
    let read_one = read_one_handler(
        base.clone()
            .output(&POST_OUTPUT)
            .select(&POST_SELECT)
            .include(&POST_INCLUDE),
    );
    let update = update_handler(base.clone().input(&POST_PATCH).output(&POST_OUTPUT));
    let delete = delete_handler(base);

    Router::new()
        .route("/api/post", list.merge(create))
        .route("/api/post/find", find)
        .route("/api/post/:id", read_one.merge(update).merge(delete))
}
