pub mod ragcv_request;
pub mod ragcv_route;
pub mod upsert_batch_route;
pub mod upsert_route;
