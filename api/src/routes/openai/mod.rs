pub mod openai_request;
pub mod openai_route;
