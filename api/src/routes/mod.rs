pub mod health_route;
pub mod openai;
pub mod ragcv;
