mod doc;
mod health;

pub use doc::{doc_routes, Command, DocQuery, WARNINGS_HEADER};
pub use health::health_routes;
