pub mod chat_history_route;
pub mod register_document_request;
pub mod register_document_route;
