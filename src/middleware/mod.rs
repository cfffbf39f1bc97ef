pub mod request_id;

pub use request_id::{make_span, request_id_middleware, REQUEST_ID_HEADER};
