pub mod admin;
pub mod error;
pub mod images;
pub mod normalize;
pub mod types;
pub mod verify;

pub use admin::AdminClient;
pub use error::{NormalizeError, ShopifyError, VerifyError};
pub use images::extract_image_references;
pub use normalize::{normalize_order, resolve_order_id, OrderPayload};
pub use types::{OrderQueryResponse, QueryOrder, SourceOrder};
