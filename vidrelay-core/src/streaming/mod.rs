//! Range-aware streaming of resolved media.
//!
//! [`range`] turns a `Range` header and a content length into a response
//! plan; [`proxy`] resolves, opens the upstream for that plan and builds the
//! HTTP response around the piped body.

pub mod proxy;
pub mod range;

pub use proxy::{ProxyError, STREAM_CONTENT_TYPE, StreamPlan, StreamProxy};
pub use range::{
    RangeError, RangePlan, RangeRequest, extract_range_header, parse_range_header, plan_range,
};
