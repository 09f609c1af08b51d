//! Display consumer for the feed.
//!
//! [`DisplayList`] is the consumer-side copy of the feed: it is fed only by
//! [`FeedEvent`](crate::feed::FeedEvent)s and decides, from the scroll
//! position, when the next page should be requested. [`page_back`] drives a
//! coordinator through a fixed number of pages for non-interactive output.

mod list;
mod paging;
mod time_ago;

pub use list::{render_row, DisplayList};
pub use paging::{page_back, PagingEnd, PagingOptions};
pub use time_ago::format_time_ago;
