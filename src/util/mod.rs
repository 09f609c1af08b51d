//! Utility functions for common operations.
//!
//! - **Endpoint validation**: refuse to send the access token over plain HTTP
//! - **Text processing**: flatten post bodies to one safe terminal line and
//!   truncate them to the terminal width
//! - **Task helpers**: turn panics in background tasks into errors
//!
//! # Examples
//!
//! ```
//! use newsfeed::util::{single_line, truncate_to_width, validate_endpoint};
//!
//! let endpoint = validate_endpoint("https://api.vk.com/method").unwrap();
//! let line = single_line("two\nlines");
//! let cell = truncate_to_width(&line, 40);
//! ```

mod endpoint;
mod task;
mod text;

pub use endpoint::{validate_endpoint, EndpointError};
pub use task::catch_task_panic;
pub use text::{single_line, truncate_to_width};
