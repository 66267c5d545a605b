//! Response dispatch.
//!
//! A run ends with exactly one [`Response`] written to its
//! [`ResponseChannel`]. The [`Dispatcher`] decides what that response looks
//! like: status, headers, cookies and one of a JSON body, a redirect or a
//! rendered view.

mod channel;
mod dispatcher;
mod render;
mod response;

pub use channel::ResponseChannel;
pub use dispatcher::Dispatcher;
#[cfg(test)]
pub use render::MockTemplateRenderer;
pub use render::{JsonTemplateRenderer, TemplateRenderer};
pub use response::{Response, ResponseBody, SetCookie};
