mod admin;
mod banner;
mod notification;
mod order;
mod product;

pub use admin::*;
pub use banner::*;
pub use notification::*;
pub use order::*;
pub use product::*;
