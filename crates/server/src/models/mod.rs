//! Domain types.
//!
//! These types represent validated domain objects, separate from wire DTOs
//! and database row types.

pub mod cart;
pub mod order;
pub mod product;
pub mod user;

pub use cart::{Cart, CartItem};
pub use order::{Order, OrderLine};
pub use product::Product;
pub use user::{ResetToken, User};
