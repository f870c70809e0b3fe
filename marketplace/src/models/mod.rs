// marketplace/src/models/mod.rs

//! Rows of the marketplace tables and the request-side shapes that create them.

pub mod cart_item;
pub mod order;
pub mod order_item;
pub mod product;
pub mod profile;
pub mod review;
pub mod session;
pub mod wishlist;

pub use cart_item::{CartItem, CartView};
pub use order::{Order, OrderFilter, OrderWithItems};
pub use order_item::OrderItem;
pub use product::{NewProduct, Product, ProductFilter, ProductSort, ProductUpdate};
pub use profile::{NewProfile, Profile, ProfileAdminUpdate, ProfileUpdate};
pub use review::{NewReview, Review, ReviewEdit, ReviewVote};
pub use session::Session;
pub use wishlist::WishlistItem;
