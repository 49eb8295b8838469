pub mod aggregation;

pub use aggregation::{build_shopping_list, ShoppingListEntry};
