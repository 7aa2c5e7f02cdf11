// Re-export all model types
pub use self::catalog::*;
pub use self::enums::*;
pub use self::errors::*;
pub use self::pagination::*;
pub use self::recipe::*;
pub use self::shopping_list::*;
pub use self::user::*;
pub use self::user_list::*;
pub use self::validation::*;

mod catalog;
mod enums;
mod errors;
mod pagination;
mod recipe;
mod shopping_list;
mod user;
mod user_list;
mod validation;

use uuid::Uuid;

/// Short prefixed identifier, e.g. `R1a2b3c4d`
pub(crate) fn generate_id(prefix: char) -> String {
    format!(
        "{}{}",
        prefix,
        Uuid::new_v4()
            .simple()
            .to_string()
            .get(0..8)
            .unwrap_or("00000000")
    )
}
