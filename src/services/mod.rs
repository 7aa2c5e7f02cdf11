// Services module - business logic layer

pub mod catalog_service;
pub mod collection_service;
pub mod recipe_service;
pub mod shopping_list_document;
pub mod shopping_list_service;
pub mod user_service;

pub use catalog_service::CatalogService;
pub use collection_service::CollectionService;
pub use recipe_service::RecipeService;
pub use shopping_list_document::{render_pdf, RenderError, PDF_CONTENT_TYPE, PDF_FILE_NAME};
pub use shopping_list_service::ShoppingListService;
pub use user_service::UserService;
