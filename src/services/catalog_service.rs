use std::sync::Arc;
use tracing::{info, instrument};

use crate::models::{
    CreateIngredientRequest, CreateTagRequest, Ingredient, ServiceError, ServiceResult, Tag,
    Validate,
};
use crate::repositories::{IngredientRepository, TagRepository};

/// Tags and ingredients: read by everyone, written by admins
pub struct CatalogService {
    tag_repository: Arc<dyn TagRepository>,
    ingredient_repository: Arc<dyn IngredientRepository>,
}

impl CatalogService {
    pub fn new(
        tag_repository: Arc<dyn TagRepository>,
        ingredient_repository: Arc<dyn IngredientRepository>,
    ) -> Self {
        Self {
            tag_repository,
            ingredient_repository,
        }
    }

    #[instrument(skip(self))]
    pub async fn list_tags(&self) -> ServiceResult<Vec<Tag>> {
        let tags = self.tag_repository.find_all().await?;
        info!("Listed {} tags", tags.len());
        Ok(tags)
    }

    #[instrument(skip(self), fields(tag_id = %tag_id))]
    pub async fn get_tag(&self, tag_id: &str) -> ServiceResult<Tag> {
        self.tag_repository
            .find_by_id(tag_id)
            .await?
            .ok_or_else(|| ServiceError::TagNotFound {
                id: tag_id.to_string(),
            })
    }

    /// Create a tag; name, color and slug must each be unused
    #[instrument(skip(self, request), fields(slug = %request.slug))]
    pub async fn create_tag(&self, request: CreateTagRequest) -> ServiceResult<Tag> {
        request.validate()?;
        let tag = Tag::new(request);

        let existing = self.tag_repository.find_all().await?;
        for other in &existing {
            let clash = if other.name == tag.name {
                Some(("name", &tag.name))
            } else if other.color.eq_ignore_ascii_case(&tag.color) {
                Some(("color", &tag.color))
            } else if other.slug == tag.slug {
                Some(("slug", &tag.slug))
            } else {
                None
            };

            if let Some((field, value)) = clash {
                return Err(ServiceError::AlreadyExists {
                    field: field.to_string(),
                    value: value.clone(),
                });
            }
        }

        let created = self.tag_repository.create(tag).await?;
        info!(tag_id = %created.id, "Tag created");
        Ok(created)
    }

    /// Ingredients ordered by name, optionally filtered by a name prefix
    #[instrument(skip(self))]
    pub async fn list_ingredients(&self, name: Option<String>) -> ServiceResult<Vec<Ingredient>> {
        let prefix = name.filter(|name| !name.trim().is_empty());
        let ingredients = self.ingredient_repository.find_all(prefix).await?;
        info!("Listed {} ingredients", ingredients.len());
        Ok(ingredients)
    }

    #[instrument(skip(self), fields(ingredient_id = %ingredient_id))]
    pub async fn get_ingredient(&self, ingredient_id: &str) -> ServiceResult<Ingredient> {
        self.ingredient_repository
            .find_by_id(ingredient_id)
            .await?
            .ok_or_else(|| ServiceError::IngredientNotFound {
                id: ingredient_id.to_string(),
            })
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_ingredient(
        &self,
        request: CreateIngredientRequest,
    ) -> ServiceResult<Ingredient> {
        request.validate()?;

        let created = self
            .ingredient_repository
            .create(Ingredient::new(request))
            .await?;
        info!(ingredient_id = %created.id, "Ingredient created");
        Ok(created)
    }
}
