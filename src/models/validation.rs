use std::collections::HashSet;

use super::{
    CreateIngredientRequest, CreateRecipeRequest, CreateTagRequest, CreateUserRequest,
    IngredientAmount, UpdateRecipeRequest, ValidationError, ValidationResult,
};

/// Trait for validating input models
pub trait Validate {
    fn validate(&self) -> ValidationResult<()>;
}

/// Validation constants
pub const MAX_RECIPE_NAME_LENGTH: usize = 200;
pub const MAX_RECIPE_TEXT_LENGTH: usize = 10_000;
pub const MIN_COOKING_TIME: u32 = 1;
pub const MAX_COOKING_TIME: u32 = 32_000;
pub const MIN_INGREDIENT_AMOUNT: u32 = 1;
pub const MAX_INGREDIENT_AMOUNT: u32 = 32_000;
pub const MAX_RECIPE_INGREDIENTS: usize = 100;
pub const MAX_IMAGE_PATH_LENGTH: usize = 500;
pub const MAX_TAG_NAME_LENGTH: usize = 256;
pub const MAX_TAG_SLUG_LENGTH: usize = 64;
pub const MAX_INGREDIENT_NAME_LENGTH: usize = 64;
pub const MAX_MEASUREMENT_UNIT_LENGTH: usize = 32;
pub const MAX_USER_NAME_LENGTH: usize = 150;
pub const MAX_EMAIL_LENGTH: usize = 254;

impl Validate for CreateRecipeRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_recipe_name(&self.name)?;
        validate_recipe_text(&self.text)?;
        if let Some(image) = &self.image {
            validate_image_path(image)?;
        }
        validate_cooking_time(self.cooking_time)?;
        validate_recipe_tags(&self.tags)?;
        validate_recipe_ingredients(&self.ingredients)?;
        Ok(())
    }
}

impl Validate for UpdateRecipeRequest {
    fn validate(&self) -> ValidationResult<()> {
        if let Some(name) = &self.name {
            validate_recipe_name(name)?;
        }
        if let Some(text) = &self.text {
            validate_recipe_text(text)?;
        }
        if let Some(image) = &self.image {
            validate_image_path(image)?;
        }
        if let Some(cooking_time) = self.cooking_time {
            validate_cooking_time(cooking_time)?;
        }
        if let Some(tags) = &self.tags {
            validate_recipe_tags(tags)?;
        }
        if let Some(ingredients) = &self.ingredients {
            validate_recipe_ingredients(ingredients)?;
        }
        Ok(())
    }
}

impl Validate for CreateTagRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_required_text("tag_name", &self.name, MAX_TAG_NAME_LENGTH)?;
        validate_hex_color(&self.color)?;
        validate_slug(&self.slug)?;
        Ok(())
    }
}

impl Validate for CreateIngredientRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_required_text("ingredient_name", &self.name, MAX_INGREDIENT_NAME_LENGTH)?;
        validate_required_text(
            "measurement_unit",
            &self.measurement_unit,
            MAX_MEASUREMENT_UNIT_LENGTH,
        )?;
        Ok(())
    }
}

impl Validate for CreateUserRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_email(&self.email)?;
        validate_username(&self.username)?;
        validate_required_text("first_name", &self.first_name, MAX_USER_NAME_LENGTH)?;
        validate_required_text("last_name", &self.last_name, MAX_USER_NAME_LENGTH)?;
        Ok(())
    }
}

/// Non-empty after trimming, within `max_length` characters, no control characters
pub fn validate_required_text(field: &str, value: &str, max_length: usize) -> ValidationResult<()> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::RequiredField {
            field: field.to_string(),
        });
    }

    let length = trimmed.chars().count();
    if length > max_length {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max_length,
            actual_length: length,
        });
    }

    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "Contains invalid control characters".to_string(),
        });
    }

    Ok(())
}

pub fn validate_recipe_name(name: &str) -> ValidationResult<()> {
    validate_required_text("recipe_name", name, MAX_RECIPE_NAME_LENGTH)
}

pub fn validate_recipe_text(text: &str) -> ValidationResult<()> {
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::RequiredField {
            field: "text".to_string(),
        });
    }

    let length = trimmed.chars().count();
    if length > MAX_RECIPE_TEXT_LENGTH {
        return Err(ValidationError::TooLong {
            field: "text".to_string(),
            max_length: MAX_RECIPE_TEXT_LENGTH,
            actual_length: length,
        });
    }

    Ok(())
}

/// Image paths are relative to the media CDN and must name a picture
pub fn validate_image_path(image: &str) -> ValidationResult<()> {
    let trimmed = image.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::RequiredField {
            field: "image".to_string(),
        });
    }

    if trimmed.len() > MAX_IMAGE_PATH_LENGTH {
        return Err(ValidationError::TooLong {
            field: "image".to_string(),
            max_length: MAX_IMAGE_PATH_LENGTH,
            actual_length: trimmed.len(),
        });
    }

    let lower = trimmed.to_lowercase();
    if ![".jpg", ".jpeg", ".png", ".webp", ".gif"]
        .iter()
        .any(|extension| lower.ends_with(extension))
    {
        return Err(ValidationError::InvalidFormat {
            field: "image".to_string(),
            expected: "Valid image file extension (.jpg, .jpeg, .png, .webp, .gif)".to_string(),
        });
    }

    Ok(())
}

pub fn validate_cooking_time(cooking_time: u32) -> ValidationResult<()> {
    if !(MIN_COOKING_TIME..=MAX_COOKING_TIME).contains(&cooking_time) {
        return Err(ValidationError::OutOfRange {
            field: "cooking_time".to_string(),
            min: MIN_COOKING_TIME.to_string(),
            max: MAX_COOKING_TIME.to_string(),
            value: cooking_time.to_string(),
        });
    }

    Ok(())
}

pub fn validate_recipe_tags(tags: &[String]) -> ValidationResult<()> {
    if tags.is_empty() {
        return Err(ValidationError::RequiredField {
            field: "tags".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for (index, tag) in tags.iter().enumerate() {
        if tag.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: format!("tags[{}]", index),
                value: tag.clone(),
                reason: "Tag id cannot be empty".to_string(),
            });
        }
        if !seen.insert(tag.as_str()) {
            return Err(ValidationError::Duplicate {
                field: "tags".to_string(),
                value: tag.clone(),
            });
        }
    }

    Ok(())
}

pub fn validate_recipe_ingredients(ingredients: &[IngredientAmount]) -> ValidationResult<()> {
    if ingredients.is_empty() {
        return Err(ValidationError::RequiredField {
            field: "ingredients".to_string(),
        });
    }

    if ingredients.len() > MAX_RECIPE_INGREDIENTS {
        return Err(ValidationError::InvalidValue {
            field: "ingredients".to_string(),
            value: ingredients.len().to_string(),
            reason: format!(
                "Too many ingredients, maximum allowed: {}",
                MAX_RECIPE_INGREDIENTS
            ),
        });
    }

    let mut seen = HashSet::new();
    for (index, ingredient) in ingredients.iter().enumerate() {
        if ingredient.id.trim().is_empty() {
            return Err(ValidationError::RequiredField {
                field: format!("ingredients[{}].id", index),
            });
        }

        if !(MIN_INGREDIENT_AMOUNT..=MAX_INGREDIENT_AMOUNT).contains(&ingredient.amount) {
            return Err(ValidationError::OutOfRange {
                field: format!("ingredients[{}].amount", index),
                min: MIN_INGREDIENT_AMOUNT.to_string(),
                max: MAX_INGREDIENT_AMOUNT.to_string(),
                value: ingredient.amount.to_string(),
            });
        }

        if !seen.insert(ingredient.id.as_str()) {
            return Err(ValidationError::Duplicate {
                field: "ingredients".to_string(),
                value: ingredient.id.clone(),
            });
        }
    }

    Ok(())
}

/// `#RRGGBB`
pub fn validate_hex_color(color: &str) -> ValidationResult<()> {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "color".to_string(),
            expected: "Hex color in the form #RRGGBB".to_string(),
        });
    }

    Ok(())
}

pub fn validate_slug(slug: &str) -> ValidationResult<()> {
    if slug.is_empty() {
        return Err(ValidationError::RequiredField {
            field: "slug".to_string(),
        });
    }

    if slug.len() > MAX_TAG_SLUG_LENGTH {
        return Err(ValidationError::TooLong {
            field: "slug".to_string(),
            max_length: MAX_TAG_SLUG_LENGTH,
            actual_length: slug.len(),
        });
    }

    if !slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "slug".to_string(),
            expected: "Letters, numbers, hyphens and underscores".to_string(),
        });
    }

    Ok(())
}

pub fn validate_username(username: &str) -> ValidationResult<()> {
    validate_required_text("username", username, MAX_USER_NAME_LENGTH)?;

    if !username
        .trim()
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            expected: "Letters, digits and @/./+/-/_ only".to_string(),
        });
    }

    Ok(())
}

pub fn validate_email(email: &str) -> ValidationResult<()> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::RequiredField {
            field: "email".to_string(),
        });
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max_length: MAX_EMAIL_LENGTH,
            actual_length: trimmed.len(),
        });
    }

    let well_formed = match trimmed.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !trimmed.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if !well_formed {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            expected: "name@domain.tld".to_string(),
        });
    }

    Ok(())
}

/// Validate a path identifier (user, recipe, tag or ingredient id)
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    let trimmed = id.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::RequiredField {
            field: field.to_string(),
        });
    }

    if !trimmed
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            expected: format!(
                "{} must contain only alphanumeric characters, hyphens, and underscores",
                field
            ),
        });
    }

    if trimmed.len() > 100 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max_length: 100,
            actual_length: trimmed.len(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_recipe_request() -> CreateRecipeRequest {
        CreateRecipeRequest {
            name: "Omelette".to_string(),
            text: "Whisk the eggs and cook gently.".to_string(),
            image: Some("recipes/omelette.png".to_string()),
            cooking_time: 10,
            tags: vec!["T1".to_string(), "T2".to_string()],
            ingredients: vec![
                IngredientAmount {
                    id: "I1".to_string(),
                    amount: 3,
                },
                IngredientAmount {
                    id: "I2".to_string(),
                    amount: 5,
                },
            ],
        }
    }

    #[test]
    fn test_create_recipe_request_validation() {
        let valid_request = create_test_recipe_request();
        assert!(valid_request.validate().is_ok());

        let invalid_request = CreateRecipeRequest {
            name: "   ".to_string(),
            ..valid_request.clone()
        };
        assert!(invalid_request.validate().is_err());

        let too_long = CreateRecipeRequest {
            name: "a".repeat(MAX_RECIPE_NAME_LENGTH + 1),
            ..valid_request.clone()
        };
        assert!(matches!(
            too_long.validate(),
            Err(ValidationError::TooLong { .. })
        ));

        let no_image = CreateRecipeRequest {
            image: None,
            ..valid_request
        };
        assert!(no_image.validate().is_ok());
    }

    #[test]
    fn test_validate_cooking_time() {
        assert!(validate_cooking_time(1).is_ok());
        assert!(validate_cooking_time(MAX_COOKING_TIME).is_ok());
        assert!(validate_cooking_time(0).is_err());
        assert!(validate_cooking_time(MAX_COOKING_TIME + 1).is_err());
    }

    #[test]
    fn test_validate_recipe_ingredients() {
        let ingredients = create_test_recipe_request().ingredients;
        assert!(validate_recipe_ingredients(&ingredients).is_ok());

        assert!(validate_recipe_ingredients(&[]).is_err());

        let zero = vec![IngredientAmount {
            id: "I1".to_string(),
            amount: 0,
        }];
        assert!(matches!(
            validate_recipe_ingredients(&zero),
            Err(ValidationError::OutOfRange { .. })
        ));

        let duplicated = vec![ingredients[0].clone(), ingredients[0].clone()];
        assert!(matches!(
            validate_recipe_ingredients(&duplicated),
            Err(ValidationError::Duplicate { .. })
        ));
    }

    #[test]
    fn test_validate_recipe_tags() {
        assert!(validate_recipe_tags(&["T1".to_string()]).is_ok());
        assert!(validate_recipe_tags(&[]).is_err());
        assert!(validate_recipe_tags(&["T1".to_string(), "T1".to_string()]).is_err());
    }

    #[test]
    fn test_update_request_validates_present_fields_only() {
        assert!(UpdateRecipeRequest::default().validate().is_ok());

        let update = UpdateRecipeRequest {
            cooking_time: Some(0),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_validate_image_path() {
        assert!(validate_image_path("recipes/cake.jpg").is_ok());
        assert!(validate_image_path("recipes/CAKE.PNG").is_ok());
        assert!(validate_image_path("").is_err());
        assert!(validate_image_path("recipes/cake.txt").is_err());
    }

    #[test]
    fn test_validate_hex_color() {
        assert!(validate_hex_color("#E26C2D").is_ok());
        assert!(validate_hex_color("#49b64e").is_ok());
        assert!(validate_hex_color("E26C2D").is_err());
        assert!(validate_hex_color("#E26C2").is_err());
        assert!(validate_hex_color("#GGGGGG").is_err());
    }

    #[test]
    fn test_tag_request_validation() {
        let valid = CreateTagRequest {
            name: "Lunch".to_string(),
            color: "#49B64E".to_string(),
            slug: "lunch".to_string(),
        };
        assert!(valid.validate().is_ok());

        let bad_slug = CreateTagRequest {
            slug: "lunch time".to_string(),
            ..valid
        };
        assert!(bad_slug.validate().is_err());
    }

    #[test]
    fn test_ingredient_request_validation() {
        let valid = CreateIngredientRequest {
            name: "Salt".to_string(),
            measurement_unit: "g".to_string(),
        };
        assert!(valid.validate().is_ok());

        let missing_unit = CreateIngredientRequest {
            measurement_unit: " ".to_string(),
            ..valid
        };
        assert!(missing_unit.validate().is_err());
    }

    #[test]
    fn test_user_request_validation() {
        let valid = CreateUserRequest {
            email: "cook@example.com".to_string(),
            username: "cook.book+1".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
        };
        assert!(valid.validate().is_ok());

        let bad_email = CreateUserRequest {
            email: "cook@localhost".to_string(),
            ..valid.clone()
        };
        assert!(bad_email.validate().is_err());

        let bad_username = CreateUserRequest {
            username: "cook book".to_string(),
            ..valid.clone()
        };
        assert!(bad_username.validate().is_err());

        let long_name = CreateUserRequest {
            first_name: "a".repeat(MAX_USER_NAME_LENGTH + 1),
            ..valid
        };
        assert!(long_name.validate().is_err());
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("user_id", "U1a2b3c4d").is_ok());
        assert!(validate_id("user_id", "").is_err());
        assert!(validate_id("user_id", "U 1").is_err());
        assert!(validate_id("user_id", &"a".repeat(101)).is_err());
    }
}
