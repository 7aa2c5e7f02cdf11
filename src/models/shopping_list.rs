use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{AggregationError, Recipe};

/// A recipe the user has put in their shopping cart
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CartEntry {
    pub recipe_id: String,
}

impl CartEntry {
    pub fn new(recipe_id: impl Into<String>) -> Self {
        Self {
            recipe_id: recipe_id.into(),
        }
    }
}

/// One ingredient requirement of a recipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientLine {
    pub name: String,
    pub measurement_unit: String,
    pub amount: u32,
}

impl IngredientLine {
    pub fn new(name: impl Into<String>, measurement_unit: impl Into<String>, amount: u32) -> Self {
        Self {
            name: name.into(),
            measurement_unit: measurement_unit.into(),
            amount,
        }
    }
}

/// Cart-wide total for one ingredient name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedLine {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: u64,
}

impl AggregatedLine {
    /// Printable form used in the downloadable document
    pub fn display_line(&self) -> String {
        format!(
            "{} - {} {}",
            self.name, self.total_amount, self.measurement_unit
        )
    }
}

/// Merged shopping list, in first-seen ingredient order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingList {
    pub lines: Vec<AggregatedLine>,
}

impl ShoppingList {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn total_amount(&self) -> u64 {
        self.lines.iter().map(|line| line.total_amount).sum()
    }

    pub fn display_lines(&self) -> Vec<String> {
        self.lines.iter().map(AggregatedLine::display_line).collect()
    }
}

/// Resolves a recipe to its ingredient lines.
///
/// Returns `None` when the recipe no longer exists.
pub trait IngredientLineLookup {
    fn ingredient_lines(&self, recipe_id: &str) -> Option<Vec<IngredientLine>>;
}

impl IngredientLineLookup for HashMap<String, Vec<IngredientLine>> {
    fn ingredient_lines(&self, recipe_id: &str) -> Option<Vec<IngredientLine>> {
        self.get(recipe_id).cloned()
    }
}

impl IngredientLineLookup for HashMap<String, Recipe> {
    fn ingredient_lines(&self, recipe_id: &str) -> Option<Vec<IngredientLine>> {
        self.get(recipe_id).map(Recipe::ingredient_lines)
    }
}

/// Merges the ingredient lines of every recipe in a cart by ingredient name.
///
/// Names are matched exactly. The first measurement unit seen for a name is
/// kept for the merged line, later units for the same name are not checked.
/// A cart entry whose recipe cannot be resolved fails the whole call.
pub struct ShoppingListAggregator;

impl ShoppingListAggregator {
    pub fn aggregate<L>(entries: &[CartEntry], lookup: &L) -> Result<ShoppingList, AggregationError>
    where
        L: IngredientLineLookup + ?Sized,
    {
        let mut totals: IndexMap<String, (String, u64)> = IndexMap::new();

        for entry in entries {
            let lines = lookup.ingredient_lines(&entry.recipe_id).ok_or_else(|| {
                AggregationError::RecipeNotFound {
                    recipe_id: entry.recipe_id.clone(),
                }
            })?;

            for line in lines {
                totals
                    .entry(line.name)
                    .and_modify(|(_, total)| *total += u64::from(line.amount))
                    .or_insert((line.measurement_unit, u64::from(line.amount)));
            }
        }

        let lines = totals
            .into_iter()
            .map(|(name, (measurement_unit, total_amount))| AggregatedLine {
                name,
                measurement_unit,
                total_amount,
            })
            .collect();

        Ok(ShoppingList { lines })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(recipes: &[(&str, Vec<IngredientLine>)]) -> HashMap<String, Vec<IngredientLine>> {
        recipes
            .iter()
            .map(|(id, lines)| (id.to_string(), lines.clone()))
            .collect()
    }

    fn line(name: &str, unit: &str, total_amount: u64) -> AggregatedLine {
        AggregatedLine {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            total_amount,
        }
    }

    #[test]
    fn test_merges_by_name_in_first_seen_order() {
        let recipes = lookup(&[
            (
                "A",
                vec![
                    IngredientLine::new("Salt", "g", 5),
                    IngredientLine::new("Sugar", "g", 10),
                ],
            ),
            ("B", vec![IngredientLine::new("Salt", "g", 3)]),
        ]);
        let cart = vec![CartEntry::new("A"), CartEntry::new("B")];

        let list = ShoppingListAggregator::aggregate(&cart, &recipes).unwrap();

        assert_eq!(list.lines, vec![line("Salt", "g", 8), line("Sugar", "g", 10)]);
        assert_eq!(list.display_lines(), vec!["Salt - 8 g", "Sugar - 10 g"]);
    }

    #[test]
    fn test_cart_order_drives_output_order() {
        let recipes = lookup(&[
            ("A", vec![IngredientLine::new("Salt", "g", 5)]),
            (
                "B",
                vec![
                    IngredientLine::new("Flour", "g", 200),
                    IngredientLine::new("Salt", "g", 3),
                ],
            ),
        ]);
        let cart = vec![CartEntry::new("B"), CartEntry::new("A")];

        let list = ShoppingListAggregator::aggregate(&cart, &recipes).unwrap();

        assert_eq!(
            list.lines,
            vec![line("Flour", "g", 200), line("Salt", "g", 8)]
        );
    }

    #[test]
    fn test_first_seen_unit_wins() {
        let recipes = lookup(&[
            ("A", vec![IngredientLine::new("Milk", "ml", 200)]),
            ("B", vec![IngredientLine::new("Milk", "cup", 1)]),
        ]);
        let cart = vec![CartEntry::new("A"), CartEntry::new("B")];

        let list = ShoppingListAggregator::aggregate(&cart, &recipes).unwrap();

        assert_eq!(list.lines, vec![line("Milk", "ml", 201)]);
    }

    #[test]
    fn test_zero_amount_is_kept() {
        let recipes = lookup(&[("A", vec![IngredientLine::new("Pepper", "pinch", 0)])]);
        let cart = vec![CartEntry::new("A")];

        let list = ShoppingListAggregator::aggregate(&cart, &recipes).unwrap();

        assert_eq!(list.lines, vec![line("Pepper", "pinch", 0)]);
        assert_eq!(list.display_lines(), vec!["Pepper - 0 pinch"]);
    }

    #[test]
    fn test_empty_cart_yields_empty_list() {
        let recipes = lookup(&[("A", vec![IngredientLine::new("Salt", "g", 5)])]);

        let list = ShoppingListAggregator::aggregate(&[], &recipes).unwrap();

        assert!(list.is_empty());
        assert_eq!(list.total_amount(), 0);
    }

    #[test]
    fn test_missing_recipe_fails_whole_call() {
        let recipes = lookup(&[("A", vec![IngredientLine::new("Salt", "g", 5)])]);
        let cart = vec![CartEntry::new("A"), CartEntry::new("GONE")];

        let err = ShoppingListAggregator::aggregate(&cart, &recipes).unwrap_err();

        assert_eq!(
            err,
            AggregationError::RecipeNotFound {
                recipe_id: "GONE".to_string()
            }
        );
    }

    #[test]
    fn test_same_recipe_twice_counts_twice() {
        let recipes = lookup(&[("A", vec![IngredientLine::new("Egg", "pcs", 2)])]);
        let cart = vec![CartEntry::new("A"), CartEntry::new("A")];

        let list = ShoppingListAggregator::aggregate(&cart, &recipes).unwrap();

        assert_eq!(list.lines, vec![line("Egg", "pcs", 4)]);
    }

    #[test]
    fn test_aggregation_is_repeatable() {
        let recipes = lookup(&[
            (
                "A",
                vec![
                    IngredientLine::new("Salt", "g", 5),
                    IngredientLine::new("Sugar", "g", 10),
                ],
            ),
            ("B", vec![IngredientLine::new("Salt", "g", 3)]),
        ]);
        let cart = vec![CartEntry::new("A"), CartEntry::new("B")];

        let first = ShoppingListAggregator::aggregate(&cart, &recipes).unwrap();
        let second = ShoppingListAggregator::aggregate(&cart, &recipes).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_large_amounts_do_not_overflow() {
        let recipes = lookup(&[("A", vec![IngredientLine::new("Water", "ml", u32::MAX)])]);
        let cart = vec![CartEntry::new("A"), CartEntry::new("A")];

        let list = ShoppingListAggregator::aggregate(&cart, &recipes).unwrap();

        assert_eq!(list.total_amount(), 2 * u64::from(u32::MAX));
    }
}
