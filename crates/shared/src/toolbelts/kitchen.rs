// crates/shared/src/toolbelts/kitchen.rs
use anyhow::{anyhow, bail, Result};
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::{json, Map, Number, Value};

use crate::register_toolbelt;

#[derive(Serialize, Clone, Debug)]
struct Dish {
    nom: &'static str,
    prix: i64,
    allergenes: &'static [&'static str],
    categorie: &'static str,
}

static MENU: Lazy<Vec<Dish>> = Lazy::new(|| {
    vec![
        Dish { nom: "Bâtonnets Légumes", prix: 3, allergenes: &[], categorie: "Apéritif" },
        Dish { nom: "Soupe Potiron", prix: 8, allergenes: &[], categorie: "Entrée" },
        Dish { nom: "Salade Quinoa", prix: 11, allergenes: &[], categorie: "Entrée" },
        Dish { nom: "Gratin Dauphinois", prix: 14, allergenes: &["lactose"], categorie: "Plat" },
        Dish { nom: "Curry Légumes", prix: 16, allergenes: &[], categorie: "Plat" },
        Dish { nom: "Tarte Noix", prix: 7, allergenes: &["fruits à coque", "gluten"], categorie: "Dessert" },
        Dish { nom: "Sorbet Citron", prix: 5, allergenes: &[], categorie: "Dessert" },
        Dish { nom: "Salade Fruits", prix: 6, allergenes: &[], categorie: "Dessert" },
    ]
});

static DIETARY_INFO: &[(&str, &str)] = &[
    ("olive", "Fruit à coque"),
    ("quinoa", "Sans gluten"),
    ("potiron", "Faible index glycémique"),
    ("citron", "Faible en sucre"),
    ("champignons", "Légume"),
    ("épinards", "Légume"),
];

/// Fake restaurant kitchen: ranked meals, fridge contents, menu and bill.
#[derive(Default)]
pub struct Kitchen;

register_toolbelt! {
    Kitchen {
        description: "Meal planning helpers backed by fixed sample data",
        tools: {
            "get_best_meals" => get_best_meals {
                description: "Get the official ranked list of best meals with the ingredients each one needs.",
                params: []
            },
            "get_fridge_inventory" => get_fridge_inventory {
                description: "Get the fridge contents with available quantities.",
                params: []
            },
            "menu_search" => menu_search {
                description: "Search restaurant dishes, optionally filtered by course, price and allergen.",
                params: [
                    #[optional] "category": "string" => "Course name, e.g. 'Entrée', 'Plat', 'Dessert'",
                    #[optional] "max_price": "integer" => "Maximum price per dish in euros",
                    #[optional] "allergen_free": "string" => "Exclude dishes containing this allergen"
                ]
            },
            "check_dietary_info" => check_dietary_info {
                description: "Nutritional information for one ingredient.",
                params: [
                    "ingredient": "string" => "Ingredient name, e.g. 'quinoa'"
                ]
            },
            "calculate_bill" => calculate_bill {
                description: "Add up a list of dish prices and return the total in euros.",
                params: [
                    "prices": "array" => "Dish prices in euros"
                ]
            },
        }
    }
}

impl Kitchen {
    fn get_best_meals(&self, _args: &Map<String, Value>) -> Result<Value> {
        Ok(json!({
            "1": { "nom": "pizza au chorizo", "ingredients": ["farine", "tomates", "chorizo", "fromage", "levure"] },
            "2": { "nom": "burger avec frites", "ingredients": ["pain", "steak", "salade", "tomates", "fromage", "pommes de terre"] },
            "3": { "nom": "pâtes au beurre", "ingredients": ["pâtes", "beurre", "fromage"] },
            "4": { "nom": "salade de haricots verts", "ingredients": ["haricots verts", "oignons", "vinaigrette"] },
            "5": { "nom": "soupe de poisson", "ingredients": ["poisson", "pommes de terre", "oignons", "carottes"] },
            "6": { "nom": "sushi", "ingredients": ["riz", "poisson cru", "algues", "sauce soja"] }
        }))
    }

    fn get_fridge_inventory(&self, _args: &Map<String, Value>) -> Result<Value> {
        Ok(json!({
            "lait": 1,
            "oeufs": 12,
            "pommes de terre": 3,
            "steak": 3,
            "fromage": 1,
            "pain": 2,
            "salade": 1,
            "tomates": 1
        }))
    }

    fn menu_search(&self, args: &Map<String, Value>) -> Result<String> {
        let category = args.get("category").and_then(Value::as_str).filter(|s| !s.is_empty());
        let max_price = args.get("max_price").and_then(Value::as_i64);
        let allergen_free = args
            .get("allergen_free")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let results: Vec<&Dish> = MENU
            .iter()
            .filter(|d| category.is_none_or(|c| d.categorie.to_lowercase() == c.to_lowercase()))
            .filter(|d| max_price.is_none_or(|max| d.prix <= max))
            .filter(|d| {
                allergen_free
                    .as_deref()
                    .is_none_or(|a| !d.allergenes.iter().any(|x| x.to_lowercase() == a))
            })
            .collect();

        if results.is_empty() {
            return Ok("Aucun plat".to_string());
        }
        Ok(serde_json::to_string(&results)?)
    }

    fn check_dietary_info(&self, args: &Map<String, Value>) -> Result<String> {
        let ingredient = args
            .get("ingredient")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_lowercase();

        Ok(DIETARY_INFO
            .iter()
            .find(|(name, _)| *name == ingredient)
            .map(|(_, info)| info.to_string())
            .unwrap_or_else(|| "Info inconnue".to_string()))
    }

    fn calculate_bill(&self, args: &Map<String, Value>) -> Result<Value> {
        let prices = args
            .get("prices")
            .and_then(Value::as_array)
            .ok_or_else(|| anyhow!("'prices' must be an array"))?;

        let mut total = 0.0_f64;
        for price in prices {
            let amount = match price {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            }
            .filter(|amount| amount.is_finite())
            .ok_or_else(|| anyhow!("invalid price {}", price))?;
            total += amount;
        }

        if !total.is_finite() {
            bail!("bill total is out of range");
        }
        // whole totals stay integers so "32" does not render as "32.0"
        if total.fract() == 0.0 && total.abs() < 1e15 {
            return Ok(Value::from(total as i64));
        }
        Number::from_f64(total)
            .map(Value::Number)
            .ok_or_else(|| anyhow!("bill total is out of range"))
    }
}
