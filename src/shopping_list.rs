// Copyright 2023 Remi Bernotavicius

//! Turns a user's shopping cart into a plain text list of everything to buy.

use crate::database;
use crate::database::models::UserId;
use crate::database::schema::{ingredients, recipe_ingredients, shopping_carts};
use crate::error::AppResult;
use diesel::ExpressionMethods as _;
use diesel::JoinOnDsl as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;
use std::collections::BTreeMap;
use std::fmt;

const HEADER: &str = "Foodgram shopping list:";
const EMPTY_MESSAGE: &str = "Your shopping list is empty.";

/// Totals keyed by ingredient name and measurement unit. Two ingredient records that share both
/// end up on the same line.
type Totals = BTreeMap<(String, String), i64>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingList {
    totals: Totals,
}

impl ShoppingList {
    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn file_name(&self) -> &'static str {
        if self.is_empty() {
            "empty_shopping_list.txt"
        } else {
            "shopping_list.txt"
        }
    }
}

impl fmt::Display for ShoppingList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "{EMPTY_MESSAGE}");
        }
        writeln!(f, "{HEADER}")?;
        writeln!(f)?;
        for ((name, unit), total) in &self.totals {
            writeln!(f, "- {name} ({unit}) - {total}")?;
        }
        Ok(())
    }
}

fn sum_by_name_and_unit(rows: Vec<(String, String, i32)>) -> Totals {
    let mut totals = Totals::new();
    for (name, unit, amount) in rows {
        *totals.entry((name, unit)).or_default() += i64::from(amount);
    }
    totals
}

pub fn build_report(conn: &mut database::Connection, user: UserId) -> AppResult<ShoppingList> {
    let rows: Vec<(String, String, i32)> = recipe_ingredients::table
        .inner_join(ingredients::table)
        .inner_join(
            shopping_carts::table.on(shopping_carts::recipe_id.eq(recipe_ingredients::recipe_id)),
        )
        .filter(shopping_carts::user_id.eq(user))
        .select((
            ingredients::name,
            ingredients::measurement_unit,
            recipe_ingredients::amount,
        ))
        .load(conn)?;
    log::debug!("user {user}: {} ingredient rows in the cart", rows.len());

    Ok(ShoppingList {
        totals: sum_by_name_and_unit(rows),
    })
}

#[cfg(test)]
fn totals_of(list: &ShoppingList) -> BTreeMap<(&str, &str), i64> {
    list.totals
        .iter()
        .map(|((name, unit), total)| ((name.as_str(), unit.as_str()), *total))
        .collect()
}

#[test]
fn sums_across_recipes_and_duplicate_records() {
    use crate::catalog::create_ingredient;
    use crate::recipes::recipe_fixture;
    use crate::relations::{toggle_on, RecipeRelation};
    use crate::users::user_fixture;
    use maplit::btreemap;

    let mut conn = database::test_connection();
    let alice = user_fixture(&mut conn, "alice");
    let bob = user_fixture(&mut conn, "bob");
    let eggs = create_ingredient(&mut conn, "eggs", "pcs").unwrap();
    let more_eggs = create_ingredient(&mut conn, "eggs", "pcs").unwrap();
    let eggs_by_weight = create_ingredient(&mut conn, "eggs", "g").unwrap();
    let flour = create_ingredient(&mut conn, "flour", "g").unwrap();

    let omelette = recipe_fixture(&mut conn, bob.id, "Omelette", &[(eggs.id, 2)]);
    let pancakes = recipe_fixture(
        &mut conn,
        bob.id,
        "Pancakes",
        &[(more_eggs.id, 3), (flour.id, 200)],
    );
    let meringue = recipe_fixture(&mut conn, bob.id, "Meringue", &[(eggs_by_weight.id, 120)]);
    let uncarted = recipe_fixture(&mut conn, bob.id, "Bread", &[(flour.id, 500)]);

    for recipe in [&omelette, &pancakes, &meringue] {
        toggle_on(&mut conn, RecipeRelation::ShoppingCart, alice.id, recipe.id).unwrap();
    }
    toggle_on(&mut conn, RecipeRelation::ShoppingCart, bob.id, uncarted.id).unwrap();

    let list = build_report(&mut conn, alice.id).unwrap();
    assert_eq!(
        totals_of(&list),
        btreemap! {
            ("eggs", "g") => 120,
            ("eggs", "pcs") => 5,
            ("flour", "g") => 200,
        }
    );
    assert_eq!(list.file_name(), "shopping_list.txt");
    assert_eq!(
        list.to_string(),
        "Foodgram shopping list:\n\
         \n\
         - eggs (g) - 120\n\
         - eggs (pcs) - 5\n\
         - flour (g) - 200\n"
    );
}

#[test]
fn empty_cart() {
    let mut conn = database::test_connection();
    let alice = crate::users::user_fixture(&mut conn, "alice");

    let list = build_report(&mut conn, alice.id).unwrap();
    assert!(list.is_empty());
    assert_eq!(list.file_name(), "empty_shopping_list.txt");
    assert_eq!(list.to_string(), "Your shopping list is empty.\n");
}

#[test]
fn totals_do_not_overflow() {
    use crate::recipes::MAX_INGREDIENT_AMOUNT;

    let rows = (0..100_000)
        .map(|_| ("salt".to_string(), "g".to_string(), MAX_INGREDIENT_AMOUNT))
        .collect();
    let totals = sum_by_name_and_unit(rows);
    assert_eq!(
        totals[&("salt".to_string(), "g".to_string())],
        100_000 * i64::from(MAX_INGREDIENT_AMOUNT)
    );
}
