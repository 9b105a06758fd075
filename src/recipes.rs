// Copyright 2023 Remi Bernotavicius

use crate::database;
use crate::database::models::{
    Ingredient, IngredientId, NewRecipeIngredient, NewRecipeTag, Recipe, RecipeId,
    RecipeIngredient, Tag, TagId, UserId,
};
use crate::database::schema::{
    favorites, ingredients, recipe_ingredients, recipe_tags, recipes, shopping_carts, tags,
};
use crate::error::{AppError, AppResult};
use crate::pagination::{Page, PageRequest};
use crate::users;
use diesel::prelude::Connection as _;
use diesel::prelude::OptionalExtension as _;
use diesel::sqlite::Sqlite;
use diesel::BelongingToDsl as _;
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;
use std::collections::HashSet;

pub const MIN_COOKING_TIME: i32 = 1;
pub const MAX_COOKING_TIME: i32 = 32_000;
pub const MIN_INGREDIENT_AMOUNT: i32 = 1;
pub const MAX_INGREDIENT_AMOUNT: i32 = 32_000;

const MAX_RECIPE_NAME_LENGTH: usize = 200;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct IngredientAmount {
    pub ingredient: IngredientId,
    pub amount: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeFields {
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

/// Changes to an existing recipe. Scalar fields left as `None` keep their current value, and so
/// do the tags. The ingredients have no such option: an update always carries the complete new
/// ingredient set since the old one is thrown away.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipePatch {
    pub name: Option<String>,
    pub image: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
    pub ingredients: Option<Vec<IngredientAmount>>,
    pub tags: Option<Vec<TagId>>,
}

fn validate_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::validation("name: this field is required"));
    }
    if name.chars().count() > MAX_RECIPE_NAME_LENGTH {
        return Err(AppError::validation(format!(
            "name: must be at most {MAX_RECIPE_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_required(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field}: this field is required")));
    }
    Ok(())
}

pub fn validate_cooking_time(cooking_time: i32) -> AppResult<()> {
    if !(MIN_COOKING_TIME..=MAX_COOKING_TIME).contains(&cooking_time) {
        return Err(AppError::validation(format!(
            "cooking_time: must be between {MIN_COOKING_TIME} and {MAX_COOKING_TIME} minutes"
        )));
    }
    Ok(())
}

pub fn validate_ingredients(items: &[IngredientAmount]) -> AppResult<()> {
    if items.is_empty() {
        return Err(AppError::validation(
            "ingredients: at least one ingredient is required",
        ));
    }
    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(item.ingredient) {
            return Err(AppError::validation(format!(
                "ingredients: ingredient {} is listed more than once",
                item.ingredient
            )));
        }
        if !(MIN_INGREDIENT_AMOUNT..=MAX_INGREDIENT_AMOUNT).contains(&item.amount) {
            return Err(AppError::validation(format!(
                "ingredients: amount must be between {MIN_INGREDIENT_AMOUNT} and \
                 {MAX_INGREDIENT_AMOUNT}"
            )));
        }
    }
    Ok(())
}

pub fn validate_tags(items: &[TagId]) -> AppResult<()> {
    let mut seen = HashSet::new();
    for tag in items {
        if !seen.insert(*tag) {
            return Err(AppError::validation(format!(
                "tags: tag {tag} is listed more than once"
            )));
        }
    }
    Ok(())
}

impl RecipeFields {
    fn validate(&self) -> AppResult<()> {
        validate_name(&self.name)?;
        validate_required("image", &self.image)?;
        validate_required("text", &self.text)?;
        validate_cooking_time(self.cooking_time)
    }
}

impl RecipePatch {
    fn validate(&self) -> AppResult<&[IngredientAmount]> {
        let Some(new_ingredients) = &self.ingredients else {
            return Err(AppError::validation(
                "ingredients: this field is required when updating a recipe",
            ));
        };
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(image) = &self.image {
            validate_required("image", image)?;
        }
        if let Some(text) = &self.text {
            validate_required("text", text)?;
        }
        if let Some(cooking_time) = self.cooking_time {
            validate_cooking_time(cooking_time)?;
        }
        validate_ingredients(new_ingredients)?;
        if let Some(new_tags) = &self.tags {
            validate_tags(new_tags)?;
        }
        Ok(new_ingredients)
    }
}

fn ensure_ingredients_exist(
    conn: &mut database::Connection,
    items: &[IngredientAmount],
) -> AppResult<()> {
    let wanted: Vec<IngredientId> = items.iter().map(|i| i.ingredient).collect();
    let found: HashSet<IngredientId> = ingredients::table
        .filter(ingredients::id.eq_any(wanted.clone()))
        .select(ingredients::id)
        .load(conn)?
        .into_iter()
        .collect();
    match wanted.iter().find(|i| !found.contains(*i)) {
        Some(missing) => Err(AppError::not_found(format!("ingredient {missing}"))),
        None => Ok(()),
    }
}

fn ensure_tags_exist(conn: &mut database::Connection, wanted: &[TagId]) -> AppResult<()> {
    let found: HashSet<TagId> = tags::table
        .filter(tags::id.eq_any(wanted.to_vec()))
        .select(tags::id)
        .load(conn)?
        .into_iter()
        .collect();
    match wanted.iter().find(|t| !found.contains(*t)) {
        Some(missing) => Err(AppError::not_found(format!("tag {missing}"))),
        None => Ok(()),
    }
}

fn ensure_author(recipe: &Recipe, actor: UserId) -> AppResult<()> {
    if recipe.author_id != actor {
        return Err(AppError::Forbidden(format!(
            "only the author may change recipe {}",
            recipe.id
        )));
    }
    Ok(())
}

/// Drops every ingredient row of the recipe and writes `items` in their place. Rows are never
/// diffed against what was there before.
fn replace_ingredients(
    conn: &mut database::Connection,
    recipe: RecipeId,
    items: &[IngredientAmount],
) -> AppResult<()> {
    use diesel::{delete, insert_into};

    let removed = delete(recipe_ingredients::table.filter(recipe_ingredients::recipe_id.eq(recipe)))
        .execute(conn)?;

    let rows: Vec<NewRecipeIngredient> = items
        .iter()
        .map(|i| NewRecipeIngredient {
            recipe_id: recipe,
            ingredient_id: i.ingredient,
            amount: i.amount,
        })
        .collect();
    insert_into(recipe_ingredients::table)
        .values(&rows)
        .execute(conn)?;
    log::debug!(
        "recipe {recipe}: replaced {removed} ingredient rows with {}",
        rows.len()
    );
    Ok(())
}

fn replace_tags(conn: &mut database::Connection, recipe: RecipeId, items: &[TagId]) -> AppResult<()> {
    use diesel::{delete, insert_into};

    delete(recipe_tags::table.filter(recipe_tags::recipe_id.eq(recipe))).execute(conn)?;
    let rows: Vec<NewRecipeTag> = items
        .iter()
        .map(|&tag_id| NewRecipeTag {
            recipe_id: recipe,
            tag_id,
        })
        .collect();
    if !rows.is_empty() {
        insert_into(recipe_tags::table).values(&rows).execute(conn)?;
    }
    Ok(())
}

pub fn create_recipe(
    conn: &mut database::Connection,
    author: UserId,
    fields: RecipeFields,
    new_ingredients: Vec<IngredientAmount>,
    new_tags: Vec<TagId>,
) -> AppResult<Recipe> {
    use diesel::insert_into;

    fields.validate()?;
    validate_ingredients(&new_ingredients)?;
    validate_tags(&new_tags)?;

    let recipe = conn.transaction::<_, AppError, _>(|conn| {
        users::get_user(conn, author)?;
        ensure_ingredients_exist(conn, &new_ingredients)?;
        ensure_tags_exist(conn, &new_tags)?;

        let recipe = insert_into(recipes::table)
            .values((
                recipes::author_id.eq(author),
                recipes::name.eq(&fields.name),
                recipes::image.eq(&fields.image),
                recipes::text.eq(&fields.text),
                recipes::cooking_time.eq(fields.cooking_time),
                recipes::pub_date.eq(database::now()),
            ))
            .returning(Recipe::as_returning())
            .get_result(conn)?;
        replace_ingredients(conn, recipe.id, &new_ingredients)?;
        replace_tags(conn, recipe.id, &new_tags)?;
        Ok(recipe)
    })?;
    log::info!("user {author} created recipe {} ({})", recipe.id, recipe.name);
    Ok(recipe)
}

pub fn update_recipe(
    conn: &mut database::Connection,
    actor: UserId,
    recipe_id: RecipeId,
    patch: RecipePatch,
) -> AppResult<Recipe> {
    use diesel::update;

    let recipe = conn.transaction::<_, AppError, _>(|conn| {
        let existing = get_recipe(conn, recipe_id)?;
        ensure_author(&existing, actor)?;
        let new_ingredients = patch.validate()?;
        ensure_ingredients_exist(conn, new_ingredients)?;
        if let Some(new_tags) = &patch.tags {
            ensure_tags_exist(conn, new_tags)?;
        }

        let recipe = update(recipes::table.find(recipe_id))
            .set((
                recipes::name.eq(patch.name.as_ref().unwrap_or(&existing.name)),
                recipes::image.eq(patch.image.as_ref().unwrap_or(&existing.image)),
                recipes::text.eq(patch.text.as_ref().unwrap_or(&existing.text)),
                recipes::cooking_time.eq(patch.cooking_time.unwrap_or(existing.cooking_time)),
            ))
            .returning(Recipe::as_returning())
            .get_result(conn)?;
        replace_ingredients(conn, recipe_id, new_ingredients)?;
        if let Some(new_tags) = &patch.tags {
            replace_tags(conn, recipe_id, new_tags)?;
        }
        Ok(recipe)
    })?;
    log::info!("user {actor} updated recipe {recipe_id}");
    Ok(recipe)
}

pub fn delete_recipe(
    conn: &mut database::Connection,
    actor: UserId,
    recipe_id: RecipeId,
) -> AppResult<()> {
    use diesel::delete;

    conn.transaction::<_, AppError, _>(|conn| {
        let existing = get_recipe(conn, recipe_id)?;
        ensure_author(&existing, actor)?;
        delete(recipes::table.find(recipe_id)).execute(conn)?;
        Ok(())
    })?;
    log::info!("user {actor} deleted recipe {recipe_id}");
    Ok(())
}

pub fn get_recipe(conn: &mut database::Connection, recipe_id: RecipeId) -> AppResult<Recipe> {
    recipes::table
        .find(recipe_id)
        .select(Recipe::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found(format!("recipe {recipe_id}")))
}

pub fn ingredients_of(
    conn: &mut database::Connection,
    recipe: &Recipe,
) -> AppResult<Vec<(RecipeIngredient, Ingredient)>> {
    Ok(RecipeIngredient::belonging_to(recipe)
        .inner_join(ingredients::table)
        .select((RecipeIngredient::as_select(), Ingredient::as_select()))
        .order(recipe_ingredients::id)
        .load(conn)?)
}

pub fn tags_of(conn: &mut database::Connection, recipe_id: RecipeId) -> AppResult<Vec<Tag>> {
    Ok(recipe_tags::table
        .inner_join(tags::table)
        .filter(recipe_tags::recipe_id.eq(recipe_id))
        .select(Tag::as_select())
        .order(tags::name)
        .load(conn)?)
}

/// The most recent recipes of `author`, all of them when `limit` is absent or not positive.
pub fn author_recipes(
    conn: &mut database::Connection,
    author: UserId,
    limit: Option<i64>,
) -> AppResult<Vec<Recipe>> {
    let mut query = recipes::table
        .filter(recipes::author_id.eq(author))
        .order((recipes::pub_date.desc(), recipes::id.desc()))
        .into_boxed();
    if let Some(limit) = limit.filter(|l| *l > 0) {
        query = query.limit(limit);
    }
    Ok(query.load::<Recipe>(conn)?)
}

pub fn author_recipe_count(conn: &mut database::Connection, author: UserId) -> AppResult<i64> {
    Ok(recipes::table
        .filter(recipes::author_id.eq(author))
        .count()
        .get_result(conn)?)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub author: Option<UserId>,
    /// Tag slugs; a recipe matches when it carries any of them.
    pub tags: Vec<String>,
    pub is_favorited: Option<bool>,
    pub is_in_shopping_cart: Option<bool>,
}

/// Returns `None` when the filter can't match anything, which is the case for an anonymous viewer
/// asking for their own favorites or cart.
fn filtered_recipes(
    viewer: Option<UserId>,
    filter: &RecipeFilter,
) -> Option<recipes::BoxedQuery<'static, Sqlite>> {
    let mut query = recipes::table.into_boxed();

    if let Some(author) = filter.author {
        query = query.filter(recipes::author_id.eq(author));
    }
    if !filter.tags.is_empty() {
        let tagged = recipe_tags::table
            .inner_join(tags::table)
            .filter(tags::slug.eq_any(filter.tags.clone()))
            .select(recipe_tags::recipe_id);
        query = query.filter(recipes::id.eq_any(tagged));
    }

    match (filter.is_favorited, viewer) {
        (Some(true), None) => return None,
        (Some(wanted), Some(viewer)) => {
            let marked = favorites::table
                .filter(favorites::user_id.eq(viewer))
                .select(favorites::recipe_id);
            query = if wanted {
                query.filter(recipes::id.eq_any(marked))
            } else {
                query.filter(recipes::id.ne_all(marked))
            };
        }
        _ => {}
    }

    match (filter.is_in_shopping_cart, viewer) {
        (Some(true), None) => return None,
        (Some(wanted), Some(viewer)) => {
            let marked = shopping_carts::table
                .filter(shopping_carts::user_id.eq(viewer))
                .select(shopping_carts::recipe_id);
            query = if wanted {
                query.filter(recipes::id.eq_any(marked))
            } else {
                query.filter(recipes::id.ne_all(marked))
            };
        }
        _ => {}
    }

    Some(query)
}

/// Recipes newest first, narrowed down by `filter`.
pub fn list_recipes(
    conn: &mut database::Connection,
    viewer: Option<UserId>,
    filter: &RecipeFilter,
    page: PageRequest,
) -> AppResult<Page<Recipe>> {
    let (Some(counted), Some(listed)) = (
        filtered_recipes(viewer, filter),
        filtered_recipes(viewer, filter),
    ) else {
        return Ok(page.into_page(0, vec![]));
    };

    let count: i64 = counted.count().get_result(conn)?;
    page.check(count)?;

    let results = listed
        .order((recipes::pub_date.desc(), recipes::id.desc()))
        .limit(page.limit)
        .offset(page.offset())
        .load::<Recipe>(conn)?;
    log::debug!("listed {} of {count} recipes", results.len());
    Ok(page.into_page(count, results))
}

pub fn short_link(
    conn: &mut database::Connection,
    base_url: &str,
    recipe_id: RecipeId,
) -> AppResult<String> {
    let recipe = get_recipe(conn, recipe_id)?;
    Ok(format!("{}/r/{}", base_url.trim_end_matches('/'), recipe.id))
}

#[cfg(test)]
pub fn recipe_fixture(
    conn: &mut database::Connection,
    author: UserId,
    name: &str,
    items: &[(IngredientId, i32)],
) -> Recipe {
    create_recipe(
        conn,
        author,
        RecipeFields {
            name: name.into(),
            image: format!("recipes/images/{name}.png"),
            text: format!("How to make {name}"),
            cooking_time: 10,
        },
        items
            .iter()
            .map(|&(ingredient, amount)| IngredientAmount { ingredient, amount })
            .collect(),
        vec![],
    )
    .unwrap()
}

#[cfg(test)]
fn amounts(conn: &mut database::Connection, recipe: &Recipe) -> Vec<(String, i32)> {
    ingredients_of(conn, recipe)
        .unwrap()
        .into_iter()
        .map(|(usage, ingredient)| (ingredient.name, usage.amount))
        .collect()
}

#[cfg(test)]
fn fields(name: &str) -> RecipeFields {
    RecipeFields {
        name: name.into(),
        image: "recipes/images/x.png".into(),
        text: "Mix and bake".into(),
        cooking_time: 30,
    }
}

#[test]
fn ingredient_validation() {
    let eggs = IngredientId::from(1);
    let milk = IngredientId::from(2);

    assert!(validate_ingredients(&[]).is_err());
    assert!(validate_ingredients(&[
        IngredientAmount {
            ingredient: eggs,
            amount: 2
        },
        IngredientAmount {
            ingredient: eggs,
            amount: 3
        },
    ])
    .is_err());
    for amount in [MIN_INGREDIENT_AMOUNT - 1, MAX_INGREDIENT_AMOUNT + 1] {
        assert!(validate_ingredients(&[IngredientAmount {
            ingredient: milk,
            amount
        }])
        .is_err());
    }
    for amount in [MIN_INGREDIENT_AMOUNT, MAX_INGREDIENT_AMOUNT] {
        assert!(validate_ingredients(&[IngredientAmount {
            ingredient: milk,
            amount
        }])
        .is_ok());
    }

    assert!(validate_cooking_time(0).is_err());
    assert!(validate_cooking_time(MAX_COOKING_TIME + 1).is_err());
    assert!(validate_cooking_time(MIN_COOKING_TIME).is_ok());

    assert!(validate_tags(&[TagId::from(1), TagId::from(1)]).is_err());
    assert!(validate_tags(&[]).is_ok());
}

#[test]
fn create_recipe_writes_ingredients_and_tags() {
    use crate::catalog::{create_ingredient, create_tag};

    let mut conn = database::test_connection();
    let author = users::user_fixture(&mut conn, "chef");
    let eggs = create_ingredient(&mut conn, "eggs", "pcs").unwrap();
    let flour = create_ingredient(&mut conn, "flour", "g").unwrap();
    let breakfast = create_tag(&mut conn, "Breakfast", "breakfast", None).unwrap();

    let recipe = create_recipe(
        &mut conn,
        author.id,
        fields("Pancakes"),
        vec![
            IngredientAmount {
                ingredient: eggs.id,
                amount: 2,
            },
            IngredientAmount {
                ingredient: flour.id,
                amount: 200,
            },
        ],
        vec![breakfast.id],
    )
    .unwrap();

    assert_eq!(recipe.author_id, author.id);
    assert_eq!(
        amounts(&mut conn, &recipe),
        vec![("eggs".to_string(), 2), ("flour".to_string(), 200)]
    );
    assert_eq!(tags_of(&mut conn, recipe.id).unwrap(), vec![breakfast]);
}

#[test]
fn create_recipe_rejects_bad_input() {
    use crate::catalog::create_ingredient;

    let mut conn = database::test_connection();
    let author = users::user_fixture(&mut conn, "chef");
    let eggs = create_ingredient(&mut conn, "eggs", "pcs").unwrap();

    let duplicate = vec![
        IngredientAmount {
            ingredient: eggs.id,
            amount: 1,
        },
        IngredientAmount {
            ingredient: eggs.id,
            amount: 1,
        },
    ];
    assert!(matches!(
        create_recipe(&mut conn, author.id, fields("Omelette"), duplicate, vec![]),
        Err(AppError::Validation(_))
    ));

    let too_much = vec![IngredientAmount {
        ingredient: eggs.id,
        amount: MAX_INGREDIENT_AMOUNT + 1,
    }];
    assert!(matches!(
        create_recipe(&mut conn, author.id, fields("Omelette"), too_much, vec![]),
        Err(AppError::Validation(_))
    ));

    let unknown = vec![IngredientAmount {
        ingredient: IngredientId::from(999),
        amount: 1,
    }];
    assert!(matches!(
        create_recipe(&mut conn, author.id, fields("Omelette"), unknown, vec![]),
        Err(AppError::NotFound(_))
    ));

    let mut slow = fields("Omelette");
    slow.cooking_time = 0;
    let ok_items = vec![IngredientAmount {
        ingredient: eggs.id,
        amount: 3,
    }];
    assert!(matches!(
        create_recipe(&mut conn, author.id, slow, ok_items.clone(), vec![]),
        Err(AppError::Validation(_))
    ));

    assert!(matches!(
        create_recipe(
            &mut conn,
            author.id,
            fields("Omelette"),
            ok_items,
            vec![TagId::from(5)]
        ),
        Err(AppError::NotFound(_))
    ));

    // Nothing was written by any of the failed attempts.
    let count: i64 = recipes::table.count().get_result(&mut conn).unwrap();
    assert_eq!(count, 0);
}

#[test]
fn update_replaces_all_ingredients() {
    use crate::catalog::create_ingredient;

    let mut conn = database::test_connection();
    let author = users::user_fixture(&mut conn, "chef");
    let eggs = create_ingredient(&mut conn, "eggs", "pcs").unwrap();
    let milk = create_ingredient(&mut conn, "milk", "ml").unwrap();
    let salt = create_ingredient(&mut conn, "salt", "g").unwrap();
    let recipe = recipe_fixture(
        &mut conn,
        author.id,
        "Omelette",
        &[(eggs.id, 3), (milk.id, 100)],
    );

    let updated = update_recipe(
        &mut conn,
        author.id,
        recipe.id,
        RecipePatch {
            cooking_time: Some(15),
            ingredients: Some(vec![
                IngredientAmount {
                    ingredient: salt.id,
                    amount: 5,
                },
                IngredientAmount {
                    ingredient: eggs.id,
                    amount: 4,
                },
            ]),
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(updated.cooking_time, 15);
    assert_eq!(updated.name, recipe.name);
    assert_eq!(updated.pub_date, recipe.pub_date);
    assert_eq!(
        amounts(&mut conn, &updated),
        vec![("salt".to_string(), 5), ("eggs".to_string(), 4)]
    );
}

#[test]
fn update_requires_ingredients() {
    use crate::catalog::create_ingredient;

    let mut conn = database::test_connection();
    let author = users::user_fixture(&mut conn, "chef");
    let eggs = create_ingredient(&mut conn, "eggs", "pcs").unwrap();
    let recipe = recipe_fixture(&mut conn, author.id, "Omelette", &[(eggs.id, 3)]);

    let result = update_recipe(
        &mut conn,
        author.id,
        recipe.id,
        RecipePatch {
            name: Some("Big omelette".into()),
            ..Default::default()
        },
    );
    assert!(matches!(result, Err(AppError::Validation(_))));

    let unchanged = get_recipe(&mut conn, recipe.id).unwrap();
    assert_eq!(unchanged.name, "Omelette");
    assert_eq!(amounts(&mut conn, &unchanged), vec![("eggs".to_string(), 3)]);
}

#[test]
fn only_author_changes_recipe() {
    use crate::catalog::create_ingredient;

    let mut conn = database::test_connection();
    let author = users::user_fixture(&mut conn, "chef");
    let other = users::user_fixture(&mut conn, "guest");
    let eggs = create_ingredient(&mut conn, "eggs", "pcs").unwrap();
    let recipe = recipe_fixture(&mut conn, author.id, "Omelette", &[(eggs.id, 3)]);

    let patch = RecipePatch {
        ingredients: Some(vec![IngredientAmount {
            ingredient: eggs.id,
            amount: 1,
        }]),
        ..Default::default()
    };
    assert!(matches!(
        update_recipe(&mut conn, other.id, recipe.id, patch),
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        delete_recipe(&mut conn, other.id, recipe.id),
        Err(AppError::Forbidden(_))
    ));

    delete_recipe(&mut conn, author.id, recipe.id).unwrap();
    assert!(matches!(
        get_recipe(&mut conn, recipe.id),
        Err(AppError::NotFound(_))
    ));
    let leftover: i64 = recipe_ingredients::table
        .count()
        .get_result(&mut conn)
        .unwrap();
    assert_eq!(leftover, 0);
}

#[test]
fn update_keeps_tags_unless_given() {
    use crate::catalog::{create_ingredient, create_tag};

    let mut conn = database::test_connection();
    let author = users::user_fixture(&mut conn, "chef");
    let eggs = create_ingredient(&mut conn, "eggs", "pcs").unwrap();
    let breakfast = create_tag(&mut conn, "Breakfast", "breakfast", None).unwrap();
    let dinner = create_tag(&mut conn, "Dinner", "dinner", None).unwrap();
    let items = vec![IngredientAmount {
        ingredient: eggs.id,
        amount: 2,
    }];
    let recipe = create_recipe(
        &mut conn,
        author.id,
        fields("Omelette"),
        items.clone(),
        vec![breakfast.id],
    )
    .unwrap();

    let patch = RecipePatch {
        ingredients: Some(items.clone()),
        ..Default::default()
    };
    update_recipe(&mut conn, author.id, recipe.id, patch).unwrap();
    assert_eq!(
        tags_of(&mut conn, recipe.id).unwrap(),
        vec![breakfast.clone()]
    );

    let patch = RecipePatch {
        ingredients: Some(items),
        tags: Some(vec![dinner.id]),
        ..Default::default()
    };
    update_recipe(&mut conn, author.id, recipe.id, patch).unwrap();
    assert_eq!(tags_of(&mut conn, recipe.id).unwrap(), vec![dinner]);
}

#[test]
fn list_recipes_filters_and_pages() {
    use crate::catalog::{create_ingredient, create_tag};

    let mut conn = database::test_connection();
    let alice = users::user_fixture(&mut conn, "alice");
    let bob = users::user_fixture(&mut conn, "bob");
    let eggs = create_ingredient(&mut conn, "eggs", "pcs").unwrap();
    let breakfast = create_tag(&mut conn, "Breakfast", "breakfast", None).unwrap();

    let first = recipe_fixture(&mut conn, alice.id, "First", &[(eggs.id, 1)]);
    let second = create_recipe(
        &mut conn,
        alice.id,
        fields("Second"),
        vec![IngredientAmount {
            ingredient: eggs.id,
            amount: 2,
        }],
        vec![breakfast.id],
    )
    .unwrap();
    let third = recipe_fixture(&mut conn, bob.id, "Third", &[(eggs.id, 3)]);

    let ids = |page: Page<Recipe>| page.results.into_iter().map(|r| r.id).collect::<Vec<_>>();
    let all = PageRequest::new(None, None, 10).unwrap();

    let page = list_recipes(&mut conn, None, &RecipeFilter::default(), all).unwrap();
    assert_eq!(page.count, 3);
    assert_eq!(ids(page), vec![third.id, second.id, first.id]);

    let by_alice = RecipeFilter {
        author: Some(alice.id),
        ..Default::default()
    };
    let page = list_recipes(&mut conn, None, &by_alice, all).unwrap();
    assert_eq!(ids(page), vec![second.id, first.id]);

    let tagged = RecipeFilter {
        tags: vec!["breakfast".into(), "lunch".into()],
        ..Default::default()
    };
    let page = list_recipes(&mut conn, None, &tagged, all).unwrap();
    assert_eq!(ids(page), vec![second.id]);

    let anonymous_favorites = RecipeFilter {
        is_favorited: Some(true),
        ..Default::default()
    };
    let page = list_recipes(&mut conn, None, &anonymous_favorites, all).unwrap();
    assert_eq!(page.count, 0);

    let two_per_page = PageRequest::new(Some(2), Some(2), 10).unwrap();
    let page = list_recipes(&mut conn, None, &RecipeFilter::default(), two_per_page).unwrap();
    assert_eq!(page.previous, Some(1));
    assert_eq!(page.next, None);
    assert_eq!(ids(page), vec![first.id]);

    let past_end = PageRequest::new(Some(3), Some(2), 10).unwrap();
    assert!(matches!(
        list_recipes(&mut conn, None, &RecipeFilter::default(), past_end),
        Err(AppError::NotFound(_))
    ));
}

#[test]
fn author_recipe_limits() {
    use crate::catalog::create_ingredient;

    let mut conn = database::test_connection();
    let alice = users::user_fixture(&mut conn, "alice");
    let eggs = create_ingredient(&mut conn, "eggs", "pcs").unwrap();
    let first = recipe_fixture(&mut conn, alice.id, "First", &[(eggs.id, 1)]);
    let second = recipe_fixture(&mut conn, alice.id, "Second", &[(eggs.id, 1)]);

    let ids = |found: Vec<Recipe>| found.into_iter().map(|r| r.id).collect::<Vec<_>>();
    assert_eq!(
        ids(author_recipes(&mut conn, alice.id, Some(1)).unwrap()),
        vec![second.id]
    );
    for limit in [None, Some(0), Some(-1), Some(5)] {
        assert_eq!(
            ids(author_recipes(&mut conn, alice.id, limit).unwrap()),
            vec![second.id, first.id]
        );
    }
    assert_eq!(author_recipe_count(&mut conn, alice.id).unwrap(), 2);
}

#[test]
fn recipe_short_link() {
    use crate::catalog::create_ingredient;

    let mut conn = database::test_connection();
    let alice = users::user_fixture(&mut conn, "alice");
    let eggs = create_ingredient(&mut conn, "eggs", "pcs").unwrap();
    let recipe = recipe_fixture(&mut conn, alice.id, "First", &[(eggs.id, 1)]);

    assert_eq!(
        short_link(&mut conn, "https://foodgram.example/", recipe.id).unwrap(),
        format!("https://foodgram.example/r/{}", recipe.id)
    );
    assert!(matches!(
        short_link(&mut conn, "https://foodgram.example", RecipeId::from(77)),
        Err(AppError::NotFound(_))
    ));
}
