// Copyright 2023 Remi Bernotavicius

//! Ingredients and tags. Both are reference data that recipes point at.

use crate::database;
use crate::database::models::{Ingredient, IngredientId, Tag, TagId};
use crate::error::{AppError, AppResult};
use diesel::prelude::OptionalExtension as _;
use diesel::BoolExpressionMethods as _;
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;
use once_cell::sync::Lazy;
use regex::Regex;

const MAX_INGREDIENT_NAME_LENGTH: usize = 200;
const MAX_MEASUREMENT_UNIT_LENGTH: usize = 50;
const MAX_TAG_LENGTH: usize = 200;

static SLUG_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").unwrap());
static COLOR_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").unwrap());

fn required(field: &str, value: &str, max: usize) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field}: this field is required")));
    }
    if value.chars().count() > max {
        return Err(AppError::validation(format!(
            "{field}: must be at most {max} characters"
        )));
    }
    Ok(())
}

pub fn create_ingredient(
    conn: &mut database::Connection,
    new_name: &str,
    new_unit: &str,
) -> AppResult<Ingredient> {
    use database::schema::ingredients::dsl::*;
    use diesel::insert_into;

    required("name", new_name, MAX_INGREDIENT_NAME_LENGTH)?;
    required(
        "measurement_unit",
        new_unit,
        MAX_MEASUREMENT_UNIT_LENGTH,
    )?;

    let ingredient = insert_into(ingredients)
        .values((name.eq(new_name), measurement_unit.eq(new_unit)))
        .returning(Ingredient::as_returning())
        .get_result(conn)?;
    log::debug!("created ingredient {} ({})", ingredient.id, ingredient.name);
    Ok(ingredient)
}

pub fn get_ingredient(
    conn: &mut database::Connection,
    ingredient_id: IngredientId,
) -> AppResult<Ingredient> {
    use database::schema::ingredients::dsl::*;

    ingredients
        .find(ingredient_id)
        .select(Ingredient::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found(format!("ingredient {ingredient_id}")))
}

pub fn find_ingredient_by_name(
    conn: &mut database::Connection,
    search_name: &str,
) -> AppResult<Option<Ingredient>> {
    use database::schema::ingredients::dsl::*;

    Ok(ingredients
        .select(Ingredient::as_select())
        .filter(name.eq(search_name))
        .order(id)
        .first(conn)
        .optional()?)
}

/// `LIKE` pattern for the leading ASCII part of `prefix`, with wildcards escaped by `\`. SQLite's
/// `LIKE` only ignores case for ASCII, so the rest of the prefix is left to the caller.
fn ascii_like_pattern(prefix: &str) -> Option<String> {
    let mut pattern = String::new();
    for c in prefix.chars().take_while(char::is_ascii) {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    if pattern.is_empty() {
        return None;
    }
    pattern.push('%');
    Some(pattern)
}

/// Ingredients whose name starts with `prefix`, ignoring case, ordered by name. Without a prefix
/// every ingredient is returned.
pub fn search_ingredients(
    conn: &mut database::Connection,
    prefix: Option<&str>,
) -> AppResult<Vec<Ingredient>> {
    use database::schema::ingredients::dsl::*;
    use diesel::expression_methods::EscapeExpressionMethods as _;
    use diesel::TextExpressionMethods as _;

    let prefix = prefix.filter(|p| !p.is_empty());
    let mut query = ingredients
        .select(Ingredient::as_select())
        .order((name, id))
        .into_boxed();
    if let Some(pattern) = prefix.and_then(ascii_like_pattern) {
        query = query.filter(name.like(pattern).escape('\\'));
    }
    let candidates: Vec<Ingredient> = query.load(conn)?;

    let Some(prefix) = prefix.map(str::to_lowercase) else {
        return Ok(candidates);
    };
    Ok(candidates
        .into_iter()
        .filter(|i| i.name.to_lowercase().starts_with(&prefix))
        .collect())
}

pub fn create_tag(
    conn: &mut database::Connection,
    new_name: &str,
    new_slug: &str,
    new_color: Option<&str>,
) -> AppResult<Tag> {
    use database::schema::tags::dsl::*;
    use diesel::insert_into;

    required("name", new_name, MAX_TAG_LENGTH)?;
    required("slug", new_slug, MAX_TAG_LENGTH)?;
    if !SLUG_PATTERN.is_match(new_slug) {
        return Err(AppError::validation(
            "slug: may contain only latin letters, digits, hyphens and underscores",
        ));
    }
    if let Some(new_color) = new_color {
        if !COLOR_PATTERN.is_match(new_color) {
            return Err(AppError::validation("color: expected a #RRGGBB hex color"));
        }
    }

    let mut taken = tags
        .filter(name.eq(new_name).or(slug.eq(new_slug)))
        .into_boxed();
    if let Some(new_color) = new_color {
        taken = taken.or_filter(color.eq(new_color));
    }
    let taken: i64 = taken.count().get_result(conn)?;
    if taken > 0 {
        return Err(AppError::AlreadyExists(
            "a tag with this name, slug or color already exists".into(),
        ));
    }

    let tag = insert_into(tags)
        .values((name.eq(new_name), slug.eq(new_slug), color.eq(new_color)))
        .returning(Tag::as_returning())
        .get_result(conn)
        .map_err(|e| AppError::from_insert(e, "a tag with this name, slug or color already exists"))?;
    log::info!("created tag {} ({})", tag.id, tag.slug);
    Ok(tag)
}

pub fn get_tag(conn: &mut database::Connection, tag_id: TagId) -> AppResult<Tag> {
    use database::schema::tags::dsl::*;

    tags.find(tag_id)
        .select(Tag::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found(format!("tag {tag_id}")))
}

pub fn list_tags(conn: &mut database::Connection) -> AppResult<Vec<Tag>> {
    use database::schema::tags::dsl::*;

    Ok(tags.select(Tag::as_select()).order(name).load(conn)?)
}

#[test]
fn ingredient_prefix_search() {
    let mut conn = database::test_connection();
    for (n, u) in [
        ("Sugar", "g"),
        ("salt", "g"),
        ("sour cream", "ml"),
        ("eggs", "pcs"),
        ("50%_cocoa", "g"),
    ] {
        create_ingredient(&mut conn, n, u).unwrap();
    }

    let names = |found: Vec<Ingredient>| found.into_iter().map(|i| i.name).collect::<Vec<_>>();

    let found = search_ingredients(&mut conn, Some("s")).unwrap();
    assert_eq!(names(found), vec!["Sugar", "salt", "sour cream"]);

    let found = search_ingredients(&mut conn, Some("SU")).unwrap();
    assert_eq!(names(found), vec!["Sugar"]);

    let found = search_ingredients(&mut conn, Some("cream")).unwrap();
    assert!(found.is_empty());

    let found = search_ingredients(&mut conn, Some("50%_")).unwrap();
    assert_eq!(names(found), vec!["50%_cocoa"]);

    let found = search_ingredients(&mut conn, Some("5_")).unwrap();
    assert!(found.is_empty());

    let found = search_ingredients(&mut conn, None).unwrap();
    assert_eq!(found.len(), 5);

    create_ingredient(&mut conn, "Яйца", "шт").unwrap();
    let found = search_ingredients(&mut conn, Some("яй")).unwrap();
    assert_eq!(names(found), vec!["Яйца"]);

    create_ingredient(&mut conn, "bœuf", "g").unwrap();
    create_ingredient(&mut conn, "boar", "g").unwrap();
    let found = search_ingredients(&mut conn, Some("BŒ")).unwrap();
    assert_eq!(names(found), vec!["bœuf"]);
}

#[test]
fn like_patterns() {
    assert_eq!(ascii_like_pattern("Su"), Some("Su%".to_string()));
    assert_eq!(ascii_like_pattern("50%_"), Some("50\\%\\_%".to_string()));
    assert_eq!(ascii_like_pattern("a\\b"), Some("a\\\\b%".to_string()));
    assert_eq!(ascii_like_pattern("bœuf"), Some("b%".to_string()));
    assert_eq!(ascii_like_pattern("яй"), None);
}

#[test]
fn missing_ingredient() {
    let mut conn = database::test_connection();
    assert!(matches!(
        get_ingredient(&mut conn, IngredientId::from(42)),
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        create_ingredient(&mut conn, "", "g"),
        Err(AppError::Validation(_))
    ));
}

#[test]
fn tags_unique_and_validated() {
    let mut conn = database::test_connection();
    let breakfast = create_tag(&mut conn, "Breakfast", "breakfast", Some("#E26C2D")).unwrap();
    create_tag(&mut conn, "Dinner", "dinner", None).unwrap();

    assert!(matches!(
        create_tag(&mut conn, "Breakfast", "other", None),
        Err(AppError::AlreadyExists(_))
    ));
    assert!(matches!(
        create_tag(&mut conn, "Lunch", "lunch", Some("#E26C2D")),
        Err(AppError::AlreadyExists(_))
    ));
    assert!(matches!(
        create_tag(&mut conn, "Lunch", "lunch time", None),
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        create_tag(&mut conn, "Lunch", "lunch", Some("red")),
        Err(AppError::Validation(_))
    ));

    let all: Vec<_> = list_tags(&mut conn)
        .unwrap()
        .into_iter()
        .map(|t| t.slug)
        .collect();
    assert_eq!(all, vec!["breakfast", "dinner"]);
    assert_eq!(get_tag(&mut conn, breakfast.id).unwrap(), breakfast);
}
