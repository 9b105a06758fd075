// Copyright 2023 Remi Bernotavicius

//! Favorites, shopping cart entries and follows. Each of these is a bare join row that is only ever
//! inserted or deleted.

use crate::database;
use crate::database::models::{Follow, RecipeId, RecipeMark, UserId};
use crate::database::schema::{favorites, follows, shopping_carts};
use crate::error::{AppError, AppResult};
use crate::{recipes, users};
use derive_more::Display;
use diesel::prelude::Connection as _;
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;

/// The two ways a user can mark a recipe.
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq)]
pub enum RecipeRelation {
    #[display("favorites")]
    Favorite,
    #[display("the shopping cart")]
    ShoppingCart,
}

pub fn is_marked(
    conn: &mut database::Connection,
    relation: RecipeRelation,
    user: UserId,
    recipe: RecipeId,
) -> AppResult<bool> {
    use diesel::dsl::exists;
    use diesel::select;

    let marked: bool = match relation {
        RecipeRelation::Favorite => select(exists(
            favorites::table
                .filter(favorites::user_id.eq(user))
                .filter(favorites::recipe_id.eq(recipe)),
        ))
        .get_result(conn)?,
        RecipeRelation::ShoppingCart => select(exists(
            shopping_carts::table
                .filter(shopping_carts::user_id.eq(user))
                .filter(shopping_carts::recipe_id.eq(recipe)),
        ))
        .get_result(conn)?,
    };
    Ok(marked)
}

/// Marks `target` for `actor`. Fails with `AlreadyExists` when the mark is already there, whether
/// that is seen up front or reported by the unique constraint on insert.
pub fn toggle_on(
    conn: &mut database::Connection,
    relation: RecipeRelation,
    actor: UserId,
    target: RecipeId,
) -> AppResult<RecipeMark> {
    use diesel::insert_into;

    let already_present = format!("recipe {target} is already in {relation}");
    let mark = conn.transaction::<_, AppError, _>(|conn| {
        users::get_user(conn, actor)?;
        recipes::get_recipe(conn, target)?;
        if is_marked(conn, relation, actor, target)? {
            return Err(AppError::AlreadyExists(already_present.clone()));
        }

        let added = database::now();
        let inserted = match relation {
            RecipeRelation::Favorite => insert_into(favorites::table)
                .values((
                    favorites::user_id.eq(actor),
                    favorites::recipe_id.eq(target),
                    favorites::date_added.eq(added),
                ))
                .returning((
                    favorites::id,
                    favorites::user_id,
                    favorites::recipe_id,
                    favorites::date_added,
                ))
                .get_result::<RecipeMark>(conn),
            RecipeRelation::ShoppingCart => insert_into(shopping_carts::table)
                .values((
                    shopping_carts::user_id.eq(actor),
                    shopping_carts::recipe_id.eq(target),
                    shopping_carts::date_added.eq(added),
                ))
                .returning((
                    shopping_carts::id,
                    shopping_carts::user_id,
                    shopping_carts::recipe_id,
                    shopping_carts::date_added,
                ))
                .get_result::<RecipeMark>(conn),
        };
        inserted.map_err(|e| AppError::from_insert(e, already_present.clone()))
    })?;
    log::info!("user {actor} added recipe {target} to {relation}");
    Ok(mark)
}

pub fn toggle_off(
    conn: &mut database::Connection,
    relation: RecipeRelation,
    actor: UserId,
    target: RecipeId,
) -> AppResult<()> {
    use diesel::delete;

    conn.transaction::<_, AppError, _>(|conn| {
        users::get_user(conn, actor)?;
        recipes::get_recipe(conn, target)?;
        let removed = match relation {
            RecipeRelation::Favorite => delete(
                favorites::table
                    .filter(favorites::user_id.eq(actor))
                    .filter(favorites::recipe_id.eq(target)),
            )
            .execute(conn)?,
            RecipeRelation::ShoppingCart => delete(
                shopping_carts::table
                    .filter(shopping_carts::user_id.eq(actor))
                    .filter(shopping_carts::recipe_id.eq(target)),
            )
            .execute(conn)?,
        };
        if removed == 0 {
            return Err(AppError::not_found(format!(
                "recipe {target} is not in {relation}"
            )));
        }
        Ok(())
    })?;
    log::info!("user {actor} removed recipe {target} from {relation}");
    Ok(())
}

pub fn is_following(
    conn: &mut database::Connection,
    user: UserId,
    author: UserId,
) -> AppResult<bool> {
    use diesel::dsl::exists;
    use diesel::select;

    Ok(select(exists(
        follows::table
            .filter(follows::user_id.eq(user))
            .filter(follows::author_id.eq(author)),
    ))
    .get_result(conn)?)
}

pub fn follow(
    conn: &mut database::Connection,
    actor: UserId,
    author: UserId,
) -> AppResult<Follow> {
    use diesel::insert_into;

    if actor == author {
        return Err(AppError::SelfReference);
    }

    let already_present = format!("already subscribed to user {author}");
    let row = conn.transaction::<_, AppError, _>(|conn| {
        users::get_user(conn, actor)?;
        users::get_user(conn, author)?;
        if is_following(conn, actor, author)? {
            return Err(AppError::AlreadyExists(already_present.clone()));
        }
        insert_into(follows::table)
            .values((
                follows::user_id.eq(actor),
                follows::author_id.eq(author),
                follows::date_followed.eq(database::now()),
            ))
            .returning(Follow::as_returning())
            .get_result(conn)
            .map_err(|e| AppError::from_insert(e, already_present.clone()))
    })?;
    log::info!("user {actor} subscribed to user {author}");
    Ok(row)
}

pub fn unfollow(conn: &mut database::Connection, actor: UserId, author: UserId) -> AppResult<()> {
    use diesel::delete;

    conn.transaction::<_, AppError, _>(|conn| {
        users::get_user(conn, actor)?;
        users::get_user(conn, author)?;
        let removed = delete(
            follows::table
                .filter(follows::user_id.eq(actor))
                .filter(follows::author_id.eq(author)),
        )
        .execute(conn)?;
        if removed == 0 {
            return Err(AppError::not_found(format!(
                "not subscribed to user {author}"
            )));
        }
        Ok(())
    })?;
    log::info!("user {actor} unsubscribed from user {author}");
    Ok(())
}

#[cfg(test)]
const BOTH: [RecipeRelation; 2] = [RecipeRelation::Favorite, RecipeRelation::ShoppingCart];

#[test]
fn mark_round_trip() {
    use crate::catalog::create_ingredient;

    let mut conn = database::test_connection();
    let alice = users::user_fixture(&mut conn, "alice");
    let eggs = create_ingredient(&mut conn, "eggs", "pcs").unwrap();
    let recipe = recipes::recipe_fixture(&mut conn, alice.id, "Omelette", &[(eggs.id, 2)]);

    for relation in BOTH {
        assert!(!is_marked(&mut conn, relation, alice.id, recipe.id).unwrap());

        let mark = toggle_on(&mut conn, relation, alice.id, recipe.id).unwrap();
        assert_eq!(mark.user_id, alice.id);
        assert_eq!(mark.recipe_id, recipe.id);
        assert!(is_marked(&mut conn, relation, alice.id, recipe.id).unwrap());

        assert!(matches!(
            toggle_on(&mut conn, relation, alice.id, recipe.id),
            Err(AppError::AlreadyExists(_))
        ));

        toggle_off(&mut conn, relation, alice.id, recipe.id).unwrap();
        assert!(!is_marked(&mut conn, relation, alice.id, recipe.id).unwrap());

        assert!(matches!(
            toggle_off(&mut conn, relation, alice.id, recipe.id),
            Err(AppError::NotFound(_))
        ));
    }
}

#[test]
fn marks_are_independent() {
    use crate::catalog::create_ingredient;

    let mut conn = database::test_connection();
    let alice = users::user_fixture(&mut conn, "alice");
    let bob = users::user_fixture(&mut conn, "bob");
    let eggs = create_ingredient(&mut conn, "eggs", "pcs").unwrap();
    let recipe = recipes::recipe_fixture(&mut conn, alice.id, "Omelette", &[(eggs.id, 2)]);

    toggle_on(&mut conn, RecipeRelation::Favorite, alice.id, recipe.id).unwrap();
    toggle_on(&mut conn, RecipeRelation::Favorite, bob.id, recipe.id).unwrap();
    assert!(!is_marked(&mut conn, RecipeRelation::ShoppingCart, alice.id, recipe.id).unwrap());

    toggle_off(&mut conn, RecipeRelation::Favorite, alice.id, recipe.id).unwrap();
    assert!(is_marked(&mut conn, RecipeRelation::Favorite, bob.id, recipe.id).unwrap());
}

#[test]
fn missing_recipe_is_not_found() {
    let mut conn = database::test_connection();
    let alice = users::user_fixture(&mut conn, "alice");

    for relation in BOTH {
        assert!(matches!(
            toggle_on(&mut conn, relation, alice.id, RecipeId::from(404)),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            toggle_off(&mut conn, relation, alice.id, RecipeId::from(404)),
            Err(AppError::NotFound(_))
        ));
    }
}

#[test]
fn duplicate_mark_rejected_by_storage() {
    use crate::catalog::create_ingredient;
    use diesel::insert_into;
    use diesel::result::{DatabaseErrorKind, Error};

    let mut conn = database::test_connection();
    let alice = users::user_fixture(&mut conn, "alice");
    let eggs = create_ingredient(&mut conn, "eggs", "pcs").unwrap();
    let recipe = recipes::recipe_fixture(&mut conn, alice.id, "Omelette", &[(eggs.id, 2)]);
    toggle_on(&mut conn, RecipeRelation::Favorite, alice.id, recipe.id).unwrap();

    // A second writer that skipped the existence check still cannot create a duplicate.
    let result = insert_into(favorites::table)
        .values((
            favorites::user_id.eq(alice.id),
            favorites::recipe_id.eq(recipe.id),
            favorites::date_added.eq(database::now()),
        ))
        .execute(&mut conn);
    assert!(matches!(
        result,
        Err(Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _))
    ));
}

#[test]
fn deleting_recipe_drops_marks() {
    use crate::catalog::create_ingredient;

    let mut conn = database::test_connection();
    let alice = users::user_fixture(&mut conn, "alice");
    let bob = users::user_fixture(&mut conn, "bob");
    let eggs = create_ingredient(&mut conn, "eggs", "pcs").unwrap();
    let recipe = recipes::recipe_fixture(&mut conn, alice.id, "Omelette", &[(eggs.id, 2)]);
    for relation in BOTH {
        toggle_on(&mut conn, relation, bob.id, recipe.id).unwrap();
    }

    recipes::delete_recipe(&mut conn, alice.id, recipe.id).unwrap();

    let favorites: i64 = favorites::table.count().get_result(&mut conn).unwrap();
    let carts: i64 = shopping_carts::table.count().get_result(&mut conn).unwrap();
    assert_eq!((favorites, carts), (0, 0));
}

#[test]
fn list_recipes_by_viewer_marks() {
    use crate::catalog::create_ingredient;
    use crate::pagination::PageRequest;
    use crate::recipes::{list_recipes, RecipeFilter};

    let mut conn = database::test_connection();
    let alice = users::user_fixture(&mut conn, "alice");
    let eggs = create_ingredient(&mut conn, "eggs", "pcs").unwrap();
    let liked = recipes::recipe_fixture(&mut conn, alice.id, "Liked", &[(eggs.id, 1)]);
    let other = recipes::recipe_fixture(&mut conn, alice.id, "Other", &[(eggs.id, 1)]);
    toggle_on(&mut conn, RecipeRelation::Favorite, alice.id, liked.id).unwrap();
    toggle_on(&mut conn, RecipeRelation::ShoppingCart, alice.id, other.id).unwrap();

    let all = PageRequest::new(None, None, 10).unwrap();
    let listed = |conn: &mut database::Connection, filter: RecipeFilter| {
        list_recipes(conn, Some(alice.id), &filter, all)
            .unwrap()
            .results
            .into_iter()
            .map(|r| r.id)
            .collect::<Vec<_>>()
    };

    let favorited = RecipeFilter {
        is_favorited: Some(true),
        ..Default::default()
    };
    assert_eq!(listed(&mut conn, favorited), vec![liked.id]);

    let not_favorited = RecipeFilter {
        is_favorited: Some(false),
        ..Default::default()
    };
    assert_eq!(listed(&mut conn, not_favorited), vec![other.id]);

    let in_cart = RecipeFilter {
        is_in_shopping_cart: Some(true),
        ..Default::default()
    };
    assert_eq!(listed(&mut conn, in_cart), vec![other.id]);

    let both = RecipeFilter {
        is_favorited: Some(true),
        is_in_shopping_cart: Some(true),
        ..Default::default()
    };
    assert!(listed(&mut conn, both).is_empty());
}

#[test]
fn follow_rules() {
    let mut conn = database::test_connection();
    let alice = users::user_fixture(&mut conn, "alice");
    let bob = users::user_fixture(&mut conn, "bob");

    assert!(matches!(
        follow(&mut conn, alice.id, alice.id),
        Err(AppError::SelfReference)
    ));

    let row = follow(&mut conn, alice.id, bob.id).unwrap();
    assert_eq!((row.user_id, row.author_id), (alice.id, bob.id));
    assert!(is_following(&mut conn, alice.id, bob.id).unwrap());
    assert!(!is_following(&mut conn, bob.id, alice.id).unwrap());

    assert!(matches!(
        follow(&mut conn, alice.id, bob.id),
        Err(AppError::AlreadyExists(_))
    ));
    assert!(matches!(
        follow(&mut conn, alice.id, alice.id),
        Err(AppError::SelfReference)
    ));
    assert!(matches!(
        follow(&mut conn, alice.id, UserId::from(99)),
        Err(AppError::NotFound(_))
    ));

    unfollow(&mut conn, alice.id, bob.id).unwrap();
    assert!(matches!(
        unfollow(&mut conn, alice.id, bob.id),
        Err(AppError::NotFound(_))
    ));
}

#[test]
fn self_follow_rejected_by_storage() {
    use diesel::insert_into;

    let mut conn = database::test_connection();
    let alice = users::user_fixture(&mut conn, "alice");

    let result = insert_into(follows::table)
        .values((
            follows::user_id.eq(alice.id),
            follows::author_id.eq(alice.id),
            follows::date_followed.eq(database::now()),
        ))
        .execute(&mut conn);
    assert!(result.is_err());
}

#[test]
fn unknown_actor_is_not_found() {
    use crate::catalog::create_ingredient;

    let mut conn = database::test_connection();
    let alice = users::user_fixture(&mut conn, "alice");
    let eggs = create_ingredient(&mut conn, "eggs", "pcs").unwrap();
    let recipe = recipes::recipe_fixture(&mut conn, alice.id, "Omelette", &[(eggs.id, 2)]);
    let ghost = UserId::from(999);

    for relation in BOTH {
        assert!(matches!(
            toggle_on(&mut conn, relation, ghost, recipe.id),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            toggle_off(&mut conn, relation, ghost, recipe.id),
            Err(AppError::NotFound(_))
        ));
    }
    assert!(matches!(
        follow(&mut conn, ghost, alice.id),
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        unfollow(&mut conn, ghost, alice.id),
        Err(AppError::NotFound(_))
    ));

    let favorite_rows: i64 = favorites::table.count().get_result(&mut conn).unwrap();
    let follow_rows: i64 = follows::table.count().get_result(&mut conn).unwrap();
    assert_eq!((favorite_rows, follow_rows), (0, 0));
}
