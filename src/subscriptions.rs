// Copyright 2023 Remi Bernotavicius

use crate::database;
use crate::database::models::{Recipe, User, UserId};
use crate::database::schema::{follows, users};
use crate::error::AppResult;
use crate::pagination::{Page, PageRequest};
use crate::recipes;
use diesel::ExpressionMethods as _;
use diesel::JoinOnDsl as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;

/// An author the user follows, along with a preview of their recipes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub author: User,
    pub recipes: Vec<Recipe>,
    pub recipes_count: i64,
}

pub fn subscription_for(
    conn: &mut database::Connection,
    author: User,
    recipe_limit: Option<i64>,
) -> AppResult<Subscription> {
    Ok(Subscription {
        recipes: recipes::author_recipes(conn, author.id, recipe_limit)?,
        recipes_count: recipes::author_recipe_count(conn, author.id)?,
        author,
    })
}

/// Followed authors ordered by id. `recipe_limit` caps the recipes shown per author, absent or
/// non-positive meaning no cap.
pub fn list_subscriptions(
    conn: &mut database::Connection,
    user: UserId,
    recipe_limit: Option<i64>,
    page: PageRequest,
) -> AppResult<Page<Subscription>> {
    let count: i64 = follows::table
        .filter(follows::user_id.eq(user))
        .count()
        .get_result(conn)?;
    page.check(count)?;

    let authors: Vec<User> = follows::table
        .inner_join(users::table.on(users::id.eq(follows::author_id)))
        .filter(follows::user_id.eq(user))
        .select(User::as_select())
        .order(users::id)
        .limit(page.limit)
        .offset(page.offset())
        .load(conn)?;

    let results = authors
        .into_iter()
        .map(|author| subscription_for(conn, author, recipe_limit))
        .collect::<AppResult<Vec<_>>>()?;
    log::debug!("user {user}: listed {} of {count} subscriptions", results.len());
    Ok(page.into_page(count, results))
}

#[test]
fn no_subscriptions() {
    let mut conn = database::test_connection();
    let alice = crate::users::user_fixture(&mut conn, "alice");

    let page = list_subscriptions(
        &mut conn,
        alice.id,
        None,
        PageRequest::new(None, None, 10).unwrap(),
    )
    .unwrap();
    assert_eq!(page.count, 0);
    assert!(page.results.is_empty());
    assert_eq!((page.next, page.previous), (None, None));
}

#[test]
fn subscriptions_with_recipe_previews() {
    use crate::catalog::create_ingredient;
    use crate::recipes::recipe_fixture;
    use crate::relations::follow;
    use crate::users::user_fixture;

    let mut conn = database::test_connection();
    let alice = user_fixture(&mut conn, "alice");
    let bob = user_fixture(&mut conn, "bob");
    let carol = user_fixture(&mut conn, "carol");
    let dave = user_fixture(&mut conn, "dave");
    let eggs = create_ingredient(&mut conn, "eggs", "pcs").unwrap();

    let older = recipe_fixture(&mut conn, bob.id, "Older", &[(eggs.id, 1)]);
    let newer = recipe_fixture(&mut conn, bob.id, "Newer", &[(eggs.id, 1)]);
    recipe_fixture(&mut conn, dave.id, "Not followed", &[(eggs.id, 1)]);

    // Followed out of id order on purpose.
    follow(&mut conn, alice.id, carol.id).unwrap();
    follow(&mut conn, alice.id, bob.id).unwrap();

    let all = PageRequest::new(None, None, 10).unwrap();
    let page = list_subscriptions(&mut conn, alice.id, Some(1), all).unwrap();
    assert_eq!(page.count, 2);
    let authors: Vec<_> = page.results.iter().map(|s| s.author.id).collect();
    assert_eq!(authors, vec![bob.id, carol.id]);

    let first = &page.results[0];
    assert_eq!(first.recipes_count, 2);
    assert_eq!(
        first.recipes.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![newer.id]
    );
    assert_eq!(page.results[1].recipes_count, 0);

    for limit in [None, Some(0), Some(-3)] {
        let page = list_subscriptions(&mut conn, alice.id, limit, all).unwrap();
        assert_eq!(
            page.results[0].recipes.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![newer.id, older.id]
        );
    }

    let second = PageRequest::new(Some(2), Some(1), 10).unwrap();
    let page = list_subscriptions(&mut conn, alice.id, None, second).unwrap();
    assert_eq!(page.results[0].author.id, carol.id);
    assert_eq!(page.previous, Some(1));
    assert_eq!(page.next, None);
}
