// Copyright 2023 Remi Bernotavicius

//! The JSON shapes things are read and written in. Anything that depends on who is looking (the
//! `is_*` flags) takes the viewer explicitly; `None` is an anonymous viewer.

use crate::database;
use crate::database::models::{Ingredient, IngredientId, Recipe, RecipeId, Tag, TagId, User, UserId};
use crate::error::{AppError, AppResult};
use crate::recipes::{self, IngredientAmount, RecipeFields, RecipePatch};
use crate::relations::{self, RecipeRelation};
use crate::subscriptions::Subscription;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct UserPayload {
    pub email: String,
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub avatar: Option<String>,
}

impl UserPayload {
    fn new(user: User, is_subscribed: bool) -> Self {
        Self {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_subscribed,
            avatar: user.avatar,
        }
    }
}

pub fn user_payload(
    conn: &mut database::Connection,
    viewer: Option<UserId>,
    user: User,
) -> AppResult<UserPayload> {
    let is_subscribed = match viewer {
        Some(viewer) => relations::is_following(conn, viewer, user.id)?,
        None => false,
    };
    Ok(UserPayload::new(user, is_subscribed))
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct IngredientPayload {
    pub id: IngredientId,
    pub name: String,
    pub measurement_unit: String,
}

impl From<Ingredient> for IngredientPayload {
    fn from(i: Ingredient) -> Self {
        Self {
            id: i.id,
            name: i.name,
            measurement_unit: i.measurement_unit,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TagPayload {
    pub id: TagId,
    pub name: String,
    pub slug: String,
    pub color: Option<String>,
}

impl From<Tag> for TagPayload {
    fn from(t: Tag) -> Self {
        Self {
            id: t.id,
            name: t.name,
            slug: t.slug,
            color: t.color,
        }
    }
}

/// An ingredient as it appears inside a recipe. `id` is the ingredient's id, not the id of the
/// row joining it to the recipe.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RecipeIngredientPayload {
    pub id: IngredientId,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RecipePayload {
    pub id: RecipeId,
    pub tags: Vec<TagPayload>,
    pub author: UserPayload,
    pub ingredients: Vec<RecipeIngredientPayload>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub pub_date: NaiveDateTime,
}

pub fn recipe_payload(
    conn: &mut database::Connection,
    viewer: Option<UserId>,
    recipe: Recipe,
) -> AppResult<RecipePayload> {
    let author = crate::users::get_user(conn, recipe.author_id)?;
    let author = user_payload(conn, viewer, author)?;
    let tags = recipes::tags_of(conn, recipe.id)?
        .into_iter()
        .map(TagPayload::from)
        .collect();
    let ingredients = recipes::ingredients_of(conn, &recipe)?
        .into_iter()
        .map(|(usage, ingredient)| RecipeIngredientPayload {
            id: ingredient.id,
            name: ingredient.name,
            measurement_unit: ingredient.measurement_unit,
            amount: usage.amount,
        })
        .collect();
    let (is_favorited, is_in_shopping_cart) = match viewer {
        Some(viewer) => (
            relations::is_marked(conn, RecipeRelation::Favorite, viewer, recipe.id)?,
            relations::is_marked(conn, RecipeRelation::ShoppingCart, viewer, recipe.id)?,
        ),
        None => (false, false),
    };

    Ok(RecipePayload {
        id: recipe.id,
        tags,
        author,
        ingredients,
        is_favorited,
        is_in_shopping_cart,
        name: recipe.name,
        image: recipe.image,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
        pub_date: recipe.pub_date,
    })
}

/// The short form of a recipe used in favorites, the cart and subscriptions.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RecipeSummary {
    pub id: RecipeId,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl From<Recipe> for RecipeSummary {
    fn from(r: Recipe) -> Self {
        Self {
            id: r.id,
            name: r.name,
            image: r.image,
            cooking_time: r.cooking_time,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionPayload {
    #[serde(flatten)]
    pub author: UserPayload,
    pub recipes: Vec<RecipeSummary>,
    pub recipes_count: i64,
}

impl From<Subscription> for SubscriptionPayload {
    fn from(s: Subscription) -> Self {
        Self {
            author: UserPayload::new(s.author, true),
            recipes: s.recipes.into_iter().map(RecipeSummary::from).collect(),
            recipes_count: s.recipes_count,
        }
    }
}

#[derive(Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub struct IngredientAmountWrite {
    pub id: IngredientId,
    pub amount: i32,
}

impl From<IngredientAmountWrite> for IngredientAmount {
    fn from(w: IngredientAmountWrite) -> Self {
        Self {
            ingredient: w.id,
            amount: w.amount,
        }
    }
}

/// The body of a recipe create or update. Every key may be missing here; which ones are required
/// depends on the operation.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RecipeWrite {
    pub ingredients: Option<Vec<IngredientAmountWrite>>,
    pub tags: Option<Vec<TagId>>,
    pub name: Option<String>,
    pub image: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
}

fn required<T>(field: &str, value: Option<T>) -> AppResult<T> {
    value.ok_or_else(|| AppError::validation(format!("{field}: this field is required")))
}

impl RecipeWrite {
    pub fn into_create(self) -> AppResult<(RecipeFields, Vec<IngredientAmount>, Vec<TagId>)> {
        let fields = RecipeFields {
            name: required("name", self.name)?,
            image: required("image", self.image)?,
            text: required("text", self.text)?,
            cooking_time: required("cooking_time", self.cooking_time)?,
        };
        let ingredients = required("ingredients", self.ingredients)?
            .into_iter()
            .map(IngredientAmount::from)
            .collect();
        Ok((fields, ingredients, self.tags.unwrap_or_default()))
    }

    pub fn into_patch(self) -> RecipePatch {
        RecipePatch {
            name: self.name,
            image: self.image,
            text: self.text,
            cooking_time: self.cooking_time,
            ingredients: self
                .ingredients
                .map(|items| items.into_iter().map(IngredientAmount::from).collect()),
            tags: self.tags,
        }
    }
}

#[test]
fn recipe_write_parsing() {
    let write: RecipeWrite = serde_json::from_str(
        r#"{
            "ingredients": [{"id": 1, "amount": 10}, {"id": 2, "amount": 3}],
            "tags": [1, 2],
            "name": "Borscht",
            "image": "recipes/images/borscht.png",
            "text": "Boil everything",
            "cooking_time": 90
        }"#,
    )
    .unwrap();

    let (fields, items, tags) = write.clone().into_create().unwrap();
    assert_eq!(fields.name, "Borscht");
    assert_eq!(fields.cooking_time, 90);
    assert_eq!(
        items,
        vec![
            IngredientAmount {
                ingredient: IngredientId::from(1),
                amount: 10
            },
            IngredientAmount {
                ingredient: IngredientId::from(2),
                amount: 3
            },
        ]
    );
    assert_eq!(tags, vec![TagId::from(1), TagId::from(2)]);

    let partial: RecipeWrite = serde_json::from_str(r#"{"name": "Soup"}"#).unwrap();
    assert!(matches!(
        partial.clone().into_create(),
        Err(AppError::Validation(_))
    ));
    let patch = partial.into_patch();
    assert_eq!(patch.name.as_deref(), Some("Soup"));
    assert_eq!(patch.ingredients, None);
    assert_eq!(patch.tags, None);

    assert!(serde_json::from_str::<RecipeWrite>(r#"{"colour": "red"}"#).is_err());
}

#[test]
fn recipe_payload_depends_on_viewer() {
    use crate::catalog::{create_ingredient, create_tag};
    use crate::users::user_fixture;

    let mut conn = database::test_connection();
    let alice = user_fixture(&mut conn, "alice");
    let bob = user_fixture(&mut conn, "bob");
    let eggs = create_ingredient(&mut conn, "eggs", "pcs").unwrap();
    let breakfast = create_tag(&mut conn, "Breakfast", "breakfast", Some("#FFAA00")).unwrap();
    let recipe = recipes::create_recipe(
        &mut conn,
        bob.id,
        RecipeFields {
            name: "Omelette".into(),
            image: "recipes/images/omelette.png".into(),
            text: "Whisk and fry".into(),
            cooking_time: 10,
        },
        vec![IngredientAmount {
            ingredient: eggs.id,
            amount: 3,
        }],
        vec![breakfast.id],
    )
    .unwrap();

    relations::follow(&mut conn, alice.id, bob.id).unwrap();
    relations::toggle_on(&mut conn, RecipeRelation::Favorite, alice.id, recipe.id).unwrap();

    let seen_by_alice = recipe_payload(&mut conn, Some(alice.id), recipe.clone()).unwrap();
    assert!(seen_by_alice.is_favorited);
    assert!(!seen_by_alice.is_in_shopping_cart);
    assert!(seen_by_alice.author.is_subscribed);
    assert_eq!(
        seen_by_alice.ingredients,
        vec![RecipeIngredientPayload {
            id: eggs.id,
            name: "eggs".into(),
            measurement_unit: "pcs".into(),
            amount: 3,
        }]
    );
    assert_eq!(seen_by_alice.tags, vec![TagPayload::from(breakfast)]);

    let anonymous = recipe_payload(&mut conn, None, recipe).unwrap();
    assert!(!anonymous.is_favorited);
    assert!(!anonymous.author.is_subscribed);

    let json = serde_json::to_value(&anonymous).unwrap();
    assert_eq!(json["author"]["username"], "bob");
    assert_eq!(json["ingredients"][0]["amount"], 3);
    assert_eq!(json["tags"][0]["slug"], "breakfast");
}

#[test]
fn subscription_payload_is_flat() {
    let payload = SubscriptionPayload::from(Subscription {
        author: User {
            id: UserId::from(7),
            email: "bob@example.com".into(),
            username: "bob".into(),
            first_name: "Bob".into(),
            last_name: "Tester".into(),
            avatar: None,
        },
        recipes: vec![],
        recipes_count: 4,
    });
    let json = serde_json::to_value(&payload).unwrap();
    assert_eq!(json["id"], 7);
    assert_eq!(json["is_subscribed"], true);
    assert_eq!(json["recipes_count"], 4);
    assert!(json.get("author").is_none());
}
