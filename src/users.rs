// Copyright 2023 Remi Bernotavicius

use crate::database;
use crate::database::models::{User, UserId};
use crate::error::{AppError, AppResult};
use diesel::prelude::OptionalExtension as _;
use diesel::BoolExpressionMethods as _;
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;
use once_cell::sync::Lazy;
use regex::Regex;

const MAX_EMAIL_LENGTH: usize = 254;
const MAX_NAME_LENGTH: usize = 150;

static USERNAME_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w.@+-]+$").unwrap());
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

pub struct NewUser<'a> {
    pub email: &'a str,
    pub username: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
}

fn check_length(field: &str, value: &str, max: usize) -> AppResult<()> {
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

impl NewUser<'_> {
    fn validate(&self) -> AppResult<()> {
        check_length("email", self.email, MAX_EMAIL_LENGTH)?;
        if !EMAIL_PATTERN.is_match(self.email) {
            return Err(AppError::validation("email: enter a valid email address"));
        }
        check_length("username", self.username, MAX_NAME_LENGTH)?;
        if !USERNAME_PATTERN.is_match(self.username) {
            return Err(AppError::validation(
                "username: may contain only letters, digits and @.+-_ characters",
            ));
        }
        check_length("first_name", self.first_name, MAX_NAME_LENGTH)?;
        check_length("last_name", self.last_name, MAX_NAME_LENGTH)?;
        Ok(())
    }
}

pub fn create_user(conn: &mut database::Connection, new_user: NewUser<'_>) -> AppResult<User> {
    use database::schema::users::dsl::*;
    use diesel::insert_into;

    new_user.validate()?;

    let taken: i64 = users
        .filter(email.eq(new_user.email).or(username.eq(new_user.username)))
        .count()
        .get_result(conn)?;
    if taken > 0 {
        return Err(AppError::AlreadyExists(
            "a user with this email or username already exists".into(),
        ));
    }

    let user = insert_into(users)
        .values((
            email.eq(new_user.email),
            username.eq(new_user.username),
            first_name.eq(new_user.first_name),
            last_name.eq(new_user.last_name),
        ))
        .returning(User::as_returning())
        .get_result(conn)
        .map_err(|e| {
            AppError::from_insert(e, "a user with this email or username already exists")
        })?;
    log::info!("created user {} ({})", user.id, user.username);
    Ok(user)
}

pub fn get_user(conn: &mut database::Connection, user_id: UserId) -> AppResult<User> {
    use database::schema::users::dsl::*;

    users
        .find(user_id)
        .select(User::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found(format!("user {user_id}")))
}

pub fn set_avatar(
    conn: &mut database::Connection,
    user_id: UserId,
    reference: &str,
) -> AppResult<User> {
    use database::schema::users::dsl::*;
    use diesel::update;

    if reference.trim().is_empty() {
        return Err(AppError::validation("avatar: this field is required"));
    }
    get_user(conn, user_id)?;
    let user = update(users.find(user_id))
        .set(avatar.eq(reference))
        .returning(User::as_returning())
        .get_result(conn)?;
    log::info!("set avatar of user {user_id}");
    Ok(user)
}

pub fn clear_avatar(conn: &mut database::Connection, user_id: UserId) -> AppResult<()> {
    use database::schema::users::dsl::*;
    use diesel::update;

    let user = get_user(conn, user_id)?;
    if user.avatar.is_none() {
        return Err(AppError::not_found("the user has no avatar to delete"));
    }
    update(users.find(user_id))
        .set(avatar.eq(None::<String>))
        .execute(conn)?;
    log::info!("cleared avatar of user {user_id}");
    Ok(())
}

#[cfg(test)]
pub fn user_fixture(conn: &mut database::Connection, name: &str) -> User {
    create_user(
        conn,
        NewUser {
            email: &format!("{name}@example.com"),
            username: name,
            first_name: name,
            last_name: "Tester",
        },
    )
    .unwrap()
}

#[test]
fn create_and_fetch_user() {
    let mut conn = database::test_connection();
    let user = user_fixture(&mut conn, "alice");
    assert_eq!(user.email, "alice@example.com");
    assert_eq!(user.avatar, None);

    let fetched = get_user(&mut conn, user.id).unwrap();
    assert_eq!(fetched, user);
}

#[test]
fn duplicate_users_rejected() {
    let mut conn = database::test_connection();
    user_fixture(&mut conn, "alice");

    let result = create_user(
        &mut conn,
        NewUser {
            email: "alice@example.com",
            username: "someone_else",
            first_name: "A",
            last_name: "B",
        },
    );
    assert!(matches!(result, Err(AppError::AlreadyExists(_))));

    let result = create_user(
        &mut conn,
        NewUser {
            email: "other@example.com",
            username: "alice",
            first_name: "A",
            last_name: "B",
        },
    );
    assert!(matches!(result, Err(AppError::AlreadyExists(_))));
}

#[test]
fn invalid_usernames_rejected() {
    let mut conn = database::test_connection();
    for bad in ["has space", "semi;colon", ""] {
        let result = create_user(
            &mut conn,
            NewUser {
                email: "bob@example.com",
                username: bad,
                first_name: "Bob",
                last_name: "B",
            },
        );
        assert!(matches!(result, Err(AppError::Validation(_))), "{bad:?}");
    }

    let result = create_user(
        &mut conn,
        NewUser {
            email: "not-an-email",
            username: "bob",
            first_name: "Bob",
            last_name: "B",
        },
    );
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[test]
fn avatar_set_and_clear() {
    let mut conn = database::test_connection();
    let user = user_fixture(&mut conn, "alice");

    assert!(matches!(
        clear_avatar(&mut conn, user.id),
        Err(AppError::NotFound(_))
    ));

    let user = set_avatar(&mut conn, user.id, "users/avatars/alice.png").unwrap();
    assert_eq!(user.avatar.as_deref(), Some("users/avatars/alice.png"));

    clear_avatar(&mut conn, user.id).unwrap();
    assert_eq!(get_user(&mut conn, user.id).unwrap().avatar, None);
}
