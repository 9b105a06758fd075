// Copyright 2023 Remi Bernotavicius

use clap::Parser;
use clap::Subcommand;
use database::models::{IngredientId, RecipeId, TagId, UserId};
use pagination::PageRequest;
use relations::RecipeRelation;
use serde::Serialize;
use std::path::{Path, PathBuf};

mod catalog;
mod config;
mod database;
mod error;
mod import;
mod pagination;
mod presentation;
mod recipes;
mod relations;
mod shopping_list;
mod subscriptions;
mod users;

type Error = Box<dyn std::error::Error + Send + Sync + 'static>;
type Result<T> = std::result::Result<T, Error>;

#[derive(Parser, Debug)]
#[command(about = "Recipes, favorites, subscriptions and shopping lists")]
struct Args {
    #[command(flatten)]
    config: config::Config,

    #[command(subcommand)]
    commands: Commands,
}

#[derive(clap::Args, Debug)]
struct PageArgs {
    #[arg(long)]
    page: Option<i64>,
    #[arg(long)]
    limit: Option<i64>,
}

impl PageArgs {
    fn request(&self, config: &config::Config) -> Result<PageRequest> {
        Ok(PageRequest::new(self.page, self.limit, config.page_size)?)
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    CreateUser {
        email: String,
        username: String,
        first_name: String,
        last_name: String,
    },
    ShowUser {
        id: UserId,
        #[arg(long)]
        viewer: Option<UserId>,
    },
    SetAvatar {
        user: UserId,
        reference: String,
    },
    ClearAvatar {
        user: UserId,
    },
    CreateIngredient {
        name: String,
        measurement_unit: String,
    },
    /// Loads `name,measurement_unit` rows from a CSV file.
    LoadIngredients {
        path: PathBuf,
    },
    ShowIngredient {
        id: IngredientId,
    },
    SearchIngredients {
        prefix: Option<String>,
    },
    CreateTag {
        name: String,
        slug: String,
        #[arg(long)]
        color: Option<String>,
    },
    ShowTag {
        id: TagId,
    },
    ListTags,
    /// Creates a recipe from a JSON file.
    CreateRecipe {
        #[arg(long)]
        author: UserId,
        path: PathBuf,
    },
    /// Updates a recipe from a JSON file. The file must list every ingredient.
    UpdateRecipe {
        #[arg(long)]
        actor: UserId,
        recipe: RecipeId,
        path: PathBuf,
    },
    DeleteRecipe {
        #[arg(long)]
        actor: UserId,
        recipe: RecipeId,
    },
    ShowRecipe {
        recipe: RecipeId,
        #[arg(long)]
        viewer: Option<UserId>,
    },
    ListRecipes {
        #[arg(long)]
        viewer: Option<UserId>,
        #[arg(long)]
        author: Option<UserId>,
        /// Tag slug, may be repeated.
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long, value_parser = clap::builder::BoolishValueParser::new())]
        is_favorited: Option<bool>,
        #[arg(long, value_parser = clap::builder::BoolishValueParser::new())]
        is_in_shopping_cart: Option<bool>,
        #[command(flatten)]
        page: PageArgs,
    },
    ShortLink {
        recipe: RecipeId,
    },
    Favorite {
        #[arg(long)]
        user: UserId,
        recipe: RecipeId,
    },
    Unfavorite {
        #[arg(long)]
        user: UserId,
        recipe: RecipeId,
    },
    AddToCart {
        #[arg(long)]
        user: UserId,
        recipe: RecipeId,
    },
    RemoveFromCart {
        #[arg(long)]
        user: UserId,
        recipe: RecipeId,
    },
    Subscribe {
        #[arg(long)]
        user: UserId,
        author: UserId,
        #[arg(long)]
        recipes_limit: Option<i64>,
    },
    Unsubscribe {
        #[arg(long)]
        user: UserId,
        author: UserId,
    },
    Subscriptions {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        recipes_limit: Option<i64>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Prints the user's shopping list, or writes it into the `--output` directory.
    ShoppingList {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// This is where the database and other user-data lives on-disk. On Linux it should be like:
/// `~/.local/share/foodgram/`
fn data_path() -> Result<PathBuf> {
    let dirs = directories::BaseDirs::new().ok_or("failed to get user home directory")?;
    let path = dirs.data_dir().join("foodgram");
    std::fs::create_dir_all(&path)?;
    Ok(path)
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_recipe(path: &Path) -> Result<presentation::RecipeWrite> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

fn mark(
    conn: &mut database::Connection,
    relation: RecipeRelation,
    user: UserId,
    recipe: RecipeId,
) -> Result<()> {
    relations::toggle_on(conn, relation, user, recipe)?;
    let recipe = recipes::get_recipe(conn, recipe)?;
    print_json(&presentation::RecipeSummary::from(recipe))
}

fn run(conn: &mut database::Connection, config: &config::Config, command: Commands) -> Result<()> {
    match command {
        Commands::CreateUser {
            email,
            username,
            first_name,
            last_name,
        } => {
            let user = users::create_user(
                conn,
                users::NewUser {
                    email: &email,
                    username: &username,
                    first_name: &first_name,
                    last_name: &last_name,
                },
            )?;
            print_json(&presentation::user_payload(conn, None, user)?)?;
        }
        Commands::ShowUser { id, viewer } => {
            let user = users::get_user(conn, id)?;
            print_json(&presentation::user_payload(conn, viewer, user)?)?;
        }
        Commands::SetAvatar { user, reference } => {
            let user = users::set_avatar(conn, user, &reference)?;
            println!("{}", serde_json::json!({ "avatar": user.avatar }));
        }
        Commands::ClearAvatar { user } => users::clear_avatar(conn, user)?,
        Commands::CreateIngredient {
            name,
            measurement_unit,
        } => {
            let ingredient = catalog::create_ingredient(conn, &name, &measurement_unit)?;
            print_json(&presentation::IngredientPayload::from(ingredient))?;
        }
        Commands::LoadIngredients { path } => {
            let summary = import::load_ingredients(conn, path)?;
            println!(
                "loaded {}, already present {}, skipped {}",
                summary.loaded, summary.already_present, summary.skipped
            );
        }
        Commands::ShowIngredient { id } => {
            let ingredient = catalog::get_ingredient(conn, id)?;
            print_json(&presentation::IngredientPayload::from(ingredient))?;
        }
        Commands::SearchIngredients { prefix } => {
            let found: Vec<presentation::IngredientPayload> =
                catalog::search_ingredients(conn, prefix.as_deref())?
                    .into_iter()
                    .map(Into::into)
                    .collect();
            print_json(&found)?;
        }
        Commands::CreateTag { name, slug, color } => {
            let tag = catalog::create_tag(conn, &name, &slug, color.as_deref())?;
            print_json(&presentation::TagPayload::from(tag))?;
        }
        Commands::ShowTag { id } => {
            print_json(&presentation::TagPayload::from(catalog::get_tag(conn, id)?))?;
        }
        Commands::ListTags => {
            let tags: Vec<presentation::TagPayload> = catalog::list_tags(conn)?
                .into_iter()
                .map(Into::into)
                .collect();
            print_json(&tags)?;
        }
        Commands::CreateRecipe { author, path } => {
            let (fields, ingredients, tags) = read_recipe(&path)?.into_create()?;
            let recipe = recipes::create_recipe(conn, author, fields, ingredients, tags)?;
            print_json(&presentation::recipe_payload(conn, Some(author), recipe)?)?;
        }
        Commands::UpdateRecipe {
            actor,
            recipe,
            path,
        } => {
            let patch = read_recipe(&path)?.into_patch();
            let recipe = recipes::update_recipe(conn, actor, recipe, patch)?;
            print_json(&presentation::recipe_payload(conn, Some(actor), recipe)?)?;
        }
        Commands::DeleteRecipe { actor, recipe } => recipes::delete_recipe(conn, actor, recipe)?,
        Commands::ShowRecipe { recipe, viewer } => {
            let recipe = recipes::get_recipe(conn, recipe)?;
            print_json(&presentation::recipe_payload(conn, viewer, recipe)?)?;
        }
        Commands::ListRecipes {
            viewer,
            author,
            tags,
            is_favorited,
            is_in_shopping_cart,
            page,
        } => {
            let filter = recipes::RecipeFilter {
                author,
                tags,
                is_favorited,
                is_in_shopping_cart,
            };
            let page = recipes::list_recipes(conn, viewer, &filter, page.request(config)?)?
                .try_map(|r| presentation::recipe_payload(conn, viewer, r))?;
            print_json(&page)?;
        }
        Commands::ShortLink { recipe } => {
            let link = recipes::short_link(conn, &config.base_url, recipe)?;
            println!("{}", serde_json::json!({ "short-link": link }));
        }
        Commands::Favorite { user, recipe } => mark(conn, RecipeRelation::Favorite, user, recipe)?,
        Commands::Unfavorite { user, recipe } => {
            relations::toggle_off(conn, RecipeRelation::Favorite, user, recipe)?
        }
        Commands::AddToCart { user, recipe } => {
            mark(conn, RecipeRelation::ShoppingCart, user, recipe)?
        }
        Commands::RemoveFromCart { user, recipe } => {
            relations::toggle_off(conn, RecipeRelation::ShoppingCart, user, recipe)?
        }
        Commands::Subscribe {
            user,
            author,
            recipes_limit,
        } => {
            relations::follow(conn, user, author)?;
            let author = users::get_user(conn, author)?;
            let subscription = subscriptions::subscription_for(conn, author, recipes_limit)?;
            print_json(&presentation::SubscriptionPayload::from(subscription))?;
        }
        Commands::Unsubscribe { user, author } => relations::unfollow(conn, user, author)?,
        Commands::Subscriptions {
            user,
            recipes_limit,
            page,
        } => {
            let page = subscriptions::list_subscriptions(
                conn,
                user,
                recipes_limit,
                page.request(config)?,
            )?
            .try_map(|s| Ok(presentation::SubscriptionPayload::from(s)))?;
            print_json(&page)?;
        }
        Commands::ShoppingList { user, output } => {
            let list = shopping_list::build_report(conn, user)?;
            match output {
                Some(dir) => {
                    let path = dir.join(list.file_name());
                    std::fs::write(&path, list.to_string())?;
                    log::info!("wrote shopping list to {}", path.display());
                }
                None => print!("{list}"),
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    simple_logger::SimpleLogger::new()
        .with_level(args.config.log_level)
        .env()
        .init()?;

    let mut conn = database::establish_connection(args.config.database_path()?)?;
    if let Err(e) = run(&mut conn, &args.config, args.commands) {
        log::error!("{e}");
        return Err(e);
    }
    Ok(())
}
