// Copyright 2023 Remi Bernotavicius

use std::path::PathBuf;

fn parse_level(s: &str) -> Result<log::LevelFilter, String> {
    s.parse()
        .map_err(|_| format!("unknown log level {s:?}, expected one of off, error, warn, info, debug, trace"))
}

/// Settings shared by every subcommand. Each one can also come from the environment.
#[derive(clap::Args, Debug, Clone)]
pub struct Config {
    /// SQLite database file. Defaults to `data.sqlite` in the user's data directory.
    #[arg(long, global = true, env = "FOODGRAM_DATABASE")]
    pub database: Option<PathBuf>,

    /// Prefix for short recipe links.
    #[arg(
        long,
        global = true,
        env = "FOODGRAM_BASE_URL",
        default_value = "http://localhost"
    )]
    pub base_url: String,

    /// Default number of results per page.
    #[arg(long, global = true, env = "FOODGRAM_PAGE_SIZE", default_value_t = 10)]
    pub page_size: i64,

    #[arg(
        long,
        global = true,
        env = "FOODGRAM_LOG",
        default_value = "info",
        value_parser = parse_level
    )]
    pub log_level: log::LevelFilter,
}

impl Config {
    pub fn database_path(&self) -> crate::Result<PathBuf> {
        match &self.database {
            Some(path) => Ok(path.clone()),
            None => Ok(crate::data_path()?.join("data.sqlite")),
        }
    }
}

#[test]
fn config_defaults_and_overrides() {
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        config: Config,
    }

    // Defaults only apply when the environment doesn't set anything.
    for var in [
        "FOODGRAM_DATABASE",
        "FOODGRAM_BASE_URL",
        "FOODGRAM_PAGE_SIZE",
        "FOODGRAM_LOG",
    ] {
        std::env::remove_var(var);
    }

    let cli = Cli::try_parse_from(["foodgram"]).unwrap();
    assert_eq!(cli.config.database, None);
    assert_eq!(cli.config.page_size, 10);
    assert_eq!(cli.config.base_url, "http://localhost");
    assert_eq!(cli.config.log_level, log::LevelFilter::Info);

    let cli = Cli::try_parse_from([
        "foodgram",
        "--database",
        "/tmp/food.sqlite",
        "--page-size",
        "20",
        "--log-level",
        "debug",
    ])
    .unwrap();
    assert_eq!(
        cli.config.database_path().unwrap(),
        PathBuf::from("/tmp/food.sqlite")
    );
    assert_eq!(cli.config.page_size, 20);
    assert_eq!(cli.config.log_level, log::LevelFilter::Debug);

    assert!(Cli::try_parse_from(["foodgram", "--log-level", "loud"]).is_err());
}
