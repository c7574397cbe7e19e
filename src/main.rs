// SPDX-License-Identifier: MPL-2.0

use clap::{Parser, Subcommand, ValueEnum};
use rsl_dictionary::config::APP_NAME;
use rsl_dictionary::model::{Sign, timestamp};
use rsl_dictionary::state::{
    AppSettings, DataMode, FavoritesSort, SettingsChange, SyncOutcome, load_favorite_signs,
};
use rsl_dictionary::{AppError, AppOptions, Dictionary, UserMessage, runtime};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "rsl")]
#[command(about = "Russian Sign Language dictionary", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Read the catalog from this bundle file instead of the sync backend
    #[arg(long, global = true)]
    bundle: Option<PathBuf>,

    /// Sync backend base URL
    #[arg(long, global = true)]
    api: Option<String>,

    /// Directory for the snapshot and the local store
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Do not persist favorites or the last sync date
    #[arg(long, global = true)]
    ephemeral: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List categories
    #[command(alias = "cats")]
    Categories,

    /// List signs, optionally in one category
    #[command(alias = "ls")]
    Signs {
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Show one sign
    Show { id: String },

    /// Search by word, keyword or description
    Search {
        #[arg(default_value = "")]
        query: String,
    },

    /// Pull fresh data from the backend
    Sync {
        /// Fetch even if the server reports no changes
        #[arg(short, long)]
        force: bool,
    },

    /// Manage favorites
    #[command(alias = "fav")]
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },

    /// Print the playable video URL of a sign
    Video {
        id: String,
        /// Confirm the storage actually serves the file
        #[arg(long)]
        check: bool,
    },

    /// Inspect or drop the local snapshot
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Show or change the saved settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand, Debug)]
enum FavoritesAction {
    List {
        #[arg(short, long, value_enum)]
        sort: Option<SortArg>,
    },
    Add { id: String },
    #[command(alias = "rm")]
    Remove { id: String },
    Clear,
}

#[derive(Subcommand, Debug)]
enum CacheAction {
    Status,
    Clear,
}

/// `set` also saves the global --api, --bundle and --timeout flags.
#[derive(Subcommand, Debug)]
enum SettingsAction {
    Show,
    Set {
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
        #[arg(short, long, value_enum)]
        sort: Option<SortArg>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Bundle,
    Sync,
}

impl From<ModeArg> for DataMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Bundle => DataMode::Bundle,
            ModeArg::Sync => DataMode::Sync,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SortArg {
    Newest,
    Oldest,
    Az,
    Za,
}

impl From<SortArg> for FavoritesSort {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Newest => FavoritesSort::NewestFirst,
            SortArg::Oldest => FavoritesSort::OldestFirst,
            SortArg::Az => FavoritesSort::Alphabetical,
            SortArg::Za => FavoritesSort::ReverseAlphabetical,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("rsl_dictionary=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = AppSettings::load();
    let options = options(&cli, &settings);
    let change = overrides(&cli);

    // Settings must stay editable even when they cannot open the dictionary.
    let result = match cli.command {
        Commands::Settings { action } => run_settings(action, change, settings),
        command => runtime::block_on(run(command, options, settings)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("{APP_NAME}: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

fn options(cli: &Cli, settings: &AppSettings) -> AppOptions {
    let mut options = AppOptions::from(settings);
    if let Some(bundle) = &cli.bundle {
        options.data_mode = DataMode::Bundle;
        options.bundle_path = Some(bundle.clone());
    }
    if let Some(api) = &cli.api {
        options.data_mode = DataMode::Sync;
        options.api_base_url = api.clone();
    }
    if let Some(secs) = cli.timeout {
        options.request_timeout = Duration::from_secs(secs);
    }
    options.data_dir = cli.data_dir.clone();
    options.ephemeral = cli.ephemeral;
    options
}

/// The global flags as a settings change. --api wins over --bundle.
fn overrides(cli: &Cli) -> SettingsChange {
    let data_mode = match (&cli.api, &cli.bundle) {
        (Some(_), _) => Some(DataMode::Sync),
        (None, Some(_)) => Some(DataMode::Bundle),
        (None, None) => None,
    };
    SettingsChange {
        data_mode,
        api_base_url: cli.api.clone(),
        bundle_path: cli.bundle.clone(),
        request_timeout_secs: cli.timeout,
        favorites_sort: None,
    }
}

fn run_settings(
    action: SettingsAction,
    mut change: SettingsChange,
    mut settings: AppSettings,
) -> Result<(), AppError> {
    if let SettingsAction::Set { mode, sort } = action {
        if let Some(mode) = mode {
            change.data_mode = Some(mode.into());
        }
        change.favorites_sort = sort.map(Into::into);
        if settings.apply(change)? {
            settings.save()?;
            println!("Настройки сохранены");
        } else {
            println!("Настройки не изменились");
        }
    }

    if let Some(path) = AppSettings::settings_path() {
        println!("Файл: {}", path.display());
    }
    let mode = match settings.data_mode {
        DataMode::Bundle => "встроенные данные",
        DataMode::Sync => "синхронизация",
    };
    println!("Режим: {mode}");
    println!("Сервер: {}", settings.api_base_url);
    if let Some(path) = &settings.bundle_path {
        println!("Файл словаря: {}", path.display());
    }
    println!("Таймаут запроса: {} с", settings.request_timeout_secs);
    println!("Порядок избранного: {:?}", settings.favorites_sort);
    Ok(())
}

async fn run(command: Commands, options: AppOptions, settings: AppSettings) -> Result<(), AppError> {
    let app = Dictionary::open(&options)?;

    match command {
        Commands::Categories => {
            for category in app.repository.load_categories().await? {
                let count = app.repository.count_signs(&category.id).await?;
                println!("{:<20} {} ({count})", category.id, category.name);
            }
        }
        Commands::Signs { category } => {
            let signs = match category {
                Some(id) => app.repository.get_signs_by_category(&id).await?,
                None => app.repository.load_all_signs().await?,
            };
            print_signs(&signs);
        }
        Commands::Show { id } => {
            let sign = app
                .repository
                .get_sign(&id)
                .await?
                .ok_or_else(|| AppError::Usage(format!("Жест «{id}» не найден")))?;
            app.categories.load(&app.repository).await?;

            println!("{} [{}]", sign.word, sign.id);
            println!("Категория: {}", app.categories.name(&sign.category));
            if !sign.description.is_empty() {
                println!("{}", sign.description);
            }
            if !sign.synonyms.is_empty() {
                let words: Vec<_> = sign.synonyms.iter().map(|s| s.word.as_str()).collect();
                println!("Синонимы: {}", words.join(", "));
            }
            match app.videos.video_url(&sign) {
                Ok(url) => println!("Видео: {url}"),
                Err(e) => println!("Видео: {}", e.user_message()),
            }
            if app.favorites.contains(&sign.id) {
                println!("★ В избранном");
            }
        }
        Commands::Search { query } => {
            let search = app.search();
            search.search_now(&query).await;
            let state = search.state();
            if let Some(error) = state.error {
                return Err(AppError::Usage(error));
            }
            print_signs(&state.results);
        }
        Commands::Sync { force } => {
            let service = app.sync_service().ok_or_else(|| {
                AppError::Usage("Синхронизация недоступна в режиме встроенных данных".to_string())
            })?;
            let result = if force {
                service.force_sync().await
            } else {
                service.sync().await
            };
            match result {
                Ok(SyncOutcome::UpToDate { last_updated }) => {
                    println!("Данные актуальны ({})", timestamp::format(&last_updated));
                }
                Ok(SyncOutcome::Updated {
                    signs,
                    categories,
                    last_updated,
                }) => {
                    println!(
                        "Обновлено: {signs} жестов, {categories} категорий ({})",
                        timestamp::format(&last_updated)
                    );
                }
                Err(e) => match e.user_visible() {
                    Some(_) => return Err(e.into()),
                    None => println!("Нет подключения, используются сохранённые данные"),
                },
            }
        }
        Commands::Favorites { action } => match action {
            FavoritesAction::List { sort } => {
                let mut favorites = load_favorite_signs(&app.favorites, &app.repository).await?;
                favorites.sort(sort.map(Into::into).unwrap_or(settings.favorites_sort));
                print_signs(&favorites.signs);
                if favorites.unresolved_count() > 0 {
                    eprintln!("Не найдено жестов: {}", favorites.unresolved_count());
                }
            }
            FavoritesAction::Add { id } => {
                if app.repository.get_sign(&id).await?.is_none() {
                    return Err(AppError::Usage(format!("Жест «{id}» не найден")));
                }
                app.favorites.add(id).await?;
            }
            FavoritesAction::Remove { id } => {
                app.favorites.remove(id).await?;
            }
            FavoritesAction::Clear => app.favorites.clear().await?,
        },
        Commands::Video { id, check } => {
            let sign = app
                .repository
                .get_sign(&id)
                .await?
                .ok_or_else(|| AppError::Usage(format!("Жест «{id}» не найден")))?;
            let url = if check {
                app.videos.check_available(&sign).await?
            } else {
                app.videos.video_url(&sign)?
            };
            println!("{url}");
        }
        Commands::Cache { action } => match action {
            CacheAction::Status => {
                let status = app.cache_status().await;
                println!("Снимок: {}", status.snapshot_path.display());
                println!("Есть на диске: {}", if status.on_disk { "да" } else { "нет" });
                if let Some((signs, categories)) = status.snapshot_counts {
                    println!("В снимке: {signs} жестов, {categories} категорий");
                }
                if app.sync_service().is_some() {
                    match status.last_sync {
                        Some(ts) => println!("Последняя синхронизация: {}", timestamp::format(&ts)),
                        None => println!("Последняя синхронизация: никогда"),
                    }
                }
                if let Some(info) = status.loaded {
                    println!(
                        "Загружено из {}: {} жестов, {} категорий",
                        info.source, info.signs, info.categories
                    );
                }
            }
            CacheAction::Clear => {
                app.store.clear()?;
                app.repository.invalidate().await;
                app.categories.reset();
                app.videos.clear_cache();
            }
        },
        Commands::Settings { action } => run_settings(action, SettingsChange::default(), settings)?,
    }
    Ok(())
}

fn print_signs(signs: &[Sign]) {
    for sign in signs {
        println!("{:<8} {}", sign.id, sign.word);
    }
}
