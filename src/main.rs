use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mathfacts::{cli, config, db};

fn main() {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "mathfacts=info".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  let db_path = config::load_database_path();
  let pool = db::init_db(&db_path).expect("Failed to initialize database");

  let profile = config::load_profile_name();
  tracing::info!("Profile '{}' using database {}", profile, db_path.display());

  cli::run(&pool, &profile);
}
