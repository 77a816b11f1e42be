use sqlx::MySqlPool;
use tracing::info;

pub async fn init_db(database_url: &str, run_migrations: bool) -> MySqlPool {
    let pool = MySqlPool::connect(database_url)
        .await
        .expect("Failed to connect to database");

    if run_migrations {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations");
        info!("Database migrations applied");
    }

    pool
}
