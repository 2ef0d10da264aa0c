use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Connect to the integration-test database and run migrations.
///
/// Requires `DATABASE_URL` to point at a disposable Postgres instance.
pub async fn setup_pool() -> PgPool {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for integration tests");

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./db/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

pub async fn teardown_pool(pool: PgPool) {
    pool.close().await;
}

/// Insert a customer with a unique email and return its id
pub async fn insert_customer(pool: &PgPool, name: &str) -> i64 {
    let email = format!("{}@example.com", uuid::Uuid::new_v4());

    let row: (i64,) = sqlx::query_as(
        r#"
        INSERT INTO customers (name, email, address)
        VALUES ($1, $2, 'Calle Principal 123, CDMX')
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(email)
    .fetch_one(pool)
    .await
    .expect("Should insert test customer");

    row.0
}

/// Current orders_count for a customer
pub async fn orders_count(pool: &PgPool, customer_id: i64) -> i32 {
    let row: (i32,) = sqlx::query_as("SELECT orders_count FROM customers WHERE id = $1")
        .bind(customer_id)
        .fetch_one(pool)
        .await
        .expect("Should fetch orders_count");
    row.0
}
