//! Seeds the customer store with demo data. Idempotent on email.
//!
//! Usage: DATABASE_URL=... cargo run --bin seed_customers

use customer_rs::{db, repos::customer_repo};

const DEMO_CUSTOMERS: &[(&str, &str, &str)] = &[
    ("María García", "maria@example.com", "Calle Principal 123, CDMX"),
    ("Carlos López", "carlos@example.com", "Av. Reforma 456, Guadalajara"),
    ("Ana Martínez", "ana@example.com", "Blvd. Constitución 789, Monterrey"),
    ("Juan Hernández", "juan@example.com", "Calle 5 de Mayo 321, Puebla"),
    ("Laura Sánchez", "laura@example.com", "Av. Juárez 654, Querétaro"),
];

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = db::init_pool(&database_url)
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!("./db/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let mut created = 0;
    for (name, email, address) in DEMO_CUSTOMERS {
        match customer_repo::insert_if_absent(&pool, name, email, address).await {
            Ok(Some(customer)) => {
                created += 1;
                println!("Created customer {} ({})", customer.id, customer.email);
            }
            Ok(None) => println!("Customer {email} already exists, skipping"),
            Err(e) => eprintln!("Failed to seed {email}: {e}"),
        }
    }

    println!("Seeded {created} customers");
}
