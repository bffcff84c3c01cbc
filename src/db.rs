use anyhow::{Context, Result};
use sqlx::MySqlPool;
use tracing::info;

use crate::auth::password::hash_password;
use crate::directory::InMemoryDirectory;
use crate::model::store::NewStore;
use crate::model::user::User;

pub const ADMIN_ID: &str = "admin-1";
pub const ADMIN_USERNAME: &str = "admin";

/// Stores created on first start.
pub const SEED_STORES: [(&str, &str, &str); 4] = [
    ("store-1", "Tienda Centro", "Av. Principal #100"),
    ("store-2", "Tienda Norte", "Zona Norte #200"),
    ("store-3", "Tienda Sur", "Zona Sur #300"),
    ("store-4", "Tienda Este", "Zona Este #400"),
];

const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id VARCHAR(50) PRIMARY KEY,
        username VARCHAR(100) NOT NULL UNIQUE,
        password VARCHAR(255) NOT NULL,
        role VARCHAR(20) NOT NULL,
        name VARCHAR(200) NOT NULL,
        email VARCHAR(200) NOT NULL DEFAULT '',
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS stores (
        id VARCHAR(50) PRIMARY KEY,
        name VARCHAR(200) NOT NULL,
        address VARCHAR(300) NOT NULL DEFAULT '',
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS employees (
        id VARCHAR(50) PRIMARY KEY,
        employee_code VARCHAR(50) NOT NULL UNIQUE,
        name VARCHAR(200) NOT NULL,
        password VARCHAR(255) NOT NULL,
        email VARCHAR(200) NOT NULL DEFAULT '',
        phone VARCHAR(50) NOT NULL DEFAULT '',
        store_id VARCHAR(50) NOT NULL,
        position VARCHAR(100) NOT NULL DEFAULT 'Empleado',
        active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        KEY idx_employees_store (store_id),
        CONSTRAINT fk_employees_store FOREIGN KEY (store_id) REFERENCES stores (id)
    )
    "#,
    // no FK to employees: punches outlive deleted employees
    r#"
    CREATE TABLE IF NOT EXISTS punches (
        id VARCHAR(50) PRIMARY KEY,
        employee_id VARCHAR(50) NOT NULL,
        store_id VARCHAR(50) NOT NULL,
        punch_type VARCHAR(20) NOT NULL,
        punch_date DATE NOT NULL,
        punch_time VARCHAR(20) NOT NULL,
        punched_at DATETIME(6) NOT NULL,
        daily_slot VARCHAR(20) NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UNIQUE KEY uq_punches_daily_slot (employee_id, punch_date, daily_slot),
        KEY idx_punches_employee (employee_id),
        KEY idx_punches_store (store_id),
        KEY idx_punches_date (punch_date)
    )
    "#,
];

pub async fn init_db(database_url: &str) -> Result<MySqlPool> {
    MySqlPool::connect(database_url)
        .await
        .context("Failed to connect to database")
}

/// Creates missing tables and seeds the admin account and default stores.
pub async fn bootstrap(pool: &MySqlPool, admin_password: &str) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .context("Failed to create schema")?;
    }

    let admins = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE username = ?")
        .bind(ADMIN_USERNAME)
        .fetch_one(pool)
        .await?;

    if admins == 0 {
        let hashed = hash_password(admin_password).map_err(|e| anyhow::anyhow!("{e}"))?;
        sqlx::query(
            r#"
            INSERT INTO users (id, username, password, role, name, email)
            VALUES (?, ?, ?, 'admin', 'Administrador', 'admin@empresa.com')
            "#,
        )
        .bind(ADMIN_ID)
        .bind(ADMIN_USERNAME)
        .bind(hashed)
        .execute(pool)
        .await?;

        for (id, name, address) in SEED_STORES {
            sqlx::query("INSERT IGNORE INTO stores (id, name, address) VALUES (?, ?, ?)")
                .bind(id)
                .bind(name)
                .bind(address)
                .execute(pool)
                .await?;
        }

        info!("Seeded admin account and default stores");
    }

    info!("Database initialised");
    Ok(())
}

/// In-memory directory with the same seed data as the MySQL bootstrap.
pub fn seeded_memory_directory(admin_password: &str) -> Result<InMemoryDirectory> {
    let directory = InMemoryDirectory::new();
    let hashed = hash_password(admin_password).map_err(|e| anyhow::anyhow!("{e}"))?;

    directory.insert_user(User {
        id: ADMIN_ID.to_string(),
        username: ADMIN_USERNAME.to_string(),
        password: hashed,
        role: "admin".to_string(),
        name: "Administrador".to_string(),
        email: "admin@empresa.com".to_string(),
    });

    for (id, name, address) in SEED_STORES {
        directory.insert_store(NewStore {
            id: id.to_string(),
            name: name.to_string(),
            address: address.to_string(),
        });
    }

    Ok(directory)
}
