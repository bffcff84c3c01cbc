use async_trait::async_trait;
use sqlx::MySqlPool;
use tracing::debug;

use super::{Directory, DirectoryAdmin, DirectoryError};
use crate::model::employee::{Employee, EmployeeAccount, EmployeeChanges, NewEmployee};
use crate::model::store::{NewStore, Store, StoreChanges};
use crate::model::user::User;
use crate::utils::db_utils::SqlUpdate;

const EMPLOYEE_COLUMNS: &str = r#"
    id, employee_code, name, store_id, position, phone, email, active, created_at, updated_at
"#;

const STORE_COLUMNS: &str = "id, name, address, created_at";

#[derive(Debug, Clone)]
pub struct MySqlDirectory {
    pool: MySqlPool,
}

impl MySqlDirectory {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn fetch_employees(&self, where_sql: &str, arg: Option<&str>) -> Result<Vec<Employee>, DirectoryError> {
        let sql = format!(
            "SELECT {} FROM employees {} ORDER BY name",
            EMPLOYEE_COLUMNS, where_sql
        );

        let mut query = sqlx::query_as::<_, Employee>(&sql);
        if let Some(arg) = arg {
            query = query.bind(arg);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn fetch_account(&self, column: &str, value: &str) -> Result<Option<EmployeeAccount>, DirectoryError> {
        let sql = format!(
            "SELECT {}, password FROM employees WHERE {} = ?",
            EMPLOYEE_COLUMNS, column
        );

        Ok(sqlx::query_as::<_, EmployeeAccount>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?)
    }
}

#[async_trait]
impl Directory for MySqlDirectory {
    async fn get_employee(&self, id: &str) -> Result<Option<Employee>, DirectoryError> {
        let sql = format!("SELECT {} FROM employees WHERE id = ?", EMPLOYEE_COLUMNS);

        Ok(sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_store(&self, id: &str) -> Result<Option<Store>, DirectoryError> {
        let sql = format!("SELECT {} FROM stores WHERE id = ?", STORE_COLUMNS);

        Ok(sqlx::query_as::<_, Store>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_stores(&self) -> Result<Vec<Store>, DirectoryError> {
        let sql = format!("SELECT {} FROM stores ORDER BY name", STORE_COLUMNS);

        Ok(sqlx::query_as::<_, Store>(&sql).fetch_all(&self.pool).await?)
    }
}

#[async_trait]
impl DirectoryAdmin for MySqlDirectory {
    async fn list_employees(&self) -> Result<Vec<Employee>, DirectoryError> {
        self.fetch_employees("", None).await
    }

    async fn list_employees_by_store(&self, store_id: &str) -> Result<Vec<Employee>, DirectoryError> {
        self.fetch_employees("WHERE store_id = ?", Some(store_id)).await
    }

    async fn find_employee_by_code(&self, code: &str) -> Result<Option<EmployeeAccount>, DirectoryError> {
        self.fetch_account("employee_code", code).await
    }

    async fn get_employee_account(&self, id: &str) -> Result<Option<EmployeeAccount>, DirectoryError> {
        self.fetch_account("id", id).await
    }

    async fn add_employee(&self, new: NewEmployee) -> Result<Employee, DirectoryError> {
        sqlx::query(
            r#"
            INSERT INTO employees
            (id, employee_code, name, password, store_id, position, phone, email, active)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, TRUE)
            "#,
        )
        .bind(&new.id)
        .bind(&new.employee_code)
        .bind(&new.name)
        .bind(&new.password_hash)
        .bind(&new.store_id)
        .bind(&new.position)
        .bind(&new.phone)
        .bind(&new.email)
        .execute(&self.pool)
        .await?;

        debug!(employee_id = %new.id, "Employee inserted");

        self.get_employee(&new.id)
            .await?
            .ok_or(DirectoryError::Sql(sqlx::Error::RowNotFound))
    }

    async fn update_employee(
        &self,
        id: &str,
        changes: EmployeeChanges,
    ) -> Result<Option<Employee>, DirectoryError> {
        if self.get_employee(id).await?.is_none() {
            return Ok(None);
        }

        SqlUpdate::new("employees", "id")
            .set("name", changes.name)
            .set("position", changes.position)
            .set("phone", changes.phone)
            .set("email", changes.email)
            .set("active", changes.active)
            .touch("updated_at")
            .execute(&self.pool, id)
            .await?;

        self.get_employee(id).await
    }

    async fn set_employee_password(&self, id: &str, password_hash: &str) -> Result<bool, DirectoryError> {
        if self.get_employee(id).await?.is_none() {
            return Ok(false);
        }

        SqlUpdate::new("employees", "id")
            .set("password", Some(password_hash.to_string()))
            .touch("updated_at")
            .execute(&self.pool, id)
            .await?;

        Ok(true)
    }

    async fn delete_employee(&self, id: &str) -> Result<bool, DirectoryError> {
        let result = sqlx::query("DELETE FROM employees WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_store(&self, store: NewStore) -> Result<Store, DirectoryError> {
        sqlx::query("INSERT INTO stores (id, name, address) VALUES (?, ?, ?)")
            .bind(&store.id)
            .bind(&store.name)
            .bind(&store.address)
            .execute(&self.pool)
            .await?;

        self.get_store(&store.id)
            .await?
            .ok_or(DirectoryError::Sql(sqlx::Error::RowNotFound))
    }

    async fn update_store(&self, id: &str, changes: StoreChanges) -> Result<Option<Store>, DirectoryError> {
        if self.get_store(id).await?.is_none() {
            return Ok(None);
        }

        SqlUpdate::new("stores", "id")
            .set("name", changes.name)
            .set("address", changes.address)
            .execute(&self.pool, id)
            .await?;

        self.get_store(id).await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DirectoryError> {
        Ok(sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password, role, name, email
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?)
    }
}
