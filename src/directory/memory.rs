use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use super::{Directory, DirectoryAdmin, DirectoryError};
use crate::model::employee::{Employee, EmployeeAccount, EmployeeChanges, NewEmployee};
use crate::model::store::{NewStore, Store, StoreChanges};
use crate::model::user::User;

#[derive(Debug, Default)]
struct Records {
    users: Vec<User>,
    stores: Vec<Store>,
    employees: Vec<EmployeeAccount>,
}

/// Directory kept in process memory (`STORAGE_BACKEND=memory` and tests).
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    records: RwLock<Records>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: User) {
        self.write().users.push(user);
    }

    pub fn insert_store(&self, store: NewStore) -> Store {
        let store = Store {
            id: store.id,
            name: store.name,
            address: store.address,
            created_at: Utc::now(),
        };
        self.write().stores.push(store.clone());
        store
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Records> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Records> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn by_name(mut employees: Vec<Employee>) -> Vec<Employee> {
    employees.sort_by(|a, b| a.name.cmp(&b.name));
    employees
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn get_employee(&self, id: &str) -> Result<Option<Employee>, DirectoryError> {
        Ok(self
            .read()
            .employees
            .iter()
            .find(|a| a.employee.id == id)
            .map(|a| a.employee.clone()))
    }

    async fn get_store(&self, id: &str) -> Result<Option<Store>, DirectoryError> {
        Ok(self.read().stores.iter().find(|s| s.id == id).cloned())
    }

    async fn list_stores(&self) -> Result<Vec<Store>, DirectoryError> {
        let mut stores = self.read().stores.clone();
        stores.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(stores)
    }
}

#[async_trait]
impl DirectoryAdmin for InMemoryDirectory {
    async fn list_employees(&self) -> Result<Vec<Employee>, DirectoryError> {
        let employees = self.read().employees.iter().map(|a| a.employee.clone()).collect();
        Ok(by_name(employees))
    }

    async fn list_employees_by_store(&self, store_id: &str) -> Result<Vec<Employee>, DirectoryError> {
        let employees = self
            .read()
            .employees
            .iter()
            .filter(|a| a.employee.store_id == store_id)
            .map(|a| a.employee.clone())
            .collect();
        Ok(by_name(employees))
    }

    async fn find_employee_by_code(&self, code: &str) -> Result<Option<EmployeeAccount>, DirectoryError> {
        Ok(self
            .read()
            .employees
            .iter()
            .find(|a| a.employee.employee_code == code)
            .cloned())
    }

    async fn get_employee_account(&self, id: &str) -> Result<Option<EmployeeAccount>, DirectoryError> {
        Ok(self.read().employees.iter().find(|a| a.employee.id == id).cloned())
    }

    async fn add_employee(&self, new: NewEmployee) -> Result<Employee, DirectoryError> {
        let mut records = self.write();

        if records
            .employees
            .iter()
            .any(|a| a.employee.employee_code == new.employee_code)
        {
            return Err(DirectoryError::AlreadyExists);
        }
        if !records.stores.iter().any(|s| s.id == new.store_id) {
            return Err(DirectoryError::InvalidReference);
        }

        let now = Utc::now();
        let employee = Employee {
            id: new.id,
            employee_code: new.employee_code,
            name: new.name,
            store_id: new.store_id,
            position: new.position,
            phone: new.phone,
            email: new.email,
            active: true,
            created_at: now,
            updated_at: now,
        };
        records.employees.push(EmployeeAccount {
            employee: employee.clone(),
            password: new.password_hash,
        });
        Ok(employee)
    }

    async fn update_employee(
        &self,
        id: &str,
        changes: EmployeeChanges,
    ) -> Result<Option<Employee>, DirectoryError> {
        let mut records = self.write();
        let Some(account) = records.employees.iter_mut().find(|a| a.employee.id == id) else {
            return Ok(None);
        };

        let employee = &mut account.employee;
        if let Some(name) = changes.name {
            employee.name = name;
        }
        if let Some(position) = changes.position {
            employee.position = position;
        }
        if let Some(phone) = changes.phone {
            employee.phone = phone;
        }
        if let Some(email) = changes.email {
            employee.email = email;
        }
        if let Some(active) = changes.active {
            employee.active = active;
        }
        employee.updated_at = Utc::now();

        Ok(Some(employee.clone()))
    }

    async fn set_employee_password(&self, id: &str, password_hash: &str) -> Result<bool, DirectoryError> {
        let mut records = self.write();
        match records.employees.iter_mut().find(|a| a.employee.id == id) {
            Some(account) => {
                account.password = password_hash.to_string();
                account.employee.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_employee(&self, id: &str) -> Result<bool, DirectoryError> {
        let mut records = self.write();
        let before = records.employees.len();
        records.employees.retain(|a| a.employee.id != id);
        Ok(records.employees.len() != before)
    }

    async fn add_store(&self, store: NewStore) -> Result<Store, DirectoryError> {
        Ok(self.insert_store(store))
    }

    async fn update_store(&self, id: &str, changes: StoreChanges) -> Result<Option<Store>, DirectoryError> {
        let mut records = self.write();
        let Some(store) = records.stores.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };

        if let Some(name) = changes.name {
            store.name = name;
        }
        if let Some(address) = changes.address {
            store.address = address;
        }

        Ok(Some(store.clone()))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DirectoryError> {
        Ok(self.read().users.iter().find(|u| u.username == username).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_employee(code: &str, store_id: &str) -> NewEmployee {
        NewEmployee {
            id: format!("id-{code}"),
            employee_code: code.into(),
            name: format!("Empleado {code}"),
            store_id: store_id.into(),
            position: "Empleado".into(),
            phone: String::new(),
            email: String::new(),
            password_hash: "hash".into(),
        }
    }

    fn directory() -> InMemoryDirectory {
        let directory = InMemoryDirectory::new();
        directory.insert_store(NewStore {
            id: "store-1".into(),
            name: "Tienda Centro".into(),
            address: String::new(),
        });
        directory
    }

    #[actix_web::test]
    async fn employee_codes_are_unique() {
        let directory = directory();
        directory.add_employee(new_employee("A1", "store-1")).await.unwrap();

        let err = directory.add_employee(new_employee("A1", "store-1")).await.unwrap_err();
        assert!(matches!(err, DirectoryError::AlreadyExists));
    }

    #[actix_web::test]
    async fn employee_store_must_exist() {
        let err = directory()
            .add_employee(new_employee("A1", "store-9"))
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::InvalidReference));
    }

    #[actix_web::test]
    async fn update_touches_only_given_fields() {
        let directory = directory();
        let created = directory.add_employee(new_employee("A1", "store-1")).await.unwrap();

        let updated = directory
            .update_employee(
                &created.id,
                EmployeeChanges {
                    active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert!(!updated.is_active());
        assert_eq!(updated.name, created.name);
        assert!(directory.update_employee("missing", EmployeeChanges::default()).await.unwrap().is_none());
    }
}
