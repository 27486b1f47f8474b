//! PostgreSQL databases, users and privilege grants through the UAPI `Postgresql` module.

use serde::Deserialize;
use serde_json::Value;

use crate::client::CpanelClient;
use crate::envelope::lenient_i64;
use crate::error::GatewayError;
use crate::types::{Fields, ObservedRecord, RemoteKey, required_field};

pub const MODULE: &str = "Postgresql";

pub const FUNC_LIST_DATABASES: &str = "list_databases";
pub const FUNC_CREATE_DATABASE: &str = "create_database";
pub const FUNC_RENAME_DATABASE: &str = "rename_database";
pub const FUNC_DELETE_DATABASE: &str = "delete_database";

pub const FUNC_LIST_USERS: &str = "list_users";
pub const FUNC_CREATE_USER: &str = "create_user";
pub const FUNC_RENAME_USER: &str = "rename_user";
pub const FUNC_SET_PASSWORD: &str = "set_password";
pub const FUNC_DELETE_USER: &str = "delete_user";

pub const FUNC_GRANT_ALL_PRIVILEGES: &str = "grant_all_privileges";
pub const FUNC_REVOKE_ALL_PRIVILEGES: &str = "revoke_all_privileges";

#[derive(Debug, Deserialize)]
struct DatabaseRow {
    database: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    disk_usage: Option<i64>,
    #[serde(default)]
    users: Option<Vec<String>>,
}

impl DatabaseRow {
    fn into_record(self) -> ObservedRecord {
        let mut fields = Fields::new();
        fields.insert("name".to_string(), self.database.clone());
        if let Some(usage) = self.disk_usage {
            fields.insert("disk_usage".to_string(), usage.to_string());
        }
        ObservedRecord::new(Some(RemoteKey::Name(self.database)), fields)
            .with_members(self.users.unwrap_or_default())
    }
}

fn named_record(name: &str) -> ObservedRecord {
    let mut fields = Fields::new();
    fields.insert("name".to_string(), name.to_string());
    ObservedRecord::new(Some(RemoteKey::Name(name.to_string())), fields)
}

impl CpanelClient {
    pub(crate) async fn list_databases(&self) -> Result<Vec<ObservedRecord>, GatewayError> {
        let rows: Option<Vec<DatabaseRow>> = self.uapi(MODULE, FUNC_LIST_DATABASES, &[]).await?;
        Ok(rows
            .unwrap_or_default()
            .into_iter()
            .map(DatabaseRow::into_record)
            .collect())
    }

    pub(crate) async fn create_database(
        &self,
        fields: &Fields,
    ) -> Result<ObservedRecord, GatewayError> {
        let name = required_field(fields, "name")?;
        self.uapi::<Value>(MODULE, FUNC_CREATE_DATABASE, &[("name", name)])
            .await?;
        Ok(named_record(name))
    }

    pub(crate) async fn rename_database(
        &self,
        old_name: &str,
        fields: &Fields,
    ) -> Result<ObservedRecord, GatewayError> {
        let new_name = required_field(fields, "name")?;
        self.uapi::<Value>(
            MODULE,
            FUNC_RENAME_DATABASE,
            &[("oldname", old_name), ("newname", new_name)],
        )
        .await?;
        Ok(named_record(new_name))
    }

    pub(crate) async fn delete_database(&self, name: &str) -> Result<(), GatewayError> {
        self.uapi::<Value>(MODULE, FUNC_DELETE_DATABASE, &[("name", name)])
            .await
            .map(|_| ())
    }

    pub(crate) async fn list_users(&self) -> Result<Vec<ObservedRecord>, GatewayError> {
        let names: Option<Vec<String>> = self.uapi(MODULE, FUNC_LIST_USERS, &[]).await?;
        Ok(names
            .unwrap_or_default()
            .iter()
            .map(|name| named_record(name))
            .collect())
    }

    pub(crate) async fn create_user(&self, fields: &Fields) -> Result<ObservedRecord, GatewayError> {
        let name = required_field(fields, "name")?;
        let password = required_field(fields, "password")?;
        self.uapi::<Value>(
            MODULE,
            FUNC_CREATE_USER,
            &[("name", name), ("password", password)],
        )
        .await?;
        Ok(named_record(name))
    }

    /// Renames a user; the password is reset in the same call.
    pub(crate) async fn rename_user(
        &self,
        old_name: &str,
        fields: &Fields,
    ) -> Result<ObservedRecord, GatewayError> {
        let new_name = required_field(fields, "name")?;
        let password = required_field(fields, "password")?;
        self.uapi::<Value>(
            MODULE,
            FUNC_RENAME_USER,
            &[
                ("oldname", old_name),
                ("newname", new_name),
                ("password", password),
            ],
        )
        .await?;
        Ok(named_record(new_name))
    }

    pub(crate) async fn set_password(
        &self,
        name: &str,
        fields: &Fields,
    ) -> Result<ObservedRecord, GatewayError> {
        let password = required_field(fields, "password")?;
        self.uapi::<Value>(
            MODULE,
            FUNC_SET_PASSWORD,
            &[("user", name), ("password", password)],
        )
        .await?;
        Ok(named_record(name))
    }

    pub(crate) async fn delete_user(&self, name: &str) -> Result<(), GatewayError> {
        self.uapi::<Value>(MODULE, FUNC_DELETE_USER, &[("name", name)])
            .await
            .map(|_| ())
    }

    pub(crate) async fn grant_all_privileges(
        &self,
        database: &str,
        user: &str,
    ) -> Result<(), GatewayError> {
        self.uapi::<Value>(
            MODULE,
            FUNC_GRANT_ALL_PRIVILEGES,
            &[("database", database), ("user", user)],
        )
        .await
        .map(|_| ())
    }

    pub(crate) async fn revoke_all_privileges(
        &self,
        database: &str,
        user: &str,
    ) -> Result<(), GatewayError> {
        self.uapi::<Value>(
            MODULE,
            FUNC_REVOKE_ALL_PRIVILEGES,
            &[("database", database), ("user", user)],
        )
        .await
        .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn database_rows_carry_members() {
        let row: DatabaseRow = serde_json::from_value(json!({
            "database": "app_db",
            "disk_usage": "8192",
            "users": ["alice", "carol"]
        }))
        .unwrap();
        let record = row.into_record();
        assert_eq!(record.key, Some(RemoteKey::Name("app_db".into())));
        assert_eq!(record.field("name"), "app_db");
        assert_eq!(record.field("disk_usage"), "8192");
        assert_eq!(record.members, ["alice", "carol"]);
    }
}
