//! In-memory gateway that records every call.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cpanel_api::{
    DynGateway, Fields, Gateway, GatewayError, ObservedRecord, RemoteKey, ResourceKind,
    required_field,
};

#[derive(Default)]
struct Host {
    /// Crontab lines; the line key is the 1-based position.
    cron: Vec<Fields>,
    /// Database name to granted users.
    databases: BTreeMap<String, Vec<String>>,
    /// User name to password.
    users: BTreeMap<String, String>,
}

#[derive(Default)]
pub struct FakeGateway {
    host: Mutex<Host>,
    calls: Mutex<Vec<String>>,
    rejections: Mutex<BTreeMap<String, String>>,
}

fn name_of(key: &RemoteKey) -> String {
    key.to_string()
}

fn line_index(key: &RemoteKey, len: usize) -> Result<usize, GatewayError> {
    match key {
        RemoteKey::Line(line) if *line >= 1 && (*line as usize) <= len => Ok(*line as usize - 1),
        _ => Err(GatewayError::rejected("Line does not exist")),
    }
}

fn named(name: &str) -> ObservedRecord {
    let mut fields = Fields::new();
    fields.insert("name".into(), name.into());
    ObservedRecord::new(Some(RemoteKey::Name(name.into())), fields)
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn shared(self: &Arc<Self>) -> DynGateway {
        self.clone()
    }

    pub fn seed_cron(&self, fields: Fields) {
        self.host.lock().unwrap().cron.push(fields);
    }

    pub fn seed_user(&self, name: &str, password: &str) {
        self.host
            .lock()
            .unwrap()
            .users
            .insert(name.into(), password.into());
    }

    pub fn seed_database(&self, name: &str, members: &[&str]) {
        self.host.lock().unwrap().databases.insert(
            name.into(),
            members.iter().map(|m| m.to_string()).collect(),
        );
    }

    /// Makes the next call to `operation` fail with `message`.
    pub fn reject(&self, operation: &str, message: &str) {
        self.rejections
            .lock()
            .unwrap()
            .insert(operation.into(), message.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls other than `list_all`.
    pub fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| !c.starts_with("list_all"))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn cron_lines(&self) -> Vec<Fields> {
        self.host.lock().unwrap().cron.clone()
    }

    pub fn database_members(&self, name: &str) -> Option<Vec<String>> {
        self.host.lock().unwrap().databases.get(name).cloned()
    }

    pub fn password_of(&self, user: &str) -> Option<String> {
        self.host.lock().unwrap().users.get(user).cloned()
    }

    fn record(&self, call: String, operation: &str) -> Result<(), GatewayError> {
        self.calls.lock().unwrap().push(call);
        match self.rejections.lock().unwrap().remove(operation) {
            Some(message) => Err(GatewayError::rejected(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn list_all(&self, kind: ResourceKind) -> Result<Vec<ObservedRecord>, GatewayError> {
        self.record(format!("list_all {kind}"), "list_all")?;
        let host = self.host.lock().unwrap();
        Ok(match kind {
            ResourceKind::CronJob => host
                .cron
                .iter()
                .enumerate()
                .map(|(i, fields)| {
                    ObservedRecord::new(Some(RemoteKey::Line(i as i64 + 1)), fields.clone())
                })
                .collect(),
            ResourceKind::Database => host
                .databases
                .iter()
                .map(|(name, members)| named(name).with_members(members.clone()))
                .collect(),
            ResourceKind::User => host.users.keys().map(|name| named(name)).collect(),
        })
    }

    async fn create_one(
        &self,
        kind: ResourceKind,
        fields: &Fields,
    ) -> Result<ObservedRecord, GatewayError> {
        let name = fields.get("name").cloned().unwrap_or_default();
        self.record(format!("create_one {kind} {name}"), "create_one")?;
        let mut host = self.host.lock().unwrap();
        match kind {
            ResourceKind::CronJob => {
                host.cron.push(fields.clone());
                let line = host.cron.len() as i64;
                Ok(ObservedRecord::new(Some(RemoteKey::Line(line)), fields.clone()))
            }
            ResourceKind::Database => {
                if host.databases.contains_key(&name) {
                    return Err(GatewayError::rejected("database already exists"));
                }
                host.databases.insert(name.clone(), Vec::new());
                Ok(named(&name))
            }
            ResourceKind::User => {
                let password = required_field(fields, "password")?;
                host.users.insert(name.clone(), password.to_string());
                Ok(named(&name))
            }
        }
    }

    async fn update_one(
        &self,
        kind: ResourceKind,
        key: &RemoteKey,
        fields: &Fields,
    ) -> Result<ObservedRecord, GatewayError> {
        self.record(format!("update_one {kind} {key}"), "update_one")?;
        let mut host = self.host.lock().unwrap();
        match kind {
            ResourceKind::CronJob => {
                let index = line_index(key, host.cron.len())?;
                host.cron[index] = fields.clone();
                Ok(ObservedRecord::new(Some(key.clone()), fields.clone()))
            }
            ResourceKind::User => {
                let name = name_of(key);
                let password = required_field(fields, "password")?;
                host.users.insert(name.clone(), password.to_string());
                Ok(named(&name))
            }
            ResourceKind::Database => Err(GatewayError::unsupported(kind, "update_one")),
        }
    }

    async fn rename_one(
        &self,
        kind: ResourceKind,
        key: &RemoteKey,
        fields: &Fields,
    ) -> Result<ObservedRecord, GatewayError> {
        let new_name = required_field(fields, "name")?.to_string();
        self.record(format!("rename_one {kind} {key} {new_name}"), "rename_one")?;
        let old_name = name_of(key);
        let mut host = self.host.lock().unwrap();
        match kind {
            ResourceKind::Database => {
                let members = host
                    .databases
                    .remove(&old_name)
                    .ok_or_else(|| GatewayError::rejected("database does not exist"))?;
                host.databases.insert(new_name.clone(), members);
            }
            ResourceKind::User => {
                host.users
                    .remove(&old_name)
                    .ok_or_else(|| GatewayError::rejected("user does not exist"))?;
                let password = required_field(fields, "password")?;
                host.users.insert(new_name.clone(), password.to_string());
                for members in host.databases.values_mut() {
                    for member in members.iter_mut().filter(|m| **m == old_name) {
                        *member = new_name.clone();
                    }
                }
            }
            ResourceKind::CronJob => return Err(GatewayError::unsupported(kind, "rename_one")),
        }
        Ok(named(&new_name))
    }

    async fn delete_one(&self, kind: ResourceKind, key: &RemoteKey) -> Result<(), GatewayError> {
        self.record(format!("delete_one {kind} {key}"), "delete_one")?;
        let mut host = self.host.lock().unwrap();
        match kind {
            ResourceKind::CronJob => {
                let index = line_index(key, host.cron.len())?;
                host.cron.remove(index);
            }
            ResourceKind::Database => {
                host.databases.remove(&name_of(key));
            }
            ResourceKind::User => {
                host.users.remove(&name_of(key));
            }
        }
        Ok(())
    }

    async fn grant(&self, owner: &str, member: &str) -> Result<(), GatewayError> {
        self.record(format!("grant {owner} {member}"), "grant")?;
        let mut host = self.host.lock().unwrap();
        let members = host
            .databases
            .get_mut(owner)
            .ok_or_else(|| GatewayError::rejected("database does not exist"))?;
        members.push(member.to_string());
        Ok(())
    }

    async fn revoke(&self, owner: &str, member: &str) -> Result<(), GatewayError> {
        self.record(format!("revoke {owner} {member}"), "revoke")?;
        let mut host = self.host.lock().unwrap();
        if let Some(members) = host.databases.get_mut(owner) {
            members.retain(|m| m != member);
        }
        Ok(())
    }
}

pub fn cron_fields(minute: &str, command: &str) -> Fields {
    let mut fields = Fields::new();
    for (name, value) in [
        ("minute", minute),
        ("hour", "0"),
        ("day", "1"),
        ("weekday", "*"),
        ("month", "1"),
        ("command", command),
    ] {
        fields.insert(name.to_string(), value.to_string());
    }
    fields
}
