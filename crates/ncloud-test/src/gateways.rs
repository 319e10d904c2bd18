//! In-memory gateways with eventually consistent visibility
//!
//! Each gateway counts its calls and can be scripted to lag behind
//! mutations, return stale names, fail, or stall.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use ncloud_common::{
    Gateway, NcloudError, NcloudResult, ProviderContext, ReadGateway, RemoteObject,
};
use ncloud_publicip::{ClassicPublicIpInstance, PublicIpQuery, VpcPublicIpInstance};
use ncloud_sourcecommit::types::{RepositoryDetail, RepositoryLinked};
use ncloud_sourcecommit::{RepositoryChanges, RepositorySpec};

/// Calls received by a gateway
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub create: u32,
    pub update: u32,
    pub delete: u32,
    pub list: u32,
    pub get_by_name: u32,
}

#[derive(Debug, Default)]
struct Failures {
    create: Option<String>,
    update: Option<String>,
    delete: Option<String>,
    get_by_name: Option<String>,
    list: Option<String>,
}

#[derive(Debug)]
struct RepositoryEntry {
    detail: RepositoryDetail,
    /// Name lookups left before a created repository becomes visible
    hidden: u32,
    /// List calls left before a deleted repository disappears
    deleting: Option<u32>,
}

#[derive(Debug, Default)]
struct RepositoryState {
    next_id: i64,
    entries: BTreeMap<String, RepositoryEntry>,
    create_lag: u32,
    delete_lag: u32,
    stale_name_polls: u32,
    stall_updates: bool,
    failures: Failures,
    calls: CallCounts,
}

/// SourceCommit API held in memory
///
/// Repositories are keyed by name. A created repository stays invisible
/// for `create_lag` name lookups; a deleted one stays listed for
/// `delete_lag` list calls. Ids are assigned from 1 upward unless seeded.
#[derive(Debug, Default)]
pub struct InMemoryRepositoryGateway {
    state: Mutex<RepositoryState>,
}

impl InMemoryRepositoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name lookups that miss after each create
    pub fn with_create_lag(self, lookups: u32) -> Self {
        self.lock().create_lag = lookups;
        self
    }

    /// List calls that still see a repository after its delete
    pub fn with_delete_lag(self, lists: u32) -> Self {
        self.lock().delete_lag = lists;
        self
    }

    /// Name lookups answered with a record under another name
    pub fn with_stale_name_polls(self, lookups: u32) -> Self {
        self.lock().stale_name_polls = lookups;
        self
    }

    /// Makes every update hang forever
    pub fn with_stalled_updates(self) -> Self {
        self.lock().stall_updates = true;
        self
    }

    pub fn fail_create(&self, message: impl Into<String>) {
        self.lock().failures.create = Some(message.into());
    }

    pub fn fail_update(&self, message: impl Into<String>) {
        self.lock().failures.update = Some(message.into());
    }

    pub fn fail_delete(&self, message: impl Into<String>) {
        self.lock().failures.delete = Some(message.into());
    }

    pub fn fail_lookups(&self, message: impl Into<String>) {
        self.lock().failures.get_by_name = Some(message.into());
    }

    pub fn fail_lists(&self, message: impl Into<String>) {
        self.lock().failures.list = Some(message.into());
    }

    /// Inserts an already active repository
    pub fn seed(&self, detail: RepositoryDetail) {
        let mut state = self.lock();
        state.next_id = state.next_id.max(detail.id);
        state.entries.insert(
            detail.name.clone(),
            RepositoryEntry {
                detail,
                hidden: 0,
                deleting: None,
            },
        );
    }

    /// Whether a repository with this name is stored, visible or not
    pub fn contains(&self, name: &str) -> bool {
        self.lock().entries.contains_key(name)
    }

    pub fn calls(&self) -> CallCounts {
        self.lock().calls
    }

    fn lock(&self) -> MutexGuard<'_, RepositoryState> {
        // A poisoned lock only means another test thread panicked.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ReadGateway for InMemoryRepositoryGateway {
    type Raw = RepositoryDetail;
    type Query = ();

    async fn list(&self, _ctx: &ProviderContext, _query: &()) -> NcloudResult<Vec<RepositoryDetail>> {
        let mut state = self.lock();
        state.calls.list += 1;
        if let Some(message) = &state.failures.list {
            return Err(NcloudError::transport("list", "repositories", message.clone()));
        }

        state
            .entries
            .retain(|_, entry| entry.deleting != Some(0));

        let mut visible = Vec::new();
        for entry in state.entries.values_mut() {
            if let Some(left) = entry.deleting.as_mut() {
                *left -= 1;
            }
            if entry.hidden == 0 {
                visible.push(entry.detail.clone());
            }
        }
        debug!(count = visible.len(), "In-memory repository list");
        Ok(visible)
    }

    async fn get_by_name(
        &self,
        _ctx: &ProviderContext,
        name: &str,
    ) -> NcloudResult<Option<RepositoryDetail>> {
        let mut state = self.lock();
        state.calls.get_by_name += 1;
        if let Some(message) = &state.failures.get_by_name {
            return Err(NcloudError::transport("get_by_name", name, message.clone()));
        }

        let stale = state.stale_name_polls > 0;
        if stale {
            state.stale_name_polls -= 1;
        }

        match state.entries.get_mut(name) {
            Some(entry) if entry.hidden > 0 => {
                entry.hidden -= 1;
                Ok(None)
            }
            Some(entry) if stale => {
                let mut detail = entry.detail.clone();
                detail.name = format!("{}-previous", detail.name);
                Ok(Some(detail))
            }
            Some(entry) => Ok(Some(entry.detail.clone())),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl Gateway for InMemoryRepositoryGateway {
    type Spec = RepositorySpec;
    type Changes = RepositoryChanges;

    async fn create(&self, _ctx: &ProviderContext, spec: &RepositorySpec) -> NcloudResult<String> {
        let mut state = self.lock();
        state.calls.create += 1;
        if let Some(message) = &state.failures.create {
            return Err(NcloudError::transport("create", &spec.name, message.clone()));
        }
        if state.entries.contains_key(&spec.name) {
            return Err(NcloudError::transport(
                "create",
                &spec.name,
                "repository name already in use",
            ));
        }

        state.next_id += 1;
        let detail = RepositoryDetail {
            id: state.next_id,
            name: spec.name.clone(),
            description: spec.description.clone(),
            linked: RepositoryLinked {
                file_safer: spec.filesafer,
            },
            ..RepositoryDetail::default()
        };
        let hidden = state.create_lag;
        state.entries.insert(
            spec.name.clone(),
            RepositoryEntry {
                detail,
                hidden,
                deleting: None,
            },
        );
        Ok(state.next_id.to_string())
    }

    async fn update(
        &self,
        _ctx: &ProviderContext,
        name: &str,
        changes: &RepositoryChanges,
    ) -> NcloudResult<()> {
        let stall = {
            let mut state = self.lock();
            state.calls.update += 1;
            if let Some(message) = &state.failures.update {
                return Err(NcloudError::transport("update", name, message.clone()));
            }
            state.stall_updates
        };
        if stall {
            std::future::pending::<()>().await;
        }

        let mut state = self.lock();
        let entry = state
            .entries
            .get_mut(name)
            .ok_or_else(|| NcloudError::transport("update", name, "no such repository"))?;
        if changes.description.is_some() {
            entry.detail.description = changes.description.clone();
        }
        if changes.filesafer.is_some() {
            entry.detail.linked.file_safer = changes.filesafer;
        }
        Ok(())
    }

    async fn delete(&self, _ctx: &ProviderContext, name: &str) -> NcloudResult<()> {
        let mut state = self.lock();
        state.calls.delete += 1;
        if let Some(message) = &state.failures.delete {
            return Err(NcloudError::transport("delete", name, message.clone()));
        }

        let lag = state.delete_lag;
        match state.entries.get_mut(name) {
            Some(entry) => {
                entry.deleting = Some(lag);
                Ok(())
            }
            None => Err(NcloudError::transport("delete", name, "no such repository")),
        }
    }
}

/// Fields the public IP list parameters match on
pub trait PublicIpRecord: RemoteObject + Clone + Send + Sync {
    fn server_instance_no(&self) -> Option<&str>;

    /// Zone code, for backends whose list call filters by zone
    fn zone_code(&self) -> Option<&str>;
}

impl PublicIpRecord for ClassicPublicIpInstance {
    fn server_instance_no(&self) -> Option<&str> {
        ClassicPublicIpInstance::server_instance_no(self)
    }

    fn zone_code(&self) -> Option<&str> {
        self.zone.as_ref().and_then(|z| z.zone_code.as_deref())
    }
}

impl PublicIpRecord for VpcPublicIpInstance {
    fn server_instance_no(&self) -> Option<&str> {
        VpcPublicIpInstance::server_instance_no(self)
    }

    fn zone_code(&self) -> Option<&str> {
        None
    }
}

/// Public IP list API held in memory
///
/// Applies the id and association parameters server-side, plus the zone
/// for records that carry one.
#[derive(Debug, Default)]
pub struct InMemoryPublicIpGateway<R> {
    records: Mutex<Vec<R>>,
    calls: Mutex<CallCounts>,
    list_failure: Mutex<Option<String>>,
}

pub type ClassicPublicIpGateway = InMemoryPublicIpGateway<ClassicPublicIpInstance>;
pub type VpcPublicIpGateway = InMemoryPublicIpGateway<VpcPublicIpInstance>;

impl<R: PublicIpRecord> InMemoryPublicIpGateway<R> {
    pub fn new(records: impl IntoIterator<Item = R>) -> Self {
        Self {
            records: Mutex::new(records.into_iter().collect()),
            calls: Mutex::new(CallCounts::default()),
            list_failure: Mutex::new(None),
        }
    }

    pub fn fail_lists(&self, message: impl Into<String>) {
        *self.list_failure.lock().unwrap_or_else(|e| e.into_inner()) = Some(message.into());
    }

    pub fn calls(&self) -> CallCounts {
        *self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn count(&self, f: impl FnOnce(&mut CallCounts)) {
        f(&mut self.calls.lock().unwrap_or_else(|e| e.into_inner()));
    }
}

#[async_trait]
impl<R: PublicIpRecord + 'static> ReadGateway for InMemoryPublicIpGateway<R> {
    type Raw = R;
    type Query = PublicIpQuery;

    async fn list(&self, _ctx: &ProviderContext, query: &PublicIpQuery) -> NcloudResult<Vec<R>> {
        self.count(|c| c.list += 1);
        if let Some(message) = self
            .list_failure
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
        {
            return Err(NcloudError::transport("list", "public ips", message));
        }

        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        Ok(records
            .iter()
            .filter(|r| query.admits(&r.remote_id(), r.server_instance_no()))
            .filter(|r| match (&query.zone, r.zone_code()) {
                (Some(want), Some(zone)) => want == zone,
                _ => true,
            })
            .cloned()
            .collect())
    }

    async fn get_by_name(&self, _ctx: &ProviderContext, name: &str) -> NcloudResult<Option<R>> {
        self.count(|c| c.get_by_name += 1);
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        Ok(records.iter().find(|r| r.remote_name() == name).cloned())
    }
}
