//! Resource lifecycle controller.
//!
//! Orchestrates the remote existence of one resource:
//!
//! ```text
//! create:  gateway.create -> activation wait -> read
//! read:    get_by_name | get_by_id (cross-reference) -> normalize
//! update:  gateway.update -> read
//! delete:  activation wait -> gateway.delete -> deletion wait
//! list:    gateway.list -> normalize -> filter
//! ```
//!
//! Nothing is cached between calls; every operation re-fetches from the
//! gateway. Nothing is rolled back either: a create that is accepted but
//! never activates leaves a remote object behind, which the next read or
//! delete will find.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time;
use tracing::{debug, info, instrument};

use crate::context::{BackendFlavor, ProviderContext};
use crate::error::{NcloudError, NcloudResult};
use crate::filter::{self, FilterSet};
use crate::gateway::{Gateway, Normalizer, ReadGateway, RemoteObject, ResourceSpec};
use crate::record::CanonicalRecord;
use crate::resolve::resolve_one;
use crate::wait::{PollState, Refreshed, StateChangeConf};

/// Wait operation name of the activation wait.
pub const OP_ACTIVATION: &str = "activation";

/// Wait operation name of the deletion wait.
pub const OP_DELETION: &str = "deletion";

/// Local identity of a managed resource.
///
/// Either part may be empty: after an import only the id is known, and an
/// empty id means the resource is gone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceIdentity {
    /// Remote-assigned id.
    pub id: String,
    /// Human-assigned name.
    pub name: String,
}

impl ResourceIdentity {
    /// Creates an identity from both parts.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Identity known only by id (e.g., after an import).
    pub fn from_id(id: impl Into<String>) -> Self {
        Self::new(id, "")
    }

    /// Identity known only by name.
    pub fn from_name(name: impl Into<String>) -> Self {
        Self::new("", name)
    }

    /// Returns true while the resource is believed to exist.
    pub fn is_known(&self) -> bool {
        !self.id.is_empty()
    }

    /// Forgets the remote id so the resource is treated as gone.
    pub fn clear(&mut self) {
        self.id.clear();
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.id.is_empty(), self.name.is_empty()) {
            (false, false) => write!(f, "{} (id: {})", self.name, self.id),
            (true, false) => f.write_str(&self.name),
            (false, true) => write!(f, "id: {}", self.id),
            (true, true) => f.write_str("<unknown>"),
        }
    }
}

/// Identity and canonical state of a resource after create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    /// Identity resolved from the remote record.
    pub identity: ResourceIdentity,
    /// Canonical state.
    pub record: CanonicalRecord,
}

/// Drives create/read/update/delete/list for one resource kind.
pub struct LifecycleController<G, N> {
    resource: &'static str,
    gateway: G,
    normalizer: N,
}

impl<G, N> LifecycleController<G, N>
where
    G: ReadGateway,
    N: Normalizer<Raw = G::Raw>,
{
    /// Creates a controller for `resource` (used in logs and errors).
    pub fn new(resource: &'static str, gateway: G, normalizer: N) -> Self {
        Self {
            resource,
            gateway,
            normalizer,
        }
    }

    /// Resource kind.
    pub fn resource(&self) -> &'static str {
        self.resource
    }

    /// Backend flavor served by this controller.
    pub fn flavor(&self) -> BackendFlavor {
        self.normalizer.flavor()
    }

    /// The underlying gateway.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Lists, normalizes and filters records.
    #[instrument(skip_all, fields(resource = self.resource, flavor = %self.flavor()))]
    pub async fn list(
        &self,
        ctx: &ProviderContext,
        query: &G::Query,
        filters: &FilterSet,
    ) -> NcloudResult<Vec<CanonicalRecord>> {
        let raws = self.gateway.list(ctx, query).await?;
        debug!(count = raws.len(), "Listed records");

        let records = raws
            .iter()
            .map(|raw| self.normalizer.normalize(raw))
            .collect::<NcloudResult<Vec<_>>>()?;

        filter::apply(filters, self.normalizer.schema(), records)
    }

    /// Lists and requires exactly one match.
    pub async fn read_singular(
        &self,
        ctx: &ProviderContext,
        query: &G::Query,
        filters: &FilterSet,
    ) -> NcloudResult<CanonicalRecord> {
        let records = self.list(ctx, query, filters).await?;
        resolve_one(self.resource, records)
    }

    /// Reads the current remote state.
    ///
    /// Looks up by name when it is known, otherwise by id. An absent
    /// resource clears the id of `identity` and yields `Ok(None)`.
    #[instrument(skip(self, ctx), fields(resource = self.resource))]
    pub async fn read(
        &self,
        ctx: &ProviderContext,
        identity: &mut ResourceIdentity,
    ) -> NcloudResult<Option<CanonicalRecord>> {
        let raw = if !identity.name.is_empty() {
            self.gateway.get_by_name(ctx, &identity.name).await?
        } else if !identity.id.is_empty() {
            self.gateway.get_by_id(ctx, &identity.id).await?
        } else {
            return Err(NcloudError::invalid_config(
                "identity",
                "neither id nor name is set",
            ));
        };

        match raw {
            Some(raw) => {
                identity.id = raw.remote_id();
                identity.name = raw.remote_name();
                self.normalizer.normalize(&raw).map(Some)
            }
            None => {
                info!("{} {} no longer exists", self.resource, identity);
                identity.clear();
                Ok(None)
            }
        }
    }

    /// Polls by name until a record with exactly that name is visible.
    ///
    /// An absent record or a record under another name (listing briefly
    /// returning an unrelated entry) counts as pending.
    pub async fn wait_for_active(
        &self,
        ctx: &ProviderContext,
        name: &str,
        timeout: Duration,
    ) -> NcloudResult<G::Raw> {
        StateChangeConf::new(OP_ACTIVATION, name, PollState::Reached, timeout)
            .with_settings(ctx.wait_settings())
            .wait_for_state(|| self.refresh_active(ctx, name))
            .await?
            .ok_or_else(|| NcloudError::internal(format!("activation of '{}' returned no record", name)))
    }

    /// Polls by id until the record is gone.
    pub async fn wait_for_deletion(
        &self,
        ctx: &ProviderContext,
        id: &str,
        timeout: Duration,
    ) -> NcloudResult<()> {
        StateChangeConf::new(OP_DELETION, id, PollState::NotFound, timeout)
            .with_settings(ctx.wait_settings())
            .wait_for_state(|| self.refresh_deleted(ctx, id))
            .await?;
        Ok(())
    }

    async fn refresh_active(
        &self,
        ctx: &ProviderContext,
        name: &str,
    ) -> NcloudResult<Refreshed<G::Raw>> {
        match self.gateway.get_by_name(ctx, name).await? {
            Some(raw) if raw.remote_name() == name => Ok(Refreshed::reached(raw)),
            Some(raw) => {
                debug!(
                    expected = name,
                    observed = %raw.remote_name(),
                    "Activation race, name does not match yet"
                );
                Ok(Refreshed::pending(None))
            }
            None => Ok(Refreshed::pending(None)),
        }
    }

    async fn refresh_deleted(&self, ctx: &ProviderContext, id: &str) -> NcloudResult<Refreshed<()>> {
        match self.gateway.get_by_id(ctx, id).await? {
            Some(_) => Ok(Refreshed::pending(None)),
            None => Ok(Refreshed::not_found()),
        }
    }

    /// Fills in the name of an id-only identity. `Ok(false)` if the
    /// resource no longer exists.
    async fn resolve_name(
        &self,
        ctx: &ProviderContext,
        identity: &mut ResourceIdentity,
    ) -> NcloudResult<bool> {
        if !identity.name.is_empty() {
            return Ok(true);
        }

        match self.gateway.get_by_id(ctx, &identity.id).await? {
            Some(raw) => {
                identity.name = raw.remote_name();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl<G, N> LifecycleController<G, N>
where
    G: Gateway,
    N: Normalizer<Raw = G::Raw>,
{
    /// Creates the resource and waits until it is active.
    ///
    /// If the activation wait fails the remote object may already exist;
    /// it is not rolled back.
    #[instrument(skip(self, ctx, spec), fields(resource = self.resource, name = spec.name()))]
    pub async fn create(&self, ctx: &ProviderContext, spec: &G::Spec) -> NcloudResult<Reconciled> {
        let name = spec.name().to_string();
        debug!(?spec, "Creating {}", self.resource);

        let id = self
            .gateway
            .create(ctx, spec)
            .await
            .map_err(|e| NcloudError::create_failed(&name, e))?;
        info!(id = %id, "Create accepted, waiting for activation");

        self.wait_for_active(ctx, &name, ctx.timeouts().create())
            .await?;

        let mut identity = ResourceIdentity::new(id, name);
        match self.read(ctx, &mut identity).await? {
            Some(record) => {
                info!("Created {} {}", self.resource, identity);
                Ok(Reconciled { identity, record })
            }
            None => Err(NcloudError::not_found(self.resource, identity.name)),
        }
    }

    /// Applies the mutable fields, then re-reads computed state.
    #[instrument(skip(self, ctx, changes), fields(resource = self.resource))]
    pub async fn update(
        &self,
        ctx: &ProviderContext,
        identity: &mut ResourceIdentity,
        changes: &G::Changes,
    ) -> NcloudResult<Option<CanonicalRecord>> {
        if !self.resolve_name(ctx, identity).await? {
            return Err(NcloudError::update_failed(
                identity.id.clone(),
                NcloudError::not_found(self.resource, identity.id.clone()),
            ));
        }

        let name = identity.name.clone();
        let timeout = ctx.timeouts().update();
        debug!(?changes, "Updating {}", self.resource);

        match time::timeout(timeout, self.gateway.update(ctx, &name, changes)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(NcloudError::update_failed(name, e)),
            Err(_) => return Err(NcloudError::timeout("update", name, timeout, "none")),
        }

        self.read(ctx, identity).await
    }

    /// Deletes the resource once it is active and waits until it is gone.
    ///
    /// The id of `identity` is cleared only on success, so a failed delete
    /// can be retried.
    #[instrument(skip(self, ctx), fields(resource = self.resource))]
    pub async fn delete(
        &self,
        ctx: &ProviderContext,
        identity: &mut ResourceIdentity,
    ) -> NcloudResult<()> {
        if !self.resolve_name(ctx, identity).await? {
            info!("{} {} is already gone", self.resource, identity);
            identity.clear();
            return Ok(());
        }

        let name = identity.name.clone();
        let active = self
            .wait_for_active(ctx, &name, ctx.timeouts().create())
            .await
            .map_err(|e| delete_stage_failed(&name, e))?;

        self.gateway
            .delete(ctx, &name)
            .await
            .map_err(|e| NcloudError::delete_failed(&name, e))?;
        info!("Delete accepted for {} {}", self.resource, identity);

        let id = if identity.id.is_empty() {
            active.remote_id()
        } else {
            identity.id.clone()
        };
        self.wait_for_deletion(ctx, &id, ctx.timeouts().delete())
            .await
            .map_err(|e| delete_stage_failed(&name, e))?;

        info!("Deleted {} {}", self.resource, identity);
        identity.clear();
        Ok(())
    }
}

/// Attributes a failed delete stage to the delete; timeouts pass through.
fn delete_stage_failed(name: &str, err: NcloudError) -> NcloudError {
    match err {
        NcloudError::Timeout { .. } => err,
        err => NcloudError::delete_failed(name, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;
    use crate::filter::FilterPredicate;
    use crate::record::{FieldSpec, RecordSchema};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    static WIDGET_SCHEMA: RecordSchema = RecordSchema {
        name: "widget",
        fields: &[
            FieldSpec::string("id"),
            FieldSpec::string("name"),
            FieldSpec::string("color"),
        ],
    };

    #[derive(Debug, Clone, PartialEq)]
    struct Widget {
        id: u32,
        name: String,
        color: String,
    }

    impl RemoteObject for Widget {
        fn remote_id(&self) -> String {
            self.id.to_string()
        }

        fn remote_name(&self) -> String {
            self.name.clone()
        }
    }

    #[derive(Debug)]
    struct WidgetSpec {
        name: String,
        color: String,
    }

    impl ResourceSpec for WidgetSpec {
        fn name(&self) -> &str {
            &self.name
        }
    }

    /// Widgets become visible `lag` lookups after creation and disappear
    /// `lag` lookups after deletion.
    #[derive(Default)]
    struct WidgetGateway {
        lag: u32,
        fail_create: bool,
        fail_lookups_after_delete: bool,
        state: Mutex<WidgetState>,
    }

    #[derive(Default)]
    struct WidgetState {
        next_id: u32,
        widgets: BTreeMap<String, (Widget, u32)>,
        deleting: BTreeMap<String, u32>,
        lookups: u32,
    }

    impl WidgetGateway {
        fn with_lag(lag: u32) -> Self {
            Self {
                lag,
                ..Self::default()
            }
        }

        fn seed(&self, name: &str, color: &str) -> u32 {
            let mut state = self.state.lock().unwrap();
            state.next_id += 1;
            let widget = Widget {
                id: state.next_id,
                name: name.to_string(),
                color: color.to_string(),
            };
            state.widgets.insert(name.to_string(), (widget, 0));
            state.next_id
        }

        fn lookups(&self) -> u32 {
            self.state.lock().unwrap().lookups
        }
    }

    #[async_trait]
    impl ReadGateway for WidgetGateway {
        type Raw = Widget;
        type Query = ();

        async fn list(&self, _ctx: &ProviderContext, _query: &()) -> NcloudResult<Vec<Widget>> {
            let state = self.state.lock().unwrap();
            Ok(state
                .widgets
                .values()
                .filter(|(_, hidden)| *hidden == 0)
                .map(|(w, _)| w.clone())
                .collect())
        }

        async fn get_by_name(
            &self,
            _ctx: &ProviderContext,
            name: &str,
        ) -> NcloudResult<Option<Widget>> {
            let mut state = self.state.lock().unwrap();
            state.lookups += 1;
            if self.fail_lookups_after_delete && state.deleting.contains_key(name) {
                let message = "503 Service Unavailable";
                return Err(NcloudError::transport("get_by_name", name, message));
            }
            if let Some(left) = state.deleting.get_mut(name) {
                if *left == 0 {
                    state.deleting.remove(name);
                    state.widgets.remove(name);
                    return Ok(None);
                }
                *left -= 1;
            }
            match state.widgets.get_mut(name) {
                Some((_, hidden)) if *hidden > 0 => {
                    *hidden -= 1;
                    Ok(None)
                }
                Some((widget, _)) => Ok(Some(widget.clone())),
                None => Ok(None),
            }
        }
    }

    #[async_trait]
    impl Gateway for WidgetGateway {
        type Spec = WidgetSpec;
        type Changes = String;

        async fn create(&self, _ctx: &ProviderContext, spec: &WidgetSpec) -> NcloudResult<String> {
            if self.fail_create {
                return Err(NcloudError::transport("create", &spec.name, "400 Bad Request"));
            }
            let mut state = self.state.lock().unwrap();
            state.next_id += 1;
            let widget = Widget {
                id: state.next_id,
                name: spec.name.clone(),
                color: spec.color.clone(),
            };
            state.widgets.insert(spec.name.clone(), (widget, self.lag));
            Ok(state.next_id.to_string())
        }

        async fn update(
            &self,
            _ctx: &ProviderContext,
            name: &str,
            color: &String,
        ) -> NcloudResult<()> {
            let mut state = self.state.lock().unwrap();
            match state.widgets.get_mut(name) {
                Some((widget, _)) => {
                    widget.color = color.clone();
                    Ok(())
                }
                None => Err(NcloudError::transport("update", name, "404 Not Found")),
            }
        }

        async fn delete(&self, _ctx: &ProviderContext, name: &str) -> NcloudResult<()> {
            let mut state = self.state.lock().unwrap();
            let lag = self.lag;
            state.deleting.insert(name.to_string(), lag);
            Ok(())
        }
    }

    struct WidgetNormalizer;

    impl Normalizer for WidgetNormalizer {
        type Raw = Widget;

        fn flavor(&self) -> BackendFlavor {
            BackendFlavor::Vpc
        }

        fn schema(&self) -> &'static RecordSchema {
            &WIDGET_SCHEMA
        }

        fn normalize(&self, raw: &Widget) -> NcloudResult<CanonicalRecord> {
            CanonicalRecord::new(&WIDGET_SCHEMA)
                .with("id", raw.id.to_string())?
                .with("name", raw.name.as_str())?
                .with("color", raw.color.as_str())
        }
    }

    fn ctx() -> ProviderContext {
        ProviderContext::new(ProviderConfig::default()).unwrap()
    }

    fn controller(gateway: WidgetGateway) -> LifecycleController<WidgetGateway, WidgetNormalizer> {
        LifecycleController::new("widget", gateway, WidgetNormalizer)
    }

    fn spec(name: &str) -> WidgetSpec {
        WidgetSpec {
            name: name.to_string(),
            color: "red".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_waits_for_activation() {
        let ctl = controller(WidgetGateway::with_lag(2));
        let created = ctl.create(&ctx(), &spec("w1")).await.unwrap();

        assert_eq!(created.identity, ResourceIdentity::new("1", "w1"));
        assert_eq!(created.record.get_str("color"), Some("red"));
        // Two hidden lookups, one visible activation poll, one read.
        assert_eq!(ctl.gateway().lookups(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_failure_is_not_waited_on() {
        let gateway = WidgetGateway {
            fail_create: true,
            ..WidgetGateway::default()
        };
        let ctl = controller(gateway);
        let err = ctl.create(&ctx(), &spec("w1")).await.unwrap_err();

        assert!(matches!(err, NcloudError::CreateFailed { ref identity, .. } if identity == "w1"));
        assert_eq!(ctl.gateway().lookups(), 0);
    }

    #[tokio::test]
    async fn test_read_by_id_cross_references() {
        let ctl = controller(WidgetGateway::default());
        ctl.gateway().seed("w1", "blue");
        let id = ctl.gateway().seed("w2", "green");

        let mut identity = ResourceIdentity::from_id(id.to_string());
        let record = ctl.read(&ctx(), &mut identity).await.unwrap().unwrap();

        assert_eq!(identity.name, "w2");
        assert_eq!(record.get_str("color"), Some("green"));
    }

    #[tokio::test]
    async fn test_read_absent_clears_identity() {
        let ctl = controller(WidgetGateway::default());
        let mut identity = ResourceIdentity::new("9", "gone");

        let record = ctl.read(&ctx(), &mut identity).await.unwrap();

        assert_eq!(record, None);
        assert!(!identity.is_known());
        assert_eq!(identity.name, "gone");
    }

    #[tokio::test]
    async fn test_read_without_identity() {
        let ctl = controller(WidgetGateway::default());
        let err = ctl
            .read(&ctx(), &mut ResourceIdentity::default())
            .await
            .unwrap_err();
        assert!(matches!(err, NcloudError::InvalidConfig { .. }));
    }

    #[tokio::test]
    async fn test_update_rereads() {
        let ctl = controller(WidgetGateway::default());
        let id = ctl.gateway().seed("w1", "blue");
        let mut identity = ResourceIdentity::from_id(id.to_string());

        let record = ctl
            .update(&ctx(), &mut identity, &"yellow".to_string())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(record.get_str("color"), Some("yellow"));
        assert_eq!(identity, ResourceIdentity::new("1", "w1"));
    }

    #[tokio::test]
    async fn test_update_failure() {
        let ctl = controller(WidgetGateway::default());
        let mut identity = ResourceIdentity::new("1", "missing");

        let err = ctl
            .update(&ctx(), &mut identity, &"yellow".to_string())
            .await
            .unwrap_err();

        assert!(matches!(err, NcloudError::UpdateFailed { .. }));
        assert!(identity.is_known());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_waits_for_removal() {
        let ctl = controller(WidgetGateway::with_lag(2));
        let id = ctl.gateway().seed("w1", "blue");
        let mut identity = ResourceIdentity::new(id.to_string(), "w1");

        ctl.delete(&ctx(), &mut identity).await.unwrap();

        assert!(!identity.is_known());
        assert!(ctl.list(&ctx(), &(), &FilterSet::new()).await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_wait_error_is_delete_failure() {
        let gateway = WidgetGateway {
            lag: 2,
            fail_lookups_after_delete: true,
            ..WidgetGateway::default()
        };
        let ctl = controller(gateway);
        let id = ctl.gateway().seed("w1", "blue");
        let mut identity = ResourceIdentity::new(id.to_string(), "w1");

        let err = ctl.delete(&ctx(), &mut identity).await.unwrap_err();

        match &err {
            NcloudError::DeleteFailed { identity, source } => {
                assert_eq!(identity, "w1");
                assert!(matches!(
                    **source,
                    NcloudError::WaitFailed { ref operation, .. } if operation == "deletion"
                ));
            }
            other => panic!("expected delete failure, got {other:?}"),
        }
        assert!(err.is_retryable());
        assert!(identity.is_known());
    }

    #[test]
    fn test_delete_stage_timeout_passes_through() {
        let timeout = NcloudError::timeout("deletion", "55", Duration::from_secs(30), "PENDING");
        assert!(matches!(delete_stage_failed("w1", timeout), NcloudError::Timeout { .. }));

        let failed = NcloudError::transport("list", "", "502 Bad Gateway");
        assert!(matches!(
            delete_stage_failed("w1", failed),
            NcloudError::DeleteFailed { .. }
        ));
    }

    #[tokio::test]
    async fn test_delete_of_vanished_id_succeeds() {
        let ctl = controller(WidgetGateway::default());
        let mut identity = ResourceIdentity::from_id("42");

        ctl.delete(&ctx(), &mut identity).await.unwrap();

        assert!(!identity.is_known());
    }

    #[tokio::test]
    async fn test_list_and_read_singular() {
        let ctl = controller(WidgetGateway::default());
        ctl.gateway().seed("w1", "blue");
        ctl.gateway().seed("w2", "green");
        ctl.gateway().seed("w3", "blue");

        let blue = FilterSet::new().with(FilterPredicate::equals("color", "blue"));
        let records = ctl.list(&ctx(), &(), &blue).await.unwrap();
        assert_eq!(records.len(), 2);

        let err = ctl.read_singular(&ctx(), &(), &blue).await.unwrap_err();
        assert!(matches!(err, NcloudError::AmbiguousResult { count: 2, .. }));

        let green = FilterSet::new().with(FilterPredicate::equals("color", "green"));
        let record = ctl.read_singular(&ctx(), &(), &green).await.unwrap();
        assert_eq!(record.get_str("name"), Some("w2"));

        let none = FilterSet::new().with(FilterPredicate::equals("color", "black"));
        assert!(ctl
            .read_singular(&ctx(), &(), &none)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_identity_display() {
        assert_eq!(ResourceIdentity::new("55", "repo").to_string(), "repo (id: 55)");
        assert_eq!(ResourceIdentity::from_id("55").to_string(), "id: 55");
        assert_eq!(ResourceIdentity::from_name("repo").to_string(), "repo");
        assert_eq!(ResourceIdentity::default().to_string(), "<unknown>");
    }
}
