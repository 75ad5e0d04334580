//! Host directory — the process-scoped registry of hosts, drivers and
//! resources, and the entry point for requests, reports and subscriptions.
//!
//! ## Lock domains
//!
//! Locks are always taken in this order:
//!
//! 1. the host-resource registry (hosts, resource arena, URI index),
//! 2. the driver registry (drivers and the resources each one owns),
//! 3. the subscriber list, then a subscriber's own queue.
//!
//! Every resource has its own lock for its requests and value-state. A
//! resource handle is cloned out of the registry and the registry lock is
//! released before the resource lock is taken. Driver calls and event
//! dispatch happen under the resource lock.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak,
};

use tracing::{debug, info, warn};

use homerc_domain::error::RcError;
use homerc_domain::host::{HostEntry, Reachability};
use homerc_domain::id::{ResourceId, validate_identifier};
use homerc_domain::pattern::UriPattern;
use homerc_domain::request::Request;
use homerc_domain::time::Timestamp;
use homerc_domain::uri::ResourceUri;
use homerc_domain::value::{Value, ValueType};
use homerc_domain::value_state::{State, ValueState};

use crate::arbitration::Arbitration;
use crate::event_processor::EventProcessor;
use crate::ports::{Clock, Driver, SystemClock};
use crate::resource::Resource;
use crate::subscriber::Subscriber;

/// Declared type and flags of a resource being registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceSpec {
    pub value_type: ValueType,
    pub writable: bool,
}

impl ResourceSpec {
    /// A resource that accepts requests.
    #[must_use]
    pub fn writable(value_type: ValueType) -> Self {
        Self {
            value_type,
            writable: true,
        }
    }

    /// A resource whose value only comes from its driver.
    #[must_use]
    pub fn read_only(value_type: ValueType) -> Self {
        Self {
            value_type,
            writable: false,
        }
    }
}

/// Directory settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryConfig {
    /// Id of the host this process runs on.
    pub host_id: String,
    /// Network address of the local host, if it is reachable by others.
    pub address: Option<String>,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            host_id: "local".to_string(),
            address: None,
        }
    }
}

/// Summary of a garbage-collection pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GcReport {
    /// Resources visited.
    pub resources: usize,
    /// Requests removed.
    pub purged: usize,
    /// Resources whose driver was called.
    pub reevaluated: usize,
}

/// Snapshot of one resource for listings.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDetail {
    pub id: ResourceId,
    pub uri: ResourceUri,
    pub value_type: ValueType,
    pub writable: bool,
    pub reachable: bool,
    pub value_state: ValueState,
    /// Requests, winner candidates first.
    pub requests: Vec<Request>,
}

impl fmt::Display for ResourceDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}{} {}",
            self.uri,
            self.value_type,
            if self.writable { "rw" } else { "ro" },
            if self.reachable { "" } else { " (unreachable)" },
            self.value_state.display_as(self.value_type),
        )?;
        for request in &self.requests {
            write!(f, "\n    {request}")?;
        }
        Ok(())
    }
}

struct HostRecord {
    id: String,
    address: Option<String>,
    reachable: Arc<AtomicBool>,
}

impl HostRecord {
    fn entry(&self) -> HostEntry {
        HostEntry {
            id: self.id.clone(),
            address: self.address.clone(),
            reachability: Reachability::from(self.reachable.load(Ordering::Acquire)),
        }
    }
}

#[derive(Default)]
struct Slot {
    generation: u32,
    resource: Option<Arc<Resource>>,
}

/// Hosts and resources. The arena holds at most as many slots as resources
/// were ever registered at the same time: a vacated slot is reused under
/// its next generation. A slot whose generation is exhausted is retired.
#[derive(Default)]
struct Registry {
    hosts: Vec<HostRecord>,
    arena: Vec<Slot>,
    free: Vec<usize>,
    by_uri: HashMap<ResourceUri, ResourceId>,
}

impl Registry {
    fn host(&self, id: &str) -> Option<&HostRecord> {
        self.hosts.iter().find(|h| h.id == id)
    }

    fn resource(&self, id: ResourceId) -> Option<Arc<Resource>> {
        self.arena
            .get(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.resource.clone())
    }

    fn live(&self) -> impl Iterator<Item = &Arc<Resource>> {
        self.arena.iter().filter_map(|slot| slot.resource.as_ref())
    }

    /// Handle for the next resource to store.
    fn vacant(&mut self) -> ResourceId {
        match self.free.pop() {
            Some(index) => ResourceId::new(index, self.arena[index].generation),
            None => {
                self.arena.push(Slot::default());
                ResourceId::from_index(self.arena.len() - 1)
            }
        }
    }

    fn store(&mut self, resource: Arc<Resource>) {
        let id = resource.id;
        self.by_uri.insert(resource.uri.clone(), id);
        self.arena[id.index()].resource = Some(resource);
    }

    fn remove(&mut self, id: ResourceId) -> Option<Arc<Resource>> {
        let slot = self
            .arena
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())?;
        let resource = slot.resource.take()?;
        if let Some(next) = slot.generation.checked_add(1) {
            slot.generation = next;
            self.free.push(id.index());
        }
        self.by_uri.remove(&resource.uri);
        Some(resource)
    }
}

struct DriverRecord {
    driver: Arc<dyn Driver>,
    resources: BTreeSet<ResourceId>,
}

type DriverKey = (String, String);

pub(crate) struct Inner {
    local_host: String,
    clock: Arc<dyn Clock>,
    registry: RwLock<Registry>,
    drivers: Mutex<HashMap<DriverKey, DriverRecord>>,
    events: EventProcessor,
}

impl Inner {
    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn drivers(&self) -> MutexGuard<'_, HashMap<DriverKey, DriverRecord>> {
        self.drivers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn resource_by_id(&self, id: ResourceId) -> Result<Arc<Resource>, RcError> {
        self.read().resource(id).ok_or_else(|| RcError::UnknownResource {
            uri: id.to_string(),
        })
    }

    fn report_value_state(&self, id: ResourceId, mut reported: ValueState) -> Result<(), RcError> {
        let resource = self.resource_by_id(id)?;
        if let Some(value) = reported.value.take() {
            reported.value = Some(value.convert(resource.value_type)?);
        }
        let now = self.clock.now();
        reported.timestamp.get_or_insert(now);
        resource.apply_report(reported, now, &self.events);
        Ok(())
    }
}

/// Cloneable handle a driver uses to report value-states of one resource,
/// typically after returning [`DriveOutcome::Busy`](crate::ports::DriveOutcome::Busy).
///
/// The handle does not keep the directory alive. Reports made after the
/// directory is gone fail with [`RcError::UnknownResource`].
#[derive(Debug, Clone)]
pub struct Reporter {
    directory: Weak<Inner>,
    resource: ResourceId,
}

impl fmt::Debug for Inner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Directory")
            .field("local_host", &self.local_host)
            .finish_non_exhaustive()
    }
}

impl Reporter {
    #[must_use]
    pub fn resource(&self) -> ResourceId {
        self.resource
    }

    /// # Errors
    ///
    /// Returns [`RcError::UnknownResource`] when the resource or directory is
    /// gone and [`RcError::TypeMismatch`] when the value does not convert to
    /// the declared type.
    pub fn report_value_state(&self, value_state: ValueState) -> Result<(), RcError> {
        let inner = self.directory.upgrade().ok_or_else(|| RcError::UnknownResource {
            uri: self.resource.to_string(),
        })?;
        inner.report_value_state(self.resource, value_state)
    }

    /// Report a valid value.
    ///
    /// # Errors
    ///
    /// See [`report_value_state`](Self::report_value_state).
    pub fn report_value(&self, value: impl Into<Value>) -> Result<(), RcError> {
        self.report_value_state(ValueState {
            value: Some(value.into()),
            timestamp: None,
            state: State::Valid,
        })
    }

    /// Report that a realisation is in progress, keeping the last value.
    ///
    /// # Errors
    ///
    /// See [`report_value_state`](Self::report_value_state).
    pub fn report_busy(&self) -> Result<(), RcError> {
        self.report_value_state(ValueState {
            value: None,
            timestamp: None,
            state: State::Busy,
        })
    }

    /// # Errors
    ///
    /// See [`report_value_state`](Self::report_value_state).
    pub fn report_unknown(&self) -> Result<(), RcError> {
        self.report_value_state(ValueState::unknown(None))
    }
}

/// The resource directory. Cheap to clone; all clones share state.
#[derive(Debug, Clone)]
pub struct Directory(Arc<Inner>);

impl Directory {
    /// Create a directory for the local host described by `config`, using
    /// the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`RcError::Validation`] if the host id is invalid.
    pub fn init(config: DirectoryConfig) -> Result<Self, RcError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Like [`init`](Self::init) with an explicit clock.
    ///
    /// # Errors
    ///
    /// Returns [`RcError::Validation`] if the host id is invalid.
    pub fn with_clock(config: DirectoryConfig, clock: Arc<dyn Clock>) -> Result<Self, RcError> {
        validate_identifier(&config.host_id, false)?;
        let registry = Registry {
            hosts: vec![HostRecord {
                id: config.host_id.clone(),
                address: config.address,
                reachable: Arc::new(AtomicBool::new(true)),
            }],
            ..Registry::default()
        };
        info!(host = %config.host_id, "directory initialised");
        Ok(Self(Arc::new(Inner {
            local_host: config.host_id,
            clock,
            registry: RwLock::new(registry),
            drivers: Mutex::new(HashMap::new()),
            events: EventProcessor::default(),
        })))
    }

    /// Shut down: stop every driver, close every subscriber and clear the
    /// registry. Queued events are discarded.
    pub fn done(&self) {
        let resources: Vec<Arc<Resource>> = {
            let mut registry = self.0.write();
            let ids: Vec<ResourceId> = registry.by_uri.drain().map(|(_, id)| id).collect();
            ids.into_iter().filter_map(|id| registry.remove(id)).collect()
        };
        let drivers: Vec<Arc<dyn Driver>> = self
            .0
            .drivers()
            .drain()
            .map(|(_, record)| record.driver)
            .collect();
        for resource in &resources {
            resource.detach();
        }
        for driver in &drivers {
            driver.stop();
        }
        self.0.events.close_all();
        info!(
            resources = resources.len(),
            drivers = drivers.len(),
            "directory shut down"
        );
    }

    #[must_use]
    pub fn now(&self) -> Timestamp {
        self.0.clock.now()
    }

    #[must_use]
    pub fn local_host(&self) -> &str {
        &self.0.local_host
    }

    // ----- hosts -----

    /// Add a remote host.
    ///
    /// # Errors
    ///
    /// Returns [`RcError::DuplicateId`] if the host is known and
    /// [`RcError::Validation`] if the id is invalid.
    pub fn add_host(&self, id: &str, address: Option<String>) -> Result<(), RcError> {
        let entry = HostEntry::new(id, address)?;
        let mut registry = self.0.write();
        if registry.host(id).is_some() {
            return Err(RcError::DuplicateId {
                kind: "host",
                id: id.to_string(),
            });
        }
        registry.hosts.push(HostRecord {
            id: entry.id,
            address: entry.address,
            reachable: Arc::new(AtomicBool::new(true)),
        });
        info!(host = id, "host added");
        Ok(())
    }

    /// Remove a host together with its drivers and resources.
    ///
    /// # Errors
    ///
    /// Returns [`RcError::UnknownHost`] if the host is not known.
    pub fn remove_host(&self, id: &str) -> Result<(), RcError> {
        let (resources, drivers) = {
            let mut registry = self.0.write();
            let position = registry
                .hosts
                .iter()
                .position(|h| h.id == id)
                .ok_or_else(|| RcError::UnknownHost { id: id.to_string() })?;
            registry.hosts.remove(position);
            let ids: Vec<ResourceId> = registry
                .live()
                .filter(|r| r.uri.host() == id)
                .map(|r| r.id)
                .collect();
            let resources: Vec<Arc<Resource>> =
                ids.into_iter().filter_map(|rid| registry.remove(rid)).collect();
            let mut drivers = self.0.drivers();
            let keys: Vec<DriverKey> = drivers.keys().filter(|(h, _)| h == id).cloned().collect();
            let removed: Vec<Arc<dyn Driver>> = keys
                .iter()
                .filter_map(|key| drivers.remove(key))
                .map(|record| record.driver)
                .collect();
            (resources, removed)
        };
        for resource in &resources {
            resource.detach();
        }
        for driver in &drivers {
            driver.stop();
        }
        info!(host = id, resources = resources.len(), "host removed");
        Ok(())
    }

    #[must_use]
    pub fn host(&self, id: &str) -> Option<HostEntry> {
        self.0.read().host(id).map(HostRecord::entry)
    }

    #[must_use]
    pub fn host_at(&self, index: usize) -> Option<HostEntry> {
        self.0.read().hosts.get(index).map(HostRecord::entry)
    }

    #[must_use]
    pub fn hosts(&self) -> Vec<HostEntry> {
        self.0.read().hosts.iter().map(HostRecord::entry).collect()
    }

    /// Change a host's reachability.
    ///
    /// Going down turns every resource of the host unknown while keeping
    /// its requests. Coming back re-arbitrates them.
    ///
    /// # Errors
    ///
    /// Returns [`RcError::UnknownHost`] if the host is not known.
    pub fn set_reachable(&self, id: &str, reachable: bool) -> Result<(), RcError> {
        let resources: Vec<Arc<Resource>> = {
            let registry = self.0.write();
            let host = registry
                .host(id)
                .ok_or_else(|| RcError::UnknownHost { id: id.to_string() })?;
            if host.reachable.swap(reachable, Ordering::AcqRel) == reachable {
                return Ok(());
            }
            registry
                .live()
                .filter(|r| r.uri.host() == id)
                .cloned()
                .collect()
        };
        let now = self.now();
        if reachable {
            info!(host = id, "host reachable");
            for resource in &resources {
                let mut state = resource.lock();
                resource.evaluate(&mut state, now, &self.0.events);
            }
        } else {
            warn!(host = id, "host unreachable");
            for resource in &resources {
                resource.mark_unreachable(now, &self.0.events);
            }
        }
        Ok(())
    }

    // ----- drivers -----

    /// Register a driver on the local host.
    ///
    /// # Errors
    ///
    /// Returns [`RcError::DuplicateId`] if the id is taken.
    pub fn register_driver(&self, id: &str, driver: Arc<dyn Driver>) -> Result<(), RcError> {
        let host = self.0.local_host.clone();
        self.register_host_driver(&host, id, driver)
    }

    /// Register a driver for `host`. For remote hosts this is the link
    /// proxy that forwards drive calls over the network.
    ///
    /// # Errors
    ///
    /// Returns [`RcError::UnknownHost`], [`RcError::DuplicateId`] or
    /// [`RcError::Validation`].
    pub fn register_host_driver(
        &self,
        host: &str,
        id: &str,
        driver: Arc<dyn Driver>,
    ) -> Result<(), RcError> {
        validate_identifier(id, false)?;
        let registry = self.0.read();
        if registry.host(host).is_none() {
            return Err(RcError::UnknownHost {
                id: host.to_string(),
            });
        }
        let mut drivers = self.0.drivers();
        let key = (host.to_string(), id.to_string());
        if drivers.contains_key(&key) {
            return Err(RcError::DuplicateId {
                kind: "driver",
                id: format!("{host}/{id}"),
            });
        }
        drivers.insert(
            key,
            DriverRecord {
                driver,
                resources: BTreeSet::new(),
            },
        );
        info!(host, driver = id, "driver registered");
        Ok(())
    }

    /// Unregister a driver and every resource it owns.
    ///
    /// # Errors
    ///
    /// Returns [`RcError::UnknownDriver`] if it is not registered.
    pub fn unregister_driver(&self, host: &str, id: &str) -> Result<(), RcError> {
        let (record, resources) = {
            let mut registry = self.0.write();
            let record = self
                .0
                .drivers()
                .remove(&(host.to_string(), id.to_string()))
                .ok_or_else(|| RcError::UnknownDriver {
                    id: format!("{host}/{id}"),
                })?;
            let resources: Vec<Arc<Resource>> = record
                .resources
                .iter()
                .filter_map(|rid| registry.remove(*rid))
                .collect();
            (record, resources)
        };
        for resource in &resources {
            resource.detach();
        }
        record.driver.stop();
        info!(host, driver = id, resources = resources.len(), "driver unregistered");
        Ok(())
    }

    /// Resources owned by a driver.
    ///
    /// # Errors
    ///
    /// Returns [`RcError::UnknownDriver`] if it is not registered.
    pub fn driver_resources(&self, host: &str, id: &str) -> Result<Vec<ResourceId>, RcError> {
        self.0
            .drivers()
            .get(&(host.to_string(), id.to_string()))
            .map(|record| record.resources.iter().copied().collect())
            .ok_or_else(|| RcError::UnknownDriver {
                id: format!("{host}/{id}"),
            })
    }

    // ----- resources -----

    /// Register a resource owned by driver `driver` of `host`.
    ///
    /// # Errors
    ///
    /// Returns [`RcError::UnknownHost`], [`RcError::UnknownDriver`],
    /// [`RcError::DuplicateId`] or [`RcError::Validation`].
    pub fn register_resource(
        &self,
        host: &str,
        driver: &str,
        lid: &str,
        spec: ResourceSpec,
    ) -> Result<ResourceId, RcError> {
        let uri = ResourceUri::new(host, driver, lid)?;
        let mut registry = self.0.write();
        let reachable = registry
            .host(host)
            .map(|h| Arc::clone(&h.reachable))
            .ok_or_else(|| RcError::UnknownHost {
                id: host.to_string(),
            })?;
        if registry.by_uri.contains_key(&uri) {
            return Err(RcError::DuplicateId {
                kind: "resource",
                id: uri.to_string(),
            });
        }
        let mut drivers = self.0.drivers();
        let record = drivers
            .get_mut(&(host.to_string(), driver.to_string()))
            .ok_or_else(|| RcError::UnknownDriver {
                id: format!("{host}/{driver}"),
            })?;
        let id = registry.vacant();
        let resource = Resource::new(
            id,
            uri.clone(),
            spec.value_type,
            spec.writable,
            Arc::clone(&record.driver),
            Reporter {
                directory: Arc::downgrade(&self.0),
                resource: id,
            },
            reachable,
        );
        record.resources.insert(id);
        registry.store(Arc::new(resource));
        debug!(
            uri = %uri,
            value_type = %spec.value_type,
            writable = spec.writable,
            "resource registered"
        );
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns [`RcError::UnknownResource`] if the URI does not resolve.
    pub fn unregister_resource(&self, uri: &ResourceUri) -> Result<(), RcError> {
        let resource = {
            let mut registry = self.0.write();
            let id = registry
                .by_uri
                .get(uri)
                .copied()
                .ok_or_else(|| unknown(uri))?;
            let resource = registry.remove(id).ok_or_else(|| unknown(uri))?;
            if let Some(record) = self
                .0
                .drivers()
                .get_mut(&(uri.host().to_string(), uri.driver().to_string()))
            {
                record.resources.remove(&id);
            }
            resource
        };
        resource.detach();
        debug!(uri = %uri, "resource unregistered");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`RcError::UnknownResource`] if the URI does not resolve.
    pub fn resolve(&self, uri: &ResourceUri) -> Result<ResourceId, RcError> {
        self.0.read().by_uri.get(uri).copied().ok_or_else(|| unknown(uri))
    }

    /// URI of a registered resource.
    #[must_use]
    pub fn uri_of(&self, id: ResourceId) -> Option<ResourceUri> {
        self.0.read().resource(id).map(|r| r.uri.clone())
    }

    #[must_use]
    pub fn resources(&self) -> Vec<ResourceId> {
        self.0.read().live().map(|r| r.id).collect()
    }

    /// Details of every resource matching one of `patterns` (all when
    /// empty), sorted by URI.
    #[must_use]
    pub fn list_resources(&self, patterns: &[UriPattern]) -> Vec<ResourceDetail> {
        let mut resources: Vec<Arc<Resource>> = self
            .0
            .read()
            .live()
            .filter(|r| patterns.is_empty() || patterns.iter().any(|p| p.matches(&r.uri)))
            .cloned()
            .collect();
        resources.sort_by(|a, b| a.uri.cmp(&b.uri));
        resources.iter().map(|r| detail(r)).collect()
    }

    /// # Errors
    ///
    /// Returns [`RcError::UnknownResource`] if the URI does not resolve.
    pub fn resource_detail(&self, uri: &ResourceUri) -> Result<ResourceDetail, RcError> {
        self.resource(uri).map(|r| detail(&r))
    }

    fn resource(&self, uri: &ResourceUri) -> Result<Arc<Resource>, RcError> {
        let registry = self.0.read();
        registry
            .by_uri
            .get(uri)
            .and_then(|id| registry.resource(*id))
            .ok_or_else(|| unknown(uri))
    }

    // ----- requests -----

    /// Insert or replace the request of `request.gid` on `uri` and
    /// re-arbitrate before returning. A host that is unreachable queues the
    /// request; it is applied once the host comes back.
    ///
    /// # Errors
    ///
    /// Returns [`RcError::UnknownResource`], [`RcError::NotWritable`],
    /// [`RcError::TypeMismatch`] or [`RcError::Validation`]. The resource is
    /// left untouched on error.
    pub fn set_request(
        &self,
        uri: &ResourceUri,
        mut request: Request,
    ) -> Result<Arbitration, RcError> {
        let resource = self.resource(uri)?;
        if !resource.writable {
            return Err(RcError::NotWritable {
                uri: uri.to_string(),
            });
        }
        request.validate()?;
        request.value = request.value.convert(resource.value_type)?;
        let arbitration = resource.set_request(request, self.now(), &self.0.events);
        debug!(uri = %uri, ?arbitration, "request arbitrated");
        Ok(arbitration)
    }

    /// Remove the request of `gid` and re-arbitrate.
    ///
    /// # Errors
    ///
    /// Returns [`RcError::UnknownResource`] if the URI does not resolve.
    pub fn del_request(&self, uri: &ResourceUri, gid: &str) -> Result<Arbitration, RcError> {
        let resource = self.resource(uri)?;
        Ok(resource.del_request(gid, self.now(), &self.0.events))
    }

    /// Let the request of `gid` end at `t1` instead of removing it now.
    ///
    /// # Errors
    ///
    /// Returns [`RcError::UnknownResource`] if the URI does not resolve.
    pub fn del_request_at(
        &self,
        uri: &ResourceUri,
        gid: &str,
        t1: Timestamp,
    ) -> Result<Arbitration, RcError> {
        let resource = self.resource(uri)?;
        Ok(resource.del_request_at(gid, t1, self.now(), &self.0.events))
    }

    // ----- values -----

    /// The last known value-state; never waits on a driver or the network.
    ///
    /// # Errors
    ///
    /// Returns [`RcError::UnknownResource`] if the URI does not resolve.
    pub fn get_value_state(&self, uri: &ResourceUri) -> Result<ValueState, RcError> {
        Ok(self.resource(uri)?.lock().value_state.clone())
    }

    /// The current value if it is valid.
    ///
    /// # Errors
    ///
    /// Returns [`RcError::UnknownResource`] if the URI does not resolve.
    pub fn get_value(&self, uri: &ResourceUri) -> Result<Option<Value>, RcError> {
        Ok(self.get_value_state(uri)?.valid_value().cloned())
    }

    /// Report a value-state for resource `id`, as a driver or link layer.
    /// The value is converted to the declared type.
    ///
    /// # Errors
    ///
    /// Returns [`RcError::UnknownResource`] or [`RcError::TypeMismatch`].
    pub fn report_value_state(
        &self,
        id: ResourceId,
        value_state: ValueState,
    ) -> Result<(), RcError> {
        self.0.report_value_state(id, value_state)
    }

    /// A reporter for resource `id`.
    #[must_use]
    pub fn reporter(&self, id: ResourceId) -> Reporter {
        Reporter {
            directory: Arc::downgrade(&self.0),
            resource: id,
        }
    }

    // ----- housekeeping -----

    /// Purge dead requests of every resource and re-arbitrate.
    pub fn garbage_collection(&self) -> GcReport {
        let resources: Vec<Arc<Resource>> = self.0.read().live().cloned().collect();
        let now = self.now();
        let mut report = GcReport {
            resources: resources.len(),
            ..GcReport::default()
        };
        for resource in &resources {
            let (purged, arbitration) = resource.collect(now, &self.0.events);
            report.purged += purged;
            if matches!(arbitration, Arbitration::Driven(_)) {
                report.reevaluated += 1;
            }
        }
        debug!(
            resources = report.resources,
            purged = report.purged,
            reevaluated = report.reevaluated,
            "garbage collection done"
        );
        report
    }

    /// Earliest future instant at which a request window opens or closes or
    /// a held-back change may be applied.
    #[must_use]
    pub fn next_wakeup(&self) -> Option<Timestamp> {
        let resources: Vec<Arc<Resource>> = self.0.read().live().cloned().collect();
        let now = self.now();
        resources.iter().filter_map(|r| r.next_wakeup(now)).min()
    }

    // ----- subscribers -----

    /// Register a subscriber called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RcError::DuplicateId`] if the name is in use.
    pub fn subscribe(&self, name: &str) -> Result<Subscriber, RcError> {
        self.0.events.subscribe(name)
    }

    #[must_use]
    pub fn subscribers(&self) -> Vec<String> {
        self.0.events.subscriber_names()
    }
}

fn unknown(uri: &ResourceUri) -> RcError {
    RcError::UnknownResource {
        uri: uri.to_string(),
    }
}

fn detail(resource: &Resource) -> ResourceDetail {
    let (value_state, requests) = resource.snapshot();
    ResourceDetail {
        id: resource.id,
        uri: resource.uri.clone(),
        value_type: resource.value_type,
        writable: resource.writable,
        reachable: resource.is_reachable(),
        value_state,
        requests,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::{DateTime, TimeDelta, Utc};
    use homerc_domain::request::Priority;

    use super::*;
    use crate::ports::{DriveOutcome, DriveTarget, ManualClock};

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<Value>>,
        outcome: Mutex<Option<DriveOutcome>>,
    }

    impl Recorder {
        fn calls(&self) -> Vec<Value> {
            self.calls.lock().unwrap().clone()
        }

        fn answer(&self, outcome: DriveOutcome) {
            *self.outcome.lock().unwrap() = Some(outcome);
        }
    }

    impl Driver for Recorder {
        fn drive(&self, _target: &DriveTarget<'_>, value: &Value) -> DriveOutcome {
            self.calls.lock().unwrap().push(value.clone());
            self.outcome
                .lock()
                .unwrap()
                .clone()
                .unwrap_or(DriveOutcome::Realized)
        }
    }

    fn start() -> Timestamp {
        DateTime::parse_from_rfc3339("2024-03-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    struct Fixture {
        directory: Directory,
        clock: Arc<ManualClock>,
        driver: Arc<Recorder>,
        uri: ResourceUri,
    }

    fn setup(value_type: ValueType) -> Fixture {
        let clock = Arc::new(ManualClock::new(start()));
        let directory = Directory::with_clock(
            DirectoryConfig {
                host_id: "kitchen".to_string(),
                address: None,
            },
            clock.clone(),
        )
        .unwrap();
        let driver = Arc::new(Recorder::default());
        directory.register_driver("light", driver.clone()).unwrap();
        directory
            .register_resource("kitchen", "light", "ceiling", ResourceSpec::writable(value_type))
            .unwrap();
        Fixture {
            directory,
            clock,
            driver,
            uri: "kitchen/light/ceiling".parse().unwrap(),
        }
    }

    fn request(gid: &str, value: impl Into<Value>, priority: i32) -> Request {
        Request::builder(gid, value)
            .priority(Priority(priority))
            .build()
            .unwrap()
    }

    #[test]
    fn should_notify_subscriber_once_per_change_in_kitchen_scenario() {
        let f = setup(ValueType::Bool);
        let subscriber = f.directory.subscribe("s").unwrap();
        subscriber.add_pattern("kitchen/*").unwrap();

        f.directory.set_request(&f.uri, request("A", true, 10)).unwrap();
        assert_eq!(f.directory.get_value(&f.uri).unwrap(), Some(Value::Bool(true)));
        assert_eq!(subscriber.pending(), 1);

        f.directory.set_request(&f.uri, request("B", false, 20)).unwrap();
        assert_eq!(f.directory.get_value(&f.uri).unwrap(), Some(Value::Bool(false)));
        assert_eq!(subscriber.pending(), 2);

        f.directory.del_request(&f.uri, "B").unwrap();
        assert_eq!(f.directory.get_value(&f.uri).unwrap(), Some(Value::Bool(true)));

        let seen: Vec<Option<Value>> = std::iter::from_fn(|| subscriber.poll_event())
            .map(|e| e.new.value)
            .collect();
        assert_eq!(
            seen,
            vec![
                Some(Value::Bool(true)),
                Some(Value::Bool(false)),
                Some(Value::Bool(true))
            ]
        );
    }

    #[test]
    fn should_keep_one_request_per_gid() {
        let f = setup(ValueType::Int);
        f.directory.set_request(&f.uri, request("A", 1_i64, 3)).unwrap();
        let replacement = Request::builder("A", 2_i64)
            .priority(Priority(5))
            .valid_until(start() + TimeDelta::hours(1))
            .build()
            .unwrap();
        f.directory.set_request(&f.uri, replacement.clone()).unwrap();

        let detail = f.directory.resource_detail(&f.uri).unwrap();
        assert_eq!(detail.requests, vec![replacement]);
        assert_eq!(f.directory.get_value(&f.uri).unwrap(), Some(Value::Int(2)));
    }

    #[test]
    fn should_not_drive_again_for_identical_value() {
        let f = setup(ValueType::Bool);
        f.directory.set_request(&f.uri, request("A", true, 3)).unwrap();
        let again = f.directory.set_request(&f.uri, request("A", true, 3)).unwrap();
        let other = f.directory.set_request(&f.uri, request("B", true, 9)).unwrap();
        assert_eq!(again, Arbitration::Unchanged);
        assert_eq!(other, Arbitration::Unchanged);
        assert_eq!(f.driver.calls(), vec![Value::Bool(true)]);
    }

    #[test]
    fn should_let_most_recent_request_win_priority_tie() {
        let f = setup(ValueType::Int);
        f.directory.set_request(&f.uri, request("A", 1_i64, 5)).unwrap();
        f.directory.set_request(&f.uri, request("B", 2_i64, 5)).unwrap();
        assert_eq!(f.directory.get_value(&f.uri).unwrap(), Some(Value::Int(2)));
        f.directory.set_request(&f.uri, request("A", 3_i64, 5)).unwrap();
        assert_eq!(f.directory.get_value(&f.uri).unwrap(), Some(Value::Int(3)));
    }

    #[test]
    fn should_select_highest_priority_under_concurrent_submission() {
        let f = setup(ValueType::Int);
        std::thread::scope(|scope| {
            for i in 0..8_i32 {
                let directory = f.directory.clone();
                let uri = f.uri.clone();
                scope.spawn(move || {
                    directory
                        .set_request(&uri, request(&format!("t{i}"), i64::from(i), i))
                        .unwrap();
                });
            }
        });
        assert_eq!(f.directory.get_value(&f.uri).unwrap(), Some(Value::Int(7)));
        assert_eq!(f.directory.resource_detail(&f.uri).unwrap().requests.len(), 8);
    }

    #[test]
    fn should_fall_back_when_request_is_withdrawn() {
        let f = setup(ValueType::Bool);
        f.directory.set_request(&f.uri, request("A", true, 3)).unwrap();
        f.directory.set_request(&f.uri, request("B", false, 9)).unwrap();
        let withdrawal = Request::builder("B", false).withdrawn().build().unwrap();
        f.directory.set_request(&f.uri, withdrawal).unwrap();
        assert_eq!(f.directory.get_value(&f.uri).unwrap(), Some(Value::Bool(true)));

        let report = f.directory.garbage_collection();
        assert_eq!(report.purged, 1);
        assert_eq!(f.directory.resource_detail(&f.uri).unwrap().requests.len(), 1);
    }

    #[test]
    fn should_purge_expired_request_and_ignore_it_afterwards() {
        let f = setup(ValueType::Bool);
        let short = Request::builder("A", true)
            .priority(Priority::STRONG)
            .valid_until(start() + TimeDelta::minutes(1))
            .build()
            .unwrap();
        f.directory.set_request(&f.uri, short).unwrap();
        assert_eq!(f.directory.get_value(&f.uri).unwrap(), Some(Value::Bool(true)));

        f.clock.advance(TimeDelta::minutes(2));
        let report = f.directory.garbage_collection();
        assert_eq!(report.purged, 1);
        assert!(f.directory.resource_detail(&f.uri).unwrap().requests.is_empty());

        f.directory.set_request(&f.uri, request("B", false, 1)).unwrap();
        assert_eq!(f.directory.get_value(&f.uri).unwrap(), Some(Value::Bool(false)));
    }

    #[test]
    fn should_reenter_repeating_window_at_next_period() {
        let f = setup(ValueType::Bool);
        f.directory.set_request(&f.uri, request("base", false, 1)).unwrap();
        let daily = Request::builder("daily", true)
            .priority(Priority(5))
            .valid_from(start() + TimeDelta::hours(1))
            .valid_until(start() + TimeDelta::hours(2))
            .repeat(TimeDelta::days(1))
            .build()
            .unwrap();
        assert_eq!(
            f.directory.set_request(&f.uri, daily).unwrap(),
            Arbitration::Unchanged
        );
        assert_eq!(f.directory.next_wakeup(), Some(start() + TimeDelta::hours(1)));

        f.clock.advance(TimeDelta::minutes(90));
        f.directory.garbage_collection();
        f.clock.advance(TimeDelta::minutes(90));
        f.directory.garbage_collection();
        f.clock.set(start() + TimeDelta::days(1) + TimeDelta::minutes(90));
        f.directory.garbage_collection();

        assert_eq!(
            f.driver.calls(),
            vec![
                Value::Bool(false),
                Value::Bool(true),
                Value::Bool(false),
                Value::Bool(true)
            ]
        );
        let detail = f.directory.resource_detail(&f.uri).unwrap();
        let daily = detail.requests.iter().find(|r| r.gid == "daily").unwrap();
        assert_eq!(
            daily.valid_from,
            Some(start() + TimeDelta::days(1) + TimeDelta::hours(1))
        );
    }

    #[test]
    fn should_degrade_and_restore_with_host_reachability() {
        let f = setup(ValueType::Bool);
        f.directory.add_host("garage", Some("10.0.0.2:4700".to_string())).unwrap();
        let link = Arc::new(Recorder::default());
        f.directory
            .register_host_driver("garage", "link", link.clone())
            .unwrap();
        f.directory
            .register_resource("garage", "link", "door", ResourceSpec::writable(ValueType::Bool))
            .unwrap();
        let door: ResourceUri = "garage/link/door".parse().unwrap();
        f.directory.set_request(&door, request("A", true, 3)).unwrap();

        f.directory.set_reachable("garage", false).unwrap();
        assert!(!f.directory.get_value_state(&door).unwrap().is_known());
        assert_eq!(
            f.directory.host("garage").unwrap().reachability,
            Reachability::Down
        );
        assert_eq!(
            f.directory.set_request(&door, request("B", true, 2)).unwrap(),
            Arbitration::Queued
        );
        assert_eq!(f.directory.resource_detail(&door).unwrap().requests.len(), 2);
        assert!(!f.directory.resource_detail(&door).unwrap().reachable);

        f.directory.set_reachable("garage", true).unwrap();
        assert_eq!(f.directory.get_value(&door).unwrap(), Some(Value::Bool(true)));
        assert_eq!(link.calls(), vec![Value::Bool(true), Value::Bool(true)]);
    }

    #[test]
    fn should_ignore_late_report_while_host_is_unreachable() {
        let f = setup(ValueType::Bool);
        f.driver.answer(DriveOutcome::Busy);
        f.directory.set_request(&f.uri, request("A", true, 3)).unwrap();
        let reporter = f.directory.reporter(f.directory.resolve(&f.uri).unwrap());

        f.directory.set_reachable("kitchen", false).unwrap();
        let subscriber = f.directory.subscribe("s").unwrap();
        subscriber.add_pattern("kitchen/*").unwrap();
        reporter.report_value(true).unwrap();
        assert!(!f.directory.get_value_state(&f.uri).unwrap().is_known());
        assert_eq!(subscriber.pending(), 0);

        f.directory.set_reachable("kitchen", true).unwrap();
        assert!(f.directory.get_value_state(&f.uri).unwrap().is_busy());
        assert_eq!(f.driver.calls(), vec![Value::Bool(true), Value::Bool(true)]);
        reporter.report_value(true).unwrap();
        assert_eq!(f.directory.get_value(&f.uri).unwrap(), Some(Value::Bool(true)));
    }

    #[test]
    fn should_defer_numeric_flip_until_hysteresis_expires() {
        let f = setup(ValueType::Temp);
        let first = Request::builder("heat", 20.0)
            .hysteresis(TimeDelta::seconds(60))
            .build()
            .unwrap();
        f.directory.set_request(&f.uri, first).unwrap();

        f.clock.advance(TimeDelta::seconds(10));
        let second = Request::builder("heat", 21.0)
            .hysteresis(TimeDelta::seconds(60))
            .build()
            .unwrap();
        let until = start() + TimeDelta::seconds(60);
        assert_eq!(
            f.directory.set_request(&f.uri, second).unwrap(),
            Arbitration::Deferred { until }
        );
        assert_eq!(f.directory.get_value(&f.uri).unwrap(), Some(Value::Float(20.0)));
        assert_eq!(f.directory.next_wakeup(), Some(until));

        f.clock.set(until);
        assert_eq!(f.directory.garbage_collection().reevaluated, 1);
        assert_eq!(f.directory.get_value(&f.uri).unwrap(), Some(Value::Float(21.0)));
    }

    #[test]
    fn should_complete_busy_realisation_through_reporter() {
        let f = setup(ValueType::Bool);
        f.driver.answer(DriveOutcome::Busy);
        f.directory.set_request(&f.uri, request("A", true, 3)).unwrap();
        assert!(f.directory.get_value_state(&f.uri).unwrap().is_busy());
        assert_eq!(
            f.directory.set_request(&f.uri, request("A", true, 3)).unwrap(),
            Arbitration::Unchanged
        );

        let id = f.directory.resolve(&f.uri).unwrap();
        f.directory.reporter(id).report_value(true).unwrap();
        assert_eq!(f.directory.get_value(&f.uri).unwrap(), Some(Value::Bool(true)));
        assert_eq!(f.driver.calls().len(), 1);
    }

    #[test]
    fn should_retry_failed_realisation_at_next_gc() {
        let f = setup(ValueType::Bool);
        f.driver.answer(DriveOutcome::Failed);
        f.directory.set_request(&f.uri, request("A", true, 3)).unwrap();
        assert!(!f.directory.get_value_state(&f.uri).unwrap().is_known());
        assert_eq!(f.driver.calls().len(), 1);

        f.driver.answer(DriveOutcome::Realized);
        f.directory.garbage_collection();
        assert_eq!(f.driver.calls().len(), 2);
        assert_eq!(f.directory.get_value(&f.uri).unwrap(), Some(Value::Bool(true)));
    }

    #[test]
    fn should_accept_deviating_value_reported_by_driver() {
        let f = setup(ValueType::Int);
        f.driver.answer(DriveOutcome::Reported(Value::Int(40)));
        f.directory.set_request(&f.uri, request("A", 45_i64, 3)).unwrap();
        assert_eq!(f.directory.get_value(&f.uri).unwrap(), Some(Value::Int(40)));
    }

    #[test]
    fn should_not_drive_again_after_deviating_report() {
        let f = setup(ValueType::Int);
        let subscriber = f.directory.subscribe("s").unwrap();
        subscriber.add_pattern("kitchen/*").unwrap();
        f.driver.answer(DriveOutcome::Reported(Value::Int(40)));
        f.directory.set_request(&f.uri, request("A", 45_i64, 3)).unwrap();

        for _ in 0..5 {
            f.clock.advance(TimeDelta::seconds(30));
            f.directory.garbage_collection();
        }
        assert_eq!(f.driver.calls(), vec![Value::Int(45)]);
        assert_eq!(subscriber.pending(), 1);

        f.directory.set_request(&f.uri, request("A", 50_i64, 3)).unwrap();
        assert_eq!(f.driver.calls(), vec![Value::Int(45), Value::Int(50)]);
    }

    #[test]
    fn should_drive_again_after_unknown_report() {
        let f = setup(ValueType::Int);
        f.driver.answer(DriveOutcome::Reported(Value::Int(40)));
        f.directory.set_request(&f.uri, request("A", 45_i64, 3)).unwrap();

        let id = f.directory.resolve(&f.uri).unwrap();
        f.directory.reporter(id).report_unknown().unwrap();
        f.directory.garbage_collection();
        assert_eq!(f.driver.calls(), vec![Value::Int(45), Value::Int(45)]);
    }

    #[test]
    fn should_schedule_deletion_with_del_request_at() {
        let f = setup(ValueType::Bool);
        f.directory.set_request(&f.uri, request("A", true, 3)).unwrap();
        f.directory
            .del_request_at(&f.uri, "A", start() + TimeDelta::minutes(5))
            .unwrap();
        assert_eq!(f.directory.garbage_collection().purged, 0);
        f.clock.advance(TimeDelta::minutes(6));
        assert_eq!(f.directory.garbage_collection().purged, 1);
    }

    #[test]
    fn should_reject_invalid_requests_without_touching_state() {
        let f = setup(ValueType::Bool);
        f.directory.set_request(&f.uri, request("A", true, 3)).unwrap();

        let result = f.directory.set_request(&f.uri, request("B", "maybe", 9));
        assert!(matches!(result, Err(RcError::TypeMismatch { .. })));
        let missing: ResourceUri = "kitchen/light/floor".parse().unwrap();
        let result = f.directory.set_request(&missing, request("B", true, 9));
        assert!(matches!(result, Err(RcError::UnknownResource { .. })));

        let detail = f.directory.resource_detail(&f.uri).unwrap();
        assert_eq!(detail.requests.len(), 1);
        assert_eq!(detail.value_state.value, Some(Value::Bool(true)));
    }

    #[test]
    fn should_reject_requests_on_read_only_resource() {
        let f = setup(ValueType::Bool);
        let spec = ResourceSpec::read_only(ValueType::Temp);
        f.directory
            .register_resource("kitchen", "light", "sensor", spec)
            .unwrap();
        let uri: ResourceUri = "kitchen/light/sensor".parse().unwrap();
        let result = f.directory.set_request(&uri, request("A", 20.0, 3));
        assert!(matches!(result, Err(RcError::NotWritable { .. })));
    }

    #[test]
    fn should_reject_duplicate_registrations() {
        let f = setup(ValueType::Bool);
        let again = f.directory.register_driver("light", Arc::new(Recorder::default()));
        assert!(matches!(again, Err(RcError::DuplicateId { kind: "driver", .. })));
        let again = f.directory.register_resource(
            "kitchen",
            "light",
            "ceiling",
            ResourceSpec::writable(ValueType::Bool),
        );
        assert!(matches!(again, Err(RcError::DuplicateId { kind: "resource", .. })));
        assert!(matches!(
            f.directory.add_host("kitchen", None),
            Err(RcError::DuplicateId { kind: "host", .. })
        ));
        assert!(matches!(
            f.directory.register_resource(
                "kitchen",
                "gpio",
                "x",
                ResourceSpec::writable(ValueType::Bool)
            ),
            Err(RcError::UnknownDriver { .. })
        ));
        assert!(matches!(
            f.directory.register_host_driver("attic", "gpio", Arc::new(Recorder::default())),
            Err(RcError::UnknownHost { .. })
        ));
    }

    #[test]
    fn should_convert_reported_values_to_declared_type() {
        let f = setup(ValueType::Percent);
        let id = f.directory.resolve(&f.uri).unwrap();
        f.directory
            .report_value_state(id, ValueState::valid(Value::from("40%"), start()))
            .unwrap();
        assert_eq!(f.directory.get_value(&f.uri).unwrap(), Some(Value::Float(40.0)));
        let result = f.directory.reporter(id).report_value("warm");
        assert!(matches!(result, Err(RcError::TypeMismatch { .. })));
    }

    #[test]
    fn should_remove_resources_with_their_driver_and_host() {
        let f = setup(ValueType::Bool);
        let id = f.directory.resolve(&f.uri).unwrap();
        assert_eq!(f.directory.driver_resources("kitchen", "light").unwrap(), vec![id]);
        f.directory.unregister_driver("kitchen", "light").unwrap();
        assert!(f.directory.resolve(&f.uri).is_err());
        assert!(f.directory.resources().is_empty());

        f.directory.add_host("garage", None).unwrap();
        f.directory
            .register_host_driver("garage", "link", Arc::new(Recorder::default()))
            .unwrap();
        f.directory
            .register_resource("garage", "link", "door", ResourceSpec::writable(ValueType::Bool))
            .unwrap();
        f.directory.remove_host("garage").unwrap();
        assert!(f.directory.host("garage").is_none());
        assert!(f.directory.resources().is_empty());
        assert!(f.directory.driver_resources("garage", "link").is_err());
    }

    #[test]
    fn should_not_reuse_resource_ids() {
        let f = setup(ValueType::Bool);
        let first = f.directory.resolve(&f.uri).unwrap();
        f.directory.unregister_resource(&f.uri).unwrap();
        let spec = ResourceSpec::writable(ValueType::Bool);
        let second = f
            .directory
            .register_resource("kitchen", "light", "ceiling", spec)
            .unwrap();
        assert_ne!(first, second);
        assert_eq!(first.index(), second.index());
        assert!(f.directory.reporter(first).report_value(true).is_err());
        assert!(f.directory.uri_of(first).is_none());
        assert_eq!(f.directory.uri_of(second), Some(f.uri.clone()));
    }

    #[test]
    fn should_reuse_arena_slots_across_register_cycles() {
        let f = setup(ValueType::Bool);
        let spec = ResourceSpec::writable(ValueType::Bool);
        let uri: ResourceUri = "kitchen/light/spot".parse().unwrap();
        let mut seen = BTreeSet::new();
        for _ in 0..100 {
            let id = f
                .directory
                .register_resource("kitchen", "light", "spot", spec)
                .unwrap();
            assert!(seen.insert(id));
            f.directory.unregister_resource(&uri).unwrap();
        }
        assert_eq!(f.directory.0.read().arena.len(), 2);
        assert_eq!(f.directory.resources().len(), 1);
    }

    #[test]
    fn should_list_resources_matching_patterns() {
        let f = setup(ValueType::Bool);
        let spec = ResourceSpec::writable(ValueType::Bool);
        f.directory
            .register_resource("kitchen", "light", "spots/1", spec)
            .unwrap();
        let all = f.directory.list_resources(&[]);
        assert_eq!(all.len(), 2);
        let spots = f
            .directory
            .list_resources(&UriPattern::parse_list("*/spots/*").unwrap());
        assert_eq!(spots.len(), 1);
        assert_eq!(spots[0].uri.lid(), "spots/1");
    }

    #[test]
    fn should_render_resource_detail_listing() {
        let f = setup(ValueType::Bool);
        f.directory.set_request(&f.uri, request("A", true, 3)).unwrap();
        let text = f.directory.resource_detail(&f.uri).unwrap().to_string();
        assert!(text.starts_with("kitchen/light/ceiling bool rw 1 @"));
        assert!(text.ends_with("\n    1 #A *3"));
    }

    #[test]
    fn should_enumerate_hosts_by_id_and_index() {
        let f = setup(ValueType::Bool);
        f.directory.add_host("garage", None).unwrap();
        assert_eq!(f.directory.local_host(), "kitchen");
        assert_eq!(f.directory.host_at(1).unwrap().id, "garage");
        assert_eq!(f.directory.hosts().len(), 2);
        assert!(f.directory.host_at(2).is_none());
        assert!(matches!(
            f.directory.set_reachable("attic", false),
            Err(RcError::UnknownHost { .. })
        ));
    }

    #[tokio::test]
    async fn should_close_subscribers_and_clear_registry_on_done() {
        let f = setup(ValueType::Bool);
        let subscriber = f.directory.subscribe("s").unwrap();
        subscriber.add_pattern("*").unwrap();
        f.directory.set_request(&f.uri, request("A", true, 3)).unwrap();

        f.directory.done();
        assert_eq!(subscriber.pending(), 0);
        assert_eq!(
            subscriber.wait_event(None).await,
            crate::subscriber::WaitOutcome::Closed
        );
        assert!(matches!(
            f.directory.get_value_state(&f.uri),
            Err(RcError::UnknownResource { .. })
        ));
    }
}
