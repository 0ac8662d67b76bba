//! Fault- and latency-injecting metadata source for tests

use anyhow::{anyhow, bail, Result};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use metascope::source::{Snapshot, SnapshotSource};
use metascope::{Domain, Field, Method, MetadataSource, Module, TypeDefinition, TypeLayout};

/// Wraps a [`SnapshotSource`] and fails or stalls selected calls
pub struct FlakySource {
    inner: RwLock<Arc<SnapshotSource>>,
    fail_domains: bool,
    failing_modules: HashSet<String>,
    failing_methods: HashSet<String>,
    failing_fields: HashSet<String>,
    delay: Option<Duration>,
    cancel_at: Mutex<Option<(String, CancellationToken)>>,
    cancel_in_methods: Mutex<Option<(String, CancellationToken)>>,
    member_fetches: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

impl FlakySource {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            inner: RwLock::new(Arc::new(SnapshotSource::new(snapshot))),
            fail_domains: false,
            failing_modules: HashSet::new(),
            failing_methods: HashSet::new(),
            failing_fields: HashSet::new(),
            delay: None,
            cancel_at: Mutex::new(None),
            cancel_in_methods: Mutex::new(None),
            member_fetches: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn fail_domains(mut self) -> Self {
        self.fail_domains = true;
        self
    }

    /// Fail type enumeration of the named module
    pub fn fail_module(mut self, name: &str) -> Self {
        self.failing_modules.insert(name.to_string());
        self
    }

    pub fn fail_methods(mut self, type_name: &str) -> Self {
        self.failing_methods.insert(type_name.to_string());
        self
    }

    pub fn fail_fields(mut self, type_name: &str) -> Self {
        self.failing_fields.insert(type_name.to_string());
        self
    }

    /// Sleep this long inside every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Cancel `token` when the named module's types are enumerated
    pub fn cancel_when_enumerating(&self, module: &str, token: CancellationToken) {
        *self.cancel_at.lock().unwrap() = Some((module.to_string(), token));
    }

    /// Cancel `token` while the named type's methods are being read. The
    /// read itself still succeeds.
    pub fn cancel_when_fetching_methods(&self, type_name: &str, token: CancellationToken) {
        *self.cancel_in_methods.lock().unwrap() = Some((type_name.to_string(), token));
    }

    /// Member reads so far, as `methods:<type>` / `fields:<type>`
    pub fn member_fetches(&self) -> Vec<String> {
        self.member_fetches.lock().unwrap().clone()
    }

    /// Serve a different process from now on
    pub fn replace_snapshot(&self, snapshot: Snapshot) {
        *self.inner.write().unwrap() = Arc::new(SnapshotSource::new(snapshot));
    }

    pub fn inner(&self) -> Arc<SnapshotSource> {
        self.inner.read().unwrap().clone()
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.inner().set_reachable(reachable);
    }

    /// Highest number of calls that were ever running at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn call<T>(&self, f: impl FnOnce(&SnapshotSource) -> Result<T>) -> Result<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        let inner = self.inner();
        let result = f(&inner);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

impl MetadataSource for FlakySource {
    fn is_reachable(&self) -> bool {
        self.inner().is_reachable()
    }

    fn enumerate_domains(&self) -> Result<Vec<Domain>> {
        if self.fail_domains {
            bail!("debugger bridge refused domain enumeration");
        }
        self.call(|s| s.enumerate_domains())
    }

    fn enumerate_modules(&self, domain: &Domain) -> Result<Vec<Module>> {
        self.call(|s| s.enumerate_modules(domain))
    }

    fn enumerate_type_definitions(&self, module: &Module) -> Result<Vec<TypeDefinition>> {
        if let Some((name, token)) = self.cancel_at.lock().unwrap().as_ref() {
            if *name == module.name {
                token.cancel();
            }
        }
        if self.failing_modules.contains(&module.name) {
            return Err(anyhow!("read fault in module {}", module.name));
        }
        self.call(|s| s.enumerate_type_definitions(module))
    }

    fn get_methods(&self, type_def: &TypeDefinition) -> Result<Vec<Method>> {
        self.member_fetches
            .lock()
            .unwrap()
            .push(format!("methods:{}", type_def.name));
        if let Some((name, token)) = self.cancel_in_methods.lock().unwrap().as_ref() {
            if *name == type_def.name {
                token.cancel();
            }
        }
        if self.failing_methods.contains(&type_def.name) {
            bail!("timed out reading methods of {}", type_def.name);
        }
        self.call(|s| s.get_methods(type_def))
    }

    fn get_fields(&self, type_def: &TypeDefinition) -> Result<Vec<Field>> {
        self.member_fetches
            .lock()
            .unwrap()
            .push(format!("fields:{}", type_def.name));
        if self.failing_fields.contains(&type_def.name) {
            bail!("timed out reading fields of {}", type_def.name);
        }
        self.call(|s| s.get_fields(type_def))
    }

    fn get_type_layout(&self, address: u64) -> Result<Option<TypeLayout>> {
        self.call(|s| s.get_type_layout(address))
    }

    fn clear_cache(&self) {
        self.inner().clear_cache();
    }

    fn source_name(&self) -> &'static str {
        "flaky"
    }
}
