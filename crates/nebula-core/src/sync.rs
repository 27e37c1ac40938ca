// ── Synchronizer ──
//
// One replication pass from the primary to every replica. Everything read
// from the primary is fetched once up front; replicas are then visited in
// order and independently: a replica that fails is recorded and the pass
// moves on. Sessions are torn down for every client afterwards,
// whatever happened, and every callback hears about the result once.

use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use nebula_api::{ConfigDocument, ImportSelector, SessionClient};

use crate::callback::SyncCallback;
use crate::error::{ReplicaFailure, SyncError};
use crate::plan::{SyncMode, SyncPlan};
use crate::retry::{RetryBudget, RetryPolicy};

pub struct Synchronizer {
    primary: SessionClient,
    replicas: Vec<SessionClient>,
    plan: SyncPlan,
    retry: RetryPolicy,
    budget: RetryBudget,
    callbacks: Vec<Arc<dyn SyncCallback>>,
}

impl Synchronizer {
    pub fn new(
        primary: SessionClient,
        replicas: Vec<SessionClient>,
        plan: SyncPlan,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            primary,
            replicas,
            plan,
            retry,
            budget: RetryBudget::default(),
            callbacks: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_callback(mut self, callback: Arc<dyn SyncCallback>) -> Self {
        self.callbacks.push(callback);
        self
    }

    #[must_use]
    pub fn with_budget(mut self, budget: RetryBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn plan(&self) -> &SyncPlan {
        &self.plan
    }

    pub fn replica_count(&self) -> usize {
        self.replicas.len()
    }

    /// Run one replication pass.
    pub async fn run(&self) -> Result<(), SyncError> {
        info!(
            mode = %self.plan.mode,
            primary = %self.primary.target(),
            replicas = self.replicas.len(),
            run_gravity = self.plan.run_gravity,
            "running sync"
        );

        let result = match self.plan.mode {
            SyncMode::Full => self.full().await,
            SyncMode::Selective => self.selective().await,
        };

        self.teardown().await;

        match &result {
            Ok(()) => info!("sync completed"),
            Err(e) => error!(error = %e, "sync failed"),
        }

        self.notify(&result).await;
        result
    }

    // ── Modes ───────────────────────────────────────────────────────

    async fn full(&self) -> Result<(), SyncError> {
        let (ready, mut failures) = self.authenticate_all().await?;
        let bundle = match self.export_bundle().await {
            Ok(bundle) => bundle,
            Err(source) => return Err(self.primary_failed(source, failures)),
        };
        let selector = ImportSelector::all();

        for replica in ready {
            let result = async {
                self.import_bundle(replica, &bundle, &selector).await?;
                self.rebuild(replica).await
            }
            .await;
            record(replica, result, &mut failures);
        }

        aggregate(failures)
    }

    async fn selective(&self) -> Result<(), SyncError> {
        let gravity = self.plan.gravity.selector();
        if self.plan.enabled_categories().next().is_none()
            && gravity.is_none()
            && !self.plan.run_gravity
        {
            warn!("selective sync has no categories, gravity tables or rebuild enabled, nothing to do");
            return Ok(());
        }

        let (ready, mut failures) = self.authenticate_all().await?;
        let patch = match self.build_patch().await {
            Ok(patch) => patch,
            Err(source) => return Err(self.primary_failed(source, failures)),
        };
        let bundle = match &gravity {
            Some(_) => match self.export_bundle().await {
                Ok(bundle) => Some(bundle),
                Err(source) => return Err(self.primary_failed(source, failures)),
            },
            None => None,
        };

        for replica in ready {
            let result = async {
                if !patch.is_empty() {
                    self.retry
                        .run("patch config", self.budget.patch_config, || {
                            replica.patch_config(&patch)
                        })
                        .await?;
                }
                if let (Some(bundle), Some(selector)) = (&bundle, &gravity) {
                    self.import_bundle(replica, bundle, selector).await?;
                }
                self.rebuild(replica).await
            }
            .await;
            record(replica, result, &mut failures);
        }

        aggregate(failures)
    }

    // ── Steps ───────────────────────────────────────────────────────

    /// Authenticate the primary, then every replica. Replicas that fail are
    /// returned as failures and left out of the ready list.
    async fn authenticate_all(
        &self,
    ) -> Result<(Vec<&SessionClient>, Vec<ReplicaFailure>), SyncError> {
        let primary = &self.primary;
        self.retry
            .run("authenticate", self.budget.authenticate, || {
                primary.authenticate()
            })
            .await
            .map_err(|source| self.primary_failed(source, Vec::new()))?;

        let mut ready = Vec::with_capacity(self.replicas.len());
        let mut failures = Vec::new();
        for replica in &self.replicas {
            match self
                .retry
                .run("authenticate", self.budget.authenticate, || {
                    replica.authenticate()
                })
                .await
            {
                Ok(()) => ready.push(replica),
                Err(source) => {
                    warn!(replica = %replica.target(), error = %source, "replica authentication failed");
                    failures.push(ReplicaFailure {
                        target: replica.target(),
                        source,
                    });
                }
            }
        }

        Ok((ready, failures))
    }

    /// Read the primary configuration and cut one partial document out of
    /// it, holding every enabled category.
    async fn build_patch(&self) -> Result<ConfigDocument, nebula_api::Error> {
        let mut patch = ConfigDocument::new();
        if self.plan.enabled_categories().next().is_none() {
            return Ok(patch);
        }

        let primary = &self.primary;
        let document = self
            .retry
            .run("read config", self.budget.read_config, || {
                primary.read_config()
            })
            .await?;

        for (category, setting) in self.plan.enabled_categories() {
            let Some(Value::Object(section)) = document.get(category.key()) else {
                warn!(%category, "category missing from primary configuration, skipping");
                continue;
            };
            let section = match &setting.filter {
                Some(filter) => filter.apply(section),
                None => section.clone(),
            };
            patch.insert(category.key().to_owned(), Value::Object(section));
        }

        debug!(categories = patch.len(), "built configuration patch");
        Ok(patch)
    }

    async fn export_bundle(&self) -> Result<Bytes, nebula_api::Error> {
        let primary = &self.primary;
        self.retry
            .run("export bundle", self.budget.transfer_bundle, || {
                primary.export_bundle()
            })
            .await
    }

    async fn import_bundle(
        &self,
        replica: &SessionClient,
        bundle: &Bytes,
        selector: &ImportSelector,
    ) -> Result<(), nebula_api::Error> {
        self.retry
            .run("import bundle", self.budget.transfer_bundle, || {
                replica.import_bundle(bundle, Some(selector))
            })
            .await
    }

    async fn rebuild(&self, replica: &SessionClient) -> Result<(), nebula_api::Error> {
        if !self.plan.run_gravity {
            return Ok(());
        }
        self.retry
            .run("trigger rebuild", self.budget.trigger_rebuild, || {
                replica.trigger_rebuild()
            })
            .await
    }

    fn primary_failed(&self, source: nebula_api::Error, failures: Vec<ReplicaFailure>) -> SyncError {
        SyncError::Primary {
            target: self.primary.target(),
            source,
            failures,
        }
    }

    // ── Teardown and notification ───────────────────────────────────

    async fn teardown(&self) {
        for client in std::iter::once(&self.primary).chain(&self.replicas) {
            if let Err(e) = self
                .retry
                .run("delete session", self.budget.delete_session, || {
                    client.delete_session()
                })
                .await
            {
                warn!(appliance = %client.target(), error = %e, "failed to delete session");
            }
        }
    }

    async fn notify(&self, result: &Result<(), SyncError>) {
        for callback in &self.callbacks {
            match result {
                Ok(()) => callback.on_success().await,
                Err(e) => callback.on_failure(e).await,
            }
        }
    }
}

fn record(
    replica: &SessionClient,
    result: Result<(), nebula_api::Error>,
    failures: &mut Vec<ReplicaFailure>,
) {
    match result {
        Ok(()) => info!(replica = %replica.target(), "replica synced"),
        Err(source) => {
            warn!(replica = %replica.target(), error = %source, "replica sync failed");
            failures.push(ReplicaFailure {
                target: replica.target(),
                source,
            });
        }
    }
}

fn aggregate(failures: Vec<ReplicaFailure>) -> Result<(), SyncError> {
    if failures.is_empty() {
        Ok(())
    } else {
        Err(SyncError::Replicas { failures })
    }
}
