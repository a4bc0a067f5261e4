//! A resolver wired to in-memory collaborators.

use std::path::Path;
use std::sync::Arc;

use capsule_ledger::CreditLedger;
use capsule_resolver::{CapsuleResolver, InMemoryCatalog, Registry};

use crate::fixtures::fusion_catalog;
use crate::mocks::{DeterministicSandbox, RecordingEmitter};

/// Resolver plus handles on every collaborator it was built with.
pub struct ResolverHarness {
    /// The resolver under test.
    pub resolver: CapsuleResolver,
    /// Registry the resolver reads first.
    pub registry: Arc<InMemoryCatalog>,
    /// Mesh consulted on a registry miss.
    pub mesh: Arc<InMemoryCatalog>,
    /// Shared ledger.
    pub ledger: Arc<CreditLedger>,
    /// Sandbox every registered capsule runs in.
    pub sandbox: Arc<DeterministicSandbox>,
    /// Captures every emitted event.
    pub emitter: RecordingEmitter,
}

impl ResolverHarness {
    /// Empty registry and mesh, fresh in-memory ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ledger(
            InMemoryCatalog::new(),
            InMemoryCatalog::new(),
            Arc::new(CreditLedger::new()),
        )
    }

    /// Registry holding only the fusion capsule.
    #[must_use]
    pub fn fusion() -> Self {
        Self::with_ledger(
            fusion_catalog(),
            InMemoryCatalog::new(),
            Arc::new(CreditLedger::new()),
        )
    }

    /// Wire the given catalogs and ledger.
    #[must_use]
    pub fn with_ledger(
        registry: InMemoryCatalog,
        mesh: InMemoryCatalog,
        ledger: Arc<CreditLedger>,
    ) -> Self {
        let registry = Arc::new(registry);
        let mesh = Arc::new(mesh);
        let sandbox = Arc::new(DeterministicSandbox::new());
        let emitter = RecordingEmitter::new();

        let resolver = CapsuleResolver::new(Arc::clone(&registry) as Arc<dyn Registry>)
            .with_mesh(mesh.clone())
            .with_ledger(ledger.clone())
            .with_sandbox(sandbox.clone())
            .with_emitter(Arc::new(emitter.clone()));

        Self {
            resolver,
            registry,
            mesh,
            ledger,
            sandbox,
            emitter,
        }
    }

    /// Rebuild the resolver with a sovereign root, keeping the collaborators.
    #[must_use]
    pub fn with_sovereign_root(mut self, root: &Path) -> Self {
        self.resolver = self.resolver.with_sovereign_root(root);
        self
    }
}

impl Default for ResolverHarness {
    fn default() -> Self {
        Self::new()
    }
}
