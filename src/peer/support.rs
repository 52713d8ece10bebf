//! Endorser support facade
//!
//! Bundles the peer collaborators the endorsement path needs and runs
//! proposal batches through the parallel coordinator.

use std::sync::Arc;
use tracing::{debug, info};

use crate::coord::backend::require_lifecycle;
use crate::coord::{BatchResult, Coordinator, ExecutionHook};
use crate::core::config::CoordinatorConfig;
use crate::core::errors::{EndorserError, Result};
use crate::coord::BackendRef;
use crate::decoration::{apply_decorations, Decorator, DecoratorRegistry};
use crate::model::{
    ChaincodeContext, ChaincodeDefinition, ChaincodeDeploymentSpec, ChaincodeInput,
    ChaincodeType, ExecutionOutput, Proposal, SignedProposal, TransactionParams,
};
use crate::peer::{
    AclProvider, ApplicationConfig, ApplicationConfigSource, ChaincodeHeaderExtension,
    ChaincodeStore, ChannelHeader, HistoryQueryExecutor, Ledger, PeerLedgers,
    ProcessedTransaction, QueryExecutor, SignatureHeader, SigningIdentity,
    StaticSystemChaincodes, SystemChaincodeProvider, TxSimulator, PEER_PROPOSE,
};

/// One proposal batch to execute
#[derive(Clone, Debug, Default)]
pub struct ExecutionRequest {
    pub channel_id: String,
    pub chaincode_name: String,
    pub chaincode_version: String,
    pub tx_id: String,
    pub signed_proposal: Option<SignedProposal>,
    /// Originating proposal of each input
    pub proposals: Vec<Proposal>,
    pub inputs: Vec<ChaincodeInput>,
}

/// Peer-facing support for the endorser
pub struct Support {
    ledgers: Arc<dyn PeerLedgers>,
    acl: Arc<dyn AclProvider>,
    store: Arc<dyn ChaincodeStore>,
    system_chaincodes: Arc<dyn SystemChaincodeProvider>,
    app_config: Option<Arc<dyn ApplicationConfigSource>>,
    signer: Option<Arc<dyn SigningIdentity>>,
    decorators: DecoratorRegistry,
    coordinator: Coordinator,
}

impl Support {
    pub fn builder() -> SupportBuilder {
        SupportBuilder::default()
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn decorators(&self) -> &DecoratorRegistry {
        &self.decorators
    }

    fn ledger(&self, channel_id: &str) -> Option<Arc<dyn Ledger>> {
        self.ledgers.get_ledger(channel_id)
    }

    fn first_backend(&self) -> &BackendRef {
        // the coordinator refuses an empty roster
        &self.coordinator.roster()[0]
    }

    /// Ledger handle able to create query executors for `channel`
    pub fn new_query_creator(&self, channel: &str) -> Result<Arc<dyn Ledger>> {
        self.ledger(channel)
            .ok_or_else(|| EndorserError::channel_not_found(channel))
    }

    /// The peer's signer is used for every request
    pub fn signing_identity_for_request(
        &self,
        _signed_proposal: &SignedProposal,
    ) -> Result<Arc<dyn SigningIdentity>> {
        self.signer
            .clone()
            .ok_or_else(|| EndorserError::configuration("no signing identity configured"))
    }

    pub fn is_sys_cc(&self, name: &str) -> bool {
        self.system_chaincodes.is_sys_cc(name)
    }

    /// True for system chaincodes that clients may not invoke
    pub fn is_sys_cc_and_not_invokable_external(&self, name: &str) -> bool {
        self.system_chaincodes.is_sys_cc_and_not_invokable_external(name)
    }

    /// Transaction simulator on `ledger_name`, unique per `tx_id`
    pub fn get_tx_simulator(&self, ledger_name: &str, tx_id: &str) -> Result<Box<dyn TxSimulator>> {
        let ledger = self.ledger(ledger_name).ok_or_else(|| {
            EndorserError::ledger(ledger_name, format!("Channel does not exist: {}", ledger_name))
        })?;
        ledger.new_tx_simulator(tx_id)
    }

    pub fn get_history_query_executor(&self, ledger_name: &str) -> Result<Box<dyn HistoryQueryExecutor>> {
        let ledger = self.ledger(ledger_name).ok_or_else(|| {
            EndorserError::ledger(ledger_name, format!("Channel does not exist: {}", ledger_name))
        })?;
        ledger.new_history_query_executor()
    }

    pub fn get_transaction_by_id(&self, channel_id: &str, tx_id: &str) -> Result<ProcessedTransaction> {
        let ledger = self.ledger(channel_id).ok_or_else(|| {
            EndorserError::ledger(
                channel_id,
                format!("failed to look up the ledger for Channel {}", channel_id),
            )
        })?;
        ledger.get_transaction_by_id(tx_id).map_err(|e| {
            EndorserError::ledger(channel_id, format!("GetTransactionByID failed: {}", e))
        })
    }

    pub fn get_ledger_height(&self, channel_id: &str) -> Result<u64> {
        let ledger = self.ledger(channel_id).ok_or_else(|| {
            EndorserError::ledger(
                channel_id,
                format!("failed to look up the ledger for Channel {}", channel_id),
            )
        })?;
        let info = ledger.blockchain_info().map_err(|e| {
            EndorserError::ledger(
                channel_id,
                format!("failed to obtain information for Channel {}: {}", channel_id, e),
            )
        })?;
        Ok(info.height)
    }

    /// Installed deployment spec matching the name and version of `spec`
    pub fn get_chaincode_deployment_spec_fs(
        &self,
        spec: &ChaincodeDeploymentSpec,
    ) -> Result<ChaincodeDeploymentSpec> {
        let cc = &spec.chaincode_spec;
        self.store
            .get_chaincode_from_fs(&cc.name, &cc.version)
            .map_err(|e| {
                EndorserError::chaincode(
                    cc.name.clone(),
                    format!("could not get chaincode from fs: {}", e),
                )
            })
    }

    /// Run a legacy deployment init; always served by the first backend
    pub async fn execute_legacy_init(
        &self,
        tx_params: &TransactionParams,
        name: &str,
        version: &str,
        spec: &ChaincodeDeploymentSpec,
    ) -> Result<ExecutionOutput> {
        let ctx = ChaincodeContext::new(name, version);
        let backend = self.first_backend();
        debug!(chaincode = name, version, backend = backend.container_name(), "Legacy init");
        backend.execute_legacy_init(tx_params, &ctx, spec).await
    }

    /// Decorate, route and execute a proposal batch
    pub async fn execute(
        &self,
        tx_params: &TransactionParams,
        request: ExecutionRequest,
    ) -> Result<BatchResult> {
        let ExecutionRequest {
            channel_id,
            chaincode_name,
            chaincode_version,
            tx_id,
            signed_proposal,
            proposals,
            inputs,
        } = request;

        if proposals.len() != inputs.len() {
            return Err(EndorserError::configuration(format!(
                "got {} proposals for {} inputs",
                proposals.len(),
                inputs.len()
            )));
        }

        let decorators: Vec<Arc<dyn Decorator>> = self.decorators.lookup();
        let inputs: Vec<ChaincodeInput> = proposals
            .iter()
            .zip(inputs)
            .map(|(proposal, input)| apply_decorations(proposal, input, &decorators))
            .collect();

        info!(
            channel = %channel_id,
            tx_id = %tx_id,
            chaincode = %chaincode_name,
            inputs = inputs.len(),
            decorators = decorators.len(),
            "Executing proposal batch"
        );
        let mut params = tx_params.clone();
        if params.channel_id.is_empty() {
            params.channel_id = channel_id;
        }
        if params.tx_id.is_empty() {
            params.tx_id = tx_id;
        }
        if params.signed_proposal.is_none() {
            params.signed_proposal = signed_proposal;
        }

        self.coordinator
            .execute(&params, &chaincode_name, &chaincode_version, inputs)
            .await
    }

    /// Chaincode definition via the lifecycle of the first backend
    pub async fn get_chaincode_definition(
        &self,
        chaincode_name: &str,
        query: &dyn QueryExecutor,
    ) -> Result<ChaincodeDefinition> {
        let lifecycle = require_lifecycle(self.first_backend(), chaincode_name)?;
        lifecycle.chaincode_definition(chaincode_name, query).await
    }

    /// Check the proposal against the channel's `peer/Propose` policy
    pub fn check_acl(
        &self,
        signed_proposal: &SignedProposal,
        channel_header: &ChannelHeader,
        _signature_header: &SignatureHeader,
        _extension: &ChaincodeHeaderExtension,
    ) -> Result<()> {
        self.acl
            .check_acl(PEER_PROPOSE, &channel_header.channel_id, signed_proposal)
    }

    /// Whether a chaincode package needs the java runtime
    pub fn is_java_cc(&self, package: &[u8]) -> Result<bool> {
        let spec = self.store.parse_package(package)?;
        Ok(spec.chaincode_spec.chaincode_type == ChaincodeType::Java)
    }

    /// Fail when the installed package's instantiation policy differs from
    /// the one recorded on the ledger
    pub fn check_instantiation_policy(
        &self,
        name: &str,
        version: &str,
        definition: &ChaincodeDefinition,
    ) -> Result<()> {
        match self.store.instantiation_policy(name, version)? {
            Some(policy) if policy != definition.instantiation_policy => {
                Err(EndorserError::chaincode(
                    name,
                    format!(
                        "Instantiation policy mismatch for cc {}:{}",
                        name, version
                    ),
                ))
            }
            _ => Ok(()),
        }
    }

    /// Application config of a channel, if the channel has one
    pub fn get_application_config(&self, channel_id: &str) -> Option<ApplicationConfig> {
        self.app_config
            .as_ref()
            .and_then(|source| source.application_config(channel_id))
    }
}

/// Builder for Support
#[derive(Default)]
pub struct SupportBuilder {
    ledgers: Option<Arc<dyn PeerLedgers>>,
    acl: Option<Arc<dyn AclProvider>>,
    store: Option<Arc<dyn ChaincodeStore>>,
    system_chaincodes: Option<Arc<dyn SystemChaincodeProvider>>,
    app_config: Option<Arc<dyn ApplicationConfigSource>>,
    signer: Option<Arc<dyn SigningIdentity>>,
    decorators: DecoratorRegistry,
    backends: Vec<BackendRef>,
    config: CoordinatorConfig,
    hooks: Vec<Arc<dyn ExecutionHook>>,
}

impl SupportBuilder {
    pub fn ledgers(mut self, ledgers: Arc<dyn PeerLedgers>) -> Self {
        self.ledgers = Some(ledgers);
        self
    }

    pub fn acl(mut self, acl: Arc<dyn AclProvider>) -> Self {
        self.acl = Some(acl);
        self
    }

    pub fn chaincode_store(mut self, store: Arc<dyn ChaincodeStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn system_chaincodes(mut self, provider: Arc<dyn SystemChaincodeProvider>) -> Self {
        self.system_chaincodes = Some(provider);
        self
    }

    pub fn application_config(mut self, source: Arc<dyn ApplicationConfigSource>) -> Self {
        self.app_config = Some(source);
        self
    }

    pub fn signer(mut self, signer: Arc<dyn SigningIdentity>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Register a decorator; decorators run in registration order
    pub fn decorator(self, decorator: Arc<dyn Decorator>) -> Self {
        self.decorators.register(decorator);
        self
    }

    /// Append a backend to the roster; the last one added is the primary
    pub fn backend(mut self, backend: BackendRef) -> Self {
        self.backends.push(backend);
        self
    }

    pub fn backends(mut self, backends: impl IntoIterator<Item = BackendRef>) -> Self {
        self.backends.extend(backends);
        self
    }

    pub fn config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn hook(mut self, hook: Arc<dyn ExecutionHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn build(self) -> Result<Support> {
        let ledgers = self
            .ledgers
            .ok_or_else(|| EndorserError::configuration("ledgers are required"))?;
        let acl = self
            .acl
            .ok_or_else(|| EndorserError::configuration("an ACL provider is required"))?;
        let store = self
            .store
            .ok_or_else(|| EndorserError::configuration("a chaincode store is required"))?;

        let mut coordinator = Coordinator::new(self.backends, self.config)?;
        for hook in self.hooks {
            coordinator = coordinator.with_hook(hook);
        }

        Ok(Support {
            ledgers,
            acl,
            store,
            system_chaincodes: self
                .system_chaincodes
                .unwrap_or_else(|| Arc::new(StaticSystemChaincodes::default())),
            app_config: self.app_config,
            signer: self.signer,
            decorators: self.decorators,
            coordinator,
        })
    }
}
