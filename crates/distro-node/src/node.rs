//! Distro node
//!
//! Wires a snapshot-backed store, an in-memory bank and the active emission
//! params into one handle. Every accepted batch advances the height by one
//! and is persisted before `distribute` returns.
//!
//! Module entries, balances, height and genesis params all live in one
//! snapshot file: the node state is written under a reserved store key
//! outside the module's prefixes, so each save replaces everything at once.
//! If a save fails the in-memory store and bank go back to their pre-batch
//! checkpoint.

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use distro_core::{Address, DistributionBatch, DistributionDate, DistributionError, EmissionParams};
use distro_distribution::{
    export_genesis, get_daily_total, init_genesis, list_daily_totals, Balance, Bank, BankState, BlockContext,
    DailyTotalEntry, DistributionReceipt, Distributor, GenesisState, InMemoryBank, QueryError,
};
use distro_economics::EmissionSchedule;
use distro_storage::{KvStore, MemoryStore, PageRequest, PageResponse, StoreCheckpoint};

use crate::config::NodeConfig;

/// Node state format version
const STATE_VERSION: u32 = 1;

/// Store key of the node state
pub const NODE_STATE_KEY: &[u8] = b"node/state";

/// Everything besides the module entries that survives a restart
#[derive(Serialize, Deserialize)]
struct PersistedState {
    version: u32,
    height: u64,
    /// Params installed by genesis, overriding the config
    params: Option<EmissionParams>,
    bank: BankState,
}

/// Distro node
pub struct DistroNode {
    config: NodeConfig,
    params: EmissionParams,
    genesis_params: bool,
    store: MemoryStore,
    bank: InMemoryBank,
    height: u64,
}

impl DistroNode {
    /// Open the node state under the configured data directory
    pub fn open(config: NodeConfig) -> anyhow::Result<Self> {
        let config_params = config.validate()?;

        let data_dir = config.data_dir();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let store = MemoryStore::open(&config.store_path())?;
        let state = load_state(&store)?;

        let (params, genesis_params) = match state.as_ref().and_then(|s| s.params.clone()) {
            Some(params) => {
                params.validate()?;
                (params, true)
            }
            None => (config_params, false),
        };
        let (height, bank) = match state {
            Some(state) => (state.height, InMemoryBank::from_state(state.bank)),
            None => (0, InMemoryBank::new()),
        };

        tracing::info!(
            name = %config.node.name,
            data_dir = %data_dir.display(),
            height,
            entries = store.len(),
            denom = %params.denom,
            "node opened"
        );

        Ok(Self {
            config,
            params,
            genesis_params,
            store,
            bank,
            height,
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn params(&self) -> &EmissionParams {
        &self.params
    }

    /// Number of accepted batches
    pub fn height(&self) -> u64 {
        self.height
    }

    /// Run one batch at `block_time`
    ///
    /// A rejected batch, or one whose snapshot cannot be written, leaves
    /// the store, bank and height as they were.
    pub fn distribute(
        &mut self,
        batch: &DistributionBatch,
        block_time: DateTime<Utc>,
    ) -> anyhow::Result<DistributionReceipt> {
        let ctx = BlockContext::new(self.height + 1, block_time);
        let checkpoint = self.checkpoint();

        let result = Distributor::new(&self.store, &self.bank, &self.params).distribute(batch, &ctx);
        let receipt = match result {
            Ok(receipt) => receipt,
            Err(e) => {
                self.rollback(checkpoint);
                return Err(e.into());
            }
        };

        self.height = ctx.height;
        if let Err(e) = self.persist() {
            tracing::error!(height = ctx.height, error = %e, "failed to persist batch, rolling back");
            self.rollback(checkpoint);
            return Err(e);
        }
        Ok(receipt)
    }

    pub fn daily_total(&self, date: &str) -> Result<Option<u64>, QueryError> {
        get_daily_total(&self.store, date)
    }

    pub fn daily_totals(&self, request: &PageRequest) -> Result<PageResponse<DailyTotalEntry>, QueryError> {
        list_daily_totals(&self.store, request)
    }

    /// Emission cap of `date` under the active params
    pub fn daily_limit(&self, date: &DistributionDate) -> u64 {
        EmissionSchedule::from_params(&self.params).daily_limit(date)
    }

    pub fn balance(&self, address: &Address) -> Balance {
        self.bank.balance_of(address, &self.params.denom)
    }

    pub fn total_supply(&self) -> Balance {
        self.bank.total_supply(&self.params.denom)
    }

    /// Install `genesis`: its params replace the active ones and its totals
    /// are written to the store
    pub fn init_genesis(&mut self, genesis: &GenesisState) -> anyhow::Result<()> {
        let checkpoint = self.checkpoint();
        init_genesis(&self.store, genesis)?;
        self.params = genesis.params.clone();
        self.genesis_params = true;

        if let Err(e) = self.persist() {
            self.rollback(checkpoint);
            return Err(e);
        }
        Ok(())
    }

    pub fn export_genesis(&self) -> anyhow::Result<GenesisState> {
        Ok(export_genesis(&self.store, &self.params)?)
    }

    /// Stage the node state in the store and write one snapshot
    pub fn persist(&self) -> anyhow::Result<()> {
        let state = PersistedState {
            version: STATE_VERSION,
            height: self.height,
            params: self.genesis_params.then(|| self.params.clone()),
            bank: self.bank.state(),
        };
        self.store.set(NODE_STATE_KEY, &bincode::serialize(&state)?)?;

        let path = self.config.store_path();
        self.store
            .save(&path)
            .with_context(|| format!("failed to write snapshot {}", path.display()))?;

        tracing::debug!(height = self.height, "node state persisted");
        Ok(())
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            store: self.store.checkpoint(),
            bank: self.bank.state(),
            height: self.height,
            params: self.params.clone(),
            genesis_params: self.genesis_params,
        }
    }

    fn rollback(&mut self, checkpoint: Checkpoint) {
        self.store.restore(checkpoint.store);
        self.bank.restore(checkpoint.bank);
        self.height = checkpoint.height;
        self.params = checkpoint.params;
        self.genesis_params = checkpoint.genesis_params;
    }
}

/// In-memory state to return to when a change cannot be kept
struct Checkpoint {
    store: StoreCheckpoint,
    bank: BankState,
    height: u64,
    params: EmissionParams,
    genesis_params: bool,
}

/// Rejection reason of a failed `distribute`, if it was one
pub fn rejection(error: &anyhow::Error) -> Option<&DistributionError> {
    error.downcast_ref::<DistributionError>()
}

fn load_state(store: &MemoryStore) -> anyhow::Result<Option<PersistedState>> {
    let Some(bytes) = store.get(NODE_STATE_KEY)? else {
        return Ok(None);
    };
    let state: PersistedState = bincode::deserialize(&bytes).context("failed to decode node state")?;
    if state.version != STATE_VERSION {
        anyhow::bail!("unsupported node state version {}", state.version);
    }
    Ok(Some(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use distro_core::Recipient;
    use distro_crypto::InstructionSigner;
    use distro_distribution::DailyTotalRecord;

    struct Setup {
        _dir: tempfile::TempDir,
        config: NodeConfig,
        signer: InstructionSigner,
        authority: String,
    }

    fn setup() -> Setup {
        let dir = tempfile::tempdir().unwrap();
        let signer = InstructionSigner::from_seed([3u8; 32]);
        let authority = Address::new([4u8; 32]).to_canonical();

        let mut config = NodeConfig::default();
        config.node.data_dir = dir.path().join("data").to_string_lossy().into_owned();
        config.emission.max_supply = 657_000;
        config.emission = config
            .emission
            .clone()
            .with_authorized_accounts(vec![authority.clone()])
            .with_signer_public_key(signer.public_key_hex());

        Setup {
            _dir: dir,
            config,
            signer,
            authority,
        }
    }

    fn batch(setup: &Setup, seed: u8, date: &str, amount: u64, nonce: u64) -> DistributionBatch {
        let address = Address::new([seed; 32]).to_canonical();
        let instruction = setup.signer.instruction(date, amount, &address, nonce);
        DistributionBatch::new(
            setup.authority.clone(),
            amount,
            vec![Recipient {
                address,
                distributions: vec![instruction],
            }],
        )
    }

    fn noon(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_distribute_persists_across_reopen() {
        let setup = setup();
        let mut node = DistroNode::open(setup.config.clone()).unwrap();

        node.distribute(&batch(&setup, 1, "2025-03-01", 400, 1), noon(2025, 3, 2))
            .unwrap();
        assert_eq!(node.height(), 1);
        drop(node);

        let node = DistroNode::open(setup.config.clone()).unwrap();
        assert_eq!(node.height(), 1);
        assert_eq!(node.daily_total("2025-03-01").unwrap(), Some(400));
        assert_eq!(node.balance(&Address::new([1u8; 32])), 400);
        assert_eq!(node.total_supply(), 400);
    }

    #[test]
    fn test_replay_after_restart_is_rejected() {
        let setup = setup();
        let mut node = DistroNode::open(setup.config.clone()).unwrap();
        let first = batch(&setup, 1, "2025-03-01", 400, 7);
        node.distribute(&first, noon(2025, 3, 2)).unwrap();
        drop(node);

        let mut node = DistroNode::open(setup.config.clone()).unwrap();
        let err = node.distribute(&first, noon(2025, 3, 2)).unwrap_err();
        assert_eq!(
            rejection(&err),
            Some(&DistributionError::NonceReused { nonce: "7".into() })
        );
        assert_eq!(node.height(), 1);
    }

    #[test]
    fn test_rejection_leaves_state_untouched() {
        let setup = setup();
        let mut node = DistroNode::open(setup.config.clone()).unwrap();

        let err = node
            .distribute(&batch(&setup, 1, "2025-03-01", 901, 1), noon(2025, 3, 2))
            .unwrap_err();
        assert!(matches!(
            rejection(&err),
            Some(DistributionError::DailyLimitExceeded { limit: 900, .. })
        ));
        assert_eq!(node.height(), 0);
        assert_eq!(node.total_supply(), 0);
        assert_eq!(node.daily_total("2025-03-01").unwrap(), None);
    }

    #[test]
    fn test_failed_persist_rolls_back_batch() {
        let setup = setup();
        let mut node = DistroNode::open(setup.config.clone()).unwrap();

        // a directory where the snapshot temp file goes makes the save fail
        let blocker = setup.config.store_path().with_extension("tmp");
        std::fs::create_dir_all(&blocker).unwrap();

        let batch = batch(&setup, 1, "2025-03-01", 400, 1);
        let err = node.distribute(&batch, noon(2025, 3, 2)).unwrap_err();
        assert!(rejection(&err).is_none());
        assert_eq!(node.height(), 0);
        assert_eq!(node.daily_total("2025-03-01").unwrap(), None);
        assert_eq!(node.balance(&Address::new([1u8; 32])), 0);
        assert_eq!(node.total_supply(), 0);
        drop(node);

        let mut node = DistroNode::open(setup.config.clone()).unwrap();
        assert_eq!(node.height(), 0);
        assert_eq!(node.daily_total("2025-03-01").unwrap(), None);
        assert_eq!(node.total_supply(), 0);

        std::fs::remove_dir(&blocker).unwrap();
        node.distribute(&batch, noon(2025, 3, 2)).unwrap();
        assert_eq!(node.height(), 1);
        assert_eq!(node.balance(&Address::new([1u8; 32])), 400);
    }

    #[test]
    fn test_failed_genesis_persist_keeps_old_params() {
        let setup = setup();
        let mut node = DistroNode::open(setup.config.clone()).unwrap();
        let blocker = setup.config.store_path().with_extension("tmp");
        std::fs::create_dir_all(&blocker).unwrap();

        let mut params = node.params().clone();
        params.months_in_halving_period = 6;
        let genesis = GenesisState::new(
            params,
            vec![DailyTotalRecord {
                date: "2025-03-01".to_string(),
                amount: 250,
            }],
        );
        assert!(node.init_genesis(&genesis).is_err());
        assert_eq!(node.params().months_in_halving_period, 12);
        assert_eq!(node.daily_total("2025-03-01").unwrap(), None);
    }

    #[test]
    fn test_node_state_is_not_a_daily_total() {
        let setup = setup();
        let mut node = DistroNode::open(setup.config.clone()).unwrap();
        node.distribute(&batch(&setup, 1, "2025-03-01", 400, 1), noon(2025, 3, 2))
            .unwrap();

        let exported = node.export_genesis().unwrap();
        assert_eq!(exported.daily_distribution_totals.len(), 1);
        assert_eq!(
            node.daily_totals(&PageRequest::default().count_total()).unwrap().total,
            Some(1)
        );
    }

    #[test]
    fn test_genesis_import_export() {
        let setup = setup();
        let mut node = DistroNode::open(setup.config.clone()).unwrap();

        let mut params = node.params().clone();
        params.months_in_halving_period = 6;
        let genesis = GenesisState::new(
            params,
            vec![DailyTotalRecord {
                date: "2025-03-01".to_string(),
                amount: 250,
            }],
        );
        node.init_genesis(&genesis).unwrap();
        assert_eq!(node.daily_total("2025-03-01").unwrap(), Some(250));
        drop(node);

        let node = DistroNode::open(setup.config.clone()).unwrap();
        assert_eq!(node.params().months_in_halving_period, 6);
        assert_eq!(node.export_genesis().unwrap(), genesis);
    }

    #[test]
    fn test_daily_limit_uses_active_params() {
        let setup = setup();
        let node = DistroNode::open(setup.config.clone()).unwrap();
        let date = DistributionDate::parse("2025-03-01").unwrap();
        assert_eq!(node.daily_limit(&date), 900);
    }

    #[test]
    fn test_invalid_config_refuses_to_open() {
        let mut setup = setup();
        setup.config.emission.denom = String::new();
        assert!(DistroNode::open(setup.config).is_err());
    }
}
