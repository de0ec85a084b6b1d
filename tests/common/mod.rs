use bitcoin::{Address, Amount, Network, Psbt, Transaction};
use stakebridge_common::logging::{self, LoggerConfig};
use stakebridge_config::TxBuilderConfig;
use stakebridge_primitives::l1::Utxo;
use stakebridge_test_utils::bitcoin::{generate_utxos, test_address};
use stakebridge_tx_builder::prelude::*;
use tracing::debug;

const CONFIG: &str = r#"
    network = "regtest"
    commitment_encoding = "bigendian"
"#;

/// Initializes logging and loads the builder context used by the flows.
pub(crate) fn setup(test_name: &str) -> TxBuildContext {
    logging::init(LoggerConfig::with_base_name(test_name));

    let config: TxBuilderConfig = toml::from_str(CONFIG).expect("config must parse");
    debug!(?config, "loaded config");

    TxBuildContext::from_config(&config)
}

/// A participant with some spendable outputs and an address to receive funds at.
#[derive(Debug, Clone)]
pub(crate) struct Wallet {
    address: Address,
    utxos: Vec<Utxo>,
}

impl Wallet {
    pub(crate) fn new(network: Network, values: &[u64]) -> Self {
        Self {
            address: test_address(network),
            utxos: generate_utxos(values),
        }
    }

    pub(crate) fn address(&self) -> &Address {
        &self.address
    }

    pub(crate) fn utxos(&self) -> &[Utxo] {
        &self.utxos
    }
}

/// Stands in for signing and confirming: the txid of a segwit transaction does not change when
/// witnesses are added, so the unsigned transaction can be spent from directly.
pub(crate) fn confirm(signing_data: &TxSigningData) -> Transaction {
    let psbt = signing_data.psbt.inner();

    let bytes = psbt.serialize();
    let decoded = Psbt::deserialize(&bytes).expect("psbt must survive serialization");
    assert_eq!(&decoded, psbt, "psbt must survive serialization");

    psbt.unsigned_tx.clone()
}

/// Checks that every input carries its prevout and the inputs cover the outputs plus `fee`.
pub(crate) fn assert_funded(signing_data: &TxSigningData) {
    let psbt = signing_data.psbt.inner();

    assert_eq!(psbt.inputs.len(), signing_data.spent_utxos.len());

    let mut total_in = Amount::ZERO;
    for ((input, txin), utxo) in psbt
        .inputs
        .iter()
        .zip(&psbt.unsigned_tx.input)
        .zip(&signing_data.spent_utxos)
    {
        assert_eq!(input.witness_utxo.as_ref(), Some(&utxo.txout()));
        assert_eq!(txin.previous_output, utxo.outpoint());
        total_in += utxo.value;
    }

    let total_out: Amount = psbt.unsigned_tx.output.iter().map(|out| out.value).sum();
    assert!(
        total_in >= total_out + signing_data.fee,
        "inputs ({total_in}) must cover outputs ({total_out}) and fee ({})",
        signing_data.fee
    );
}
