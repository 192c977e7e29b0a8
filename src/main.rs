use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ethers_core::types::{Address, H256};
use hexlink_core::config::CONFIG_PATH_ENV;
use hexlink_core::provider::JsonRpcProvider;
use hexlink_core::utils::checksum;
use hexlink_core::utils::logging::init_logging;
use hexlink_core::wallet::{derive_salt, normalize_email, wallet_implementation_address, WalletDeriver};
use hexlink_core::{redpacket_id, Chain, HexlinkConfig, RedPacket};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

/// Hexlink deterministic address tooling
#[derive(Debug, Parser)]
#[command(name = "hexlink", version, about)]
struct Cli {
    /// Config file (JSON)
    #[arg(long, env = CONFIG_PATH_ENV, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print catalog metadata for a chain name or id
    Chain { chain: String },
    /// Print the wallet salt for an email
    Salt { email: String },
    /// Print the CREATE2 address of the wallet implementation
    WalletImplAddress,
    /// Ask the admin contract for an email's wallet address
    WalletAddress {
        email: String,
        #[arg(long, default_value = "goerli")]
        chain: String,
    },
    /// Compute the id of a red packet before it is created
    RedpacketId {
        #[arg(long, default_value = "goerli")]
        chain: String,
        /// Creating account
        #[arg(long)]
        creator: Address,
        /// Zero address for the native token
        #[arg(long)]
        token: Option<Address>,
        #[arg(long)]
        salt: H256,
        /// Total balance in token base units
        #[arg(long)]
        balance: String,
        #[arg(long)]
        validator: Address,
        #[arg(long)]
        split: u32,
        #[arg(long, default_value_t = 0)]
        mode: u8,
        /// Red packet contract; defaults to the configured deployment
        #[arg(long)]
        contract: Option<Address>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<HexlinkConfig> {
    let path = path.with_context(|| format!("no config given: pass --config or set {}", CONFIG_PATH_ENV))?;
    HexlinkConfig::from_file(path).with_context(|| format!("loading {}", path.display()))
}

fn print(value: serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging("hexlink_core=warn,hexlink=info");

    match cli.command {
        Command::Chain { chain } => {
            let chain = Chain::get(&chain)?;
            print(serde_json::to_value(chain)?)
        }

        Command::Salt { email } => print(json!({
            "email": normalize_email(&email),
            "salt": derive_salt(&email),
        })),

        Command::WalletImplAddress => {
            let config = load_config(cli.config.as_ref())?;
            let implementation = wallet_implementation_address(config.admin, &config.wallet_bytecode);
            print(json!({
                "admin": checksum(&config.admin),
                "walletImpl": checksum(&implementation),
            }))
        }

        Command::WalletAddress { email, chain } => {
            let config = load_config(cli.config.as_ref())?;
            let chain = Chain::get(&chain)?;
            let provider = JsonRpcProvider::for_chain(&config, chain)?;
            let deriver = WalletDeriver::new(&config, Arc::new(provider));
            let identity = deriver.identity(&email).await?;
            print(json!({
                "chain": chain.name,
                "email": identity.email,
                "salt": identity.salt,
                "walletImpl": checksum(&identity.implementation_address),
                "wallet": checksum(&identity.predicted_address),
            }))
        }

        Command::RedpacketId {
            chain,
            creator,
            token,
            salt,
            balance,
            validator,
            split,
            mode,
            contract,
        } => {
            let chain = Chain::get(&chain)?;
            let contract = match contract {
                Some(contract) => contract,
                None => load_config(cli.config.as_ref())?.red_packet_address(chain)?,
            };
            let balance = hexlink_core::u256_dec::parse(&balance).map_err(anyhow::Error::msg)?;
            let packet = RedPacket {
                token: token.unwrap_or_default(),
                salt,
                balance,
                validator,
                split,
                mode,
            };
            print(json!({
                "chain": chain.name,
                "contract": checksum(&contract),
                "redPacketId": redpacket_id(chain, contract, creator, &packet),
            }))
        }
    }
}
