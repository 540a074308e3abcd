use blobid_core::{
    BlobDataType, BlobIdType, BlobIdentifier, HealthPolicy, HealthPolicyConfig,
    InMemoryPartitionDirectory, OpaquePartitionId, PartitionDirectory, Version,
};
use clap::{Parser, Subcommand};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "blobidctl", version = "1.0.0", about = "Blob identifier codec and health policy CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a fresh blob identifier to its canonical base64url string
    Encode {
        #[arg(long, default_value = "5")]
        version: u16,
        #[arg(long, default_value = "0")]
        datacenter: i8,
        #[arg(long, default_value = "0")]
        account: i16,
        #[arg(long, default_value = "0")]
        container: i16,
        /// Partition bytes as hex, e.g. deadbeef
        #[arg(long, default_value = "")]
        partition: String,
        #[arg(long)]
        encrypted: bool,
        /// One of: data-chunk, metadata, simple (V5 only)
        #[arg(long)]
        data_type: Option<String>,
    },
    /// Decode a base64url or hex identifier string and print its fields
    Decode {
        id: String,
        #[arg(long)]
        hex: bool,
    },
    /// Print version/encryption/account/container without full decode
    Inspect {
        id: String,
    },
    /// Derive a new identifier at a target version with a new account/container
    Craft {
        id: String,
        #[arg(long)]
        target_version: u16,
        #[arg(long)]
        account: i16,
        #[arg(long)]
        container: i16,
    },
    /// Compare two identifiers per the ordering contract
    Compare {
        left: String,
        right: String,
    },
    /// Drive a fixed-backoff health policy through a synthetic error timeline
    HealthSim {
        /// Comma-separated millisecond timestamps at which to call on_error
        #[arg(long)]
        errors_at_ms: String,
        #[arg(long, default_value = "1000")]
        window_ms: u64,
        #[arg(long, default_value = "3")]
        threshold: usize,
        #[arg(long, default_value = "500")]
        backoff_ms: u64,
        /// Millisecond timestamps at which to sample is_down()
        #[arg(long)]
        check_at_ms: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    match Cli::parse().command {
        Commands::Encode { version, datacenter, account, container, partition, encrypted, data_type } => {
            let version = parse_version(version)?;
            let partition_bytes = hex::decode(&partition)?;
            let data_type = data_type.as_deref().map(parse_data_type).transpose()?;

            let id = BlobIdentifier::new(
                version,
                BlobIdType::Native,
                datacenter,
                account,
                container,
                Box::new(OpaquePartitionId::new(partition_bytes)),
                encrypted,
                data_type,
            );
            let dir = InMemoryPartitionDirectory::permissive();
            println!("{}", blobid_core::blob_id::to_string(&id, &dir));
        }

        Commands::Decode { id, hex } => {
            let dir = InMemoryPartitionDirectory::permissive();
            let decoded = if hex {
                blobid_core::blob_id::from_hex_string(&id, &dir)?
            } else {
                blobid_core::blob_id::from_string(&id, &dir)?
            };
            print_identifier(&decoded);
        }

        Commands::Inspect { id } => {
            println!("version:    {}", blobid_core::blob_id::version_of(&id)?);
            println!("encrypted:  {}", blobid_core::blob_id::is_encrypted(&id)?);
            println!("crafted:    {}", blobid_core::blob_id::is_crafted(&id)?);
            let (account, container) = blobid_core::blob_id::account_and_container(&id)?;
            println!("account:    {account}");
            println!("container:  {container}");
        }

        Commands::Craft { id, target_version, account, container } => {
            let dir = InMemoryPartitionDirectory::permissive();
            let source = blobid_core::blob_id::from_string(&id, &dir)?;
            let target_version = parse_version(target_version)?;
            let crafted = blobid_core::blob_id::craft(&source, target_version, account, container)?;
            println!("{}", blobid_core::blob_id::to_string(&crafted, &dir));
        }

        Commands::Compare { left, right } => {
            let dir = InMemoryPartitionDirectory::permissive();
            let a = blobid_core::blob_id::from_string(&left, &dir)?;
            let b = blobid_core::blob_id::from_string(&right, &dir)?;
            println!("{:?}", a.cmp(&b));
        }

        Commands::HealthSim { errors_at_ms, window_ms, threshold, backoff_ms, check_at_ms } => {
            let clock = Arc::new(blobid_core::ManualClock::new(0));
            let config = HealthPolicyConfig::new(window_ms, threshold, backoff_ms);
            let policy = HealthPolicy::with_clock("cli-resource", config, Arc::clone(&clock) as Arc<dyn blobid_core::Clock>);

            let mut events: Vec<(u64, bool)> = Vec::new();
            for t in parse_timestamps(&errors_at_ms)? {
                events.push((t, true));
            }
            for t in parse_timestamps(&check_at_ms)? {
                events.push((t, false));
            }
            events.sort_by_key(|(t, _)| *t);

            for (t, is_error) in events {
                clock.set(t);
                if is_error {
                    policy.on_error();
                    println!("t={t:<6} on_error()  -> is_down={}", policy.is_down());
                } else {
                    println!("t={t:<6} is_down()   -> {}", policy.is_down());
                }
            }
        }
    }

    Ok(())
}

fn print_identifier(id: &BlobIdentifier) {
    println!("version:    {:?}", id.version());
    println!("type:       {:?}", id.id_type());
    println!("datacenter: {}", id.datacenter_id());
    println!("account:    {}", id.account_id());
    println!("container:  {}", id.container_id());
    println!("partition:  {:02x?}", id.partition().bytes());
    println!("encrypted:  {}", id.is_encrypted());
    println!("data_type:  {:?}", id.data_type());
    println!("uuid:       {}", id.uuid());
}

fn parse_version(v: u16) -> Result<Version, Box<dyn std::error::Error>> {
    Version::from_u16(v).ok_or_else(|| format!("unknown version {v}").into())
}

fn parse_data_type(s: &str) -> Result<BlobDataType, Box<dyn std::error::Error>> {
    match s {
        "data-chunk" => Ok(BlobDataType::DataChunk),
        "metadata" => Ok(BlobDataType::Metadata),
        "simple" => Ok(BlobDataType::Simple),
        other => Err(format!("unknown data type '{other}'").into()),
    }
}

fn parse_timestamps(s: &str) -> Result<Vec<u64>, Box<dyn std::error::Error>> {
    if s.trim().is_empty() {
        return Ok(Vec::new());
    }
    s.split(',')
        .map(|part| part.trim().parse::<u64>().map_err(|e| e.into()))
        .collect()
}
