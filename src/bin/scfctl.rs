//! Command-line front end: mint credentials and run ledger operations against a local sled store.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use supply_finance::utils::new_uuid_to_bech32;
use supply_finance::{
    CertificateIdentity, Command, Credential, FinancingService, Role, ServiceConfig,
};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(name = "scfctl", about = "Supply-chain financing ledger")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Mint a credential for a role, optionally for an existing account
    Credential {
        /// Role (assigner, Anchor, Vendor, PaymentMaker, PaymentChecker)
        role: String,

        /// Account identifier; a fresh one is generated when omitted
        #[arg(short, long)]
        account: Option<String>,
    },

    /// Run one operation as the holder of a credential
    Exec {
        /// Caller credential, as printed by `credential`
        credential: String,

        /// Operation name, e.g. create_program
        function: String,

        /// Positional arguments of the operation
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ServiceConfig::from_env().context("invalid configuration")?;

    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Credential { role, account } => {
            let account = match account {
                Some(account) => account,
                None => new_uuid_to_bech32("acct")?,
            };
            let encoded = Credential::new(account.as_str(), &Role::from(role.as_str())).encode()?;
            println!("{account} {encoded}");
        }
        Commands::Exec {
            credential,
            function,
            args,
        } => {
            let provider = CertificateIdentity::from_encoded(&credential)
                .context("caller credential could not be decoded")?;
            let command = Command::parse(&function, &args)?;

            let service = FinancingService::open(config)
                .context("failed to open the ledger database")?;
            service.bootstrap()?;

            let output = service.execute(&provider, command)?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
