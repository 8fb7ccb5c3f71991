use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "transfer-cli")]
#[command(about = "Command-line client for the transfer service", long_about = None)]
struct Cli {
    #[arg(short, long, env = "TRANSFER_URL", default_value = "http://localhost:8000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show an account and its balance
    Account { id: String },
    /// Create an account
    CreateAccount {
        name: String,
        #[arg(long, default_value = "0")]
        balance: String,
        #[arg(long)]
        id: Option<String>,
    },
    /// Move money between two accounts
    Transfer {
        sender: String,
        receiver: String,
        amount: String,
    },
    /// Withdraw money to an external address
    Withdraw {
        sender: String,
        address: String,
        amount: String,
    },
    /// Check the state of a withdrawal
    WithdrawalStatus { withdrawal_id: String },
    /// Check that the service is up
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Account { id } => client.get(format!("{base}/account/{id}")).send().await?,
        Commands::CreateAccount { name, balance, id } => {
            client
                .post(format!("{base}/account"))
                .json(&json!({ "id": id, "name": name, "balance": balance }))
                .send()
                .await?
        }
        Commands::Transfer {
            sender,
            receiver,
            amount,
        } => {
            client
                .post(format!("{base}/transfer"))
                .query(&[
                    ("senderAccountId", sender),
                    ("receiverAccountId", receiver),
                    ("amount", amount),
                ])
                .send()
                .await?
        }
        Commands::Withdraw {
            sender,
            address,
            amount,
        } => {
            client
                .post(format!("{base}/withdrawal"))
                .query(&[
                    ("senderAccountId", sender),
                    ("address", address),
                    ("amount", amount),
                ])
                .send()
                .await?
        }
        Commands::WithdrawalStatus { withdrawal_id } => {
            client
                .get(format!("{base}/withdrawal/status/{withdrawal_id}"))
                .send()
                .await?
        }
        Commands::Health => client.get(format!("{base}/health")).send().await?,
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
