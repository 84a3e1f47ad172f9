use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use server_api::email::{save_email_txt, EscrowEmail};
use shared::domain::{ContractId, ContractStatus};
use storage::{Storage, StoredContract};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/contracts.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    RenderEmail {
        #[arg(long)]
        client_first_name: String,
        #[arg(long)]
        user_first_name: String,
        #[arg(long, default_value = "")]
        requirements: String,
        #[arg(long, default_value = "")]
        payment_link: String,
        #[arg(long, default_value = "")]
        dashboard_link: String,
        /// Also write `<stem>.txt`.
        #[arg(long)]
        save: Option<PathBuf>,
    },
    ListContracts {
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    ShowContract {
        contract_id: i64,
    },
    SetStatus {
        contract_id: i64,
        status: String,
    },
    DeleteContract {
        contract_id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::RenderEmail {
            client_first_name,
            user_first_name,
            requirements,
            payment_link,
            dashboard_link,
            save,
        } => {
            let email = EscrowEmail {
                client_first_name,
                user_first_name,
                requirements,
                payment_link,
                dashboard_link,
            };
            let (subject, body) = email.render()?;
            println!("{subject}\n\n{body}");
            if let Some(stem) = save {
                let path = save_email_txt(&stem, &subject, &body)?;
                println!("saved {}", path.display());
            }
        }
        Command::ListContracts { limit } => {
            let storage = Storage::new(&cli.database_url).await?;
            for contract in storage.list_contracts(limit).await? {
                println!("{}", summary_json(&contract)?);
            }
        }
        Command::ShowContract { contract_id } => {
            let storage = Storage::new(&cli.database_url).await?;
            let Some(contract) = storage.get_contract(ContractId(contract_id)).await? else {
                bail!("contract {contract_id} not found");
            };
            println!("{}", summary_json(&contract)?);
            println!("requirements:\n{}", contract.requirements);
            println!("output: {}", contract.output_path);
        }
        Command::SetStatus {
            contract_id,
            status,
        } => {
            let status: ContractStatus = status.parse().with_context(|| {
                let known: Vec<&str> = ContractStatus::ALL.iter().map(|s| s.as_str()).collect();
                format!("expected one of: {}", known.join(", "))
            })?;
            let storage = Storage::new(&cli.database_url).await?;
            if !storage
                .update_contract_status(ContractId(contract_id), status)
                .await?
            {
                bail!("contract {contract_id} not found");
            }
            println!("contract_id={contract_id} status={status}");
        }
        Command::DeleteContract { contract_id } => {
            let storage = Storage::new(&cli.database_url).await?;
            if !storage.delete_contract(ContractId(contract_id)).await? {
                bail!("contract {contract_id} not found");
            }
            println!("deleted contract_id={contract_id}");
        }
    }

    Ok(())
}

fn summary_json(contract: &StoredContract) -> Result<String> {
    Ok(serde_json::to_string_pretty(&contract.summary())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn summaries_print_as_pretty_json() {
        let now = Utc::now();
        let contract = StoredContract {
            contract_id: ContractId(7),
            client_name: "Jane Doe".into(),
            client_email: "jane@example.com".into(),
            payment_amount: "500".into(),
            net_payment_amount: 475.0,
            requirements: "- NDA".into(),
            description: "Design work".into(),
            code: "contract Escrow {}".into(),
            output_path: "contract.sol".into(),
            status: ContractStatus::AwaitingConfirmation,
            created_at: now,
            updated_at: now,
        };

        let printed = summary_json(&contract).expect("json");
        assert!(printed.starts_with("{\n  \""));
        assert!(printed.contains("\n  \"client_name\": \"Jane Doe\""));
        assert!(printed.contains("\"status\": \"awaiting_confirmation\""));
    }
}
