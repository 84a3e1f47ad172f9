use shared::domain::ContractStatus;
use storage::{NewContract, Storage};

#[tokio::test]
async fn contract_walks_through_every_status_in_order() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let contract_id = storage
        .create_contract(&NewContract {
            client_name: "Jane Doe".into(),
            client_email: "jane@example.com".into(),
            payment_amount: "1.5".into(),
            net_payment_amount: 1.425,
            requirements: "- ship the site".into(),
            description: "Website".into(),
            code: "contract Escrow {}".into(),
            output_path: "contract.sol".into(),
        })
        .await
        .expect("insert");

    for status in ContractStatus::ALL.into_iter().skip(1) {
        assert!(storage
            .update_contract_status(contract_id, status)
            .await
            .expect("update"));
        let stored = storage
            .get_contract(contract_id)
            .await
            .expect("load")
            .expect("exists");
        assert_eq!(stored.status, status);
        assert!(stored.updated_at >= stored.created_at);
    }
}
