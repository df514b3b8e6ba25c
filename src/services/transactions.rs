use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::database::Store;
use crate::error::{AppError, AppResult};
use crate::models::Transaction;

/// Read side of the payment history, plus the write used by the payout path.
pub struct TransactionService {
    store: Arc<dyn Store>,
}

impl TransactionService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn record(&self, transaction: Transaction) -> AppResult<Transaction> {
        self.store.insert_transaction(&transaction).await?;
        info!(
            transaction_id = %transaction.id,
            user_id = %transaction.user_id,
            kind = %transaction.transaction_type,
            amount = %transaction.amount,
            "Transaction recorded"
        );
        Ok(transaction)
    }

    pub async fn list(&self, user_id: Option<Uuid>) -> AppResult<Vec<Transaction>> {
        self.store.list_transactions(user_id).await
    }

    pub async fn find(&self, id: Uuid) -> AppResult<Transaction> {
        self.store
            .get_transaction(id)
            .await?
            .ok_or_else(|| AppError::not_found("Transaction"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_list_by_user() {
        let service = TransactionService::new(Arc::new(MemoryStore::new()));
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let first = service
            .record(Transaction::completed_reward_payment(
                alice,
                Decimal::new(1250, 2),
                "USD",
                "0xabc",
                Uuid::new_v4(),
            ))
            .await
            .unwrap();
        service
            .record(Transaction::completed_reward_payment(
                bob,
                Decimal::ONE,
                "USD",
                "0xdef",
                Uuid::new_v4(),
            ))
            .await
            .unwrap();

        assert_eq!(service.list(None).await.unwrap().len(), 2);
        let mine = service.list(Some(alice)).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, first.id);
        assert_eq!(service.find(first.id).await.unwrap().amount, Decimal::new(1250, 2));
    }
}
