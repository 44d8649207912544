// src/models.rs
use serde::Deserialize;

/// One inbound webhook event describing native SOL movement.
///
/// Every field is optional on the wire. Enhanced-transaction providers send
/// a `nativeTransfers` list; single-transfer providers put `from`/`to`/`amount`
/// at the top level instead.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferEvent {
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub slot: Option<u64>,
    #[serde(default)]
    pub native_transfers: Option<Vec<NativeTransfer>>,

    #[serde(default, alias = "fromUserAccount")]
    pub from: Option<String>,
    #[serde(default, alias = "toUserAccount")]
    pub to: Option<String>,
    #[serde(default)]
    pub amount: Option<u64>,
}

/// A single lamport movement inside an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeTransfer {
    #[serde(default, alias = "from")]
    pub from_user_account: String,
    #[serde(default, alias = "to")]
    pub to_user_account: String,
    #[serde(default)]
    pub amount: u64, // lamports
}

impl TransferEvent {
    /// Transfer sub-records in payload order. Falls back to the top-level
    /// movement when the event carries no `nativeTransfers`.
    pub fn transfers(&self) -> Vec<NativeTransfer> {
        match &self.native_transfers {
            Some(list) if !list.is_empty() => list.clone(),
            _ => match (&self.from, &self.to, self.amount) {
                (Some(from), Some(to), Some(amount)) => vec![NativeTransfer {
                    from_user_account: from.clone(),
                    to_user_account: to.clone(),
                    amount,
                }],
                _ => Vec::new(),
            },
        }
    }

    pub fn signature(&self) -> &str {
        self.signature.as_deref().unwrap_or_default()
    }
}

/// One entry of a `getSignaturesForAddress` page.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureInfo {
    pub signature: String,
    #[serde(default)]
    pub slot: u64,
    #[serde(default)]
    pub block_time: Option<i64>,
}

/// The transaction that triggered a freshness check.
#[derive(Debug, Clone, Default)]
pub struct TriggerTx {
    pub signature: String,
    pub slot: Option<u64>,
}

impl TriggerTx {
    pub fn from_event(event: &TransferEvent) -> Self {
        Self {
            signature: event.signature().to_string(),
            slot: event.slot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_enhanced_transaction_payload() {
        let event: TransferEvent = serde_json::from_value(json!({
            "signature": "5sig",
            "timestamp": 1_700_000_000,
            "slot": 250_000_000u64,
            "type": "TRANSFER",
            "nativeTransfers": [
                { "fromUserAccount": "A", "toUserAccount": "B", "amount": 1_500_000_000u64 }
            ]
        }))
        .unwrap();

        assert_eq!(event.signature(), "5sig");
        assert_eq!(event.slot, Some(250_000_000));
        assert_eq!(
            event.transfers(),
            vec![NativeTransfer {
                from_user_account: "A".into(),
                to_user_account: "B".into(),
                amount: 1_500_000_000,
            }]
        );
    }

    #[test]
    fn falls_back_to_top_level_movement() {
        let event: TransferEvent = serde_json::from_value(json!({
            "signature": "5sig",
            "from": "A",
            "to": "B",
            "amount": 42u64
        }))
        .unwrap();

        let transfers = event.transfers();
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].to_user_account, "B");
    }

    #[test]
    fn null_transfer_list_is_accepted() {
        let event: TransferEvent =
            serde_json::from_value(json!({ "nativeTransfers": null })).unwrap();
        assert!(event.transfers().is_empty());
        assert_eq!(event.signature(), "");
    }
}
